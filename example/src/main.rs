fn main() -> anyhow::Result<()> {
    env_logger::init();
    example::run()
}
