//! Demonstrates loading definitions into a [`cstruct::Registry`] and
//! reading/writing values against them.

use cstruct::Registry;

const DEFINITIONS: &str = r#"
#define MAX_NAME 16

enum Color : uint8 {
    Red,
    Green,
    Blue,
};

flag Permissions : uint8 {
    Read = 1,
    Write = 2,
    Execute = 4,
};

struct Header {
    uint32 magic;
    uint16 version;
    uint8 flags : 4;
    uint8 reserved : 4;
};

struct Entry {
    char name[MAX_NAME];
    Color color;
    Permissions perms;
    uint8 payload_len;
    uint8 payload[payload_len];
};
"#;

/// Loads the demo definitions and decodes a handful of sample values,
/// logging each step the way a small inspection tool would.
pub fn run() -> anyhow::Result<()> {
    let mut registry = Registry::new();
    registry.load(DEFINITIONS)?;
    log::info!("loaded {} type(s)", registry.names().count());

    let header_bytes = [0xEF, 0xBE, 0xAD, 0xDE, 0x01, 0x00, 0b0000_0101];
    let header = registry.read_bytes("Header", &header_bytes)?;
    log::debug!("decoded header: {}", header);
    println!("{}", header);

    let mut entry_bytes = vec![b'h', b'i', 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0];
    entry_bytes.push(1); // Color::Green
    entry_bytes.push(0b011); // Permissions: Read|Write
    entry_bytes.push(3); // payload_len
    entry_bytes.extend_from_slice(&[9, 9, 9]);
    let entry = registry.read_bytes("Entry", &entry_bytes)?;
    log::debug!("decoded entry: {}", entry);
    println!("{}", entry);

    let round_tripped = registry.write_bytes("Entry", &entry)?;
    anyhow::ensure!(round_tripped == entry_bytes, "entry did not round-trip byte for byte");
    log::info!("entry round-tripped cleanly ({} bytes)", round_tripped.len());

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn demo_runs_without_error() {
        run().unwrap();
    }
}
