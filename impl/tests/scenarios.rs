//! End-to-end scenarios worked through a [`cstruct::Registry`], each one
//! a concrete structure decoded (and, where static, re-encoded) from
//! bytes by hand.

use cstruct::types::composite::MemoryResolver;
use cstruct::{Error, Registry, Value};

/// A fixed block of bytes mapped at `base`, standing in for a process's
/// or file's address space for [`Registry::dereference`].
struct FlatMemory {
    base: u64,
    bytes: Vec<u8>,
}

impl MemoryResolver for FlatMemory {
    fn read_at(&self, address: u64, len: usize) -> Option<Vec<u8>> {
        let start = address.checked_sub(self.base)? as usize;
        let end = start.checked_add(len)?;
        self.bytes.get(start..end).map(|s| s.to_vec())
    }
}

#[test]
fn sibling_length_array_struct() {
    let mut reg = Registry::new();
    reg.load("struct S { uint8 a; char b[5]; char c[(a & 1) * 5]; uint16 d; };")
        .unwrap();

    let mut bytes = vec![1u8];
    bytes.extend_from_slice(b"hello");
    bytes.extend_from_slice(b"world");
    bytes.extend_from_slice(&[0x00, 0x00]); // d = 0, little-endian

    let v = reg.read_bytes("S", &bytes).unwrap();
    assert_eq!(v.get("a"), Some(&Value::Int(1)));
    assert_eq!(v.get("b"), Some(&Value::Bytes(b"hello".to_vec())));
    assert_eq!(v.get("c"), Some(&Value::Bytes(b"world".to_vec())));
    assert_eq!(v.get("d"), Some(&Value::Int(0)));

    let out = reg.write_bytes("S", &v).unwrap();
    assert_eq!(out, bytes);
}

#[test]
fn union_reads_every_member_from_the_same_offset() {
    let mut reg = Registry::new();
    reg.load(
        "struct U { char magic[4]; union { struct { uint32 a; uint32 b; } a; \
         struct { char b[8]; } b; } c; };",
    )
    .unwrap();

    let bytes = b"ohaideadbeef".to_vec();
    let v = reg.read_bytes("U", &bytes).unwrap();

    assert_eq!(v.get("magic"), Some(&Value::Bytes(b"ohai".to_vec())));
    let c = v.get("c").unwrap();
    assert_eq!(c.get("a").unwrap().get("a"), Some(&Value::Int(0x64616564)));
    assert_eq!(c.get("a").unwrap().get("b"), Some(&Value::Int(0x66656562)));
    assert_eq!(c.get("b").unwrap().get("b"), Some(&Value::Bytes(b"deadbeef".to_vec())));

    let out = reg.write_bytes("U", &v).unwrap();
    assert_eq!(out, bytes);
}

#[test]
fn bitfields_pack_into_shared_storage_units() {
    let mut reg = Registry::new();
    reg.load(
        "struct B { uint16 a:1; uint16 b:1; uint32 c; uint16 d:2; uint16 e:3; };",
    )
    .unwrap();

    let bytes = vec![0x03, 0x00, 0xFF, 0x00, 0x00, 0x00, 0x1F, 0x00];
    let v = reg.read_bytes("B", &bytes).unwrap();
    assert_eq!(v.get("a"), Some(&Value::Int(1)));
    assert_eq!(v.get("b"), Some(&Value::Int(1)));
    assert_eq!(v.get("c"), Some(&Value::Int(0xFF)));
    assert_eq!(v.get("d"), Some(&Value::Int(0b11)));
    assert_eq!(v.get("e"), Some(&Value::Int(0b111)));

    let out = reg.write_bytes("B", &v).unwrap();
    assert_eq!(out, bytes);
}

#[test]
fn enum_with_explicit_and_auto_members() {
    let mut reg = Registry::new();
    reg.load("enum E : uint16 { A, B=5, C };").unwrap();

    let decode = |n: i128| reg.read_bytes("E", &(n as u16).to_le_bytes()).unwrap();

    assert_eq!(
        decode(0),
        Value::Enum {
            type_name: "E".into(),
            value: 0,
            member: Some("A".into()),
        }
    );
    assert_eq!(
        decode(5),
        Value::Enum {
            type_name: "E".into(),
            value: 5,
            member: Some("B".into()),
        }
    );
    assert_eq!(
        decode(6),
        Value::Enum {
            type_name: "E".into(),
            value: 6,
            member: Some("C".into()),
        }
    );
    let unknown = decode(7);
    assert_eq!(unknown.as_i128(), Some(7));
    assert_eq!(unknown.to_string(), "E(7)");
}

#[test]
fn fixed_array_of_nonstandard_width_integers() {
    let mut reg = Registry::new();
    reg.load("struct Pair { uint24 vals[2]; };").unwrap();

    let bytes = vec![0x01, 0x00, 0x00, 0x02, 0x00, 0x00];
    let v = reg.read_bytes("Pair", &bytes).unwrap();
    assert_eq!(
        v.get("vals"),
        Some(&Value::Array(vec![Value::Int(1), Value::Int(2)]))
    );

    let out = reg.write_bytes("Pair", &v).unwrap();
    assert_eq!(out, bytes);
}

#[test]
fn sentinel_terminated_char_array_strips_and_restores_terminator() {
    let mut reg = Registry::new();
    reg.load("struct Str { char text[]; };").unwrap();

    let mut bytes = b"hello world!".to_vec();
    bytes.push(0);

    let v = reg.read_bytes("Str", &bytes).unwrap();
    assert_eq!(v.get("text"), Some(&Value::Bytes(b"hello world!".to_vec())));

    let out = reg.write_bytes("Str", &v).unwrap();
    assert_eq!(out, bytes);
}

#[test]
fn pointer_field_dereferences_through_a_memory_resolver() {
    let mut reg = Registry::new();
    reg.load(
        "struct Header { uint32 magic; uint16 version; }; \
         struct Node { Header *target; };",
    )
    .unwrap();

    let mut header_bytes = vec![0xEFu8, 0xBE, 0xAD, 0xDE]; // magic = 0xDEADBEEF, LE
    header_bytes.extend_from_slice(&1u16.to_le_bytes()); // version = 1

    let memory = FlatMemory {
        base: 0x1000,
        bytes: header_bytes.clone(),
    };

    let node_bytes = 0x1000u64.to_le_bytes().to_vec();
    let node = reg.read_bytes("Node", &node_bytes).unwrap();
    let pointer = node.get("target").unwrap();
    assert_eq!(
        pointer,
        &Value::Pointer {
            address: 0x1000,
            target_name: "Header".to_string(),
        }
    );

    let header = reg.dereference(pointer, &memory).unwrap();
    assert_eq!(header.get("magic"), Some(&Value::Int(0xDEADBEEF)));
    assert_eq!(header.get("version"), Some(&Value::Int(1)));
}

#[test]
fn dereferencing_a_dangling_pointer_is_a_null_dereference_error() {
    let mut reg = Registry::new();
    reg.load("struct Header { uint32 magic; }; struct Node { Header *target; };")
        .unwrap();

    let memory = FlatMemory {
        base: 0x1000,
        bytes: vec![1, 2, 3, 4],
    };

    let node_bytes = 0x9999u64.to_le_bytes().to_vec();
    let node = reg.read_bytes("Node", &node_bytes).unwrap();
    let pointer = node.get("target").unwrap();

    let err = reg.dereference(pointer, &memory).unwrap_err();
    assert!(matches!(err, Error::NullDereference { .. }));
}
