//! Structures, unions, enums, flags, arrays and pointers (spec §4.F), and
//! the bitfield layout algebra shared by static sizing and the codec.

use std::collections::HashMap;

use crate::cursor::{Cursor, Seek};
use crate::error::{Error, Result};
use crate::expr::{eval, Chain, Expr, Scope};
use crate::types::primitive::{self, IntegerType};
use crate::types::{Endianness, Size, Type, TypeKind};
use crate::value::{FieldValue, StructValue, UnionValue, Value};

/// A scope backed by the sibling field values already decoded within the
/// structure currently being read (spec's "parse scope").
struct SiblingScope<'a>(&'a HashMap<String, i128>);

impl<'a> Scope for SiblingScope<'a> {
    fn get(&self, name: &str) -> Option<i128> {
        self.0.get(name).copied()
    }
}

// ---------------------------------------------------------------- Enum/Flag

#[derive(Clone, Debug)]
pub struct EnumType {
    pub base: IntegerType,
    pub members: Vec<(String, i128)>,
    pub is_flag: bool,
}

impl EnumType {
    pub fn decode(&self, type_name: &str, raw: i128) -> Value {
        if self.is_flag {
            let (members, residual) = decompose_flags(raw, &self.members);
            Value::Flag {
                type_name: type_name.to_owned(),
                value: raw,
                members,
                residual,
            }
        } else {
            let member = self
                .members
                .iter()
                .find(|(_, v)| *v == raw)
                .map(|(n, _)| n.clone());
            Value::Enum {
                type_name: type_name.to_owned(),
                value: raw,
                member,
            }
        }
    }

    pub fn read(
        &self,
        cursor: &mut Cursor,
        endianness: Endianness,
        field: &str,
        type_name: &str,
    ) -> Result<Value> {
        let raw = self.base.read(cursor, endianness, field)?;
        Ok(self.decode(type_name, raw))
    }

    pub fn write(
        &self,
        cursor: &mut Cursor,
        endianness: Endianness,
        value: &Value,
        field: &str,
    ) -> Result<()> {
        let raw = value
            .as_i128()
            .ok_or_else(|| Error::bad_expression("expected an enum, flag or integer value"))?;
        self.base.write(cursor, endianness, raw, field)
    }

    pub fn default(&self, type_name: &str) -> Value {
        if self.is_flag {
            Value::Flag {
                type_name: type_name.to_owned(),
                value: 0,
                members: Vec::new(),
                residual: 0,
            }
        } else {
            match self.members.first() {
                Some((name, v)) => Value::Enum {
                    type_name: type_name.to_owned(),
                    value: *v,
                    member: Some(name.clone()),
                },
                None => Value::Enum {
                    type_name: type_name.to_owned(),
                    value: 0,
                    member: None,
                },
            }
        }
    }
}

/// Greedily decomposes `value` into named flag members, preferring
/// single-bit members over multi-bit combinations, highest bit first
/// (spec §4.F "Flag.read").
fn decompose_flags(value: i128, members: &[(String, i128)]) -> (Vec<String>, i128) {
    let mut remaining = value;
    let mut matched = Vec::new();

    let mut singles: Vec<&(String, i128)> = members
        .iter()
        .filter(|(_, v)| *v != 0 && (*v & (*v - 1)) == 0)
        .collect();
    singles.sort_by(|a, b| b.1.cmp(&a.1));
    for (name, v) in singles {
        if remaining & v == *v {
            matched.push(name.clone());
            remaining &= !v;
        }
    }

    let mut combos: Vec<&(String, i128)> = members
        .iter()
        .filter(|(_, v)| *v != 0 && (*v & (*v - 1)) != 0)
        .collect();
    combos.sort_by(|a, b| b.1.cmp(&a.1));
    for (name, v) in combos {
        if remaining != 0 && (remaining & v) == *v {
            matched.push(name.clone());
            remaining &= !v;
        }
    }

    (matched, remaining)
}

// -------------------------------------------------------------------- Array

#[derive(Clone, Debug)]
pub enum Count {
    Fixed(usize),
    Expr(Expr),
    Sentinel,
}

#[derive(Clone, Debug)]
pub struct ArrayType {
    pub element: Type,
    pub count: Count,
}

#[derive(Clone, Copy, PartialEq)]
enum CharKind {
    Char,
    Wchar,
}

fn char_kind(ty: &Type) -> Option<CharKind> {
    match &ty.kind {
        TypeKind::Char => Some(CharKind::Char),
        TypeKind::Wchar => Some(CharKind::Wchar),
        _ => None,
    }
}

impl ArrayType {
    pub fn size(&self) -> Size {
        match &self.count {
            Count::Fixed(n) => match self.element.size() {
                Size::Fixed(es) => Size::Fixed(n * es),
                Size::Dynamic => Size::Dynamic,
            },
            Count::Expr(_) | Count::Sentinel => Size::Dynamic,
        }
    }

    pub fn alignment(&self) -> usize {
        self.element.alignment()
    }

    pub fn read(&self, cursor: &mut Cursor, scope: &dyn Scope, field: &str) -> Result<Value> {
        match char_kind(&self.element) {
            Some(CharKind::Char) => self.read_char_array(cursor, field),
            Some(CharKind::Wchar) => self.read_wchar_array(cursor, scope, field),
            None => self.read_element_array(cursor, scope, field),
        }
    }

    fn count_for_read(&self, scope: &dyn Scope) -> Result<Option<usize>> {
        match &self.count {
            Count::Fixed(n) => Ok(Some(*n)),
            Count::Sentinel => Ok(None),
            Count::Expr(e) => {
                let v = eval(e, scope).map_err(|err| Error::bad_expression(err.to_string()))?;
                if v < 0 {
                    return Err(Error::bad_expression("array length evaluated to a negative number"));
                }
                Ok(Some(v as usize))
            }
        }
    }

    fn read_char_array(&self, cursor: &mut Cursor, field: &str) -> Result<Value> {
        match self.count_for_read(&())? {
            Some(n) => {
                let raw = cursor
                    .read_exact(n)
                    .map_err(|e| e.with_field_prefix(field))?;
                Ok(Value::Bytes(raw.to_vec()))
            }
            None => {
                let mut bytes = Vec::new();
                loop {
                    match cursor.read_one() {
                        Some(0) => break,
                        Some(b) => bytes.push(b),
                        None => return Err(Error::truncated(field, 1, 0)),
                    }
                }
                Ok(Value::Bytes(bytes))
            }
        }
    }

    fn read_wchar_array(&self, cursor: &mut Cursor, scope: &dyn Scope, field: &str) -> Result<Value> {
        let wchar_bytes = match &self.element.kind {
            TypeKind::Wchar => self.element.size().fixed_or(2),
            _ => 2,
        };
        match self.count_for_read(scope)? {
            Some(n) => {
                let raw = cursor
                    .read_exact(n * wchar_bytes)
                    .map_err(|e| e.with_field_prefix(field))?;
                Ok(Value::Bytes(raw.to_vec()))
            }
            None => {
                let mut bytes = Vec::new();
                loop {
                    let unit = cursor
                        .read_exact(wchar_bytes)
                        .map_err(|e| e.with_field_prefix(field))?
                        .to_vec();
                    if unit.iter().all(|b| *b == 0) {
                        break;
                    }
                    bytes.extend_from_slice(&unit);
                }
                Ok(Value::Bytes(bytes))
            }
        }
    }

    fn read_element_array(&self, cursor: &mut Cursor, scope: &dyn Scope, field: &str) -> Result<Value> {
        match self.count_for_read(scope)? {
            Some(n) => {
                let mut items = Vec::with_capacity(n);
                for _ in 0..n {
                    items.push(self.element.read(cursor, scope).map_err(|e| e.with_field_prefix(field))?);
                }
                Ok(Value::Array(items))
            }
            None => {
                let zero = self.element.zero_scalar();
                let mut items = Vec::new();
                loop {
                    let v = self
                        .element
                        .read(cursor, scope)
                        .map_err(|e| e.with_field_prefix(field))?;
                    if v.as_i128() == Some(zero) {
                        break;
                    }
                    items.push(v);
                }
                Ok(Value::Array(items))
            }
        }
    }

    pub fn write(&self, cursor: &mut Cursor, value: &Value) -> Result<()> {
        match value {
            Value::Bytes(bytes) => {
                cursor.write(bytes);
                if matches!(self.count, Count::Sentinel) {
                    let terminator_len = match char_kind(&self.element) {
                        Some(CharKind::Char) => 1,
                        Some(CharKind::Wchar) => self.element.size().fixed_or(2),
                        None => 1,
                    };
                    cursor.write(&vec![0u8; terminator_len]);
                }
                Ok(())
            }
            Value::Array(items) => {
                for item in items {
                    self.element.write(cursor, item)?;
                }
                if matches!(self.count, Count::Sentinel) {
                    let terminator = self.element.default();
                    self.element.write(cursor, &terminator)?;
                }
                Ok(())
            }
            _ => Err(Error::bad_expression("expected an array or byte-string value")),
        }
    }

    pub fn default(&self) -> Value {
        match char_kind(&self.element) {
            Some(_) => match &self.count {
                Count::Fixed(n) => Value::Bytes(vec![0u8; *n]),
                _ => Value::Bytes(Vec::new()),
            },
            None => match &self.count {
                Count::Fixed(n) => Value::Array(vec![self.element.default(); *n]),
                _ => Value::Array(Vec::new()),
            },
        }
    }
}

// ------------------------------------------------------------------ Pointer

#[derive(Clone, Debug)]
pub struct PointerType {
    pub target_name: String,
    pub pointer_bytes: usize,
}

impl PointerType {
    pub fn read(&self, cursor: &mut Cursor, endianness: Endianness, field: &str) -> Result<Value> {
        let it = IntegerType {
            signed: false,
            bits: (self.pointer_bytes * 8) as u32,
        };
        let address = it.read(cursor, endianness, field)?;
        Ok(Value::Pointer {
            address: address as u64,
            target_name: self.target_name.clone(),
        })
    }

    pub fn write(&self, cursor: &mut Cursor, endianness: Endianness, value: &Value, field: &str) -> Result<()> {
        let address = value
            .as_i128()
            .ok_or_else(|| Error::bad_expression("expected a pointer or integer value"))?;
        let it = IntegerType {
            signed: false,
            bits: (self.pointer_bytes * 8) as u32,
        };
        it.write(cursor, endianness, address, field)
    }

    pub fn default(&self) -> Value {
        Value::Pointer {
            address: 0,
            target_name: self.target_name.clone(),
        }
    }
}

/// Resolves the bytes backing a dereferenced pointer. External collaborator
/// supplied by the caller; the engine has no opinion on where memory comes
/// from (a file mapping, a live process, ...).
pub trait MemoryResolver {
    fn read_at(&self, address: u64, len: usize) -> Option<Vec<u8>>;
}

// --------------------------------------------------------- Struct / Union

#[derive(Clone, Debug)]
pub struct Field {
    pub name: Option<String>,
    pub ty: Type,
    pub bit_width: Option<u32>,
    pub offset: Option<usize>,
}

#[derive(Clone, Debug)]
pub struct StructType {
    pub fields: Vec<Field>,
    pub is_union: bool,
}

enum Run {
    Plain(usize),
    Bitfield {
        indices: Vec<usize>,
        storage_bytes: usize,
        endianness: Endianness,
    },
}

fn bitfield_storage_bytes(ty: &Type) -> Result<usize> {
    match &ty.kind {
        TypeKind::Integer(it) => Ok(it.bytes()),
        TypeKind::Enum(e) | TypeKind::Flag(e) => Ok(e.base.bytes()),
        _ => Err(Error::InvalidBitfield {
            field: String::new(),
            reason: "bitfield storage type must be an integer, enum or flag".into(),
        }),
    }
}

fn is_signed(ty: &Type) -> bool {
    match &ty.kind {
        TypeKind::Integer(it) => it.signed,
        TypeKind::Enum(e) | TypeKind::Flag(e) => e.base.signed,
        _ => false,
    }
}

fn compute_runs(fields: &[Field]) -> Result<Vec<Run>> {
    let mut runs = Vec::new();
    let mut cur: Option<(Vec<usize>, usize, Endianness, usize)> = None; // indices, storage_bytes, endianness, bits_used
    for (i, f) in fields.iter().enumerate() {
        if let Some(bw) = f.bit_width {
            let storage_bytes = bitfield_storage_bytes(&f.ty)
                .map_err(|e| e.with_field_prefix(f.name.as_deref().unwrap_or("")))?;
            let storage_bits = storage_bytes * 8;
            let endianness = f.ty.endianness;
            let bw = bw as usize;
            let fits_current = cur
                .as_ref()
                .map(|(_, sb, en, used)| *sb == storage_bytes && *en == endianness && used + bw <= storage_bits)
                .unwrap_or(false);
            if fits_current {
                let (idxs, _, _, used) = cur.as_mut().unwrap();
                idxs.push(i);
                *used += bw;
            } else {
                if let Some((idxs, sb, en, _)) = cur.take() {
                    runs.push(Run::Bitfield {
                        indices: idxs,
                        storage_bytes: sb,
                        endianness: en,
                    });
                }
                cur = Some((vec![i], storage_bytes, endianness, bw));
            }
        } else {
            if let Some((idxs, sb, en, _)) = cur.take() {
                runs.push(Run::Bitfield {
                    indices: idxs,
                    storage_bytes: sb,
                    endianness: en,
                });
            }
            runs.push(Run::Plain(i));
        }
    }
    if let Some((idxs, sb, en, _)) = cur.take() {
        runs.push(Run::Bitfield {
            indices: idxs,
            storage_bytes: sb,
            endianness: en,
        });
    }
    Ok(runs)
}

fn extract_bits(unit: u128, bit_pos: usize, bw: usize, storage_bits: usize, endianness: Endianness) -> u128 {
    let mask = if bw >= 128 { u128::MAX } else { (1u128 << bw) - 1 };
    let shift = match endianness {
        Endianness::Little => bit_pos,
        Endianness::Big => storage_bits - bit_pos - bw,
    };
    (unit >> shift) & mask
}

fn sign_extend(raw: u128, bw: usize, signed: bool) -> i128 {
    if signed && bw < 128 {
        let sign_bit = 1u128 << (bw - 1);
        if raw & sign_bit != 0 {
            return (raw | (!0u128 << bw)) as i128;
        }
    }
    raw as i128
}

fn decode_field_scalar(f: &Field, raw: u128, bw: usize) -> Result<Value> {
    match &f.ty.kind {
        TypeKind::Integer(it) => Ok(Value::Int(sign_extend(raw, bw, it.signed))),
        TypeKind::Enum(e) => {
            let v = sign_extend(raw, bw, e.base.signed);
            Ok(e.decode(&f.ty.name, v))
        }
        TypeKind::Flag(e) => {
            let v = sign_extend(raw, bw, e.base.signed);
            Ok(e.decode(&f.ty.name, v))
        }
        _ => Err(Error::InvalidBitfield {
            field: f.name.clone().unwrap_or_default(),
            reason: "non-integer storage type".into(),
        }),
    }
}

impl StructType {
    /// Builds a struct/union type, computing every field's byte offset.
    pub fn new(mut fields: Vec<Field>, is_union: bool) -> Result<Self> {
        assign_offsets(&mut fields, is_union)?;
        Ok(StructType { fields, is_union })
    }

    pub fn size(&self) -> Size {
        if self.is_union {
            let mut max = 0usize;
            for f in &self.fields {
                match f.ty.size() {
                    Size::Fixed(s) => max = max.max(s),
                    Size::Dynamic => return Size::Dynamic,
                }
            }
            return Size::Fixed(max);
        }
        let runs = match compute_runs(&self.fields) {
            Ok(r) => r,
            Err(_) => return Size::Dynamic,
        };
        let mut total = 0usize;
        for run in runs {
            match run {
                Run::Plain(i) => match self.fields[i].ty.size() {
                    Size::Fixed(s) => total += s,
                    Size::Dynamic => return Size::Dynamic,
                },
                Run::Bitfield { storage_bytes, .. } => total += storage_bytes,
            }
        }
        Size::Fixed(total)
    }

    pub fn alignment(&self) -> usize {
        self.fields.iter().map(|f| f.ty.alignment()).max().unwrap_or(1)
    }

    pub fn read(&self, cursor: &mut Cursor, outer_scope: &dyn Scope, type_name: &str) -> Result<Value> {
        let start = cursor.tell();
        if self.is_union {
            return self.read_union(cursor, outer_scope, type_name, start);
        }
        let mut sv = StructValue::new(type_name);
        let mut sibling: HashMap<String, i128> = HashMap::new();
        let runs = compute_runs(&self.fields)?;
        for run in runs {
            match run {
                Run::Plain(i) => {
                    let f = &self.fields[i];
                    let label = f.name.clone().unwrap_or_default();
                    let scope = Chain(&SiblingScope(&sibling), outer_scope);
                    let v = f
                        .ty
                        .read(cursor, &scope)
                        .map_err(|e| e.with_field_prefix(&label))?;
                    if let (Some(name), Some(scalar)) = (&f.name, v.as_i128()) {
                        sibling.insert(name.clone(), scalar);
                    }
                    sv.fields.push(FieldValue {
                        name: f.name.clone(),
                        value: v,
                    });
                }
                Run::Bitfield {
                    indices,
                    storage_bytes,
                    endianness,
                } => {
                    let label_prefix = self.fields[indices[0]].name.clone().unwrap_or_default();
                    let raw_bytes = cursor
                        .read_exact(storage_bytes)
                        .map_err(|e| e.with_field_prefix(&label_prefix))?
                        .to_vec();
                    let unit = primitive::bytes_to_int(&raw_bytes, endianness, false, (storage_bytes * 8) as u32) as u128;
                    let storage_bits = storage_bytes * 8;
                    let mut bit_pos = 0usize;
                    for &i in &indices {
                        let f = &self.fields[i];
                        let bw = f.bit_width.unwrap() as usize;
                        let raw = extract_bits(unit, bit_pos, bw, storage_bits, endianness);
                        bit_pos += bw;
                        let value = decode_field_scalar(f, raw, bw)?;
                        if let (Some(name), Some(scalar)) = (&f.name, value.as_i128()) {
                            sibling.insert(name.clone(), scalar);
                        }
                        sv.fields.push(FieldValue {
                            name: f.name.clone(),
                            value,
                        });
                    }
                }
            }
        }
        sv.size = cursor.tell() - start;
        Ok(Value::Struct(sv))
    }

    fn read_union(&self, cursor: &mut Cursor, outer_scope: &dyn Scope, type_name: &str, start: usize) -> Result<Value> {
        let mut members = Vec::new();
        let mut max_consumed = 0usize;
        for f in &self.fields {
            cursor.seek(Seek::Start(start))?;
            let label = f.name.clone().unwrap_or_default();
            let v = f
                .ty
                .read(cursor, outer_scope)
                .map_err(|e| e.with_field_prefix(&label))?;
            let consumed = cursor.tell() - start;
            max_consumed = max_consumed.max(consumed);
            members.push(FieldValue {
                name: f.name.clone(),
                value: v,
            });
        }
        cursor.seek(Seek::Start(start))?;
        let raw = cursor.read_exact(max_consumed)?.to_vec();
        Ok(Value::Union(UnionValue {
            type_name: type_name.to_owned(),
            members,
            raw,
            last_assigned: None,
        }))
    }

    pub fn write(&self, cursor: &mut Cursor, value: &Value) -> Result<()> {
        if self.is_union {
            return self.write_union(cursor, value);
        }
        let sv = match value {
            Value::Struct(s) => s,
            _ => return Err(Error::bad_expression("expected a struct value")),
        };
        let runs = compute_runs(&self.fields)?;
        for run in runs {
            match run {
                Run::Plain(i) => {
                    let f = &self.fields[i];
                    let label = f.name.clone().unwrap_or_default();
                    f.ty
                        .write(cursor, &sv.fields[i].value)
                        .map_err(|e| e.with_field_prefix(&label))?;
                }
                Run::Bitfield {
                    indices,
                    storage_bytes,
                    endianness,
                } => {
                    let storage_bits = storage_bytes * 8;
                    let mut unit: u128 = 0;
                    let mut bit_pos = 0usize;
                    for &i in &indices {
                        let f = &self.fields[i];
                        let label = f.name.clone().unwrap_or_default();
                        let bw = f.bit_width.unwrap() as usize;
                        let scalar = sv.fields[i].value.as_i128().ok_or_else(|| Error::InvalidBitfield {
                            field: label.clone(),
                            reason: "bitfield value is not scalar".into(),
                        })?;
                        if !primitive::fits(scalar, bw as u32, is_signed(&f.ty)) {
                            return Err(Error::ValueOutOfRange {
                                field: label,
                                bits: bw as u32,
                                value: scalar,
                            });
                        }
                        let masked = (scalar as u128) & ((1u128 << bw) - 1);
                        let shift = match endianness {
                            Endianness::Little => bit_pos,
                            Endianness::Big => storage_bits - bit_pos - bw,
                        };
                        unit |= masked << shift;
                        bit_pos += bw;
                    }
                    let bytes = primitive::int_to_bytes(unit as i128, storage_bytes, endianness);
                    cursor.write(&bytes);
                }
            }
        }
        Ok(())
    }

    fn write_union(&self, cursor: &mut Cursor, value: &Value) -> Result<()> {
        let uv = match value {
            Value::Union(u) => u,
            _ => return Err(Error::bad_expression("expected a union value")),
        };
        match &uv.last_assigned {
            None => {
                cursor.write(&uv.raw);
                Ok(())
            }
            Some(member_name) => {
                let field = self
                    .fields
                    .iter()
                    .find(|f| f.name.as_deref() == Some(member_name.as_str()))
                    .ok_or_else(|| Error::UnknownType {
                        name: member_name.clone(),
                    })?;
                let value = uv.get(member_name).expect("last_assigned member must exist");
                let mut tmp = Cursor::new_writer();
                field.ty.write(&mut tmp, value)?;
                let mut bytes = tmp.into_bytes();
                let size = self.size().fixed_or(bytes.len());
                bytes.resize(size, 0);
                cursor.write(&bytes);
                Ok(())
            }
        }
    }

    pub fn default(&self, type_name: &str) -> Value {
        if self.is_union {
            let members: Vec<FieldValue> = self
                .fields
                .iter()
                .map(|f| FieldValue {
                    name: f.name.clone(),
                    value: f.ty.default(),
                })
                .collect();
            let size = self.size().fixed_or(0);
            return Value::Union(UnionValue {
                type_name: type_name.to_owned(),
                members,
                raw: vec![0u8; size],
                last_assigned: None,
            });
        }
        let fields: Vec<FieldValue> = self
            .fields
            .iter()
            .map(|f| FieldValue {
                name: f.name.clone(),
                value: f.ty.default(),
            })
            .collect();
        let size = self.size().fixed_or(0);
        Value::Struct(StructValue {
            type_name: type_name.to_owned(),
            fields,
            size,
        })
    }
}

fn assign_offsets(fields: &mut [Field], is_union: bool) -> Result<()> {
    if is_union {
        for f in fields.iter_mut() {
            f.offset = Some(0);
        }
        return Ok(());
    }
    // Borrow fields immutably to compute runs, then apply offsets.
    let immutable: Vec<Field> = fields.to_vec();
    let runs = compute_runs(&immutable)?;
    let mut offset: Option<usize> = Some(0);
    for run in runs {
        match run {
            Run::Plain(i) => {
                fields[i].offset = offset;
                if let Some(o) = offset {
                    offset = match fields[i].ty.size() {
                        Size::Fixed(s) => Some(o + s),
                        Size::Dynamic => None,
                    };
                }
            }
            Run::Bitfield { indices, storage_bytes, .. } => {
                for i in indices {
                    fields[i].offset = offset;
                }
                offset = offset.map(|o| o + storage_bytes);
            }
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::{Endianness as En, Type, TypeKind as TK};

    fn uint(bits: u32) -> Type {
        Type {
            name: format!("uint{}", bits),
            endianness: En::Little,
            kind: TK::Integer(IntegerType { signed: false, bits }),
        }
    }

    #[test]
    fn bitfield_runs_pack_into_shared_units() {
        let fields = vec![
            Field { name: Some("a".into()), ty: uint(16), bit_width: Some(1), offset: None },
            Field { name: Some("b".into()), ty: uint(16), bit_width: Some(1), offset: None },
            Field { name: Some("c".into()), ty: uint(32), bit_width: None, offset: None },
            Field { name: Some("d".into()), ty: uint(16), bit_width: Some(2), offset: None },
            Field { name: Some("e".into()), ty: uint(16), bit_width: Some(3), offset: None },
        ];
        let st = StructType::new(fields, false).unwrap();
        assert_eq!(st.size(), Size::Fixed(2 + 4 + 2));
        let mut c = Cursor::from_bytes(vec![0x03, 0x00, 0xFF, 0x00, 0x00, 0x00, 0x1F, 0x00]);
        let v = st.read(&mut c, &(), "B").unwrap();
        let s = match v { Value::Struct(s) => s, _ => unreachable!() };
        assert_eq!(s.get("a"), Some(&Value::Int(1)));
        assert_eq!(s.get("b"), Some(&Value::Int(1)));
        assert_eq!(s.get("c"), Some(&Value::Int(0xFF)));
        assert_eq!(s.get("d"), Some(&Value::Int(0b11)));
        assert_eq!(s.get("e"), Some(&Value::Int(0b111)));
    }

    #[test]
    fn flag_decomposition_prefers_single_bits() {
        let members = vec![
            ("A".to_string(), 0x1),
            ("B".to_string(), 0x2),
            ("AB".to_string(), 0x3),
        ];
        let (names, residual) = decompose_flags(0x3, &members);
        assert_eq!(names, vec!["B".to_string(), "A".to_string()]);
        assert_eq!(residual, 0);
    }
}
