//! The runtime type universe (spec §4.E/§4.F): every declared type, whether
//! built in or user-defined, is represented uniformly by [`Type`] and knows
//! how to size, read and write itself.

pub mod composite;
pub mod primitive;

use crate::cursor::Cursor;
use crate::error::Result;
use crate::expr::Scope;
use crate::value::Value;

use composite::{ArrayType, EnumType, PointerType, StructType};
use primitive::{FloatType, IntegerType, Leb128Type};

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Endianness {
    Little,
    Big,
}

/// A type's byte size: either known statically, or only known once a
/// particular instance has been read (arrays with an expression or sentinel
/// count, structures containing one, LEB128 integers, ...).
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Size {
    Fixed(usize),
    Dynamic,
}

impl Size {
    pub fn fixed_or(&self, default: usize) -> usize {
        match self {
            Size::Fixed(n) => *n,
            Size::Dynamic => default,
        }
    }
}

#[derive(Clone, Debug)]
pub enum TypeKind {
    Integer(IntegerType),
    Float(FloatType),
    Char,
    Wchar,
    Leb128(Leb128Type),
    Void,
    Enum(EnumType),
    Flag(EnumType),
    Array(Box<ArrayType>),
    Pointer(PointerType),
    Struct(Box<StructType>),
    Union(Box<StructType>),
}

/// A named, fully resolved type. Every value of `kind` that can itself
/// contain a `Type` (array element, struct field, ...) carries a nested
/// `Type` directly rather than an indirection through the registry, except
/// [`composite::PointerType`] which only ever carries a target *name* so
/// that self-referential and mutually-recursive definitions don't require
/// an already-built `Type` to exist (spec §9, "cyclic type references").
#[derive(Clone, Debug)]
pub struct Type {
    pub name: String,
    pub endianness: Endianness,
    pub kind: TypeKind,
}

impl Type {
    pub fn size(&self) -> Size {
        match &self.kind {
            TypeKind::Integer(it) => Size::Fixed(it.bytes()),
            TypeKind::Float(ft) => Size::Fixed(ft.bytes()),
            TypeKind::Char => Size::Fixed(1),
            TypeKind::Wchar => Size::Fixed(2),
            TypeKind::Leb128(_) => Size::Dynamic,
            TypeKind::Void => Size::Fixed(0),
            TypeKind::Enum(e) | TypeKind::Flag(e) => Size::Fixed(e.base.bytes()),
            TypeKind::Array(a) => a.size(),
            TypeKind::Pointer(p) => Size::Fixed(p.pointer_bytes),
            TypeKind::Struct(s) | TypeKind::Union(s) => s.size(),
        }
    }

    pub fn alignment(&self) -> usize {
        match &self.kind {
            TypeKind::Integer(it) => it.bytes().min(8).max(1),
            TypeKind::Float(ft) => ft.bytes(),
            TypeKind::Char | TypeKind::Void => 1,
            TypeKind::Wchar => 2,
            TypeKind::Leb128(_) => 1,
            TypeKind::Enum(e) | TypeKind::Flag(e) => e.base.bytes(),
            TypeKind::Array(a) => a.alignment(),
            TypeKind::Pointer(p) => p.pointer_bytes,
            TypeKind::Struct(s) | TypeKind::Union(s) => s.alignment(),
        }
    }

    /// Reads one instance of this type from `cursor`. `scope` resolves
    /// identifiers appearing in array-length expressions; struct and union
    /// fields build their own sibling-field scope chained in front of it
    /// (spec's "parse scope").
    pub fn read(&self, cursor: &mut Cursor, scope: &dyn Scope) -> Result<Value> {
        match &self.kind {
            TypeKind::Integer(it) => Ok(Value::Int(it.read(cursor, self.endianness, &self.name)?)),
            TypeKind::Float(ft) => Ok(Value::Float(ft.read(cursor, self.endianness, &self.name)?)),
            TypeKind::Char => primitive::read_char(cursor, &self.name),
            TypeKind::Wchar => {
                let it = IntegerType { signed: false, bits: 16 };
                Ok(Value::Int(it.read(cursor, self.endianness, &self.name)?))
            }
            TypeKind::Leb128(lt) => Ok(Value::Int(lt.read(cursor, &self.name)?)),
            TypeKind::Void => Ok(Value::Int(0)),
            TypeKind::Enum(e) => e.read(cursor, self.endianness, &self.name, &self.name),
            TypeKind::Flag(e) => e.read(cursor, self.endianness, &self.name, &self.name),
            TypeKind::Array(a) => a.read(cursor, scope, &self.name),
            TypeKind::Pointer(p) => p.read(cursor, self.endianness, &self.name),
            TypeKind::Struct(s) => s.read(cursor, scope, &self.name),
            TypeKind::Union(s) => s.read(cursor, scope, &self.name),
        }
    }

    pub fn write(&self, cursor: &mut Cursor, value: &Value) -> Result<()> {
        match &self.kind {
            TypeKind::Integer(it) => {
                let v = value.as_i128().ok_or_else(|| {
                    crate::error::Error::bad_expression("expected an integer value")
                })?;
                it.write(cursor, self.endianness, v, &self.name)
            }
            TypeKind::Float(ft) => {
                let v = match value {
                    Value::Float(f) => *f,
                    Value::Int(i) => *i as f64,
                    _ => {
                        return Err(crate::error::Error::bad_expression(
                            "expected a floating point value",
                        ))
                    }
                };
                ft.write(cursor, self.endianness, v);
                Ok(())
            }
            TypeKind::Char => {
                let v = value
                    .as_i128()
                    .ok_or_else(|| crate::error::Error::bad_expression("expected a char value"))?;
                primitive::write_char(cursor, v, &self.name)
            }
            TypeKind::Wchar => {
                let v = value
                    .as_i128()
                    .ok_or_else(|| crate::error::Error::bad_expression("expected a wchar value"))?;
                let it = IntegerType { signed: false, bits: 16 };
                it.write(cursor, self.endianness, v, &self.name)
            }
            TypeKind::Leb128(lt) => {
                let v = value
                    .as_i128()
                    .ok_or_else(|| crate::error::Error::bad_expression("expected an integer value"))?;
                lt.write(cursor, v);
                Ok(())
            }
            TypeKind::Void => Ok(()),
            TypeKind::Enum(e) => e.write(cursor, self.endianness, value, &self.name),
            TypeKind::Flag(e) => e.write(cursor, self.endianness, value, &self.name),
            TypeKind::Array(a) => a.write(cursor, value),
            TypeKind::Pointer(p) => p.write(cursor, self.endianness, value, &self.name),
            TypeKind::Struct(s) | TypeKind::Union(s) => s.write(cursor, value),
        }
    }

    /// The zero-equivalent value used for non-character sentinel array
    /// termination (spec §4.F): plain numeric zero for every scalar kind.
    pub fn zero_scalar(&self) -> i128 {
        0
    }

    /// The default value of a freshly constructed instance (spec's
    /// "keyword-style attributes default to the field type's default").
    pub fn default(&self) -> Value {
        match &self.kind {
            TypeKind::Integer(_) | TypeKind::Char | TypeKind::Wchar | TypeKind::Leb128(_) | TypeKind::Void => {
                Value::Int(0)
            }
            TypeKind::Float(_) => Value::Float(0.0),
            TypeKind::Enum(e) | TypeKind::Flag(e) => e.default(&self.name),
            TypeKind::Array(a) => a.default(),
            TypeKind::Pointer(p) => p.default(),
            TypeKind::Struct(s) | TypeKind::Union(s) => s.default(&self.name),
        }
    }
}
