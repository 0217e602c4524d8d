//! The parsed-value representation (spec §4.H): an ordered, attribute- and
//! index-accessible record that also knows how to render itself the way
//! the source language would.

use std::fmt;

/// A value produced by [`crate::types::Type::read`] or built by hand to be
/// passed to [`crate::types::Type::write`].
#[derive(Clone, Debug, PartialEq)]
pub enum Value {
    Int(i128),
    Float(f64),
    Bytes(Vec<u8>),
    Enum {
        type_name: String,
        value: i128,
        member: Option<String>,
    },
    Flag {
        type_name: String,
        value: i128,
        members: Vec<String>,
        residual: i128,
    },
    Array(Vec<Value>),
    Pointer {
        address: u64,
        target_name: String,
    },
    Struct(StructValue),
    Union(UnionValue),
}

impl Value {
    /// Projects a scalar value down to an `i128`, for use as a sibling
    /// field value visible to array-length expressions. Composite values
    /// (arrays, structs, unions) have no scalar projection and are simply
    /// invisible to expressions, same as spec's identifier-lookup rules
    /// imply for anything that isn't itself a named integer constant.
    pub fn as_i128(&self) -> Option<i128> {
        match self {
            Value::Int(v) => Some(*v),
            Value::Enum { value, .. } => Some(*value),
            Value::Flag { value, .. } => Some(*value),
            Value::Pointer { address, .. } => Some(*address as i128),
            _ => None,
        }
    }

    /// Named attribute access, following promoted anonymous struct/union
    /// fields transparently (spec's "Promoted field").
    pub fn get(&self, name: &str) -> Option<&Value> {
        match self {
            Value::Struct(s) => s.get(name),
            Value::Union(u) => u.get(name),
            _ => None,
        }
    }

    /// Index access into an array value.
    pub fn index(&self, i: usize) -> Option<&Value> {
        match self {
            Value::Array(items) => items.get(i),
            _ => None,
        }
    }
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Value::Int(v) => write!(f, "{}", v),
            Value::Float(v) => write!(f, "{}", v),
            Value::Bytes(b) => write!(f, "{:?}", String::from_utf8_lossy(b)),
            Value::Enum {
                type_name,
                value,
                member,
            } => match member {
                Some(name) => write!(f, "{}.{}", type_name, name),
                None => write!(f, "{}({})", type_name, value),
            },
            Value::Flag {
                type_name,
                members,
                residual,
                value,
            } => {
                if members.is_empty() && *residual == 0 {
                    return write!(f, "{}(0)", type_name);
                }
                let mut parts: Vec<String> = members.clone();
                if *residual != 0 {
                    parts.push(format!("{:#x}", residual));
                }
                if parts.is_empty() {
                    write!(f, "{}({})", type_name, value)
                } else {
                    write!(f, "{}", parts.join("|"))
                }
            }
            Value::Array(items) => {
                write!(f, "[")?;
                for (i, v) in items.iter().enumerate() {
                    if i > 0 {
                        write!(f, ", ")?;
                    }
                    write!(f, "{}", v)?;
                }
                write!(f, "]")
            }
            Value::Pointer {
                address,
                target_name,
            } => write!(f, "*{}@{:#x}", target_name, address),
            Value::Struct(s) => s.fmt(f),
            Value::Union(u) => u.fmt(f),
        }
    }
}

/// One entry of a structure/union value; `name` is `None` for a promoted
/// anonymous inner struct/union.
#[derive(Clone, Debug, PartialEq)]
pub struct FieldValue {
    pub name: Option<String>,
    pub value: Value,
}

/// A parsed structure instance: an ordered map from field name to value,
/// preserving declaration order (spec §3 "Parsed value").
#[derive(Clone, Debug, PartialEq)]
pub struct StructValue {
    pub type_name: String,
    pub fields: Vec<FieldValue>,
    /// Bytes actually consumed while reading this instance; may exceed the
    /// type's static size when dynamic fields were present.
    pub size: usize,
}

impl StructValue {
    pub fn new(type_name: impl Into<String>) -> Self {
        StructValue {
            type_name: type_name.into(),
            fields: Vec::new(),
            size: 0,
        }
    }

    /// Looks up `name` among direct fields first, then recurses into any
    /// promoted anonymous inner struct/union (spec property 5).
    pub fn get(&self, name: &str) -> Option<&Value> {
        for f in &self.fields {
            if f.name.as_deref() == Some(name) {
                return Some(&f.value);
            }
        }
        for f in &self.fields {
            if f.name.is_none() {
                if let Some(v) = f.value.get(name) {
                    return Some(v);
                }
            }
        }
        None
    }
}

impl fmt::Display for StructValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} {{", self.type_name)?;
        for (i, field) in self.fields.iter().enumerate() {
            if i > 0 {
                write!(f, ", ")?;
            }
            match &field.name {
                Some(name) => write!(f, "{}={}", name, field.value)?,
                None => write!(f, "{}", field.value)?,
            }
        }
        write!(f, "}}")
    }
}

/// A parsed union instance. `raw` holds the exact bytes occupied by the
/// union as read, which is what `write` re-emits unless a member was
/// explicitly (re)assigned after construction (spec §4.F union emission
/// rule).
#[derive(Clone, Debug, PartialEq)]
pub struct UnionValue {
    pub type_name: String,
    pub members: Vec<FieldValue>,
    pub raw: Vec<u8>,
    pub last_assigned: Option<String>,
}

impl UnionValue {
    pub fn get(&self, name: &str) -> Option<&Value> {
        for m in &self.members {
            if m.name.as_deref() == Some(name) {
                return Some(&m.value);
            }
        }
        None
    }
}

impl fmt::Display for UnionValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} {{", self.type_name)?;
        for (i, m) in self.members.iter().enumerate() {
            if i > 0 {
                write!(f, ", ")?;
            }
            match &m.name {
                Some(name) => write!(f, "{}={}", name, m.value)?,
                None => write!(f, "{}", m.value)?,
            }
        }
        write!(f, "}}")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn promoted_field_reachable_by_bare_name() {
        let inner = StructValue {
            type_name: "<anon>".into(),
            fields: vec![FieldValue {
                name: Some("b".into()),
                value: Value::Int(7),
            }],
            size: 1,
        };
        let outer = StructValue {
            type_name: "Outer".into(),
            fields: vec![FieldValue {
                name: None,
                value: Value::Struct(inner),
            }],
            size: 1,
        };
        assert_eq!(outer.get("b"), Some(&Value::Int(7)));
    }

    #[test]
    fn enum_display_uses_member_name() {
        let v = Value::Enum {
            type_name: "E".into(),
            value: 5,
            member: Some("B".into()),
        };
        assert_eq!(v.to_string(), "E.B");
        let v = Value::Enum {
            type_name: "E".into(),
            value: 7,
            member: None,
        };
        assert_eq!(v.to_string(), "E(7)");
    }

    #[test]
    fn flag_display_shows_or_expression() {
        let v = Value::Flag {
            type_name: "F".into(),
            value: 0x13,
            members: vec!["A".into(), "B".into()],
            residual: 0x10,
        };
        assert_eq!(v.to_string(), "A|B|0x10");
    }
}
