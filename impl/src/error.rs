//! Error kinds surfaced by the parser and the codec engine (spec §7).

use thiserror::Error;

/// Everything that can go wrong while loading a definition or while
/// reading/writing a value against an already-loaded type.
#[derive(Debug, Error, Clone, PartialEq)]
pub enum Error {
    #[error("parse error at line {line}, column {column}: {message}")]
    ParseError {
        line: usize,
        column: usize,
        message: String,
    },

    #[error("unknown type `{name}`")]
    UnknownType { name: String },

    #[error("redefinition of `{name}`: {reason}")]
    Redefinition { name: String, reason: String },

    #[error("duplicate field `{name}` in `{type_name}`")]
    DuplicateField { type_name: String, name: String },

    #[error("bad expression: {0}")]
    BadExpression(String),

    #[error("truncated read of `{field}`: needed {needed} byte(s), {available} available")]
    Truncated {
        field: String,
        needed: usize,
        available: usize,
    },

    #[error("invalid bitfield `{field}`: {reason}")]
    InvalidBitfield { field: String, reason: String },

    #[error("value out of range for `{field}` ({bits}-bit): {value}")]
    ValueOutOfRange {
        field: String,
        bits: u32,
        value: i128,
    },

    #[error("null dereference: pointer `{field}` has no attached memory resolver")]
    NullDereference { field: String },
}

impl Error {
    pub(crate) fn truncated(field: impl Into<String>, needed: usize, available: usize) -> Self {
        Error::Truncated {
            field: field.into(),
            needed,
            available,
        }
    }

    pub(crate) fn bad_expression(message: impl Into<String>) -> Self {
        Error::BadExpression(message.into())
    }

    /// Prefixes the field path carried by codec errors with an enclosing
    /// field name, e.g. turning `b` into `outer.b` while an error bubbles
    /// up through nested structures.
    pub(crate) fn with_field_prefix(self, prefix: &str) -> Self {
        fn join(prefix: &str, field: String) -> String {
            if field.is_empty() {
                prefix.to_owned()
            } else {
                format!("{}.{}", prefix, field)
            }
        }
        match self {
            Error::Truncated {
                field,
                needed,
                available,
            } => Error::Truncated {
                field: join(prefix, field),
                needed,
                available,
            },
            Error::InvalidBitfield { field, reason } => Error::InvalidBitfield {
                field: join(prefix, field),
                reason,
            },
            Error::ValueOutOfRange { field, bits, value } => Error::ValueOutOfRange {
                field: join(prefix, field),
                bits,
                value,
            },
            Error::NullDereference { field } => Error::NullDereference {
                field: join(prefix, field),
            },
            other => other,
        }
    }
}

/// The crate-wide result alias.
pub type Result<T> = std::result::Result<T, Error>;
