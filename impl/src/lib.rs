// MIT License
//
// Copyright (c) 2019 Lukas Lueg (lukas.lueg@gmail.com)
//
// Permission is hereby granted, free of charge, to any person obtaining a copy
// of this software and associated documentation files (the "Software"), to deal
// in the Software without restriction, including without limitation the rights
// to use, copy, modify, merge, publish, distribute, sublicense, and/or sell
// copies of the Software, and to permit persons to whom the Software is
// furnished to do so, subject to the following conditions:
//
// The above copyright notice and this permission notice shall be included in all
// copies or substantial portions of the Software.
//
// THE SOFTWARE IS PROVIDED "AS IS", WITHOUT WARRANTY OF ANY KIND, EXPRESS OR
// IMPLIED, INCLUDING BUT NOT LIMITED TO THE WARRANTIES OF MERCHANTABILITY,
// FITNESS FOR A PARTICULAR PURPOSE AND NONINFRINGEMENT. IN NO EVENT SHALL THE
// AUTHORS OR COPYRIGHT HOLDERS BE LIABLE FOR ANY CLAIM, DAMAGES OR OTHER
// LIABILITY, WHETHER IN AN ACTION OF CONTRACT, TORT OR OTHERWISE, ARISING FROM,
// OUT OF OR IN CONNECTION WITH THE SOFTWARE OR THE USE OR OTHER DEALINGS IN THE
// SOFTWARE.

//! `cstruct` parses and emits binary data described by a small, C-like type
//! declaration language: `struct`/`union`/`enum`/`flag` definitions,
//! bitfields, arrays with fixed, expression-driven or sentinel-terminated
//! lengths, pointers and `#define` constants.
//!
//! A [`Registry`] loads definitions from source text and then reads and
//! writes values of any type it holds, by name, from anything that looks
//! like bytes:
//!
//! ```
//! use cstruct::Registry;
//!
//! let mut reg = Registry::new();
//! reg.load("struct Point { uint16 x; uint16 y; };").unwrap();
//!
//! let bytes = vec![1, 0, 2, 0];
//! let value = reg.read_bytes("Point", &bytes).unwrap();
//! assert_eq!(value.to_string(), "Point {x=1, y=2}");
//! ```

#![recursion_limit = "256"]

pub mod cursor;
pub mod error;
pub mod expr;
pub mod parser;
pub mod registry;
pub mod token;
pub mod types;
pub mod value;

pub use cursor::Cursor;
pub use error::{Error, Result};
pub use registry::Registry;
pub use types::{Endianness, Type, TypeKind};
pub use value::Value;

impl Registry {
    /// Convenience wrapper around [`Registry::read`] for an in-memory byte
    /// slice, used throughout the examples and tests.
    pub fn read_bytes(&self, type_name: &str, bytes: &[u8]) -> Result<Value> {
        let mut cursor = Cursor::from_bytes(bytes.to_vec());
        self.read(type_name, &mut cursor)
    }

    /// Encodes `value` as `type_name` and returns the resulting bytes.
    pub fn write_bytes(&self, type_name: &str, value: &Value) -> Result<Vec<u8>> {
        let mut cursor = Cursor::new_writer();
        self.write(type_name, &mut cursor, value)?;
        Ok(cursor.into_bytes())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn round_trips_a_struct_through_bytes() {
        let mut reg = Registry::new();
        reg.load("struct Point { uint16 x; uint16 y; };").unwrap();
        let bytes = vec![1, 0, 2, 0];
        let value = reg.read_bytes("Point", &bytes).unwrap();
        let out = reg.write_bytes("Point", &value).unwrap();
        assert_eq!(out, bytes);
    }
}
