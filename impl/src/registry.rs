//! The type registry (spec §4.G): owns every named type, constant and
//! enum/flag member, and is the [`Scope`] consulted for identifiers that
//! aren't sibling fields.

use std::collections::HashMap;

use crate::error::{Error, Result};
use crate::expr::Scope;
use crate::parser::{self, Definitions};
use crate::types::composite::MemoryResolver;
use crate::types::{Endianness, Type};
use crate::value::Value;

/// Holds every type, constant and enum/flag member known so far, and knows
/// how to read/write values of any type it holds by name.
pub struct Registry {
    types: HashMap<String, Type>,
    constants: HashMap<String, i128>,
    enum_members: HashMap<String, i128>,
    endianness: Endianness,
    pointer_bytes: usize,
}

impl Registry {
    pub fn new() -> Self {
        Self::with_endianness(Endianness::Little)
    }

    pub fn with_endianness(endianness: Endianness) -> Self {
        let pointer_bytes = 8;
        Registry {
            types: parser::builtin_types(endianness, pointer_bytes),
            constants: HashMap::new(),
            enum_members: HashMap::new(),
            endianness,
            pointer_bytes,
        }
    }

    /// Rebuilds the builtin keyword table for a new pointer width; any
    /// custom types already loaded are preserved.
    pub fn with_pointer_size(mut self, pointer_bytes: usize) -> Self {
        self.pointer_bytes = pointer_bytes;
        for (name, ty) in parser::builtin_types(self.endianness, pointer_bytes) {
            self.types.entry(name).or_insert(ty);
        }
        self
    }

    pub fn endianness(&self) -> Endianness {
        self.endianness
    }

    pub fn pointer_bytes(&self) -> usize {
        self.pointer_bytes
    }

    /// Parses `text` and merges the result into the registry. Parsing and
    /// merging happen against a read-only snapshot of the current state, so
    /// a definition file that fails partway through leaves the registry
    /// completely unchanged (spec's "load is transactional").
    pub fn load(&mut self, text: &str) -> Result<()> {
        let Definitions {
            types,
            constants,
            enum_members,
        } = parser::parse(
            text,
            &self.types,
            &self.constants,
            &self.enum_members,
            self.endianness,
            self.pointer_bytes,
        )?;

        for (name, _) in &types {
            if self.types.contains_key(name) {
                return Err(Error::Redefinition {
                    name: name.clone(),
                    reason: "a type with this name already exists in the registry".into(),
                });
            }
        }
        for (name, _) in &constants {
            if self.constants.contains_key(name) {
                return Err(Error::Redefinition {
                    name: name.clone(),
                    reason: "a constant with this name already exists in the registry".into(),
                });
            }
        }

        for (name, ty) in types {
            self.types.insert(name, ty);
        }
        for (name, value) in constants {
            self.constants.insert(name, value);
        }
        for (name, value) in enum_members {
            self.enum_members.insert(name, value);
        }
        Ok(())
    }

    /// Registers a type built directly through the API rather than parsed
    /// from text (e.g. a type assembled programmatically).
    pub fn add_custom_type(&mut self, name: impl Into<String>, ty: Type) -> Result<()> {
        let name = name.into();
        if self.types.contains_key(&name) {
            return Err(Error::Redefinition {
                name,
                reason: "a type with this name already exists in the registry".into(),
            });
        }
        self.types.insert(name, ty);
        Ok(())
    }

    /// Registers `alias` as a transparent name for `target` by cloning and
    /// renaming it (spec's typedef: "a transparent name for another type").
    pub fn typedef(&mut self, alias: impl Into<String>, target: &str) -> Result<()> {
        let alias = alias.into();
        let mut ty = self
            .lookup(target)
            .cloned()
            .ok_or_else(|| Error::UnknownType { name: target.to_owned() })?;
        ty.name = alias.clone();
        self.add_custom_type(alias, ty)
    }

    pub fn lookup(&self, name: &str) -> Option<&Type> {
        self.types.get(name)
    }

    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.types.keys().map(|s| s.as_str())
    }

    /// Evaluates a standalone constant expression, e.g. one typed
    /// interactively or embedded in a host application, against this
    /// registry's constants and enum members.
    pub fn resolve(&self, expression: &str) -> Result<i128> {
        let tokens = crate::token::tokenize(expression)?;
        let (expr, next) = crate::expr::parse_expr(&tokens, 0)
            .map_err(|m| Error::bad_expression(m))?;
        if !matches!(tokens.get(next).map(|t| &t.tok), Some(crate::token::Tok::Eof)) {
            return Err(Error::bad_expression("unexpected trailing tokens"));
        }
        crate::expr::eval(&expr, self).map_err(|e| Error::bad_expression(e.to_string()))
    }

    /// Reads one instance of `type_name` from `cursor`.
    pub fn read(&self, type_name: &str, cursor: &mut crate::cursor::Cursor) -> Result<Value> {
        let ty = self
            .lookup(type_name)
            .ok_or_else(|| Error::UnknownType { name: type_name.to_owned() })?;
        ty.read(cursor, self)
    }

    /// Writes `value`, encoded as `type_name`, to `cursor`.
    pub fn write(&self, type_name: &str, cursor: &mut crate::cursor::Cursor, value: &Value) -> Result<()> {
        let ty = self
            .lookup(type_name)
            .ok_or_else(|| Error::UnknownType { name: type_name.to_owned() })?;
        ty.write(cursor, value)
    }

    /// The type's own default (zero-equivalent) instance.
    pub fn default(&self, type_name: &str) -> Result<Value> {
        let ty = self
            .lookup(type_name)
            .ok_or_else(|| Error::UnknownType { name: type_name.to_owned() })?;
        Ok(ty.default())
    }

    /// Follows a [`Value::Pointer`] using `resolver` to supply the bytes at
    /// its address, then decodes the target type from them. Fails with
    /// [`Error::NullDereference`] if the resolver can't supply enough bytes
    /// (including the case of a genuinely null/dangling address).
    pub fn dereference(&self, value: &Value, resolver: &dyn MemoryResolver) -> Result<Value> {
        let (address, target_name) = match value {
            Value::Pointer { address, target_name } => (*address, target_name.as_str()),
            _ => return Err(Error::bad_expression("expected a pointer value")),
        };
        let ty = self
            .lookup(target_name)
            .ok_or_else(|| Error::UnknownType { name: target_name.to_owned() })?;
        if resolver.read_at(address, 1).is_none() {
            return Err(Error::NullDereference {
                field: target_name.to_owned(),
            });
        }
        let mut cursor = crate::cursor::Cursor::from_reader(ResolverReader {
            resolver,
            pos: address,
        });
        ty.read(&mut cursor, self)
    }
}

/// Adapts a [`MemoryResolver`] into a [`std::io::Read`] starting at a fixed
/// address, letting [`crate::cursor::Cursor`] pull dereferenced bytes
/// on-demand regardless of whether the target type is statically sized.
struct ResolverReader<'a> {
    resolver: &'a dyn MemoryResolver,
    pos: u64,
}

impl<'a> std::io::Read for ResolverReader<'a> {
    fn read(&mut self, buf: &mut [u8]) -> std::io::Result<usize> {
        match self.resolver.read_at(self.pos, buf.len()) {
            Some(bytes) => {
                let n = bytes.len().min(buf.len());
                buf[..n].copy_from_slice(&bytes[..n]);
                self.pos += n as u64;
                Ok(n)
            }
            None => Ok(0),
        }
    }
}

impl Default for Registry {
    fn default() -> Self {
        Self::new()
    }
}

impl Scope for Registry {
    fn get(&self, name: &str) -> Option<i128> {
        self.constants
            .get(name)
            .or_else(|| self.enum_members.get(name))
            .copied()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn loads_and_reads_a_simple_struct() {
        let mut r = Registry::new();
        r.load("struct Point { uint16 x; uint16 y; };").unwrap();
        let mut c = crate::cursor::Cursor::from_bytes(vec![1, 0, 2, 0]);
        let v = r.read("Point", &mut c).unwrap();
        assert_eq!(v.get("x"), Some(&Value::Int(1)));
        assert_eq!(v.get("y"), Some(&Value::Int(2)));
    }

    #[test]
    fn load_is_transactional_on_redefinition() {
        let mut r = Registry::new();
        r.load("struct Point { uint16 x; };").unwrap();
        let before = r.names().count();
        let result = r.load("#define N 1\nstruct Point { uint16 x; };");
        assert!(result.is_err());
        assert_eq!(r.names().count(), before);
        assert!(r.resolve("N").is_err());
    }

    #[test]
    fn typedef_clones_and_renames() {
        let mut r = Registry::new();
        r.typedef("Byte", "uint8").unwrap();
        assert!(r.lookup("Byte").is_some());
        assert_eq!(r.lookup("Byte").unwrap().name, "Byte");
    }

    #[test]
    fn resolve_evaluates_against_constants() {
        let mut r = Registry::new();
        r.load("#define SIZE (4 + 4)\n").unwrap();
        assert_eq!(r.resolve("SIZE * 2").unwrap(), 16);
    }
}
