//! Recursive-descent parser for the C-like definition language (spec §4.D).
//!
//! Parses `#define` constants, `typedef`s, and `struct`/`union`/`enum`/`flag`
//! definitions into [`Type`]s and constants that [`crate::registry::Registry`]
//! can merge in one transaction. Array-length expressions that only need
//! registry constants are folded immediately; anything referencing a sibling
//! field is kept as an AST and deferred to structure-read time.

use std::collections::HashMap;

use crate::error::{Error, Result};
use crate::expr::{self, Expr, Scope};
use crate::token::{tokenize, Tok, Token};
use crate::types::composite::{ArrayType, Count, EnumType, Field, PointerType, StructType};
use crate::types::primitive::{FloatBits, FloatType, IntegerType, Leb128Type};
use crate::types::{Endianness, Type, TypeKind};

/// Everything a single [`parse`] call contributes to a registry.
pub struct Definitions {
    /// Newly defined or typedef'd types, in declaration order.
    pub types: Vec<(String, Type)>,
    pub constants: Vec<(String, i128)>,
    pub enum_members: Vec<(String, i128)>,
}

/// Parses `text`, resolving type and constant references against `known`
/// (builtin keywords plus anything already committed to the registry) in
/// addition to whatever this pass defines along the way.
pub fn parse(
    text: &str,
    known_types: &HashMap<String, Type>,
    known_constants: &HashMap<String, i128>,
    known_enum_members: &HashMap<String, i128>,
    default_endianness: Endianness,
    pointer_bytes: usize,
) -> Result<Definitions> {
    let tokens = tokenize(text)?;
    let mut p = Parser {
        tokens,
        pos: 0,
        known_types,
        known_constants,
        known_enum_members,
        scratch_types: HashMap::new(),
        scratch_constants: HashMap::new(),
        scratch_enum_members: HashMap::new(),
        order: Vec::new(),
        default_endianness,
        pointer_bytes,
    };
    p.parse_file()?;
    let types = p
        .order
        .iter()
        .map(|name| {
            let ty = p.scratch_types.get(name).expect("recorded name must exist").clone();
            (name.clone(), ty)
        })
        .collect();
    Ok(Definitions {
        types,
        constants: p.scratch_constants.into_iter().collect(),
        enum_members: p.scratch_enum_members.into_iter().collect(),
    })
}

struct Parser<'a> {
    tokens: Vec<Token>,
    pos: usize,
    known_types: &'a HashMap<String, Type>,
    known_constants: &'a HashMap<String, i128>,
    known_enum_members: &'a HashMap<String, i128>,
    scratch_types: HashMap<String, Type>,
    scratch_constants: HashMap<String, i128>,
    scratch_enum_members: HashMap<String, i128>,
    order: Vec<String>,
    default_endianness: Endianness,
    pointer_bytes: usize,
}

/// What a base type specifier turned out to be: a name to resolve later
/// (possibly never, if it's only ever used as a pointer target), or an
/// already-fully-built type (inline anonymous struct/union/enum, or a
/// builtin keyword resolved on the spot).
enum BaseRef {
    Named(String),
    Inline(Type),
}

struct ParserScope<'p, 'a> {
    parser: &'p Parser<'a>,
}

impl<'p, 'a> Scope for ParserScope<'p, 'a> {
    fn get(&self, name: &str) -> Option<i128> {
        self.parser
            .scratch_constants
            .get(name)
            .or_else(|| self.parser.known_constants.get(name))
            .or_else(|| self.parser.scratch_enum_members.get(name))
            .or_else(|| self.parser.known_enum_members.get(name))
            .copied()
    }
}

impl<'a> Parser<'a> {
    fn scope(&self) -> ParserScope<'_, 'a> {
        ParserScope { parser: self }
    }

    fn peek(&self) -> &Tok {
        &self.tokens[self.pos].tok
    }

    fn err_here(&self, message: impl Into<String>) -> Error {
        Error::ParseError {
            line: self.tokens[self.pos].line,
            column: self.tokens[self.pos].column,
            message: message.into(),
        }
    }

    fn eat_hash(&mut self) -> bool {
        if matches!(self.peek(), Tok::Hash) {
            self.pos += 1;
            true
        } else {
            false
        }
    }

    fn peek_ident(&self, word: &str) -> bool {
        matches!(self.peek(), Tok::Ident(s) if s == word)
    }

    fn eat_ident_word(&mut self, word: &str) -> bool {
        if self.peek_ident(word) {
            self.pos += 1;
            true
        } else {
            false
        }
    }

    fn eat_any_ident(&mut self) -> Option<String> {
        if let Tok::Ident(s) = self.peek() {
            let s = s.clone();
            self.pos += 1;
            Some(s)
        } else {
            None
        }
    }

    fn eat_punct(&mut self, p: &str) -> bool {
        if matches!(self.peek(), Tok::Punct(found) if *found == p) {
            self.pos += 1;
            true
        } else {
            false
        }
    }

    fn expect_punct(&mut self, p: &str) -> Result<()> {
        if self.eat_punct(p) {
            Ok(())
        } else {
            Err(self.err_here(format!("expected `{}`, found {:?}", p, self.peek())))
        }
    }

    fn at_eof(&self) -> bool {
        matches!(self.peek(), Tok::Eof)
    }

    fn cur_line(&self) -> usize {
        self.tokens[self.pos].line
    }

    fn parse_file(&mut self) -> Result<()> {
        while !self.at_eof() {
            self.parse_top_level()?;
        }
        Ok(())
    }

    fn parse_top_level(&mut self) -> Result<()> {
        if self.eat_hash() {
            return self.parse_directive();
        }
        if self.eat_ident_word("typedef") {
            return self.parse_typedef();
        }
        let _ = self.parse_base()?;
        self.skip_attributes();
        self.expect_punct(";")?;
        Ok(())
    }

    fn parse_directive(&mut self) -> Result<()> {
        let line = self.cur_line();
        let word = self
            .eat_any_ident()
            .ok_or_else(|| self.err_here("expected preprocessor directive name"))?;
        match word.as_str() {
            "define" => {
                let name = self
                    .eat_any_ident()
                    .ok_or_else(|| self.err_here("expected macro name"))?;
                let start = self.pos;
                while !self.at_eof() && self.cur_line() == line {
                    self.pos += 1;
                }
                let value_tokens = &self.tokens[start..self.pos];
                if value_tokens.is_empty() {
                    return Err(self.err_here(format!("#define {} has no value", name)));
                }
                let (expr, consumed) = expr::parse_expr(value_tokens, 0)
                    .map_err(|m| Error::ParseError { line, column: 1, message: m })?;
                if consumed != value_tokens.len() {
                    return Err(Error::ParseError {
                        line,
                        column: 1,
                        message: format!("unexpected trailing tokens in #define {}", name),
                    });
                }
                let value = expr::eval(&expr, &self.scope()).map_err(|e| Error::ParseError {
                    line,
                    column: 1,
                    message: format!("#define {}: {}", name, e),
                })?;
                self.scratch_constants.insert(name, value);
                Ok(())
            }
            "include" => {
                if let Tok::Str(path) = self.peek().clone() {
                    self.pos += 1;
                    log::warn!("ignoring #include \"{}\": multi-file includes are not supported", path);
                } else {
                    log::warn!("ignoring malformed #include directive");
                }
                while !self.at_eof() && self.cur_line() == line {
                    self.pos += 1;
                }
                Ok(())
            }
            other => {
                log::warn!("ignoring unsupported preprocessor directive `#{}`", other);
                while !self.at_eof() && self.cur_line() == line {
                    self.pos += 1;
                }
                Ok(())
            }
        }
    }

    /// Consumes trailing `__attribute__((...))` / `__packed__` noise that
    /// some header dumps carry; neither affects layout here.
    fn skip_attributes(&mut self) {
        loop {
            if self.eat_ident_word("__packed__") || self.eat_ident_word("__attribute__") {
                if self.eat_punct("(") {
                    let mut depth = 1;
                    while depth > 0 && !self.at_eof() {
                        if self.eat_punct("(") {
                            depth += 1;
                        } else if self.eat_punct(")") {
                            depth -= 1;
                        } else {
                            self.pos += 1;
                        }
                    }
                }
                continue;
            }
            break;
        }
    }

    fn register(&mut self, name: String, ty: Type) -> Result<()> {
        if self.scratch_types.contains_key(&name) {
            return Err(Error::Redefinition {
                name,
                reason: "a type with this name was already fully defined earlier in this same declaration text".into(),
            });
        }
        self.order.push(name.clone());
        self.scratch_types.insert(name, ty);
        Ok(())
    }

    fn lookup_type(&self, name: &str) -> Option<Type> {
        self.scratch_types
            .get(name)
            .or_else(|| self.known_types.get(name))
            .cloned()
    }

    fn parse_typedef(&mut self) -> Result<()> {
        let base = self.parse_base()?;
        let ty = if self.eat_punct("*") {
            let target_name = match base {
                BaseRef::Named(n) => n,
                BaseRef::Inline(_) => {
                    return Err(self.err_here("cannot typedef a pointer to an inline anonymous type"))
                }
            };
            Type {
                name: target_name.clone(),
                endianness: self.default_endianness,
                kind: TypeKind::Pointer(PointerType {
                    target_name,
                    pointer_bytes: self.pointer_bytes,
                }),
            }
        } else {
            self.resolve_base(base)?
        };
        let alias = self
            .eat_any_ident()
            .ok_or_else(|| self.err_here("expected typedef alias name"))?;
        let ty = if self.eat_punct("[") {
            let count = self.parse_count(&ty)?;
            self.expect_punct("]")?;
            Type {
                name: alias.clone(),
                endianness: ty.endianness,
                kind: TypeKind::Array(Box::new(ArrayType { element: ty, count })),
            }
        } else {
            ty
        };
        self.skip_attributes();
        self.expect_punct(";")?;
        let mut named = ty;
        named.name = alias.clone();
        self.register(alias, named)
    }

    /// Parses a base type specifier: a builtin keyword, a reference to an
    /// already-known named type, or an inline struct/union/enum/flag
    /// definition (registering it under its tag, if any).
    fn parse_base(&mut self) -> Result<BaseRef> {
        if self.peek_ident("struct") || self.peek_ident("union") {
            let is_union = self.peek_ident("union");
            self.pos += 1;
            let tag = self.eat_any_ident();
            if self.eat_punct("{") {
                let fields = self.parse_field_list()?;
                self.expect_punct("}")?;
                self.skip_attributes();
                let st = StructType::new(fields, is_union)
                    .map_err(|e| self.err_here(e.to_string()))?;
                let type_name = tag.clone().unwrap_or_else(|| "<anonymous>".to_string());
                let kind = if is_union {
                    TypeKind::Union(Box::new(st))
                } else {
                    TypeKind::Struct(Box::new(st))
                };
                let ty = Type {
                    name: type_name,
                    endianness: self.default_endianness,
                    kind,
                };
                if let Some(tag) = tag {
                    self.register(tag.clone(), ty.clone())?;
                    return Ok(BaseRef::Named(tag));
                }
                return Ok(BaseRef::Inline(ty));
            }
            let tag = tag.ok_or_else(|| self.err_here("expected struct/union tag or body"))?;
            // Forward declaration: `struct Foo;` with no body yet. Valid as
            // long as it is only ever used through a pointer.
            return Ok(BaseRef::Named(tag));
        }

        if self.peek_ident("enum") || self.peek_ident("flag") {
            let is_flag = self.peek_ident("flag");
            self.pos += 1;
            let tag = self.eat_any_ident();
            let base = if self.eat_punct(":") {
                let base_base = self.parse_base()?;
                self.resolve_base(base_base)?
            } else {
                self.lookup_type("uint32").expect("uint32 builtin must exist")
            };
            let base_int = match base.kind {
                TypeKind::Integer(it) => it,
                _ => return Err(self.err_here("enum/flag base type must be an integer")),
            };
            self.expect_punct("{")?;
            let members = self.parse_enum_members()?;
            self.expect_punct("}")?;
            self.skip_attributes();
            for (name, value) in &members {
                self.scratch_enum_members.insert(name.clone(), *value);
            }
            let enum_type = EnumType {
                base: base_int,
                members,
                is_flag,
            };
            let type_name = tag.clone().unwrap_or_else(|| "<anonymous>".to_string());
            let kind = if is_flag {
                TypeKind::Flag(enum_type)
            } else {
                TypeKind::Enum(enum_type)
            };
            let ty = Type {
                name: type_name,
                endianness: self.default_endianness,
                kind,
            };
            if let Some(tag) = tag {
                self.register(tag.clone(), ty)?;
                return Ok(BaseRef::Named(tag));
            }
            return Ok(BaseRef::Inline(ty));
        }

        let name = self
            .eat_any_ident()
            .ok_or_else(|| self.err_here(format!("expected a type name, found {:?}", self.peek())))?;
        Ok(BaseRef::Named(name))
    }

    fn resolve_base(&self, base: BaseRef) -> Result<Type> {
        match base {
            BaseRef::Inline(ty) => Ok(ty),
            BaseRef::Named(name) => self
                .lookup_type(&name)
                .ok_or_else(|| Error::UnknownType { name }),
        }
    }

    /// Enum and flag members share one auto-numbering rule: no explicit
    /// value takes the previous member's value + 1, starting at 0.
    fn parse_enum_members(&mut self) -> Result<Vec<(String, i128)>> {
        let mut members = Vec::new();
        let mut next_auto: i128 = 0;
        loop {
            if matches!(self.peek(), Tok::Punct("}")) {
                break;
            }
            let name = self
                .eat_any_ident()
                .ok_or_else(|| self.err_here("expected enum/flag member name"))?;
            let value = if self.eat_punct("=") {
                let (expr, _) = self.parse_expr_here()?;
                expr::eval(&expr, &self.scope()).map_err(|e| self.err_here(e.to_string()))?
            } else {
                next_auto
            };
            next_auto = value + 1;
            members.push((name, value));
            if !self.eat_punct(",") {
                break;
            }
        }
        Ok(members)
    }

    fn parse_expr_here(&mut self) -> Result<(Expr, usize)> {
        let line = self.tokens[self.pos].line;
        let col = self.tokens[self.pos].column;
        let (e, next) = expr::parse_expr(&self.tokens, self.pos)
            .map_err(|m| Error::ParseError { line, column: col, message: m })?;
        let consumed = next - self.pos;
        self.pos = next;
        Ok((e, consumed))
    }

    fn parse_field_list(&mut self) -> Result<Vec<Field>> {
        let mut fields = Vec::new();
        while !matches!(self.peek(), Tok::Punct("}")) {
            let field = self.parse_field_decl()?;
            check_duplicate(&fields, &field)?;
            fields.push(field);
        }
        Ok(fields)
    }

    fn parse_field_decl(&mut self) -> Result<Field> {
        let base = self.parse_base()?;

        if self.eat_punct("*") {
            let target_name = match base {
                BaseRef::Named(n) => n,
                BaseRef::Inline(_) => {
                    return Err(self.err_here("cannot form a pointer to an inline anonymous type"))
                }
            };
            let name = self
                .eat_any_ident()
                .ok_or_else(|| self.err_here("expected field name"))?;
            let ty = Type {
                name: target_name.clone(),
                endianness: self.default_endianness,
                kind: TypeKind::Pointer(PointerType {
                    target_name,
                    pointer_bytes: self.pointer_bytes,
                }),
            };
            self.skip_attributes();
            self.expect_punct(";")?;
            return Ok(Field {
                name: Some(name),
                ty,
                bit_width: None,
                offset: None,
            });
        }

        let base_ty = self.resolve_base(base)?;
        let name = self.eat_any_ident();

        let bit_width = if self.eat_punct(":") {
            let (expr, _) = self.parse_expr_here()?;
            let v = expr::eval(&expr, &self.scope()).map_err(|e| self.err_here(e.to_string()))?;
            let storage_bits = base_ty_bits(&base_ty).ok_or_else(|| {
                self.err_here("bitfield storage type must be an integer, enum or flag")
            })?;
            if v <= 0 || v as u32 > storage_bits {
                return Err(self.err_here(format!(
                    "bitfield width {} does not fit in {}-bit storage",
                    v, storage_bits
                )));
            }
            Some(v as u32)
        } else {
            None
        };

        let final_ty = if self.eat_punct("[") {
            let count = self.parse_count(&base_ty)?;
            self.expect_punct("]")?;
            Type {
                name: "[]".into(),
                endianness: base_ty.endianness,
                kind: TypeKind::Array(Box::new(ArrayType {
                    element: base_ty,
                    count,
                })),
            }
        } else {
            base_ty
        };

        self.skip_attributes();
        self.expect_punct(";")?;

        let name = match (&final_ty.kind, name) {
            (TypeKind::Struct(_), None) | (TypeKind::Union(_), None) => None,
            (_, Some(n)) => Some(n),
            (_, None) => return Err(self.err_here("expected field name")),
        };

        Ok(Field {
            name,
            ty: final_ty,
            bit_width,
            offset: None,
        })
    }

    fn parse_count(&mut self, element: &Type) -> Result<Count> {
        if matches!(self.peek(), Tok::Punct("]")) {
            return Ok(Count::Sentinel);
        }
        if self.eat_ident_word("NULL") || self.eat_ident_word("none") {
            return Ok(Count::Sentinel);
        }
        let (expr, _) = self.parse_expr_here()?;
        let _ = element;
        match expr::try_fold(&expr, &self.scope()).map_err(|e| self.err_here(e.to_string()))? {
            Some(v) if v >= 0 => Ok(Count::Fixed(v as usize)),
            Some(_) => Err(self.err_here("array length evaluated to a negative number")),
            None => Ok(Count::Expr(expr)),
        }
    }
}

fn base_ty_bits(ty: &Type) -> Option<u32> {
    match &ty.kind {
        TypeKind::Integer(it) => Some(it.bits),
        TypeKind::Enum(e) | TypeKind::Flag(e) => Some(e.base.bits),
        _ => None,
    }
}

/// The names a field contributes to its enclosing struct/union's namespace:
/// its own name, or — for a promoted anonymous inner struct/union — every
/// name its own fields contribute, recursively (mirrors the read-time
/// lookup walk in `value.rs`'s `StructValue::get`).
fn promoted_names(field: &Field, out: &mut Vec<String>) {
    match &field.name {
        Some(name) => out.push(name.clone()),
        None => {
            let inner = match &field.ty.kind {
                TypeKind::Struct(st) | TypeKind::Union(st) => Some(st),
                _ => None,
            };
            if let Some(st) = inner {
                for f in &st.fields {
                    promoted_names(f, out);
                }
            }
        }
    }
}

fn check_duplicate(existing: &[Field], field: &Field) -> Result<()> {
    let mut existing_names = Vec::new();
    for f in existing {
        promoted_names(f, &mut existing_names);
    }
    let mut new_names = Vec::new();
    promoted_names(field, &mut new_names);
    for name in &new_names {
        if existing_names.contains(name) {
            return Err(Error::DuplicateField {
                type_name: String::new(),
                name: name.clone(),
            });
        }
    }
    Ok(())
}

/// Builds the table of builtin keyword types (spec's normative base-type
/// table). Called once by [`crate::registry::Registry::new`].
pub fn builtin_types(endianness: Endianness, pointer_bytes: usize) -> HashMap<String, Type> {
    let mut m = HashMap::new();
    let mut put = |name: &str, kind: TypeKind| {
        m.insert(
            name.to_string(),
            Type {
                name: name.to_string(),
                endianness,
                kind,
            },
        );
    };
    put("int8", TypeKind::Integer(IntegerType { signed: true, bits: 8 }));
    put("uint8", TypeKind::Integer(IntegerType { signed: false, bits: 8 }));
    put("int16", TypeKind::Integer(IntegerType { signed: true, bits: 16 }));
    put("uint16", TypeKind::Integer(IntegerType { signed: false, bits: 16 }));
    put("int24", TypeKind::Integer(IntegerType { signed: true, bits: 24 }));
    put("uint24", TypeKind::Integer(IntegerType { signed: false, bits: 24 }));
    put("int32", TypeKind::Integer(IntegerType { signed: true, bits: 32 }));
    put("uint32", TypeKind::Integer(IntegerType { signed: false, bits: 32 }));
    put("int48", TypeKind::Integer(IntegerType { signed: true, bits: 48 }));
    put("uint48", TypeKind::Integer(IntegerType { signed: false, bits: 48 }));
    put("int64", TypeKind::Integer(IntegerType { signed: true, bits: 64 }));
    put("uint64", TypeKind::Integer(IntegerType { signed: false, bits: 64 }));
    put("float16", TypeKind::Float(FloatType { bits: FloatBits::F16 }));
    put("float", TypeKind::Float(FloatType { bits: FloatBits::F32 }));
    put("double", TypeKind::Float(FloatType { bits: FloatBits::F64 }));
    put("leb128", TypeKind::Leb128(Leb128Type { signed: true }));
    put("uleb128", TypeKind::Leb128(Leb128Type { signed: false }));
    put("void", TypeKind::Void);
    put("wchar", TypeKind::Wchar);
    put("char", TypeKind::Char);
    let _ = pointer_bytes;
    m
}

#[cfg(test)]
mod tests {
    use super::*;

    fn parse_fresh(text: &str) -> Definitions {
        let known = builtin_types(Endianness::Little, 8);
        parse(text, &known, &HashMap::new(), &HashMap::new(), Endianness::Little, 8).unwrap()
    }

    #[test]
    fn struct_with_sibling_length_array() {
        let defs = parse_fresh("struct S { uint8 n; uint8 data[n]; };");
        let (name, ty) = &defs.types[0];
        assert_eq!(name, "S");
        match &ty.kind {
            TypeKind::Struct(st) => {
                assert_eq!(st.fields.len(), 2);
                assert!(matches!(
                    &st.fields[1].ty.kind,
                    TypeKind::Array(a) if matches!(a.count, Count::Expr(_))
                ));
            }
            _ => panic!("expected struct"),
        }
    }

    #[test]
    fn define_constant_folds_into_fixed_array() {
        let defs = parse_fresh("#define N 4\nstruct S { uint8 data[N]; };");
        assert_eq!(defs.constants, vec![("N".to_string(), 4)]);
        let (_, ty) = &defs.types[0];
        match &ty.kind {
            TypeKind::Struct(st) => {
                assert!(matches!(&st.fields[0].ty.kind, TypeKind::Array(a) if matches!(a.count, Count::Fixed(4))));
            }
            _ => panic!("expected struct"),
        }
    }

    #[test]
    fn enum_members_auto_increment() {
        let defs = parse_fresh("enum E { A, B, C = 5, D };");
        let map: HashMap<_, _> = defs.enum_members.into_iter().collect();
        assert_eq!(map["A"], 0);
        assert_eq!(map["B"], 1);
        assert_eq!(map["C"], 5);
        assert_eq!(map["D"], 6);
    }

    #[test]
    fn flag_members_auto_increment_like_enum() {
        let defs = parse_fresh("flag F { A, B, C };");
        let map: HashMap<_, _> = defs.enum_members.into_iter().collect();
        assert_eq!(map["A"], 0);
        assert_eq!(map["B"], 1);
        assert_eq!(map["C"], 2);
    }

    #[test]
    fn self_referential_pointer_does_not_require_prior_definition() {
        let defs = parse_fresh("struct Node { uint32 value; struct Node *next; };");
        let (_, ty) = &defs.types[0];
        match &ty.kind {
            TypeKind::Struct(st) => {
                assert!(matches!(&st.fields[1].ty.kind, TypeKind::Pointer(p) if p.target_name == "Node"));
            }
            _ => panic!("expected struct"),
        }
    }

    #[test]
    fn bitfield_width_exceeding_storage_is_rejected() {
        let known = builtin_types(Endianness::Little, 8);
        let result = parse(
            "struct B { uint8 a : 9; };",
            &known,
            &HashMap::new(),
            &HashMap::new(),
            Endianness::Little,
            8,
        );
        assert!(result.is_err());
    }

    #[test]
    fn anonymous_union_field_is_promoted() {
        let defs = parse_fresh("struct S { union { uint32 a; uint8 b[4]; }; };");
        let (_, ty) = &defs.types[0];
        match &ty.kind {
            TypeKind::Struct(st) => {
                assert_eq!(st.fields.len(), 1);
                assert!(st.fields[0].name.is_none());
                assert!(matches!(&st.fields[0].ty.kind, TypeKind::Union(_)));
            }
            _ => panic!("expected struct"),
        }
    }

    #[test]
    fn promoted_name_colliding_with_outer_sibling_is_duplicate_field() {
        let known = builtin_types(Endianness::Little, 8);
        let result = parse(
            "struct S { uint8 a; struct { uint8 a; }; };",
            &known,
            &HashMap::new(),
            &HashMap::new(),
            Endianness::Little,
            8,
        );
        assert!(matches!(result, Err(Error::DuplicateField { .. })));
    }

    #[test]
    fn second_full_definition_of_same_tag_in_one_load_is_redefinition() {
        let known = builtin_types(Endianness::Little, 8);
        let result = parse(
            "struct S { uint8 a; }; struct S { uint8 b; };",
            &known,
            &HashMap::new(),
            &HashMap::new(),
            Endianness::Little,
            8,
        );
        assert!(matches!(result, Err(Error::Redefinition { .. })));
    }

    #[test]
    fn forward_declaration_then_one_full_definition_is_fine() {
        let defs = parse_fresh("struct S; struct S { uint8 a; };");
        assert_eq!(defs.types.len(), 1);
    }
}
