//! Constant integer expression evaluator (spec §4.B).
//!
//! All arithmetic is carried out in `i128`: wide enough to hold the full
//! range of an unsigned 64-bit value plus sign, so intermediate
//! computations never silently wrap before a result is narrowed to its
//! declared width at the point of use (resolved Open Question, see
//! `SPEC_FULL.md`).

use crate::token::{Tok, Token};

/// An identifier lookup used while evaluating an [`Expr`].
///
/// Implementations chain sources per spec's lookup order: sibling field
/// values first, then registry constants, then enum/flag members.
pub trait Scope {
    fn get(&self, name: &str) -> Option<i128>;
}

impl Scope for () {
    fn get(&self, _name: &str) -> Option<i128> {
        None
    }
}

impl Scope for dyn Scope + '_ {
    fn get(&self, name: &str) -> Option<i128> {
        (*self).get(name)
    }
}

/// Two scopes tried in order; used to chain sibling fields in front of the
/// registry's constants and enum members.
pub struct Chain<'a, A: Scope, B: Scope>(pub &'a A, pub &'a B);

impl<'a, A: Scope, B: Scope> Scope for Chain<'a, A, B> {
    fn get(&self, name: &str) -> Option<i128> {
        self.0.get(name).or_else(|| self.1.get(name))
    }
}

#[derive(Clone, Debug, PartialEq)]
pub enum Expr {
    Lit(i128),
    Ident(String),
    Unary(UnOp, Box<Expr>),
    Binary(BinOp, Box<Expr>, Box<Expr>),
    Ternary(Box<Expr>, Box<Expr>, Box<Expr>),
}

#[derive(Clone, Copy, Debug, PartialEq)]
pub enum UnOp {
    Neg,
    Pos,
    Not,
    BitNot,
}

#[derive(Clone, Copy, Debug, PartialEq)]
pub enum BinOp {
    Add,
    Sub,
    Mul,
    Div,
    Rem,
    Shl,
    Shr,
    BitAnd,
    BitOr,
    BitXor,
    And,
    Or,
    Eq,
    Ne,
    Lt,
    Le,
    Gt,
    Ge,
}

/// An error from expression evaluation, distinct from the crate's public
/// [`crate::Error`]. `UnresolvedIdentifier` is the only variant the
/// definition parser treats as "defer to read time" rather than fatal
/// (spec §4.D: a sibling-referencing array-length expression cannot be
/// folded until the structure is actually decoded).
#[derive(Clone, Debug, PartialEq)]
pub enum EvalError {
    UnresolvedIdentifier(String),
    DivisionByZero,
    ShiftOverflow,
}

impl std::fmt::Display for EvalError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            EvalError::UnresolvedIdentifier(name) => write!(f, "unknown identifier `{}`", name),
            EvalError::DivisionByZero => write!(f, "division by zero"),
            EvalError::ShiftOverflow => write!(f, "shift amount exceeds operand width"),
        }
    }
}

type PResult<T> = std::result::Result<T, String>;

/// Parses a full expression starting at `tokens[pos]`, returning the AST and
/// the index of the first token after it.
pub fn parse_expr(tokens: &[Token], pos: usize) -> PResult<(Expr, usize)> {
    parse_ternary(tokens, pos)
}

fn parse_ternary(tokens: &[Token], pos: usize) -> PResult<(Expr, usize)> {
    let (cond, mut pos) = parse_binary(tokens, pos, 0)?;
    if is_punct(tokens, pos, "?") {
        pos += 1;
        let (then_branch, next) = parse_ternary(tokens, pos)?;
        pos = next;
        expect_punct(tokens, pos, ":")?;
        pos += 1;
        let (else_branch, next) = parse_ternary(tokens, pos)?;
        pos = next;
        return Ok((
            Expr::Ternary(Box::new(cond), Box::new(then_branch), Box::new(else_branch)),
            pos,
        ));
    }
    Ok((cond, pos))
}

/// Binding power table, weakest first; `||` binds loosest, `*` `/` `%`
/// tightest (unary/primary are handled separately, above all of these).
const PREC_LEVELS: &[&[(&str, BinOp)]] = &[
    &[("||", BinOp::Or)],
    &[("&&", BinOp::And)],
    &[("|", BinOp::BitOr)],
    &[("^", BinOp::BitXor)],
    &[("&", BinOp::BitAnd)],
    &[("==", BinOp::Eq), ("!=", BinOp::Ne)],
    &[
        ("<", BinOp::Lt),
        ("<=", BinOp::Le),
        (">", BinOp::Gt),
        (">=", BinOp::Ge),
    ],
    &[("<<", BinOp::Shl), (">>", BinOp::Shr)],
    &[("+", BinOp::Add), ("-", BinOp::Sub)],
    &[("*", BinOp::Mul), ("/", BinOp::Div), ("%", BinOp::Rem)],
];

fn parse_binary(tokens: &[Token], pos: usize, level: usize) -> PResult<(Expr, usize)> {
    if level >= PREC_LEVELS.len() {
        return parse_unary(tokens, pos);
    }
    let (mut lhs, mut pos) = parse_binary(tokens, pos, level + 1)?;
    loop {
        let matched = PREC_LEVELS[level]
            .iter()
            .find(|(p, _)| is_punct(tokens, pos, p));
        match matched {
            Some((p, op)) => {
                pos += 1;
                let _ = p;
                let (rhs, next) = parse_binary(tokens, pos, level + 1)?;
                lhs = Expr::Binary(*op, Box::new(lhs), Box::new(rhs));
                pos = next;
            }
            None => break,
        }
    }
    Ok((lhs, pos))
}

fn parse_unary(tokens: &[Token], pos: usize) -> PResult<(Expr, usize)> {
    if is_punct(tokens, pos, "-") {
        let (e, next) = parse_unary(tokens, pos + 1)?;
        return Ok((Expr::Unary(UnOp::Neg, Box::new(e)), next));
    }
    if is_punct(tokens, pos, "+") {
        let (e, next) = parse_unary(tokens, pos + 1)?;
        return Ok((Expr::Unary(UnOp::Pos, Box::new(e)), next));
    }
    if is_punct(tokens, pos, "~") {
        let (e, next) = parse_unary(tokens, pos + 1)?;
        return Ok((Expr::Unary(UnOp::BitNot, Box::new(e)), next));
    }
    if is_punct(tokens, pos, "!") {
        let (e, next) = parse_unary(tokens, pos + 1)?;
        return Ok((Expr::Unary(UnOp::Not, Box::new(e)), next));
    }
    parse_primary(tokens, pos)
}

fn parse_primary(tokens: &[Token], pos: usize) -> PResult<(Expr, usize)> {
    match tokens.get(pos).map(|t| &t.tok) {
        Some(Tok::Int(v)) => Ok((Expr::Lit(*v), pos + 1)),
        Some(Tok::Ident(name)) => Ok((Expr::Ident(name.clone()), pos + 1)),
        Some(Tok::Punct("(")) => {
            let (e, next) = parse_ternary(tokens, pos + 1)?;
            expect_punct(tokens, next, ")")?;
            Ok((e, next + 1))
        }
        other => Err(format!("expected expression, found {:?}", other)),
    }
}

fn is_punct(tokens: &[Token], pos: usize, p: &str) -> bool {
    matches!(tokens.get(pos).map(|t| &t.tok), Some(Tok::Punct(found)) if *found == p)
}

fn expect_punct(tokens: &[Token], pos: usize, p: &str) -> PResult<()> {
    if is_punct(tokens, pos, p) {
        Ok(())
    } else {
        Err(format!(
            "expected `{}`, found {:?}",
            p,
            tokens.get(pos).map(|t| &t.tok)
        ))
    }
}

/// Evaluates `expr` against `scope`. Pure and deterministic (spec §4.B).
pub fn eval(expr: &Expr, scope: &dyn Scope) -> std::result::Result<i128, EvalError> {
    match expr {
        Expr::Lit(v) => Ok(*v),
        Expr::Ident(name) => scope
            .get(name)
            .ok_or_else(|| EvalError::UnresolvedIdentifier(name.clone())),
        Expr::Unary(op, inner) => {
            let v = eval(inner, scope)?;
            Ok(match op {
                UnOp::Neg => -v,
                UnOp::Pos => v,
                UnOp::Not => (v == 0) as i128,
                UnOp::BitNot => !v,
            })
        }
        Expr::Binary(op, lhs, rhs) => {
            // Short-circuit && / || without a Scope side-effect concern
            // (the scope is pure), matching spec's "side-effect free" rule.
            if matches!(op, BinOp::And) {
                let l = eval(lhs, scope)?;
                if l == 0 {
                    return Ok(0);
                }
                let r = eval(rhs, scope)?;
                return Ok((r != 0) as i128);
            }
            if matches!(op, BinOp::Or) {
                let l = eval(lhs, scope)?;
                if l != 0 {
                    return Ok(1);
                }
                let r = eval(rhs, scope)?;
                return Ok((r != 0) as i128);
            }
            let l = eval(lhs, scope)?;
            let r = eval(rhs, scope)?;
            Ok(match op {
                BinOp::Add => l + r,
                BinOp::Sub => l - r,
                BinOp::Mul => l * r,
                BinOp::Div => {
                    if r == 0 {
                        return Err(EvalError::DivisionByZero);
                    }
                    l / r
                }
                BinOp::Rem => {
                    if r == 0 {
                        return Err(EvalError::DivisionByZero);
                    }
                    l % r
                }
                BinOp::Shl => {
                    if !(0..128).contains(&r) {
                        return Err(EvalError::ShiftOverflow);
                    }
                    l << r
                }
                BinOp::Shr => {
                    if !(0..128).contains(&r) {
                        return Err(EvalError::ShiftOverflow);
                    }
                    l >> r
                }
                BinOp::BitAnd => l & r,
                BinOp::BitOr => l | r,
                BinOp::BitXor => l ^ r,
                BinOp::Eq => (l == r) as i128,
                BinOp::Ne => (l != r) as i128,
                BinOp::Lt => (l < r) as i128,
                BinOp::Le => (l <= r) as i128,
                BinOp::Gt => (l > r) as i128,
                BinOp::Ge => (l >= r) as i128,
                BinOp::And | BinOp::Or => unreachable!("handled above"),
            })
        }
        Expr::Ternary(cond, then_branch, else_branch) => {
            if eval(cond, scope)? != 0 {
                eval(then_branch, scope)
            } else {
                eval(else_branch, scope)
            }
        }
    }
}

/// Tries to evaluate `expr` using only `scope`; returns `None` iff the sole
/// obstruction is an unresolved identifier, letting the caller decide to
/// defer evaluation (e.g. to structure-read time).
pub fn try_fold(expr: &Expr, scope: &dyn Scope) -> std::result::Result<Option<i128>, EvalError> {
    match eval(expr, scope) {
        Ok(v) => Ok(Some(v)),
        Err(EvalError::UnresolvedIdentifier(_)) => Ok(None),
        Err(e) => Err(e),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::token::tokenize;

    fn parse(src: &str) -> Expr {
        let tokens = tokenize(src).unwrap();
        parse_expr(&tokens, 0).unwrap().0
    }

    struct Map(std::collections::HashMap<&'static str, i128>);
    impl Scope for Map {
        fn get(&self, name: &str) -> Option<i128> {
            self.0.get(name).copied()
        }
    }

    #[test]
    fn precedence_and_arithmetic() {
        let e = parse("1 + 2 * 3");
        assert_eq!(eval(&e, &()).unwrap(), 7);
        let e = parse("(1 + 2) * 3");
        assert_eq!(eval(&e, &()).unwrap(), 9);
    }

    #[test]
    fn bitwise_and_shifts() {
        assert_eq!(eval(&parse("1 << 4"), &()).unwrap(), 16);
        assert_eq!(eval(&parse("0xFF & 0x0F"), &()).unwrap(), 0x0F);
        assert_eq!(eval(&parse("~0 & 0xFF"), &()).unwrap(), 0xFF);
    }

    #[test]
    fn ternary_and_logic() {
        assert_eq!(eval(&parse("1 ? 2 : 3"), &()).unwrap(), 2);
        assert_eq!(eval(&parse("0 ? 2 : 3"), &()).unwrap(), 3);
        assert_eq!(eval(&parse("1 && 0"), &()).unwrap(), 0);
        assert_eq!(eval(&parse("1 || 0"), &()).unwrap(), 1);
    }

    #[test]
    fn division_by_zero_fails() {
        assert_eq!(eval(&parse("1 / 0"), &()), Err(EvalError::DivisionByZero));
    }

    #[test]
    fn identifiers_resolve_from_scope() {
        let mut m = std::collections::HashMap::new();
        m.insert("a", 5i128);
        let scope = Map(m);
        assert_eq!(eval(&parse("(a & 1) * 5"), &scope).unwrap(), 5);
    }

    #[test]
    fn unresolved_identifier_is_foldable_none() {
        assert_eq!(
            try_fold(&parse("a * 5"), &()).unwrap(),
            None
        );
        assert_eq!(try_fold(&parse("2 * 5"), &()).unwrap(), Some(10));
    }
}
