//! Lexer for the definition language (spec §4.C).

use crate::error::{Error, Result};

#[derive(Clone, Debug, PartialEq)]
pub enum Tok {
    Ident(String),
    Int(i128),
    Str(String),
    Hash, // '#' starting a preprocessor line
    Punct(&'static str),
    Eof,
}

#[derive(Clone, Debug, PartialEq)]
pub struct Token {
    pub tok: Tok,
    pub line: usize,
    pub column: usize,
}

/// Punctuation recognized by the tokenizer, longest-match first so that e.g.
/// `<<` is not split into two `<` tokens.
const PUNCTUATION: &[&str] = &[
    "::", "<<", ">>", "&&", "||", "==", "!=", "<=", ">=", ":", ";", ",", "{", "}", "[", "]", "(",
    ")", "*", "=", "<", ">", "+", "-", "/", "%", "&", "|", "^", "~", "!", "?",
];

pub fn tokenize(src: &str) -> Result<Vec<Token>> {
    let chars: Vec<char> = src.chars().collect();
    let mut i = 0usize;
    let mut line = 1usize;
    let mut column = 1usize;
    let mut tokens = Vec::new();
    // true at the very start of a line (ignoring whitespace), used to
    // recognize preprocessor directives which "begin a line" per spec.
    let mut at_line_start = true;

    let advance = |i: &mut usize, line: &mut usize, column: &mut usize, chars: &[char]| {
        if chars[*i] == '\n' {
            *line += 1;
            *column = 1;
        } else {
            *column += 1;
        }
        *i += 1;
    };

    while i < chars.len() {
        let c = chars[i];

        if c == '\n' {
            advance(&mut i, &mut line, &mut column, &chars);
            at_line_start = true;
            continue;
        }
        if c.is_whitespace() {
            advance(&mut i, &mut line, &mut column, &chars);
            continue;
        }
        // Comments.
        if c == '/' && chars.get(i + 1) == Some(&'/') {
            while i < chars.len() && chars[i] != '\n' {
                advance(&mut i, &mut line, &mut column, &chars);
            }
            continue;
        }
        if c == '/' && chars.get(i + 1) == Some(&'*') {
            advance(&mut i, &mut line, &mut column, &chars);
            advance(&mut i, &mut line, &mut column, &chars);
            loop {
                if i >= chars.len() {
                    return Err(Error::ParseError {
                        line,
                        column,
                        message: "unterminated block comment".into(),
                    });
                }
                if chars[i] == '*' && chars.get(i + 1) == Some(&'/') {
                    advance(&mut i, &mut line, &mut column, &chars);
                    advance(&mut i, &mut line, &mut column, &chars);
                    break;
                }
                advance(&mut i, &mut line, &mut column, &chars);
            }
            continue;
        }

        let start_line = line;
        let start_col = column;

        if c == '#' && at_line_start {
            advance(&mut i, &mut line, &mut column, &chars);
            tokens.push(Token {
                tok: Tok::Hash,
                line: start_line,
                column: start_col,
            });
            at_line_start = false;
            continue;
        }
        at_line_start = false;

        if c.is_ascii_digit() {
            let (value, len) = read_int_literal(&chars[i..]).map_err(|message| Error::ParseError {
                line: start_line,
                column: start_col,
                message,
            })?;
            for _ in 0..len {
                advance(&mut i, &mut line, &mut column, &chars);
            }
            tokens.push(Token {
                tok: Tok::Int(value),
                line: start_line,
                column: start_col,
            });
            continue;
        }

        if c == '\'' {
            let (value, len) = read_char_literal(&chars[i..]).map_err(|message| Error::ParseError {
                line: start_line,
                column: start_col,
                message,
            })?;
            for _ in 0..len {
                advance(&mut i, &mut line, &mut column, &chars);
            }
            tokens.push(Token {
                tok: Tok::Int(value),
                line: start_line,
                column: start_col,
            });
            continue;
        }

        if c == '"' {
            let (value, len) = read_string_literal(&chars[i..]).map_err(|message| Error::ParseError {
                line: start_line,
                column: start_col,
                message,
            })?;
            for _ in 0..len {
                advance(&mut i, &mut line, &mut column, &chars);
            }
            tokens.push(Token {
                tok: Tok::Str(value),
                line: start_line,
                column: start_col,
            });
            continue;
        }

        if c.is_alphabetic() || c == '_' {
            let mut j = i;
            while j < chars.len() && (chars[j].is_alphanumeric() || chars[j] == '_') {
                j += 1;
            }
            let ident: String = chars[i..j].iter().collect();
            let len = j - i;
            for _ in 0..len {
                advance(&mut i, &mut line, &mut column, &chars);
            }
            tokens.push(Token {
                tok: Tok::Ident(ident),
                line: start_line,
                column: start_col,
            });
            continue;
        }

        if let Some(p) = PUNCTUATION.iter().find(|p| {
            let plen = p.len();
            i + plen <= chars.len() && chars[i..i + plen].iter().collect::<String>() == **p
        }) {
            for _ in 0..p.len() {
                advance(&mut i, &mut line, &mut column, &chars);
            }
            tokens.push(Token {
                tok: Tok::Punct(p),
                line: start_line,
                column: start_col,
            });
            continue;
        }

        return Err(Error::ParseError {
            line: start_line,
            column: start_col,
            message: format!("unexpected character `{}`", c),
        });
    }

    tokens.push(Token {
        tok: Tok::Eof,
        line,
        column,
    });
    Ok(tokens)
}

fn read_int_literal(chars: &[char]) -> std::result::Result<(i128, usize), String> {
    let mut j = 0;
    if chars[0] == '0' && chars.len() > 1 && (chars[1] == 'x' || chars[1] == 'X') {
        j = 2;
        let start = j;
        while j < chars.len() && chars[j].is_ascii_hexdigit() {
            j += 1;
        }
        let digits: String = chars[start..j].iter().collect();
        let value =
            i128::from_str_radix(&digits, 16).map_err(|e| format!("bad hex literal: {}", e))?;
        return Ok((value, j));
    }
    if chars[0] == '0' && chars.len() > 1 && (chars[1] == 'o' || chars[1] == 'O') {
        j = 2;
        let start = j;
        while j < chars.len() && ('0'..='7').contains(&chars[j]) {
            j += 1;
        }
        let digits: String = chars[start..j].iter().collect();
        let value =
            i128::from_str_radix(&digits, 8).map_err(|e| format!("bad octal literal: {}", e))?;
        return Ok((value, j));
    }
    if chars[0] == '0' && chars.len() > 1 && (chars[1] == 'b' || chars[1] == 'B') {
        j = 2;
        let start = j;
        while j < chars.len() && (chars[j] == '0' || chars[j] == '1') {
            j += 1;
        }
        let digits: String = chars[start..j].iter().collect();
        let value =
            i128::from_str_radix(&digits, 2).map_err(|e| format!("bad binary literal: {}", e))?;
        return Ok((value, j));
    }
    // Legacy C octal: a leading zero followed by more digits.
    if chars[0] == '0' && chars.len() > 1 && chars[1].is_ascii_digit() {
        j = 1;
        let start = j;
        while j < chars.len() && ('0'..='7').contains(&chars[j]) {
            j += 1;
        }
        let digits: String = chars[start..j].iter().collect();
        let value =
            i128::from_str_radix(&digits, 8).map_err(|e| format!("bad octal literal: {}", e))?;
        return Ok((value, j));
    }
    while j < chars.len() && chars[j].is_ascii_digit() {
        j += 1;
    }
    let digits: String = chars[0..j].iter().collect();
    let value: i128 = digits
        .parse()
        .map_err(|e| format!("bad decimal literal: {}", e))?;
    Ok((value, j))
}

fn read_escape(chars: &[char]) -> std::result::Result<(char, usize), String> {
    // chars[0] == '\\'
    if chars.len() < 2 {
        return Err("unterminated escape sequence".into());
    }
    match chars[1] {
        'n' => Ok(('\n', 2)),
        't' => Ok(('\t', 2)),
        'r' => Ok(('\r', 2)),
        '0' => Ok(('\0', 2)),
        '\\' => Ok(('\\', 2)),
        '\'' => Ok(('\'', 2)),
        '"' => Ok(('"', 2)),
        'x' => {
            let mut j = 2;
            let start = j;
            while j < chars.len() && j < start + 2 && chars[j].is_ascii_hexdigit() {
                j += 1;
            }
            if j == start {
                return Err("empty \\x escape".into());
            }
            let digits: String = chars[start..j].iter().collect();
            let value = u8::from_str_radix(&digits, 16).map_err(|e| e.to_string())?;
            Ok((value as char, j))
        }
        other => Err(format!("unknown escape sequence `\\{}`", other)),
    }
}

fn read_char_literal(chars: &[char]) -> std::result::Result<(i128, usize), String> {
    // chars[0] == '\''
    let mut j = 1;
    if j >= chars.len() {
        return Err("unterminated character literal".into());
    }
    let (ch, adv) = if chars[j] == '\\' {
        read_escape(&chars[j..])?
    } else {
        (chars[j], 1)
    };
    j += adv;
    if chars.get(j) != Some(&'\'') {
        return Err("unterminated character literal".into());
    }
    j += 1;
    Ok((ch as i128, j))
}

fn read_string_literal(chars: &[char]) -> std::result::Result<(String, usize), String> {
    // chars[0] == '"'
    let mut j = 1;
    let mut s = String::new();
    loop {
        if j >= chars.len() {
            return Err("unterminated string literal".into());
        }
        if chars[j] == '"' {
            j += 1;
            break;
        }
        if chars[j] == '\\' {
            let (ch, adv) = read_escape(&chars[j..])?;
            s.push(ch);
            j += adv;
        } else {
            s.push(chars[j]);
            j += 1;
        }
    }
    Ok((s, j))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn toks(src: &str) -> Vec<Tok> {
        tokenize(src).unwrap().into_iter().map(|t| t.tok).collect()
    }

    #[test]
    fn idents_and_punctuation() {
        assert_eq!(
            toks("struct Foo { uint8 a; };"),
            vec![
                Tok::Ident("struct".into()),
                Tok::Ident("Foo".into()),
                Tok::Punct("{"),
                Tok::Ident("uint8".into()),
                Tok::Ident("a".into()),
                Tok::Punct(";"),
                Tok::Punct("}"),
                Tok::Punct(";"),
                Tok::Eof,
            ]
        );
    }

    #[test]
    fn integer_literals() {
        assert_eq!(toks("0x1F")[0], Tok::Int(31));
        assert_eq!(toks("0o17")[0], Tok::Int(15));
        assert_eq!(toks("017")[0], Tok::Int(15));
        assert_eq!(toks("0b101")[0], Tok::Int(5));
        assert_eq!(toks("42")[0], Tok::Int(42));
    }

    #[test]
    fn char_literal_with_escape() {
        assert_eq!(toks("'\\n'")[0], Tok::Int(10));
        assert_eq!(toks("'A'")[0], Tok::Int(65));
    }

    #[test]
    fn comments_are_stripped() {
        assert_eq!(
            toks("uint8 a; // trailing\n/* block */ uint8 b;"),
            vec![
                Tok::Ident("uint8".into()),
                Tok::Ident("a".into()),
                Tok::Punct(";"),
                Tok::Ident("uint8".into()),
                Tok::Ident("b".into()),
                Tok::Punct(";"),
                Tok::Eof,
            ]
        );
    }

    #[test]
    fn preprocessor_hash_only_at_line_start() {
        let t = tokenize("#define X 1\n").unwrap();
        assert_eq!(t[0].tok, Tok::Hash);
    }

    #[test]
    fn shift_operators_are_not_split() {
        assert_eq!(toks("1 << 2 >> 3"), {
            vec![
                Tok::Int(1),
                Tok::Punct("<<"),
                Tok::Int(2),
                Tok::Punct(">>"),
                Tok::Int(3),
                Tok::Eof,
            ]
        });
    }
}
