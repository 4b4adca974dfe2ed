//! LL(1) parser for the column-type language.
//!
//! ```text
//! type  := ident [ "(" args ")" ]
//! args  := arg ("," arg)*
//! arg   := type | integer | quoted_string [ "=" integer ]
//! ```

use super::{Type, MAX_TYPE_DEPTH};
use crate::errors::{Result, ValidationError};

#[derive(Debug, Clone, PartialEq)]
enum Token {
    Ident(String),
    Int(i64),
    Quoted(String),
    LParen,
    RParen,
    Comma,
    Eq,
    Eof,
}

struct Tokenizer<'a> {
    chars: std::iter::Peekable<std::str::Chars<'a>>,
    source: &'a str,
}

impl<'a> Tokenizer<'a> {
    fn new(source: &'a str) -> Self {
        Self { chars: source.chars().peekable(), source }
    }

    fn bad(&self, reason: &str) -> ValidationError {
        ValidationError::BadTypeArgs {
            type_name: self.source.to_string(),
            reason: reason.to_string(),
        }
    }

    fn next_token(&mut self) -> Result<Token> {
        while matches!(self.chars.peek(), Some(c) if c.is_whitespace()) {
            self.chars.next();
        }
        let Some(c) = self.chars.next() else {
            return Ok(Token::Eof);
        };
        let tok = match c {
            '(' => Token::LParen,
            ')' => Token::RParen,
            ',' => Token::Comma,
            '=' => Token::Eq,
            '\'' => {
                let mut text = String::new();
                loop {
                    match self.chars.next() {
                        Some('\'') => break,
                        Some('\\') => match self.chars.next() {
                            Some(esc @ ('\\' | '\'')) => text.push(esc),
                            Some(other) => {
                                text.push('\\');
                                text.push(other);
                            }
                            None => return Err(self.bad("unterminated string literal").into()),
                        },
                        Some(other) => text.push(other),
                        None => return Err(self.bad("unterminated string literal").into()),
                    }
                }
                Token::Quoted(text)
            }
            c if c == '-' || c.is_ascii_digit() => {
                let mut text = String::from(c);
                while matches!(self.chars.peek(), Some(d) if d.is_ascii_digit()) {
                    text.push(self.chars.next().unwrap());
                }
                let value = text
                    .parse::<i64>()
                    .map_err(|_| self.bad("integer literal out of range"))?;
                Token::Int(value)
            }
            c if c.is_ascii_alphanumeric() || c == '_' => {
                let mut text = String::from(c);
                while matches!(self.chars.peek(), Some(d) if d.is_ascii_alphanumeric() || *d == '_')
                {
                    text.push(self.chars.next().unwrap());
                }
                Token::Ident(text)
            }
            other => return Err(self.bad(&format!("unexpected character `{other}`")).into()),
        };
        Ok(tok)
    }
}

struct Parser {
    tokens: Vec<Token>,
    pos: usize,
    source: String,
}

pub(super) fn parse(text: &str) -> Result<Type> {
    let mut tokenizer = Tokenizer::new(text);
    let mut tokens = Vec::new();
    loop {
        let tok = tokenizer.next_token()?;
        let done = tok == Token::Eof;
        tokens.push(tok);
        if done {
            break;
        }
    }
    let mut parser = Parser { tokens, pos: 0, source: text.to_string() };
    let ty = parser.parse_type(0)?;
    parser.expect(Token::Eof, "end of input")?;
    Ok(ty)
}

impl Parser {
    fn bad(&self, reason: impl Into<String>) -> ValidationError {
        ValidationError::BadTypeArgs { type_name: self.source.clone(), reason: reason.into() }
    }

    fn peek(&self) -> &Token {
        &self.tokens[self.pos]
    }

    fn next(&mut self) -> Token {
        let tok = self.tokens[self.pos].clone();
        if self.pos + 1 < self.tokens.len() {
            self.pos += 1;
        }
        tok
    }

    fn expect(&mut self, want: Token, what: &str) -> Result<()> {
        let got = self.next();
        if got != want {
            return Err(self.bad(format!("expected {what}, found {got:?}")).into());
        }
        Ok(())
    }

    fn expect_int(&mut self, what: &str) -> Result<i64> {
        match self.next() {
            Token::Int(v) => Ok(v),
            got => Err(self.bad(format!("expected {what}, found {got:?}")).into()),
        }
    }

    fn expect_quoted(&mut self, what: &str) -> Result<String> {
        match self.next() {
            Token::Quoted(s) => Ok(s),
            got => Err(self.bad(format!("expected {what}, found {got:?}")).into()),
        }
    }

    fn parse_type(&mut self, depth: usize) -> Result<Type> {
        if depth >= MAX_TYPE_DEPTH {
            return Err(ValidationError::DepthLimit(MAX_TYPE_DEPTH).into());
        }
        let name = match self.next() {
            Token::Ident(name) => name,
            got => return Err(self.bad(format!("expected type name, found {got:?}")).into()),
        };

        // Leaf names take no argument list at all.
        let leaf = match name.as_str() {
            "UInt8" => Some(Type::UInt8),
            "UInt16" => Some(Type::UInt16),
            "UInt32" => Some(Type::UInt32),
            "UInt64" => Some(Type::UInt64),
            "UInt128" => Some(Type::UInt128),
            "Int8" => Some(Type::Int8),
            "Int16" => Some(Type::Int16),
            "Int32" => Some(Type::Int32),
            "Int64" => Some(Type::Int64),
            "Int128" => Some(Type::Int128),
            "Float32" => Some(Type::Float32),
            "Float64" => Some(Type::Float64),
            "Bool" => Some(Type::Bool),
            "String" => Some(Type::String),
            "UUID" => Some(Type::Uuid),
            "Date" => Some(Type::Date),
            "Nothing" => Some(Type::Nothing),
            _ => None,
        };
        if let Some(ty) = leaf {
            if self.peek() == &Token::LParen {
                return Err(self.bad(format!("`{name}` takes no arguments")).into());
            }
            return Ok(ty);
        }

        match name.as_str() {
            "Array" => Ok(Type::Array(Box::new(self.parse_single(depth, &name)?))),
            "Nullable" => Ok(Type::Nullable(Box::new(self.parse_single(depth, &name)?))),
            "LowCardinality" => {
                Ok(Type::LowCardinality(Box::new(self.parse_single(depth, &name)?)))
            }
            "Tuple" => {
                self.expect(Token::LParen, "`(`")?;
                let mut items = vec![self.parse_type(depth + 1)?];
                while self.peek() == &Token::Comma {
                    self.next();
                    items.push(self.parse_type(depth + 1)?);
                }
                self.expect(Token::RParen, "`)`")?;
                Ok(Type::Tuple(items))
            }
            "Map" => {
                self.expect(Token::LParen, "`(`")?;
                let key = self.parse_type(depth + 1)?;
                self.expect(Token::Comma, "`,`")?;
                let value = self.parse_type(depth + 1)?;
                self.expect(Token::RParen, "`)`")?;
                Ok(Type::Map(Box::new(key), Box::new(value)))
            }
            "FixedString" => {
                self.expect(Token::LParen, "`(`")?;
                let n = self.expect_int("byte length")?;
                self.expect(Token::RParen, "`)`")?;
                if n < 1 || n > (1 << 20) {
                    return Err(self.bad("FixedString length must be in 1..=1048576").into());
                }
                Ok(Type::FixedString(n as usize))
            }
            "DateTime" => {
                if self.peek() != &Token::LParen {
                    return Ok(Type::DateTime(None));
                }
                self.next();
                let tz = self.expect_quoted("timezone literal")?;
                self.expect(Token::RParen, "`)`")?;
                Ok(Type::DateTime(Some(tz)))
            }
            "DateTime64" => {
                self.expect(Token::LParen, "`(`")?;
                let precision = self.expect_int("precision")?;
                if !(0..=9).contains(&precision) {
                    return Err(self.bad("DateTime64 precision must be in 0..=9").into());
                }
                let tz = if self.peek() == &Token::Comma {
                    self.next();
                    Some(self.expect_quoted("timezone literal")?)
                } else {
                    None
                };
                self.expect(Token::RParen, "`)`")?;
                Ok(Type::DateTime64(precision as u8, tz))
            }
            "Decimal" => {
                self.expect(Token::LParen, "`(`")?;
                let p = self.expect_int("precision")?;
                self.expect(Token::Comma, "`,`")?;
                let s = self.expect_int("scale")?;
                self.expect(Token::RParen, "`)`")?;
                self.decimal(p, s)
            }
            "Decimal32" => self.decimal_alias(9),
            "Decimal64" => self.decimal_alias(18),
            "Decimal128" => self.decimal_alias(38),
            "Enum8" => {
                let entries = self.parse_enum_entries(i8::MIN as i64, i8::MAX as i64)?;
                Ok(Type::Enum8(
                    entries.into_iter().map(|(label, v)| (label, v as i8)).collect(),
                ))
            }
            "Enum16" => {
                let entries = self.parse_enum_entries(i16::MIN as i64, i16::MAX as i64)?;
                Ok(Type::Enum16(
                    entries.into_iter().map(|(label, v)| (label, v as i16)).collect(),
                ))
            }
            other => Err(ValidationError::UnknownType(other.to_string()).into()),
        }
    }

    fn parse_single(&mut self, depth: usize, name: &str) -> Result<Type> {
        self.expect(Token::LParen, "`(`")?;
        let inner = self.parse_type(depth + 1)?;
        if self.peek() == &Token::Comma {
            return Err(self.bad(format!("`{name}` takes exactly one argument")).into());
        }
        self.expect(Token::RParen, "`)`")?;
        Ok(inner)
    }

    fn decimal(&self, p: i64, s: i64) -> Result<Type> {
        if !(1..=38).contains(&p) {
            return Err(self.bad("Decimal precision must be in 1..=38").into());
        }
        if s < 0 || s > p {
            return Err(self.bad("Decimal scale must be in 0..=precision").into());
        }
        Ok(Type::Decimal(p as u8, s as u8))
    }

    fn decimal_alias(&mut self, p: i64) -> Result<Type> {
        self.expect(Token::LParen, "`(`")?;
        let s = self.expect_int("scale")?;
        self.expect(Token::RParen, "`)`")?;
        self.decimal(p, s)
    }

    fn parse_enum_entries(&mut self, min: i64, max: i64) -> Result<Vec<(String, i64)>> {
        self.expect(Token::LParen, "`(`")?;
        let mut entries = Vec::new();
        loop {
            let label = self.expect_quoted("enum label")?;
            self.expect(Token::Eq, "`=`")?;
            let value = self.expect_int("enum value")?;
            if value < min || value > max {
                return Err(self.bad(format!("enum value {value} out of range")).into());
            }
            entries.push((label, value));
            match self.next() {
                Token::Comma => continue,
                Token::RParen => break,
                got => return Err(self.bad(format!("expected `,` or `)`, found {got:?}")).into()),
            }
        }
        Ok(entries)
    }
}
