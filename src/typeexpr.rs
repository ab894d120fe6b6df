//! Textual type expressions: `List<Fish?>`, `int[,]`, `Dictionary<string, Entry>?`.
//!
//! ```text
//! type   := base suffix*
//! base   := ident ( '<' type ( ',' type )* '>' )?
//! suffix := '[' ','* ']' | '?'
//! ```
use std::fmt;
use std::str::FromStr;

use thiserror::Error;

use crate::describe::{TypeRef, TypeRefKind};

#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("invalid type expression `{input}` at offset {offset}: {message}")]
pub struct TypeExprError {
    pub input: String,
    pub offset: usize,
    pub message: String,
}

pub fn parse(input: &str) -> Result<TypeRef, TypeExprError> {
    let mut parser = Parser { input, pos: 0 };
    let ty = parser.parse_type()?;
    parser.skip_ws();
    if parser.pos != input.len() {
        return Err(parser.error("unexpected trailing input"));
    }
    Ok(ty)
}

fn is_ident_char(c: char) -> bool {
    c.is_alphanumeric() || matches!(c, '_' | '.' | ':' | '+' | '`')
}

struct Parser<'a> {
    input: &'a str,
    pos: usize,
}

impl<'a> Parser<'a> {
    fn rest(&self) -> &'a str {
        &self.input[self.pos..]
    }

    fn peek(&self) -> Option<char> {
        self.rest().chars().next()
    }

    fn skip_ws(&mut self) {
        let trimmed = self.rest().trim_start();
        self.pos = self.input.len() - trimmed.len();
    }

    fn eat(&mut self, c: char) -> bool {
        self.skip_ws();
        if self.peek() == Some(c) {
            self.pos += c.len_utf8();
            true
        } else {
            false
        }
    }

    fn error(&self, message: &str) -> TypeExprError {
        TypeExprError {
            input: self.input.to_string(),
            offset: self.pos,
            message: message.to_string(),
        }
    }

    fn parse_type(&mut self) -> Result<TypeRef, TypeExprError> {
        let mut ty = self.parse_base()?;
        loop {
            if self.eat('?') {
                ty = ty.nullable();
            } else if self.eat('[') {
                let mut rank = 1;
                while self.eat(',') {
                    rank += 1;
                }
                if !self.eat(']') {
                    return Err(self.error("expected `]`"));
                }
                ty = TypeRef::array_of_rank(ty, rank);
            } else {
                return Ok(ty);
            }
        }
    }

    fn parse_base(&mut self) -> Result<TypeRef, TypeExprError> {
        self.skip_ws();
        let len = self
            .rest()
            .char_indices()
            .find(|(_, c)| !is_ident_char(*c))
            .map(|(i, _)| i)
            .unwrap_or(self.rest().len());
        if len == 0 {
            return Err(self.error("expected a type name"));
        }
        let name = &self.rest()[..len];
        self.pos += len;

        let mut args = Vec::new();
        if self.eat('<') {
            loop {
                args.push(self.parse_type()?);
                if self.eat(',') {
                    continue;
                }
                if self.eat('>') {
                    break;
                }
                return Err(self.error("expected `,` or `>`"));
            }
        }
        Ok(TypeRef::generic(name, args))
    }
}

impl FromStr for TypeRef {
    type Err = TypeExprError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        parse(s)
    }
}

impl TryFrom<String> for TypeRef {
    type Error = TypeExprError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        parse(&value)
    }
}

impl fmt::Display for TypeRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.kind {
            TypeRefKind::Named { name, args } => {
                f.write_str(name)?;
                if !args.is_empty() {
                    f.write_str("<")?;
                    for (i, arg) in args.iter().enumerate() {
                        if i > 0 {
                            f.write_str(", ")?;
                        }
                        write!(f, "{arg}")?;
                    }
                    f.write_str(">")?;
                }
            }
            TypeRefKind::Array { element, rank } => {
                write!(f, "{element}[{}]", ",".repeat(rank.saturating_sub(1)))?;
            }
        }
        if self.nullable {
            f.write_str("?")?;
        }
        Ok(())
    }
}

impl<'de> serde::Deserialize<'de> for TypeRef {
    fn deserialize<D: serde::Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let src = String::deserialize(deserializer)?;
        parse(&src).map_err(serde::de::Error::custom)
    }
}

impl serde::Serialize for TypeRef {
    fn serialize<S: serde::Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}
