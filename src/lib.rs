//! Single-pass JSON parsing over any byte reader.
//!
//! The [`Lexer`] pulls bytes one at a time and hands out tokens on demand;
//! the [`Parser`] keeps the current token plus one token of lookahead and
//! builds a [`Value`] tree by recursive descent.
//!
//! String values keep their escape sequences exactly as written. `\uXXXX`
//! escapes are checked for four hex digits but not decoded.

use std::io::Read;
use std::str::FromStr;

pub mod lexer;
pub mod parser;
pub mod token;
pub mod value;

pub use lexer::Lexer;
pub use parser::{Config, Parser};
pub use token::{Token, TokenKind};
pub use value::{Value, ValueKind};

#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("lexer error: {0}")]
    Lex(#[from] lexer::Error),
    #[error("parser error: {0}")]
    Parse(#[from] parser::Error),
}

/// Parses one JSON document from `reader`. Anything other than whitespace
/// after the document is an error.
pub fn from_reader<R: Read>(reader: R) -> Result<Value, Error> {
    let mut parser = Parser::new(Lexer::new(reader))?;
    let value = parser.parse()?;
    parser.finish()?;
    Ok(value)
}

pub fn from_slice(input: &[u8]) -> Result<Value, Error> {
    from_reader(input)
}

pub fn from_str(input: &str) -> Result<Value, Error> {
    from_reader(input.as_bytes())
}

impl FromStr for Value {
    type Err = Error;

    fn from_str(input: &str) -> Result<Self, Self::Err> {
        from_str(input)
    }
}
