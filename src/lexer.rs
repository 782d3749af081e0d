use std::fmt;
use std::io::{self, Bytes, Read};
use std::string::FromUtf8Error;

use tracing::trace;

use crate::token::{Bracket, Punctuation, Token};

const ESCAPES: &[u8] = b"\"\\/bfnrtu";

#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("unexpected {0}")]
    Unexpected(Found),
    #[error("expected {expected}, found {found}")]
    Expected { expected: String, found: Found },
    #[error("missing closing quote")]
    MissingClosingQuote,
    #[error("string is not valid UTF-8")]
    InvalidUtf8(#[from] FromUtf8Error),
    #[error("failed to read input: {0}")]
    Io(#[from] io::Error),
}

/// What the lexer saw where it wanted something else.
#[derive(Debug, Copy, Clone, Eq, PartialEq)]
pub enum Found {
    Byte(u8),
    EndOfInput,
}

impl From<Option<u8>> for Found {
    fn from(byte: Option<u8>) -> Self {
        byte.map_or(Found::EndOfInput, Found::Byte)
    }
}

impl fmt::Display for Found {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match *self {
            Found::Byte(b) if b == b' ' || b.is_ascii_graphic() => {
                write!(f, "character '{}'", char::from(b))
            }
            Found::Byte(b) => write!(f, "byte 0x{:02X}", b),
            Found::EndOfInput => f.write_str("end of input"),
        }
    }
}

fn join_with_last<S: ToString>(items: impl AsRef<[S]>, sep: &str, last_sep: &str) -> String {
    let items = items.as_ref();

    let mut buf = String::new();
    for (i, item) in items.iter().enumerate() {
        if i > 0 {
            buf.push_str(if i + 1 == items.len() { last_sep } else { sep });
        }
        buf.push_str(&item.to_string());
    }
    buf
}

fn is_whitespace(b: u8) -> bool {
    matches!(b, b' ' | b'\t' | b'\n' | b'\r')
}

fn is_sign(b: u8) -> bool {
    matches!(b, b'+' | b'-')
}

/// Pull-based JSON tokenizer.
///
/// Bytes are pulled from the reader one at a time as tokens are requested,
/// with a single byte of lookahead. Nothing is buffered beyond that, so a
/// reader that is expensive per call (a `File`, a socket) should be wrapped
/// in a `BufReader` first.
pub struct Lexer<R> {
    bytes: Bytes<R>,
    peeked: Option<Option<u8>>,
    eof: bool,
    offset: usize,
    done: bool,
}

impl<R: Read> Lexer<R> {
    pub fn new(reader: R) -> Self {
        Self {
            bytes: reader.bytes(),
            peeked: None,
            eof: false,
            offset: 0,
            done: false,
        }
    }

    /// Number of bytes consumed so far.
    pub fn offset(&self) -> usize {
        self.offset
    }

    /// Scans the next token. Once the input is exhausted every call returns
    /// [`Token::Eof`].
    pub fn next_token(&mut self) -> Result<Token, Error> {
        let mut byte = self.advance()?;
        while let Some(b) = byte.filter(|&b| is_whitespace(b)) {
            trace!(byte = b, "skipping whitespace");
            byte = self.advance()?;
        }

        let token = match byte {
            None => Token::Eof,
            Some(b'{') => Token::Punct(Punctuation::Curly(Bracket::Open)),
            Some(b'}') => Token::Punct(Punctuation::Curly(Bracket::Close)),
            Some(b'[') => Token::Punct(Punctuation::Square(Bracket::Open)),
            Some(b']') => Token::Punct(Punctuation::Square(Bracket::Close)),
            Some(b',') => Token::Punct(Punctuation::Comma),
            Some(b':') => Token::Punct(Punctuation::Colon),
            Some(b'"') => self.lex_string()?,
            Some(b'n') => {
                self.lex_keyword("null")?;
                Token::Null
            }
            Some(b't') => {
                self.lex_keyword("true")?;
                Token::Boolean(true)
            }
            Some(b'f') => {
                self.lex_keyword("false")?;
                Token::Boolean(false)
            }
            Some(first @ (b'-' | b'+' | b'0'..=b'9')) => self.lex_number(first)?,
            Some(other) => return Err(Error::Unexpected(Found::Byte(other))),
        };

        trace!(offset = self.offset, token = %token, "lexed token");
        Ok(token)
    }

    fn read(&mut self) -> Result<Option<u8>, Error> {
        if self.eof {
            return Ok(None);
        }
        match self.bytes.next() {
            Some(byte) => Ok(Some(byte?)),
            None => {
                self.eof = true;
                Ok(None)
            }
        }
    }

    fn advance(&mut self) -> Result<Option<u8>, Error> {
        let byte = match self.peeked.take() {
            Some(byte) => byte,
            None => self.read()?,
        };
        if byte.is_some() {
            self.offset += 1;
        }
        Ok(byte)
    }

    fn peek(&mut self) -> Result<Option<u8>, Error> {
        match self.peeked {
            Some(byte) => Ok(byte),
            None => {
                let byte = self.read()?;
                self.peeked = Some(byte);
                Ok(byte)
            }
        }
    }

    fn expect(
        &mut self,
        accept: impl Fn(u8) -> bool,
        expected: impl FnOnce() -> String,
    ) -> Result<u8, Error> {
        match self.advance()? {
            Some(b) if accept(b) => Ok(b),
            found => Err(Error::Expected {
                expected: expected(),
                found: found.into(),
            }),
        }
    }

    fn expect_digit(&mut self) -> Result<u8, Error> {
        self.expect(|b| b.is_ascii_digit(), || "a digit".to_string())
    }

    // The first byte of the keyword has already been consumed.
    fn lex_keyword(&mut self, keyword: &'static str) -> Result<(), Error> {
        for want in keyword.bytes().skip(1) {
            self.expect(|b| b == want, || format!("the literal \"{}\"", keyword))?;
        }
        Ok(())
    }

    fn lex_string(&mut self) -> Result<Token, Error> {
        let mut buf = Vec::new();
        loop {
            match self.advance()? {
                None => return Err(Error::MissingClosingQuote),
                Some(b'"') => break,
                Some(b'\\') => {
                    buf.push(b'\\');
                    let indicator = self.expect(
                        |b| ESCAPES.contains(&b),
                        || {
                            let escapes = ESCAPES
                                .iter()
                                .map(|&b| format!("'{}'", char::from(b)))
                                .collect::<Vec<_>>();
                            format!("one of {}", join_with_last(escapes, ", ", ", or "))
                        },
                    )?;
                    buf.push(indicator);

                    // Only the shape is checked; surrogate pairs are not combined.
                    if indicator == b'u' {
                        for _ in 0..4 {
                            let hex = self.expect(
                                |b| b.is_ascii_hexdigit(),
                                || "a hexadecimal digit".to_string(),
                            )?;
                            buf.push(hex);
                        }
                    }
                }
                Some(b) => buf.push(b),
            }
        }
        Ok(Token::String(String::from_utf8(buf)?))
    }

    fn lex_digits(&mut self, literal: &mut String) -> Result<(), Error> {
        while let Some(b) = self.peek()?.filter(u8::is_ascii_digit) {
            self.advance()?;
            literal.push(char::from(b));
        }
        Ok(())
    }

    fn lex_number(&mut self, first: u8) -> Result<Token, Error> {
        let mut literal = String::new();
        literal.push(char::from(first));

        let mut lead = first;
        if is_sign(first) {
            lead = self.expect_digit()?;
            literal.push(char::from(lead));
        }

        // A leading zero ends the integer part.
        if lead != b'0' {
            self.lex_digits(&mut literal)?;
        }

        if self.peek()? == Some(b'.') {
            self.advance()?;
            literal.push('.');
            literal.push(char::from(self.expect_digit()?));
            self.lex_digits(&mut literal)?;
        }

        if let Some(marker @ (b'e' | b'E')) = self.peek()? {
            self.advance()?;
            literal.push(char::from(marker));
            let sign = self.expect(is_sign, || "an exponent sign ('+' or '-')".to_string())?;
            literal.push(char::from(sign));
            literal.push(char::from(self.expect_digit()?));
            self.lex_digits(&mut literal)?;
        }

        Ok(Token::Number(literal))
    }
}

/// Yields tokens up to, but not including, [`Token::Eof`]. Stops after the
/// first error.
impl<R: Read> Iterator for Lexer<R> {
    type Item = Result<Token, Error>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.done {
            return None;
        }
        match self.next_token() {
            Ok(Token::Eof) => {
                self.done = true;
                None
            }
            Err(err) => {
                self.done = true;
                Some(Err(err))
            }
            token => Some(token),
        }
    }
}
