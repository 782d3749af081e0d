use std::collections::HashMap;
use std::io::Read;
use std::mem;

use tracing::debug;

use crate::lexer::Lexer;
use crate::token::{Bracket, Punctuation, Token, TokenKind};
use crate::value::Value;

/// Nesting limit used by [`Config::default`].
pub const DEFAULT_MAX_DEPTH: usize = 128;

#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum Error {
    #[error("expected a value, found {0}")]
    ExpectedValue(Token),
    #[error("expected a string key, found {0}")]
    ExpectedKey(Token),
    #[error("expected ':' after object key, found {0}")]
    ExpectedColon(Token),
    #[error("expected ',' or '}}' in object, found {0}")]
    ExpectedObjectEnd(Token),
    #[error("expected ',' or ']' in array, found {0}")]
    ExpectedArrayEnd(Token),
    #[error("expected end of input after the value, found {0}")]
    TrailingTokens(Token),
    #[error("lexer accepted an invalid number literal {0:?}")]
    InvalidNumber(String),
    #[error("nesting deeper than {0} levels")]
    DepthLimitExceeded(usize),
}

#[derive(Debug, Copy, Clone, Eq, PartialEq)]
pub struct Config {
    max_depth: usize,
}

impl Config {
    pub fn new() -> Self {
        Self::default()
    }

    /// Objects and arrays nested deeper than this fail with
    /// [`Error::DepthLimitExceeded`].
    pub fn max_depth(mut self, max_depth: usize) -> Self {
        self.max_depth = max_depth;
        self
    }
}

impl Default for Config {
    fn default() -> Self {
        Self {
            max_depth: DEFAULT_MAX_DEPTH,
        }
    }
}

/// Recursive-descent parser over a [`Lexer`], with one token of lookahead.
pub struct Parser<R> {
    lexer: Lexer<R>,
    current: Token,
    peek: Token,
    config: Config,
    depth: usize,
}

impl<R: Read> Parser<R> {
    pub fn new(lexer: Lexer<R>) -> Result<Self, crate::Error> {
        Self::with_config(lexer, Config::default())
    }

    /// Reads the first two tokens, so lexer errors there surface here.
    pub fn with_config(mut lexer: Lexer<R>, config: Config) -> Result<Self, crate::Error> {
        let current = lexer.next_token()?;
        let peek = lexer.next_token()?;
        Ok(Self {
            lexer,
            current,
            peek,
            config,
            depth: 0,
        })
    }

    pub fn current(&self) -> &Token {
        &self.current
    }

    pub fn peek(&self) -> &Token {
        &self.peek
    }

    pub fn into_lexer(self) -> Lexer<R> {
        self.lexer
    }

    /// Parses the value that starts at the current token. The current token
    /// is left on the last token of that value.
    pub fn parse(&mut self) -> Result<Value, crate::Error> {
        let value = match &self.current {
            Token::String(literal) => Value::String(literal.clone()),
            Token::Number(literal) => match literal.parse::<f64>() {
                Ok(number) => Value::Number(number),
                Err(_) => return Err(Error::InvalidNumber(literal.clone()).into()),
            },
            Token::Boolean(value) => Value::Boolean(*value),
            Token::Null => Value::Null,
            Token::Punct(Punctuation::Curly(Bracket::Open)) => {
                self.nested(|parser| parser.parse_object())?
            }
            Token::Punct(Punctuation::Square(Bracket::Open)) => {
                self.nested(|parser| parser.parse_array())?
            }
            Token::Eof | Token::Punct(_) => {
                return Err(self.fail(Error::ExpectedValue(self.current.clone())))
            }
        };
        Ok(value)
    }

    /// Checks that nothing but whitespace follows the parsed value.
    pub fn finish(self) -> Result<(), crate::Error> {
        if self.peek.is(TokenKind::Eof) {
            Ok(())
        } else {
            Err(self.fail(Error::TrailingTokens(self.peek.clone())))
        }
    }

    fn next_token(&mut self) -> Result<(), crate::Error> {
        let next = self.lexer.next_token()?;
        self.current = mem::replace(&mut self.peek, next);
        Ok(())
    }

    fn fail(&self, err: Error) -> crate::Error {
        debug!(offset = self.lexer.offset(), error = %err, "parse failed");
        err.into()
    }

    fn nested(
        &mut self,
        parse: impl FnOnce(&mut Self) -> Result<Value, crate::Error>,
    ) -> Result<Value, crate::Error> {
        if self.depth >= self.config.max_depth {
            return Err(self.fail(Error::DepthLimitExceeded(self.config.max_depth)));
        }
        self.depth += 1;
        debug!(depth = self.depth, token = %self.current, "entering nested value");
        let value = parse(self);
        self.depth -= 1;
        value
    }

    fn parse_object(&mut self) -> Result<Value, crate::Error> {
        self.next_token()?;
        let mut members = HashMap::new();
        if self.current.is(TokenKind::RBrace) {
            return Ok(Value::Object(members));
        }

        loop {
            let key = match &self.current {
                Token::String(key) => key.clone(),
                other => return Err(self.fail(Error::ExpectedKey(other.clone()))),
            };
            self.next_token()?;
            if !self.current.is(TokenKind::Colon) {
                return Err(self.fail(Error::ExpectedColon(self.current.clone())));
            }
            self.next_token()?;

            let value = self.parse()?;
            members.insert(key, value);

            self.next_token()?;
            match self.current.kind() {
                TokenKind::RBrace => return Ok(Value::Object(members)),
                TokenKind::Comma => self.next_token()?,
                _ => return Err(self.fail(Error::ExpectedObjectEnd(self.current.clone()))),
            }
        }
    }

    fn parse_array(&mut self) -> Result<Value, crate::Error> {
        self.next_token()?;
        let mut values = Vec::new();
        if self.current.is(TokenKind::RBracket) {
            return Ok(Value::Array(values));
        }

        loop {
            values.push(self.parse()?);

            self.next_token()?;
            match self.current.kind() {
                TokenKind::RBracket => return Ok(Value::Array(values)),
                TokenKind::Comma => self.next_token()?,
                _ => return Err(self.fail(Error::ExpectedArrayEnd(self.current.clone()))),
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::lexer;
    use pretty_assertions::assert_eq;
    use test_case::test_case;

    fn parse(input: &str) -> Result<Value, crate::Error> {
        Parser::new(Lexer::new(input.as_bytes()))?.parse()
    }

    fn parse_err(input: &str) -> Error {
        match parse(input) {
            Err(crate::Error::Parse(err)) => err,
            other => panic!("expected a parse error for {:?}, got {:?}", input, other),
        }
    }

    fn object(members: Vec<(&str, Value)>) -> Value {
        Value::Object(
            members
                .into_iter()
                .map(|(key, value)| (key.to_string(), value))
                .collect(),
        )
    }

    #[test_case("\"test\"", Value::String("test".into()); "string")]
    #[test_case("\"a\\nb\"", Value::String("a\\nb".into()); "string keeps escapes")]
    #[test_case("123", Value::Number(123.0); "integer")]
    #[test_case("123.456", Value::Number(123.456); "fraction")]
    #[test_case("123.456e+1", Value::Number(123.456e+1); "exponent")]
    #[test_case("0", Value::Number(0.0); "zero")]
    #[test_case("+0.456", Value::Number(0.456); "plus sign")]
    #[test_case("-123.456", Value::Number(-123.456); "negative")]
    #[test_case("2e+0", Value::Number(2.0); "zero exponent")]
    #[test_case("1.2e+012", Value::Number(1.2e12); "padded exponent")]
    #[test_case("true", Value::Boolean(true); "true")]
    #[test_case("false", Value::Boolean(false); "false")]
    #[test_case("null", Value::Null; "null")]
    #[test_case("{}", Value::Object(HashMap::new()); "empty object")]
    #[test_case("[]", Value::Array(vec![]); "empty array")]
    #[test_case(" [ ] ", Value::Array(vec![]); "empty array with whitespace")]
    fn scalar_and_empty(input: &str, expected: Value) {
        assert_eq!(parse(input).unwrap(), expected);
    }

    #[test]
    fn nested_object() {
        let value =
            parse("{\"test1\": \"value\", \"test2\":\t123.456, \"test3\": {\"test4\": null}}")
                .unwrap();

        assert_eq!(
            value,
            object(vec![
                ("test1", Value::String("value".into())),
                ("test2", Value::Number(123.456)),
                ("test3", object(vec![("test4", Value::Null)])),
            ])
        );
    }

    #[test]
    fn nested_array() {
        let value = parse("[\"1\", 123, [null, 123.456]]").unwrap();

        assert_eq!(
            value,
            Value::Array(vec![
                Value::String("1".into()),
                Value::Number(123.0),
                Value::Array(vec![Value::Null, Value::Number(123.456)]),
            ])
        );
    }

    #[test]
    fn duplicate_keys_keep_last() {
        let value = parse("{\"a\": 1, \"b\": 2, \"a\": 3}").unwrap();
        assert_eq!(
            value,
            object(vec![("a", Value::Number(3.0)), ("b", Value::Number(2.0))])
        );
    }

    #[test]
    fn parse_leaves_current_on_last_token() {
        let mut parser = Parser::new(Lexer::new("[1, 2] 3".as_bytes())).unwrap();
        parser.parse().unwrap();
        assert_eq!(parser.current(), &Token::Punct(Punctuation::Square(Bracket::Close)));
        assert_eq!(parser.peek(), &Token::Number("3".into()));
    }

    #[test_case("}"; "closing brace")]
    #[test_case("]"; "closing bracket")]
    #[test_case(","; "comma")]
    #[test_case(":"; "colon")]
    #[test_case(""; "empty input")]
    fn no_value_start(input: &str) {
        assert!(matches!(parse_err(input), Error::ExpectedValue(_)));
    }

    #[test]
    fn object_errors() {
        assert_eq!(
            parse_err("{1: 2}"),
            Error::ExpectedKey(Token::Number("1".into()))
        );
        assert_eq!(
            parse_err("{\"a\" 2}"),
            Error::ExpectedColon(Token::Number("2".into()))
        );
        assert_eq!(
            parse_err("{\"a\": 1 \"b\": 2}"),
            Error::ExpectedObjectEnd(Token::String("b".into()))
        );
        assert_eq!(
            parse_err("{\"a\": }"),
            Error::ExpectedValue(Token::Punct(Punctuation::Curly(Bracket::Close)))
        );
        assert_eq!(
            parse_err("{\"a\": 1,}"),
            Error::ExpectedKey(Token::Punct(Punctuation::Curly(Bracket::Close)))
        );
        assert_eq!(parse_err("{\"a\": 1"), Error::ExpectedObjectEnd(Token::Eof));
        assert_eq!(parse_err("{"), Error::ExpectedKey(Token::Eof));
    }

    #[test]
    fn array_errors() {
        assert_eq!(
            parse_err("[1,]"),
            Error::ExpectedValue(Token::Punct(Punctuation::Square(Bracket::Close)))
        );
        assert_eq!(
            parse_err("[1 2]"),
            Error::ExpectedArrayEnd(Token::Number("2".into()))
        );
        assert_eq!(parse_err("[1, [2]"), Error::ExpectedArrayEnd(Token::Eof));
        assert_eq!(parse_err("["), Error::ExpectedValue(Token::Eof));
    }

    #[test]
    fn lexer_errors_abort_the_parse() {
        assert!(matches!(
            parse("[1, \"open"),
            Err(crate::Error::Lex(lexer::Error::MissingClosingQuote))
        ));
        assert!(matches!(
            parse("{\"a\": nul}"),
            Err(crate::Error::Lex(lexer::Error::Expected { .. }))
        ));
    }

    #[test]
    fn priming_surfaces_lexer_errors() {
        assert!(matches!(
            Parser::new(Lexer::new("1 @".as_bytes())),
            Err(crate::Error::Lex(lexer::Error::Unexpected(_)))
        ));
    }

    #[test]
    fn finish_rejects_trailing_tokens() {
        let mut parser = Parser::new(Lexer::new("0123".as_bytes())).unwrap();
        assert_eq!(parser.parse().unwrap(), Value::Number(0.0));
        assert!(matches!(
            parser.finish(),
            Err(crate::Error::Parse(Error::TrailingTokens(Token::Number(ref n)))) if n == "123"
        ));

        let mut parser = Parser::new(Lexer::new("{} ".as_bytes())).unwrap();
        parser.parse().unwrap();
        assert!(parser.finish().is_ok());
    }

    #[test]
    fn depth_limit() {
        let config = Config::new().max_depth(3);

        let mut parser = Parser::with_config(Lexer::new("[[[1]]]".as_bytes()), config).unwrap();
        assert!(parser.parse().is_ok());

        let mut parser =
            Parser::with_config(Lexer::new("[{\"a\": [[1]]}]".as_bytes()), config).unwrap();
        assert!(matches!(
            parser.parse(),
            Err(crate::Error::Parse(Error::DepthLimitExceeded(3)))
        ));
    }

    #[test]
    fn default_depth_limit_stops_runaway_nesting() {
        let input = "[".repeat(DEFAULT_MAX_DEPTH + 1);
        assert_eq!(parse_err(&input), Error::DepthLimitExceeded(DEFAULT_MAX_DEPTH));
    }

    #[test]
    fn error_messages() {
        assert_eq!(
            Error::ExpectedObjectEnd(Token::Eof).to_string(),
            "expected ',' or '}' in object, found end of input"
        );
        assert_eq!(
            Error::ExpectedColon(Token::Number("2".into())).to_string(),
            "expected ':' after object key, found number 2"
        );
    }
}
