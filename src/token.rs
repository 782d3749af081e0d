use std::fmt;

#[derive(Debug, Copy, Clone, Eq, PartialEq)]
pub enum Bracket {
    Open,
    Close,
}

#[derive(Debug, Copy, Clone, Eq, PartialEq)]
pub enum Punctuation {
    Comma,
    Colon,
    Square(Bracket),
    Curly(Bracket),
}

impl Punctuation {
    pub fn as_str(self) -> &'static str {
        match self {
            Punctuation::Comma => ",",
            Punctuation::Colon => ":",
            Punctuation::Square(Bracket::Open) => "[",
            Punctuation::Square(Bracket::Close) => "]",
            Punctuation::Curly(Bracket::Open) => "{",
            Punctuation::Curly(Bracket::Close) => "}",
        }
    }
}

/// The flat tag of a [`Token`].
#[derive(Debug, Copy, Clone, Eq, PartialEq, Hash)]
pub enum TokenKind {
    Eof,
    String,
    Number,
    Boolean,
    Null,
    LBrace,
    RBrace,
    LBracket,
    RBracket,
    Comma,
    Colon,
}

/// A lexical unit produced by the lexer.
///
/// String tokens hold the text between the quotes with escape sequences left
/// as scanned. Number tokens hold the literal text; conversion to a number
/// happens in the parser.
#[derive(Debug, Clone, PartialEq)]
pub enum Token {
    Eof,
    Punct(Punctuation),
    Null,
    Boolean(bool),
    Number(String),
    String(String),
}

impl Token {
    pub fn kind(&self) -> TokenKind {
        match self {
            Token::Eof => TokenKind::Eof,
            Token::Punct(Punctuation::Comma) => TokenKind::Comma,
            Token::Punct(Punctuation::Colon) => TokenKind::Colon,
            Token::Punct(Punctuation::Curly(Bracket::Open)) => TokenKind::LBrace,
            Token::Punct(Punctuation::Curly(Bracket::Close)) => TokenKind::RBrace,
            Token::Punct(Punctuation::Square(Bracket::Open)) => TokenKind::LBracket,
            Token::Punct(Punctuation::Square(Bracket::Close)) => TokenKind::RBracket,
            Token::Null => TokenKind::Null,
            Token::Boolean(_) => TokenKind::Boolean,
            Token::Number(_) => TokenKind::Number,
            Token::String(_) => TokenKind::String,
        }
    }

    /// The source text this token stands for. Empty for [`Token::Eof`].
    pub fn literal(&self) -> &str {
        match self {
            Token::Eof => "",
            Token::Punct(punct) => punct.as_str(),
            Token::Null => "null",
            Token::Boolean(true) => "true",
            Token::Boolean(false) => "false",
            Token::Number(literal) | Token::String(literal) => literal,
        }
    }

    pub fn is(&self, kind: TokenKind) -> bool {
        self.kind() == kind
    }
}

impl fmt::Display for Token {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Token::Eof => f.write_str("end of input"),
            Token::Punct(punct) => write!(f, "'{}'", punct.as_str()),
            Token::Null => f.write_str("null"),
            Token::Boolean(value) => write!(f, "{}", value),
            Token::Number(literal) => write!(f, "number {}", literal),
            Token::String(literal) => write!(f, "string \"{}\"", literal),
        }
    }
}
