//! Tokenizer shared by the fi and hi front ends
//!
//! Tokens are parentheses, keywords, identifiers (`[A-Za-z0-9]+` starting with
//! a letter), non-negative integer literals and double-quoted strings. A string
//! has no escape mechanism: the next `"` always ends it. `#` starts a comment
//! that runs to the end of the line.

use crate::error::CompileError;
use fi_core::FIXNUM_MAX;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Keyword {
    Define,
    Func,
    Block,
    Begin,
    Match,
    Switch,
    Branch,
    Case,
    Else,
    Set,
    Return,
    Goto,
}

impl Keyword {
    pub const ALL: &'static [Keyword] = &[
        Keyword::Define,
        Keyword::Func,
        Keyword::Block,
        Keyword::Begin,
        Keyword::Match,
        Keyword::Switch,
        Keyword::Branch,
        Keyword::Case,
        Keyword::Else,
        Keyword::Set,
        Keyword::Return,
        Keyword::Goto,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            Keyword::Define => "define",
            Keyword::Func => "func",
            Keyword::Block => "block",
            Keyword::Begin => "begin",
            Keyword::Match => "match",
            Keyword::Switch => "switch",
            Keyword::Branch => "branch",
            Keyword::Case => "case",
            Keyword::Else => "else",
            Keyword::Set => "set",
            Keyword::Return => "return",
            Keyword::Goto => "goto",
        }
    }

    pub fn lookup(text: &str) -> Option<Keyword> {
        Self::ALL.iter().copied().find(|k| k.as_str() == text)
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TokenKind {
    LParen,
    RParen,
    Keyword(Keyword),
    Ident(String),
    Number(i64),
    Str(Vec<u8>),
}

/// A token with its 1-based source line
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Token {
    pub kind: TokenKind,
    pub line: usize,
}

pub struct Lexer<'a> {
    input: &'a [u8],
    pos: usize,
    line: usize,
    max_token_len: usize,
}

impl<'a> Lexer<'a> {
    pub fn new(input: &'a [u8], max_token_len: usize) -> Self {
        Lexer {
            input,
            pos: 0,
            line: 1,
            max_token_len,
        }
    }

    fn peek(&self) -> Option<u8> {
        self.input.get(self.pos).copied()
    }

    fn skip_blanks(&mut self) {
        while let Some(c) = self.peek() {
            match c {
                b'\n' => {
                    self.line += 1;
                    self.pos += 1;
                }
                b' ' | b'\t' | b'\r' => self.pos += 1,
                b'#' => {
                    while self.peek().is_some_and(|c| c != b'\n') {
                        self.pos += 1;
                    }
                }
                _ => break,
            }
        }
    }

    fn string(&mut self) -> Result<TokenKind, CompileError> {
        let start_line = self.line;
        self.pos += 1;
        let start = self.pos;
        loop {
            match self.peek() {
                None => return Err(CompileError::lex(start_line, "Incomplete input.")),
                Some(b'"') => break,
                Some(c) => {
                    if c == b'\n' {
                        self.line += 1;
                    }
                    self.pos += 1;
                }
            }
        }
        let bytes = &self.input[start..self.pos];
        self.pos += 1;
        if bytes.len() > self.max_token_len {
            return Err(CompileError::lex(start_line, "String is too large."));
        }
        Ok(TokenKind::Str(bytes.to_vec()))
    }

    fn word(&mut self) -> Result<TokenKind, CompileError> {
        let start = self.pos;
        while self.peek().is_some_and(|c| c.is_ascii_alphanumeric()) {
            self.pos += 1;
        }
        let text = &self.input[start..self.pos];
        if text.len() > self.max_token_len {
            return Err(CompileError::lex(self.line, "Token is too large."));
        }

        if text[0].is_ascii_digit() {
            if !text.iter().all(u8::is_ascii_digit) {
                return Err(CompileError::lex(self.line, "Bad token."));
            }
            // Digits only, so the text is ASCII
            let digits = String::from_utf8_lossy(text);
            return match digits.parse::<i64>() {
                Ok(n) if n <= FIXNUM_MAX => Ok(TokenKind::Number(n)),
                _ => Err(CompileError::lex(
                    self.line,
                    format!("Integer literal {} is out of range.", digits),
                )),
            };
        }

        let text = String::from_utf8_lossy(text).into_owned();
        Ok(match Keyword::lookup(&text) {
            Some(keyword) => TokenKind::Keyword(keyword),
            None => TokenKind::Ident(text),
        })
    }

    /// Next token, or `None` at end of input
    pub fn next_token(&mut self) -> Result<Option<Token>, CompileError> {
        self.skip_blanks();
        let line = self.line;
        let kind = match self.peek() {
            None => return Ok(None),
            Some(b'(') => {
                self.pos += 1;
                TokenKind::LParen
            }
            Some(b')') => {
                self.pos += 1;
                TokenKind::RParen
            }
            Some(b'"') => self.string()?,
            Some(c) if c.is_ascii_alphanumeric() => self.word()?,
            Some(c) => {
                return Err(CompileError::lex(
                    line,
                    format!("Unexpected character '{}'.", c.escape_ascii()),
                ));
            }
        };
        Ok(Some(Token { kind, line }))
    }
}

/// Tokenize a whole input
pub fn tokenize(input: &[u8], max_token_len: usize) -> Result<Vec<Token>, CompileError> {
    let mut lexer = Lexer::new(input, max_token_len);
    let mut tokens = Vec::new();
    while let Some(token) = lexer.next_token()? {
        tokens.push(token);
    }
    Ok(tokens)
}
