//! S-expression reader
//!
//! Turns the token stream into data in the host [`Heap`]: lists become
//! Cons/Nil chains, identifiers and keywords become `Id` tuples, numbers are
//! fixnums and strings are String objects. The parsers then take this data
//! apart with `match_tuple`, the same way emitted programs take theirs apart.
//!
//! List nesting is capped at a configured depth. Everything downstream walks
//! the data recursively, so the cap bounds their stack use as well.

use crate::error::CompileError;
use crate::lexer::{Token, TokenKind};
use fi_core::{Heap, Word};
use std::collections::HashMap;

/// The top-level forms of one input, plus source lines
#[derive(Debug, Default)]
pub struct Document {
    pub forms: Vec<Word>,
    lines: HashMap<Word, usize>,
}

impl Document {
    /// Line of a list's opening parenthesis or of an identifier.
    ///
    /// Every non-empty list and every identifier has a distinct word, so the
    /// lookup is exact for those; anything else reports line 0.
    pub fn line(&self, word: Word) -> usize {
        self.lines.get(&word).copied().unwrap_or(0)
    }
}

struct Reader<'t, 'h> {
    tokens: &'t [Token],
    pos: usize,
    heap: &'h mut Heap,
    lines: HashMap<Word, usize>,
    depth: usize,
    max_depth: usize,
}

impl Reader<'_, '_> {
    fn datum(&mut self) -> Result<Word, CompileError> {
        let tokens = self.tokens;
        let Some(token) = tokens.get(self.pos) else {
            let line = tokens.last().map_or(1, |t| t.line);
            return Err(CompileError::parse(line, "unexpected end of input"));
        };
        self.pos += 1;

        let word = match &token.kind {
            TokenKind::LParen => return self.list(token.line),
            TokenKind::RParen => return Err(CompileError::parse(token.line, "unexpected ')'")),
            TokenKind::Number(n) => return Ok(Word::fixnum(*n)),
            TokenKind::Str(bytes) => return Ok(self.heap.make_string(bytes)?),
            TokenKind::Keyword(keyword) => self.heap.make_id(keyword.as_str().as_bytes())?,
            TokenKind::Ident(name) => self.heap.make_id(name.as_bytes())?,
        };
        self.lines.insert(word, token.line);
        Ok(word)
    }

    fn list(&mut self, open_line: usize) -> Result<Word, CompileError> {
        if self.depth >= self.max_depth {
            return Err(CompileError::parse(
                open_line,
                format!("lists nested deeper than {} levels", self.max_depth),
            ));
        }
        self.depth += 1;
        let list = self.items(open_line);
        self.depth -= 1;
        list
    }

    fn items(&mut self, open_line: usize) -> Result<Word, CompileError> {
        let mut items = Vec::new();
        loop {
            match self.tokens.get(self.pos) {
                None => return Err(CompileError::parse(open_line, "missing ')'")),
                Some(Token {
                    kind: TokenKind::RParen,
                    ..
                }) => {
                    self.pos += 1;
                    break;
                }
                Some(_) => items.push(self.datum()?),
            }
        }
        let list = self.heap.list_from(items)?;
        if list != self.heap.nil() {
            self.lines.insert(list, open_line);
        }
        Ok(list)
    }
}

/// Read every top-level datum in `tokens`, allowing lists nested at most
/// `max_depth` deep
pub fn read(heap: &mut Heap, tokens: &[Token], max_depth: usize) -> Result<Document, CompileError> {
    let mut reader = Reader {
        tokens,
        pos: 0,
        heap,
        lines: HashMap::new(),
        depth: 0,
        max_depth,
    };
    let mut forms = Vec::new();
    while reader.pos < tokens.len() {
        forms.push(reader.datum()?);
    }
    Ok(Document {
        forms,
        lines: reader.lines,
    })
}
