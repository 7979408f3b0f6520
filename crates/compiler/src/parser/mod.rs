//! Parsers from heap s-expressions to fi-IR and hi-IR
//!
//! Both walk the data produced by [`crate::reader`]. [`Forms`] holds the
//! helpers they share for taking apart lists, names and keywords.

pub mod fi;
pub mod hi;

use crate::error::CompileError;
use crate::lexer::Keyword;
use crate::reader::Document;
use fi_core::{Builtin, Heap, Word};

/// View over the forms of one document
pub(crate) struct Forms<'a> {
    heap: &'a Heap,
    doc: &'a Document,
}

impl<'a> Forms<'a> {
    pub(crate) fn new(heap: &'a Heap, doc: &'a Document) -> Self {
        Forms { heap, doc }
    }

    pub(crate) fn top_level(&self) -> &'a [Word] {
        &self.doc.forms
    }

    pub(crate) fn line(&self, word: Word) -> usize {
        self.doc.line(word)
    }

    pub(crate) fn is_list(&self, word: Word) -> bool {
        word.tag() == Builtin::Cons.tag() || word.tag() == Builtin::Nil.tag()
    }

    /// Elements of a list, or `None` if `word` is not a list
    pub(crate) fn items(&self, word: Word) -> Result<Option<Vec<Word>>, CompileError> {
        if !self.is_list(word) {
            return Ok(None);
        }
        let items = self
            .heap
            .list(word)
            .collect::<Result<Vec<Word>, _>>()?;
        Ok(Some(items))
    }

    /// Elements of a list, failing with `what` if `word` is not one
    pub(crate) fn expect_list(
        &self,
        word: Word,
        line: usize,
        what: &str,
    ) -> Result<Vec<Word>, CompileError> {
        self.items(word)?
            .ok_or_else(|| CompileError::parse(line, format!("expected {}", what)))
    }

    fn id_text(&self, word: Word) -> Option<String> {
        if word.tag() != Builtin::Id.tag() {
            return None;
        }
        let bytes = self.heap.id_name(word).ok()?;
        Some(String::from_utf8_lossy(bytes).into_owned())
    }

    pub(crate) fn keyword(&self, word: Word) -> Option<Keyword> {
        self.id_text(word).and_then(|text| Keyword::lookup(&text))
    }

    /// Identifier that is not a keyword
    pub(crate) fn name(&self, word: Word) -> Option<String> {
        self.id_text(word)
            .filter(|text| Keyword::lookup(text).is_none())
    }

    pub(crate) fn expect_name(
        &self,
        word: Word,
        line: usize,
        what: &str,
    ) -> Result<String, CompileError> {
        self.name(word).ok_or_else(|| {
            let line = self.line(word).max(line);
            CompileError::parse(line, format!("expected {}", what))
        })
    }

    /// List of names, such as formal parameters
    pub(crate) fn names(
        &self,
        word: Word,
        line: usize,
        what: &str,
    ) -> Result<Vec<String>, CompileError> {
        self.expect_list(word, line, what)?
            .into_iter()
            .map(|w| self.expect_name(w, line, what))
            .collect()
    }

    /// Number or string literal
    pub(crate) fn is_literal(&self, word: Word) -> bool {
        word.is_fixnum() || word.tag() == Builtin::String.tag()
    }

    /// `(define ...)` forms: name plus the rest of the items
    pub(crate) fn definition(&self, form: Word) -> Result<(usize, Vec<Word>), CompileError> {
        let line = self.line(form);
        let items = self.expect_list(form, line, "a top-level (define ...) form")?;
        match items.split_first() {
            Some((head, rest)) if self.keyword(*head) == Some(Keyword::Define) => {
                Ok((line, rest.to_vec()))
            }
            _ => Err(CompileError::parse(line, "expected (define ...)")),
        }
    }

    /// Split `(NAME ARG*)` into the name and its formals
    pub(crate) fn signature(
        &self,
        word: Word,
        line: usize,
    ) -> Result<(String, Vec<String>), CompileError> {
        let items = self.expect_list(word, line, "(NAME ARG*)")?;
        let Some((head, args)) = items.split_first() else {
            return Err(CompileError::parse(line, "empty signature"));
        };
        let name = self.expect_name(*head, line, "a definition name")?;
        let params = args
            .iter()
            .map(|w| self.expect_name(*w, line, "a parameter name"))
            .collect::<Result<Vec<_>, _>>()?;
        Ok((name, params))
    }
}

#[cfg(test)]
pub(crate) mod test_support {
    use crate::lexer::tokenize;
    use crate::reader::{Document, read};
    use fi_core::Heap;

    pub(crate) fn read_source(input: &str) -> (Heap, Document) {
        let mut heap = Heap::with_capacity(256 * 1024);
        let tokens = tokenize(input.as_bytes(), 255).unwrap();
        let doc = read(&mut heap, &tokens, 64).unwrap();
        (heap, doc)
    }
}
