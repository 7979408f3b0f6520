//! Cons-list traversal
//!
//! A list is a chain of `Cons(head, tail)` tuples ending in `Nil`. Lists are
//! never mutated after construction, so iterating one only moves a cursor;
//! starting again from the original word walks the same elements.

use std::iter::FusedIterator;

use crate::class::Builtin;
use crate::error::RuntimeError;
use crate::heap::Heap;
use crate::word::Word;

pub struct ListIter<'h> {
    heap: &'h Heap,
    cursor: Word,
    done: bool,
}

impl<'h> ListIter<'h> {
    pub(crate) fn new(heap: &'h Heap, list: Word) -> Self {
        ListIter {
            heap,
            cursor: list,
            done: false,
        }
    }
}

impl Iterator for ListIter<'_> {
    type Item = Result<Word, RuntimeError>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.done {
            return None;
        }
        match self.heap.match_tuple::<2>(self.cursor, Builtin::Cons.tag()) {
            Ok(Some([head, tail])) => {
                self.cursor = tail;
                Some(Ok(head))
            }
            Ok(None) => {
                self.done = true;
                if self.cursor.tag() == Builtin::Nil.tag() {
                    None
                } else {
                    // Improper list: the tail is neither a pair nor nil
                    Some(Err(RuntimeError::Type {
                        expected: Builtin::Nil.tag(),
                        found: self.cursor.tag(),
                    }))
                }
            }
            Err(e) => {
                self.done = true;
                Some(Err(e))
            }
        }
    }
}

impl FusedIterator for ListIter<'_> {}
