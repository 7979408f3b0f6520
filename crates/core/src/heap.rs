//! Heap: tuples, strings and matching over an arena Store
//!
//! ## Object Layouts
//!
//! ```text
//! Tuple of arity N (N > 0):   [field 0][field 1]...[field N-1]     N x 8 bytes
//! Tuple of arity 0:           no storage; the word is just the tag
//! String:                     [len as fixnum][bytes...][0]         8 + len + 1 bytes
//! ```
//!
//! Every tuple is created against the class registry: the number of fields
//! must equal the arity registered for its tag. Matching is the only way to
//! take a value apart; it checks the tag and, on success, hands back the fields
//! in declared order.

use crate::class::{Builtin, ClassRegistry, Tag};
use crate::error::RuntimeError;
use crate::list::ListIter;
use crate::store::{DEFAULT_CAPACITY, Store, WORD_SIZE};
use crate::word::Word;

#[derive(Debug)]
pub struct Heap {
    store: Store,
    classes: ClassRegistry,
}

impl Heap {
    pub fn new() -> Self {
        Self::with_capacity(DEFAULT_CAPACITY)
    }

    pub fn with_capacity(capacity: usize) -> Self {
        Heap {
            store: Store::with_capacity(capacity),
            classes: ClassRegistry::new(),
        }
    }

    pub fn store(&self) -> &Store {
        &self.store
    }

    pub fn classes(&self) -> &ClassRegistry {
        &self.classes
    }

    pub fn classes_mut(&mut self) -> &mut ClassRegistry {
        &mut self.classes
    }

    pub fn register_arity(&mut self, tag: Tag, arity: u8) -> Result<(), RuntimeError> {
        self.classes.register_arity(tag, arity)
    }

    /// Allocate a tuple of class `tag` holding `fields`
    pub fn make_tuple(&mut self, tag: Tag, fields: &[Word]) -> Result<Word, RuntimeError> {
        let arity = self.classes.require_arity(tag)? as usize;
        if fields.len() != arity {
            return Err(RuntimeError::Arity {
                tag,
                expected: arity,
                found: fields.len(),
            });
        }
        if arity == 0 {
            return Ok(Word::heap(0, tag));
        }

        let offset = self.store.allocate(WORD_SIZE, arity * WORD_SIZE)?;
        for (i, field) in fields.iter().enumerate() {
            self.store.write_word(offset + i * WORD_SIZE, *field);
        }
        Ok(Word::heap(offset, tag))
    }

    /// Allocate a string: a fixnum length word, the bytes, then a 0 terminator
    pub fn make_string(&mut self, bytes: &[u8]) -> Result<Word, RuntimeError> {
        let offset = self
            .store
            .allocate(WORD_SIZE, WORD_SIZE + bytes.len() + 1)?;
        self.store
            .write_word(offset, Word::fixnum(bytes.len() as i64));
        self.store.write_bytes(offset + WORD_SIZE, bytes);
        self.store.write_bytes(offset + WORD_SIZE + bytes.len(), &[0]);
        Ok(Word::heap(offset, Builtin::String.tag()))
    }

    fn expect_class(word: Word, expected: Builtin) -> Result<(), RuntimeError> {
        if word.tag() != expected.tag() {
            return Err(RuntimeError::Type {
                expected: expected.tag(),
                found: word.tag(),
            });
        }
        Ok(())
    }

    /// Length of a string as recorded in its length word
    pub fn string_len(&self, word: Word) -> Result<usize, RuntimeError> {
        Self::expect_class(word, Builtin::String)?;
        Ok(self.store.read_word(word.offset()).as_fixnum() as usize)
    }

    /// Contents of a string, without the terminator
    pub fn string_bytes(&self, word: Word) -> Result<&[u8], RuntimeError> {
        let len = self.string_len(word)?;
        Ok(self.store.bytes(word.offset() + WORD_SIZE, len))
    }

    /// Address of a string's first byte; the bytes are NUL-terminated
    pub fn string_ptr(&self, word: Word) -> Result<*const u8, RuntimeError> {
        Self::expect_class(word, Builtin::String)?;
        Ok(self.store.as_ptr().wrapping_add(word.offset() + WORD_SIZE))
    }

    /// Read field `index` of a tuple
    pub fn field(&self, word: Word, index: usize) -> Result<Word, RuntimeError> {
        let tag = word.tag();
        if tag == Builtin::Fixnum.tag() || tag == Builtin::String.tag() {
            return Err(RuntimeError::NotATuple(tag));
        }
        let arity = self.classes.require_arity(tag)?;
        if index >= arity as usize {
            return Err(RuntimeError::FieldOutOfRange { tag, index, arity });
        }
        Ok(self.store.read_word(word.offset() + index * WORD_SIZE))
    }

    /// Match `word` against class `tag`, returning its fields on success.
    ///
    /// A tag mismatch is `Ok(None)`.
    pub fn match_class(&self, word: Word, tag: Tag) -> Result<Option<Vec<Word>>, RuntimeError> {
        if word.tag() != tag {
            return Ok(None);
        }
        let arity = self.classes.require_arity(tag)? as usize;
        let fields = (0..arity)
            .map(|i| self.store.read_word(word.offset() + i * WORD_SIZE))
            .collect();
        Ok(Some(fields))
    }

    /// Match with the expected field count stated by the caller.
    ///
    /// `N` must equal the registered arity of `tag`; a disagreement is an
    /// `Arity` error whether or not `word` carries that tag.
    pub fn match_tuple<const N: usize>(
        &self,
        word: Word,
        tag: Tag,
    ) -> Result<Option<[Word; N]>, RuntimeError> {
        let arity = self.classes.require_arity(tag)? as usize;
        if arity != N {
            return Err(RuntimeError::Arity {
                tag,
                expected: arity,
                found: N,
            });
        }
        if word.tag() != tag {
            return Ok(None);
        }

        let mut fields = [Word::fixnum(0); N];
        for (i, field) in fields.iter_mut().enumerate() {
            *field = self.store.read_word(word.offset() + i * WORD_SIZE);
        }
        Ok(Some(fields))
    }

    pub fn nil(&self) -> Word {
        Word::heap(0, Builtin::Nil.tag())
    }

    pub fn cons(&mut self, head: Word, tail: Word) -> Result<Word, RuntimeError> {
        self.make_tuple(Builtin::Cons.tag(), &[head, tail])
    }

    /// Build a cons-list holding `items` in order
    pub fn list_from<I>(&mut self, items: I) -> Result<Word, RuntimeError>
    where
        I: IntoIterator<Item = Word>,
        I::IntoIter: DoubleEndedIterator,
    {
        let mut list = self.nil();
        for item in items.into_iter().rev() {
            list = self.cons(item, list)?;
        }
        Ok(list)
    }

    /// Iterate the elements of a cons-list
    pub fn list(&self, list: Word) -> ListIter<'_> {
        ListIter::new(self, list)
    }

    /// Allocate an identifier: an `Id` tuple wrapping its name
    pub fn make_id(&mut self, name: &[u8]) -> Result<Word, RuntimeError> {
        let name = self.make_string(name)?;
        self.make_tuple(Builtin::Id.tag(), &[name])
    }

    /// Name of an identifier
    pub fn id_name(&self, word: Word) -> Result<&[u8], RuntimeError> {
        let [name] = self
            .match_tuple::<1>(word, Builtin::Id.tag())?
            .ok_or(RuntimeError::Type {
                expected: Builtin::Id.tag(),
                found: word.tag(),
            })?;
        self.string_bytes(name)
    }
}

impl Default for Heap {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::class::USER_CLASS_MIN;

    fn heap() -> Heap {
        Heap::with_capacity(64 * 1024)
    }

    #[test]
    fn test_tuple_match_returns_fields_in_order() {
        let mut heap = heap();
        for arity in 0..=4u8 {
            let tag = heap.classes_mut().declare_user_class(arity).unwrap();
            let fields: Vec<Word> = (0..arity as i64).map(|i| Word::fixnum(i * 10 - 7)).collect();
            let tuple = heap.make_tuple(tag, &fields).unwrap();
            assert_eq!(tuple.tag(), tag);
            assert_eq!(heap.match_class(tuple, tag).unwrap(), Some(fields));
        }
    }

    #[test]
    fn test_match_other_tag_is_no_match() {
        let mut heap = heap();
        let pair = heap.classes_mut().declare_user_class(2).unwrap();
        let other = heap.classes_mut().declare_user_class(2).unwrap();
        let tuple = heap
            .make_tuple(pair, &[Word::fixnum(1), Word::fixnum(2)])
            .unwrap();

        assert_eq!(heap.match_class(tuple, other).unwrap(), None);
        assert_eq!(heap.match_tuple::<2>(tuple, other).unwrap(), None);
        assert_eq!(
            heap.match_tuple::<2>(tuple, pair).unwrap(),
            Some([Word::fixnum(1), Word::fixnum(2)])
        );
    }

    #[test]
    fn test_make_tuple_rejects_wrong_field_count() {
        let mut heap = heap();
        for registered in 0..=4u8 {
            let tag = heap.classes_mut().declare_user_class(registered).unwrap();
            for given in 0..=4usize {
                if given == registered as usize {
                    continue;
                }
                let fields = vec![Word::fixnum(0); given];
                assert_eq!(
                    heap.make_tuple(tag, &fields),
                    Err(RuntimeError::Arity {
                        tag,
                        expected: registered as usize,
                        found: given
                    })
                );
            }
        }
    }

    #[test]
    fn test_match_tuple_checks_stated_arity() {
        let mut heap = heap();
        let cons = heap.cons(Word::fixnum(1), heap.nil()).unwrap();
        // Wrong stated arity fails even though the tag matches
        assert!(matches!(
            heap.match_tuple::<3>(cons, Builtin::Cons.tag()),
            Err(RuntimeError::Arity { .. })
        ));
        // ...and even when it does not
        assert!(matches!(
            heap.match_tuple::<1>(Word::fixnum(5), Builtin::Cons.tag()),
            Err(RuntimeError::Arity { .. })
        ));
    }

    #[test]
    fn test_unregistered_class() {
        let mut heap = heap();
        let tag = USER_CLASS_MIN + 9;
        assert_eq!(
            heap.make_tuple(tag, &[]),
            Err(RuntimeError::UnregisteredClass(tag))
        );
    }

    #[test]
    fn test_zero_arity_tuple_allocates_nothing() {
        let mut heap = heap();
        let before = heap.store().first_free();
        let nil = heap.make_tuple(Builtin::Nil.tag(), &[]).unwrap();
        assert_eq!(nil, heap.nil());
        assert_eq!(heap.store().first_free(), before);
    }

    #[test]
    fn test_string_layout_and_roundtrip() {
        let mut heap = heap();
        let text = b"hello, \\ \"world\"\n";
        let s = heap.make_string(text).unwrap();

        assert_eq!(s.tag(), Builtin::String.tag());
        assert_eq!(heap.string_bytes(s).unwrap(), text);
        assert_eq!(heap.string_len(s).unwrap(), text.len());
        assert_eq!(
            heap.store().read_word(s.offset()).as_fixnum(),
            text.len() as i64
        );
        assert_eq!(heap.store().bytes(s.offset() + WORD_SIZE + text.len(), 1), &[0]);
    }

    #[test]
    fn test_empty_string() {
        let mut heap = heap();
        let s = heap.make_string(b"").unwrap();
        assert_eq!(heap.string_bytes(s).unwrap(), b"");
    }

    #[test]
    fn test_string_ops_reject_other_classes() {
        let heap = heap();
        assert_eq!(
            heap.string_bytes(Word::fixnum(3)),
            Err(RuntimeError::Type {
                expected: Builtin::String.tag(),
                found: Builtin::Fixnum.tag()
            })
        );
    }

    #[test]
    fn test_field_access() {
        let mut heap = heap();
        let cons = heap.cons(Word::fixnum(9), heap.nil()).unwrap();
        assert_eq!(heap.field(cons, 0).unwrap(), Word::fixnum(9));
        assert_eq!(heap.field(cons, 1).unwrap(), heap.nil());
        assert_eq!(
            heap.field(cons, 2),
            Err(RuntimeError::FieldOutOfRange {
                tag: Builtin::Cons.tag(),
                index: 2,
                arity: 2
            })
        );
        assert_eq!(
            heap.field(Word::fixnum(1), 0),
            Err(RuntimeError::NotATuple(Builtin::Fixnum.tag()))
        );
        let s = heap.make_string(b"ab").unwrap();
        assert_eq!(
            heap.field(s, 0),
            Err(RuntimeError::NotATuple(Builtin::String.tag()))
        );
    }

    #[test]
    fn test_identifiers() {
        let mut heap = heap();
        let id = heap.make_id(b"swap").unwrap();
        assert_eq!(heap.id_name(id).unwrap(), b"swap");
        assert!(heap.id_name(Word::fixnum(0)).is_err());
    }

    #[test]
    fn test_out_of_memory_is_reported() {
        let mut heap = Heap::with_capacity(16);
        heap.cons(Word::fixnum(1), Word::fixnum(2)).unwrap();
        assert!(matches!(
            heap.cons(Word::fixnum(3), Word::fixnum(4)),
            Err(RuntimeError::OutOfMemory { .. })
        ));
    }
}
