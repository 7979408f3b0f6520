//! Arena Store
//!
//! A fixed-capacity byte buffer with a free cursor that only moves forward.
//! Objects are addressed by byte offset from the start of the buffer, which
//! is what a heap [`Word`] carries in its payload. Nothing is ever freed; the
//! buffer lives until the owning process exits.
//!
//! The buffer is allocated once and never reallocated, so raw pointers into it
//! (handed to generated C code for string contents) stay valid for the life of
//! the store.

use crate::error::RuntimeError;
use crate::word::Word;

/// Size of one stored field in bytes
pub const WORD_SIZE: usize = std::mem::size_of::<i64>();

/// Default arena capacity: 128 MiB
pub const DEFAULT_CAPACITY: usize = 128 * 1024 * 1024;

pub struct Store {
    data: Box<[u8]>,
    first_free: usize,
}

impl Store {
    pub fn with_capacity(capacity: usize) -> Self {
        Store {
            data: vec![0u8; capacity].into_boxed_slice(),
            first_free: 0,
        }
    }

    /// Reserve `size` bytes starting at the next multiple of `align`
    /// (rounded up to a power of two).
    ///
    /// Returns the offset of the reservation. Fails with `OutOfMemory` when the
    /// reservation would end past the capacity; the cursor is left unchanged.
    pub fn allocate(&mut self, align: usize, size: usize) -> Result<usize, RuntimeError> {
        // Round up to a power of two; an alignment of 0 means unaligned
        let align = align.max(1).next_power_of_two();
        let out_of_memory = || RuntimeError::OutOfMemory {
            requested: size,
            available: self.data.len().saturating_sub(self.first_free),
        };

        let start = self
            .first_free
            .checked_next_multiple_of(align)
            .ok_or_else(out_of_memory)?;
        let end = start
            .checked_add(size)
            .filter(|end| *end <= self.data.len())
            .ok_or_else(out_of_memory)?;

        self.first_free = end;
        Ok(start)
    }

    /// Offset of the first byte not yet handed out
    pub fn first_free(&self) -> usize {
        self.first_free
    }

    pub fn capacity(&self) -> usize {
        self.data.len()
    }

    pub fn read_word(&self, offset: usize) -> Word {
        let mut bytes = [0u8; WORD_SIZE];
        bytes.copy_from_slice(&self.data[offset..offset + WORD_SIZE]);
        Word::from_raw(i64::from_ne_bytes(bytes))
    }

    pub fn write_word(&mut self, offset: usize, word: Word) {
        self.data[offset..offset + WORD_SIZE].copy_from_slice(&word.raw().to_ne_bytes());
    }

    pub fn bytes(&self, offset: usize, len: usize) -> &[u8] {
        &self.data[offset..offset + len]
    }

    pub fn write_bytes(&mut self, offset: usize, bytes: &[u8]) {
        self.data[offset..offset + bytes.len()].copy_from_slice(bytes);
    }

    /// Base address of the buffer
    pub fn as_ptr(&self) -> *const u8 {
        self.data.as_ptr()
    }
}

impl std::fmt::Debug for Store {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Store")
            .field("capacity", &self.data.len())
            .field("first_free", &self.first_free)
            .finish()
    }
}
