//! Tagged Word Layout
//!
//! One machine word encodes every value:
//!
//! ```text
//! 63                                              16 15             0
//! ┌────────────────────────────────────────────────┬────────────────┐
//! │ payload (48 bits)                              │ class tag      │
//! └────────────────────────────────────────────────┴────────────────┘
//! ```
//!
//! - Fixnum (tag 0): the payload is a signed 48-bit integer. Encoding shifts
//!   the integer left by 16, which leaves the tag bits zero.
//! - Every other class: the payload is a byte offset into the arena where the
//!   object's fields start.

use crate::class::{Builtin, Tag};

/// Number of low bits holding the class tag
pub const TAG_BITS: u32 = 16;

/// Mask selecting the class tag
pub const TAG_MASK: u64 = 0xFFFF;

/// Smallest integer a fixnum can hold: -2^47
pub const FIXNUM_MIN: i64 = -(1i64 << 47);

/// Largest integer a fixnum can hold: 2^47 - 1
pub const FIXNUM_MAX: i64 = (1i64 << 47) - 1;

/// A tagged 64-bit value
#[repr(transparent)]
#[derive(Clone, Copy, PartialEq, Eq, Hash)]
pub struct Word(i64);

impl Word {
    /// Encode an integer as a fixnum.
    ///
    /// Bits above the 48-bit payload are shifted out; use [`Word::try_fixnum`]
    /// when the input is not known to be in range.
    #[inline(always)]
    pub fn fixnum(n: i64) -> Self {
        Word(((n as u64) << TAG_BITS) as i64)
    }

    /// Encode an integer as a fixnum if it fits in 48 bits
    pub fn try_fixnum(n: i64) -> Option<Self> {
        if (FIXNUM_MIN..=FIXNUM_MAX).contains(&n) {
            Some(Self::fixnum(n))
        } else {
            None
        }
    }

    /// Build a heap reference from an arena offset and a class tag
    #[inline(always)]
    pub fn heap(offset: usize, tag: Tag) -> Self {
        Word((((offset as u64) << TAG_BITS) | tag as u64) as i64)
    }

    /// Decode a fixnum (arithmetic shift, sign-extended)
    #[inline(always)]
    pub fn as_fixnum(self) -> i64 {
        self.0 >> TAG_BITS
    }

    /// The class tag in the low 16 bits
    #[inline(always)]
    pub fn tag(self) -> Tag {
        (self.0 as u64 & TAG_MASK) as Tag
    }

    /// The arena offset of a heap object
    #[inline(always)]
    pub fn offset(self) -> usize {
        ((self.0 as u64) >> TAG_BITS) as usize
    }

    #[inline(always)]
    pub fn is_fixnum(self) -> bool {
        self.tag() == Builtin::Fixnum.tag()
    }

    /// Raw bits, as stored in a C `long`
    #[inline(always)]
    pub fn raw(self) -> i64 {
        self.0
    }

    /// Reinterpret raw bits received from generated code
    #[inline(always)]
    pub fn from_raw(bits: i64) -> Self {
        Word(bits)
    }
}

impl std::fmt::Debug for Word {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        if self.is_fixnum() {
            write!(f, "Fixnum({})", self.as_fixnum())
        } else {
            let class = Builtin::from_tag(self.tag())
                .map(|b| b.name().to_string())
                .unwrap_or_else(|| format!("class {}", self.tag()));
            write!(f, "Word {{ {}, offset: {} }}", class, self.offset())
        }
    }
}
