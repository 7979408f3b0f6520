//! fi Core: the tagged-word object runtime
//!
//! Every value the fi toolchain talks about is one machine word carrying a
//! 16-bit class tag and a payload. Fixnums keep their integer in the payload;
//! every other class keeps a byte offset into a bump-allocated arena.
//!
//! This crate is instantiated twice: once by the compiler while it reads and
//! lowers its input (host side), and once by `fi-runtime` for the programs the
//! compiler emits (target side). The two instances never share a `Heap`.
//!
//! # Modules
//!
//! - `word`: the 64-bit tagged word layout
//! - `store`: fixed-capacity arena with a monotonic free cursor
//! - `class`: built-in class table and the open registry of user classes
//! - `heap`: tuple/string construction, field access and `match`
//! - `list`: cons-list traversal
//! - `error`: runtime error kinds

pub mod class;
pub mod error;
pub mod heap;
pub mod list;
pub mod store;
pub mod word;

pub use class::{Builtin, ClassRegistry, MAX_ARITY, Tag, USER_CLASS_MIN};
pub use error::RuntimeError;
pub use heap::Heap;
pub use list::ListIter;
pub use store::{DEFAULT_CAPACITY, Store, WORD_SIZE};
pub use word::{FIXNUM_MAX, FIXNUM_MIN, TAG_BITS, TAG_MASK, Word};

/// Names of the built-in primitive operations.
///
/// Calls to these are emitted under the primitive naming convention instead
/// of as ordinary calls, and `fi-runtime` exports one symbol for each.
pub const PRIMITIVES: &[&str] = &["fetch", "cons", "die", "genTmp", "genLabel"];

pub fn is_primitive(name: &str) -> bool {
    PRIMITIVES.contains(&name)
}

/// Verify that the host's C `long` is exactly 64 bits.
///
/// Emitted programs store every word in a `long`, and the word layout assumes
/// 48 payload bits above the 16 tag bits.
pub fn check_word_width() -> Result<(), RuntimeError> {
    let bits = std::mem::size_of::<std::ffi::c_long>() * 8;
    if bits != 64 {
        return Err(RuntimeError::WordWidth { bits });
    }
    Ok(())
}
