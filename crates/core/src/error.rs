//! Object runtime error kinds
//!
//! All of these are fatal for the process that hits them. The host side
//! propagates them with `?` up to the CLI; the target side prints them and
//! exits.

use crate::class::{Builtin, Tag};

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RuntimeError {
    /// The arena cannot satisfy an allocation
    OutOfMemory { requested: usize, available: usize },
    /// A field count disagrees with the class's registered arity
    Arity {
        tag: Tag,
        expected: usize,
        found: usize,
    },
    /// A field index at or beyond the class's arity
    FieldOutOfRange { tag: Tag, index: usize, arity: u8 },
    /// A class was registered twice with different arities
    ArityConflict {
        tag: Tag,
        registered: u8,
        requested: u8,
    },
    /// An operation was applied to a value of the wrong class
    Type { expected: Tag, found: Tag },
    /// Field access on a fixnum or string
    NotATuple(Tag),
    /// A tag with no registered arity was constructed or inspected
    UnregisteredClass(Tag),
    /// Every user class tag up to `Tag::MAX` is taken
    TagSpaceExhausted,
    /// No clause matched and there was no else clause
    MatchFailure { line: u32, tag: Tag },
    /// The host C `long` is not 64 bits wide
    WordWidth { bits: usize },
}

fn class_name(tag: Tag) -> String {
    match Builtin::from_tag(tag) {
        Some(b) => b.name().to_string(),
        None => format!("class {}", tag),
    }
}

impl std::fmt::Display for RuntimeError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            RuntimeError::OutOfMemory {
                requested,
                available,
            } => write!(
                f,
                "Out of memory: requested {} bytes, {} available",
                requested, available
            ),
            RuntimeError::Arity {
                tag,
                expected,
                found,
            } => write!(
                f,
                "Arity error: {} has arity {}, got {}",
                class_name(*tag),
                expected,
                found
            ),
            RuntimeError::FieldOutOfRange { tag, index, arity } => write!(
                f,
                "Arity error: fetching slot {} of {} which has arity {}",
                index,
                class_name(*tag),
                arity
            ),
            RuntimeError::ArityConflict {
                tag,
                registered,
                requested,
            } => write!(
                f,
                "Arity error: {} already registered with arity {}, cannot re-register with {}",
                class_name(*tag),
                registered,
                requested
            ),
            RuntimeError::Type { expected, found } => write!(
                f,
                "Type error: expected {}, got {}",
                class_name(*expected),
                class_name(*found)
            ),
            RuntimeError::NotATuple(tag) => {
                write!(f, "Type error: {} has no fields", class_name(*tag))
            }
            RuntimeError::UnregisteredClass(tag) => {
                write!(f, "Type error: class {} has no registered arity", tag)
            }
            RuntimeError::TagSpaceExhausted => write!(
                f,
                "Too many classes: all {} user class tags are in use",
                Tag::MAX as usize + 1 - crate::class::USER_CLASS_MIN as usize
            ),
            RuntimeError::MatchFailure { line, tag } => {
                write!(f, "Match failure. Line: {}. Class: {}", line, tag)
            }
            RuntimeError::WordWidth { bits } => write!(
                f,
                "The C long type is not 64 bits wide (found {} bits)",
                bits
            ),
        }
    }
}

impl std::error::Error for RuntimeError {}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_match_failure_message() {
        let e = RuntimeError::MatchFailure { line: 12, tag: 33 };
        assert_eq!(e.to_string(), "Match failure. Line: 12. Class: 33");
    }

    #[test]
    fn test_arity_message_names_builtin() {
        let e = RuntimeError::Arity {
            tag: Builtin::Cons.tag(),
            expected: 2,
            found: 3,
        };
        assert_eq!(e.to_string(), "Arity error: Cons has arity 2, got 3");
    }
}
