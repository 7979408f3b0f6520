//! Class Tags and the Arity Registry
//!
//! The tag space is flat: tags below [`USER_CLASS_MIN`] are the built-in
//! classes listed in [`Builtin`]; tags from `USER_CLASS_MIN` upward are handed
//! out to constructors declared by the program being compiled, in declaration
//! order. Every tag maps to a field count between 0 and [`MAX_ARITY`].

use crate::error::RuntimeError;

/// A class tag: the low 16 bits of a word
pub type Tag = u16;

/// Largest field count a tuple can have
pub const MAX_ARITY: u8 = 4;

/// First tag available to user-defined constructors
pub const USER_CLASS_MIN: Tag = Builtin::ALL.len() as Tag;

macro_rules! builtins {
    ($($name:ident = $arity:expr),* $(,)?) => {
        /// Built-in classes, in tag order
        #[repr(u16)]
        #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
        pub enum Builtin {
            $($name),*
        }

        impl Builtin {
            pub const ALL: &'static [Builtin] = &[$(Builtin::$name),*];

            pub fn name(self) -> &'static str {
                match self {
                    $(Builtin::$name => stringify!($name)),*
                }
            }

            pub fn arity(self) -> u8 {
                match self {
                    $(Builtin::$name => $arity),*
                }
            }
        }
    };
}

builtins! {
    Fixnum = 0,
    String = 0,
    Nil = 0,
    Cons = 2,
    Id = 1,
    HiDefineVar = 2,
    HiDefineFunc = 3,
    HiDefineCons = 2,
    HiDefineByMatch = 3,
    HiFunc = 2,
    HiBegin = 1,
    HiBlock = 2,
    HiCall = 2,
    HiConsApp = 2,
    HiPrimApp = 2,
    HiMatch = 2,
    HiCase = 3,
    HiElse = 1,
    FiDefineVar = 2,
    FiDefineFunc = 3,
    FiDefineCons = 2,
    FiBlock = 4,
    FiStmt = 2,
    FiCall = 3,
    FiGoto = 2,
    FiReturn = 1,
    FiMatch = 2,
    FiCase = 2,
    FiElse = 1,
    FiConsApp = 2,
    FiPrimApp = 2,
}

impl Builtin {
    #[inline(always)]
    pub fn tag(self) -> Tag {
        self as Tag
    }

    pub fn from_tag(tag: Tag) -> Option<Builtin> {
        Self::ALL.get(tag as usize).copied()
    }

    pub fn from_name(name: &str) -> Option<Builtin> {
        Self::ALL.iter().copied().find(|b| b.name() == name)
    }
}

/// Mapping from class tag to field count.
///
/// Built-in classes are preloaded. User classes are declared while the
/// compiler walks constructor definitions and must be re-registered with the
/// same arities when the emitted program starts.
#[derive(Debug, Clone)]
pub struct ClassRegistry {
    arities: Vec<Option<u8>>,
    /// One past the highest tag in use; may be `Tag::MAX + 1`
    next_user: u32,
}

impl ClassRegistry {
    pub fn new() -> Self {
        ClassRegistry {
            arities: Builtin::ALL.iter().map(|b| Some(b.arity())).collect(),
            next_user: USER_CLASS_MIN as u32,
        }
    }

    /// Record the arity of `tag`.
    ///
    /// Registering the same arity again is accepted; a different arity is an
    /// `ArityConflict`.
    pub fn register_arity(&mut self, tag: Tag, arity: u8) -> Result<(), RuntimeError> {
        if arity > MAX_ARITY {
            return Err(RuntimeError::Arity {
                tag,
                expected: MAX_ARITY as usize,
                found: arity as usize,
            });
        }

        let index = tag as usize;
        if index >= self.arities.len() {
            self.arities.resize(index + 1, None);
        }

        match self.arities[index] {
            Some(registered) if registered != arity => Err(RuntimeError::ArityConflict {
                tag,
                registered,
                requested: arity,
            }),
            _ => {
                self.arities[index] = Some(arity);
                self.next_user = self.next_user.max(tag as u32 + 1);
                Ok(())
            }
        }
    }

    /// Allocate the next user class tag and register its arity.
    ///
    /// Fails with `TagSpaceExhausted` once tag `Tag::MAX` is in use.
    pub fn declare_user_class(&mut self, arity: u8) -> Result<Tag, RuntimeError> {
        let tag = Tag::try_from(self.next_user).map_err(|_| RuntimeError::TagSpaceExhausted)?;
        self.register_arity(tag, arity)?;
        Ok(tag)
    }

    pub fn arity(&self, tag: Tag) -> Option<u8> {
        self.arities.get(tag as usize).copied().flatten()
    }

    /// Arity of `tag`, failing for tags nobody registered
    pub fn require_arity(&self, tag: Tag) -> Result<u8, RuntimeError> {
        self.arity(tag).ok_or(RuntimeError::UnregisteredClass(tag))
    }

    /// Registered user classes as `(tag, arity)`, in tag order
    pub fn user_classes(&self) -> impl Iterator<Item = (Tag, u8)> + '_ {
        self.arities
            .iter()
            .enumerate()
            .skip(USER_CLASS_MIN as usize)
            .filter_map(|(tag, arity)| arity.map(|a| (tag as Tag, a)))
    }
}

impl Default for ClassRegistry {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_builtin_table() {
        assert_eq!(USER_CLASS_MIN, 31);
        assert_eq!(Builtin::Fixnum.tag(), 0);
        assert_eq!(Builtin::String.tag(), 1);
        assert_eq!(Builtin::Cons.arity(), 2);
        assert_eq!(Builtin::FiBlock.arity(), 4);
        assert_eq!(Builtin::FiPrimApp.tag(), 30);
        for (i, b) in Builtin::ALL.iter().enumerate() {
            assert_eq!(b.tag() as usize, i);
            assert_eq!(Builtin::from_tag(b.tag()), Some(*b));
            assert_eq!(Builtin::from_name(b.name()), Some(*b));
        }
        assert_eq!(Builtin::from_tag(USER_CLASS_MIN), None);
        assert_eq!(Builtin::from_name("Pair"), None);
    }

    #[test]
    fn test_builtins_preregistered() {
        let registry = ClassRegistry::new();
        assert_eq!(registry.arity(Builtin::Nil.tag()), Some(0));
        assert_eq!(registry.arity(Builtin::HiCase.tag()), Some(3));
        assert_eq!(registry.arity(USER_CLASS_MIN), None);
        assert_eq!(registry.user_classes().count(), 0);
    }

    #[test]
    fn test_declare_user_classes_in_order() {
        let mut registry = ClassRegistry::new();
        let pair = registry.declare_user_class(2).unwrap();
        let leaf = registry.declare_user_class(0).unwrap();
        assert_eq!(pair, USER_CLASS_MIN);
        assert_eq!(leaf, USER_CLASS_MIN + 1);
        let classes: Vec<_> = registry.user_classes().collect();
        assert_eq!(classes, vec![(pair, 2), (leaf, 0)]);
    }

    #[test]
    fn test_reregistration() {
        let mut registry = ClassRegistry::new();
        registry.register_arity(40, 3).unwrap();
        registry.register_arity(40, 3).unwrap();
        assert_eq!(
            registry.register_arity(40, 1),
            Err(RuntimeError::ArityConflict {
                tag: 40,
                registered: 3,
                requested: 1
            })
        );
        assert_eq!(
            registry.register_arity(Builtin::Cons.tag(), 1),
            Err(RuntimeError::ArityConflict {
                tag: Builtin::Cons.tag(),
                registered: 2,
                requested: 1
            })
        );
        // Declaring after an explicit registration continues past it
        assert_eq!(registry.declare_user_class(1).unwrap(), 41);
    }

    #[test]
    fn test_tag_space_exhaustion() {
        let mut registry = ClassRegistry::new();
        registry.register_arity(Tag::MAX - 1, 1).unwrap();
        assert_eq!(registry.declare_user_class(1).unwrap(), Tag::MAX);
        assert_eq!(
            registry.declare_user_class(1),
            Err(RuntimeError::TagSpaceExhausted)
        );
        // The failed declaration registered nothing new
        assert_eq!(registry.user_classes().count(), 2);
        assert_eq!(registry.arity(Tag::MAX), Some(1));
    }

    #[test]
    fn test_declaring_every_user_tag() {
        let mut registry = ClassRegistry::new();
        let mut last = 0;
        for _ in USER_CLASS_MIN..=Tag::MAX {
            last = registry.declare_user_class(0).unwrap();
        }
        assert_eq!(last, Tag::MAX);
        assert!(registry.declare_user_class(0).is_err());
    }

    #[test]
    fn test_arity_limit() {
        let mut registry = ClassRegistry::new();
        assert!(registry.register_arity(50, 5).is_err());
        assert_eq!(registry.arity(50), None);
        assert_eq!(
            registry.require_arity(50),
            Err(RuntimeError::UnregisteredClass(50))
        );
    }
}
