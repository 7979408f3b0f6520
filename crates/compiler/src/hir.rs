//! hi-IR: expression-oriented surface form, lowered to fi-IR by `lower`

use fi_core::Word;

#[derive(Debug, Clone, PartialEq, Default)]
pub struct HiProgram {
    pub definitions: Vec<HiDefinition>,
}

#[derive(Debug, Clone, PartialEq)]
pub enum HiDefinition {
    Var {
        name: String,
        value: Word,
    },
    Func {
        name: String,
        params: Vec<String>,
        body: HiExpr,
    },
    Cons {
        name: String,
        fields: Vec<String>,
    },
}

#[derive(Debug, Clone, PartialEq)]
pub enum HiExpr {
    Literal(Word),
    Var(String),
    Apply {
        callee: String,
        args: Vec<HiExpr>,
    },
    /// Evaluate in order; the value is the last one's
    Begin(Vec<HiExpr>),
    /// Local bindings, each visible to the ones after it and to `body`
    Block {
        bindings: Vec<(String, HiExpr)>,
        body: Box<HiExpr>,
    },
    Match {
        scrutinee: Box<HiExpr>,
        arms: Vec<Arm>,
        otherwise: Option<Box<HiExpr>>,
        line: usize,
    },
}

/// `(case CONSTRUCTOR (binder*) body)`
#[derive(Debug, Clone, PartialEq)]
pub struct Arm {
    pub constructor: String,
    pub binders: Vec<String>,
    pub body: HiExpr,
}
