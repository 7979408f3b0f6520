//! fi-IR: block-structured functions with explicit terminators
//!
//! Literal values stay as words in the host heap they were read into; the
//! code generator turns them into C when it emits the initialization routine
//! and statements.

use fi_core::Word;

#[derive(Debug, Clone, PartialEq, Default)]
pub struct Program {
    pub definitions: Vec<Definition>,
}

#[derive(Debug, Clone, PartialEq)]
pub enum Definition {
    /// Global initialized from a literal at program start
    Var { name: String, value: Word },
    Func(FuncDef),
    Cons(ConsDef),
}

#[derive(Debug, Clone, PartialEq)]
pub struct FuncDef {
    pub name: String,
    pub params: Vec<String>,
    /// Non-empty; the first block is the entry point
    pub blocks: Vec<Block>,
}

impl FuncDef {
    pub fn block(&self, label: &str) -> Option<&Block> {
        self.blocks.iter().find(|b| b.label == label)
    }
}

/// A constructor declaration: one new user class with one field per name
#[derive(Debug, Clone, PartialEq)]
pub struct ConsDef {
    pub name: String,
    pub fields: Vec<String>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Block {
    pub label: String,
    pub params: Vec<String>,
    pub stmts: Vec<Stmt>,
    pub transfer: Transfer,
}

/// `target := expr`
#[derive(Debug, Clone, PartialEq)]
pub struct Stmt {
    pub target: String,
    pub expr: Expr,
}

#[derive(Debug, Clone, PartialEq)]
pub enum Expr {
    Literal(Word),
    Var(String),
    /// Primitive, constructor or function application
    Apply { callee: String, args: Vec<String> },
}

#[derive(Debug, Clone, PartialEq)]
pub enum Transfer {
    /// Tail call when `cont` is `None`; otherwise the result goes to the
    /// formals of block `cont`, which then runs
    Call {
        cont: Option<String>,
        callee: String,
        args: Vec<String>,
    },
    Goto { label: String, args: Vec<String> },
    Return(String),
    Match {
        scrutinee: String,
        clauses: Vec<Clause>,
        otherwise: Option<String>,
        /// Source line reported if no clause applies
        line: usize,
    },
}

#[derive(Debug, Clone, PartialEq)]
pub struct Clause {
    pub constructor: String,
    pub label: String,
}
