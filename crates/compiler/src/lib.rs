//! fi Compiler Library
//!
//! Two pipelines share one back end:
//!
//! - **fi**: fi-IR text → tokens → heap s-expressions → fi-IR → C
//! - **hi**: hi-IR text → tokens → heap s-expressions → hi-IR → (lower) →
//!   fi-IR → C
//!
//! The input is read into a host [`fi_core::Heap`] that lives only for the
//! duration of one compilation. The emitted C links against `fi-runtime`,
//! which owns a separate heap at the generated program's run time.
//!
//! ```rust,ignore
//! use fic::{CompilerConfig, compile_fi};
//!
//! let compiled = compile_fi(b"(define (Pair a b))", &CompilerConfig::default())?;
//! print!("{}", compiled.code);
//! ```

pub mod cli;
pub mod codegen;
pub mod config;
pub mod error;
pub mod hir;
pub mod ir;
pub mod lexer;
pub mod lower;
pub mod parser;
pub mod reader;

pub use codegen::{CodeGen, Diagnostic};
pub use config::CompilerConfig;
pub use error::CompileError;
pub use ir::Program;

use fi_core::Heap;
use tracing::debug;

/// Generated C plus the non-fatal findings made while producing it
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Compiled {
    pub code: String,
    pub diagnostics: Vec<Diagnostic>,
}

/// Which surface language the input is in
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Pipeline {
    Fi,
    Hi,
}

/// Compile `source` in the given language
pub fn compile(
    pipeline: Pipeline,
    source: &[u8],
    config: &CompilerConfig,
) -> Result<Compiled, CompileError> {
    config.validate()?;

    let tokens = lexer::tokenize(source, config.max_token_len)?;
    debug!(tokens = tokens.len(), "tokenized");
    let mut heap = Heap::with_capacity(config.arena_capacity);
    let doc = reader::read(&mut heap, &tokens, config.max_depth)?;
    debug!(
        forms = doc.forms.len(),
        arena_bytes = heap.store().first_free(),
        "read input"
    );

    let program = match pipeline {
        Pipeline::Fi => parser::fi::parse_program(&heap, &doc)?,
        Pipeline::Hi => {
            let hi = parser::hi::parse_program(&heap, &doc)?;
            lower::lower_program(&hi, config)?
        }
    };
    debug!(definitions = program.definitions.len(), "parsed");

    let mut codegen = CodeGen::new(&heap, config);
    let code = codegen.generate(&program)?;
    Ok(Compiled {
        code,
        diagnostics: codegen.into_diagnostics(),
    })
}

/// Compile fi-IR source to C
pub fn compile_fi(source: &[u8], config: &CompilerConfig) -> Result<Compiled, CompileError> {
    compile(Pipeline::Fi, source, config)
}

/// Compile hi-IR source to C, lowering through fi-IR
pub fn compile_hi(source: &[u8], config: &CompilerConfig) -> Result<Compiled, CompileError> {
    compile(Pipeline::Hi, source, config)
}
