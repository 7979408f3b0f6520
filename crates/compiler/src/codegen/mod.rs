//! C Code Generation
//!
//! Lowers fi-IR to C source that links against the fi runtime. Every value is
//! a `long` holding a tagged word; control flow inside a function is plain
//! `goto` between labels, one label per block.
//!
//! # Passes
//!
//! The program is walked five times, each pass appending to one buffer:
//! 1. class tags for user constructors (an `enum` continuing from
//!    `USER_CLASS_MIN`)
//! 2. forward declarations for globals, functions and constructors
//! 3. function bodies
//! 4. constructor bodies
//! 5. the initialization routine, which registers constructor arities and
//!    assigns the globals
//!
//! Output is only returned once all five passes succeed.

mod decls;
mod functions;
mod init;
mod transfer;

use crate::config::CompilerConfig;
use crate::error::CompileError;
use crate::ir::{Definition, Program};
use fi_core::{Builtin, ClassRegistry, Heap, Tag, Word};
use std::collections::{HashMap, HashSet};
use std::fmt::Write as _;
use tracing::debug;

/// Non-fatal findings recorded while generating
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Diagnostic {
    /// Two blocks introduce the same variable; they share its storage
    SharedVariable {
        function: String,
        name: String,
        first_block: String,
        block: String,
    },
    /// A later match clause for a constructor that an earlier clause
    /// already handles
    DuplicateClause {
        function: String,
        constructor: String,
    },
}

impl std::fmt::Display for Diagnostic {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Diagnostic::SharedVariable {
                function,
                name,
                first_block,
                block,
            } => write!(
                f,
                "in '{}': blocks '{}' and '{}' both introduce '{}' and share its storage",
                function, first_block, block, name
            ),
            Diagnostic::DuplicateClause {
                function,
                constructor,
            } => write!(
                f,
                "in '{}': clause for '{}' is unreachable and was dropped",
                function, constructor
            ),
        }
    }
}

/// C spelling of a class tag
fn class_ident(name: &str) -> String {
    format!("CLASS_{}", name)
}

/// `long a, long b` or `void`
fn typed_params(params: &[String]) -> String {
    if params.is_empty() {
        "void".to_string()
    } else {
        params
            .iter()
            .map(|p| format!("long {}", p))
            .collect::<Vec<_>>()
            .join(", ")
    }
}

/// Escape bytes for a C string literal so that it denotes exactly `bytes`
pub fn escape_c_string(bytes: &[u8]) -> String {
    let mut result = String::with_capacity(bytes.len());
    for &byte in bytes {
        match byte {
            b'\\' => result.push_str(r"\\"),
            b'"' => result.push_str("\\\""),
            b'\n' => result.push_str(r"\n"),
            b'\t' => result.push_str(r"\t"),
            b'\r' => result.push_str(r"\r"),
            // Keeps "??x" from being read as a trigraph
            b'?' => result.push_str(r"\?"),
            b' '..=b'~' => result.push(byte as char),
            _ => {
                // Always three digits, so a following digit is not absorbed
                let _ = write!(&mut result, "\\{:03o}", byte);
            }
        }
    }
    result
}

pub struct CodeGen<'a> {
    /// Host heap holding the literals the parser left as words
    heap: &'a Heap,
    config: &'a CompilerConfig,
    output: String,
    /// Built-in classes plus the user classes declared in pass 1
    classes: ClassRegistry,
    constructors: HashMap<String, Tag>,
    /// `(class, arity)` recorded by pass 4 for the initialization routine
    registrations: Vec<(String, u8)>,
    diagnostics: Vec<Diagnostic>,
}

impl<'a> CodeGen<'a> {
    pub fn new(heap: &'a Heap, config: &'a CompilerConfig) -> Self {
        CodeGen {
            heap,
            config,
            output: String::new(),
            classes: ClassRegistry::new(),
            constructors: HashMap::new(),
            registrations: Vec::new(),
            diagnostics: Vec::new(),
        }
    }

    /// Generate C for an entire program
    pub fn generate(&mut self, program: &Program) -> Result<String, CompileError> {
        self.output.clear();
        self.classes = ClassRegistry::new();
        self.constructors.clear();
        self.registrations.clear();
        self.diagnostics.clear();

        check_definitions(program, self.config)?;

        writeln!(
            &mut self.output,
            "#include \"{}\"",
            self.config.runtime_header
        )?;

        debug!("pass 1: class declarations");
        self.emit_class_decls(program)?;
        debug!("pass 2: forward declarations");
        self.emit_forward_decls(program)?;
        debug!("pass 3: function bodies");
        self.emit_functions(program)?;
        debug!("pass 4: constructor bodies");
        self.emit_constructors(program)?;
        debug!("pass 5: initialization routine");
        self.emit_init(program)?;

        Ok(std::mem::take(&mut self.output))
    }

    pub fn diagnostics(&self) -> &[Diagnostic] {
        &self.diagnostics
    }

    pub fn into_diagnostics(self) -> Vec<Diagnostic> {
        self.diagnostics
    }

    /// Tag and arity of a class usable in a match clause
    fn lookup_class(&self, name: &str) -> Result<(String, u8), CompileError> {
        let tag = match self.constructors.get(name) {
            Some(tag) => *tag,
            None => Builtin::from_name(name)
                .ok_or_else(|| CompileError::UnknownConstructor(name.to_string()))?
                .tag(),
        };
        let arity = self.classes.require_arity(tag)?;
        Ok((class_ident(name), arity))
    }

    /// C expression constructing a literal
    fn render_literal(&self, word: Word) -> Result<String, CompileError> {
        if word.is_fixnum() {
            return Ok(format!("fi_make_number({})", word.as_fixnum()));
        }
        if word.tag() == Builtin::String.tag() {
            let bytes = self.heap.string_bytes(word)?;
            return Ok(format!("fi_make_string(\"{}\")", escape_c_string(bytes)));
        }
        let class = Builtin::from_tag(word.tag()).map_or("a user class", |b| b.name());
        Err(CompileError::Type(format!(
            "Unknown constant type: {} is not a number or string",
            class
        )))
    }
}

/// Identifiers the runtime header declares outside its `fi_` and `CLASS_`
/// prefixes
const HEADER_NAMES: [&str; 4] = ["Nil", "Cons", "Id", "USER_CLASS_MIN"];

/// Whether a top-level definition named `name` would clash with a
/// declaration from the runtime header or with emitted runtime calls
fn is_reserved(name: &str, config: &CompilerConfig) -> bool {
    HEADER_NAMES.contains(&name)
        || name.starts_with("fi_")
        || name.starts_with("CLASS_")
        || name.starts_with(config.primitive_prefix.as_str())
        || name == config.init_symbol
}

/// Reject programs whose top-level names would collide in C
fn check_definitions(program: &Program, config: &CompilerConfig) -> Result<(), CompileError> {
    let mut seen = HashSet::new();
    for definition in &program.definitions {
        let name = match definition {
            Definition::Var { name, .. } => name,
            Definition::Func(func) => &func.name,
            Definition::Cons(cons) => {
                if Builtin::from_name(&cons.name).is_some() {
                    return Err(CompileError::Duplicate(cons.name.clone()));
                }
                &cons.name
            }
        };
        if is_reserved(name, config) || !seen.insert(name.as_str()) {
            return Err(CompileError::Duplicate(name.clone()));
        }
    }
    Ok(())
}
