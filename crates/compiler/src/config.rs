//! Compiler configuration
//!
//! The `fic` and `hic` binaries always run with [`CompilerConfig::default`].
//! Library users can change the emitted names or register extra primitives,
//! either with the builder methods or from a TOML file:
//!
//! ```toml
//! runtime_header = "my_runtime.h"
//! init_symbol = "my_program_init"
//! extra_primitives = ["print", "add"]
//! ```

use crate::error::CompileError;
use serde::Deserialize;
use std::path::Path;

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct CompilerConfig {
    /// Size in bytes of the host arena that holds the parsed input
    pub arena_capacity: usize,

    /// Longest identifier, number or string the lexer accepts
    pub max_token_len: usize,

    /// Deepest list nesting the reader accepts
    pub max_depth: usize,

    /// Header named by the `#include` at the top of the output
    pub runtime_header: String,

    /// Name of the emitted initialization routine
    pub init_symbol: String,

    /// Prefix applied to primitive names in emitted calls
    pub primitive_prefix: String,

    /// Primitives provided by the target runtime beyond the fixed set
    pub extra_primitives: Vec<String>,
}

impl Default for CompilerConfig {
    fn default() -> Self {
        CompilerConfig {
            arena_capacity: fi_core::DEFAULT_CAPACITY,
            max_token_len: 255,
            max_depth: 256,
            runtime_header: "fi_runtime.h".to_string(),
            init_symbol: "fi_program_init".to_string(),
            primitive_prefix: "fi_prim_".to_string(),
            extra_primitives: Vec::new(),
        }
    }
}

/// Check that `symbol` can be pasted into C as (part of) an identifier
fn validate_symbol(what: &str, symbol: &str) -> Result<(), CompileError> {
    if symbol.is_empty() {
        return Err(CompileError::Config(format!("{} cannot be empty", what)));
    }
    if let Some(c) = symbol
        .chars()
        .find(|c| !c.is_ascii_alphanumeric() && *c != '_')
    {
        return Err(CompileError::Config(format!(
            "Invalid character '{}' in {} '{}'. \
             Only ASCII letters, digits and underscores are allowed.",
            c, what, symbol
        )));
    }
    Ok(())
}

impl CompilerConfig {
    pub fn new() -> Self {
        CompilerConfig::default()
    }

    /// Parse a configuration from TOML; missing keys keep their defaults
    pub fn from_toml(text: &str) -> Result<Self, CompileError> {
        let config: CompilerConfig =
            toml::from_str(text).map_err(|e| CompileError::Config(e.to_string()))?;
        config.validate()?;
        Ok(config)
    }

    pub fn from_file(path: &Path) -> Result<Self, CompileError> {
        let text = std::fs::read_to_string(path)?;
        Self::from_toml(&text)
    }

    pub fn with_arena_capacity(mut self, bytes: usize) -> Self {
        self.arena_capacity = bytes;
        self
    }

    pub fn with_max_token_len(mut self, len: usize) -> Self {
        self.max_token_len = len;
        self
    }

    pub fn with_max_depth(mut self, depth: usize) -> Self {
        self.max_depth = depth;
        self
    }

    pub fn with_runtime_header(mut self, header: impl Into<String>) -> Self {
        self.runtime_header = header.into();
        self
    }

    pub fn with_init_symbol(mut self, symbol: impl Into<String>) -> Self {
        self.init_symbol = symbol.into();
        self
    }

    pub fn with_primitive_prefix(mut self, prefix: impl Into<String>) -> Self {
        self.primitive_prefix = prefix.into();
        self
    }

    /// Register an additional primitive (builder pattern)
    pub fn with_primitive(mut self, name: impl Into<String>) -> Self {
        self.extra_primitives.push(name.into());
        self
    }

    /// Reject values that would produce malformed C
    pub fn validate(&self) -> Result<(), CompileError> {
        if self.arena_capacity == 0 {
            return Err(CompileError::Config(
                "arena_capacity must be positive".to_string(),
            ));
        }
        if self.max_token_len == 0 {
            return Err(CompileError::Config(
                "max_token_len must be positive".to_string(),
            ));
        }
        if self.max_depth == 0 {
            return Err(CompileError::Config(
                "max_depth must be positive".to_string(),
            ));
        }
        if self.runtime_header.is_empty()
            || self
                .runtime_header
                .chars()
                .any(|c| c == '"' || c.is_control())
        {
            return Err(CompileError::Config(format!(
                "runtime_header '{}' is not a valid include path",
                self.runtime_header
            )));
        }
        validate_symbol("init_symbol", &self.init_symbol)?;
        validate_symbol("primitive_prefix", &self.primitive_prefix)?;
        for name in &self.extra_primitives {
            validate_symbol("primitive", name)?;
        }
        Ok(())
    }

    /// Whether `name` is dispatched through the primitive naming convention
    pub fn is_primitive(&self, name: &str) -> bool {
        fi_core::is_primitive(name) || self.extra_primitives.iter().any(|p| p == name)
    }

    /// C symbol for a call to `name`
    pub fn callee_symbol(&self, name: &str) -> String {
        if self.is_primitive(name) {
            format!("{}{}", self.primitive_prefix, name)
        } else {
            name.to_string()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn test_defaults() {
        let config = CompilerConfig::default();
        assert_eq!(config.runtime_header, "fi_runtime.h");
        assert_eq!(config.init_symbol, "fi_program_init");
        assert_eq!(config.max_token_len, 255);
        assert_eq!(config.max_depth, 256);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_primitive_naming() {
        let config = CompilerConfig::new().with_primitive("print");
        assert_eq!(config.callee_symbol("fetch"), "fi_prim_fetch");
        assert_eq!(config.callee_symbol("print"), "fi_prim_print");
        assert_eq!(config.callee_symbol("swap"), "swap");

        let config = config.with_primitive_prefix("rt_");
        assert_eq!(config.callee_symbol("genTmp"), "rt_genTmp");
    }

    #[test]
    fn test_validate_rejects_bad_symbols() {
        let config = CompilerConfig::new().with_primitive("bad-name");
        assert!(matches!(config.validate(), Err(CompileError::Config(_))));

        let config = CompilerConfig::new().with_init_symbol("");
        assert!(config.validate().is_err());

        let config = CompilerConfig::new().with_runtime_header("a\"b.h");
        assert!(config.validate().is_err());

        let config = CompilerConfig::new().with_max_token_len(0);
        assert!(config.validate().is_err());

        let config = CompilerConfig::new().with_max_depth(0);
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_from_toml_partial() {
        let config = CompilerConfig::from_toml(
            r#"
            init_symbol = "start"
            extra_primitives = ["print"]
            "#,
        )
        .unwrap();
        assert_eq!(config.init_symbol, "start");
        assert!(config.is_primitive("print"));
        assert_eq!(config.runtime_header, "fi_runtime.h");
    }

    #[test]
    fn test_from_toml_rejects_unknown_keys_and_bad_values() {
        assert!(CompilerConfig::from_toml("optimize = true").is_err());
        assert!(CompilerConfig::from_toml("primitive_prefix = \"a b\"").is_err());
    }

    #[test]
    fn test_from_file() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "max_token_len = 16").unwrap();
        let config = CompilerConfig::from_file(file.path()).unwrap();
        assert_eq!(config.max_token_len, 16);

        let missing = file.path().with_extension("missing");
        assert!(matches!(
            CompilerConfig::from_file(&missing),
            Err(CompileError::Io(_))
        ));
    }
}
