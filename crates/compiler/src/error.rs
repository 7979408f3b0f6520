//! Compiler error type.

use fi_core::RuntimeError;

/// Every way compilation can fail.
///
/// All of these are fatal: the binaries print the message and exit 1.
#[derive(Debug)]
pub enum CompileError {
    /// Malformed or oversized token, unterminated string, stray character
    Lex { line: usize, message: String },
    /// Input is well-tokenized but not a valid fi/hi form
    Parse { line: usize, message: String },
    /// A count that must equal a declared arity does not
    Arity {
        context: String,
        expected: usize,
        found: usize,
    },
    Type(String),
    UnknownLabel { function: String, label: String },
    DuplicateLabel { function: String, label: String },
    UnknownConstructor(String),
    Unbound { function: String, name: String },
    /// Two top-level definitions (or a constructor and a built-in class)
    /// share a name
    Duplicate(String),
    /// Invalid configuration value or file
    Config(String),
    /// Host heap failure while reading input
    Runtime(RuntimeError),
    Format(std::fmt::Error),
    Io(std::io::Error),
}

impl CompileError {
    pub(crate) fn lex(line: usize, message: impl Into<String>) -> Self {
        CompileError::Lex {
            line,
            message: message.into(),
        }
    }

    pub(crate) fn parse(line: usize, message: impl Into<String>) -> Self {
        CompileError::Parse {
            line,
            message: message.into(),
        }
    }
}

impl std::fmt::Display for CompileError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            CompileError::Lex { line, message } => write!(f, "Line {}: {}", line, message),
            CompileError::Parse { line, message } => {
                write!(f, "Parse error at line {}: {}", line, message)
            }
            CompileError::Arity {
                context,
                expected,
                found,
            } => write!(
                f,
                "Arity error: {} expects {} argument(s), got {}",
                context, expected, found
            ),
            CompileError::Type(message) => write!(f, "Type error: {}", message),
            CompileError::UnknownLabel { function, label } => {
                write!(f, "Unknown label '{}' in function '{}'", label, function)
            }
            CompileError::DuplicateLabel { function, label } => {
                write!(f, "Duplicate label '{}' in function '{}'", label, function)
            }
            CompileError::UnknownConstructor(name) => write!(f, "Unknown constructor '{}'", name),
            CompileError::Unbound { function, name } => {
                write!(f, "Unbound name '{}' in function '{}'", name, function)
            }
            CompileError::Duplicate(name) => write!(f, "Duplicate definition of '{}'", name),
            CompileError::Config(message) => write!(f, "Invalid configuration: {}", message),
            CompileError::Runtime(e) => write!(f, "{}", e),
            CompileError::Format(e) => write!(f, "Code generation error: {}", e),
            CompileError::Io(e) => write!(f, "I/O error: {}", e),
        }
    }
}

impl std::error::Error for CompileError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            CompileError::Runtime(e) => Some(e),
            CompileError::Format(e) => Some(e),
            CompileError::Io(e) => Some(e),
            _ => None,
        }
    }
}

impl From<RuntimeError> for CompileError {
    fn from(e: RuntimeError) -> Self {
        CompileError::Runtime(e)
    }
}

impl From<std::fmt::Error> for CompileError {
    fn from(e: std::fmt::Error) -> Self {
        CompileError::Format(e)
    }
}

impl From<std::io::Error> for CompileError {
    fn from(e: std::io::Error) -> Self {
        CompileError::Io(e)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_messages() {
        assert_eq!(
            CompileError::lex(3, "Bad token.").to_string(),
            "Line 3: Bad token."
        );
        assert_eq!(
            CompileError::Arity {
                context: "goto B2 in f".to_string(),
                expected: 2,
                found: 1
            }
            .to_string(),
            "Arity error: goto B2 in f expects 2 argument(s), got 1"
        );
        let e: CompileError = RuntimeError::OutOfMemory {
            requested: 16,
            available: 8,
        }
        .into();
        assert!(e.to_string().starts_with("Out of memory"));
    }
}
