//! The eight Locks error kinds shared by every phase of the pipeline.
//!
//! Lexing, parsing and semantic analysis accumulate these into a [`Handler`]
//! and keep going; the interpreter, compiler, assembler and VM abort on the
//! first one.

use thiserror::Error;

/// A single Locks runtime/compile-time error.
///
/// `line`/`column` are `None` when the original implementation never
/// attaches a position to that kind (see the `Display` impl): `NameErr`
/// only ever carries a line, and `TypeErr`/`ValueErr`/`ZeroDivErr`/
/// `IndexErr`/`InvalidBytecodeError` never carry a position at all.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum LocksError {
    #[error("IllegalCharError")]
    IllegalChar { message: String, line: u32, column: u32 },

    #[error("SyntaxErr")]
    Syntax { message: String, line: u32, column: u32 },

    #[error("NameErr")]
    Name { message: String, line: u32 },

    #[error("TypeErr")]
    Type { message: String },

    #[error("ValueErr")]
    Value { message: String },

    #[error("ZeroDivErr")]
    ZeroDiv,

    #[error("IndexErr")]
    Index,

    #[error("InvalidBytecodeError")]
    InvalidBytecode { message: String },
}

impl LocksError {
    pub fn illegal_char(message: impl Into<String>, line: u32, column: u32) -> Self {
        Self::IllegalChar { message: message.into(), line, column }
    }

    pub fn syntax(message: impl Into<String>, line: u32, column: u32) -> Self {
        Self::Syntax { message: message.into(), line, column }
    }

    pub fn name(message: impl Into<String>, line: u32) -> Self {
        Self::Name { message: message.into(), line }
    }

    pub fn type_err(message: impl Into<String>) -> Self {
        Self::Type { message: message.into() }
    }

    pub fn value(message: impl Into<String>) -> Self {
        Self::Value { message: message.into() }
    }

    pub fn invalid_bytecode(message: impl Into<String>) -> Self {
        Self::InvalidBytecode { message: message.into() }
    }

    /// Human-readable rendering matching the original's per-kind formatting
    /// rules: a kind name, the message, and whatever position data (if any)
    /// that kind carries.
    pub fn render(&self) -> String {
        match self {
            Self::IllegalChar { message, line, column } => {
                format!("IllegalCharError(line {line}): {message} at character {column}")
            }
            Self::Syntax { message, line, column } => {
                format!("SyntaxErr(line {line}): {message} at character {column}")
            }
            Self::Name { message, line } => format!("NameErr(line {line}): {message}"),
            Self::Type { message } => format!("TypeErr: {message}"),
            Self::Value { message } => format!("ValueErr: {message}"),
            Self::ZeroDiv => "ZeroDivErr: Division or modulo by zero".to_string(),
            Self::Index => "IndexErr: Array index out of range".to_string(),
            Self::InvalidBytecode { message } => format!("InvalidBytecodeError: {message}"),
        }
    }
}

pub type LocksResult<T> = std::result::Result<T, LocksError>;

/// Error type for symbol interning operations.
#[derive(Debug, Error)]
pub enum SymbolError {
    #[error("symbol not found: index {index}")]
    NotFound { index: u32 },
}

/// Error type for source map operations.
#[derive(Debug, Error)]
pub enum SourceMapError {
    #[error("file not found: {0}")]
    FileNotFound(String),

    #[error("byte offset {offset} out of bounds for file of {len} bytes")]
    OffsetOutOfBounds { offset: usize, len: usize },
}

pub type SourceMapResult<T> = std::result::Result<T, SourceMapError>;
