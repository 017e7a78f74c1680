//! Errors that can occur while emitting assembly text.

use std::fmt;

#[derive(Debug)]
pub enum CodeGenError {
    /// A write into the in-memory output buffer failed. `String`'s
    /// `Write` impl is infallible in practice, but `writeln!` still
    /// returns a `Result` we must propagate rather than `.unwrap()`.
    Format(fmt::Error),
    /// The resolved program referenced a function CodeGen has no
    /// metadata for — indicates a bug in an earlier pass.
    Logic(String),
}

impl fmt::Display for CodeGenError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CodeGenError::Format(e) => write!(f, "error: {e}"),
            CodeGenError::Logic(msg) => write!(f, "error: {msg}"),
        }
    }
}

impl std::error::Error for CodeGenError {}

impl From<fmt::Error> for CodeGenError {
    fn from(e: fmt::Error) -> Self {
        CodeGenError::Format(e)
    }
}

impl From<String> for CodeGenError {
    fn from(msg: String) -> Self {
        CodeGenError::Logic(msg)
    }
}
