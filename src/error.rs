//! The crate-public error type the compilation pipeline returns,
//! unifying each stage's local error enum.

use std::fmt;

#[derive(Debug)]
pub enum CompileError {
    Simplify(crate::simplify::SimplifyError),
    Lower(crate::ast::LowerError),
    Resolve(crate::resolver::ResolveError),
    CodeGen(crate::codegen::CodeGenError),
    Io(String),
}

impl fmt::Display for CompileError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CompileError::Simplify(e) => write!(f, "{e}"),
            CompileError::Lower(e) => write!(f, "{e}"),
            CompileError::Resolve(e) => write!(f, "{e}"),
            CompileError::CodeGen(e) => write!(f, "{e}"),
            CompileError::Io(msg) => write!(f, "error: {msg}"),
        }
    }
}

impl std::error::Error for CompileError {}

impl From<crate::simplify::SimplifyError> for CompileError {
    fn from(e: crate::simplify::SimplifyError) -> Self {
        CompileError::Simplify(e)
    }
}
impl From<crate::ast::LowerError> for CompileError {
    fn from(e: crate::ast::LowerError) -> Self {
        CompileError::Lower(e)
    }
}
impl From<crate::resolver::ResolveError> for CompileError {
    fn from(e: crate::resolver::ResolveError) -> Self {
        CompileError::Resolve(e)
    }
}
impl From<crate::codegen::CodeGenError> for CompileError {
    fn from(e: crate::codegen::CodeGenError) -> Self {
        CompileError::CodeGen(e)
    }
}
