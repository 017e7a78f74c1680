//! Single-pass, stack-discipline x86-64 assembly code generation.
//!
//! Every expression leaves its value in `%rax`. Two-operand expressions
//! push one operand, evaluate the other, then pop back into a scratch
//! register (`%r10`) to combine — see [`expr`] for the exact evaluation
//! order subtlety around `-` and `/`. [`state::CodeGen`] carries the
//! output buffer, label counters, and the explicit while-break-label
//! stack; [`program::generate`] is the single public entry point that
//! stitches every section together.

pub mod addressing;
pub mod control_flow;
pub mod entry;
pub mod error;
pub mod expr;
pub mod functions;
pub mod globals;
pub mod program;
pub mod runtime;
pub mod state;
pub mod statements;

pub use error::CodeGenError;
pub use program::generate;
