//! Back-half compiler for VSL: tree simplification, symbol resolution,
//! and x86-64 (System V AMD64) code generation.
//!
//! Lexing and parsing are out of scope; callers hand this crate a
//! [`tree::ParseNode`] (typically deserialized from JSON) and get back
//! an assembly-text [`String`] ready for an external assembler/linker.

pub mod ast;
pub mod codegen;
pub mod config;
pub mod debug;
pub mod error;
pub mod resolver;
pub mod simplify;
pub mod symbols;
pub mod tree;

pub use ast::Program;
pub use config::CompilerConfig;
pub use error::CompileError;
pub use tree::ParseNode;

use tracing::info;

/// Runs the full pipeline: simplify -> lower -> resolve -> codegen.
pub fn compile(input: ParseNode, config: &CompilerConfig) -> Result<String, CompileError> {
    let simplified = simplify::simplify(input)?;
    let program = ast::lower(simplified)?;
    let resolved = resolver::resolve(&program)?;
    let asm = codegen::generate(&program, &resolved, config)?;
    info!(functions = program.functions.len(), "compiled program");
    Ok(asm)
}

/// Runs simplify -> lower -> resolve and returns the resolved program
/// together with its [`ast::Program`], for callers that want the debug
/// tree dump rather than assembly.
pub fn compile_to_resolved(
    input: ParseNode,
) -> Result<(ast::Program, resolver::ResolvedProgram), CompileError> {
    let simplified = simplify::simplify(input)?;
    let program = ast::lower(simplified)?;
    let resolved = resolver::resolve(&program)?;
    Ok((program, resolved))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::tree::{NodeKind, Payload};

    #[test]
    fn compiles_a_minimal_program_end_to_end() {
        let body = ParseNode::with_children(
            NodeKind::Block,
            vec![ParseNode::with_children(
                NodeKind::PrintStatement,
                vec![ParseNode::leaf(NodeKind::NumberData, Payload::Number(7))],
            )],
        );
        let main_fn = ParseNode {
            kind: NodeKind::FunctionDef,
            payload: Some(Payload::Name("main".to_string())),
            children: vec![body],
        };
        let asm = compile(main_fn, &CompilerConfig::default()).unwrap();
        assert!(asm.contains(".globl main"));
    }

    #[test]
    fn reports_no_functions_as_an_error() {
        let empty = ParseNode::with_children(NodeKind::GlobalList, vec![]);
        let err = compile(empty, &CompilerConfig::default()).unwrap_err();
        assert!(matches!(err, CompileError::Resolve(_)));
    }

    fn ident(name: &str) -> ParseNode {
        ParseNode::leaf(NodeKind::IdentifierData, Payload::Name(name.to_string()))
    }
    fn num(n: i64) -> ParseNode {
        ParseNode::leaf(NodeKind::NumberData, Payload::Number(n))
    }

    #[test]
    fn compiles_a_for_loop_program_end_to_end() {
        // def main() begin for i := 0 to 3 do print i end
        let for_stmt = ParseNode::with_children(
            NodeKind::ForStatement,
            vec![
                ident("i"),
                num(0),
                num(3),
                ParseNode::with_children(NodeKind::PrintStatement, vec![ident("i")]),
            ],
        );
        let body = ParseNode::with_children(NodeKind::Block, vec![for_stmt]);
        let main_fn = ParseNode {
            kind: NodeKind::FunctionDef,
            payload: Some(Payload::Name("main".to_string())),
            children: vec![body],
        };
        let asm = compile(main_fn, &CompilerConfig::default()).unwrap();
        assert!(asm.contains(".globl main"));
        assert!(asm.contains("call safe_printf"));
    }
}
