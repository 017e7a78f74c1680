//! Top-level orchestration: assembles the prelude, every function body,
//! the safe-printf trampoline, and the `main` entry wrapper into one
//! assembly text.

use crate::ast::Program;
use crate::codegen::entry::{emit_main, emit_safe_printf};
use crate::codegen::error::CodeGenError;
use crate::codegen::functions::emit_function;
use crate::codegen::globals::{emit_bss_section, emit_string_section};
use crate::codegen::runtime::emit_externs;
use crate::codegen::state::CodeGen;
use crate::config::CompilerConfig;
use crate::resolver::ResolvedProgram;
use std::fmt::Write;

pub fn generate(
    program: &Program,
    resolved: &ResolvedProgram,
    config: &CompilerConfig,
) -> Result<String, CodeGenError> {
    let entry_name = config
        .entry_override
        .clone()
        .unwrap_or_else(|| resolved.entry_function.clone());
    let entry_param_count = resolved
        .functions
        .get(&entry_name)
        .ok_or_else(|| format!("entry function '{entry_name}' not found"))?
        .param_count;

    let mut cg = CodeGen::new(resolved);
    emit_externs(&mut cg.output)?;
    emit_string_section(&mut cg.output, resolved)?;
    emit_bss_section(&mut cg.output, resolved)?;

    writeln!(cg.output, "\t.text")?;
    for f in &program.functions {
        emit_function(&mut cg, f)?;
    }
    emit_safe_printf(&mut cg)?;
    emit_main(&mut cg, &entry_name, entry_param_count)?;

    Ok(cg.output)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ast::{BinOp, Block, Expr, FunctionDef, PrintItem, Statement};
    use crate::resolver::resolve;
    use crate::simplify::simplify;
    use crate::tree::{NodeKind, ParseNode, Payload};

    #[test]
    fn generates_assembly_for_constant_folded_print() {
        // def main() begin print 1 + 2 * 3 end
        let program = Program {
            globals: vec![],
            functions: vec![FunctionDef {
                name: "main".to_string(),
                params: vec![],
                body: Block {
                    decls: vec![],
                    statements: vec![Statement::Print(vec![PrintItem::Value(Expr::Binary {
                        op: BinOp::Add,
                        lhs: Box::new(Expr::Number(1)),
                        rhs: Box::new(Expr::Binary {
                            op: BinOp::Mul,
                            lhs: Box::new(Expr::Number(2)),
                            rhs: Box::new(Expr::Number(3)),
                        }),
                    })]),
                },
            }],
        };
        let resolved = resolve(&program).unwrap();
        let config = CompilerConfig::default();
        let asm = generate(&program, &resolved, &config).unwrap();
        assert!(asm.contains(".globl main"));
        assert!(asm.contains("call safe_printf"));
        assert!(asm.contains(".extern printf"));
    }

    #[test]
    fn end_to_end_pipeline_folds_constants_through_simplify_and_codegen() {
        let one = ParseNode::leaf(NodeKind::NumberData, Payload::Number(1));
        let two = ParseNode::leaf(NodeKind::NumberData, Payload::Number(2));
        let three = ParseNode::leaf(NodeKind::NumberData, Payload::Number(3));
        let mul = ParseNode {
            kind: NodeKind::Expression,
            payload: Some(Payload::Operator("*".to_string())),
            children: vec![two, three],
        };
        let add = ParseNode {
            kind: NodeKind::Expression,
            payload: Some(Payload::Operator("+".to_string())),
            children: vec![one, mul],
        };
        let print_stmt = ParseNode::with_children(NodeKind::PrintStatement, vec![add]);
        let body = ParseNode::with_children(NodeKind::Block, vec![print_stmt]);
        let main_fn = ParseNode {
            kind: NodeKind::FunctionDef,
            payload: Some(Payload::Name("main".to_string())),
            children: vec![body],
        };

        let simplified = simplify(main_fn).unwrap();
        let program = crate::ast::lower(simplified).unwrap();
        let resolved = resolve(&program).unwrap();
        let asm = generate(&program, &resolved, &CompilerConfig::default()).unwrap();
        assert!(asm.contains("movq $7, %rax"));
    }
}
