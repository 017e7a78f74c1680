//! `if`/`while`/`break` emission.

use crate::ast::Statement;
use crate::codegen::error::CodeGenError;
use crate::codegen::expr::{emit_relation, inverse_jump};
use crate::codegen::state::CodeGen;
use crate::codegen::statements::emit_block;
use std::fmt::Write;

pub fn emit(cg: &mut CodeGen, stmt: &Statement) -> Result<(), CodeGenError> {
    match stmt {
        Statement::If { cond, then_branch, else_branch } => emit_if(cg, cond, then_branch, else_branch.as_ref()),
        Statement::While { cond, body } => emit_while(cg, cond, body),
        Statement::Break => emit_break(cg),
        _ => unreachable!("control_flow::emit called with a non-control-flow statement"),
    }
}

fn emit_if(
    cg: &mut CodeGen,
    cond: &crate::ast::Relation,
    then_branch: &crate::ast::Block,
    else_branch: Option<&crate::ast::Block>,
) -> Result<(), CodeGenError> {
    let n = cg.fresh_if();
    emit_relation(cg, cond)?;
    writeln!(cg.output, "\t{} else{n}", inverse_jump(cond.op))?;
    emit_block(cg, then_branch)?;
    writeln!(cg.output, "\tjmp endif{n}")?;
    writeln!(cg.output, "else{n}:")?;
    if let Some(b) = else_branch {
        emit_block(cg, b)?;
    }
    writeln!(cg.output, "endif{n}:")?;
    Ok(())
}

fn emit_while(cg: &mut CodeGen, cond: &crate::ast::Relation, body: &crate::ast::Block) -> Result<(), CodeGenError> {
    let n = cg.enter_while();
    writeln!(cg.output, "while{n}:")?;
    emit_relation(cg, cond)?;
    writeln!(cg.output, "\t{} endwhile{n}", inverse_jump(cond.op))?;
    emit_block(cg, body)?;
    writeln!(cg.output, "\tjmp while{n}")?;
    writeln!(cg.output, "endwhile{n}:")?;
    cg.leave_while();
    Ok(())
}

fn emit_break(cg: &mut CodeGen) -> Result<(), CodeGenError> {
    let n = cg.innermost_while()?;
    writeln!(cg.output, "\tjmp endwhile{n}")?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ast::{Block, Expr, FunctionDef, Program, RelOp, Relation, Statement};
    use crate::resolver::resolve;

    fn resolved_fixture() -> crate::resolver::ResolvedProgram {
        let program = Program {
            globals: vec![],
            functions: vec![FunctionDef {
                name: "main".to_string(),
                params: vec![],
                body: Block { decls: vec![], statements: vec![Statement::Return(Expr::Number(0))] },
            }],
        };
        resolve(&program).unwrap()
    }

    #[test]
    fn if_emits_else_label_even_without_an_else_branch() {
        let resolved = resolved_fixture();
        let mut cg = CodeGen::new(&resolved);
        let cond = Relation { op: RelOp::Gt, lhs: Expr::Number(1), rhs: Expr::Number(0) };
        let then_branch = Block { decls: vec![], statements: vec![] };
        emit_if(&mut cg, &cond, &then_branch, None).unwrap();
        assert!(cg.output.contains("else0:"));
        assert!(cg.output.contains("endif0:"));
        assert!(cg.output.contains("jle else0"));
    }

    #[test]
    fn break_in_nested_if_targets_enclosing_while() {
        let resolved = resolved_fixture();
        let mut cg = CodeGen::new(&resolved);
        let cond = Relation { op: RelOp::Lt, lhs: Expr::Number(0), rhs: Expr::Number(3) };
        let body = Block {
            decls: vec![],
            statements: vec![Statement::If {
                cond: Relation { op: RelOp::Eq, lhs: Expr::Number(0), rhs: Expr::Number(0) },
                then_branch: Block { decls: vec![], statements: vec![Statement::Break] },
                else_branch: None,
            }],
        };
        emit_while(&mut cg, &cond, &body).unwrap();
        assert!(cg.output.contains("jmp endwhile0"));
    }
}
