//! Expression lowering and relation codegen.
//!
//! Expression evaluation is a single-accumulator stack discipline:
//! every expression leaves its value in `%rax`. A two-operand
//! expression evaluates one operand, pushes it, evaluates the other
//! (which may freely clobber registers), then pops the first back into
//! a scratch register to combine.

use crate::ast::{Expr, RelOp, Relation};
use crate::codegen::addressing::{self, Location};
use crate::codegen::error::CodeGenError;
use crate::codegen::state::CodeGen;
use std::fmt::Write;

pub fn emit_expr(cg: &mut CodeGen, expr: &Expr) -> Result<(), CodeGenError> {
    match expr {
        Expr::Number(n) => {
            writeln!(cg.output, "\tmovq ${n}, %rax")?;
        }
        Expr::Ident { id, .. } => {
            let loc = addressing::locate(cg, *id)?;
            writeln!(cg.output, "\tmovq {}, %rax", loc.operand())?;
        }
        Expr::Index { id, index, .. } => {
            emit_element_address(cg, *id, index)?;
            writeln!(cg.output, "\tmovq (%r10), %rax")?;
        }
        Expr::Neg(inner) => {
            emit_expr(cg, inner)?;
            writeln!(cg.output, "\tnegq %rax")?;
        }
        Expr::Binary { op, lhs, rhs } => emit_binary(cg, *op, lhs, rhs)?,
        Expr::Call { name, args } => crate::codegen::functions::emit_call(cg, name, args)?,
    }
    Ok(())
}

fn emit_binary(
    cg: &mut CodeGen,
    op: crate::ast::BinOp,
    lhs: &Expr,
    rhs: &Expr,
) -> Result<(), CodeGenError> {
    use crate::ast::BinOp::*;
    match op {
        Add | Mul => {
            emit_expr(cg, lhs)?;
            writeln!(cg.output, "\tpushq %rax")?;
            emit_expr(cg, rhs)?;
            writeln!(cg.output, "\tpopq %r10")?;
            match op {
                Add => writeln!(cg.output, "\taddq %r10, %rax")?,
                Mul => writeln!(cg.output, "\timulq %r10, %rax")?,
                _ => unreachable!(),
            }
        }
        // `-` and `/`: the source evaluates the *right* operand first,
        // then the left, so the accumulator ends up holding the left
        // operand for the subtraction/division that follows.
        Sub | Div => {
            emit_expr(cg, rhs)?;
            writeln!(cg.output, "\tpushq %rax")?;
            emit_expr(cg, lhs)?;
            writeln!(cg.output, "\tpopq %r10")?;
            match op {
                Sub => writeln!(cg.output, "\tsubq %r10, %rax")?,
                Div => {
                    writeln!(cg.output, "\tcqto")?;
                    writeln!(cg.output, "\tidivq %r10")?;
                }
                _ => unreachable!(),
            }
        }
    }
    Ok(())
}

/// Loads the element address of `arr[index]` into `%r10`, leaving
/// `%rax` holding whatever `index` last computed (callers that need the
/// index value preserved should not rely on it; this mirrors the
/// original, which only guarantees the address survives in `%r10`).
pub fn emit_element_address(cg: &mut CodeGen, id: crate::ast::NodeId, index: &Expr) -> Result<(), CodeGenError> {
    emit_expr(cg, index)?;
    let loc = addressing::locate(cg, id)?;
    match loc {
        Location::Global(name) => {
            writeln!(cg.output, "\tleaq {name}(%rip), %r10")?;
        }
        Location::FrameRelative(offset) => {
            writeln!(cg.output, "\tleaq {offset}(%rbp), %r10")?;
        }
    }
    writeln!(cg.output, "\tleaq (%r10,%rax,8), %r10")?;
    Ok(())
}

pub fn emit_relation(cg: &mut CodeGen, rel: &Relation) -> Result<(), CodeGenError> {
    emit_expr(cg, &rel.lhs)?;
    writeln!(cg.output, "\tpushq %rax")?;
    emit_expr(cg, &rel.rhs)?;
    writeln!(cg.output, "\tpopq %r10")?;
    writeln!(cg.output, "\tcmpq %rax, %r10")?;
    Ok(())
}

/// The jump mnemonic that realizes the *inverse* of `op`, i.e. the jump
/// taken to skip a then-branch or exit a while loop when the relation is
/// false. Evaluation order in [`emit_relation`] leaves `cmpq %rax,
/// %r10` meaning "compare rhs against lhs", so the inverse mnemonics
/// below are phrased against that operand order.
pub fn inverse_jump(op: RelOp) -> &'static str {
    match op {
        RelOp::Eq => "jne",
        RelOp::Ne => "je",
        RelOp::Lt => "jge",
        RelOp::Gt => "jle",
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ast::{BinOp, Expr};
    use crate::ast::{Block, FunctionDef, Program, Statement};
    use crate::resolver::resolve;

    fn cg_fixture() -> crate::resolver::ResolvedProgram {
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
    fn subtraction_evaluates_right_before_left() {
        let resolved = cg_fixture();
        let mut cg = CodeGen::new(&resolved);
        let expr = Expr::Binary {
            op: BinOp::Sub,
            lhs: Box::new(Expr::Number(10)),
            rhs: Box::new(Expr::Number(3)),
        };
        emit_expr(&mut cg, &expr).unwrap();
        let rhs_pos = cg.output.find("$3").unwrap();
        let lhs_pos = cg.output.find("$10").unwrap();
        assert!(rhs_pos < lhs_pos, "expected rhs (3) evaluated before lhs (10)");
        assert!(cg.output.contains("subq %r10, %rax"));
    }

    #[test]
    fn division_emits_sign_extend_before_idiv() {
        let resolved = cg_fixture();
        let mut cg = CodeGen::new(&resolved);
        let expr = Expr::Binary {
            op: BinOp::Div,
            lhs: Box::new(Expr::Number(10)),
            rhs: Box::new(Expr::Number(3)),
        };
        emit_expr(&mut cg, &expr).unwrap();
        let cqto = cg.output.find("cqto").unwrap();
        let idiv = cg.output.find("idivq").unwrap();
        assert!(cqto < idiv);
    }

    #[test]
    fn inverse_jump_table_matches_spec() {
        assert_eq!(inverse_jump(RelOp::Eq), "jne");
        assert_eq!(inverse_jump(RelOp::Ne), "je");
        assert_eq!(inverse_jump(RelOp::Lt), "jge");
        assert_eq!(inverse_jump(RelOp::Gt), "jle");
    }
}
