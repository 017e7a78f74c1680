//! Statement emission: assignment, print, return, and block dispatch.
//! `if`/`while`/`break` live in [`crate::codegen::control_flow`].

use crate::ast::{Block, LValue, PrintItem, Statement};
use crate::codegen::addressing::{self, Location};
use crate::codegen::error::CodeGenError;
use crate::codegen::expr::{emit_element_address, emit_expr};
use crate::codegen::functions::emit_epilogue;
use crate::codegen::globals::{string_label, INTOUT, STROUT};
use std::fmt::Write;
use crate::codegen::state::CodeGen;

pub fn emit_block(cg: &mut CodeGen, block: &Block) -> Result<(), CodeGenError> {
    for stmt in &block.statements {
        emit_statement(cg, stmt)?;
    }
    Ok(())
}

pub fn emit_statement(cg: &mut CodeGen, stmt: &Statement) -> Result<(), CodeGenError> {
    match stmt {
        Statement::Assign { target, value } => emit_assignment(cg, target, value),
        Statement::Print(items) => emit_print(cg, items),
        Statement::Return(expr) => {
            emit_expr(cg, expr)?;
            emit_epilogue(cg)
        }
        Statement::If { .. } | Statement::While { .. } | Statement::Break => {
            crate::codegen::control_flow::emit(cg, stmt)
        }
        Statement::Block(b) => emit_block(cg, b),
    }
}

fn emit_assignment(cg: &mut CodeGen, target: &LValue, value: &crate::ast::Expr) -> Result<(), CodeGenError> {
    emit_expr(cg, value)?;
    match target {
        LValue::Ident { id, .. } => {
            let loc = addressing::locate(cg, *id)?;
            writeln!(cg.output, "\tmovq %rax, {}", loc.operand())?;
        }
        LValue::Index { id, index, .. } => {
            writeln!(cg.output, "\tpushq %rax")?;
            emit_element_address(cg, *id, index)?;
            writeln!(cg.output, "\tpopq %rax")?;
            writeln!(cg.output, "\tmovq %rax, (%r10)")?;
        }
    }
    Ok(())
}

fn emit_print(cg: &mut CodeGen, items: &[PrintItem]) -> Result<(), CodeGenError> {
    for item in items {
        match item {
            PrintItem::Value(expr) => {
                emit_expr(cg, expr)?;
                writeln!(cg.output, "\tmovq %rax, %rsi")?;
                writeln!(cg.output, "\tleaq {INTOUT}(%rip), %rdi")?;
                writeln!(cg.output, "\tcall safe_printf")?;
            }
            PrintItem::Str { id, .. } => {
                let index = cg.resolved.string_index(*id);
                writeln!(cg.output, "\tleaq {}(%rip), %rsi", string_label(index))?;
                writeln!(cg.output, "\tleaq {STROUT}(%rip), %rdi")?;
                writeln!(cg.output, "\tcall safe_printf")?;
            }
        }
    }
    writeln!(cg.output, "\tmovq $10, %rdi")?;
    writeln!(cg.output, "\tcall putchar")?;
    Ok(())
}
