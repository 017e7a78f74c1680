//! Function prologue/epilogue and the call protocol.

use crate::ast::{Expr, FunctionDef};
use crate::codegen::addressing::REGISTER_PARAMS;
use crate::codegen::error::CodeGenError;
use crate::codegen::expr::emit_expr;
use crate::codegen::state::CodeGen;
use crate::codegen::statements::emit_block;
use crate::symbols::SymbolKind;
use std::fmt::Write;

pub fn emit_function(cg: &mut CodeGen, f: &FunctionDef) -> Result<(), CodeGenError> {
    cg.current_function = Some(f.name.clone());
    let label = CodeGen::mangle_name(&f.name);
    writeln!(cg.output, "{label}:")?;
    writeln!(cg.output, "\tpushq %rbp")?;
    writeln!(cg.output, "\tmovq %rsp, %rbp")?;

    let pushed_params = f.params.len().min(6);
    for reg in &REGISTER_PARAMS[..pushed_params] {
        writeln!(cg.output, "\tpushq {reg}")?;
    }

    let info = cg
        .resolved
        .functions
        .get(&f.name)
        .ok_or_else(|| format!("no resolved metadata for function '{}'", f.name))?;
    let local_count = info.locals.count_kind(SymbolKind::LocalVar);
    for _ in 0..local_count {
        writeln!(cg.output, "\tpushq $0")?;
    }

    emit_block(cg, &f.body)?;

    // Unconditional fallback exit, emitted even if every control path
    // inside the body already returned explicitly.
    writeln!(cg.output, "\tmovq $0, %rax")?;
    emit_epilogue(cg)?;
    cg.current_function = None;
    Ok(())
}

pub fn emit_epilogue(cg: &mut CodeGen) -> Result<(), CodeGenError> {
    writeln!(cg.output, "\tmovq %rbp, %rsp")?;
    writeln!(cg.output, "\tpopq %rbp")?;
    writeln!(cg.output, "\tret")?;
    Ok(())
}

/// Evaluates arguments right-to-left, pushing each; pops the first up
/// to six back into the ABI parameter registers (so argument 0 lands in
/// `%rdi`); discards any remaining stack arguments after the call.
pub fn emit_call(cg: &mut CodeGen, name: &str, args: &[Expr]) -> Result<(), CodeGenError> {
    for arg in args.iter().rev() {
        emit_expr(cg, arg)?;
        writeln!(cg.output, "\tpushq %rax")?;
    }
    let in_registers = args.len().min(6);
    for reg in &REGISTER_PARAMS[..in_registers] {
        writeln!(cg.output, "\tpopq {reg}")?;
    }
    writeln!(cg.output, "\tcall {}", CodeGen::mangle_name(name))?;
    if args.len() > 6 {
        let extra = (args.len() - 6) * 8;
        writeln!(cg.output, "\taddq ${extra}, %rsp")?;
    }
    Ok(())
}
