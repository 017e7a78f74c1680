//! The `main` entry wrapper (argv parsing via `strtol`) and the
//! 16-byte-stack-alignment trampoline that variadic `printf` calls need.

use crate::codegen::addressing::REGISTER_PARAMS;
use crate::codegen::error::CodeGenError;
use crate::codegen::globals::ERROUT;
use crate::codegen::state::CodeGen;
use std::fmt::Write;

/// Emits `main`: validate `argc - 1` against the entry function's
/// declared parameter count, parse each argument with `strtol(base=10)`,
/// call the entry function, and `exit` with its return value.
pub fn emit_main(cg: &mut CodeGen, entry_name: &str, param_count: usize) -> Result<(), CodeGenError> {
    writeln!(cg.output, "\t.globl main")?;
    writeln!(cg.output, "main:")?;
    writeln!(cg.output, "\tpushq %rbp")?;
    writeln!(cg.output, "\tmovq %rsp, %rbp")?;
    writeln!(cg.output, "\tpushq %rbx")?;
    writeln!(cg.output, "\tpushq %r12")?;

    // %rdi = argc, %rsi = argv, both System V ABI parameters to main.
    writeln!(cg.output, "\tdecq %rdi")?;
    writeln!(cg.output, "\tcmpq ${param_count}, %rdi")?;
    writeln!(cg.output, "\tjne .main_abort")?;

    writeln!(cg.output, "\tmovq %rdi, %rbx")?;
    writeln!(cg.output, "\ttestq %rbx, %rbx")?;
    writeln!(cg.output, "\tjz .main_call")?;

    // Advance argv to the last argument, then walk backward pushing
    // strtol(argv[i], NULL, 10) so arguments end up on the stack in
    // call order (argument 0 ends up deepest, popped first).
    writeln!(cg.output, "\tleaq 8(%rsi,%rbx,8), %r12")?;
    writeln!(cg.output, ".main_parse_loop:")?;
    writeln!(cg.output, "\tsubq $8, %r12")?;
    writeln!(cg.output, "\tmovq (%r12), %rdi")?;
    writeln!(cg.output, "\txorq %rsi, %rsi")?;
    writeln!(cg.output, "\tmovq $10, %rdx")?;
    writeln!(cg.output, "\tcall strtol")?;
    writeln!(cg.output, "\tpushq %rax")?;
    writeln!(cg.output, "\tdecq %rbx")?;
    writeln!(cg.output, "\tjnz .main_parse_loop")?;

    let in_registers = param_count.min(6);
    for reg in &REGISTER_PARAMS[..in_registers] {
        writeln!(cg.output, "\tpopq {reg}")?;
    }

    writeln!(cg.output, ".main_call:")?;
    writeln!(cg.output, "\tcall {}", CodeGen::mangle_name(entry_name))?;
    writeln!(cg.output, "\tmovq %rax, %rdi")?;
    writeln!(cg.output, "\tcall exit")?;

    writeln!(cg.output, ".main_abort:")?;
    writeln!(cg.output, "\tleaq {ERROUT}(%rip), %rdi")?;
    writeln!(cg.output, "\tcall puts")?;
    writeln!(cg.output, "\tmovq $1, %rdi")?;
    writeln!(cg.output, "\tcall exit")?;
    Ok(())
}

/// A trampoline that 16-byte-aligns the stack before a variadic
/// `printf` call, since the stack-discipline code generator otherwise
/// makes no alignment guarantee at arbitrary call sites.
pub fn emit_safe_printf(cg: &mut CodeGen) -> Result<(), CodeGenError> {
    writeln!(cg.output, "safe_printf:")?;
    writeln!(cg.output, "\tpushq %rbp")?;
    writeln!(cg.output, "\tmovq %rsp, %rbp")?;
    writeln!(cg.output, "\tandq $-16, %rsp")?;
    writeln!(cg.output, "\txorq %rax, %rax")?;
    writeln!(cg.output, "\tcall printf")?;
    writeln!(cg.output, "\tmovq %rbp, %rsp")?;
    writeln!(cg.output, "\tpopq %rbp")?;
    writeln!(cg.output, "\tret")?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ast::{Block, Expr, FunctionDef, Program, Statement};
    use crate::resolver::resolve;

    #[test]
    fn main_wrapper_aborts_on_argument_count_mismatch() {
        let program = Program {
            globals: vec![],
            functions: vec![FunctionDef {
                name: "main".to_string(),
                params: vec!["n".to_string()],
                body: Block { decls: vec![], statements: vec![Statement::Return(Expr::Number(0))] },
            }],
        };
        let resolved = resolve(&program).unwrap();
        let mut cg = CodeGen::new(&resolved);
        emit_main(&mut cg, "main", 1).unwrap();
        assert!(cg.output.contains("cmpq $1, %rdi"));
        assert!(cg.output.contains(".main_abort:"));
        assert!(cg.output.contains("errout"));
    }

    #[test]
    fn safe_printf_masks_stack_to_16_byte_alignment() {
        let program = Program {
            globals: vec![],
            functions: vec![FunctionDef {
                name: "main".to_string(),
                params: vec![],
                body: Block { decls: vec![], statements: vec![Statement::Return(Expr::Number(0))] },
            }],
        };
        let resolved = resolve(&program).unwrap();
        let mut cg = CodeGen::new(&resolved);
        emit_safe_printf(&mut cg).unwrap();
        assert!(cg.output.contains("andq $-16, %rsp"));
    }
}
