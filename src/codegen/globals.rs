//! The read-only string-literal section and the zero-initialized BSS
//! section for global variables and arrays.

use crate::resolver::ResolvedProgram;
use crate::symbols::SymbolKind;
use std::fmt::Write;

/// The three fixed format strings every emitted program carries, in
/// this exact order, before any interned literal.
pub const INTOUT: &str = "intout";
pub const STROUT: &str = "strout";
pub const ERROUT: &str = "errout";

pub fn emit_string_section(out: &mut String, resolved: &ResolvedProgram) -> std::fmt::Result {
    writeln!(out, "\t.section .rodata")?;
    writeln!(out, "{INTOUT}:\n\t.string \"%ld \"")?;
    writeln!(out, "{STROUT}:\n\t.string \"%s \"")?;
    writeln!(out, "{ERROUT}:\n\t.string \"Wrong number of arguments\"")?;
    for (i, lexeme) in resolved.strings.iter().enumerate() {
        let text = lexeme.trim_matches('"');
        writeln!(out, "string{i}:\n\t.string \"{text}\"")?;
    }
    Ok(())
}

pub fn emit_bss_section(out: &mut String, resolved: &ResolvedProgram) -> std::fmt::Result {
    writeln!(out, "\t.bss")?;
    writeln!(out, "\t.align 8")?;
    for symbol in resolved.globals.iter() {
        match symbol.kind {
            SymbolKind::GlobalVar => {
                writeln!(out, "{}:\n\t.zero 8", symbol.name)?;
            }
            SymbolKind::GlobalArray => {
                let len = symbol.array_len.unwrap_or(0);
                writeln!(out, "{}:\n\t.zero {}", symbol.name, len * 8)?;
            }
            SymbolKind::Function | SymbolKind::Parameter | SymbolKind::LocalVar => {}
        }
    }
    Ok(())
}

pub fn string_label(index: usize) -> String {
    format!("string{index}")
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ast::{Block, FunctionDef, Global, Program, Statement, Expr};
    use crate::resolver::resolve;

    #[test]
    fn emits_fixed_format_strings_before_literals() {
        let program = Program {
            globals: vec![Global::Var("g".to_string()), Global::Array { name: "a".to_string(), len: 3 }],
            functions: vec![FunctionDef {
                name: "main".to_string(),
                params: vec![],
                body: Block { decls: vec![], statements: vec![Statement::Return(Expr::Number(0))] },
            }],
        };
        let resolved = resolve(&program).unwrap();
        let mut out = String::new();
        emit_string_section(&mut out, &resolved).unwrap();
        let intout_pos = out.find("intout").unwrap();
        let strout_pos = out.find("strout").unwrap();
        let errout_pos = out.find("errout").unwrap();
        assert!(intout_pos < strout_pos && strout_pos < errout_pos);

        let mut bss = String::new();
        emit_bss_section(&mut bss, &resolved).unwrap();
        assert!(bss.contains("g:\n\t.zero 8"));
        assert!(bss.contains("a:\n\t.zero 24"));
    }
}
