//! The fixed table of external C runtime symbols every emitted program
//! depends on, data-driven the way the teacher's own runtime
//! declaration table is, rather than scattered `.extern` strings.

pub struct RuntimeDecl {
    pub symbol: &'static str,
}

pub const RUNTIME_DECLARATIONS: &[RuntimeDecl] = &[
    RuntimeDecl { symbol: "printf" },
    RuntimeDecl { symbol: "putchar" },
    RuntimeDecl { symbol: "strtol" },
    RuntimeDecl { symbol: "exit" },
    RuntimeDecl { symbol: "puts" },
];

use std::fmt::Write;

pub fn emit_externs(out: &mut String) -> std::fmt::Result {
    for decl in RUNTIME_DECLARATIONS {
        writeln!(out, "\t.extern {}", decl.symbol)?;
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn declares_every_required_runtime_symbol() {
        let mut out = String::new();
        emit_externs(&mut out).unwrap();
        for name in ["printf", "putchar", "strtol", "exit", "puts"] {
            assert!(out.contains(name), "missing extern for {name}");
        }
    }
}
