//! Variable and array-element address computation.
//!
//! Globals are addressed RIP-relative. Parameters and locals are
//! addressed relative to the frame pointer, per the exact offset
//! formulas the original toolchain used (preserved so the stack layout
//! this crate's prologue builds matches what these formulas assume).

use crate::ast::NodeId;
use crate::codegen::error::CodeGenError;
use crate::codegen::state::CodeGen;
use crate::symbols::SymbolKind;

/// The first six integer arguments travel in registers under the
/// System V AMD64 ABI; anything past that is passed on the stack.
pub const REGISTER_PARAMS: [&str; 6] = ["%rdi", "%rsi", "%rdx", "%rcx", "%r8", "%r9"];

#[derive(Debug, Clone, PartialEq)]
pub enum Location {
    /// RIP-relative access to a global symbol.
    Global(String),
    /// An offset from `%rbp`.
    FrameRelative(i64),
}

impl Location {
    pub fn operand(&self) -> String {
        match self {
            Location::Global(name) => format!("{name}(%rip)"),
            Location::FrameRelative(offset) => format!("{offset}(%rbp)"),
        }
    }
}

pub fn locate(cg: &CodeGen, id: NodeId) -> Result<Location, CodeGenError> {
    let kind = cg.resolved.symbol_kind(id);
    let seq = cg.resolved.symbol_seq(id);
    match kind {
        SymbolKind::GlobalVar | SymbolKind::GlobalArray => {
            let symbol = cg.resolved.globals.get(seq);
            Ok(Location::Global(symbol.name.clone()))
        }
        SymbolKind::Parameter => Ok(Location::FrameRelative(parameter_offset(seq))),
        SymbolKind::LocalVar => {
            let func = cg
                .current_function
                .as_deref()
                .ok_or_else(|| "local variable referenced outside a function".to_string())?;
            let param_count = cg.resolved.functions[func].param_count;
            Ok(Location::FrameRelative(local_offset(seq, param_count)))
        }
        SymbolKind::Function => Err("a function cannot be used as a variable".to_string().into()),
    }
}

fn parameter_offset(seq: usize) -> i64 {
    if seq < 6 {
        -((seq as i64) + 1) * 8
    } else {
        16 + ((seq as i64) - 6) * 8
    }
}

/// Parameters past the sixth are never pushed onto the stack by the
/// prologue (they already live above the return address, placed there
/// by the caller), so a local's stack slot must not count them.
fn local_offset(seq: usize, param_count: usize) -> i64 {
    let not_pushed = param_count.saturating_sub(6) as i64;
    -((seq as i64) - not_pushed + 1) * 8
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parameter_offsets_match_spec_formula() {
        assert_eq!(parameter_offset(0), -8);
        assert_eq!(parameter_offset(5), -48);
        assert_eq!(parameter_offset(6), 16);
        assert_eq!(parameter_offset(7), 24);
    }

    #[test]
    fn local_offsets_follow_params_with_few_registers() {
        // 2 params (seq 0,1), first local at seq 2.
        assert_eq!(local_offset(2, 2), -24);
    }

    #[test]
    fn local_offsets_correct_for_more_than_six_params() {
        // 7 params (seq 0..6), only 6 pushed; first local at seq 7.
        assert_eq!(local_offset(7, 7), -56);
    }
}
