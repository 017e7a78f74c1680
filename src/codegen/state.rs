//! The `CodeGen` struct: the output buffer, label counters, and the
//! explicit break-label stack that replaces the original's fragile
//! while-counter-decrement trick (see DESIGN.md).

use crate::resolver::ResolvedProgram;

pub struct CodeGen<'a> {
    pub output: String,
    pub resolved: &'a ResolvedProgram,
    if_counter: u64,
    while_counter: u64,
    /// Active `while<N>` labels, innermost last. `break` targets
    /// `endwhile<N>` for the top of this stack.
    break_labels: Vec<u64>,
    /// The function currently being emitted, used to look up its local
    /// symbol table for variable addressing.
    pub current_function: Option<String>,
}

impl<'a> CodeGen<'a> {
    pub fn new(resolved: &'a ResolvedProgram) -> Self {
        CodeGen {
            output: String::new(),
            resolved,
            if_counter: 0,
            while_counter: 0,
            break_labels: Vec::new(),
            current_function: None,
        }
    }

    pub fn fresh_if(&mut self) -> u64 {
        let n = self.if_counter;
        self.if_counter += 1;
        n
    }

    pub fn enter_while(&mut self) -> u64 {
        let n = self.while_counter;
        self.while_counter += 1;
        self.break_labels.push(n);
        n
    }

    pub fn leave_while(&mut self) {
        self.break_labels.pop();
    }

    pub fn innermost_while(&self) -> Result<u64, String> {
        self.break_labels
            .last()
            .copied()
            .ok_or_else(|| "break used outside of a while loop".to_string())
    }

    /// Dot-prefixes a user function name so it cannot collide with a
    /// C-visible symbol (`printf`, `exit`, ...).
    pub fn mangle_name(name: &str) -> String {
        format!(".{name}")
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ast::{Block, FunctionDef, Program, Statement, Expr};
    use crate::resolver::resolve;

    fn resolved_fixture() -> ResolvedProgram {
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
    fn break_targets_innermost_while() {
        let resolved = resolved_fixture();
        let mut cg = CodeGen::new(&resolved);
        let outer = cg.enter_while();
        let inner = cg.enter_while();
        assert_eq!(cg.innermost_while().unwrap(), inner);
        cg.leave_while();
        assert_eq!(cg.innermost_while().unwrap(), outer);
        cg.leave_while();
        assert!(cg.innermost_while().is_err());
    }

    #[test]
    fn mangles_with_leading_dot() {
        assert_eq!(CodeGen::mangle_name("foo"), ".foo");
    }
}
