//! Symbol resolution: discovers global declarations and function
//! signatures, then binds every identifier occurrence inside function
//! bodies to a [`Symbol`], and interns every string literal.
//!
//! Results are recorded in side tables (`ResolvedProgram`) keyed by
//! [`NodeId`] rather than by mutating the [`Program`] in place, mirroring
//! the teacher's `type_map`/`statement_types` side-table pattern instead
//! of threading `RefCell`s through the tree.

use crate::ast::{
    Block, Expr, FunctionDef, Global, LValue, NodeId, PrintItem, Program, Relation, Statement,
};
use crate::symbols::{StringTable, SymbolKind, SymbolTable};
use std::collections::HashMap;
use tracing::{debug, error};

#[derive(Debug, Clone, PartialEq)]
pub enum ResolveError {
    UndefinedIdentifier(String),
    DuplicateDeclaration(String),
    NotAFunction(String),
    NotCallable(String),
    ArityMismatch { name: String, expected: usize, got: usize },
    NoFunctions,
}

impl std::fmt::Display for ResolveError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ResolveError::UndefinedIdentifier(name) => write!(f, "error: undefined identifier '{name}'"),
            ResolveError::DuplicateDeclaration(name) => write!(f, "error: '{name}' is already declared in this scope"),
            ResolveError::NotAFunction(name) => write!(f, "error: '{name}' is not a function"),
            ResolveError::NotCallable(name) => write!(f, "error: '{name}' cannot be used as a variable"),
            ResolveError::ArityMismatch { name, expected, got } => {
                write!(f, "error: '{name}' expects {expected} argument(s), got {got}")
            }
            ResolveError::NoFunctions => write!(f, "error: program contained no functions"),
        }
    }
}
impl std::error::Error for ResolveError {}

/// Per-function metadata code generation needs: its local symbol table
/// (parameters + locals) and the declared parameter count.
pub struct FunctionInfo {
    pub locals: SymbolTable,
    pub param_count: usize,
}

pub struct ResolvedProgram {
    pub globals: SymbolTable,
    pub strings: StringTable,
    pub functions: HashMap<String, FunctionInfo>,
    /// The textually-first `FunctionDef`, whose parameter count the
    /// entry wrapper validates `argc` against.
    pub entry_function: String,
    ident_symbols: HashMap<NodeId, (FuncScope, usize)>,
    string_indices: HashMap<NodeId, usize>,
}

/// Where a resolved identifier's symbol lives: the global table, or a
/// named function's local table.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
enum FuncScope {
    Global,
    Local(String),
}

impl ResolvedProgram {
    pub fn symbol_kind(&self, id: NodeId) -> SymbolKind {
        let (scope, seq) = self.ident_symbols[&id];
        match scope {
            FuncScope::Global => self.globals.get(seq).kind,
            FuncScope::Local(f) => self.functions[&f].locals.get(seq).kind,
        }
    }

    pub fn symbol_seq(&self, id: NodeId) -> usize {
        self.ident_symbols[&id].1
    }

    pub fn string_index(&self, id: NodeId) -> usize {
        self.string_indices[&id]
    }
}

pub fn resolve(program: &Program) -> Result<ResolvedProgram, ResolveError> {
    let mut globals = SymbolTable::new();
    let mut functions: HashMap<String, FunctionInfo> = HashMap::new();
    let mut strings = StringTable::new();

    // Phase A: global discovery.
    for g in &program.globals {
        match g {
            Global::Var(name) => {
                globals
                    .declare(name, SymbolKind::GlobalVar)
                    .map_err(|_| ResolveError::DuplicateDeclaration(name.clone()))?;
            }
            Global::Array { name, len } => {
                let seq = globals
                    .declare(name, SymbolKind::GlobalArray)
                    .map_err(|_| ResolveError::DuplicateDeclaration(name.clone()))?;
                globals.get_mut(seq).array_len = Some(*len);
            }
        }
    }

    let mut entry_function = None;
    for f in &program.functions {
        let seq = globals
            .declare(&f.name, SymbolKind::Function)
            .map_err(|_| ResolveError::DuplicateDeclaration(f.name.clone()))?;
        globals.get_mut(seq).param_count = Some(f.params.len());
        if entry_function.is_none() {
            entry_function = Some(f.name.clone());
        }

        let mut locals = SymbolTable::new_function_scope(&globals);
        for p in &f.params {
            locals
                .declare(p, SymbolKind::Parameter)
                .map_err(|_| ResolveError::DuplicateDeclaration(p.clone()))?;
        }
        functions.insert(
            f.name.clone(),
            FunctionInfo {
                locals,
                param_count: f.params.len(),
            },
        );
    }
    let entry_function = entry_function.ok_or(ResolveError::NoFunctions)?;
    debug!(entry_function, "selected entry function");

    let mut ident_symbols = HashMap::new();
    let mut string_indices = HashMap::new();

    // Phase B: body binding, one function at a time.
    for f in &program.functions {
        let mut locals = functions
            .remove(&f.name)
            .expect("inserted in phase A")
            .locals;
        bind_block(
            &f.body,
            &f.name,
            &mut locals,
            &mut strings,
            &globals,
            &functions,
            &mut ident_symbols,
            &mut string_indices,
        )?;
        functions.insert(
            f.name.clone(),
            FunctionInfo {
                param_count: f.params.len(),
                locals,
            },
        );
    }

    Ok(ResolvedProgram {
        globals,
        strings,
        functions,
        entry_function,
        ident_symbols,
        string_indices,
    })
}

#[allow(clippy::too_many_arguments)]
fn bind_block(
    block: &Block,
    func_name: &str,
    locals: &mut SymbolTable,
    strings: &mut StringTable,
    globals: &SymbolTable,
    functions: &HashMap<String, FunctionInfo>,
    ident_symbols: &mut HashMap<NodeId, (FuncScope, usize)>,
    string_indices: &mut HashMap<NodeId, usize>,
) -> Result<(), ResolveError> {
    let pushed = !block.decls.is_empty();
    if pushed {
        locals.push_scope();
    }
    for name in &block.decls {
        locals
            .declare(name, SymbolKind::LocalVar)
            .map_err(|_| ResolveError::DuplicateDeclaration(name.clone()))?;
    }
    for stmt in &block.statements {
        bind_statement(
            stmt,
            func_name,
            locals,
            strings,
            globals,
            functions,
            ident_symbols,
            string_indices,
        )?;
    }
    if pushed {
        locals.pop_scope();
    }
    Ok(())
}

#[allow(clippy::too_many_arguments)]
fn bind_statement(
    stmt: &Statement,
    func_name: &str,
    locals: &mut SymbolTable,
    strings: &mut StringTable,
    globals: &SymbolTable,
    functions: &HashMap<String, FunctionInfo>,
    ident_symbols: &mut HashMap<NodeId, (FuncScope, usize)>,
    string_indices: &mut HashMap<NodeId, usize>,
) -> Result<(), ResolveError> {
    match stmt {
        Statement::Assign { target, value } => {
            bind_lvalue(target, func_name, locals, globals, functions, ident_symbols)?;
            bind_expr(value, func_name, locals, globals, functions, ident_symbols)?;
        }
        Statement::Print(items) => {
            for item in items {
                match item {
                    PrintItem::Value(e) => bind_expr(e, func_name, locals, globals, functions, ident_symbols)?,
                    PrintItem::Str { id, lexeme } => {
                        let index = strings.intern(lexeme);
                        string_indices.insert(*id, index);
                    }
                }
            }
        }
        Statement::Return(e) => bind_expr(e, func_name, locals, globals, functions, ident_symbols)?,
        Statement::If { cond, then_branch, else_branch } => {
            bind_relation(cond, func_name, locals, globals, functions, ident_symbols)?;
            bind_block(then_branch, func_name, locals, strings, globals, functions, ident_symbols, string_indices)?;
            if let Some(b) = else_branch {
                bind_block(b, func_name, locals, strings, globals, functions, ident_symbols, string_indices)?;
            }
        }
        Statement::While { cond, body } => {
            bind_relation(cond, func_name, locals, globals, functions, ident_symbols)?;
            bind_block(body, func_name, locals, strings, globals, functions, ident_symbols, string_indices)?;
        }
        Statement::Break => {}
        Statement::Block(b) => {
            bind_block(b, func_name, locals, strings, globals, functions, ident_symbols, string_indices)?;
        }
    }
    Ok(())
}

#[allow(clippy::too_many_arguments)]
fn bind_lvalue(
    target: &LValue,
    func_name: &str,
    locals: &SymbolTable,
    globals: &SymbolTable,
    functions: &HashMap<String, FunctionInfo>,
    ident_symbols: &mut HashMap<NodeId, (FuncScope, usize)>,
) -> Result<(), ResolveError> {
    match target {
        LValue::Ident { id, name } => bind_name(*id, name, func_name, locals, ident_symbols),
        LValue::Index { id, name, index } => {
            bind_name(*id, name, func_name, locals, ident_symbols)?;
            bind_expr(index, func_name, locals, globals, functions, ident_symbols)
        }
    }
}

fn bind_name(
    id: NodeId,
    name: &str,
    func_name: &str,
    locals: &SymbolTable,
    ident_symbols: &mut HashMap<NodeId, (FuncScope, usize)>,
) -> Result<(), ResolveError> {
    let symbol = locals
        .lookup(name)
        .ok_or_else(|| ResolveError::UndefinedIdentifier(name.to_string()))?;
    if symbol.kind == SymbolKind::Function {
        error!(name, "function used as a variable");
        return Err(ResolveError::NotCallable(name.to_string()));
    }
    ident_symbols.insert(id, (scope_of(symbol.kind, func_name), symbol.seq));
    Ok(())
}

fn scope_of(kind: SymbolKind, func_name: &str) -> FuncScope {
    match kind {
        SymbolKind::GlobalVar | SymbolKind::GlobalArray | SymbolKind::Function => FuncScope::Global,
        SymbolKind::Parameter | SymbolKind::LocalVar => FuncScope::Local(func_name.to_string()),
    }
}

fn bind_relation(
    rel: &Relation,
    func_name: &str,
    locals: &SymbolTable,
    globals: &SymbolTable,
    functions: &HashMap<String, FunctionInfo>,
    ident_symbols: &mut HashMap<NodeId, (FuncScope, usize)>,
) -> Result<(), ResolveError> {
    bind_expr(&rel.lhs, func_name, locals, globals, functions, ident_symbols)?;
    bind_expr(&rel.rhs, func_name, locals, globals, functions, ident_symbols)
}

fn bind_expr(
    expr: &Expr,
    func_name: &str,
    locals: &SymbolTable,
    globals: &SymbolTable,
    functions: &HashMap<String, FunctionInfo>,
    ident_symbols: &mut HashMap<NodeId, (FuncScope, usize)>,
) -> Result<(), ResolveError> {
    match expr {
        Expr::Number(_) => Ok(()),
        Expr::Ident { id, name } => bind_name(*id, name, func_name, locals, ident_symbols),
        Expr::Index { id, name, index } => {
            bind_name(*id, name, func_name, locals, ident_symbols)?;
            bind_expr(index, func_name, locals, globals, functions, ident_symbols)
        }
        Expr::Neg(inner) => bind_expr(inner, func_name, locals, globals, functions, ident_symbols),
        Expr::Binary { lhs, rhs, .. } => {
            bind_expr(lhs, func_name, locals, globals, functions, ident_symbols)?;
            bind_expr(rhs, func_name, locals, globals, functions, ident_symbols)
        }
        Expr::Call { name, args } => {
            let info = functions
                .get(name)
                .ok_or_else(|| ResolveError::NotAFunction(name.clone()))?;
            if globals.lookup(name).map(|s| s.kind) != Some(SymbolKind::Function) {
                return Err(ResolveError::NotAFunction(name.clone()));
            }
            if info.param_count != args.len() {
                return Err(ResolveError::ArityMismatch {
                    name: name.clone(),
                    expected: info.param_count,
                    got: args.len(),
                });
            }
            for a in args {
                bind_expr(a, func_name, locals, globals, functions, ident_symbols)?;
            }
            Ok(())
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ast::{Block, FunctionDef, Program};

    fn simple_program() -> Program {
        Program {
            globals: vec![Global::Var("g".to_string())],
            functions: vec![FunctionDef {
                name: "main".to_string(),
                params: vec!["n".to_string()],
                body: Block {
                    decls: vec!["x".to_string()],
                    statements: vec![Statement::Assign {
                        target: LValue::Ident { id: 0, name: "x".to_string() },
                        value: Expr::Ident { id: 1, name: "n".to_string() },
                    }],
                },
            }],
        }
    }

    #[test]
    fn resolves_parameter_and_local() {
        let program = simple_program();
        let resolved = resolve(&program).unwrap();
        assert_eq!(resolved.symbol_kind(0), SymbolKind::LocalVar);
        assert_eq!(resolved.symbol_kind(1), SymbolKind::Parameter);
        assert_eq!(resolved.symbol_seq(1), 0);
    }

    #[test]
    fn array_assignment_resolves_variable_index() {
        // def main(n) begin array a[4]; a[n] := 1 end
        let program = Program {
            globals: vec![Global::Array { name: "a".to_string(), len: 4 }],
            functions: vec![FunctionDef {
                name: "main".to_string(),
                params: vec!["n".to_string()],
                body: Block {
                    decls: vec![],
                    statements: vec![Statement::Assign {
                        target: LValue::Index {
                            id: 0,
                            name: "a".to_string(),
                            index: Box::new(Expr::Ident { id: 1, name: "n".to_string() }),
                        },
                        value: Expr::Number(1),
                    }],
                },
            }],
        };
        let resolved = resolve(&program).unwrap();
        assert_eq!(resolved.symbol_kind(0), SymbolKind::GlobalArray);
        assert_eq!(resolved.symbol_kind(1), SymbolKind::Parameter);
    }

    #[test]
    fn undefined_identifier_is_an_error() {
        let program = Program {
            globals: vec![],
            functions: vec![FunctionDef {
                name: "main".to_string(),
                params: vec![],
                body: Block {
                    decls: vec![],
                    statements: vec![Statement::Return(Expr::Ident { id: 0, name: "missing".to_string() })],
                },
            }],
        };
        assert_eq!(
            resolve(&program),
            Err(ResolveError::UndefinedIdentifier("missing".to_string()))
        );
    }

    #[test]
    fn no_functions_is_an_error() {
        let program = Program { globals: vec![], functions: vec![] };
        assert_eq!(resolve(&program), Err(ResolveError::NoFunctions));
    }

    #[test]
    fn call_arity_mismatch_is_an_error() {
        let program = Program {
            globals: vec![],
            functions: vec![
                FunctionDef {
                    name: "f".to_string(),
                    params: vec!["a".to_string()],
                    body: Block { decls: vec![], statements: vec![Statement::Return(Expr::Number(0))] },
                },
                FunctionDef {
                    name: "main".to_string(),
                    params: vec![],
                    body: Block {
                        decls: vec![],
                        statements: vec![Statement::Return(Expr::Call { name: "f".to_string(), args: vec![] })],
                    },
                },
            ],
        };
        assert!(matches!(resolve(&program), Err(ResolveError::ArityMismatch { .. })));
    }
}
