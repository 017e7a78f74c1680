//! Human-readable and Graphviz dumps of a lowered [`Program`], used by
//! the CLI's `--dump-tree` flag and honoring the `GRAPHVIZ_OUTPUT`
//! environment variable the way the original toolchain did.

use crate::ast::{Block, Expr, FunctionDef, Global, LValue, PrintItem, Program, Relation, Statement};
use crate::resolver::ResolvedProgram;
use std::fmt::{self, Write};

/// Renders the indented-text or Graphviz dump. `writeln!`/`write!` into
/// a `String` cannot actually fail, but the crate's convention (see
/// `codegen::error::CodeGenError::Format`) is to propagate `fmt::Error`
/// with `?` rather than `.unwrap()`, so this panics only if `fmt::Write`
/// itself is broken, never on a malformed tree.
pub fn dump(program: &Program, resolved: Option<&ResolvedProgram>, graphviz: bool) -> String {
    let mut out = String::new();
    let result = if graphviz {
        dump_graphviz(&mut out, program, resolved)
    } else {
        dump_indented(&mut out, program, resolved)
    };
    result.expect("fmt::Write on a String does not fail");
    out
}

fn symbol_suffix(resolved: Option<&ResolvedProgram>, id: usize) -> String {
    match resolved {
        Some(r) => format!(" [{}#{}]", r.symbol_kind(id).name(), r.symbol_seq(id)),
        None => String::new(),
    }
}

fn dump_indented(out: &mut String, program: &Program, resolved: Option<&ResolvedProgram>) -> fmt::Result {
    writeln!(out, "Program")?;
    for g in &program.globals {
        match g {
            Global::Var(name) => writeln!(out, "  Global {name}")?,
            Global::Array { name, len } => writeln!(out, "  GlobalArray {name}[{len}]")?,
        }
    }
    for f in &program.functions {
        dump_function(out, f, resolved, 1)?;
    }
    Ok(())
}

fn indent(out: &mut String, depth: usize) {
    for _ in 0..depth {
        out.push_str("  ");
    }
}

fn dump_function(out: &mut String, f: &FunctionDef, resolved: Option<&ResolvedProgram>, depth: usize) -> fmt::Result {
    indent(out, depth);
    writeln!(out, "FunctionDef {}({})", f.name, f.params.join(", "))?;
    dump_block(out, &f.body, resolved, depth + 1)
}

fn dump_block(out: &mut String, block: &Block, resolved: Option<&ResolvedProgram>, depth: usize) -> fmt::Result {
    indent(out, depth);
    writeln!(out, "Block decls=[{}]", block.decls.join(", "))?;
    for s in &block.statements {
        dump_statement(out, s, resolved, depth + 1)?;
    }
    Ok(())
}

fn dump_statement(out: &mut String, stmt: &Statement, resolved: Option<&ResolvedProgram>, depth: usize) -> fmt::Result {
    indent(out, depth);
    match stmt {
        Statement::Assign { target, value } => {
            write!(out, "AssignmentStatement ")?;
            dump_lvalue_inline(out, target, resolved)?;
            writeln!(out)?;
            dump_expr(out, value, resolved, depth + 1)
        }
        Statement::Print(items) => {
            writeln!(out, "PrintStatement")?;
            for item in items {
                match item {
                    PrintItem::Value(e) => dump_expr(out, e, resolved, depth + 1)?,
                    PrintItem::Str { id, lexeme } => {
                        indent(out, depth + 1);
                        let index = resolved.map(|r| r.string_index(*id).to_string()).unwrap_or_else(|| lexeme.clone());
                        writeln!(out, "StringData #{index}")?;
                    }
                }
            }
            Ok(())
        }
        Statement::Return(e) => {
            writeln!(out, "ReturnStatement")?;
            dump_expr(out, e, resolved, depth + 1)
        }
        Statement::If { cond, then_branch, else_branch } => {
            writeln!(out, "IfStatement")?;
            dump_relation(out, cond, resolved, depth + 1)?;
            dump_block(out, then_branch, resolved, depth + 1)?;
            if let Some(b) = else_branch {
                dump_block(out, b, resolved, depth + 1)?;
            }
            Ok(())
        }
        Statement::While { cond, body } => {
            writeln!(out, "WhileStatement")?;
            dump_relation(out, cond, resolved, depth + 1)?;
            dump_block(out, body, resolved, depth + 1)
        }
        Statement::Break => writeln!(out, "BreakStatement"),
        Statement::Block(b) => {
            writeln!(out, "Block decls=[{}]", b.decls.join(", "))?;
            for s in &b.statements {
                dump_statement(out, s, resolved, depth + 1)?;
            }
            Ok(())
        }
    }
}

fn dump_lvalue_inline(out: &mut String, lvalue: &LValue, resolved: Option<&ResolvedProgram>) -> fmt::Result {
    match lvalue {
        LValue::Ident { id, name } => write!(out, "IdentifierData {name}{}", symbol_suffix(resolved, *id)),
        LValue::Index { id, name, .. } => write!(out, "ArrayIndexing {name}{}", symbol_suffix(resolved, *id)),
    }
}

fn dump_relation(out: &mut String, rel: &Relation, resolved: Option<&ResolvedProgram>, depth: usize) -> fmt::Result {
    indent(out, depth);
    writeln!(out, "Relation {:?}", rel.op)?;
    dump_expr(out, &rel.lhs, resolved, depth + 1)?;
    dump_expr(out, &rel.rhs, resolved, depth + 1)
}

fn dump_expr(out: &mut String, expr: &Expr, resolved: Option<&ResolvedProgram>, depth: usize) -> fmt::Result {
    indent(out, depth);
    match expr {
        Expr::Number(n) => writeln!(out, "NumberData {n}"),
        Expr::Ident { id, name } => writeln!(out, "IdentifierData {name}{}", symbol_suffix(resolved, *id)),
        Expr::Index { id, name, index } => {
            writeln!(out, "ArrayIndexing {name}{}", symbol_suffix(resolved, *id))?;
            dump_expr(out, index, resolved, depth + 1)
        }
        Expr::Neg(inner) => {
            writeln!(out, "Expression -")?;
            dump_expr(out, inner, resolved, depth + 1)
        }
        Expr::Binary { op, lhs, rhs } => {
            writeln!(out, "Expression {:?}", op)?;
            dump_expr(out, lhs, resolved, depth + 1)?;
            dump_expr(out, rhs, resolved, depth + 1)
        }
        Expr::Call { name, args } => {
            writeln!(out, "Expression call {name}")?;
            for a in args {
                dump_expr(out, a, resolved, depth + 1)?;
            }
            Ok(())
        }
    }
}

fn dump_graphviz(out: &mut String, program: &Program, resolved: Option<&ResolvedProgram>) -> fmt::Result {
    writeln!(out, "digraph AST {{")?;
    let mut id = 0usize;
    writeln!(out, "  n{id} [label=\"Program\"];")?;
    let root = id;
    id += 1;
    for f in &program.functions {
        let fid = id;
        id += 1;
        writeln!(out, "  n{fid} [label=\"FunctionDef {}\"];", f.name)?;
        writeln!(out, "  n{root} -> n{fid};")?;
        graphviz_block(out, &f.body, resolved, fid, &mut id)?;
    }
    writeln!(out, "}}")
}

fn graphviz_block(out: &mut String, block: &Block, resolved: Option<&ResolvedProgram>, parent: usize, id: &mut usize) -> fmt::Result {
    let bid = *id;
    *id += 1;
    writeln!(out, "  n{bid} [label=\"Block\"];")?;
    writeln!(out, "  n{parent} -> n{bid};")?;
    for s in &block.statements {
        let sid = *id;
        *id += 1;
        writeln!(out, "  n{sid} [label=\"{}\"];", statement_label(s))?;
        writeln!(out, "  n{bid} -> n{sid};")?;
        let _ = resolved;
    }
    Ok(())
}

fn statement_label(stmt: &Statement) -> &'static str {
    match stmt {
        Statement::Assign { .. } => "AssignmentStatement",
        Statement::Print(_) => "PrintStatement",
        Statement::Return(_) => "ReturnStatement",
        Statement::If { .. } => "IfStatement",
        Statement::While { .. } => "WhileStatement",
        Statement::Break => "BreakStatement",
        Statement::Block(_) => "Block",
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ast::{FunctionDef};

    #[test]
    fn indented_dump_contains_function_name() {
        let program = Program {
            globals: vec![],
            functions: vec![FunctionDef {
                name: "main".to_string(),
                params: vec![],
                body: Block { decls: vec![], statements: vec![Statement::Return(Expr::Number(0))] },
            }],
        };
        let text = dump(&program, None, false);
        assert!(text.contains("FunctionDef main"));
        assert!(text.contains("ReturnStatement"));
    }

    #[test]
    fn graphviz_dump_looks_like_dot() {
        let program = Program {
            globals: vec![],
            functions: vec![FunctionDef {
                name: "main".to_string(),
                params: vec![],
                body: Block { decls: vec![], statements: vec![] },
            }],
        };
        let text = dump(&program, None, true);
        assert!(text.starts_with("digraph AST {"));
    }
}
