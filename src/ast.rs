//! The canonical, tagged-variant AST produced by lowering a simplified
//! [`ParseNode`]. Every surviving node kind gets its own variant instead
//! of a shared kind-tag-plus-payload shape, so the Resolver and CodeGen
//! can match over it exhaustively.

use crate::tree::{NodeKind, ParseNode};
use std::fmt;

/// Dense id assigned to every `IdentifierData`/`StringData` occurrence
/// during lowering. The Resolver's output side tables are keyed by this.
pub type NodeId = usize;

#[derive(Debug, Clone, PartialEq)]
pub struct Program {
    pub globals: Vec<Global>,
    pub functions: Vec<FunctionDef>,
}

#[derive(Debug, Clone, PartialEq)]
pub enum Global {
    Var(String),
    Array { name: String, len: i64 },
}

#[derive(Debug, Clone, PartialEq)]
pub struct FunctionDef {
    pub name: String,
    pub params: Vec<String>,
    pub body: Block,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Block {
    /// Names declared directly in this block (an empty vec if the block
    /// has no declaration list, in which case no scope layer is pushed).
    pub decls: Vec<String>,
    pub statements: Vec<Statement>,
}

#[derive(Debug, Clone, PartialEq)]
pub enum Statement {
    Assign { target: LValue, value: Expr },
    Print(Vec<PrintItem>),
    Return(Expr),
    If {
        cond: Relation,
        then_branch: Block,
        else_branch: Option<Block>,
    },
    While {
        cond: Relation,
        body: Block,
    },
    Break,
    /// A nested block appearing directly in statement position, as
    /// produced by `simplify::desugar_for`'s `for`-to-`while` rewrite
    /// (mirroring the original `replace_for_statement`'s `NODE(result,
    /// BLOCK, ...)`). Carries its own declaration scope.
    Block(Block),
}

#[derive(Debug, Clone, PartialEq)]
pub enum PrintItem {
    Value(Expr),
    /// `lexeme` still carries its surrounding double quotes, exactly as
    /// emitted by the lexer; the Resolver interns it and records the
    /// resulting index against `id`.
    Str { id: NodeId, lexeme: String },
}

#[derive(Debug, Clone, PartialEq)]
pub enum LValue {
    Ident { id: NodeId, name: String },
    Index {
        id: NodeId,
        name: String,
        index: Box<Expr>,
    },
}

#[derive(Debug, Clone, PartialEq)]
pub struct Relation {
    pub op: RelOp,
    pub lhs: Expr,
    pub rhs: Expr,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RelOp {
    Lt,
    Gt,
    Eq,
    Ne,
}

#[derive(Debug, Clone, PartialEq)]
pub enum Expr {
    Number(i64),
    Ident { id: NodeId, name: String },
    Index {
        id: NodeId,
        name: String,
        index: Box<Expr>,
    },
    Neg(Box<Expr>),
    Binary {
        op: BinOp,
        lhs: Box<Expr>,
        rhs: Box<Expr>,
    },
    Call { name: String, args: Vec<Expr> },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BinOp {
    Add,
    Sub,
    Mul,
    Div,
}

#[derive(Debug, Clone, PartialEq)]
pub enum LowerError {
    UnexpectedShape { kind: NodeKind, detail: &'static str },
}

impl fmt::Display for LowerError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            LowerError::UnexpectedShape { kind, detail } => {
                write!(f, "error: malformed {kind:?} node: {detail}")
            }
        }
    }
}
impl std::error::Error for LowerError {}

/// Lowers an already-[`crate::simplify::simplify`]d tree into a
/// [`Program`], assigning a fresh [`NodeId`] to every identifier and
/// string occurrence as it goes.
pub fn lower(root: ParseNode) -> Result<Program, LowerError> {
    let mut ids = IdAllocator::default();
    lower_program(root, &mut ids)
}

#[derive(Default)]
struct IdAllocator(NodeId);

impl IdAllocator {
    fn next(&mut self) -> NodeId {
        let id = self.0;
        self.0 += 1;
        id
    }
}

fn shape_err(kind: NodeKind, detail: &'static str) -> LowerError {
    LowerError::UnexpectedShape { kind, detail }
}

fn lower_program(node: ParseNode, ids: &mut IdAllocator) -> Result<Program, LowerError> {
    let mut globals = Vec::new();
    let mut functions = Vec::new();
    for child in flatten_top(node) {
        match child.kind {
            NodeKind::Declaration => {
                for name_node in child.children {
                    let name = name_node
                        .name()
                        .ok_or_else(|| shape_err(NodeKind::Declaration, "expected identifier"))?
                        .to_string();
                    globals.push(Global::Var(name));
                }
            }
            NodeKind::ArrayDeclaration => {
                let name = child.children[0]
                    .name()
                    .ok_or_else(|| shape_err(NodeKind::ArrayDeclaration, "expected identifier"))?
                    .to_string();
                let len = child.children[1]
                    .number()
                    .ok_or_else(|| shape_err(NodeKind::ArrayDeclaration, "length must be NumberData"))?;
                globals.push(Global::Array { name, len });
            }
            NodeKind::FunctionDef => functions.push(lower_function(child, ids)?),
            other => return Err(shape_err(other, "expected a top-level declaration")),
        }
    }
    Ok(Program { globals, functions })
}

/// The top-level list may itself be a single child (no wrapping list
/// survives simplification when there's exactly one top-level item).
fn flatten_top(node: ParseNode) -> Vec<ParseNode> {
    if node.kind == NodeKind::GlobalList {
        node.children
    } else {
        vec![node]
    }
}

fn lower_function(node: ParseNode, ids: &mut IdAllocator) -> Result<FunctionDef, LowerError> {
    // children: [name-bearing node carries FunctionDef's own payload],
    // optional ParameterList, Block. The parser is expected to attach
    // the function name as this node's own payload.
    let name = node
        .name()
        .ok_or_else(|| shape_err(NodeKind::FunctionDef, "missing function name"))?
        .to_string();

    let mut children = node.children.into_iter();
    let mut params = Vec::new();
    let mut body_node = None;
    for child in children.by_ref() {
        match child.kind {
            NodeKind::ParameterList => {
                for p in child.children {
                    params.push(
                        p.name()
                            .ok_or_else(|| shape_err(NodeKind::ParameterList, "expected identifier"))?
                            .to_string(),
                    );
                }
            }
            NodeKind::Block => {
                body_node = Some(child);
                break;
            }
            other => return Err(shape_err(other, "unexpected FunctionDef child")),
        }
    }
    let body_node = body_node.ok_or_else(|| shape_err(NodeKind::FunctionDef, "missing body block"))?;
    let body = lower_block(body_node, ids)?;
    Ok(FunctionDef { name, params, body })
}

fn lower_block(node: ParseNode, ids: &mut IdAllocator) -> Result<Block, LowerError> {
    debug_assert_eq!(node.kind, NodeKind::Block);
    let mut decls = Vec::new();
    let mut statements = Vec::new();
    for child in node.children {
        match child.kind {
            NodeKind::DeclarationList => {
                for name_node in child.children {
                    decls.push(
                        name_node
                            .name()
                            .ok_or_else(|| shape_err(NodeKind::DeclarationList, "expected identifier"))?
                            .to_string(),
                    );
                }
            }
            NodeKind::StatementList => {
                for s in child.children {
                    statements.push(lower_statement(s, ids)?);
                }
            }
            // a single bare statement (no StatementList wrapper survived
            // because there was only one statement in the block).
            _ => statements.push(lower_statement(child, ids)?),
        }
    }
    Ok(Block { decls, statements })
}

fn lower_statement(node: ParseNode, ids: &mut IdAllocator) -> Result<Statement, LowerError> {
    match node.kind {
        NodeKind::AssignmentStatement => {
            let mut children = node.children.into_iter();
            let target = children.next().ok_or_else(|| shape_err(NodeKind::AssignmentStatement, "missing target"))?;
            let value = children.next().ok_or_else(|| shape_err(NodeKind::AssignmentStatement, "missing value"))?;
            Ok(Statement::Assign {
                target: lower_lvalue(target, ids)?,
                value: lower_expr(value, ids)?,
            })
        }
        NodeKind::PrintStatement => {
            let mut items = Vec::new();
            for child in node.children {
                let item = if child.kind == NodeKind::StringData {
                    let lexeme = match &child.payload {
                        Some(crate::tree::Payload::RawString(s)) => s.clone(),
                        _ => return Err(shape_err(NodeKind::StringData, "expected a raw string lexeme")),
                    };
                    PrintItem::Str { id: ids.next(), lexeme }
                } else {
                    PrintItem::Value(lower_expr(child, ids)?)
                };
                items.push(item);
            }
            Ok(Statement::Print(items))
        }
        NodeKind::ReturnStatement => {
            let expr = node
                .children
                .into_iter()
                .next()
                .ok_or_else(|| shape_err(NodeKind::ReturnStatement, "missing expression"))?;
            Ok(Statement::Return(lower_expr(expr, ids)?))
        }
        NodeKind::IfStatement => {
            let mut children = node.children.into_iter();
            let cond = lower_relation(children.next().ok_or_else(|| shape_err(NodeKind::IfStatement, "missing condition"))?, ids)?;
            let then_branch = lower_block(children.next().ok_or_else(|| shape_err(NodeKind::IfStatement, "missing then-branch"))?, ids)?;
            let else_branch = match children.next() {
                Some(b) => Some(lower_block(b, ids)?),
                None => None,
            };
            Ok(Statement::If { cond, then_branch, else_branch })
        }
        NodeKind::WhileStatement => {
            let mut children = node.children.into_iter();
            let cond = lower_relation(children.next().ok_or_else(|| shape_err(NodeKind::WhileStatement, "missing condition"))?, ids)?;
            let body = lower_block(children.next().ok_or_else(|| shape_err(NodeKind::WhileStatement, "missing body"))?, ids)?;
            Ok(Statement::While { cond, body })
        }
        NodeKind::BreakStatement => Ok(Statement::Break),
        NodeKind::Block => Ok(Statement::Block(lower_block(node, ids)?)),
        other => Err(shape_err(other, "expected a statement")),
    }
}

fn lower_lvalue(node: ParseNode, ids: &mut IdAllocator) -> Result<LValue, LowerError> {
    match node.kind {
        NodeKind::IdentifierData => {
            let name = node.name().ok_or_else(|| shape_err(NodeKind::IdentifierData, "missing name"))?.to_string();
            Ok(LValue::Ident { id: ids.next(), name })
        }
        NodeKind::ArrayIndexing => {
            let mut children = node.children.into_iter();
            let name_node = children.next().ok_or_else(|| shape_err(NodeKind::ArrayIndexing, "missing array name"))?;
            let name = name_node.name().ok_or_else(|| shape_err(NodeKind::ArrayIndexing, "array name must be an identifier"))?.to_string();
            let index_node = children.next().ok_or_else(|| shape_err(NodeKind::ArrayIndexing, "missing index"))?;
            let id = ids.next();
            let index = Box::new(lower_expr(index_node, ids)?);
            Ok(LValue::Index { id, name, index })
        }
        other => Err(shape_err(other, "expected an assignable target")),
    }
}

fn lower_relation(node: ParseNode, ids: &mut IdAllocator) -> Result<Relation, LowerError> {
    debug_assert_eq!(node.kind, NodeKind::Relation);
    let op = match node.operator() {
        Some("<") => RelOp::Lt,
        Some(">") => RelOp::Gt,
        Some("=") => RelOp::Eq,
        Some("!=") => RelOp::Ne,
        _ => return Err(shape_err(NodeKind::Relation, "unknown relational operator")),
    };
    let mut children = node.children.into_iter();
    let lhs = lower_expr(children.next().ok_or_else(|| shape_err(NodeKind::Relation, "missing lhs"))?, ids)?;
    let rhs = lower_expr(children.next().ok_or_else(|| shape_err(NodeKind::Relation, "missing rhs"))?, ids)?;
    Ok(Relation { op, lhs, rhs })
}

fn lower_expr(node: ParseNode, ids: &mut IdAllocator) -> Result<Expr, LowerError> {
    match node.kind {
        NodeKind::NumberData => Ok(Expr::Number(node.number().ok_or_else(|| shape_err(NodeKind::NumberData, "missing value"))?)),
        NodeKind::IdentifierData => {
            let name = node.name().ok_or_else(|| shape_err(NodeKind::IdentifierData, "missing name"))?.to_string();
            Ok(Expr::Ident { id: ids.next(), name })
        }
        NodeKind::ArrayIndexing => {
            let mut children = node.children.into_iter();
            let name_node = children.next().ok_or_else(|| shape_err(NodeKind::ArrayIndexing, "missing array name"))?;
            let name = name_node.name().ok_or_else(|| shape_err(NodeKind::ArrayIndexing, "array name must be an identifier"))?.to_string();
            let id = ids.next();
            let index_node = children.next().ok_or_else(|| shape_err(NodeKind::ArrayIndexing, "missing index"))?;
            let index = Box::new(lower_expr(index_node, ids)?);
            Ok(Expr::Index { id, name, index })
        }
        NodeKind::Expression => {
            let op = node.operator().map(str::to_string);
            let mut children = node.children.into_iter();
            match (op.as_deref(), children.len()) {
                (Some("call"), _) => {
                    // The callee name is this node's own payload (set by
                    // the parser alongside the "call" operator sentinel)
                    // is not representable via Payload::Operator, so a
                    // call instead carries its callee as the first
                    // IdentifierData child.
                    let callee = children.next().ok_or_else(|| shape_err(NodeKind::Expression, "call missing callee"))?;
                    let name = callee.name().ok_or_else(|| shape_err(NodeKind::Expression, "call callee must be an identifier"))?.to_string();
                    let mut args = Vec::new();
                    for arg in children {
                        args.push(lower_expr(arg, ids)?);
                    }
                    Ok(Expr::Call { name, args })
                }
                (Some("-"), 1) => Ok(Expr::Neg(Box::new(lower_expr(children.next().unwrap(), ids)?))),
                (Some(op), 2) => {
                    let lhs = Box::new(lower_expr(children.next().unwrap(), ids)?);
                    let rhs = Box::new(lower_expr(children.next().unwrap(), ids)?);
                    let op = match op {
                        "+" => BinOp::Add,
                        "-" => BinOp::Sub,
                        "*" => BinOp::Mul,
                        "/" => BinOp::Div,
                        _ => return Err(shape_err(NodeKind::Expression, "unknown binary operator")),
                    };
                    Ok(Expr::Binary { op, lhs, rhs })
                }
                _ => Err(shape_err(NodeKind::Expression, "unrecognized operator/arity")),
            }
        }
        other => Err(shape_err(other, "expected an expression")),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::tree::Payload;

    fn ident(name: &str) -> ParseNode {
        ParseNode::leaf(NodeKind::IdentifierData, Payload::Name(name.to_string()))
    }
    fn num(n: i64) -> ParseNode {
        ParseNode::leaf(NodeKind::NumberData, Payload::Number(n))
    }

    #[test]
    fn lowers_minimal_main() {
        // def main() begin print 7 end
        let body = ParseNode::with_children(
            NodeKind::Block,
            vec![ParseNode::with_children(
                NodeKind::PrintStatement,
                vec![num(7)],
            )],
        );
        let func = ParseNode {
            kind: NodeKind::FunctionDef,
            payload: Some(Payload::Name("main".to_string())),
            children: vec![body],
        };
        let program = lower(func).unwrap();
        assert_eq!(program.functions.len(), 1);
        assert_eq!(program.functions[0].name, "main");
        assert_eq!(program.functions[0].body.statements.len(), 1);
    }

    #[test]
    fn lowers_nested_block_in_statement_position() {
        // the shape simplify::desugar_for produces in place of a ForStatement
        let inner = ParseNode::with_children(
            NodeKind::Block,
            vec![
                ParseNode::with_children(NodeKind::DeclarationList, vec![ident("i")]),
                ParseNode::with_children(
                    NodeKind::StatementList,
                    vec![ParseNode::with_children(NodeKind::AssignmentStatement, vec![ident("i"), num(0)])],
                ),
            ],
        );
        let body = ParseNode::with_children(NodeKind::Block, vec![inner]);
        let func = ParseNode {
            kind: NodeKind::FunctionDef,
            payload: Some(Payload::Name("main".to_string())),
            children: vec![body],
        };
        let program = lower(func).unwrap();
        match &program.functions[0].body.statements[0] {
            Statement::Block(b) => {
                assert_eq!(b.decls, vec!["i".to_string()]);
                assert_eq!(b.statements.len(), 1);
            }
            other => panic!("expected Statement::Block, got {other:?}"),
        }
    }

    #[test]
    fn assigns_distinct_node_ids_to_identifiers() {
        let target = ident("x");
        let value = ident("y");
        let assign = ParseNode::with_children(NodeKind::AssignmentStatement, vec![target, value]);
        let body = ParseNode::with_children(NodeKind::Block, vec![assign]);
        let func = ParseNode {
            kind: NodeKind::FunctionDef,
            payload: Some(Payload::Name("f".to_string())),
            children: vec![body],
        };
        let program = lower(func).unwrap();
        let Statement::Assign { target, value } = &program.functions[0].body.statements[0] else {
            panic!("expected assignment");
        };
        let LValue::Ident { id: target_id, .. } = target else { panic!() };
        let Expr::Ident { id: value_id, .. } = value else { panic!() };
        assert_ne!(target_id, value_id);
    }
}
