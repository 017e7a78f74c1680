//! SimplifyPass: rewrites a raw [`ParseNode`] tree into its canonical
//! shape, in place, before [`crate::ast::lower`] converts it into the
//! tagged-variant `crate::ast::Program`.
//!
//! The rewrite is post-order: children are simplified first, then the
//! current node is transformed according to its kind. Every rule below
//! is applied exhaustively (running the pass twice leaves the tree
//! unchanged, see the `idempotent_*` tests).

use crate::tree::{NodeKind, ParseNode, Payload};
use tracing::{debug, warn};

#[derive(Debug, Clone, PartialEq)]
pub enum SimplifyError {
    /// Compile-time-constant division by zero, diagnosed eagerly rather
    /// than deferred to a runtime trap (see DESIGN.md Open Questions).
    ConstantDivisionByZero,
    /// An array declaration whose length did not fold to a `NumberData`.
    NonConstantArrayLength,
}

impl std::fmt::Display for SimplifyError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            SimplifyError::ConstantDivisionByZero => {
                write!(f, "error: division by zero in constant expression")
            }
            SimplifyError::NonConstantArrayLength => {
                write!(f, "error: array length must be a constant")
            }
        }
    }
}

impl std::error::Error for SimplifyError {}

/// Kinds that flatten a two-child, same-kind-left shape into a single
/// wide list.
fn is_flattenable_list(kind: NodeKind) -> bool {
    matches!(
        kind,
        NodeKind::VariableList
            | NodeKind::PrintList
            | NodeKind::StatementList
            | NodeKind::GlobalList
            | NodeKind::DeclarationList
            | NodeKind::ExpressionList
    )
}

/// Kinds that are single-child pass-through wrappers.
fn is_passthrough(kind: NodeKind) -> bool {
    matches!(
        kind,
        NodeKind::Program | NodeKind::Global | NodeKind::PrintItem | NodeKind::Statement
    )
}

/// Kinds that, given a single list-wrapper child, retype to that kind
/// and discard the wrapping node.
fn is_retype_wrapper(kind: NodeKind) -> bool {
    matches!(
        kind,
        NodeKind::PrintStatement
            | NodeKind::Declaration
            | NodeKind::ParameterList
            | NodeKind::ArrayDeclaration
            | NodeKind::ArgumentList
    )
}

pub fn simplify(node: ParseNode) -> Result<ParseNode, SimplifyError> {
    let ParseNode {
        kind,
        payload,
        children,
    } = node;

    let mut children = children
        .into_iter()
        .map(simplify)
        .collect::<Result<Vec<_>, _>>()?;

    if is_passthrough(kind) {
        debug_assert_eq!(children.len(), 1, "{kind:?} must have exactly one child");
        return Ok(children.remove(0));
    }

    if is_flattenable_list(kind) && children.len() == 2 && children[0].kind == kind {
        let left = children.remove(0);
        let mut flattened = left.children;
        flattened.extend(children);
        return Ok(ParseNode::with_children(kind, flattened));
    }

    if is_retype_wrapper(kind) && children.len() == 1 {
        let mut child = children.remove(0);
        child.kind = kind;
        return Ok(child);
    }

    match kind {
        NodeKind::Expression => fold_expression(payload, children),
        NodeKind::ArrayDeclaration => {
            check_array_length(&children)?;
            Ok(ParseNode {
                kind,
                payload,
                children,
            })
        }
        NodeKind::ForStatement => desugar_for(children),
        _ => Ok(ParseNode {
            kind,
            payload,
            children,
        }),
    }
}

fn check_array_length(children: &[ParseNode]) -> Result<(), SimplifyError> {
    if let Some(len_node) = children.get(1) {
        if len_node.kind != NodeKind::NumberData {
            warn!("array declaration length did not fold to a constant");
            return Err(SimplifyError::NonConstantArrayLength);
        }
    }
    Ok(())
}

fn fold_expression(
    payload: Option<Payload>,
    mut children: Vec<ParseNode>,
) -> Result<ParseNode, SimplifyError> {
    let op = match &payload {
        Some(Payload::Operator(op)) => op.clone(),
        _ => {
            // No operator: a pass-through `Expression` wrapping a single
            // child expression.
            debug_assert_eq!(children.len(), 1);
            return Ok(children.remove(0));
        }
    };

    let all_numbers = children
        .iter()
        .all(|c| c.kind == NodeKind::NumberData);
    if !all_numbers {
        return Ok(ParseNode {
            kind: NodeKind::Expression,
            payload: Some(Payload::Operator(op)),
            children,
        });
    }

    let value = match children.len() {
        1 => {
            let n = children[0].number().expect("checked NumberData above");
            match op.as_str() {
                "-" => n.wrapping_neg(),
                "+" => n,
                // A quirk of the original implementation: unary `*` and
                // `/` fold to zero rather than being rejected. Preserved
                // deliberately; see DESIGN.md Open Questions.
                "*" | "/" => 0,
                _ => unreachable!("unary operator {op}"),
            }
        }
        2 => {
            let lhs = children[0].number().expect("checked NumberData above");
            let rhs = children[1].number().expect("checked NumberData above");
            match op.as_str() {
                "+" => lhs.wrapping_add(rhs),
                "-" => lhs.wrapping_sub(rhs),
                "*" => lhs.wrapping_mul(rhs),
                "/" => {
                    if rhs == 0 {
                        return Err(SimplifyError::ConstantDivisionByZero);
                    }
                    lhs.wrapping_div(rhs)
                }
                _ => unreachable!("binary operator {op}"),
            }
        }
        n => unreachable!("Expression with {n} children"),
    };

    debug!(value, op = %op, "folded constant expression");
    Ok(ParseNode::leaf(NodeKind::NumberData, Payload::Number(value)))
}

/// `ForStatement(var, start, end, body)` desugars into:
/// ```text
/// Block {
///   DeclarationList(var, __FOR_END__)
///   AssignmentStatement(var := start)
///   AssignmentStatement(__FOR_END__ := end)
///   WhileStatement(var < __FOR_END__, Block(body; var := var + 1))
/// }
/// ```
fn desugar_for(mut children: Vec<ParseNode>) -> Result<ParseNode, SimplifyError> {
    debug_assert_eq!(children.len(), 4, "ForStatement(var, start, end, body)");
    let body = children.remove(3);
    let end = children.remove(2);
    let start = children.remove(1);
    let var = children.remove(0);
    let var_name = var
        .name()
        .expect("ForStatement's first child is an IdentifierData")
        .to_string();

    let ident = |name: &str| ParseNode::leaf(NodeKind::IdentifierData, Payload::Name(name.to_string()));

    let decls = ParseNode::with_children(
        NodeKind::DeclarationList,
        vec![ident(&var_name), ident("__FOR_END__")],
    );
    let init_var = assignment(ident(&var_name), start);
    let init_end = assignment(ident("__FOR_END__"), end);

    let relation = ParseNode {
        kind: NodeKind::Relation,
        payload: Some(Payload::Operator("<".to_string())),
        children: vec![ident(&var_name), ident("__FOR_END__")],
    };
    let increment = assignment(
        ident(&var_name),
        ParseNode {
            kind: NodeKind::Expression,
            payload: Some(Payload::Operator("+".to_string())),
            children: vec![ident(&var_name), ParseNode::leaf(NodeKind::NumberData, Payload::Number(1))],
        },
    );
    let mut body_statements = if body.kind == NodeKind::StatementList {
        body.children
    } else {
        vec![body]
    };
    body_statements.push(increment);
    let loop_body = ParseNode::with_children(
        NodeKind::Block,
        vec![ParseNode::with_children(NodeKind::StatementList, body_statements)],
    );
    let while_stmt = ParseNode::with_children(NodeKind::WhileStatement, vec![relation, loop_body]);

    Ok(ParseNode::with_children(
        NodeKind::Block,
        vec![
            decls,
            ParseNode::with_children(
                NodeKind::StatementList,
                vec![init_var, init_end, while_stmt],
            ),
        ],
    ))
}

fn assignment(target: ParseNode, value: ParseNode) -> ParseNode {
    ParseNode::with_children(NodeKind::AssignmentStatement, vec![target, value])
}
