//! The external parse-tree boundary.
//!
//! `ParseNode` is the generic, kind-tagged tree this crate accepts as
//! input: lexing and parsing are out of scope, so every tree this crate
//! ever sees was deserialized from JSON rather than built by a parser
//! living in this crate. The shape deliberately mirrors a textbook
//! grammar's concrete parse tree (wrapper list nodes, pass-through
//! single-child nodes) because [`crate::simplify`] needs exactly that
//! shape to have real flattening/squashing work to do.
//!
//! Once [`crate::simplify::simplify`] has canonicalized a `ParseNode`,
//! [`crate::ast::lower`] converts it into `crate::ast::Program`, the
//! tagged-variant tree every later pass actually matches over.

use serde::{Deserialize, Serialize};

/// The closed set of node kinds a parser may produce.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum NodeKind {
    Program,
    GlobalList,
    Global,
    FunctionDef,
    ParameterList,
    DeclarationList,
    Declaration,
    ArrayDeclaration,
    VariableList,
    StatementList,
    Statement,
    Block,
    PrintList,
    PrintItem,
    ArgumentList,
    ExpressionList,

    AssignmentStatement,
    PrintStatement,
    ReturnStatement,
    IfStatement,
    WhileStatement,
    ForStatement,
    BreakStatement,

    Expression,
    Relation,
    ArrayIndexing,
    IdentifierData,
    NumberData,
    StringData,
}

/// The per-kind payload. Most kinds carry no payload at all; this is
/// `None` for every purely-structural kind.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", content = "value")]
pub enum Payload {
    /// `IdentifierData`, `FunctionDef` name.
    Name(String),
    /// `NumberData`.
    Number(i64),
    /// `StringData` before interning: the raw lexeme, quotes included.
    RawString(String),
    /// `StringData` after interning: the index into the global string table.
    StringIndex(usize),
    /// `Expression`/`Relation` operator text (`+ - * / < > = !=` or `call`).
    Operator(String),
}

/// A single parse-tree vertex: a kind tag, an optional payload, and an
/// ordered (possibly empty) sequence of children.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ParseNode {
    pub kind: NodeKind,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub payload: Option<Payload>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub children: Vec<ParseNode>,
}

impl ParseNode {
    pub fn new(kind: NodeKind) -> Self {
        ParseNode {
            kind,
            payload: None,
            children: Vec::new(),
        }
    }

    pub fn leaf(kind: NodeKind, payload: Payload) -> Self {
        ParseNode {
            kind,
            payload: Some(payload),
            children: Vec::new(),
        }
    }

    pub fn with_children(kind: NodeKind, children: Vec<ParseNode>) -> Self {
        ParseNode {
            kind,
            payload: None,
            children,
        }
    }

    pub fn name(&self) -> Option<&str> {
        match &self.payload {
            Some(Payload::Name(n)) => Some(n.as_str()),
            _ => None,
        }
    }

    pub fn number(&self) -> Option<i64> {
        match &self.payload {
            Some(Payload::Number(n)) => Some(*n),
            _ => None,
        }
    }

    pub fn operator(&self) -> Option<&str> {
        match &self.payload {
            Some(Payload::Operator(op)) => Some(op.as_str()),
            _ => None,
        }
    }
}
