//! Syntax tree nodes
//!
//! The front end hands the middle end a generic tree: every node has a kind
//! tag from a closed set, string attributes, ordered children, an optional
//! source position, and a slot for the type the checker resolves.
//!
//! Child layout per kind:
//!
//! | kind                | attributes            | children                                   |
//! |---------------------|-----------------------|--------------------------------------------|
//! | `Program`           |                       | `ImportDecl*`, `ClassDecl`                 |
//! | `ImportDecl`        | `path`                |                                            |
//! | `ClassDecl`         | `name`, `extends?`    | `VarDecl*` (fields), `MethodDecl*`         |
//! | `VarDecl`, `Param`  | `name`                | `TypeRef`                                  |
//! | `MethodDecl`        | `name`, `isStatic`    | `TypeRef` (return), `Param*`, `VarDecl*`, statements |
//! | `TypeRef`           | `name`, `isArray`, `isVarArgs` |                                   |
//! | `IfStmt`            |                       | condition, then, else?                     |
//! | `WhileStmt`         |                       | condition, body                            |
//! | `AssignStmt`        | `name`                | value                                      |
//! | `ArrayAssignStmt`   | `name`                | index, value                               |
//! | `FieldAssignStmt`   | `name`                | receiver, value                            |
//! | `MethodCallExpr`    | `name`                | receiver, arguments*                       |
//! | `FieldAccessExpr`   | `name`                | receiver                                   |
//! | `NewArrayExpr`      | `type?` (default int) | size                                       |
//! | `BinaryExpr`        | `op`                  | left, right                                |

use super::types::Type;
use rustc_hash::FxHashMap;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Closed set of node kinds
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum NodeKind {
    // Declarations
    Program,
    ImportDecl,
    ClassDecl,
    VarDecl,
    MethodDecl,
    Param,
    TypeRef,

    // Statements
    Block,
    IfStmt,
    WhileStmt,
    AssignStmt,
    ArrayAssignStmt,
    FieldAssignStmt,
    ExprStmt,
    ReturnStmt,

    // Expressions
    BinaryExpr,
    NotExpr,
    ParenExpr,
    ArrayAccessExpr,
    ArrayLengthExpr,
    MethodCallExpr,
    FieldAccessExpr,
    NewObjectExpr,
    NewArrayExpr,
    ArrayInitExpr,
    IntegerLiteral,
    BooleanLiteral,
    VarRefExpr,
    ThisExpr,
}

impl NodeKind {
    pub fn is_statement(self) -> bool {
        matches!(
            self,
            NodeKind::Block
                | NodeKind::IfStmt
                | NodeKind::WhileStmt
                | NodeKind::AssignStmt
                | NodeKind::ArrayAssignStmt
                | NodeKind::FieldAssignStmt
                | NodeKind::ExprStmt
                | NodeKind::ReturnStmt
        )
    }

    pub fn is_expression(self) -> bool {
        matches!(
            self,
            NodeKind::BinaryExpr
                | NodeKind::NotExpr
                | NodeKind::ParenExpr
                | NodeKind::ArrayAccessExpr
                | NodeKind::ArrayLengthExpr
                | NodeKind::MethodCallExpr
                | NodeKind::FieldAccessExpr
                | NodeKind::NewObjectExpr
                | NodeKind::NewArrayExpr
                | NodeKind::ArrayInitExpr
                | NodeKind::IntegerLiteral
                | NodeKind::BooleanLiteral
                | NodeKind::VarRefExpr
                | NodeKind::ThisExpr
        )
    }

    pub fn is_literal(self) -> bool {
        matches!(self, NodeKind::IntegerLiteral | NodeKind::BooleanLiteral)
    }
}

impl fmt::Display for NodeKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Debug::fmt(self, f)
    }
}

/// Binary operators of the source language
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum BinaryOp {
    Add,
    Sub,
    Mul,
    Div,
    Less,
    And,
}

impl BinaryOp {
    /// Parse the operator attribute of a `BinaryExpr`
    pub fn from_symbol(symbol: &str) -> Option<Self> {
        match symbol {
            "+" => Some(BinaryOp::Add),
            "-" => Some(BinaryOp::Sub),
            "*" => Some(BinaryOp::Mul),
            "/" => Some(BinaryOp::Div),
            "<" => Some(BinaryOp::Less),
            "&&" => Some(BinaryOp::And),
            _ => None,
        }
    }

    pub fn symbol(self) -> &'static str {
        match self {
            BinaryOp::Add => "+",
            BinaryOp::Sub => "-",
            BinaryOp::Mul => "*",
            BinaryOp::Div => "/",
            BinaryOp::Less => "<",
            BinaryOp::And => "&&",
        }
    }

    /// Type both operands must have
    pub fn operand_type(self) -> Type {
        match self {
            BinaryOp::And => Type::boolean(),
            _ => Type::int(),
        }
    }

    /// Type of the operator's result
    pub fn result_type(self) -> Type {
        match self {
            BinaryOp::Add | BinaryOp::Sub | BinaryOp::Mul | BinaryOp::Div => Type::int(),
            BinaryOp::Less | BinaryOp::And => Type::boolean(),
        }
    }

    pub fn is_arithmetic(self) -> bool {
        matches!(
            self,
            BinaryOp::Add | BinaryOp::Sub | BinaryOp::Mul | BinaryOp::Div
        )
    }
}

impl fmt::Display for BinaryOp {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.symbol())
    }
}

/// Source position (1-based line and column)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub struct Position {
    pub line: u32,
    pub column: u32,
}

impl Position {
    pub fn new(line: u32, column: u32) -> Self {
        Self { line, column }
    }
}

/// A node of the syntax tree
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SyntaxNode {
    pub kind: NodeKind,
    #[serde(default)]
    pub attrs: FxHashMap<String, String>,
    #[serde(default)]
    pub children: Vec<SyntaxNode>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub position: Option<Position>,
    /// Filled in by the type checker
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub resolved_type: Option<Type>,
}

impl SyntaxNode {
    pub fn new(kind: NodeKind) -> Self {
        Self {
            kind,
            attrs: FxHashMap::default(),
            children: Vec::new(),
            position: None,
            resolved_type: None,
        }
    }

    /// Builder: set an attribute
    pub fn with_attr(mut self, key: &str, value: impl Into<String>) -> Self {
        self.attrs.insert(key.to_string(), value.into());
        self
    }

    /// Builder: append a child
    pub fn with_child(mut self, child: SyntaxNode) -> Self {
        self.children.push(child);
        self
    }

    /// Builder: append several children
    pub fn with_children(mut self, children: impl IntoIterator<Item = SyntaxNode>) -> Self {
        self.children.extend(children);
        self
    }

    /// Builder: set the source position
    pub fn at(mut self, line: u32, column: u32) -> Self {
        self.position = Some(Position::new(line, column));
        self
    }

    pub fn attr(&self, key: &str) -> Option<&str> {
        self.attrs.get(key).map(String::as_str)
    }

    /// Boolean attribute; anything other than `"true"` is false
    pub fn flag(&self, key: &str) -> bool {
        self.attr(key) == Some("true")
    }

    /// The `name` attribute, empty when absent
    pub fn name(&self) -> &str {
        self.attr("name").unwrap_or("")
    }

    pub fn child(&self, index: usize) -> Option<&SyntaxNode> {
        self.children.get(index)
    }

    pub fn child_mut(&mut self, index: usize) -> Option<&mut SyntaxNode> {
        self.children.get_mut(index)
    }

    /// Children of a given kind, in order
    pub fn children_of(&self, kind: NodeKind) -> impl Iterator<Item = &SyntaxNode> {
        self.children.iter().filter(move |c| c.kind == kind)
    }

    /// First child of a given kind
    pub fn first_of(&self, kind: NodeKind) -> Option<&SyntaxNode> {
        self.children.iter().find(|c| c.kind == kind)
    }

    /// Type written in the source for a `TypeRef`, or for the declaration
    /// (`VarDecl`, `Param`, `MethodDecl`) that owns one.
    pub fn declared_type(&self) -> Option<Type> {
        if self.kind != NodeKind::TypeRef {
            return self.first_of(NodeKind::TypeRef)?.declared_type();
        }
        let name = self.attr("name")?;
        Some(if self.flag("isVarArgs") {
            Type::varargs_of(name)
        } else if self.flag("isArray") {
            Type::array_of(name)
        } else {
            Type::new(name)
        })
    }

    /// Replace this node with `replacement`, keeping the source position
    pub fn replace_with(&mut self, mut replacement: SyntaxNode) {
        if replacement.position.is_none() {
            replacement.position = self.position;
        }
        *self = replacement;
    }

    /// Visit this node and all descendants in pre-order
    pub fn walk<'a>(&'a self, visit: &mut impl FnMut(&'a SyntaxNode)) {
        visit(self);
        for child in &self.children {
            child.walk(visit);
        }
    }

    /// Parse a tree from its JSON interchange form
    pub fn from_json(json: &str) -> Result<Self, serde_json::Error> {
        serde_json::from_str(json)
    }

    /// Serialize this tree, including resolved types, to JSON
    pub fn to_json(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string_pretty(self)
    }

    /// Indented dump of the tree with attributes and resolved types
    pub fn to_tree_string(&self) -> String {
        let mut output = String::new();
        self.write_tree(&mut output, 0);
        output
    }

    fn write_tree(&self, output: &mut String, depth: usize) {
        use std::fmt::Write;

        let mut attrs: Vec<_> = self.attrs.iter().collect();
        attrs.sort();
        let _ = write!(output, "{:indent$}{}", "", self.kind, indent = depth * 2);
        if !attrs.is_empty() {
            let rendered: Vec<String> = attrs.iter().map(|(k, v)| format!("{}={}", k, v)).collect();
            let _ = write!(output, " ({})", rendered.join(", "));
        }
        if let Some(ty) = &self.resolved_type {
            let _ = write!(output, " : {}", ty);
        }
        output.push('\n');
        for child in &self.children {
            child.write_tree(output, depth + 1);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_operator_symbols() {
        for op in [
            BinaryOp::Add,
            BinaryOp::Sub,
            BinaryOp::Mul,
            BinaryOp::Div,
            BinaryOp::Less,
            BinaryOp::And,
        ] {
            assert_eq!(BinaryOp::from_symbol(op.symbol()), Some(op));
        }
        assert_eq!(BinaryOp::from_symbol("||"), None);
        assert_eq!(BinaryOp::Less.result_type(), Type::boolean());
        assert_eq!(BinaryOp::Less.operand_type(), Type::int());
    }

    #[test]
    fn test_parse_json_tree() {
        let json = r#"{
            "kind": "BinaryExpr",
            "attrs": { "op": "+" },
            "children": [
                { "kind": "IntegerLiteral", "attrs": { "value": "1" }, "position": { "line": 3, "column": 9 } },
                { "kind": "VarRefExpr", "attrs": { "name": "a" } }
            ]
        }"#;
        let node = SyntaxNode::from_json(json).unwrap();
        assert_eq!(node.kind, NodeKind::BinaryExpr);
        assert_eq!(node.attr("op"), Some("+"));
        assert_eq!(node.children.len(), 2);
        assert_eq!(node.children[0].position, Some(Position::new(3, 9)));
        assert_eq!(node.children[1].name(), "a");
        assert!(node.resolved_type.is_none());
    }

    #[test]
    fn test_tree_string_sorts_attributes() {
        let node = SyntaxNode::new(NodeKind::TypeRef)
            .with_attr("name", "int")
            .with_attr("isArray", "true");
        assert_eq!(node.to_tree_string(), "TypeRef (isArray=true, name=int)\n");
    }

    #[test]
    fn test_replace_keeps_position() {
        let mut node = SyntaxNode::new(NodeKind::VarRefExpr).at(2, 4);
        node.replace_with(SyntaxNode::new(NodeKind::IntegerLiteral).with_attr("value", "7"));
        assert_eq!(node.kind, NodeKind::IntegerLiteral);
        assert_eq!(node.position, Some(Position::new(2, 4)));
    }
}
