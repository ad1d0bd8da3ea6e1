//! Tree construction helpers
//!
//! Shorthand constructors used by tests, benchmarks and front ends that
//! build trees in code instead of parsing the JSON interchange form.

use super::node::{NodeKind, SyntaxNode};
use super::types::Type;

pub fn program(imports: Vec<SyntaxNode>, class: SyntaxNode) -> SyntaxNode {
    SyntaxNode::new(NodeKind::Program)
        .with_children(imports)
        .with_child(class)
}

/// `import a.b.C;`
pub fn import(path: &str) -> SyntaxNode {
    SyntaxNode::new(NodeKind::ImportDecl).with_attr("path", path)
}

pub fn class(
    name: &str,
    extends: Option<&str>,
    fields: Vec<SyntaxNode>,
    methods: Vec<SyntaxNode>,
) -> SyntaxNode {
    let mut node = SyntaxNode::new(NodeKind::ClassDecl).with_attr("name", name);
    if let Some(parent) = extends {
        node = node.with_attr("extends", parent);
    }
    node.with_children(fields).with_children(methods)
}

/// Field or local variable declaration
pub fn var_decl(name: &str, ty: Type) -> SyntaxNode {
    SyntaxNode::new(NodeKind::VarDecl)
        .with_attr("name", name)
        .with_child(type_ref(&ty))
}

pub fn param(name: &str, ty: Type) -> SyntaxNode {
    SyntaxNode::new(NodeKind::Param)
        .with_attr("name", name)
        .with_child(type_ref(&ty))
}

pub fn type_ref(ty: &Type) -> SyntaxNode {
    SyntaxNode::new(NodeKind::TypeRef)
        .with_attr("name", ty.name.clone())
        .with_attr("isArray", (ty.is_array && !ty.is_varargs).to_string())
        .with_attr("isVarArgs", ty.is_varargs.to_string())
}

/// Instance method declaration
pub fn method(
    name: &str,
    return_type: Type,
    params: Vec<SyntaxNode>,
    locals: Vec<SyntaxNode>,
    body: Vec<SyntaxNode>,
) -> SyntaxNode {
    method_decl(name, false, return_type, params, locals, body)
}

/// Static method declaration
pub fn static_method(
    name: &str,
    return_type: Type,
    params: Vec<SyntaxNode>,
    locals: Vec<SyntaxNode>,
    body: Vec<SyntaxNode>,
) -> SyntaxNode {
    method_decl(name, true, return_type, params, locals, body)
}

fn method_decl(
    name: &str,
    is_static: bool,
    return_type: Type,
    params: Vec<SyntaxNode>,
    locals: Vec<SyntaxNode>,
    body: Vec<SyntaxNode>,
) -> SyntaxNode {
    SyntaxNode::new(NodeKind::MethodDecl)
        .with_attr("name", name)
        .with_attr("isStatic", is_static.to_string())
        .with_child(type_ref(&return_type))
        .with_children(params)
        .with_children(locals)
        .with_children(body)
}

// ============================================================================
// Statements
// ============================================================================

pub fn block(statements: Vec<SyntaxNode>) -> SyntaxNode {
    SyntaxNode::new(NodeKind::Block).with_children(statements)
}

pub fn if_else(condition: SyntaxNode, then: SyntaxNode, otherwise: SyntaxNode) -> SyntaxNode {
    SyntaxNode::new(NodeKind::IfStmt)
        .with_child(condition)
        .with_child(then)
        .with_child(otherwise)
}

pub fn if_then(condition: SyntaxNode, then: SyntaxNode) -> SyntaxNode {
    SyntaxNode::new(NodeKind::IfStmt)
        .with_child(condition)
        .with_child(then)
}

pub fn while_loop(condition: SyntaxNode, body: SyntaxNode) -> SyntaxNode {
    SyntaxNode::new(NodeKind::WhileStmt)
        .with_child(condition)
        .with_child(body)
}

pub fn assign(name: &str, value: SyntaxNode) -> SyntaxNode {
    SyntaxNode::new(NodeKind::AssignStmt)
        .with_attr("name", name)
        .with_child(value)
}

pub fn array_assign(name: &str, index: SyntaxNode, value: SyntaxNode) -> SyntaxNode {
    SyntaxNode::new(NodeKind::ArrayAssignStmt)
        .with_attr("name", name)
        .with_child(index)
        .with_child(value)
}

/// `this.name = value;`
pub fn field_assign(name: &str, value: SyntaxNode) -> SyntaxNode {
    SyntaxNode::new(NodeKind::FieldAssignStmt)
        .with_attr("name", name)
        .with_child(this())
        .with_child(value)
}

pub fn expr_stmt(expr: SyntaxNode) -> SyntaxNode {
    SyntaxNode::new(NodeKind::ExprStmt).with_child(expr)
}

pub fn ret(value: SyntaxNode) -> SyntaxNode {
    SyntaxNode::new(NodeKind::ReturnStmt).with_child(value)
}

pub fn ret_void() -> SyntaxNode {
    SyntaxNode::new(NodeKind::ReturnStmt)
}

// ============================================================================
// Expressions
// ============================================================================

pub fn int(value: i32) -> SyntaxNode {
    SyntaxNode::new(NodeKind::IntegerLiteral).with_attr("value", value.to_string())
}

pub fn boolean(value: bool) -> SyntaxNode {
    SyntaxNode::new(NodeKind::BooleanLiteral).with_attr("value", value.to_string())
}

pub fn var(name: &str) -> SyntaxNode {
    SyntaxNode::new(NodeKind::VarRefExpr).with_attr("name", name)
}

pub fn this() -> SyntaxNode {
    SyntaxNode::new(NodeKind::ThisExpr)
}

pub fn binary(op: &str, left: SyntaxNode, right: SyntaxNode) -> SyntaxNode {
    SyntaxNode::new(NodeKind::BinaryExpr)
        .with_attr("op", op)
        .with_child(left)
        .with_child(right)
}

pub fn not(operand: SyntaxNode) -> SyntaxNode {
    SyntaxNode::new(NodeKind::NotExpr).with_child(operand)
}

pub fn paren(inner: SyntaxNode) -> SyntaxNode {
    SyntaxNode::new(NodeKind::ParenExpr).with_child(inner)
}

pub fn index(array: SyntaxNode, index: SyntaxNode) -> SyntaxNode {
    SyntaxNode::new(NodeKind::ArrayAccessExpr)
        .with_child(array)
        .with_child(index)
}

pub fn length(array: SyntaxNode) -> SyntaxNode {
    SyntaxNode::new(NodeKind::ArrayLengthExpr).with_child(array)
}

pub fn call(receiver: SyntaxNode, name: &str, args: Vec<SyntaxNode>) -> SyntaxNode {
    SyntaxNode::new(NodeKind::MethodCallExpr)
        .with_attr("name", name)
        .with_child(receiver)
        .with_children(args)
}

/// `this.name`
pub fn field(name: &str) -> SyntaxNode {
    SyntaxNode::new(NodeKind::FieldAccessExpr)
        .with_attr("name", name)
        .with_child(this())
}

pub fn new_object(class: &str) -> SyntaxNode {
    SyntaxNode::new(NodeKind::NewObjectExpr).with_attr("name", class)
}

/// `new int[size]`
pub fn new_int_array(size: SyntaxNode) -> SyntaxNode {
    SyntaxNode::new(NodeKind::NewArrayExpr)
        .with_attr("type", "int")
        .with_child(size)
}

/// `[a, b, c]`
pub fn array_init(elements: Vec<SyntaxNode>) -> SyntaxNode {
    SyntaxNode::new(NodeKind::ArrayInitExpr).with_children(elements)
}
