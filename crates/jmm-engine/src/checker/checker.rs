//! Type checker
//!
//! Walks the tree once, children before parents, and writes the resolved
//! type of every declaration, statement and expression into the node.
//! Violations are collected; the walk never stops early. Expressions that
//! fail get the `<error>` type, which every later check accepts so a single
//! mistake is reported once.

use super::duplicates;
use super::error::CheckError;
use crate::catalog::{Binding, MethodSignature, SymbolCatalog};
use crate::syntax::{BinaryOp, NodeKind, Position, SyntaxNode, Type};

/// Method being checked, passed down the traversal
#[derive(Clone, Copy)]
pub(super) struct MethodScope<'m> {
    pub(super) signature: &'m MethodSignature,
}

impl MethodScope<'_> {
    fn is_static(&self) -> bool {
        self.signature.is_static
    }

    fn name(&self) -> &str {
        &self.signature.name
    }
}

/// Type checker for one compilation unit
pub struct TypeChecker<'a> {
    pub(super) catalog: &'a SymbolCatalog,
    pub(super) errors: Vec<CheckError>,
}

impl<'a> TypeChecker<'a> {
    pub fn new(catalog: &'a SymbolCatalog) -> Self {
        Self {
            catalog,
            errors: Vec::new(),
        }
    }

    /// Annotate `root` in place and return the violations found, in
    /// traversal order.
    pub fn check(mut self, root: &mut SyntaxNode) -> Vec<CheckError> {
        match root.kind {
            NodeKind::Program => self.check_program(root),
            NodeKind::ClassDecl => self.check_class(root),
            _ => self.malformed(root, "expected a program or class declaration"),
        }
        self.errors
    }

    fn check_program(&mut self, root: &mut SyntaxNode) {
        root.resolved_type = Some(Type::void());
        for child in &mut root.children {
            match child.kind {
                NodeKind::ImportDecl => {
                    let simple = child.attr("path").and_then(|p| p.rsplit('.').next());
                    child.resolved_type = simple.map(Type::class);
                    if child.resolved_type.is_none() {
                        self.malformed(child, "import without a path");
                    }
                }
                NodeKind::ClassDecl => self.check_class(child),
                _ => self.malformed(child, "unexpected node at program level"),
            }
        }
    }

    fn check_class(&mut self, class: &mut SyntaxNode) {
        class.resolved_type = Some(Type::class(self.catalog.class_name()));
        duplicates::check_class_members(class, &mut self.errors);

        for member in &mut class.children {
            match member.kind {
                NodeKind::VarDecl => self.check_declaration(member),
                NodeKind::MethodDecl => self.check_method(member),
                _ => self.malformed(member, "unexpected class member"),
            }
        }
    }

    /// Annotate a field, local or parameter declaration with its type
    fn check_declaration(&mut self, decl: &mut SyntaxNode) {
        let Some(ty) = decl.declared_type() else {
            self.malformed(decl, "declaration without a type");
            return;
        };
        if ty.is_varargs && decl.kind != NodeKind::Param {
            self.errors.push(CheckError::VarargsOutsideParameter {
                name: decl.name().to_string(),
                position: decl.position,
            });
        }
        for type_ref in decl.children.iter_mut() {
            type_ref.resolved_type = Some(ty.clone());
        }
        decl.resolved_type = Some(ty);
    }

    fn check_method(&mut self, method: &mut SyntaxNode) {
        let signature = match MethodSignature::from_decl(method) {
            Ok(signature) => signature,
            Err(err) => {
                self.malformed(method, &err.to_string());
                return;
            }
        };
        method.resolved_type = Some(signature.return_type.clone());
        duplicates::check_method_scope(method, &mut self.errors);

        if let Some(param) = signature.misplaced_varargs() {
            self.errors.push(CheckError::VarargsNotLast {
                method: signature.name.clone(),
                param: param.name.clone(),
                position: method.position,
            });
        }

        let scope = MethodScope {
            signature: &signature,
        };
        for child in &mut method.children {
            match child.kind {
                NodeKind::TypeRef => child.resolved_type = Some(signature.return_type.clone()),
                NodeKind::Param | NodeKind::VarDecl => self.check_declaration(child),
                kind if kind.is_statement() => self.check_statement(child, scope),
                _ => self.malformed(child, "expected a statement"),
            }
        }

        if !signature.return_type.is_void() && !method.children.iter().any(always_returns) {
            self.errors.push(CheckError::MissingReturn {
                method: signature.name.clone(),
                expected: signature.return_type.clone(),
                position: method.position,
            });
        }
    }

    // ========================================================================
    // Statements
    // ========================================================================

    fn check_statement(&mut self, stmt: &mut SyntaxNode, scope: MethodScope<'_>) {
        match stmt.kind {
            NodeKind::Block => {
                for child in &mut stmt.children {
                    self.check_statement(child, scope);
                }
            }
            NodeKind::IfStmt => {
                if self.has_children(stmt, 2) {
                    self.check_condition(&mut stmt.children[0], "If", scope);
                    for branch in stmt.children.iter_mut().skip(1) {
                        self.check_statement(branch, scope);
                    }
                }
            }
            NodeKind::WhileStmt => {
                if self.has_children(stmt, 2) {
                    self.check_condition(&mut stmt.children[0], "While", scope);
                    self.check_statement(&mut stmt.children[1], scope);
                }
            }
            NodeKind::AssignStmt => self.check_assign(stmt, scope),
            NodeKind::ArrayAssignStmt => self.check_array_assign(stmt, scope),
            NodeKind::FieldAssignStmt => self.check_field_assign(stmt, scope),
            NodeKind::ExprStmt => {
                if self.has_children(stmt, 1) {
                    let expr = &mut stmt.children[0];
                    self.check_expr(expr, scope);
                    // A bare external call returns nothing
                    refine(expr, &Type::void());
                }
            }
            NodeKind::ReturnStmt => self.check_return(stmt, scope),
            _ => self.malformed(stmt, "expected a statement"),
        }
        stmt.resolved_type = Some(Type::void());
    }

    fn check_condition(&mut self, cond: &mut SyntaxNode, statement: &'static str, scope: MethodScope<'_>) {
        let ty = self.check_expr(cond, scope);
        if ty.is_unknown() {
            refine(cond, &Type::boolean());
        } else if !ty.is_boolean() && !ty.is_error() {
            self.errors.push(CheckError::ConditionNotBoolean {
                statement,
                actual: ty,
                position: cond.position,
            });
        }
    }

    fn check_assign(&mut self, stmt: &mut SyntaxNode, scope: MethodScope<'_>) {
        if !self.has_children(stmt, 1) {
            return;
        }
        let value_ty = self.check_expr(&mut stmt.children[0], scope);
        if let Some(target) = self.assignment_target(stmt.name(), stmt.position, scope) {
            self.check_assignable(&mut stmt.children[0], &value_ty, &target, stmt.position);
        }
    }

    fn check_array_assign(&mut self, stmt: &mut SyntaxNode, scope: MethodScope<'_>) {
        if !self.has_children(stmt, 2) {
            return;
        }
        let index_ty = self.check_expr(&mut stmt.children[0], scope);
        self.check_index(&mut stmt.children[0], &index_ty);
        let value_ty = self.check_expr(&mut stmt.children[1], scope);

        let Some(target) = self.assignment_target(stmt.name(), stmt.position, scope) else {
            return;
        };
        if target.is_sentinel() {
            return;
        }
        if !target.is_array {
            self.errors.push(CheckError::IndexOnNonArray {
                actual: target,
                position: stmt.position,
            });
            return;
        }
        self.check_assignable(&mut stmt.children[1], &value_ty, &target.element(), stmt.position);
    }

    fn check_field_assign(&mut self, stmt: &mut SyntaxNode, scope: MethodScope<'_>) {
        if !self.has_children(stmt, 2) {
            return;
        }
        let field_ty = self.check_field(stmt, scope);
        let value_ty = self.check_expr(&mut stmt.children[1], scope);
        self.check_assignable(&mut stmt.children[1], &value_ty, &field_ty, stmt.position);
    }

    fn check_return(&mut self, stmt: &mut SyntaxNode, scope: MethodScope<'_>) {
        let expected = scope.signature.return_type.clone();
        let position = stmt.position;

        let Some(value) = stmt.children.first_mut() else {
            if !expected.is_void() {
                self.errors.push(CheckError::ReturnTypeMismatch {
                    method: scope.name().to_string(),
                    expected,
                    actual: Type::void(),
                    position,
                });
            }
            return;
        };

        let actual = self.check_expr(value, scope);
        if expected.is_void() {
            self.errors.push(CheckError::ReturnTypeMismatch {
                method: scope.name().to_string(),
                expected,
                actual,
                position,
            });
        } else if actual.is_unknown() {
            refine(value, &expected);
        } else if !self.is_assignable(&actual, &expected) {
            self.errors.push(CheckError::ReturnTypeMismatch {
                method: scope.name().to_string(),
                expected,
                actual,
                position,
            });
        }
    }

    /// Type of the variable named by an assignment, or `None` after
    /// reporting that it does not exist.
    fn assignment_target(
        &mut self,
        name: &str,
        position: Option<Position>,
        scope: MethodScope<'_>,
    ) -> Option<Type> {
        let catalog = self.catalog;
        match catalog.resolve(scope.signature, name) {
            Some(Binding::Local(symbol)) | Some(Binding::Param(symbol)) => Some(symbol.ty.clone()),
            Some(Binding::Field(symbol)) => {
                if scope.is_static() {
                    self.errors.push(CheckError::FieldInStaticMethod {
                        name: name.to_string(),
                        method: scope.name().to_string(),
                        position,
                    });
                }
                Some(symbol.ty.clone())
            }
            Some(Binding::Class(_)) | None => {
                self.errors.push(CheckError::UndeclaredVariable {
                    name: name.to_string(),
                    position,
                });
                None
            }
        }
    }

    pub(super) fn check_assignable(
        &mut self,
        value: &mut SyntaxNode,
        value_ty: &Type,
        target: &Type,
        position: Option<Position>,
    ) {
        if value_ty.is_unknown() {
            refine(value, target);
        } else if !self.is_assignable(value_ty, target) {
            self.errors.push(CheckError::IncompatibleAssignment {
                target: target.clone(),
                value: value_ty.clone(),
                position,
            });
        }
    }

    /// Whether a value of type `value` may be stored where `target` is
    /// expected.
    pub fn is_assignable(&self, value: &Type, target: &Type) -> bool {
        if value.is_sentinel() || target.is_sentinel() || value.same_shape(target) {
            return true;
        }
        if value.is_array || target.is_array {
            return false;
        }
        if value.name == self.catalog.class_name()
            && self.catalog.superclass() == Some(target.name.as_str())
        {
            return true;
        }
        self.catalog.is_imported(&value.name) && self.catalog.is_imported(&target.name)
    }

    // ========================================================================
    // Expressions
    // ========================================================================

    pub(super) fn check_expr(&mut self, expr: &mut SyntaxNode, scope: MethodScope<'_>) -> Type {
        let ty = match expr.kind {
            NodeKind::IntegerLiteral => {
                let valid = expr.attr("value").is_some_and(|v| v.parse::<i32>().is_ok());
                if !valid {
                    self.invalid_literal(expr);
                }
                Type::int()
            }
            NodeKind::BooleanLiteral => {
                if !matches!(expr.attr("value"), Some("true" | "false")) {
                    self.invalid_literal(expr);
                }
                Type::boolean()
            }
            NodeKind::ThisExpr => {
                self.check_this(expr.position, scope);
                Type::class(self.catalog.class_name())
            }
            NodeKind::VarRefExpr => self.check_var_ref(expr, scope),
            NodeKind::ParenExpr => {
                if self.has_children(expr, 1) {
                    self.check_expr(&mut expr.children[0], scope)
                } else {
                    Type::error()
                }
            }
            NodeKind::NotExpr => self.check_not(expr, scope),
            NodeKind::BinaryExpr => self.check_binary(expr, scope),
            NodeKind::ArrayAccessExpr => self.check_array_access(expr, scope),
            NodeKind::ArrayLengthExpr => {
                if self.has_children(expr, 1) {
                    let array = self.check_expr(&mut expr.children[0], scope);
                    if !array.is_array && !array.is_sentinel() {
                        self.errors.push(CheckError::LengthOnNonArray {
                            actual: array,
                            position: expr.position,
                        });
                    }
                }
                Type::int()
            }
            NodeKind::NewObjectExpr => {
                let name = expr.name();
                if self.catalog.is_known_class(name) {
                    Type::class(name)
                } else {
                    self.errors.push(CheckError::ClassUndeclared {
                        name: name.to_string(),
                        position: expr.position,
                    });
                    Type::error()
                }
            }
            NodeKind::NewArrayExpr => {
                if self.has_children(expr, 1) {
                    let size = self.check_expr(&mut expr.children[0], scope);
                    if size.is_unknown() {
                        refine(&mut expr.children[0], &Type::int());
                    } else if !size.is_int() && !size.is_error() {
                        self.errors.push(CheckError::ArraySizeNotInt {
                            actual: size,
                            position: expr.position,
                        });
                    }
                }
                Type::array_of(expr.attr("type").unwrap_or(crate::syntax::types::INT))
            }
            NodeKind::ArrayInitExpr => self.check_array_init(expr, scope),
            NodeKind::MethodCallExpr => self.check_call(expr, scope),
            NodeKind::FieldAccessExpr => {
                if self.has_children(expr, 1) {
                    self.check_field(expr, scope)
                } else {
                    Type::error()
                }
            }
            _ => {
                self.malformed(expr, "expected an expression");
                Type::error()
            }
        };
        expr.resolved_type = Some(ty.clone());
        ty
    }

    fn check_this(&mut self, position: Option<Position>, scope: MethodScope<'_>) {
        if scope.is_static() {
            self.errors.push(CheckError::ThisInStaticMethod {
                method: scope.name().to_string(),
                position,
            });
        }
    }

    fn check_var_ref(&mut self, expr: &SyntaxNode, scope: MethodScope<'_>) -> Type {
        let catalog = self.catalog;
        match catalog.resolve(scope.signature, expr.name()) {
            Some(Binding::Field(field)) => {
                if scope.is_static() {
                    self.errors.push(CheckError::FieldInStaticMethod {
                        name: field.name.clone(),
                        method: scope.name().to_string(),
                        position: expr.position,
                    });
                }
                field.ty.clone()
            }
            Some(binding) => binding.ty(),
            None => {
                self.errors.push(CheckError::UndeclaredVariable {
                    name: expr.name().to_string(),
                    position: expr.position,
                });
                Type::error()
            }
        }
    }

    fn check_not(&mut self, expr: &mut SyntaxNode, scope: MethodScope<'_>) -> Type {
        if !self.has_children(expr, 1) {
            return Type::error();
        }
        let operand = self.check_expr(&mut expr.children[0], scope);
        if operand.is_unknown() {
            refine(&mut expr.children[0], &Type::boolean());
        } else if !operand.is_boolean() && !operand.is_error() {
            self.errors.push(CheckError::InvalidNotOperand {
                actual: operand,
                position: expr.position,
            });
        }
        Type::boolean()
    }

    fn check_binary(&mut self, expr: &mut SyntaxNode, scope: MethodScope<'_>) -> Type {
        if !self.has_children(expr, 2) {
            return Type::error();
        }
        let left = self.check_expr(&mut expr.children[0], scope);
        let right = self.check_expr(&mut expr.children[1], scope);

        let symbol = expr.attr("op").unwrap_or_default().to_string();
        let Some(op) = BinaryOp::from_symbol(&symbol) else {
            self.errors.push(CheckError::UnknownOperator {
                op: symbol,
                position: expr.position,
            });
            return Type::error();
        };

        let expected = op.operand_type();
        for (operand, ty) in expr.children.iter_mut().zip([&left, &right]) {
            if ty.is_unknown() {
                refine(operand, &expected);
            }
        }

        let fits = |ty: &Type| ty.is_sentinel() || ty.same_shape(&expected);
        if fits(&left) && fits(&right) {
            op.result_type()
        } else {
            self.errors.push(CheckError::InvalidBinaryOperands {
                op: op.symbol().to_string(),
                expected,
                left,
                right,
                position: expr.position,
            });
            Type::error()
        }
    }

    fn check_array_access(&mut self, expr: &mut SyntaxNode, scope: MethodScope<'_>) -> Type {
        if !self.has_children(expr, 2) {
            return Type::error();
        }
        let array = self.check_expr(&mut expr.children[0], scope);
        let index = self.check_expr(&mut expr.children[1], scope);
        self.check_index(&mut expr.children[1], &index);

        if array.is_array {
            array.element()
        } else if array.is_sentinel() {
            array
        } else {
            self.errors.push(CheckError::IndexOnNonArray {
                actual: array,
                position: expr.position,
            });
            Type::error()
        }
    }

    fn check_index(&mut self, index: &mut SyntaxNode, ty: &Type) {
        if ty.is_unknown() {
            refine(index, &Type::int());
        } else if !ty.is_int() && !ty.is_error() {
            self.errors.push(CheckError::ArrayIndexNotInt {
                actual: ty.clone(),
                position: index.position,
            });
        }
    }

    fn check_array_init(&mut self, expr: &mut SyntaxNode, scope: MethodScope<'_>) -> Type {
        let types: Vec<Type> = expr
            .children
            .iter_mut()
            .map(|element| self.check_expr(element, scope))
            .collect();

        let element = types
            .iter()
            .find(|ty| !ty.is_sentinel())
            .cloned()
            .unwrap_or_else(Type::int);

        let mut reported = false;
        for (node, ty) in expr.children.iter_mut().zip(&types) {
            if ty.is_unknown() {
                refine(node, &element);
            } else if !ty.is_error() && !ty.same_shape(&element) && !reported {
                self.errors.push(CheckError::MixedArrayElements {
                    first: element.clone(),
                    other: ty.clone(),
                    position: node.position.or(expr.position),
                });
                reported = true;
            }
        }

        Type::array_of(element.name)
    }

    /// Field named by a `FieldAccessExpr` or `FieldAssignStmt`; the first
    /// child is the receiver and must be `this`.
    fn check_field(&mut self, node: &mut SyntaxNode, scope: MethodScope<'_>) -> Type {
        let name = node.name().to_string();
        let receiver = &mut node.children[0];
        if receiver.kind != NodeKind::ThisExpr {
            self.check_expr(receiver, scope);
            self.errors.push(CheckError::FieldAccessRequiresThis {
                name,
                position: node.position,
            });
            return Type::error();
        }
        self.check_expr(receiver, scope);

        match self.catalog.field(&name) {
            Some(field) => field.ty.clone(),
            None => {
                self.errors.push(CheckError::UndeclaredField {
                    class: self.catalog.class_name().to_string(),
                    name,
                    position: node.position,
                });
                Type::error()
            }
        }
    }

    // ========================================================================
    // Helpers
    // ========================================================================

    pub(super) fn has_children(&mut self, node: &SyntaxNode, count: usize) -> bool {
        if node.children.len() >= count {
            return true;
        }
        self.malformed(
            node,
            &format!("expected {} children, found {}", count, node.children.len()),
        );
        false
    }

    fn malformed(&mut self, node: &SyntaxNode, message: &str) {
        self.errors.push(CheckError::MalformedNode {
            kind: node.kind.to_string(),
            message: message.to_string(),
            position: node.position,
        });
    }

    fn invalid_literal(&mut self, expr: &SyntaxNode) {
        self.errors.push(CheckError::InvalidLiteral {
            value: expr.attr("value").unwrap_or_default().to_string(),
            position: expr.position,
        });
    }
}

/// Give an `unknown` expression the type its context demands.
pub(super) fn refine(node: &mut SyntaxNode, ty: &Type) {
    if !node.resolved_type.as_ref().is_some_and(Type::is_unknown) {
        return;
    }
    node.resolved_type = Some(ty.clone());
    match node.kind {
        NodeKind::ParenExpr => {
            if let Some(inner) = node.children.first_mut() {
                refine(inner, ty);
            }
        }
        NodeKind::ArrayAccessExpr => {
            if let Some(array) = node.children.first_mut() {
                refine(array, &Type::array_of(ty.name.clone()));
            }
        }
        _ => {}
    }
}

/// Whether every path through `stmt` ends in a `return`. Loop bodies never
/// count since the loop exit stays reachable.
fn always_returns(stmt: &SyntaxNode) -> bool {
    match stmt.kind {
        NodeKind::ReturnStmt => true,
        NodeKind::Block => stmt.children.iter().any(always_returns),
        NodeKind::IfStmt => match (stmt.child(1), stmt.child(2)) {
            (Some(then), Some(otherwise)) => always_returns(then) && always_returns(otherwise),
            _ => false,
        },
        _ => false,
    }
}
