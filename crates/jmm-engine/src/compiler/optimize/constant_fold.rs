//! Constant Folding Optimization
//!
//! Propagates literal assignments to locals and parameters and evaluates
//! binary expressions over two literals, rewriting the checked tree in
//! place. Arithmetic wraps like JVM `int`.

use crate::checker::{Diagnostic, Stage};
use crate::compiler::ir::{BinaryOp, Literal};
use crate::syntax::{NodeKind, SyntaxNode, Type};
use rustc_hash::{FxHashMap, FxHashSet};
use tracing::{debug, trace};

/// Constant folding optimizer
pub struct ConstantFolder {
    /// Last literal assigned to each tracked variable
    constants: FxHashMap<String, Literal>,
    /// Parameters and locals of the current method
    tracked: FxHashSet<String>,
    warnings: Vec<Diagnostic>,
    rewrites: usize,
}

impl ConstantFolder {
    /// Create a new constant folder
    pub fn new() -> Self {
        Self {
            constants: FxHashMap::default(),
            tracked: FxHashSet::default(),
            warnings: Vec::new(),
            rewrites: 0,
        }
    }

    /// Run one pass over a `Program` or `ClassDecl`. Returns whether any
    /// node was rewritten.
    pub fn fold(&mut self, root: &mut SyntaxNode) -> bool {
        let before = self.rewrites;
        match root.kind {
            NodeKind::Program => {
                for class in root.children.iter_mut().filter(|c| c.kind == NodeKind::ClassDecl) {
                    self.fold_class(class);
                }
            }
            NodeKind::ClassDecl => self.fold_class(root),
            _ => {}
        }
        let rewritten = self.rewrites - before;
        debug!(rewritten, "constant folding pass finished");
        rewritten > 0
    }

    /// Warnings about expressions left unfolded, without repeats across
    /// passes
    pub fn warnings(&self) -> &[Diagnostic] {
        &self.warnings
    }

    pub fn into_warnings(self) -> Vec<Diagnostic> {
        self.warnings
    }

    fn fold_class(&mut self, class: &mut SyntaxNode) {
        for method in class.children.iter_mut().filter(|c| c.kind == NodeKind::MethodDecl) {
            self.fold_method(method);
        }
    }

    /// Each method starts with an empty constants map
    fn fold_method(&mut self, method: &mut SyntaxNode) {
        self.constants.clear();
        self.tracked = method
            .children
            .iter()
            .filter(|c| matches!(c.kind, NodeKind::Param | NodeKind::VarDecl))
            .map(|c| c.name().to_string())
            .collect();

        for stmt in method.children.iter_mut().filter(|c| c.kind.is_statement()) {
            self.fold_stmt(stmt);
        }
    }

    fn fold_stmt(&mut self, stmt: &mut SyntaxNode) {
        match stmt.kind {
            NodeKind::AssignStmt => {
                let value = stmt.child_mut(0).and_then(|value| self.fold_expr(value));
                let name = stmt.name().to_string();
                if self.tracked.contains(&name) {
                    match value {
                        Some(literal) => {
                            self.constants.insert(name, literal);
                        }
                        None => {
                            self.constants.remove(&name);
                        }
                    }
                }
            }
            NodeKind::IfStmt => {
                // Variables assigned in either arm are unknown after the
                // statement
                let assigned = assigned_names(stmt);
                self.forget(&assigned);
                if let Some(cond) = stmt.child_mut(0) {
                    self.fold_expr(cond);
                }
                let entry = self.constants.clone();
                if let Some(then) = stmt.child_mut(1) {
                    self.fold_stmt(then);
                }
                self.constants = entry.clone();
                if let Some(otherwise) = stmt.child_mut(2) {
                    self.fold_stmt(otherwise);
                }
                self.constants = entry;
            }
            NodeKind::WhileStmt => {
                // The condition and body see values from later iterations
                let assigned = assigned_names(stmt);
                self.forget(&assigned);
                if let Some(cond) = stmt.child_mut(0) {
                    self.fold_expr(cond);
                }
                let entry = self.constants.clone();
                if let Some(body) = stmt.child_mut(1) {
                    self.fold_stmt(body);
                }
                self.constants = entry;
            }
            NodeKind::Block => {
                for inner in &mut stmt.children {
                    self.fold_stmt(inner);
                }
            }
            _ => {
                for child in &mut stmt.children {
                    self.fold_expr(child);
                }
            }
        }
    }

    /// Fold an expression and return its value when it is now a literal
    fn fold_expr(&mut self, expr: &mut SyntaxNode) -> Option<Literal> {
        match expr.kind {
            NodeKind::IntegerLiteral => expr.attr("value")?.parse().ok().map(Literal::Int),
            NodeKind::BooleanLiteral => Some(Literal::Bool(expr.flag("value"))),
            NodeKind::VarRefExpr => {
                let literal = *self.constants.get(expr.name())?;
                trace!(name = expr.name(), value = %literal, "propagated constant");
                self.replace(expr, literal);
                Some(literal)
            }
            NodeKind::ParenExpr => {
                let literal = self.fold_expr(expr.child_mut(0)?)?;
                self.replace(expr, literal);
                Some(literal)
            }
            NodeKind::BinaryExpr => {
                let left = expr.child_mut(0).and_then(|left| self.fold_expr(left));
                let right = expr.child_mut(1).and_then(|right| self.fold_expr(right));
                let op = expr.attr("op").and_then(BinaryOp::from_symbol)?;
                let literal = self.evaluate(expr, op, left?, right?)?;
                trace!(op = %op, value = %literal, "folded binary expression");
                self.replace(expr, literal);
                Some(literal)
            }
            _ => {
                for child in &mut expr.children {
                    self.fold_expr(child);
                }
                None
            }
        }
    }

    fn evaluate(&mut self, expr: &SyntaxNode, op: BinaryOp, left: Literal, right: Literal) -> Option<Literal> {
        match (op, left, right) {
            (BinaryOp::Add, Literal::Int(a), Literal::Int(b)) => Some(Literal::Int(a.wrapping_add(b))),
            (BinaryOp::Sub, Literal::Int(a), Literal::Int(b)) => Some(Literal::Int(a.wrapping_sub(b))),
            (BinaryOp::Mul, Literal::Int(a), Literal::Int(b)) => Some(Literal::Int(a.wrapping_mul(b))),
            (BinaryOp::Div, Literal::Int(_), Literal::Int(0)) => {
                self.warn(expr, "Division by zero is left unfolded");
                None
            }
            (BinaryOp::Div, Literal::Int(a), Literal::Int(b)) => Some(Literal::Int(a.wrapping_div(b))),
            (BinaryOp::Less, Literal::Int(a), Literal::Int(b)) => Some(Literal::Bool(a < b)),
            (BinaryOp::And, Literal::Bool(a), Literal::Bool(b)) => Some(Literal::Bool(a && b)),
            _ => None,
        }
    }

    fn replace(&mut self, node: &mut SyntaxNode, literal: Literal) {
        let (kind, ty) = match literal {
            Literal::Int(_) => (NodeKind::IntegerLiteral, Type::int()),
            Literal::Bool(_) => (NodeKind::BooleanLiteral, Type::boolean()),
        };
        let mut replacement = SyntaxNode::new(kind).with_attr("value", literal.to_string());
        replacement.resolved_type = Some(ty);
        node.replace_with(replacement);
        self.rewrites += 1;
    }

    fn warn(&mut self, expr: &SyntaxNode, message: &str) {
        let warning = Diagnostic::warning(Stage::Optimization, expr.position, message).with_code("W2001");
        if !self.warnings.contains(&warning) {
            self.warnings.push(warning);
        }
    }

    fn forget(&mut self, names: &FxHashSet<String>) {
        for name in names {
            self.constants.remove(name);
        }
    }
}

impl Default for ConstantFolder {
    fn default() -> Self {
        Self::new()
    }
}

/// Names assigned anywhere under `stmt`
fn assigned_names(stmt: &SyntaxNode) -> FxHashSet<String> {
    let mut names = FxHashSet::default();
    stmt.walk(&mut |node| {
        if node.kind == NodeKind::AssignStmt {
            names.insert(node.name().to_string());
        }
    });
    names
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::syntax::build::*;

    fn in_method(locals: Vec<SyntaxNode>, body: Vec<SyntaxNode>) -> SyntaxNode {
        program(
            vec![],
            class(
                "A",
                None,
                vec![var_decl("f", Type::int())],
                vec![method("m", Type::int(), vec![param("p", Type::int())], locals, body)],
            ),
        )
    }

    /// The `index`th statement of the only method
    fn statement(tree: &SyntaxNode, index: usize) -> &SyntaxNode {
        let method = tree.child(0).and_then(|c| c.first_of(NodeKind::MethodDecl)).unwrap();
        method.children.iter().filter(|c| c.kind.is_statement()).nth(index).unwrap()
    }

    #[test]
    fn test_fold_integer_add() {
        let mut tree = in_method(vec![], vec![ret(binary("+", int(1), int(2)))]);
        assert!(ConstantFolder::new().fold(&mut tree));

        let value = statement(&tree, 0).child(0).unwrap();
        assert_eq!(value.kind, NodeKind::IntegerLiteral);
        assert_eq!(value.attr("value"), Some("3"));
        assert_eq!(value.resolved_type, Some(Type::int()));
    }

    #[test]
    fn test_fold_comparison_and_logic() {
        let mut tree = in_method(
            vec![var_decl("b", Type::boolean())],
            vec![
                assign("b", binary("&&", paren(binary("<", int(1), int(2))), boolean(true))),
                ret(int(0)),
            ],
        );
        ConstantFolder::new().fold(&mut tree);
        let value = statement(&tree, 0).child(0).unwrap();
        assert_eq!(value.kind, NodeKind::BooleanLiteral);
        assert_eq!(value.attr("value"), Some("true"));
    }

    #[test]
    fn test_propagates_literal_assignments() {
        let mut tree = in_method(
            vec![var_decl("x", Type::int())],
            vec![assign("x", int(4)), ret(binary("*", var("x"), int(2)))],
        );
        ConstantFolder::new().fold(&mut tree);
        assert_eq!(statement(&tree, 1).child(0).unwrap().attr("value"), Some("8"));
    }

    #[test]
    fn test_non_literal_assignment_invalidates() {
        let mut tree = in_method(
            vec![var_decl("x", Type::int())],
            vec![
                assign("x", int(4)),
                assign("x", var("p")),
                ret(var("x")),
            ],
        );
        ConstantFolder::new().fold(&mut tree);
        assert_eq!(statement(&tree, 2).child(0).unwrap().kind, NodeKind::VarRefExpr);
    }

    #[test]
    fn test_loop_variables_are_not_propagated() {
        let mut tree = in_method(
            vec![var_decl("i", Type::int())],
            vec![
                assign("i", int(0)),
                while_loop(
                    binary("<", var("i"), int(10)),
                    block(vec![assign("i", binary("+", var("i"), int(1)))]),
                ),
                ret(var("i")),
            ],
        );
        ConstantFolder::new().fold(&mut tree);

        let cond = statement(&tree, 1).child(0).unwrap();
        assert_eq!(cond.kind, NodeKind::BinaryExpr);
        assert_eq!(statement(&tree, 2).child(0).unwrap().kind, NodeKind::VarRefExpr);
    }

    #[test]
    fn test_branch_assignments_do_not_leak() {
        let mut tree = in_method(
            vec![var_decl("x", Type::int())],
            vec![
                assign("x", int(1)),
                if_else(
                    binary("<", var("p"), int(0)),
                    assign("x", int(2)),
                    ret(var("x")),
                ),
                ret(var("x")),
            ],
        );
        ConstantFolder::new().fold(&mut tree);

        // Inside the else arm only the value from before the if is known,
        // and x was assigned in the then arm
        let otherwise = statement(&tree, 1).child(2).unwrap();
        assert_eq!(otherwise.child(0).unwrap().kind, NodeKind::VarRefExpr);
        assert_eq!(statement(&tree, 2).child(0).unwrap().kind, NodeKind::VarRefExpr);
    }

    #[test]
    fn test_fields_are_not_tracked() {
        let mut tree = in_method(vec![], vec![assign("f", int(3)), ret(var("f"))]);
        assert!(!ConstantFolder::new().fold(&mut tree));
    }

    #[test]
    fn test_division_by_zero_warns_once() {
        let mut tree = in_method(vec![], vec![ret(binary("/", int(1), int(0)).at(3, 16))]);
        let mut folder = ConstantFolder::new();
        assert!(!folder.fold(&mut tree));
        folder.fold(&mut tree);

        let warnings = folder.into_warnings();
        assert_eq!(warnings.len(), 1);
        assert_eq!(warnings[0].stage, Stage::Optimization);
        assert_eq!(warnings[0].line, Some(3));
        assert_eq!(statement(&tree, 0).child(0).unwrap().kind, NodeKind::BinaryExpr);
    }

    #[test]
    fn test_wrapping_arithmetic() {
        let mut tree = in_method(
            vec![],
            vec![ret(binary("/", int(i32::MIN), binary("-", int(0), int(1))))],
        );
        ConstantFolder::new().fold(&mut tree);
        assert_eq!(
            statement(&tree, 0).child(0).unwrap().attr("value"),
            Some(i32::MIN.to_string().as_str())
        );
    }
}
