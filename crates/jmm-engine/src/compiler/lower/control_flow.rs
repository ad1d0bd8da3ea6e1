//! Control Flow Lowering
//!
//! `if` and `while` become conditional branches over labels:
//!
//! ```text
//!     if (cond) goto then_N          whiletest_N:
//!   else_N:                              if (cond) goto whilebody_N
//!     <else arm>                         goto whileend_N
//!     goto endif_N                   whilebody_N:
//!   then_N:                              <body>
//!     <then arm>                         goto whiletest_N
//!   endif_N:                         whileend_N:
//! ```
//!
//! The jump closing an arm is left out when the arm already ends in a
//! `return`.

use super::{child, Lowerer, MethodBuilder};
use crate::compiler::error::CompileResult;
use crate::compiler::ir::{BinaryOp, BranchCondition, IrInstr, Label};
use crate::syntax::{NodeKind, SyntaxNode};

/// Labels of one `if` statement
#[derive(Debug, Clone)]
pub struct IfLabels {
    pub then: Label,
    pub otherwise: Label,
    pub end: Label,
}

/// Labels of one `while` loop
#[derive(Debug, Clone)]
pub struct WhileLabels {
    pub test: Label,
    pub body: Label,
    pub end: Label,
}

/// Per-kind label counters for one compilation run
#[derive(Debug, Default)]
pub struct LabelCounters {
    next_if: u32,
    next_while: u32,
}

impl LabelCounters {
    pub fn next_if(&mut self) -> IfLabels {
        let n = self.next_if;
        self.next_if += 1;
        IfLabels {
            then: Label::new(format!("then_{}", n)),
            otherwise: Label::new(format!("else_{}", n)),
            end: Label::new(format!("endif_{}", n)),
        }
    }

    pub fn next_while(&mut self) -> WhileLabels {
        let n = self.next_while;
        self.next_while += 1;
        WhileLabels {
            test: Label::new(format!("whiletest_{}", n)),
            body: Label::new(format!("whilebody_{}", n)),
            end: Label::new(format!("whileend_{}", n)),
        }
    }
}

impl Lowerer<'_> {
    pub(super) fn lower_if(&mut self, stmt: &SyntaxNode, method: &mut MethodBuilder<'_>) -> CompileResult<()> {
        let labels = self.labels.next_if();

        self.lower_branch(child(stmt, 0)?, &labels.then, method)?;

        method.place(&labels.otherwise)?;
        if let Some(otherwise) = stmt.child(2) {
            self.lower_stmt(otherwise, method)?;
        }
        if method.ir.falls_through() {
            method.emit(IrInstr::Goto {
                target: labels.end.clone(),
            });
        }

        method.place(&labels.then)?;
        self.lower_stmt(child(stmt, 1)?, method)?;
        method.place(&labels.end)
    }

    pub(super) fn lower_while(&mut self, stmt: &SyntaxNode, method: &mut MethodBuilder<'_>) -> CompileResult<()> {
        let labels = self.labels.next_while();

        method.place(&labels.test)?;
        self.lower_branch(child(stmt, 0)?, &labels.body, method)?;
        method.emit(IrInstr::Goto {
            target: labels.end.clone(),
        });

        method.place(&labels.body)?;
        self.lower_stmt(child(stmt, 1)?, method)?;
        if method.ir.falls_through() {
            method.emit(IrInstr::Goto {
                target: labels.test.clone(),
            });
        }

        method.place(&labels.end)
    }

    /// Emit the instructions of `cond` and a jump to `target` taken when it
    /// holds. A relational test branches on the comparison directly.
    fn lower_branch(&mut self, cond: &SyntaxNode, target: &Label, method: &mut MethodBuilder<'_>) -> CompileResult<()> {
        let cond = strip_parens(cond);

        let condition = match (cond.kind, cond.attr("op").and_then(BinaryOp::from_symbol)) {
            (NodeKind::BinaryExpr, Some(BinaryOp::Less)) => {
                let left = self.lower_expr(child(cond, 0)?, method)?;
                let right = self.lower_expr(child(cond, 1)?, method)?;
                method.extend(left.prefix);
                method.extend(right.prefix);
                BranchCondition::Compare {
                    op: BinaryOp::Less,
                    left: left.value,
                    right: right.value,
                }
            }
            _ => {
                let value = self.lower_expr(cond, method)?;
                method.extend(value.prefix);
                BranchCondition::Value(value.value)
            }
        };

        method.emit(IrInstr::CondBranch {
            cond: condition,
            target: target.clone(),
        });
        Ok(())
    }
}

pub(super) fn strip_parens(mut node: &SyntaxNode) -> &SyntaxNode {
    while node.kind == NodeKind::ParenExpr {
        match node.child(0) {
            Some(inner) => node = inner,
            None => break,
        }
    }
    node
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_label_counters_are_per_kind() {
        let mut counters = LabelCounters::default();
        let first_if = counters.next_if();
        let first_while = counters.next_while();
        let second_if = counters.next_if();

        assert_eq!(first_if.then.as_str(), "then_0");
        assert_eq!(first_if.otherwise.as_str(), "else_0");
        assert_eq!(first_while.test.as_str(), "whiletest_0");
        assert_eq!(second_if.end.as_str(), "endif_1");
    }
}
