//! Statement Lowering
//!
//! Converts statements into IR appended to the current method.

use super::control_flow::strip_parens;
use super::{child, Lowerer, MethodBuilder};
use crate::catalog::Binding;
use crate::compiler::error::{CompileError, CompileResult};
use crate::compiler::ir::{IrInstr, Operand};
use crate::syntax::{NodeKind, SyntaxNode};

impl Lowerer<'_> {
    pub(super) fn lower_stmt(&mut self, stmt: &SyntaxNode, method: &mut MethodBuilder<'_>) -> CompileResult<()> {
        match stmt.kind {
            NodeKind::Block => {
                for inner in &stmt.children {
                    self.lower_stmt(inner, method)?;
                }
                Ok(())
            }
            NodeKind::IfStmt => self.lower_if(stmt, method),
            NodeKind::WhileStmt => self.lower_while(stmt, method),
            NodeKind::AssignStmt => self.lower_assign(stmt, method),
            NodeKind::ArrayAssignStmt => self.lower_array_assign(stmt, method),
            NodeKind::FieldAssignStmt => {
                let value = self.lower_expr(child(stmt, 1)?, method)?;
                method.extend(value.prefix);
                self.store_field(stmt.name(), value.value, method)
            }
            NodeKind::ExprStmt => {
                let expr = strip_parens(child(stmt, 0)?);
                if expr.kind == NodeKind::MethodCallExpr {
                    let (_, prefix) = self.lower_call(expr, method, false)?;
                    method.extend(prefix);
                } else {
                    let lowered = self.lower_expr(expr, method)?;
                    method.extend(lowered.prefix);
                }
                Ok(())
            }
            NodeKind::ReturnStmt => {
                let value = match stmt.child(0) {
                    Some(expr) => {
                        let lowered = self.lower_expr(expr, method)?;
                        method.extend(lowered.prefix);
                        Some(lowered.value)
                    }
                    None => None,
                };
                method.emit(IrInstr::Return { value });
                Ok(())
            }
            other => Err(CompileError::lowering(format!("{} is not a statement", other))),
        }
    }

    fn lower_assign(&mut self, stmt: &SyntaxNode, method: &mut MethodBuilder<'_>) -> CompileResult<()> {
        let value = self.lower_expr(child(stmt, 0)?, method)?;
        method.extend(value.prefix);

        let name = stmt.name();
        let catalog = self.catalog;
        match catalog.resolve(method.signature, name) {
            Some(Binding::Local(symbol)) | Some(Binding::Param(symbol)) => {
                method.emit(IrInstr::Assign {
                    dest: Operand::named(name, symbol.ty.without_varargs()),
                    value: value.value,
                });
                Ok(())
            }
            Some(Binding::Field(_)) => self.store_field(name, value.value, method),
            _ => Err(CompileError::lowering(format!("cannot assign to {}", name))),
        }
    }

    fn lower_array_assign(&mut self, stmt: &SyntaxNode, method: &mut MethodBuilder<'_>) -> CompileResult<()> {
        let name = stmt.name();
        let catalog = self.catalog;
        let array = match catalog.resolve(method.signature, name) {
            Some(Binding::Local(symbol)) | Some(Binding::Param(symbol)) => {
                Operand::named(name, symbol.ty.without_varargs())
            }
            Some(Binding::Field(_)) => {
                let read = self.lower_field_read(name, method)?;
                method.extend(read.prefix);
                read.value
            }
            _ => return Err(CompileError::lowering(format!("cannot index {}", name))),
        };

        let index = self.lower_expr(child(stmt, 0)?, method)?;
        method.extend(index.prefix);
        let value = self.lower_expr(child(stmt, 1)?, method)?;
        method.extend(value.prefix);

        method.emit(IrInstr::ArrayStore {
            array,
            index: index.value,
            value: value.value,
        });
        Ok(())
    }

    fn store_field(&mut self, name: &str, value: Operand, method: &mut MethodBuilder<'_>) -> CompileResult<()> {
        if method.signature.is_static {
            return Err(CompileError::lowering(format!(
                "field {} written in a static method",
                name
            )));
        }
        let field = self
            .catalog
            .field(name)
            .ok_or_else(|| CompileError::lowering(format!("unresolved field {}", name)))?;
        method.emit(IrInstr::PutField {
            field: field.name.clone(),
            ty: field.ty.clone(),
            value,
        });
        Ok(())
    }
}
