//! Expression Lowering
//!
//! Converts expressions into an operand and the instruction prefix that
//! computes it. Operands are evaluated left to right; every intermediate
//! result gets a fresh temporary.

use super::{child, resolved, Lowerer, MethodBuilder};
use crate::catalog::Binding;
use crate::compiler::error::{CompileError, CompileResult};
use crate::compiler::ir::{
    BinaryOp, CallKind, CallSignature, CallTarget, IrInstr, Operand, UnaryOp,
};
use crate::syntax::{NodeKind, SyntaxNode, Type};

/// A lowered expression
#[derive(Debug, Clone)]
pub struct Lowered {
    /// Operand holding the expression's value
    pub value: Operand,
    /// Instructions that must run before `value` is available
    pub prefix: Vec<IrInstr>,
}

impl Lowered {
    fn operand(value: Operand) -> Self {
        Self {
            value,
            prefix: Vec::new(),
        }
    }
}

impl Lowerer<'_> {
    pub(crate) fn lower_expr(&mut self, expr: &SyntaxNode, method: &mut MethodBuilder<'_>) -> CompileResult<Lowered> {
        match expr.kind {
            NodeKind::IntegerLiteral => {
                let value = expr
                    .attr("value")
                    .and_then(|v| v.parse::<i32>().ok())
                    .ok_or_else(|| CompileError::invalid_tree("integer literal without a valid value"))?;
                Ok(Lowered::operand(Operand::int(value)))
            }
            NodeKind::BooleanLiteral => Ok(Lowered::operand(Operand::bool(expr.flag("value")))),
            NodeKind::ThisExpr => {
                if method.signature.is_static {
                    return Err(CompileError::lowering("'this' in a static method"));
                }
                Ok(Lowered::operand(Operand::this(self.catalog.class_name())))
            }
            NodeKind::ParenExpr => self.lower_expr(child(expr, 0)?, method),
            NodeKind::VarRefExpr => self.lower_var_ref(expr, method),
            NodeKind::BinaryExpr => self.lower_binary(expr, method),
            NodeKind::NotExpr => {
                let operand = self.lower_expr(child(expr, 0)?, method)?;
                let dest = self.new_temp(Type::boolean(), method)?;
                let mut prefix = operand.prefix;
                prefix.push(IrInstr::UnaryOp {
                    dest: dest.clone(),
                    op: UnaryOp::Not,
                    operand: operand.value,
                });
                Ok(Lowered { value: dest, prefix })
            }
            NodeKind::FieldAccessExpr => self.lower_field_read(expr.name(), method),
            NodeKind::NewObjectExpr => self.lower_new_object(expr, method),
            NodeKind::NewArrayExpr => {
                let size = self.lower_expr(child(expr, 0)?, method)?;
                let element = Type::new(expr.attr("type").unwrap_or(crate::syntax::types::INT));
                let dest = self.new_temp(Type::array_of(element.name.clone()), method)?;
                let mut prefix = size.prefix;
                prefix.push(IrInstr::NewArray {
                    dest: dest.clone(),
                    element,
                    size: size.value,
                });
                Ok(Lowered { value: dest, prefix })
            }
            NodeKind::ArrayInitExpr => {
                let element = resolved(expr)?.element();
                let mut prefix = Vec::new();
                let mut values = Vec::with_capacity(expr.children.len());
                for element_node in &expr.children {
                    let lowered = self.lower_expr(element_node, method)?;
                    prefix.extend(lowered.prefix);
                    values.push(lowered.value);
                }
                let array = self.pack_array(element, values, &mut prefix, method)?;
                Ok(Lowered { value: array, prefix })
            }
            NodeKind::ArrayAccessExpr => {
                let array = self.lower_expr(child(expr, 0)?, method)?;
                let index = self.lower_expr(child(expr, 1)?, method)?;
                let element = match resolved(expr)? {
                    ty if ty.is_sentinel() => array.value.ty().element(),
                    ty => ty,
                };
                let dest = self.new_temp(element, method)?;
                let mut prefix = array.prefix;
                prefix.extend(index.prefix);
                prefix.push(IrInstr::ArrayLoad {
                    dest: dest.clone(),
                    array: array.value,
                    index: index.value,
                });
                Ok(Lowered { value: dest, prefix })
            }
            NodeKind::ArrayLengthExpr => {
                let array = self.lower_expr(child(expr, 0)?, method)?;
                let dest = self.new_temp(Type::int(), method)?;
                let mut prefix = array.prefix;
                prefix.push(IrInstr::ArrayLength {
                    dest: dest.clone(),
                    array: array.value,
                });
                Ok(Lowered { value: dest, prefix })
            }
            NodeKind::MethodCallExpr => {
                let (value, prefix) = self.lower_call(expr, method, true)?;
                let value = value.ok_or_else(|| {
                    CompileError::lowering(format!("void call to {} used as a value", expr.name()))
                })?;
                Ok(Lowered { value, prefix })
            }
            other => Err(CompileError::lowering(format!(
                "{} is not an expression",
                other
            ))),
        }
    }

    fn lower_var_ref(&mut self, expr: &SyntaxNode, method: &mut MethodBuilder<'_>) -> CompileResult<Lowered> {
        let name = expr.name();
        let catalog = self.catalog;
        match catalog.resolve(method.signature, name) {
            Some(Binding::Local(symbol)) | Some(Binding::Param(symbol)) => Ok(Lowered::operand(
                Operand::named(name, symbol.ty.without_varargs()),
            )),
            Some(Binding::Field(_)) => self.lower_field_read(name, method),
            Some(Binding::Class(class)) => Err(CompileError::lowering(format!(
                "class {} used as a value",
                class
            ))),
            None => Err(CompileError::lowering(format!("unresolved variable {}", name))),
        }
    }

    pub(super) fn lower_field_read(&mut self, name: &str, method: &mut MethodBuilder<'_>) -> CompileResult<Lowered> {
        let catalog = self.catalog;
        let field = catalog
            .field(name)
            .ok_or_else(|| CompileError::lowering(format!("unresolved field {}", name)))?;
        if method.signature.is_static {
            return Err(CompileError::lowering(format!("field {} read in a static method", name)));
        }
        let dest = self.new_temp(field.ty.clone(), method)?;
        Ok(Lowered {
            value: dest.clone(),
            prefix: vec![IrInstr::GetField {
                dest,
                field: field.name.clone(),
                ty: field.ty.clone(),
            }],
        })
    }

    fn lower_binary(&mut self, expr: &SyntaxNode, method: &mut MethodBuilder<'_>) -> CompileResult<Lowered> {
        let op = expr
            .attr("op")
            .and_then(BinaryOp::from_symbol)
            .ok_or_else(|| CompileError::invalid_tree("binary expression with an unknown operator"))?;
        let left = self.lower_expr(child(expr, 0)?, method)?;
        let right = self.lower_expr(child(expr, 1)?, method)?;
        let dest = self.new_temp(op.result_type(), method)?;

        let mut prefix = left.prefix;
        prefix.extend(right.prefix);
        prefix.push(IrInstr::BinaryOp {
            dest: dest.clone(),
            op,
            left: left.value,
            right: right.value,
        });
        Ok(Lowered { value: dest, prefix })
    }

    /// `new C()` allocates into a temporary, then runs the constructor on it
    fn lower_new_object(&mut self, expr: &SyntaxNode, method: &mut MethodBuilder<'_>) -> CompileResult<Lowered> {
        let class = expr.name().to_string();
        let dest = self.new_temp(Type::class(class.clone()), method)?;
        let prefix = vec![
            IrInstr::New {
                dest: dest.clone(),
                class,
            },
            IrInstr::Call {
                dest: None,
                kind: CallKind::Special,
                target: CallTarget::Instance(dest.clone()),
                method: "<init>".to_string(),
                args: Vec::new(),
                signature: CallSignature {
                    params: Vec::new(),
                    return_type: Type::void(),
                },
            },
        ];
        Ok(Lowered { value: dest, prefix })
    }

    /// Lower a method call. The receiver is evaluated first, then the
    /// arguments left to right. With `want_value` unset the result is
    /// discarded and no destination is allocated.
    pub(super) fn lower_call(
        &mut self,
        call: &SyntaxNode,
        method: &mut MethodBuilder<'_>,
        want_value: bool,
    ) -> CompileResult<(Option<Operand>, Vec<IrInstr>)> {
        let name = call.name().to_string();
        let receiver = child(call, 0)?;
        let mut prefix = Vec::new();

        let catalog = self.catalog;
        let static_class = match receiver.kind {
            NodeKind::VarRefExpr => match catalog.resolve(method.signature, receiver.name()) {
                Some(Binding::Class(class)) => Some(class.to_string()),
                _ => None,
            },
            _ => None,
        };
        let (kind, target) = match static_class {
            Some(class) => (CallKind::Static, CallTarget::Class(class)),
            None => {
                let lowered = self.lower_expr(receiver, method)?;
                prefix.extend(lowered.prefix);
                (CallKind::Virtual, CallTarget::Instance(lowered.value))
            }
        };

        let mut args = Vec::with_capacity(call.children.len().saturating_sub(1));
        for arg in call.children.iter().skip(1) {
            let lowered = self.lower_expr(arg, method)?;
            prefix.extend(lowered.prefix);
            args.push(lowered.value);
        }

        let receiver_class = match &target {
            CallTarget::Class(class) => Some(class.clone()),
            CallTarget::Instance(operand) => {
                let ty = operand.ty();
                ty.is_object().then_some(ty.name)
            }
        };
        let local = receiver_class
            .filter(|class| class == catalog.class_name())
            .and_then(|_| catalog.method(&name));

        let signature = match local {
            Some(declared) => {
                if let Some(varargs) = declared.varargs_param() {
                    let fixed = declared.params.len() - 1;
                    let passes_array = args.len() == declared.params.len()
                        && args.last().is_some_and(|a| a.ty().same_shape(&varargs.ty));
                    if !passes_array && args.len() >= fixed {
                        let rest = args.split_off(fixed);
                        let array = self.pack_array(varargs.ty.element(), rest, &mut prefix, method)?;
                        args.push(array);
                    }
                }
                CallSignature {
                    params: declared.param_types(),
                    return_type: declared.return_type.clone(),
                }
            }
            None => {
                let mut return_type = resolved(call)?;
                if !want_value && return_type.is_unknown() {
                    return_type = Type::void();
                }
                CallSignature {
                    params: args.iter().map(Operand::ty).collect(),
                    return_type,
                }
            }
        };

        let dest = if want_value && !signature.return_type.is_void() {
            Some(self.new_temp(signature.return_type.clone(), method)?)
        } else {
            None
        };

        prefix.push(IrInstr::Call {
            dest: dest.clone(),
            kind,
            target,
            method: name,
            args,
            signature,
        });
        Ok((dest, prefix))
    }

    /// Allocate an array holding `values` in order
    fn pack_array(
        &mut self,
        element: Type,
        values: Vec<Operand>,
        prefix: &mut Vec<IrInstr>,
        method: &mut MethodBuilder<'_>,
    ) -> CompileResult<Operand> {
        let length = i32::try_from(values.len())
            .map_err(|_| CompileError::lowering("array initializer is too large"))?;
        let array = self.new_temp(Type::array_of(element.name.clone()), method)?;
        prefix.push(IrInstr::NewArray {
            dest: array.clone(),
            element,
            size: Operand::int(length),
        });
        for (index, value) in (0..length).zip(values) {
            prefix.push(IrInstr::ArrayStore {
                array: array.clone(),
                index: Operand::int(index),
                value,
            });
        }
        Ok(array)
    }
}
