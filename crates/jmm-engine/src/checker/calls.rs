//! Method call checking
//!
//! Receivers whose class lives outside the unit yield `unknown`. So do
//! calls on a declaring class that has a superclass, since any member may
//! be inherited or overridden. Other calls on the declaring class are
//! matched against the declared signature, including a trailing varargs
//! parameter.

use super::checker::{refine, MethodScope, TypeChecker};
use super::error::CheckError;
use crate::catalog::MethodSignature;
use crate::syntax::{SyntaxNode, Type};

impl TypeChecker<'_> {
    pub(super) fn check_call(&mut self, call: &mut SyntaxNode, scope: MethodScope<'_>) -> Type {
        if !self.has_children(call, 1) {
            return Type::error();
        }
        let receiver = self.check_expr(&mut call.children[0], scope);
        let args: Vec<Type> = call
            .children
            .iter_mut()
            .skip(1)
            .map(|arg| self.check_expr(arg, scope))
            .collect();

        if receiver.is_sentinel() {
            return Type::unknown();
        }

        let catalog = self.catalog;
        let method = call.name().to_string();
        let is_declaring_class = receiver.is_object() && receiver.name == catalog.class_name();

        if receiver.is_object() && !is_declaring_class && catalog.is_imported(&receiver.name) {
            return Type::unknown();
        }

        if is_declaring_class && catalog.superclass().is_some() {
            return Type::unknown();
        }

        if is_declaring_class {
            return match catalog.method(&method) {
                Some(signature) => {
                    self.check_arguments(signature, call, &args);
                    signature.return_type.clone()
                }
                None => {
                    self.errors.push(CheckError::UndeclaredMethod {
                        class: catalog.class_name().to_string(),
                        method,
                        position: call.position,
                    });
                    Type::error()
                }
            };
        }

        self.errors.push(CheckError::InvalidReceiver {
            method,
            ty: receiver,
            position: call.position,
        });
        Type::error()
    }

    /// Match argument types against a declared signature. Only the first
    /// mismatch of a call is reported.
    fn check_arguments(&mut self, signature: &MethodSignature, call: &mut SyntaxNode, args: &[Type]) {
        // Already reported at the declaration.
        if signature.misplaced_varargs().is_some() {
            return;
        }

        let varargs = signature.varargs_param();
        let fixed = signature.params.len() - usize::from(varargs.is_some());
        let count_ok = if varargs.is_some() {
            args.len() >= fixed
        } else {
            args.len() == fixed
        };
        if !count_ok {
            self.errors.push(CheckError::ArgumentCountMismatch {
                method: signature.name.clone(),
                expected: signature.params.len(),
                actual: args.len(),
                position: call.position,
            });
            return;
        }

        let arg_nodes = &mut call.children[1..];
        for ((param, ty), node) in signature.params[..fixed].iter().zip(args).zip(arg_nodes.iter_mut()) {
            if !self.check_argument(node, ty, &param.name, &param.ty) {
                return;
            }
        }

        let Some(varargs) = varargs else {
            return;
        };
        let rest = &args[fixed..];
        // A single array of the element type is passed through as the array.
        if let [only] = rest {
            if only.same_shape(&varargs.ty) {
                return;
            }
        }
        let element = varargs.ty.element();
        for (ty, node) in rest.iter().zip(arg_nodes[fixed..].iter_mut()) {
            if !self.check_argument(node, ty, &varargs.name, &element) {
                return;
            }
        }
    }

    fn check_argument(&mut self, node: &mut SyntaxNode, actual: &Type, param: &str, expected: &Type) -> bool {
        if actual.is_unknown() {
            refine(node, expected);
            return true;
        }
        if self.is_assignable(actual, expected) {
            return true;
        }
        self.errors.push(CheckError::ArgumentTypeMismatch {
            param: param.to_string(),
            expected: expected.clone(),
            actual: actual.clone(),
            position: node.position,
        });
        false
    }
}
