//! Tree to IR Lowering
//!
//! Converts the checked syntax tree into IR. Each expression lowers to the
//! operand holding its value plus the instructions that compute it;
//! statements append those instructions to the method being built.

mod control_flow;
mod expr;
mod stmt;

pub use control_flow::{IfLabels, LabelCounters, WhileLabels};
pub use expr::Lowered;

use crate::catalog::{MethodSignature, SymbolCatalog};
use crate::compiler::error::{CompileError, CompileResult};
use crate::compiler::ir::{ClassIr, IrInstr, Label, MethodIr, Operand, TempId, VarKey};
use crate::syntax::{NodeKind, SyntaxNode, Type};
use tracing::debug;

/// Lower a checked `Program` (or bare `ClassDecl`) tree
pub fn lower_program(root: &SyntaxNode, catalog: &SymbolCatalog) -> CompileResult<ClassIr> {
    Lowerer::new(catalog).lower(root)
}

/// Lowers one compilation unit. Temporary and label counters live here,
/// so numbering is fresh for every run and shared by all its methods.
pub struct Lowerer<'a> {
    catalog: &'a SymbolCatalog,
    /// Next temporary ID
    next_temp: u32,
    labels: LabelCounters,
}

/// Method under construction
pub(crate) struct MethodBuilder<'m> {
    pub(crate) signature: &'m MethodSignature,
    pub(crate) ir: MethodIr,
}

impl MethodBuilder<'_> {
    pub(crate) fn emit(&mut self, instr: IrInstr) {
        self.ir.push(instr);
    }

    pub(crate) fn extend(&mut self, prefix: Vec<IrInstr>) {
        self.ir.instructions.extend(prefix);
    }

    pub(crate) fn place(&mut self, label: &Label) -> CompileResult<()> {
        self.ir.place_label(label.clone())
    }
}

impl<'a> Lowerer<'a> {
    pub fn new(catalog: &'a SymbolCatalog) -> Self {
        Self {
            catalog,
            next_temp: 0,
            labels: LabelCounters::default(),
        }
    }

    pub fn lower(&mut self, root: &SyntaxNode) -> CompileResult<ClassIr> {
        let class = match root.kind {
            NodeKind::ClassDecl => root,
            NodeKind::Program => root
                .first_of(NodeKind::ClassDecl)
                .ok_or_else(|| CompileError::invalid_tree("program has no class declaration"))?,
            other => {
                return Err(CompileError::invalid_tree(format!(
                    "cannot lower a {} node",
                    other
                )))
            }
        };

        let methods = class
            .children_of(NodeKind::MethodDecl)
            .map(|method| self.lower_method(method))
            .collect::<CompileResult<Vec<_>>>()?;

        debug!(
            class = self.catalog.class_name(),
            methods = methods.len(),
            temps = self.next_temp,
            "lowered class"
        );

        Ok(ClassIr {
            name: self.catalog.class_name().to_string(),
            superclass: self.catalog.superclass().map(str::to_string),
            imports: self.catalog.imports().to_vec(),
            fields: self.catalog.fields().to_vec(),
            methods,
        })
    }

    fn lower_method(&mut self, node: &SyntaxNode) -> CompileResult<MethodIr> {
        let signature = MethodSignature::from_decl(node)?;

        let mut ir = MethodIr::new(
            signature.name.clone(),
            signature.is_static,
            signature.params.clone(),
            signature.return_type.clone(),
        );
        if !signature.is_static {
            ir.vars
                .declare(VarKey::This, Type::class(self.catalog.class_name()))?;
        }
        for param in &signature.params {
            ir.vars
                .declare(VarKey::Named(param.name.clone()), param.ty.without_varargs())?;
        }
        for local in &signature.locals {
            // A local shadowing a parameter reuses the parameter's slot
            if signature.param(&local.name).is_some() {
                continue;
            }
            ir.vars.declare(VarKey::Named(local.name.clone()), local.ty.clone())?;
        }

        let mut method = MethodBuilder {
            signature: &signature,
            ir,
        };
        for stmt in node.children.iter().filter(|c| c.kind.is_statement()) {
            self.lower_stmt(stmt, &mut method)?;
        }

        if signature.return_type.is_void() && method.ir.falls_through() {
            method.emit(IrInstr::Return { value: None });
        }

        debug!(
            method = %signature.name,
            instructions = method.ir.instructions.len(),
            vars = method.ir.vars.len(),
            "lowered method"
        );
        Ok(method.ir)
    }

    /// Allocate a fresh temporary of type `ty` in `method`
    pub(crate) fn new_temp(&mut self, ty: Type, method: &mut MethodBuilder<'_>) -> CompileResult<Operand> {
        let id = TempId::new(self.next_temp);
        self.next_temp += 1;
        method.ir.vars.declare(VarKey::Temp(id), ty.clone())?;
        Ok(Operand::temp(id, ty))
    }
}

/// Type the checker resolved for `node`
pub(crate) fn resolved(node: &SyntaxNode) -> CompileResult<Type> {
    node.resolved_type
        .clone()
        .ok_or_else(|| CompileError::lowering(format!("{} node was not type checked", node.kind)))
}

/// Child `index` of `node`, or an invalid-tree error
pub(crate) fn child(node: &SyntaxNode, index: usize) -> CompileResult<&SyntaxNode> {
    node.child(index).ok_or_else(|| {
        CompileError::invalid_tree(format!("{} node is missing child {}", node.kind, index))
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::checker;
    use crate::compiler::ir::{BranchCondition, CallKind, CallTarget, PrettyPrint};
    use crate::syntax::build::*;
    use crate::syntax::BinaryOp;
    use pretty_assertions::assert_eq;

    fn lower_tree(mut tree: SyntaxNode) -> ClassIr {
        let catalog = SymbolCatalog::from_tree(&tree).unwrap();
        let diagnostics = checker::check(&mut tree, &catalog);
        assert!(diagnostics.is_empty(), "{:?}", diagnostics);
        lower_program(&tree, &catalog).unwrap()
    }

    fn single_method(method: SyntaxNode) -> SyntaxNode {
        program(
            vec![import("io")],
            class("A", None, vec![var_decl("f", Type::int())], vec![method]),
        )
    }

    #[test]
    fn test_if_else_layout() {
        let class = lower_tree(single_method(method(
            "max",
            Type::int(),
            vec![param("a", Type::int()), param("b", Type::int())],
            vec![],
            vec![if_else(
                binary("<", var("a"), var("b")),
                ret(var("b")),
                ret(var("a")),
            )],
        )));
        let expected = "\
  method max(a: int, b: int) -> int {
    ; vars: this: A, a: int, b: int
    if (a:int < b:int) goto then_0
  else_0:
    return a:int
  then_0:
    return b:int
  endif_0:
  }
";
        assert_eq!(class.methods[0].pretty_print(), expected);
    }

    #[test]
    fn test_while_layout() {
        let class = lower_tree(single_method(method(
            "count",
            Type::void(),
            vec![],
            vec![var_decl("i", Type::int())],
            vec![
                assign("i", int(0)),
                while_loop(
                    binary("<", var("i"), int(10)),
                    block(vec![assign("i", binary("+", var("i"), int(1)))]),
                ),
            ],
        )));
        let expected = "\
  method count() -> void {
    ; vars: this: A, i: int, tmp0: int
    i:int = 0:int
  whiletest_0:
    if (i:int < 10:int) goto whilebody_0
    goto whileend_0
  whilebody_0:
    tmp0:int = i:int + 1:int
    i:int = tmp0:int
    goto whiletest_0
  whileend_0:
    return
  }
";
        assert_eq!(class.methods[0].pretty_print(), expected);
    }

    #[test]
    fn test_new_then_constructor() {
        let class = lower_tree(single_method(method(
            "make",
            Type::class("A"),
            vec![],
            vec![],
            vec![ret(new_object("A"))],
        )));
        let instrs = &class.methods[0].instructions;
        assert!(matches!(&instrs[0], IrInstr::New { class, .. } if class == "A"));
        match &instrs[1] {
            IrInstr::Call {
                kind,
                method,
                target: CallTarget::Instance(receiver),
                dest: None,
                ..
            } => {
                assert_eq!(*kind, CallKind::Special);
                assert_eq!(method, "<init>");
                assert_eq!(Some(receiver), instrs[0].dest());
            }
            other => panic!("expected constructor call, got {}", other),
        }
    }

    #[test]
    fn test_static_and_virtual_calls() {
        let class = lower_tree(program(
            vec![import("io")],
            class(
                "A",
                None,
                vec![],
                vec![
                    method("g", Type::int(), vec![], vec![], vec![ret(int(1))]),
                    method(
                        "h",
                        Type::void(),
                        vec![],
                        vec![],
                        vec![
                            expr_stmt(call(var("io"), "println", vec![int(3)])),
                            expr_stmt(call(this(), "g", vec![])),
                        ],
                    ),
                ],
            ),
        ));
        let instrs = &class.method("h").unwrap().instructions;
        assert!(matches!(
            &instrs[0],
            IrInstr::Call { kind: CallKind::Static, target: CallTarget::Class(c), dest: None, .. } if c == "io"
        ));
        assert!(matches!(
            &instrs[1],
            IrInstr::Call { kind: CallKind::Virtual, dest: None, signature, .. } if signature.return_type == Type::int()
        ));
        assert!(matches!(instrs[2], IrInstr::Return { value: None }));
    }

    #[test]
    fn test_field_read_and_write() {
        let class = lower_tree(single_method(method(
            "bump",
            Type::void(),
            vec![],
            vec![],
            vec![assign("f", binary("+", var("f"), int(1)))],
        )));
        let text: Vec<String> = class.methods[0]
            .instructions
            .iter()
            .map(ToString::to_string)
            .collect();
        assert_eq!(
            text,
            vec![
                "tmp0:int = getfield this.f:int",
                "tmp1:int = tmp0:int + 1:int",
                "putfield this.f:int = tmp1:int",
                "return",
            ]
        );
    }

    #[test]
    fn test_varargs_are_packed() {
        let class = lower_tree(program(
            vec![],
            class(
                "A",
                None,
                vec![],
                vec![
                    method(
                        "sum",
                        Type::int(),
                        vec![param("xs", Type::varargs_of("int"))],
                        vec![],
                        vec![ret(length(var("xs")))],
                    ),
                    method(
                        "use3",
                        Type::int(),
                        vec![],
                        vec![],
                        vec![ret(call(this(), "sum", vec![int(1), int(2), int(3)]))],
                    ),
                ],
            ),
        ));
        let instrs = &class.method("use3").unwrap().instructions;
        assert!(matches!(&instrs[0], IrInstr::NewArray { size, .. } if *size == Operand::int(3)));
        let stores = instrs
            .iter()
            .filter(|i| matches!(i, IrInstr::ArrayStore { .. }))
            .count();
        assert_eq!(stores, 3);
        let call = instrs.iter().find(|i| matches!(i, IrInstr::Call { .. })).unwrap();
        match call {
            IrInstr::Call { args, signature, .. } => {
                assert_eq!(args.len(), 1);
                assert_eq!(signature.params, vec![Type::array_of("int")]);
            }
            _ => unreachable!(),
        }
    }

    #[test]
    fn test_boolean_condition_branches_on_value() {
        let class = lower_tree(single_method(method(
            "m",
            Type::void(),
            vec![param("c", Type::boolean())],
            vec![],
            vec![if_then(binary("&&", var("c"), not(var("c"))), block(vec![]))],
        )));
        let branch = class.methods[0]
            .instructions
            .iter()
            .find(|i| matches!(i, IrInstr::CondBranch { .. }))
            .unwrap();
        match branch {
            IrInstr::CondBranch {
                cond: BranchCondition::Value(value),
                ..
            } => assert_eq!(value.ty(), Type::boolean()),
            other => panic!("unexpected {}", other),
        }
        assert!(class.methods[0]
            .instructions
            .iter()
            .any(|i| matches!(i, IrInstr::BinaryOp { op: BinaryOp::And, .. })));
    }

    #[test]
    fn test_temps_numbered_across_methods() {
        let class = lower_tree(program(
            vec![],
            class(
                "A",
                None,
                vec![],
                vec![
                    method("a", Type::int(), vec![], vec![], vec![ret(binary("+", int(1), int(2)))]),
                    method("b", Type::int(), vec![], vec![], vec![ret(binary("+", int(3), int(4)))]),
                ],
            ),
        ));
        assert!(class.methods[0].vars.contains(&VarKey::Temp(TempId::new(0))));
        assert!(class.methods[1].vars.contains(&VarKey::Temp(TempId::new(1))));
    }
}
