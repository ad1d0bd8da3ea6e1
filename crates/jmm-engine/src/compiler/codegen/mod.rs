//! Bytecode Emission
//!
//! Translates a lowered class into JVM instructions. Every IR variable
//! lives in a local slot; an instruction loads its operands, computes,
//! and stores into its destination's slot. Stack limits come from the
//! depth tracked while emitting.

mod context;

use crate::compiler::bytecode::{
    field_descriptor, BytecodeClass, BytecodeField, BytecodeMethod, ImportTable, JvmInstr,
    MethodDescriptor, OBJECT_CLASS,
};
use crate::compiler::error::{CompileError, CompileResult};
use crate::compiler::ir::{
    BinaryOp, BranchCondition, CallKind, CallTarget, ClassIr, IrInstr, Label, MethodIr, Operand,
    UnaryOp, VarKey,
};
use crate::syntax::{types, Type};
use context::MethodContext;
use rustc_hash::FxHashSet;
use tracing::debug;

/// Emit bytecode for a lowered class
pub fn emit_class(class: &ClassIr) -> CompileResult<BytecodeClass> {
    BytecodeEmitter::new(class).emit()
}

/// Emits one class. Labels materializing comparisons are numbered per
/// emitter.
pub struct BytecodeEmitter<'a> {
    class: &'a ClassIr,
    imports: ImportTable,
    next_compare: u32,
}

impl<'a> BytecodeEmitter<'a> {
    pub fn new(class: &'a ClassIr) -> Self {
        Self {
            class,
            imports: ImportTable::new(&class.imports),
            next_compare: 0,
        }
    }

    pub fn emit(mut self) -> CompileResult<BytecodeClass> {
        let superclass = self.superclass();
        let fields = self
            .class
            .fields
            .iter()
            .map(|field| BytecodeField {
                name: field.name.clone(),
                descriptor: field_descriptor(&field.ty, &self.imports),
            })
            .collect();

        let mut methods = vec![self.emit_constructor(&superclass)?];
        for method in &self.class.methods {
            methods.push(self.emit_method(method)?);
        }

        Ok(BytecodeClass {
            name: self.class.name.clone(),
            superclass,
            fields,
            methods,
        })
    }

    fn superclass(&self) -> String {
        match &self.class.superclass {
            Some(name) => self.imports.internal_name(name),
            None => OBJECT_CLASS.to_string(),
        }
    }

    /// `public <init>()V` chaining to the superclass constructor
    fn emit_constructor(&self, superclass: &str) -> CompileResult<BytecodeMethod> {
        let mut ctx = MethodContext::new("<init>", [VarKey::This], FxHashSet::default())?;
        ctx.emit(JvmInstr::ALoad(0))?;
        ctx.emit(JvmInstr::Invoke {
            kind: CallKind::Special,
            owner: superclass.to_string(),
            name: "<init>".to_string(),
            descriptor: MethodDescriptor::void(),
        })?;
        ctx.emit(JvmInstr::Return)?;
        let (code, max_stack, max_locals) = ctx.finish()?;
        Ok(BytecodeMethod {
            name: "<init>".to_string(),
            is_static: false,
            descriptor: MethodDescriptor::void(),
            code,
            max_stack,
            max_locals,
        })
    }

    fn emit_method(&mut self, method: &MethodIr) -> CompileResult<BytecodeMethod> {
        let mut ctx = MethodContext::for_method(method)?;

        for (index, instr) in method.instructions.iter().enumerate() {
            for label in method.labels_at(index) {
                ctx.place(label.clone())?;
            }
            self.emit_instr(&mut ctx, method, instr)?;
        }
        for label in method.labels_at(method.instructions.len()) {
            ctx.place(label.clone())?;
        }

        let params: Vec<Type> = method.params.iter().map(|p| p.ty.clone()).collect();
        let descriptor = MethodDescriptor::new(&params, &method.return_type, &self.imports);
        let (code, max_stack, max_locals) = ctx.finish()?;
        debug!(
            method = %method.name,
            instructions = code.len(),
            max_stack,
            max_locals,
            "emitted method"
        );

        Ok(BytecodeMethod {
            name: method.name.clone(),
            is_static: method.is_static,
            descriptor,
            code,
            max_stack,
            max_locals,
        })
    }

    fn emit_instr(&mut self, ctx: &mut MethodContext, method: &MethodIr, instr: &IrInstr) -> CompileResult<()> {
        match instr {
            IrInstr::Assign { dest, value } => {
                self.load(ctx, value)?;
                self.store(ctx, dest)
            }
            IrInstr::BinaryOp {
                dest,
                op,
                left,
                right,
            } => {
                self.load(ctx, left)?;
                self.load(ctx, right)?;
                match op {
                    BinaryOp::Add => ctx.emit(JvmInstr::IAdd)?,
                    BinaryOp::Sub => ctx.emit(JvmInstr::ISub)?,
                    BinaryOp::Mul => ctx.emit(JvmInstr::IMul)?,
                    BinaryOp::Div => ctx.emit(JvmInstr::IDiv)?,
                    BinaryOp::And => ctx.emit(JvmInstr::IAnd)?,
                    BinaryOp::Less => self.materialize_less(ctx)?,
                }
                self.store(ctx, dest)
            }
            IrInstr::UnaryOp {
                dest,
                op: UnaryOp::Not,
                operand,
            } => {
                self.load(ctx, operand)?;
                ctx.emit(JvmInstr::IConst(1))?;
                ctx.emit(JvmInstr::IXor)?;
                self.store(ctx, dest)
            }
            IrInstr::Call {
                dest,
                kind,
                target,
                method: name,
                args,
                signature,
            } => {
                let owner = match target {
                    CallTarget::Class(class) => self.imports.internal_name(class),
                    CallTarget::Instance(receiver) => {
                        if *kind != CallKind::Static {
                            self.load(ctx, receiver)?;
                        }
                        self.class_of(&receiver.ty())
                    }
                };
                for arg in args {
                    self.load(ctx, arg)?;
                }
                let descriptor = MethodDescriptor::new(&signature.params, &signature.return_type, &self.imports);
                let returns_value = descriptor.returns_value();
                ctx.emit(JvmInstr::Invoke {
                    kind: *kind,
                    owner,
                    name: name.clone(),
                    descriptor,
                })?;
                match dest {
                    Some(dest) => self.store(ctx, dest),
                    None if returns_value => ctx.emit(JvmInstr::Pop),
                    None => Ok(()),
                }
            }
            IrInstr::GetField { dest, field, ty } => {
                self.load_this(ctx)?;
                ctx.emit(JvmInstr::GetField {
                    owner: self.class.name.clone(),
                    name: field.clone(),
                    descriptor: field_descriptor(ty, &self.imports),
                })?;
                self.store(ctx, dest)
            }
            IrInstr::PutField { field, ty, value } => {
                self.load_this(ctx)?;
                self.load(ctx, value)?;
                ctx.emit(JvmInstr::PutField {
                    owner: self.class.name.clone(),
                    name: field.clone(),
                    descriptor: field_descriptor(ty, &self.imports),
                })
            }
            IrInstr::New { dest, class } => {
                ctx.emit(JvmInstr::New(self.imports.internal_name(class)))?;
                self.store(ctx, dest)
            }
            IrInstr::NewArray { dest, element, size } => {
                self.load(ctx, size)?;
                let alloc = match element.name.as_str() {
                    types::INT => JvmInstr::NewArray(types::INT),
                    types::BOOLEAN => JvmInstr::NewArray(types::BOOLEAN),
                    _ => JvmInstr::ANewArray(self.class_of(element)),
                };
                ctx.emit(alloc)?;
                self.store(ctx, dest)
            }
            IrInstr::ArrayLength { dest, array } => {
                self.load(ctx, array)?;
                ctx.emit(JvmInstr::ArrayLength)?;
                self.store(ctx, dest)
            }
            IrInstr::ArrayLoad { dest, array, index } => {
                self.load(ctx, array)?;
                self.load(ctx, index)?;
                let load = match array.ty().name.as_str() {
                    types::INT => JvmInstr::IALoad,
                    types::BOOLEAN => JvmInstr::BALoad,
                    _ => JvmInstr::AALoad,
                };
                ctx.emit(load)?;
                self.store(ctx, dest)
            }
            IrInstr::ArrayStore { array, index, value } => {
                self.load(ctx, array)?;
                self.load(ctx, index)?;
                self.load(ctx, value)?;
                let store = match array.ty().name.as_str() {
                    types::INT => JvmInstr::IAStore,
                    types::BOOLEAN => JvmInstr::BAStore,
                    _ => JvmInstr::AAStore,
                };
                ctx.emit(store)
            }
            IrInstr::Return { value: None } => ctx.emit(JvmInstr::Return),
            IrInstr::Return { value: Some(value) } => {
                self.load(ctx, value)?;
                if method.return_type.is_int_family() {
                    ctx.emit(JvmInstr::IReturn)
                } else {
                    ctx.emit(JvmInstr::AReturn)
                }
            }
            IrInstr::Goto { target } => ctx.emit(JvmInstr::Goto(target.clone())),
            IrInstr::CondBranch { cond, target } => match cond {
                BranchCondition::Compare {
                    op: BinaryOp::Less,
                    left,
                    right,
                } => {
                    self.load(ctx, left)?;
                    self.load(ctx, right)?;
                    ctx.emit(JvmInstr::IfIcmplt(target.clone()))
                }
                BranchCondition::Compare { op, .. } => Err(CompileError::consistency(format!(
                    "no conditional jump for '{}'",
                    op
                ))),
                BranchCondition::Value(value) => {
                    self.load(ctx, value)?;
                    ctx.emit(JvmInstr::IfNe(target.clone()))
                }
            },
        }
    }

    /// Turn the two ints on the stack into 0 or 1
    fn materialize_less(&mut self, ctx: &mut MethodContext) -> CompileResult<()> {
        let n = self.next_compare;
        self.next_compare += 1;
        let when_true = Label::new(format!("cmp_true_{}", n));
        let end = Label::new(format!("cmp_end_{}", n));

        ctx.emit(JvmInstr::IfIcmplt(when_true.clone()))?;
        ctx.emit(JvmInstr::IConst(0))?;
        ctx.emit(JvmInstr::Goto(end.clone()))?;
        ctx.place(when_true)?;
        ctx.emit(JvmInstr::IConst(1))?;
        ctx.place(end)
    }

    fn load(&self, ctx: &mut MethodContext, operand: &Operand) -> CompileResult<()> {
        match operand {
            Operand::Literal(literal) => ctx.emit(JvmInstr::IConst(literal.as_i32())),
            Operand::Temp { ty, .. } | Operand::Var { ty, .. } => {
                let slot = self.slot_of(ctx, operand)?;
                if is_int_slot(ty) {
                    ctx.emit(JvmInstr::ILoad(slot))
                } else {
                    ctx.emit(JvmInstr::ALoad(slot))
                }
            }
        }
    }

    fn store(&self, ctx: &mut MethodContext, dest: &Operand) -> CompileResult<()> {
        let slot = self.slot_of(ctx, dest)?;
        if is_int_slot(&dest.ty()) {
            ctx.emit(JvmInstr::IStore(slot))
        } else {
            ctx.emit(JvmInstr::AStore(slot))
        }
    }

    fn load_this(&self, ctx: &mut MethodContext) -> CompileResult<()> {
        let slot = ctx.slot(&VarKey::This)?;
        ctx.emit(JvmInstr::ALoad(slot))
    }

    fn slot_of(&self, ctx: &MethodContext, operand: &Operand) -> CompileResult<u16> {
        let key = operand
            .key()
            .ok_or_else(|| CompileError::consistency(format!("literal {} used as a variable", operand)))?;
        ctx.slot(&key)
    }

    /// Internal class name of an object type
    fn class_of(&self, ty: &Type) -> String {
        if ty.is_sentinel() {
            OBJECT_CLASS.to_string()
        } else {
            self.imports.internal_name(&ty.name)
        }
    }
}

/// Scalars use the int instructions, everything else is a reference
fn is_int_slot(ty: &Type) -> bool {
    !ty.is_array && !ty.is_varargs && ty.is_int_family()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::catalog::SymbolCatalog;
    use crate::checker;
    use crate::compiler::bytecode::verify_class;
    use crate::compiler::lower::lower_program;
    use crate::syntax::build::*;
    use crate::syntax::SyntaxNode;
    use pretty_assertions::assert_eq;

    fn emit_tree(mut tree: SyntaxNode) -> BytecodeClass {
        let catalog = SymbolCatalog::from_tree(&tree).unwrap();
        let diagnostics = checker::check(&mut tree, &catalog);
        assert!(diagnostics.is_empty(), "{:?}", diagnostics);
        let ir = lower_program(&tree, &catalog).unwrap();
        let class = emit_class(&ir).unwrap();
        verify_class(&class).unwrap();
        class
    }

    fn with_methods(extends: Option<&str>, methods: Vec<SyntaxNode>) -> SyntaxNode {
        program(
            vec![import("io"), import("lib.Base")],
            class("A", extends, vec![var_decl("f", Type::int())], methods),
        )
    }

    fn lines(method: &BytecodeMethod) -> Vec<String> {
        method.code.iter().map(ToString::to_string).collect()
    }

    fn max_method() -> SyntaxNode {
        method(
            "max",
            Type::int(),
            vec![param("a", Type::int()), param("b", Type::int())],
            vec![],
            vec![if_else(
                binary("<", var("a"), var("b")),
                ret(var("b")),
                ret(var("a")),
            )],
        )
    }

    #[test]
    fn test_if_else_method() {
        let class = emit_tree(with_methods(None, vec![max_method()]));
        let expected = "\
.method public max(II)I
    .limit stack 2
    .limit locals 3
    iload_1
    iload_2
    if_icmplt then_0
  else_0:
    iload_1
    ireturn
  then_0:
    iload_2
    ireturn
  endif_0:
.end method
";
        assert_eq!(class.method("max").unwrap().to_string(), expected);
    }

    #[test]
    fn test_default_constructor_and_header() {
        let class = emit_tree(with_methods(None, vec![max_method()]));
        let text = class.to_jasmin();
        assert!(text.starts_with(".class public A\n.super java/lang/Object\n\n.field public f I\n"));

        let init = class.method("<init>").unwrap();
        assert_eq!(
            lines(init),
            vec!["aload_0", "invokespecial java/lang/Object/<init>()V", "return"]
        );
        assert_eq!((init.max_stack, init.max_locals), (1, 1));
    }

    #[test]
    fn test_imported_superclass() {
        let class = emit_tree(with_methods(Some("Base"), vec![max_method()]));
        assert_eq!(class.superclass, "lib/Base");
        assert_eq!(
            lines(class.method("<init>").unwrap())[1],
            "invokespecial lib/Base/<init>()V"
        );
    }

    #[test]
    fn test_field_read_and_write() {
        let class = emit_tree(with_methods(
            None,
            vec![method(
                "bump",
                Type::void(),
                vec![],
                vec![],
                vec![assign("f", binary("+", var("f"), int(1)))],
            )],
        ));
        assert_eq!(
            lines(class.method("bump").unwrap()),
            vec![
                "aload_0",
                "getfield A/f I",
                "istore_1",
                "iload_1",
                "iconst_1",
                "iadd",
                "istore_2",
                "aload_0",
                "iload_2",
                "putfield A/f I",
                "return",
            ]
        );
    }

    #[test]
    fn test_static_and_virtual_calls() {
        let class = emit_tree(with_methods(
            None,
            vec![
                max_method(),
                method(
                    "run",
                    Type::void(),
                    vec![param("x", Type::int())],
                    vec![],
                    vec![
                        expr_stmt(call(var("io"), "println", vec![var("x")])),
                        expr_stmt(call(this(), "max", vec![var("x"), int(2)])),
                    ],
                ),
            ],
        ));
        let run = class.method("run").unwrap();
        assert_eq!(
            lines(run),
            vec![
                "iload_1",
                "invokestatic io/println(I)V",
                "aload_0",
                "iload_1",
                "iconst_2",
                "invokevirtual A/max(II)I",
                "pop",
                "return",
            ]
        );
        assert_eq!(run.max_stack, 3);
    }

    #[test]
    fn test_less_than_as_value() {
        let class = emit_tree(with_methods(
            None,
            vec![method(
                "lt",
                Type::boolean(),
                vec![param("a", Type::int()), param("b", Type::int())],
                vec![var_decl("r", Type::boolean())],
                vec![assign("r", binary("<", var("a"), var("b"))), ret(var("r"))],
            )],
        ));
        let lt = class.method("lt").unwrap();
        assert_eq!(
            lines(lt),
            vec![
                "iload_1",
                "iload_2",
                "if_icmplt cmp_true_0",
                "iconst_0",
                "goto cmp_end_0",
                "cmp_true_0:",
                "iconst_1",
                "cmp_end_0:",
                "istore 4",
                "iload 4",
                "istore_3",
                "iload_3",
                "ireturn",
            ]
        );
        assert_eq!((lt.max_stack, lt.max_locals), (2, 5));
    }

    #[test]
    fn test_new_object_and_not() {
        let class = emit_tree(with_methods(
            None,
            vec![static_method(
                "make",
                Type::class("A"),
                vec![param("flag", Type::boolean())],
                vec![var_decl("a", Type::class("A"))],
                vec![
                    assign("flag", not(var("flag"))),
                    assign("a", new_object("A")),
                    ret(var("a")),
                ],
            )],
        ));
        let make = class.method("make").unwrap();
        assert!(make.is_static);
        assert_eq!(make.descriptor.to_string(), "(Z)LA;");
        assert_eq!(
            lines(make),
            vec![
                "iload_0",
                "iconst_1",
                "ixor",
                "istore_2",
                "iload_2",
                "istore_0",
                "new A",
                "astore_3",
                "aload_3",
                "invokespecial A/<init>()V",
                "aload_3",
                "astore_1",
                "aload_1",
                "areturn",
            ]
        );
    }

    #[test]
    fn test_int_arrays() {
        let class = emit_tree(with_methods(
            None,
            vec![method(
                "first",
                Type::int(),
                vec![],
                vec![var_decl("xs", Type::array_of("int"))],
                vec![
                    assign("xs", new_int_array(int(3))),
                    array_assign("xs", int(0), int(7)),
                    ret(binary("+", index(var("xs"), int(0)), length(var("xs")))),
                ],
            )],
        ));
        let first = lines(class.method("first").unwrap());
        assert!(first.contains(&"newarray int".to_string()));
        assert!(first.contains(&"iastore".to_string()));
        assert!(first.contains(&"iaload".to_string()));
        assert!(first.contains(&"arraylength".to_string()));
        assert_eq!(first.last().map(String::as_str), Some("ireturn"));
    }
}
