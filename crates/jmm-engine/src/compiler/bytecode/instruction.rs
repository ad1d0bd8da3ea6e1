//! JVM instructions
//!
//! The subset of the JVM instruction set the emitter produces, in the
//! form they are written in Jasmin assembly. Labels are pseudo
//! instructions so a method body is a single list.

use super::descriptor::MethodDescriptor;
use crate::compiler::ir::{CallKind, Label};
use std::fmt;

/// A single JVM instruction or label
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum JvmInstr {
    // ===== Constants =====
    /// Push an int constant, written in its shortest form
    IConst(i32),

    // ===== Local Variables =====
    ILoad(u16),
    IStore(u16),
    ALoad(u16),
    AStore(u16),

    // ===== Arithmetic & Logic =====
    IAdd,
    ISub,
    IMul,
    IDiv,
    IAnd,
    IXor,

    // ===== Stack =====
    Pop,

    // ===== Control Flow =====
    /// Jump when the second value is less than the top value
    IfIcmplt(Label),
    /// Jump when the top value is non-zero
    IfNe(Label),
    Goto(Label),
    /// Jump target, occupies no code
    Label(Label),

    // ===== Objects =====
    New(String),
    GetField {
        owner: String,
        name: String,
        descriptor: String,
    },
    PutField {
        owner: String,
        name: String,
        descriptor: String,
    },
    Invoke {
        kind: CallKind,
        owner: String,
        name: String,
        descriptor: MethodDescriptor,
    },

    // ===== Arrays =====
    /// Primitive array allocation (`int`, `boolean`)
    NewArray(&'static str),
    /// Reference array allocation, operand is the element class
    ANewArray(String),
    ArrayLength,
    IALoad,
    BALoad,
    AALoad,
    IAStore,
    BAStore,
    AAStore,

    // ===== Returns =====
    IReturn,
    AReturn,
    Return,
}

impl JvmInstr {
    /// Operand stack effect as `(pops, pushes)`
    pub fn stack_effect(&self) -> (u32, u32) {
        match self {
            JvmInstr::IConst(_) | JvmInstr::ILoad(_) | JvmInstr::ALoad(_) | JvmInstr::New(_) => (0, 1),
            JvmInstr::IStore(_) | JvmInstr::AStore(_) | JvmInstr::Pop => (1, 0),
            JvmInstr::IAdd
            | JvmInstr::ISub
            | JvmInstr::IMul
            | JvmInstr::IDiv
            | JvmInstr::IAnd
            | JvmInstr::IXor => (2, 1),
            JvmInstr::IfIcmplt(_) => (2, 0),
            JvmInstr::IfNe(_) => (1, 0),
            JvmInstr::Goto(_) | JvmInstr::Label(_) | JvmInstr::Return => (0, 0),
            JvmInstr::GetField { .. } => (1, 1),
            JvmInstr::PutField { .. } => (2, 0),
            JvmInstr::Invoke { kind, descriptor, .. } => {
                let receiver = u32::from(*kind != CallKind::Static);
                let args = u32::try_from(descriptor.arg_count()).unwrap_or(u32::MAX);
                (
                    args.saturating_add(receiver),
                    u32::from(descriptor.returns_value()),
                )
            }
            JvmInstr::NewArray(_) | JvmInstr::ANewArray(_) | JvmInstr::ArrayLength => (1, 1),
            JvmInstr::IALoad | JvmInstr::BALoad | JvmInstr::AALoad => (2, 1),
            JvmInstr::IAStore | JvmInstr::BAStore | JvmInstr::AAStore => (3, 0),
            JvmInstr::IReturn | JvmInstr::AReturn => (1, 0),
        }
    }

    /// Label a jump transfers control to
    pub fn jump_target(&self) -> Option<&Label> {
        match self {
            JvmInstr::IfIcmplt(label) | JvmInstr::IfNe(label) | JvmInstr::Goto(label) => Some(label),
            _ => None,
        }
    }

    /// Control never continues to the next instruction
    pub fn is_terminator(&self) -> bool {
        matches!(
            self,
            JvmInstr::Goto(_) | JvmInstr::IReturn | JvmInstr::AReturn | JvmInstr::Return
        )
    }

    /// Local slot read or written by this instruction
    pub fn local_slot(&self) -> Option<u16> {
        match self {
            JvmInstr::ILoad(slot)
            | JvmInstr::IStore(slot)
            | JvmInstr::ALoad(slot)
            | JvmInstr::AStore(slot) => Some(*slot),
            _ => None,
        }
    }
}

fn write_local(f: &mut fmt::Formatter<'_>, mnemonic: &str, slot: u16) -> fmt::Result {
    if slot <= 3 {
        write!(f, "{}_{}", mnemonic, slot)
    } else {
        write!(f, "{} {}", mnemonic, slot)
    }
}

impl fmt::Display for JvmInstr {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            JvmInstr::IConst(-1) => f.write_str("iconst_m1"),
            JvmInstr::IConst(value @ 0..=5) => write!(f, "iconst_{}", value),
            JvmInstr::IConst(value @ -128..=127) => write!(f, "bipush {}", value),
            JvmInstr::IConst(value @ -32768..=32767) => write!(f, "sipush {}", value),
            JvmInstr::IConst(value) => write!(f, "ldc {}", value),
            JvmInstr::ILoad(slot) => write_local(f, "iload", *slot),
            JvmInstr::IStore(slot) => write_local(f, "istore", *slot),
            JvmInstr::ALoad(slot) => write_local(f, "aload", *slot),
            JvmInstr::AStore(slot) => write_local(f, "astore", *slot),
            JvmInstr::IAdd => f.write_str("iadd"),
            JvmInstr::ISub => f.write_str("isub"),
            JvmInstr::IMul => f.write_str("imul"),
            JvmInstr::IDiv => f.write_str("idiv"),
            JvmInstr::IAnd => f.write_str("iand"),
            JvmInstr::IXor => f.write_str("ixor"),
            JvmInstr::Pop => f.write_str("pop"),
            JvmInstr::IfIcmplt(label) => write!(f, "if_icmplt {}", label),
            JvmInstr::IfNe(label) => write!(f, "ifne {}", label),
            JvmInstr::Goto(label) => write!(f, "goto {}", label),
            JvmInstr::Label(label) => write!(f, "{}:", label),
            JvmInstr::New(class) => write!(f, "new {}", class),
            JvmInstr::GetField {
                owner,
                name,
                descriptor,
            } => write!(f, "getfield {}/{} {}", owner, name, descriptor),
            JvmInstr::PutField {
                owner,
                name,
                descriptor,
            } => write!(f, "putfield {}/{} {}", owner, name, descriptor),
            JvmInstr::Invoke {
                kind,
                owner,
                name,
                descriptor,
            } => write!(f, "{} {}/{}{}", kind, owner, name, descriptor),
            JvmInstr::NewArray(element) => write!(f, "newarray {}", element),
            JvmInstr::ANewArray(class) => write!(f, "anewarray {}", class),
            JvmInstr::ArrayLength => f.write_str("arraylength"),
            JvmInstr::IALoad => f.write_str("iaload"),
            JvmInstr::BALoad => f.write_str("baload"),
            JvmInstr::AALoad => f.write_str("aaload"),
            JvmInstr::IAStore => f.write_str("iastore"),
            JvmInstr::BAStore => f.write_str("bastore"),
            JvmInstr::AAStore => f.write_str("aastore"),
            JvmInstr::IReturn => f.write_str("ireturn"),
            JvmInstr::AReturn => f.write_str("areturn"),
            JvmInstr::Return => f.write_str("return"),
        }
    }
}
