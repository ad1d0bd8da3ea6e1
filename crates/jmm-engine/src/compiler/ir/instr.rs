//! IR Instructions
//!
//! Three-address instructions over temporaries, named variables and
//! literals. Control flow is expressed with labels placed between
//! instructions and the `Goto`/`CondBranch` jumps that target them.

use super::value::{Label, Operand};
use crate::syntax::Type;
use std::fmt;

pub use crate::syntax::BinaryOp;

/// Unary operators
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum UnaryOp {
    /// Logical negation (`!`)
    Not,
}

impl fmt::Display for UnaryOp {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            UnaryOp::Not => f.write_str("!"),
        }
    }
}

/// How a method is dispatched
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum CallKind {
    /// Constructors
    Special,
    /// Class-qualified calls without a receiver instance
    Static,
    /// Dispatch on the receiver's runtime class
    Virtual,
}

impl fmt::Display for CallKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            CallKind::Special => "invokespecial",
            CallKind::Static => "invokestatic",
            CallKind::Virtual => "invokevirtual",
        })
    }
}

/// Receiver of a call
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CallTarget {
    /// A class name, for static calls
    Class(String),
    /// An object, for virtual and special calls
    Instance(Operand),
}

impl fmt::Display for CallTarget {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CallTarget::Class(name) => f.write_str(name),
            CallTarget::Instance(operand) => write!(f, "{}", operand),
        }
    }
}

/// Parameter and return types a call is emitted with
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CallSignature {
    pub params: Vec<Type>,
    pub return_type: Type,
}

/// Branch condition
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum BranchCondition {
    /// Jump when `left op right` holds
    Compare {
        op: BinaryOp,
        left: Operand,
        right: Operand,
    },
    /// Jump when a boolean value is true
    Value(Operand),
}

impl fmt::Display for BranchCondition {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            BranchCondition::Compare { op, left, right } => write!(f, "{} {} {}", left, op, right),
            BranchCondition::Value(value) => write!(f, "{}", value),
        }
    }
}

/// IR instruction
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum IrInstr {
    /// Copy: dest = value
    Assign { dest: Operand, value: Operand },

    /// Binary operation: dest = left op right
    BinaryOp {
        dest: Operand,
        op: BinaryOp,
        left: Operand,
        right: Operand,
    },

    /// Unary operation: dest = op operand
    UnaryOp {
        dest: Operand,
        op: UnaryOp,
        operand: Operand,
    },

    /// Method invocation; `dest` is `None` when the result is discarded
    Call {
        dest: Option<Operand>,
        kind: CallKind,
        target: CallTarget,
        method: String,
        args: Vec<Operand>,
        signature: CallSignature,
    },

    /// Read a field of `this`: dest = this.field
    GetField { dest: Operand, field: String, ty: Type },

    /// Write a field of `this`: this.field = value
    PutField { field: String, ty: Type, value: Operand },

    /// Allocate an object (constructor is a separate `Call`)
    New { dest: Operand, class: String },

    /// Allocate an array of `size` elements of `element`
    NewArray {
        dest: Operand,
        element: Type,
        size: Operand,
    },

    ArrayLength { dest: Operand, array: Operand },

    /// dest = array[index]
    ArrayLoad {
        dest: Operand,
        array: Operand,
        index: Operand,
    },

    /// array[index] = value
    ArrayStore {
        array: Operand,
        index: Operand,
        value: Operand,
    },

    Return { value: Option<Operand> },

    Goto { target: Label },

    /// Jump to `target` when `cond` holds, fall through otherwise
    CondBranch { cond: BranchCondition, target: Label },
}

impl IrInstr {
    /// Operand written by this instruction, if any
    pub fn dest(&self) -> Option<&Operand> {
        match self {
            IrInstr::Assign { dest, .. }
            | IrInstr::BinaryOp { dest, .. }
            | IrInstr::UnaryOp { dest, .. }
            | IrInstr::GetField { dest, .. }
            | IrInstr::New { dest, .. }
            | IrInstr::NewArray { dest, .. }
            | IrInstr::ArrayLength { dest, .. }
            | IrInstr::ArrayLoad { dest, .. } => Some(dest),
            IrInstr::Call { dest, .. } => dest.as_ref(),
            _ => None,
        }
    }

    /// Whether control never falls through to the next instruction
    pub fn is_terminator(&self) -> bool {
        matches!(self, IrInstr::Return { .. } | IrInstr::Goto { .. })
    }

    /// Label this instruction may jump to
    pub fn jump_target(&self) -> Option<&Label> {
        match self {
            IrInstr::Goto { target } | IrInstr::CondBranch { target, .. } => Some(target),
            _ => None,
        }
    }
}

impl fmt::Display for IrInstr {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            IrInstr::Assign { dest, value } => write!(f, "{} = {}", dest, value),
            IrInstr::BinaryOp {
                dest,
                op,
                left,
                right,
            } => write!(f, "{} = {} {} {}", dest, left, op, right),
            IrInstr::UnaryOp { dest, op, operand } => write!(f, "{} = {}{}", dest, op, operand),
            IrInstr::Call {
                dest,
                kind,
                target,
                method,
                args,
                signature,
            } => {
                if let Some(dest) = dest {
                    write!(f, "{} = ", dest)?;
                }
                let args: Vec<String> = args.iter().map(ToString::to_string).collect();
                write!(
                    f,
                    "{} {}.{}({}) -> {}",
                    kind,
                    target,
                    method,
                    args.join(", "),
                    signature.return_type
                )
            }
            IrInstr::GetField { dest, field, ty } => write!(f, "{} = getfield this.{}:{}", dest, field, ty),
            IrInstr::PutField { field, ty, value } => write!(f, "putfield this.{}:{} = {}", field, ty, value),
            IrInstr::New { dest, class } => write!(f, "{} = new {}", dest, class),
            IrInstr::NewArray { dest, element, size } => {
                write!(f, "{} = newarray {}[{}]", dest, element, size)
            }
            IrInstr::ArrayLength { dest, array } => write!(f, "{} = arraylength {}", dest, array),
            IrInstr::ArrayLoad { dest, array, index } => write!(f, "{} = {}[{}]", dest, array, index),
            IrInstr::ArrayStore { array, index, value } => write!(f, "{}[{}] = {}", array, index, value),
            IrInstr::Return { value: Some(value) } => write!(f, "return {}", value),
            IrInstr::Return { value: None } => f.write_str("return"),
            IrInstr::Goto { target } => write!(f, "goto {}", target),
            IrInstr::CondBranch { cond, target } => write!(f, "if ({}) goto {}", cond, target),
        }
    }
}
