//! Intermediate Representation (IR)
//!
//! The IR sits between the checked tree and bytecode emission. It is
//! three-address code over typed operands, one flat instruction list per
//! method with labels marking jump targets.
//!
//! # Structure
//!
//! - `ClassIr` - The lowered compilation unit
//! - `MethodIr` - Instructions, labels and the variable table of a method
//! - `IrInstr` - Three-address code instructions
//! - `Operand` - Temporaries, named variables and literals

pub mod instr;
pub mod method;
pub mod pretty;
pub mod value;

pub use instr::{BinaryOp, BranchCondition, CallKind, CallSignature, CallTarget, IrInstr, UnaryOp};
pub use method::{ClassIr, MethodIr, VarEntry, VarTable};
pub use pretty::PrettyPrint;
pub use value::{Label, Literal, Operand, TempId, VarKey};
