//! Compiler back end
//!
//! Lowers a checked syntax tree to IR and emits JVM bytecode from it:
//!
//! ```text
//! checked tree -> [optimize] -> lower -> ir -> codegen -> bytecode
//! ```

pub mod bytecode;
pub mod codegen;
pub mod error;
pub mod ir;
pub mod lower;
pub mod optimize;

pub use bytecode::{BytecodeClass, VerifyError};
pub use codegen::{emit_class, BytecodeEmitter};
pub use error::{CompileError, CompileResult};
pub use ir::{ClassIr, MethodIr, PrettyPrint};
pub use lower::{lower_program, Lowerer};
pub use optimize::ConstantFolder;
