//! JVM Bytecode Definitions
//!
//! The instruction subset, descriptors and class model the emitter
//! produces, plus a verifier that re-checks stack discipline on the
//! result. Everything renders to Jasmin assembly text.

pub mod class;
pub mod descriptor;
pub mod instruction;
pub mod verify;

pub use class::{BytecodeClass, BytecodeField, BytecodeMethod};
pub use descriptor::{field_descriptor, ImportTable, MethodDescriptor, OBJECT_CLASS, STRING_CLASS};
pub use instruction::JvmInstr;
pub use verify::{verify_class, verify_method, VerifyError};
