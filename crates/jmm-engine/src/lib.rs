//! Jmm Compiler Engine
//!
//! Middle and back end of a compiler for a small Java-like teaching
//! language targeting the JVM:
//! - **Syntax**: The parsed tree the engine consumes (`syntax` module)
//! - **Catalog**: Declarations of the compilation unit (`catalog` module)
//! - **Checker**: Type resolution and semantic diagnostics (`checker` module)
//! - **Compiler**: Folding, IR lowering and bytecode emission (`compiler` module)
//!
//! # Example
//!
//! ```rust,ignore
//! use jmm_engine::syntax::build::*;
//! use jmm_engine::{compile, CompilerOptions, Type};
//!
//! let tree = program(
//!     vec![import("io")],
//!     class("Hello", None, vec![], vec![static_method(
//!         "main",
//!         Type::void(),
//!         vec![param("args", Type::array_of("String"))],
//!         vec![],
//!         vec![expr_stmt(call(var("io"), "println", vec![int(42)]))],
//!     )]),
//! );
//!
//! let output = compile(tree, &CompilerOptions::default())?;
//! println!("{}", output.jasmin);
//! ```

#![warn(rust_2018_idioms)]

// ============================================================================
// Core Modules
// ============================================================================

/// Syntax tree, node kinds and type descriptors
pub mod syntax;

/// Symbol catalog of a compilation unit
pub mod catalog;

/// Semantic analysis and diagnostics
pub mod checker;

/// IR, optimizations, and bytecode generation
pub mod compiler;

/// Compiler options
pub mod config;

/// Stage sequencing
pub mod pipeline;

// ============================================================================
// Re-exports
// ============================================================================

pub use catalog::{Binding, MethodSignature, Symbol, SymbolCatalog};
pub use checker::{CheckError, Diagnostic, Severity, Stage, TypeChecker};
pub use compiler::{BytecodeClass, ClassIr, CompileError, CompileResult, ConstantFolder};
pub use config::CompilerOptions;
pub use pipeline::{compile, compile_json, compile_with_catalog, CompileOutput};
pub use syntax::{BinaryOp, NodeKind, Position, SyntaxNode, Type};
