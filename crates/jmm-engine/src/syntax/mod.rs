//! Syntax tree
//!
//! The generic tree the front end produces, the type descriptors the
//! checker attaches to it, and helpers for building trees in code.

pub mod build;
pub mod node;
pub mod types;

pub use node::{BinaryOp, NodeKind, Position, SyntaxNode};
pub use types::Type;
