//! Tree Optimizations
//!
//! Passes that rewrite the checked syntax tree before lowering.

pub mod constant_fold;

pub use constant_fold::ConstantFolder;
