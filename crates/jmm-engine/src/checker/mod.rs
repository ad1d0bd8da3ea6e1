//! Semantic analysis
//!
//! This module provides:
//! - Type resolution for every expression, written into the tree
//! - Operator, assignment, return and condition checks
//! - Method call and varargs matching against the symbol catalog
//! - Duplicate declaration detection
//! - Diagnostic records with codespan rendering and a JSON form

mod calls;
#[allow(clippy::module_inception)]
mod checker;
mod duplicates;
pub mod diagnostic;
pub mod error;

pub use checker::TypeChecker;
pub use diagnostic::{Diagnostic, Severity, Stage};
pub use error::{CheckError, DuplicateKind};

use crate::catalog::SymbolCatalog;
use crate::syntax::SyntaxNode;
use tracing::debug;

/// Annotate `root` with resolved types and return the semantic
/// diagnostics in traversal order. Running it again on the same tree
/// yields the same annotations and diagnostics.
pub fn check(root: &mut SyntaxNode, catalog: &SymbolCatalog) -> Vec<Diagnostic> {
    let errors = TypeChecker::new(catalog).check(root);
    debug!(
        class = catalog.class_name(),
        errors = errors.len(),
        "semantic analysis finished"
    );
    errors.iter().map(Diagnostic::from).collect()
}
