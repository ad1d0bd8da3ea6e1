//! Duplicate declaration detection

use super::error::{CheckError, DuplicateKind};
use crate::syntax::{NodeKind, SyntaxNode};
use rustc_hash::FxHashSet;

/// Fields and methods of a class
pub(super) fn check_class_members(class: &SyntaxNode, errors: &mut Vec<CheckError>) {
    report(class, NodeKind::VarDecl, DuplicateKind::Field, errors);
    report(class, NodeKind::MethodDecl, DuplicateKind::Method, errors);
}

/// Parameters and locals of a method, each kind on its own. A local may
/// shadow a parameter.
pub(super) fn check_method_scope(method: &SyntaxNode, errors: &mut Vec<CheckError>) {
    report(method, NodeKind::Param, DuplicateKind::Parameter, errors);
    report(method, NodeKind::VarDecl, DuplicateKind::Variable, errors);
}

fn report(parent: &SyntaxNode, kind: NodeKind, duplicate: DuplicateKind, errors: &mut Vec<CheckError>) {
    let mut seen = FxHashSet::default();
    for decl in parent.children_of(kind) {
        if !seen.insert(decl.name()) {
            errors.push(CheckError::Duplicate {
                kind: duplicate,
                name: decl.name().to_string(),
                position: decl.position,
            });
        }
    }
}
