//! Shared helpers for the integration tests

#![allow(dead_code)]

use jmm_engine::syntax::build::*;
use jmm_engine::{
    checker, compile, BytecodeClass, CompileOutput, CompilerOptions, Diagnostic, SymbolCatalog,
    SyntaxNode, Type,
};

/// `class A` importing `io`, with an int field `count` and `methods`
pub fn unit(methods: Vec<SyntaxNode>) -> SyntaxNode {
    program(
        vec![import("io")],
        class("A", None, vec![var_decl("count", Type::int())], methods),
    )
}

/// Run the checker, returning the annotated tree and its diagnostics
pub fn check(mut tree: SyntaxNode) -> (SyntaxNode, Vec<Diagnostic>) {
    let catalog = SymbolCatalog::from_tree(&tree).expect("catalog");
    let diagnostics = checker::check(&mut tree, &catalog);
    (tree, diagnostics)
}

/// Compile with default options, failing the test on any error
pub fn compile_ok(tree: SyntaxNode) -> CompileOutput {
    match compile(tree, &CompilerOptions::default()) {
        Ok(output) => output,
        Err(err) => panic!("compilation failed: {}", err),
    }
}

/// Instructions of a method, one Jasmin line each
pub fn method_lines(class: &BytecodeClass, name: &str) -> Vec<String> {
    class
        .method(name)
        .unwrap_or_else(|| panic!("no method {}", name))
        .code
        .iter()
        .map(ToString::to_string)
        .collect()
}

pub fn messages(diagnostics: &[Diagnostic]) -> Vec<String> {
    diagnostics.iter().map(|d| d.message.clone()).collect()
}
