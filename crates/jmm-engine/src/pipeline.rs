//! Compilation pipeline
//!
//! Runs the stages in order over one compilation unit:
//!
//! ```text
//! tree -> check -> [fold, re-check] -> lower -> emit -> verify
//! ```
//!
//! Every stage finishes before the next starts. Semantic errors stop the
//! pipeline before lowering; later stages fail with the first fatal error.

use crate::catalog::SymbolCatalog;
use crate::checker::{self, Diagnostic};
use crate::compiler::bytecode::{verify_class, BytecodeClass};
use crate::compiler::codegen::emit_class;
use crate::compiler::error::{CompileError, CompileResult};
use crate::compiler::ir::{ClassIr, PrettyPrint};
use crate::compiler::lower::lower_program;
use crate::compiler::optimize::ConstantFolder;
use crate::config::CompilerOptions;
use crate::syntax::SyntaxNode;
use tracing::debug;

/// Everything a successful compilation produces
#[derive(Debug, Clone)]
pub struct CompileOutput {
    /// The checked (and possibly folded) tree with resolved types
    pub tree: SyntaxNode,
    pub catalog: SymbolCatalog,
    /// Non-fatal diagnostics
    pub warnings: Vec<Diagnostic>,
    pub ir: ClassIr,
    /// IR text dump, when `emit_ir` is set
    pub ir_text: Option<String>,
    pub class: BytecodeClass,
    /// Jasmin assembly for `class`
    pub jasmin: String,
}

/// Compile a tree, building the symbol catalog from it
pub fn compile(tree: SyntaxNode, options: &CompilerOptions) -> CompileResult<CompileOutput> {
    let catalog = SymbolCatalog::from_tree(&tree)?;
    compile_with_catalog(tree, catalog, options)
}

/// Compile a tree given in its JSON interchange form
pub fn compile_json(json: &str, options: &CompilerOptions) -> CompileResult<CompileOutput> {
    let tree = SyntaxNode::from_json(json).map_err(|e| CompileError::InvalidTree {
        message: format!("tree JSON: {}", e),
    })?;
    compile(tree, options)
}

/// Compile a tree against a catalog supplied by the caller
pub fn compile_with_catalog(
    mut tree: SyntaxNode,
    catalog: SymbolCatalog,
    options: &CompilerOptions,
) -> CompileResult<CompileOutput> {
    analyze(&mut tree, &catalog)?;

    let mut warnings = Vec::new();
    if options.optimize {
        warnings.extend(optimize(&mut tree, options.max_fold_passes));
        analyze(&mut tree, &catalog)?;
    }

    let ir = lower_program(&tree, &catalog)?;
    let ir_text = if options.emit_ir {
        Some(ir.pretty_print())
    } else {
        None
    };

    let class = emit_class(&ir)?;
    verify_class(&class)?;
    let jasmin = class.to_jasmin();

    debug!(
        class = %class.name,
        methods = class.methods.len(),
        warnings = warnings.len(),
        "compilation finished"
    );

    Ok(CompileOutput {
        tree,
        catalog,
        warnings,
        ir,
        ir_text,
        class,
        jasmin,
    })
}

/// Type-check in place, failing when any error was reported
fn analyze(tree: &mut SyntaxNode, catalog: &SymbolCatalog) -> CompileResult<()> {
    let diagnostics = checker::check(tree, catalog);
    if diagnostics.iter().any(Diagnostic::is_error) {
        return Err(CompileError::Semantic { diagnostics });
    }
    Ok(())
}

/// Fold until a pass rewrites nothing or the pass limit is reached
fn optimize(tree: &mut SyntaxNode, max_passes: usize) -> Vec<Diagnostic> {
    let mut folder = ConstantFolder::new();
    let mut passes = 0;
    while passes < max_passes {
        passes += 1;
        if !folder.fold(tree) {
            break;
        }
    }
    debug!(passes, "constant folding finished");
    folder.into_warnings()
}
