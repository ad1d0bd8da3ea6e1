//! Compilation errors

use crate::checker::Diagnostic;
use crate::compiler::bytecode::verify::VerifyError;
use thiserror::Error;

pub type CompileResult<T> = Result<T, CompileError>;

/// Fatal errors that abort a compilation
#[derive(Debug, Error)]
pub enum CompileError {
    /// The checker reported errors, so later stages were not run
    #[error("semantic analysis failed with {} error(s)", .diagnostics.iter().filter(|d| d.is_error()).count())]
    Semantic { diagnostics: Vec<Diagnostic> },

    /// Input tree is missing a required attribute or child
    #[error("Invalid syntax tree: {message}")]
    InvalidTree { message: String },

    /// Lowering met a construct a checked tree cannot contain
    #[error("Internal lowering error: {message}")]
    InternalLowering { message: String },

    /// Stack or label bookkeeping went inconsistent during emission
    #[error("Bytecode consistency fault: {message}")]
    ConsistencyFault { message: String },

    #[error("Bytecode verification failed: {0}")]
    Verification(#[from] VerifyError),
}

impl CompileError {
    pub(crate) fn lowering(message: impl Into<String>) -> Self {
        CompileError::InternalLowering {
            message: message.into(),
        }
    }

    pub(crate) fn consistency(message: impl Into<String>) -> Self {
        CompileError::ConsistencyFault {
            message: message.into(),
        }
    }

    pub(crate) fn invalid_tree(message: impl Into<String>) -> Self {
        CompileError::InvalidTree {
            message: message.into(),
        }
    }
}
