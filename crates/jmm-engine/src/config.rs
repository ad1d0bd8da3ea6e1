//! Compiler options
//!
//! Options a driver passes to [`crate::pipeline::compile`]. They
//! deserialize from any serde format so a driver can embed them in its own
//! configuration file; missing keys take their defaults.

use serde::{Deserialize, Serialize};

/// Configuration for one compilation
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct CompilerOptions {
    /// Run constant folding before lowering (default: false)
    pub optimize: bool,
    /// Upper bound on folding passes when iterating to a fixed point (default: 16)
    pub max_fold_passes: usize,
    /// Keep the IR text dump in the output (default: true)
    pub emit_ir: bool,
}

impl Default for CompilerOptions {
    fn default() -> Self {
        CompilerOptions {
            optimize: false,
            max_fold_passes: 16,
            emit_ir: true,
        }
    }
}

impl CompilerOptions {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_optimize(mut self, optimize: bool) -> Self {
        self.optimize = optimize;
        self
    }

    pub fn with_max_fold_passes(mut self, passes: usize) -> Self {
        self.max_fold_passes = passes;
        self
    }

    pub fn with_emit_ir(mut self, emit_ir: bool) -> Self {
        self.emit_ir = emit_ir;
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let options = CompilerOptions::default();
        assert!(!options.optimize);
        assert_eq!(options.max_fold_passes, 16);
        assert!(options.emit_ir);
    }

    #[test]
    fn test_missing_keys_take_defaults() {
        let options: CompilerOptions = serde_json::from_str(r#"{ "optimize": true }"#).unwrap();
        assert_eq!(options, CompilerOptions::new().with_optimize(true));

        let options: CompilerOptions =
            serde_json::from_str(r#"{ "maxFoldPasses": 2, "emitIr": false }"#).unwrap();
        assert_eq!(options.max_fold_passes, 2);
        assert!(!options.emit_ir);
    }
}
