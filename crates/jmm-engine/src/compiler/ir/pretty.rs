//! Pretty-printing for IR
//!
//! Provides the textual form of lowered classes, used for debugging and
//! returned by the pipeline next to the bytecode.

use super::method::{ClassIr, MethodIr};
use std::fmt::{self, Write};

/// Trait for pretty-printing IR constructs
pub trait PrettyPrint {
    fn write_pretty(&self, output: &mut String) -> fmt::Result;

    fn pretty_print(&self) -> String {
        let mut output = String::new();
        // Writing into a String cannot fail.
        let _ = self.write_pretty(&mut output);
        output
    }
}

impl PrettyPrint for ClassIr {
    fn write_pretty(&self, output: &mut String) -> fmt::Result {
        write!(output, "class {}", self.name)?;
        if let Some(parent) = &self.superclass {
            write!(output, " extends {}", parent)?;
        }
        writeln!(output, " {{")?;

        for import in &self.imports {
            writeln!(output, "  import {}", import)?;
        }
        for field in &self.fields {
            writeln!(output, "  field {}: {}", field.name, field.ty)?;
        }

        for method in &self.methods {
            writeln!(output)?;
            method.write_pretty(output)?;
        }
        writeln!(output, "}}")
    }
}

impl PrettyPrint for MethodIr {
    fn write_pretty(&self, output: &mut String) -> fmt::Result {
        let params: Vec<String> = self
            .params
            .iter()
            .map(|p| format!("{}: {}", p.name, p.ty))
            .collect();
        writeln!(
            output,
            "  method {}{}({}) -> {} {{",
            if self.is_static { "static " } else { "" },
            self.name,
            params.join(", "),
            self.return_type
        )?;

        if !self.vars.is_empty() {
            let vars: Vec<String> = self
                .vars
                .iter()
                .map(|v| format!("{}: {}", v.key, v.ty))
                .collect();
            writeln!(output, "    ; vars: {}", vars.join(", "))?;
        }

        for (index, instr) in self.instructions.iter().enumerate() {
            for label in self.labels_at(index) {
                writeln!(output, "  {}:", label)?;
            }
            writeln!(output, "    {}", instr)?;
        }
        for label in self.labels_at(self.instructions.len()) {
            writeln!(output, "  {}:", label)?;
        }

        writeln!(output, "  }}")
    }
}
