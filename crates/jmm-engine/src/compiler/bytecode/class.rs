//! Emitted class model and its Jasmin text form

use super::descriptor::MethodDescriptor;
use super::instruction::JvmInstr;
use std::fmt;

/// A `.field` directive
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BytecodeField {
    pub name: String,
    pub descriptor: String,
}

/// A method body with its computed limits
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BytecodeMethod {
    pub name: String,
    pub is_static: bool,
    pub descriptor: MethodDescriptor,
    pub code: Vec<JvmInstr>,
    /// Peak operand stack depth
    pub max_stack: u16,
    /// Local slots, including `this` and parameters
    pub max_locals: u16,
}

impl BytecodeMethod {
    /// Real instructions, labels excluded
    pub fn instructions(&self) -> impl Iterator<Item = &JvmInstr> {
        self.code.iter().filter(|i| !matches!(i, JvmInstr::Label(_)))
    }
}

/// A complete emitted class
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BytecodeClass {
    /// Internal name
    pub name: String,
    /// Internal name of the superclass
    pub superclass: String,
    pub fields: Vec<BytecodeField>,
    pub methods: Vec<BytecodeMethod>,
}

impl BytecodeClass {
    pub fn method(&self, name: &str) -> Option<&BytecodeMethod> {
        self.methods.iter().find(|m| m.name == name)
    }

    /// Jasmin assembly for the whole class
    pub fn to_jasmin(&self) -> String {
        self.to_string()
    }
}

impl fmt::Display for BytecodeMethod {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let modifier = if self.is_static { "public static" } else { "public" };
        writeln!(f, ".method {} {}{}", modifier, self.name, self.descriptor)?;
        writeln!(f, "    .limit stack {}", self.max_stack)?;
        writeln!(f, "    .limit locals {}", self.max_locals)?;
        for instr in &self.code {
            match instr {
                JvmInstr::Label(_) => writeln!(f, "  {}", instr)?,
                _ => writeln!(f, "    {}", instr)?,
            }
        }
        writeln!(f, ".end method")
    }
}

impl fmt::Display for BytecodeClass {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, ".class public {}", self.name)?;
        writeln!(f, ".super {}", self.superclass)?;
        if !self.fields.is_empty() {
            writeln!(f)?;
        }
        for field in &self.fields {
            writeln!(f, ".field public {} {}", field.name, field.descriptor)?;
        }
        for method in &self.methods {
            writeln!(f)?;
            write!(f, "{}", method)?;
        }
        Ok(())
    }
}
