//! IR methods and classes
//!
//! A method is a flat instruction list, the labels placed in it, and the
//! table of variables it uses. Slot numbers are not decided here; the
//! table only fixes the order variables are declared in.

use super::instr::IrInstr;
use super::value::{Label, VarKey};
use crate::catalog::Symbol;
use crate::compiler::error::{CompileError, CompileResult};
use crate::syntax::Type;
use rustc_hash::FxHashMap;

/// A variable known to a method
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct VarEntry {
    pub key: VarKey,
    pub ty: Type,
}

/// Variables of a method in declaration order
#[derive(Debug, Clone, Default)]
pub struct VarTable {
    entries: Vec<VarEntry>,
    index: FxHashMap<VarKey, usize>,
}

impl VarTable {
    pub fn new() -> Self {
        Self::default()
    }

    /// Declare a variable. Declaring the same key again with the same type
    /// is a no-op; with a different type it is an error.
    pub fn declare(&mut self, key: VarKey, ty: Type) -> CompileResult<()> {
        if let Some(&existing) = self.index.get(&key) {
            let entry = &self.entries[existing];
            if entry.ty != ty {
                return Err(CompileError::lowering(format!(
                    "variable {} declared as both {} and {}",
                    key, entry.ty, ty
                )));
            }
            return Ok(());
        }
        self.index.insert(key.clone(), self.entries.len());
        self.entries.push(VarEntry { key, ty });
        Ok(())
    }

    pub fn get(&self, key: &VarKey) -> Option<&VarEntry> {
        self.index.get(key).map(|&i| &self.entries[i])
    }

    /// Position of a variable in declaration order
    pub fn position(&self, key: &VarKey) -> Option<usize> {
        self.index.get(key).copied()
    }

    pub fn contains(&self, key: &VarKey) -> bool {
        self.index.contains_key(key)
    }

    pub fn iter(&self) -> impl Iterator<Item = &VarEntry> {
        self.entries.iter()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

/// A lowered method
#[derive(Debug, Clone)]
pub struct MethodIr {
    pub name: String,
    pub is_static: bool,
    pub params: Vec<Symbol>,
    pub return_type: Type,
    pub instructions: Vec<IrInstr>,
    /// Labels in placement order with the index of the instruction they
    /// precede (`instructions.len()` for a label at the end)
    labels: Vec<(Label, usize)>,
    label_index: FxHashMap<Label, usize>,
    pub vars: VarTable,
}

impl MethodIr {
    pub fn new(name: impl Into<String>, is_static: bool, params: Vec<Symbol>, return_type: Type) -> Self {
        Self {
            name: name.into(),
            is_static,
            params,
            return_type,
            instructions: Vec::new(),
            labels: Vec::new(),
            label_index: FxHashMap::default(),
            vars: VarTable::new(),
        }
    }

    pub fn push(&mut self, instr: IrInstr) {
        self.instructions.push(instr);
    }

    /// Place `label` before the next instruction
    pub fn place_label(&mut self, label: Label) -> CompileResult<()> {
        if self.label_index.contains_key(&label) {
            return Err(CompileError::lowering(format!("label {} placed twice", label)));
        }
        let at = self.instructions.len();
        self.label_index.insert(label.clone(), at);
        self.labels.push((label, at));
        Ok(())
    }

    /// Labels placed immediately before instruction `index`
    pub fn labels_at(&self, index: usize) -> impl Iterator<Item = &Label> {
        self.labels
            .iter()
            .filter(move |(_, at)| *at == index)
            .map(|(label, _)| label)
    }

    /// Whether control can fall off the current end of the method
    pub fn falls_through(&self) -> bool {
        let ends_with_terminator = self.instructions.last().is_some_and(IrInstr::is_terminator);
        let label_at_end = self.labels_at(self.instructions.len()).next().is_some();
        !ends_with_terminator || label_at_end
    }
}

/// A lowered class
#[derive(Debug, Clone)]
pub struct ClassIr {
    pub name: String,
    pub superclass: Option<String>,
    pub imports: Vec<String>,
    pub fields: Vec<Symbol>,
    pub methods: Vec<MethodIr>,
}

impl ClassIr {
    pub fn method(&self, name: &str) -> Option<&MethodIr> {
        self.methods.iter().find(|m| m.name == name)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::compiler::ir::value::TempId;

    #[test]
    fn test_var_table_order_and_redeclare() {
        let mut vars = VarTable::new();
        vars.declare(VarKey::This, Type::class("A")).unwrap();
        vars.declare(VarKey::Named("x".into()), Type::int()).unwrap();
        vars.declare(VarKey::Temp(TempId::new(0)), Type::boolean()).unwrap();
        vars.declare(VarKey::Named("x".into()), Type::int()).unwrap();

        assert_eq!(vars.len(), 3);
        assert_eq!(vars.position(&VarKey::Named("x".into())), Some(1));
        assert!(vars.declare(VarKey::Named("x".into()), Type::boolean()).is_err());
    }

    #[test]
    fn test_labels() {
        let mut method = MethodIr::new("f", false, vec![], Type::void());
        method.place_label(Label::new("start")).unwrap();
        method.push(IrInstr::Goto { target: Label::new("start") });
        assert!(!method.falls_through());
        method.place_label(Label::new("end")).unwrap();
        assert!(method.falls_through());

        assert_eq!(method.labels_at(0).collect::<Vec<_>>(), vec![&Label::new("start")]);
        assert_eq!(method.labels_at(1).collect::<Vec<_>>(), vec![&Label::new("end")]);
        assert!(method.place_label(Label::new("end")).is_err());
    }
}
