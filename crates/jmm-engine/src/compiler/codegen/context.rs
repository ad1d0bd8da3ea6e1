//! Code Generator Context
//!
//! Per-method state during emission: the local slot of every variable,
//! the instruction list, and a running operand stack depth.

use crate::compiler::bytecode::JvmInstr;
use crate::compiler::error::{CompileError, CompileResult};
use crate::compiler::ir::{Label, MethodIr, VarKey};
use rustc_hash::{FxHashMap, FxHashSet};

/// Context for emitting a single method
pub(super) struct MethodContext {
    name: String,
    code: Vec<JvmInstr>,
    /// Variable key to local slot
    slots: FxHashMap<VarKey, u16>,
    /// Labels some IR jump targets
    targets: FxHashSet<Label>,
    /// Stack depth recorded at each label by the first jump or placement
    label_depths: FxHashMap<Label, u32>,
    depth: u32,
    peak: u32,
    reachable: bool,
}

impl MethodContext {
    /// Slots follow the variable table order: `this`, parameters, locals,
    /// then temporaries
    pub(super) fn for_method(method: &MethodIr) -> CompileResult<Self> {
        let keys = method.vars.iter().map(|entry| entry.key.clone());
        let targets = method
            .instructions
            .iter()
            .filter_map(|instr| instr.jump_target().cloned())
            .collect();
        Self::new(&method.name, keys, targets)
    }

    pub(super) fn new(
        name: &str,
        keys: impl IntoIterator<Item = VarKey>,
        targets: FxHashSet<Label>,
    ) -> CompileResult<Self> {
        let mut slots = FxHashMap::default();
        for key in keys {
            let slot = u16::try_from(slots.len())
                .map_err(|_| CompileError::consistency(format!("too many locals in {}", name)))?;
            slots.entry(key).or_insert(slot);
        }
        Ok(Self {
            name: name.to_string(),
            code: Vec::new(),
            slots,
            targets,
            label_depths: FxHashMap::default(),
            depth: 0,
            peak: 0,
            reachable: true,
        })
    }

    /// Local slot of a variable
    pub(super) fn slot(&self, key: &VarKey) -> CompileResult<u16> {
        self.slots.get(key).copied().ok_or_else(|| {
            CompileError::consistency(format!("{} has no slot in {}", key, self.name))
        })
    }

    /// Append an instruction and apply its stack effect
    pub(super) fn emit(&mut self, instr: JvmInstr) -> CompileResult<()> {
        let (pops, pushes) = instr.stack_effect();
        self.depth = self.depth.checked_sub(pops).ok_or_else(|| {
            CompileError::consistency(format!(
                "operand stack underflow at '{}' in {}",
                instr, self.name
            ))
        })?;

        if let Some(target) = instr.jump_target() {
            let target = target.clone();
            self.record_depth(target)?;
        }

        self.depth += pushes;
        self.peak = self.peak.max(self.depth);

        if instr.is_terminator() {
            self.reachable = false;
            self.depth = 0;
        }
        self.code.push(instr);
        Ok(())
    }

    /// Place a label. After a terminator the depth is the one recorded by
    /// the jumps that reach the label.
    pub(super) fn place(&mut self, label: Label) -> CompileResult<()> {
        if self.reachable {
            self.record_depth(label.clone())?;
        } else if let Some(&recorded) = self.label_depths.get(&label) {
            self.depth = recorded;
            self.reachable = true;
        } else {
            self.depth = 0;
            if self.targets.contains(&label) {
                self.label_depths.insert(label.clone(), 0);
                self.reachable = true;
            }
        }
        self.code.push(JvmInstr::Label(label));
        Ok(())
    }

    fn record_depth(&mut self, label: Label) -> CompileResult<()> {
        match self.label_depths.get(&label) {
            Some(&expected) if expected != self.depth => Err(CompileError::consistency(format!(
                "stack depth {} at {} in {} differs from {}",
                self.depth, label, self.name, expected
            ))),
            Some(_) => Ok(()),
            None => {
                self.label_depths.insert(label, self.depth);
                Ok(())
            }
        }
    }

    /// Emitted code with its `(max_stack, max_locals)`
    pub(super) fn finish(self) -> CompileResult<(Vec<JvmInstr>, u16, u16)> {
        let max_stack = u16::try_from(self.peak)
            .map_err(|_| CompileError::consistency(format!("stack too deep in {}", self.name)))?;
        let max_locals = u16::try_from(self.slots.len())
            .map_err(|_| CompileError::consistency(format!("too many locals in {}", self.name)))?;
        Ok((self.code, max_stack, max_locals))
    }
}
