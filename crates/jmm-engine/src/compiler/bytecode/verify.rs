//! Bytecode verification
//!
//! Re-simulates the operand stack of emitted methods to check that no
//! instruction underflows, every jump lands on a placed label with a
//! consistent depth, and the declared limits cover what the code uses.

use super::class::{BytecodeClass, BytecodeMethod};
use super::instruction::JvmInstr;
use rustc_hash::{FxHashMap, FxHashSet};

/// Verification error
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum VerifyError {
    /// Instruction pops more values than the stack holds
    #[error("Stack underflow at instruction {index} in {method}")]
    StackUnderflow { method: String, index: usize },

    /// Jump to a label that is never placed
    #[error("Undefined jump target {label} in {method}")]
    UndefinedLabel { method: String, label: String },

    /// Label placed more than once
    #[error("Label {label} placed twice in {method}")]
    DuplicateLabel { method: String, label: String },

    /// Paths reach a label with different stack depths
    #[error("Stack depth at {label} in {method} is {expected} on one path and {actual} on another")]
    DepthMismatch {
        method: String,
        label: String,
        expected: u32,
        actual: u32,
    },

    /// `.limit stack` is lower than the depth the code reaches
    #[error("Method {method} declares stack limit {declared} but needs {required}")]
    StackLimitTooLow {
        method: String,
        declared: u16,
        required: u32,
    },

    /// Local slot outside `.limit locals`
    #[error("Local slot {slot} in {method} is outside limit {max_locals}")]
    InvalidLocal {
        method: String,
        slot: u16,
        max_locals: u16,
    },

    /// Control reaches the end of the code without a return
    #[error("Execution falls off the end of {method}")]
    FallOffEnd { method: String },
}

/// Verify every method of a class
pub fn verify_class(class: &BytecodeClass) -> Result<(), VerifyError> {
    for method in &class.methods {
        verify_method(method)?;
    }
    Ok(())
}

/// Verify one method and return the peak stack depth it reaches
pub fn verify_method(method: &BytecodeMethod) -> Result<u32, VerifyError> {
    let name = || method.name.clone();

    // Collect placed labels and every label some jump targets
    let mut placed = FxHashSet::default();
    let mut targets = FxHashSet::default();
    for instr in &method.code {
        if let JvmInstr::Label(label) = instr {
            if !placed.insert(label.as_str()) {
                return Err(VerifyError::DuplicateLabel {
                    method: name(),
                    label: label.to_string(),
                });
            }
        }
        if let Some(target) = instr.jump_target() {
            targets.insert(target.as_str());
        }
    }
    if let Some(missing) = targets.iter().find(|t| !placed.contains(*t)) {
        return Err(VerifyError::UndefinedLabel {
            method: name(),
            label: missing.to_string(),
        });
    }

    simulate(method, &targets)
}

/// Linear stack simulation. Code after a terminator is unreachable until
/// a label some jump targets; its depth is then the recorded one.
fn simulate(method: &BytecodeMethod, targets: &FxHashSet<&str>) -> Result<u32, VerifyError> {
    let mut depths: FxHashMap<&str, u32> = FxHashMap::default();
    let mut depth: u32 = 0;
    let mut peak: u32 = 0;
    let mut reachable = true;

    for (index, instr) in method.code.iter().enumerate() {
        if let JvmInstr::Label(label) = instr {
            let label = label.as_str();
            match (reachable, depths.get(label).copied()) {
                (true, Some(expected)) if expected != depth => {
                    return Err(VerifyError::DepthMismatch {
                        method: method.name.clone(),
                        label: label.to_string(),
                        expected,
                        actual: depth,
                    });
                }
                (true, _) => {
                    depths.insert(label, depth);
                }
                (false, Some(recorded)) => {
                    depth = recorded;
                    reachable = true;
                }
                (false, None) => {
                    depth = 0;
                    if targets.contains(label) {
                        depths.insert(label, depth);
                        reachable = true;
                    }
                }
            }
            continue;
        }

        if let Some(slot) = instr.local_slot() {
            if slot >= method.max_locals {
                return Err(VerifyError::InvalidLocal {
                    method: method.name.clone(),
                    slot,
                    max_locals: method.max_locals,
                });
            }
        }

        let (pops, pushes) = instr.stack_effect();
        depth = depth.checked_sub(pops).ok_or_else(|| VerifyError::StackUnderflow {
            method: method.name.clone(),
            index,
        })?;

        if let Some(target) = instr.jump_target() {
            let target = target.as_str();
            match depths.get(target).copied() {
                Some(expected) if expected != depth => {
                    return Err(VerifyError::DepthMismatch {
                        method: method.name.clone(),
                        label: target.to_string(),
                        expected,
                        actual: depth,
                    });
                }
                Some(_) => {}
                None => {
                    depths.insert(target, depth);
                }
            }
        }

        depth += pushes;
        peak = peak.max(depth);

        if instr.is_terminator() {
            reachable = false;
            depth = 0;
        }
    }

    if reachable {
        return Err(VerifyError::FallOffEnd {
            method: method.name.clone(),
        });
    }
    if peak > u32::from(method.max_stack) {
        return Err(VerifyError::StackLimitTooLow {
            method: method.name.clone(),
            declared: method.max_stack,
            required: peak,
        });
    }
    Ok(peak)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::compiler::bytecode::MethodDescriptor;
    use crate::compiler::ir::Label;

    fn method(code: Vec<JvmInstr>, max_stack: u16, max_locals: u16) -> BytecodeMethod {
        BytecodeMethod {
            name: "test".to_string(),
            is_static: false,
            descriptor: MethodDescriptor::void(),
            code,
            max_stack,
            max_locals,
        }
    }

    fn label(name: &str) -> Label {
        Label::new(name)
    }

    #[test]
    fn test_valid_materialized_comparison() {
        let code = vec![
            JvmInstr::ILoad(1),
            JvmInstr::ILoad(2),
            JvmInstr::IfIcmplt(label("cmp_true_0")),
            JvmInstr::IConst(0),
            JvmInstr::Goto(label("cmp_end_0")),
            JvmInstr::Label(label("cmp_true_0")),
            JvmInstr::IConst(1),
            JvmInstr::Label(label("cmp_end_0")),
            JvmInstr::IReturn,
        ];
        assert_eq!(verify_method(&method(code, 2, 3)), Ok(2));
    }

    #[test]
    fn test_stack_underflow() {
        let code = vec![JvmInstr::IConst(1), JvmInstr::IAdd, JvmInstr::IReturn];
        assert_eq!(
            verify_method(&method(code, 2, 1)),
            Err(VerifyError::StackUnderflow {
                method: "test".to_string(),
                index: 1
            })
        );
    }

    #[test]
    fn test_undefined_label() {
        let code = vec![JvmInstr::Goto(label("nowhere"))];
        assert!(matches!(
            verify_method(&method(code, 0, 1)),
            Err(VerifyError::UndefinedLabel { .. })
        ));
    }

    #[test]
    fn test_depth_mismatch_at_join() {
        let code = vec![
            JvmInstr::IConst(1),
            JvmInstr::IfNe(label("join")),
            JvmInstr::IConst(7),
            JvmInstr::Label(label("join")),
            JvmInstr::Return,
        ];
        assert!(matches!(
            verify_method(&method(code, 1, 1)),
            Err(VerifyError::DepthMismatch { .. })
        ));
    }

    #[test]
    fn test_limits_are_checked() {
        let code = vec![JvmInstr::IConst(1), JvmInstr::IConst(2), JvmInstr::IAdd, JvmInstr::IReturn];
        assert!(matches!(
            verify_method(&method(code, 1, 1)),
            Err(VerifyError::StackLimitTooLow { required: 2, .. })
        ));

        let code = vec![JvmInstr::ILoad(4), JvmInstr::IReturn];
        assert!(matches!(
            verify_method(&method(code, 1, 2)),
            Err(VerifyError::InvalidLocal { slot: 4, .. })
        ));
    }

    #[test]
    fn test_fall_off_end() {
        let code = vec![JvmInstr::IConst(1), JvmInstr::Pop];
        assert!(matches!(
            verify_method(&method(code, 1, 1)),
            Err(VerifyError::FallOffEnd { .. })
        ));
    }

    #[test]
    fn test_unreferenced_label_after_return_stays_unreachable() {
        let code = vec![
            JvmInstr::IConst(1),
            JvmInstr::IReturn,
            JvmInstr::Label(label("endif_0")),
        ];
        assert_eq!(verify_method(&method(code, 1, 1)), Ok(1));
    }
}
