//! stackvm verifier: static checks for code arrays.
//!
//! The verifier checks a `Program` BEFORE execution so that the unchecked
//! dispatch loop only ever sees well-formed code. It collects ALL errors
//! (not just the first) and returns them.
//!
//! Verified code never underflows the stack, leaves its frame, or returns
//! without a call. Its stack depth is bounded statically unless calls
//! recurse; see [`ProgramInfo::check_capacity`].
//!
//! # Usage
//!
//! ```
//! use stackvm_common::{Instruction, Opcode, Program};
//! use stackvm_verifier::verify;
//!
//! let program = Program::from_instructions(&[
//!     Instruction::with_operand(Opcode::Iconst, 42),
//!     Instruction::with_operand(Opcode::Gstore, 0),
//!     Instruction::new(Opcode::Halt),
//! ]);
//!
//! let info = verify(&program, 0, 1).unwrap();
//! assert_eq!(info.boundaries, vec![0, 2, 4]);
//! ```
//!
//! # Passes
//!
//! 1. **Limits**: program size
//! 2. **Structural**: every boundary decodes with all operands present
//! 3. **Targets**: branch and call targets, argument counts, entry point
//! 4. **Globals**: global indices against the declared store size
//! 5. **Stack**: depth at every reachable boundary, frame accesses, `ret`

pub mod error;
pub mod globals;
pub mod hashing;
pub mod limits;
pub mod stack;
pub mod structural;
pub mod targets;

pub use error::VerifyError;
pub use hashing::{fingerprint, fingerprint_hex};

use std::collections::BTreeSet;

use stackvm_common::{Opcode, Program};

/// Facts about a program that passed verification.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProgramInfo {
    /// Address of every instruction, in order.
    pub boundaries: Vec<usize>,
    /// Addresses named by `call` instructions.
    pub call_targets: BTreeSet<usize>,
    /// Deepest the operand stack can get, or `None` when calls recurse.
    pub max_stack_depth: Option<usize>,
}

impl ProgramInfo {
    /// Check the static stack bound against a stack capacity.
    ///
    /// Recursive programs have no static bound and always pass.
    pub fn check_capacity(&self, capacity: usize) -> Result<(), VerifyError> {
        match self.max_stack_depth {
            Some(depth) if depth > capacity => Err(VerifyError::StackTooDeep { depth, capacity }),
            _ => Ok(()),
        }
    }
}

/// Verify a program that will start at `start_ip` with `global_count`
/// global slots.
///
/// Returns [`ProgramInfo`] if the program passes all checks, or
/// `Err(Vec<VerifyError>)` with all errors found.
///
/// If the structural pass cannot decode the whole code array, the passes
/// that depend on instruction boundaries are skipped.
pub fn verify(
    program: &Program,
    start_ip: usize,
    global_count: usize,
) -> Result<ProgramInfo, Vec<VerifyError>> {
    let code = &program.code;
    let mut all_errors = Vec::new();
    let mut max_stack_depth = Some(0);

    // Pass 1: Limits (independent)
    all_errors.extend(limits::check_limits(code));

    // Pass 2: Structural (builds Layout)
    let (layout, structural_errors) = structural::check_structural(code);
    all_errors.extend(structural_errors);

    if !layout.fatal {
        // Pass 3: Targets
        all_errors.extend(targets::check_targets(&layout, start_ip));

        // Pass 4: Globals
        all_errors.extend(globals::check_globals(&layout, global_count));

        // Pass 5: Stack
        let (bound, stack_errors) = stack::check_stack(&layout, start_ip);
        max_stack_depth = bound;
        all_errors.extend(stack_errors);
    }

    if !all_errors.is_empty() {
        return Err(all_errors);
    }

    let call_targets = layout
        .instructions
        .iter()
        .filter(|(_, instr)| instr.opcode == Opcode::Call)
        .filter_map(|(_, instr)| instr.target())
        .filter_map(|target| usize::try_from(target).ok())
        .collect();

    Ok(ProgramInfo {
        boundaries: layout.boundaries(),
        call_targets,
        max_stack_depth,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use stackvm_common::Instruction;

    #[test]
    fn minimal_valid_program() {
        let program = Program::from_instructions(&[
            Instruction::with_operand(Opcode::Iconst, 42),
            Instruction::new(Opcode::Print),
            Instruction::new(Opcode::Halt),
        ]);
        let info = verify(&program, 0, 0).unwrap();
        assert_eq!(info.boundaries, vec![0, 2, 3]);
        assert!(info.call_targets.is_empty());
    }

    #[test]
    fn empty_program_is_valid() {
        let info = verify(&Program::default(), 0, 0).unwrap();
        assert!(info.boundaries.is_empty());
    }

    #[test]
    fn call_targets_collected() {
        // f: iconst 1; ret; main: call 0 0; call 0 0; halt
        let program = Program::from_instructions(&[
            Instruction::with_operand(Opcode::Iconst, 1),
            Instruction::new(Opcode::Ret),
            Instruction::call(0, 0),
            Instruction::call(0, 0),
            Instruction::new(Opcode::Halt),
        ]);
        let info = verify(&program, 3, 0).unwrap();
        assert_eq!(info.call_targets, BTreeSet::from([0]));
        // second call: one result below a frame of three plus one value
        assert_eq!(info.max_stack_depth, Some(5));
    }

    #[test]
    fn capacity_checked_against_bound() {
        let program = Program::from_instructions(&[
            Instruction::with_operand(Opcode::Iconst, 1),
            Instruction::with_operand(Opcode::Iconst, 2),
            Instruction::new(Opcode::Halt),
        ]);
        let info = verify(&program, 0, 0).unwrap();
        assert!(info.check_capacity(2).is_ok());
        assert_eq!(
            info.check_capacity(1),
            Err(VerifyError::StackTooDeep {
                depth: 2,
                capacity: 1
            })
        );
    }

    #[test]
    fn stack_errors_reported_with_others() {
        // gload 5; iadd
        let program = Program::from_instructions(&[
            Instruction::with_operand(Opcode::Gload, 5),
            Instruction::new(Opcode::Iadd),
        ]);
        let errors = verify(&program, 0, 0).unwrap_err();
        assert_eq!(errors.len(), 2, "{errors:?}");
        assert!(matches!(errors[1], VerifyError::StackUnderflow { at: 2, .. }));
    }

    #[test]
    fn multiple_errors_collected() {
        // br 99; gload 5; entry at 1
        let program = Program::from_instructions(&[
            Instruction::with_operand(Opcode::Br, 99),
            Instruction::with_operand(Opcode::Gload, 5),
        ]);
        let errors = verify(&program, 1, 0).unwrap_err();
        assert_eq!(errors.len(), 3, "{errors:?}");
    }

    #[test]
    fn fatal_structure_skips_later_passes() {
        // br 50 would be reported, but the invalid word stops the walk first
        let program = Program::new(vec![77, 7, 50]);
        let errors = verify(&program, 0, 0).unwrap_err();
        assert_eq!(errors, vec![VerifyError::InvalidOpcode { at: 0, word: 77 }]);
    }
}
