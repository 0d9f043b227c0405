//! Control-transfer pass: branch and call targets, argument counts and the
//! entry point.

use crate::error::VerifyError;
use crate::structural::Layout;
use stackvm_common::Opcode;

/// Run the targets pass.
pub fn check_targets(layout: &Layout, start_ip: usize) -> Vec<VerifyError> {
    let mut errors = Vec::new();

    for &(at, instr) in &layout.instructions {
        if let Some(target) = instr.target() {
            let mnemonic = instr.opcode.mnemonic();
            match usize::try_from(target).ok().filter(|&t| t < layout.len) {
                None => errors.push(VerifyError::TargetOutOfRange {
                    at,
                    mnemonic,
                    target,
                    len: layout.len,
                }),
                Some(target) if !layout.is_boundary(target) => {
                    errors.push(VerifyError::TargetNotBoundary {
                        at,
                        mnemonic,
                        target,
                    });
                }
                Some(_) => {}
            }
        }

        if instr.opcode == Opcode::Call {
            let nargs = instr.operands()[1];
            if nargs < 0 {
                errors.push(VerifyError::NegativeArgCount { at, nargs });
            }
        }
    }

    // Starting exactly at the end is an immediate, valid halt.
    if start_ip != layout.len && !layout.is_boundary(start_ip) {
        errors.push(VerifyError::BadEntryPoint { start_ip });
    }

    errors
}
