//! Global store pass: every `gload`/`gstore` names a declared slot.

use crate::error::VerifyError;
use crate::structural::Layout;
use stackvm_common::Opcode;

/// Run the globals pass.
pub fn check_globals(layout: &Layout, global_count: usize) -> Vec<VerifyError> {
    layout
        .instructions
        .iter()
        .filter(|(_, instr)| matches!(instr.opcode, Opcode::Gload | Opcode::Gstore))
        .filter_map(|&(at, instr)| {
            let index = instr.operands()[0];
            let in_range = usize::try_from(index).is_ok_and(|i| i < global_count);
            (!in_range).then_some(VerifyError::GlobalOutOfRange {
                at,
                mnemonic: instr.opcode.mnemonic(),
                index,
                global_count,
            })
        })
        .collect()
}
