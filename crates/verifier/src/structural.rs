//! Structural pass: walk instruction boundaries from address 0.
//!
//! Builds the [`Layout`] consumed by the later passes. An undecodable word
//! makes every later boundary unknowable, so the walk stops there and the
//! layout is marked fatal.

use crate::error::VerifyError;
use stackvm_common::{DecodeError, Instruction};

/// Instruction boundaries discovered by the structural pass.
#[derive(Debug, Clone, Default)]
pub struct Layout {
    /// Every decoded instruction with its address, in address order.
    pub instructions: Vec<(usize, Instruction)>,
    /// Length of the code array in words.
    pub len: usize,
    /// Whether the walk stopped early (callers should skip later passes).
    pub fatal: bool,
}

impl Layout {
    /// True if an instruction starts at `address`.
    pub fn is_boundary(&self, address: usize) -> bool {
        self.instructions
            .binary_search_by_key(&address, |&(at, _)| at)
            .is_ok()
    }

    /// The instruction starting at `address`, if any.
    pub fn instruction_at(&self, address: usize) -> Option<Instruction> {
        self.instructions
            .binary_search_by_key(&address, |&(at, _)| at)
            .ok()
            .map(|index| self.instructions[index].1)
    }

    /// Addresses of every instruction, in order.
    pub fn boundaries(&self) -> Vec<usize> {
        self.instructions.iter().map(|&(at, _)| at).collect()
    }
}

/// Run the structural pass.
///
/// Returns the layout and any errors found.
pub fn check_structural(code: &[i32]) -> (Layout, Vec<VerifyError>) {
    let mut layout = Layout {
        len: code.len(),
        ..Layout::default()
    };
    let mut errors = Vec::new();

    let mut at = 0;
    while at < code.len() {
        match Instruction::decode(code, at) {
            Ok(instr) => {
                layout.instructions.push((at, instr));
                at += instr.width();
            }
            Err(DecodeError::InvalidOpcode(word)) => {
                errors.push(VerifyError::InvalidOpcode { at, word });
                layout.fatal = true;
                break;
            }
            Err(DecodeError::TruncatedInstruction {
                at,
                mnemonic,
                expected,
                available,
            }) => {
                errors.push(VerifyError::TruncatedInstruction {
                    at,
                    mnemonic,
                    expected,
                    available,
                });
                layout.fatal = true;
                break;
            }
            // `at` is always inside the code and no bytes are involved.
            Err(DecodeError::AddressOutOfRange { .. } | DecodeError::InvalidLength(_)) => break,
        }
    }

    (layout, errors)
}
