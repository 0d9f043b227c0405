//! Decoded instructions.
//!
//! A code array is a flat sequence of `i32` words. Each instruction is an
//! opcode word followed in place by its operands:
//! ```text
//! [iconst][1234][print][halt]
//!  opcode  imm   opcode opcode
//! ```
//! There is no length prefix; the opcode's operand count decides where the
//! next instruction starts.

use std::fmt;

use crate::error::DecodeError;
use crate::opcode::Opcode;

/// A single decoded instruction: an opcode and up to two operands.
///
/// Operand slots beyond the opcode's operand count are always zero, so two
/// instructions compare equal exactly when they encode to the same words.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Instruction {
    /// The operation to perform.
    pub opcode: Opcode,
    operands: [i32; 2],
}

impl Instruction {
    /// Create an instruction that takes no operands.
    pub fn new(opcode: Opcode) -> Self {
        Self {
            opcode,
            operands: [0, 0],
        }
    }

    /// Create a one-operand instruction.
    pub fn with_operand(opcode: Opcode, operand: i32) -> Self {
        Self {
            opcode,
            operands: [operand, 0],
        }
    }

    /// Create a `call` to `target` passing `nargs` stack arguments.
    pub fn call(target: i32, nargs: i32) -> Self {
        Self {
            opcode: Opcode::Call,
            operands: [target, nargs],
        }
    }

    /// Decode the instruction starting at `at`.
    pub fn decode(code: &[i32], at: usize) -> Result<Self, DecodeError> {
        let word = *code.get(at).ok_or(DecodeError::AddressOutOfRange {
            at,
            len: code.len(),
        })?;
        let opcode = Opcode::try_from(word)?;
        let expected = opcode.operand_count();
        let available = code.len() - at - 1;
        if available < expected {
            return Err(DecodeError::TruncatedInstruction {
                at,
                mnemonic: opcode.mnemonic(),
                expected,
                available,
            });
        }

        let mut operands = [0, 0];
        operands[..expected].copy_from_slice(&code[at + 1..at + 1 + expected]);
        Ok(Self { opcode, operands })
    }

    /// Append the wire encoding of this instruction to `code`.
    pub fn encode_into(&self, code: &mut Vec<i32>) {
        code.push(self.opcode as i32);
        code.extend_from_slice(self.operands());
    }

    /// The operands actually carried by this instruction.
    pub fn operands(&self) -> &[i32] {
        &self.operands[..self.opcode.operand_count()]
    }

    /// Width in code words, opcode included.
    pub fn width(&self) -> usize {
        self.opcode.width()
    }

    /// The code address this instruction may transfer control to, if any.
    pub fn target(&self) -> Option<i32> {
        if self.opcode.has_code_target() {
            Some(self.operands[0])
        } else {
            None
        }
    }
}

impl fmt::Display for Instruction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.opcode.mnemonic())?;
        for operand in self.operands() {
            write!(f, " {operand}")?;
        }
        Ok(())
    }
}
