//! Decode errors for stackvm code arrays.

use thiserror::Error;

/// Errors that occur while decoding code words or binary program files.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum DecodeError {
    /// The word is not in the instruction table.
    #[error("invalid opcode: {0}")]
    InvalidOpcode(i32),

    /// The opcode at `at` declares more operands than the code array holds.
    #[error("{mnemonic} at {at} needs {expected} operand(s), only {available} left")]
    TruncatedInstruction {
        at: usize,
        mnemonic: &'static str,
        expected: usize,
        available: usize,
    },

    /// An instruction was requested at an address past the end of the code.
    #[error("address {at} is past the end of the code ({len} words)")]
    AddressOutOfRange { at: usize, len: usize },

    /// Byte stream length is not a multiple of 4.
    #[error("invalid byte stream length: {0} (must be multiple of 4)")]
    InvalidLength(usize),
}
