//! stackvm common types and code-array encoding.
//!
//! This crate provides the foundational data structures for the stackvm
//! instruction set:
//!
//! - [`Opcode`]: the fixed instruction table (mnemonic and operand count)
//! - [`Instruction`]: a decoded opcode with its in-place operands
//! - [`Program`]: a code array plus its little-endian binary encoding
//! - [`DecodeError`]: errors from decoding words or byte streams
//!
//! # Dependencies
//!
//! This crate uses `thiserror` (compile-time proc-macro, zero runtime cost)
//! and has no other dependencies.

pub mod error;
pub mod instruction;
pub mod opcode;
pub mod program;

// Re-export commonly used types at the crate root.
pub use error::DecodeError;
pub use instruction::Instruction;
pub use opcode::{Opcode, ALL_OPCODES, OPCODE_COUNT};
pub use program::Program;
