//! Verification errors for the stackvm verifier.
//!
//! Every error that concerns a single instruction carries its address
//! (`at`). The verifier collects ALL errors, not just the first.

use thiserror::Error;

/// Errors found during static verification.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum VerifyError {
    // --- Limits ---
    /// Code array exceeds the maximum size.
    #[error("program too large: {size} words (max {max})")]
    ProgramTooLarge { size: usize, max: usize },

    // --- Structural ---
    /// The word at an instruction boundary is not an opcode.
    #[error("invalid opcode {word} at {at}")]
    InvalidOpcode { at: usize, word: i32 },

    /// The last instruction runs past the end of the code.
    #[error("{mnemonic} at {at} needs {expected} operand(s), only {available} left")]
    TruncatedInstruction {
        at: usize,
        mnemonic: &'static str,
        expected: usize,
        available: usize,
    },

    // --- Targets ---
    /// A branch or call target lies outside the code array.
    #[error("{mnemonic} at {at}: target {target} outside code of {len} words")]
    TargetOutOfRange {
        at: usize,
        mnemonic: &'static str,
        target: i32,
        len: usize,
    },

    /// A branch or call target lands inside another instruction's operands.
    #[error("{mnemonic} at {at}: target {target} is not an instruction boundary")]
    TargetNotBoundary {
        at: usize,
        mnemonic: &'static str,
        target: usize,
    },

    /// A call passes a negative number of arguments.
    #[error("call at {at}: negative argument count {nargs}")]
    NegativeArgCount { at: usize, nargs: i32 },

    /// The entry point is neither an instruction boundary nor the code length.
    #[error("entry point {start_ip} is not an instruction boundary")]
    BadEntryPoint { start_ip: usize },

    // --- Globals ---
    /// A global access names a slot outside the declared store.
    #[error("{mnemonic} at {at}: global {index} outside store of {global_count}")]
    GlobalOutOfRange {
        at: usize,
        mnemonic: &'static str,
        index: i32,
        global_count: usize,
    },

    // --- Stack ---
    /// An instruction pops more values than the path leading to it pushed.
    #[error("{mnemonic} at {at} needs {needed} stack value(s), only {depth} available")]
    StackUnderflow {
        at: usize,
        mnemonic: &'static str,
        needed: usize,
        depth: usize,
    },

    /// Two paths reach the same instruction with different stack depths.
    #[error("stack depth at {at} is {expected} on one path and {found} on another")]
    StackMismatch {
        at: usize,
        expected: usize,
        found: usize,
    },

    /// A `load` or `store` offset leaves the slots its frame owns.
    #[error("{mnemonic} at {at}: offset {offset} outside the frame")]
    FrameOutOfRange {
        at: usize,
        mnemonic: &'static str,
        offset: i32,
    },

    /// A `ret` is reachable from the entry point without an active call.
    #[error("ret at {at} is reachable outside any call")]
    RetOutsideCall { at: usize },

    /// The static stack bound exceeds the configured capacity.
    #[error("stack may reach {depth} slots, capacity is {capacity}")]
    StackTooDeep { depth: usize, capacity: usize },
}
