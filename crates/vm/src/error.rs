//! Runtime faults for the stackvm engine.
//!
//! There is a single error type. A fault names its cause and carries the
//! register values at the faulting instruction. Faults are unrecoverable:
//! the engine stops at the first one.

use std::fmt;

use thiserror::Error;

/// Cause of a [`RuntimeFault`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum FaultKind {
    /// The opcode reads more values than the stack holds.
    StackUnderflow,
    /// A push would exceed the configured stack capacity.
    StackOverflow,
    /// An operand slot, branch target, call target or return address lies
    /// outside the code array.
    CodeOutOfRange,
    /// The word at the instruction pointer is not in the instruction table.
    InvalidOpcode(i32),
    /// A `load`/`store` address is outside the live stack, or `ret` found no
    /// valid frame.
    FrameOutOfRange,
    /// A `gload`/`gstore` index is outside the global store.
    GlobalOutOfRange,
    /// The output writer failed during `print` or tracing.
    OutputFailed,
}

impl FaultKind {
    /// Short machine-readable cause name.
    pub fn name(&self) -> &'static str {
        match self {
            FaultKind::StackUnderflow => "stack_underflow",
            FaultKind::StackOverflow => "stack_overflow",
            FaultKind::CodeOutOfRange => "code_out_of_range",
            FaultKind::InvalidOpcode(_) => "invalid_opcode",
            FaultKind::FrameOutOfRange => "frame_out_of_range",
            FaultKind::GlobalOutOfRange => "global_out_of_range",
            FaultKind::OutputFailed => "output_failed",
        }
    }
}

impl fmt::Display for FaultKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FaultKind::InvalidOpcode(word) => write!(f, "{} {word}", self.name()),
            _ => f.write_str(self.name()),
        }
    }
}

/// Register snapshot. `sp` and `fp` use -1 for "empty" and "no frame".
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Registers {
    /// Address of the instruction being executed.
    pub ip: usize,
    /// Index of the topmost occupied stack slot.
    pub sp: isize,
    /// Frame pointer: the active call's return-address slot.
    pub fp: isize,
}

impl fmt::Display for Registers {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "ip={} sp={} fp={}", self.ip, self.sp, self.fp)
    }
}

/// The only error the engine raises.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
#[error("{kind} at {registers}")]
pub struct RuntimeFault {
    pub kind: FaultKind,
    pub registers: Registers,
}
