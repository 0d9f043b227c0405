//! stackvm engine: executes a flat code array of 32-bit words.
//!
//! The machine has:
//! - A bounded operand stack of `i32` values
//! - A zero-initialized global store sized by the host
//! - A frame pointer and call convention layered on the operand stack
//!
//! Two dispatch strategies share the same semantics on well-formed code.
//! The checked loop validates every precondition and reports a
//! [`RuntimeFault`]. The threaded loop runs from a handler table with no
//! checks and should only see code that passed the verifier.
//!
//! # Usage
//!
//! ```
//! use stackvm_common::{Instruction, Opcode, Program};
//! use stackvm_vm::{execute_with, ExitReason, VmConfig};
//!
//! let program = Program::from_instructions(&[
//!     Instruction::with_operand(Opcode::Iconst, 40),
//!     Instruction::with_operand(Opcode::Iconst, 2),
//!     Instruction::new(Opcode::Iadd),
//!     Instruction::new(Opcode::Print),
//!     Instruction::new(Opcode::Halt),
//! ]);
//!
//! let mut out = Vec::new();
//! let outcome = execute_with(&program.code, 0, 0, &VmConfig::default(), &mut out).unwrap();
//! assert_eq!(outcome.exit, ExitReason::Halt);
//! assert_eq!(out, b"42\n");
//! ```

mod checks;
pub mod config;
pub mod error;
mod execute;
mod frame;
pub mod machine;
pub mod stack;
mod threaded;
pub mod trace;

pub use config::{VmConfig, DEFAULT_GLOBAL_COUNT, DEFAULT_STACK_CAPACITY};
pub use error::{FaultKind, Registers, RuntimeFault};
pub use machine::{ExitReason, Machine, Outcome};
pub use stack::OperandStack;

use std::io::{self, Write};

/// Execute `code` from `start_ip` with the default stack capacity, writing
/// `print` output (and trace lines, when `trace` is set) to stdout.
///
/// Runs the checked dispatch loop.
///
/// # Errors
///
/// Returns [`RuntimeFault`] when an instruction's preconditions do not hold.
pub fn execute(
    code: &[i32],
    start_ip: usize,
    global_count: usize,
    trace: bool,
) -> Result<Outcome, RuntimeFault> {
    let config = VmConfig::default().with_trace(trace);
    let stdout = io::stdout();
    let mut out = stdout.lock();
    execute_with(code, start_ip, global_count, &config, &mut out)
}

/// Execute `code` with an explicit configuration and output sink.
///
/// # Errors
///
/// Returns [`RuntimeFault`] on a checked precondition failure, on an invalid
/// opcode in either mode, or when writing to `out` fails.
pub fn execute_with<W: Write>(
    code: &[i32],
    start_ip: usize,
    global_count: usize,
    config: &VmConfig,
    out: &mut W,
) -> Result<Outcome, RuntimeFault> {
    Machine::new(code, global_count, config).run(start_ip, out)
}
