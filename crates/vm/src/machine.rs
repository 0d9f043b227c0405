//! Machine state: registers, operand stack, global store.

use std::io::Write;

use crate::config::VmConfig;
use crate::error::{FaultKind, Registers, RuntimeFault};
use crate::stack::OperandStack;
use crate::trace;

/// Why a run stopped without faulting.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExitReason {
    /// A `halt` instruction executed.
    Halt,
    /// The instruction pointer reached or passed the end of the code.
    EndOfCode,
}

/// Final state of a completed run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Outcome {
    pub exit: ExitReason,
    /// The global store, index 0 first.
    pub globals: Vec<i32>,
    /// Occupied stack slots, bottom to top.
    pub stack: Vec<i32>,
    /// Instructions dispatched, `halt` included.
    pub steps: u64,
}

/// Result of executing one instruction.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum Flow {
    Continue,
    Halt,
}

/// One execution of one code array.
///
/// A machine owns its stack and global store; nothing is shared between
/// runs. [`Machine::run`] consumes the machine.
pub struct Machine<'a> {
    /// The code array being executed.
    pub(crate) code: &'a [i32],
    pub(crate) stack: OperandStack,
    pub(crate) globals: Vec<i32>,
    /// Next code slot to interpret.
    pub(crate) ip: usize,
    /// Return-address slot of the active frame, `None` before any call.
    pub(crate) fp: Option<usize>,
    /// Address of the instruction currently executing.
    pub(crate) at: usize,
    pub(crate) steps: u64,
    checked: bool,
    trace: bool,
}

impl<'a> Machine<'a> {
    /// Create a machine for `code` with a zeroed global store of
    /// `global_count` slots.
    pub fn new(code: &'a [i32], global_count: usize, config: &VmConfig) -> Self {
        Self {
            code,
            stack: OperandStack::with_capacity(config.stack_capacity),
            globals: vec![0; global_count],
            ip: 0,
            fp: None,
            at: 0,
            steps: 0,
            checked: config.checked,
            trace: config.trace,
        }
    }

    /// Execute from `start_ip` until `halt`, the end of the code, or a fault.
    ///
    /// `print` output and trace lines are written to `out`.
    pub fn run<W: Write>(
        mut self,
        start_ip: usize,
        out: &mut W,
    ) -> Result<Outcome, RuntimeFault> {
        let out: &mut dyn Write = out;
        self.ip = start_ip;

        let exit = if self.checked {
            self.run_checked(out)?
        } else {
            self.run_threaded(out)?
        };

        if self.trace {
            // `halt` traced its own stack line inside the loop.
            if exit == ExitReason::EndOfCode {
                self.emit(trace::write_stack(out, self.stack.as_slice()))?;
            }
            self.emit(trace::write_globals(out, &self.globals))?;
        }
        self.emit(out.flush())?;

        Ok(Outcome {
            exit,
            globals: self.globals,
            stack: self.stack.into_vec(),
            steps: self.steps,
        })
    }

    /// Register values at the current instruction.
    pub fn registers(&self) -> Registers {
        Registers {
            ip: self.at,
            sp: self.stack.sp(),
            fp: self.fp_value(),
        }
    }

    /// Frame pointer as stored on the stack: -1 when there is no frame.
    pub(crate) fn fp_value(&self) -> isize {
        self.fp.map_or(-1, |fp| fp as isize)
    }

    pub(crate) fn fault(&self, kind: FaultKind) -> RuntimeFault {
        RuntimeFault {
            kind,
            registers: self.registers(),
        }
    }

    /// Map an output error to a fault.
    pub(crate) fn emit(&self, result: std::io::Result<()>) -> Result<(), RuntimeFault> {
        result.map_err(|_| self.fault(FaultKind::OutputFailed))
    }

    /// Trace the instruction about to execute.
    pub(crate) fn trace_before(&self, out: &mut dyn Write) -> Result<(), RuntimeFault> {
        if self.trace {
            self.emit(trace::write_instruction(out, self.code, self.at))?;
        }
        Ok(())
    }

    /// Trace the stack left by the instruction that just executed.
    pub(crate) fn trace_after(&self, out: &mut dyn Write) -> Result<(), RuntimeFault> {
        if self.trace {
            self.emit(trace::write_stack(out, self.stack.as_slice()))?;
        }
        Ok(())
    }

    pub(crate) fn print(&mut self, out: &mut dyn Write) -> Result<(), RuntimeFault> {
        let value = self.stack.pop();
        self.emit(writeln!(out, "{value}"))
    }
}
