//! Checked dispatch: decode, validate, then execute.
//!
//! Each opcode word is decoded through the instruction table and matched.
//! All of an instruction's preconditions are checked before it mutates the
//! stack, frame or global store.

use std::io::Write;

use crate::error::{FaultKind, RuntimeFault};
use crate::machine::{ExitReason, Flow, Machine};
use stackvm_common::Opcode;

impl Machine<'_> {
    /// Run the checked loop until `halt`, the end of the code, or a fault.
    pub(crate) fn run_checked(&mut self, out: &mut dyn Write) -> Result<ExitReason, RuntimeFault> {
        while self.ip < self.code.len() {
            self.at = self.ip;
            let word = self.code[self.at];
            let opcode =
                Opcode::try_from(word).map_err(|_| self.fault(FaultKind::InvalidOpcode(word)))?;

            self.steps += 1;
            self.trace_before(out)?;
            self.ip = self.at + opcode.width();
            let flow = self.step_checked(opcode, out)?;
            self.trace_after(out)?;

            if flow == Flow::Halt {
                self.ip = self.at;
                return Ok(ExitReason::Halt);
            }
        }
        Ok(ExitReason::EndOfCode)
    }

    fn step_checked(&mut self, opcode: Opcode, out: &mut dyn Write) -> Result<Flow, RuntimeFault> {
        match opcode {
            Opcode::Noop => {}
            Opcode::Halt => return Ok(Flow::Halt),

            // Arithmetic wraps on overflow.
            Opcode::Iadd => self.binary_op(i32::wrapping_add)?,
            Opcode::Isub => self.binary_op(i32::wrapping_sub)?,
            Opcode::Imul => self.binary_op(i32::wrapping_mul)?,
            Opcode::Ilt => self.binary_op(|a, b| i32::from(a < b))?,
            Opcode::Ieq => self.binary_op(|a, b| i32::from(a == b))?,

            Opcode::Br => {
                self.ip = self.code_target(0)?;
            }
            Opcode::Brt => self.branch_if(1)?,
            Opcode::Brf => self.branch_if(0)?,

            Opcode::Iconst => {
                let value = self.operand(0)?;
                self.room(1)?;
                self.stack.push(value);
            }
            Opcode::Load => {
                let offset = self.operand(0)?;
                self.room(1)?;
                let slot = self.frame_slot(offset, self.stack.depth())?;
                let value = self.stack.get(slot);
                self.stack.push(value);
            }
            Opcode::Store => {
                let offset = self.operand(0)?;
                self.need(1)?;
                // The popped slot itself is no longer live once popped.
                let slot = self.frame_slot(offset, self.stack.depth() - 1)?;
                let value = self.stack.pop();
                self.stack.set(slot, value);
            }
            Opcode::Gload => {
                let index = self.global_index(0)?;
                self.room(1)?;
                self.stack.push(self.globals[index]);
            }
            Opcode::Gstore => {
                let index = self.global_index(0)?;
                self.need(1)?;
                self.globals[index] = self.stack.pop();
            }

            Opcode::Print => {
                self.need(1)?;
                self.print(out)?;
            }
            Opcode::Pop => {
                self.need(1)?;
                self.stack.pop();
            }

            Opcode::Call => {
                let target = self.code_target(0)?;
                let nargs = self.operand(1)?;
                self.check_call(nargs)?;
                let return_to = self.ip;
                self.enter_frame(target, nargs, return_to);
            }
            Opcode::Ret => {
                self.need(1)?;
                self.check_ret()?;
                self.leave_frame();
            }
        }
        Ok(Flow::Continue)
    }

    /// Pop b, pop a, push `op(a, b)`.
    fn binary_op(&mut self, op: fn(i32, i32) -> i32) -> Result<(), RuntimeFault> {
        self.need(2)?;
        let b = self.stack.pop();
        let a = self.stack.pop();
        self.stack.push(op(a, b));
        Ok(())
    }

    /// Pop the condition and jump when it equals `when` exactly. The target
    /// operand is validated and consumed whether or not the branch is taken.
    fn branch_if(&mut self, when: i32) -> Result<(), RuntimeFault> {
        let target = self.code_target(0)?;
        self.need(1)?;
        if self.stack.pop() == when {
            self.ip = target;
        }
        Ok(())
    }
}
