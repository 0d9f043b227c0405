//! Threaded dispatch: a static handler table indexed by the raw opcode word.
//!
//! No preconditions are checked. Handlers index the code, stack and global
//! store directly, so a malformed program panics on a slice bounds check
//! (or silently misbehaves) instead of raising a fault. Only words outside
//! the instruction table are still reported, because the table lookup needs
//! a bounds test anyway.

use std::io::Write;

use crate::error::{FaultKind, RuntimeFault};
use crate::machine::{ExitReason, Flow, Machine};
use stackvm_common::OPCODE_COUNT;

type Handler = fn(&mut Machine<'_>, &mut dyn Write) -> Result<Flow, RuntimeFault>;

/// Handlers in opcode encoding order.
static HANDLERS: [Handler; OPCODE_COUNT] = [
    op_noop,
    op_iadd,
    op_isub,
    op_imul,
    op_ilt,
    op_ieq,
    op_ret,
    op_br,
    op_brt,
    op_brf,
    op_iconst,
    op_load,
    op_gload,
    op_store,
    op_gstore,
    op_print,
    op_pop,
    op_halt,
    op_call,
];

impl Machine<'_> {
    /// Run the threaded loop until `halt`, the end of the code, or an
    /// invalid opcode.
    pub(crate) fn run_threaded(&mut self, out: &mut dyn Write) -> Result<ExitReason, RuntimeFault> {
        while self.ip < self.code.len() {
            self.at = self.ip;
            let word = self.code[self.at];
            let handler = usize::try_from(word)
                .ok()
                .and_then(|index| HANDLERS.get(index))
                .copied()
                .ok_or_else(|| self.fault(FaultKind::InvalidOpcode(word)))?;

            self.steps += 1;
            self.trace_before(out)?;
            self.ip = self.at + 1;
            let flow = handler(self, out)?;
            self.trace_after(out)?;

            if flow == Flow::Halt {
                self.ip = self.at;
                return Ok(ExitReason::Halt);
            }
        }
        Ok(ExitReason::EndOfCode)
    }

    /// Consume the next code word as an operand.
    fn next_operand(&mut self) -> i32 {
        let value = self.code[self.ip];
        self.ip += 1;
        value
    }

    /// Slot addressed by `fp + offset`. Wraps to an out-of-range index when
    /// negative.
    fn frame_address(&self, offset: i32) -> usize {
        (self.fp_value() + offset as isize) as usize
    }

    fn binary(&mut self, op: fn(i32, i32) -> i32) -> Result<Flow, RuntimeFault> {
        let b = self.stack.pop();
        let a = self.stack.pop();
        self.stack.push(op(a, b));
        Ok(Flow::Continue)
    }

    fn jump_if(&mut self, when: i32) -> Result<Flow, RuntimeFault> {
        let target = self.next_operand();
        if self.stack.pop() == when {
            self.ip = target as usize;
        }
        Ok(Flow::Continue)
    }
}

fn op_noop(_m: &mut Machine<'_>, _out: &mut dyn Write) -> Result<Flow, RuntimeFault> {
    Ok(Flow::Continue)
}

fn op_iadd(m: &mut Machine<'_>, _out: &mut dyn Write) -> Result<Flow, RuntimeFault> {
    m.binary(i32::wrapping_add)
}

fn op_isub(m: &mut Machine<'_>, _out: &mut dyn Write) -> Result<Flow, RuntimeFault> {
    m.binary(i32::wrapping_sub)
}

fn op_imul(m: &mut Machine<'_>, _out: &mut dyn Write) -> Result<Flow, RuntimeFault> {
    m.binary(i32::wrapping_mul)
}

fn op_ilt(m: &mut Machine<'_>, _out: &mut dyn Write) -> Result<Flow, RuntimeFault> {
    m.binary(|a, b| i32::from(a < b))
}

fn op_ieq(m: &mut Machine<'_>, _out: &mut dyn Write) -> Result<Flow, RuntimeFault> {
    m.binary(|a, b| i32::from(a == b))
}

fn op_ret(m: &mut Machine<'_>, _out: &mut dyn Write) -> Result<Flow, RuntimeFault> {
    m.leave_frame();
    Ok(Flow::Continue)
}

fn op_br(m: &mut Machine<'_>, _out: &mut dyn Write) -> Result<Flow, RuntimeFault> {
    // A negative target wraps past the end of the code and stops the loop.
    m.ip = m.next_operand() as usize;
    Ok(Flow::Continue)
}

fn op_brt(m: &mut Machine<'_>, _out: &mut dyn Write) -> Result<Flow, RuntimeFault> {
    m.jump_if(1)
}

fn op_brf(m: &mut Machine<'_>, _out: &mut dyn Write) -> Result<Flow, RuntimeFault> {
    m.jump_if(0)
}

fn op_iconst(m: &mut Machine<'_>, _out: &mut dyn Write) -> Result<Flow, RuntimeFault> {
    let value = m.next_operand();
    m.stack.push(value);
    Ok(Flow::Continue)
}

fn op_load(m: &mut Machine<'_>, _out: &mut dyn Write) -> Result<Flow, RuntimeFault> {
    let offset = m.next_operand();
    let value = m.stack.get(m.frame_address(offset));
    m.stack.push(value);
    Ok(Flow::Continue)
}

fn op_gload(m: &mut Machine<'_>, _out: &mut dyn Write) -> Result<Flow, RuntimeFault> {
    let index = m.next_operand() as usize;
    m.stack.push(m.globals[index]);
    Ok(Flow::Continue)
}

fn op_store(m: &mut Machine<'_>, _out: &mut dyn Write) -> Result<Flow, RuntimeFault> {
    let offset = m.next_operand();
    let address = m.frame_address(offset);
    let value = m.stack.pop();
    m.stack.set(address, value);
    Ok(Flow::Continue)
}

fn op_gstore(m: &mut Machine<'_>, _out: &mut dyn Write) -> Result<Flow, RuntimeFault> {
    let index = m.next_operand() as usize;
    m.globals[index] = m.stack.pop();
    Ok(Flow::Continue)
}

fn op_print(m: &mut Machine<'_>, out: &mut dyn Write) -> Result<Flow, RuntimeFault> {
    m.print(out)?;
    Ok(Flow::Continue)
}

fn op_pop(m: &mut Machine<'_>, _out: &mut dyn Write) -> Result<Flow, RuntimeFault> {
    m.stack.pop();
    Ok(Flow::Continue)
}

fn op_halt(_m: &mut Machine<'_>, _out: &mut dyn Write) -> Result<Flow, RuntimeFault> {
    Ok(Flow::Halt)
}

fn op_call(m: &mut Machine<'_>, _out: &mut dyn Write) -> Result<Flow, RuntimeFault> {
    let target = m.next_operand() as usize;
    let nargs = m.next_operand();
    let return_to = m.ip;
    m.enter_frame(target, nargs, return_to);
    Ok(Flow::Continue)
}
