//! Precondition checks used by the checked dispatch loop.
//!
//! Every check runs before the instruction mutates anything, so a fault
//! leaves the machine exactly as it was when the instruction started.

use crate::error::{FaultKind, RuntimeFault};
use crate::machine::Machine;

impl Machine<'_> {
    /// Require `n` occupied stack slots.
    pub(crate) fn need(&self, n: usize) -> Result<(), RuntimeFault> {
        if self.stack.has(n) {
            Ok(())
        } else {
            Err(self.fault(FaultKind::StackUnderflow))
        }
    }

    /// Require room for `n` more stack values.
    pub(crate) fn room(&self, n: usize) -> Result<(), RuntimeFault> {
        if self.stack.has_room(n) {
            Ok(())
        } else {
            Err(self.fault(FaultKind::StackOverflow))
        }
    }

    /// Read operand `k` of the current instruction.
    pub(crate) fn operand(&self, k: usize) -> Result<i32, RuntimeFault> {
        self.code
            .get(self.at + 1 + k)
            .copied()
            .ok_or_else(|| self.fault(FaultKind::CodeOutOfRange))
    }

    /// Read operand `k` as a code address inside `[0, length)`.
    pub(crate) fn code_target(&self, k: usize) -> Result<usize, RuntimeFault> {
        let target = self.operand(k)?;
        usize::try_from(target)
            .ok()
            .filter(|&t| t < self.code.len())
            .ok_or_else(|| self.fault(FaultKind::CodeOutOfRange))
    }

    /// Read operand `k` as an index into the global store.
    pub(crate) fn global_index(&self, k: usize) -> Result<usize, RuntimeFault> {
        let index = self.operand(k)?;
        usize::try_from(index)
            .ok()
            .filter(|&i| i < self.globals.len())
            .ok_or_else(|| self.fault(FaultKind::GlobalOutOfRange))
    }

    /// Resolve `fp + offset` to a slot among the lowest `live` occupied slots.
    pub(crate) fn frame_slot(&self, offset: i32, live: usize) -> Result<usize, RuntimeFault> {
        let address = self.fp_value() + offset as isize;
        usize::try_from(address)
            .ok()
            .filter(|&a| a < live)
            .ok_or_else(|| self.fault(FaultKind::FrameOutOfRange))
    }

    /// Validate a call passing `nargs` arguments.
    pub(crate) fn check_call(&self, nargs: i32) -> Result<(), RuntimeFault> {
        let nargs = usize::try_from(nargs).map_err(|_| self.fault(FaultKind::StackUnderflow))?;
        self.need(nargs)?;
        // argument count, saved frame pointer, return address
        self.room(3)
    }

    /// Validate that `ret` will find a well-formed frame beneath the
    /// return value.
    pub(crate) fn check_ret(&self) -> Result<(), RuntimeFault> {
        let fp = self.fp.ok_or_else(|| self.fault(FaultKind::FrameOutOfRange))?;
        if fp < 2 {
            return Err(self.fault(FaultKind::FrameOutOfRange));
        }
        // The return value must sit above the return-address slot.
        if !self.stack.has(fp + 2) {
            return Err(self.fault(FaultKind::StackUnderflow));
        }

        let return_to = self.stack.get(fp);
        if usize::try_from(return_to).map_or(true, |r| r > self.code.len()) {
            return Err(self.fault(FaultKind::CodeOutOfRange));
        }

        let args_top = fp - 2;
        let saved_fp = self.stack.get(fp - 1);
        if saved_fp < -1 || saved_fp as isize >= args_top as isize {
            return Err(self.fault(FaultKind::FrameOutOfRange));
        }

        let nargs = self.stack.get(args_top);
        if usize::try_from(nargs).map_or(true, |n| n > args_top) {
            return Err(self.fault(FaultKind::StackUnderflow));
        }
        Ok(())
    }
}
