//! Call-frame convention layered on the operand stack.
//!
//! At the moment `call` executes, the callee's arguments are already on the
//! stack. `call` pushes three bookkeeping slots above them:
//!
//! ```text
//!   ... [arg0] .. [argN-1] [nargs] [saved fp] [return address] [locals ...]
//!                                                  ^ fp
//! ```
//!
//! Arguments are therefore at `fp - 3 - (nargs - 1 - i)`: the last argument
//! pushed is `load -3`. Locals pushed by the callee start at `fp + 1`.
//! `ret` pops the return value, drops the locals, unwinds the bookkeeping,
//! discards the arguments and pushes the return value, leaving the caller's
//! stack as it was before the arguments plus one slot.
//!
//! These routines do not validate; see `checks.rs` for the checked path.

use crate::machine::Machine;

impl Machine<'_> {
    /// Push a frame and transfer control to `target`. Control returns to
    /// `return_to`, the address after the `call` instruction.
    pub(crate) fn enter_frame(&mut self, target: usize, nargs: i32, return_to: usize) {
        let saved_fp = self.fp_value() as i32;
        self.stack.push(nargs);
        self.stack.push(saved_fp);
        self.stack.push(return_to as i32);
        self.fp = Some(self.stack.depth() - 1);
        self.ip = target;
    }

    /// Pop the active frame and push the return value for the caller.
    pub(crate) fn leave_frame(&mut self) {
        let value = self.stack.pop();
        self.stack.truncate(self.fp.map_or(0, |fp| fp + 1));
        // A negative return address lands past the end of the code.
        self.ip = usize::try_from(self.stack.pop()).unwrap_or(usize::MAX);
        self.fp = usize::try_from(self.stack.pop()).ok();
        let nargs = self.stack.pop();
        self.stack.discard(usize::try_from(nargs).unwrap_or(0));
        self.stack.push(value);
    }
}
