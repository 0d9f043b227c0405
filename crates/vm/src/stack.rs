//! Operand stack with a fixed capacity.
//!
//! The stack grows upward: slot 0 is the bottom, `sp` indexes the topmost
//! occupied slot and is -1 when the stack is empty. All `capacity` slots
//! are allocated up front and never reallocated. The primitives here do
//! not validate anything. The checked dispatch loop validates with
//! [`OperandStack::has`] and [`OperandStack::has_room`] before calling
//! them; the threaded loop relies on slice bounds checks alone, so a
//! malformed program panics there instead of faulting.

/// Fixed-capacity operand stack.
#[derive(Debug, Clone)]
pub struct OperandStack {
    slots: Box<[i32]>,
    depth: usize,
}

impl OperandStack {
    /// Allocate a stack that can hold `capacity` values.
    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            slots: vec![0; capacity].into_boxed_slice(),
            depth: 0,
        }
    }

    /// Configured capacity.
    pub fn capacity(&self) -> usize {
        self.slots.len()
    }

    /// Number of occupied slots.
    pub fn depth(&self) -> usize {
        self.depth
    }

    /// Stack pointer: index of the top slot, -1 when empty.
    pub fn sp(&self) -> isize {
        self.depth as isize - 1
    }

    /// Occupied slots, bottom to top.
    pub fn as_slice(&self) -> &[i32] {
        &self.slots[..self.depth]
    }

    /// True if at least `n` slots are occupied.
    pub fn has(&self, n: usize) -> bool {
        self.depth >= n
    }

    /// True if `n` more values fit under the capacity.
    pub fn has_room(&self, n: usize) -> bool {
        self.slots.len() - self.depth >= n
    }

    /// Push onto the next free slot. Panics when the stack is full.
    pub(crate) fn push(&mut self, value: i32) {
        self.slots[self.depth] = value;
        self.depth += 1;
    }

    /// Remove and return the top value. Panics on an empty stack.
    pub(crate) fn pop(&mut self) -> i32 {
        let top = self.depth.wrapping_sub(1);
        let value = self.slots[top];
        self.depth = top;
        value
    }

    /// Value at absolute slot `index`. Panics if the slot is not occupied.
    pub(crate) fn get(&self, index: usize) -> i32 {
        self.as_slice()[index]
    }

    /// Overwrite absolute slot `index`. Panics if the slot is not occupied.
    pub(crate) fn set(&mut self, index: usize, value: i32) {
        self.slots[..self.depth][index] = value;
    }

    /// Shrink to `depth` occupied slots. Never grows the stack.
    pub(crate) fn truncate(&mut self, depth: usize) {
        self.depth = self.depth.min(depth);
    }

    /// Drop `n` values from the top, stopping at empty.
    pub(crate) fn discard(&mut self, n: usize) {
        self.depth = self.depth.saturating_sub(n);
    }

    pub(crate) fn into_vec(self) -> Vec<i32> {
        self.as_slice().to_vec()
    }
}
