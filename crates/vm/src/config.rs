//! Engine configuration.
//!
//! Capacities are fixed before execution starts. Exceeding them is a fault
//! in the checked configuration, never a reallocation trigger.

/// Operand stack capacity used when none is configured.
pub const DEFAULT_STACK_CAPACITY: usize = 1024;

/// Global store size used by hosts that do not declare one.
pub const DEFAULT_GLOBAL_COUNT: usize = 0;

/// Options selected by the host before a run.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct VmConfig {
    /// Maximum number of occupied operand stack slots.
    pub stack_capacity: usize,
    /// Validate every precondition before mutating state (checked dispatch).
    /// When false, the threaded dispatch loop runs with no checks and trusts
    /// the code array to be well-formed.
    pub checked: bool,
    /// Emit per-step trace lines and a final global dump.
    pub trace: bool,
}

impl Default for VmConfig {
    fn default() -> Self {
        Self {
            stack_capacity: DEFAULT_STACK_CAPACITY,
            checked: true,
            trace: false,
        }
    }
}

impl VmConfig {
    /// Default configuration with the safety checker compiled out of the loop.
    pub fn unchecked() -> Self {
        Self {
            checked: false,
            ..Self::default()
        }
    }

    pub fn with_stack_capacity(mut self, stack_capacity: usize) -> Self {
        self.stack_capacity = stack_capacity;
        self
    }

    pub fn with_checked(mut self, checked: bool) -> Self {
        self.checked = checked;
        self
    }

    pub fn with_trace(mut self, trace: bool) -> Self {
        self.trace = trace;
        self
    }
}
