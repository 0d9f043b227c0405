//! Opcode definitions and the static instruction table.
//!
//! The table is fixed at build time: every opcode has a mnemonic and a
//! declared operand count of 0, 1 or 2. Instruction boundaries in a code
//! array are found only by walking these operand counts.

use crate::error::DecodeError;

/// Identifies the operation to perform.
///
/// The `#[repr(u8)]` discriminants are the wire encoding: a code word equal
/// to the discriminant decodes to that opcode.
#[repr(u8)]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Opcode {
    /// No state change.
    Noop = 0,

    // Arithmetic
    /// Pop b, pop a, push a + b.
    Iadd = 1,
    /// Pop b, pop a, push a - b.
    Isub = 2,
    /// Pop b, pop a, push a * b.
    Imul = 3,

    // Comparison
    /// Pop b, pop a, push 1 if a < b else 0.
    Ilt = 4,
    /// Pop b, pop a, push 1 if a == b else 0.
    Ieq = 5,

    // Control flow
    /// Return from the current call frame.
    Ret = 6,
    /// Unconditional jump to the immediate target.
    Br = 7,
    /// Pop condition, jump if it equals 1.
    Brt = 8,
    /// Pop condition, jump if it equals 0.
    Brf = 9,

    // Data movement
    /// Push the immediate literal.
    Iconst = 10,
    /// Push `stack[fp + offset]`.
    Load = 11,
    /// Push `globals[index]`.
    Gload = 12,
    /// Pop into `stack[fp + offset]`.
    Store = 13,
    /// Pop into `globals[index]`.
    Gstore = 14,

    // Output and stack control
    /// Pop and write the value as a line of text.
    Print = 15,
    /// Discard the top of stack.
    Pop = 16,
    /// Stop execution.
    Halt = 17,

    /// Call `target` with `nargs` arguments already on the stack.
    Call = 18,
}

/// Number of opcodes in the instruction table.
pub const OPCODE_COUNT: usize = 19;

/// All valid opcodes, in encoding order. Index `i` holds the opcode whose
/// wire value is `i`.
pub const ALL_OPCODES: [Opcode; OPCODE_COUNT] = [
    Opcode::Noop,
    Opcode::Iadd,
    Opcode::Isub,
    Opcode::Imul,
    Opcode::Ilt,
    Opcode::Ieq,
    Opcode::Ret,
    Opcode::Br,
    Opcode::Brt,
    Opcode::Brf,
    Opcode::Iconst,
    Opcode::Load,
    Opcode::Gload,
    Opcode::Store,
    Opcode::Gstore,
    Opcode::Print,
    Opcode::Pop,
    Opcode::Halt,
    Opcode::Call,
];

impl TryFrom<i32> for Opcode {
    type Error = DecodeError;

    fn try_from(value: i32) -> Result<Self, Self::Error> {
        usize::try_from(value)
            .ok()
            .and_then(|index| ALL_OPCODES.get(index))
            .copied()
            .ok_or(DecodeError::InvalidOpcode(value))
    }
}

impl Opcode {
    /// Returns the assembly mnemonic for this opcode.
    pub fn mnemonic(&self) -> &'static str {
        match self {
            Opcode::Noop => "noop",
            Opcode::Iadd => "iadd",
            Opcode::Isub => "isub",
            Opcode::Imul => "imul",
            Opcode::Ilt => "ilt",
            Opcode::Ieq => "ieq",
            Opcode::Ret => "ret",
            Opcode::Br => "br",
            Opcode::Brt => "brt",
            Opcode::Brf => "brf",
            Opcode::Iconst => "iconst",
            Opcode::Load => "load",
            Opcode::Gload => "gload",
            Opcode::Store => "store",
            Opcode::Gstore => "gstore",
            Opcode::Print => "print",
            Opcode::Pop => "pop",
            Opcode::Halt => "halt",
            Opcode::Call => "call",
        }
    }

    /// Number of code words following the opcode that belong to it.
    pub fn operand_count(&self) -> usize {
        match self {
            Opcode::Noop
            | Opcode::Iadd
            | Opcode::Isub
            | Opcode::Imul
            | Opcode::Ilt
            | Opcode::Ieq
            | Opcode::Ret
            | Opcode::Print
            | Opcode::Pop
            | Opcode::Halt => 0,

            Opcode::Br
            | Opcode::Brt
            | Opcode::Brf
            | Opcode::Iconst
            | Opcode::Load
            | Opcode::Gload
            | Opcode::Store
            | Opcode::Gstore => 1,

            Opcode::Call => 2,
        }
    }

    /// Total width of the instruction in code words, opcode included.
    pub fn width(&self) -> usize {
        1 + self.operand_count()
    }

    /// Look up an opcode by mnemonic, ignoring ASCII case.
    pub fn from_mnemonic(mnemonic: &str) -> Option<Opcode> {
        ALL_OPCODES
            .iter()
            .find(|op| op.mnemonic().eq_ignore_ascii_case(mnemonic))
            .copied()
    }

    /// True for opcodes whose first operand is a code address.
    pub fn has_code_target(&self) -> bool {
        matches!(self, Opcode::Br | Opcode::Brt | Opcode::Brf | Opcode::Call)
    }
}
