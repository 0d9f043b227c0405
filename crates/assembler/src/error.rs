//! Error types for the stackvm assembler.

use thiserror::Error;

/// Errors produced during assembly of text to a code array.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum AsmError {
    /// An unrecognized opcode mnemonic was encountered.
    #[error("line {line}: unknown opcode '{token}'")]
    UnknownOpcode { line: usize, token: String },

    /// An opcode or directive did not have enough arguments.
    #[error("line {line}: {name} expects {expected} argument(s)")]
    MissingArgument {
        line: usize,
        name: &'static str,
        expected: usize,
    },

    /// A numeric literal could not be parsed or is out of range.
    #[error("line {line}: invalid number '{token}'")]
    InvalidNumber { line: usize, token: String },

    /// A token appeared where it was not expected.
    #[error("line {line}: unexpected token '{token}'")]
    UnexpectedToken { line: usize, token: String },

    /// An operand names a label that is never defined.
    #[error("line {line}: undefined label '{label}'")]
    UndefinedLabel { line: usize, label: String },

    /// A label is defined twice.
    #[error("line {line}: label '{label}' already defined on line {first}")]
    DuplicateLabel {
        line: usize,
        label: String,
        first: usize,
    },

    /// A `.name` directive the assembler does not know.
    #[error("line {line}: unknown directive '{token}'")]
    UnknownDirective { line: usize, token: String },
}
