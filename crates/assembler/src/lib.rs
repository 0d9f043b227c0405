//! stackvm assembler: text ↔ code array translation.
//!
//! The assembler is a mechanical translation with labels. No optimization,
//! no macros.
//!
//! # Syntax
//!
//! - one instruction per line, `;` starts a comment
//! - mnemonics are case-insensitive; operands are decimal or `0x` hex
//!   numbers (optionally negative) or label names
//! - `name:` defines a label at the current address
//! - `.globals N` sets the global store size, `.entry label-or-address`
//!   the start address, `.word N` emits a raw word
//!
//! # Usage
//!
//! ```
//! use stackvm_assembler::{assemble, disassemble};
//!
//! let text = "\
//! .entry main
//! double: load -3
//!         load -3
//!         iadd
//!         ret
//! main:   iconst 21
//!         call double 1
//!         print
//!         halt
//! ";
//! let assembly = assemble(text).unwrap();
//! assert_eq!(assembly.entry, 6);
//! assert!(disassemble(&assembly.program).starts_with("load -3\n"));
//! ```
//!
//! # Roundtrip Guarantee
//!
//! `assemble(disassemble(program)).program == program` holds for every code
//! array. The disassembler outputs canonical text; the assembler accepts
//! both canonical and non-canonical input (labels, hex, upper case).

pub mod error;

mod disassembler;
mod lexer;
mod parser;

pub use error::AsmError;

use std::collections::HashMap;

use lexer::tokenize_line;
use parser::{parse_line, Item, Operand};
use stackvm_common::Program;

/// An assembled program with the metadata its directives declared.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Assembly {
    pub program: Program,
    /// Start address from `.entry` (0 when absent).
    pub entry: usize,
    /// Global store size from `.globals` (0 when absent).
    pub globals: usize,
}

/// Assemble text into a code array.
///
/// Labels may be used before they are defined. When a directive appears
/// more than once, the last one wins. Returns the first error encountered.
pub fn assemble(text: &str) -> Result<Assembly, AsmError> {
    // Pass 1: parse every line and assign label addresses.
    let mut lines = Vec::new();
    let mut labels: HashMap<String, (usize, usize)> = HashMap::new();
    let mut address = 0;

    for (idx, line) in text.lines().enumerate() {
        let line_num = idx + 1;
        let parsed = parse_line(&tokenize_line(line, line_num)?, line_num)?;
        for label in parsed.labels {
            if let Some(&(_, first)) = labels.get(&label) {
                return Err(AsmError::DuplicateLabel {
                    line: line_num,
                    label,
                    first,
                });
            }
            labels.insert(label, (address, line_num));
        }
        if let Some(item) = parsed.item {
            address += item.width();
            lines.push((line_num, item));
        }
    }

    // Pass 2: resolve operands and emit code.
    let resolve = |operand: &Operand, line_num: usize| -> Result<i32, AsmError> {
        match operand {
            Operand::Number(n) => Ok(*n),
            Operand::Label(name) => {
                let &(address, _) = labels.get(name).ok_or_else(|| AsmError::UndefinedLabel {
                    line: line_num,
                    label: name.clone(),
                })?;
                i32::try_from(address).map_err(|_| AsmError::InvalidNumber {
                    line: line_num,
                    token: name.clone(),
                })
            }
        }
    };

    let mut code = Vec::with_capacity(address);
    let mut entry = 0;
    let mut globals = 0;
    for (line_num, item) in &lines {
        match item {
            Item::Instruction { opcode, operands } => {
                code.push(*opcode as i32);
                for operand in operands {
                    code.push(resolve(operand, *line_num)?);
                }
            }
            Item::Word(word) => code.push(*word),
            Item::Globals(count) => globals = *count,
            Item::Entry(operand) => {
                let address = resolve(operand, *line_num)?;
                entry = usize::try_from(address).map_err(|_| AsmError::InvalidNumber {
                    line: *line_num,
                    token: address.to_string(),
                })?;
            }
        }
    }

    Ok(Assembly {
        program: Program::new(code),
        entry,
        globals,
    })
}

/// Disassemble a code array into canonical assembly text.
pub fn disassemble(program: &Program) -> String {
    disassembler::disassemble(program)
}

/// Assemble text that uses no directives and return only the program.
pub fn assemble_program(text: &str) -> Result<Program, AsmError> {
    assemble(text).map(|assembly| assembly.program)
}
