//! Disassembler: code array → canonical assembly text.
//!
//! Output format is flat text, one instruction per line, lowercase
//! mnemonics and decimal operands. No labels, no comments, no blank lines.
//! A word that does not start a complete instruction is emitted as
//! `.word N` and the walk resumes at the next word.

use stackvm_common::{Instruction, Program};

/// Disassemble a program into canonical assembly text.
///
/// The output is guaranteed to reassemble to an identical code array
/// (`assemble(disassemble(program)).program == program`).
pub fn disassemble(program: &Program) -> String {
    let code = &program.code;
    let mut text = String::new();
    let mut at = 0;

    while at < code.len() {
        match Instruction::decode(code, at) {
            Ok(instr) => {
                text.push_str(instr.opcode.mnemonic());
                for operand in instr.operands() {
                    text.push(' ');
                    text.push_str(&operand.to_string());
                }
                at += instr.width();
            }
            Err(_) => {
                text.push_str(".word ");
                text.push_str(&code[at].to_string());
                at += 1;
            }
        }
        text.push('\n');
    }

    text
}
