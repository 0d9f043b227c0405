//! Trace rendering.
//!
//! Before each step the engine writes the instruction (without a newline);
//! after the step it completes the line with the stack contents. After the
//! run it dumps the global store. Tracing never changes computed results.

use std::io::{self, Write};

use stackvm_common::Instruction;

/// Write `{ip:04}:  mnemonic operands`, padded so the stack column lines up.
pub fn write_instruction(out: &mut dyn Write, code: &[i32], at: usize) -> io::Result<()> {
    match Instruction::decode(code, at) {
        Ok(instr) if instr.operands().is_empty() => {
            write!(out, "{at:04}:  {:<20}", instr.opcode.mnemonic())
        }
        Ok(instr) => {
            let operands = instr
                .operands()
                .iter()
                .map(i32::to_string)
                .collect::<Vec<_>>()
                .join(", ");
            write!(out, "{at:04}:  {:<10}{:<10}", instr.opcode.mnemonic(), operands)
        }
        Err(_) => {
            let word = code.get(at).map_or_else(|| "?".to_string(), i32::to_string);
            write!(out, "{at:04}:  {:<20}", format!("<{word}>"))
        }
    }
}

/// Write `stack=[ v0 v1 ... ]` and end the line.
pub fn write_stack(out: &mut dyn Write, stack: &[i32]) -> io::Result<()> {
    write!(out, "stack=[")?;
    for value in stack {
        write!(out, " {value}")?;
    }
    writeln!(out, " ]")
}

/// Write the global store as `index: value` lines.
pub fn write_globals(out: &mut dyn Write, globals: &[i32]) -> io::Result<()> {
    writeln!(out, "Data memory:")?;
    for (index, value) in globals.iter().enumerate() {
        writeln!(out, "{index:04}: {value}")?;
    }
    Ok(())
}
