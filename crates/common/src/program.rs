//! Program representation for stackvm code arrays.
//!
//! A program is a flat array of 32-bit words. Binary files (.svmb) are the
//! raw little-endian words with no header: the array is the entire program.

use crate::error::DecodeError;
use crate::instruction::Instruction;

/// Width of one code word in the binary encoding.
pub const WORD_BYTES: usize = 4;

/// A stackvm program: the code array an engine executes.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Program {
    /// Opcodes and their operands, interleaved in place.
    pub code: Vec<i32>,
}

impl Program {
    /// Create a program from raw code words.
    pub fn new(code: Vec<i32>) -> Self {
        Self { code }
    }

    /// Lay out a sequence of instructions back to back.
    pub fn from_instructions(instructions: &[Instruction]) -> Self {
        let mut code = Vec::with_capacity(instructions.iter().map(Instruction::width).sum());
        for instr in instructions {
            instr.encode_into(&mut code);
        }
        Self { code }
    }

    /// Encode the program to bytes. Each word becomes 4 little-endian bytes.
    pub fn encode(&self) -> Vec<u8> {
        let mut bytes = Vec::with_capacity(self.code.len() * WORD_BYTES);
        for word in &self.code {
            bytes.extend_from_slice(&word.to_le_bytes());
        }
        bytes
    }

    /// Decode a byte slice into a program.
    ///
    /// The byte slice length must be a multiple of 4. Words are not checked
    /// against the instruction table here: operands share the word space
    /// with opcodes, so only an instruction walk can tell them apart.
    pub fn decode(bytes: &[u8]) -> Result<Self, DecodeError> {
        if !bytes.len().is_multiple_of(WORD_BYTES) {
            return Err(DecodeError::InvalidLength(bytes.len()));
        }

        let code = bytes
            .chunks_exact(WORD_BYTES)
            .map(|chunk| i32::from_le_bytes([chunk[0], chunk[1], chunk[2], chunk[3]]))
            .collect();
        Ok(Self { code })
    }

    /// Number of code words in the program.
    pub fn len(&self) -> usize {
        self.code.len()
    }

    /// Returns true if the program has no code words.
    pub fn is_empty(&self) -> bool {
        self.code.is_empty()
    }

    /// Walk instruction boundaries starting at address 0.
    ///
    /// Yields `(address, instruction)` pairs. The first decode error ends
    /// the walk, because every later boundary depends on it.
    pub fn instructions(&self) -> Instructions<'_> {
        Instructions {
            code: &self.code,
            at: 0,
            failed: false,
        }
    }
}

/// Iterator over the instructions of a code array. See [`Program::instructions`].
#[derive(Debug, Clone)]
pub struct Instructions<'a> {
    code: &'a [i32],
    at: usize,
    failed: bool,
}

impl Iterator for Instructions<'_> {
    type Item = Result<(usize, Instruction), DecodeError>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.failed || self.at >= self.code.len() {
            return None;
        }

        let at = self.at;
        match Instruction::decode(self.code, at) {
            Ok(instr) => {
                self.at += instr.width();
                Some(Ok((at, instr)))
            }
            Err(e) => {
                self.failed = true;
                Some(Err(e))
            }
        }
    }
}
