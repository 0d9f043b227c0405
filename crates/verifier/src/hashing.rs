//! Program fingerprints.
//!
//! A fingerprint is the blake3 hash of the program's binary encoding
//! (little-endian words), so it identifies the exact bytes a `.svmb` file
//! holds.

use stackvm_common::Program;

/// Compute the blake3 fingerprint of a program.
pub fn fingerprint(program: &Program) -> blake3::Hash {
    blake3::hash(&program.encode())
}

/// Fingerprint as a lowercase hex string.
pub fn fingerprint_hex(program: &Program) -> String {
    fingerprint(program).to_hex().to_string()
}
