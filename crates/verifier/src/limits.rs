//! Size limits for stackvm programs.

use crate::error::VerifyError;

/// Maximum program size in code words.
pub const MAX_PROGRAM_SIZE: usize = 1 << 24;

/// Run the limits check.
pub fn check_limits(code: &[i32]) -> Vec<VerifyError> {
    if code.len() > MAX_PROGRAM_SIZE {
        vec![VerifyError::ProgramTooLarge {
            size: code.len(),
            max: MAX_PROGRAM_SIZE,
        }]
    } else {
        Vec::new()
    }
}
