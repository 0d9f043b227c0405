//! Tokenizer for stackvm assembly text.

use crate::error::AsmError;

/// A single token from an assembly line.
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) enum Token {
    /// An identifier: opcode mnemonic or label reference. Case preserved.
    Ident(String),
    /// A label definition (`name:`), without the colon.
    Label(String),
    /// A directive (`.name`), without the dot, lowercased.
    Directive(String),
    /// A numeric literal (decimal or hex, optionally negative).
    Number(i32),
}

/// Tokenize a single line of assembly text.
///
/// Returns an empty Vec for blank lines and comment-only lines.
/// Comments start with `;` and extend to end of line. Operands may be
/// separated by whitespace or commas, so trace output reads back in.
pub(crate) fn tokenize_line(line: &str, line_num: usize) -> Result<Vec<Token>, AsmError> {
    // Strip comment
    let line = match line.find(';') {
        Some(pos) => &line[..pos],
        None => line,
    };

    let mut tokens = Vec::new();
    for word in line
        .split(|c: char| c.is_whitespace() || c == ',')
        .filter(|w| !w.is_empty())
    {
        let token = if word.starts_with(|c: char| c.is_ascii_digit() || c == '-') {
            let value = parse_number(word).ok_or_else(|| AsmError::InvalidNumber {
                line: line_num,
                token: word.to_string(),
            })?;
            Token::Number(value)
        } else if let Some(name) = word.strip_suffix(':') {
            if !is_identifier(name) {
                return Err(AsmError::UnexpectedToken {
                    line: line_num,
                    token: word.to_string(),
                });
            }
            Token::Label(name.to_string())
        } else if let Some(name) = word.strip_prefix('.') {
            Token::Directive(name.to_lowercase())
        } else if is_identifier(word) {
            Token::Ident(word.to_string())
        } else {
            return Err(AsmError::UnexpectedToken {
                line: line_num,
                token: word.to_string(),
            });
        };
        tokens.push(token);
    }

    Ok(tokens)
}

/// Letters, digits and underscores, not starting with a digit.
fn is_identifier(word: &str) -> bool {
    word.starts_with(|c: char| c.is_ascii_alphabetic() || c == '_')
        && word.chars().all(|c| c.is_ascii_alphanumeric() || c == '_')
}

/// Parse a decimal or `0x` hex literal with an optional leading `-`.
///
/// Decimal values must fit an `i32`. Positive hex values up to `0xffffffff`
/// are taken as the word's bit pattern.
fn parse_number(word: &str) -> Option<i32> {
    let (negative, body) = match word.strip_prefix('-') {
        Some(rest) => (true, rest),
        None => (false, word),
    };
    let (hex, digits) = match body.strip_prefix("0x").or_else(|| body.strip_prefix("0X")) {
        Some(digits) => (true, digits),
        None => (false, body),
    };

    let valid_digit = |c: char| if hex { c.is_ascii_hexdigit() } else { c.is_ascii_digit() };
    if digits.is_empty() || digits.len() > 16 || !digits.chars().all(valid_digit) {
        return None;
    }

    let magnitude = i64::from_str_radix(digits, if hex { 16 } else { 10 }).ok()?;
    if negative {
        i32::try_from(-magnitude).ok()
    } else if hex {
        u32::try_from(magnitude).ok().map(|bits| bits as i32)
    } else {
        i32::try_from(magnitude).ok()
    }
}
