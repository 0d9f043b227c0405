//! Parser for stackvm assembly tokens.
//!
//! Turns one line's tokens into label definitions plus at most one item
//! (an instruction or a directive). Label operands stay unresolved here;
//! `assemble` resolves them once every label's address is known.

use crate::error::AsmError;
use crate::lexer::Token;
use stackvm_common::Opcode;

/// An operand as written: a number or a label to resolve.
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) enum Operand {
    Number(i32),
    Label(String),
}

/// The instruction or directive on a line.
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) enum Item {
    Instruction {
        opcode: Opcode,
        operands: Vec<Operand>,
    },
    /// `.globals N`
    Globals(usize),
    /// `.entry label-or-address`
    Entry(Operand),
    /// `.word N`
    Word(i32),
}

impl Item {
    /// Code words this item occupies.
    pub(crate) fn width(&self) -> usize {
        match self {
            Item::Instruction { opcode, .. } => opcode.width(),
            Item::Word(_) => 1,
            Item::Globals(_) | Item::Entry(_) => 0,
        }
    }
}

/// Parse result for a single line.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub(crate) struct Line {
    /// Labels defined at the start of the line.
    pub labels: Vec<String>,
    pub item: Option<Item>,
}

/// Parse a sequence of tokens from a single line.
pub(crate) fn parse_line(tokens: &[Token], line_num: usize) -> Result<Line, AsmError> {
    let mut line = Line::default();
    let mut rest = tokens;
    while let [Token::Label(name), tail @ ..] = rest {
        line.labels.push(name.clone());
        rest = tail;
    }

    let Some((head, args)) = rest.split_first() else {
        return Ok(line);
    };

    let item = match head {
        Token::Ident(mnemonic) => {
            let opcode =
                Opcode::from_mnemonic(mnemonic).ok_or_else(|| AsmError::UnknownOpcode {
                    line: line_num,
                    token: mnemonic.clone(),
                })?;
            let operands = exact_args(args, opcode.operand_count(), opcode.mnemonic(), line_num)?
                .iter()
                .map(|token| operand(token, line_num))
                .collect::<Result<Vec<_>, _>>()?;
            Item::Instruction { opcode, operands }
        }
        Token::Directive(name) => parse_directive(name, args, line_num)?,
        Token::Number(n) => return Err(unexpected(&n.to_string(), line_num)),
        Token::Label(name) => return Err(unexpected(&format!("{name}:"), line_num)),
    };

    line.item = Some(item);
    Ok(line)
}

fn parse_directive(name: &str, args: &[Token], line_num: usize) -> Result<Item, AsmError> {
    match name {
        "globals" => {
            let arg = &exact_args(args, 1, ".globals", line_num)?[0];
            match arg {
                Token::Number(n) => usize::try_from(*n).map(Item::Globals).map_err(|_| {
                    AsmError::InvalidNumber {
                        line: line_num,
                        token: n.to_string(),
                    }
                }),
                other => Err(unexpected(&describe(other), line_num)),
            }
        }
        "entry" => {
            let arg = &exact_args(args, 1, ".entry", line_num)?[0];
            match operand(arg, line_num)? {
                Operand::Number(n) if n < 0 => Err(AsmError::InvalidNumber {
                    line: line_num,
                    token: n.to_string(),
                }),
                entry => Ok(Item::Entry(entry)),
            }
        }
        "word" => {
            let arg = &exact_args(args, 1, ".word", line_num)?[0];
            match arg {
                Token::Number(n) => Ok(Item::Word(*n)),
                other => Err(unexpected(&describe(other), line_num)),
            }
        }
        _ => Err(AsmError::UnknownDirective {
            line: line_num,
            token: format!(".{name}"),
        }),
    }
}

/// Require exactly `expected` argument tokens.
fn exact_args<'t>(
    args: &'t [Token],
    expected: usize,
    name: &'static str,
    line_num: usize,
) -> Result<&'t [Token], AsmError> {
    if args.len() < expected {
        return Err(AsmError::MissingArgument {
            line: line_num,
            name,
            expected,
        });
    }
    if let Some(extra) = args.get(expected) {
        return Err(unexpected(&describe(extra), line_num));
    }
    Ok(args)
}

fn operand(token: &Token, line_num: usize) -> Result<Operand, AsmError> {
    match token {
        Token::Number(n) => Ok(Operand::Number(*n)),
        Token::Ident(name) => Ok(Operand::Label(name.clone())),
        other => Err(unexpected(&describe(other), line_num)),
    }
}

fn describe(token: &Token) -> String {
    match token {
        Token::Ident(s) => s.clone(),
        Token::Label(s) => format!("{s}:"),
        Token::Directive(s) => format!(".{s}"),
        Token::Number(n) => n.to_string(),
    }
}

fn unexpected(token: &str, line_num: usize) -> AsmError {
    AsmError::UnexpectedToken {
        line: line_num,
        token: token.to_string(),
    }
}
