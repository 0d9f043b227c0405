//! Stack depth pass: abstract stack depth at every reachable boundary.
//!
//! Code reachable from the entry point is walked with an empty stack and
//! no frame. Every call target is walked again as a callee, where depth
//! counts the slots above the frame's return-address slot and the
//! arguments sit below it. Each path must agree on the depth at a shared
//! boundary, never pop what it did not push, keep `load`/`store` inside
//! its frame, and only `ret` inside a callee.
//!
//! The peak depth of each walk gives a static bound on the whole stack
//! when the call graph has no cycles.

use std::collections::{BTreeMap, VecDeque};

use crate::error::VerifyError;
use crate::structural::Layout;
use stackvm_common::{Instruction, Opcode};

/// Slots `call` pushes above the arguments.
const FRAME_SLOTS: usize = 3;

/// Frame a walk runs in.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Context {
    /// Reached from the entry point: no frame, fp = -1.
    Entry,
    /// Entered by `call` with at least `args` arguments.
    Callee { args: usize },
}

/// What one walk learned.
#[derive(Debug, Default)]
struct Walk {
    peak: usize,
    /// Depth before each reachable `call`, with its target.
    calls: Vec<(usize, usize)>,
}

/// Run the stack depth pass.
///
/// Returns the static bound on stack depth (`None` when calls recurse)
/// and any errors found.
pub fn check_stack(layout: &Layout, start_ip: usize) -> (Option<usize>, Vec<VerifyError>) {
    let mut errors = Vec::new();

    // Fewest arguments any call site passes to each target.
    let mut callees: BTreeMap<usize, usize> = BTreeMap::new();
    for &(_, instr) in &layout.instructions {
        if instr.opcode != Opcode::Call {
            continue;
        }
        let (Some(target), Ok(nargs)) = (
            branch_target(layout, &instr),
            usize::try_from(instr.operands()[1]),
        ) else {
            continue;
        };
        callees
            .entry(target)
            .and_modify(|args| *args = (*args).min(nargs))
            .or_insert(nargs);
    }

    let entry = layout
        .is_boundary(start_ip)
        .then(|| walk(layout, start_ip, Context::Entry, &mut errors));
    let walks: BTreeMap<usize, Walk> = callees
        .iter()
        .map(|(&target, &args)| {
            let callee = walk(layout, target, Context::Callee { args }, &mut errors);
            (target, callee)
        })
        .collect();

    let max_depth = match &entry {
        Some(entry) => bound(entry, &walks, &mut Vec::new(), &mut BTreeMap::new()),
        None => Some(0),
    };
    (max_depth, errors)
}

fn walk(layout: &Layout, start: usize, context: Context, errors: &mut Vec<VerifyError>) -> Walk {
    let mut result = Walk::default();
    let mut depths = BTreeMap::from([(start, 0usize)]);
    let mut pending = VecDeque::from([start]);

    while let Some(at) = pending.pop_front() {
        let (Some(instr), Some(&depth)) = (layout.instruction_at(at), depths.get(&at)) else {
            continue;
        };
        let after = match step(at, &instr, depth, context) {
            Ok(after) => after,
            Err(error) => {
                report(errors, error);
                continue;
            }
        };

        result.peak = result.peak.max(after);
        if instr.opcode == Opcode::Call {
            if let Some(target) = branch_target(layout, &instr) {
                result.calls.push((depth, target));
            }
        }

        for next in successors(layout, at, &instr) {
            match depths.get(&next) {
                None => {
                    depths.insert(next, after);
                    pending.push_back(next);
                }
                Some(&expected) if expected != after => report(
                    errors,
                    VerifyError::StackMismatch {
                        at: next,
                        expected,
                        found: after,
                    },
                ),
                Some(_) => {}
            }
        }
    }
    result
}

/// Depth after `instr` executes at `depth`.
fn step(
    at: usize,
    instr: &Instruction,
    depth: usize,
    context: Context,
) -> Result<usize, VerifyError> {
    let (pops, pushes) = match instr.opcode {
        Opcode::Noop | Opcode::Br | Opcode::Halt => (0, 0),
        Opcode::Iadd | Opcode::Isub | Opcode::Imul | Opcode::Ilt | Opcode::Ieq => (2, 1),
        Opcode::Brt | Opcode::Brf | Opcode::Gstore | Opcode::Print | Opcode::Pop => (1, 0),
        Opcode::Iconst | Opcode::Gload | Opcode::Load => (0, 1),
        Opcode::Store => (1, 0),
        Opcode::Ret => {
            if context == Context::Entry {
                return Err(VerifyError::RetOutsideCall { at });
            }
            (1, 0)
        }
        // Negative counts are reported by the targets pass.
        Opcode::Call => (usize::try_from(instr.operands()[1]).unwrap_or(0), 1),
    };

    if depth < pops {
        return Err(VerifyError::StackUnderflow {
            at,
            mnemonic: instr.opcode.mnemonic(),
            needed: pops,
            depth,
        });
    }

    if matches!(instr.opcode, Opcode::Load | Opcode::Store) {
        let offset = instr.operands()[0];
        if !frame_access(instr.opcode, offset, depth, context) {
            return Err(VerifyError::FrameOutOfRange {
                at,
                mnemonic: instr.opcode.mnemonic(),
                offset,
            });
        }
    }

    Ok(depth - pops + pushes)
}

/// Whether `fp + offset` names a slot the instruction may touch.
///
/// Without a frame fp is -1, so offsets 1..=depth reach the stack. In a
/// callee, offsets above 0 are locals and offsets from -3 down are the
/// arguments. `load` may also read the frame's own bookkeeping; `store`
/// may not overwrite it, and never targets the value it pops.
fn frame_access(opcode: Opcode, offset: i32, depth: usize, context: Context) -> bool {
    let offset = i64::from(offset);
    let depth = depth as i64;
    let live = if opcode == Opcode::Store { depth - 1 } else { depth };

    match context {
        Context::Entry => (1..=live).contains(&offset),
        Context::Callee { args } => {
            let lowest = -(FRAME_SLOTS as i64 - 1) - args as i64;
            let top_of_frame = if opcode == Opcode::Store { -(FRAME_SLOTS as i64) } else { 0 };
            (lowest..=top_of_frame).contains(&offset) || (1..=live).contains(&offset)
        }
    }
}

/// A branch or call target that lands on an instruction boundary.
fn branch_target(layout: &Layout, instr: &Instruction) -> Option<usize> {
    instr
        .target()
        .and_then(|target| usize::try_from(target).ok())
        .filter(|&target| layout.is_boundary(target))
}

/// Addresses control can reach next within the same frame.
fn successors(layout: &Layout, at: usize, instr: &Instruction) -> Vec<usize> {
    let next = at + instr.width();
    let fallthrough = layout.is_boundary(next).then_some(next);
    match instr.opcode {
        Opcode::Halt | Opcode::Ret => Vec::new(),
        Opcode::Br => branch_target(layout, instr).into_iter().collect(),
        Opcode::Brt | Opcode::Brf => branch_target(layout, instr)
            .into_iter()
            .chain(fallthrough)
            .collect(),
        _ => fallthrough.into_iter().collect(),
    }
}

/// Deepest stack a walk can reach, following its calls.
fn bound(
    walk: &Walk,
    walks: &BTreeMap<usize, Walk>,
    active: &mut Vec<usize>,
    known: &mut BTreeMap<usize, Option<usize>>,
) -> Option<usize> {
    let mut deepest = walk.peak;
    for &(depth, target) in &walk.calls {
        let callee = callee_bound(target, walks, active, known)?;
        deepest = deepest.max(depth + FRAME_SLOTS + callee);
    }
    Some(deepest)
}

fn callee_bound(
    target: usize,
    walks: &BTreeMap<usize, Walk>,
    active: &mut Vec<usize>,
    known: &mut BTreeMap<usize, Option<usize>>,
) -> Option<usize> {
    if let Some(&result) = known.get(&target) {
        return result;
    }
    // A target already being bounded means the calls recurse.
    if active.contains(&target) {
        return None;
    }
    let walk = walks.get(&target)?;
    active.push(target);
    let result = bound(walk, walks, active, known);
    active.pop();
    known.insert(target, result);
    result
}

fn report(errors: &mut Vec<VerifyError>, error: VerifyError) {
    if !errors.contains(&error) {
        errors.push(error);
    }
}
