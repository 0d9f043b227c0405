//! Integration tests for the stackvm engine.
//!
//! Organized by instruction group, then by whole sample programs.

use stackvm_common::{Instruction, Opcode, Program};
use stackvm_vm::{
    execute_with, ExitReason, FaultKind, Outcome, Registers, RuntimeFault, VmConfig,
};

// ============================================================
// Helper functions
// ============================================================

fn op(opcode: Opcode) -> Instruction {
    Instruction::new(opcode)
}

fn iconst(value: i32) -> Instruction {
    Instruction::with_operand(Opcode::Iconst, value)
}

fn with(opcode: Opcode, operand: i32) -> Instruction {
    Instruction::with_operand(opcode, operand)
}

fn code(instructions: &[Instruction]) -> Vec<i32> {
    Program::from_instructions(instructions).code
}

/// Run with the given configuration and capture printed output.
fn run_with(
    code: &[i32],
    start_ip: usize,
    globals: usize,
    config: &VmConfig,
) -> (Result<Outcome, RuntimeFault>, String) {
    let mut out = Vec::new();
    let result = execute_with(code, start_ip, globals, config, &mut out);
    (result, String::from_utf8(out).unwrap())
}

/// Run checked from address 0 and expect success.
fn run_ok(code: &[i32], globals: usize) -> (Outcome, String) {
    let (result, out) = run_with(code, 0, globals, &VmConfig::default());
    (result.unwrap(), out)
}

/// Run checked from address 0 and expect a fault.
fn run_fault(code: &[i32], globals: usize) -> RuntimeFault {
    let (result, _) = run_with(code, 0, globals, &VmConfig::default());
    result.unwrap_err()
}

/// Recursive factorial at address 0, one argument, result left on the stack.
fn factorial_routine() -> Vec<Instruction> {
    vec![
        with(Opcode::Load, -3), // 0
        iconst(2),              // 2
        op(Opcode::Ilt),        // 4
        with(Opcode::Brf, 10),  // 5
        iconst(1),              // 7
        op(Opcode::Ret),        // 9
        with(Opcode::Load, -3), // 10
        with(Opcode::Load, -3), // 12
        iconst(1),              // 14
        op(Opcode::Isub),       // 16
        Instruction::call(0, 1), // 17
        op(Opcode::Imul),       // 20
        op(Opcode::Ret),        // 21
    ]
}

const MAIN: usize = 22;

/// Count global 1 from 0 up to `bound` (stored in global 0), optionally
/// calling factorial(12) on every iteration. Entry point is [`MAIN`].
fn counting_loop(bound: i32, call_factorial: bool) -> Vec<i32> {
    let mut instrs = factorial_routine();
    let end = if call_factorial { 52 } else { 46 };
    instrs.extend([
        iconst(bound),           // 22
        with(Opcode::Gstore, 0), // 24
        iconst(0),               // 26
        with(Opcode::Gstore, 1), // 28
        with(Opcode::Gload, 1),  // 30
        with(Opcode::Gload, 0),  // 32
        op(Opcode::Ilt),         // 34
        with(Opcode::Brf, end),  // 35
        with(Opcode::Gload, 1),  // 37
        iconst(1),               // 39
        op(Opcode::Iadd),        // 41
        with(Opcode::Gstore, 1), // 42
    ]);
    if call_factorial {
        instrs.extend([iconst(12), Instruction::call(0, 1), op(Opcode::Pop)]);
    }
    instrs.extend([with(Opcode::Br, 30), with(Opcode::Gload, 1), op(Opcode::Halt)]);
    code(&instrs)
}

// ============================================================
// Constants, printing and halting
// ============================================================

#[test]
fn hello_prints_1234() {
    let hello = code(&[iconst(1234), op(Opcode::Print), op(Opcode::Halt)]);
    let (outcome, out) = run_ok(&hello, 0);
    assert_eq!(out, "1234\n");
    assert_eq!(outcome.exit, ExitReason::Halt);
    assert!(outcome.stack.is_empty());
    assert_eq!(outcome.steps, 3);
}

#[test]
fn print_negative_value() {
    let (_, out) = run_ok(&code(&[iconst(-17), op(Opcode::Print)]), 0);
    assert_eq!(out, "-17\n");
}

#[test]
fn halt_stops_before_remaining_code() {
    let program = code(&[op(Opcode::Halt), iconst(1), op(Opcode::Print)]);
    let (outcome, out) = run_ok(&program, 0);
    assert_eq!(outcome.exit, ExitReason::Halt);
    assert!(out.is_empty());
}

#[test]
fn running_off_the_end_is_implicit_halt() {
    let (outcome, _) = run_ok(&code(&[iconst(3), op(Opcode::Noop)]), 0);
    assert_eq!(outcome.exit, ExitReason::EndOfCode);
    assert_eq!(outcome.stack, vec![3]);
}

#[test]
fn pop_discards_top() {
    let (outcome, _) = run_ok(&code(&[iconst(1), iconst(2), op(Opcode::Pop)]), 0);
    assert_eq!(outcome.stack, vec![1]);
}

// ============================================================
// Arithmetic and comparison
// ============================================================

#[test]
fn arithmetic_operand_order() {
    let cases = [
        (Opcode::Iadd, 7, 3, 10),
        (Opcode::Isub, 7, 3, 4),
        (Opcode::Imul, 7, 3, 21),
        (Opcode::Ilt, 3, 7, 1),
        (Opcode::Ilt, 7, 3, 0),
        (Opcode::Ieq, 7, 7, 1),
        (Opcode::Ieq, 7, 3, 0),
    ];
    for (opcode, a, b, expected) in cases {
        let (outcome, _) = run_ok(&code(&[iconst(a), iconst(b), op(opcode)]), 0);
        assert_eq!(outcome.stack, vec![expected], "{opcode:?} {a} {b}");
    }
}

#[test]
fn arithmetic_wraps() {
    let (outcome, _) = run_ok(&code(&[iconst(i32::MAX), iconst(1), op(Opcode::Iadd)]), 0);
    assert_eq!(outcome.stack, vec![i32::MIN]);
    let (outcome, _) = run_ok(&code(&[iconst(i32::MIN), iconst(-1), op(Opcode::Imul)]), 0);
    assert_eq!(outcome.stack, vec![i32::MIN]);
}

// ============================================================
// Branches
// ============================================================

#[test]
fn br_skips_code() {
    // br 4; iconst 1; iconst 2
    let program = code(&[with(Opcode::Br, 4), iconst(1), iconst(2)]);
    let (outcome, _) = run_ok(&program, 0);
    assert_eq!(outcome.stack, vec![2]);
}

#[test]
fn brt_and_brf_take_matching_condition() {
    // iconst c; br? 6; iconst 1; iconst 2
    for (opcode, condition, expected) in [
        (Opcode::Brt, 1, vec![2]),
        (Opcode::Brt, 0, vec![1, 2]),
        (Opcode::Brf, 0, vec![2]),
        (Opcode::Brf, 1, vec![1, 2]),
    ] {
        let program = code(&[iconst(condition), with(opcode, 6), iconst(1), iconst(2)]);
        let (outcome, _) = run_ok(&program, 0);
        assert_eq!(outcome.stack, expected, "{opcode:?} {condition}");
    }
}

#[test]
fn branch_target_out_of_range_faults() {
    for opcode in [Opcode::Br, Opcode::Brt, Opcode::Brf] {
        for target in [-1, 5, 1000] {
            let program = code(&[iconst(0), with(opcode, target)]);
            let fault = run_fault(&program, 0);
            assert_eq!(fault.kind, FaultKind::CodeOutOfRange, "{opcode:?} {target}");
            assert_eq!(fault.registers.ip, 2);
            assert_eq!(fault.registers.sp, 0);
        }
    }
}

#[test]
fn truncated_operand_faults() {
    let fault = run_fault(&[Opcode::Iconst as i32], 0);
    assert_eq!(fault.kind, FaultKind::CodeOutOfRange);
    let fault = run_fault(&[Opcode::Call as i32, 0], 0);
    assert_eq!(fault.kind, FaultKind::CodeOutOfRange);
}

// ============================================================
// Stack faults
// ============================================================

#[test]
fn underflow_faults_report_registers() {
    for opcode in [Opcode::Iadd, Opcode::Print, Opcode::Pop, Opcode::Ret] {
        let fault = run_fault(&code(&[op(opcode)]), 0);
        assert_eq!(fault.kind, FaultKind::StackUnderflow, "{opcode:?}");
        assert_eq!(fault.registers, Registers { ip: 0, sp: -1, fp: -1 });
    }
}

#[test]
fn overflow_faults_at_capacity() {
    let program = code(&[iconst(1), iconst(2), iconst(3)]);
    let config = VmConfig::default().with_stack_capacity(2);
    let (result, _) = run_with(&program, 0, 0, &config);
    let fault = result.unwrap_err();
    assert_eq!(fault.kind, FaultKind::StackOverflow);
    assert_eq!(fault.registers, Registers { ip: 4, sp: 1, fp: -1 });
}

#[test]
#[should_panic]
fn unchecked_overflow_never_grows_past_capacity() {
    let program = code(&[iconst(1), iconst(2), iconst(3), op(Opcode::Halt)]);
    let config = VmConfig::unchecked().with_stack_capacity(2);
    let _ = run_with(&program, 0, 0, &config);
}

#[test]
fn unchecked_run_fills_capacity_exactly() {
    let program = code(&[iconst(1), iconst(2), op(Opcode::Halt)]);
    let config = VmConfig::unchecked().with_stack_capacity(2);
    let (result, _) = run_with(&program, 0, 0, &config);
    assert_eq!(result.unwrap().stack, vec![1, 2]);
}

#[test]
fn invalid_opcode_faults_in_both_modes() {
    for config in [VmConfig::default(), VmConfig::unchecked()] {
        let (result, _) = run_with(&[Opcode::Noop as i32, 99], 0, 0, &config);
        let fault = result.unwrap_err();
        assert_eq!(fault.kind, FaultKind::InvalidOpcode(99));
        assert_eq!(fault.registers.ip, 1);
    }
}

#[test]
fn fault_message_names_kind_and_registers() {
    let fault = run_fault(&code(&[iconst(5), op(Opcode::Iadd)]), 0);
    assert_eq!(fault.to_string(), "stack_underflow at ip=2 sp=0 fp=-1");
}

// ============================================================
// Frames and globals
// ============================================================

#[test]
fn load_and_store_relative_to_frame() {
    // Without a frame, fp = -1: load 1 reads slot 0, store 2 writes slot 1.
    let program = code(&[
        iconst(5),
        iconst(0),
        with(Opcode::Load, 1),
        with(Opcode::Store, 2),
    ]);
    let (outcome, _) = run_ok(&program, 0);
    assert_eq!(outcome.stack, vec![5, 5]);
}

#[test]
fn load_outside_stack_faults() {
    let fault = run_fault(&code(&[iconst(5), with(Opcode::Load, 2)]), 0);
    assert_eq!(fault.kind, FaultKind::FrameOutOfRange);
}

#[test]
fn globals_start_zeroed_and_persist() {
    let program = code(&[
        iconst(9),
        with(Opcode::Gstore, 2),
        with(Opcode::Gload, 0),
        with(Opcode::Gload, 2),
    ]);
    let (outcome, _) = run_ok(&program, 3);
    assert_eq!(outcome.globals, vec![0, 0, 9]);
    assert_eq!(outcome.stack, vec![0, 9]);
}

#[test]
fn global_index_out_of_range_faults() {
    let fault = run_fault(&code(&[with(Opcode::Gload, 0)]), 0);
    assert_eq!(fault.kind, FaultKind::GlobalOutOfRange);
    let fault = run_fault(&code(&[iconst(1), with(Opcode::Gstore, -1)]), 4);
    assert_eq!(fault.kind, FaultKind::GlobalOutOfRange);
}

#[test]
fn call_ret_replaces_arguments_with_result() {
    // main: iconst 100; iconst 6; iconst 7; call mul 2; halt
    // mul:  load -4; load -3; imul; ret
    let program = code(&[
        iconst(100),
        iconst(6),
        iconst(7),
        Instruction::call(10, 2),
        op(Opcode::Halt),
        with(Opcode::Load, -4),
        with(Opcode::Load, -3),
        op(Opcode::Imul),
        op(Opcode::Ret),
    ]);
    let (outcome, _) = run_ok(&program, 0);
    assert_eq!(outcome.exit, ExitReason::Halt);
    assert_eq!(outcome.stack, vec![100, 42]);
}

#[test]
fn ret_without_frame_faults() {
    let fault = run_fault(&code(&[iconst(1), op(Opcode::Ret)]), 0);
    assert_eq!(fault.kind, FaultKind::FrameOutOfRange);
}

#[test]
fn call_target_out_of_range_faults() {
    let fault = run_fault(&code(&[Instruction::call(50, 0)]), 0);
    assert_eq!(fault.kind, FaultKind::CodeOutOfRange);
}

// ============================================================
// Sample programs
// ============================================================

#[test]
fn factorial_of_twelve() {
    let mut instrs = factorial_routine();
    instrs.extend([
        iconst(12),
        Instruction::call(0, 1),
        op(Opcode::Print),
        op(Opcode::Halt),
    ]);
    let program = code(&instrs);
    let (result, out) = run_with(&program, MAIN, 0, &VmConfig::default());
    let outcome = result.unwrap();
    assert_eq!(out, "479001600\n");
    assert_eq!(outcome.exit, ExitReason::Halt);
    assert!(outcome.stack.is_empty());
}

#[test]
fn counting_loop_reaches_bound() {
    let program = counting_loop(1_000_000, false);
    let (result, _) = run_with(&program, MAIN, 2, &VmConfig::default());
    let outcome = result.unwrap();
    assert_eq!(outcome.exit, ExitReason::Halt);
    assert_eq!(outcome.globals, vec![1_000_000, 1_000_000]);
    assert_eq!(outcome.stack, vec![1_000_000]);
}

#[test]
fn counting_loop_with_factorial_calls() {
    let program = counting_loop(500, true);
    for config in [VmConfig::default(), VmConfig::unchecked()] {
        let (result, _) = run_with(&program, MAIN, 2, &config);
        let outcome = result.unwrap();
        assert_eq!(outcome.globals, vec![500, 500]);
        assert_eq!(outcome.stack, vec![500]);
    }
}

// ============================================================
// Dispatch modes and tracing
// ============================================================

#[test]
fn unchecked_matches_checked_on_sample() {
    let program = counting_loop(200, true);
    let (checked, checked_out) = run_with(&program, MAIN, 2, &VmConfig::default());
    let (unchecked, unchecked_out) = run_with(&program, MAIN, 2, &VmConfig::unchecked());
    assert_eq!(checked.unwrap(), unchecked.unwrap());
    assert_eq!(checked_out, unchecked_out);
}

#[test]
fn repeated_runs_are_identical() {
    let program = counting_loop(50, true);
    let config = VmConfig::default().with_trace(true);
    let first = run_with(&program, MAIN, 2, &config);
    let second = run_with(&program, MAIN, 2, &config);
    assert_eq!(first.0.unwrap(), second.0.unwrap());
    assert_eq!(first.1, second.1);
}

#[test]
fn trace_output_for_hello() {
    let hello = code(&[iconst(1234), op(Opcode::Print), op(Opcode::Halt)]);
    for config in [VmConfig::default(), VmConfig::unchecked()] {
        let (result, out) = run_with(&hello, 0, 1, &config.with_trace(true));
        result.unwrap();
        assert_eq!(
            out,
            "0000:  iconst    1234      stack=[ 1234 ]\n\
             0002:  print               1234\n\
             stack=[ ]\n\
             0003:  halt                stack=[ ]\n\
             Data memory:\n\
             0000: 0\n"
        );
    }
}

#[test]
fn trace_does_not_change_results() {
    let program = counting_loop(20, true);
    let quiet = run_with(&program, MAIN, 2, &VmConfig::default()).0.unwrap();
    let traced = run_with(&program, MAIN, 2, &VmConfig::default().with_trace(true))
        .0
        .unwrap();
    assert_eq!(quiet, traced);
}
