//! Tests for thread failures
//!
//! A failing instruction kills its own thread only. The fault is reported
//! with the instruction's original index and shows up on the thread's last
//! trace event.

use super::helpers::{final_stack, nums, run};
use crate::interpreter::{RunStatus, ThreadError};

/// The single fault of a run, as (thread, ip, error)
fn only_fault(source: &str) -> (u64, usize, ThreadError) {
    let (_, report) = run(source);
    assert_eq!(report.status, RunStatus::Completed);
    assert_eq!(report.faults.len(), 1, "{:?}", report.faults);
    let fault = &report.faults[0];
    (fault.thread, fault.ip, fault.error.clone())
}

#[test]
fn test_unterminated_seed_block() {
    let (scheduler, report) = run("1 2 map2 [ dup");

    let fault = &report.faults[0];
    assert_eq!(fault.ip, 2);
    match &fault.error {
        ThreadError::UnterminatedBlock { at } => assert_eq!(at.index, 3),
        other => panic!("Expected UnterminatedBlock, got {:?}", other),
    }

    // No children were created
    assert_eq!(scheduler.outcomes().keys().copied().collect::<Vec<_>>(), vec![0]);
    assert!(scheduler.outcomes()[&0].fault.is_some());
}

#[test]
fn test_unterminated_block_instruction() {
    let (thread, ip, error) = only_fault("1 [ 2 [ 3 ]");

    assert_eq!((thread, ip), (0, 1));
    assert!(matches!(error, ThreadError::UnterminatedBlock { at } if at.index == 1));
}

#[test]
fn test_map_arity_out_of_range() {
    let (thread, ip, error) = only_fault("1 2 map7 [ dup ]");

    assert_eq!((thread, ip), (0, 2));
    assert_eq!(error, ThreadError::MapArity { arity: 7 });
    assert!(error.is_malformed_map());
}

#[test]
fn test_malformed_map_keeps_stack() {
    let (scheduler, _) = run("1 2 map1 dup");

    assert_eq!(final_stack(&scheduler, 0), nums(&[1.0, 2.0]));
    assert!(scheduler.outcomes().get(&1).is_none());
}

#[test]
fn test_map_underflow() {
    let (_, _, error) = only_fault("1 2 map3 dup");

    assert_eq!(error, ThreadError::MapUnderflow { arity: 3, depth: 2 });
    assert_eq!(error.to_string(), "map3: needs 3 values, stack has 2");
}

#[test]
fn test_unknown_instruction() {
    let (scheduler, report) = run("1 foo 2");

    assert_eq!(report.faults[0].ip, 1);
    assert_eq!(
        report.faults[0].error,
        ThreadError::UnknownInstruction("foo".to_string())
    );
    // Nothing after the fault runs
    assert_eq!(final_stack(&scheduler, 0), nums(&[1.0]));
}

#[test]
fn test_unmatched_block_close() {
    let (_, ip, error) = only_fault("1 ] 2");

    assert_eq!(ip, 1);
    assert!(matches!(error, ThreadError::UnmatchedBlockClose { at } if at.index == 1));
}

#[test]
fn test_division_by_zero() {
    let (_, ip, error) = only_fault("1 0 /");

    assert_eq!(ip, 2);
    assert_eq!(error, ThreadError::DivisionByZero { op: "/".to_string() });
}

#[test]
fn test_type_mismatch() {
    let (_, _, error) = only_fault("true 1 +");

    assert_eq!(
        error,
        ThreadError::TypeMismatch {
            op: "+".to_string(),
            expected: "number",
            found: "boolean",
        }
    );
}

#[test]
fn test_stack_underflow() {
    let (_, _, error) = only_fault("1 swap");

    assert_eq!(error.to_string(), "swap: needs 2 values, stack has 1");
}

#[test]
fn test_child_failure_is_isolated() {
    // The child holding 1 reaches map3 on an empty stack and dies. The child
    // holding 0 skips that branch and finishes, and the parent still resumes.
    let (scheduler, report) = run("1 0 map2 [ if [ map3 ] 5 ]");

    assert_eq!(report.status, RunStatus::Completed);
    assert_eq!(report.faults.len(), 1);
    assert_eq!(report.faults[0].thread, 1);
    assert_eq!(report.faults[0].ip, 6);
    assert_eq!(
        report.faults[0].error,
        ThreadError::MapUnderflow { arity: 3, depth: 0 }
    );

    assert_eq!(final_stack(&scheduler, 2), nums(&[5.0]));
    assert_eq!(final_stack(&scheduler, 0), nums(&[5.0]));

    let last = scheduler.trace().for_thread(1).last().unwrap();
    assert_eq!(last.ip, 6);
    assert_eq!(
        last.fault.as_deref(),
        Some("map3: needs 3 values, stack has 0")
    );
    assert!(scheduler.trace().for_thread(2).all(|e| e.fault.is_none()));
}

#[test]
fn test_failed_operator_keeps_its_operands() {
    let cases = [
        ("1 0 /", "1|0"),
        ("4 0 %", "4|0"),
        ("true 1 +", "true|1"),
        ("1 false <", "1|false"),
    ];
    for (source, snapshot) in cases {
        let (scheduler, report) = run(source);
        assert_eq!(report.faults.len(), 1, "{}", source);

        let outcome = &scheduler.outcomes()[&0];
        assert!(outcome.fault.is_some(), "{}", source);
        assert_eq!(outcome.stack.len(), 2, "{}", source);

        let last = scheduler.trace().for_thread(0).last().unwrap();
        assert_eq!(last.stack, snapshot, "{}", source);
        assert!(last.fault.is_some());
    }
}

#[test]
fn test_failed_arithmetic_underflow_keeps_stack() {
    let (scheduler, report) = run("3 +");

    assert_eq!(
        report.faults[0].error,
        ThreadError::StackUnderflow {
            op: "+".to_string(),
            needed: 2,
            depth: 1,
        }
    );
    assert_eq!(final_stack(&scheduler, 0), nums(&[3.0]));
}
