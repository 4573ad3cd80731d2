//! Test helpers for interpreter tests
//!
//! Common utilities for tokenizing programs and driving the scheduler

use crate::interpreter::{RunOptions, RunReport, Scheduler, Thread, ThreadId, Val};
use crate::parser;

/// Tokenize `source` and build a scheduler for it
pub fn scheduler_for(source: &str) -> Scheduler {
    let program = parser::tokenize(source).expect("Tokenize failed");
    Scheduler::new(&program)
}

/// Run `source` to completion with default options
///
/// Every run must finish without a dangling join; the join bookkeeping is
/// broken if one shows up.
pub fn run(source: &str) -> (Scheduler, RunReport) {
    run_with(source, &RunOptions::default())
}

pub fn run_with(source: &str, options: &RunOptions) -> (Scheduler, RunReport) {
    let mut scheduler = scheduler_for(source);
    let report = scheduler.run(options);
    assert_eq!(report.dangling_joins, 0, "dangling join in {:?}", source);
    (scheduler, report)
}

/// Final stack of a terminated thread
pub fn final_stack(scheduler: &Scheduler, id: ThreadId) -> Vec<Val> {
    scheduler
        .outcomes()
        .get(&id)
        .unwrap_or_else(|| panic!("thread {} has not terminated", id))
        .stack
        .clone()
}

/// Root thread of a fresh program, not yet scheduled
pub fn root_thread(source: &str) -> Thread {
    let program = parser::tokenize(source).expect("Tokenize failed");
    Thread::new(0, &program)
}

pub fn nums(values: &[f64]) -> Vec<Val> {
    values.iter().map(|v| Val::Num(*v)).collect()
}

/// Trace ips of one thread, in execution order
pub fn ips_of(scheduler: &Scheduler, id: ThreadId) -> Vec<usize> {
    scheduler.trace().for_thread(id).map(|e| e.ip).collect()
}
