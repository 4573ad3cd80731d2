//! Tests for the execution trace of whole runs

use super::helpers::run;
use crate::interpreter::{run_source, RunOptions, TraceEvent, TraceFormat};

const NESTED: &str = "2 3 map2 [ dup 1 map2 [ + ] ]";

#[test]
fn test_trace_is_deterministic() {
    let (first, _) = run(NESTED);
    let (second, _) = run(NESTED);

    assert_eq!(
        first.trace().to_json().unwrap(),
        second.trace().to_json().unwrap()
    );
}

#[test]
fn test_one_event_per_step() {
    let (scheduler, report) = run(NESTED);

    assert_eq!(scheduler.trace().len(), report.steps);
}

#[test]
fn test_map_event_shows_popped_stack() {
    let (scheduler, _) = run("3 4 map2 [ dup * ]");

    let events: Vec<&TraceEvent> = scheduler.trace().for_thread(0).collect();
    assert_eq!(events[2].ip, 2);
    assert_eq!(events[2].stack, "");
    assert_eq!(events[2].call_stack, "");
}

#[test]
fn test_child_events_carry_seed_block_marker() {
    let (scheduler, _) = run("3 4 map2 [ dup * ]");

    let child: Vec<(usize, &str, &str)> = scheduler
        .trace()
        .for_thread(1)
        .map(|e| (e.ip, e.stack.as_str(), e.call_stack.as_str()))
        .collect();
    assert_eq!(child, vec![(3, "3", "3"), (4, "3|3", "3"), (5, "9", "3")]);
}

#[test]
fn test_run_source_with_custom_delimiter() {
    let (scheduler, report) = run_source("1 2.5 true", ",", &RunOptions::default()).unwrap();

    assert_eq!(report.steps, 3);
    let last = scheduler.trace().events().last().unwrap();
    assert_eq!(last.stack, "1,2.5,true");
}

#[test]
fn test_json_export_round_trips() {
    let (scheduler, _) = run("1 0 map2 [ if [ map3 ] 5 ]");

    let json = scheduler.trace().to_json().unwrap();
    let events: Vec<TraceEvent> = serde_json::from_str(&json).unwrap();

    assert_eq!(events, scheduler.trace().events());
    assert_eq!(events.iter().filter(|e| e.fault.is_some()).count(), 1);
}

#[test]
fn test_write_to_text() {
    let (scheduler, _) = run("1 2 +");

    let mut out = Vec::new();
    scheduler
        .trace()
        .write_to(&mut out, TraceFormat::Text)
        .unwrap();

    assert_eq!(String::from_utf8(out).unwrap(), "0\t0\t1\t\n0\t1\t1|2\t\n0\t2\t3\t\n");
}
