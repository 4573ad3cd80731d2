//! Execution trace
//!
//! One event per executed instruction, in execution order. The trace is the
//! only thing external consumers (the visualizer) see of a run, so the JSON
//! field names are fixed: `tid`, `ip`, `stack`, `callStack`, `fault`.

use serde::{Deserialize, Serialize};
use std::io::Write;

use super::thread::{Thread, ThreadId};
use super::types::SourcePos;

/// Default separator between values in stack snapshots
pub const DEFAULT_DELIMITER: &str = "|";

/* ===================== Events ===================== */

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TraceEvent {
    /// Thread that executed the instruction
    pub tid: ThreadId,

    /// Index of the instruction in the original token stream
    pub ip: usize,

    /// Value stack after the instruction, joined by the delimiter
    pub stack: String,

    /// Original indices of the enclosing blocks, joined by the delimiter
    #[serde(rename = "callStack")]
    pub call_stack: String,

    /// Set on the terminal event of a thread that failed
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub fault: Option<String>,
}

/// Output format for exported traces
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize, clap::ValueEnum)]
#[serde(rename_all = "lowercase")]
pub enum TraceFormat {
    /// JSON array of events
    #[default]
    Json,
    /// One tab-separated line per event
    Text,
}

/* ===================== Trace Log ===================== */

/// Append-only event log
#[derive(Debug, Clone)]
pub struct TraceLog {
    events: Vec<TraceEvent>,
    delimiter: String,
}

impl Default for TraceLog {
    fn default() -> Self {
        Self::new(DEFAULT_DELIMITER)
    }
}

impl TraceLog {
    pub fn new(delimiter: impl Into<String>) -> Self {
        Self {
            events: Vec::new(),
            delimiter: delimiter.into(),
        }
    }

    /// Append the event for an instruction `thread` just executed at `pos`
    pub fn record(&mut self, thread: &Thread, pos: SourcePos, fault: Option<String>) {
        self.events.push(TraceEvent {
            tid: thread.id,
            ip: pos.index,
            stack: thread.stack_snapshot(&self.delimiter),
            call_stack: thread.call_marker(&self.delimiter),
            fault,
        });
    }

    pub fn events(&self) -> &[TraceEvent] {
        &self.events
    }

    pub fn len(&self) -> usize {
        self.events.len()
    }

    pub fn is_empty(&self) -> bool {
        self.events.is_empty()
    }

    /// Events of one thread, in execution order
    pub fn for_thread(&self, tid: ThreadId) -> impl Iterator<Item = &TraceEvent> + '_ {
        self.events.iter().filter(move |event| event.tid == tid)
    }

    /* ===================== Export ===================== */

    pub fn to_json(&self) -> serde_json::Result<String> {
        serde_json::to_string(&self.events)
    }

    /// One line per event: `tid<TAB>ip<TAB>stack<TAB>callStack[<TAB>!fault]`
    pub fn to_text(&self) -> String {
        let mut out = String::new();
        for event in &self.events {
            out.push_str(&format!(
                "{}\t{}\t{}\t{}",
                event.tid, event.ip, event.stack, event.call_stack
            ));
            if let Some(fault) = &event.fault {
                out.push_str(&format!("\t!{}", fault));
            }
            out.push('\n');
        }
        out
    }

    /// Write the trace in the given format
    pub fn write_to<W: Write>(&self, mut writer: W, format: TraceFormat) -> std::io::Result<()> {
        match format {
            TraceFormat::Json => {
                serde_json::to_writer_pretty(&mut writer, &self.events)?;
                writeln!(writer)
            }
            TraceFormat::Text => writer.write_all(self.to_text().as_bytes()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::interpreter::types::Val;
    use crate::parser::tokenize;

    fn thread_with_stack(values: &[f64]) -> Thread {
        let program = tokenize("1").unwrap();
        let mut thread = Thread::new(4, &program);
        for v in values {
            thread.push(Val::Num(*v));
        }
        thread
    }

    #[test]
    fn test_record_uses_original_index() {
        let mut log = TraceLog::default();
        let thread = thread_with_stack(&[3.0, 4.0]);
        let pos = SourcePos {
            index: 12,
            line: 2,
            col: 0,
        };

        log.record(&thread, pos, None);

        assert_eq!(
            log.events(),
            &[TraceEvent {
                tid: 4,
                ip: 12,
                stack: "3|4".to_string(),
                call_stack: String::new(),
                fault: None,
            }]
        );
    }

    #[test]
    fn test_custom_delimiter() {
        let mut log = TraceLog::new(",");
        log.record(&thread_with_stack(&[1.0, 2.5]), SourcePos::default(), None);

        assert_eq!(log.events()[0].stack, "1,2.5");
    }

    #[test]
    fn test_json_field_names() {
        let mut log = TraceLog::default();
        log.record(&thread_with_stack(&[9.0]), SourcePos::default(), None);
        log.record(
            &thread_with_stack(&[]),
            SourcePos::default(),
            Some("boom".to_string()),
        );

        let json: serde_json::Value = serde_json::from_str(&log.to_json().unwrap()).unwrap();

        assert_eq!(json[0]["tid"], 4);
        assert_eq!(json[0]["stack"], "9");
        assert_eq!(json[0]["callStack"], "");
        assert!(json[0].get("fault").is_none());
        assert_eq!(json[1]["fault"], "boom");
    }

    #[test]
    fn test_text_format() {
        let mut log = TraceLog::default();
        log.record(&thread_with_stack(&[1.0, 2.0]), SourcePos::default(), None);
        log.record(
            &thread_with_stack(&[]),
            SourcePos::default(),
            Some("bad".to_string()),
        );

        assert_eq!(log.to_text(), "4\t0\t1|2\t\n4\t0\t\t\t!bad\n");
    }
}
