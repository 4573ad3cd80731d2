//! Cooperative round-robin scheduler
//!
//! The scheduler owns every live thread and the trace log. Each round visits
//! the live threads in ascending id order and gives each runnable one exactly
//! one instruction. Threads spawned during a round have higher ids than the
//! thread that spawned them, so they are visited later in that same round.
//!
//! There is no real parallelism: a suspended thread is just one the round
//! skips, which keeps interleavings deterministic for a given program.

use std::collections::BTreeMap;
use std::ops::Bound::{Excluded, Unbounded};

use serde::Serialize;
use tracing::{debug, info, warn};

use super::errors::ThreadError;
use super::exec_loop;
use super::fork_join::{self, JoinOutcome};
use super::thread::{IdAllocator, Thread, ThreadId};
use super::trace::{TraceLog, DEFAULT_DELIMITER};
use super::types::Val;
use crate::parser::Program;

/* ===================== Options & Reports ===================== */

/// Options for a run
#[derive(Debug, Clone, Default)]
pub struct RunOptions {
    /// Stop once this many instructions have executed in total
    pub step_budget: Option<usize>,

    /// Execute without recording trace events
    pub dry_run: bool,
}

/// How a run ended
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum RunStatus {
    /// No live threads remain
    Completed,
    /// The step budget ran out with threads still live
    BudgetExhausted,
    /// Live threads remain but all of them are suspended
    Deadlocked,
}

/// A thread killed by an error
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ThreadFault {
    pub thread: ThreadId,
    /// Original index of the failing instruction
    pub ip: usize,
    #[serde(serialize_with = "serialize_error")]
    pub error: ThreadError,
}

/// Final state of a terminated thread
#[derive(Debug, Clone, PartialEq)]
pub struct ThreadOutcome {
    pub stack: Vec<Val>,
    pub fault: Option<ThreadError>,
}

/// Summary of a run
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RunReport {
    pub status: RunStatus,
    /// Instructions executed
    pub steps: usize,
    pub rounds: usize,
    pub faults: Vec<ThreadFault>,
    /// Results discarded because the parent was gone
    pub dangling_joins: usize,
}

fn serialize_error<S: serde::Serializer>(error: &ThreadError, s: S) -> Result<S::Ok, S::Error> {
    s.serialize_str(&error.to_string())
}

/// Result of one scheduler round
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Round {
    /// At least one thread stepped or terminated
    Progressed,
    /// Live threads remain but none could move
    Stalled,
    /// The step budget ran out during the round
    BudgetExhausted,
    /// No live threads remain
    Done,
}

/// What a single visit did to a thread
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Visit {
    Suspended,
    Stepped,
    Terminated,
    OutOfBudget,
}

/// Position inside a round the step budget interrupted
#[derive(Debug, Clone, Copy, Default)]
struct RoundCursor {
    /// Last thread visited in this round
    last: Option<ThreadId>,
    progressed: bool,
}

/* ===================== Scheduler ===================== */

#[derive(Debug)]
pub struct Scheduler {
    threads: BTreeMap<ThreadId, Thread>,
    ids: IdAllocator,
    trace: TraceLog,
    outcomes: BTreeMap<ThreadId, ThreadOutcome>,
    faults: Vec<ThreadFault>,
    steps: usize,
    rounds: usize,
    dangling_joins: usize,
    /// Set while a round is unfinished; the next round call picks it up
    round: Option<RoundCursor>,
}

impl Scheduler {
    /// Create a scheduler with one root thread for `program`
    ///
    /// An empty program yields no threads.
    pub fn new(program: &Program) -> Self {
        Self::with_delimiter(program, DEFAULT_DELIMITER)
    }

    /// Like `new`, with a custom stack snapshot delimiter
    pub fn with_delimiter(program: &Program, delimiter: &str) -> Self {
        let mut ids = IdAllocator::default();
        let mut threads = BTreeMap::new();

        if !program.is_empty() {
            let root = Thread::new(ids.next_id(), program);
            threads.insert(root.id, root);
        }

        Self {
            threads,
            ids,
            trace: TraceLog::new(delimiter),
            outcomes: BTreeMap::new(),
            faults: Vec::new(),
            steps: 0,
            rounds: 0,
            dangling_joins: 0,
            round: None,
        }
    }

    /* ===================== Accessors ===================== */

    pub fn thread(&self, id: ThreadId) -> Option<&Thread> {
        self.threads.get(&id)
    }

    /// Ids of live threads, ascending
    pub fn live_ids(&self) -> Vec<ThreadId> {
        self.threads.keys().copied().collect()
    }

    pub fn is_idle(&self) -> bool {
        self.threads.is_empty()
    }

    pub fn trace(&self) -> &TraceLog {
        &self.trace
    }

    /// Final state of every terminated thread, by id
    pub fn outcomes(&self) -> &BTreeMap<ThreadId, ThreadOutcome> {
        &self.outcomes
    }

    pub fn steps(&self) -> usize {
        self.steps
    }

    /* ===================== Driving ===================== */

    /// Run rounds until no thread is live, the budget runs out, or nothing can move
    pub fn run(&mut self, options: &RunOptions) -> RunReport {
        let status = loop {
            match self.step_round(options) {
                Round::Progressed => continue,
                Round::Done => break RunStatus::Completed,
                Round::BudgetExhausted => break RunStatus::BudgetExhausted,
                Round::Stalled => break RunStatus::Deadlocked,
            }
        };

        let report = self.report(status);
        info!(
            status = ?report.status,
            steps = report.steps,
            rounds = report.rounds,
            faults = report.faults.len(),
            "run finished"
        );
        report
    }

    /// Visit every live thread once, in ascending id order
    ///
    /// A round cut short by the step budget is continued, not restarted, by
    /// the next call, so threads after the stopping point still get their
    /// turn before anyone gets a second one.
    pub fn step_round(&mut self, options: &RunOptions) -> Round {
        if self.threads.is_empty() {
            self.round = None;
            return Round::Done;
        }

        let mut cursor = match self.round.take() {
            Some(cursor) => cursor,
            None => {
                self.rounds += 1;
                RoundCursor::default()
            }
        };

        loop {
            let next = match cursor.last {
                None => self.threads.keys().next().copied(),
                Some(id) => self
                    .threads
                    .range((Excluded(id), Unbounded))
                    .next()
                    .map(|(id, _)| *id),
            };
            let Some(id) = next else {
                break;
            };

            match self.visit(id, options) {
                Visit::Suspended => {}
                Visit::Stepped | Visit::Terminated => cursor.progressed = true,
                Visit::OutOfBudget => {
                    self.round = Some(cursor);
                    return Round::BudgetExhausted;
                }
            }
            cursor.last = Some(id);
        }

        if self.threads.is_empty() {
            Round::Done
        } else if cursor.progressed {
            Round::Progressed
        } else {
            Round::Stalled
        }
    }

    /// Give one thread its turn
    fn visit(&mut self, id: ThreadId, options: &RunOptions) -> Visit {
        let Some(mut thread) = self.threads.remove(&id) else {
            return Visit::Suspended;
        };

        if thread.is_suspended() {
            self.threads.insert(id, thread);
            return Visit::Suspended;
        }

        // A thread resumed by its last child may have nothing left to run
        thread.settle_frames();
        if thread.is_finished() {
            self.terminate(thread, None);
            return Visit::Terminated;
        }

        if options.step_budget.is_some_and(|budget| self.steps >= budget) {
            self.threads.insert(id, thread);
            return Visit::OutOfBudget;
        }

        let Some(step) = exec_loop::step(&mut thread, &mut self.ids) else {
            self.terminate(thread, None);
            return Visit::Terminated;
        };
        self.steps += 1;

        match step.result {
            Ok(spawned) => {
                if !options.dry_run {
                    self.trace.record(&thread, step.pos, None);
                }
                for child in spawned {
                    self.threads.insert(child.id, child);
                }

                if thread.is_suspended() {
                    self.threads.insert(id, thread);
                    return Visit::Stepped;
                }

                thread.settle_frames();
                if thread.is_finished() {
                    self.terminate(thread, None);
                } else {
                    self.threads.insert(id, thread);
                }
            }
            Err(error) => {
                warn!(thread = id, ip = step.pos.index, %error, "thread failed");
                if !options.dry_run {
                    self.trace.record(&thread, step.pos, Some(error.to_string()));
                }
                self.faults.push(ThreadFault {
                    thread: id,
                    ip: step.pos.index,
                    error: error.clone(),
                });
                self.terminate(thread, Some(error));
            }
        }

        Visit::Stepped
    }

    /// Remove a thread for good, reporting to its parent if it is a map child
    fn terminate(&mut self, thread: Thread, fault: Option<ThreadError>) {
        let result = if fault.is_some() {
            None
        } else {
            thread.peek_value().cloned()
        };

        match fork_join::join(&mut self.threads, &thread, result) {
            JoinOutcome::Dangling => {
                warn!(
                    thread = thread.id,
                    parent = ?thread.parent,
                    "map child has no waiting parent, result discarded"
                );
                self.dangling_joins += 1;
            }
            JoinOutcome::Pending { remaining } => {
                debug!(thread = thread.id, remaining, "map child joined");
            }
            JoinOutcome::Resumed { .. } | JoinOutcome::NotMapChild => {}
        }

        debug!(thread = thread.id, "thread terminated");
        self.outcomes.insert(
            thread.id,
            ThreadOutcome {
                stack: thread.stack,
                fault,
            },
        );
    }

    fn report(&self, status: RunStatus) -> RunReport {
        RunReport {
            status,
            steps: self.steps,
            rounds: self.rounds,
            faults: self.faults.clone(),
            dangling_joins: self.dangling_joins,
        }
    }
}
