//! # Strand interpreter - cooperative fork/join execution of token streams
//!
//! ## Core Principles
//!
//! 1. **Threads are owned data**: frames, value stack and fork bookkeeping live
//!    in `Thread`; cloning a thread is a deep copy
//! 2. **One instruction per turn**: the scheduler visits live threads in
//!    ascending id order and steps each runnable one exactly once per round
//! 3. **Suspension is a skip**: a thread with pending map children is skipped,
//!    never blocked
//! 4. **Stable trace indices**: every token carries its index in the original
//!    stream, so seed splicing never disturbs trace correlation
//!
//! ## Modules
//!
//! - `types` - frames, decoded instructions, values
//! - `thread` - per-thread state
//! - `seed` - seed capture and block extents
//! - `exec_loop` - single instruction execution
//! - `fork_join` - `mapN`, `fork` and the join protocol
//! - `scheduler` - round-robin driver and run reports
//! - `trace` - execution trace events and export

pub mod errors;
pub mod exec_loop;
pub mod fork_join;
pub mod scheduler;
pub mod seed;
pub mod thread;
pub mod trace;
pub mod types;

#[cfg(test)]
mod tests;

// Re-export commonly used items
pub use errors::{ThreadError, ThreadResult};
pub use scheduler::{Round, RunOptions, RunReport, RunStatus, Scheduler, ThreadFault, ThreadOutcome};
pub use thread::{Thread, ThreadId};
pub use trace::{TraceEvent, TraceFormat, TraceLog};
pub use types::{Op, Seed, SourcePos, TokenFrame, Val};

use crate::parser::{self, ParseError};

/// Tokenize `source` and run it to completion (or until the budget runs out)
///
/// Returns the scheduler, which still holds the trace and thread outcomes,
/// together with the run report.
pub fn run_source(
    source: &str,
    delimiter: &str,
    options: &RunOptions,
) -> Result<(Scheduler, RunReport), ParseError> {
    let program = parser::tokenize(source)?;
    let mut scheduler = Scheduler::with_delimiter(&program, delimiter);
    let report = scheduler.run(options);
    Ok((scheduler, report))
}
