pub mod cli;
pub mod config;
pub mod interpreter;
pub mod parser;

// Re-export main types
pub use config::Config;
pub use interpreter::{run_source, RunOptions, RunReport, RunStatus, Scheduler, TraceEvent, TraceLog};
pub use parser::{tokenize, ParseError, Program};
