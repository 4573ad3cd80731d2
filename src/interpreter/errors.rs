//! Thread errors
//!
//! Every error here is fatal to the thread that raised it and to nothing
//! else. The scheduler removes the thread, records a terminal trace event and,
//! for map children, still completes the join.

use super::types::SourcePos;

/// Errors raised while a thread executes an instruction
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum ThreadError {
    /// `mapN` with N outside 2..=5
    #[error("map{arity}: arity must be between 2 and 5")]
    MapArity { arity: u8 },

    /// `mapN` with fewer than N values on the stack
    #[error("map{arity}: needs {arity} values, stack has {depth}")]
    MapUnderflow { arity: u8, depth: usize },

    /// A `[` without a matching `]`
    #[error("unterminated block opened at token {}", .at.index)]
    UnterminatedBlock { at: SourcePos },

    /// A `]` reached as an instruction
    #[error("unmatched ']' at token {}", .at.index)]
    UnmatchedBlockClose { at: SourcePos },

    #[error("{op}: needs {needed} values, stack has {depth}")]
    StackUnderflow {
        op: String,
        needed: usize,
        depth: usize,
    },

    #[error("{op}: expected {expected}, got {found}")]
    TypeMismatch {
        op: String,
        expected: &'static str,
        found: &'static str,
    },

    #[error("{op}: division by zero")]
    DivisionByZero { op: String },

    #[error("unknown instruction '{0}'")]
    UnknownInstruction(String),
}

impl ThreadError {
    /// True for the malformed-`mapN` family
    pub fn is_malformed_map(&self) -> bool {
        matches!(
            self,
            ThreadError::MapArity { .. } | ThreadError::MapUnderflow { .. }
        )
    }
}

pub type ThreadResult<T> = Result<T, ThreadError>;
