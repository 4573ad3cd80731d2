//! Thread state
//!
//! A thread is one cooperating execution context: a root frame (the primary
//! instruction stream), a stack of nested block frames, a value stack and the
//! fork/join bookkeeping used by `mapN`.
//!
//! Threads are plain owned data. Cloning one is a deep copy with no shared
//! sub-structure, which is what forking relies on.

use super::errors::{ThreadError, ThreadResult};
use super::types::{SourcePos, TokenFrame, Val};
use crate::parser::Program;
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;

/// Globally unique thread id, allocated in increasing order
pub type ThreadId = u64;

/// Hands out thread ids; ids are never reused within a scheduler
#[derive(Debug, Clone, Default)]
pub struct IdAllocator {
    next: ThreadId,
}

impl IdAllocator {
    pub fn next_id(&mut self) -> ThreadId {
        let id = self.next;
        self.next += 1;
        id
    }
}

/* ===================== Thread ===================== */

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Thread {
    pub id: ThreadId,

    /// Primary instruction stream
    root: TokenFrame,

    /// Nested block frames, innermost last
    blocks: Vec<TokenFrame>,

    /// Value stack
    pub stack: Vec<Val>,

    /// Thread that forked this one with `mapN`
    pub parent: Option<ThreadId>,

    /// Created by `mapN` (as opposed to `fork`)
    pub is_map_child: bool,

    /// Children this thread is suspended on
    pub waiting_for: BTreeSet<ThreadId>,

    /// Results reported by children that already terminated, in completion order
    pub map_results: Vec<Val>,
}

impl Thread {
    /// Create the root thread for a program
    pub fn new(id: ThreadId, program: &Program) -> Self {
        Self {
            id,
            root: TokenFrame::new(program.tokens.clone(), program.positions.clone()),
            blocks: Vec::new(),
            stack: Vec::new(),
            parent: None,
            is_map_child: false,
            waiting_for: BTreeSet::new(),
            map_results: Vec::new(),
        }
    }

    /// Deep copy under a new id, with fork bookkeeping reset to neutral
    ///
    /// Used by both `fork` and `mapN`; `mapN` sets the child fields afterwards.
    pub fn clone_as(&self, id: ThreadId) -> Thread {
        let mut clone = self.clone();
        clone.id = id;
        clone.reset_fork_state();
        clone
    }

    /// Clear parent, map-child flag, wait set and collected results
    pub fn reset_fork_state(&mut self) {
        self.parent = None;
        self.is_map_child = false;
        self.waiting_for.clear();
        self.map_results.clear();
    }

    /* ===================== Scheduling State ===================== */

    /// A suspended thread performs no steps until its children have joined
    pub fn is_suspended(&self) -> bool {
        !self.waiting_for.is_empty()
    }

    /// Pop nested frames whose cursor reached the end
    pub fn settle_frames(&mut self) {
        while self.blocks.last().is_some_and(TokenFrame::is_done) {
            self.blocks.pop();
        }
    }

    /// The outermost frame is exhausted and no nested frame remains
    pub fn is_finished(&self) -> bool {
        self.blocks.is_empty() && self.root.is_done()
    }

    /* ===================== Frames ===================== */

    /// Frame the next instruction is read from
    pub fn active_frame(&self) -> &TokenFrame {
        self.blocks.last().unwrap_or(&self.root)
    }

    pub fn active_frame_mut(&mut self) -> &mut TokenFrame {
        match self.blocks.last_mut() {
            Some(frame) => frame,
            None => &mut self.root,
        }
    }

    pub fn root_frame(&self) -> &TokenFrame {
        &self.root
    }

    pub fn push_block(&mut self, frame: TokenFrame) {
        self.blocks.push(frame);
    }

    /// Number of frames, root included
    pub fn depth(&self) -> usize {
        1 + self.blocks.len()
    }

    /// Top-level instruction pointer (cursor of the primary stream)
    pub fn pc(&self) -> usize {
        self.root.cursor()
    }

    /// Positions of the `[` tokens that opened the nested frames, outermost first
    pub fn open_blocks(&self) -> Vec<SourcePos> {
        self.blocks.iter().filter_map(TokenFrame::origin).collect()
    }

    /* ===================== Value Stack ===================== */

    pub fn push(&mut self, val: Val) {
        self.stack.push(val);
    }

    /// Pop `n` values, returned in stack order (deepest first)
    pub fn pop_n(&mut self, op: &str, n: usize) -> ThreadResult<Vec<Val>> {
        if self.stack.len() < n {
            return Err(ThreadError::StackUnderflow {
                op: op.to_string(),
                needed: n,
                depth: self.stack.len(),
            });
        }
        let at = self.stack.len() - n;
        Ok(self.stack.split_off(at))
    }

    pub fn pop(&mut self, op: &str) -> ThreadResult<Val> {
        self.stack.pop().ok_or_else(|| ThreadError::StackUnderflow {
            op: op.to_string(),
            needed: 1,
            depth: 0,
        })
    }

    pub fn peek_value(&self) -> Option<&Val> {
        self.stack.last()
    }

    /// Value stack rendered for the trace, values joined by `delimiter`
    pub fn stack_snapshot(&self, delimiter: &str) -> String {
        join_display(self.stack.iter(), delimiter)
    }

    /// Call-depth marker: original indices of the open blocks joined by `delimiter`
    pub fn call_marker(&self, delimiter: &str) -> String {
        join_display(self.open_blocks().iter().map(|pos| pos.index), delimiter)
    }
}

fn join_display<T: std::fmt::Display>(items: impl Iterator<Item = T>, delimiter: &str) -> String {
    items
        .map(|item| item.to_string())
        .collect::<Vec<_>>()
        .join(delimiter)
}
