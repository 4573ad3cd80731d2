//! Token frames
//!
//! A frame is one nesting level of execution: a token run, the source
//! position of every token, and a cursor. The root frame of a thread is its
//! primary instruction stream; blocks push nested frames on top of it.

use serde::{Deserialize, Serialize};

/// Position of a token in the original program
///
/// `index` is the token's index in the original, unmodified token stream.
/// It survives seed splicing, so trace consumers can correlate events with
/// the program text.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SourcePos {
    /// Index in the original token stream
    pub index: usize,
    /// Line (0-indexed)
    pub line: usize,
    /// Column (0-indexed)
    pub col: usize,
}

/// A contiguous token run lifted out of one frame and planted in another
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Seed {
    pub tokens: Vec<String>,
    pub positions: Vec<SourcePos>,
}

impl Seed {
    pub fn len(&self) -> usize {
        self.tokens.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tokens.is_empty()
    }
}

/// Execution frame - a token stream plus cursor
///
/// Invariants: `tokens.len() == positions.len()` and
/// `cursor <= tokens.len()`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TokenFrame {
    tokens: Vec<String>,
    positions: Vec<SourcePos>,
    cursor: usize,

    /// Position of the `[` that opened this frame (None for a root frame)
    #[serde(skip_serializing_if = "Option::is_none")]
    origin: Option<SourcePos>,
}

impl TokenFrame {
    /// Create a root frame
    pub fn new(tokens: Vec<String>, positions: Vec<SourcePos>) -> Self {
        assert_eq!(
            tokens.len(),
            positions.len(),
            "every token needs a source position"
        );
        Self {
            tokens,
            positions,
            cursor: 0,
            origin: None,
        }
    }

    /// Create a frame for a block body opened at `origin`
    pub fn block(body: Seed, origin: SourcePos) -> Self {
        let mut frame = Self::new(body.tokens, body.positions);
        frame.origin = Some(origin);
        frame
    }

    /// Token at the cursor, or None at end of frame
    pub fn peek(&self) -> Option<&str> {
        self.tokens.get(self.cursor).map(String::as_str)
    }

    /// Source position of the token at the cursor
    pub fn current_pos(&self) -> Option<SourcePos> {
        self.positions.get(self.cursor).copied()
    }

    /// Move past the current token (no-op at end of frame)
    pub fn advance(&mut self) {
        if self.cursor < self.tokens.len() {
            self.cursor += 1;
        }
    }

    pub fn cursor(&self) -> usize {
        self.cursor
    }

    /// Reposition the cursor, clamped to the end of the frame
    pub fn set_cursor(&mut self, cursor: usize) {
        self.cursor = cursor.min(self.tokens.len());
    }

    /// Move the cursor to end of frame
    pub fn exhaust(&mut self) {
        self.cursor = self.tokens.len();
    }

    pub fn is_done(&self) -> bool {
        self.cursor >= self.tokens.len()
    }

    pub fn len(&self) -> usize {
        self.tokens.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tokens.is_empty()
    }

    pub fn tokens(&self) -> &[String] {
        &self.tokens
    }

    pub fn positions(&self) -> &[SourcePos] {
        &self.positions
    }

    pub fn origin(&self) -> Option<SourcePos> {
        self.origin
    }

    /// Insert a token run at the cursor
    ///
    /// The cursor stays put, so the first spliced token is the next one read.
    pub fn splice_seed(&mut self, seed: &Seed) {
        let at = self.cursor;
        self.tokens.splice(at..at, seed.tokens.iter().cloned());
        self.positions.splice(at..at, seed.positions.iter().copied());
    }

    /// Copy the tokens in `start..end` without changing the frame
    pub fn slice(&self, start: usize, end: usize) -> Seed {
        Seed {
            tokens: self.tokens[start..end].to_vec(),
            positions: self.positions[start..end].to_vec(),
        }
    }

    /// Remove the tokens in `start..end` and return them
    ///
    /// The cursor is left at `start`, the deletion point.
    pub fn remove_range(&mut self, start: usize, end: usize) -> Seed {
        let tokens = self.tokens.drain(start..end).collect();
        let positions = self.positions.drain(start..end).collect();
        self.cursor = start;
        Seed { tokens, positions }
    }
}
