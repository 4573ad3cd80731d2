//! Seed capture and block extents
//!
//! A seed is the single instruction after `mapN` or, when that instruction
//! is `[`, the whole balanced block. The same extent rule decides what `[`
//! runs as a nested frame and what a falsy `if` skips.

use super::errors::{ThreadError, ThreadResult};
use super::types::{Seed, TokenFrame, BLOCK_CLOSE, BLOCK_OPEN};

/// End (exclusive) of the instruction or block starting at `start`
///
/// Returns `start` when the frame is exhausted, so the extent is empty.
pub fn extent(frame: &TokenFrame, start: usize) -> ThreadResult<usize> {
    let tokens = frame.tokens();
    let Some(first) = tokens.get(start) else {
        return Ok(start);
    };

    if first != BLOCK_OPEN {
        return Ok(start + 1);
    }

    let mut depth = 0usize;
    for (offset, token) in tokens[start..].iter().enumerate() {
        if token == BLOCK_OPEN {
            depth += 1;
        } else if token == BLOCK_CLOSE {
            depth -= 1;
            if depth == 0 {
                return Ok(start + offset + 1);
            }
        }
    }

    Err(ThreadError::UnterminatedBlock {
        at: frame.positions()[start],
    })
}

/// Capture the seed at the cursor and splice it out of the frame
///
/// The cursor is left at the deletion point, which now holds the token that
/// followed the seed's last token. When `frame` is a thread's root frame this
/// cursor is the thread's top-level instruction pointer.
pub fn capture_seed(frame: &mut TokenFrame) -> ThreadResult<Seed> {
    let start = frame.cursor();
    let end = extent(frame, start)?;
    Ok(frame.remove_range(start, end))
}

/// Body of the block whose `[` sits at `open_at`
///
/// Moves the cursor past the matching `]` and returns the tokens between the
/// delimiters.
pub fn take_block(frame: &mut TokenFrame, open_at: usize) -> ThreadResult<Seed> {
    let end = extent(frame, open_at)?;
    let body = frame.slice(open_at + 1, end - 1);
    frame.set_cursor(end);
    Ok(body)
}

/// Skip the instruction or block at the cursor
pub fn skip_next(frame: &mut TokenFrame) -> ThreadResult<()> {
    let end = extent(frame, frame.cursor())?;
    frame.set_cursor(end);
    Ok(())
}
