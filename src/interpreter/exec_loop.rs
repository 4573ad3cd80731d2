//! Instruction execution
//!
//! This module executes a single instruction of a single thread. It knows
//! nothing about other threads: instructions that create threads (`fork`,
//! `mapN`) hand the new threads back to the scheduler, which owns them.
//!
//! ## Function Organization
//! 1. step() - fetch, advance, dispatch
//! 2. execute() - per-opcode effects
//! 3. helpers for arithmetic and comparison

use tracing::trace;

use super::errors::{ThreadError, ThreadResult};
use super::fork_join;
use super::seed;
use super::thread::{IdAllocator, Thread};
use super::types::{Op, SourcePos, TokenFrame, Val};

/* ===================== Public API ===================== */

/// One executed instruction
#[derive(Debug)]
pub struct Step {
    /// Position of the executed token (its `index` is the trace ip)
    pub pos: SourcePos,
    pub op: Op,
    /// Threads created by the instruction, or the error that killed the thread
    pub result: ThreadResult<Vec<Thread>>,
}

/// Execute the instruction at the cursor of the thread's active frame
///
/// The cursor is advanced before the instruction's effect is applied, so
/// instructions that read ahead (`[`, `if`, `mapN`) start at the token after
/// themselves. Returns None when the active frame is exhausted.
pub fn step(thread: &mut Thread, ids: &mut IdAllocator) -> Option<Step> {
    let frame = thread.active_frame_mut();
    let pos = frame.current_pos()?;
    let op = Op::decode(frame.peek()?);
    frame.advance();

    trace!(thread = thread.id, ip = pos.index, op = %op.name(), "execute");

    let result = execute(thread, &op, pos, ids);
    Some(Step { pos, op, result })
}

/* ===================== Dispatch ===================== */

fn execute(
    thread: &mut Thread,
    op: &Op,
    pos: SourcePos,
    ids: &mut IdAllocator,
) -> ThreadResult<Vec<Thread>> {
    let name = op.name();

    match op {
        Op::Push(val) => thread.push(val.clone()),

        Op::Dup => {
            let val = thread.pop(&name)?;
            thread.push(val.clone());
            thread.push(val);
        }

        Op::Drop => {
            thread.pop(&name)?;
        }

        Op::Swap => {
            let [a, b] = pop_pair(thread, &name)?;
            thread.push(b);
            thread.push(a);
        }

        Op::Over => {
            let [a, b] = pop_pair(thread, &name)?;
            thread.push(a.clone());
            thread.push(b);
            thread.push(a);
        }

        Op::Add => arithmetic(thread, &name, |a, b| Ok(a + b))?,
        Op::Sub => arithmetic(thread, &name, |a, b| Ok(a - b))?,
        Op::Mul => arithmetic(thread, &name, |a, b| Ok(a * b))?,
        Op::Div => arithmetic(thread, &name, |a, b| checked_divisor(b, &name).map(|b| a / b))?,
        Op::Mod => arithmetic(thread, &name, |a, b| checked_divisor(b, &name).map(|b| a % b))?,

        Op::Eq => {
            let [a, b] = pop_pair(thread, &name)?;
            thread.push(Val::Bool(a == b));
        }
        Op::Lt => compare(thread, &name, |a, b| a < b)?,
        Op::Gt => compare(thread, &name, |a, b| a > b)?,

        Op::Not => {
            let val = thread.pop(&name)?;
            thread.push(Val::Bool(!val.is_truthy()));
        }

        Op::BlockOpen => {
            let frame = thread.active_frame_mut();
            let open_at = frame.cursor() - 1;
            let body = seed::take_block(frame, open_at)?;
            thread.push_block(TokenFrame::block(body, pos));
        }

        Op::BlockClose => return Err(ThreadError::UnmatchedBlockClose { at: pos }),

        Op::If => {
            let cond = thread.pop(&name)?;
            if !cond.is_truthy() {
                seed::skip_next(thread.active_frame_mut())?;
            }
        }

        Op::Fork => return Ok(vec![fork_join::fork(thread, ids)]),

        Op::Map(arity) => return fork_join::map_n(thread, *arity, ids),

        Op::Unknown(token) => return Err(ThreadError::UnknownInstruction(token.clone())),
    }

    Ok(Vec::new())
}

/* ===================== Helpers ===================== */

fn pop_pair(thread: &mut Thread, op: &str) -> ThreadResult<[Val; 2]> {
    let mut pair = thread.pop_n(op, 2)?;
    let b = pair.pop();
    let a = pair.pop();
    match (a, b) {
        (Some(a), Some(b)) => Ok([a, b]),
        _ => Err(ThreadError::StackUnderflow {
            op: op.to_string(),
            needed: 2,
            depth: 0,
        }),
    }
}

/// Both numeric operands, checked in place; nothing is popped on failure
fn peek_numbers(thread: &Thread, op: &str) -> ThreadResult<(f64, f64)> {
    let depth = thread.stack.len();
    if depth < 2 {
        return Err(ThreadError::StackUnderflow {
            op: op.to_string(),
            needed: 2,
            depth,
        });
    }
    let a = number(&thread.stack[depth - 2], op)?;
    let b = number(&thread.stack[depth - 1], op)?;
    Ok((a, b))
}

fn number(val: &Val, op: &str) -> ThreadResult<f64> {
    match val {
        Val::Num(n) => Ok(*n),
        other => Err(ThreadError::TypeMismatch {
            op: op.to_string(),
            expected: "number",
            found: other.type_name(),
        }),
    }
}

fn checked_divisor(b: f64, op: &str) -> ThreadResult<f64> {
    if b == 0.0 {
        return Err(ThreadError::DivisionByZero { op: op.to_string() });
    }
    Ok(b)
}

fn arithmetic<F>(thread: &mut Thread, op: &str, f: F) -> ThreadResult<()>
where
    F: Fn(f64, f64) -> ThreadResult<f64>,
{
    let (a, b) = peek_numbers(thread, op)?;
    let result = f(a, b)?;
    thread.pop_n(op, 2)?;
    thread.push(Val::Num(result));
    Ok(())
}

fn compare<F>(thread: &mut Thread, op: &str, f: F) -> ThreadResult<()>
where
    F: Fn(f64, f64) -> bool,
{
    let (a, b) = peek_numbers(thread, op)?;
    thread.pop_n(op, 2)?;
    thread.push(Val::Bool(f(a, b)));
    Ok(())
}
