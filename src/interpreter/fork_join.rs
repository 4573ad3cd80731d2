//! Fork/join protocol
//!
//! `mapN` forks one child per popped value. Every child is a deep copy of the
//! parent taken after the pops, with the captured seed planted at the fork
//! point and one value pushed. The parent is suspended until every child has
//! reported back through `join`.
//!
//! Results are handed to the parent in completion order, not argument order.
//! Under round-robin scheduling a child with a shorter seed path finishes
//! first, so `1 0 map2 [ ... ]` can yield the second argument's result first.

use std::collections::BTreeMap;

use tracing::debug;

use super::errors::{ThreadError, ThreadResult};
use super::seed;
use super::thread::{IdAllocator, Thread, ThreadId};
use super::types::Val;

/// Smallest and largest legal `mapN` arity
pub const MIN_MAP_ARITY: u8 = 2;
pub const MAX_MAP_ARITY: u8 = 5;

/* ===================== Fork ===================== */

/// Execute `mapN` on `thread`
///
/// Validates before touching any state, so a malformed `mapN` leaves the
/// thread exactly as it was. Returns the children in argument order.
pub fn map_n(thread: &mut Thread, arity: u8, ids: &mut IdAllocator) -> ThreadResult<Vec<Thread>> {
    if !(MIN_MAP_ARITY..=MAX_MAP_ARITY).contains(&arity) {
        return Err(ThreadError::MapArity { arity });
    }

    let n = arity as usize;
    if thread.stack.len() < n {
        return Err(ThreadError::MapUnderflow {
            arity,
            depth: thread.stack.len(),
        });
    }

    // Deepest popped value is the first argument
    let args = thread.pop_n(&format!("map{}", arity), n)?;

    // The parent continues past the seed, never through it
    let seed = seed::capture_seed(thread.active_frame_mut())?;

    let mut children = Vec::with_capacity(n);
    for value in args {
        let mut child = thread.clone_as(ids.next_id());
        child.push(value);
        child.active_frame_mut().splice_seed(&seed);
        child.parent = Some(thread.id);
        child.is_map_child = true;

        debug!(
            parent = thread.id,
            child = child.id,
            seed_len = seed.len(),
            "spawned map child"
        );
        children.push(child);
    }

    thread.waiting_for = children.iter().map(|child| child.id).collect();
    thread.map_results.clear();

    // Suspend: the active frame reads as exhausted until the children join
    thread.active_frame_mut().exhaust();

    Ok(children)
}

/// Execute `fork` on `thread`
///
/// The clone is an unrelated branch: neutral bookkeeping, fresh id. The
/// original sees `0` on its stack, the clone sees `1`.
pub fn fork(thread: &mut Thread, ids: &mut IdAllocator) -> Thread {
    let mut clone = thread.clone_as(ids.next_id());
    thread.push(Val::Num(0.0));
    clone.push(Val::Num(1.0));

    debug!(thread = thread.id, clone = clone.id, "forked thread");
    clone
}

/* ===================== Join ===================== */

/// What happened when a terminating thread reported to its parent
#[derive(Debug, Clone, PartialEq)]
pub enum JoinOutcome {
    /// The thread was not created by `mapN`; nothing to report
    NotMapChild,
    /// Parent still waits on other children
    Pending { remaining: usize },
    /// Last child joined; the parent got its results and is runnable again
    Resumed { pushed: usize },
    /// The parent is gone or was not waiting on this child; result discarded
    Dangling,
}

/// Report a terminating map child's result to its parent
///
/// `result` is the child's top of stack, or None when the child has an empty
/// stack or failed. A failed child still leaves the parent's wait set.
pub fn join(
    threads: &mut BTreeMap<ThreadId, Thread>,
    child: &Thread,
    result: Option<Val>,
) -> JoinOutcome {
    if !child.is_map_child {
        return JoinOutcome::NotMapChild;
    }

    let Some(parent) = child.parent.and_then(|id| threads.get_mut(&id)) else {
        return JoinOutcome::Dangling;
    };

    if !parent.waiting_for.remove(&child.id) {
        return JoinOutcome::Dangling;
    }

    if let Some(value) = result {
        parent.map_results.push(value);
    }

    if !parent.waiting_for.is_empty() {
        return JoinOutcome::Pending {
            remaining: parent.waiting_for.len(),
        };
    }

    let results = std::mem::take(&mut parent.map_results);
    let pushed = results.len();
    parent.stack.extend(results);

    debug!(parent = parent.id, pushed, "map children joined");
    JoinOutcome::Resumed { pushed }
}
