//! Single-use wait signal for blocking submissions.
//!
//! The owner thread holds the [`Completer`], the submitting thread holds
//! the [`Waiter`]. A completer that is dropped without completing (because
//! the owner loop went away with the action still queued) wakes the waiter
//! with [`MarshalError::Closed`].

use crate::error::MarshalError;
use parking_lot::{Condvar, Mutex};
use std::fmt;
use std::sync::Arc;
use std::time::{Duration, Instant};

/// Lifecycle of a submitted action as seen by its waiter.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ActionState {
    Queued,
    Running,
    Completed,
    TimedOut,
    Faulted,
}

impl fmt::Display for ActionState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::Queued => "queued",
            Self::Running => "running",
            Self::Completed => "completed",
            Self::TimedOut => "timed out",
            Self::Faulted => "faulted",
        })
    }
}

enum Slot<T> {
    Queued,
    Running,
    Done(Result<T, MarshalError>),
    Taken,
}

struct Inner<T> {
    slot: Mutex<Slot<T>>,
    cond: Condvar,
}

/// Create a connected completer/waiter pair.
pub fn signal<T>() -> (Completer<T>, Waiter<T>) {
    let inner = Arc::new(Inner {
        slot: Mutex::new(Slot::Queued),
        cond: Condvar::new(),
    });
    (
        Completer {
            inner: Arc::clone(&inner),
            done: false,
        },
        Waiter { inner },
    )
}

/// Owner-thread half.
pub struct Completer<T> {
    inner: Arc<Inner<T>>,
    done: bool,
}

impl<T> Completer<T> {
    /// Mark the action as running.
    pub fn start(&self) {
        let mut slot = self.inner.slot.lock();
        if matches!(*slot, Slot::Queued) {
            *slot = Slot::Running;
        }
    }

    pub fn complete(mut self, result: Result<T, MarshalError>) {
        self.finish(result);
    }

    fn finish(&mut self, result: Result<T, MarshalError>) {
        self.done = true;
        *self.inner.slot.lock() = Slot::Done(result);
        self.inner.cond.notify_all();
    }
}

impl<T> Drop for Completer<T> {
    fn drop(&mut self) {
        if !self.done {
            self.finish(Err(MarshalError::Closed));
        }
    }
}

/// Submitting-thread half.
pub struct Waiter<T> {
    inner: Arc<Inner<T>>,
}

impl<T> Waiter<T> {
    /// Block until the action finishes or `timeout` elapses.
    ///
    /// On timeout the action keeps its place in the queue; only the wait
    /// is abandoned.
    ///
    /// A timeout too large to express as a deadline waits without one.
    pub fn wait(self, timeout: Duration) -> (ActionState, Result<T, MarshalError>) {
        let deadline = Instant::now().checked_add(timeout);
        let mut slot = self.inner.slot.lock();

        loop {
            match std::mem::replace(&mut *slot, Slot::Taken) {
                Slot::Done(result) => {
                    let state = match &result {
                        Err(MarshalError::Faulted) => ActionState::Faulted,
                        _ => ActionState::Completed,
                    };
                    return (state, result);
                }
                pending => *slot = pending,
            }

            let Some(deadline) = deadline else {
                self.inner.cond.wait(&mut slot);
                continue;
            };

            if self.inner.cond.wait_until(&mut slot, deadline).timed_out() {
                // Last look: the owner may have finished right at the deadline.
                if let Slot::Done(_) = &*slot {
                    continue;
                }
                let state = match &*slot {
                    Slot::Queued => ActionState::Queued,
                    _ => ActionState::Running,
                };
                tracing::debug!(state = %state, "blocking wait expired");
                return (ActionState::TimedOut, Err(MarshalError::Timeout(timeout)));
            }
        }
    }
}
