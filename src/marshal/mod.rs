//! Owner-thread marshal.
//!
//! All command handlers and all game-state mutation run on one owner
//! thread. Any other thread hands work to that thread through a [`Marshal`].
//!
//! # Architecture
//!
//! - **Single consumer**: one unbounded queue, drained by [`OwnerLoop`] on
//!   the owner thread. Actions run one at a time in submission order.
//! - **Submission modes**: fire-and-forget ([`Marshal::submit`]), blocking
//!   with a deadline ([`Marshal::submit_blocking`]) and future-returning
//!   ([`Marshal::submit_async`]).
//! - **No cancellation**: a timed-out blocking caller is released, the
//!   action still runs later.
//! - **Re-entry**: submitting from the owner thread itself would make the
//!   owner wait on itself. The action runs inline instead and the misuse is
//!   reported at error level.

mod signal;

pub use signal::ActionState;

use crate::error::MarshalError;
use std::any::Any;
use std::future::Future;
use std::panic::{self, AssertUnwindSafe};
use std::pin::Pin;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, OnceLock};
use std::task::{Context, Poll};
use std::thread::{self, JoinHandle, ThreadId};
use std::time::Duration;
use tokio::sync::{mpsc, oneshot};
use tracing::{debug, error, info, trace};

/// Default deadline for blocking submissions.
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(60);

type Job = Box<dyn FnOnce() + Send + 'static>;

struct Shared {
    name: String,
    owner: OnceLock<ThreadId>,
    pending: AtomicUsize,
}

/// Submission handle. Cheap to clone; every clone feeds the same queue.
#[derive(Clone)]
pub struct Marshal {
    tx: mpsc::UnboundedSender<Job>,
    shared: Arc<Shared>,
}

impl Marshal {
    /// Create a marshal and the loop that must be run on the owner thread.
    pub fn new(name: impl Into<String>) -> (Self, OwnerLoop) {
        let (tx, rx) = mpsc::unbounded_channel();
        let shared = Arc::new(Shared {
            name: name.into(),
            owner: OnceLock::new(),
            pending: AtomicUsize::new(0),
        });

        (
            Self {
                tx,
                shared: Arc::clone(&shared),
            },
            OwnerLoop { rx, shared },
        )
    }

    /// Start a dedicated, named owner thread.
    ///
    /// The thread exits once every `Marshal` clone has been dropped and the
    /// queue is drained.
    pub fn spawn(name: impl Into<String>) -> std::io::Result<(Self, JoinHandle<()>)> {
        let name = name.into();
        let (marshal, owner) = Self::new(name.clone());
        let handle = thread::Builder::new().name(name).spawn(move || owner.run())?;
        Ok((marshal, handle))
    }

    pub fn name(&self) -> &str {
        &self.shared.name
    }

    /// True when called from the owner thread.
    pub fn is_owner_thread(&self) -> bool {
        self.shared.owner.get() == Some(&thread::current().id())
    }

    /// Actions queued but not yet finished.
    pub fn pending(&self) -> usize {
        self.shared.pending.load(Ordering::Acquire)
    }

    /// Queue an action and return immediately.
    pub fn submit<F>(&self, action: F) -> Result<(), MarshalError>
    where
        F: FnOnce() + Send + 'static,
    {
        if self.is_owner_thread() {
            self.report_reentry("submit");
            let _ = run_caught(action);
            return Ok(());
        }
        self.enqueue(Box::new(move || {
            let _ = run_caught(action);
        }))
    }

    /// Queue an action and block until it finishes or `timeout` elapses.
    ///
    /// A timeout releases the caller with [`MarshalError::Timeout`]; the
    /// action is not cancelled and its effects still apply when it runs.
    pub fn submit_blocking<F, R>(&self, action: F, timeout: Duration) -> Result<R, MarshalError>
    where
        F: FnOnce() -> R + Send + 'static,
        R: Send + 'static,
    {
        if self.is_owner_thread() {
            self.report_reentry("submit_blocking");
            return run_caught(action);
        }

        let (completer, waiter) = signal::signal();
        self.enqueue(Box::new(move || {
            completer.start();
            completer.complete(run_caught(action));
        }))?;

        let (state, result) = waiter.wait(timeout);
        trace!(marshal = %self.shared.name, state = %state, "blocking submission returned");
        result
    }

    /// Queue an action and get a future for its result.
    pub fn submit_async<F, R>(&self, action: F) -> ActionHandle<R>
    where
        F: FnOnce() -> R + Send + 'static,
        R: Send + 'static,
    {
        let (tx, rx) = oneshot::channel();

        if self.is_owner_thread() {
            self.report_reentry("submit_async");
            let _ = tx.send(run_caught(action));
            return ActionHandle { rx };
        }

        // On a closed queue the job (and `tx`) is dropped, which resolves
        // the handle to `Closed`.
        let _ = self.enqueue(Box::new(move || {
            let _ = tx.send(run_caught(action));
        }));
        ActionHandle { rx }
    }

    fn enqueue(&self, job: Job) -> Result<(), MarshalError> {
        let depth = self.shared.pending.fetch_add(1, Ordering::AcqRel) + 1;
        if self.tx.send(job).is_err() {
            self.shared.pending.fetch_sub(1, Ordering::AcqRel);
            return Err(MarshalError::Closed);
        }
        crate::metrics::set_marshal_depth(&self.shared.name, depth);
        Ok(())
    }

    fn report_reentry(&self, method: &'static str) {
        crate::metrics::record_owner_reentry(&self.shared.name);
        error!(
            marshal = %self.shared.name,
            method,
            "Submission from the owner thread; running inline"
        );
    }
}

/// Consumer half of a [`Marshal`]. Runs on the owner thread.
pub struct OwnerLoop {
    rx: mpsc::UnboundedReceiver<Job>,
    shared: Arc<Shared>,
}

impl OwnerLoop {
    /// Bind the current thread as owner and run actions until every
    /// `Marshal` handle is dropped.
    pub fn run(mut self) {
        self.bind();
        info!(marshal = %self.shared.name, "Owner thread started");
        while let Some(job) = self.rx.blocking_recv() {
            self.execute(job);
        }
        info!(marshal = %self.shared.name, "Owner thread stopped");
    }

    /// Run every action queued right now without blocking.
    ///
    /// For hosts that drive the owner thread from their own tick loop.
    /// Returns the number of actions run.
    pub fn pump(&mut self) -> usize {
        self.bind();
        let mut ran = 0;
        while let Ok(job) = self.rx.try_recv() {
            self.execute(job);
            ran += 1;
        }
        ran
    }

    fn bind(&self) {
        let current = thread::current().id();
        let owner = *self.shared.owner.get_or_init(|| current);
        if owner != current {
            error!(
                marshal = %self.shared.name,
                "Owner loop driven from a thread other than its owner"
            );
        }
    }

    fn execute(&self, job: Job) {
        // Jobs catch their own panics; this guards the loop itself.
        if panic::catch_unwind(AssertUnwindSafe(job)).is_err() {
            error!(marshal = %self.shared.name, "Owner thread job panicked outside its guard");
        }
        let depth = self.shared.pending.fetch_sub(1, Ordering::AcqRel) - 1;
        crate::metrics::set_marshal_depth(&self.shared.name, depth);
    }
}

/// Future returned by [`Marshal::submit_async`].
pub struct ActionHandle<R> {
    rx: oneshot::Receiver<Result<R, MarshalError>>,
}

impl<R> Future for ActionHandle<R> {
    type Output = Result<R, MarshalError>;

    fn poll(mut self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Self::Output> {
        Pin::new(&mut self.rx)
            .poll(cx)
            .map(|received| received.unwrap_or(Err(MarshalError::Closed)))
    }
}

fn run_caught<F, R>(action: F) -> Result<R, MarshalError>
where
    F: FnOnce() -> R,
{
    panic::catch_unwind(AssertUnwindSafe(action)).map_err(|payload| {
        error!(panic = %panic_message(payload.as_ref()), "Owner thread action panicked");
        MarshalError::Faulted
    })
}

fn panic_message(payload: &(dyn Any + Send)) -> &str {
    if let Some(s) = payload.downcast_ref::<&str>() {
        *s
    } else if let Some(s) = payload.downcast_ref::<String>() {
        s.as_str()
    } else {
        "non-string panic payload"
    }
}

impl Drop for OwnerLoop {
    fn drop(&mut self) {
        // Refuse new work, then discard what is left. Dropping a blocking
        // job releases its waiter with `Closed`.
        self.rx.close();
        let mut dropped = 0usize;
        while let Ok(job) = self.rx.try_recv() {
            drop(job);
            self.shared.pending.fetch_sub(1, Ordering::AcqRel);
            dropped += 1;
        }
        let depth = self.shared.pending.load(Ordering::Acquire);
        crate::metrics::set_marshal_depth(&self.shared.name, depth);
        if dropped > 0 {
            debug!(marshal = %self.shared.name, dropped, "Owner loop dropped with queued actions");
        }
    }
}
