//! Background dispatch
//!
//! Runs repository reads and logins off the interactive thread and hands the
//! results back over a channel. While a job is outstanding its
//! [`ControlGate`] stays disabled; the gate re-enables when the delivered
//! [`Completion`] is dropped, whether the job succeeded, failed or panicked.
//!
//! Jobs return values only. Anything that touches interactive state happens
//! when the caller handles the completion.
//!
//! ```rust,no_run
//! use minotor_core::dispatch::Dispatcher;
//!
//! let runtime = tokio::runtime::Runtime::new().unwrap();
//! let mut dispatcher = Dispatcher::new(runtime.handle().clone());
//! dispatcher.spawn_blocking(|| Ok(21 * 2));
//! let answer = dispatcher.blocking_next().map(|c| c.into_result());
//! ```

mod gate;

use std::future::Future;

use tokio::runtime::Handle;
use tokio::sync::mpsc;

use crate::error::{Error, Result};

pub use gate::{ControlGate, GateGuard};

/// Result of one dispatched job, delivered to the interactive side.
///
/// Holds the gate closed until dropped.
#[derive(Debug)]
pub struct Completion<T> {
    result: Result<T>,
    _guard: GateGuard,
}

impl<T> Completion<T> {
    pub fn result(&self) -> &Result<T> {
        &self.result
    }

    /// Take the result, re-enabling the gate.
    pub fn into_result(self) -> Result<T> {
        self.result
    }

    /// Run `f` on the result with the gate still closed, then re-enable it.
    pub fn handle<R>(self, f: impl FnOnce(Result<T>) -> R) -> R {
        let Completion { result, _guard } = self;
        f(result)
    }
}

/// Spawns jobs on a tokio runtime and collects their completions.
pub struct Dispatcher<T> {
    runtime: Handle,
    gate: ControlGate,
    tx: mpsc::UnboundedSender<Completion<T>>,
    rx: mpsc::UnboundedReceiver<Completion<T>>,
}

impl<T: Send + 'static> Dispatcher<T> {
    pub fn new(runtime: Handle) -> Self {
        let (tx, rx) = mpsc::unbounded_channel();
        Self {
            runtime,
            gate: ControlGate::new(),
            tx,
            rx,
        }
    }

    /// Handle to the gate this dispatcher holds while jobs run
    pub fn gate(&self) -> ControlGate {
        self.gate.clone()
    }

    /// Run blocking work (e.g. a repository read) on the blocking pool.
    pub fn spawn_blocking<F>(&self, job: F)
    where
        F: FnOnce() -> Result<T> + Send + 'static,
    {
        let guard = self.gate.hold();
        let tx = self.tx.clone();
        let runtime = self.runtime.clone();
        self.runtime.spawn(async move {
            let result = match runtime.spawn_blocking(job).await {
                Ok(result) => result,
                Err(e) => Err(Error::Task(e.to_string())),
            };
            deliver(&tx, result, guard);
        });
    }

    /// Run async work (e.g. a login) as a task.
    pub fn spawn<Fut>(&self, job: Fut)
    where
        Fut: Future<Output = Result<T>> + Send + 'static,
    {
        let guard = self.gate.hold();
        let tx = self.tx.clone();
        let runtime = self.runtime.clone();
        self.runtime.spawn(async move {
            let result = match runtime.spawn(job).await {
                Ok(result) => result,
                Err(e) => Err(Error::Task(e.to_string())),
            };
            deliver(&tx, result, guard);
        });
    }

    /// Wait for the next completion from async code.
    pub async fn next(&mut self) -> Option<Completion<T>> {
        self.rx.recv().await
    }

    /// Wait for the next completion from a thread outside the runtime.
    ///
    /// Panics if called from within an async context.
    pub fn blocking_next(&mut self) -> Option<Completion<T>> {
        self.rx.blocking_recv()
    }

    /// Completion that is already waiting, if any.
    pub fn try_next(&mut self) -> Option<Completion<T>> {
        self.rx.try_recv().ok()
    }
}

fn deliver<T>(tx: &mpsc::UnboundedSender<Completion<T>>, result: Result<T>, guard: GateGuard) {
    if let Err(e) = &result {
        tracing::warn!("Background job failed: {}", e);
    }
    if tx.send(Completion { result, _guard: guard }).is_err() {
        tracing::debug!("Dispatcher dropped before job completed");
    }
}
