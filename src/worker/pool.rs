//! Bounded worker pool with request-context propagation at the dispatch seam.
//!
//! The pool is a fixed set of named OS threads draining a shared channel.
//! Every job submitted through [`WorkerPool::execute`] passes through the
//! propagation hook ([`crate::worker::traced_job`]) once, at dispatch — call
//! sites never instrument by hand, matching the rest of the crate's
//! definition-time wrapping approach.

use std::panic::AssertUnwindSafe;
use std::sync::mpsc;
use std::sync::{Arc, Mutex};
use std::thread::JoinHandle;

use crate::domain::{Result, TraceError};

use super::job::traced_job;

type Job = Box<dyn FnOnce() + Send + 'static>;

/// A bounded pool of borrowed execution threads.
///
/// Dropping the pool closes the channel and joins every worker, so queued
/// jobs finish before the pool disappears.
///
/// # Examples
///
/// ```
/// use reqtrace::WorkerPool;
///
/// let pool = WorkerPool::new(2).unwrap();
/// pool.execute("warmup", || {}).unwrap();
/// drop(pool); // waits for the job
/// ```
#[derive(Debug)]
pub struct WorkerPool {
    sender: Option<mpsc::Sender<Job>>,
    workers: Vec<JoinHandle<()>>,
}

impl WorkerPool {
    /// Creates a pool of `size` worker threads (at least one).
    ///
    /// # Errors
    ///
    /// Returns [`TraceError::Worker`] if a worker thread cannot be spawned.
    pub fn new(size: usize) -> Result<Self> {
        let size = size.max(1);
        let (sender, receiver) = mpsc::channel::<Job>();
        let receiver = Arc::new(Mutex::new(receiver));

        let workers = (0..size)
            .map(|index| {
                let receiver = Arc::clone(&receiver);
                std::thread::Builder::new()
                    .name(format!("reqtrace-worker-{index}"))
                    .spawn(move || worker_loop(&receiver))
                    .map_err(|e| TraceError::Worker(format!("failed to spawn worker: {e}")))
            })
            .collect::<Result<Vec<_>>>()?;

        tracing::debug!(size, "worker pool started");
        Ok(Self {
            sender: Some(sender),
            workers,
        })
    }

    /// Dispatches one unit of work to the pool.
    ///
    /// The dispatching thread's ambient request id is captured here, before
    /// the hand-off; execution on the borrowed thread is bracketed by the
    /// install/span/restore sequence of the propagation hook. `label` names
    /// the dispatched callable for the synthetic hand-off span.
    ///
    /// # Errors
    ///
    /// Returns [`TraceError::Worker`] if the pool has shut down.
    pub fn execute<F>(&self, label: &str, f: F) -> Result<()>
    where
        F: FnOnce() + Send + 'static,
    {
        let job = traced_job(label.to_string(), f);
        let sender = self
            .sender
            .as_ref()
            .ok_or_else(|| TraceError::Worker("pool is shut down".to_string()))?;
        sender
            .send(Box::new(job))
            .map_err(|_| TraceError::Worker("worker channel closed".to_string()))
    }
}

impl Drop for WorkerPool {
    fn drop(&mut self) {
        drop(self.sender.take());
        for worker in self.workers.drain(..) {
            if worker.join().is_err() {
                tracing::error!("worker thread terminated by panic");
            }
        }
        tracing::debug!("worker pool stopped");
    }
}

/// Drains jobs until the channel closes. A panicking job is contained so the
/// borrowed thread stays available for unrelated work.
fn worker_loop(receiver: &Mutex<mpsc::Receiver<Job>>) {
    loop {
        let job = {
            let guard = receiver
                .lock()
                .unwrap_or_else(std::sync::PoisonError::into_inner);
            guard.recv()
        };
        match job {
            Ok(job) => {
                if std::panic::catch_unwind(AssertUnwindSafe(job)).is_err() {
                    tracing::error!("dispatched job panicked");
                }
            }
            Err(_) => break,
        }
    }
}
