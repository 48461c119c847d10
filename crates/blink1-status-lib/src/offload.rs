//! Executor offload: run blocking device calls away from the caller's loop.
//!
//! Hosts that drive entities from an event loop must not block it on USB
//! I/O. [`Offload`] is the seam: [`WorkerThread`] hands each job to a
//! dedicated thread and waits for the reply with a timeout, [`Inline`]
//! runs the job on the calling thread (tests, one-shot CLI commands).

use std::fmt;
use std::panic::{self, AssertUnwindSafe};
use std::sync::mpsc;
use std::time::Duration;

/// Errors from handing a job to the offload worker.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum OffloadError {
    /// The worker thread has exited and can no longer accept jobs.
    WorkerGone,
    /// The job did not complete within the timeout.
    Timeout(Duration),
    /// The job panicked. The worker keeps serving later jobs.
    Panicked,
}

impl fmt::Display for OffloadError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            OffloadError::WorkerGone => write!(f, "Offload worker thread has exited"),
            OffloadError::Timeout(d) => {
                write!(f, "Offloaded call timed out after {}ms", d.as_millis())
            }
            OffloadError::Panicked => write!(f, "Offloaded call panicked"),
        }
    }
}

impl std::error::Error for OffloadError {}

/// Runs a blocking job and returns its output.
pub trait Offload {
    fn run<T, F>(&self, job: F) -> Result<T, OffloadError>
    where
        F: FnOnce() -> T + Send + 'static,
        T: Send + 'static;
}

/// Runs jobs directly on the calling thread.
#[derive(Debug, Clone, Copy, Default)]
pub struct Inline;

impl Offload for Inline {
    fn run<T, F>(&self, job: F) -> Result<T, OffloadError>
    where
        F: FnOnce() -> T + Send + 'static,
        T: Send + 'static,
    {
        Ok(job())
    }
}

type Job = Box<dyn FnOnce() + Send>;

/// Default time to wait for an offloaded job.
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(5);

/// A dedicated worker thread fed through a channel.
///
/// The worker runs until the `WorkerThread` is dropped. A job that times out
/// keeps running on the worker; later jobs queue behind it. A panicking job
/// is reported to its caller and does not take the worker down.
pub struct WorkerThread {
    tx: mpsc::Sender<Job>,
    timeout: Duration,
}

impl WorkerThread {
    pub fn new(timeout: Duration) -> Self {
        let (tx, rx) = mpsc::channel::<Job>();
        std::thread::Builder::new()
            .name("blink1-offload".into())
            .spawn(move || {
                while let Ok(job) = rx.recv() {
                    if panic::catch_unwind(AssertUnwindSafe(job)).is_err() {
                        log::error!("offloaded job panicked");
                    }
                }
            })
            .map_err(|e| log::error!("could not spawn offload worker: {e}"))
            .ok();
        WorkerThread { tx, timeout }
    }

    pub fn with_defaults() -> Self {
        Self::new(DEFAULT_TIMEOUT)
    }

    pub fn timeout(&self) -> Duration {
        self.timeout
    }
}

impl Default for WorkerThread {
    fn default() -> Self {
        Self::with_defaults()
    }
}

impl Offload for WorkerThread {
    fn run<T, F>(&self, job: F) -> Result<T, OffloadError>
    where
        F: FnOnce() -> T + Send + 'static,
        T: Send + 'static,
    {
        let (reply_tx, reply_rx) = mpsc::channel();
        self.tx
            .send(Box::new(move || {
                let _ = reply_tx.send(job());
            }))
            .map_err(|_| OffloadError::WorkerGone)?;

        match reply_rx.recv_timeout(self.timeout) {
            Ok(value) => Ok(value),
            Err(mpsc::RecvTimeoutError::Timeout) => Err(OffloadError::Timeout(self.timeout)),
            // The reply sender is dropped without a value only when the job unwound.
            Err(mpsc::RecvTimeoutError::Disconnected) => Err(OffloadError::Panicked),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn inline_runs_on_caller_thread() {
        let caller = std::thread::current().id();
        let ran_on = Inline.run(|| std::thread::current().id()).unwrap();
        assert_eq!(ran_on, caller);
    }

    #[test]
    fn worker_returns_job_output() {
        let worker = WorkerThread::with_defaults();
        assert_eq!(worker.run(|| 21 * 2).unwrap(), 42);
    }

    #[test]
    fn worker_runs_off_caller_thread() {
        let worker = WorkerThread::with_defaults();
        let caller = std::thread::current().id();
        let ran_on = worker.run(|| std::thread::current().id()).unwrap();
        assert_ne!(ran_on, caller);
    }

    #[test]
    fn worker_runs_jobs_in_order() {
        let worker = WorkerThread::with_defaults();
        let results: Vec<u32> = (0..5).map(|i| worker.run(move || i).unwrap()).collect();
        assert_eq!(results, vec![0, 1, 2, 3, 4]);
    }

    #[test]
    fn worker_times_out_slow_job() {
        let worker = WorkerThread::new(Duration::from_millis(20));
        let err = worker
            .run(|| std::thread::sleep(Duration::from_millis(500)))
            .unwrap_err();
        assert_eq!(err, OffloadError::Timeout(Duration::from_millis(20)));
    }

    #[test]
    fn worker_survives_panicked_job() {
        let worker = WorkerThread::with_defaults();
        let err = worker.run(|| -> u8 { panic!("boom") }).unwrap_err();
        assert_eq!(err, OffloadError::Panicked);
        assert_eq!(worker.run(|| 7).unwrap(), 7);
        assert_eq!(worker.run(|| 8).unwrap(), 8);
    }

    #[test]
    fn panicked_display() {
        assert_eq!(OffloadError::Panicked.to_string(), "Offloaded call panicked");
    }

    #[test]
    fn timeout_display() {
        let e = OffloadError::Timeout(Duration::from_millis(1500));
        assert_eq!(e.to_string(), "Offloaded call timed out after 1500ms");
    }
}
