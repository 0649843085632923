//! Bounded execution of detached background work.
//!
//! Cache population, cache invalidation and stats recording must never delay
//! or fail the request that triggered them. Instead of spawning untracked
//! tasks, callers hand that work to a [`TaskDispatcher`]: a bounded queue
//! drained by a supervisor that runs at most `max_concurrency` jobs at once,
//! each under its own timeout. Failures are logged, never retried and never
//! reported back to the submitter.

use parking_lot::Mutex;
use std::future::Future;
use std::pin::Pin;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;
use thiserror::Error;
use tokio::sync::mpsc::error::TrySendError;
use tokio::sync::{mpsc, Notify, Semaphore};
use tokio::task::{JoinError, JoinHandle, JoinSet};
use tracing::{debug, trace, warn};
use typed_builder::TypedBuilder;

type Job = Pin<Box<dyn Future<Output = anyhow::Result<()>> + Send + 'static>>;

struct Envelope {
    name: &'static str,
    job: Job,
}

/// Configures a [`TaskDispatcher`].
#[derive(Debug, Clone, Copy, TypedBuilder)]
pub struct DispatcherSettings {
    /// Jobs that may wait in the queue before submissions are rejected.
    #[builder(default = 1024)]
    pub queue_capacity: usize,
    /// Jobs that may run at the same time.
    #[builder(default = 32)]
    pub max_concurrency: usize,
    /// Deadline applied to every job, independent of any request deadline.
    #[builder(default = Duration::from_secs(5))]
    pub task_timeout: Duration,
}

impl Default for DispatcherSettings {
    fn default() -> Self {
        Self::builder().build()
    }
}

#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum DispatchError {
    #[error("task queue is full, dropped task '{0}'")]
    QueueFull(&'static str),
    #[error("dispatcher is shut down, dropped task '{0}'")]
    Closed(&'static str),
}

#[derive(Default)]
struct Tracker {
    pending: AtomicUsize,
    idle: Notify,
}

impl Tracker {
    fn finish(&self) {
        if self.pending.fetch_sub(1, Ordering::SeqCst) == 1 {
            self.idle.notify_waiters();
        }
    }
}

/// Marks a job as finished when dropped, including when the job panics.
struct PendingGuard(Arc<Tracker>);

impl Drop for PendingGuard {
    fn drop(&mut self) {
        self.0.finish();
    }
}

struct Shared {
    sender: Mutex<Option<mpsc::Sender<Envelope>>>,
    supervisor: Mutex<Option<JoinHandle<()>>>,
    tracker: Arc<Tracker>,
}

/// Handle used to submit detached jobs.
///
/// Cloning is cheap; all clones feed the same queue. Dropping the last clone
/// closes the queue, after which the supervisor finishes the queued jobs and
/// exits. Call [`TaskDispatcher::shutdown`] to wait for that to happen.
#[derive(Clone)]
pub struct TaskDispatcher {
    shared: Arc<Shared>,
}

impl std::fmt::Debug for TaskDispatcher {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TaskDispatcher")
            .field("pending", &self.pending())
            .field("closed", &self.is_closed())
            .finish()
    }
}

impl TaskDispatcher {
    /// Starts the supervisor on the current tokio runtime.
    pub fn start(settings: DispatcherSettings) -> Self {
        let (sender, receiver) = mpsc::channel(settings.queue_capacity.max(1));
        let tracker = Arc::new(Tracker::default());
        let supervisor = tokio::spawn(supervise(receiver, settings));

        debug!(
            queue_capacity = settings.queue_capacity,
            max_concurrency = settings.max_concurrency,
            task_timeout_ms = settings.task_timeout.as_millis() as u64,
            "task dispatcher started"
        );

        Self {
            shared: Arc::new(Shared {
                sender: Mutex::new(Some(sender)),
                supervisor: Mutex::new(Some(supervisor)),
                tracker,
            }),
        }
    }

    /// Queues `job` without waiting for it.
    ///
    /// Returns an error if the queue is full or the dispatcher has been shut
    /// down; the job is dropped in both cases.
    pub fn submit<F>(&self, name: &'static str, job: F) -> Result<(), DispatchError>
    where
        F: Future<Output = anyhow::Result<()>> + Send + 'static,
    {
        let sender = self.shared.sender.lock();
        let Some(sender) = sender.as_ref() else {
            return Err(DispatchError::Closed(name));
        };

        self.shared.tracker.pending.fetch_add(1, Ordering::SeqCst);
        let guard = PendingGuard(Arc::clone(&self.shared.tracker));
        let job = Box::pin(async move {
            let _guard = guard;
            job.await
        });

        match sender.try_send(Envelope { name, job }) {
            Ok(()) => {
                trace!(task = name, "queued background task");
                Ok(())
            }
            // The rejected envelope is dropped here, which releases its guard.
            Err(TrySendError::Full(_)) => Err(DispatchError::QueueFull(name)),
            Err(TrySendError::Closed(_)) => Err(DispatchError::Closed(name)),
        }
    }

    /// Like [`submit`](Self::submit), but logs a rejected job instead of
    /// returning the error.
    pub fn dispatch<F>(&self, name: &'static str, job: F)
    where
        F: Future<Output = anyhow::Result<()>> + Send + 'static,
    {
        if let Err(e) = self.submit(name, job) {
            warn!(task = name, error = %e, "background task rejected");
        }
    }

    /// Number of submitted jobs that have not finished yet.
    pub fn pending(&self) -> usize {
        self.shared.tracker.pending.load(Ordering::SeqCst)
    }

    pub fn is_closed(&self) -> bool {
        self.shared.sender.lock().is_none()
    }

    /// Waits until every submitted job has finished.
    pub async fn wait_idle(&self) {
        loop {
            let notified = self.shared.tracker.idle.notified();
            if self.pending() == 0 {
                return;
            }
            notified.await;
        }
    }

    /// Stops accepting jobs, then waits for queued and running jobs to finish.
    pub async fn shutdown(&self) {
        let sender = self.shared.sender.lock().take();
        drop(sender);

        let supervisor = self.shared.supervisor.lock().take();
        if let Some(supervisor) = supervisor {
            if let Err(e) = supervisor.await {
                warn!(error = %e, "task dispatcher supervisor ended abnormally");
            }
        }
        debug!("task dispatcher shut down");
    }
}

async fn supervise(mut receiver: mpsc::Receiver<Envelope>, settings: DispatcherSettings) {
    let permits = Arc::new(Semaphore::new(settings.max_concurrency.max(1)));
    let mut running = JoinSet::new();

    while let Some(Envelope { name, job }) = receiver.recv().await {
        let Ok(permit) = Arc::clone(&permits).acquire_owned().await else {
            break;
        };
        let timeout = settings.task_timeout;

        running.spawn(async move {
            let _permit = permit;
            match tokio::time::timeout(timeout, job).await {
                Ok(Ok(())) => trace!(task = name, "background task completed"),
                Ok(Err(e)) => warn!(task = name, error = %e, "background task failed"),
                Err(_) => warn!(
                    task = name,
                    timeout_ms = timeout.as_millis() as u64,
                    "background task timed out"
                ),
            }
        });

        while let Some(result) = running.try_join_next() {
            log_join(result);
        }
    }

    while let Some(result) = running.join_next().await {
        log_join(result);
    }
}

fn log_join(result: Result<(), JoinError>) {
    if let Err(e) = result {
        warn!(error = %e, "background task panicked or was cancelled");
    }
}
