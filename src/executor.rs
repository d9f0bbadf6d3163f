use crate::types::error::ClientError;

use std::pin::Pin;
use std::sync::Arc;
use tokio::sync::mpsc;

type Task = Box<dyn FnOnce() + Send>;
type BackgroundTask = Pin<Box<dyn Future<Output = ()> + Send>>;

/// Receives the outcome of one client call. Both methods are invoked on the
/// application's primary context, via the [`CallbackDriver`], never on the
/// background task that performed the work, and at most once per call.
pub trait StarFlightCallback<T>: Send + Sync + 'static {
    fn on_success(&self, response: T);
    fn on_failure(&self, message: &str, cause: &ClientError);
}

pub type SharedCallback<T> = Arc<dyn StarFlightCallback<T>>;

/// Cloneable handle used by background tasks to enqueue continuations.
#[derive(Clone)]
pub struct CallbackQueue {
    sender: mpsc::UnboundedSender<Task>,
}

/// The single consumer of the queue. The application owns this and drives it
/// on whatever context it considers primary; continuations run in submission
/// order.
pub struct CallbackDriver {
    receiver: mpsc::UnboundedReceiver<Task>,
}

pub fn callback_queue() -> (CallbackQueue, CallbackDriver) {
    let (sender, receiver) = mpsc::unbounded_channel();
    (CallbackQueue { sender }, CallbackDriver { receiver })
}

/// The dedicated background worker: submitted tasks run to completion one at
/// a time, in submission order. The worker loop ends once every handle is
/// dropped and the backlog is drained.
#[derive(Clone)]
pub struct BackgroundWorker {
    sender: mpsc::UnboundedSender<BackgroundTask>,
}

impl BackgroundWorker {
    /// Spawns the worker loop; must be called from within a tokio runtime.
    pub fn spawn() -> Self {
        let (sender, mut receiver) = mpsc::unbounded_channel::<BackgroundTask>();
        tokio::spawn(async move {
            while let Some(task) = receiver.recv().await {
                task.await;
            }
        });
        Self { sender }
    }

    /// Submits one task; it runs after everything submitted before it.
    pub fn submit(&self, task: impl Future<Output = ()> + Send + 'static) {
        let _ = self.sender.send(Box::pin(task));
    }
}

impl CallbackQueue {
    pub fn post(&self, task: impl FnOnce() + Send + 'static) {
        // A dropped driver means the application stopped listening; the
        // result is discarded, matching a null callback.
        let _ = self.sender.send(Box::new(task));
    }
}

impl CallbackDriver {
    /// Waits for and runs the next continuation. Returns `false` once every
    /// queue handle has been dropped and the backlog is drained.
    pub async fn run_next(&mut self) -> bool {
        match self.receiver.recv().await {
            Some(task) => {
                task();
                true
            }
            None => false,
        }
    }

    /// Runs every continuation already queued without waiting for more.
    /// Returns how many ran.
    pub fn run_pending(&mut self) -> usize {
        let mut ran = 0;
        while let Ok(task) = self.receiver.try_recv() {
            task();
            ran += 1;
        }
        ran
    }
}
