// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Task runner: a fixed pool of cooperative workers over a FIFO queue.
//!
//! Submission is unbounded; each task carries a cancellation token the task
//! body is expected to observe at suspension points. A task cancelled before
//! a worker picks it up is skipped and recorded as cancelled without ever
//! running.

use crate::error::JobError;
use parking_lot::Mutex;
use stashhog_core::TaskId;
use std::collections::HashMap;
use std::future::Future;
use std::pin::Pin;
use std::sync::Arc;
use tokio::sync::mpsc;
use tokio::sync::Mutex as AsyncMutex;
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info};

/// Default worker-pool width.
pub const DEFAULT_WORKERS: usize = 5;

/// Observable task state.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TaskStatus {
    Pending,
    Running,
    Completed,
    Failed,
    Cancelled,
}

impl TaskStatus {
    pub fn is_terminal(&self) -> bool {
        matches!(self, TaskStatus::Completed | TaskStatus::Failed | TaskStatus::Cancelled)
    }
}

stashhog_core::simple_display! {
    TaskStatus {
        Pending => "pending",
        Running => "running",
        Completed => "completed",
        Failed => "failed",
        Cancelled => "cancelled",
    }
}

/// Terminal result a task body reports back to the runner.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TaskOutcome {
    Completed,
    Failed,
    Cancelled,
}

type BoxedTask = Pin<Box<dyn Future<Output = TaskOutcome> + Send>>;
type TaskFactory = Box<dyn FnOnce(CancellationToken) -> BoxedTask + Send>;

struct QueuedTask {
    id: TaskId,
    factory: TaskFactory,
}

struct TaskEntry {
    name: String,
    status: TaskStatus,
    token: CancellationToken,
}

struct RunnerInner {
    queue_tx: Mutex<Option<mpsc::UnboundedSender<QueuedTask>>>,
    tasks: Mutex<HashMap<TaskId, TaskEntry>>,
    workers: Mutex<Vec<JoinHandle<()>>>,
}

/// Shared handle to the worker pool.
#[derive(Clone)]
pub struct TaskRunner {
    inner: Arc<RunnerInner>,
}

impl TaskRunner {
    /// Spawn the pool with the given number of workers.
    pub fn start(workers: usize) -> Self {
        let (queue_tx, queue_rx) = mpsc::unbounded_channel::<QueuedTask>();
        let inner = Arc::new(RunnerInner {
            queue_tx: Mutex::new(Some(queue_tx)),
            tasks: Mutex::new(HashMap::new()),
            workers: Mutex::new(Vec::new()),
        });

        let queue_rx = Arc::new(AsyncMutex::new(queue_rx));
        let mut handles = Vec::with_capacity(workers);
        for worker_idx in 0..workers.max(1) {
            let queue_rx = Arc::clone(&queue_rx);
            let inner_ref = Arc::clone(&inner);
            handles.push(tokio::spawn(async move {
                worker_loop(worker_idx, queue_rx, inner_ref).await;
            }));
        }
        *inner.workers.lock() = handles;

        Self { inner }
    }

    /// Queue a task. The factory is invoked on a worker with the task's
    /// cancellation token.
    pub fn submit<F, Fut>(&self, name: &str, factory: F) -> Result<TaskId, JobError>
    where
        F: FnOnce(CancellationToken) -> Fut + Send + 'static,
        Fut: Future<Output = TaskOutcome> + Send + 'static,
    {
        let id = TaskId::new();
        let token = CancellationToken::new();
        self.inner.tasks.lock().insert(
            id,
            TaskEntry { name: name.to_string(), status: TaskStatus::Pending, token },
        );

        let queued = QueuedTask {
            id,
            factory: Box::new(move |token| Box::pin(factory(token)) as BoxedTask),
        };
        let sent = match self.inner.queue_tx.lock().as_ref() {
            Some(tx) => tx.send(queued).is_ok(),
            None => false,
        };
        if !sent {
            self.inner.tasks.lock().remove(&id);
            return Err(JobError::Validation("task runner is stopped".to_string()));
        }
        debug!(task_id = %id, name, "task submitted");
        Ok(id)
    }

    /// Cancel a task, returning its status at the moment of cancellation.
    ///
    /// A pending task is removed from consideration and marked cancelled; a
    /// running task only has its token fired. `None` for unknown or already
    /// terminal tasks.
    pub fn cancel(&self, id: &TaskId) -> Option<TaskStatus> {
        let mut tasks = self.inner.tasks.lock();
        let entry = tasks.get_mut(id)?;
        if entry.status.is_terminal() {
            return None;
        }
        let before = entry.status;
        entry.token.cancel();
        if entry.status == TaskStatus::Pending {
            entry.status = TaskStatus::Cancelled;
        }
        Some(before)
    }

    pub fn status(&self, id: &TaskId) -> Option<TaskStatus> {
        self.inner.tasks.lock().get(id).map(|e| e.status)
    }

    pub fn task_name(&self, id: &TaskId) -> Option<String> {
        self.inner.tasks.lock().get(id).map(|e| e.name.clone())
    }

    /// Drain: stop accepting, cancel outstanding tasks, wait for workers.
    pub async fn stop(&self) {
        info!("stopping task runner");
        self.inner.queue_tx.lock().take();
        {
            let mut tasks = self.inner.tasks.lock();
            for entry in tasks.values_mut() {
                if !entry.status.is_terminal() {
                    entry.token.cancel();
                    if entry.status == TaskStatus::Pending {
                        entry.status = TaskStatus::Cancelled;
                    }
                }
            }
        }
        let handles: Vec<JoinHandle<()>> = std::mem::take(&mut *self.inner.workers.lock());
        for handle in handles {
            let _ = handle.await;
        }
    }
}

async fn worker_loop(
    worker_idx: usize,
    queue_rx: Arc<AsyncMutex<mpsc::UnboundedReceiver<QueuedTask>>>,
    inner: Arc<RunnerInner>,
) {
    debug!(worker_idx, "worker started");
    loop {
        let queued = { queue_rx.lock().await.recv().await };
        let Some(queued) = queued else {
            break;
        };

        // Claim the task; skip it when it was cancelled while queued.
        let token = {
            let mut tasks = inner.tasks.lock();
            match tasks.get_mut(&queued.id) {
                Some(entry) if entry.status == TaskStatus::Pending => {
                    entry.status = TaskStatus::Running;
                    entry.token.clone()
                }
                _ => continue,
            }
        };

        let outcome = (queued.factory)(token).await;
        let mut tasks = inner.tasks.lock();
        if let Some(entry) = tasks.get_mut(&queued.id) {
            entry.status = match outcome {
                TaskOutcome::Completed => TaskStatus::Completed,
                TaskOutcome::Failed => TaskStatus::Failed,
                TaskOutcome::Cancelled => TaskStatus::Cancelled,
            };
        }
    }
    debug!(worker_idx, "worker stopped");
}

#[cfg(test)]
#[path = "runner_tests.rs"]
mod tests;
