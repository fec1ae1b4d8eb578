//! Bounded task queue feeding the service loop.
//!
//! Radio callbacks and other external contexts never mutate service state
//! directly; they post a task and the single consumer applies it. Posting
//! is gated on the service phase so callbacks that fire before the service
//! is up, or linger after it stopped, are rejected instead of queued.

use std::sync::atomic::{AtomicU8, Ordering};
use std::sync::Arc;

use thiserror::Error;
use tokio::sync::mpsc;
use tokio::sync::mpsc::error::TrySendError;

pub const TASK_QUEUE_CAPACITY: usize = 256;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ServicePhase {
    Starting,
    Running,
    Stopping,
}

impl ServicePhase {
    fn from_u8(value: u8) -> Self {
        match value {
            1 => Self::Running,
            2 => Self::Stopping,
            _ => Self::Starting,
        }
    }
}

/// Shared view of the service phase. Cheap to clone and safe to read from
/// any context.
#[derive(Debug, Clone, Default)]
pub struct PhaseHandle {
    phase: Arc<AtomicU8>,
}

impl PhaseHandle {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn set(&self, phase: ServicePhase) {
        self.phase.store(phase as u8, Ordering::Release);
    }

    pub fn get(&self) -> ServicePhase {
        ServicePhase::from_u8(self.phase.load(Ordering::Acquire))
    }
}

#[derive(Debug, Error, PartialEq, Eq)]
pub enum TaskError {
    /// The consumer fell too far behind; the task is dropped, not queued.
    #[error("task queue overflow")]
    Overflow,
    #[error("service is not running")]
    ServiceDown,
}

/// Posting side of the queue. Non-blocking by construction.
#[derive(Debug)]
pub struct TaskSender<T> {
    tx: mpsc::Sender<T>,
    phase: PhaseHandle,
}

impl<T> Clone for TaskSender<T> {
    fn clone(&self) -> Self {
        Self {
            tx: self.tx.clone(),
            phase: self.phase.clone(),
        }
    }
}

impl<T> TaskSender<T> {
    pub fn post(&self, task: T) -> Result<(), TaskError> {
        if self.phase.get() != ServicePhase::Running {
            return Err(TaskError::ServiceDown);
        }
        self.tx.try_send(task).map_err(|err| match err {
            TrySendError::Full(_) => TaskError::Overflow,
            TrySendError::Closed(_) => TaskError::ServiceDown,
        })
    }
}

/// Consuming side, owned by the service loop.
#[derive(Debug)]
pub struct TaskQueue<T> {
    rx: mpsc::Receiver<T>,
}

impl<T> TaskQueue<T> {
    pub async fn next(&mut self) -> Option<T> {
        self.rx.recv().await
    }
}

/// Builds a queue of `capacity` slots, starting in the `Starting` phase.
pub fn queue<T>(capacity: usize) -> (TaskSender<T>, TaskQueue<T>, PhaseHandle) {
    let (tx, rx) = mpsc::channel(capacity);
    let phase = PhaseHandle::new();
    (
        TaskSender {
            tx,
            phase: phase.clone(),
        },
        TaskQueue { rx },
        phase,
    )
}
