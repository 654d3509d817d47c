//! Task model of the scheduler.

use atomic::{Atomic, Ordering};
use std::fmt::{Debug, Formatter};

/// Well-known task type tags.
///
/// The scheduler accepts arbitrary registered type names; these are the
/// tags the default configuration ships with.
pub mod task_types {
    pub const GENERIC: &str = "Generic";
    pub const FILE_IO: &str = "FileIO";
    pub const CHUNK_GEN: &str = "ChunkGen";
    pub const RENDERING: &str = "Rendering";
}

/// Lifecycle state of a submitted task.
///
/// The state always matches the queue the task currently resides in and is
/// readable without a lock. All transitions happen under the scheduler's
/// queue mutex.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash)]
#[repr(u8)]
pub enum TaskState {
    /// Waiting in the pending queue.
    Queued,
    /// Currently held by a worker.
    Executing,
    /// Finished, awaiting retrieval.
    Completed,
}

/// Two-level task priority.
///
/// Within one task type, `High` tasks drain before `Normal` ones. There is
/// no aging: a steady stream of `High` submissions starves `Normal` tasks.
#[derive(Debug, Copy, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Default)]
pub enum TaskPriority {
    #[default]
    Normal,
    High,
}

/// A unit of deferred work.
///
/// A task carries an immutable type tag selecting the worker pool that may
/// run it, an atomic [`TaskState`], and a payload closure. The scheduler
/// owns the task from [`submit`](crate::TaskScheduler::submit) until it is
/// handed back by [`retrieve_completed`](crate::TaskScheduler::retrieve_completed).
pub struct Task {
    task_type: String,
    state: Atomic<TaskState>,
    payload: Option<Box<dyn FnOnce() + Send>>,
}

impl Task {
    /// Creates a new task bound to `task_type`.
    pub fn new(task_type: impl Into<String>, payload: impl FnOnce() + Send + 'static) -> Self {
        Self {
            task_type: task_type.into(),
            state: Atomic::new(TaskState::Queued),
            payload: Some(Box::new(payload)),
        }
    }

    /// The type tag the task was constructed with.
    pub fn task_type(&self) -> &str {
        &self.task_type
    }

    /// Current lifecycle state. Lock-free.
    pub fn state(&self) -> TaskState {
        self.state.load(Ordering::Acquire)
    }

    pub(crate) fn set_state(&self, state: TaskState) {
        self.state.store(state, Ordering::Release);
    }

    /// Takes the payload out of the task. Returns `None` if it already ran.
    pub(crate) fn take_payload(&mut self) -> Option<Box<dyn FnOnce() + Send>> {
        self.payload.take()
    }
}

impl Debug for Task {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Task")
            .field("task_type", &self.task_type)
            .field("state", &self.state())
            .finish_non_exhaustive()
    }
}
