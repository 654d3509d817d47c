//! Worker threads bound to a single task type.

use crate::scheduler::SchedulerCore;
use log::{debug, error, trace, warn};
use std::any::Any;
use std::panic::{catch_unwind, AssertUnwindSafe};
use std::sync::Arc;
use std::thread::JoinHandle;

/// A long-lived thread executing tasks of exactly one type.
///
/// Workers never dequeue tasks of other types; an idle worker of an
/// overloaded type is the accepted cost of type isolation.
#[derive(Debug)]
pub(crate) struct TaskWorker {
    id: usize,
    task_type: String,
    thread: JoinHandle<()>,
}

impl TaskWorker {
    pub fn spawn(id: usize, task_type: String, core: Arc<SchedulerCore>) -> Result<Self, crate::ScheduleError> {
        let thread = std::thread::Builder::new()
            .name(format!("Worker {id}"))
            .spawn({
                let task_type = task_type.clone();
                move || worker_main(id, &task_type, &core)
            })?;

        Ok(Self {
            id,
            task_type,
            thread,
        })
    }

    pub fn join(self) {
        if self.thread.join().is_err() {
            error!("worker {} ({:?}) thread panicked", self.id, self.task_type);
        }
    }
}

fn worker_main(id: usize, task_type: &str, core: &SchedulerCore) {
    debug!("worker {id} ({task_type:?}) started");

    while let Some(mut task) = core.next_task(task_type) {
        trace!("worker {id} executing a {task_type:?} task");

        // Run the payload outside the queue mutex so the pool executes in
        // parallel. A payload panic completes the task instead of killing
        // the worker.
        if let Some(payload) = task.take_payload() {
            if let Err(panic) = catch_unwind(AssertUnwindSafe(payload)) {
                warn!(
                    "worker {id}: task of type {task_type:?} panicked: {}",
                    panic_message(&*panic)
                );
            }
        }

        core.finish_task(task);
    }

    debug!("worker {id} ({task_type:?}) exiting");
}

fn panic_message(payload: &(dyn Any + Send)) -> &str {
    payload
        .downcast_ref::<&str>()
        .copied()
        .or_else(|| payload.downcast_ref::<String>().map(String::as_str))
        .unwrap_or("opaque panic payload")
}
