//! The typed task scheduler.
//!
//! Work items are routed to pools of worker threads partitioned by task
//! type. Three queues track the task lifecycle (pending, executing,
//! completed), all guarded by a single mutex. One condition variable per
//! task type wakes exactly the workers that can make progress, so idle
//! pools never spin and never receive wake-ups for foreign work.

use crate::config::ScheduleConfig;
use crate::registry::TaskTypeRegistry;
use crate::task::{Task, TaskPriority, TaskState};
use crate::worker::TaskWorker;
use log::{debug, info, trace, warn};
use parking_lot::{Condvar, Mutex};
use std::collections::{BTreeMap, VecDeque};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, OnceLock};
use thiserror::Error;

/// Errors surfaced by scheduler startup.
#[derive(Debug, Error)]
pub enum ScheduleError {
    #[error("failed to spawn worker thread: {0}")]
    SpawnWorker(#[from] std::io::Error),
}

/// Lifecycle phase of a [`TaskScheduler`].
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub enum SchedulerPhase {
    /// Constructed, workers not yet spawned.
    Configured,
    /// Accepting and executing tasks.
    Running,
    /// Shutdown in progress, workers finishing queued work.
    Draining,
    /// Shut down, all workers joined.
    Terminated,
}

/// Pending tasks of one type, split by priority.
#[derive(Debug, Default)]
struct TypeQueue {
    high: VecDeque<Task>,
    normal: VecDeque<Task>,
}

impl TypeQueue {
    fn push(&mut self, task: Task, priority: TaskPriority) {
        match priority {
            TaskPriority::High => self.high.push_back(task),
            TaskPriority::Normal => self.normal.push_back(task),
        }
    }

    /// High drains before Normal, FIFO within a priority.
    fn pop(&mut self) -> Option<Task> {
        self.high.pop_front().or_else(|| self.normal.pop_front())
    }

    fn len(&self) -> usize {
        self.high.len() + self.normal.len()
    }
}

/// The three-queue system. Every access goes through the queue mutex.
///
/// Executing tasks are owned by the worker running them, so the executing
/// "set" is tracked as a per-type count.
#[derive(Debug, Default)]
struct TaskQueues {
    pending: BTreeMap<String, TypeQueue>,
    executing: BTreeMap<String, usize>,
    completed: VecDeque<Task>,
}

impl TaskQueues {
    fn new(types: &[String]) -> Self {
        let mut queues = Self::default();
        for ty in types {
            queues.pending.insert(ty.clone(), TypeQueue::default());
            queues.executing.insert(ty.clone(), 0);
        }
        queues
    }

    fn push(&mut self, task: Task, priority: TaskPriority) {
        task.set_state(TaskState::Queued);
        if let Some(bucket) = self.pending.get_mut(task.task_type()) {
            bucket.push(task, priority);
        }
    }

    fn pop(&mut self, task_type: &str) -> Option<Task> {
        let task = self.pending.get_mut(task_type)?.pop()?;
        task.set_state(TaskState::Executing);
        if let Some(count) = self.executing.get_mut(task_type) {
            *count += 1;
        }
        Some(task)
    }

    fn complete(&mut self, task: Task) {
        if let Some(count) = self.executing.get_mut(task.task_type()) {
            *count = count.saturating_sub(1);
        }
        task.set_state(TaskState::Completed);
        self.completed.push_back(task);
    }

    fn drain_completed(&mut self) -> Vec<Task> {
        self.completed.drain(..).collect()
    }

    fn pending_count(&self, task_type: &str) -> usize {
        self.pending.get(task_type).map_or(0, TypeQueue::len)
    }

    fn executing_count(&self, task_type: &str) -> usize {
        self.executing.get(task_type).copied().unwrap_or(0)
    }

    fn completed_count(&self, task_type: &str) -> usize {
        self.completed
            .iter()
            .filter(|t| t.task_type() == task_type)
            .count()
    }

    fn clear_pending(&mut self) -> usize {
        let mut dropped = 0;
        for bucket in self.pending.values_mut() {
            dropped += bucket.len();
            bucket.high.clear();
            bucket.normal.clear();
        }
        dropped
    }
}

/// State shared between the scheduler facade and its workers.
///
/// Built once during startup; the registry and the condition variable map
/// are never mutated afterwards.
#[derive(Debug)]
pub(crate) struct SchedulerCore {
    registry: TaskTypeRegistry,
    queues: Mutex<TaskQueues>,
    wakeups: BTreeMap<String, Condvar>,
    draining: AtomicBool,
}

impl SchedulerCore {
    pub(crate) fn is_draining(&self) -> bool {
        self.draining.load(Ordering::Acquire)
    }

    /// Worker-side dequeue loop body: blocks on the type's condition
    /// variable until a task of `task_type` is pending, or shutdown was
    /// requested and the type's pending queue is fully drained.
    pub(crate) fn next_task(&self, task_type: &str) -> Option<Task> {
        let wakeup = self.wakeups.get(task_type)?;
        let mut queues = self.queues.lock();
        loop {
            if let Some(task) = queues.pop(task_type) {
                return Some(task);
            }
            if self.is_draining() {
                return None;
            }
            wakeup.wait(&mut queues);
        }
    }

    /// Moves a finished task into the completed queue.
    pub(crate) fn finish_task(&self, task: Task) {
        self.queues.lock().complete(task);
    }
}

/// A thread-pool dispatcher with per-type worker pools.
///
/// ```no_run
/// use voxen_tasks::{ScheduleConfig, Task, TaskPriority, TaskScheduler};
///
/// let scheduler = TaskScheduler::new(ScheduleConfig::default());
/// scheduler.startup()?;
///
/// scheduler.submit(Task::new("ChunkGen", || { /* generate */ }), TaskPriority::High);
///
/// let done = scheduler.retrieve_completed();
/// scheduler.shutdown();
/// # Ok::<(), voxen_tasks::ScheduleError>(())
/// ```
///
/// Shutdown is a cooperative drain: workers finish every task queued
/// before the shutdown request, then exit. Completed tasks stay available
/// to [`retrieve_completed`](Self::retrieve_completed) until the scheduler
/// is dropped.
#[derive(Debug)]
pub struct TaskScheduler {
    config: ScheduleConfig,
    core: OnceLock<Arc<SchedulerCore>>,
    workers: Mutex<Vec<TaskWorker>>,
    phase: Mutex<SchedulerPhase>,
}

impl TaskScheduler {
    /// Creates a scheduler from a type table. No threads are spawned until
    /// [`startup`](Self::startup).
    pub fn new(mut config: ScheduleConfig) -> Self {
        config.sanitize();
        Self {
            config,
            core: OnceLock::new(),
            workers: Mutex::new(Vec::new()),
            phase: Mutex::new(SchedulerPhase::Configured),
        }
    }

    /// Registers the configured task types and spawns one thread pool per
    /// type. Calling it a second time is a logged no-op.
    pub fn startup(&self) -> Result<(), ScheduleError> {
        let mut phase = self.phase.lock();
        if *phase != SchedulerPhase::Configured {
            warn!("startup() called on a scheduler that is already {:?}, ignoring", *phase);
            return Ok(());
        }

        info!(
            "task scheduler starting with {} configured task types",
            self.config.task_types.len()
        );

        let mut registry = TaskTypeRegistry::new();
        for def in &self.config.task_types {
            registry.register(&def.task_type, def.threads.max(1) as usize);
        }
        if registry.is_empty() {
            warn!("no valid task types registered, scheduler will not run any tasks");
        }

        let types = registry.all_types();
        let wakeups = types
            .iter()
            .map(|ty| (ty.clone(), Condvar::new()))
            .collect();
        let core = Arc::new(SchedulerCore {
            queues: Mutex::new(TaskQueues::new(&types)),
            wakeups,
            draining: AtomicBool::new(false),
            registry,
        });

        let mut workers = Vec::with_capacity(core.registry.total_worker_count());
        let mut next_id = 0;
        for ty in &types {
            for _ in 0..core.registry.worker_count(ty) {
                match TaskWorker::spawn(next_id, ty.clone(), Arc::clone(&core)) {
                    Ok(worker) => workers.push(worker),
                    Err(e) => {
                        // Roll back the partial pool before reporting.
                        Self::stop_workers(&core, workers);
                        *phase = SchedulerPhase::Terminated;
                        return Err(e);
                    }
                }
                next_id += 1;
            }
        }

        info!(
            "spawned {} workers across {} task types",
            workers.len(),
            types.len()
        );

        *self.workers.lock() = workers;
        let _ = self.core.set(core);
        *phase = SchedulerPhase::Running;
        Ok(())
    }

    /// Submits a task at the given priority.
    ///
    /// Fire-and-forget: outside the Running phase, or when the task's type
    /// is not registered, the task is dropped with a logged warning.
    pub fn submit(&self, task: Task, priority: TaskPriority) {
        let Some(core) = self.core.get() else {
            warn!(
                "task of type {:?} submitted before startup, dropping it",
                task.task_type()
            );
            return;
        };
        if !core.registry.is_registered(task.task_type()) {
            warn!(
                "task submitted for unknown type {:?}, dropping it",
                task.task_type()
            );
            return;
        }

        let ty = task.task_type().to_owned();
        {
            // The draining flag flips under this mutex; checking it here
            // guarantees an accepted task is still visible to a worker.
            let mut queues = core.queues.lock();
            if core.is_draining() {
                drop(queues);
                warn!("task of type {ty:?} submitted during shutdown, dropping it");
                return;
            }
            queues.push(task, priority);
        }
        trace!("queued {priority:?} task of type {ty:?}");

        if let Some(wakeup) = core.wakeups.get(&ty) {
            wakeup.notify_one();
        }
    }

    /// Submits a task at [`TaskPriority::Normal`].
    pub fn submit_task(&self, task: Task) {
        self.submit(task, TaskPriority::Normal);
    }

    /// Drains the completed queue, transferring task ownership to the
    /// caller. Safe to call from any thread.
    pub fn retrieve_completed(&self) -> Vec<Task> {
        match self.core.get() {
            Some(core) => core.queues.lock().drain_completed(),
            None => Vec::new(),
        }
    }

    /// Number of queued tasks of `task_type`, across both priorities.
    pub fn pending_count(&self, task_type: &str) -> usize {
        self.core
            .get()
            .map_or(0, |core| core.queues.lock().pending_count(task_type))
    }

    /// Number of tasks of `task_type` currently held by a worker.
    pub fn executing_count(&self, task_type: &str) -> usize {
        self.core
            .get()
            .map_or(0, |core| core.queues.lock().executing_count(task_type))
    }

    /// Number of completed tasks of `task_type` awaiting retrieval.
    pub fn completed_count(&self, task_type: &str) -> usize {
        self.core
            .get()
            .map_or(0, |core| core.queues.lock().completed_count(task_type))
    }

    pub fn has_executing(&self, task_type: &str) -> bool {
        self.executing_count(task_type) > 0
    }

    /// Total number of worker threads, Σ configured worker counts.
    pub fn total_worker_count(&self) -> usize {
        self.core
            .get()
            .map_or(0, |core| core.registry.total_worker_count())
    }

    /// The type registry built during startup. Empty before startup.
    pub fn type_registry(&self) -> TaskTypeRegistry {
        self.core
            .get()
            .map(|core| core.registry.clone())
            .unwrap_or_default()
    }

    pub fn is_draining(&self) -> bool {
        self.core.get().is_some_and(|core| core.is_draining())
    }

    pub fn phase(&self) -> SchedulerPhase {
        *self.phase.lock()
    }

    /// Requests shutdown, waits for the workers to drain their pending
    /// queues, and joins them.
    ///
    /// Safe to call from any thread; concurrent callers are serialized and
    /// only the first performs the work. A repeat call is a logged no-op.
    pub fn shutdown(&self) {
        let mut phase = self.phase.lock();
        match *phase {
            SchedulerPhase::Configured => {
                debug!("shutdown() before startup, nothing to do");
                *phase = SchedulerPhase::Terminated;
                return;
            }
            SchedulerPhase::Terminated | SchedulerPhase::Draining => {
                warn!("shutdown() called on a scheduler that is already {:?}, ignoring", *phase);
                return;
            }
            SchedulerPhase::Running => {}
        }
        *phase = SchedulerPhase::Draining;

        let Some(core) = self.core.get() else {
            *phase = SchedulerPhase::Terminated;
            return;
        };

        info!("task scheduler shutting down");

        // The flag must flip under the queue mutex: a worker that already
        // checked it is guaranteed to be inside wait() before the
        // broadcast below.
        {
            let _queues = core.queues.lock();
            core.draining.store(true, Ordering::Release);
        }
        for wakeup in core.wakeups.values() {
            wakeup.notify_all();
        }

        let workers = std::mem::take(&mut *self.workers.lock());
        debug!("joining {} workers", workers.len());
        for worker in workers {
            worker.join();
        }

        // Workers drain every pending bucket before exiting, so this is
        // normally a no-op.
        let dropped = core.queues.lock().clear_pending();
        if dropped > 0 {
            warn!("dropped {dropped} tasks that no worker could execute");
        }

        *phase = SchedulerPhase::Terminated;
        info!("task scheduler terminated");
    }

    /// Shutdown path for a partially started pool.
    fn stop_workers(core: &SchedulerCore, workers: Vec<TaskWorker>) {
        {
            let _queues = core.queues.lock();
            core.draining.store(true, Ordering::Release);
        }
        for wakeup in core.wakeups.values() {
            wakeup.notify_all();
        }
        for worker in workers {
            worker.join();
        }
    }
}

impl Drop for TaskScheduler {
    fn drop(&mut self) {
        let running = { *self.phase.lock() } == SchedulerPhase::Running;
        if running {
            warn!("task scheduler dropped without shutdown()");
            self.shutdown();
        }
    }
}
