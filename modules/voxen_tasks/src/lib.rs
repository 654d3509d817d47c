//! Typed task scheduling for the voxen engine.
//!
//! A [`TaskScheduler`] owns pools of worker threads partitioned by a
//! configurable task type label. Submitted [`Task`]s move through a
//! three-phase lifecycle (pending, executing, completed); the owning
//! thread periodically drains finished work with
//! [`TaskScheduler::retrieve_completed`].

pub mod config;
pub mod registry;
pub mod scheduler;
pub mod task;
mod worker;

pub use config::{ConfigError, ScheduleConfig, TaskTypeDefinition};
pub use registry::TaskTypeRegistry;
pub use scheduler::{ScheduleError, SchedulerPhase, TaskScheduler};
pub use task::{task_types, Task, TaskPriority, TaskState};
