//! Registration of task types and their worker allocations.

use log::warn;
use std::collections::BTreeMap;

/// Maps task type names to worker counts.
///
/// Populated by the scheduler during startup and treated as read-only for
/// the rest of its life; there is no runtime re-registration.
#[derive(Debug, Default, Clone)]
pub struct TaskTypeRegistry {
    worker_counts: BTreeMap<String, usize>,
}

impl TaskTypeRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers `task_type` with `workers` dedicated threads.
    ///
    /// Rejected with a logged warning if the name is empty, contains
    /// characters other than alphanumerics and underscores, or `workers`
    /// is zero. A repeat registration overwrites the worker count.
    pub fn register(&mut self, task_type: &str, workers: usize) {
        if !is_valid_type_name(task_type) {
            warn!("invalid task type name {task_type:?}, skipping registration");
            return;
        }

        if workers == 0 {
            warn!("invalid worker count 0 for task type {task_type:?}, skipping registration");
            return;
        }

        self.worker_counts.insert(task_type.to_owned(), workers);
    }

    pub fn is_registered(&self, task_type: &str) -> bool {
        self.worker_counts.contains_key(task_type)
    }

    /// Worker count for `task_type`, or 0 if it is not registered.
    pub fn worker_count(&self, task_type: &str) -> usize {
        self.worker_counts.get(task_type).copied().unwrap_or(0)
    }

    /// All registered type names, sorted.
    pub fn all_types(&self) -> Vec<String> {
        self.worker_counts.keys().cloned().collect()
    }

    /// Sum of worker counts across every registered type.
    pub fn total_worker_count(&self) -> usize {
        self.worker_counts.values().sum()
    }

    pub fn is_empty(&self) -> bool {
        self.worker_counts.is_empty()
    }
}

fn is_valid_type_name(name: &str) -> bool {
    !name.is_empty() && name.chars().all(|c| c.is_ascii_alphanumeric() || c == '_')
}
