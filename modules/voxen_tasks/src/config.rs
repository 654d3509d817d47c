//! Scheduler configuration.
//!
//! The worker pool layout is described by a JSON document listing one
//! record per task type:
//!
//! ```json
//! {
//!     "task_types": [
//!         { "type": "Generic", "threads": 4, "description": "General-purpose tasks" },
//!         { "type": "FileIO", "threads": 2 }
//!     ]
//! }
//! ```
//!
//! A missing or unreadable file falls back to [`ScheduleConfig::default`].

use log::warn;
use serde::{Deserialize, Serialize};
use std::fs::File;
use std::io::BufReader;
use std::path::Path;
use thiserror::Error;

/// Errors from loading a schedule configuration file.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("could not read config file: {0}")]
    Io(#[from] std::io::Error),
    #[error("malformed config file: {0}")]
    Parse(#[from] serde_json::Error),
}

/// One task type record of the configuration file.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TaskTypeDefinition {
    /// Task type identifier, alphanumeric plus underscore.
    #[serde(rename = "type")]
    pub task_type: String,
    /// Worker threads dedicated to this type.
    #[serde(default = "default_threads")]
    pub threads: i32,
    /// Free-form description, not interpreted.
    #[serde(default)]
    pub description: String,
}

impl TaskTypeDefinition {
    pub fn new(task_type: impl Into<String>, threads: i32, description: impl Into<String>) -> Self {
        Self {
            task_type: task_type.into(),
            threads,
            description: description.into(),
        }
    }
}

fn default_threads() -> i32 {
    1
}

/// The full worker pool layout consumed by the scheduler at startup.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ScheduleConfig {
    #[serde(default)]
    pub task_types: Vec<TaskTypeDefinition>,
}

impl ScheduleConfig {
    /// Loads and sanitizes a configuration file.
    pub fn load_from_file(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let file = File::open(path)?;
        let reader = BufReader::new(file);
        let mut config: Self = serde_json::from_reader(reader)?;
        config.sanitize();
        Ok(config)
    }

    /// Loads a configuration file, falling back to the default table with a
    /// logged warning when the file is missing or malformed.
    pub fn load_or_default(path: impl AsRef<Path>) -> Self {
        let path = path.as_ref();
        match Self::load_from_file(path) {
            Ok(config) => config,
            Err(e) => {
                warn!("using default schedule config, {}: {e}", path.display());
                Self::default()
            }
        }
    }

    /// Drops records with an empty type name and clamps non-positive thread
    /// counts to 1.
    pub fn sanitize(&mut self) {
        self.task_types.retain(|def| !def.task_type.is_empty());
        for def in &mut self.task_types {
            if def.threads <= 0 {
                def.threads = 1;
            }
        }
    }
}

impl Default for ScheduleConfig {
    fn default() -> Self {
        Self {
            task_types: vec![
                TaskTypeDefinition::new("Generic", 4, "General-purpose CPU-bound tasks"),
                TaskTypeDefinition::new("FileIO", 2, "File I/O operations"),
                TaskTypeDefinition::new("ChunkGen", 2, "Procedural chunk generation"),
                TaskTypeDefinition::new("Rendering", 1, "Render preparation tasks"),
            ],
        }
    }
}
