//! Parsed invocations, results and command metadata.

use crate::value::CommandValue;
use std::collections::HashMap;
use std::fmt::{Debug, Formatter};
use std::sync::Arc;

/// A parsed command invocation.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct CommandArgs {
    pub command_name: String,
    pub positional: Vec<CommandValue>,
    pub named: HashMap<String, CommandValue>,
}

impl CommandArgs {
    pub fn new(command_name: impl Into<String>) -> Self {
        Self {
            command_name: command_name.into(),
            positional: Vec::new(),
            named: HashMap::new(),
        }
    }

    pub fn positional_count(&self) -> usize {
        self.positional.len()
    }

    pub fn positional(&self, index: usize) -> Option<&CommandValue> {
        self.positional.get(index)
    }

    pub fn has_named(&self, key: &str) -> bool {
        self.named.contains_key(key)
    }

    pub fn named(&self, key: &str) -> Option<&CommandValue> {
        self.named.get(key)
    }

    /// Positional argument as a string, or `default` when absent.
    pub fn positional_str(&self, index: usize, default: &str) -> String {
        self.positional(index)
            .map_or_else(|| default.to_owned(), CommandValue::as_string)
    }

    /// Positional argument as an integer, or `default` when absent or not
    /// convertible.
    pub fn positional_int(&self, index: usize, default: i64) -> i64 {
        self.positional(index)
            .and_then(CommandValue::as_int)
            .unwrap_or(default)
    }

    /// Named argument as a string, or `default` when absent.
    pub fn named_str(&self, key: &str, default: &str) -> String {
        self.named(key)
            .map_or_else(|| default.to_owned(), CommandValue::as_string)
    }

    /// Named argument as a bool, or `default` when absent or not
    /// convertible.
    pub fn named_bool(&self, key: &str, default: bool) -> bool {
        self.named(key)
            .and_then(CommandValue::as_bool)
            .unwrap_or(default)
    }

    /// Named argument as a float, or `default` when absent or not
    /// convertible.
    pub fn named_float(&self, key: &str, default: f64) -> f64 {
        self.named(key)
            .and_then(CommandValue::as_float)
            .unwrap_or(default)
    }
}

/// Outcome class of a command execution.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash)]
pub enum CommandStatus {
    Success,
    Warning,
    Error,
    NotFound,
    InvalidArgs,
}

/// Structured result of a command execution.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CommandResult {
    pub status: CommandStatus,
    pub message: String,
    pub details: String,
}

impl CommandResult {
    pub fn success(message: impl Into<String>) -> Self {
        Self {
            status: CommandStatus::Success,
            message: message.into(),
            details: String::new(),
        }
    }

    pub fn warning(message: impl Into<String>) -> Self {
        Self {
            status: CommandStatus::Warning,
            message: message.into(),
            details: String::new(),
        }
    }

    pub fn error(message: impl Into<String>, details: impl Into<String>) -> Self {
        Self {
            status: CommandStatus::Error,
            message: message.into(),
            details: details.into(),
        }
    }

    pub fn not_found(command_name: &str) -> Self {
        Self {
            status: CommandStatus::NotFound,
            message: format!("Command not found: {command_name}"),
            details: "Use 'help' to see available commands".to_owned(),
        }
    }

    pub fn invalid_args(message: impl Into<String>) -> Self {
        Self {
            status: CommandStatus::InvalidArgs,
            message: message.into(),
            details: String::new(),
        }
    }

    pub fn is_success(&self) -> bool {
        self.status == CommandStatus::Success
    }

    pub fn is_warning(&self) -> bool {
        self.status == CommandStatus::Warning
    }

    pub fn is_error(&self) -> bool {
        matches!(
            self.status,
            CommandStatus::Error | CommandStatus::NotFound | CommandStatus::InvalidArgs
        )
    }
}

/// Invocable command body.
pub type CommandCallback = Arc<dyn Fn(&CommandArgs) -> CommandResult + Send + Sync>;

/// A registered command: name, metadata and callback.
#[derive(Clone)]
pub struct CommandSpec {
    pub name: String,
    pub description: String,
    pub usage: String,
    pub callback: CommandCallback,
}

impl CommandSpec {
    pub fn new(
        name: impl Into<String>,
        callback: CommandCallback,
        description: impl Into<String>,
        usage: impl Into<String>,
    ) -> Self {
        Self {
            name: name.into(),
            description: description.into(),
            usage: usage.into(),
            callback,
        }
    }
}

impl Debug for CommandSpec {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CommandSpec")
            .field("name", &self.name)
            .field("description", &self.description)
            .field("usage", &self.usage)
            .finish_non_exhaustive()
    }
}
