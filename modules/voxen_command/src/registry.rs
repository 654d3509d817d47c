//! Thread-safe registry of named commands.

use crate::args::{CommandArgs, CommandResult, CommandSpec};
use crate::history::CommandHistory;
use crate::parser;
use log::debug;
use parking_lot::Mutex;
use std::any::Any;
use std::collections::BTreeMap;
use std::fmt::Write;
use std::panic::{catch_unwind, AssertUnwindSafe};
use std::sync::{Arc, Weak};

/// Registers named commands, parses invocations and dispatches them.
///
/// The command map and the history ring are guarded by separate mutexes
/// that are never held simultaneously. Callbacks are invoked after the
/// command-map lock has been released, so a callback may call back into
/// the registry (register, query, navigate history) without deadlocking.
///
/// Three built-ins are installed at construction: `help [name]`,
/// `history [count]` and `clear_history`.
#[derive(Debug)]
pub struct CommandRegistry {
    commands: Mutex<BTreeMap<String, CommandSpec>>,
    history: Mutex<CommandHistory>,
}

impl CommandRegistry {
    /// Creates a registry with the default history capacity.
    pub fn new() -> Arc<Self> {
        Self::with_history(CommandHistory::default())
    }

    /// Creates a registry retaining at most `max_size` history entries.
    pub fn with_max_history_size(max_size: usize) -> Arc<Self> {
        Self::with_history(CommandHistory::new(max_size))
    }

    fn with_history(history: CommandHistory) -> Arc<Self> {
        let registry = Arc::new(Self {
            commands: Mutex::new(BTreeMap::new()),
            history: Mutex::new(history),
        });
        registry.install_builtins();
        registry
    }

    /// Registers a command. An existing command of the same name is
    /// silently replaced.
    pub fn register(
        &self,
        name: &str,
        callback: impl Fn(&CommandArgs) -> CommandResult + Send + Sync + 'static,
        description: &str,
        usage: &str,
    ) {
        debug!("registering command {name:?}");
        let spec = CommandSpec::new(name, Arc::new(callback), description, usage);
        self.commands.lock().insert(name.to_owned(), spec);
    }

    /// Removes a command; unknown names are a no-op.
    pub fn unregister(&self, name: &str) {
        if self.commands.lock().remove(name).is_some() {
            debug!("unregistered command {name:?}");
        }
    }

    pub fn is_registered(&self, name: &str) -> bool {
        self.commands.lock().contains_key(name)
    }

    pub fn command_count(&self) -> usize {
        self.commands.lock().len()
    }

    pub fn command_info(&self, name: &str) -> Option<CommandSpec> {
        self.commands.lock().get(name).cloned()
    }

    /// All registered commands, sorted by name.
    pub fn all_commands(&self) -> Vec<CommandSpec> {
        self.commands.lock().values().cloned().collect()
    }

    /// Registered names starting with `prefix`, case-insensitively, in
    /// ascending order.
    pub fn suggestions(&self, prefix: &str) -> Vec<String> {
        let prefix = prefix.to_lowercase();
        self.commands
            .lock()
            .keys()
            .filter(|name| name.to_lowercase().starts_with(&prefix))
            .cloned()
            .collect()
    }

    /// Parses and executes one command line.
    ///
    /// The raw line is recorded in the history (which skips empty lines
    /// and consecutive duplicates) before dispatch, whether or not the
    /// command exists.
    pub fn execute(&self, line: &str) -> CommandResult {
        let args = match parser::parse(line) {
            Ok(args) => args,
            Err(e) => return CommandResult::error("Failed to parse command", e.to_string()),
        };

        self.history.lock().add(line);
        self.execute_with_args(&args)
    }

    /// Executes pre-parsed arguments, bypassing the parser and history.
    ///
    /// A panicking callback is caught and reported as an `Error` result.
    pub fn execute_with_args(&self, args: &CommandArgs) -> CommandResult {
        let callback = {
            let commands = self.commands.lock();
            match commands.get(&args.command_name) {
                Some(spec) => Arc::clone(&spec.callback),
                None => return CommandResult::not_found(&args.command_name),
            }
        };

        match catch_unwind(AssertUnwindSafe(|| callback(args))) {
            Ok(result) => result,
            Err(panic) => {
                CommandResult::error("Command execution failed", panic_message(&*panic))
            }
        }
    }

    pub fn history(&self) -> Vec<String> {
        self.history.lock().all()
    }

    pub fn recent_history(&self, count: usize) -> Vec<String> {
        self.history.lock().recent(count)
    }

    pub fn clear_history(&self) {
        self.history.lock().clear();
    }

    pub fn navigate_history_previous(&self) -> Option<String> {
        self.history.lock().navigate_previous().map(str::to_owned)
    }

    pub fn navigate_history_next(&self) -> Option<String> {
        self.history.lock().navigate_next().map(str::to_owned)
    }

    pub fn reset_history_navigation(&self) {
        self.history.lock().reset_navigation();
    }

    pub fn set_max_history_size(&self, max_size: usize) {
        self.history.lock().set_max_size(max_size);
    }

    pub fn max_history_size(&self) -> usize {
        self.history.lock().max_size()
    }

    fn install_builtins(self: &Arc<Self>) {
        let registry = Arc::downgrade(self);
        self.register(
            "help",
            move |args| match registry.upgrade() {
                Some(registry) => registry.run_help(args),
                None => CommandResult::error("Command execution failed", "registry is gone"),
            },
            "Display help information about commands",
            "help [command_name]",
        );

        let registry = Arc::downgrade(self);
        self.register(
            "history",
            move |args| match registry.upgrade() {
                Some(registry) => registry.run_history(args),
                None => CommandResult::error("Command execution failed", "registry is gone"),
            },
            "Display command history",
            "history [count]",
        );

        let registry: Weak<Self> = Arc::downgrade(self);
        self.register(
            "clear_history",
            move |_args| match registry.upgrade() {
                Some(registry) => {
                    registry.clear_history();
                    CommandResult::success("Command history cleared.")
                }
                None => CommandResult::error("Command execution failed", "registry is gone"),
            },
            "Clear command history",
            "clear_history",
        );
    }

    fn run_help(&self, args: &CommandArgs) -> CommandResult {
        if args.positional_count() > 0 {
            let name = args.positional_str(0, "");
            let Some(info) = self.command_info(&name) else {
                return CommandResult::error(format!("Command not found: {name}"), "");
            };

            let mut out = format!("Command: {}\n", info.name);
            if !info.description.is_empty() {
                let _ = writeln!(out, "Description: {}", info.description);
            }
            if !info.usage.is_empty() {
                let _ = writeln!(out, "Usage: {}", info.usage);
            }
            return CommandResult::success(out);
        }

        let all = self.all_commands();
        let mut out = format!("Available commands ({}):\n\n", all.len());
        for spec in &all {
            out.push_str("  ");
            out.push_str(&spec.name);
            if !spec.description.is_empty() {
                let _ = write!(out, " - {}", spec.description);
            }
            out.push('\n');
        }
        out.push_str("\nUse 'help <command_name>' for detailed information.");

        CommandResult::success(out)
    }

    fn run_history(&self, args: &CommandArgs) -> CommandResult {
        let count = args.positional_int(0, 20);
        let entries = if count > 0 {
            self.recent_history(count as usize)
        } else {
            self.history()
        };

        if entries.is_empty() {
            return CommandResult::success("No command history.");
        }

        let mut out = format!("Command history (showing {} entries):\n\n", entries.len());
        for (i, entry) in entries.iter().enumerate() {
            let _ = writeln!(out, "  {}: {entry}", i + 1);
        }

        CommandResult::success(out)
    }
}

fn panic_message(payload: &(dyn Any + Send)) -> &str {
    payload
        .downcast_ref::<&str>()
        .copied()
        .or_else(|| payload.downcast_ref::<String>().map(String::as_str))
        .unwrap_or("opaque panic payload")
}
