use voxen_command::{CommandArgs, CommandRegistry, CommandResult, CommandStatus, CommandValue};

fn echo_registry() -> std::sync::Arc<CommandRegistry> {
    let registry = CommandRegistry::new();
    registry.register(
        "echo",
        |args| CommandResult::success(args.positional_str(0, "")),
        "Echo the first argument",
        "echo [text]",
    );
    registry
}

#[test]
fn execute_dispatches_and_reports() {
    let registry = echo_registry();

    let result = registry.execute("echo hi");
    assert_eq!(result.status, CommandStatus::Success);
    assert_eq!(result.message, "hi");

    let result = registry.execute("echo");
    assert_eq!(result.status, CommandStatus::Success);
    assert_eq!(result.message, "");

    let result = registry.execute("noexist");
    assert_eq!(result.status, CommandStatus::NotFound);

    let result = registry.execute("");
    assert_eq!(result.status, CommandStatus::Error);
    assert_eq!(result.message, "Failed to parse command");
    assert_eq!(result.details, "empty command line");
}

#[test]
fn execute_parses_typed_arguments() {
    let registry = CommandRegistry::new();
    registry.register(
        "move",
        |args| {
            assert_eq!(args.positional, [CommandValue::Str("hello world".into())]);
            assert_eq!(args.named["speed"], CommandValue::Float(3.5));
            assert_eq!(args.named["verbose"], CommandValue::Bool(true));
            CommandResult::success("moved")
        },
        "",
        "",
    );

    let result = registry.execute(r#"move --speed=3.5 "hello world" --verbose"#);
    assert!(result.is_success());
}

#[test]
fn registration_lifecycle() {
    let registry = CommandRegistry::new();
    assert!(!registry.is_registered("f"));

    registry.register("f", |_| CommandResult::success("one"), "", "");
    assert!(registry.is_registered("f"));

    // Duplicate registration silently replaces.
    registry.register("f", |_| CommandResult::success("two"), "", "");
    assert_eq!(registry.execute("f").message, "two");

    registry.unregister("f");
    assert!(!registry.is_registered("f"));
    registry.unregister("f");

    // The three built-ins remain.
    assert_eq!(registry.command_count(), 3);
}

#[test]
fn panicking_callback_is_contained() {
    let registry = CommandRegistry::new();
    registry.register("boom", |_| panic!("kaboom"), "", "");

    let result = registry.execute("boom");
    assert_eq!(result.status, CommandStatus::Error);
    assert_eq!(result.message, "Command execution failed");
    assert_eq!(result.details, "kaboom");

    // The registry stays usable afterwards.
    assert!(registry.execute("help").is_success());
}

#[test]
fn callbacks_may_reenter_the_registry() {
    let registry = CommandRegistry::new();
    let inner = std::sync::Arc::downgrade(&registry);
    registry.register(
        "introspect",
        move |_| {
            let registry = inner.upgrade().unwrap();
            registry.register("late", |_| CommandResult::success(""), "", "");
            CommandResult::success(format!("{}", registry.command_count()))
        },
        "",
        "",
    );

    assert!(registry.execute("introspect").is_success());
    assert!(registry.is_registered("late"));
}

#[test]
fn suggestions_are_case_insensitive_and_sorted() {
    let registry = CommandRegistry::new();
    for name in ["TeleportAll", "teleport", "tp", "say"] {
        registry.register(name, |_| CommandResult::success(""), "", "");
    }

    assert_eq!(registry.suggestions("te"), ["TeleportAll", "teleport"]);
    assert_eq!(registry.suggestions("T"), ["TeleportAll", "teleport", "tp"]);
    assert!(registry.suggestions("zz").is_empty());

    let all: Vec<_> = registry.all_commands().into_iter().map(|s| s.name).collect();
    assert_eq!(
        all,
        ["TeleportAll", "clear_history", "help", "history", "say", "teleport", "tp"]
    );
}

#[test]
fn execute_records_history() {
    let registry = echo_registry();

    registry.execute("echo one");
    registry.execute("echo one");
    registry.execute("nope");
    registry.execute("echo two");

    // Consecutive duplicates collapse; unknown commands still count.
    assert_eq!(registry.history(), ["echo one", "nope", "echo two"]);
    assert_eq!(registry.recent_history(1), ["echo two"]);

    assert_eq!(registry.navigate_history_previous().as_deref(), Some("echo two"));
    assert_eq!(registry.navigate_history_previous().as_deref(), Some("nope"));
    registry.reset_history_navigation();
    assert_eq!(registry.navigate_history_previous().as_deref(), Some("echo two"));
    assert_eq!(registry.navigate_history_next(), None);

    registry.clear_history();
    assert!(registry.history().is_empty());
}

#[test]
fn execute_with_args_bypasses_parser_and_history() {
    let registry = echo_registry();

    let mut args = CommandArgs::new("echo");
    args.positional.push(CommandValue::Str("direct".into()));

    let result = registry.execute_with_args(&args);
    assert_eq!(result.message, "direct");
    assert!(registry.history().is_empty());
}

#[test]
fn parse_errors_do_not_reach_history() {
    let registry = echo_registry();

    registry.execute("   ");
    registry.execute(r#""quoted first""#);

    assert!(registry.history().is_empty());
}

#[test]
fn help_builtin() {
    let registry = echo_registry();

    let listing = registry.execute("help");
    assert!(listing.is_success());
    assert!(listing.message.contains("Available commands (4):"));
    assert!(listing.message.contains("echo - Echo the first argument"));

    let detail = registry.execute("help echo");
    assert!(detail.is_success());
    assert!(detail.message.contains("Command: echo"));
    assert!(detail.message.contains("Usage: echo [text]"));

    let missing = registry.execute("help nothere");
    assert_eq!(missing.status, CommandStatus::Error);
}

#[test]
fn history_builtin() {
    let registry = echo_registry();

    let empty = registry.execute("history");
    // The "history" line itself was recorded before dispatch.
    assert!(empty.is_success());
    assert!(empty.message.contains("history"));

    registry.clear_history();
    for i in 0..25 {
        registry.execute(&format!("echo {i}"));
    }

    let recent = registry.execute("history");
    assert!(recent.message.contains("showing 20 entries"));
    let recent = registry.execute("history 3");
    assert!(recent.message.contains("showing 3 entries"));

    let cleared = registry.execute("clear_history");
    assert!(cleared.is_success());
    assert!(registry.history().is_empty());
}

#[test]
fn history_capacity_is_configurable() {
    let registry = CommandRegistry::with_max_history_size(2);
    assert_eq!(registry.max_history_size(), 2);

    registry.register("echo", |_| CommandResult::success(""), "", "");
    for line in ["echo a", "echo b", "echo c"] {
        registry.execute(line);
    }
    assert_eq!(registry.history(), ["echo b", "echo c"]);

    registry.set_max_history_size(1);
    assert_eq!(registry.history(), ["echo c"]);
}
