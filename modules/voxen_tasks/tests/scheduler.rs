use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::mpsc::channel;
use std::sync::{Arc, Mutex, Once};
use std::time::{Duration, Instant};
use voxen_tasks::{
    task_types, ScheduleConfig, SchedulerPhase, Task, TaskPriority, TaskScheduler, TaskState,
    TaskTypeDefinition,
};

static INIT: Once = Once::new();

fn new_scheduler(types: &[(&str, i32)]) -> TaskScheduler {
    INIT.call_once(pretty_env_logger::init);

    let config = ScheduleConfig {
        task_types: types
            .iter()
            .map(|(ty, threads)| TaskTypeDefinition::new(*ty, *threads, ""))
            .collect(),
    };
    let scheduler = TaskScheduler::new(config);
    scheduler.startup().expect("worker spawn failed");
    scheduler
}

fn wait_until(what: &str, mut condition: impl FnMut() -> bool) {
    let deadline = Instant::now() + Duration::from_secs(10);
    while !condition() {
        assert!(Instant::now() < deadline, "timed out waiting for {what}");
        std::thread::sleep(Duration::from_millis(1));
    }
}

#[test]
fn all_submitted_tasks_run_and_drain() {
    let scheduler = new_scheduler(&[(task_types::GENERIC, 2), (task_types::FILE_IO, 1)]);
    let counter = Arc::new(AtomicUsize::new(0));

    for _ in 0..100 {
        let counter = Arc::clone(&counter);
        scheduler.submit_task(Task::new(task_types::GENERIC, move || {
            counter.fetch_add(1, Ordering::SeqCst);
        }));
    }

    scheduler.shutdown();

    assert_eq!(counter.load(Ordering::SeqCst), 100);

    let completed = scheduler.retrieve_completed();
    assert_eq!(completed.len(), 100);
    assert!(completed.iter().all(|t| t.state() == TaskState::Completed));
    assert!(completed.iter().all(|t| t.task_type() == task_types::GENERIC));

    assert_eq!(scheduler.pending_count(task_types::GENERIC), 0);
    assert_eq!(scheduler.executing_count(task_types::GENERIC), 0);
    assert_eq!(scheduler.completed_count(task_types::GENERIC), 0);
}

#[test]
fn single_worker_preserves_submission_order() {
    let scheduler = new_scheduler(&[(task_types::GENERIC, 1)]);
    let order = Arc::new(Mutex::new(Vec::new()));

    for i in 0..50 {
        let order = Arc::clone(&order);
        scheduler.submit_task(Task::new(task_types::GENERIC, move || {
            order.lock().unwrap().push(i);
        }));
    }

    scheduler.shutdown();

    let order = order.lock().unwrap();
    assert_eq!(*order, (0..50).collect::<Vec<_>>());
}

#[test]
fn high_priority_drains_before_normal() {
    let scheduler = new_scheduler(&[(task_types::GENERIC, 1)]);
    let order = Arc::new(Mutex::new(Vec::new()));
    let (gate_tx, gate_rx) = channel::<()>();

    // A occupies the single worker until the gate opens, so B, C and D
    // queue up behind it.
    let record = Arc::clone(&order);
    scheduler.submit_task(Task::new(task_types::GENERIC, move || {
        record.lock().unwrap().push("A");
        gate_rx.recv().unwrap();
    }));
    wait_until("A to start", || scheduler.has_executing(task_types::GENERIC));

    for name in ["B", "C"] {
        let record = Arc::clone(&order);
        scheduler.submit_task(Task::new(task_types::GENERIC, move || {
            record.lock().unwrap().push(name);
        }));
    }
    let record = Arc::clone(&order);
    scheduler.submit(
        Task::new(task_types::GENERIC, move || {
            record.lock().unwrap().push("D");
        }),
        TaskPriority::High,
    );

    gate_tx.send(()).unwrap();
    scheduler.shutdown();

    assert_eq!(*order.lock().unwrap(), ["A", "D", "B", "C"]);
}

#[test]
fn panicking_task_completes_and_worker_survives() {
    let scheduler = new_scheduler(&[(task_types::FILE_IO, 1)]);

    scheduler.submit_task(Task::new(task_types::FILE_IO, || panic!("boom")));
    wait_until("panicking task to finish", || {
        scheduler.completed_count(task_types::FILE_IO) == 1
    });

    let completed = scheduler.retrieve_completed();
    assert_eq!(completed.len(), 1);
    assert_eq!(completed[0].state(), TaskState::Completed);

    // The worker is still alive and runs the next task.
    let ran = Arc::new(AtomicUsize::new(0));
    let flag = Arc::clone(&ran);
    scheduler.submit_task(Task::new(task_types::FILE_IO, move || {
        flag.fetch_add(1, Ordering::SeqCst);
    }));

    scheduler.shutdown();

    assert_eq!(ran.load(Ordering::SeqCst), 1);
    assert_eq!(scheduler.retrieve_completed().len(), 1);
}

#[test]
fn unknown_type_is_dropped() {
    let scheduler = new_scheduler(&[(task_types::GENERIC, 1)]);

    scheduler.submit_task(Task::new("NoSuchType", || unreachable!()));

    assert_eq!(scheduler.pending_count("NoSuchType"), 0);
    scheduler.shutdown();
    assert!(scheduler.retrieve_completed().is_empty());
}

#[test]
fn submit_outside_running_phase_is_dropped() {
    let scheduler = new_scheduler(&[(task_types::GENERIC, 1)]);
    scheduler.shutdown();

    scheduler.submit_task(Task::new(task_types::GENERIC, || unreachable!()));

    assert_eq!(scheduler.pending_count(task_types::GENERIC), 0);
    assert!(scheduler.retrieve_completed().is_empty());
}

#[test]
fn submit_before_startup_is_dropped() {
    INIT.call_once(pretty_env_logger::init);
    let scheduler = TaskScheduler::new(ScheduleConfig::default());

    scheduler.submit_task(Task::new(task_types::GENERIC, || unreachable!()));

    assert_eq!(scheduler.phase(), SchedulerPhase::Configured);
    assert!(scheduler.retrieve_completed().is_empty());
    scheduler.shutdown();
    assert_eq!(scheduler.phase(), SchedulerPhase::Terminated);
}

#[test]
fn repeated_startup_and_shutdown_are_noops() {
    let scheduler = new_scheduler(&[(task_types::GENERIC, 1)]);

    scheduler.startup().expect("second startup must not fail");
    assert_eq!(scheduler.phase(), SchedulerPhase::Running);
    assert_eq!(scheduler.total_worker_count(), 1);

    scheduler.shutdown();
    scheduler.shutdown();
    assert_eq!(scheduler.phase(), SchedulerPhase::Terminated);
}

#[test]
fn queries_track_the_lifecycle() {
    let scheduler = new_scheduler(&[(task_types::CHUNK_GEN, 1)]);
    let (gate_tx, gate_rx) = channel::<()>();

    scheduler.submit_task(Task::new(task_types::CHUNK_GEN, move || {
        gate_rx.recv().unwrap();
    }));
    wait_until("first task to start", || {
        scheduler.has_executing(task_types::CHUNK_GEN)
    });
    assert_eq!(scheduler.executing_count(task_types::CHUNK_GEN), 1);

    scheduler.submit_task(Task::new(task_types::CHUNK_GEN, || {}));
    assert_eq!(scheduler.pending_count(task_types::CHUNK_GEN), 1);

    gate_tx.send(()).unwrap();
    scheduler.shutdown();

    assert_eq!(scheduler.pending_count(task_types::CHUNK_GEN), 0);
    assert_eq!(scheduler.executing_count(task_types::CHUNK_GEN), 0);
    assert_eq!(scheduler.completed_count(task_types::CHUNK_GEN), 2);
    assert_eq!(scheduler.retrieve_completed().len(), 2);
}

#[test]
fn worker_pool_matches_configuration() {
    let scheduler = new_scheduler(&[(task_types::GENERIC, 2), (task_types::FILE_IO, 1)]);

    assert_eq!(scheduler.total_worker_count(), 3);
    let registry = scheduler.type_registry();
    assert_eq!(registry.all_types(), [task_types::FILE_IO, task_types::GENERIC]);
    assert_eq!(registry.worker_count(task_types::GENERIC), 2);

    scheduler.shutdown();
}

#[test]
fn drop_without_shutdown_joins_workers() {
    let scheduler = new_scheduler(&[(task_types::GENERIC, 1)]);
    let counter = Arc::new(AtomicUsize::new(0));

    for _ in 0..10 {
        let counter = Arc::clone(&counter);
        scheduler.submit_task(Task::new(task_types::GENERIC, move || {
            counter.fetch_add(1, Ordering::SeqCst);
        }));
    }

    drop(scheduler);

    assert_eq!(counter.load(Ordering::SeqCst), 10);
}
