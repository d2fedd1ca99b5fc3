//! Integration tests for the timing scheduler

use parking_lot::Mutex;
use rust_schedule_kit::prelude::*;
use rust_schedule_kit::schedule::SchedulerPhase;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::thread;
use std::time::Duration;

/// Records the wall-clock second it ran at
struct Probe {
    run_at: i64,
    runs: Arc<Mutex<Vec<(i64, i64)>>>,
}

impl TimingTask for Probe {
    fn run_at(&self) -> i64 {
        self.run_at
    }

    fn run(&mut self, _scheduler: &SchedulerHandle) -> Result<()> {
        self.runs.lock().push((self.run_at, now_unix()));
        Ok(())
    }

    fn name(&self) -> &str {
        "Probe"
    }
}

fn fast_scheduler(workers: usize) -> TimingScheduler {
    let config = SchedulerConfig::new(workers).with_poll_interval(Duration::from_millis(20));
    TimingScheduler::new(config, Vec::new()).expect("Failed to create scheduler")
}

#[test]
fn test_never_runs_before_due_time() {
    let _ = env_logger::builder().is_test(true).try_init();

    let scheduler = fast_scheduler(3);
    let runs = Arc::new(Mutex::new(Vec::new()));
    let now = now_unix();

    for offset in [2i64, 0, 1, -5, 1, 2] {
        scheduler
            .push(Probe {
                run_at: now + offset,
                runs: Arc::clone(&runs),
            })
            .expect("Failed to push task");
    }

    scheduler.start().expect("Failed to start scheduler");
    thread::sleep(Duration::from_millis(500));

    // Tasks due in the future have not been touched yet
    let early: Vec<_> = runs.lock().clone();
    assert!(early.iter().all(|(due, _)| *due <= now + 1));
    assert!(scheduler.len() >= 2);

    thread::sleep(Duration::from_millis(3_000));
    scheduler.shutdown().expect("Failed to shutdown scheduler");

    let runs = runs.lock();
    assert_eq!(runs.len(), 6);
    for (due, ran) in runs.iter() {
        assert!(ran >= due, "task due at {} ran early at {}", due, ran);
    }
}

#[test]
fn test_single_worker_runs_due_tasks_in_order() {
    let scheduler = fast_scheduler(1);
    let runs = Arc::new(Mutex::new(Vec::new()));
    let now = now_unix();

    for offset in [-1i64, -9, -3, -7, -5] {
        scheduler
            .push(Probe {
                run_at: now + offset,
                runs: Arc::clone(&runs),
            })
            .unwrap();
    }

    scheduler.start().unwrap();
    thread::sleep(Duration::from_millis(400));
    scheduler.shutdown().unwrap();

    let order: Vec<i64> = runs.lock().iter().map(|(due, _)| due - now).collect();
    assert_eq!(order, vec![-9, -7, -5, -3, -1]);
}

#[test]
fn test_initial_tasks_and_next_due() {
    let now = now_unix();
    let tasks: Vec<BoxedTimingTask> = vec![
        Box::new(ScheduledClosure::new(now + 600, |_| Ok(()))),
        Box::new(ScheduledClosure::new(now + 60, |_| Ok(()))),
    ];
    let config = SchedulerConfig::new(1).with_poll_interval(Duration::from_millis(20));
    let scheduler = TimingScheduler::new(config, tasks).unwrap();

    assert_eq!(scheduler.len(), 2);
    assert_eq!(scheduler.next_due(), Some(now + 60));
    assert_eq!(scheduler.phase(), SchedulerPhase::Created);
}

#[test]
fn test_handle_pushes_from_other_threads() {
    let scheduler = fast_scheduler(2);
    scheduler.start().unwrap();

    let ran = Arc::new(AtomicUsize::new(0));
    let producers: Vec<_> = (0..4)
        .map(|_| {
            let handle = scheduler.handle();
            let ran = Arc::clone(&ran);
            thread::spawn(move || {
                for _ in 0..5 {
                    let ran = Arc::clone(&ran);
                    handle
                        .push(ScheduledClosure::new(now_unix(), move |_| {
                            ran.fetch_add(1, Ordering::SeqCst);
                            Ok(())
                        }))
                        .unwrap();
                }
            })
        })
        .collect();

    for producer in producers {
        producer.join().unwrap();
    }

    thread::sleep(Duration::from_millis(800));
    assert_eq!(ran.load(Ordering::SeqCst), 20);
    assert!(scheduler.is_empty());
}

#[test]
fn test_drop_shuts_down() {
    let handle = {
        let scheduler = fast_scheduler(2);
        scheduler.start().unwrap();
        scheduler.handle()
    };

    assert!(handle.is_shutdown());
    assert!(matches!(
        handle.push(ScheduledClosure::new(0, |_| Ok(()))),
        Err(Error::ShutDown { .. })
    ));
}

#[test]
fn test_today_time_examples() {
    use chrono::{Local, TimeZone, Timelike};

    let ts = today_time("18:53:00").unwrap();
    let local = Local.timestamp_opt(ts, 0).unwrap();
    assert_eq!((local.hour(), local.minute(), local.second()), (18, 53, 0));

    for bad in ["24:00:00", "23:60:00", "23:59:60", "12：30：00"] {
        assert!(
            matches!(today_time(bad), Err(Error::InvalidTimeOfDay { .. })),
            "{} should be rejected",
            bad
        );
    }
}
