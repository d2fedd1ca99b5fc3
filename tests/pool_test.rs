//! Integration tests for the worker pool

use parking_lot::Mutex;
use rust_schedule_kit::prelude::*;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::thread;
use std::time::Duration;

/// Task that records its failures
struct Flaky {
    attempt: usize,
    failures: Arc<Mutex<Vec<String>>>,
}

impl PoolTask for Flaky {
    fn execute(&mut self) -> Result<()> {
        match self.attempt % 3 {
            0 => Ok(()),
            1 => Err(Error::task_failed(format!("attempt {}", self.attempt))),
            _ => panic!("attempt {} blew up", self.attempt),
        }
    }

    fn on_failure(&mut self, error: Error) {
        self.failures.lock().push(error.to_string());
    }

    fn name(&self) -> &str {
        "Flaky"
    }
}

#[test]
fn test_failures_reach_handlers() {
    let _ = env_logger::builder().is_test(true).try_init();

    let pool = WorkerPool::with_workers(3).expect("Failed to create pool");
    pool.start().expect("Failed to start pool");

    let failures = Arc::new(Mutex::new(Vec::new()));
    for attempt in 0..9 {
        pool.push(Flaky {
            attempt,
            failures: Arc::clone(&failures),
        })
        .expect("Failed to submit task");
    }

    thread::sleep(Duration::from_millis(200));
    pool.shutdown().expect("Failed to shutdown pool");

    let failures = failures.lock();
    assert_eq!(failures.len(), 6);
    assert_eq!(
        failures.iter().filter(|f| f.starts_with("Task failed")).count(),
        3
    );
    assert_eq!(
        failures.iter().filter(|f| f.starts_with("Task panicked")).count(),
        3
    );
    assert_eq!(pool.total_tasks_completed(), 3);
}

#[test]
fn test_bounded_pool_applies_backpressure() {
    let config = WorkerPoolConfig::new(2)
        .with_initial_capacity(4)
        .with_max_queue_size(4)
        .with_thread_name_prefix("bounded");
    let pool = Arc::new(WorkerPool::with_config(config).expect("Failed to create pool"));
    pool.start().expect("Failed to start pool");

    let completed = Arc::new(AtomicUsize::new(0));
    let producers: Vec<_> = (0..4)
        .map(|_| {
            let pool = Arc::clone(&pool);
            let completed = Arc::clone(&completed);
            thread::spawn(move || {
                for _ in 0..25 {
                    let completed = Arc::clone(&completed);
                    pool.execute(move || {
                        thread::sleep(Duration::from_millis(1));
                        completed.fetch_add(1, Ordering::SeqCst);
                        Ok(())
                    })
                    .expect("blocking push should succeed while running");
                    assert!(pool.queue_size() <= 4);
                }
            })
        })
        .collect();

    for producer in producers {
        producer.join().unwrap();
    }

    while completed.load(Ordering::SeqCst) < 100 {
        thread::sleep(Duration::from_millis(5));
    }
    pool.shutdown().expect("Failed to shutdown pool");

    assert_eq!(pool.total_tasks_submitted(), 100);
    assert_eq!(pool.total_tasks_completed(), 100);
    assert_eq!(pool.total_tasks_abandoned(), 0);
}

#[test]
fn test_task_can_shut_down_its_own_pool() {
    let pool = Arc::new(WorkerPool::with_workers(2).expect("Failed to create pool"));
    pool.start().expect("Failed to start pool");

    let (tx, rx) = crossbeam::channel::bounded(1);
    let inner = Arc::clone(&pool);
    pool.execute(move || {
        tx.send(inner.shutdown().is_ok()).unwrap();
        Ok(())
    })
    .unwrap();

    assert_eq!(rx.recv_timeout(Duration::from_secs(2)), Ok(true));
    assert_eq!(pool.state(), PoolState::Stopped);
}

#[test]
fn test_traced_task_runs() {
    let pool = WorkerPool::with_workers(1).expect("Failed to create pool");
    pool.start().expect("Failed to start pool");

    let ran = Arc::new(AtomicUsize::new(0));
    let counter = Arc::clone(&ran);
    pool.push_traced(ClosureTask::new(move || {
        counter.fetch_add(1, Ordering::SeqCst);
        Ok(())
    }))
    .unwrap();

    thread::sleep(Duration::from_millis(50));
    assert_eq!(ran.load(Ordering::SeqCst), 1);
    pool.shutdown().unwrap();
}
