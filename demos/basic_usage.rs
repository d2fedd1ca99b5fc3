//! Basic worker pool usage example
//!
//! Demonstrates pool creation, prioritized task submission, failure
//! handling and statistics.
//!
//! Run with: cargo run --example basic_usage

use rust_schedule_kit::prelude::*;
use std::thread;
use std::time::Duration;

fn main() -> Result<()> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    println!("=== Rust Schedule Kit - Basic Usage Example ===\n");

    // One worker so priority order is visible
    let pool = WorkerPool::with_workers(1)?;

    println!("1. Queueing tasks before start (priorities 9..0):");
    for priority in (0..10).rev() {
        pool.execute_with_priority(
            move || {
                println!(
                    "  Task with priority {} on thread {:?}",
                    priority,
                    thread::current().name()
                );
                Ok(())
            },
            priority,
        )?;
    }
    println!("   Queue size: {}", pool.queue_size());

    println!("\n2. Starting pool with {} worker", pool.num_workers());
    pool.start()?;
    thread::sleep(Duration::from_millis(100));

    println!("\n3. Submitting tasks that fail and panic:");
    pool.push(
        ClosureTask::new(|| Err(Error::task_failed("disk unavailable")))
            .with_name("writer")
            .with_failure_handler(|e| println!("  writer failure handled: {}", e)),
    )?;
    pool.push(
        ClosureTask::new(|| panic!("index out of range"))
            .with_name("indexer")
            .with_failure_handler(|e| println!("  indexer failure handled: {}", e)),
    )?;
    pool.execute(|| {
        println!("  Worker survived, still executing tasks");
        Ok(())
    })?;
    thread::sleep(Duration::from_millis(100));

    println!("\n4. Statistics:");
    println!("   Total tasks submitted: {}", pool.total_tasks_submitted());
    println!("   Total tasks completed: {}", pool.total_tasks_completed());
    println!("   Total tasks failed: {}", pool.total_tasks_failed());
    println!("   Total tasks panicked: {}", pool.total_tasks_panicked());
    for (i, stat) in pool.get_stats().iter().enumerate() {
        println!(
            "   Worker {}: avg time {:.2}μs",
            i,
            stat.get_average_processing_time_us()
        );
    }

    println!("\n5. Shutting down worker pool...");
    pool.shutdown()?;

    println!("\n=== Example completed successfully! ===");

    Ok(())
}
