//! Bounded queue example
//!
//! Demonstrates capacity limits, blocking producers and close semantics.
//!
//! Run with: cargo run --example bounded_queue

use rust_schedule_kit::prelude::*;
use std::sync::Arc;
use std::thread;
use std::time::Duration;

fn main() -> Result<()> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    println!("=== Rust Schedule Kit - Bounded Queue Example ===\n");

    println!("1. Raw blocking queue with capacity 4:");
    let queue = Arc::new(BlockingQueue::new(4, 4));
    for i in [40i64, 10, 30, 20] {
        queue.try_push(i).map_err(|e| e.into_error(&queue))?;
    }
    match queue.try_push(50) {
        Err(PushError::Full(value)) => println!("   try_push({}) rejected: queue full", value),
        other => println!("   unexpected: {:?}", other),
    }

    let producer = {
        let queue = Arc::clone(&queue);
        thread::spawn(move || {
            println!("   producer waiting to push 5...");
            let result = queue.push(5);
            println!("   producer push finished: {:?}", result.map_err(|e| e.is_closed()));
        })
    };
    thread::sleep(Duration::from_millis(50));
    println!("   popped {:?}, making room", queue.pop());
    producer.join().expect("producer panicked");
    println!("   remaining in priority order: {:?}", queue.try_pop_all());

    println!("\n2. Close wakes blocked producers:");
    let queue = Arc::new(BlockingQueue::new(1, 1));
    queue.push(1i64).map_err(|e| e.into_error(&queue))?;
    let blocked = {
        let queue = Arc::clone(&queue);
        thread::spawn(move || queue.push(2))
    };
    thread::sleep(Duration::from_millis(50));
    queue.close();
    match blocked.join().expect("producer panicked") {
        Err(PushError::Closed(value)) => println!("   push({}) returned Closed", value),
        other => println!("   unexpected: {:?}", other),
    }
    println!("   draining after close: {:?} then {:?}", queue.pop(), queue.pop());

    println!("\n3. Worker pool with a bounded queue:");
    let config = WorkerPoolConfig::new(2)
        .with_max_queue_size(3)
        .with_thread_name_prefix("bounded-worker");
    let pool = WorkerPool::with_config(config)?;
    pool.start()?;

    let mut accepted = 0;
    let mut rejected = 0;
    for i in 0..10 {
        let result = pool.try_push(ClosureTask::new(move || {
            thread::sleep(Duration::from_millis(100));
            println!("  Task {} done", i);
            Ok(())
        }));
        match result {
            Ok(()) => accepted += 1,
            Err(Error::QueueFull { current, max }) => {
                rejected += 1;
                println!("  Task {} rejected ({}/{} queued)", i, current, max);
            }
            Err(e) => return Err(e),
        }
    }
    println!("   {} accepted, {} rejected", accepted, rejected);

    println!("\n4. Blocking submission waits for room instead:");
    for i in 10..15 {
        pool.execute(move || {
            println!("  Task {} done", i);
            Ok(())
        })?;
    }

    thread::sleep(Duration::from_millis(500));
    pool.shutdown()?;
    println!(
        "\n   completed {}, abandoned {}",
        pool.total_tasks_completed(),
        pool.total_tasks_abandoned()
    );

    println!("\n=== Example completed successfully! ===");
    Ok(())
}
