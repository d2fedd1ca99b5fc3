//! Timing scheduler example
//!
//! Demonstrates due-time scheduling, follow-up tasks submitted from inside a
//! task, and time-of-day parsing.
//!
//! Run with: cargo run --example timing_schedule

use rust_schedule_kit::prelude::*;
use std::thread;
use std::time::Duration;

/// Reschedules itself `remaining` more times, one second apart
struct Heartbeat {
    run_at: i64,
    remaining: u32,
}

impl TimingTask for Heartbeat {
    fn run_at(&self) -> i64 {
        self.run_at
    }

    fn run(&mut self, scheduler: &SchedulerHandle) -> Result<()> {
        println!("  heartbeat due {} ran at {}", self.run_at, now_unix());
        if self.remaining > 0 {
            scheduler.push(Heartbeat {
                run_at: self.run_at + 1,
                remaining: self.remaining - 1,
            })?;
        }
        Ok(())
    }

    fn name(&self) -> &str {
        "Heartbeat"
    }
}

fn main() -> Result<()> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    println!("=== Rust Schedule Kit - Timing Schedule Example ===\n");

    println!("1. Parsing times of day:");
    for value in ["18:53:00", "24:00:00", "12:3:00"] {
        match today_time(value) {
            Ok(ts) => println!("   {} -> {}", value, ts),
            Err(e) => println!("   {} -> {}", value, e),
        }
    }

    let now = now_unix();
    let initial: Vec<BoxedTimingTask> = vec![
        Box::new(Heartbeat {
            run_at: now + 1,
            remaining: 2,
        }),
        Box::new(ScheduledClosure::new(now, |_| {
            println!("  immediate task ran");
            Ok(())
        })),
        Box::new(
            ScheduledClosure::new(now + 2, |_| Err(Error::task_failed("upstream unavailable")))
                .with_name("sync")
                .with_error_handler(|e| println!("  sync task error handled: {}", e)),
        ),
    ];

    let config = SchedulerConfig::new(2)
        .with_poll_interval(Duration::from_millis(100))
        .with_thread_name_prefix("timer");
    let scheduler = TimingScheduler::new(config, initial)?;

    println!("\n2. Starting scheduler with {} pending tasks", scheduler.len());
    println!("   next due: {:?} (now {})", scheduler.next_due(), now);
    scheduler.start()?;

    thread::sleep(Duration::from_millis(4_500));

    println!("\n3. Shutting down with {} pending tasks", scheduler.len());
    scheduler.shutdown()?;

    println!("\n=== Example completed successfully! ===");
    Ok(())
}
