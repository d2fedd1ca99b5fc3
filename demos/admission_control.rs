//! Admission control example
//!
//! Drives a limited handler with more clients than it admits and prints
//! how many requests were processed, shed or cancelled.
//!
//! Run with: cargo run --example admission_control

use http::Response;
use rand::Rng;
use rust_schedule_kit::prelude::*;
use std::sync::Arc;
use std::thread;
use std::time::Duration;

fn main() -> Result<()> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("warn")).init();

    println!("=== Rust Schedule Kit - Admission Control Example ===\n");

    let config = AdmissionConfig::from_json(
        r#"{"max_concurrent": 5, "queue_deadline_ms": 10, "timeout_body": "busy, retry later"}"#,
    )?;
    let controller = Arc::new(AdmissionController::new(config)?);
    let handler = Arc::new(controller.wrap(|client: usize, w: &mut Response<Vec<u8>>| {
        let work = rand::thread_rng().gen_range(0..20);
        thread::sleep(Duration::from_millis(work));
        w.write_body(format!("Hello, client {}", client).as_bytes());
    }));

    let monitor = {
        let controller = Arc::clone(&controller);
        thread::spawn(move || {
            for _ in 0..5 {
                let stats = controller.stats();
                println!(
                    "   [stats] queued {}, processing {}, done {}",
                    stats.request_in_queue, stats.request_in_processing, stats.request_done
                );
                thread::sleep(Duration::from_millis(40));
            }
        })
    };

    println!("1. Sending 100 requests:");
    let clients: Vec<_> = (0..100)
        .map(|client| {
            let handler = Arc::clone(&handler);
            thread::sleep(Duration::from_millis(rand::thread_rng().gen_range(0..3)));
            thread::spawn(move || {
                // Every tenth client gives up after 5ms
                let token = if client % 10 == 0 {
                    CancellationToken::with_timeout(Duration::from_millis(5))
                } else {
                    CancellationToken::new()
                };
                let mut response = Response::new(Vec::new());
                let outcome = handler.serve(client, &token, &mut response);
                (outcome, response.status())
            })
        })
        .collect();

    for client in clients {
        let (outcome, status) = client.join().expect("client panicked");
        if outcome != Admission::Processed {
            println!("   {:?} -> {}", outcome, status);
        }
    }
    monitor.join().expect("monitor panicked");

    println!("\n2. Final statistics:");
    let stats = controller.stats();
    println!(
        "{}",
        serde_json::to_string_pretty(&stats).map_err(|e| Error::other(e.to_string()))?
    );

    println!("\n=== Example completed successfully! ===");
    Ok(())
}
