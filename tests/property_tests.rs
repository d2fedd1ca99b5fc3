//! Property-based tests for rust_schedule_kit using proptest

use proptest::prelude::*;
use rust_schedule_kit::prelude::*;
use rust_schedule_kit::queue::PriorityHeap;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::thread;
use std::time::Duration;

// ============================================================================
// Heap Ordering
// ============================================================================

proptest! {
    /// Popping everything yields the pushed priorities in ascending order
    #[test]
    fn test_queue_pops_sorted(values in prop::collection::vec(any::<i64>(), 0..200)) {
        let queue = PriorityQueue::with_capacity(values.len());
        for value in &values {
            queue.push(*value);
        }

        let mut expected = values.clone();
        expected.sort_unstable();

        let popped: Vec<i64> = std::iter::from_fn(|| queue.pop()).collect();
        prop_assert_eq!(popped, expected);
        prop_assert!(queue.is_empty());
    }

    /// Interleaved pushes and pops always surface the current minimum
    #[test]
    fn test_heap_interleaved_min(ops in prop::collection::vec(prop::option::of(-1000i64..1000), 1..300)) {
        let mut heap = PriorityHeap::default();
        let mut model: Vec<i64> = Vec::new();

        for op in ops {
            match op {
                Some(value) => {
                    heap.push(value);
                    model.push(value);
                }
                None => {
                    let expected = model.iter().copied().min();
                    if let Some(min) = expected {
                        let idx = model.iter().position(|v| *v == min).unwrap();
                        model.swap_remove(idx);
                    }
                    prop_assert_eq!(heap.pop(), expected);
                }
            }
            prop_assert_eq!(heap.len(), model.len());
        }
    }
}

// ============================================================================
// Blocking Queue Capacity
// ============================================================================

proptest! {
    /// A bounded queue never holds more than `max_size` elements
    #[test]
    fn test_try_push_respects_capacity(
        max_size in 1usize..32,
        pushes in 0usize..64
    ) {
        let queue = BlockingQueue::new(0, max_size);
        let mut accepted = 0;
        let mut rejected = 0;

        for i in 0..pushes {
            match queue.try_push(i as i64) {
                Ok(()) => accepted += 1,
                Err(PushError::Full(value)) => {
                    prop_assert_eq!(value, i as i64);
                    rejected += 1;
                }
                Err(e) => panic!("Unexpected error: {:?}", e),
            }
            prop_assert!(queue.len() <= max_size);
        }

        prop_assert_eq!(accepted, pushes.min(max_size));
        prop_assert_eq!(accepted + rejected, pushes);
    }

    /// Raising `max_size` to `initial_capacity` keeps the bound consistent
    #[test]
    fn test_max_size_never_below_initial_capacity(
        initial in 0usize..64,
        max_size in 0usize..64
    ) {
        let queue: BlockingQueue<i64> = BlockingQueue::new(initial, max_size);
        if max_size == 0 {
            prop_assert_eq!(queue.max_size(), 0);
        } else {
            prop_assert_eq!(queue.max_size(), max_size.max(initial));
        }
    }
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(16))]

    /// Concurrent producers and consumers drain a bounded queue to zero
    #[test]
    fn test_concurrent_drain(
        producers in 1usize..4,
        per_producer in 1usize..500,
        max_size in 1usize..16
    ) {
        let queue = Arc::new(BlockingQueue::new(0, max_size));
        let total = producers * per_producer;
        let consumed = Arc::new(AtomicUsize::new(0));

        let consumers: Vec<_> = (0..2)
            .map(|_| {
                let queue = Arc::clone(&queue);
                let consumed = Arc::clone(&consumed);
                thread::spawn(move || {
                    while queue.pop().is_some() {
                        consumed.fetch_add(1, Ordering::SeqCst);
                    }
                })
            })
            .collect();

        let handles: Vec<_> = (0..producers)
            .map(|p| {
                let queue = Arc::clone(&queue);
                thread::spawn(move || {
                    for i in 0..per_producer {
                        queue.push((p * per_producer + i) as i64).unwrap();
                    }
                })
            })
            .collect();

        for handle in handles {
            handle.join().unwrap();
        }
        while consumed.load(Ordering::SeqCst) < total {
            thread::yield_now();
        }
        queue.close();
        for consumer in consumers {
            consumer.join().unwrap();
        }

        prop_assert_eq!(consumed.load(Ordering::SeqCst), total);
        prop_assert!(queue.is_empty());
    }
}

// ============================================================================
// Worker Pool
// ============================================================================

proptest! {
    #![proptest_config(ProptestConfig::with_cases(16))]

    /// Every submitted task runs exactly once
    #[test]
    fn test_multiple_task_execution(task_count in 1usize..50) {
        let pool = WorkerPool::with_workers(4).unwrap();
        pool.start().unwrap();

        let counter = Arc::new(AtomicUsize::new(0));
        for _ in 0..task_count {
            let counter_clone = Arc::clone(&counter);
            pool.execute(move || {
                counter_clone.fetch_add(1, Ordering::SeqCst);
                Ok(())
            }).unwrap();
        }

        std::thread::sleep(Duration::from_millis(100));
        pool.shutdown().unwrap();

        prop_assert_eq!(counter.load(Ordering::SeqCst), task_count);
        prop_assert_eq!(pool.total_tasks_completed(), task_count as u64);
    }

    /// Worker threads survive panicking tasks
    #[test]
    fn test_panic_isolation(
        panic_count in 1usize..10,
        success_count in 1usize..10
    ) {
        let pool = WorkerPool::with_workers(2).unwrap();
        pool.start().unwrap();

        let counter = Arc::new(AtomicUsize::new(0));
        for _ in 0..panic_count {
            pool.execute(|| panic!("Intentional panic for testing")).unwrap();
        }
        for _ in 0..success_count {
            let counter_clone = Arc::clone(&counter);
            pool.execute(move || {
                counter_clone.fetch_add(1, Ordering::SeqCst);
                Ok(())
            }).unwrap();
        }

        std::thread::sleep(Duration::from_millis(100));
        pool.shutdown().unwrap();

        prop_assert_eq!(counter.load(Ordering::SeqCst), success_count);
        prop_assert_eq!(pool.total_tasks_panicked(), panic_count as u64);
    }

    /// Shutdown is safe to repeat for any worker count
    #[test]
    fn test_double_shutdown_safe(workers in 1usize..8) {
        let pool = WorkerPool::with_workers(workers).unwrap();
        pool.start().unwrap();

        prop_assert!(pool.shutdown().is_ok());
        prop_assert!(pool.shutdown().is_ok());
        prop_assert_eq!(pool.state(), PoolState::Stopped);
    }
}

// ============================================================================
// LRU Cache
// ============================================================================

proptest! {
    /// The cache never exceeds capacity and always retains the latest put
    #[test]
    fn test_lru_bounded(
        capacity in 1usize..16,
        keys in prop::collection::vec(0u8..32, 1..200)
    ) {
        let cache = LruCache::new(capacity, None);
        for (i, key) in keys.iter().enumerate() {
            cache.put(*key, i);
            prop_assert!(cache.len() <= capacity);
            prop_assert_eq!(cache.get(key), Some(i));
        }
    }

    /// Without lookups, exactly the last `capacity` distinct keys survive
    #[test]
    fn test_lru_keeps_most_recent_keys(
        capacity in 1usize..8,
        keys in prop::collection::vec(0u8..16, 1..100)
    ) {
        let cache = LruCache::new(capacity, None);
        for key in &keys {
            cache.put(*key, ());
        }

        let mut recent: Vec<u8> = Vec::new();
        for key in keys.iter().rev() {
            if !recent.contains(key) {
                recent.push(*key);
            }
        }
        recent.truncate(capacity);

        prop_assert_eq!(cache.len(), recent.len());
        for key in recent {
            prop_assert_eq!(cache.remove(&key), Some(()));
        }
        prop_assert!(cache.is_empty());
    }
}

// ============================================================================
// Time of Day Parsing
// ============================================================================

proptest! {
    /// Every well-formed time of day parses
    #[test]
    fn test_today_time_accepts_valid(h in 0u32..24, m in 0u32..60, s in 0u32..60) {
        let value = format!("{:02}:{:02}:{:02}", h, m, s);
        // Local times skipped by a DST jump are the only legal rejection
        if let Err(e) = today_time(&value) {
            prop_assert!(
                matches!(e, Error::InvalidTimeOfDay { field: "local time", .. }),
                "unexpected error for {}: {}", value, e
            );
        }
    }

    /// Out-of-range fields are rejected
    #[test]
    fn test_today_time_rejects_out_of_range(h in 24u32..100, m in 60u32..100) {
        let bad_hour = format!("{:02}:00:00", h);
        let bad_minute = format!("00:{:02}:00", m);
        let bad_second = format!("00:00:{:02}", m);
        prop_assert!(today_time(&bad_hour).is_err());
        prop_assert!(today_time(&bad_minute).is_err());
        prop_assert!(today_time(&bad_second).is_err());
    }
}
