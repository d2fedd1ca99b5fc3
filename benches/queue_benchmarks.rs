use criterion::{black_box, criterion_group, criterion_main, BatchSize, BenchmarkId, Criterion};
use rand::Rng;
use rust_schedule_kit::prelude::*;
use std::sync::Arc;
use std::thread;

fn random_priorities(n: usize) -> Vec<i64> {
    let mut rng = rand::thread_rng();
    (0..n).map(|_| rng.gen()).collect()
}

fn benchmark_priority_queue(c: &mut Criterion) {
    let mut group = c.benchmark_group("priority_queue");

    for size in [100usize, 1_000, 10_000] {
        group.bench_with_input(BenchmarkId::new("push_pop", size), &size, |b, &size| {
            b.iter_batched(
                || random_priorities(size),
                |values| {
                    let queue = PriorityQueue::with_capacity(size);
                    for value in values {
                        queue.push(value);
                    }
                    while let Some(value) = queue.pop() {
                        black_box(value);
                    }
                },
                BatchSize::SmallInput,
            );
        });
    }

    group.finish();
}

fn benchmark_blocking_queue(c: &mut Criterion) {
    let mut group = c.benchmark_group("blocking_queue");

    group.bench_function("spsc_bounded_64", |b| {
        b.iter(|| {
            let queue = Arc::new(BlockingQueue::new(64, 64));
            let consumer = {
                let queue = Arc::clone(&queue);
                thread::spawn(move || {
                    let mut popped = 0usize;
                    while queue.pop().is_some() {
                        popped += 1;
                    }
                    popped
                })
            };

            for i in 0..10_000i64 {
                queue.push(i).expect("Failed to push");
            }
            queue.close();
            black_box(consumer.join().expect("consumer panicked"));
        });
    });

    group.bench_function("try_pop_all_1000", |b| {
        b.iter_batched(
            || {
                let queue = BlockingQueue::unbounded();
                for value in random_priorities(1_000) {
                    queue.try_push(value).expect("Failed to push");
                }
                queue
            },
            |queue| black_box(queue.try_pop_all()),
            BatchSize::SmallInput,
        );
    });

    group.finish();
}

fn benchmark_worker_pool(c: &mut Criterion) {
    c.bench_function("worker_pool_1000_tasks", |b| {
        b.iter_batched(
            || {
                let pool = WorkerPool::with_workers(4).expect("Failed to create pool");
                pool.start().expect("Failed to start pool");
                pool
            },
            |pool| {
                for i in 0..1_000 {
                    pool.execute_with_priority(
                        || {
                            black_box(1 + 1);
                            Ok(())
                        },
                        i % 7,
                    )
                    .expect("Failed to submit task");
                }
                pool.shutdown().expect("Failed to shutdown pool");
            },
            BatchSize::SmallInput,
        );
    });
}

fn benchmark_lru(c: &mut Criterion) {
    let cache = LruCache::new(1_024, None);
    let mut rng = rand::thread_rng();

    c.bench_function("lru_put_get", |b| {
        b.iter(|| {
            let key: u32 = rng.gen_range(0..4_096);
            if cache.get(&key).is_none() {
                cache.put(key, key);
            }
        });
    });
}

criterion_group!(
    benches,
    benchmark_priority_queue,
    benchmark_blocking_queue,
    benchmark_worker_pool,
    benchmark_lru
);
criterion_main!(benches);
