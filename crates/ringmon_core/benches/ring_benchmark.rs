//! Benchmark for ring hand-off throughput.
//!
//! Run with: cargo bench --package ringmon_core --bench ring_benchmark

use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion, Throughput};
use ringmon_core::{Ring, Slot};
use std::sync::Arc;
use std::thread;

const MESSAGES: u64 = 10_000;

fn benchmark_uncontended(c: &mut Criterion) {
    let ring: Ring = Ring::new(64).expect("valid size");

    c.bench_function("put_get_uncontended", |b| {
        b.iter(|| {
            ring.put(black_box(Slot::new(1, 42)));
            black_box(ring.get())
        });
    });
}

fn benchmark_spsc_handoff(c: &mut Criterion) {
    let mut group = c.benchmark_group("spsc_handoff");
    group.throughput(Throughput::Elements(MESSAGES));

    for size in [2usize, 16, 256] {
        group.bench_with_input(BenchmarkId::from_parameter(size), &size, |b, &size| {
            b.iter(|| {
                let ring: Arc<Ring> = Arc::new(Ring::new(size).expect("valid size"));
                let producer = {
                    let ring = Arc::clone(&ring);
                    thread::spawn(move || {
                        for value in 0..MESSAGES {
                            ring.put(Slot::new(1, value as i32));
                        }
                    })
                };
                for _ in 0..MESSAGES {
                    black_box(ring.get());
                }
                producer.join().expect("producer panicked");
            });
        });
    }

    group.finish();
}

criterion_group!(benches, benchmark_uncontended, benchmark_spsc_handoff);
criterion_main!(benches);
