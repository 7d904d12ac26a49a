//! Scheduling overhead of `Pool` for trivially-cheap workers, isolating
//! the dispatcher's own cost from whatever a real worker does.

use std::sync::Arc;
use std::time::Duration;

use criterion::{criterion_group, criterion_main, BenchmarkId, Criterion};
use tdec_pool::{AllAtOnceFactory, Pool, WorkerFn};

fn bench_dispatch(c: &mut Criterion) {
    let runtime = tokio::runtime::Runtime::new().unwrap();
    let mut group = c.benchmark_group("pool_dispatch");

    for value_count in [10usize, 100, 500] {
        group.bench_with_input(BenchmarkId::from_parameter(value_count), &value_count, |b, &value_count| {
            b.to_async(&runtime).iter(|| async move {
                let values: Vec<usize> = (0..value_count).collect();
                let factory = Box::new(AllAtOnceFactory::new(values));
                let worker: WorkerFn<usize, usize> = Arc::new(|v: usize| Box::pin(async move { Ok(v) }));
                let pool = Pool::new(worker, factory, value_count, Duration::from_secs(5), Duration::from_millis(0), None);
                pool.start().await;
                pool.block_until_target_successes().await.unwrap();
                pool.join().await.unwrap();
            });
        });
    }

    group.finish();
}

criterion_group!(benches, bench_dispatch);
criterion_main!(benches);
