use std::collections::HashMap;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use tdec_pool::{AllAtOnceFactory, PoolError, ValueFactory, WorkerFn};

fn worker_of(delays: HashMap<u32, (Duration, bool)>) -> WorkerFn<u32, u32> {
    let delays = Arc::new(delays);
    Arc::new(move |value: u32| {
        let delays = delays.clone();
        Box::pin(async move {
            let (delay, succeeds) = delays.get(&value).copied().unwrap_or((Duration::ZERO, true));
            tokio::time::sleep(delay).await;
            if succeeds {
                Ok(value)
            } else {
                Err(anyhow::anyhow!("worker {} failed", value))
            }
        })
    })
}

fn build_pool(
    succeed: &[(u32, Duration)],
    fail: &[(u32, Duration)],
    target: usize,
    timeout: Duration,
    pool_size: usize,
) -> tdec_pool::Pool<u32, u32> {
    let mut delays = HashMap::new();
    let mut values = Vec::new();
    for (v, d) in succeed {
        delays.insert(*v, (*d, true));
        values.push(*v);
    }
    for (v, d) in fail {
        delays.insert(*v, (*d, false));
        values.push(*v);
    }
    let worker = worker_of(delays);
    let factory = Box::new(AllAtOnceFactory::new(values));
    tdec_pool::Pool::new(worker, factory, target, timeout, Duration::ZERO, Some(pool_size))
}

// S1: 10 succeed (~0.5s), 20 fail (~1s). N=10, timeout=10s, pool_size=30 (>= total
// items, so nothing queues on the execution pool: every worker starts immediately).
// Expect: target reached well under the failure window, failures map == 20.
#[tokio::test(start_paused = true)]
async fn s1_reaches_target_before_failures_matter() {
    let succeed: Vec<(u32, Duration)> = (0..10).map(|i| (i, Duration::from_millis(500))).collect();
    let fail: Vec<(u32, Duration)> = (100..120).map(|i| (i, Duration::from_millis(1000))).collect();

    let pool = build_pool(&succeed, &fail, 10, Duration::from_secs(10), 30);
    pool.start().await;

    let started = tokio::time::Instant::now();
    let successes = pool.block_until_target_successes().await.expect("should reach target");
    let elapsed = started.elapsed();

    assert_eq!(successes.len(), 10);
    assert!(elapsed < Duration::from_secs(2), "elapsed = {:?}", elapsed);

    pool.cancel();
    pool.join().await.unwrap();
    assert_eq!(pool.get_failures().len(), 20);
}

// S2: 9 succeed, 20 fail (never reaching the target of 10). N=10, pool_size=15
// (< the 29 total items, so the execution pool genuinely queues work).
// Expect OutOfValues once every item has finished, well under 4s of virtual time.
#[tokio::test(start_paused = true)]
async fn s2_out_of_values_when_short_of_target() {
    let succeed: Vec<(u32, Duration)> = (0..9).map(|i| (i, Duration::from_millis(500))).collect();
    let fail: Vec<(u32, Duration)> = (100..120).map(|i| (i, Duration::from_millis(600))).collect();

    let pool = build_pool(&succeed, &fail, 10, Duration::from_secs(10), 15);
    pool.start().await;

    let started = tokio::time::Instant::now();
    let result = pool.block_until_target_successes().await;
    let elapsed = started.elapsed();

    assert!(matches!(result, Err(PoolError::OutOfValues { failures: 20, .. })));
    assert!(elapsed < Duration::from_secs(4), "elapsed = {:?}", elapsed);

    pool.join().await.unwrap();
    assert_eq!(pool.get_failures().len(), 20);
}

// S3: 9 succeed fast, 1 succeeds slow, 20 fail slow. N=10, timeout=1s. Expect TimedOut.
#[tokio::test(start_paused = true)]
async fn s3_times_out_before_tenth_success() {
    let mut succeed: Vec<(u32, Duration)> = (0..9).map(|i| (i, Duration::from_millis(100))).collect();
    succeed.push((9, Duration::from_millis(2000)));
    let fail: Vec<(u32, Duration)> = (100..120).map(|i| (i, Duration::from_millis(2000))).collect();

    let pool = build_pool(&succeed, &fail, 10, Duration::from_secs(1), 30);
    pool.start().await;

    let started = tokio::time::Instant::now();
    let result = pool.block_until_target_successes().await;
    let elapsed = started.elapsed();

    assert!(matches!(result, Err(PoolError::TimedOut { .. })));
    assert!(elapsed < Duration::from_secs(3), "elapsed = {:?}", elapsed);

    pool.join().await.unwrap();
}

// S4: 100 workers sleep 1s each. N=10, pool_size=10. Cancel right after target is
// reached; join() must return without waiting for every one of the 100 workers.
#[tokio::test(start_paused = true)]
async fn s4_cancel_after_target_lets_join_return_promptly() {
    let succeed: Vec<(u32, Duration)> = (0..100).map(|i| (i, Duration::from_secs(1))).collect();
    let pool = build_pool(&succeed, &[], 10, Duration::from_secs(30), 10);
    pool.start().await;

    let successes = pool.block_until_target_successes().await.unwrap();
    assert_eq!(successes.len(), 10);

    pool.cancel();
    let started = tokio::time::Instant::now();
    pool.join().await.unwrap();
    let elapsed = started.elapsed();

    // the in-flight batch (<=10 workers, 1s each) must finish, but no further
    // batch of the remaining ~90 values should ever start.
    assert!(elapsed < Duration::from_secs(2), "elapsed = {:?}", elapsed);
    assert!(pool.get_successes().len() + pool.get_failures().len() <= 20);
}

// S5: the factory's batch sizes should shrink monotonically toward zero as
// the success count approaches the target, and stop being called once the
// target is reached.
struct TracingFactory {
    remaining: Vec<u32>,
    required: usize,
    trace: Arc<Mutex<Vec<usize>>>,
}

impl ValueFactory<u32> for TracingFactory {
    fn next_batch(&mut self, current_successes: usize) -> anyhow::Result<Option<Vec<u32>>> {
        let shortfall = self.required.saturating_sub(current_successes);
        self.trace.lock().unwrap().push(shortfall);
        if shortfall == 0 || self.remaining.is_empty() {
            return Ok(None);
        }
        let take = shortfall.min(self.remaining.len());
        Ok(Some(self.remaining.drain(..take).collect()))
    }
}

#[tokio::test(start_paused = true)]
async fn s5_batch_trace_is_monotonically_non_increasing() {
    let trace = Arc::new(Mutex::new(Vec::new()));
    let factory = Box::new(TracingFactory {
        remaining: (0..30).collect(),
        required: 10,
        trace: trace.clone(),
    });

    let counter = Arc::new(AtomicUsize::new(0));
    let worker: WorkerFn<u32, u32> = {
        let counter = counter.clone();
        Arc::new(move |v: u32| {
            let counter = counter.clone();
            Box::pin(async move {
                counter.fetch_add(1, Ordering::SeqCst);
                tokio::time::sleep(Duration::from_millis(10)).await;
                Ok(v)
            })
        })
    };

    let pool = tdec_pool::Pool::new(worker, factory, 10, Duration::from_secs(5), Duration::ZERO, Some(5));
    pool.start().await;
    pool.block_until_target_successes().await.unwrap();
    pool.cancel();
    pool.join().await.unwrap();

    let recorded = trace.lock().unwrap().clone();
    for pair in recorded.windows(2) {
        assert!(pair[0] >= pair[1], "trace not monotonic: {:?}", recorded);
    }
    assert_eq!(*recorded.last().unwrap(), 0);
}

#[tokio::test(start_paused = true)]
async fn target_zero_resolves_immediately() {
    let pool = build_pool(&[], &[], 0, Duration::from_secs(5), 5);
    pool.start().await;
    let successes = pool.block_until_target_successes().await.unwrap();
    assert!(successes.is_empty());
    pool.cancel();
    pool.join().await.unwrap();
}

#[tokio::test(start_paused = true)]
async fn empty_first_batch_is_out_of_values() {
    let factory: Box<dyn ValueFactory<u32> + Send> = Box::new(AllAtOnceFactory::new(Vec::new()));
    let worker: WorkerFn<u32, u32> = Arc::new(|v: u32| Box::pin(async move { Ok(v) }));
    let pool = tdec_pool::Pool::new(worker, factory, 3, Duration::from_secs(5), Duration::ZERO, Some(5));
    pool.start().await;
    let result = pool.block_until_target_successes().await;
    assert!(matches!(result, Err(PoolError::OutOfValues { .. })));
    pool.join().await.unwrap();
}

#[tokio::test(start_paused = true)]
async fn factory_error_is_reraised_by_every_subsequent_call() {
    struct FailingFactory;
    impl ValueFactory<u32> for FailingFactory {
        fn next_batch(&mut self, _current_successes: usize) -> anyhow::Result<Option<Vec<u32>>> {
            Err(anyhow::anyhow!("catalog unreachable"))
        }
    }

    let worker: WorkerFn<u32, u32> = Arc::new(|v: u32| Box::pin(async move { Ok(v) }));
    let pool = tdec_pool::Pool::new(worker, Box::new(FailingFactory), 3, Duration::from_secs(5), Duration::ZERO, Some(5));
    pool.start().await;

    let first = pool.block_until_target_successes().await;
    let second = pool.block_until_target_successes().await;
    match (first, second) {
        (Err(PoolError::ProducerError(a)), Err(PoolError::ProducerError(b))) => {
            assert_eq!(a.summary, b.summary);
            assert_eq!(a.summary, "catalog unreachable");
        }
        (a, b) => panic!("expected ProducerError twice, got {:?} / {:?}", a, b),
    }
    pool.join().await.unwrap();
}

#[tokio::test(start_paused = true)]
async fn duplicate_values_resolve_to_last_written_outcome() {
    // the same value scheduled twice: second completion wins in the map.
    let counter = Arc::new(AtomicUsize::new(0));
    let worker: WorkerFn<u32, u32> = {
        let counter = counter.clone();
        Arc::new(move |v: u32| {
            let counter = counter.clone();
            Box::pin(async move {
                let call_index = counter.fetch_add(1, Ordering::SeqCst);
                Ok(v * 1000 + call_index as u32)
            })
        })
    };
    let factory = Box::new(AllAtOnceFactory::new(vec![7, 7, 7]));
    let pool = tdec_pool::Pool::new(worker, factory, 1, Duration::from_secs(5), Duration::ZERO, Some(1));
    pool.start().await;
    pool.block_until_target_successes().await.unwrap();
    pool.cancel();
    pool.join().await.unwrap();

    let successes = pool.get_successes();
    assert_eq!(successes.len(), 1);
    assert!(successes.contains_key(&7));
}

// On a real multi-threaded runtime, a worker's completion (sending its
// outcome) and the processor's exit check run on genuinely different OS
// threads. This exercises that interleaving directly, rather than under
// `start_paused`'s single-threaded, virtual-time scheduler where the two
// never actually race.
#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn join_completes_promptly_under_real_multi_threaded_scheduling() {
    let worker: WorkerFn<u32, u32> = Arc::new(|v: u32| {
        Box::pin(async move {
            tokio::task::yield_now().await;
            Ok(v)
        })
    });
    let values: Vec<u32> = (0..200).collect();
    let factory = Box::new(AllAtOnceFactory::new(values));
    let pool = tdec_pool::Pool::new(worker, factory, 200, Duration::from_secs(10), Duration::ZERO, Some(32));
    pool.start().await;

    let outcome = tokio::time::timeout(Duration::from_secs(5), async {
        pool.block_until_target_successes().await.unwrap();
        pool.join().await.unwrap();
    })
    .await;

    assert!(outcome.is_ok(), "pool.join() hung instead of completing promptly");
}
