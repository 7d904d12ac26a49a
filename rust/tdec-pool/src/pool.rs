use std::collections::HashMap;
use std::future::Future;
use std::hash::Hash;
use std::pin::Pin;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::{Arc, Mutex as StdMutex};
use std::time::Duration;

use tokio::sync::{mpsc, watch, Mutex as AsyncMutex, Notify, OnceCell, Semaphore};
use tokio::task::JoinSet;

use crate::error::{FactoryError, PoolError, WorkerFailure};
use crate::slot::FutureSlot;
use crate::value_factory::ValueFactory;

/// Default execution-pool concurrency when the caller doesn't specify one.
/// The reference implementation's underlying `twisted.python.threadpool.ThreadPool`
/// defaults to a small fixed range; we pick a single number since async
/// tasks are far cheaper than OS threads.
pub const DEFAULT_POOL_SIZE: usize = 10;

type WorkerFuture<R> = Pin<Box<dyn Future<Output = anyhow::Result<R>> + Send>>;

/// User-supplied operation invoked once per scheduled value.
pub type WorkerFn<V, R> = Arc<dyn Fn(V) -> WorkerFuture<R> + Send + Sync>;

enum WorkItem<V, R> {
    Success(V, R),
    Failure(V, WorkerFailure),
    Cancelled,
    ProducerStopped,
}

/// Terminal state of the pool's target-success [`FutureSlot`].
#[derive(Clone)]
enum TargetOutcome<V, R> {
    Reached(HashMap<V, R>),
    TimedOut,
    OutOfValues,
}

/// A bounded-parallel dispatcher that runs a worker against a lazily
/// produced stream of values, accumulating successes and failures until a
/// target success count is reached, a deadline expires, or the value
/// factory is exhausted.
///
/// Mirrors the reference `WorkerPool`: a producer task draws batches from
/// the value factory and schedules them on a bounded execution pool; a
/// result-processor task consumes outcomes and watches for the target
/// count; a deadline-watcher task races the timeout against cancellation.
/// The three coordination tasks never share an execution-pool slot with
/// user workers, so long-running workers can't starve them.
pub struct Pool<V, R>
where
    V: Eq + Hash + Clone + Send + Sync + 'static,
    R: Clone + Send + Sync + 'static,
{
    target_successes: usize,
    timeout: Duration,
    stagger: Duration,
    pool_size: usize,

    worker: WorkerFn<V, R>,
    factory: AsyncMutex<Option<Box<dyn ValueFactory<V> + Send>>>,

    successes: Arc<StdMutex<HashMap<V, R>>>,
    failures: Arc<StdMutex<HashMap<V, WorkerFailure>>>,
    started: Arc<AtomicUsize>,
    finished: Arc<AtomicUsize>,

    cancel_flag: Arc<AtomicBool>,
    cancel_notify: Arc<Notify>,

    target_slot: Arc<FutureSlot<TargetOutcome<V, R>>>,
    producer_error_slot: Arc<FutureSlot<FactoryError>>,

    exec_pool: Arc<AsyncMutex<JoinSet<()>>>,
    exec_pool_shutdown: Arc<OnceCell<()>>,

    tasks: AsyncMutex<Option<PoolTasks>>,
    joined_tx: watch::Sender<bool>,
    joined_rx: watch::Receiver<bool>,
}

struct PoolTasks {
    producer: tokio::task::JoinHandle<()>,
    processor: tokio::task::JoinHandle<()>,
    watcher: tokio::task::JoinHandle<()>,
}

/// Sleeps for `duration` unless the cancellation signal fires first.
///
/// `Notify::notified()` only wakes waiters that were already registered at
/// the time of the call; a notification sent between checking the flag and
/// awaiting the future would otherwise be lost. `enable()` closes that
/// window by registering the waiter eagerly, so a `cancel()` racing with
/// this call is never missed. Returns `true` if the sleep elapsed
/// undisturbed (i.e. a real timeout), `false` if cancellation won the race.
async fn sleep_unless_cancelled(duration: Duration, cancel_flag: &AtomicBool, cancel_notify: &Notify) -> bool {
    if cancel_flag.load(Ordering::SeqCst) {
        return false;
    }
    let notified = cancel_notify.notified();
    tokio::pin!(notified);
    notified.as_mut().enable();
    if cancel_flag.load(Ordering::SeqCst) {
        return false;
    }
    tokio::select! {
        _ = tokio::time::sleep(duration) => true,
        _ = notified => false,
    }
}

impl<V, R> Pool<V, R>
where
    V: Eq + Hash + Clone + Send + Sync + 'static,
    R: Clone + Send + Sync + 'static,
{
    pub fn new(
        worker: WorkerFn<V, R>,
        factory: Box<dyn ValueFactory<V> + Send>,
        target_successes: usize,
        timeout: Duration,
        stagger: Duration,
        pool_size: Option<usize>,
    ) -> Self {
        let (joined_tx, joined_rx) = watch::channel(false);
        Self {
            target_successes,
            timeout,
            stagger,
            pool_size: pool_size.unwrap_or(DEFAULT_POOL_SIZE),
            worker,
            factory: AsyncMutex::new(Some(factory)),
            successes: Arc::new(StdMutex::new(HashMap::new())),
            failures: Arc::new(StdMutex::new(HashMap::new())),
            started: Arc::new(AtomicUsize::new(0)),
            finished: Arc::new(AtomicUsize::new(0)),
            cancel_flag: Arc::new(AtomicBool::new(false)),
            cancel_notify: Arc::new(Notify::new()),
            target_slot: Arc::new(FutureSlot::new()),
            producer_error_slot: Arc::new(FutureSlot::new()),
            exec_pool: Arc::new(AsyncMutex::new(JoinSet::new())),
            exec_pool_shutdown: Arc::new(OnceCell::new()),
            tasks: AsyncMutex::new(None),
            joined_tx,
            joined_rx,
        }
    }

    /// Spawns the producer, result-processor and deadline-watcher tasks.
    /// Calling this more than once per instance is undefined behavior; we
    /// guard it with a debug assertion rather than an error since the
    /// contract explicitly leaves the choice to the implementer.
    pub async fn start(&self) {
        let factory = self
            .factory
            .lock()
            .await
            .take()
            .expect("Pool::start called more than once");

        let semaphore = Arc::new(Semaphore::new(self.pool_size));
        let (tx, rx) = mpsc::unbounded_channel();

        let producer = tokio::spawn(Self::producer_task(
            factory,
            self.worker.clone(),
            tx,
            semaphore,
            self.exec_pool.clone(),
            self.successes.clone(),
            self.started.clone(),
            self.cancel_flag.clone(),
            self.cancel_notify.clone(),
            self.stagger,
            self.producer_error_slot.clone(),
        ));

        let processor = tokio::spawn(Self::result_processor_task(
            rx,
            self.successes.clone(),
            self.failures.clone(),
            self.started.clone(),
            self.finished.clone(),
            self.target_successes,
            self.target_slot.clone(),
            self.cancel_flag.clone(),
            self.cancel_notify.clone(),
            self.exec_pool.clone(),
            self.exec_pool_shutdown.clone(),
        ));

        let watcher = tokio::spawn(Self::deadline_watcher_task(
            self.timeout,
            self.target_slot.clone(),
            self.cancel_flag.clone(),
            self.cancel_notify.clone(),
        ));

        *self.tasks.lock().await = Some(PoolTasks { producer, processor, watcher });
    }

    /// Sets the cancellation signal. Idempotent. Work items already
    /// enqueued but not yet started short-circuit to `Cancelled`; in-flight
    /// workers are allowed to finish normally.
    pub fn cancel(&self) {
        self.cancel_flag.store(true, Ordering::SeqCst);
        self.cancel_notify.notify_waiters();
    }

    /// Blocks until the producer, result-processor and deadline-watcher
    /// tasks have returned and the execution pool has drained. Safe to
    /// call more than once and from more than one task.
    pub async fn join(&self) -> Result<(), PoolError> {
        let mut guard = self.tasks.lock().await;
        if let Some(tasks) = guard.take() {
            drop(guard);
            let _ = tasks.producer.await;
            let _ = tasks.processor.await;
            let _ = tasks.watcher.await;
            self.shutdown_exec_pool().await;
            let _ = self.joined_tx.send(true);
        } else {
            drop(guard);
            let mut rx = self.joined_rx.clone();
            if !*rx.borrow() {
                let _ = rx.wait_for(|done| *done).await;
            }
        }
        self.check_producer_error()
    }

    /// Blocks on the target slot. Returns a snapshot of the successes map
    /// at the moment the target was reached.
    pub async fn block_until_target_successes(&self) -> Result<HashMap<V, R>, PoolError> {
        self.check_producer_error()?;
        match self.target_slot.get().await {
            TargetOutcome::Reached(map) => Ok(map),
            TargetOutcome::TimedOut => Err(self.timeout_error()),
            TargetOutcome::OutOfValues => Err(self.out_of_values_error()),
        }
    }

    pub fn get_successes(&self) -> HashMap<V, R> {
        self.successes.lock().expect("successes mutex poisoned").clone()
    }

    pub fn get_failures(&self) -> HashMap<V, WorkerFailure> {
        self.failures.lock().expect("failures mutex poisoned").clone()
    }

    fn check_producer_error(&self) -> Result<(), PoolError> {
        if let Some(err) = self.producer_error_slot.peek() {
            return Err(PoolError::ProducerError(err));
        }
        Ok(())
    }

    fn timeout_error(&self) -> PoolError {
        let failures = self.failures.lock().expect("failures mutex poisoned");
        PoolError::TimedOut {
            target: self.target_successes,
            failures: failures.len(),
            tracebacks: failures.values().map(|f| f.to_string()).collect(),
        }
    }

    fn out_of_values_error(&self) -> PoolError {
        let failures = self.failures.lock().expect("failures mutex poisoned");
        PoolError::OutOfValues {
            target: self.target_successes,
            failures: failures.len(),
            tracebacks: failures.values().map(|f| f.to_string()).collect(),
        }
    }

    async fn shutdown_exec_pool(&self) {
        let exec_pool = self.exec_pool.clone();
        self.exec_pool_shutdown
            .get_or_init(|| async move {
                let mut set = exec_pool.lock().await;
                while set.join_next().await.is_some() {}
            })
            .await;
    }

    #[allow(clippy::too_many_arguments)]
    async fn producer_task(
        mut factory: Box<dyn ValueFactory<V> + Send>,
        worker: WorkerFn<V, R>,
        queue: mpsc::UnboundedSender<WorkItem<V, R>>,
        semaphore: Arc<Semaphore>,
        exec_pool: Arc<AsyncMutex<JoinSet<()>>>,
        successes: Arc<StdMutex<HashMap<V, R>>>,
        started: Arc<AtomicUsize>,
        cancel_flag: Arc<AtomicBool>,
        cancel_notify: Arc<Notify>,
        stagger: Duration,
        producer_error_slot: Arc<FutureSlot<FactoryError>>,
    ) {
        loop {
            if cancel_flag.load(Ordering::SeqCst) {
                break;
            }

            let current_successes = successes.lock().expect("successes mutex poisoned").len();
            match factory.next_batch(current_successes) {
                Ok(Some(batch)) if !batch.is_empty() => {
                    started.fetch_add(batch.len(), Ordering::SeqCst);
                    for value in batch {
                        // Acquiring a permit is the bounded-parallel gate: the
                        // producer can't outrun `pool_size` concurrent workers.
                        let permit = match semaphore.clone().acquire_owned().await {
                            Ok(permit) => permit,
                            Err(_) => return, // semaphore closed, pool is tearing down
                        };
                        let worker = worker.clone();
                        let queue = queue.clone();
                        let cancel_flag = cancel_flag.clone();
                        exec_pool.lock().await.spawn(async move {
                            let outcome = if cancel_flag.load(Ordering::SeqCst) {
                                WorkItem::Cancelled
                            } else {
                                match worker(value.clone()).await {
                                    Ok(result) => WorkItem::Success(value, result),
                                    Err(err) => WorkItem::Failure(value, WorkerFailure::from_anyhow(&err)),
                                }
                            };
                            let _ = queue.send(outcome);
                            drop(permit);
                        });
                    }

                    if !stagger.is_zero() {
                        sleep_unless_cancelled(stagger, &cancel_flag, &cancel_notify).await;
                    }
                }
                Ok(_) => break, // None or an empty batch: exhaustion
                Err(err) => {
                    producer_error_slot.set(FactoryError::from_anyhow(&err));
                    cancel_flag.store(true, Ordering::SeqCst);
                    cancel_notify.notify_waiters();
                    break;
                }
            }
        }

        let _ = queue.send(WorkItem::ProducerStopped);
    }

    #[allow(clippy::too_many_arguments)]
    async fn result_processor_task(
        mut queue: mpsc::UnboundedReceiver<WorkItem<V, R>>,
        successes: Arc<StdMutex<HashMap<V, R>>>,
        failures: Arc<StdMutex<HashMap<V, WorkerFailure>>>,
        started: Arc<AtomicUsize>,
        finished: Arc<AtomicUsize>,
        target_successes: usize,
        target_slot: Arc<FutureSlot<TargetOutcome<V, R>>>,
        cancel_flag: Arc<AtomicBool>,
        cancel_notify: Arc<Notify>,
        exec_pool: Arc<AsyncMutex<JoinSet<()>>>,
        exec_pool_shutdown: Arc<OnceCell<()>>,
    ) {
        if target_successes == 0 {
            target_slot.set(TargetOutcome::Reached(HashMap::new()));
        }

        let mut producer_stopped = false;
        loop {
            if producer_stopped && finished.load(Ordering::SeqCst) == started.load(Ordering::SeqCst) {
                break;
            }

            match queue.recv().await {
                Some(WorkItem::Success(value, result)) => {
                    let snapshot = {
                        let mut map = successes.lock().expect("successes mutex poisoned");
                        map.insert(value, result);
                        if map.len() >= target_successes && !target_slot.is_set() {
                            Some(map.clone())
                        } else {
                            None
                        }
                    };
                    if let Some(snapshot) = snapshot {
                        target_slot.set(TargetOutcome::Reached(snapshot));
                    }
                    finished.fetch_add(1, Ordering::SeqCst);
                }
                Some(WorkItem::Failure(value, err)) => {
                    failures.lock().expect("failures mutex poisoned").insert(value, err);
                    finished.fetch_add(1, Ordering::SeqCst);
                }
                Some(WorkItem::Cancelled) => {
                    finished.fetch_add(1, Ordering::SeqCst);
                }
                Some(WorkItem::ProducerStopped) => producer_stopped = true,
                None => break,
            }
        }

        // Always cancel on the way out, successful or not: this is what
        // wakes the deadline-watcher promptly instead of making every
        // caller of `join()` wait out the full timeout.
        cancel_flag.store(true, Ordering::SeqCst);
        cancel_notify.notify_waiters();
        target_slot.set(TargetOutcome::OutOfValues);

        let exec_pool_for_shutdown = exec_pool.clone();
        exec_pool_shutdown
            .get_or_init(|| async move {
                let mut set = exec_pool_for_shutdown.lock().await;
                while set.join_next().await.is_some() {}
            })
            .await;
    }

    async fn deadline_watcher_task(
        timeout: Duration,
        target_slot: Arc<FutureSlot<TargetOutcome<V, R>>>,
        cancel_flag: Arc<AtomicBool>,
        cancel_notify: Arc<Notify>,
    ) {
        let timed_out = sleep_unless_cancelled(timeout, &cancel_flag, &cancel_notify).await;
        if timed_out {
            target_slot.set(TargetOutcome::TimedOut);
            cancel_flag.store(true, Ordering::SeqCst);
            cancel_notify.notify_waiters();
        }
    }
}
