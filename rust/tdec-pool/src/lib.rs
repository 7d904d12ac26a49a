//! Bounded-parallel worker pool with success-count gating.
//!
//! Runs a user-supplied worker against a lazily produced stream of input
//! values, accumulating successes and failures, and lets a caller block
//! until a target number of successes is reached, a deadline expires, or
//! the value stream is exhausted. Used to fan a request across a set of
//! peers where only a subset need to succeed.

mod error;
mod pool;
mod slot;
mod value_factory;

pub use error::{FactoryError, PoolError, WorkerFailure};
pub use pool::{Pool, WorkerFn, DEFAULT_POOL_SIZE};
pub use slot::FutureSlot;
pub use value_factory::{AllAtOnceFactory, BatchFactoryConfigError, BatchValueFactory, ValueFactory};
