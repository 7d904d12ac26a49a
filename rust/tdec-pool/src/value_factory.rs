use std::collections::VecDeque;

/// A lazy, batched source of input values for a [`crate::Pool`].
///
/// Called once per producer iteration with the current success count;
/// returns the next batch to schedule, or `None`/an empty vec to signal
/// exhaustion. Implementations that need to fail outright (e.g. a remote
/// catalog lookup backing the factory) should return `Err` — this aborts
/// the pool via the producer-error slot.
pub trait ValueFactory<V>: Send {
    fn next_batch(&mut self, current_successes: usize) -> anyhow::Result<Option<Vec<V>>>;
}

/// Hands out every value in a single batch, then signals exhaustion.
///
/// Grounded on the reference `AllAtOnceFactory`: useful for tests and for
/// callers that already know the full candidate set and don't need
/// staggered batching.
pub struct AllAtOnceFactory<V> {
    values: Option<Vec<V>>,
}

impl<V> AllAtOnceFactory<V> {
    pub fn new(values: Vec<V>) -> Self {
        Self { values: Some(values) }
    }
}

impl<V: Send> ValueFactory<V> for AllAtOnceFactory<V> {
    fn next_batch(&mut self, _current_successes: usize) -> anyhow::Result<Option<Vec<V>>> {
        Ok(self.values.take())
    }
}

/// Error returned when constructing a [`BatchValueFactory`] with an
/// inconsistent configuration.
#[derive(Debug, thiserror::Error)]
pub enum BatchFactoryConfigError {
    #[error("value list must not be empty")]
    EmptyValues,
    #[error("required_successes ({required}) exceeds the number of available values ({available})")]
    NotEnoughValues { required: usize, available: usize },
    #[error("batch_size must be greater than zero")]
    ZeroBatchSize,
}

/// Doles out values in batches, shrinking the batch size toward the
/// remaining shortfall (`required_successes - current_successes`) when no
/// fixed `batch_size` is configured, and returning fixed-size batches
/// otherwise (with a final, smaller remainder batch).
///
/// Once the caller reports `current_successes >= required_successes`, or
/// the value list is exhausted, every subsequent call returns `None`
/// without consuming further values.
pub struct BatchValueFactory<V> {
    remaining: VecDeque<V>,
    required_successes: usize,
    batch_size: Option<usize>,
}

impl<V> BatchValueFactory<V> {
    pub fn new(
        values: Vec<V>,
        required_successes: usize,
        batch_size: Option<usize>,
    ) -> Result<Self, BatchFactoryConfigError> {
        if values.is_empty() {
            return Err(BatchFactoryConfigError::EmptyValues);
        }
        if required_successes == 0 || required_successes > values.len() {
            return Err(BatchFactoryConfigError::NotEnoughValues {
                required: required_successes,
                available: values.len(),
            });
        }
        if let Some(0) = batch_size {
            return Err(BatchFactoryConfigError::ZeroBatchSize);
        }
        Ok(Self {
            remaining: values.into(),
            required_successes,
            batch_size,
        })
    }
}

impl<V: Send> ValueFactory<V> for BatchValueFactory<V> {
    fn next_batch(&mut self, current_successes: usize) -> anyhow::Result<Option<Vec<V>>> {
        let remaining_needed = self.required_successes.saturating_sub(current_successes);
        if remaining_needed == 0 || self.remaining.is_empty() {
            return Ok(None);
        }
        let effective_batch = self.batch_size.unwrap_or(remaining_needed);
        let take = effective_batch.min(self.remaining.len());
        let batch = self.remaining.drain(..take).collect();
        Ok(Some(batch))
    }
}
