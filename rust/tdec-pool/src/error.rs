use std::fmt;

/// Captured failure context for a single worker invocation.
///
/// Rust has no native traceback-reconstruction equivalent, so instead of
/// trying to preserve a backtrace object we flatten the `anyhow::Error`
/// cause chain into strings at the point of capture. That's enough for a
/// human to diagnose what went wrong without holding onto borrowed state.
#[derive(Debug, Clone)]
pub struct WorkerFailure {
    pub summary: String,
    pub chain: Vec<String>,
}

impl WorkerFailure {
    pub fn from_anyhow(err: &anyhow::Error) -> Self {
        Self {
            summary: err.to_string(),
            chain: err.chain().skip(1).map(|c| c.to_string()).collect(),
        }
    }
}

impl fmt::Display for WorkerFailure {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.summary)?;
        for cause in &self.chain {
            write!(f, "\n  caused by: {}", cause)?;
        }
        Ok(())
    }
}

impl std::error::Error for WorkerFailure {}

/// The value factory raised. Stored once in the producer-error slot and
/// re-raised verbatim by every subsequent call to `block_until_target_successes`
/// or `join`.
#[derive(Debug, Clone)]
pub struct FactoryError {
    pub summary: String,
    pub chain: Vec<String>,
}

impl FactoryError {
    pub fn from_anyhow(err: &anyhow::Error) -> Self {
        Self {
            summary: err.to_string(),
            chain: err.chain().skip(1).map(|c| c.to_string()).collect(),
        }
    }
}

impl fmt::Display for FactoryError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.summary)?;
        for cause in &self.chain {
            write!(f, "\n  caused by: {}", cause)?;
        }
        Ok(())
    }
}

impl std::error::Error for FactoryError {}

/// Errors surfaced by [`crate::Pool::block_until_target_successes`] and
/// [`crate::Pool::join`].
///
/// Distinguished by kind, not by type name, per the pool's contract: a
/// caller that wants to know "did we get enough successes" only needs to
/// match on this enum, not inspect a class hierarchy.
#[derive(Debug, Clone, thiserror::Error)]
pub enum PoolError {
    /// The deadline elapsed before `target_successes` were reached.
    #[error("timed out waiting for {target} successes ({failures} failures recorded)")]
    TimedOut { target: usize, failures: usize, tracebacks: Vec<String> },

    /// The value factory was exhausted before `target_successes` were reached.
    #[error("value factory exhausted before {target} successes ({failures} failures recorded)")]
    OutOfValues { target: usize, failures: usize, tracebacks: Vec<String> },

    /// The value factory raised. Carries the original error verbatim.
    #[error("value factory failed: {0}")]
    ProducerError(FactoryError),
}
