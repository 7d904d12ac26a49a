//! Periodic nonce-keyed pending transaction tracker: fee-bump speed-ups,
//! cancellation replacements, and disk-backed reconciliation across
//! restarts.

mod error;
mod policy;
mod state;
mod tracker;

pub use error::TrackerError;
pub use policy::{FeePolicy, BLOCK_INTERVAL, BLOCK_SAMPLE_SIZE};
pub use state::{read_state_file, PendingTx};
pub use tracker::{FinalizeHook, Tracker, TrackHook};
