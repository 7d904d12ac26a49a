//! tdec-cli library — exposed for testing.
//!
//! The binary entrypoint lives in `main.rs`; this crate only exists so
//! `tests/` can exercise the argument parsing and command dispatch
//! without spawning a subprocess.

#![deny(clippy::unwrap_used)]
#![deny(clippy::expect_used)]

pub mod cli;
pub mod error;
pub mod tracing;
