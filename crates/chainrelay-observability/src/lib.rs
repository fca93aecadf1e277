//! # chainrelay-observability
//!
//! Logging setup shared by ChainRelay binaries. Library crates only emit
//! `tracing` events; installing a subscriber is the binary's job.

pub mod tracing_setup;

pub use tracing_setup::{init_tracing, LogConfig};
