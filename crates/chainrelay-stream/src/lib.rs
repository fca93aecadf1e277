//! # chainrelay-stream
//!
//! Upstream half of ChainRelay: a Solana `logsSubscribe` subscription that
//! never gives up.
//!
//! ## Architecture
//! ```text
//! UpstreamConnector (one Tokio task)
//!       │  connect ─► subscribe ─► recv loop
//!       │  (any error: wait reconnect_delay, start over)
//!       ▼
//! LogsNotification.logs
//!       │  LogPipeline::process_line, one line at a time
//!       ▼
//! WireEvent JSON ─► EventSink::publish (fire-and-forget)
//! ```

pub mod config;
pub mod connector;
pub mod source;
pub mod ws_source;

pub use config::{Commitment, LogsFilter, UpstreamConfig};
pub use connector::{ConnectorState, UpstreamConnector};
pub use source::{LogSession, LogSource, LogsNotification};
pub use ws_source::SolanaWsSource;
