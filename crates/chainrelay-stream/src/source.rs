//! `LogSource` / `LogSession` — abstraction over the upstream log stream.
//!
//! A source produces sessions; a session goes through subscribe once and
//! then yields notifications until it fails. The connector owns the
//! retry policy, sessions never reconnect on their own.

use async_trait::async_trait;
use chainrelay_core::UpstreamError;

use crate::config::LogsFilter;

/// One `logsNotification` payload.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct LogsNotification {
    pub slot: u64,
    pub signature: String,
    /// `true` when the transaction failed on chain
    pub failed: bool,
    /// Log lines in emission order
    pub logs: Vec<String>,
}

/// Opens connections to the upstream endpoint.
#[async_trait]
pub trait LogSource: Send + Sync {
    /// Endpoint identifier, used in logs.
    fn url(&self) -> &str;

    /// Open a new connection.
    async fn connect(&self) -> Result<Box<dyn LogSession>, UpstreamError>;
}

/// A single live upstream connection.
#[async_trait]
pub trait LogSession: Send {
    /// Request log notifications; returns the subscription id.
    async fn subscribe(&mut self, filter: &LogsFilter) -> Result<u64, UpstreamError>;

    /// Wait for the next notification. Any error ends the session.
    async fn recv(&mut self) -> Result<LogsNotification, UpstreamError>;
}
