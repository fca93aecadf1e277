//! Upstream subscription configuration.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::time::Duration;

/// Ledger consistency level requested for log notifications.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Commitment {
    #[default]
    Processed,
    Confirmed,
    Finalized,
}

impl Commitment {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Processed => "processed",
            Self::Confirmed => "confirmed",
            Self::Finalized => "finalized",
        }
    }
}

impl fmt::Display for Commitment {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// `logsSubscribe` parameters: one mentioned program at one commitment.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LogsFilter {
    pub program_id: String,
    pub commitment: Commitment,
}

/// Configuration for the upstream connector.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UpstreamConfig {
    /// Solana PubSub endpoint, e.g. "wss://api.mainnet-beta.solana.com"
    #[serde(default = "default_ws_url")]
    pub ws_url: String,
    /// Program whose logs are subscribed to (`mentions` filter)
    #[serde(default = "default_program_id")]
    pub program_id: String,
    #[serde(default)]
    pub commitment: Commitment,
    /// Constant delay between a failure and the next connect attempt
    #[serde(default = "default_reconnect_delay_ms")]
    pub reconnect_delay_ms: u64,
}

fn default_ws_url() -> String { "wss://api.mainnet-beta.solana.com".into() }
fn default_program_id() -> String { "TSLvdd1pWpHVjahSpsvCXUbgwsL3JAcvokwaKt1eokM".into() }
fn default_reconnect_delay_ms() -> u64 { 2_000 }

impl Default for UpstreamConfig {
    fn default() -> Self {
        Self {
            ws_url: default_ws_url(),
            program_id: default_program_id(),
            commitment: Commitment::default(),
            reconnect_delay_ms: default_reconnect_delay_ms(),
        }
    }
}

impl UpstreamConfig {
    pub fn reconnect_delay(&self) -> Duration {
        Duration::from_millis(self.reconnect_delay_ms)
    }

    pub fn logs_filter(&self) -> LogsFilter {
        LogsFilter {
            program_id: self.program_id.clone(),
            commitment: self.commitment,
        }
    }
}
