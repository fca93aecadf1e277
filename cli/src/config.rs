//! Relay configuration file.

use std::path::Path;

use anyhow::{Context, Result};
use chainrelay_observability::LogConfig;
use chainrelay_server::ServerConfig;
use chainrelay_stream::UpstreamConfig;
use serde::{Deserialize, Serialize};

/// Top-level configuration. Every section is optional.
///
/// ```yaml
/// upstream:
///   ws_url: wss://api.mainnet-beta.solana.com
///   commitment: processed
///   reconnect_delay_ms: 2000
/// server:
///   listen_addr: 0.0.0.0:8080
///   path: /connect
/// log:
///   level: info
///   json: false
/// ```
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct RelayConfig {
    #[serde(default)]
    pub upstream: UpstreamConfig,
    #[serde(default)]
    pub server: ServerConfig,
    #[serde(default)]
    pub log: LogConfig,
}

impl RelayConfig {
    /// Read `path` as YAML, or use defaults when no file is given.
    pub fn load(path: Option<&Path>) -> Result<Self> {
        let Some(path) = path else {
            return Ok(Self::default());
        };
        let text = std::fs::read_to_string(path)
            .with_context(|| format!("reading config file {}", path.display()))?;
        Self::from_yaml(&text).with_context(|| format!("parsing config file {}", path.display()))
    }

    pub fn from_yaml(text: &str) -> Result<Self> {
        Ok(serde_yaml::from_str(text)?)
    }
}
