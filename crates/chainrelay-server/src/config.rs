//! Downstream server configuration.

use serde::{Deserialize, Serialize};

use crate::client::WriterConfig;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServerConfig {
    /// Socket address to listen on
    #[serde(default = "default_listen_addr")]
    pub listen_addr: String,
    /// WebSocket endpoint path
    #[serde(default = "default_path")]
    pub path: String,
    /// Messages buffered per client before new ones are dropped
    #[serde(default = "default_client_queue_capacity")]
    pub client_queue_capacity: usize,
    /// Deregister a client after this many consecutive failed writes.
    /// Unset: only a failed read deregisters a client.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub evict_after_write_failures: Option<u32>,
}

fn default_listen_addr() -> String { "0.0.0.0:8080".into() }
fn default_path() -> String { "/connect".into() }
fn default_client_queue_capacity() -> usize { 1_024 }

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            listen_addr: default_listen_addr(),
            path: default_path(),
            client_queue_capacity: default_client_queue_capacity(),
            evict_after_write_failures: None,
        }
    }
}

impl ServerConfig {
    pub fn writer_config(&self) -> WriterConfig {
        WriterConfig {
            queue_capacity: self.client_queue_capacity,
            evict_after_write_failures: self.evict_after_write_failures,
        }
    }
}
