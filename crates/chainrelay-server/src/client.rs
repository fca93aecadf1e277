//! A connected downstream client and its writer task.
//!
//! Every write to a client's connection goes through one bounded queue
//! drained by one task that owns the write half. That task is the
//! client's write lock: broadcasts and pong replies can never interleave,
//! and each client sees messages in the order they were queued.

use std::fmt;
use std::net::SocketAddr;
use std::sync::Arc;

use async_trait::async_trait;
use axum::extract::ws::{Message, WebSocket};
use chainrelay_core::DeliveryError;
use futures::stream::SplitSink;
use futures::SinkExt;
use tokio::sync::mpsc::{self, error::TrySendError};
use tracing::{debug, warn};

use crate::registry::ClientRegistry;

/// Connection identity: the remote socket address.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct ClientId(String);

impl ClientId {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl From<SocketAddr> for ClientId {
    fn from(addr: SocketAddr) -> Self {
        Self(addr.to_string())
    }
}

impl fmt::Display for ClientId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Write half of a client connection.
#[async_trait]
pub trait ClientSink: Send + 'static {
    async fn send_text(&mut self, text: &str) -> Result<(), DeliveryError>;
}

#[async_trait]
impl ClientSink for SplitSink<WebSocket, Message> {
    async fn send_text(&mut self, text: &str) -> Result<(), DeliveryError> {
        self.send(Message::Text(text.to_owned()))
            .await
            .map_err(|e| DeliveryError::Write(e.to_string()))
    }
}

/// Per-client writer settings.
#[derive(Debug, Clone)]
pub struct WriterConfig {
    pub queue_capacity: usize,
    pub evict_after_write_failures: Option<u32>,
}

impl Default for WriterConfig {
    fn default() -> Self {
        Self {
            queue_capacity: 1_024,
            evict_after_write_failures: None,
        }
    }
}

/// A registered downstream connection.
pub struct Client {
    id: ClientId,
    serial: u64,
    outbound: mpsc::Sender<Arc<str>>,
}

impl fmt::Debug for Client {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Client")
            .field("id", &self.id)
            .field("serial", &self.serial)
            .finish()
    }
}

impl Client {
    /// Create a client around `sink` and start its writer task.
    ///
    /// The client is not registered; the caller decides when to `put` it.
    pub fn spawn<S: ClientSink>(
        id: ClientId,
        sink: S,
        registry: &ClientRegistry,
        config: &WriterConfig,
    ) -> Arc<Self> {
        let serial = registry.next_serial();
        let (outbound, rx) = mpsc::channel(config.queue_capacity.max(1));

        tokio::spawn(write_loop(
            id.clone(),
            serial,
            sink,
            rx,
            registry.clone(),
            config.evict_after_write_failures,
        ));

        Arc::new(Self { id, serial, outbound })
    }

    pub fn id(&self) -> &ClientId {
        &self.id
    }

    /// Distinguishes successive connections that share an id.
    pub fn serial(&self) -> u64 {
        self.serial
    }

    /// Queue `message` for delivery without waiting for the write.
    pub fn enqueue(&self, message: Arc<str>) -> Result<(), DeliveryError> {
        self.outbound.try_send(message).map_err(|e| match e {
            TrySendError::Full(_) => DeliveryError::QueueFull,
            TrySendError::Closed(_) => DeliveryError::Closed,
        })
    }
}

/// Consecutive write failures of one client.
#[derive(Debug)]
struct WriteFailures {
    consecutive: u32,
    evict_after: Option<u32>,
}

impl WriteFailures {
    fn new(evict_after: Option<u32>) -> Self {
        Self {
            consecutive: 0,
            evict_after,
        }
    }

    fn reset(&mut self) {
        self.consecutive = 0;
    }

    /// Count one failure; `true` once the client should be evicted.
    fn record(&mut self) -> bool {
        self.consecutive = self.consecutive.saturating_add(1);
        self.evict_after.is_some_and(|limit| self.consecutive >= limit)
    }
}

async fn write_loop<S: ClientSink>(
    id: ClientId,
    serial: u64,
    mut sink: S,
    mut rx: mpsc::Receiver<Arc<str>>,
    registry: ClientRegistry,
    evict_after: Option<u32>,
) {
    let mut failures = WriteFailures::new(evict_after);

    while let Some(message) = rx.recv().await {
        match sink.send_text(&message).await {
            Ok(()) => failures.reset(),
            Err(e) => {
                let evict = failures.record();
                warn!(
                    client = %id,
                    error = %e,
                    consecutive_failures = failures.consecutive,
                    "failed to send message to client"
                );

                if evict {
                    if registry.remove_if_current(&id, serial) {
                        warn!(client = %id, "evicted client after repeated write failures");
                    }
                    break;
                }
            }
        }
    }

    debug!(client = %id, serial, "client writer stopped");
}

#[cfg(test)]
pub(crate) mod test_support {
    use super::*;

    /// Sink that forwards every frame to a channel.
    pub struct ChannelSink(pub mpsc::UnboundedSender<String>);

    #[async_trait]
    impl ClientSink for ChannelSink {
        async fn send_text(&mut self, text: &str) -> Result<(), DeliveryError> {
            self.0.send(text.to_owned()).map_err(|_| DeliveryError::Closed)
        }
    }

    /// Sink whose every write fails.
    pub struct BrokenSink;

    #[async_trait]
    impl ClientSink for BrokenSink {
        async fn send_text(&mut self, _text: &str) -> Result<(), DeliveryError> {
            Err(DeliveryError::Write("broken pipe".into()))
        }
    }

    pub fn channel_client(
        id: &str,
        registry: &ClientRegistry,
        config: &WriterConfig,
    ) -> (Arc<Client>, mpsc::UnboundedReceiver<String>) {
        let (tx, rx) = mpsc::unbounded_channel();
        let client = Client::spawn(ClientId::new(id), ChannelSink(tx), registry, config);
        (client, rx)
    }
}
