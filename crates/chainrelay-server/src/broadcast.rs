//! `Broadcaster` — fan one serialized event out to every connected client.

use std::sync::Arc;

use chainrelay_core::{DeliveryError, EventSink};
use tracing::{debug, warn};

use crate::registry::ClientRegistry;

/// Outcome of one broadcast.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct BroadcastReport {
    /// Clients in the snapshot
    pub recipients: usize,
    /// Messages queued for delivery
    pub queued: usize,
    /// Clients skipped because their queue was full or closed
    pub dropped: usize,
}

/// Delivers messages to the clients of a [`ClientRegistry`].
#[derive(Clone)]
pub struct Broadcaster {
    registry: ClientRegistry,
}

impl Broadcaster {
    pub fn new(registry: ClientRegistry) -> Self {
        Self { registry }
    }

    /// Queue `message` for every client currently registered.
    ///
    /// Never waits on a client: each one has its own writer, so a slow or
    /// broken connection only loses its own copy.
    pub fn broadcast(&self, message: Arc<str>) -> BroadcastReport {
        let clients = self.registry.snapshot();
        let mut report = BroadcastReport {
            recipients: clients.len(),
            ..Default::default()
        };

        for client in clients {
            match client.enqueue(Arc::clone(&message)) {
                Ok(()) => report.queued += 1,
                Err(e @ DeliveryError::QueueFull) => {
                    report.dropped += 1;
                    warn!(client = %client.id(), error = %e, "dropping message for slow client");
                }
                Err(e) => {
                    report.dropped += 1;
                    debug!(client = %client.id(), error = %e, "client writer gone");
                }
            }
        }
        report
    }
}

impl EventSink for Broadcaster {
    fn publish(&self, message: Arc<str>) {
        let report = self.broadcast(message);
        debug!(
            recipients = report.recipients,
            queued = report.queued,
            dropped = report.dropped,
            "broadcast event"
        );
    }
}
