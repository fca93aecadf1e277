//! Hand-off seam between ingestion and fan-out.

use std::sync::Arc;

/// Receives serialized wire events.
///
/// `publish` must not block on delivery: the caller is the upstream read
/// loop, and it moves on to the next log line immediately.
pub trait EventSink: Send + Sync + 'static {
    fn publish(&self, message: Arc<str>);
}

impl<F> EventSink for F
where
    F: Fn(Arc<str>) + Send + Sync + 'static,
{
    fn publish(&self, message: Arc<str>) {
        self(message)
    }
}
