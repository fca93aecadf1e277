//! Relay counters.

use std::sync::atomic::{AtomicU64, Ordering};

/// Point-in-time copy of [`RelayMetrics`].
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct MetricsSnapshot {
    pub lines_seen: u64,
    pub lines_skipped: u64,
    pub events_decoded: u64,
    pub decode_errors: u64,
    pub published: u64,
    pub reconnections: u64,
}

/// Lock-free counters shared by the upstream connector and its callers.
#[derive(Debug, Default)]
pub struct RelayMetrics {
    lines_seen: AtomicU64,
    lines_skipped: AtomicU64,
    events_decoded: AtomicU64,
    decode_errors: AtomicU64,
    published: AtomicU64,
    reconnections: AtomicU64,
}

impl RelayMetrics {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn record_line(&self) {
        self.lines_seen.fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_skipped(&self) {
        self.lines_skipped.fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_decoded(&self) {
        self.events_decoded.fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_decode_error(&self) {
        self.decode_errors.fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_published(&self) {
        self.published.fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_reconnect(&self) {
        self.reconnections.fetch_add(1, Ordering::Relaxed);
    }

    pub fn snapshot(&self) -> MetricsSnapshot {
        MetricsSnapshot {
            lines_seen: self.lines_seen.load(Ordering::Relaxed),
            lines_skipped: self.lines_skipped.load(Ordering::Relaxed),
            events_decoded: self.events_decoded.load(Ordering::Relaxed),
            decode_errors: self.decode_errors.load(Ordering::Relaxed),
            published: self.published.load(Ordering::Relaxed),
            reconnections: self.reconnections.load(Ordering::Relaxed),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn counters_accumulate() {
        let m = RelayMetrics::new();
        m.record_line();
        m.record_line();
        m.record_decoded();
        m.record_reconnect();
        let snap = m.snapshot();
        assert_eq!(snap.lines_seen, 2);
        assert_eq!(snap.events_decoded, 1);
        assert_eq!(snap.reconnections, 1);
        assert_eq!(snap.decode_errors, 0);
    }
}
