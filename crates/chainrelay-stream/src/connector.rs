//! `UpstreamConnector` — owns the upstream subscription for the life of the process.

use std::fmt;
use std::sync::Arc;
use std::time::Duration;

use chainrelay_core::{EventSink, LineError, LogPipeline, RelayMetrics, UpstreamError};
use tokio::sync::watch;
use tokio::task::JoinHandle;
use tracing::{debug, error, info, warn};

use crate::config::{LogsFilter, UpstreamConfig};
use crate::source::{LogSource, LogsNotification};

/// Connection lifecycle of the upstream subscription.
///
/// Any error moves back to `Disconnected`; the next `Connecting` follows
/// after the fixed reconnect delay. There is no terminal state.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConnectorState {
    Disconnected,
    Connecting,
    Subscribed,
    Streaming,
}

impl fmt::Display for ConnectorState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Disconnected => write!(f, "disconnected"),
            Self::Connecting => write!(f, "connecting"),
            Self::Subscribed => write!(f, "subscribed"),
            Self::Streaming => write!(f, "streaming"),
        }
    }
}

/// Long-running ingestion task: connect → subscribe → stream, forever.
pub struct UpstreamConnector {
    source: Arc<dyn LogSource>,
    filter: LogsFilter,
    reconnect_delay: Duration,
    pipeline: LogPipeline,
    sink: Arc<dyn EventSink>,
    metrics: Arc<RelayMetrics>,
    state: watch::Sender<ConnectorState>,
}

impl UpstreamConnector {
    pub fn new(source: Arc<dyn LogSource>, config: &UpstreamConfig, sink: Arc<dyn EventSink>) -> Self {
        let (state, _) = watch::channel(ConnectorState::Disconnected);
        Self {
            source,
            filter: config.logs_filter(),
            reconnect_delay: config.reconnect_delay(),
            pipeline: LogPipeline::default(),
            sink,
            metrics: Arc::new(RelayMetrics::new()),
            state,
        }
    }

    /// Replace the default log pipeline.
    pub fn with_pipeline(mut self, pipeline: LogPipeline) -> Self {
        self.pipeline = pipeline;
        self
    }

    pub fn metrics(&self) -> Arc<RelayMetrics> {
        Arc::clone(&self.metrics)
    }

    /// Watch the connection state.
    pub fn state(&self) -> watch::Receiver<ConnectorState> {
        self.state.subscribe()
    }

    /// Start the connector on the Tokio runtime.
    pub fn spawn(self) -> JoinHandle<()> {
        tokio::spawn(self.run())
    }

    /// Run the reconnect loop. Never returns.
    pub async fn run(self) {
        info!(
            url = %self.source.url(),
            program = %self.filter.program_id,
            commitment = %self.filter.commitment,
            "starting upstream connector"
        );

        loop {
            if let Err(e) = self.run_cycle().await {
                error!(error = %e, "upstream cycle failed");
            }
            self.set_state(ConnectorState::Disconnected);
            self.metrics.record_reconnect();

            let snapshot = self.metrics.snapshot();
            warn!(
                delay = ?self.reconnect_delay,
                events = snapshot.events_decoded,
                reconnections = snapshot.reconnections,
                "reconnecting to upstream"
            );
            tokio::time::sleep(self.reconnect_delay).await;
        }
    }

    /// One connect → subscribe → stream pass. Only returns on failure.
    async fn run_cycle(&self) -> Result<(), UpstreamError> {
        self.set_state(ConnectorState::Connecting);
        let mut session = self.source.connect().await?;

        let subscription = session.subscribe(&self.filter).await?;
        self.set_state(ConnectorState::Subscribed);
        info!(subscription, program = %self.filter.program_id, "subscribed to program logs");

        self.set_state(ConnectorState::Streaming);
        loop {
            let notification = session.recv().await?;
            self.handle_notification(notification);
        }
    }

    fn handle_notification(&self, notification: LogsNotification) {
        debug!(
            slot = notification.slot,
            signature = %notification.signature,
            lines = notification.logs.len(),
            "logs notification"
        );
        for line in &notification.logs {
            self.handle_line(line);
        }
    }

    fn handle_line(&self, line: &str) {
        self.metrics.record_line();

        let (wire, json) = match self.pipeline.serialize_line(line) {
            Ok(Some(encoded)) => encoded,
            Ok(None) => {
                self.metrics.record_skipped();
                return;
            }
            Err(e @ LineError::Serialize(_)) => {
                self.metrics.record_decode_error();
                error!(error = %e, "failed to serialize wire event");
                return;
            }
            Err(e) => {
                self.metrics.record_decode_error();
                warn!(error = %e, "failed to process log line");
                return;
            }
        };
        self.metrics.record_decoded();

        info!(name = %wire.name, symbol = %wire.symbol, mint = %wire.mint, "new token created");
        self.sink.publish(Arc::from(json));
        self.metrics.record_published();
    }

    fn set_state(&self, state: ConnectorState) {
        self.state.send_replace(state);
    }
}
