//! Error types for the ChainRelay pipeline.

use thiserror::Error;

/// Errors raised while decoding a discriminator-tagged event payload.
#[derive(Debug, Error)]
pub enum DecodeError {
    #[error("Discriminator mismatch for {event}: expected {expected:?}, got {got:?}")]
    DiscriminatorMismatch {
        event: &'static str,
        expected: [u8; 8],
        got: Vec<u8>,
    },

    #[error("Borsh decode of {event} failed: {reason}")]
    Borsh { event: &'static str, reason: String },

    #[error("Invalid public key: {reason}")]
    InvalidPubkey { reason: String },
}

/// Errors raised while turning one raw log line into a wire event.
///
/// None of these outlive the line that caused them.
#[derive(Debug, Error)]
pub enum LineError {
    #[error("Log line carries the event marker but no program data")]
    MissingProgramData,

    #[error("Program data is not valid base64: {0}")]
    Base64(#[from] base64::DecodeError),

    #[error(transparent)]
    Decode(#[from] DecodeError),

    #[error("Failed to serialize wire event: {0}")]
    Serialize(#[from] serde_json::Error),
}

/// Errors from the upstream log subscription. All of them are transient.
#[derive(Debug, Error)]
pub enum UpstreamError {
    #[error("Upstream connection failed: {url}: {reason}")]
    Connect { url: String, reason: String },

    #[error("Log subscription failed: {reason}")]
    Subscribe { reason: String },

    #[error("Receive failed: {reason}")]
    Receive { reason: String },

    #[error("Upstream closed the stream")]
    Closed,
}

/// Errors delivering one message to one downstream client.
#[derive(Debug, Error)]
pub enum DeliveryError {
    #[error("Write to client failed: {0}")]
    Write(String),

    #[error("Client outbound queue is full")]
    QueueFull,

    #[error("Client connection closed")]
    Closed,
}
