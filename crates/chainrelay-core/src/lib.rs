//! # chainrelay-core
//!
//! Pure, I/O-free building blocks of the ChainRelay pipeline.
//!
//! Solana programs built with Anchor emit events as `Program data: <base64>`
//! log lines. The decoded bytes start with an 8-byte discriminator that
//! identifies the event type, followed by the Borsh-encoded event body.
//!
//! ```text
//! raw log line
//!       │  LogFilter (marker + "Program data: " prefix)
//!       ▼
//! base64 payload ──► bytes
//!       │  ProgramEvent::decode (discriminator table + Borsh)
//!       ▼
//! CreateEvent ──► WireEvent (base58 mint) ──► JSON ──► EventSink
//! ```
//!
//! - [`filter`] — marker/prefix scanning of one log line
//! - [`decoder`] — discriminator matching and Borsh decoding
//! - [`event`] — on-chain and wire event types
//! - [`pipeline`] — the full line → [`WireEvent`] path
//! - [`sink`] — the hand-off seam to the downstream broadcaster
//! - [`metrics`] — relay counters

pub mod decoder;
pub mod error;
pub mod event;
pub mod filter;
pub mod metrics;
pub mod pipeline;
pub mod sink;

pub use decoder::{decode_event, encode_event, ProgramEvent};
pub use error::{DecodeError, DeliveryError, LineError, UpstreamError};
pub use event::{AnchorEvent, CreateEvent, Pubkey, WireEvent};
pub use filter::LogFilter;
pub use metrics::{MetricsSnapshot, RelayMetrics};
pub use pipeline::LogPipeline;
pub use sink::EventSink;
