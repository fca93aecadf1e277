//! # chainrelay-server
//!
//! Downstream half of ChainRelay: accepts WebSocket clients and fans every
//! published event out to all of them.
//!
//! ```text
//! GET /connect ──upgrade──► read loop (one task per client)
//!                              │ register / deregister
//!                              ▼
//!                        ClientRegistry ◄── snapshot ── Broadcaster ◄── EventSink::publish
//!                              │
//!                              ▼
//!                   per-client writer task (bounded queue, sole owner of the write half)
//! ```
//!
//! The registry is created once and handed to both the [`RelayServer`] and
//! the [`Broadcaster`]; nothing else is shared between them.

pub mod broadcast;
pub mod client;
pub mod config;
pub mod registry;
pub mod server;

pub use broadcast::{BroadcastReport, Broadcaster};
pub use client::{Client, ClientId, ClientSink, WriterConfig};
pub use config::ServerConfig;
pub use registry::ClientRegistry;
pub use server::{RelayServer, PING_KEYWORD, PONG_RESPONSE};
