//! `SolanaWsSource` — `LogSource` over the Solana JSON-RPC PubSub WebSocket.

use async_trait::async_trait;
use chainrelay_core::UpstreamError;
use futures::{SinkExt, StreamExt};
use serde_json::Value;
use tokio::net::TcpStream;
use tokio_tungstenite::{connect_async, tungstenite::Message, MaybeTlsStream, WebSocketStream};
use tracing::{debug, info};

use crate::config::LogsFilter;
use crate::source::{LogSession, LogSource, LogsNotification};

type WsStream = WebSocketStream<MaybeTlsStream<TcpStream>>;

const SUBSCRIBE_REQUEST_ID: u64 = 1;

/// Solana PubSub log source.
pub struct SolanaWsSource {
    url: String,
}

impl SolanaWsSource {
    /// `url` is a `ws://` or `wss://` PubSub endpoint.
    pub fn new(url: impl Into<String>) -> Self {
        Self { url: url.into() }
    }
}

#[async_trait]
impl LogSource for SolanaWsSource {
    fn url(&self) -> &str {
        &self.url
    }

    async fn connect(&self) -> Result<Box<dyn LogSession>, UpstreamError> {
        let (ws, _) = connect_async(&self.url)
            .await
            .map_err(|e| UpstreamError::Connect {
                url: self.url.clone(),
                reason: e.to_string(),
            })?;
        info!(url = %self.url, "upstream WebSocket connected");
        Ok(Box::new(SolanaWsSession {
            ws,
            subscription: None,
        }))
    }
}

struct SolanaWsSession {
    ws: WsStream,
    subscription: Option<u64>,
}

impl SolanaWsSession {
    /// Next text frame, answering pings on the way.
    async fn next_text(&mut self) -> Result<String, String> {
        loop {
            match self.ws.next().await {
                None => return Err("stream ended".into()),
                Some(Err(e)) => return Err(e.to_string()),
                Some(Ok(Message::Text(text))) => return Ok(text),
                Some(Ok(Message::Ping(data))) => {
                    self.ws
                        .send(Message::Pong(data))
                        .await
                        .map_err(|e| e.to_string())?;
                }
                Some(Ok(Message::Close(frame))) => {
                    return Err(match frame {
                        Some(f) => format!("closed by server: {} {}", f.code, f.reason),
                        None => "closed by server".into(),
                    });
                }
                Some(Ok(_)) => {} // binary / pong
            }
        }
    }
}

#[async_trait]
impl LogSession for SolanaWsSession {
    async fn subscribe(&mut self, filter: &LogsFilter) -> Result<u64, UpstreamError> {
        let request = logs_subscribe_request(SUBSCRIBE_REQUEST_ID, filter);
        self.ws
            .send(Message::Text(request.to_string()))
            .await
            .map_err(|e| UpstreamError::Subscribe { reason: e.to_string() })?;

        loop {
            let text = self
                .next_text()
                .await
                .map_err(|reason| UpstreamError::Subscribe { reason })?;
            if let Some(reply) = parse_subscribe_reply(&text, SUBSCRIBE_REQUEST_ID) {
                let id = reply?;
                self.subscription = Some(id);
                return Ok(id);
            }
            debug!("ignoring frame while awaiting subscribe reply");
        }
    }

    async fn recv(&mut self) -> Result<LogsNotification, UpstreamError> {
        loop {
            let text = self
                .next_text()
                .await
                .map_err(|reason| UpstreamError::Receive { reason })?;
            if let Some(notification) = parse_logs_notification(&text, self.subscription) {
                return Ok(notification);
            }
        }
    }
}

// ─── Wire format ──────────────────────────────────────────────────────────────

/// Build the `logsSubscribe` request for `filter`.
pub fn logs_subscribe_request(id: u64, filter: &LogsFilter) -> Value {
    serde_json::json!({
        "jsonrpc": "2.0",
        "id": id,
        "method": "logsSubscribe",
        "params": [
            { "mentions": [filter.program_id] },
            { "commitment": filter.commitment.as_str() }
        ]
    })
}

/// Interpret a reply to request `id`.
///
/// Returns `None` for frames that are not the reply to `id`.
fn parse_subscribe_reply(text: &str, id: u64) -> Option<Result<u64, UpstreamError>> {
    let v: Value = serde_json::from_str(text).ok()?;
    if v.get("id")?.as_u64()? != id {
        return None;
    }

    if let Some(err) = v.get("error") {
        let code = err.get("code").and_then(Value::as_i64).unwrap_or_default();
        let message = err.get("message").and_then(Value::as_str).unwrap_or("unknown error");
        return Some(Err(UpstreamError::Subscribe {
            reason: format!("RPC error {code}: {message}"),
        }));
    }

    Some(
        v.get("result")
            .and_then(Value::as_u64)
            .ok_or_else(|| UpstreamError::Subscribe {
                reason: format!("unexpected subscribe result: {text}"),
            }),
    )
}

/// Parse a `logsNotification` frame.
///
/// Returns `None` for other methods, malformed frames, and notifications
/// addressed to a subscription other than `subscription` (when known).
fn parse_logs_notification(text: &str, subscription: Option<u64>) -> Option<LogsNotification> {
    let v: Value = serde_json::from_str(text).ok()?;
    if v.get("method")?.as_str()? != "logsNotification" {
        return None;
    }

    let params = v.get("params")?;
    if let (Some(expected), Some(got)) = (subscription, params.get("subscription").and_then(Value::as_u64)) {
        if expected != got {
            return None;
        }
    }

    let result = params.get("result")?;
    let value = result.get("value")?;
    let logs = value
        .get("logs")
        .and_then(Value::as_array)
        .map(|lines| {
            lines
                .iter()
                .filter_map(|l| l.as_str().map(String::from))
                .collect()
        })
        .unwrap_or_default();

    Some(LogsNotification {
        slot: result
            .get("context")
            .and_then(|c| c.get("slot"))
            .and_then(Value::as_u64)
            .unwrap_or(0),
        signature: value
            .get("signature")
            .and_then(Value::as_str)
            .unwrap_or_default()
            .to_string(),
        failed: value.get("err").is_some_and(|e| !e.is_null()),
        logs,
    })
}

// ─── Tests ────────────────────────────────────────────────────────────────────
