//! `RelayServer` — WebSocket endpoint for downstream clients.

use std::future::Future;
use std::net::SocketAddr;
use std::sync::Arc;

use axum::{
    extract::{
        ws::{Message, WebSocket, WebSocketUpgrade},
        ConnectInfo, State,
    },
    response::Response,
    routing::get,
    Router,
};
use futures::{Stream, StreamExt};
use tokio::net::TcpListener;
use tracing::{debug, info, warn};

use crate::client::{Client, ClientId, WriterConfig};
use crate::config::ServerConfig;
use crate::registry::ClientRegistry;

/// Inbound text containing this keyword is answered with [`PONG_RESPONSE`].
pub const PING_KEYWORD: &str = "ping";

/// Reply to an application-level ping.
pub const PONG_RESPONSE: &str = r#"{"message":"pong"}"#;

#[derive(Clone)]
struct ServerState {
    registry: ClientRegistry,
    writer: WriterConfig,
    pong: Arc<str>,
}

/// Accepts clients on the configured path and keeps the registry current.
///
/// No authentication and no origin check; connections are unlimited and
/// never time out.
pub struct RelayServer {
    registry: ClientRegistry,
    config: ServerConfig,
}

impl RelayServer {
    pub fn new(registry: ClientRegistry, config: ServerConfig) -> Self {
        Self { registry, config }
    }

    pub fn router(&self) -> Router {
        let state = ServerState {
            registry: self.registry.clone(),
            writer: self.config.writer_config(),
            pong: Arc::from(PONG_RESPONSE),
        };
        Router::new()
            .route(&self.config.path, get(ws_handler))
            .with_state(state)
    }

    /// Serve on `listener` until `shutdown` resolves.
    pub async fn serve<F>(self, listener: TcpListener, shutdown: F) -> std::io::Result<()>
    where
        F: Future<Output = ()> + Send + 'static,
    {
        info!(
            addr = %listener.local_addr()?,
            path = %self.config.path,
            "WebSocket server listening"
        );
        axum::serve(
            listener,
            self.router().into_make_service_with_connect_info::<SocketAddr>(),
        )
        .with_graceful_shutdown(shutdown)
        .await
    }
}

async fn ws_handler(
    ws: WebSocketUpgrade,
    ConnectInfo(addr): ConnectInfo<SocketAddr>,
    State(state): State<ServerState>,
) -> Response {
    ws.on_upgrade(move |socket| handle_socket(socket, addr, state))
}

async fn handle_socket(socket: WebSocket, addr: SocketAddr, state: ServerState) {
    let id = ClientId::from(addr);
    let (sink, stream) = socket.split();

    let client = Client::spawn(id.clone(), sink, &state.registry, &state.writer);
    if let Some(previous) = state.registry.put(Arc::clone(&client)) {
        info!(client = %id, replaced = previous.serial(), "client reconnected, replacing entry");
    }
    info!(client = %id, clients = state.registry.len(), "client connected");

    read_loop(&client, stream, &state.pong).await;

    state.registry.remove_if_current(&id, client.serial());
    info!(client = %id, clients = state.registry.len(), "client disconnected");
}

/// Consume inbound frames until the connection fails or closes.
async fn read_loop<S>(client: &Client, mut frames: S, pong: &Arc<str>)
where
    S: Stream<Item = Result<Message, axum::Error>> + Unpin,
{
    while let Some(frame) = frames.next().await {
        match frame {
            Ok(Message::Text(text)) => handle_inbound(client, &text, pong),
            Ok(Message::Binary(data)) => handle_inbound(client, &String::from_utf8_lossy(&data), pong),
            Ok(Message::Close(_)) => break,
            // protocol-level ping/pong is answered by the WebSocket layer
            Ok(_) => {}
            Err(e) => {
                debug!(client = %client.id(), error = %e, "read error");
                break;
            }
        }
    }
}

fn handle_inbound(client: &Client, text: &str, pong: &Arc<str>) {
    if !text.contains(PING_KEYWORD) {
        return;
    }
    if let Err(e) = client.enqueue(Arc::clone(pong)) {
        warn!(client = %client.id(), error = %e, "failed to queue pong");
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::client::test_support::channel_client;
    use futures::stream;

    fn text(s: &str) -> Result<Message, axum::Error> {
        Ok(Message::Text(s.to_owned()))
    }

    #[tokio::test]
    async fn ping_gets_pong_other_text_ignored() {
        let registry = ClientRegistry::new();
        let (client, mut rx) = channel_client("a", &registry, &WriterConfig::default());
        let pong: Arc<str> = Arc::from(PONG_RESPONSE);

        let frames = stream::iter(vec![
            text("hello"),
            text(r#"{"type":"ping"}"#),
            Ok(Message::Binary(b"ping".to_vec())),
            text("PING"),
        ]);
        read_loop(&client, frames, &pong).await;

        assert_eq!(rx.recv().await.unwrap(), PONG_RESPONSE);
        assert_eq!(rx.recv().await.unwrap(), PONG_RESPONSE);
        assert!(rx.try_recv().is_err());
    }

    #[tokio::test]
    async fn read_loop_stops_at_close() {
        let registry = ClientRegistry::new();
        let (client, mut rx) = channel_client("a", &registry, &WriterConfig::default());
        let pong: Arc<str> = Arc::from(PONG_RESPONSE);

        let frames = stream::iter(vec![Ok(Message::Close(None)), text("ping")]);
        read_loop(&client, frames, &pong).await;

        tokio::task::yield_now().await;
        assert!(rx.try_recv().is_err());
    }

    #[tokio::test]
    async fn read_loop_stops_at_error() {
        let registry = ClientRegistry::new();
        let (client, _rx) = channel_client("a", &registry, &WriterConfig::default());
        let pong: Arc<str> = Arc::from(PONG_RESPONSE);

        let frames = stream::iter(vec![Err(axum::Error::new("connection reset")), text("ping")]);
        read_loop(&client, frames, &pong).await;
    }
}
