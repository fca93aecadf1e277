//! Loopback tests: real WebSocket clients against a running `RelayServer`.

use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;

use chainrelay_core::EventSink;
use chainrelay_server::{Broadcaster, ClientRegistry, RelayServer, ServerConfig, PONG_RESPONSE};
use futures::{SinkExt, StreamExt};
use tokio::net::{TcpListener, TcpStream};
use tokio::sync::oneshot;
use tokio_tungstenite::{connect_async, tungstenite::Message, MaybeTlsStream, WebSocketStream};

type Ws = WebSocketStream<MaybeTlsStream<TcpStream>>;

struct Harness {
    addr: SocketAddr,
    registry: ClientRegistry,
    broadcaster: Broadcaster,
    _shutdown: oneshot::Sender<()>,
}

async fn start() -> Harness {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    let registry = ClientRegistry::new();
    let broadcaster = Broadcaster::new(registry.clone());

    let (shutdown_tx, shutdown_rx) = oneshot::channel::<()>();
    let server = RelayServer::new(registry.clone(), ServerConfig::default());
    tokio::spawn(async move {
        server
            .serve(listener, async {
                let _ = shutdown_rx.await;
            })
            .await
            .unwrap();
    });

    Harness {
        addr,
        registry,
        broadcaster,
        _shutdown: shutdown_tx,
    }
}

async fn connect(addr: SocketAddr) -> Ws {
    let (ws, _) = connect_async(format!("ws://{addr}/connect")).await.unwrap();
    ws
}

async fn wait_for_clients(registry: &ClientRegistry, n: usize) {
    for _ in 0..200 {
        if registry.len() == n {
            return;
        }
        tokio::time::sleep(Duration::from_millis(10)).await;
    }
    panic!("expected {n} clients, registry has {}", registry.len());
}

async fn next_text(ws: &mut Ws) -> String {
    loop {
        let frame = tokio::time::timeout(Duration::from_secs(5), ws.next())
            .await
            .expect("timed out waiting for frame")
            .expect("stream ended")
            .expect("read error");
        if let Message::Text(text) = frame {
            return text;
        }
    }
}

#[tokio::test]
async fn every_client_receives_the_event() {
    let h = start().await;
    let mut clients = Vec::new();
    for _ in 0..5 {
        clients.push(connect(h.addr).await);
    }
    wait_for_clients(&h.registry, 5).await;

    let event = r#"{"name":"Foo","symbol":"FOO","uri":"ipfs://x","mint":"11111111111111111111111111111111"}"#;
    h.broadcaster.publish(Arc::from(event));

    for ws in &mut clients {
        let received = next_text(ws).await;
        assert_eq!(received, event);

        let value: serde_json::Value = serde_json::from_str(&received).unwrap();
        let fields: Vec<&str> = value.as_object().unwrap().keys().map(String::as_str).collect();
        assert_eq!(fields.len(), 4);
        for key in ["name", "symbol", "uri", "mint"] {
            assert!(value[key].is_string(), "missing {key}");
        }
    }
}

#[tokio::test]
async fn ping_is_answered_with_pong() {
    let h = start().await;
    let mut ws = connect(h.addr).await;
    wait_for_clients(&h.registry, 1).await;

    ws.send(Message::Text("ping".into())).await.unwrap();
    assert_eq!(next_text(&mut ws).await, PONG_RESPONSE);

    // Broadcasts keep flowing unchanged after the exchange.
    h.broadcaster.publish(Arc::from("{\"name\":\"A\"}"));
    assert_eq!(next_text(&mut ws).await, "{\"name\":\"A\"}");
}

#[tokio::test]
async fn disconnected_client_is_deregistered() {
    let h = start().await;
    let mut leaving = connect(h.addr).await;
    let mut staying = connect(h.addr).await;
    wait_for_clients(&h.registry, 2).await;

    leaving.close(None).await.unwrap();
    drop(leaving);
    wait_for_clients(&h.registry, 1).await;

    let report = h.broadcaster.broadcast(Arc::from("after"));
    assert_eq!(report.recipients, 1);
    assert_eq!(report.dropped, 0);
    assert_eq!(next_text(&mut staying).await, "after");
}

#[tokio::test]
async fn unknown_path_is_not_upgraded() {
    let h = start().await;
    let result = connect_async(format!("ws://{}/other", h.addr)).await;
    assert!(result.is_err());
    assert!(h.registry.is_empty());
}
