//! In-process WebSocket server standing in for the backend's live endpoint.
//!
//! Tests push frames with [`MockLiveServer::push`]; every connected client
//! receives them. [`MockLiveServer::drop_connections`] closes every open
//! socket from the server side.

#![allow(dead_code)]

use std::net::SocketAddr;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use axum::extract::ws::{Message, WebSocket, WebSocketUpgrade};
use axum::extract::State;
use axum::http::header::AUTHORIZATION;
use axum::http::HeaderMap;
use axum::response::Response;
use axum::routing::get;
use axum::Router;
use tokio::sync::{broadcast, mpsc};

use logitrack_live::ChannelEvent;

#[derive(Debug, Clone)]
enum Push {
    Frame(String),
    Close,
}

#[derive(Clone)]
pub struct MockLiveServer {
    push: broadcast::Sender<Push>,
    connections: Arc<AtomicUsize>,
    authorization: Arc<Mutex<Vec<Option<String>>>>,
    pub addr: SocketAddr,
}

impl MockLiveServer {
    pub fn url(&self) -> String {
        format!("ws://{}", self.addr)
    }

    /// Send a text frame to every connected client.
    pub fn push(&self, text: impl Into<String>) {
        let _ = self.push.send(Push::Frame(text.into()));
    }

    pub fn drop_connections(&self) {
        let _ = self.push.send(Push::Close);
    }

    /// Total handshakes accepted so far.
    pub fn connection_count(&self) -> usize {
        self.connections.load(Ordering::SeqCst)
    }

    /// `Authorization` header of each handshake, in order.
    pub fn authorization_headers(&self) -> Vec<Option<String>> {
        self.authorization.lock().unwrap().clone()
    }
}

async fn upgrade(
    State(server): State<MockLiveServer>,
    headers: HeaderMap,
    ws: WebSocketUpgrade,
) -> Response {
    server.authorization.lock().unwrap().push(
        headers
            .get(AUTHORIZATION)
            .and_then(|v| v.to_str().ok())
            .map(str::to_string),
    );
    server.connections.fetch_add(1, Ordering::SeqCst);

    // Subscribe before the handshake completes so nothing pushed after the
    // client sees the connection open can be missed.
    let rx = server.push.subscribe();
    ws.on_upgrade(move |socket| serve(socket, rx))
}

async fn serve(mut socket: WebSocket, mut rx: broadcast::Receiver<Push>) {
    loop {
        tokio::select! {
            push = rx.recv() => {
                match push {
                    Ok(Push::Frame(text)) => {
                        if socket.send(Message::Text(text.into())).await.is_err() {
                            return;
                        }
                    }
                    Ok(Push::Close) | Err(_) => {
                        let _ = socket.send(Message::Close(None)).await;
                        return;
                    }
                }
            }
            incoming = socket.recv() => {
                match incoming {
                    Some(Ok(Message::Close(_))) | None | Some(Err(_)) => return,
                    Some(Ok(_)) => {}
                }
            }
        }
    }
}

pub async fn spawn_live_server() -> MockLiveServer {
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0")
        .await
        .expect("bind mock live server");
    let addr = listener.local_addr().expect("local addr");

    let (push, _) = broadcast::channel(64);
    let server = MockLiveServer {
        push,
        connections: Arc::new(AtomicUsize::new(0)),
        authorization: Arc::new(Mutex::new(Vec::new())),
        addr,
    };

    let app = Router::new()
        .route("/", get(upgrade))
        .with_state(server.clone());
    tokio::spawn(async move {
        axum::serve(listener, app).await.expect("serve mock live server");
    });

    server
}

/// Wait for the next channel event, failing the test after two seconds.
pub async fn next_event(events: &mut mpsc::UnboundedReceiver<ChannelEvent>) -> ChannelEvent {
    tokio::time::timeout(Duration::from_secs(2), events.recv())
        .await
        .expect("timed out waiting for channel event")
        .expect("channel event stream ended")
}
