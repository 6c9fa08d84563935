//! Shared fixtures for the view tests.
//!
//! Two kinds of backend are provided:
//!
//! * [`ScriptedSource`]: a snapshot source whose every fetch blocks until
//!   the test answers it, so request/response interleavings can be forced.
//! * [`spawn_backend`]: an in-process `axum` server with the REST routes the
//!   pages use plus a `/ws` live endpoint. Assigning an order moves it out
//!   of the waiting list, as the real backend does.

#![allow(dead_code)]

use std::net::SocketAddr;
use std::sync::{Arc, Mutex};
use std::time::Duration;

use async_trait::async_trait;
use axum::extract::ws::{Message, WebSocket, WebSocketUpgrade};
use axum::extract::{Path, Request, State};
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::routing::{get, post};
use axum::{Json, Router};
use jsonwebtoken::{encode, EncodingKey, Header};
use serde_json::{json, Value};
use tokio::sync::{broadcast, mpsc, oneshot};

use logitrack_client::{ApiClient, ApiError};
use logitrack_core::orders::{Order, OrderStatus};
use logitrack_core::session::SessionStore;
use logitrack_core::token::decode_token;
use logitrack_core::types::DbId;
use logitrack_live::LiveClient;
use logitrack_views::{LiveOptions, Page, Reconciler, SnapshotSource};

pub const WAIT: Duration = Duration::from_secs(2);

pub fn order(id: DbId, status: OrderStatus) -> Order {
    Order {
        id,
        weight: Some(10.0),
        dimensions: None,
        product_type: None,
        destination_address: None,
        status,
        created_at: None,
    }
}

// ---------------------------------------------------------------------------
// Scripted snapshot source
// ---------------------------------------------------------------------------

pub type Responder = oneshot::Sender<Result<Vec<Order>, ApiError>>;

pub struct ScriptedSource {
    requests: mpsc::UnboundedSender<Responder>,
}

#[async_trait]
impl SnapshotSource for ScriptedSource {
    type Snapshot = Vec<Order>;

    fn context(&self) -> &'static str {
        "orders"
    }

    async fn fetch(&self) -> Result<Vec<Order>, ApiError> {
        let (tx, rx) = oneshot::channel();
        self.requests
            .send(tx)
            .map_err(|_| ApiError::InvalidResponse("script closed".into()))?;
        rx.await
            .map_err(|_| ApiError::InvalidResponse("request abandoned".into()))?
    }
}

/// Pending fetches, in the order they were issued.
pub struct Script {
    requests: mpsc::UnboundedReceiver<Responder>,
}

impl Script {
    pub async fn next_request(&mut self) -> Responder {
        tokio::time::timeout(WAIT, self.requests.recv())
            .await
            .expect("timed out waiting for a snapshot request")
            .expect("snapshot source dropped")
    }

    pub fn has_pending(&mut self) -> bool {
        !self.requests.is_empty()
    }
}

pub fn scripted_source() -> (ScriptedSource, Script) {
    let (tx, rx) = mpsc::unbounded_channel();
    (ScriptedSource { requests: tx }, Script { requests: rx })
}

/// Wait until `check` holds for the page's view, failing after [`WAIT`].
pub async fn wait_for_view<R: Reconciler>(page: &Page<R>, check: impl Fn(&R) -> bool) {
    let mut changes = page.changes();
    let deadline = tokio::time::Instant::now() + WAIT;
    while !page.view(&check).await {
        tokio::time::timeout_at(deadline, changes.changed())
            .await
            .expect("timed out waiting for view state")
            .expect("page dropped");
    }
}

// ---------------------------------------------------------------------------
// Mock backend
// ---------------------------------------------------------------------------

#[derive(Clone)]
pub struct MockBackend {
    waiting: Arc<Mutex<Vec<Value>>>,
    assignments: Arc<Mutex<Vec<(DbId, Value)>>>,
    live: broadcast::Sender<String>,
    pub addr: SocketAddr,
}

impl MockBackend {
    pub fn api_url(&self) -> String {
        format!("http://{}/api", self.addr)
    }

    pub fn ws_url(&self) -> String {
        format!("ws://{}/ws", self.addr)
    }

    /// Assignment bodies received, keyed by order id.
    pub fn assignments(&self) -> Vec<(DbId, Value)> {
        self.assignments.lock().unwrap().clone()
    }

    /// Send a frame to every connected live client.
    pub fn push(&self, frame: impl Into<String>) {
        let _ = self.live.send(frame.into());
    }

    pub fn live_clients(&self) -> usize {
        self.live.receiver_count()
    }
}

pub fn order_json(id: DbId, weight: f64, status: &str) -> Value {
    json!({
        "id": id,
        "weight": weight,
        "dimensions": "30x20x10",
        "product_type": "Electrónica",
        "destination_address": "Calle Falsa 123",
        "status": status,
        "created_at": "2024-05-01T10:00:00Z"
    })
}

async fn list_orders(State(backend): State<MockBackend>, request: Request) -> Json<Value> {
    let waiting = backend.waiting.lock().unwrap().clone();
    if request.uri().query().is_some_and(|q| q.contains("status=")) {
        Json(json!({ "data": waiting }))
    } else {
        let mut all = waiting;
        all.push(order_json(30, 5.0, "Entregado"));
        Json(Value::Array(all))
    }
}

async fn shipment_history() -> Json<Value> {
    Json(json!([order_json(30, 5.0, "Entregado")]))
}

async fn order_status(Path(id): Path<DbId>) -> Response {
    if id == 404 {
        return (
            StatusCode::NOT_FOUND,
            Json(json!({ "message": "Orden no encontrada" })),
        )
            .into_response();
    }
    Json(json!({ "status": "En tránsito" })).into_response()
}

async fn order_history(Path(_id): Path<DbId>) -> Json<Value> {
    Json(json!({
        "history": [
            { "status": "En espera", "changed_at": "2024-05-01T10:00:00Z" },
            { "status": "En tránsito", "changed_at": "2024-05-01T12:00:00Z" }
        ]
    }))
}

async fn assign(
    State(backend): State<MockBackend>,
    Path(id): Path<DbId>,
    Json(body): Json<Value>,
) -> Json<Value> {
    backend.waiting.lock().unwrap().retain(|o| o["id"] != json!(id));
    backend.assignments.lock().unwrap().push((id, body));
    Json(json!({ "message": "ok" }))
}

async fn carriers() -> Json<Value> {
    Json(json!([
        { "id": 1, "name": "Rápido SA", "capacity": 100 },
        { "id": 2, "name": "Norte", "capacity": 20 }
    ]))
}

async fn routes() -> Json<Value> {
    Json(json!([{ "id": 4, "name": "Bogotá - Medellín" }]))
}

async fn upgrade(State(backend): State<MockBackend>, ws: WebSocketUpgrade) -> Response {
    let rx = backend.live.subscribe();
    ws.on_upgrade(move |socket| serve_live(socket, rx))
}

async fn serve_live(mut socket: WebSocket, mut rx: broadcast::Receiver<String>) {
    loop {
        tokio::select! {
            frame = rx.recv() => {
                match frame {
                    Ok(text) => {
                        if socket.send(Message::Text(text.into())).await.is_err() {
                            return;
                        }
                    }
                    Err(_) => return,
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

/// Start a backend whose waiting list holds order 1 (12 kg) and order 2
/// (50 kg). Carriers: 1 (100 kg) and 2 (20 kg). Route: 4.
pub async fn spawn_backend() -> MockBackend {
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0")
        .await
        .expect("bind mock backend");
    let addr = listener.local_addr().expect("local addr");

    let (live, _) = broadcast::channel(64);
    let backend = MockBackend {
        waiting: Arc::new(Mutex::new(vec![
            order_json(1, 12.0, "En espera"),
            order_json(2, 50.0, "En espera"),
        ])),
        assignments: Arc::new(Mutex::new(Vec::new())),
        live,
        addr,
    };

    let api = Router::new()
        .route("/orders", get(list_orders))
        .route("/orders/history", get(shipment_history))
        .route("/orders/{id}/status", get(order_status))
        .route("/orders/{id}/history", get(order_history))
        .route("/orders/{id}/assign", post(assign))
        .route("/transportistas/available", get(carriers))
        .route("/rutas", get(routes));

    let app = Router::new()
        .nest("/api", api)
        .route("/ws", get(upgrade))
        .with_state(backend.clone());
    tokio::spawn(async move {
        axum::serve(listener, app).await.expect("serve mock backend");
    });

    backend
}

// ---------------------------------------------------------------------------
// Sessions
// ---------------------------------------------------------------------------

pub fn mint_token(id: DbId, email: &str, role: &str) -> String {
    let claims = json!({ "id": id, "email": email, "role": role, "exp": 4_102_444_800_i64 });
    encode(
        &Header::default(),
        &claims,
        &EncodingKey::from_secret(b"backend-secret"),
    )
    .expect("mint token")
}

/// A session store signed in with the given role (or anonymous for `None`).
pub fn session(role: Option<&str>) -> Arc<SessionStore> {
    let store = SessionStore::in_memory();
    if let Some(role) = role {
        let token = mint_token(7, "ana@example.com", role);
        let user = decode_token(&token).expect("decode minted token");
        store.login(token, user);
    }
    Arc::new(store)
}

pub fn api(backend: &MockBackend, role: Option<&str>) -> Arc<ApiClient> {
    Arc::new(ApiClient::new(backend.api_url(), session(role)))
}

pub fn live_options(backend: &MockBackend, api: &ApiClient) -> LiveOptions {
    LiveOptions {
        client: LiveClient::new(backend.ws_url()).with_session(Arc::clone(api.session())),
        reconnect: None,
    }
}

/// Wait until the backend has a live subscriber.
pub async fn wait_for_live_client(backend: &MockBackend) {
    let deadline = tokio::time::Instant::now() + WAIT;
    while backend.live_clients() == 0 {
        assert!(
            tokio::time::Instant::now() < deadline,
            "no live client connected"
        );
        tokio::time::sleep(Duration::from_millis(10)).await;
    }
}
