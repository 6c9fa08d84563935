//! In-process mock of the LogiTrack REST backend.
//!
//! Every request that reaches the mock is recorded (method, path, query,
//! `Authorization` header and JSON body) so tests can assert on what the
//! client actually sent.

#![allow(dead_code)]

use std::net::SocketAddr;
use std::sync::{Arc, Mutex};

use axum::body::{to_bytes, Body};
use axum::extract::{Path, Request, State};
use axum::http::header::AUTHORIZATION;
use axum::http::StatusCode;
use axum::middleware::{self, Next};
use axum::response::{IntoResponse, Response};
use axum::routing::{get, post};
use axum::{Json, Router};
use jsonwebtoken::{encode, EncodingKey, Header};
use serde_json::{json, Value};

use logitrack_client::ApiClient;
use logitrack_core::session::SessionStore;

pub const PASSWORD: &str = "secret";
/// Logging in with this email yields a 2xx response without a token.
pub const NO_TOKEN_EMAIL: &str = "notoken@example.com";
/// Logging in with this email yields a token that is not a JWT.
pub const BAD_TOKEN_EMAIL: &str = "badtoken@example.com";
/// Order id the mock answers with 404.
pub const MISSING_ORDER: i64 = 999;
/// Product type the backend refuses on `POST /orders`.
pub const REJECTED_PRODUCT: &str = "Explosivos";

#[derive(Debug, Clone)]
pub struct RecordedRequest {
    pub method: String,
    pub path: String,
    pub query: Option<String>,
    pub authorization: Option<String>,
    pub body: Option<Value>,
}

#[derive(Clone, Default)]
pub struct MockBackend {
    requests: Arc<Mutex<Vec<RecordedRequest>>>,
}

impl MockBackend {
    pub fn requests(&self) -> Vec<RecordedRequest> {
        self.requests.lock().unwrap().clone()
    }

    pub fn last_request(&self) -> RecordedRequest {
        self.requests().last().cloned().expect("no request recorded")
    }
}

/// Mint a signed token the way the backend does.
pub fn mint_token(id: i64, email: &str, role: &str) -> String {
    let claims = json!({ "id": id, "email": email, "role": role, "exp": 4_102_444_800_i64 });
    encode(
        &Header::default(),
        &claims,
        &EncodingKey::from_secret(b"backend-secret"),
    )
    .expect("mint token")
}

pub fn order_json(id: i64, status: &str) -> Value {
    json!({
        "id": id,
        "weight": "12.5",
        "dimensions": "30x20x10",
        "product_type": "Electrónica",
        "destination_address": "Calle Falsa 123",
        "status": status,
        "created_at": "2024-05-01T10:00:00Z"
    })
}

// ---------------------------------------------------------------------------
// Handlers
// ---------------------------------------------------------------------------

async fn record(State(backend): State<MockBackend>, request: Request, next: Next) -> Response {
    let (parts, body) = request.into_parts();
    let bytes = to_bytes(body, usize::MAX).await.unwrap_or_default();
    let json_body = serde_json::from_slice::<Value>(&bytes).ok();

    backend.requests.lock().unwrap().push(RecordedRequest {
        method: parts.method.to_string(),
        path: parts.uri.path().to_string(),
        query: parts.uri.query().map(str::to_string),
        authorization: parts
            .headers
            .get(AUTHORIZATION)
            .and_then(|v| v.to_str().ok())
            .map(str::to_string),
        body: json_body,
    });

    next.run(Request::from_parts(parts, Body::from(bytes))).await
}

async fn login(Json(body): Json<Value>) -> Response {
    let email = body["email"].as_str().unwrap_or_default();
    let password = body["password"].as_str().unwrap_or_default();

    if password != PASSWORD {
        return (
            StatusCode::UNAUTHORIZED,
            Json(json!({ "message": "Credenciales inválidas" })),
        )
            .into_response();
    }

    match email {
        NO_TOKEN_EMAIL => Json(json!({ "message": "ok" })).into_response(),
        BAD_TOKEN_EMAIL => Json(json!({ "token": "not-a-jwt" })).into_response(),
        _ => {
            let role = if email.starts_with("admin") { "admin" } else { "user" };
            Json(json!({ "token": mint_token(7, email, role) })).into_response()
        }
    }
}

async fn created() -> impl IntoResponse {
    (StatusCode::CREATED, Json(json!({ "message": "created" })))
}

async fn create_order(Json(body): Json<Value>) -> Response {
    if body["productType"] == REJECTED_PRODUCT {
        return (
            StatusCode::BAD_REQUEST,
            Json(json!({ "message": "Tipo de producto no permitido" })),
        )
            .into_response();
    }
    created().await.into_response()
}

async fn ok() -> impl IntoResponse {
    Json(json!({ "message": "ok" }))
}

async fn list_orders(request: Request) -> Json<Value> {
    // The status filter is answered with the wrapped shape, the full list
    // with a bare array, so both decodings are exercised.
    if request.uri().query().is_some_and(|q| q.contains("status=")) {
        Json(json!({ "data": [order_json(1, "En espera"), order_json(2, "En espera")] }))
    } else {
        Json(json!([order_json(1, "En espera"), order_json(3, "Entregado")]))
    }
}

async fn shipment_history() -> Json<Value> {
    Json(json!([order_json(3, "Entregado")]))
}

async fn order_status(Path(id): Path<i64>) -> Response {
    if id == MISSING_ORDER {
        return (
            StatusCode::NOT_FOUND,
            Json(json!({ "message": "Orden no encontrada" })),
        )
            .into_response();
    }
    Json(json!({ "status": "En tránsito" })).into_response()
}

async fn order_history(Path(_id): Path<i64>) -> Json<Value> {
    Json(json!({
        "history": [
            { "status": "En espera", "changed_at": "2024-05-01T10:00:00Z" },
            { "status": "En tránsito", "changed_at": "2024-05-01T12:00:00Z" }
        ]
    }))
}

async fn carriers() -> Json<Value> {
    Json(json!([
        { "id": "1", "name": "Rápido SA", "capacity": "100.5" },
        { "id": 2, "name": "Norte", "capacity": 20 }
    ]))
}

async fn routes() -> Json<Value> {
    Json(json!({ "data": [{ "id": 4, "name": "Bogotá - Medellín" }] }))
}

async fn reports() -> Json<Value> {
    Json(json!([{
        "orderId": 3,
        "estado": "Entregado",
        "tiempoEntregaHoras": 5,
        "transportista": "Rápido SA",
        "fechaCreacion": "2024-05-01T08:00:00Z",
        "fechaEntrega": "2024-05-01T13:00:00Z"
    }]))
}

fn router(backend: MockBackend) -> Router {
    let api = Router::new()
        .route("/auth/login", post(login))
        .route("/auth/register", post(created))
        .route("/orders", get(list_orders).post(create_order))
        .route("/orders/history", get(shipment_history))
        .route("/orders/{id}/status", get(order_status))
        .route("/orders/{id}/history", get(order_history))
        .route("/orders/{id}/assign", post(ok).put(ok))
        .route("/transportistas/available", get(carriers))
        .route("/rutas", get(routes))
        .route("/reportes/envios", get(reports));

    Router::new()
        .nest("/api", api)
        .layer(middleware::from_fn_with_state(backend.clone(), record))
        .with_state(backend)
}

/// Start the mock on an ephemeral port and return its handle and address.
pub async fn spawn_backend() -> (MockBackend, SocketAddr) {
    let backend = MockBackend::default();
    let app = router(backend.clone());

    let listener = tokio::net::TcpListener::bind("127.0.0.1:0")
        .await
        .expect("bind mock backend");
    let addr = listener.local_addr().expect("local addr");
    tokio::spawn(async move {
        axum::serve(listener, app).await.expect("serve mock backend");
    });

    (backend, addr)
}

/// A client with an empty in-memory session, pointed at a fresh mock.
pub async fn client() -> (ApiClient, MockBackend) {
    let (backend, addr) = spawn_backend().await;
    let session = Arc::new(SessionStore::in_memory());
    (ApiClient::new(format!("http://{addr}/api"), session), backend)
}
