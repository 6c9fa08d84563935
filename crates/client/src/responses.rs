//! Response envelopes used by the backend.

use serde::Deserialize;

use logitrack_core::orders::{OrderStatus, StatusHistoryEntry};

/// A list endpoint's body: either a bare array or `{ "data": [...] }`.
#[derive(Debug, Deserialize)]
#[serde(untagged)]
pub enum ListResponse<T> {
    Bare(Vec<T>),
    Wrapped { data: Vec<T> },
}

impl<T> ListResponse<T> {
    pub fn into_vec(self) -> Vec<T> {
        match self {
            ListResponse::Bare(items) => items,
            ListResponse::Wrapped { data } => data,
        }
    }
}

/// Body of `POST /auth/login`.
#[derive(Debug, Deserialize)]
pub struct TokenResponse {
    #[serde(default)]
    pub token: Option<String>,
}

/// Body of `GET /orders/{id}/status`.
#[derive(Debug, Deserialize)]
pub struct StatusResponse {
    pub status: OrderStatus,
}

/// Body of `GET /orders/{id}/history`.
#[derive(Debug, Deserialize)]
pub struct HistoryResponse {
    #[serde(default)]
    pub history: Vec<StatusHistoryEntry>,
}
