//! Live channel message types and parser.
//!
//! The backend pushes flat JSON objects discriminated by a top-level
//! `"type"` field:
//!
//! ```json
//! {"type": "status_update", "orderId": 12, "newStatus": "En tránsito", "updatedAt": "..."}
//! {"type": "new_order", "order": {"id": 13, "status": "En espera", ...}}
//! ```
//!
//! Older backends omit `"type"` on status updates; an untyped object that
//! carries both `orderId` and `newStatus` is read as a status update.

use serde::{Deserialize, Deserializer};
use serde_json::Value;

use logitrack_core::orders::{Order, OrderStatus};
use logitrack_core::types::{deserialize_flexible_id, DbId, Timestamp};

pub const MSG_TYPE_STATUS_UPDATE: &str = "status_update";
pub const MSG_TYPE_NEW_ORDER: &str = "new_order";

/// A recognized, shape-validated live message.
#[derive(Debug, Clone, PartialEq)]
pub enum LiveEnvelope {
    StatusUpdate(StatusUpdate),
    NewOrder(Order),
}

impl LiveEnvelope {
    /// The order this message concerns.
    pub fn order_id(&self) -> DbId {
        match self {
            LiveEnvelope::StatusUpdate(update) => update.order_id,
            LiveEnvelope::NewOrder(order) => order.id,
        }
    }
}

/// Payload of a `status_update` message.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StatusUpdate {
    #[serde(deserialize_with = "deserialize_flexible_id")]
    pub order_id: DbId,
    pub new_status: OrderStatus,
    /// When the backend recorded the change. Unparseable values are
    /// treated as absent.
    #[serde(default, deserialize_with = "deserialize_lenient_timestamp")]
    pub updated_at: Option<Timestamp>,
}

#[derive(Deserialize)]
struct NewOrderPayload {
    order: Order,
}

/// Why a text frame did not yield a [`LiveEnvelope`].
#[derive(Debug, thiserror::Error)]
pub enum EnvelopeError {
    #[error("message is not valid JSON: {0}")]
    InvalidJson(#[source] serde_json::Error),

    #[error("message has no type")]
    MissingType,

    #[error("unknown message type: {0}")]
    UnknownType(String),

    #[error("malformed {kind} message: {source}")]
    Malformed {
        kind: &'static str,
        #[source]
        source: serde_json::Error,
    },
}

fn deserialize_lenient_timestamp<'de, D>(deserializer: D) -> Result<Option<Timestamp>, D::Error>
where
    D: Deserializer<'de>,
{
    let raw = Option::<Value>::deserialize(deserializer)?;
    Ok(raw
        .and_then(|v| v.as_str().map(str::to_string))
        .and_then(|s| chrono::DateTime::parse_from_rfc3339(&s).ok())
        .map(|dt| dt.with_timezone(&chrono::Utc)))
}

fn decode<T: for<'de> Deserialize<'de>>(
    kind: &'static str,
    value: Value,
) -> Result<T, EnvelopeError> {
    serde_json::from_value(value).map_err(|source| EnvelopeError::Malformed { kind, source })
}

/// Parse a text frame into a typed envelope.
///
/// Returns `Err` for malformed JSON, unknown `type` values and messages
/// that fail shape validation (missing `orderId`, empty or unknown
/// `newStatus`, missing `order`). Callers log and discard these.
pub fn parse_envelope(text: &str) -> Result<LiveEnvelope, EnvelopeError> {
    let value: Value = serde_json::from_str(text).map_err(EnvelopeError::InvalidJson)?;

    let kind = match value.get("type") {
        Some(Value::String(kind)) => kind.clone(),
        Some(other) => return Err(EnvelopeError::UnknownType(other.to_string())),
        None if value.get("orderId").is_some() && value.get("newStatus").is_some() => {
            MSG_TYPE_STATUS_UPDATE.to_string()
        }
        None => return Err(EnvelopeError::MissingType),
    };

    match kind.as_str() {
        MSG_TYPE_STATUS_UPDATE => {
            decode::<StatusUpdate>(MSG_TYPE_STATUS_UPDATE, value).map(LiveEnvelope::StatusUpdate)
        }
        MSG_TYPE_NEW_ORDER => decode::<NewOrderPayload>(MSG_TYPE_NEW_ORDER, value)
            .map(|payload| LiveEnvelope::NewOrder(payload.order)),
        _ => Err(EnvelopeError::UnknownType(kind)),
    }
}
