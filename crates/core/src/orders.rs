//! Shipment orders and their status history.
//!
//! Orders are mutated only by the backend; the client keeps read-only
//! projections of them. The backend is inconsistent about field casing, so
//! every multi-word field accepts both its camelCase and snake_case spelling.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use validator::Validate;

use crate::types::{deserialize_flexible_decimal, deserialize_flexible_id, DbId, Timestamp};

// ---------------------------------------------------------------------------
// Status
// ---------------------------------------------------------------------------

pub const STATUS_WAITING: &str = "En espera";
pub const STATUS_IN_TRANSIT: &str = "En tránsito";
pub const STATUS_DELIVERED: &str = "Entregado";

/// Lifecycle status of an order, serialized with the backend's labels.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub enum OrderStatus {
    /// Awaiting carrier/route assignment.
    Waiting,
    InTransit,
    Delivered,
}

impl OrderStatus {
    pub const ALL: [OrderStatus; 3] = [
        OrderStatus::Waiting,
        OrderStatus::InTransit,
        OrderStatus::Delivered,
    ];

    /// The label used on the wire and in the UI.
    pub fn label(self) -> &'static str {
        match self {
            OrderStatus::Waiting => STATUS_WAITING,
            OrderStatus::InTransit => STATUS_IN_TRANSIT,
            OrderStatus::Delivered => STATUS_DELIVERED,
        }
    }
}

impl fmt::Display for OrderStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.pad(self.label())
    }
}

/// Returned when a status label is empty or not one of the known values.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("unknown order status: {0:?}")]
pub struct UnknownStatus(pub String);

impl FromStr for OrderStatus {
    type Err = UnknownStatus;

    /// Case-insensitive, surrounding whitespace ignored.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let wanted = s.trim().to_lowercase();
        OrderStatus::ALL
            .into_iter()
            .find(|status| status.label().to_lowercase() == wanted)
            .ok_or_else(|| UnknownStatus(s.to_string()))
    }
}

impl TryFrom<String> for OrderStatus {
    type Error = UnknownStatus;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

impl From<OrderStatus> for String {
    fn from(status: OrderStatus) -> Self {
        status.label().to_string()
    }
}

// ---------------------------------------------------------------------------
// Order
// ---------------------------------------------------------------------------

/// A shipment order as projected by the client.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Order {
    #[serde(deserialize_with = "deserialize_flexible_id")]
    pub id: DbId,
    /// Weight in kilograms.
    #[serde(default, deserialize_with = "deserialize_flexible_decimal")]
    pub weight: Option<f64>,
    #[serde(default)]
    pub dimensions: Option<String>,
    #[serde(default, alias = "product_type")]
    pub product_type: Option<String>,
    #[serde(default, alias = "destination_address")]
    pub destination_address: Option<String>,
    pub status: OrderStatus,
    #[serde(default, alias = "created_at")]
    pub created_at: Option<Timestamp>,
}

impl Order {
    pub fn is_waiting(&self) -> bool {
        self.status == OrderStatus::Waiting
    }
}

/// One row of an order's status history.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StatusHistoryEntry {
    pub status: OrderStatus,
    #[serde(rename = "changed_at", alias = "changedAt")]
    pub changed_at: Timestamp,
}

// ---------------------------------------------------------------------------
// Request bodies
// ---------------------------------------------------------------------------

/// Body of `POST /orders`.
#[derive(Debug, Clone, Serialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct NewOrder {
    #[validate(range(min = 0.01, message = "Weight must be greater than zero"))]
    pub weight: f64,

    #[validate(length(min = 1, message = "Dimensions are required"))]
    pub dimensions: String,

    #[validate(length(min = 1, message = "Product type is required"))]
    pub product_type: String,

    #[validate(length(min = 1, message = "Destination address is required"))]
    pub destination_address: String,
}

/// Body of `POST /orders/{id}/assign`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct Assignment {
    #[serde(rename = "transportistaId")]
    pub carrier_id: DbId,
    #[serde(rename = "rutaId")]
    pub route_id: DbId,
}

/// Body of `PUT /orders/{id}/assign`, which only changes the carrier.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct CarrierAssignment {
    #[serde(rename = "transportistaId")]
    pub carrier_id: DbId,
}
