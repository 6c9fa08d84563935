//! Carriers (`transportistas`) and delivery routes (`rutas`).

use serde::{Deserialize, Serialize};

use crate::types::{deserialize_flexible_decimal, deserialize_flexible_id, DbId};

/// A carrier currently available for assignment.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Carrier {
    #[serde(deserialize_with = "deserialize_flexible_id")]
    pub id: DbId,
    pub name: String,
    /// Maximum load in kilograms.
    #[serde(default, deserialize_with = "deserialize_flexible_decimal")]
    pub capacity: Option<f64>,
}

impl Carrier {
    /// Whether this carrier can take an order of the given weight.
    ///
    /// Unknown weights or capacities never disqualify a carrier; the backend
    /// has the final word.
    pub fn can_carry(&self, weight: Option<f64>) -> bool {
        match (self.capacity, weight) {
            (Some(capacity), Some(weight)) => capacity >= weight,
            _ => true,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Route {
    #[serde(deserialize_with = "deserialize_flexible_id")]
    pub id: DbId,
    pub name: String,
}
