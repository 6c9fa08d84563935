//! Shipment reports: rows from `GET /reportes/envios`, per-carrier
//! summaries and human-readable delivery durations.

use chrono::NaiveDate;
use indexmap::IndexMap;
use serde::{Deserialize, Serialize};

use crate::orders::OrderStatus;
use crate::types::{deserialize_flexible_decimal, deserialize_flexible_id, DbId, Timestamp};

/// Default page number for report queries (1-based).
pub const DEFAULT_PAGE: u32 = 1;
/// Default page size for report queries.
pub const DEFAULT_PAGE_SIZE: u32 = 10;

/// One delivered or in-flight shipment in a report.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ReportEntry {
    #[serde(rename = "orderId", deserialize_with = "deserialize_flexible_id")]
    pub order_id: DbId,
    #[serde(rename = "estado")]
    pub status: OrderStatus,
    #[serde(
        rename = "tiempoEntregaHoras",
        default,
        deserialize_with = "deserialize_flexible_decimal"
    )]
    pub delivery_hours: Option<f64>,
    #[serde(rename = "transportista")]
    pub carrier: String,
    #[serde(rename = "fechaCreacion")]
    pub created_at: Timestamp,
    #[serde(rename = "fechaEntrega", default)]
    pub delivered_at: Option<Timestamp>,
}

impl ReportEntry {
    /// Whole minutes from creation to delivery, if delivered.
    pub fn delivery_minutes(&self) -> Option<i64> {
        self.delivered_at
            .map(|delivered| (delivered - self.created_at).num_minutes())
    }
}

/// Optional filters for a report query. Unset filters are not sent.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ReportFilters {
    pub from: Option<NaiveDate>,
    pub to: Option<NaiveDate>,
    pub status: Option<OrderStatus>,
    pub carrier_id: Option<DbId>,
}

impl ReportFilters {
    /// Query parameters for the given page, using the backend's names.
    pub fn to_query(&self, page: u32, page_size: u32) -> Vec<(&'static str, String)> {
        let mut query = Vec::new();
        if let Some(from) = self.from {
            query.push(("fechaInicio", from.format("%Y-%m-%d").to_string()));
        }
        if let Some(to) = self.to {
            query.push(("fechaFin", to.format("%Y-%m-%d").to_string()));
        }
        if let Some(status) = self.status {
            query.push(("estado", status.label().to_string()));
        }
        if let Some(carrier_id) = self.carrier_id {
            query.push(("transportistaId", carrier_id.to_string()));
        }
        query.push(("pagina", page.to_string()));
        query.push(("limite", page_size.to_string()));
        query
    }
}

/// Per-carrier totals over a set of report rows.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct CarrierSummary {
    pub carrier: String,
    pub delivered: u32,
    pub in_transit: u32,
    pub total: u32,
    pub total_minutes: i64,
    /// Rounded mean of `total_minutes` over `total`.
    pub average_minutes: i64,
}

/// Group rows by carrier, in order of first appearance.
///
/// Rows without a delivery date count towards `total` but add no minutes.
pub fn summarize_by_carrier(entries: &[ReportEntry]) -> Vec<CarrierSummary> {
    let mut by_carrier: IndexMap<&str, CarrierSummary> = IndexMap::new();

    for entry in entries {
        let summary = by_carrier
            .entry(entry.carrier.as_str())
            .or_insert_with(|| CarrierSummary {
                carrier: entry.carrier.clone(),
                ..CarrierSummary::default()
            });

        match entry.status {
            OrderStatus::Delivered => summary.delivered += 1,
            OrderStatus::InTransit => summary.in_transit += 1,
            OrderStatus::Waiting => {}
        }
        summary.total += 1;
        summary.total_minutes += entry.delivery_minutes().unwrap_or(0);
    }

    by_carrier
        .into_values()
        .map(|mut summary| {
            if summary.total > 0 {
                summary.average_minutes =
                    (summary.total_minutes as f64 / f64::from(summary.total)).round() as i64;
            }
            summary
        })
        .collect()
}

// ---------------------------------------------------------------------------
// Formatting
// ---------------------------------------------------------------------------

fn hours_and_minutes(total_minutes: i64) -> String {
    let hours = total_minutes / 60;
    let minutes = total_minutes % 60;
    match (hours, minutes) {
        (0, 0) => "Less than 1 minute".to_string(),
        (0, m) => format!("{m} minutes"),
        (h, 0) => format!("{h} hours"),
        (h, m) => format!("{h} hours {m} minutes"),
    }
}

/// Elapsed time between two instants, e.g. `"3 hours 12 minutes"`.
pub fn format_delivery_time(start: Timestamp, end: Timestamp) -> String {
    let elapsed = end - start;
    if elapsed < chrono::Duration::zero() {
        return "Invalid time".to_string();
    }
    hours_and_minutes(elapsed.num_minutes())
}

pub fn format_hours(hours: Option<i64>) -> String {
    match hours {
        None => "N/A".to_string(),
        Some(0) => "Less than 1 hour".to_string(),
        Some(1) => "1 hour".to_string(),
        Some(h) => format!("{h} hours"),
    }
}

pub fn format_minutes(minutes: Option<i64>) -> String {
    match minutes {
        None => "N/A".to_string(),
        Some(m) if m <= 0 => "Less than 1 minute".to_string(),
        Some(m) => hours_and_minutes(m),
    }
}
