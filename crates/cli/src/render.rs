//! Plain-text rendering of domain values for the terminal.

use std::fmt::Write;

use logitrack_core::fleet::{Carrier, Route};
use logitrack_core::orders::{Order, StatusHistoryEntry};
use logitrack_core::reports::{
    format_delivery_time, format_minutes, CarrierSummary, ReportEntry,
};

const DATE_FORMAT: &str = "%Y-%m-%d %H:%M";

fn or_dash(value: Option<&str>) -> &str {
    value.unwrap_or("-")
}

fn weight(value: Option<f64>) -> String {
    value.map_or_else(|| "-".to_string(), |w| format!("{w} kg"))
}

pub fn order_line(order: &Order) -> String {
    format!(
        "#{:<5} {:<12} {:>10}  {:<14} {}",
        order.id,
        order.status,
        weight(order.weight),
        or_dash(order.product_type.as_deref()),
        or_dash(order.destination_address.as_deref()),
    )
}

pub fn orders<'a>(orders: impl IntoIterator<Item = &'a Order>) -> String {
    let mut out = String::new();
    for order in orders {
        let _ = writeln!(out, "{}", order_line(order));
    }
    if out.is_empty() {
        out.push_str("No orders.\n");
    }
    out
}

pub fn history(entries: &[StatusHistoryEntry]) -> String {
    let mut out = String::new();
    for entry in entries {
        let _ = writeln!(
            out,
            "{}  {}",
            entry.changed_at.format(DATE_FORMAT),
            entry.status
        );
    }
    out
}

/// Carriers with an availability marker for an order of `weight`.
pub fn carriers(carriers: &[Carrier], weight: Option<f64>) -> String {
    let mut out = String::new();
    for carrier in carriers {
        let marker = if carrier.can_carry(weight) { ' ' } else { 'x' };
        let _ = writeln!(
            out,
            "[{marker}] #{:<4} {:<20} {}",
            carrier.id,
            carrier.name,
            self::weight(carrier.capacity),
        );
    }
    out
}

pub fn routes(routes: &[Route]) -> String {
    let mut out = String::new();
    for route in routes {
        let _ = writeln!(out, "#{:<4} {}", route.id, route.name);
    }
    out
}

/// Elapsed time from creation to delivery; undelivered rows show `N/A`.
fn delivery_time(entry: &ReportEntry) -> String {
    entry.delivered_at.map_or_else(
        || "N/A".to_string(),
        |end| format_delivery_time(entry.created_at, end),
    )
}

pub fn report(entries: &[ReportEntry], summaries: &[CarrierSummary]) -> String {
    let mut out = String::new();
    for entry in entries {
        let _ = writeln!(
            out,
            "#{:<5} {:<12} {:<20} {:<16} {}",
            entry.order_id,
            entry.status,
            entry.carrier,
            entry.created_at.format(DATE_FORMAT),
            delivery_time(entry),
        );
    }

    if !summaries.is_empty() {
        out.push('\n');
        for summary in summaries {
            let _ = writeln!(
                out,
                "{:<20} delivered {:>3}  in transit {:>3}  total {:>3}  time {}  avg {}",
                summary.carrier,
                summary.delivered,
                summary.in_transit,
                summary.total,
                format_minutes(Some(summary.total_minutes)),
                format_minutes(Some(summary.average_minutes)),
            );
        }
    }
    out
}
