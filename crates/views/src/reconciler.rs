//! Per-view reducers merging snapshots and live envelopes into local state.
//!
//! A [`Reconciler`] owns one view's collection. Snapshots replace it
//! wholly; live envelopes are merged one at a time in arrival order.
//! Envelopes that do not concern the view are no-ops.

use chrono::Utc;
use indexmap::IndexMap;

use logitrack_core::orders::{Order, OrderStatus, StatusHistoryEntry};
use logitrack_core::types::DbId;
use logitrack_live::LiveEnvelope;

/// A reducer over one view's state.
pub trait Reconciler: Send + 'static {
    /// The result of the view's initial fetch.
    type Snapshot: Send + 'static;

    /// Replace the view's state wholly.
    fn apply_snapshot(&mut self, snapshot: Self::Snapshot);

    /// Merge one live envelope. Returns `true` if the state changed.
    fn apply_envelope(&mut self, envelope: &LiveEnvelope) -> bool;
}

// ---------------------------------------------------------------------------
// WaitingQueue
// ---------------------------------------------------------------------------

/// Orders awaiting assignment ("En espera"), in arrival order.
///
/// Orders leave the queue as soon as their status changes to anything
/// else; new orders join only if they are waiting.
#[derive(Debug, Default)]
pub struct WaitingQueue {
    orders: IndexMap<DbId, Order>,
}

impl WaitingQueue {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn orders(&self) -> impl Iterator<Item = &Order> {
        self.orders.values()
    }

    pub fn get(&self, order_id: DbId) -> Option<&Order> {
        self.orders.get(&order_id)
    }

    pub fn contains(&self, order_id: DbId) -> bool {
        self.orders.contains_key(&order_id)
    }

    pub fn len(&self) -> usize {
        self.orders.len()
    }

    pub fn is_empty(&self) -> bool {
        self.orders.is_empty()
    }
}

impl Reconciler for WaitingQueue {
    type Snapshot = Vec<Order>;

    fn apply_snapshot(&mut self, snapshot: Vec<Order>) {
        self.orders = snapshot.into_iter().map(|o| (o.id, o)).collect();
    }

    fn apply_envelope(&mut self, envelope: &LiveEnvelope) -> bool {
        match envelope {
            LiveEnvelope::NewOrder(order) if order.is_waiting() => {
                // `insert` keeps the position of an id already present.
                self.orders.insert(order.id, order.clone());
                true
            }
            LiveEnvelope::NewOrder(_) => false,
            LiveEnvelope::StatusUpdate(update) => {
                let Some(order) = self.orders.get_mut(&update.order_id) else {
                    return false;
                };
                order.status = update.new_status;
                self.orders.retain(|_, o| o.is_waiting());
                true
            }
        }
    }
}

// ---------------------------------------------------------------------------
// OrderList
// ---------------------------------------------------------------------------

/// An unfiltered list of orders whose statuses follow live updates.
#[derive(Debug, Default)]
pub struct OrderList {
    orders: IndexMap<DbId, Order>,
}

impl OrderList {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn orders(&self) -> impl Iterator<Item = &Order> {
        self.orders.values()
    }

    pub fn get(&self, order_id: DbId) -> Option<&Order> {
        self.orders.get(&order_id)
    }

    pub fn len(&self) -> usize {
        self.orders.len()
    }

    pub fn is_empty(&self) -> bool {
        self.orders.is_empty()
    }
}

impl Reconciler for OrderList {
    type Snapshot = Vec<Order>;

    fn apply_snapshot(&mut self, snapshot: Vec<Order>) {
        self.orders = snapshot.into_iter().map(|o| (o.id, o)).collect();
    }

    fn apply_envelope(&mut self, envelope: &LiveEnvelope) -> bool {
        match envelope {
            LiveEnvelope::NewOrder(order) => {
                self.orders.insert(order.id, order.clone());
                true
            }
            LiveEnvelope::StatusUpdate(update) => match self.orders.get_mut(&update.order_id) {
                Some(order) => {
                    order.status = update.new_status;
                    true
                }
                None => false,
            },
        }
    }
}

// ---------------------------------------------------------------------------
// TrackingView
// ---------------------------------------------------------------------------

/// Initial state of a [`TrackingView`].
#[derive(Debug, Clone, PartialEq)]
pub struct TrackingSnapshot {
    pub status: Option<OrderStatus>,
    pub history: Vec<StatusHistoryEntry>,
}

/// Current status and status history of a single order.
///
/// Every status update for the tracked order appends one history row,
/// including exact repeats.
#[derive(Debug)]
pub struct TrackingView {
    order_id: DbId,
    status: Option<OrderStatus>,
    history: Vec<StatusHistoryEntry>,
}

impl TrackingView {
    pub fn new(order_id: DbId) -> Self {
        Self {
            order_id,
            status: None,
            history: Vec::new(),
        }
    }

    pub fn order_id(&self) -> DbId {
        self.order_id
    }

    pub fn status(&self) -> Option<OrderStatus> {
        self.status
    }

    pub fn history(&self) -> &[StatusHistoryEntry] {
        &self.history
    }
}

impl Reconciler for TrackingView {
    type Snapshot = TrackingSnapshot;

    fn apply_snapshot(&mut self, snapshot: TrackingSnapshot) {
        self.status = snapshot.status;
        self.history = snapshot.history;
    }

    fn apply_envelope(&mut self, envelope: &LiveEnvelope) -> bool {
        let LiveEnvelope::StatusUpdate(update) = envelope else {
            return false;
        };
        if update.order_id != self.order_id {
            return false;
        }

        self.status = Some(update.new_status);
        self.history.push(StatusHistoryEntry {
            status: update.new_status,
            changed_at: update.updated_at.unwrap_or_else(Utc::now),
        });
        true
    }
}
