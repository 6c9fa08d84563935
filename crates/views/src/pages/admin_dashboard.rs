//! Administrator dashboard: the live waiting queue plus carrier and route
//! assignment.

use std::sync::Arc;

use async_trait::async_trait;

use logitrack_client::{ApiClient, ApiError};
use logitrack_core::error::CoreError;
use logitrack_core::fleet::{Carrier, Route};
use logitrack_core::orders::{Assignment, Order, OrderStatus};
use logitrack_core::types::DbId;

use crate::error::ViewError;
use crate::guard::require_admin;
use crate::page::{LiveOptions, Page, SnapshotSource};
use crate::reconciler::WaitingQueue;

struct WaitingOrders {
    api: Arc<ApiClient>,
}

#[async_trait]
impl SnapshotSource for WaitingOrders {
    type Snapshot = Vec<Order>;

    fn context(&self) -> &'static str {
        "waiting orders"
    }

    async fn fetch(&self) -> Result<Vec<Order>, ApiError> {
        self.api.list_orders(Some(OrderStatus::Waiting)).await
    }
}

pub struct AdminDashboard {
    api: Arc<ApiClient>,
    queue: Page<WaitingQueue>,
    carriers: Vec<Carrier>,
    routes: Vec<Route>,
    fleet_error: Option<String>,
}

impl AdminDashboard {
    /// Mount for an admin session. Carrier and route failures are kept as
    /// a banner; they do not prevent mounting.
    pub async fn mount(api: Arc<ApiClient>, live: Option<LiveOptions>) -> Result<Self, ViewError> {
        let admin = require_admin(api.session())?;
        tracing::info!(user_id = admin.id, "Mounting admin dashboard");

        let queue = Page::mount(
            WaitingQueue::new(),
            WaitingOrders {
                api: Arc::clone(&api),
            },
            live,
        )
        .await;

        let mut dashboard = Self {
            api,
            queue,
            carriers: Vec::new(),
            routes: Vec::new(),
            fleet_error: None,
        };
        dashboard.reload_fleet().await;
        Ok(dashboard)
    }

    pub fn queue(&self) -> &Page<WaitingQueue> {
        &self.queue
    }

    pub fn carriers(&self) -> &[Carrier] {
        &self.carriers
    }

    pub fn routes(&self) -> &[Route] {
        &self.routes
    }

    pub fn fleet_error(&self) -> Option<&str> {
        self.fleet_error.as_deref()
    }

    /// Every carrier paired with whether it can take an order of `weight`.
    pub fn carrier_options(&self, weight: Option<f64>) -> Vec<(&Carrier, bool)> {
        self.carriers
            .iter()
            .map(|carrier| (carrier, carrier.can_carry(weight)))
            .collect()
    }

    /// Refetch carriers and routes concurrently.
    pub async fn reload_fleet(&mut self) {
        let (carriers, routes) = tokio::join!(self.api.available_carriers(), self.api.routes());
        self.fleet_error = None;
        self.store_carriers(carriers);
        match routes {
            Ok(routes) => self.routes = routes,
            Err(source) => self.record_fleet_error("routes", source),
        }
    }

    pub async fn reload_carriers(&mut self) {
        let carriers = self.api.available_carriers().await;
        self.fleet_error = None;
        self.store_carriers(carriers);
    }

    /// Assign a queued order to a carrier and route.
    ///
    /// The order must be in the queue, the carrier and route must be
    /// known, and the carrier's capacity must cover the order's weight.
    /// On success the queue and the carrier list are refetched.
    pub async fn assign(
        &mut self,
        order_id: DbId,
        carrier_id: DbId,
        route_id: DbId,
    ) -> Result<(), ViewError> {
        let weight = self
            .queue
            .view(|queue| queue.get(order_id).map(|order| order.weight))
            .await
            .ok_or(CoreError::NotFound {
                entity: "order",
                id: order_id,
            })?;

        let carrier = self
            .carriers
            .iter()
            .find(|c| c.id == carrier_id)
            .ok_or(CoreError::NotFound {
                entity: "carrier",
                id: carrier_id,
            })?;

        if !self.routes.iter().any(|r| r.id == route_id) {
            return Err(CoreError::NotFound {
                entity: "route",
                id: route_id,
            }
            .into());
        }

        if !carrier.can_carry(weight) {
            return Err(CoreError::Validation(format!(
                "carrier '{}' capacity of {} kg is below the order weight of {} kg",
                carrier.name,
                carrier.capacity.unwrap_or_default(),
                weight.unwrap_or_default(),
            ))
            .into());
        }

        self.api
            .assign_order(
                order_id,
                Assignment {
                    carrier_id,
                    route_id,
                },
            )
            .await?;

        if let Err(e) = self.queue.refresh().await.await {
            tracing::warn!(error = %e, "Queue refresh task failed");
        }
        self.reload_carriers().await;
        Ok(())
    }

    pub async fn unmount(self) {
        self.queue.unmount().await;
    }

    fn store_carriers(&mut self, carriers: Result<Vec<Carrier>, ApiError>) {
        match carriers {
            Ok(carriers) => self.carriers = carriers,
            Err(source) => self.record_fleet_error("carriers", source),
        }
    }

    fn record_fleet_error(&mut self, context: &'static str, source: ApiError) {
        let err = ViewError::Fetch { context, source };
        tracing::warn!(error = %err, "Fleet fetch failed");
        self.fleet_error = Some(err.banner());
    }
}
