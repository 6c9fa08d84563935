//! Past shipments, fetched once.

use logitrack_client::ApiClient;
use logitrack_core::orders::Order;

use crate::error::ViewError;
use crate::guard::require_session;

#[derive(Debug)]
pub struct ShipmentHistoryPage {
    orders: Vec<Order>,
}

impl ShipmentHistoryPage {
    pub async fn load(api: &ApiClient) -> Result<Self, ViewError> {
        require_session(api.session())?;
        let orders = api
            .shipment_history()
            .await
            .map_err(|source| ViewError::Fetch {
                context: "shipment history",
                source,
            })?;
        tracing::debug!(count = orders.len(), "Loaded shipment history");
        Ok(Self { orders })
    }

    pub fn orders(&self) -> &[Order] {
        &self.orders
    }
}
