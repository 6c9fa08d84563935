//! The signed-in user's orders, live-updated.

use std::sync::Arc;

use async_trait::async_trait;

use logitrack_client::{ApiClient, ApiError};
use logitrack_core::orders::Order;

use crate::error::ViewError;
use crate::guard::require_session;
use crate::page::{LiveOptions, Page, SnapshotSource};
use crate::reconciler::OrderList;

struct AllOrders {
    api: Arc<ApiClient>,
}

#[async_trait]
impl SnapshotSource for AllOrders {
    type Snapshot = Vec<Order>;

    fn context(&self) -> &'static str {
        "orders"
    }

    async fn fetch(&self) -> Result<Vec<Order>, ApiError> {
        self.api.list_orders(None).await
    }
}

pub struct MyOrdersPage {
    page: Page<OrderList>,
}

impl MyOrdersPage {
    pub async fn mount(api: Arc<ApiClient>, live: Option<LiveOptions>) -> Result<Self, ViewError> {
        let user = require_session(api.session())?;
        tracing::info!(user_id = user.id, "Mounting order list");

        let page = Page::mount(OrderList::new(), AllOrders { api }, live).await;
        Ok(Self { page })
    }

    pub fn page(&self) -> &Page<OrderList> {
        &self.page
    }

    pub async fn unmount(self) {
        self.page.unmount().await;
    }
}
