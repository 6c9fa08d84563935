//! Status and history of a single order.

use std::sync::Arc;

use async_trait::async_trait;

use logitrack_client::{ApiClient, ApiError};
use logitrack_core::types::DbId;

use crate::error::ViewError;
use crate::guard::require_session;
use crate::page::{LiveOptions, Page, SnapshotSource};
use crate::reconciler::{TrackingSnapshot, TrackingView};

struct TrackingSource {
    api: Arc<ApiClient>,
    order_id: DbId,
}

#[async_trait]
impl SnapshotSource for TrackingSource {
    type Snapshot = TrackingSnapshot;

    fn context(&self) -> &'static str {
        "order status"
    }

    async fn fetch(&self) -> Result<TrackingSnapshot, ApiError> {
        let (status, history) = tokio::try_join!(
            self.api.order_status(self.order_id),
            self.api.order_history(self.order_id),
        )?;
        Ok(TrackingSnapshot {
            status: Some(status),
            history,
        })
    }
}

pub struct TrackOrderPage {
    page: Page<TrackingView>,
}

impl TrackOrderPage {
    pub async fn mount(
        api: Arc<ApiClient>,
        order_id: DbId,
        live: Option<LiveOptions>,
    ) -> Result<Self, ViewError> {
        let user = require_session(api.session())?;
        tracing::info!(user_id = user.id, order_id, "Mounting order tracking");

        let page = Page::mount(
            TrackingView::new(order_id),
            TrackingSource { api, order_id },
            live,
        )
        .await;
        Ok(Self { page })
    }

    pub fn page(&self) -> &Page<TrackingView> {
        &self.page
    }

    pub async fn unmount(self) {
        self.page.unmount().await;
    }
}
