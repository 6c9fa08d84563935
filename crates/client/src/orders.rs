//! Order endpoints.

use reqwest::Method;
use validator::Validate;

use logitrack_core::orders::{
    Assignment, CarrierAssignment, NewOrder, Order, OrderStatus, StatusHistoryEntry,
};
use logitrack_core::types::DbId;

use crate::api::ApiClient;
use crate::error::ApiError;
use crate::responses::{HistoryResponse, ListResponse, StatusResponse};

impl ApiClient {
    /// `GET /orders`, optionally filtered by status.
    pub async fn list_orders(&self, status: Option<OrderStatus>) -> Result<Vec<Order>, ApiError> {
        let query: Vec<(&str, String)> = status
            .map(|s| ("status", s.label().to_string()))
            .into_iter()
            .collect();
        let body: ListResponse<Order> = self.get_json("/orders", &query).await?;
        Ok(body.into_vec())
    }

    /// `GET /orders/history`: the current user's past shipments.
    pub async fn shipment_history(&self) -> Result<Vec<Order>, ApiError> {
        let body: ListResponse<Order> = self.get_json("/orders/history", &[]).await?;
        Ok(body.into_vec())
    }

    pub async fn order_status(&self, order_id: DbId) -> Result<OrderStatus, ApiError> {
        let body: StatusResponse = self
            .get_json(&format!("/orders/{order_id}/status"), &[])
            .await?;
        Ok(body.status)
    }

    pub async fn order_history(&self, order_id: DbId) -> Result<Vec<StatusHistoryEntry>, ApiError> {
        let body: HistoryResponse = self
            .get_json(&format!("/orders/{order_id}/history"), &[])
            .await?;
        Ok(body.history)
    }

    /// `POST /orders`. The body is validated before sending.
    pub async fn create_order(&self, order: &NewOrder) -> Result<(), ApiError> {
        order.validate()?;
        self.send_json(Method::POST, "/orders", order).await?;
        tracing::info!(product_type = %order.product_type, "Order created");
        Ok(())
    }

    /// `POST /orders/{id}/assign`: set carrier and route.
    pub async fn assign_order(
        &self,
        order_id: DbId,
        assignment: Assignment,
    ) -> Result<(), ApiError> {
        self.send_json(
            Method::POST,
            &format!("/orders/{order_id}/assign"),
            &assignment,
        )
        .await?;
        tracing::info!(
            order_id,
            carrier_id = assignment.carrier_id,
            route_id = assignment.route_id,
            "Order assigned",
        );
        Ok(())
    }

    /// `PUT /orders/{id}/assign`: change only the carrier.
    pub async fn reassign_carrier(&self, order_id: DbId, carrier_id: DbId) -> Result<(), ApiError> {
        self.send_json(
            Method::PUT,
            &format!("/orders/{order_id}/assign"),
            &CarrierAssignment { carrier_id },
        )
        .await?;
        tracing::info!(order_id, carrier_id, "Carrier reassigned");
        Ok(())
    }
}
