//! Carrier, route and report endpoints.

use logitrack_core::fleet::{Carrier, Route};
use logitrack_core::reports::{ReportEntry, ReportFilters};

use crate::api::ApiClient;
use crate::error::ApiError;
use crate::responses::ListResponse;

impl ApiClient {
    /// `GET /transportistas/available`
    pub async fn available_carriers(&self) -> Result<Vec<Carrier>, ApiError> {
        let body: ListResponse<Carrier> = self.get_json("/transportistas/available", &[]).await?;
        Ok(body.into_vec())
    }

    /// `GET /rutas`
    pub async fn routes(&self) -> Result<Vec<Route>, ApiError> {
        let body: ListResponse<Route> = self.get_json("/rutas", &[]).await?;
        Ok(body.into_vec())
    }

    /// `GET /reportes/envios` for one page of results.
    pub async fn fetch_reports(
        &self,
        filters: &ReportFilters,
        page: u32,
        page_size: u32,
    ) -> Result<Vec<ReportEntry>, ApiError> {
        let query = filters.to_query(page, page_size);
        let body: ListResponse<ReportEntry> = self.get_json("/reportes/envios", &query).await?;
        Ok(body.into_vec())
    }
}
