use logitrack_client::ApiError;
use logitrack_core::error::CoreError;

/// Errors surfaced by pages.
#[derive(Debug, thiserror::Error)]
pub enum ViewError {
    /// Authorization or local validation failure.
    #[error(transparent)]
    Core(#[from] CoreError),

    /// A snapshot or supporting fetch failed.
    #[error("Failed to load {context}: {source}")]
    Fetch {
        context: &'static str,
        #[source]
        source: ApiError,
    },

    /// A user action was rejected by the backend.
    #[error(transparent)]
    Api(#[from] ApiError),
}

impl ViewError {
    /// One-line message suitable for a page banner.
    pub fn banner(&self) -> String {
        match self {
            ViewError::Core(CoreError::Unauthorized(_)) => "Please log in to continue.".to_string(),
            ViewError::Core(CoreError::Forbidden(_)) => {
                "You do not have access to this page.".to_string()
            }
            ViewError::Core(e) => e.to_string(),
            ViewError::Fetch { context, source } if source.is_unauthorized() => {
                format!("Could not load {context}: your session has expired.")
            }
            ViewError::Fetch { context, .. } => format!("Could not load {context}."),
            ViewError::Api(ApiError::Api { body, .. }) => format!("Request rejected: {body}"),
            ViewError::Api(e) => e.to_string(),
        }
    }
}
