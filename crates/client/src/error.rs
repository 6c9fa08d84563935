use logitrack_core::token::TokenError;

/// Errors from the REST API layer.
#[derive(Debug, thiserror::Error)]
pub enum ApiError {
    /// The HTTP request itself failed (network, DNS, TLS, body decoding).
    #[error("HTTP request failed: {0}")]
    Request(#[from] reqwest::Error),

    /// The backend answered with a non-2xx status.
    #[error("API error ({status}): {body}")]
    Api {
        status: u16,
        /// Raw response body, preserved verbatim.
        body: String,
    },

    /// A request body failed local validation and was not sent.
    #[error("Invalid request: {0}")]
    Validation(#[from] validator::ValidationErrors),

    /// The login response carried a token that could not be decoded.
    #[error("Invalid login token: {0}")]
    Token(#[from] TokenError),

    /// A 2xx response whose content is unusable.
    #[error("Invalid response: {0}")]
    InvalidResponse(String),
}

impl ApiError {
    /// HTTP status code, when the backend produced one.
    pub fn status(&self) -> Option<u16> {
        match self {
            ApiError::Api { status, .. } => Some(*status),
            ApiError::Request(e) => e.status().map(|s| s.as_u16()),
            _ => None,
        }
    }

    pub fn is_unauthorized(&self) -> bool {
        self.status() == Some(401)
    }
}
