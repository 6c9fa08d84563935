//! HTTP client for the LogiTrack REST backend.

pub mod api;
pub mod auth;
pub mod error;
pub mod fleet;
pub mod orders;
pub mod responses;

pub use api::{authorize, ApiClient, DEFAULT_API_URL};
pub use auth::{Credentials, Registration};
pub use error::ApiError;
