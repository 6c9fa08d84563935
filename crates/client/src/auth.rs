//! Login, registration and logout.

use reqwest::Method;
use serde::Serialize;
use validator::Validate;

use logitrack_core::roles::User;
use logitrack_core::token::decode_token;

use crate::api::ApiClient;
use crate::error::ApiError;
use crate::responses::TokenResponse;

/// Body of `POST /auth/login`.
#[derive(Debug, Clone, Serialize, Validate)]
pub struct Credentials {
    #[validate(email(message = "A valid email is required"))]
    pub email: String,
    #[validate(length(min = 1, message = "Password is required"))]
    pub password: String,
}

/// Body of `POST /auth/register`.
#[derive(Debug, Clone, Serialize, Validate)]
pub struct Registration {
    #[validate(length(min = 1, message = "Name is required"))]
    pub name: String,
    #[validate(email(message = "A valid email is required"))]
    pub email: String,
    #[validate(length(min = 1, message = "Password is required"))]
    pub password: String,
}

impl ApiClient {
    /// Authenticate and establish a session.
    ///
    /// The returned token is decoded locally to obtain the user identity.
    /// On any failure (rejected credentials, missing token, undecodable
    /// token) the session is left untouched.
    pub async fn login(&self, credentials: &Credentials) -> Result<User, ApiError> {
        credentials.validate()?;

        let response = self
            .send_json(Method::POST, "/auth/login", credentials)
            .await?;
        let body: TokenResponse = response.json().await?;

        let token = body
            .token
            .filter(|t| !t.trim().is_empty())
            .ok_or_else(|| ApiError::InvalidResponse("login response has no token".into()))?;

        let user = decode_token(&token)?;
        self.session().login(token, user.clone());
        Ok(user)
    }

    /// Create an account. Does not log in.
    pub async fn register(&self, registration: &Registration) -> Result<(), ApiError> {
        registration.validate()?;
        self.send_json(Method::POST, "/auth/register", registration)
            .await?;
        tracing::info!(email = %registration.email, "Registered account");
        Ok(())
    }

    /// Drop the local session. The backend keeps no session state.
    pub fn logout(&self) {
        self.session().logout();
    }
}
