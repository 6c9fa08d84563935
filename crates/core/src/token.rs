//! Login token decoding.
//!
//! The backend returns a JWT. The client never verifies the signature (it
//! has no key); it only reads the identity claims from the payload segment
//! so the UI can be gated by role. The backend re-validates every request.

use base64::alphabet;
use base64::engine::{DecodePaddingMode, GeneralPurpose, GeneralPurposeConfig};
use base64::Engine;
use serde::Deserialize;

use crate::roles::{Role, User};
use crate::types::{deserialize_flexible_id, DbId};

/// base64url, padding optional.
const PAYLOAD_ENGINE: GeneralPurpose = GeneralPurpose::new(
    &alphabet::URL_SAFE,
    GeneralPurposeConfig::new().with_decode_padding_mode(DecodePaddingMode::Indifferent),
);

/// Why a token could not be turned into a [`User`].
#[derive(Debug, thiserror::Error)]
pub enum TokenError {
    #[error("token must have 3 segments, found {0}")]
    Segments(usize),

    #[error("token payload is not valid base64url: {0}")]
    Encoding(#[from] base64::DecodeError),

    #[error("token payload is not a valid identity: {0}")]
    Payload(#[from] serde_json::Error),
}

/// Identity claims read from the token payload. Other claims are ignored.
#[derive(Deserialize)]
struct IdentityClaims {
    #[serde(deserialize_with = "deserialize_flexible_id")]
    id: DbId,
    email: String,
    role: Role,
}

/// Extract `{id, email, role}` from the middle segment of a login token.
pub fn decode_token(token: &str) -> Result<User, TokenError> {
    let parts: Vec<&str> = token.trim().split('.').collect();
    if parts.len() != 3 {
        return Err(TokenError::Segments(parts.len()));
    }

    let payload = PAYLOAD_ENGINE.decode(parts[1])?;
    let claims: IdentityClaims = serde_json::from_slice(&payload)?;

    Ok(User {
        id: claims.id,
        email: claims.email,
        role: claims.role,
    })
}
