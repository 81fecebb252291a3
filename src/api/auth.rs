//! Caller identity extractor.
//!
//! Authentication itself (credentials, sessions, cookies) lives in an
//! upstream collaborator; by the time a request reaches this service the
//! caller identity has been resolved to an opaque id carried in the
//! `x-caller-id` header. Handlers that require identity take `Caller` as a
//! parameter; a missing header rejects with 401 before any handler code or
//! store access runs.

use axum::{extract::FromRequestParts, http::request::Parts};
use uuid::Uuid;

use super::errors::ApiError;

pub const CALLER_ID_HEADER: &str = "x-caller-id";

/// Resolved caller identity, as opaque as the readings' `user_id` field.
#[derive(Debug, Clone)]
pub struct Caller(pub String);

impl Caller {
    /// The caller id as a user key, for routes that operate on the caller's
    /// own account. An id that is not a valid key means the identity does
    /// not resolve to an account.
    pub fn user_id(&self) -> Result<Uuid, ApiError> {
        Uuid::parse_str(&self.0).map_err(|_| ApiError::Unauthenticated)
    }
}

impl<S> FromRequestParts<S> for Caller
where
    S: Send + Sync,
{
    type Rejection = ApiError;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        parts
            .headers
            .get(CALLER_ID_HEADER)
            .and_then(|v| v.to_str().ok())
            .filter(|v| !v.is_empty())
            .map(|v| Caller(v.to_owned()))
            .ok_or(ApiError::Unauthenticated)
    }
}
