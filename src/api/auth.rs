//! Access policy for the sync write endpoint.

use std::fmt;
use std::sync::Arc;

use axum::http::{header::AUTHORIZATION, HeaderMap};

use crate::error::ApiError;

/// Who may call `POST /api/sync`.
#[derive(Clone, Default)]
pub enum SyncAuth {
    /// Any caller may write. Intended for trusted, operator-only networks.
    #[default]
    Open,
    /// Callers must send `Authorization: Bearer <token>`.
    BearerToken(Arc<str>),
}

impl SyncAuth {
    /// Policy for an optional configured token.
    pub fn from_token(token: Option<&str>) -> Self {
        match token {
            Some(token) if !token.is_empty() => SyncAuth::BearerToken(Arc::from(token)),
            _ => SyncAuth::Open,
        }
    }

    /// Whether any caller may write.
    pub fn is_open(&self) -> bool {
        matches!(self, SyncAuth::Open)
    }

    /// Check request headers against the policy.
    pub fn authorize(&self, headers: &HeaderMap) -> Result<(), ApiError> {
        let expected = match self {
            SyncAuth::Open => return Ok(()),
            SyncAuth::BearerToken(token) => token,
        };

        let presented = headers
            .get(AUTHORIZATION)
            .and_then(|value| value.to_str().ok())
            .and_then(|value| value.strip_prefix("Bearer "))
            .map(str::trim);

        match presented {
            Some(token) if token == &**expected => Ok(()),
            _ => Err(ApiError::Unauthorized),
        }
    }
}

impl fmt::Debug for SyncAuth {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SyncAuth::Open => f.write_str("Open"),
            SyncAuth::BearerToken(_) => f.write_str("BearerToken(<redacted>)"),
        }
    }
}
