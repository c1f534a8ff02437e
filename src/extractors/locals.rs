//! Per-request values placed in request extensions by upstream middleware.

use crate::error::AppError;
use async_trait::async_trait;
use axum::{extract::FromRequestParts, http::request::Parts};
use serde_json::Value;

/// Authorization outcome for the current request. Absent from extensions means "allowed, unconstrained".
#[derive(Clone, Debug, Default)]
pub struct RequestLocals {
    pub is_forbidden: bool,
    /// Custom 403 message.
    pub message: Option<String>,
    /// Status constraint injected into every where clause.
    pub status: Option<Value>,
}

impl RequestLocals {
    pub fn forbid(message: Option<String>) -> Self {
        RequestLocals {
            is_forbidden: true,
            message,
            status: None,
        }
    }

    pub fn with_status(status: impl Into<Value>) -> Self {
        RequestLocals {
            status: Some(status.into()),
            ..RequestLocals::default()
        }
    }

    pub fn ensure_allowed(&self) -> Result<(), AppError> {
        if self.is_forbidden {
            return Err(AppError::Forbidden(self.message.clone()));
        }
        Ok(())
    }
}

#[async_trait]
impl<S> FromRequestParts<S> for RequestLocals
where
    S: Send + Sync,
{
    type Rejection = std::convert::Infallible;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        Ok(parts.extensions.get::<RequestLocals>().cloned().unwrap_or_default())
    }
}

/// The authenticated user as a JSON object carrying at least `id`.
#[derive(Clone, Debug)]
pub struct Actor(pub Value);

impl Actor {
    pub fn id(&self) -> Option<&Value> {
        self.0.get("id").filter(|v| !v.is_null())
    }
}

#[async_trait]
impl<S> FromRequestParts<S> for Actor
where
    S: Send + Sync,
{
    type Rejection = AppError;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        parts
            .extensions
            .get::<Actor>()
            .cloned()
            .ok_or(AppError::Unauthorized)
    }
}
