//! Typed errors and HTTP mapping. Every handler failure is rendered here as a JSON:API error document.

use crate::jsonapi::{ErrorDocument, ErrorObject};
use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use thiserror::Error;

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("missing reference: {kind} '{id}'")]
    MissingReference { kind: &'static str, id: String },
    #[error("invalid primary key: entity {entity} attribute {attribute}")]
    InvalidPrimaryKey { entity: String, attribute: String },
    #[error("duplicate entity: {0}")]
    DuplicateEntity(String),
    #[error("config load: {0}")]
    Load(String),
    #[error("validation: {0}")]
    Validation(String),
}

/// Failure reading a required environment variable.
#[derive(Error, Debug, PartialEq, Eq)]
pub enum EnvError {
    #[error("No {0} found in environment.")]
    Missing(String),
    #[error("invalid value for {name}: {value}")]
    Invalid { name: String, value: String },
}

#[derive(Error, Debug)]
pub enum AppError {
    #[error(transparent)]
    Config(#[from] ConfigError),
    #[error("{}", .0.as_deref().unwrap_or("forbidden"))]
    Forbidden(Option<String>),
    #[error("Requested resource not found")]
    NotFound,
    #[error("{0}")]
    NoStatus(String),
    #[error("{0}")]
    InvalidTransition(String),
    #[error("database: {0}")]
    Db(#[from] sqlx::Error),
    #[error("request body is required")]
    MissingBody,
    #[error("bad request: {0}")]
    BadRequest(String),
    #[error("authenticated actor required")]
    Unauthorized,
    #[error("{0}")]
    Internal(String),
}

impl AppError {
    /// Error kind name, used as the JSON:API error `title`.
    pub fn kind(&self) -> &'static str {
        match self {
            AppError::Config(_) => "ConfigError",
            AppError::Forbidden(_) => "Forbidden",
            AppError::NotFound | AppError::NoStatus(_) => "NotFound",
            AppError::InvalidTransition(_) => "InvalidTransition",
            AppError::Db(sqlx::Error::Database(_)) => "DatabaseError",
            AppError::Db(_) => "PersistenceError",
            AppError::MissingBody => "MissingBody",
            AppError::BadRequest(_) => "BadRequest",
            AppError::Unauthorized => "Unauthorized",
            AppError::Internal(_) => "InternalError",
        }
    }

    pub fn status(&self) -> StatusCode {
        match self {
            AppError::Config(_) | AppError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
            AppError::Forbidden(_) => StatusCode::FORBIDDEN,
            AppError::NotFound | AppError::NoStatus(_) => StatusCode::NOT_FOUND,
            AppError::InvalidTransition(_) => StatusCode::CONFLICT,
            AppError::Db(e) => match e {
                sqlx::Error::RowNotFound => StatusCode::NOT_FOUND,
                sqlx::Error::Database(_) => StatusCode::BAD_REQUEST,
                _ => StatusCode::INTERNAL_SERVER_ERROR,
            },
            AppError::MissingBody | AppError::BadRequest(_) => StatusCode::BAD_REQUEST,
            AppError::Unauthorized => StatusCode::UNAUTHORIZED,
        }
    }

    /// Message surfaced as `detail`. Forbidden without a custom message and a missing body carry none.
    fn detail(&self) -> Option<String> {
        match self {
            AppError::Forbidden(None) | AppError::MissingBody => None,
            other => Some(other.to_string()),
        }
    }

    fn extra(&self) -> Option<serde_json::Value> {
        match self {
            AppError::Db(sqlx::Error::Database(db)) => db
                .code()
                .map(|code| serde_json::json!({ "sqlState": code.as_ref() })),
            _ => None,
        }
    }

    pub fn to_document(&self) -> ErrorDocument {
        let status = self.status();
        ErrorDocument::single(ErrorObject {
            status: status.as_u16().to_string(),
            code: status.as_u16().to_string(),
            title: self.kind().to_string(),
            detail: self.detail(),
            meta: self.extra(),
        })
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let status = self.status();
        if status.is_server_error() {
            tracing::error!(kind = self.kind(), error = %self, "request failed");
        } else {
            tracing::warn!(kind = self.kind(), error = %self, "request rejected");
        }
        (status, Json(self.to_document())).into_response()
    }
}
