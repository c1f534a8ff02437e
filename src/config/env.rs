//! Environment lookups. Missing required variables are returned as errors; the binary decides whether to exit.

use crate::error::EnvError;

/// Default bind address for the HTTP listener.
pub const DEFAULT_BIND_ADDR: &str = "0.0.0.0:3000";

/// Default directory holding `entities.json`.
pub const DEFAULT_MODEL_PATH: &str = "model";

/// Default maximum connections in the PostgreSQL pool.
pub const DEFAULT_DB_MAX_CONNECTIONS: u32 = 5;

/// Read `variable` from the environment. Empty values count as absent.
/// Falls back to `fallback` when given; otherwise reports `EnvError::Missing`.
pub fn require_from_env(variable: &str, fallback: Option<&str>) -> Result<String, EnvError> {
    match std::env::var(variable) {
        Ok(value) if !value.is_empty() => Ok(value),
        _ => match fallback {
            Some(f) if !f.is_empty() => Ok(f.to_string()),
            _ => {
                tracing::error!(variable, "No {} found in environment. You probably forgot to export the correct variables.", variable);
                Err(EnvError::Missing(variable.to_string()))
            }
        },
    }
}

/// Process-level settings for a server built on this crate.
#[derive(Clone, Debug)]
pub struct ServerConfig {
    pub database_url: String,
    pub bind_addr: String,
    pub model_path: String,
    pub db_max_connections: u32,
}

impl ServerConfig {
    /// Load `.env` (if present) then read settings. `DATABASE_URL` is required.
    pub fn from_env() -> Result<Self, EnvError> {
        dotenvy::dotenv().ok();
        let db_max_connections = match std::env::var("DB_MAX_CONNECTIONS") {
            Ok(raw) => raw.parse().map_err(|_| EnvError::Invalid {
                name: "DB_MAX_CONNECTIONS".into(),
                value: raw,
            })?,
            Err(_) => DEFAULT_DB_MAX_CONNECTIONS,
        };
        Ok(ServerConfig {
            database_url: require_from_env("DATABASE_URL", None)?,
            bind_addr: require_from_env("BIND_ADDR", Some(DEFAULT_BIND_ADDR))?,
            model_path: require_from_env("MODEL_PATH", Some(DEFAULT_MODEL_PATH))?,
            db_max_connections,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn falls_back_when_absent() {
        let value = require_from_env("JSONAPI_RESOURCE_TEST_NOT_FOUND", Some("fallback")).unwrap();
        assert_eq!(value, "fallback");
    }

    #[test]
    fn prefers_environment_over_fallback() {
        std::env::set_var("JSONAPI_RESOURCE_TEST_WOW", "wow");
        let value = require_from_env("JSONAPI_RESOURCE_TEST_WOW", Some("failed")).unwrap();
        assert_eq!(value, "wow");
        std::env::remove_var("JSONAPI_RESOURCE_TEST_WOW");
    }

    #[test]
    fn missing_without_fallback_is_an_error() {
        let err = require_from_env("JSONAPI_RESOURCE_TEST_MISSING", None).unwrap_err();
        assert_eq!(err, EnvError::Missing("JSONAPI_RESOURCE_TEST_MISSING".into()));
    }
}
