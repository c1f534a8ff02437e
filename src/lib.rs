//! JSON:API resource controllers: query-string filtering, sorting, paging and includes compiled
//! into store queries, rows rendered as JSON:API documents.

pub mod case;
pub mod config;
pub mod controller;
pub mod error;
pub mod extractors;
pub mod handlers;
pub mod jsonapi;
pub mod migration;
pub mod query;
pub mod response;
pub mod routes;
pub mod sql;
pub mod store;
pub mod telemetry;
pub mod workflow;

pub use config::{load_from_dir, parse_model, require_from_env, resolve, ModelConfig, ResolvedModel, ServerConfig};
pub use controller::{ControllerOptions, ResourceController, SERVER_MANAGED_ATTRIBUTES};
pub use error::{AppError, ConfigError, EnvError};
pub use extractors::{Actor, RequestLocals};
pub use jsonapi::{Mode, ModelSerializer, SerializerConfig, SerializerConfigGenerator, SerializerRegistry};
pub use migration::sync_schema;
pub use query::{QueryCompiler, QueryDescriptor, QueryRequest};
pub use routes::{common_routes, resource_routes};
pub use store::{update_or_create, PgStore, ResourceStore};
pub use telemetry::init_tracing;
