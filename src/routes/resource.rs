//! Resource routes mounted at the entity's path segment.

use crate::controller::ResourceController;
use crate::handlers::resource::{create, delete, list, publish, read, review, update};
use axum::{
    routing::{get, post},
    Router,
};
use std::sync::Arc;
use tower_http::limit::RequestBodyLimitLayer;

/// Default request body limit for resource writes.
pub const DEFAULT_BODY_LIMIT: usize = 1024 * 1024;

/// `GET|POST /<segment>`, `GET|PATCH|DELETE /<segment>/:id`, `POST /<segment>/:id/review|publish`.
pub fn resource_routes(controller: Arc<ResourceController>) -> Router {
    resource_routes_with_limit(controller, DEFAULT_BODY_LIMIT)
}

pub fn resource_routes_with_limit(controller: Arc<ResourceController>, body_limit: usize) -> Router {
    let base = format!("/{}", controller.resource().path_segment);
    let item = format!("{}/:id", base);
    Router::new()
        .route(&base, get(list).post(create))
        .route(&item, get(read).patch(update).delete(delete))
        .route(&format!("{}/review", item), post(review))
        .route(&format!("{}/publish", item), post(publish))
        .layer(RequestBodyLimitLayer::new(body_limit))
        .with_state(controller)
}
