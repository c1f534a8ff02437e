//! Axum handlers for one resource controller.

use crate::controller::ResourceController;
use crate::error::AppError;
use crate::extractors::{Actor, RequestLocals};
use crate::query::QueryRequest;
use crate::response::{no_content, JsonApi};
use axum::{
    body::Bytes,
    extract::{Path, Query, State},
    http::StatusCode,
};
use serde_json::Value;
use std::sync::Arc;

pub type ControllerState = State<Arc<ResourceController>>;

/// Empty body is "no body"; anything else must be JSON.
fn parse_body(body: &Bytes) -> Result<Option<Value>, AppError> {
    if body.iter().all(u8::is_ascii_whitespace) {
        return Ok(None);
    }
    serde_json::from_slice(body)
        .map(Some)
        .map_err(|e| AppError::BadRequest(format!("invalid JSON body: {}", e)))
}

pub async fn list(
    State(controller): ControllerState,
    locals: RequestLocals,
    Query(pairs): Query<Vec<(String, String)>>,
) -> Result<JsonApi, AppError> {
    let req = QueryRequest::from_pairs(pairs);
    controller.handle_query(&locals, &req).await.map(JsonApi)
}

pub async fn read(
    State(controller): ControllerState,
    locals: RequestLocals,
    Path(id): Path<String>,
    Query(pairs): Query<Vec<(String, String)>>,
) -> Result<JsonApi, AppError> {
    let req = QueryRequest::from_pairs(pairs);
    controller.handle_query_by_id(&locals, &req, &id).await.map(JsonApi)
}

pub async fn create(
    State(controller): ControllerState,
    locals: RequestLocals,
    body: Bytes,
) -> Result<JsonApi, AppError> {
    let body = parse_body(&body)?;
    controller.handle_create(&locals, body.as_ref()).await.map(JsonApi)
}

pub async fn update(
    State(controller): ControllerState,
    locals: RequestLocals,
    actor: Option<Actor>,
    Path(id): Path<String>,
    body: Bytes,
) -> Result<JsonApi, AppError> {
    let body = parse_body(&body)?;
    controller
        .handle_update_by_id(&locals, actor.as_ref(), &id, body.as_ref())
        .await
        .map(JsonApi)
}

pub async fn delete(
    State(controller): ControllerState,
    locals: RequestLocals,
    Path(id): Path<String>,
) -> Result<StatusCode, AppError> {
    controller.handle_delete_by_id(&locals, &id).await?;
    Ok(no_content())
}

pub async fn review(
    State(controller): ControllerState,
    locals: RequestLocals,
    actor: Option<Actor>,
    Path(id): Path<String>,
) -> Result<JsonApi, AppError> {
    controller.handle_review(&locals, actor.as_ref(), &id).await.map(JsonApi)
}

pub async fn publish(
    State(controller): ControllerState,
    locals: RequestLocals,
    actor: Option<Actor>,
    Path(id): Path<String>,
) -> Result<JsonApi, AppError> {
    controller.handle_publish(&locals, actor.as_ref(), &id).await.map(JsonApi)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn blank_body_is_absent() {
        assert!(parse_body(&Bytes::from_static(b"")).unwrap().is_none());
        assert!(parse_body(&Bytes::from_static(b"  \n")).unwrap().is_none());
        assert!(parse_body(&Bytes::from_static(b"{\"data\":null}")).unwrap().is_some());
        assert!(matches!(parse_body(&Bytes::from_static(b"{")), Err(AppError::BadRequest(_))));
    }
}
