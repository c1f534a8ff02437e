//! JSON:API response helpers.

use crate::jsonapi::Document;
use axum::{
    http::{header, StatusCode},
    response::{IntoResponse, Response},
    Json,
};

pub const JSONAPI_MEDIA_TYPE: &str = "application/vnd.api+json";

/// A serialized document answered with 200 and the JSON:API media type.
pub struct JsonApi(pub Document);

impl IntoResponse for JsonApi {
    fn into_response(self) -> Response {
        (StatusCode::OK, [(header::CONTENT_TYPE, JSONAPI_MEDIA_TYPE)], Json(self.0)).into_response()
    }
}

pub fn no_content() -> StatusCode {
    StatusCode::NO_CONTENT
}
