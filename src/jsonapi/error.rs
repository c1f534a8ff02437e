//! JSON:API error document.

use serde::Serialize;

#[derive(Clone, Debug, Serialize)]
pub struct ErrorObject {
    pub status: String,
    pub code: String,
    pub title: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub detail: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub meta: Option<serde_json::Value>,
}

#[derive(Clone, Debug, Serialize)]
pub struct ErrorDocument {
    pub errors: Vec<ErrorObject>,
}

impl ErrorDocument {
    pub fn single(error: ErrorObject) -> Self {
        ErrorDocument { errors: vec![error] }
    }
}
