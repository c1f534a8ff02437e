pub mod env;
pub mod loader;
pub mod resolved;
pub mod types;
pub mod validator;

pub use env::*;
pub use loader::*;
pub use resolved::*;
pub use types::*;
pub use validator::*;

/// User/secret/article/comment model shared by unit tests.
#[cfg(test)]
pub(crate) fn sample_config() -> ModelConfig {
    serde_json::from_value(serde_json::json!({
        "entities": [
            {
                "name": "user",
                "table": "users",
                "attributes": [
                    { "name": "id", "type": "serial" },
                    { "name": "firstName", "nullable": false },
                    { "name": "lastName" }
                ],
                "associations": [
                    { "name": "secrets", "target": "secret", "kind": "to_many", "foreign_key": "userId" }
                ]
            },
            {
                "name": "secret",
                "table": "secrets",
                "attributes": [
                    { "name": "id", "type": "serial" },
                    { "name": "text" },
                    { "name": "userId", "type": "integer" }
                ],
                "associations": [
                    { "name": "user", "target": "user", "kind": "to_one", "foreign_key": "userId" }
                ]
            },
            {
                "name": "article",
                "table": "articles",
                "attributes": [
                    { "name": "id", "type": "serial" },
                    { "name": "title" },
                    { "name": "status", "default": "'draft'" },
                    { "name": "authorId", "type": "integer" },
                    { "name": "updatedById", "type": "integer" },
                    { "name": "reviewedById", "type": "integer" },
                    { "name": "publishedById", "type": "integer" }
                ],
                "associations": [
                    { "name": "user", "target": "user", "kind": "to_one", "foreign_key": "authorId", "alias": "author" },
                    { "name": "comments", "target": "comment", "kind": "to_many", "foreign_key": "articleId" }
                ]
            },
            {
                "name": "comment",
                "table": "comments",
                "attributes": [
                    { "name": "id", "type": "serial" },
                    { "name": "body" },
                    { "name": "articleId", "type": "integer" }
                ],
                "associations": [
                    { "name": "article", "target": "article", "kind": "to_one", "foreign_key": "articleId" }
                ]
            }
        ]
    }))
    .expect("sample model config")
}
