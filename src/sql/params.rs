//! Bind values. Every parameter is sent as text and cast in SQL to the attribute's type.

use serde_json::Value;
use sqlx::postgres::{PgArguments, Postgres};
use sqlx::query::Query;

/// Text form of a JSON value for binding; `None` binds SQL NULL.
pub fn bind_text(v: &Value) -> Option<String> {
    match v {
        Value::Null => None,
        Value::Bool(b) => Some(b.to_string()),
        Value::Number(n) => Some(n.to_string()),
        Value::String(s) => Some(s.clone()),
        Value::Array(_) | Value::Object(_) => Some(v.to_string()),
    }
}

/// Bind all params in order.
pub fn bind_all<'q>(mut query: Query<'q, Postgres, PgArguments>, params: &[Value]) -> Query<'q, Postgres, PgArguments> {
    for p in params {
        query = query.bind(bind_text(p));
    }
    query
}

/// Type used in `$n::type` casts. Serial pseudo-types are not castable.
pub fn cast_type(pg_type: &str) -> &str {
    match pg_type.to_ascii_lowercase().as_str() {
        "serial" | "serial4" => "integer",
        "bigserial" | "serial8" => "bigint",
        "smallserial" | "serial2" => "smallint",
        _ => pg_type,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn text_forms() {
        assert_eq!(bind_text(&json!(null)), None);
        assert_eq!(bind_text(&json!(3)), Some("3".into()));
        assert_eq!(bind_text(&json!(true)), Some("true".into()));
        assert_eq!(bind_text(&json!("draft")), Some("draft".into()));
        assert_eq!(bind_text(&json!({ "a": 1 })), Some("{\"a\":1}".into()));
    }

    #[test]
    fn serial_casts_to_integer() {
        assert_eq!(cast_type("serial"), "integer");
        assert_eq!(cast_type("BIGSERIAL"), "bigint");
        assert_eq!(cast_type("timestamptz"), "timestamptz");
    }
}
