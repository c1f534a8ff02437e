//! PostgreSQL store: descriptors compiled by `sql::builder`, executed with text-bound params.

use crate::config::{ResolvedModel, ResourceDescriptor};
use crate::error::AppError;
use crate::query::QueryDescriptor;
use crate::sql::{self, bind_all, QueryBuf};
use crate::store::ResourceStore;
use async_trait::async_trait;
use serde_json::{Map, Value};
use sqlx::postgres::PgRow;
use sqlx::{PgPool, Row};
use std::sync::Arc;

#[derive(Clone)]
pub struct PgStore {
    pool: PgPool,
    model: Arc<ResolvedModel>,
}

impl PgStore {
    pub fn new(pool: PgPool, model: Arc<ResolvedModel>) -> Self {
        PgStore { pool, model }
    }

    pub fn pool(&self) -> &PgPool {
        &self.pool
    }

    async fn fetch_all(&self, q: &QueryBuf) -> Result<Vec<Value>, AppError> {
        tracing::debug!(sql = %q.sql, params = ?q.params, "query");
        let rows = bind_all(sqlx::query(&q.sql), &q.params).fetch_all(&self.pool).await?;
        Ok(rows.iter().map(row_to_json).collect())
    }

    async fn fetch_optional(&self, q: &QueryBuf) -> Result<Option<Value>, AppError> {
        tracing::debug!(sql = %q.sql, params = ?q.params, "query");
        let row = bind_all(sqlx::query(&q.sql), &q.params)
            .fetch_optional(&self.pool)
            .await?;
        Ok(row.as_ref().map(row_to_json))
    }

    async fn execute(&self, q: &QueryBuf) -> Result<u64, AppError> {
        tracing::debug!(sql = %q.sql, params = ?q.params, "execute");
        let done = bind_all(sqlx::query(&q.sql), &q.params).execute(&self.pool).await?;
        Ok(done.rows_affected())
    }
}

#[async_trait]
impl ResourceStore for PgStore {
    async fn find_and_count_all(
        &self,
        resource: &ResourceDescriptor,
        query: &QueryDescriptor,
    ) -> Result<(Vec<Value>, u64), AppError> {
        let rows = self.fetch_all(&sql::select(&self.model, resource, query)).await?;
        let q = sql::count(resource, query);
        tracing::debug!(sql = %q.sql, params = ?q.params, "count");
        let count: i64 = bind_all(sqlx::query(&q.sql), &q.params)
            .fetch_one(&self.pool)
            .await?
            .try_get(0)?;
        Ok((rows, count.max(0) as u64))
    }

    async fn find_one(
        &self,
        resource: &ResourceDescriptor,
        query: &QueryDescriptor,
    ) -> Result<Option<Value>, AppError> {
        self.fetch_optional(&sql::select(&self.model, resource, query)).await
    }

    async fn create(&self, resource: &ResourceDescriptor, values: &Map<String, Value>) -> Result<Value, AppError> {
        self.fetch_optional(&sql::insert(resource, values))
            .await?
            .ok_or(AppError::Db(sqlx::Error::RowNotFound))
    }

    async fn update(
        &self,
        resource: &ResourceDescriptor,
        id: &Value,
        values: &Map<String, Value>,
    ) -> Result<u64, AppError> {
        self.execute(&sql::update(resource, id, values)).await
    }

    async fn destroy(&self, resource: &ResourceDescriptor, id: &Value) -> Result<u64, AppError> {
        self.execute(&sql::delete(resource, id)).await
    }

    async fn ping(&self) -> Result<(), AppError> {
        sqlx::query("SELECT 1").execute(&self.pool).await?;
        Ok(())
    }
}

/// Plain object keyed by output column name.
fn row_to_json(row: &PgRow) -> Value {
    use sqlx::Column;
    let map: Map<String, Value> = row
        .columns()
        .iter()
        .map(|col| (col.name().to_string(), cell_to_value(row, col.ordinal())))
        .collect();
    Value::Object(map)
}

/// First decoding that matches the column type wins; SQL NULL and unknown types become `null`.
fn cell_to_value(row: &PgRow, idx: usize) -> Value {
    macro_rules! try_decode {
        ($ty:ty, $conv:expr) => {
            if let Ok(v) = row.try_get::<Option<$ty>, _>(idx) {
                return v.map($conv).unwrap_or(Value::Null);
            }
        };
    }
    try_decode!(i16, |n| Value::Number(n.into()));
    try_decode!(i32, |n| Value::Number(n.into()));
    try_decode!(i64, |n| Value::Number(n.into()));
    try_decode!(f32, |n| serde_json::Number::from_f64(n as f64).map(Value::Number).unwrap_or(Value::Null));
    try_decode!(f64, |n| serde_json::Number::from_f64(n).map(Value::Number).unwrap_or(Value::Null));
    try_decode!(bool, Value::Bool);
    try_decode!(uuid::Uuid, |u| Value::String(u.to_string()));
    try_decode!(chrono::DateTime<chrono::Utc>, |d| Value::String(d.to_rfc3339()));
    try_decode!(chrono::NaiveDateTime, |d| Value::String(
        d.format("%Y-%m-%dT%H:%M:%S%.f").to_string()
    ));
    try_decode!(chrono::NaiveDate, |d| Value::String(d.format("%Y-%m-%d").to_string()));
    try_decode!(Value, |j| j);
    try_decode!(String, Value::String);
    Value::Null
}
