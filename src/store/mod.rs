//! Persistence seam. Controllers hand compiled descriptors to a `ResourceStore`
//! and get plain JSON objects back.

mod pg;

pub use pg::PgStore;

use crate::config::ResourceDescriptor;
use crate::error::AppError;
use crate::query::{QueryDescriptor, WhereClause};
use async_trait::async_trait;
use serde_json::{Map, Value};

#[async_trait]
pub trait ResourceStore: Send + Sync {
    /// Rows for the descriptor plus the total count ignoring limit/offset.
    async fn find_and_count_all(
        &self,
        resource: &ResourceDescriptor,
        query: &QueryDescriptor,
    ) -> Result<(Vec<Value>, u64), AppError>;

    async fn find_one(
        &self,
        resource: &ResourceDescriptor,
        query: &QueryDescriptor,
    ) -> Result<Option<Value>, AppError>;

    /// Insert one row. Returns at least the new primary key.
    async fn create(&self, resource: &ResourceDescriptor, values: &Map<String, Value>) -> Result<Value, AppError>;

    /// Update by primary key. Returns the number of rows touched.
    async fn update(
        &self,
        resource: &ResourceDescriptor,
        id: &Value,
        values: &Map<String, Value>,
    ) -> Result<u64, AppError>;

    /// Delete by primary key. Returns the number of rows removed.
    async fn destroy(&self, resource: &ResourceDescriptor, id: &Value) -> Result<u64, AppError>;

    async fn ping(&self) -> Result<(), AppError>;
}

/// Update the first row matching `where_clause`, or create one from `where_clause` overlaid with `values`.
/// Returns the primary key and whether a row was created.
pub async fn update_or_create(
    store: &dyn ResourceStore,
    resource: &ResourceDescriptor,
    values: &Map<String, Value>,
    where_clause: WhereClause,
) -> Result<(Value, bool), AppError> {
    let lookup = QueryDescriptor {
        attributes: Some(vec![resource.primary_key.clone()]),
        where_clause: where_clause.clone(),
        include: Vec::new(),
        order: Vec::new(),
        limit: Some(1),
        offset: None,
        distinct: None,
    };
    if let Some(row) = store.find_one(resource, &lookup).await? {
        let id = row.get(&resource.primary_key).cloned().unwrap_or(Value::Null);
        store.update(resource, &id, values).await?;
        return Ok((id, false));
    }
    let mut merged = where_clause;
    merged.extend(values.clone());
    let created = store.create(resource, &merged).await?;
    let id = created.get(&resource.primary_key).cloned().unwrap_or(Value::Null);
    Ok((id, true))
}
