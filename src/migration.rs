//! Create the tables a resolved model expects. Idempotent: schemas and tables use IF NOT EXISTS,
//! foreign keys that already exist are skipped.

use crate::config::{AssociationKind, ResolvedModel, ResourceDescriptor};
use crate::error::AppError;
use sqlx::PgPool;
use std::collections::BTreeSet;

fn quote(s: &str) -> String {
    format!("\"{}\"", s.replace('"', "\"\""))
}

fn full_name(resource: &ResourceDescriptor) -> String {
    format!("{}.{}", quote(&resource.schema_name), quote(&resource.table_name))
}

fn create_table(resource: &ResourceDescriptor) -> String {
    let mut col_defs: Vec<String> = resource
        .attributes
        .iter()
        .map(|a| {
            let mut def = format!("{} {}", quote(&a.column), a.pg_type);
            if !a.nullable {
                def.push_str(" NOT NULL");
            }
            if let Some(d) = &a.default {
                def.push_str(" DEFAULT ");
                def.push_str(d);
            }
            def
        })
        .collect();
    if let Some(pk) = resource.primary_key_attribute() {
        col_defs.push(format!("PRIMARY KEY ({})", quote(&pk.column)));
    }
    format!(
        "CREATE TABLE IF NOT EXISTS {} (\n  {}\n)",
        full_name(resource),
        col_defs.join(",\n  ")
    )
}

/// `ALTER TABLE ... ADD CONSTRAINT ... FOREIGN KEY` for each to-one association.
fn foreign_keys(model: &ResolvedModel, resource: &ResourceDescriptor) -> Vec<String> {
    resource
        .associations
        .iter()
        .filter(|a| a.kind == AssociationKind::ToOne)
        .filter_map(|a| {
            let target = model.resource(&a.target)?;
            let fk = resource.attribute(&a.foreign_key)?;
            let pk = target.primary_key_attribute()?;
            let constraint = format!("{}_{}_fkey", resource.table_name, fk.column);
            Some(format!(
                "ALTER TABLE {} ADD CONSTRAINT {} FOREIGN KEY ({}) REFERENCES {} ({}) ON DELETE SET NULL",
                full_name(resource),
                quote(&constraint),
                quote(&fk.column),
                full_name(target),
                quote(&pk.column)
            ))
        })
        .collect()
}

/// Every DDL statement for the model, in dependency order: schemas, tables, then foreign keys.
pub fn schema_statements(model: &ResolvedModel) -> Vec<String> {
    let schemas: BTreeSet<&str> = model.resources.iter().map(|r| r.schema_name.as_str()).collect();
    let mut out: Vec<String> = schemas
        .into_iter()
        .map(|s| format!("CREATE SCHEMA IF NOT EXISTS {}", quote(s)))
        .collect();
    out.extend(model.resources.iter().map(create_table));
    out
}

/// Apply `schema_statements`, then add foreign keys, ignoring constraints that already exist.
pub async fn sync_schema(pool: &PgPool, model: &ResolvedModel) -> Result<(), AppError> {
    for sql in schema_statements(model) {
        tracing::debug!(sql = %sql, "ddl");
        sqlx::query(&sql).execute(pool).await?;
    }
    for resource in &model.resources {
        for sql in foreign_keys(model, resource) {
            if let Err(e) = sqlx::query(&sql).execute(pool).await {
                tracing::debug!(error = %e, sql = %sql, "foreign key skipped");
            }
        }
    }
    tracing::info!(tables = model.resources.len(), "schema synced");
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::{resolve, sample_config};

    #[test]
    fn creates_schema_then_tables() {
        let model = resolve(&sample_config()).unwrap();
        let statements = schema_statements(&model);
        assert_eq!(statements[0], "CREATE SCHEMA IF NOT EXISTS \"public\"");
        assert_eq!(statements.len(), 1 + model.resources.len());
        let articles = statements
            .iter()
            .find(|s| s.contains("\"public\".\"articles\""))
            .unwrap();
        assert!(articles.contains("\"id\" serial NOT NULL"));
        assert!(articles.contains("\"status\" text DEFAULT 'draft'"));
        assert!(articles.contains("\"created_at\" timestamptz NOT NULL DEFAULT NOW()"));
        assert!(articles.ends_with("PRIMARY KEY (\"id\")\n)"));
    }

    #[test]
    fn foreign_keys_for_to_one_only() {
        let model = resolve(&sample_config()).unwrap();
        let user = model.resource("user").unwrap();
        assert!(foreign_keys(&model, user).is_empty());
        let secret = model.resource("secret").unwrap();
        assert_eq!(
            foreign_keys(&model, secret),
            vec!["ALTER TABLE \"public\".\"secrets\" ADD CONSTRAINT \"secrets_user_id_fkey\" FOREIGN KEY (\"user_id\") REFERENCES \"public\".\"users\" (\"id\") ON DELETE SET NULL"]
        );
    }
}
