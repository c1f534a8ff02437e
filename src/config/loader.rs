//! Resolve the model from in-memory config or from a directory of JSON files.

use crate::case::to_snake_case;
use crate::config::resolved::{Association, AttributeInfo, ResolvedModel, ResourceDescriptor};
use crate::config::{validate, ModelConfig};
use crate::error::ConfigError;
use std::collections::HashMap;
use std::path::Path;

const DEFAULT_SCHEMA: &str = "public";

/// Build resolved model from config (validates first).
pub fn resolve(config: &ModelConfig) -> Result<ResolvedModel, ConfigError> {
    validate(config)?;

    let mut resources = Vec::with_capacity(config.entities.len());
    let mut by_name = HashMap::new();

    for e in &config.entities {
        let mut attributes: Vec<AttributeInfo> = e
            .attributes
            .iter()
            .map(|a| AttributeInfo {
                name: a.name.clone(),
                column: a.column.clone().unwrap_or_else(|| to_snake_case(&a.name)),
                pg_type: a.type_.clone(),
                nullable: a.nullable && a.name != e.primary_key,
                default: a.default.clone(),
            })
            .collect();

        if e.timestamps {
            for name in ["createdAt", "updatedAt"] {
                if !attributes.iter().any(|a| a.name == name) {
                    attributes.push(AttributeInfo {
                        name: name.to_string(),
                        column: to_snake_case(name),
                        pg_type: "timestamptz".into(),
                        nullable: false,
                        default: Some("NOW()".into()),
                    });
                }
            }
        }

        let associations = e
            .associations
            .iter()
            .map(|a| Association {
                name: a.name.clone(),
                target: a.target.clone(),
                kind: a.kind,
                foreign_key: a.foreign_key.clone(),
                alias: a.alias.clone(),
            })
            .collect();

        by_name.insert(e.name.clone(), resources.len());
        resources.push(ResourceDescriptor {
            name: e.name.clone(),
            schema_name: e.schema.clone().unwrap_or_else(|| DEFAULT_SCHEMA.into()),
            table_name: e.table.clone(),
            type_name: e.type_name.clone().unwrap_or_else(|| e.table.clone()),
            path_segment: e.path_segment.clone().unwrap_or_else(|| e.name.clone()),
            primary_key: e.primary_key.clone(),
            attributes,
            associations,
            timestamps: e.timestamps,
        });
    }

    Ok(ResolvedModel { resources, by_name })
}

/// Parse config from a JSON document of the form `{ "entities": [...] }`.
pub fn parse_model(json: &str) -> Result<ModelConfig, ConfigError> {
    serde_json::from_str(json).map_err(|e| ConfigError::Load(e.to_string()))
}

/// Load `entities.json` from `dir`.
pub async fn load_from_dir(dir: impl AsRef<Path>) -> Result<ModelConfig, ConfigError> {
    let path = dir.as_ref().join("entities.json");
    tracing::debug!(path = %path.display(), "loading model config");
    let raw = tokio::fs::read_to_string(&path)
        .await
        .map_err(|e| ConfigError::Load(format!("{}: {}", path.display(), e)))?;
    parse_model(&raw)
}
