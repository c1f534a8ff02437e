//! JSON:API request document -> flat record ready for the store.

use crate::error::AppError;
use crate::jsonapi::config::{id_only, ResourceIdentifier, SerializerConfig};
use serde_json::{Map, Value};

fn identifier(value: &Value) -> Option<ResourceIdentifier> {
    let obj = value.as_object()?;
    Some(ResourceIdentifier {
        type_name: obj.get("type").and_then(Value::as_str).unwrap_or_default().to_string(),
        id: obj.get("id").cloned().unwrap_or(Value::Null),
    })
}

fn relationship_value(data: &Value, config: &SerializerConfig, key: &str) -> Value {
    let mapper = config
        .relations
        .get(key)
        .and_then(|r| r.value_for_relationship)
        .unwrap_or(id_only);
    match data {
        Value::Array(items) => Value::Array(items.iter().filter_map(identifier).map(|i| mapper(&i)).collect()),
        other => identifier(other).map(|i| mapper(&i)).unwrap_or(Value::Null),
    }
}

/// Adds `<key>Id` for every top-level value that is a non-null, non-array object carrying an `id`.
pub fn synthesize_foreign_keys(record: &mut Map<String, Value>) {
    let ids: Vec<(String, Value)> = record
        .iter()
        .filter_map(|(key, value)| {
            let id = value.as_object()?.get("id")?;
            Some((format!("{}Id", key), id.clone()))
        })
        .collect();
    for (key, id) in ids {
        record.insert(key, id);
    }
}

fn deserialize_resource(resource: &Value, config: &SerializerConfig) -> Result<Map<String, Value>, AppError> {
    let resource = resource
        .as_object()
        .ok_or_else(|| AppError::BadRequest("resource object expected in data".into()))?;
    let mut record = Map::new();
    if let Some(id) = resource.get("id").filter(|v| !v.is_null()) {
        record.insert(config.id.clone(), id.clone());
    }
    if let Some(attributes) = resource.get("attributes").and_then(Value::as_object) {
        for (key, value) in attributes {
            record.insert(config.key_for_attribute.apply(key), value.clone());
        }
    }
    if let Some(relationships) = resource.get("relationships").and_then(Value::as_object) {
        for (key, relationship) in relationships {
            let Some(data) = relationship.get("data") else { continue };
            let value = relationship_value(data, config, key);
            record.insert(config.key_for_attribute.apply(key), value);
        }
    }
    synthesize_foreign_keys(&mut record);
    Ok(record)
}

/// Deserialize `{ data: {...} }` (or `{ data: [...] }`) into plain record(s).
pub fn deserialize(document: &Value, config: &SerializerConfig) -> Result<Value, AppError> {
    let data = document
        .get("data")
        .ok_or_else(|| AppError::BadRequest("document has no data member".into()))?;
    match data {
        Value::Array(items) => items
            .iter()
            .map(|item| deserialize_resource(item, config).map(Value::Object))
            .collect::<Result<Vec<_>, _>>()
            .map(Value::Array),
        other => deserialize_resource(other, config).map(Value::Object),
    }
}
