//! Plain rows -> JSON:API document.

use crate::jsonapi::config::{RelationConfig, SerializerConfig};
use serde::Serialize;
use serde_json::{Map, Value};
use std::collections::HashSet;

#[derive(Clone, Debug, Serialize)]
pub struct Document {
    pub data: Value,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub included: Option<Vec<Value>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub meta: Option<Value>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub links: Option<Value>,
}

fn id_string(v: &Value) -> Option<String> {
    match v {
        Value::String(s) => Some(s.clone()),
        Value::Number(n) => Some(n.to_string()),
        Value::Bool(b) => Some(b.to_string()),
        _ => None,
    }
}

struct Included {
    items: Vec<Value>,
    seen: HashSet<(String, String)>,
}

impl Included {
    fn push(&mut self, type_name: &str, id: &str, resource: Value) {
        if self.seen.insert((type_name.to_string(), id.to_string())) {
            self.items.push(resource);
        }
    }
}

fn identifier(type_name: &str, id: String) -> Value {
    serde_json::json!({ "type": type_name, "id": id })
}

fn relation_config(relation: &RelationConfig) -> SerializerConfig {
    SerializerConfig {
        id: relation.ref_key.clone(),
        attributes: relation.attributes.clone(),
        ..SerializerConfig::default()
    }
}

fn relationship_data(
    key: &str,
    value: &Value,
    relation: &RelationConfig,
    key_case: crate::case::KeyCase,
    included: &mut Included,
) -> Value {
    let type_name = relation.type_name.as_deref().unwrap_or(key);
    match value {
        Value::Array(items) => Value::Array(
            items
                .iter()
                .map(|item| relationship_data(key, item, relation, key_case, included))
                .filter(|v| !v.is_null())
                .collect(),
        ),
        Value::Object(obj) => {
            let Some(id) = obj.get(&relation.ref_key).and_then(id_string) else {
                return Value::Null;
            };
            if relation.included {
                let mut nested = relation_config(relation);
                nested.key_for_attribute = key_case;
                let resource = resource_object(type_name, obj, &nested, included);
                included.push(type_name, &id, resource);
            }
            identifier(type_name, id)
        }
        Value::Null => Value::Null,
        scalar => match id_string(scalar) {
            Some(id) => identifier(type_name, id),
            None => Value::Null,
        },
    }
}

fn resource_object(type_name: &str, record: &Map<String, Value>, config: &SerializerConfig, included: &mut Included) -> Value {
    let mut out = Map::new();
    out.insert("type".into(), Value::String(type_name.to_string()));
    if let Some(id) = record.get(&config.id).and_then(id_string) {
        out.insert("id".into(), Value::String(id));
    }

    let keys: Vec<&String> = if config.attributes.is_empty() {
        record.keys().filter(|k| **k != config.id).collect()
    } else {
        config.attributes.iter().collect()
    };

    let mut attributes = Map::new();
    let mut relationships = Map::new();
    for key in keys {
        let Some(value) = record.get(key) else { continue };
        let wire_key = config.key_for_attribute.apply(key);
        match config.relations.get(key) {
            Some(relation) => {
                let data = relationship_data(key, value, relation, config.key_for_attribute, included);
                relationships.insert(wire_key, serde_json::json!({ "data": data }));
            }
            None => {
                attributes.insert(wire_key, value.clone());
            }
        }
    }
    if !attributes.is_empty() {
        out.insert("attributes".into(), Value::Object(attributes));
    }
    if !relationships.is_empty() {
        out.insert("relationships".into(), Value::Object(relationships));
    }
    Value::Object(out)
}

/// Serialize a plain record or array of records of `type_name`.
pub fn serialize(type_name: &str, payload: &Value, config: &SerializerConfig, meta: Option<Value>) -> Document {
    let mut included = Included {
        items: Vec::new(),
        seen: HashSet::new(),
    };
    let data = match payload {
        Value::Array(rows) => Value::Array(
            rows.iter()
                .filter_map(Value::as_object)
                .map(|row| resource_object(type_name, row, config, &mut included))
                .collect(),
        ),
        Value::Object(row) => resource_object(type_name, row, config, &mut included),
        _ => Value::Null,
    };
    Document {
        data,
        included: (!included.items.is_empty()).then_some(included.items),
        meta,
        links: None,
    }
}

/// Drop relationships whose `data` is null from a single-resource document.
pub fn remove_null_relations(document: &mut Value) {
    if let Some(relationships) = document
        .get_mut("data")
        .and_then(|d| d.get_mut("relationships"))
        .and_then(Value::as_object_mut)
    {
        relationships.retain(|_, rel| !rel.get("data").map_or(true, Value::is_null));
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::case::KeyCase;
    use crate::jsonapi::config::RelationConfig;
    use serde_json::json;

    fn user_config() -> SerializerConfig {
        let mut config = SerializerConfig {
            attributes: vec!["firstName".into(), "lastName".into(), "secrets".into()],
            ..SerializerConfig::default()
        };
        config.relations.insert(
            "secrets".into(),
            RelationConfig {
                attributes: vec!["text".into()],
                ..RelationConfig::default()
            },
        );
        config
    }

    #[test]
    fn serializes_single_record_with_included_relation() {
        let row = json!({
            "id": 1,
            "firstName": "Ada",
            "lastName": "Lovelace",
            "secrets": [ { "id": 10, "text": "s1", "userId": 1 }, { "id": 11, "text": "s2", "userId": 1 } ]
        });
        let doc = serde_json::to_value(serialize("users", &row, &user_config(), None)).unwrap();
        assert_eq!(doc["data"]["id"], "1");
        assert_eq!(doc["data"]["type"], "users");
        assert_eq!(doc["data"]["attributes"], json!({ "firstName": "Ada", "lastName": "Lovelace" }));
        assert_eq!(
            doc["data"]["relationships"]["secrets"]["data"],
            json!([{ "type": "secrets", "id": "10" }, { "type": "secrets", "id": "11" }])
        );
        assert_eq!(doc["included"][0], json!({ "type": "secrets", "id": "10", "attributes": { "text": "s1" } }));
        assert!(doc.get("meta").is_none());
    }

    #[test]
    fn deduplicates_included_and_keeps_meta() {
        let author = json!({ "id": 5, "firstName": "Grace" });
        let rows = json!([
            { "id": 1, "title": "a", "author": author },
            { "id": 2, "title": "b", "author": author },
            { "id": 3, "title": "c", "author": null }
        ]);
        let mut config = SerializerConfig {
            attributes: vec!["title".into(), "author".into()],
            ..SerializerConfig::default()
        };
        config.relations.insert(
            "author".into(),
            RelationConfig {
                type_name: Some("users".into()),
                ..RelationConfig::default()
            },
        );
        let doc = serialize("articles", &rows, &config, Some(json!({ "pagination": { "count": 3 } })));
        let doc = serde_json::to_value(doc).unwrap();
        assert_eq!(doc["data"].as_array().unwrap().len(), 3);
        assert_eq!(doc["included"].as_array().unwrap().len(), 1);
        assert_eq!(doc["data"][2]["relationships"]["author"]["data"], Value::Null);
        assert_eq!(doc["meta"]["pagination"]["count"], 3);
    }

    #[test]
    fn applies_key_case_and_scalar_relations() {
        let mut config = SerializerConfig {
            attributes: vec!["firstName".into(), "team".into()],
            key_for_attribute: KeyCase::Dash,
            ..SerializerConfig::default()
        };
        config.relations.insert("team".into(), RelationConfig::default());
        let doc = serialize("users", &json!({ "id": "u1", "firstName": "A", "team": 4 }), &config, None);
        let doc = serde_json::to_value(doc).unwrap();
        assert_eq!(doc["data"]["attributes"]["first-name"], "A");
        assert_eq!(doc["data"]["relationships"]["team"]["data"], json!({ "type": "team", "id": "4" }));
        assert!(doc.get("included").is_none());
    }

    #[test]
    fn removes_null_relations() {
        let mut doc = json!({
            "data": { "type": "articles", "id": "1", "relationships": {
                "author": { "data": null },
                "comments": { "data": [] }
            } }
        });
        remove_null_relations(&mut doc);
        let rels = doc["data"]["relationships"].as_object().unwrap();
        assert!(!rels.contains_key("author"));
        assert!(rels.contains_key("comments"));
    }
}
