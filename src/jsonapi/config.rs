//! Serializer configuration and the per-resource generator that produces it.

use crate::case::KeyCase;
use crate::config::{AssociationKind, ResolvedModel, ResourceDescriptor};
use serde_json::{json, Value};
use std::collections::{BTreeMap, HashMap};
use std::sync::Arc;

/// Which direction the generated config is for.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Mode {
    Serialize,
    Deserialize,
}

/// `{ type, id }` stub taken from a request document's relationship data.
#[derive(Clone, Debug, PartialEq)]
pub struct ResourceIdentifier {
    pub type_name: String,
    pub id: Value,
}

/// Maps a relationship stub to the value stored on the deserialized record.
pub type RelationshipMapper = fn(&ResourceIdentifier) -> Value;

/// Default mapping: `{ id }`.
pub fn id_only(identifier: &ResourceIdentifier) -> Value {
    json!({ "id": identifier.id })
}

#[derive(Clone, Debug)]
pub struct RelationConfig {
    /// Key on the related object holding its identifier.
    pub ref_key: String,
    /// Whether expanded related objects go to the top-level `included` array.
    pub included: bool,
    /// Attributes emitted for included objects; empty means every non-id key.
    pub attributes: Vec<String>,
    /// JSON:API type of the related resource; defaults to the relation key.
    pub type_name: Option<String>,
    pub value_for_relationship: Option<RelationshipMapper>,
}

impl Default for RelationConfig {
    fn default() -> Self {
        RelationConfig {
            ref_key: "id".into(),
            included: true,
            attributes: Vec::new(),
            type_name: None,
            value_for_relationship: None,
        }
    }
}

#[derive(Clone, Debug)]
pub struct SerializerConfig {
    pub id: String,
    /// Ordered wire field names; entries that name a relation are emitted as relationships.
    pub attributes: Vec<String>,
    pub relations: BTreeMap<String, RelationConfig>,
    pub key_for_attribute: KeyCase,
}

impl Default for SerializerConfig {
    fn default() -> Self {
        SerializerConfig {
            id: "id".into(),
            attributes: Vec::new(),
            relations: BTreeMap::new(),
            key_for_attribute: KeyCase::default(),
        }
    }
}

impl SerializerConfig {
    /// Config derived from the model: every attribute except the primary key and to-one foreign
    /// keys, then every association as an included relation.
    pub fn from_resource(model: &ResolvedModel, resource: &ResourceDescriptor) -> Self {
        let foreign_keys: Vec<&str> = resource
            .associations
            .iter()
            .filter(|a| a.kind == AssociationKind::ToOne)
            .map(|a| a.foreign_key.as_str())
            .collect();
        let mut config = SerializerConfig {
            id: resource.primary_key.clone(),
            ..SerializerConfig::default()
        };
        for attr in &resource.attributes {
            if attr.name != resource.primary_key && !foreign_keys.contains(&attr.name.as_str()) {
                config.attributes.push(attr.name.clone());
            }
        }
        for association in &resource.associations {
            let key = association.key().to_string();
            config.attributes.push(key.clone());
            config.relations.insert(
                key,
                RelationConfig {
                    type_name: model.resource(&association.target).map(|t| t.type_name.clone()),
                    ..RelationConfig::default()
                },
            );
        }
        config
    }

    /// Overlay `extra`: its relations replace same-named ones, its attributes are appended when new.
    pub fn merge(mut self, extra: &SerializerConfig) -> Self {
        for attr in &extra.attributes {
            if !self.attributes.contains(attr) {
                self.attributes.push(attr.clone());
            }
        }
        for (key, relation) in &extra.relations {
            self.relations.insert(key.clone(), relation.clone());
        }
        self
    }
}

/// Produces serializer config for one resource: `generate(included, mode, extra)`.
pub trait SerializerConfigGenerator: Send + Sync {
    fn generate(&self, included: &[String], mode: Mode, extra: Option<&SerializerConfig>) -> SerializerConfig;
}

impl<F> SerializerConfigGenerator for F
where
    F: Fn(&[String], Mode, Option<&SerializerConfig>) -> SerializerConfig + Send + Sync,
{
    fn generate(&self, included: &[String], mode: Mode, extra: Option<&SerializerConfig>) -> SerializerConfig {
        self(included, mode, extra)
    }
}

/// Generator that derives everything from the resolved model.
pub struct ModelSerializer {
    config: SerializerConfig,
}

impl ModelSerializer {
    pub fn new(model: &ResolvedModel, resource: &ResourceDescriptor) -> Self {
        ModelSerializer {
            config: SerializerConfig::from_resource(model, resource),
        }
    }
}

impl SerializerConfigGenerator for ModelSerializer {
    fn generate(&self, _included: &[String], _mode: Mode, extra: Option<&SerializerConfig>) -> SerializerConfig {
        match extra {
            Some(extra) => self.config.clone().merge(extra),
            None => self.config.clone(),
        }
    }
}

/// Generators keyed by entity name, used to configure included relations.
#[derive(Clone, Default)]
pub struct SerializerRegistry {
    generators: HashMap<String, Arc<dyn SerializerConfigGenerator>>,
}

impl SerializerRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn register(&mut self, entity: impl Into<String>, generator: Arc<dyn SerializerConfigGenerator>) {
        self.generators.insert(entity.into(), generator);
    }

    pub fn get(&self, entity: &str) -> Option<&Arc<dyn SerializerConfigGenerator>> {
        self.generators.get(entity)
    }

    /// `{ ref: "id", included: true, ...target config }` for each requested association of `resource`.
    /// Names that match no association, or whose target has no generator, are skipped.
    pub fn included_config(
        &self,
        model: &ResolvedModel,
        resource: &ResourceDescriptor,
        included: &[String],
    ) -> SerializerConfig {
        let mut config = SerializerConfig::default();
        for name in included {
            let Some(association) = resource.association(name) else { continue };
            let Some(generator) = self.get(&association.target) else { continue };
            let target = generator.generate(&[], Mode::Serialize, None);
            config.relations.insert(
                association.key().to_string(),
                RelationConfig {
                    ref_key: "id".into(),
                    included: true,
                    attributes: target.attributes,
                    type_name: model.resource(&association.target).map(|t| t.type_name.clone()),
                    value_for_relationship: None,
                },
            );
        }
        config
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::{resolve, sample_config};

    #[test]
    fn derives_config_from_model() {
        let model = resolve(&sample_config()).unwrap();
        let secret = model.resource("secret").unwrap();
        let config = SerializerConfig::from_resource(&model, secret);
        assert_eq!(config.attributes, vec!["text", "createdAt", "updatedAt", "user"]);
        assert_eq!(config.relations["user"].type_name.as_deref(), Some("users"));
    }

    #[test]
    fn closures_are_generators() {
        let generator = |_: &[String], mode: Mode, _: Option<&SerializerConfig>| SerializerConfig {
            attributes: match mode {
                Mode::Serialize => vec!["text".into()],
                Mode::Deserialize => Vec::new(),
            },
            ..SerializerConfig::default()
        };
        assert_eq!(generator.generate(&[], Mode::Serialize, None).attributes, vec!["text"]);
        assert!(generator.generate(&[], Mode::Deserialize, None).attributes.is_empty());
    }

    #[test]
    fn registry_builds_included_relations() {
        let model = resolve(&sample_config()).unwrap();
        let user = model.resource("user").unwrap();
        let mut registry = SerializerRegistry::new();
        registry.register(
            "secret",
            Arc::new(|_: &[String], _: Mode, _: Option<&SerializerConfig>| SerializerConfig {
                attributes: vec!["text".into()],
                ..SerializerConfig::default()
            }),
        );
        let config = registry.included_config(&model, user, &["secrets".to_string(), "ghost".to_string()]);
        assert_eq!(config.relations.len(), 1);
        let secrets = &config.relations["secrets"];
        assert!(secrets.included);
        assert_eq!(secrets.attributes, vec!["text"]);
        assert_eq!(secrets.type_name.as_deref(), Some("secrets"));
    }
}
