//! Config validation: referential integrity of entities and associations.

use crate::config::{AssociationKind, ModelConfig};
use crate::error::ConfigError;
use std::collections::{HashMap, HashSet};

pub fn validate(config: &ModelConfig) -> Result<(), ConfigError> {
    let mut by_name = HashMap::new();
    for e in &config.entities {
        if by_name.insert(e.name.as_str(), e).is_some() {
            return Err(ConfigError::DuplicateEntity(e.name.clone()));
        }
    }

    for e in &config.entities {
        let attrs: HashSet<&str> = e.attributes.iter().map(|a| a.name.as_str()).collect();
        if !attrs.contains(e.primary_key.as_str()) {
            return Err(ConfigError::InvalidPrimaryKey {
                entity: e.name.clone(),
                attribute: e.primary_key.clone(),
            });
        }

        let mut assoc_names = HashSet::new();
        for a in &e.associations {
            if !assoc_names.insert(a.name.as_str()) {
                return Err(ConfigError::Validation(format!(
                    "duplicate association {} on {}",
                    a.name, e.name
                )));
            }
            let target = by_name.get(a.target.as_str()).ok_or_else(|| ConfigError::MissingReference {
                kind: "entity",
                id: a.target.clone(),
            })?;
            let fk_owner = match a.kind {
                AssociationKind::ToOne => e,
                AssociationKind::ToMany => *target,
            };
            if !fk_owner.attributes.iter().any(|attr| attr.name == a.foreign_key) {
                return Err(ConfigError::MissingReference {
                    kind: "foreign key attribute",
                    id: format!("{}.{}", fk_owner.name, a.foreign_key),
                });
            }
        }
    }

    Ok(())
}
