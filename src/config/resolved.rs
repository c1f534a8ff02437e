//! Resolved resource model: config validated and flattened for runtime use.

use crate::config::AssociationKind;
use std::collections::HashMap;

#[derive(Clone, Debug)]
pub struct AttributeInfo {
    /// Wire/API name.
    pub name: String,
    pub column: String,
    pub pg_type: String,
    pub nullable: bool,
    pub default: Option<String>,
}

/// A named relationship from one entity to another.
#[derive(Clone, Debug)]
pub struct Association {
    /// Association key on the source entity.
    pub name: String,
    /// Target entity name.
    pub target: String,
    pub kind: AssociationKind,
    /// Foreign key attribute (source side for to-one, target side for to-many).
    pub foreign_key: String,
    pub alias: Option<String>,
}

impl Association {
    pub fn is_aliased(&self) -> bool {
        self.alias.is_some()
    }

    /// Key under which the association appears in a row: the alias when aliased, else the name.
    pub fn key(&self) -> &str {
        self.alias.as_deref().unwrap_or(&self.name)
    }

    /// Whether a request-level or policy-level name refers to this association.
    pub fn answers_to(&self, name: &str) -> bool {
        self.name == name || self.target == name || self.alias.as_deref() == Some(name)
    }
}

/// The bound model for one resource: attributes plus the associations it can expand.
#[derive(Clone, Debug)]
pub struct ResourceDescriptor {
    pub name: String,
    pub schema_name: String,
    pub table_name: String,
    pub type_name: String,
    pub path_segment: String,
    pub primary_key: String,
    pub attributes: Vec<AttributeInfo>,
    pub associations: Vec<Association>,
    pub timestamps: bool,
}

impl ResourceDescriptor {
    pub fn attribute(&self, name: &str) -> Option<&AttributeInfo> {
        self.attributes.iter().find(|a| a.name == name)
    }

    pub fn has_attribute(&self, name: &str) -> bool {
        self.attribute(name).is_some()
    }

    pub fn association(&self, name: &str) -> Option<&Association> {
        self.associations.iter().find(|a| a.answers_to(name))
    }

    pub fn primary_key_attribute(&self) -> Option<&AttributeInfo> {
        self.attribute(&self.primary_key)
    }
}

#[derive(Clone, Debug, Default)]
pub struct ResolvedModel {
    pub resources: Vec<ResourceDescriptor>,
    pub by_name: HashMap<String, usize>,
}

impl ResolvedModel {
    pub fn resource(&self, name: &str) -> Option<&ResourceDescriptor> {
        self.by_name.get(name).map(|&i| &self.resources[i])
    }
}
