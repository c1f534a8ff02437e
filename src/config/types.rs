//! Raw model config types as read from `entities.json`.

use serde::{Deserialize, Serialize};

/// Association cardinality as declared in config.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AssociationKind {
    /// Source row holds the foreign key (belongs-to).
    ToOne,
    /// Target rows hold the foreign key (has-many).
    ToMany,
}

#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct AttributeConfig {
    /// Wire/API name, e.g. `firstName`.
    pub name: String,
    /// Database column; defaults to the snake_case of `name`.
    #[serde(default)]
    pub column: Option<String>,
    /// PostgreSQL type used for DDL and parameter casts, e.g. `text`, `integer`, `timestamptz`.
    #[serde(rename = "type", default = "default_attribute_type")]
    pub type_: String,
    #[serde(default = "default_true")]
    pub nullable: bool,
    /// SQL default expression for DDL, e.g. `'draft'` or `NOW()`.
    #[serde(default)]
    pub default: Option<String>,
}

#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct AssociationConfig {
    /// Association key on the source entity, e.g. `secrets` or `author`.
    pub name: String,
    /// Target entity name.
    pub target: String,
    pub kind: AssociationKind,
    /// Attribute holding the foreign key: on the source for `to_one`, on the target for `to_many`.
    pub foreign_key: String,
    /// Explicit alias when the association is an aliased relation.
    #[serde(default)]
    pub alias: Option<String>,
}

#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct EntityConfig {
    pub name: String,
    pub table: String,
    #[serde(default)]
    pub schema: Option<String>,
    /// JSON:API `type`; defaults to the table name.
    #[serde(default)]
    pub type_name: Option<String>,
    /// URL path segment; defaults to the entity name.
    #[serde(default)]
    pub path_segment: Option<String>,
    #[serde(default = "default_primary_key")]
    pub primary_key: String,
    pub attributes: Vec<AttributeConfig>,
    #[serde(default)]
    pub associations: Vec<AssociationConfig>,
    /// Adds managed `createdAt`/`updatedAt` attributes.
    #[serde(default = "default_true")]
    pub timestamps: bool,
}

/// All entities in one struct for in-memory loading.
#[derive(Clone, Debug, Default, Serialize, Deserialize)]
pub struct ModelConfig {
    pub entities: Vec<EntityConfig>,
}

fn default_true() -> bool {
    true
}

fn default_primary_key() -> String {
    "id".into()
}

fn default_attribute_type() -> String {
    "text".into()
}
