//! Compiled query handed to the store: projection, where, include tree, order, limit, offset.

use crate::config::AssociationKind;
use serde::ser::{SerializeMap, SerializeSeq};
use serde::{Serialize, Serializer};
use serde_json::{Map, Value};

pub const DEFAULT_LIMIT: u64 = 20;
pub const DEFAULT_OFFSET: u64 = 0;

/// Equality conditions keyed by attribute name. Empty means match all.
pub type WhereClause = Map<String, Value>;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum SortDirection {
    Asc,
    Desc,
}

impl SortDirection {
    pub fn as_str(self) -> &'static str {
        match self {
            SortDirection::Asc => "ASC",
            SortDirection::Desc => "DESC",
        }
    }
}

/// One step of a sort path.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum OrderSegment {
    /// Resolved association of the entity reached so far.
    Association { name: String, target: String },
    /// Attribute (or unresolved name) taken literally.
    Literal(String),
}

impl OrderSegment {
    pub fn name(&self) -> &str {
        match self {
            OrderSegment::Association { name, .. } => name,
            OrderSegment::Literal(name) => name,
        }
    }
}

/// Serialises as `[segment..., "ASC"|"DESC"]`.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct OrderTerm {
    pub path: Vec<OrderSegment>,
    pub direction: SortDirection,
}

impl OrderTerm {
    pub fn attribute(name: impl Into<String>, direction: SortDirection) -> Self {
        OrderTerm {
            path: vec![OrderSegment::Literal(name.into())],
            direction,
        }
    }

    pub fn to_tuple(&self) -> Vec<String> {
        self.path
            .iter()
            .map(|s| s.name().to_string())
            .chain(std::iter::once(self.direction.as_str().to_string()))
            .collect()
    }
}

impl Serialize for OrderTerm {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut seq = serializer.serialize_seq(Some(self.path.len() + 1))?;
        for segment in &self.path {
            seq.serialize_element(segment.name())?;
        }
        seq.serialize_element(self.direction.as_str())?;
        seq.end()
    }
}

/// One kept association. `include` holds the nested level when full expansion was requested.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct IncludeNode {
    pub association: String,
    pub target: String,
    pub kind: AssociationKind,
    pub foreign_key: String,
    pub alias: Option<String>,
    /// Full nested expansion was requested for this association.
    pub all: bool,
    pub include: Vec<IncludeNode>,
}

impl IncludeNode {
    /// Key the association occupies in a row.
    pub fn key(&self) -> &str {
        self.alias.as_deref().unwrap_or(&self.association)
    }
}

impl Serialize for IncludeNode {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(None)?;
        map.serialize_entry("model", &self.target)?;
        if let Some(alias) = &self.alias {
            map.serialize_entry("as", alias)?;
        }
        if self.all {
            map.serialize_entry("include", &serde_json::json!({ "all": true }))?;
        }
        map.end()
    }
}

#[derive(Clone, Debug, Serialize)]
pub struct QueryDescriptor {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub attributes: Option<Vec<String>>,
    #[serde(rename = "where")]
    pub where_clause: WhereClause,
    pub include: Vec<IncludeNode>,
    pub order: Vec<OrderTerm>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub limit: Option<u64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub offset: Option<u64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub distinct: Option<String>,
}

impl QueryDescriptor {
    /// Unpaged lookup of one row by primary key with the given includes.
    pub fn by_id(primary_key: &str, id: Value, include: Vec<IncludeNode>) -> Self {
        let mut where_clause = Map::new();
        where_clause.insert(primary_key.to_string(), id);
        QueryDescriptor {
            attributes: None,
            where_clause,
            include,
            order: Vec::new(),
            limit: None,
            offset: None,
            distinct: None,
        }
    }
}
