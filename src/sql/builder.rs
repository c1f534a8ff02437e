//! Builds parameterized SELECT, COUNT, INSERT, UPDATE, DELETE from a resource and a query descriptor.

use crate::config::{AssociationKind, AttributeInfo, ResolvedModel, ResourceDescriptor};
use crate::query::{IncludeNode, OrderSegment, OrderTerm, QueryDescriptor, SortDirection, WhereClause, MAX_COUNT};
use crate::sql::params::cast_type;
use serde_json::{Map, Value};

const MAIN_ALIAS: &str = "main";

/// Quote identifier for PostgreSQL (safe: only from config).
fn quoted(s: &str) -> String {
    format!("\"{}\"", s.replace('"', "\"\""))
}

fn qualified_table(resource: &ResourceDescriptor) -> String {
    format!("{}.{}", quoted(&resource.schema_name), quoted(&resource.table_name))
}

pub struct QueryBuf {
    pub sql: String,
    pub params: Vec<Value>,
}

impl QueryBuf {
    fn new() -> Self {
        QueryBuf {
            sql: String::new(),
            params: Vec::new(),
        }
    }

    fn push_param(&mut self, v: Value) -> u32 {
        let n = self.params.len() as u32 + 1;
        self.params.push(v);
        n
    }

    fn placeholder(&mut self, v: Value, attr: &AttributeInfo) -> String {
        let n = self.push_param(v);
        format!("${}::{}", n, cast_type(&attr.pg_type))
    }
}

/// Fresh table alias for a correlated subquery.
fn next_alias(depth: &mut u32) -> String {
    *depth += 1;
    format!("t{}", depth)
}

/// `alias."column" AS "name"`; custom (schema-qualified) and numeric types are read as text.
fn column_expr(alias: &str, attr: &AttributeInfo) -> String {
    let col = format!("{}.{}", alias, quoted(&attr.column));
    let ty = attr.pg_type.to_ascii_lowercase();
    let expr = if attr.pg_type.contains('.') || ty == "numeric" || ty.starts_with("numeric(") {
        format!("{}::text", col)
    } else {
        col
    };
    format!("{} AS {}", expr, quoted(&attr.name))
}

/// Attributes to project: the requested subset (primary key always kept) or all.
fn projected<'r>(resource: &'r ResourceDescriptor, requested: Option<&[String]>) -> Vec<&'r AttributeInfo> {
    match requested {
        Some(names) if !names.is_empty() => resource
            .attributes
            .iter()
            .filter(|a| a.name == resource.primary_key || names.iter().any(|n| *n == a.name))
            .collect(),
        _ => resource.attributes.iter().collect(),
    }
}

/// Split `fields` projection into bare names for the main entity and `key -> names` for includes.
fn split_projection(attributes: Option<&[String]>) -> (Option<Vec<String>>, Vec<(String, String)>) {
    let Some(attributes) = attributes else {
        return (None, Vec::new());
    };
    let mut own = Vec::new();
    let mut qualified = Vec::new();
    for a in attributes {
        match a.split_once('.') {
            Some((entity, attr)) => qualified.push((entity.to_string(), attr.to_string())),
            None => own.push(a.clone()),
        }
    }
    (Some(own), qualified)
}

fn include_subquery(
    model: &ResolvedModel,
    parent: &ResourceDescriptor,
    parent_alias: &str,
    node: &IncludeNode,
    qualified: &[(String, String)],
    depth: &mut u32,
) -> Option<String> {
    let target = model.resource(&node.target)?;
    let alias = next_alias(depth);
    let requested: Vec<String> = qualified
        .iter()
        .filter(|(entity, _)| entity == node.key() || *entity == node.target || *entity == node.association)
        .map(|(_, attr)| attr.clone())
        .collect();
    let mut cols: Vec<String> = projected(target, Some(requested.as_slice()))
        .into_iter()
        .map(|a| column_expr(&alias, a))
        .collect();
    for nested in &node.include {
        if let Some(expr) = include_subquery(model, target, &alias, nested, &[], depth) {
            cols.push(format!("{} AS {}", expr, quoted(nested.key())));
        }
    }

    let join = match node.kind {
        AssociationKind::ToOne => {
            let fk = parent.attribute(&node.foreign_key)?;
            let pk = target.primary_key_attribute()?;
            format!("{}.{} = {}.{}", alias, quoted(&pk.column), parent_alias, quoted(&fk.column))
        }
        AssociationKind::ToMany => {
            let fk = target.attribute(&node.foreign_key)?;
            let pk = parent.primary_key_attribute()?;
            format!("{}.{} = {}.{}", alias, quoted(&fk.column), parent_alias, quoted(&pk.column))
        }
    };
    let inner = format!(
        "SELECT {} FROM {} {} WHERE {}",
        cols.join(", "),
        qualified_table(target),
        alias,
        join
    );
    let pk_col = target.primary_key_attribute()?;
    Some(match node.kind {
        AssociationKind::ToOne => format!("(SELECT row_to_json(sub) FROM ({} LIMIT 1) sub)", inner),
        AssociationKind::ToMany => format!(
            "(SELECT COALESCE(json_agg(row_to_json(sub)), '[]'::json) FROM ({} ORDER BY {}.{}) sub)",
            inner,
            alias,
            quoted(&pk_col.column)
        ),
    })
}

fn where_sql(q: &mut QueryBuf, resource: &ResourceDescriptor, where_clause: &WhereClause) -> String {
    let mut parts = Vec::new();
    for (key, value) in where_clause {
        let Some(attr) = resource.attribute(key) else { continue };
        let col = format!("{}.{}", MAIN_ALIAS, quoted(&attr.column));
        match value {
            Value::Null => parts.push(format!("{} IS NULL", col)),
            Value::Array(items) => {
                if items.is_empty() {
                    parts.push("FALSE".to_string());
                } else {
                    let phs: Vec<String> = items.iter().map(|v| q.placeholder(v.clone(), attr)).collect();
                    parts.push(format!("{} IN ({})", col, phs.join(", ")));
                }
            }
            other => {
                let ph = q.placeholder(other.clone(), attr);
                parts.push(format!("{} = {}", col, ph));
            }
        }
    }
    if parts.is_empty() {
        String::new()
    } else {
        format!(" WHERE {}", parts.join(" AND "))
    }
}

/// Correlated scalar expression for a sort path; `None` when the path does not resolve.
fn order_expr(
    model: &ResolvedModel,
    resource: &ResourceDescriptor,
    parent_alias: &str,
    path: &[OrderSegment],
    depth: &mut u32,
) -> Option<String> {
    match path {
        [OrderSegment::Literal(attr)] => {
            let attr = resource.attribute(attr)?;
            Some(format!("{}.{}", parent_alias, quoted(&attr.column)))
        }
        [OrderSegment::Association { name, .. }, rest @ ..] if !rest.is_empty() => {
            let association = resource.association(name)?;
            let target = model.resource(&association.target)?;
            let alias = next_alias(depth);
            let inner = order_expr(model, target, &alias, rest, depth)?;
            match association.kind {
                AssociationKind::ToOne => {
                    let fk = resource.attribute(&association.foreign_key)?;
                    let pk = target.primary_key_attribute()?;
                    Some(format!(
                        "(SELECT {} FROM {} {} WHERE {}.{} = {}.{} LIMIT 1)",
                        inner,
                        qualified_table(target),
                        alias,
                        alias,
                        quoted(&pk.column),
                        parent_alias,
                        quoted(&fk.column)
                    ))
                }
                AssociationKind::ToMany => {
                    let fk = target.attribute(&association.foreign_key)?;
                    let pk = resource.primary_key_attribute()?;
                    Some(format!(
                        "(SELECT MIN({}) FROM {} {} WHERE {}.{} = {}.{})",
                        inner,
                        qualified_table(target),
                        alias,
                        alias,
                        quoted(&fk.column),
                        parent_alias,
                        quoted(&pk.column)
                    ))
                }
            }
        }
        _ => None,
    }
}

fn order_sql(model: &ResolvedModel, resource: &ResourceDescriptor, order: &[OrderTerm], depth: &mut u32) -> String {
    let mut parts: Vec<String> = order
        .iter()
        .filter_map(|term| {
            let expr = order_expr(model, resource, MAIN_ALIAS, &term.path, depth)?;
            Some(format!("{} {}", expr, term.direction.as_str()))
        })
        .collect();
    if let Some(pk) = resource.primary_key_attribute() {
        let pk_expr = format!("{}.{}", MAIN_ALIAS, quoted(&pk.column));
        if !parts.iter().any(|p| p.starts_with(&format!("{} ", pk_expr))) {
            parts.push(format!("{} {}", pk_expr, SortDirection::Asc.as_str()));
        }
    }
    format!(" ORDER BY {}", parts.join(", "))
}

/// SELECT for a descriptor: projection, includes as correlated JSON subqueries, where, order, limit/offset.
pub fn select(model: &ResolvedModel, resource: &ResourceDescriptor, query: &QueryDescriptor) -> QueryBuf {
    let mut q = QueryBuf::new();
    let mut depth = 0u32;
    let (own, qualified) = split_projection(query.attributes.as_deref());

    let mut select_parts: Vec<String> = projected(resource, own.as_deref())
        .into_iter()
        .map(|a| column_expr(MAIN_ALIAS, a))
        .collect();
    for node in &query.include {
        if let Some(expr) = include_subquery(model, resource, MAIN_ALIAS, node, &qualified, &mut depth) {
            select_parts.push(format!("{} AS {}", expr, quoted(node.key())));
        }
    }

    let where_clause = where_sql(&mut q, resource, &query.where_clause);
    let order_clause = order_sql(model, resource, &query.order, &mut depth);
    let limit_clause = query.limit.map(|n| format!(" LIMIT {}", n.min(MAX_COUNT))).unwrap_or_default();
    let offset_clause = query.offset.map(|n| format!(" OFFSET {}", n.min(MAX_COUNT))).unwrap_or_default();

    q.sql = format!(
        "SELECT {} FROM {} {}{}{}{}{}",
        select_parts.join(", "),
        qualified_table(resource),
        MAIN_ALIAS,
        where_clause,
        order_clause,
        limit_clause,
        offset_clause
    );
    q
}

/// COUNT matching the descriptor's where clause, distinct on `distinct` (or the primary key).
pub fn count(resource: &ResourceDescriptor, query: &QueryDescriptor) -> QueryBuf {
    let mut q = QueryBuf::new();
    let where_clause = where_sql(&mut q, resource, &query.where_clause);
    let distinct = query
        .distinct
        .as_deref()
        .and_then(|d| resource.attribute(d))
        .or_else(|| resource.primary_key_attribute());
    let target = match distinct {
        Some(attr) => format!("DISTINCT {}.{}", MAIN_ALIAS, quoted(&attr.column)),
        None => "*".to_string(),
    };
    q.sql = format!(
        "SELECT COUNT({}) FROM {} {}{}",
        target,
        qualified_table(resource),
        MAIN_ALIAS,
        where_clause
    );
    q
}

/// INSERT known attributes present in `values`; returns the new primary key.
pub fn insert(resource: &ResourceDescriptor, values: &Map<String, Value>) -> QueryBuf {
    let mut q = QueryBuf::new();
    let table = qualified_table(resource);
    let mut cols = Vec::new();
    let mut placeholders = Vec::new();
    for attr in &resource.attributes {
        let Some(v) = values.get(&attr.name) else { continue };
        if attr.name == resource.primary_key && v.is_null() {
            continue;
        }
        cols.push(quoted(&attr.column));
        placeholders.push(q.placeholder(v.clone(), attr));
    }
    let returning = resource
        .primary_key_attribute()
        .map(|pk| format!("{} AS {}", quoted(&pk.column), quoted(&pk.name)))
        .unwrap_or_else(|| "*".into());
    q.sql = if cols.is_empty() {
        format!("INSERT INTO {} DEFAULT VALUES RETURNING {}", table, returning)
    } else {
        format!(
            "INSERT INTO {} ({}) VALUES ({}) RETURNING {}",
            table,
            cols.join(", "),
            placeholders.join(", "),
            returning
        )
    };
    q
}

/// UPDATE by primary key: SET only known attributes present in `values`; touches `updatedAt` when timestamped.
pub fn update(resource: &ResourceDescriptor, id: &Value, values: &Map<String, Value>) -> QueryBuf {
    let mut q = QueryBuf::new();
    let table = qualified_table(resource);
    let mut sets = Vec::new();
    for attr in &resource.attributes {
        if attr.name == resource.primary_key {
            continue;
        }
        let Some(v) = values.get(&attr.name) else { continue };
        let ph = q.placeholder(v.clone(), attr);
        sets.push(format!("{} = {}", quoted(&attr.column), ph));
    }
    if resource.timestamps && !values.contains_key("updatedAt") {
        if let Some(updated) = resource.attribute("updatedAt") {
            sets.push(format!("{} = NOW()", quoted(&updated.column)));
        }
    }
    let Some(pk) = resource.primary_key_attribute() else {
        q.sql = "SELECT 0".into();
        return q;
    };
    if sets.is_empty() {
        sets.push(format!("{} = {}", quoted(&pk.column), quoted(&pk.column)));
    }
    let id_ph = q.placeholder(id.clone(), pk);
    q.sql = format!(
        "UPDATE {} SET {} WHERE {} = {}",
        table,
        sets.join(", "),
        quoted(&pk.column),
        id_ph
    );
    q
}

/// DELETE by primary key.
pub fn delete(resource: &ResourceDescriptor, id: &Value) -> QueryBuf {
    let mut q = QueryBuf::new();
    let table = qualified_table(resource);
    let Some(pk) = resource.primary_key_attribute() else {
        q.sql = "SELECT 0".into();
        return q;
    };
    let ph = q.placeholder(id.clone(), pk);
    q.sql = format!("DELETE FROM {} WHERE {} = {}", table, quoted(&pk.column), ph);
    q
}
