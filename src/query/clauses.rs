//! Attribute, where, order, limit and offset clauses. Every function here is total:
//! malformed input falls back to the documented default instead of failing.

use crate::config::{ResolvedModel, ResourceDescriptor};
use crate::query::descriptor::{
    OrderSegment, OrderTerm, SortDirection, WhereClause, DEFAULT_LIMIT, DEFAULT_OFFSET,
};
use crate::query::request::QueryRequest;
use serde_json::{Map, Value};

/// `None` selects every attribute. Names of the primary entity stay bare; others become `entity.attribute`.
pub fn attributes_clause(resource: &ResourceDescriptor, req: &QueryRequest) -> Option<Vec<String>> {
    if req.fields.is_empty() {
        return None;
    }
    Some(
        req.fields
            .iter()
            .flat_map(|(entity, list)| {
                list.split(',')
                    .map(str::trim)
                    .filter(|a| !a.is_empty())
                    .map(move |attr| {
                        if *entity == resource.name {
                            attr.to_string()
                        } else {
                            format!("{}.{}", entity, attr)
                        }
                    })
            })
            .collect(),
    )
}

/// Where clause from an injected status constraint alone.
pub fn where_from_status(status: Option<&Value>) -> WhereClause {
    let mut clause = Map::new();
    if let Some(status) = status.filter(|s| !s.is_null()) {
        clause.insert("status".into(), status.clone());
    }
    clause
}

/// Request filter with the injected status constraint layered on top.
/// The constraint always owns the `status` key; every other key comes from the filter.
pub fn where_clause(req: &QueryRequest, status: Option<&Value>) -> WhereClause {
    let mut clause = req.filter.clone().unwrap_or_default();
    clause.extend(where_from_status(status));
    clause
}

/// Overlay `overrides` on `base`; keys in `overrides` win. Shallow: the where clause is a flat equality map.
pub fn merge_where(base: WhereClause, overrides: WhereClause) -> WhereClause {
    let mut merged = base;
    merged.extend(overrides);
    merged
}

fn order_term(model: &ResolvedModel, resource: &ResourceDescriptor, token: &str) -> Option<OrderTerm> {
    let (direction, body) = match token.strip_prefix('-') {
        Some(rest) => (SortDirection::Desc, rest),
        None => (SortDirection::Asc, token),
    };
    if body.is_empty() {
        return None;
    }
    if !body.contains('.') {
        return Some(OrderTerm::attribute(body, direction));
    }

    let segments: Vec<&str> = body.split('.').collect();
    let (last, hops) = segments.split_last()?;
    let mut current = Some(resource);
    let mut path = Vec::with_capacity(segments.len());
    for hop in hops {
        match current.and_then(|r| r.association(hop)) {
            Some(association) => {
                path.push(OrderSegment::Association {
                    name: association.key().to_string(),
                    target: association.target.clone(),
                });
                current = model.resource(&association.target);
            }
            None => {
                path.push(OrderSegment::Literal(hop.to_string()));
                current = None;
            }
        }
    }
    path.push(OrderSegment::Literal(last.to_string()));
    Some(OrderTerm { path, direction })
}

/// `sort=name,-createdAt,-author.name`
pub fn sort_clause(model: &ResolvedModel, resource: &ResourceDescriptor, req: &QueryRequest) -> Vec<OrderTerm> {
    let Some(sort) = req.sort.as_deref() else {
        return Vec::new();
    };
    sort.split(',')
        .map(str::trim)
        .filter_map(|token| order_term(model, resource, token))
        .collect()
}

/// Largest count Postgres accepts as a `LIMIT`/`OFFSET` literal.
pub const MAX_COUNT: u64 = i64::MAX as u64;

/// Lenient non-negative integer: integers, or finite non-negative decimals truncated.
/// Values past `MAX_COUNT` are clamped to it.
fn parse_count(raw: Option<&str>) -> Option<u64> {
    let raw = raw?.trim();
    let n = match raw.parse::<u64>() {
        Ok(n) => n,
        Err(_) => raw
            .parse::<f64>()
            .ok()
            .filter(|f| f.is_finite() && *f >= 0.0)
            .map(|f| f.trunc() as u64)?,
    };
    Some(n.min(MAX_COUNT))
}

pub fn limit_statement(req: &QueryRequest) -> u64 {
    parse_count(req.page.limit.as_deref())
        .filter(|&n| n > 0)
        .unwrap_or(DEFAULT_LIMIT)
}

pub fn offset_statement(req: &QueryRequest) -> u64 {
    parse_count(req.page.offset.as_deref()).unwrap_or(DEFAULT_OFFSET)
}
