//! Include/exclude resolution for the bound resource's associations.
//!
//! Precedence per association: controller default-exclude, then request `exclude`,
//! then request `include`, then a bare reference.

use crate::config::{Association, ResolvedModel, ResourceDescriptor};
use crate::query::descriptor::IncludeNode;
use crate::query::request::{ExcludeScope, QueryRequest};

fn default_excluded(association: &Association, default_excludes: &[String]) -> bool {
    default_excludes.iter().any(|name| association.answers_to(name))
}

fn bare(association: &Association) -> IncludeNode {
    IncludeNode {
        association: association.name.clone(),
        target: association.target.clone(),
        kind: association.kind,
        foreign_key: association.foreign_key.clone(),
        alias: association.alias.clone(),
        all: false,
        include: Vec::new(),
    }
}

/// Every association of `target` as a bare reference, minus default-excludes.
fn expand_all(model: &ResolvedModel, target: &str, default_excludes: &[String]) -> Vec<IncludeNode> {
    let Some(resource) = model.resource(target) else {
        return Vec::new();
    };
    resource
        .associations
        .iter()
        .filter(|a| !default_excluded(a, default_excludes))
        .map(bare)
        .collect()
}

pub fn resolve_includes(
    model: &ResolvedModel,
    resource: &ResourceDescriptor,
    default_excludes: &[String],
    req: &QueryRequest,
) -> Vec<IncludeNode> {
    resource
        .associations
        .iter()
        .filter_map(|association| {
            if default_excluded(association, default_excludes) {
                return None;
            }
            if let Some(entry) = req.exclusion(|name| association.answers_to(name)) {
                return match entry.scope {
                    ExcludeScope::All => None,
                    ExcludeScope::Own => Some(bare(association)),
                };
            }
            if req.include.iter().any(|name| association.answers_to(name)) {
                let mut node = bare(association);
                node.all = true;
                node.include = expand_all(model, &association.target, default_excludes);
                return Some(node);
            }
            Some(bare(association))
        })
        .collect()
}

/// Include statement used when no request is in play (refetch after a write).
pub fn default_includes(
    model: &ResolvedModel,
    resource: &ResourceDescriptor,
    default_excludes: &[String],
) -> Vec<IncludeNode> {
    resolve_includes(model, resource, default_excludes, &QueryRequest::default())
}
