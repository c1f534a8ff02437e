//! Query-string to query-descriptor compiler.

pub mod clauses;
pub mod descriptor;
pub mod include;
pub mod pagination;
pub mod request;

pub use clauses::*;
pub use descriptor::*;
pub use include::{default_includes, resolve_includes};
pub use pagination::PaginationEnvelope;
pub use request::{ExcludeEntry, ExcludeScope, PageParams, QueryRequest};

use crate::config::{ResolvedModel, ResourceDescriptor};
use crate::error::AppError;
use crate::workflow::STATUS_ATTRIBUTE;
use serde_json::Value;

/// Compiles requests against one bound resource and its default-exclude policy.
pub struct QueryCompiler<'a> {
    pub model: &'a ResolvedModel,
    pub resource: &'a ResourceDescriptor,
    pub default_excludes: &'a [String],
}

impl<'a> QueryCompiler<'a> {
    pub fn new(model: &'a ResolvedModel, resource: &'a ResourceDescriptor, default_excludes: &'a [String]) -> Self {
        QueryCompiler {
            model,
            resource,
            default_excludes,
        }
    }

    pub fn includes(&self, req: &QueryRequest) -> Vec<IncludeNode> {
        resolve_includes(self.model, self.resource, self.default_excludes, req)
    }

    /// Request filter plus the injected status constraint. Unknown filter keys are
    /// ignored downstream, so a constraint the resource cannot honour is an error.
    fn constrained_where(&self, req: &QueryRequest, status: Option<&Value>) -> Result<WhereClause, AppError> {
        if !where_from_status(status).is_empty() && !self.resource.has_attribute(STATUS_ATTRIBUTE) {
            return Err(AppError::BadRequest(format!(
                "status constraint on {}, which has no {} attribute",
                self.resource.name, STATUS_ATTRIBUTE
            )));
        }
        Ok(where_clause(req, status))
    }

    /// List query: paged, counted distinct on the primary key.
    pub fn list(&self, req: &QueryRequest, status: Option<&Value>) -> Result<QueryDescriptor, AppError> {
        Ok(QueryDescriptor {
            attributes: attributes_clause(self.resource, req),
            where_clause: self.constrained_where(req, status)?,
            include: self.includes(req),
            order: sort_clause(self.model, self.resource, req),
            limit: Some(limit_statement(req)),
            offset: Some(offset_statement(req)),
            distinct: Some(self.resource.primary_key.clone()),
        })
    }

    /// Single-row query: `{id}` merged over the request's where clause, no paging.
    pub fn by_id(&self, req: &QueryRequest, status: Option<&Value>, id: Value) -> Result<QueryDescriptor, AppError> {
        let mut id_clause = WhereClause::new();
        id_clause.insert(self.resource.primary_key.clone(), id);
        Ok(QueryDescriptor {
            attributes: attributes_clause(self.resource, req),
            where_clause: merge_where(self.constrained_where(req, status)?, id_clause),
            include: self.includes(req),
            order: sort_clause(self.model, self.resource, req),
            limit: None,
            offset: None,
            distinct: None,
        })
    }

    /// Refetch after a write: every non-excluded association as a bare reference.
    pub fn refetch(&self, id: Value) -> QueryDescriptor {
        QueryDescriptor::by_id(
            &self.resource.primary_key,
            id,
            default_includes(self.model, self.resource, self.default_excludes),
        )
    }

    pub fn pagination(&self, req: &QueryRequest, count: u64) -> PaginationEnvelope {
        PaginationEnvelope::new(count, limit_statement(req), offset_statement(req))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::{resolve, sample_config};
    use serde_json::json;

    #[test]
    fn list_descriptor_shape() {
        let model = resolve(&sample_config()).unwrap();
        let article = model.resource("article").unwrap();
        let compiler = QueryCompiler::new(&model, article, &[]);
        let req = QueryRequest::from_pairs([
            ("sort", "-title"),
            ("include", "comments"),
            ("page[limit]", "5"),
        ]);
        let d = compiler.list(&req, Some(&json!("published"))).unwrap();
        let v = serde_json::to_value(&d).unwrap();
        assert_eq!(v["where"], json!({ "status": "published" }));
        assert_eq!(v["order"], json!([["title", "DESC"]]));
        assert_eq!(v["limit"], 5);
        assert_eq!(v["offset"], 0);
        assert_eq!(v["distinct"], "id");
        assert_eq!(
            v["include"],
            json!([{ "model": "user", "as": "author" }, { "model": "comment", "include": { "all": true } }])
        );
        assert!(v.get("attributes").is_none());
    }

    #[test]
    fn by_id_merges_id_over_filter() {
        let model = resolve(&sample_config()).unwrap();
        let article = model.resource("article").unwrap();
        let compiler = QueryCompiler::new(&model, article, &[]);
        let req = QueryRequest::from_pairs([("filter[id]", "99"), ("filter[title]", "x")]);
        let d = compiler.by_id(&req, None, json!(7)).unwrap();
        assert_eq!(Value::Object(d.where_clause), json!({ "id": 7, "title": "x" }));
        assert!(d.limit.is_none());
    }

    #[test]
    fn status_constraint_needs_a_status_attribute() {
        let model = resolve(&sample_config()).unwrap();
        let user = model.resource("user").unwrap();
        let compiler = QueryCompiler::new(&model, user, &[]);
        let published = json!("published");

        let err = compiler.list(&QueryRequest::default(), Some(&published)).unwrap_err();
        assert!(matches!(err, AppError::BadRequest(_)));
        assert!(compiler.by_id(&QueryRequest::default(), Some(&published), json!(1)).is_err());

        let d = compiler.list(&QueryRequest::default(), Some(&Value::Null)).unwrap();
        assert!(d.where_clause.is_empty());
        assert!(compiler.list(&QueryRequest::default(), None).is_ok());
    }

    #[test]
    fn pagination_uses_resolved_page() {
        let model = resolve(&sample_config()).unwrap();
        let user = model.resource("user").unwrap();
        let compiler = QueryCompiler::new(&model, user, &[]);
        let req = QueryRequest::from_pairs([("page[offset]", "20")]);
        let p = compiler.pagination(&req, 45);
        assert_eq!(p.current_page, 2);
        assert_eq!(p.next_offset, Some(40));
    }
}
