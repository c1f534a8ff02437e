#![allow(dead_code)]

use async_trait::async_trait;
use axum::body::Body;
use axum::http::{Request, Response};
use axum::Router;
use jsonapi_resource::config::{AssociationKind, ResolvedModel, ResourceDescriptor};
use jsonapi_resource::query::{IncludeNode, OrderSegment, QueryDescriptor, SortDirection};
use jsonapi_resource::sql::bind_text;
use jsonapi_resource::{
    parse_model, resolve, resource_routes, AppError, ControllerOptions, ModelSerializer, ResourceController,
    ResourceStore,
};
use serde_json::{json, Map, Value};
use std::cmp::Ordering;
use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, AtomicI64};
use std::sync::{Arc, Mutex};

pub const MODEL: &str = r#"{
  "entities": [
    {
      "name": "user", "table": "users",
      "attributes": [ { "name": "id", "type": "serial" }, { "name": "firstName" }, { "name": "lastName" } ],
      "associations": [ { "name": "secrets", "target": "secret", "kind": "to_many", "foreign_key": "userId" } ]
    },
    {
      "name": "secret", "table": "secrets",
      "attributes": [ { "name": "id", "type": "serial" }, { "name": "text" }, { "name": "userId", "type": "integer" } ],
      "associations": [ { "name": "user", "target": "user", "kind": "to_one", "foreign_key": "userId" } ]
    },
    {
      "name": "article", "table": "articles",
      "attributes": [
        { "name": "id", "type": "serial" }, { "name": "title" }, { "name": "status", "default": "'draft'" },
        { "name": "authorId", "type": "integer" }, { "name": "updatedById", "type": "integer" },
        { "name": "reviewedById", "type": "integer" }, { "name": "publishedById", "type": "integer" }
      ],
      "associations": [ { "name": "user", "target": "user", "kind": "to_one", "foreign_key": "authorId", "alias": "author" } ]
    }
  ]
}"#;

pub fn model() -> Arc<ResolvedModel> {
    let config = parse_model(MODEL).expect("test model parses");
    Arc::new(resolve(&config).expect("test model resolves"))
}

type Row = Map<String, Value>;

/// In-memory `ResourceStore`: equality where, one-level includes, attribute sort, paging.
pub struct MemoryStore {
    model: Arc<ResolvedModel>,
    tables: Mutex<HashMap<String, Vec<Row>>>,
    next_id: AtomicI64,
    pub healthy: AtomicBool,
    pub last_query: Mutex<Option<QueryDescriptor>>,
}

fn same(a: &Value, b: &Value) -> bool {
    match (bind_text(a), bind_text(b)) {
        (Some(a), Some(b)) => a == b,
        (None, None) => true,
        _ => false,
    }
}

fn matches(row: &Row, where_clause: &Map<String, Value>, resource: &ResourceDescriptor) -> bool {
    where_clause.iter().all(|(key, cond)| {
        if !resource.has_attribute(key) {
            return true;
        }
        let actual = row.get(key).unwrap_or(&Value::Null);
        match cond {
            Value::Array(options) => options.iter().any(|o| same(actual, o)),
            other => same(actual, other),
        }
    })
}

fn compare(a: &Value, b: &Value) -> Ordering {
    match (a.as_f64(), b.as_f64()) {
        (Some(x), Some(y)) => x.partial_cmp(&y).unwrap_or(Ordering::Equal),
        _ => bind_text(a).cmp(&bind_text(b)),
    }
}

impl MemoryStore {
    pub fn new(model: Arc<ResolvedModel>) -> Self {
        MemoryStore {
            model,
            tables: Mutex::new(HashMap::new()),
            next_id: AtomicI64::new(1),
            healthy: AtomicBool::new(true),
            last_query: Mutex::new(None),
        }
    }

    /// Insert a row directly, assigning an id when absent. Returns the id.
    pub fn seed(&self, entity: &str, values: Value) -> i64 {
        let mut row = values.as_object().cloned().unwrap_or_default();
        let id = self.next_id.fetch_add(1, std::sync::atomic::Ordering::SeqCst);
        row.entry("id").or_insert(json!(id));
        self.tables.lock().unwrap().entry(entity.to_string()).or_default().push(row);
        id
    }

    pub fn rows(&self, entity: &str) -> Vec<Row> {
        self.tables.lock().unwrap().get(entity).cloned().unwrap_or_default()
    }

    pub fn row(&self, entity: &str, id: i64) -> Option<Row> {
        self.rows(entity).into_iter().find(|r| same(&r["id"], &json!(id)))
    }

    pub fn last_query(&self) -> Option<QueryDescriptor> {
        self.last_query.lock().unwrap().clone()
    }

    fn attach(&self, resource: &ResourceDescriptor, row: &mut Row, nodes: &[IncludeNode]) {
        for node in nodes {
            let Some(target) = self.model.resource(&node.target) else { continue };
            let related = self.rows(&target.name);
            let value = match node.kind {
                AssociationKind::ToOne => {
                    let fk = row.get(&node.foreign_key).cloned().unwrap_or(Value::Null);
                    match related.into_iter().find(|r| !fk.is_null() && same(&r[&target.primary_key], &fk)) {
                        Some(mut r) => {
                            self.attach(target, &mut r, &node.include);
                            Value::Object(r)
                        }
                        None => Value::Null,
                    }
                }
                AssociationKind::ToMany => {
                    let pk = row.get(&resource.primary_key).cloned().unwrap_or(Value::Null);
                    Value::Array(
                        related
                            .into_iter()
                            .filter(|r| r.get(&node.foreign_key).is_some_and(|v| same(v, &pk)))
                            .map(|mut r| {
                                self.attach(target, &mut r, &node.include);
                                Value::Object(r)
                            })
                            .collect(),
                    )
                }
            };
            row.insert(node.key().to_string(), value);
        }
    }

    fn select(&self, resource: &ResourceDescriptor, query: &QueryDescriptor) -> (Vec<Value>, u64) {
        *self.last_query.lock().unwrap() = Some(query.clone());
        let mut rows: Vec<Row> = self
            .rows(&resource.name)
            .into_iter()
            .filter(|r| matches(r, &query.where_clause, resource))
            .collect();
        let count = rows.len() as u64;
        for term in query.order.iter().rev() {
            if let [OrderSegment::Literal(attr)] = term.path.as_slice() {
                rows.sort_by(|a, b| {
                    let ord = compare(a.get(attr).unwrap_or(&Value::Null), b.get(attr).unwrap_or(&Value::Null));
                    match term.direction {
                        SortDirection::Asc => ord,
                        SortDirection::Desc => ord.reverse(),
                    }
                });
            }
        }
        let offset = query.offset.unwrap_or(0) as usize;
        let limit = query.limit.map(|l| l as usize).unwrap_or(usize::MAX);
        let out = rows
            .into_iter()
            .skip(offset)
            .take(limit)
            .map(|mut r| {
                if let Some(attrs) = &query.attributes {
                    r.retain(|k, _| *k == resource.primary_key || attrs.contains(k));
                }
                self.attach(resource, &mut r, &query.include);
                Value::Object(r)
            })
            .collect();
        (out, count)
    }
}

#[async_trait]
impl ResourceStore for MemoryStore {
    async fn find_and_count_all(
        &self,
        resource: &ResourceDescriptor,
        query: &QueryDescriptor,
    ) -> Result<(Vec<Value>, u64), AppError> {
        Ok(self.select(resource, query))
    }

    async fn find_one(&self, resource: &ResourceDescriptor, query: &QueryDescriptor) -> Result<Option<Value>, AppError> {
        Ok(self.select(resource, query).0.into_iter().next())
    }

    async fn create(&self, resource: &ResourceDescriptor, values: &Map<String, Value>) -> Result<Value, AppError> {
        let mut row = Row::new();
        for attr in &resource.attributes {
            match values.get(&attr.name) {
                Some(v) => {
                    row.insert(attr.name.clone(), v.clone());
                }
                None => {
                    if let Some(literal) = attr.default.as_deref().and_then(|d| d.strip_prefix('\'')?.strip_suffix('\'')) {
                        row.insert(attr.name.clone(), json!(literal));
                    }
                }
            }
        }
        let id = self.seed(&resource.name, Value::Object(row));
        Ok(json!({ "id": id }))
    }

    async fn update(&self, resource: &ResourceDescriptor, id: &Value, values: &Map<String, Value>) -> Result<u64, AppError> {
        let mut tables = self.tables.lock().unwrap();
        let Some(rows) = tables.get_mut(&resource.name) else { return Ok(0) };
        let mut touched = 0;
        for row in rows.iter_mut().filter(|r| same(&r[&resource.primary_key], id)) {
            for (key, value) in values {
                if *key != resource.primary_key && resource.has_attribute(key) {
                    row.insert(key.clone(), value.clone());
                }
            }
            touched += 1;
        }
        Ok(touched)
    }

    async fn destroy(&self, resource: &ResourceDescriptor, id: &Value) -> Result<u64, AppError> {
        let mut tables = self.tables.lock().unwrap();
        let Some(rows) = tables.get_mut(&resource.name) else { return Ok(0) };
        let before = rows.len();
        rows.retain(|r| !same(&r[&resource.primary_key], id));
        Ok((before - rows.len()) as u64)
    }

    async fn ping(&self) -> Result<(), AppError> {
        if self.healthy.load(std::sync::atomic::Ordering::SeqCst) {
            Ok(())
        } else {
            Err(AppError::Internal("store offline".into()))
        }
    }
}

pub struct TestApp {
    pub store: Arc<MemoryStore>,
    pub router: Router,
}

fn controller(model: &Arc<ResolvedModel>, store: &Arc<MemoryStore>, entity: &str, default_excludes: &[&str]) -> Arc<ResourceController> {
    let resource = model.resource(entity).expect("entity in test model");
    let generator = Arc::new(ModelSerializer::new(model, resource));
    let controller = ResourceController::new(
        entity,
        model.clone(),
        store.clone(),
        generator,
        ControllerOptions {
            default_excludes: default_excludes.iter().map(|s| s.to_string()).collect(),
            registry: None,
        },
    )
    .expect("controller builds");
    Arc::new(controller)
}

/// user (secrets hidden by default), secret and article controllers over one memory store.
pub fn app() -> TestApp {
    let model = model();
    let store = Arc::new(MemoryStore::new(model.clone()));
    let router = Router::new()
        .merge(resource_routes(controller(&model, &store, "user", &["secret"])))
        .merge(resource_routes(controller(&model, &store, "secret", &[])))
        .merge(resource_routes(controller(&model, &store, "article", &[])));
    TestApp { store, router }
}

pub fn request(method: &str, uri: &str, body: Option<Value>) -> Request<Body> {
    let builder = Request::builder().method(method).uri(uri);
    match body {
        Some(body) => builder
            .header("content-type", "application/vnd.api+json")
            .body(Body::from(body.to_string()))
            .unwrap(),
        None => builder.body(Body::empty()).unwrap(),
    }
}

pub async fn json_body(response: Response<Body>) -> Value {
    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX).await.unwrap();
    if bytes.is_empty() {
        return Value::Null;
    }
    serde_json::from_slice(&bytes).unwrap()
}
