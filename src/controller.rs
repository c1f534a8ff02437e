//! Generic resource controller: one instance per exposed entity, bound to its model,
//! store, serializer generator and default-exclude policy.

use crate::config::{ResolvedModel, ResourceDescriptor};
use crate::error::{AppError, ConfigError};
use crate::extractors::{Actor, RequestLocals};
use crate::jsonapi::{self, Document, Mode, SerializerConfig, SerializerConfigGenerator, SerializerRegistry};
use crate::query::{QueryCompiler, QueryDescriptor, QueryRequest};
use crate::store::ResourceStore;
use crate::workflow::{Transition, STATUS_ATTRIBUTE};
use serde_json::{json, Map, Value};
use std::sync::Arc;

/// Attributes the server owns; stripped from create/update payloads whatever the client sends.
pub const SERVER_MANAGED_ATTRIBUTES: [&str; 6] =
    ["status", "createdBy", "reviewedBy", "publishedBy", "createdAt", "updatedAt"];

const UPDATED_BY_ATTRIBUTE: &str = "updatedById";

#[derive(Clone, Default)]
pub struct ControllerOptions {
    /// Associations (by name, alias or target entity) never expanded for this resource.
    pub default_excludes: Vec<String>,
    /// Generators of other entities, used to configure included relations.
    pub registry: Option<Arc<SerializerRegistry>>,
}

pub struct ResourceController {
    model: Arc<ResolvedModel>,
    resource: ResourceDescriptor,
    store: Arc<dyn ResourceStore>,
    generator: Arc<dyn SerializerConfigGenerator>,
    options: ControllerOptions,
}

impl ResourceController {
    pub fn new(
        resource: &str,
        model: Arc<ResolvedModel>,
        store: Arc<dyn ResourceStore>,
        generator: Arc<dyn SerializerConfigGenerator>,
        options: ControllerOptions,
    ) -> Result<Self, ConfigError> {
        let resource = model
            .resource(resource)
            .cloned()
            .ok_or_else(|| ConfigError::MissingReference {
                kind: "entity",
                id: resource.to_string(),
            })?;
        Ok(ResourceController {
            model,
            resource,
            store,
            generator,
            options,
        })
    }

    pub fn resource(&self) -> &ResourceDescriptor {
        &self.resource
    }

    fn compiler(&self) -> QueryCompiler<'_> {
        QueryCompiler::new(&self.model, &self.resource, &self.options.default_excludes)
    }

    fn serializer_config(&self, included: &[String], mode: Mode) -> SerializerConfig {
        let extra = self
            .options
            .registry
            .as_ref()
            .map(|registry| registry.included_config(&self.model, &self.resource, included));
        self.generator.generate(included, mode, extra.as_ref())
    }

    fn render(&self, payload: &Value, included: &[String], config: Option<SerializerConfig>) -> Document {
        let config = config.unwrap_or_else(|| self.serializer_config(included, Mode::Serialize));
        jsonapi::serialize(&self.resource.type_name, payload, &config, None)
    }

    /// Path id typed after the primary key column.
    pub fn parse_id(&self, raw: &str) -> Result<Value, AppError> {
        let pg_type = self
            .resource
            .primary_key_attribute()
            .map(|a| a.pg_type.to_ascii_lowercase())
            .unwrap_or_default();
        if pg_type.contains("int") || pg_type.contains("serial") {
            let n: i64 = raw.parse().map_err(|_| AppError::BadRequest("invalid id".into()))?;
            return Ok(Value::Number(n.into()));
        }
        if pg_type == "uuid" {
            let u = uuid::Uuid::parse_str(raw).map_err(|_| AppError::BadRequest("invalid uuid".into()))?;
            return Ok(Value::String(u.to_string()));
        }
        Ok(Value::String(raw.to_string()))
    }

    /// Deserialize a request document into a flat record with server-managed attributes removed.
    fn incoming_record(&self, body: Option<&Value>) -> Result<Map<String, Value>, AppError> {
        let body = body.ok_or(AppError::MissingBody)?;
        let config = self.serializer_config(&[], Mode::Deserialize);
        let mut record = match jsonapi::deserialize(body, &config)? {
            Value::Object(record) => record,
            _ => return Err(AppError::BadRequest("a single resource object is required".into())),
        };
        for name in SERVER_MANAGED_ATTRIBUTES {
            record.remove(name);
        }
        Ok(record)
    }

    async fn refetch(&self, id: Value) -> Result<Value, AppError> {
        self.store
            .find_one(&self.resource, &self.compiler().refetch(id))
            .await?
            .ok_or(AppError::NotFound)
    }

    /// `GET /resource`
    pub async fn handle_query(&self, locals: &RequestLocals, req: &QueryRequest) -> Result<Document, AppError> {
        locals.ensure_allowed()?;
        let compiler = self.compiler();
        let descriptor = compiler.list(req, locals.status.as_ref())?;
        let (rows, count) = self.store.find_and_count_all(&self.resource, &descriptor).await?;
        let pagination = compiler.pagination(req, count);
        tracing::debug!(resource = %self.resource.name, count, rows = rows.len(), "query");

        let mut document = self.render(&Value::Array(rows), &req.include, None);
        document.meta = Some(json!({ "pagination": pagination }));
        document.links = Some(pagination.page_links(descriptor.limit.unwrap_or_default()));
        Ok(document)
    }

    /// `GET /resource/:id`
    pub async fn handle_query_by_id(
        &self,
        locals: &RequestLocals,
        req: &QueryRequest,
        id: &str,
    ) -> Result<Document, AppError> {
        locals.ensure_allowed()?;
        let id = self.parse_id(id)?;
        let descriptor = self.compiler().by_id(req, locals.status.as_ref(), id)?;
        let row = self
            .store
            .find_one(&self.resource, &descriptor)
            .await?
            .ok_or(AppError::NotFound)?;
        Ok(self.render(&row, &req.include, None))
    }

    /// `POST /resource`
    pub async fn handle_create(&self, locals: &RequestLocals, body: Option<&Value>) -> Result<Document, AppError> {
        locals.ensure_allowed()?;
        let record = self.incoming_record(body)?;
        let created = self.store.create(&self.resource, &record).await?;
        let id = created
            .get(&self.resource.primary_key)
            .cloned()
            .ok_or_else(|| AppError::Internal("created row carries no primary key".into()))?;
        tracing::info!(resource = %self.resource.name, id = %id, "created");
        let row = self.refetch(id).await?;
        Ok(self.render(&row, &[], None))
    }

    /// `PATCH /resource/:id`
    pub async fn handle_update_by_id(
        &self,
        locals: &RequestLocals,
        actor: Option<&Actor>,
        id: &str,
        body: Option<&Value>,
    ) -> Result<Document, AppError> {
        locals.ensure_allowed()?;
        let id = self.parse_id(id)?;
        let mut record = self.incoming_record(body)?;
        let actor_id = actor.and_then(Actor::id).ok_or(AppError::Unauthorized)?;
        record.insert(UPDATED_BY_ATTRIBUTE.into(), actor_id.clone());
        self.store.update(&self.resource, &id, &record).await?;
        let row = self.refetch(id).await?;
        Ok(self.render(&row, &[], None))
    }

    /// `DELETE /resource/:id`
    pub async fn handle_delete_by_id(&self, locals: &RequestLocals, id: &str) -> Result<(), AppError> {
        locals.ensure_allowed()?;
        let id = self.parse_id(id)?;
        let removed = self.store.destroy(&self.resource, &id).await?;
        tracing::info!(resource = %self.resource.name, id = %id, removed, "deleted");
        Ok(())
    }

    /// `POST /resource/:id/review`
    pub async fn handle_review(&self, locals: &RequestLocals, actor: Option<&Actor>, id: &str) -> Result<Document, AppError> {
        self.advance(locals, actor, id, Transition::Review).await
    }

    /// `POST /resource/:id/publish`
    pub async fn handle_publish(&self, locals: &RequestLocals, actor: Option<&Actor>, id: &str) -> Result<Document, AppError> {
        self.advance(locals, actor, id, Transition::Publish).await
    }

    async fn advance(
        &self,
        locals: &RequestLocals,
        actor: Option<&Actor>,
        id: &str,
        transition: Transition,
    ) -> Result<Document, AppError> {
        locals.ensure_allowed()?;
        let actor = actor.ok_or(AppError::Unauthorized)?;
        let actor_id = actor.id().ok_or(AppError::Unauthorized)?;
        let id = self.parse_id(id)?;
        if !self.resource.has_attribute(STATUS_ATTRIBUTE) {
            return Err(AppError::NoStatus("this entity does not have a status flag".into()));
        }

        let lookup = QueryDescriptor::by_id(&self.resource.primary_key, id.clone(), Vec::new());
        let current = self
            .store
            .find_one(&self.resource, &lookup)
            .await?
            .ok_or(AppError::NotFound)?;
        let next = transition.check(current.get(STATUS_ATTRIBUTE))?;

        let mut values = Map::new();
        values.insert(STATUS_ATTRIBUTE.into(), Value::String(next.as_str().into()));
        values.insert(transition.actor_attribute().into(), actor_id.clone());
        self.store.update(&self.resource, &id, &values).await?;
        tracing::info!(resource = %self.resource.name, id = %id, status = %next, "status changed");

        let mut row = self.refetch(id).await?;
        if let Some(obj) = row.as_object_mut() {
            obj.insert(transition.actor_key().into(), actor.0.clone());
        }
        let mut config = self.serializer_config(&[], Mode::Serialize);
        if !config.attributes.is_empty() && !config.attributes.iter().any(|a| a == transition.actor_key()) {
            config.attributes.push(transition.actor_key().into());
        }
        Ok(self.render(&row, &[], Some(config)))
    }
}
