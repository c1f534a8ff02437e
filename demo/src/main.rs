//! Sample application: users, their secrets, and articles with the review/publish workflow.
//!
//! Run from repo root: `cargo run -p demo` (needs `DATABASE_URL`).
//! Writes that need an actor read the user id from the `X-User-Id` header.

use axum::{
    extract::Request,
    middleware::{self, Next},
    response::Response,
    Router,
};
use jsonapi_resource::case::KeyCase;
use jsonapi_resource::jsonapi::{id_only, RelationConfig};
use jsonapi_resource::{
    common_routes, init_tracing, load_from_dir, resolve, resource_routes, sync_schema, Actor, ControllerOptions,
    Mode, ModelSerializer, PgStore, ResourceController, ResourceStore, SerializerConfig, SerializerRegistry,
    ServerConfig,
};
use serde_json::json;
use std::sync::Arc;
use tokio::net::TcpListener;

const ACTOR_HEADER: &str = "x-user-id";

fn deserialize_config(relation: &str) -> SerializerConfig {
    let mut config = SerializerConfig {
        key_for_attribute: KeyCase::Camel,
        ..SerializerConfig::default()
    };
    config.relations.insert(
        relation.into(),
        RelationConfig {
            value_for_relationship: Some(id_only),
            ..RelationConfig::default()
        },
    );
    config
}

fn serialize_config(attributes: &[&str], relation: &str, type_name: &str, extra: Option<&SerializerConfig>) -> SerializerConfig {
    let mut config = SerializerConfig {
        attributes: attributes.iter().map(|a| a.to_string()).collect(),
        ..SerializerConfig::default()
    };
    config.relations.insert(
        relation.into(),
        RelationConfig {
            type_name: Some(type_name.into()),
            ..RelationConfig::default()
        },
    );
    match extra {
        Some(extra) => config.merge(extra),
        None => config,
    }
}

fn user_serializer(_included: &[String], mode: Mode, extra: Option<&SerializerConfig>) -> SerializerConfig {
    match mode {
        Mode::Deserialize => deserialize_config("secrets"),
        Mode::Serialize => serialize_config(&["firstName", "lastName", "secrets"], "secrets", "secrets", extra),
    }
}

fn secret_serializer(_included: &[String], mode: Mode, extra: Option<&SerializerConfig>) -> SerializerConfig {
    match mode {
        Mode::Deserialize => deserialize_config("user"),
        Mode::Serialize => serialize_config(&["text", "user"], "user", "users", extra),
    }
}

/// Stand-in for real authentication: trusts `X-User-Id`.
async fn actor_from_header(mut req: Request, next: Next) -> Response {
    let id = req
        .headers()
        .get(ACTOR_HEADER)
        .and_then(|v| v.to_str().ok())
        .and_then(|s| s.trim().parse::<i64>().ok());
    if let Some(id) = id {
        req.extensions_mut().insert(Actor(json!({ "id": id })));
    }
    next.run(req).await
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    init_tracing("jsonapi_resource=info,demo=info");

    let settings = ServerConfig::from_env()?;
    let config = load_from_dir(&settings.model_path).await?;
    let model = Arc::new(resolve(&config)?);

    let pool = sqlx::postgres::PgPoolOptions::new()
        .max_connections(settings.db_max_connections)
        .connect(&settings.database_url)
        .await?;
    sync_schema(&pool, &model).await?;
    let store: Arc<dyn ResourceStore> = Arc::new(PgStore::new(pool, model.clone()));

    let mut registry = SerializerRegistry::new();
    registry.register("user", Arc::new(user_serializer));
    registry.register("secret", Arc::new(secret_serializer));
    let registry = Arc::new(registry);

    let users = ResourceController::new(
        "user",
        model.clone(),
        store.clone(),
        Arc::new(user_serializer),
        ControllerOptions {
            default_excludes: vec!["secret".into()],
            registry: Some(registry.clone()),
        },
    )?;
    let secrets = ResourceController::new(
        "secret",
        model.clone(),
        store.clone(),
        Arc::new(secret_serializer),
        ControllerOptions {
            default_excludes: Vec::new(),
            registry: Some(registry.clone()),
        },
    )?;
    let article = model.resource("article").ok_or("model has no article entity")?;
    let articles = ResourceController::new(
        "article",
        model.clone(),
        store.clone(),
        Arc::new(ModelSerializer::new(&model, article)),
        ControllerOptions {
            default_excludes: Vec::new(),
            registry: Some(registry),
        },
    )?;

    let app = Router::new()
        .merge(common_routes(store))
        .merge(resource_routes(Arc::new(users)))
        .merge(resource_routes(Arc::new(secrets)))
        .merge(resource_routes(Arc::new(articles)))
        .layer(middleware::from_fn(actor_from_header));

    let listener = TcpListener::bind(&settings.bind_addr).await?;
    tracing::info!("demo listening on http://{}", listener.local_addr()?);
    axum::serve(listener, app).await?;
    Ok(())
}
