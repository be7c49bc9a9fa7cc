//! # jsonio-api — Demo Server
//!
//! Serves a small signup API through the JSON pipeline.
//! Binds to configurable port (default 8080).
//!
//! - `POST /users` takes `{"email", "password"}` and answers 201 `{"email"}`.
//! - `POST /admins` reuses the same handler.
//! - `GET /broken` returns a result that fails its response schema.
//!
//! Schemas are read from the crate's `schemas/` directory, or from
//! `JSONIO_SCHEMA_DIR` when set.

use std::sync::atomic::{AtomicU64, Ordering};

use axum::http::StatusCode;
use axum::Router;
use jsonio_api::{resource, with_json_io, ApiError, JsonIoConfig, JsonTranslator, RequestContext, Resource};
use jsonio_schema::{HandlerId, ResourceId, SchemaOptions, SchemaRegistry, SchemaSet, Verb};
use serde_json::json;
use tower_http::trace::TraceLayer;

#[derive(Default)]
struct Users {
    created: AtomicU64,
}

impl Resource for Users {
    fn on_post(&self, cx: &mut RequestContext) -> Result<(), ApiError> {
        let doc = cx.take_doc().unwrap_or_default();
        let id = self.created.fetch_add(1, Ordering::Relaxed) + 1;
        tracing::info!(id, "user created");
        cx.set_status(StatusCode::CREATED);
        cx.set_result(json!({"email": doc["email"]}));
        Ok(())
    }
}

#[derive(Default)]
struct Admins {
    users: Users,
}

impl Resource for Admins {
    fn on_post(&self, cx: &mut RequestContext) -> Result<(), ApiError> {
        self.users.on_post(cx)
    }

    fn handler_owner(&self, verb: Verb) -> ResourceId {
        match verb {
            Verb::Create => ResourceId::of::<Users>(),
            _ => ResourceId::of::<Self>(),
        }
    }
}

struct Broken;

impl Resource for Broken {
    fn on_get(&self, cx: &mut RequestContext) -> Result<(), ApiError> {
        cx.set_result(json!({"email": 42}));
        Ok(())
    }
}

/// Schema directory shipped with the crate; `JSONIO_SCHEMA_DIR` overrides it.
const DEFAULT_SCHEMA_DIR: &str = concat!(env!("CARGO_MANIFEST_DIR"), "/schemas");

fn registry(schemas: &SchemaSet) -> Result<SchemaRegistry, Box<dyn std::error::Error>> {
    let options = SchemaOptions::new().validate_formats(true);
    let signup = schemas.compile("signup.schema.json", &options)?;
    let profile = schemas.compile("profile.schema.yaml", &options)?;

    let mut registry = SchemaRegistry::new();
    registry
        .bind_request_schema(signup, HandlerId::of::<Users>(Verb::Create), None)?
        .bind_response_schema(profile.clone(), HandlerId::of::<Users>(Verb::Create), None)?
        .bind_response_schema(profile, ResourceId::of::<Broken>(), Some(Verb::Read))?;
    Ok(registry)
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    // Initialize structured tracing.
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .init();

    let port: u16 = std::env::var("PORT")
        .ok()
        .and_then(|p| p.parse().ok())
        .unwrap_or(8080);

    let schema_dir =
        std::env::var("JSONIO_SCHEMA_DIR").unwrap_or_else(|_| DEFAULT_SCHEMA_DIR.to_string());
    let schemas = SchemaSet::load_dir(&schema_dir).map_err(|e| {
        tracing::error!("Schema loading failed: {e}");
        e
    })?;
    let registry = registry(&schemas).map_err(|e| {
        tracing::error!("Schema registration failed: {e}");
        e
    })?;

    let translator = JsonTranslator::new(registry).with_config(JsonIoConfig::from_env());
    tracing::info!(
        schema_dir = %schemas.dir().display(),
        bindings = translator.registry().len(),
        max_body_bytes = translator.config().max_body_bytes,
        "JSON pipeline configured"
    );

    let routes = Router::new()
        .route("/users", resource(Users::default()))
        .route("/admins", resource(Admins::default()))
        .route("/broken", resource(Broken));
    let app = with_json_io(routes, translator).layer(TraceLayer::new_for_http());

    let addr = std::net::SocketAddr::from(([0, 0, 0, 0], port));
    tracing::info!("jsonio API listening on {}", addr);

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}
