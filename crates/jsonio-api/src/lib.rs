//! # jsonio-api — JSON Pipeline for Axum
//!
//! Middleware and resource glue that make an axum router speak JSON only
//! and enforce the schemas bound in a [`SchemaRegistry`].
//!
//! ## Middleware Stack (execution order)
//!
//! ```text
//! Extension<Arc<JsonTranslator>> → require_json → json_translator → resource glue → handler
//! ```
//!
//! - [`require_json`] answers 406 to clients that cannot accept JSON and
//!   415 to body-carrying requests that are not JSON.
//! - [`json_translator`] decodes the body, and after the handler ran,
//!   validates and serializes its result.
//! - [`resource()`] validates the decoded document against the request
//!   schema of the handler in effect, then calls it.
//!
//! ## Failure Masking
//!
//! A handler result that fails its response schema is a server bug. The
//! client gets `500 {"title":"Internal Server Error","description":"Undisclosed"}`
//! and the full validator report goes to the [`DiagnosticSink`].
//!
//! ## Crate Policy
//!
//! - Handlers are synchronous and never see raw bytes.
//! - Schema lookups happen per request against a registry frozen at startup.

pub mod config;
pub mod context;
pub mod diagnostics;
pub mod error;
pub mod negotiation;
pub mod resource;
pub mod translator;

use std::sync::Arc;

use axum::middleware::from_fn;
use axum::{Extension, Router};

pub use config::JsonIoConfig;
pub use context::{Document, HandlerOutput, RequestContext};
pub use diagnostics::{CollectingSink, DiagnosticSink, TracingSink};
pub use error::{ApiError, DecodeError, ErrorBody};
pub use negotiation::require_json;
pub use resource::{dispatch_of, resource, Resource};
pub use translator::{json_translator, JsonTranslator};

pub use jsonio_schema::SchemaRegistry;

/// Install the JSON pipeline on `router`.
pub fn with_json_io<S>(router: Router<S>, translator: JsonTranslator) -> Router<S>
where
    S: Clone + Send + Sync + 'static,
{
    router
        .layer(from_fn(json_translator))
        .layer(from_fn(require_json))
        .layer(Extension(Arc::new(translator)))
}
