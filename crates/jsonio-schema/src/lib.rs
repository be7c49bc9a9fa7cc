//! # jsonio-schema — Handler Schema Bindings
//!
//! Compiled JSON Schemas and the registry that attaches them to HTTP
//! handlers. This crate knows nothing about HTTP transport; the axum
//! middleware in `jsonio-api` consults it at request time.
//!
//! ## Registration
//!
//! Schemas are bound once at startup, either to a single handler
//! ([`HandlerId`]) or to a verb of a resource type ([`ResourceId`] plus
//! [`Verb`]). A schema document is compiled when the [`Schema`] is built,
//! so a malformed schema fails registration instead of a request.
//!
//! ```text
//! registry.bind_request_schema(Schema::new(doc)?, HandlerId::of::<Users>(Verb::Create), None)?;
//! registry.bind_response_schema(Schema::new(doc)?, ResourceId::of::<Admins>(), Some(Verb::Create))?;
//! ```
//!
//! ## Lookup
//!
//! [`SchemaRegistry::resolve`] takes a [`Dispatch`] (the concrete resource
//! and the handler in effect) and returns the request and response schemas
//! to apply, preferring the handler's own binding over resource-level ones.
//!
//! ## Schema Files
//!
//! [`SchemaSet`] loads `*.schema.json` / `*.schema.yaml` files from a
//! directory and resolves cross-file `$ref`s locally.
//!
//! ## Crate Policy
//!
//! - No HTTP types; verbs are matched by method name.
//! - The registry is mutated only during startup and shared read-only after.

pub mod error;
pub mod loader;
pub mod registry;
pub mod schema;
pub mod verb;

pub use error::{BindingError, SchemaError};
pub use loader::SchemaSet;
pub use registry::{Dispatch, HandlerId, ResolvedSchemas, ResourceId, SchemaRegistry, Target};
pub use schema::{FormatCheck, Schema, SchemaOptions, ValidationViolations, Violation};
pub use verb::Verb;

/// Re-exported so callers can pin a dialect in [`SchemaOptions`].
pub use jsonschema::Draft;
