//! # Registration Errors
//!
//! Configuration errors raised while schemas are compiled, loaded, or
//! bound. None of these reach request handling: they surface at startup.

use thiserror::Error;

use crate::registry::ResourceId;

/// Error while loading or compiling a schema document.
#[derive(Error, Debug)]
pub enum SchemaError {
    /// The document is not a valid JSON Schema.
    #[error("schema failed to compile: {reason}")]
    Compile {
        /// Compiler diagnostic.
        reason: String,
    },

    /// A schema file could not be read or parsed.
    #[error("schema load error for '{path}': {reason}")]
    Load {
        /// Path to the file that failed.
        path: String,
        /// Reason the file was rejected.
        reason: String,
    },

    /// No schema with this name was loaded.
    #[error("schema not found: {0}")]
    NotFound(String),

    /// IO error walking a schema directory.
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
}

/// Error while binding a schema to a handler or resource.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum BindingError {
    /// A resource-level binding must name the verb it applies to.
    #[error("schema bound to resource {resource} must name a verb")]
    MissingVerb {
        /// The resource the binding was applied to.
        resource: ResourceId,
    },
}
