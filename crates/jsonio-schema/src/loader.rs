//! # Schema Files
//!
//! Loads schema documents from a directory so handlers can share them by
//! name. Files named `*.schema.json`, `*.schema.yaml` or `*.schema.yml`
//! are read (non-recursively) and indexed by file name and by their `$id`.
//!
//! ## Reference Resolution
//!
//! Cross-file `$ref`s resolve against the loaded set only. A reference is
//! matched by full URI first, then by its last path segment, so both
//! `{"$ref": "address.schema.json"}` and
//! `{"$ref": "https://example.test/schemas/address.schema.json"}` find a
//! file named `address.schema.json`. Unknown references fail compilation;
//! nothing is fetched over the network.

use std::collections::HashMap;
use std::path::{Path, PathBuf};

use jsonschema::{Retrieve, Uri};
use serde_json::Value;

use crate::error::SchemaError;
use crate::schema::{Schema, SchemaOptions};

const SCHEMA_SUFFIXES: [&str; 3] = [".schema.json", ".schema.yaml", ".schema.yml"];

/// Resolves `$ref` URIs against documents already in memory.
#[derive(Debug, Clone)]
pub(crate) struct LocalSchemaRetriever {
    by_uri: HashMap<String, Value>,
}

impl Retrieve for LocalSchemaRetriever {
    fn retrieve(
        &self,
        uri: &Uri<&str>,
    ) -> Result<Value, Box<dyn std::error::Error + Send + Sync>> {
        let uri_str = uri.as_str();

        if let Some(value) = self.by_uri.get(uri_str) {
            return Ok(value.clone());
        }

        let filename = uri_str.rsplit('/').next().unwrap_or(uri_str);
        self.by_uri
            .get(filename)
            .cloned()
            .ok_or_else(|| format!("schema not found for URI: {uri_str}").into())
    }
}

/// A named collection of schema documents loaded from disk.
#[derive(Debug, Clone)]
pub struct SchemaSet {
    dir: PathBuf,
    /// File name → document.
    documents: HashMap<String, Value>,
}

impl SchemaSet {
    /// Load every schema file in `dir`.
    ///
    /// # Errors
    ///
    /// Returns [`SchemaError::Load`] if the directory cannot be read or a
    /// file is not valid JSON/YAML.
    pub fn load_dir(dir: impl AsRef<Path>) -> Result<Self, SchemaError> {
        let dir = dir.as_ref().to_path_buf();
        let entries = std::fs::read_dir(&dir).map_err(|e| SchemaError::Load {
            path: dir.display().to_string(),
            reason: format!("cannot read schema directory: {e}"),
        })?;

        let mut documents = HashMap::new();
        for entry in entries {
            let path = entry?.path();
            let Some(name) = path.file_name().and_then(|n| n.to_str()) else {
                continue;
            };
            if !SCHEMA_SUFFIXES.iter().any(|suffix| name.ends_with(suffix)) {
                continue;
            }

            let content = std::fs::read_to_string(&path)?;
            let document = parse_document(name, &content).map_err(|reason| SchemaError::Load {
                path: path.display().to_string(),
                reason,
            })?;
            tracing::debug!(schema = name, "loaded schema file");
            documents.insert(name.to_string(), document);
        }

        Ok(Self { dir, documents })
    }

    /// Directory the set was loaded from.
    pub fn dir(&self) -> &Path {
        &self.dir
    }

    /// Number of loaded documents.
    pub fn len(&self) -> usize {
        self.documents.len()
    }

    /// Whether no schema files were found.
    pub fn is_empty(&self) -> bool {
        self.documents.is_empty()
    }

    /// File names of all loaded documents, sorted.
    pub fn names(&self) -> Vec<&str> {
        let mut names: Vec<&str> = self.documents.keys().map(String::as_str).collect();
        names.sort_unstable();
        names
    }

    /// Raw document by file name.
    pub fn get(&self, name: &str) -> Option<&Value> {
        self.documents.get(name)
    }

    /// Compile the named document with the rest of the set available for `$ref`.
    ///
    /// # Errors
    ///
    /// Returns [`SchemaError::NotFound`] for an unknown name and
    /// [`SchemaError::Compile`] if the document or a reference is invalid.
    pub fn compile(&self, name: &str, options: &SchemaOptions) -> Result<Schema, SchemaError> {
        let document = self
            .documents
            .get(name)
            .ok_or_else(|| SchemaError::NotFound(name.to_string()))?;
        Schema::compile(document.clone(), options, Some(self.retriever()))
    }

    fn retriever(&self) -> LocalSchemaRetriever {
        let mut by_uri = HashMap::new();
        for (name, document) in &self.documents {
            if let Some(id) = document.get("$id").and_then(Value::as_str) {
                by_uri.insert(id.to_string(), document.clone());
            }
            by_uri.insert(name.clone(), document.clone());
        }
        LocalSchemaRetriever { by_uri }
    }
}

fn parse_document(name: &str, content: &str) -> Result<Value, String> {
    if name.ends_with(".json") {
        serde_json::from_str(content).map_err(|e| format!("invalid JSON: {e}"))
    } else {
        serde_yaml::from_str(content).map_err(|e| format!("invalid YAML: {e}"))
    }
}
