//! # Compiled Schemas
//!
//! A [`Schema`] pairs a JSON Schema document with the validator compiled
//! from it. Compilation happens once, at construction; the result is
//! immutable and cheap to clone across handlers and threads.
//!
//! The dialect is taken from the document's `$schema` keyword unless
//! [`SchemaOptions::with_draft`] pins one. Format assertions are off by
//! default, as in draft 2020-12, and can be switched on together with
//! custom named formats.

use std::fmt;
use std::sync::Arc;

use jsonschema::{Draft, Validator};
use serde_json::Value;

use crate::error::SchemaError;
use crate::loader::LocalSchemaRetriever;

/// Checker for a custom `format` keyword value.
pub type FormatCheck = Arc<dyn Fn(&str) -> bool + Send + Sync>;

/// Compilation options for a [`Schema`].
#[derive(Clone, Default)]
pub struct SchemaOptions {
    draft: Option<Draft>,
    validate_formats: bool,
    formats: Vec<(String, FormatCheck)>,
}

impl SchemaOptions {
    /// Options with dialect detection and format assertions disabled.
    pub fn new() -> Self {
        Self::default()
    }

    /// Compile against a fixed draft instead of detecting it from `$schema`.
    pub fn with_draft(mut self, draft: Draft) -> Self {
        self.draft = Some(draft);
        self
    }

    /// Treat `format` as an assertion rather than an annotation.
    pub fn validate_formats(mut self, enabled: bool) -> Self {
        self.validate_formats = enabled;
        self
    }

    /// Register a custom format. Implies [`validate_formats`](Self::validate_formats).
    pub fn with_format<F>(mut self, name: impl Into<String>, check: F) -> Self
    where
        F: Fn(&str) -> bool + Send + Sync + 'static,
    {
        self.formats.push((name.into(), Arc::new(check)));
        self.validate_formats = true;
        self
    }

    /// Whether format assertions are enabled.
    pub fn formats_enabled(&self) -> bool {
        self.validate_formats
    }
}

impl fmt::Debug for SchemaOptions {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let names: Vec<&str> = self.formats.iter().map(|(name, _)| name.as_str()).collect();
        f.debug_struct("SchemaOptions")
            .field("draft", &self.draft)
            .field("validate_formats", &self.validate_formats)
            .field("formats", &names)
            .finish()
    }
}

/// An immutable JSON Schema document and its compiled validator.
#[derive(Clone)]
pub struct Schema {
    document: Arc<Value>,
    validator: Arc<Validator>,
}

impl Schema {
    /// Compile `document` with default options.
    ///
    /// # Errors
    ///
    /// Returns [`SchemaError::Compile`] if the document is not a valid schema.
    pub fn new(document: Value) -> Result<Self, SchemaError> {
        Self::with_options(document, &SchemaOptions::default())
    }

    /// Compile `document` with explicit options.
    ///
    /// # Errors
    ///
    /// Returns [`SchemaError::Compile`] if the document is not a valid schema.
    pub fn with_options(document: Value, options: &SchemaOptions) -> Result<Self, SchemaError> {
        Self::compile(document, options, None)
    }

    pub(crate) fn compile(
        document: Value,
        options: &SchemaOptions,
        retriever: Option<LocalSchemaRetriever>,
    ) -> Result<Self, SchemaError> {
        let mut builder = jsonschema::options();
        builder.should_validate_formats(options.validate_formats);
        if let Some(draft) = options.draft {
            builder.with_draft(draft);
        }
        for (name, check) in &options.formats {
            let check = Arc::clone(check);
            builder.with_format(name.clone(), move |value: &str| check(value));
        }
        if let Some(retriever) = retriever {
            builder.with_retriever(retriever);
        }

        let validator = builder.build(&document).map_err(|e| SchemaError::Compile {
            reason: e.to_string(),
        })?;

        Ok(Self {
            document: Arc::new(document),
            validator: Arc::new(validator),
        })
    }

    /// The schema document this validator was compiled from.
    pub fn document(&self) -> &Value {
        &self.document
    }

    /// Whether `instance` conforms.
    pub fn is_valid(&self, instance: &Value) -> bool {
        self.validator.is_valid(instance)
    }

    /// Validate `instance`, collecting every violation.
    ///
    /// # Errors
    ///
    /// Returns the violations when the instance does not conform.
    pub fn validate(&self, instance: &Value) -> Result<(), ValidationViolations> {
        let violations: Vec<Violation> = self
            .validator
            .iter_errors(instance)
            .map(|e| {
                let schema_path = e.schema_path.to_string();
                Violation {
                    keyword: schema_path.rsplit('/').next().unwrap_or_default().to_string(),
                    instance_path: e.instance_path.to_string(),
                    schema_path,
                    message: e.to_string(),
                    instance: e.instance.clone().into_owned(),
                }
            })
            .collect();

        if violations.is_empty() {
            Ok(())
        } else {
            Err(ValidationViolations {
                schema: Arc::clone(&self.document),
                violations,
            })
        }
    }
}

impl fmt::Debug for Schema {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Schema")
            .field("document", &self.document)
            .finish_non_exhaustive()
    }
}

/// A single validation violation.
#[derive(Debug, Clone)]
pub struct Violation {
    /// JSON Pointer to the offending value in the instance.
    pub instance_path: String,
    /// JSON Pointer to the schema keyword that failed.
    pub schema_path: String,
    /// The failing keyword (last segment of `schema_path`).
    pub keyword: String,
    /// Human-readable description.
    pub message: String,
    /// The offending value.
    pub instance: Value,
}

impl fmt::Display for Violation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.instance_path.is_empty() {
            write!(f, "(root): {}", self.message)
        } else {
            write!(f, "{}: {}", self.instance_path, self.message)
        }
    }
}

/// Every violation found in one instance, plus the schema it was checked against.
#[derive(Debug, Clone)]
pub struct ValidationViolations {
    schema: Arc<Value>,
    violations: Vec<Violation>,
}

impl ValidationViolations {
    /// Number of violations. Never zero.
    pub fn len(&self) -> usize {
        self.violations.len()
    }

    /// Always false; present for API symmetry with `len`.
    pub fn is_empty(&self) -> bool {
        self.violations.is_empty()
    }

    /// The individual violations.
    pub fn violations(&self) -> &[Violation] {
        &self.violations
    }

    /// Multi-line diagnostic naming each failing keyword, the schema, and
    /// the offending instance. Meant for server logs, not for clients.
    pub fn report(&self) -> String {
        let schema = indent(&pretty(&self.schema));
        let blocks: Vec<String> = self
            .violations
            .iter()
            .map(|v| {
                let location = if v.instance_path.is_empty() {
                    "(root)"
                } else {
                    v.instance_path.as_str()
                };
                format!(
                    "{message}\n\nFailed validating '{keyword}' in schema at '{schema_path}':\n{schema}\n\nOn instance at {location}:\n{instance}",
                    message = v.message,
                    keyword = v.keyword,
                    schema_path = v.schema_path,
                    instance = indent(&pretty(&v.instance)),
                )
            })
            .collect();
        blocks.join("\n\n")
    }
}

impl fmt::Display for ValidationViolations {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (i, v) in self.violations.iter().enumerate() {
            if i > 0 {
                f.write_str("; ")?;
            }
            write!(f, "{v}")?;
        }
        Ok(())
    }
}

impl std::error::Error for ValidationViolations {}

fn pretty(value: &Value) -> String {
    serde_json::to_string_pretty(value).unwrap_or_else(|_| value.to_string())
}

fn indent(text: &str) -> String {
    text.lines()
        .map(|line| format!("    {line}"))
        .collect::<Vec<_>>()
        .join("\n")
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn credentials_schema() -> Schema {
        Schema::new(json!({
            "type": "object",
            "properties": {
                "email": {"type": "string"},
                "password": {"type": "string"},
            },
            "required": ["email", "password"],
        }))
        .unwrap()
    }

    #[test]
    fn malformed_schema_fails_to_compile() {
        let err = Schema::new(json!({"type": "not-a-type"})).unwrap_err();
        assert!(matches!(err, SchemaError::Compile { .. }), "got: {err}");
    }

    #[test]
    fn conforming_instance_validates() {
        let schema = credentials_schema();
        let doc = json!({"email": "foo@example.com", "password": "hunter2"});
        assert!(schema.validate(&doc).is_ok());
        assert!(schema.is_valid(&doc));
    }

    #[test]
    fn missing_field_is_reported() {
        let schema = credentials_schema();
        let violations = schema
            .validate(&json!({"email": "foo@example.com"}))
            .unwrap_err();
        assert_eq!(violations.len(), 1);
        let v = &violations.violations()[0];
        assert_eq!(v.keyword, "required");
        assert!(v.message.contains("password"), "got: {}", v.message);
        assert!(violations.to_string().starts_with("(root): "));
    }

    #[test]
    fn every_violation_is_collected() {
        let schema = credentials_schema();
        let violations = schema
            .validate(&json!({"email": 1, "password": false}))
            .unwrap_err();
        assert_eq!(violations.len(), 2);
        let paths: Vec<&str> = violations
            .violations()
            .iter()
            .map(|v| v.instance_path.as_str())
            .collect();
        assert!(paths.contains(&"/email"));
        assert!(paths.contains(&"/password"));
    }

    #[test]
    fn report_names_keyword_schema_and_instance() {
        let schema = Schema::new(json!({
            "type": "object",
            "properties": {"email": {"type": "string"}},
            "required": ["email"],
        }))
        .unwrap();
        let report = schema
            .validate(&json!({"this": "does not conform"}))
            .unwrap_err()
            .report();
        assert!(report.contains("Failed validating 'required'"), "{report}");
        assert!(report.contains("\"required\""), "{report}");
        assert!(report.contains("On instance at (root):"), "{report}");
        assert!(report.contains("does not conform"), "{report}");
    }

    #[test]
    fn formats_are_annotations_by_default() {
        let schema = Schema::new(json!({"type": "string", "format": "ipv4"})).unwrap();
        assert!(schema.is_valid(&json!("not an address")));
    }

    #[test]
    fn builtin_formats_assert_when_enabled() {
        let options = SchemaOptions::new().validate_formats(true);
        let schema =
            Schema::with_options(json!({"type": "string", "format": "ipv4"}), &options).unwrap();
        assert!(schema.is_valid(&json!("129.144.52.38")));
        assert!(!schema.is_valid(&json!("not an address")));
    }

    #[test]
    fn custom_format_is_checked() {
        let options =
            SchemaOptions::new().with_format("allcaps", |s: &str| s.chars().all(|c| !c.is_lowercase()));
        assert!(options.formats_enabled());
        let schema =
            Schema::with_options(json!({"type": "string", "format": "allcaps"}), &options).unwrap();
        assert!(schema.is_valid(&json!("ALLCAPS")));
        assert!(!schema.is_valid(&json!("not allcaps")));
    }

    #[test]
    fn pinned_draft_is_used() {
        // Draft 4 spells exclusive bounds as booleans; 2020-12 rejects that form.
        let doc = json!({"type": "integer", "maximum": 10, "exclusiveMaximum": true});
        let options = SchemaOptions::new().with_draft(Draft::Draft4);
        let schema = Schema::with_options(doc, &options).unwrap();
        assert!(schema.is_valid(&json!(9)));
        assert!(!schema.is_valid(&json!(10)));
    }

    #[test]
    fn options_debug_lists_format_names() {
        let options = SchemaOptions::new().with_format("allcaps", |_: &str| true);
        assert!(format!("{options:?}").contains("allcaps"));
    }
}
