//! # Document Translator
//!
//! Turns request bodies into JSON documents and handler results back into
//! JSON responses, enforcing the schemas bound in the [`SchemaRegistry`].
//!
//! ## Request Phase
//!
//! [`json_translator`] reads and decodes the body before routing continues.
//! The decoded document is stored as a [`Document`] request extension. A
//! body that is declared but empty, too large, unreadable, not UTF-8, or
//! not JSON ends the request with a 4xx.
//!
//! ## Pre-dispatch Validation
//!
//! [`JsonTranslator::validate_request`] is called by the resource glue once
//! the handler in effect is known. A document that fails its request schema
//! is rejected with 400 and the handler never runs.
//!
//! ## Response Phase
//!
//! When the handler leaves a [`HandlerOutput`] on the response,
//! [`json_translator`] validates it against the response schema and writes
//! it as the body. A result that fails validation is never sent: the full
//! report goes to the [`DiagnosticSink`] and the client receives an opaque
//! 500.

use std::sync::Arc;

use axum::body::Body;
use axum::extract::{Extension, Request};
use axum::http::header::{CONTENT_LENGTH, CONTENT_TYPE};
use axum::http::{HeaderMap, HeaderValue};
use axum::middleware::Next;
use axum::response::{IntoResponse, Response};
use http_body::Body as _;
use http_body_util::{BodyExt, LengthLimitError, Limited};
use jsonio_schema::{Dispatch, SchemaRegistry};
use serde_json::Value;

use crate::config::JsonIoConfig;
use crate::context::{Document, HandlerOutput};
use crate::diagnostics::{DiagnosticSink, TracingSink};
use crate::error::{ApiError, DecodeError};

/// Shared state of the JSON pipeline: the frozen schema registry, where
/// blocked responses are reported, and body limits.
#[derive(Clone)]
pub struct JsonTranslator {
    registry: Arc<SchemaRegistry>,
    sink: Arc<dyn DiagnosticSink>,
    config: JsonIoConfig,
}

impl std::fmt::Debug for JsonTranslator {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("JsonTranslator")
            .field("bindings", &self.registry.len())
            .field("config", &self.config)
            .finish_non_exhaustive()
    }
}

impl JsonTranslator {
    /// Translator over `registry`, reporting through [`TracingSink`] with the
    /// default [`JsonIoConfig`].
    pub fn new(registry: impl Into<Arc<SchemaRegistry>>) -> Self {
        Self {
            registry: registry.into(),
            sink: Arc::new(TracingSink),
            config: JsonIoConfig::default(),
        }
    }

    /// Report blocked responses to `sink` instead.
    pub fn with_sink(mut self, sink: impl DiagnosticSink + 'static) -> Self {
        self.sink = Arc::new(sink);
        self
    }

    /// Replace the configuration.
    pub fn with_config(mut self, config: JsonIoConfig) -> Self {
        self.config = config;
        self
    }

    /// The schema registry consulted at dispatch time.
    pub fn registry(&self) -> &SchemaRegistry {
        &self.registry
    }

    /// Active configuration.
    pub fn config(&self) -> JsonIoConfig {
        self.config
    }

    /// Read and decode a request body.
    ///
    /// Returns `Ok(None)` when no body is declared. A length is declared by
    /// `Content-Length`, or by the body itself when its size is known; an
    /// unknown length is read and treated as absent if nothing arrives.
    ///
    /// # Errors
    ///
    /// - [`ApiError::PayloadTooLarge`] past `max_body_bytes`.
    /// - [`ApiError::BodyUnreadable`] when the stream fails.
    /// - [`ApiError::EmptyBody`] when a non-zero length was declared but no
    ///   bytes arrived.
    /// - [`ApiError::MalformedJson`] when the bytes are not UTF-8 JSON.
    pub async fn read_document(
        &self,
        headers: &HeaderMap,
        body: Body,
    ) -> Result<Option<Value>, ApiError> {
        let declared = declared_length(headers).or_else(|| body.size_hint().exact());
        if declared == Some(0) {
            return Ok(None);
        }

        let limit = self.config.max_body_bytes;
        if declared.is_some_and(|len| len > limit as u64) {
            return Err(ApiError::PayloadTooLarge { limit });
        }

        let bytes = Limited::new(body, limit)
            .collect()
            .await
            .map_err(|e| {
                if e.downcast_ref::<LengthLimitError>().is_some() {
                    ApiError::PayloadTooLarge { limit }
                } else {
                    ApiError::BodyUnreadable(e.to_string())
                }
            })?
            .to_bytes();

        if bytes.is_empty() {
            return match declared {
                Some(_) => Err(ApiError::EmptyBody),
                None => Ok(None),
            };
        }

        Ok(Some(Self::decode(&bytes)?))
    }

    /// Decode UTF-8 JSON.
    ///
    /// # Errors
    ///
    /// [`DecodeError::Encoding`] for invalid UTF-8, [`DecodeError::Syntax`]
    /// for invalid JSON.
    pub fn decode(bytes: &[u8]) -> Result<Value, DecodeError> {
        let text = std::str::from_utf8(bytes)?;
        Ok(serde_json::from_str(text)?)
    }

    /// Check the request document against the request schema of `dispatch`.
    ///
    /// Only body-carrying verbs are checked. Without a bound schema every
    /// document, and its absence, passes.
    ///
    /// # Errors
    ///
    /// - [`ApiError::EmptyBody`] when a schema is bound but there is no document.
    /// - [`ApiError::InvalidRequestBody`] with the violations otherwise.
    pub fn validate_request(
        &self,
        dispatch: &Dispatch,
        document: Option<&Value>,
    ) -> Result<(), ApiError> {
        if !dispatch.verb().carries_body() {
            return Ok(());
        }
        let Some(schema) = self.registry.request_schema(dispatch) else {
            return Ok(());
        };
        let document = document.ok_or(ApiError::EmptyBody)?;

        schema.validate(document).map_err(|violations| {
            tracing::debug!(
                dispatch = %dispatch,
                violations = violations.len(),
                "request document rejected"
            );
            ApiError::InvalidRequestBody(violations.to_string())
        })
    }

    /// Validate a handler result against the response schema of `dispatch`
    /// and serialize it.
    ///
    /// Without a dispatch (unrecognized method) or a bound schema the result
    /// is serialized as-is.
    ///
    /// # Errors
    ///
    /// [`ApiError::Undisclosed`] when the result fails validation. Exactly
    /// one message naming the dispatch and carrying the full report is sent
    /// to the diagnostic sink first.
    pub fn render_result(
        &self,
        dispatch: Option<&Dispatch>,
        result: &Value,
    ) -> Result<Vec<u8>, ApiError> {
        if let Some(dispatch) = dispatch {
            if let Some(schema) = self.registry.response_schema(dispatch) {
                if let Err(violations) = schema.validate(result) {
                    self.sink.record(format!(
                        "Blocking proposed response from being sent from {dispatch} to client \
                         as it does not match the defined schema: {}",
                        violations.report()
                    ));
                    return Err(ApiError::Undisclosed(format!(
                        "result of {dispatch} failed its response schema"
                    )));
                }
            }
        }

        serde_json::to_vec(result).map_err(|e| ApiError::Undisclosed(e.to_string()))
    }
}

fn declared_length(headers: &HeaderMap) -> Option<u64> {
    headers
        .get(CONTENT_LENGTH)?
        .to_str()
        .ok()?
        .trim()
        .parse()
        .ok()
}

/// Axum middleware decoding request bodies and rendering handler results.
///
/// Requires an `Extension<Arc<JsonTranslator>>` layered outside it.
pub async fn json_translator(
    Extension(translator): Extension<Arc<JsonTranslator>>,
    request: Request,
    next: Next,
) -> Response {
    let (mut parts, body) = request.into_parts();
    match translator.read_document(&parts.headers, body).await {
        Ok(Some(document)) => {
            parts.extensions.insert(Document(document));
        }
        Ok(None) => {}
        Err(err) => return err.into_response(),
    }

    let mut response = next
        .run(Request::from_parts(parts, Body::empty()))
        .await;

    let Some(output) = response.extensions_mut().remove::<HandlerOutput>() else {
        return response;
    };
    match translator.render_result(output.dispatch.as_ref(), &output.result) {
        Ok(bytes) => {
            let headers = response.headers_mut();
            headers.insert(CONTENT_TYPE, HeaderValue::from_static("application/json"));
            headers.remove(CONTENT_LENGTH);
            *response.body_mut() = Body::from(bytes);
            response
        }
        Err(err) => err.into_response(),
    }
}
