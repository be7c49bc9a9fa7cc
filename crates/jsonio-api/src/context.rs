//! # Request Context
//!
//! Per-request state shared between the translator and a handler. The
//! translator stores the decoded body as a [`Document`] request extension;
//! the resource glue moves it into a [`RequestContext`] for the handler,
//! and the handler's result travels back to the translator as a
//! [`HandlerOutput`] response extension.

use axum::body::Body;
use axum::http::request::Parts;
use axum::http::{HeaderMap, Method, StatusCode, Uri};
use axum::response::Response;
use jsonio_schema::Dispatch;
use serde_json::Value;

/// The decoded request body.
#[derive(Debug, Clone, PartialEq)]
pub struct Document(pub Value);

/// A handler result awaiting response validation and serialization.
#[derive(Debug, Clone)]
pub struct HandlerOutput {
    /// Dispatch that produced the result; `None` for unrecognized methods.
    pub dispatch: Option<Dispatch>,
    /// The result value.
    pub result: Value,
}

/// What a handler sees and fills in.
#[derive(Debug)]
pub struct RequestContext {
    parts: Parts,
    doc: Option<Value>,
    result: Option<Value>,
    status: StatusCode,
    headers: HeaderMap,
}

impl RequestContext {
    /// Context for a request whose body has been decoded (or was absent).
    pub fn new(parts: Parts, doc: Option<Value>) -> Self {
        Self {
            parts,
            doc,
            result: None,
            status: StatusCode::OK,
            headers: HeaderMap::new(),
        }
    }

    /// Request method.
    pub fn method(&self) -> &Method {
        &self.parts.method
    }

    /// Request URI.
    pub fn uri(&self) -> &Uri {
        &self.parts.uri
    }

    /// Request headers.
    pub fn request_headers(&self) -> &HeaderMap {
        &self.parts.headers
    }

    /// Request parts, including extensions set by outer layers.
    pub fn parts(&self) -> &Parts {
        &self.parts
    }

    /// The decoded request document, if the request had a body.
    pub fn doc(&self) -> Option<&Value> {
        self.doc.as_ref()
    }

    /// Take ownership of the decoded document.
    pub fn take_doc(&mut self) -> Option<Value> {
        self.doc.take()
    }

    /// Set the value to validate and send as the response body.
    pub fn set_result(&mut self, result: Value) {
        self.result = Some(result);
    }

    /// Response status; defaults to 200.
    pub fn status(&self) -> StatusCode {
        self.status
    }

    /// Set the response status.
    pub fn set_status(&mut self, status: StatusCode) {
        self.status = status;
    }

    /// Extra response headers.
    pub fn headers_mut(&mut self) -> &mut HeaderMap {
        &mut self.headers
    }

    /// Build the bodiless response the translator completes.
    pub(crate) fn into_response(self, dispatch: Option<Dispatch>) -> Response {
        let mut response = Response::new(Body::empty());
        *response.status_mut() = self.status;
        response.headers_mut().extend(self.headers);
        if let Some(result) = self.result {
            response
                .extensions_mut()
                .insert(HandlerOutput { dispatch, result });
        }
        response
    }
}
