//! # API Error Types
//!
//! Every way the pipeline can end a request early, mapped to a status code
//! and a `{"title", "description"}` JSON body.
//!
//! Client errors carry enough detail to self-correct. Server errors never
//! do: [`ApiError::Undisclosed`] keeps its reason for the log and sends the
//! fixed body `{"title":"Internal Server Error","description":"Undisclosed"}`.
//! 406 and 405 responses have no body.

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// JSON error body.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ErrorBody {
    /// Error category.
    pub title: String,
    /// Detail safe to show the client.
    pub description: String,
}

/// Why a request body could not be decoded as JSON.
#[derive(Error, Debug)]
pub enum DecodeError {
    /// The bytes are not UTF-8.
    #[error("body is not valid UTF-8: {0}")]
    Encoding(#[from] std::str::Utf8Error),

    /// The text is not JSON.
    #[error("body is not valid JSON: {0}")]
    Syntax(#[from] serde_json::Error),
}

/// Pipeline error that implements [`IntoResponse`] for axum.
#[derive(Error, Debug)]
pub enum ApiError {
    /// The client cannot accept a JSON representation (406).
    #[error("client does not accept JSON responses")]
    NotAcceptable,

    /// A body-carrying request without a JSON content type (415).
    #[error("request content type is not JSON")]
    UnsupportedMediaType,

    /// A body was declared but none arrived, or a schema needs one (400).
    #[error("request body is empty")]
    EmptyBody,

    /// The body is not UTF-8 encoded JSON (400).
    #[error("malformed JSON: {0}")]
    MalformedJson(#[from] DecodeError),

    /// The body stream failed before it was fully read (400).
    #[error("request body could not be read: {0}")]
    BodyUnreadable(String),

    /// The body exceeds the configured limit (413).
    #[error("request body exceeds {limit} bytes")]
    PayloadTooLarge {
        /// Configured limit in bytes.
        limit: usize,
    },

    /// The decoded document fails the handler's request schema (400).
    #[error("invalid request body: {0}")]
    InvalidRequestBody(String),

    /// The resource has no handler for this method (405).
    #[error("method not allowed")]
    MethodNotAllowed,

    /// An error raised by a handler, rendered as given.
    #[error("{title}: {description}")]
    Http {
        /// Response status.
        status: StatusCode,
        /// Error category.
        title: String,
        /// Detail shown to the client.
        description: String,
    },

    /// A server fault whose reason must not reach the client (500).
    #[error("undisclosed internal error: {0}")]
    Undisclosed(String),
}

impl ApiError {
    /// Handler-raised error with an explicit status and body.
    pub fn http(status: StatusCode, title: impl Into<String>, description: impl Into<String>) -> Self {
        Self::Http {
            status,
            title: title.into(),
            description: description.into(),
        }
    }

    /// Response status for this error.
    pub fn status(&self) -> StatusCode {
        match self {
            Self::NotAcceptable => StatusCode::NOT_ACCEPTABLE,
            Self::UnsupportedMediaType => StatusCode::UNSUPPORTED_MEDIA_TYPE,
            Self::EmptyBody
            | Self::MalformedJson(_)
            | Self::BodyUnreadable(_)
            | Self::InvalidRequestBody(_) => StatusCode::BAD_REQUEST,
            Self::PayloadTooLarge { .. } => StatusCode::PAYLOAD_TOO_LARGE,
            Self::MethodNotAllowed => StatusCode::METHOD_NOT_ALLOWED,
            Self::Http { status, .. } => *status,
            Self::Undisclosed(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    /// Client-facing body, or `None` when the response has no body.
    pub fn body(&self) -> Option<ErrorBody> {
        let (title, description) = match self {
            Self::NotAcceptable | Self::MethodNotAllowed => return None,
            Self::UnsupportedMediaType => (
                "Unsupported media type",
                "This API supports only JSON-encoded requests".to_string(),
            ),
            Self::EmptyBody => (
                "Empty request body",
                "A valid JSON document is required".to_string(),
            ),
            Self::MalformedJson(_) => (
                "Malformed JSON",
                "Could not decode the request body. The JSON was incorrect or not encoded as UTF-8"
                    .to_string(),
            ),
            Self::BodyUnreadable(_) => (
                "Unreadable request body",
                "The request body could not be read".to_string(),
            ),
            Self::PayloadTooLarge { limit } => (
                "Request body too large",
                format!("The request body must not exceed {limit} bytes"),
            ),
            Self::InvalidRequestBody(detail) => ("Invalid request body", detail.clone()),
            Self::Http {
                title, description, ..
            } => {
                return Some(ErrorBody {
                    title: title.clone(),
                    description: description.clone(),
                })
            }
            Self::Undisclosed(_) => ("Internal Server Error", "Undisclosed".to_string()),
        };
        Some(ErrorBody {
            title: title.to_string(),
            description,
        })
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.status();

        if status.is_server_error() {
            tracing::error!(error = %self, "request failed");
        } else {
            tracing::debug!(error = %self, status = status.as_u16(), "request rejected");
        }

        match self.body() {
            Some(body) => (status, Json(body)).into_response(),
            None => status.into_response(),
        }
    }
}
