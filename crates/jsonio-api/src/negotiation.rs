//! # Content Negotiation
//!
//! The first middleware every request meets. It checks headers only and
//! never reads the body.
//!
//! - The client must accept `application/json` (406 otherwise). A missing
//!   or blank `Accept` header accepts anything. Otherwise the most specific media
//!   range matching `application/json` decides, and `q=0` refuses.
//! - `POST`, `PUT` and `PATCH` must send a JSON `Content-Type`
//!   (415 otherwise): `application/json` or a `+json` structured suffix
//!   such as `application/merge-patch+json`. Parameters are ignored.

use axum::extract::Request;
use axum::http::header::{ACCEPT, CONTENT_TYPE};
use axum::http::HeaderMap;
use axum::middleware::Next;
use axum::response::{IntoResponse, Response};
use jsonio_schema::Verb;

use crate::error::ApiError;

/// Axum middleware rejecting requests that cannot speak JSON.
pub async fn require_json(request: Request, next: Next) -> Response {
    if let Err(err) = check(&request) {
        return err.into_response();
    }
    next.run(request).await
}

fn check(request: &Request) -> Result<(), ApiError> {
    let headers = request.headers();
    if !client_accepts_json(headers) {
        return Err(ApiError::NotAcceptable);
    }

    let carries_body = Verb::from_method(request.method().as_str()).is_some_and(Verb::carries_body);
    if carries_body && !has_json_content_type(headers) {
        return Err(ApiError::UnsupportedMediaType);
    }
    Ok(())
}

/// Whether the `Accept` headers admit an `application/json` response.
pub fn client_accepts_json(headers: &HeaderMap) -> bool {
    let values = headers.get_all(ACCEPT);
    // Absent and blank headers both mean "anything".
    let blank = values
        .iter()
        .all(|v| v.to_str().is_ok_and(|v| v.trim().is_empty()));
    if blank {
        return true;
    }

    // (specificity, quality) of the best-matching range so far.
    let mut best: Option<(u8, f32)> = None;
    for value in values.iter() {
        let Ok(value) = value.to_str() else {
            continue;
        };
        for range in value.split(',') {
            let Some(range) = MediaRange::parse(range) else {
                continue;
            };
            let Some(specificity) = range.specificity_for("application", "json") else {
                continue;
            };
            best = match best {
                Some((s, q)) if s > specificity || (s == specificity && q >= range.quality) => {
                    Some((s, q))
                }
                _ => Some((specificity, range.quality)),
            };
        }
    }
    best.is_some_and(|(_, quality)| quality > 0.0)
}

/// Whether `Content-Type` names a JSON representation.
pub fn has_json_content_type(headers: &HeaderMap) -> bool {
    let Some(value) = headers.get(CONTENT_TYPE).and_then(|v| v.to_str().ok()) else {
        return false;
    };
    let essence = value.split(';').next().unwrap_or_default().trim();
    let Some((kind, subtype)) = essence.split_once('/') else {
        return false;
    };
    kind.eq_ignore_ascii_case("application")
        && (subtype.eq_ignore_ascii_case("json")
            || subtype.to_ascii_lowercase().ends_with("+json"))
}

/// One `type/subtype;q=…` entry of an `Accept` header.
#[derive(Debug, Clone, PartialEq)]
struct MediaRange<'a> {
    kind: &'a str,
    subtype: &'a str,
    quality: f32,
}

impl<'a> MediaRange<'a> {
    fn parse(raw: &'a str) -> Option<Self> {
        let mut parts = raw.split(';');
        let (kind, subtype) = parts.next()?.trim().split_once('/')?;
        let (kind, subtype) = (kind.trim(), subtype.trim());
        if kind.is_empty() || subtype.is_empty() {
            return None;
        }

        let mut quality = 1.0;
        for param in parts {
            if let Some((name, value)) = param.split_once('=') {
                if name.trim().eq_ignore_ascii_case("q") {
                    quality = value.trim().parse::<f32>().ok()?.clamp(0.0, 1.0);
                }
            }
        }
        Some(Self {
            kind,
            subtype,
            quality,
        })
    }

    /// How specifically this range matches `kind/subtype`: 2 exact,
    /// 1 `kind/*`, 0 `*/*`, `None` no match.
    fn specificity_for(&self, kind: &str, subtype: &str) -> Option<u8> {
        if self.kind == "*" {
            return (self.subtype == "*").then_some(0);
        }
        if !self.kind.eq_ignore_ascii_case(kind) {
            return None;
        }
        if self.subtype == "*" {
            Some(1)
        } else if self.subtype.eq_ignore_ascii_case(subtype) {
            Some(2)
        } else {
            None
        }
    }
}
