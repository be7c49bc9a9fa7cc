//! # Resources
//!
//! A [`Resource`] is a type with one synchronous handler per verb, mounted
//! on a route with [`resource`]. The glue between axum and the handler
//! takes the decoded [`Document`], works out which handler is in effect,
//! runs request validation, calls the handler, and leaves its result on
//! the response for the translator.
//!
//! ## Reusing Handlers
//!
//! A resource that serves a verb by delegating to an embedded resource
//! reports the embedded type from [`Resource::handler_owner`]. Schemas bound
//! to the embedded type's handler or to its resource-level slot then apply
//! to the outer resource too, while the outer resource can still override
//! them with its own resource-level binding.
//!
//! ```text
//! struct Admins { users: Users }
//!
//! impl Resource for Admins {
//!     fn on_post(&self, cx: &mut RequestContext) -> Result<(), ApiError> {
//!         self.users.on_post(cx)
//!     }
//!     fn handler_owner(&self, verb: Verb) -> ResourceId {
//!         match verb {
//!             Verb::Create => ResourceId::of::<Users>(),
//!             _ => ResourceId::of::<Self>(),
//!         }
//!     }
//! }
//! ```

use std::sync::Arc;

use axum::extract::{Extension, Request};
use axum::http::Method;
use axum::response::{IntoResponse, Response};
use axum::routing::{any, MethodRouter};
use jsonio_schema::{Dispatch, HandlerId, ResourceId, Verb};

use crate::context::{Document, RequestContext};
use crate::error::ApiError;
use crate::translator::JsonTranslator;

/// A type serving HTTP verbs on one route.
///
/// Every handler defaults to 405 Method Not Allowed.
pub trait Resource: Send + Sync + 'static {
    /// `GET`
    fn on_get(&self, cx: &mut RequestContext) -> Result<(), ApiError> {
        let _ = cx;
        Err(ApiError::MethodNotAllowed)
    }

    /// `POST`
    fn on_post(&self, cx: &mut RequestContext) -> Result<(), ApiError> {
        let _ = cx;
        Err(ApiError::MethodNotAllowed)
    }

    /// `PUT`
    fn on_put(&self, cx: &mut RequestContext) -> Result<(), ApiError> {
        let _ = cx;
        Err(ApiError::MethodNotAllowed)
    }

    /// `PATCH`
    fn on_patch(&self, cx: &mut RequestContext) -> Result<(), ApiError> {
        let _ = cx;
        Err(ApiError::MethodNotAllowed)
    }

    /// `DELETE`
    fn on_delete(&self, cx: &mut RequestContext) -> Result<(), ApiError> {
        let _ = cx;
        Err(ApiError::MethodNotAllowed)
    }

    /// Any method without a [`Verb`]. Results are never schema-checked.
    fn on_other(&self, method: &Method, cx: &mut RequestContext) -> Result<(), ApiError> {
        let _ = (method, cx);
        Err(ApiError::MethodNotAllowed)
    }

    /// Type declaring the handler that serves `verb`.
    fn handler_owner(&self, verb: Verb) -> ResourceId {
        let _ = verb;
        ResourceId::of::<Self>()
    }
}

/// The dispatch of `verb` on `resource`.
pub fn dispatch_of<R: Resource>(resource: &R, verb: Verb) -> Dispatch {
    Dispatch {
        resource: ResourceId::of::<R>(),
        handler: HandlerId {
            owner: resource.handler_owner(verb),
            verb,
        },
    }
}

/// Mount `resource` for every method on a route.
///
/// The router must be wrapped with [`with_json_io`](crate::with_json_io).
pub fn resource<R: Resource>(resource: R) -> MethodRouter {
    let resource = Arc::new(resource);
    any(
        move |Extension(translator): Extension<Arc<JsonTranslator>>, request: Request| {
            let resource = Arc::clone(&resource);
            async move { serve(resource.as_ref(), &translator, request) }
        },
    )
}

fn serve<R: Resource>(resource: &R, translator: &JsonTranslator, request: Request) -> Response {
    let (mut parts, _) = request.into_parts();
    let document = parts.extensions.remove::<Document>().map(|Document(doc)| doc);
    let dispatch = Verb::from_method(parts.method.as_str()).map(|verb| dispatch_of(resource, verb));

    if let Some(dispatch) = &dispatch {
        tracing::debug!(dispatch = %dispatch, has_document = document.is_some(), "dispatching");
        if let Err(err) = translator.validate_request(dispatch, document.as_ref()) {
            return err.into_response();
        }
    }

    let method = parts.method.clone();
    let mut cx = RequestContext::new(parts, document);
    let outcome = match dispatch.map(|d| d.verb()) {
        Some(Verb::Read) => resource.on_get(&mut cx),
        Some(Verb::Create) => resource.on_post(&mut cx),
        Some(Verb::Update) => resource.on_put(&mut cx),
        Some(Verb::PartialUpdate) => resource.on_patch(&mut cx),
        Some(Verb::Delete) => resource.on_delete(&mut cx),
        None => resource.on_other(&method, &mut cx),
    };

    match outcome {
        Ok(()) => cx.into_response(dispatch),
        Err(err) => err.into_response(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    struct Parent;
    impl Resource for Parent {}

    struct Child {
        parent: Parent,
    }

    impl Resource for Child {
        fn on_post(&self, cx: &mut RequestContext) -> Result<(), ApiError> {
            self.parent.on_post(cx)
        }

        fn handler_owner(&self, verb: Verb) -> ResourceId {
            match verb {
                Verb::Create => ResourceId::of::<Parent>(),
                _ => ResourceId::of::<Self>(),
            }
        }
    }

    #[test]
    fn default_owner_is_the_resource() {
        let dispatch = dispatch_of(&Parent, Verb::Read);
        assert_eq!(dispatch, Dispatch::direct(ResourceId::of::<Parent>(), Verb::Read));
    }

    #[test]
    fn delegated_verb_reports_embedded_owner() {
        let child = Child { parent: Parent };
        let post = dispatch_of(&child, Verb::Create);
        assert_eq!(post.resource, ResourceId::of::<Child>());
        assert_eq!(post.handler, HandlerId::of::<Parent>(Verb::Create));

        let get = dispatch_of(&child, Verb::Read);
        assert_eq!(get.handler.owner, ResourceId::of::<Child>());
    }
}
