//! # Schema Registry
//!
//! Binds request and response schemas to handlers and looks them up at
//! dispatch time.
//!
//! ## Targets
//!
//! - [`Target::Handler`] attaches a schema to one handler function,
//!   identified by the type that declares it and the verb it serves. The
//!   binding follows the function: any resource that dispatches to it
//!   enforces the schema.
//! - [`Target::Resource`] attaches a schema to a verb of a resource type.
//!   The verb is mandatory; omitting it is a [`BindingError::MissingVerb`].
//!
//! ## Resolution
//!
//! For a [`Dispatch`] the request and response schemas are resolved
//! independently, first match wins:
//!
//! 1. the handler-level binding of the handler in effect;
//! 2. the resource-level binding of the concrete resource for the verb;
//! 3. the resource-level binding of the handler's declaring type for the verb.
//!
//! Re-binding a slot replaces the earlier schema.

use std::any::{type_name, TypeId};
use std::collections::HashMap;
use std::fmt;
use std::hash::{Hash, Hasher};

use crate::error::BindingError;
use crate::schema::Schema;
use crate::verb::Verb;

/// Identity of a handler-bearing type.
///
/// Equality and hashing use the type's [`TypeId`]; the type path is kept
/// for diagnostics only.
#[derive(Debug, Clone, Copy)]
pub struct ResourceId {
    id: TypeId,
    path: &'static str,
}

impl PartialEq for ResourceId {
    fn eq(&self, other: &Self) -> bool {
        self.id == other.id
    }
}

impl Eq for ResourceId {}

impl Hash for ResourceId {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.id.hash(state);
    }
}

impl ResourceId {
    /// Identity of `T`.
    pub fn of<T: ?Sized + 'static>() -> Self {
        Self {
            id: TypeId::of::<T>(),
            path: type_name::<T>(),
        }
    }

    /// Full type path, e.g. `app::users::Signup`.
    pub fn path(&self) -> &'static str {
        self.path
    }

    /// Module path of the type, e.g. `app::users`. Empty for a bare name.
    pub fn module(&self) -> &'static str {
        self.split().0
    }

    /// Type name without its module path, e.g. `Signup`.
    pub fn name(&self) -> &'static str {
        self.split().1
    }

    fn split(&self) -> (&'static str, &'static str) {
        // Generic arguments may contain `::` themselves.
        let base_end = self.path.find('<').unwrap_or(self.path.len());
        match self.path[..base_end].rfind("::") {
            Some(i) => (&self.path[..i], &self.path[i + 2..]),
            None => ("", self.path),
        }
    }
}

impl fmt::Display for ResourceId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.path)
    }
}

/// One handler function: the type declaring it and the verb it serves.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct HandlerId {
    /// Declaring type.
    pub owner: ResourceId,
    /// Verb served.
    pub verb: Verb,
}

impl HandlerId {
    /// Handler for `verb` declared on `T`.
    pub fn of<T: ?Sized + 'static>(verb: Verb) -> Self {
        Self {
            owner: ResourceId::of::<T>(),
            verb,
        }
    }

    /// Handler method name, e.g. `on_post`.
    pub fn method_name(&self) -> &'static str {
        self.verb.handler_name()
    }
}

impl fmt::Display for HandlerId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}::{}", self.owner, self.method_name())
    }
}

/// What a binding attaches to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Target {
    /// A single handler function.
    Handler(HandlerId),
    /// A resource type; needs a verb.
    Resource(ResourceId),
}

impl From<HandlerId> for Target {
    fn from(handler: HandlerId) -> Self {
        Self::Handler(handler)
    }
}

impl From<ResourceId> for Target {
    fn from(resource: ResourceId) -> Self {
        Self::Resource(resource)
    }
}

/// The resource serving a request and the handler in effect for its verb.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Dispatch {
    /// Concrete resource type mounted on the route.
    pub resource: ResourceId,
    /// Handler that will run.
    pub handler: HandlerId,
}

impl Dispatch {
    /// Dispatch of `verb` on a resource that declares its own handler.
    pub fn direct(resource: ResourceId, verb: Verb) -> Self {
        Self {
            resource,
            handler: HandlerId {
                owner: resource,
                verb,
            },
        }
    }

    /// Verb being dispatched.
    pub fn verb(&self) -> Verb {
        self.handler.verb
    }
}

impl fmt::Display for Dispatch {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{}::{} ({})",
            self.resource,
            self.handler.method_name(),
            self.handler.verb
        )
    }
}

/// Schemas that apply to one dispatch.
#[derive(Debug, Clone, Copy, Default)]
pub struct ResolvedSchemas<'a> {
    /// Schema for the decoded request document.
    pub request: Option<&'a Schema>,
    /// Schema for the handler's result.
    pub response: Option<&'a Schema>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Slot {
    Request,
    Response,
}

impl Slot {
    fn as_str(self) -> &'static str {
        match self {
            Self::Request => "request",
            Self::Response => "response",
        }
    }
}

#[derive(Debug, Clone, Default)]
struct Bindings {
    request: Option<Schema>,
    response: Option<Schema>,
}

impl Bindings {
    fn slot(&self, slot: Slot) -> Option<&Schema> {
        match slot {
            Slot::Request => self.request.as_ref(),
            Slot::Response => self.response.as_ref(),
        }
    }

    fn slot_mut(&mut self, slot: Slot) -> &mut Option<Schema> {
        match slot {
            Slot::Request => &mut self.request,
            Slot::Response => &mut self.response,
        }
    }
}

/// Startup-time table of schema bindings.
///
/// Populate it before serving, then share it behind an `Arc`; lookups take
/// `&self` and never allocate.
#[derive(Debug, Clone, Default)]
pub struct SchemaRegistry {
    handlers: HashMap<HandlerId, Bindings>,
    resources: HashMap<(ResourceId, Verb), Bindings>,
}

impl SchemaRegistry {
    /// Empty registry.
    pub fn new() -> Self {
        Self::default()
    }

    /// Bind the schema that request documents must satisfy.
    ///
    /// `verb` is required for [`Target::Resource`] and ignored for
    /// [`Target::Handler`].
    ///
    /// # Errors
    ///
    /// [`BindingError::MissingVerb`] for a resource target without a verb.
    pub fn bind_request_schema(
        &mut self,
        schema: Schema,
        target: impl Into<Target>,
        verb: Option<Verb>,
    ) -> Result<&mut Self, BindingError> {
        self.bind(Slot::Request, schema, target.into(), verb)
    }

    /// Bind the schema that handler results must satisfy.
    ///
    /// `verb` is required for [`Target::Resource`] and ignored for
    /// [`Target::Handler`].
    ///
    /// # Errors
    ///
    /// [`BindingError::MissingVerb`] for a resource target without a verb.
    pub fn bind_response_schema(
        &mut self,
        schema: Schema,
        target: impl Into<Target>,
        verb: Option<Verb>,
    ) -> Result<&mut Self, BindingError> {
        self.bind(Slot::Response, schema, target.into(), verb)
    }

    fn bind(
        &mut self,
        slot: Slot,
        schema: Schema,
        target: Target,
        verb: Option<Verb>,
    ) -> Result<&mut Self, BindingError> {
        let entry = match target {
            Target::Handler(handler) => {
                if let Some(verb) = verb.filter(|v| *v != handler.verb) {
                    tracing::debug!(
                        handler = %handler,
                        ignored_verb = %verb,
                        "verb ignored for handler-level binding"
                    );
                }
                self.handlers.entry(handler).or_default().slot_mut(slot)
            }
            Target::Resource(resource) => {
                let verb = verb.ok_or(BindingError::MissingVerb { resource })?;
                self.resources
                    .entry((resource, verb))
                    .or_default()
                    .slot_mut(slot)
            }
        };

        if entry.replace(schema).is_some() {
            tracing::debug!(binding = ?target, slot = slot.as_str(), "replaced existing schema binding");
        } else {
            tracing::debug!(binding = ?target, slot = slot.as_str(), "bound schema");
        }
        Ok(self)
    }

    /// Request schema for `dispatch`, if any.
    pub fn request_schema(&self, dispatch: &Dispatch) -> Option<&Schema> {
        self.lookup(Slot::Request, dispatch)
    }

    /// Response schema for `dispatch`, if any.
    pub fn response_schema(&self, dispatch: &Dispatch) -> Option<&Schema> {
        self.lookup(Slot::Response, dispatch)
    }

    /// Both schemas for `dispatch`.
    pub fn resolve(&self, dispatch: &Dispatch) -> ResolvedSchemas<'_> {
        ResolvedSchemas {
            request: self.request_schema(dispatch),
            response: self.response_schema(dispatch),
        }
    }

    /// Number of bound targets.
    pub fn len(&self) -> usize {
        self.handlers.len() + self.resources.len()
    }

    /// Whether nothing is bound.
    pub fn is_empty(&self) -> bool {
        self.handlers.is_empty() && self.resources.is_empty()
    }

    fn lookup(&self, slot: Slot, dispatch: &Dispatch) -> Option<&Schema> {
        let verb = dispatch.verb();
        self.handlers
            .get(&dispatch.handler)
            .and_then(|b| b.slot(slot))
            .or_else(|| {
                self.resources
                    .get(&(dispatch.resource, verb))
                    .and_then(|b| b.slot(slot))
            })
            .or_else(|| {
                self.resources
                    .get(&(dispatch.handler.owner, verb))
                    .and_then(|b| b.slot(slot))
            })
    }
}
