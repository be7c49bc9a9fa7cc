//! HTTP verbs recognized by the validation pipeline.

use std::fmt;

/// Semantic operation requested by a client.
///
/// Each verb maps to exactly one HTTP method and one handler name.
/// Methods outside this set (HEAD, OPTIONS, extension methods) have no
/// verb and are never validated.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum Verb {
    /// `POST`
    Create,
    /// `GET`
    Read,
    /// `PUT`
    Update,
    /// `PATCH`
    PartialUpdate,
    /// `DELETE`
    Delete,
}

impl Verb {
    /// Every recognized verb.
    pub const ALL: [Verb; 5] = [
        Verb::Create,
        Verb::Read,
        Verb::Update,
        Verb::PartialUpdate,
        Verb::Delete,
    ];

    /// Map an HTTP method name to its verb. Method names are case-sensitive.
    pub fn from_method(method: &str) -> Option<Self> {
        match method {
            "POST" => Some(Self::Create),
            "GET" => Some(Self::Read),
            "PUT" => Some(Self::Update),
            "PATCH" => Some(Self::PartialUpdate),
            "DELETE" => Some(Self::Delete),
            _ => None,
        }
    }

    /// HTTP method name.
    pub fn method(self) -> &'static str {
        match self {
            Self::Create => "POST",
            Self::Read => "GET",
            Self::Update => "PUT",
            Self::PartialUpdate => "PATCH",
            Self::Delete => "DELETE",
        }
    }

    /// Name of the handler method serving this verb.
    pub fn handler_name(self) -> &'static str {
        match self {
            Self::Create => "on_post",
            Self::Read => "on_get",
            Self::Update => "on_put",
            Self::PartialUpdate => "on_patch",
            Self::Delete => "on_delete",
        }
    }

    /// Whether requests with this verb conventionally carry a body.
    pub fn carries_body(self) -> bool {
        matches!(self, Self::Create | Self::Update | Self::PartialUpdate)
    }
}

impl fmt::Display for Verb {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.method())
    }
}
