//! Core entity model shared by both backend adapters.
//!
//! Every type here is an immutable value object validated at construction.
//! Instances are built fresh from backend payloads on every call — the broker
//! holds no persistent cache of them — so a constructed entity is always a
//! faithful snapshot of what a backend returned for one request.
//!
//! Construction failures are [`EntityError`]s; the adapters translate them
//! into protocol errors because an entity that fails validation here means
//! the backend returned data the broker does not understand.

mod attribute_value;
mod facility;
mod group;
mod member;
mod user;
mod vo;

pub use attribute_value::AttributeValue;
pub use facility::Facility;
pub use group::Group;
pub use member::{Member, MemberStatus};
pub use user::User;
pub use vo::Vo;

/// Errors raised when an entity fails validation at construction.
#[derive(Debug, thiserror::Error)]
pub enum EntityError {
    /// Numeric id was zero or negative
    #[error("{entity} id must be positive, got {id}")]
    NonPositiveId { entity: &'static str, id: i64 },

    /// A required text field was empty or missing
    #[error("{entity} field '{field}' must be non-empty")]
    EmptyField {
        entity: &'static str,
        field: &'static str,
    },

    /// A field value did not have the required shape
    #[error("{entity} field '{field}' is malformed: {value}")]
    MalformedField {
        entity: &'static str,
        field: &'static str,
        value: String,
    },
}

/// The kinds of registry entities that can carry attributes.
///
/// Used to scope attribute fetches and writes; each backend knows how to
/// address an entity of a given kind by its numeric id.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Entity {
    User,
    Group,
    Facility,
    Vo,
    Member,
}

impl Entity {
    /// Lower-case name used as the RPC parameter key and in log lines.
    pub fn as_str(&self) -> &'static str {
        match self {
            Entity::User => "user",
            Entity::Group => "group",
            Entity::Facility => "facility",
            Entity::Vo => "vo",
            Entity::Member => "member",
        }
    }
}

impl std::fmt::Display for Entity {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}
