//! User entity.

use super::{AttributeValue, EntityError};
use std::collections::HashMap;

/// A user in the central identity registry.
///
/// Validation rules, enforced at construction:
/// - `id` must be positive
/// - `last_name` must be non-empty
///
/// First name and login are optional because not every external source
/// provides them; the attribute map carries whatever additional attributes
/// the caller requested, keyed by internal identifier.
#[derive(Debug, Clone, PartialEq)]
pub struct User {
    id: i64,
    first_name: Option<String>,
    last_name: String,
    login: Option<String>,
    attributes: HashMap<String, AttributeValue>,
}

impl User {
    /// Create a new user, validating required fields.
    pub fn new(
        id: i64,
        first_name: Option<String>,
        last_name: String,
        login: Option<String>,
    ) -> Result<Self, EntityError> {
        if id <= 0 {
            return Err(EntityError::NonPositiveId { entity: "user", id });
        }
        if last_name.is_empty() {
            return Err(EntityError::EmptyField {
                entity: "user",
                field: "last_name",
            });
        }
        Ok(Self {
            id,
            first_name,
            last_name,
            login,
            attributes: HashMap::new(),
        })
    }

    /// Same user with the given attribute map attached.
    pub fn with_attributes(mut self, attributes: HashMap<String, AttributeValue>) -> Self {
        self.attributes = attributes;
        self
    }

    pub fn id(&self) -> i64 {
        self.id
    }

    pub fn first_name(&self) -> Option<&str> {
        self.first_name.as_deref()
    }

    pub fn last_name(&self) -> &str {
        &self.last_name
    }

    pub fn login(&self) -> Option<&str> {
        self.login.as_deref()
    }

    pub fn attributes(&self) -> &HashMap<String, AttributeValue> {
        &self.attributes
    }

    /// Look up one attribute by internal identifier.
    pub fn attribute(&self, identifier: &str) -> Option<&AttributeValue> {
        self.attributes.get(identifier)
    }
}
