//! Virtual organization entity.

use super::EntityError;

/// A virtual organization: a tenant grouping of users in the registry.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Vo {
    id: i64,
    name: String,
    short_name: String,
}

impl Vo {
    pub fn new(id: i64, name: String, short_name: String) -> Result<Self, EntityError> {
        if id <= 0 {
            return Err(EntityError::NonPositiveId { entity: "vo", id });
        }
        if short_name.is_empty() {
            return Err(EntityError::EmptyField {
                entity: "vo",
                field: "short_name",
            });
        }
        Ok(Self {
            id,
            name,
            short_name,
        })
    }

    pub fn id(&self) -> i64 {
        self.id
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    /// The short name used as the first component of unique group names.
    pub fn short_name(&self) -> &str {
        &self.short_name
    }
}
