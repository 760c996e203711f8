//! Facility entity.

use super::EntityError;

/// The registry's representation of a relying service (service provider).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Facility {
    id: i64,
    name: String,
    description: String,
}

impl Facility {
    pub fn new(id: i64, name: String, description: String) -> Result<Self, EntityError> {
        if id <= 0 {
            return Err(EntityError::NonPositiveId {
                entity: "facility",
                id,
            });
        }
        if name.is_empty() {
            return Err(EntityError::EmptyField {
                entity: "facility",
                field: "name",
            });
        }
        Ok(Self {
            id,
            name,
            description,
        })
    }

    pub fn id(&self) -> i64 {
        self.id
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn description(&self) -> &str {
        &self.description
    }
}
