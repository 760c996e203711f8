//! Group entity.

use super::EntityError;

/// A group inside a virtual organization.
///
/// `parent_group_id` is a lookup key, not a pointer — the broker never chases
/// parents, so cyclic references are a backend-side concern. The unique name,
/// when present, always has the `voShortName:groupName` shape; that shape is
/// validated here because entitlement formatting depends on it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Group {
    id: i64,
    parent_group_id: Option<i64>,
    name: String,
    description: String,
    unique_name: Option<String>,
    vo_id: i64,
}

impl Group {
    pub fn new(
        id: i64,
        parent_group_id: Option<i64>,
        name: String,
        description: String,
        unique_name: Option<String>,
        vo_id: i64,
    ) -> Result<Self, EntityError> {
        if id <= 0 {
            return Err(EntityError::NonPositiveId { entity: "group", id });
        }
        if vo_id <= 0 {
            return Err(EntityError::NonPositiveId {
                entity: "group.vo",
                id: vo_id,
            });
        }
        if name.is_empty() {
            return Err(EntityError::EmptyField {
                entity: "group",
                field: "name",
            });
        }
        if let Some(unique) = &unique_name {
            if !unique.contains(':') {
                return Err(EntityError::MalformedField {
                    entity: "group",
                    field: "unique_name",
                    value: unique.clone(),
                });
            }
        }
        Ok(Self {
            id,
            parent_group_id,
            name,
            description,
            unique_name,
            vo_id,
        })
    }

    pub fn id(&self) -> i64 {
        self.id
    }

    pub fn parent_group_id(&self) -> Option<i64> {
        self.parent_group_id
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn description(&self) -> &str {
        &self.description
    }

    /// The `voShortName:groupName` composite, when the backend supplied one.
    pub fn unique_name(&self) -> Option<&str> {
        self.unique_name.as_deref()
    }

    pub fn vo_id(&self) -> i64 {
        self.vo_id
    }
}
