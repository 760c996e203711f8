//! Membership entity and status.

use super::EntityError;
use std::str::FromStr;

/// Membership state as reported by the registry.
///
/// Read-only from the broker's point of view; no transitions are modeled.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum MemberStatus {
    Valid,
    Invalid,
    Expired,
    Disabled,
}

impl FromStr for MemberStatus {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "VALID" => Ok(MemberStatus::Valid),
            "INVALID" => Ok(MemberStatus::Invalid),
            "EXPIRED" => Ok(MemberStatus::Expired),
            "DISABLED" => Ok(MemberStatus::Disabled),
            other => Err(format!("unknown member status '{other}'")),
        }
    }
}

impl std::fmt::Display for MemberStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let text = match self {
            MemberStatus::Valid => "VALID",
            MemberStatus::Invalid => "INVALID",
            MemberStatus::Expired => "EXPIRED",
            MemberStatus::Disabled => "DISABLED",
        };
        f.write_str(text)
    }
}

/// A user's membership in one virtual organization.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Member {
    id: i64,
    user_id: i64,
    vo_id: i64,
    status: MemberStatus,
}

impl Member {
    pub fn new(id: i64, user_id: i64, vo_id: i64, status: MemberStatus) -> Result<Self, EntityError> {
        if id <= 0 {
            return Err(EntityError::NonPositiveId { entity: "member", id });
        }
        if user_id <= 0 {
            return Err(EntityError::NonPositiveId {
                entity: "member.user",
                id: user_id,
            });
        }
        if vo_id <= 0 {
            return Err(EntityError::NonPositiveId {
                entity: "member.vo",
                id: vo_id,
            });
        }
        Ok(Self {
            id,
            user_id,
            vo_id,
            status,
        })
    }

    pub fn id(&self) -> i64 {
        self.id
    }

    pub fn user_id(&self) -> i64 {
        self.user_id
    }

    pub fn vo_id(&self) -> i64 {
        self.vo_id
    }

    pub fn status(&self) -> MemberStatus {
        self.status
    }
}
