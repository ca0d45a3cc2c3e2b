use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use utoipa::ToSchema;
use uuid::Uuid;

pub type TemplateId = Uuid;
pub type InstanceId = Uuid;
pub type ReservationId = Uuid;

/// Members and instructors are identities owned by the external membership
/// system; they appear here only as opaque ids.
pub type MemberId = Uuid;
pub type InstructorId = Uuid;

/// Roles forwarded by the fronting proxy alongside the authenticated user id.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "snake_case")]
pub enum Role {
    /// Administers class templates.
    Manager,
    /// Owns templates and instances, marks attendance.
    Instructor,
    /// Books seats.
    Member,
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Role::Manager => write!(f, "manager"),
            Role::Instructor => write!(f, "instructor"),
            Role::Member => write!(f, "member"),
        }
    }
}

impl FromStr for Role {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "manager" => Ok(Role::Manager),
            "instructor" => Ok(Role::Instructor),
            "member" => Ok(Role::Member),
            other => Err(format!("unknown role: {other}")),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn role_round_trips_through_str() {
        for role in [Role::Manager, Role::Instructor, Role::Member] {
            assert_eq!(role.to_string().parse::<Role>().unwrap(), role);
        }
        assert!("janitor".parse::<Role>().is_err());
    }
}
