use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;

/// Reserved building id. A `user_buildings` row against this id marks a
/// global system administrator; it must never surface as a real building.
pub const SYSTEM_ADMIN_BUILDING: &str = "SystemAdmin";

/// Per-building role held by a user.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    Admin,
    Parent,
    Children,
}

impl std::fmt::Display for Role {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            Role::Admin => "admin",
            Role::Parent => "parent",
            Role::Children => "children",
        };
        write!(f, "{s}")
    }
}

impl std::str::FromStr for Role {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "admin" => Ok(Role::Admin),
            "parent" => Ok(Role::Parent),
            "children" => Ok(Role::Children),
            _ => Err(anyhow::anyhow!("Unknown role: {s}")),
        }
    }
}

/// DB row — one (user, building) grant. Role is fetched as TEXT and parsed
/// at the edge.
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct UserBuilding {
    pub user_email: String,
    pub building_id: String,
    pub role: String,
    pub assigned_locations: Vec<String>,
    pub granted_at: DateTime<Utc>,
}

/// Membership of one building, joined with user details for listings.
#[derive(Debug, Clone, Serialize, FromRow)]
pub struct MemberRow {
    pub user_email: String,
    pub display_name: String,
    pub role: String,
    pub assigned_locations: Vec<String>,
    pub granted_at: DateTime<Utc>,
}

#[derive(Debug, Deserialize)]
pub struct SetAssignedLocationsRequest {
    pub assigned_locations: Vec<String>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::str::FromStr;

    #[test]
    fn test_role_serialization() {
        assert_eq!(serde_json::to_string(&Role::Parent).unwrap(), "\"parent\"");
        assert_eq!(
            serde_json::to_string(&Role::Children).unwrap(),
            "\"children\""
        );
    }

    #[test]
    fn test_role_deserialization() {
        let role: Role = serde_json::from_str("\"admin\"").unwrap();
        assert_eq!(role, Role::Admin);
    }

    #[test]
    fn test_role_from_str() {
        assert_eq!(Role::from_str("parent").unwrap(), Role::Parent);
        assert_eq!(Role::from_str("children").unwrap(), Role::Children);
        assert!(Role::from_str("owner").is_err());
        // Case-sensitive on purpose: stored values are normalized lowercase.
        assert!(Role::from_str("Parent").is_err());
    }

    #[test]
    fn test_role_display_round_trips() {
        for role in [Role::Admin, Role::Parent, Role::Children] {
            assert_eq!(Role::from_str(&role.to_string()).unwrap(), role);
        }
    }
}
