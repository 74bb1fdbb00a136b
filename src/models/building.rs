use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;

#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct Building {
    pub id: String,
    pub name: String,
    pub address: String,
    pub description: String,
    pub created_by: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Building ids are admin-chosen and end up interpolated into derived
/// location ids, so they are restricted to a slug alphabet: ASCII letters,
/// digits and hyphens, no leading/trailing hyphen, 2-63 chars.
pub fn is_valid_building_id(s: &str) -> bool {
    let len = s.len();
    len >= 2
        && len <= 63
        && s.chars()
            .all(|c| c.is_ascii_alphanumeric() || c == '-')
        && !s.starts_with('-')
        && !s.ends_with('-')
}

#[derive(Debug, Deserialize)]
pub struct CreateBuildingRequest {
    pub id: String,
    pub name: String,
    #[serde(default)]
    pub address: String,
    #[serde(default)]
    pub description: String,
    /// A building is never created empty: its first location comes with it.
    pub first_location_name: String,
    /// Pre-provisioned device ids to attach to the first location.
    #[serde(default)]
    pub device_ids: Vec<String>,
}

#[derive(Debug, Deserialize)]
pub struct UpdateBuildingRequest {
    pub name: Option<String>,
    pub address: Option<String>,
    pub description: Option<String>,
}

/// One building in a user's listing, carrying the role they hold there.
#[derive(Debug, Serialize, FromRow)]
pub struct BuildingSummary {
    pub id: String,
    pub name: String,
    pub address: String,
    pub role: String,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_valid_building_ids() {
        assert!(is_valid_building_id("B1"));
        assert!(is_valid_building_id("north-campus-2"));
        assert!(is_valid_building_id("HQ"));
    }

    #[test]
    fn test_invalid_building_ids() {
        assert!(!is_valid_building_id("a"));
        assert!(!is_valid_building_id("-leading"));
        assert!(!is_valid_building_id("trailing-"));
        assert!(!is_valid_building_id("has space"));
        assert!(!is_valid_building_id("semi;colon"));
        assert!(!is_valid_building_id(&"x".repeat(64)));
    }
}
