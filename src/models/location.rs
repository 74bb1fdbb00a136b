use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;

#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct Location {
    pub id: String,
    pub building_id: String,
    pub name: String,
    pub created_at: DateTime<Utc>,
}

/// Location ids are derived, not chosen: the building id followed by the
/// location name with all whitespace stripped. This mirrors the upstream
/// key scheme, so ids stay stable across reimports.
pub fn location_id(building_id: &str, name: &str) -> String {
    let mut id = String::with_capacity(building_id.len() + name.len());
    id.push_str(building_id);
    id.extend(name.chars().filter(|c| !c.is_whitespace()));
    id
}

#[derive(Debug, Deserialize)]
pub struct CreateLocationRequest {
    pub name: String,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_location_id_strips_spaces() {
        assert_eq!(location_id("B1", "Main Hall"), "B1MainHall");
        assert_eq!(location_id("B1", "  Boiler  Room "), "B1BoilerRoom");
    }

    #[test]
    fn test_location_id_plain_name() {
        assert_eq!(location_id("north-2", "Lobby"), "north-2Lobby");
    }
}
