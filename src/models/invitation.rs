use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use uuid::Uuid;

/// Invitation lifecycle. A membership row is only created on `Accepted`;
/// `Invited` is a pending notification, nothing more.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum InvitationStatus {
    Invited,
    Accepted,
    Declined,
}

impl InvitationStatus {
    /// Only a pending invitation can be answered.
    pub fn can_transition_to(self, next: InvitationStatus) -> bool {
        matches!(
            (self, next),
            (InvitationStatus::Invited, InvitationStatus::Accepted)
                | (InvitationStatus::Invited, InvitationStatus::Declined)
        )
    }
}

impl std::fmt::Display for InvitationStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            InvitationStatus::Invited => "invited",
            InvitationStatus::Accepted => "accepted",
            InvitationStatus::Declined => "declined",
        };
        write!(f, "{s}")
    }
}

impl std::str::FromStr for InvitationStatus {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "invited" => Ok(InvitationStatus::Invited),
            "accepted" => Ok(InvitationStatus::Accepted),
            "declined" => Ok(InvitationStatus::Declined),
            _ => Err(anyhow::anyhow!("Unknown invitation status: {s}")),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct Invitation {
    pub id: Uuid,
    pub building_id: String,
    pub email: String,
    pub invited_by: String,
    pub status: String,
    pub created_at: DateTime<Utc>,
    pub responded_at: Option<DateTime<Utc>>,
}

#[derive(Debug, Deserialize)]
pub struct CreateInvitationRequest {
    pub email: String,
}

/// Invitation joined with the building name for the invitee's inbox view.
#[derive(Debug, Serialize, FromRow)]
pub struct InvitationView {
    pub id: Uuid,
    pub building_id: String,
    pub building_name: String,
    pub invited_by: String,
    pub status: String,
    pub created_at: DateTime<Utc>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::str::FromStr;

    #[test]
    fn test_pending_can_be_answered() {
        assert!(InvitationStatus::Invited.can_transition_to(InvitationStatus::Accepted));
        assert!(InvitationStatus::Invited.can_transition_to(InvitationStatus::Declined));
    }

    #[test]
    fn test_answered_is_terminal() {
        for terminal in [InvitationStatus::Accepted, InvitationStatus::Declined] {
            assert!(!terminal.can_transition_to(InvitationStatus::Accepted));
            assert!(!terminal.can_transition_to(InvitationStatus::Declined));
            assert!(!terminal.can_transition_to(InvitationStatus::Invited));
        }
    }

    #[test]
    fn test_status_round_trips() {
        for s in [
            InvitationStatus::Invited,
            InvitationStatus::Accepted,
            InvitationStatus::Declined,
        ] {
            assert_eq!(InvitationStatus::from_str(&s.to_string()).unwrap(), s);
        }
        assert!(InvitationStatus::from_str("expired").is_err());
    }
}
