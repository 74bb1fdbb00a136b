use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;

/// DB row struct. Email is the primary key; accounts are keyed by address
/// throughout, as in the upstream provisioning data.
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct User {
    pub email: String,
    pub display_name: String,
    pub contact_number: Option<String>,
    #[serde(skip_serializing)]
    pub password_hash: String,
    /// Legacy linkage from the pre-invitation account model. Kept for
    /// imported accounts; new accounts never set it.
    pub parent_email: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Serialize)]
pub struct UserProfile {
    pub email: String,
    pub display_name: String,
    pub contact_number: Option<String>,
}

impl From<User> for UserProfile {
    fn from(u: User) -> Self {
        Self {
            email: u.email,
            display_name: u.display_name,
            contact_number: u.contact_number,
        }
    }
}

// Request/Response DTOs
#[derive(Debug, Deserialize)]
pub struct RegisterRequest {
    pub email: String,
    pub display_name: String,
    pub contact_number: Option<String>,
    pub password: String,
}

#[derive(Debug, Deserialize)]
pub struct UpdateProfileRequest {
    pub display_name: Option<String>,
    pub contact_number: Option<String>,
}

/// One entry of a user's building listing, with the role they hold there.
#[derive(Debug, Serialize, FromRow)]
pub struct UserBuildingView {
    pub building_id: String,
    pub building_name: String,
    pub role: String,
}

/// Minimal email shape check: exactly one '@' with a dot somewhere after it.
/// Real deliverability is the SMTP layer's problem.
pub fn is_valid_email(s: &str) -> bool {
    let mut parts = s.splitn(2, '@');
    let local = parts.next().unwrap_or("");
    match parts.next() {
        Some(domain) => {
            !local.is_empty()
                && !domain.is_empty()
                && !domain.contains('@')
                && domain.contains('.')
                && !domain.starts_with('.')
                && !domain.ends_with('.')
                && !s.contains(char::is_whitespace)
        }
        None => false,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_valid_emails() {
        assert!(is_valid_email("alice@example.com"));
        assert!(is_valid_email("a.b+c@sub.domain.org"));
    }

    #[test]
    fn test_invalid_emails() {
        assert!(!is_valid_email("alice"));
        assert!(!is_valid_email("alice@"));
        assert!(!is_valid_email("@example.com"));
        assert!(!is_valid_email("alice@nodot"));
        assert!(!is_valid_email("alice@.com"));
        assert!(!is_valid_email("al ice@example.com"));
        assert!(!is_valid_email("a@b@example.com"));
    }
}
