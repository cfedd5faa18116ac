// file: src/models/user.rs
// description: user identity owning datasets and search history

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

pub const DEFAULT_USER_EMAIL: &str = "default_user@example.com";

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct User {
    pub id: Uuid,
    pub email: String,
    pub created_at: DateTime<Utc>,
}

impl User {
    pub fn new(email: &str) -> Self {
        Self {
            id: Uuid::new_v5(&Uuid::NAMESPACE_OID, format!("user:{}", email).as_bytes()),
            email: email.to_string(),
            created_at: Utc::now(),
        }
    }

    pub fn default_user() -> Self {
        Self::new(DEFAULT_USER_EMAIL)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_user_id_is_stable() {
        assert_eq!(User::default_user().id, User::default_user().id);
        assert_ne!(User::default_user().id, User::new("someone@example.com").id);
    }
}
