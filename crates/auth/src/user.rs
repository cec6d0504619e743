//! Stored user records (the admin-managed directory).
//!
//! Request authorization is decided from token claims; these records exist
//! so admins can manage the directory and so items/changes can render their
//! owner's display name.

use serde::{Deserialize, Serialize};

use stocktrail_core::{DomainResult, UserId, ValidationCollector};

/// A directory user.
///
/// `password_hash` is never serialized; the plaintext is accepted only on
/// the way in and hashed immediately.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct User {
    pub id: UserId,
    pub username: String,
    pub email: String,
    #[serde(skip_serializing)]
    pub password_hash: String,
    pub is_staff: bool,
}

/// Input for creating a user.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct NewUser {
    pub username: String,
    pub email: String,
    pub password: String,
    #[serde(default)]
    pub is_staff: bool,
}

impl NewUser {
    pub fn validate(&self) -> DomainResult<()> {
        let mut v = ValidationCollector::new();
        if self.username.trim().is_empty() {
            v.reject("username", "username cannot be empty");
        }
        if self.password.is_empty() {
            v.reject("password", "password cannot be empty");
        }
        v.finish()
    }
}

/// Partial update for a user. `None` fields are left unchanged.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct UserPatch {
    pub username: Option<String>,
    pub email: Option<String>,
    pub password: Option<String>,
    pub is_staff: Option<bool>,
}

impl UserPatch {
    pub fn validate(&self) -> DomainResult<()> {
        let mut v = ValidationCollector::new();
        if let Some(username) = &self.username {
            if username.trim().is_empty() {
                v.reject("username", "username cannot be empty");
            }
        }
        if let Some(password) = &self.password {
            if password.is_empty() {
                v.reject("password", "password cannot be empty");
            }
        }
        v.finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn password_hash_is_not_serialized() {
        let user = User {
            id: UserId::new(),
            username: "alice".to_string(),
            email: "alice@example.com".to_string(),
            password_hash: "secret-hash".to_string(),
            is_staff: false,
        };
        let json = serde_json::to_value(&user).unwrap();
        assert!(json.get("password_hash").is_none());
        assert_eq!(json["username"], "alice");
    }

    #[test]
    fn empty_username_rejected() {
        let new = NewUser {
            username: "".to_string(),
            email: "a@b.c".to_string(),
            password: "pw".to_string(),
            is_staff: false,
        };
        assert!(new.validate().is_err());
    }
}
