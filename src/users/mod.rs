pub mod views;

use sqlx::prelude::FromRow;
use std::fmt;

#[derive(Clone, PartialEq, Eq, FromRow)]
pub struct User {
    pub username: String,
    #[sqlx(rename = "password")]
    pub password_hash: String,
    pub email: String,
    pub first_name: String,
    pub last_name: String,
}

impl fmt::Debug for User {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("User")
            .field("username", &self.username)
            .field("password", &"[redacted]")
            .field("email", &self.email)
            .field("first_name", &self.first_name)
            .field("last_name", &self.last_name)
            .finish()
    }
}

impl User {
    pub fn full_name(&self) -> String {
        format!("{} {}", self.first_name, self.last_name)
    }
}

/// A user record ready for insertion. The password is already hashed.
#[derive(Clone)]
pub struct NewUser {
    pub username: String,
    pub password_hash: String,
    pub email: String,
    pub first_name: String,
    pub last_name: String,
}

impl From<NewUser> for User {
    fn from(new: NewUser) -> Self {
        Self {
            username: new.username,
            password_hash: new.password_hash,
            email: new.email,
            first_name: new.first_name,
            last_name: new.last_name,
        }
    }
}

pub fn profile_url(username: &str) -> String {
    format!("/users/{}", urlencoding::encode(username))
}

pub fn delete_url(username: &str) -> String {
    format!("{}/delete", profile_url(username))
}

pub fn new_feedback_url(username: &str) -> String {
    format!("{}/feedback/new", profile_url(username))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_debug_hides_password_hash() {
        let user = User {
            username: "alice".to_string(),
            password_hash: "$2b$04$secret".to_string(),
            email: "a@x.com".to_string(),
            first_name: "A".to_string(),
            last_name: "L".to_string(),
        };

        let printed = format!("{:?}", user);
        assert!(printed.contains("[redacted]"));
        assert!(!printed.contains("$2b$04$secret"));
    }

    #[test]
    fn test_profile_url_encodes_username() {
        assert_eq!(profile_url("alice"), "/users/alice");
        assert_eq!(profile_url("a b"), "/users/a%20b");
        assert_eq!(new_feedback_url("a b"), "/users/a%20b/feedback/new");
        assert_eq!(delete_url("alice"), "/users/alice/delete");
    }
}
