//! User profiles and the authenticated principal

use super::user_id::UserId;
use serde::{Deserialize, Serialize};

/// Longest username accepted by the directories
pub const MAX_USERNAME_LEN: usize = 150;

/// Public profile of a user as known to the identity provider
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UserProfile {
    pub id: UserId,
    pub username: String,
    #[serde(default)]
    pub first_name: String,
    #[serde(default)]
    pub last_name: String,
}

impl UserProfile {
    /// Profile with a freshly generated id and no name parts
    pub fn new(username: impl Into<String>) -> Self {
        Self {
            id: UserId::generate(),
            username: username.into(),
            first_name: String::new(),
            last_name: String::new(),
        }
    }

    pub fn with_name(mut self, first_name: impl Into<String>, last_name: impl Into<String>) -> Self {
        self.first_name = first_name.into();
        self.last_name = last_name.into();
        self
    }

    /// Name shown next to a membership.
    ///
    /// `"last, first"` when both parts are present, whichever part exists
    /// otherwise, and the username when the user never gave a name.
    pub fn display_name(&self) -> String {
        let full_name = match (self.first_name.is_empty(), self.last_name.is_empty()) {
            (true, true) => String::new(),
            (true, false) => self.last_name.clone(),
            (false, true) => self.first_name.clone(),
            (false, false) => format!("{}, {}", self.last_name, self.first_name),
        };

        if full_name.is_empty() {
            self.username.clone()
        } else {
            full_name
        }
    }
}

/// The authenticated identity making a request
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Principal {
    pub user_id: UserId,
    pub username: String,
    pub display_name: String,
}

impl From<&UserProfile> for Principal {
    fn from(profile: &UserProfile) -> Self {
        Principal {
            user_id: profile.id.clone(),
            username: profile.username.clone(),
            display_name: profile.display_name(),
        }
    }
}

/// Check a username against the directory rules (letters, digits and `@.+-_`)
pub fn is_valid_username(username: &str) -> bool {
    !username.is_empty()
        && username.chars().count() <= MAX_USERNAME_LEN
        && username
            .chars()
            .all(|c| c.is_alphanumeric() || matches!(c, '@' | '.' | '+' | '-' | '_'))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn profile(first: &str, last: &str) -> UserProfile {
        UserProfile::new("tanaka").with_name(first, last)
    }

    #[test]
    fn test_display_name_full() {
        assert_eq!(profile("Taro", "Tanaka").display_name(), "Tanaka, Taro");
    }

    #[test]
    fn test_display_name_single_part() {
        assert_eq!(profile("Taro", "").display_name(), "Taro");
        assert_eq!(profile("", "Tanaka").display_name(), "Tanaka");
    }

    #[test]
    fn test_display_name_falls_back_to_username() {
        assert_eq!(profile("", "").display_name(), "tanaka");
    }

    #[test]
    fn test_principal_from_profile() {
        let p = profile("Taro", "Tanaka");
        let principal = Principal::from(&p);
        assert_eq!(principal.user_id, p.id);
        assert_eq!(principal.username, "tanaka");
        assert_eq!(principal.display_name, "Tanaka, Taro");
    }

    #[test]
    fn test_username_rules() {
        assert!(is_valid_username("alice"));
        assert!(is_valid_username("a.l-i+c_e@example"));
        assert!(!is_valid_username(""));
        assert!(!is_valid_username("has space"));
        assert!(!is_valid_username(&"x".repeat(MAX_USERNAME_LEN + 1)));
    }
}
