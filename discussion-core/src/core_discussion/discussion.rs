//! Discussion data structure

use super::errors::DiscussionError;
use super::types::DiscussionId;
use serde::{Deserialize, Serialize};

/// Longest discussion name accepted
pub const MAX_DISCUSSION_NAME_LEN: usize = 50;

/// A named group. Root of its Memberships and Invitations.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Discussion {
    pub id: DiscussionId,
    pub name: String,
}

/// Trim and check a discussion name
pub fn validate_discussion_name(name: &str) -> Result<String, DiscussionError> {
    let name = name.trim();
    if name.is_empty() {
        return Err(DiscussionError::ValidationFailure(
            "discussion name must not be empty".to_string(),
        ));
    }
    if name.chars().count() > MAX_DISCUSSION_NAME_LEN {
        return Err(DiscussionError::ValidationFailure(format!(
            "discussion name must be at most {} characters",
            MAX_DISCUSSION_NAME_LEN
        )));
    }
    Ok(name.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_name_is_trimmed() {
        assert_eq!(validate_discussion_name("  Team A ").unwrap(), "Team A");
    }

    #[test]
    fn test_empty_name_rejected() {
        assert!(matches!(
            validate_discussion_name("   "),
            Err(DiscussionError::ValidationFailure(_))
        ));
    }

    #[test]
    fn test_name_length_counts_characters() {
        let at_limit = "議".repeat(MAX_DISCUSSION_NAME_LEN);
        assert!(validate_discussion_name(&at_limit).is_ok());

        let too_long = "a".repeat(MAX_DISCUSSION_NAME_LEN + 1);
        assert!(validate_discussion_name(&too_long).is_err());
    }
}
