//! Error types for discussion, membership and invitation operations

use super::types::{DiscussionId, InvitationId, MembershipId};
use crate::core_identity::IdentityError;
use thiserror::Error;

/// Result type for discussion core operations
pub type DiscussionResult<T> = Result<T, DiscussionError>;

/// Record kinds that can be missing
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Record {
    Discussion(DiscussionId),
    Membership(MembershipId),
    Invitation(InvitationId),
}

impl std::fmt::Display for Record {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Record::Discussion(id) => write!(f, "discussion {}", id),
            Record::Membership(id) => write!(f, "membership {}", id),
            Record::Invitation(id) => write!(f, "invitation {}", id),
        }
    }
}

/// Errors surfaced to the request-handling layer
#[derive(Error, Debug)]
pub enum DiscussionError {
    /// Requester lacks membership or role. The cause is never exposed.
    #[error("Permission denied")]
    PermissionDenied,

    #[error("Not found: {0}")]
    NotFound(Record),

    /// Invitation exists but its deadline has passed
    #[error("Invitation {0} has expired")]
    Expired(InvitationId),

    #[error("User is already a member of discussion {0}")]
    DuplicateMembership(DiscussionId),

    #[error("User already has an invitation to discussion {0}")]
    AlreadyInvited(DiscussionId),

    #[error("User is already a member of discussion {0}")]
    AlreadyMember(DiscussionId),

    #[error("No user named {0:?}")]
    InvalidInvitee(String),

    #[error("Validation failed: {0}")]
    ValidationFailure(String),

    #[error("Identity error: {0}")]
    Identity(#[from] IdentityError),

    #[error("Storage error: {0}")]
    Storage(String),
}

/// Coarse classification for translating errors into responses
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    PermissionDenied,
    NotFound,
    Conflict,
    Validation,
    Internal,
}

impl DiscussionError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            DiscussionError::PermissionDenied => ErrorKind::PermissionDenied,
            DiscussionError::NotFound(_) | DiscussionError::Expired(_) => ErrorKind::NotFound,
            DiscussionError::DuplicateMembership(_)
            | DiscussionError::AlreadyInvited(_)
            | DiscussionError::AlreadyMember(_) => ErrorKind::Conflict,
            DiscussionError::InvalidInvitee(_) | DiscussionError::ValidationFailure(_) => {
                ErrorKind::Validation
            }
            DiscussionError::Identity(_) | DiscussionError::Storage(_) => ErrorKind::Internal,
        }
    }

    /// Missing and expired records are reported the same way
    pub fn is_not_found(&self) -> bool {
        self.kind() == ErrorKind::NotFound
    }
}

impl From<rusqlite::Error> for DiscussionError {
    fn from(e: rusqlite::Error) -> Self {
        DiscussionError::Storage(e.to_string())
    }
}

impl From<r2d2::Error> for DiscussionError {
    fn from(e: r2d2::Error) -> Self {
        DiscussionError::Storage(format!("connection pool: {}", e))
    }
}
