//! Invitation records and the derived expiry predicate

use super::types::{DiscussionId, InvitationId};
use crate::core_identity::UserId;
use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};

/// Days an invitation stays acceptable after creation
pub const INVITATION_TTL_DAYS: i64 = 7;

/// Validity window applied to every new invitation
pub fn invitation_ttl() -> Duration {
    Duration::days(INVITATION_TTL_DAYS)
}

/// Pending offer for one user to join one discussion. Never mutated.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Invitation {
    pub id: InvitationId,
    pub discussion_id: DiscussionId,
    pub inviter_id: UserId,
    pub invitee_id: UserId,
    pub expires_at: DateTime<Utc>,
}

/// Observable state of a stored invitation
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum InvitationState {
    Pending,
    Expired,
}

/// What the joining user submits when accepting
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct JoinRequest {
    pub discussion_id: DiscussionId,
    pub user_id: UserId,
}

impl JoinRequest {
    /// The request an honest client sends for `invitation`
    pub fn for_invitation(invitation: &Invitation) -> Self {
        JoinRequest {
            discussion_id: invitation.discussion_id,
            user_id: invitation.invitee_id.clone(),
        }
    }
}

impl Invitation {
    /// Deadline for an invitation created at `now`
    pub fn expiry_from(now: DateTime<Utc>) -> DateTime<Utc> {
        now + invitation_ttl()
    }

    /// Strictly past the deadline. Equal to the deadline is still valid.
    pub fn is_expired_at(&self, now: DateTime<Utc>) -> bool {
        now > self.expires_at
    }

    /// Listed among the invitee's offers: deadline strictly in the future
    pub fn is_listed_at(&self, now: DateTime<Utc>) -> bool {
        self.expires_at > now
    }

    pub fn state_at(&self, now: DateTime<Utc>) -> InvitationState {
        if self.is_expired_at(now) {
            InvitationState::Expired
        } else {
            InvitationState::Pending
        }
    }

    /// The join request targets exactly this invitation's discussion and invitee
    pub fn matches(&self, request: &JoinRequest) -> bool {
        self.discussion_id == request.discussion_id && self.invitee_id == request.user_id
    }
}
