//! Manager traits for discussion, membership and invitation operations
//!
//! Every operation names its requester explicitly; nothing is read from an
//! ambient request context.

use super::discussion::Discussion;
use super::errors::DiscussionResult;
use super::invitation::{Invitation, JoinRequest};
use super::membership::Membership;
use super::types::{DiscussionId, InvitationId, MembershipId};
use crate::core_identity::UserId;

/// Manager for Discussion operations
pub trait DiscussionManager {
    /// Create a new Discussion owned by `creator`
    fn create_discussion(
        &mut self,
        name: &str,
        creator: &UserId,
    ) -> DiscussionResult<(Discussion, Membership)>;

    /// Get a Discussion the requester belongs to
    fn get_discussion(&self, id: DiscussionId, requester: &UserId) -> DiscussionResult<Discussion>;

    /// Rename a Discussion (owner only)
    fn rename_discussion(
        &mut self,
        id: DiscussionId,
        requester: &UserId,
        name: &str,
    ) -> DiscussionResult<Discussion>;

    /// Delete a Discussion with all its memberships and invitations (owner only)
    fn delete_discussion(&mut self, id: DiscussionId, requester: &UserId) -> DiscussionResult<()>;

    /// Memberships held by a user
    fn list_user_discussions(&self, user_id: &UserId) -> DiscussionResult<Vec<Membership>>;
}

/// Manager for membership operations
pub trait MembershipManager {
    /// List members of a Discussion (members only)
    fn list_members(
        &self,
        discussion_id: DiscussionId,
        requester: &UserId,
    ) -> DiscussionResult<Vec<Membership>>;

    /// Set or clear a member's editor flag (owner only)
    fn set_editor(
        &mut self,
        membership_id: MembershipId,
        requester: &UserId,
        is_editor: bool,
    ) -> DiscussionResult<Membership>;

    /// Remove another member (owner only, never oneself)
    fn remove_member(
        &mut self,
        membership_id: MembershipId,
        requester: &UserId,
    ) -> DiscussionResult<()>;
}

/// Manager for invitation operations
pub trait InvitationManager {
    /// Invite a user by username (owner only)
    fn invite(
        &mut self,
        discussion_id: DiscussionId,
        requester: &UserId,
        invitee_username: &str,
    ) -> DiscussionResult<Invitation>;

    /// Pending offers addressed to the requester
    fn list_my_invitations(&self, requester: &UserId) -> DiscussionResult<Vec<Invitation>>;

    /// All invitations of a Discussion (members only)
    fn list_discussion_invitations(
        &self,
        discussion_id: DiscussionId,
        requester: &UserId,
    ) -> DiscussionResult<Vec<Invitation>>;

    /// The invitation as shown to an invitee about to join
    fn invitation_to_join(
        &self,
        id: InvitationId,
        requester: &UserId,
    ) -> DiscussionResult<Invitation>;

    /// Accept an invitation (invitee only)
    fn accept_invitation(
        &mut self,
        id: InvitationId,
        requester: &UserId,
        request: &JoinRequest,
    ) -> DiscussionResult<Membership>;

    /// Revoke (owner) or withdraw (invitee) an invitation
    fn delete_invitation(&mut self, id: InvitationId, requester: &UserId) -> DiscussionResult<()>;
}
