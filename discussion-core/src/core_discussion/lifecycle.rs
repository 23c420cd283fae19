//! Invitation lifecycle
//!
//! An invitation is Pending until `now > expires_at`, after which it is
//! Expired. Neither state is stored: expiry is computed from the injected
//! [`Clock`] whenever an invitation is read. Accepting, revoking and
//! withdrawing all end the same way, with the row deleted.
//!
//! ```text
//!            create (owner)
//!                 |
//!                 v
//!   +--------- Pending ---- now > expires_at ----> Expired
//!   |             |                                   |
//!   | accept      | revoke (owner)                    | revoke / withdraw
//!   | (invitee)   | withdraw (invitee)                |
//!   v             v                                   v
//! Membership   deleted                             deleted
//! ```

use super::clock::Clock;
use super::errors::{DiscussionError, DiscussionResult, Record};
use super::guard::AuthorizationGuard;
use super::invitation::{Invitation, JoinRequest};
use super::membership::Membership;
use super::registry::MembershipRegistry;
use super::storage::DiscussionSqlStore;
use super::types::{DiscussionId, InvitationId};
use crate::core_identity::{UserDirectory, UserId};
use crate::metrics::{record_counter, INVITATION_ACCEPTED, INVITATION_CREATED, INVITATION_DELETED};
use std::sync::Arc;

pub struct InvitationLifecycle {
    store: DiscussionSqlStore,
    registry: MembershipRegistry,
    guard: AuthorizationGuard,
    directory: Arc<dyn UserDirectory>,
    clock: Arc<dyn Clock>,
}

impl std::fmt::Debug for InvitationLifecycle {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("InvitationLifecycle")
            .field("store", &self.store)
            .field("now", &self.clock.now())
            .finish_non_exhaustive()
    }
}

impl InvitationLifecycle {
    pub fn new(
        store: DiscussionSqlStore,
        directory: Arc<dyn UserDirectory>,
        clock: Arc<dyn Clock>,
    ) -> Self {
        Self {
            registry: MembershipRegistry::new(store.clone()),
            guard: AuthorizationGuard::new(store.clone()),
            store,
            directory,
            clock,
        }
    }

    /// Invite the user registered as `invitee_username`. Owner only.
    pub fn create(
        &self,
        discussion_id: DiscussionId,
        requester: &UserId,
        invitee_username: &str,
    ) -> DiscussionResult<Invitation> {
        self.guard.require_owner_permission(discussion_id, requester)?;

        let invitee = self
            .directory
            .resolve_username(invitee_username)?
            .ok_or_else(|| DiscussionError::InvalidInvitee(invitee_username.to_string()))?;

        if self.store.find_membership(discussion_id, &invitee)?.is_some() {
            return Err(DiscussionError::AlreadyMember(discussion_id));
        }

        // Expired rows block too, until someone deletes them
        if self.store.find_invitation(discussion_id, &invitee)?.is_some() {
            return Err(DiscussionError::AlreadyInvited(discussion_id));
        }

        let expires_at = Invitation::expiry_from(self.clock.now());
        let invitation =
            self.store
                .insert_invitation(discussion_id, requester, &invitee, expires_at)?;

        tracing::info!(
            invitation_id = %invitation.id,
            discussion_id = %discussion_id,
            inviter = %requester,
            invitee = %invitee,
            expires_at = %expires_at,
            "Invitation created"
        );
        record_counter(INVITATION_CREATED, 1);

        Ok(invitation)
    }

    /// Offers addressed to `invitee` that have not yet reached their deadline
    pub fn list_active_for_invitee(&self, invitee: &UserId) -> DiscussionResult<Vec<Invitation>> {
        self.store
            .list_invitations_for_invitee(invitee, self.clock.now())
    }

    /// Every invitation row of a discussion, expired ones included. Members only.
    pub fn list_for_discussion(
        &self,
        discussion_id: DiscussionId,
        requester: &UserId,
    ) -> DiscussionResult<Vec<Invitation>> {
        self.guard.require_membership(discussion_id, requester)?;
        self.store.list_invitations_for_discussion(discussion_id)
    }

    /// The invitation `requester` may accept right now
    pub fn check_joinable(
        &self,
        id: InvitationId,
        requester: &UserId,
    ) -> DiscussionResult<Invitation> {
        let invitation = self
            .store
            .get_invitation(id)?
            .ok_or(DiscussionError::NotFound(Record::Invitation(id)))?;

        if invitation.is_expired_at(self.clock.now()) {
            return Err(DiscussionError::Expired(id));
        }

        if &invitation.invitee_id != requester {
            tracing::debug!(invitation_id = %id, requester = %requester, "Not the invitee");
            return Err(DiscussionError::PermissionDenied);
        }

        Ok(invitation)
    }

    /// Accept an invitation, turning it into a plain membership
    pub fn accept(
        &self,
        id: InvitationId,
        requester: &UserId,
        request: &JoinRequest,
    ) -> DiscussionResult<Membership> {
        let invitation = self.check_joinable(id, requester)?;

        if !invitation.matches(request) {
            tracing::warn!(
                invitation_id = %id,
                requester = %requester,
                "Join request does not match invitation"
            );
            return Err(DiscussionError::ValidationFailure(
                "join request does not match the invitation".to_string(),
            ));
        }

        let membership = self
            .registry
            .create_membership_from_invitation(&invitation, requester)?;

        tracing::info!(
            invitation_id = %id,
            discussion_id = %membership.discussion_id,
            membership_id = %membership.id,
            "Invitation accepted"
        );
        record_counter(INVITATION_ACCEPTED, 1);

        Ok(membership)
    }

    /// Revoke (owner) or withdraw (invitee) an invitation, expired or not
    pub fn delete(&self, id: InvitationId, requester: &UserId) -> DiscussionResult<()> {
        let invitation = self
            .store
            .get_invitation(id)?
            .ok_or(DiscussionError::NotFound(Record::Invitation(id)))?;

        let withdrawn = &invitation.invitee_id == requester;
        let action = if withdrawn { "withdrawn" } else { "revoked" };
        if !withdrawn {
            self.guard
                .require_owner_permission(invitation.discussion_id, requester)?;
        }

        if !self.store.delete_invitation(id)? {
            return Err(DiscussionError::NotFound(Record::Invitation(id)));
        }

        tracing::info!(
            invitation_id = %id,
            discussion_id = %invitation.discussion_id,
            by = %requester,
            action,
            "Invitation deleted"
        );
        record_counter(INVITATION_DELETED, 1);

        Ok(())
    }
}
