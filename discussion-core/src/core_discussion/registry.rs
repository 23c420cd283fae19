//! Membership registry
//!
//! Owns the discussion and membership records and the rules that hold no
//! matter who is asking: one owner from inception, one membership per user
//! and discussion, immutable owner status, no self-removal. Requester checks
//! live in [`super::guard`].

use super::discussion::{validate_discussion_name, Discussion};
use super::errors::{DiscussionError, DiscussionResult, Record};
use super::invitation::Invitation;
use super::membership::{Membership, Role};
use super::storage::DiscussionSqlStore;
use super::types::{DiscussionId, MembershipId};
use crate::core_identity::UserId;
use crate::metrics::{
    record_counter, DISCUSSION_CREATED, DISCUSSION_DELETED, MEMBERSHIP_REMOVED,
    MEMBERSHIP_ROLE_UPDATED,
};

#[derive(Debug, Clone)]
pub struct MembershipRegistry {
    store: DiscussionSqlStore,
}

impl MembershipRegistry {
    pub fn new(store: DiscussionSqlStore) -> Self {
        Self { store }
    }

    /// Create a discussion and make `creator` its owner, atomically
    pub fn create_discussion(
        &self,
        name: &str,
        creator: &UserId,
    ) -> DiscussionResult<(Discussion, Membership)> {
        let name = validate_discussion_name(name)?;
        let (discussion, owner) = self.store.insert_discussion_with_owner(&name, creator)?;

        tracing::info!(
            discussion_id = %discussion.id,
            owner = %creator,
            "Discussion created"
        );
        record_counter(DISCUSSION_CREATED, 1);

        Ok((discussion, owner))
    }

    pub fn get_discussion(&self, id: DiscussionId) -> DiscussionResult<Discussion> {
        self.store
            .get_discussion(id)?
            .ok_or(DiscussionError::NotFound(Record::Discussion(id)))
    }

    pub fn rename_discussion(&self, id: DiscussionId, name: &str) -> DiscussionResult<Discussion> {
        let name = validate_discussion_name(name)?;
        if !self.store.rename_discussion(id, &name)? {
            return Err(DiscussionError::NotFound(Record::Discussion(id)));
        }

        tracing::info!(discussion_id = %id, "Discussion renamed");
        Ok(Discussion { id, name })
    }

    /// Delete a discussion along with its memberships and invitations
    pub fn delete_discussion(&self, id: DiscussionId) -> DiscussionResult<()> {
        if !self.store.delete_discussion(id)? {
            return Err(DiscussionError::NotFound(Record::Discussion(id)));
        }

        tracing::info!(discussion_id = %id, "Discussion deleted");
        record_counter(DISCUSSION_DELETED, 1);
        Ok(())
    }

    /// Every membership the user holds
    pub fn list_discussions_for_user(&self, user_id: &UserId) -> DiscussionResult<Vec<Membership>> {
        self.store.list_memberships_for_user(user_id)
    }

    pub fn list_members_of_discussion(
        &self,
        discussion_id: DiscussionId,
    ) -> DiscussionResult<Vec<Membership>> {
        self.store.list_memberships_for_discussion(discussion_id)
    }

    pub fn get_membership(&self, id: MembershipId) -> DiscussionResult<Membership> {
        self.store
            .get_membership(id)?
            .ok_or(DiscussionError::NotFound(Record::Membership(id)))
    }

    /// Add a non-owner member directly
    pub fn create_membership(
        &self,
        discussion_id: DiscussionId,
        user_id: &UserId,
        is_editor: bool,
    ) -> DiscussionResult<Membership> {
        if self.store.find_membership(discussion_id, user_id)?.is_some() {
            return Err(DiscussionError::DuplicateMembership(discussion_id));
        }

        let role = Role::Member.with_editor(is_editor);
        self.store.insert_membership(discussion_id, user_id, role)
    }

    /// Set or clear the editor flag. Owners keep their role.
    pub fn update_membership_role(
        &self,
        id: MembershipId,
        is_editor: bool,
    ) -> DiscussionResult<Membership> {
        let current = self.get_membership(id)?;
        let role = current.role.with_editor(is_editor);
        if role == current.role {
            return Ok(current);
        }

        let updated = self
            .store
            .set_membership_role(id, role)?
            .ok_or(DiscussionError::NotFound(Record::Membership(id)))?;

        tracing::info!(
            membership_id = %id,
            discussion_id = %updated.discussion_id,
            from = %current.role,
            to = %updated.role,
            "Membership role updated"
        );
        record_counter(MEMBERSHIP_ROLE_UPDATED, 1);

        Ok(updated)
    }

    /// Remove a membership on behalf of another one. A member never removes itself.
    pub fn remove_membership(
        &self,
        id: MembershipId,
        requester_membership_id: MembershipId,
    ) -> DiscussionResult<()> {
        if id == requester_membership_id {
            tracing::debug!(membership_id = %id, "Self-removal refused");
            return Err(DiscussionError::PermissionDenied);
        }

        if !self.store.delete_membership(id)? {
            return Err(DiscussionError::NotFound(Record::Membership(id)));
        }

        tracing::info!(membership_id = %id, "Membership removed");
        record_counter(MEMBERSHIP_REMOVED, 1);
        Ok(())
    }

    /// Turn `invitation` into a plain membership for `user_id`.
    ///
    /// The membership insert and invitation delete commit together.
    pub fn create_membership_from_invitation(
        &self,
        invitation: &Invitation,
        user_id: &UserId,
    ) -> DiscussionResult<Membership> {
        if user_id != &invitation.invitee_id {
            return Err(DiscussionError::ValidationFailure(
                "invitation does not belong to this user".to_string(),
            ));
        }

        if self
            .store
            .find_membership(invitation.discussion_id, user_id)?
            .is_some()
        {
            return Err(DiscussionError::DuplicateMembership(invitation.discussion_id));
        }

        self.store.convert_invitation(invitation)
    }
}
