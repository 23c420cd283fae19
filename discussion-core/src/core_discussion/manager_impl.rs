//! Manager trait implementations composing guard, registry and lifecycle

use super::clock::{Clock, SystemClock};
use super::discussion::Discussion;
use super::errors::DiscussionResult;
use super::guard::AuthorizationGuard;
use super::invitation::{Invitation, JoinRequest};
use super::lifecycle::InvitationLifecycle;
use super::manager::{DiscussionManager, InvitationManager, MembershipManager};
use super::membership::Membership;
use super::registry::MembershipRegistry;
use super::storage::DiscussionSqlStore;
use super::types::{DiscussionId, InvitationId, MembershipId};
use crate::core_identity::{UserDirectory, UserId};
use std::sync::Arc;

/// Manager implementation with business logic
#[derive(Debug)]
pub struct DiscussionManagerImpl {
    registry: MembershipRegistry,
    guard: AuthorizationGuard,
    lifecycle: InvitationLifecycle,
}

impl DiscussionManagerImpl {
    /// Create a manager over `store`, resolving invitees through `directory`
    pub fn new(
        store: DiscussionSqlStore,
        directory: Arc<dyn UserDirectory>,
        clock: Arc<dyn Clock>,
    ) -> Self {
        Self {
            registry: MembershipRegistry::new(store.clone()),
            guard: AuthorizationGuard::new(store.clone()),
            lifecycle: InvitationLifecycle::new(store, directory, clock),
        }
    }

    /// Wall clock, and the store's own users table as the directory
    pub fn with_system_clock(store: DiscussionSqlStore) -> Self {
        let directory = Arc::new(store.clone());
        Self::new(store, directory, Arc::new(SystemClock))
    }

    pub fn guard(&self) -> &AuthorizationGuard {
        &self.guard
    }
}

impl DiscussionManager for DiscussionManagerImpl {
    fn create_discussion(
        &mut self,
        name: &str,
        creator: &UserId,
    ) -> DiscussionResult<(Discussion, Membership)> {
        self.registry.create_discussion(name, creator)
    }

    fn get_discussion(&self, id: DiscussionId, requester: &UserId) -> DiscussionResult<Discussion> {
        self.guard.require_membership(id, requester)?;
        self.registry.get_discussion(id)
    }

    fn rename_discussion(
        &mut self,
        id: DiscussionId,
        requester: &UserId,
        name: &str,
    ) -> DiscussionResult<Discussion> {
        self.guard.require_owner_permission(id, requester)?;
        self.registry.rename_discussion(id, name)
    }

    fn delete_discussion(&mut self, id: DiscussionId, requester: &UserId) -> DiscussionResult<()> {
        self.guard.require_owner_permission(id, requester)?;
        self.registry.delete_discussion(id)
    }

    fn list_user_discussions(&self, user_id: &UserId) -> DiscussionResult<Vec<Membership>> {
        self.registry.list_discussions_for_user(user_id)
    }
}

impl MembershipManager for DiscussionManagerImpl {
    fn list_members(
        &self,
        discussion_id: DiscussionId,
        requester: &UserId,
    ) -> DiscussionResult<Vec<Membership>> {
        self.guard.require_membership(discussion_id, requester)?;
        self.registry.list_members_of_discussion(discussion_id)
    }

    fn set_editor(
        &mut self,
        membership_id: MembershipId,
        requester: &UserId,
        is_editor: bool,
    ) -> DiscussionResult<Membership> {
        let target = self.registry.get_membership(membership_id)?;
        self.guard
            .require_owner_permission(target.discussion_id, requester)?;

        self.registry.update_membership_role(membership_id, is_editor)
    }

    fn remove_member(
        &mut self,
        membership_id: MembershipId,
        requester: &UserId,
    ) -> DiscussionResult<()> {
        let target = self.registry.get_membership(membership_id)?;
        let owner = self
            .guard
            .require_owner_permission(target.discussion_id, requester)?;

        self.registry.remove_membership(membership_id, owner.id)
    }
}

impl InvitationManager for DiscussionManagerImpl {
    fn invite(
        &mut self,
        discussion_id: DiscussionId,
        requester: &UserId,
        invitee_username: &str,
    ) -> DiscussionResult<Invitation> {
        self.lifecycle.create(discussion_id, requester, invitee_username)
    }

    fn list_my_invitations(&self, requester: &UserId) -> DiscussionResult<Vec<Invitation>> {
        self.lifecycle.list_active_for_invitee(requester)
    }

    fn list_discussion_invitations(
        &self,
        discussion_id: DiscussionId,
        requester: &UserId,
    ) -> DiscussionResult<Vec<Invitation>> {
        self.lifecycle.list_for_discussion(discussion_id, requester)
    }

    fn invitation_to_join(
        &self,
        id: InvitationId,
        requester: &UserId,
    ) -> DiscussionResult<Invitation> {
        self.lifecycle.check_joinable(id, requester)
    }

    fn accept_invitation(
        &mut self,
        id: InvitationId,
        requester: &UserId,
        request: &JoinRequest,
    ) -> DiscussionResult<Membership> {
        self.lifecycle.accept(id, requester, request)
    }

    fn delete_invitation(&mut self, id: InvitationId, requester: &UserId) -> DiscussionResult<()> {
        self.lifecycle.delete(id, requester)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core_discussion::errors::DiscussionError;
    use crate::core_identity::UserProfile;

    fn setup() -> (DiscussionManagerImpl, DiscussionSqlStore) {
        let store = DiscussionSqlStore::memory().unwrap();
        (DiscussionManagerImpl::with_system_clock(store.clone()), store)
    }

    #[test]
    fn test_owner_manages_discussion() {
        let (mut manager, store) = setup();
        let owner = store.register_user(&UserProfile::new("owner")).unwrap().id;

        let (discussion, _) = manager.create_discussion("Team A", &owner).unwrap();
        let renamed = manager
            .rename_discussion(discussion.id, &owner, "Team B")
            .unwrap();
        assert_eq!(manager.get_discussion(discussion.id, &owner).unwrap(), renamed);

        manager.delete_discussion(discussion.id, &owner).unwrap();
        assert!(manager.list_user_discussions(&owner).unwrap().is_empty());
    }

    #[test]
    fn test_non_member_cannot_read() {
        let (mut manager, _) = setup();
        let owner = UserId::new("owner");
        let (discussion, _) = manager.create_discussion("Team A", &owner).unwrap();

        let stranger = UserId::new("stranger");
        assert!(matches!(
            manager.get_discussion(discussion.id, &stranger),
            Err(DiscussionError::PermissionDenied)
        ));
        assert!(matches!(
            manager.list_members(discussion.id, &stranger),
            Err(DiscussionError::PermissionDenied)
        ));
        assert!(matches!(
            manager.delete_discussion(discussion.id, &stranger),
            Err(DiscussionError::PermissionDenied)
        ));
    }

    #[test]
    fn test_owner_cannot_remove_self() {
        let (mut manager, _) = setup();
        let owner = UserId::new("owner");
        let (_, membership) = manager.create_discussion("Team A", &owner).unwrap();

        let result = manager.remove_member(membership.id, &owner);
        assert!(matches!(result, Err(DiscussionError::PermissionDenied)));
    }

    #[test]
    fn test_invite_accept_promote() {
        let (mut manager, store) = setup();
        let owner = store.register_user(&UserProfile::new("owner")).unwrap().id;
        let guest = store.register_user(&UserProfile::new("guest")).unwrap().id;
        let (discussion, _) = manager.create_discussion("Team A", &owner).unwrap();

        let invitation = manager.invite(discussion.id, &owner, "guest").unwrap();
        assert_eq!(manager.list_my_invitations(&guest).unwrap(), vec![invitation.clone()]);

        let joined = manager
            .accept_invitation(invitation.id, &guest, &JoinRequest::for_invitation(&invitation))
            .unwrap();
        let promoted = manager.set_editor(joined.id, &owner, true).unwrap();
        assert!(promoted.is_editor());
        assert!(!promoted.is_owner());

        // Editors still cannot administer
        assert!(matches!(
            manager.remove_member(promoted.id, &guest),
            Err(DiscussionError::PermissionDenied)
        ));
    }
}
