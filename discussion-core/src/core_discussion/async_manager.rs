//! Async manager
//!
//! Wraps [`DiscussionManagerImpl`] behind a `tokio::sync::RwLock` so request
//! tasks can share one manager. Reads run concurrently; mutations are
//! serialised.

use super::clock::Clock;
use super::discussion::Discussion;
use super::errors::DiscussionResult;
use super::invitation::{Invitation, JoinRequest};
use super::manager::{DiscussionManager, InvitationManager, MembershipManager};
use super::manager_impl::DiscussionManagerImpl;
use super::membership::Membership;
use super::storage::DiscussionSqlStore;
use super::types::{DiscussionId, InvitationId, MembershipId};
use crate::core_identity::{UserDirectory, UserId};
use std::sync::Arc;
use tokio::sync::RwLock;

/// Shareable async handle over the discussion core
#[derive(Clone)]
pub struct AsyncDiscussionManager {
    manager: Arc<RwLock<DiscussionManagerImpl>>,
}

impl AsyncDiscussionManager {
    /// Create a new async manager
    pub fn new(
        store: DiscussionSqlStore,
        directory: Arc<dyn UserDirectory>,
        clock: Arc<dyn Clock>,
    ) -> Self {
        Self::from_manager(DiscussionManagerImpl::new(store, directory, clock))
    }

    pub fn from_manager(manager: DiscussionManagerImpl) -> Self {
        Self {
            manager: Arc::new(RwLock::new(manager)),
        }
    }

    /// Wall clock, with the store's users table as the directory
    pub fn with_system_clock(store: DiscussionSqlStore) -> Self {
        Self::from_manager(DiscussionManagerImpl::with_system_clock(store))
    }

    // ===== Discussions =====

    pub async fn create_discussion(
        &self,
        name: &str,
        creator: &UserId,
    ) -> DiscussionResult<(Discussion, Membership)> {
        let mut manager = self.manager.write().await;
        manager.create_discussion(name, creator)
    }

    pub async fn get_discussion(
        &self,
        id: DiscussionId,
        requester: &UserId,
    ) -> DiscussionResult<Discussion> {
        let manager = self.manager.read().await;
        manager.get_discussion(id, requester)
    }

    pub async fn rename_discussion(
        &self,
        id: DiscussionId,
        requester: &UserId,
        name: &str,
    ) -> DiscussionResult<Discussion> {
        let mut manager = self.manager.write().await;
        manager.rename_discussion(id, requester, name)
    }

    pub async fn delete_discussion(
        &self,
        id: DiscussionId,
        requester: &UserId,
    ) -> DiscussionResult<()> {
        let mut manager = self.manager.write().await;
        manager.delete_discussion(id, requester)
    }

    pub async fn list_user_discussions(&self, user_id: &UserId) -> DiscussionResult<Vec<Membership>> {
        let manager = self.manager.read().await;
        manager.list_user_discussions(user_id)
    }

    // ===== Memberships =====

    pub async fn list_members(
        &self,
        discussion_id: DiscussionId,
        requester: &UserId,
    ) -> DiscussionResult<Vec<Membership>> {
        let manager = self.manager.read().await;
        manager.list_members(discussion_id, requester)
    }

    pub async fn set_editor(
        &self,
        membership_id: MembershipId,
        requester: &UserId,
        is_editor: bool,
    ) -> DiscussionResult<Membership> {
        let mut manager = self.manager.write().await;
        manager.set_editor(membership_id, requester, is_editor)
    }

    pub async fn remove_member(
        &self,
        membership_id: MembershipId,
        requester: &UserId,
    ) -> DiscussionResult<()> {
        let mut manager = self.manager.write().await;
        manager.remove_member(membership_id, requester)
    }

    // ===== Invitations =====

    pub async fn invite(
        &self,
        discussion_id: DiscussionId,
        requester: &UserId,
        invitee_username: &str,
    ) -> DiscussionResult<Invitation> {
        let mut manager = self.manager.write().await;
        manager.invite(discussion_id, requester, invitee_username)
    }

    pub async fn list_my_invitations(&self, requester: &UserId) -> DiscussionResult<Vec<Invitation>> {
        let manager = self.manager.read().await;
        manager.list_my_invitations(requester)
    }

    pub async fn list_discussion_invitations(
        &self,
        discussion_id: DiscussionId,
        requester: &UserId,
    ) -> DiscussionResult<Vec<Invitation>> {
        let manager = self.manager.read().await;
        manager.list_discussion_invitations(discussion_id, requester)
    }

    pub async fn invitation_to_join(
        &self,
        id: InvitationId,
        requester: &UserId,
    ) -> DiscussionResult<Invitation> {
        let manager = self.manager.read().await;
        manager.invitation_to_join(id, requester)
    }

    pub async fn accept_invitation(
        &self,
        id: InvitationId,
        requester: &UserId,
        request: &JoinRequest,
    ) -> DiscussionResult<Membership> {
        let mut manager = self.manager.write().await;
        manager.accept_invitation(id, requester, request)
    }

    pub async fn delete_invitation(&self, id: InvitationId, requester: &UserId) -> DiscussionResult<()> {
        let mut manager = self.manager.write().await;
        manager.delete_invitation(id, requester)
    }
}
