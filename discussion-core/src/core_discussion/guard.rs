//! Authorization guard
//!
//! Derives a requester's membership in a discussion and checks it against the
//! role table. Callers only ever see [`DiscussionError::PermissionDenied`];
//! whether the requester was not a member or merely lacked the role is logged
//! at debug level and otherwise kept internal.

use super::errors::{DiscussionError, DiscussionResult};
use super::membership::{Membership, Permission, Role};
use super::storage::DiscussionSqlStore;
use super::types::DiscussionId;
use crate::core_identity::UserId;
use crate::metrics::{record_counter, AUTHORIZATION_DENIED};

/// Why access was refused
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum AccessDenial {
    NotAMember,
    InsufficientRole { role: Role, required: Permission },
}

/// Check a looked-up membership against a required permission
pub(crate) fn evaluate(
    membership: Option<Membership>,
    required: Permission,
) -> Result<Membership, AccessDenial> {
    let membership = membership.ok_or(AccessDenial::NotAMember)?;
    if membership.can(required) {
        Ok(membership)
    } else {
        Err(AccessDenial::InsufficientRole {
            role: membership.role,
            required,
        })
    }
}

/// Read-only permission checks over the membership table
#[derive(Debug, Clone)]
pub struct AuthorizationGuard {
    store: DiscussionSqlStore,
}

impl AuthorizationGuard {
    pub fn new(store: DiscussionSqlStore) -> Self {
        Self { store }
    }

    /// The requester's membership in the discussion, if any
    pub fn resolve_membership(
        &self,
        discussion_id: DiscussionId,
        user_id: &UserId,
    ) -> DiscussionResult<Option<Membership>> {
        self.store.find_membership(discussion_id, user_id)
    }

    /// Any role
    pub fn require_membership(
        &self,
        discussion_id: DiscussionId,
        user_id: &UserId,
    ) -> DiscussionResult<Membership> {
        self.require(discussion_id, user_id, Permission::View)
    }

    /// Owner or Editor
    pub fn require_edit_permission(
        &self,
        discussion_id: DiscussionId,
        user_id: &UserId,
    ) -> DiscussionResult<Membership> {
        self.require(discussion_id, user_id, Permission::Edit)
    }

    /// Owner only
    pub fn require_owner_permission(
        &self,
        discussion_id: DiscussionId,
        user_id: &UserId,
    ) -> DiscussionResult<Membership> {
        self.require(discussion_id, user_id, Permission::Administer)
    }

    fn require(
        &self,
        discussion_id: DiscussionId,
        user_id: &UserId,
        required: Permission,
    ) -> DiscussionResult<Membership> {
        let membership = self.resolve_membership(discussion_id, user_id)?;

        evaluate(membership, required).map_err(|denial| {
            tracing::debug!(
                discussion_id = %discussion_id,
                user_id = %user_id,
                ?required,
                ?denial,
                "Access denied"
            );
            record_counter(AUTHORIZATION_DENIED, 1);
            DiscussionError::PermissionDenied
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core_discussion::types::MembershipId;

    fn membership(role: Role) -> Membership {
        Membership {
            id: MembershipId(1),
            discussion_id: DiscussionId(1),
            user_id: UserId::new("u"),
            role,
        }
    }

    #[test]
    fn test_evaluate_not_a_member() {
        assert_eq!(
            evaluate(None, Permission::View),
            Err(AccessDenial::NotAMember)
        );
    }

    #[test]
    fn test_evaluate_insufficient_role() {
        assert_eq!(
            evaluate(Some(membership(Role::Member)), Permission::Edit),
            Err(AccessDenial::InsufficientRole {
                role: Role::Member,
                required: Permission::Edit
            })
        );
        assert_eq!(
            evaluate(Some(membership(Role::Editor)), Permission::Administer),
            Err(AccessDenial::InsufficientRole {
                role: Role::Editor,
                required: Permission::Administer
            })
        );
    }

    #[test]
    fn test_evaluate_grants() {
        assert!(evaluate(Some(membership(Role::Editor)), Permission::Edit).is_ok());
        assert!(evaluate(Some(membership(Role::Owner)), Permission::Edit).is_ok());
        assert!(evaluate(Some(membership(Role::Owner)), Permission::Administer).is_ok());
    }

    #[test]
    fn test_guard_collapses_denials() {
        let store = DiscussionSqlStore::memory().unwrap();
        let owner = UserId::new("owner");
        let member = UserId::new("member");
        let (discussion, _) = store.insert_discussion_with_owner("Team A", &owner).unwrap();
        store
            .insert_membership(discussion.id, &member, Role::Member)
            .unwrap();
        let guard = AuthorizationGuard::new(store);

        let outsider = guard.require_edit_permission(discussion.id, &UserId::new("nobody"));
        let plain = guard.require_edit_permission(discussion.id, &member);
        assert!(matches!(outsider, Err(DiscussionError::PermissionDenied)));
        assert!(matches!(plain, Err(DiscussionError::PermissionDenied)));

        assert!(guard.require_membership(discussion.id, &member).is_ok());
        assert!(guard.require_owner_permission(discussion.id, &owner).unwrap().is_owner());
        assert!(guard
            .resolve_membership(discussion.id, &UserId::new("nobody"))
            .unwrap()
            .is_none());
    }
}
