//! Discussion, Membership & Invitation Management
//!
//! Users form discussions, hold a role in each discussion they belong to,
//! and invite other users who must accept before a seven-day deadline.
//!
//! ## Architecture
//!
//! - **Membership Registry**: discussion and membership records and their invariants
//! - **Authorization Guard**: derives a requester's role in a discussion
//! - **Invitation Lifecycle**: create, list, accept, revoke and withdraw invitations
//! - **Managers**: handler-facing traits with explicit requesters, plus an async facade
//!
//! ## Roles
//!
//! | Role   | View | Edit | Administer |
//! |--------|------|------|------------|
//! | Owner  | yes  | yes  | yes        |
//! | Editor | yes  | yes  |            |
//! | Member | yes  |      |            |
//!
//! Every discussion has exactly one owner, fixed at creation.

pub mod async_manager;
pub mod clock;
pub mod discussion;
pub mod errors;
pub mod guard;
pub mod invitation;
pub mod lifecycle;
pub mod manager;
pub mod manager_impl;
pub mod membership;
pub mod registry;
pub mod storage;
pub mod types;

#[cfg(test)]
mod tests;

pub use async_manager::AsyncDiscussionManager;
pub use clock::{Clock, FixedClock, SystemClock};
pub use discussion::{validate_discussion_name, Discussion, MAX_DISCUSSION_NAME_LEN};
pub use errors::{DiscussionError, DiscussionResult, ErrorKind, Record};
pub use guard::AuthorizationGuard;
pub use invitation::{invitation_ttl, Invitation, InvitationState, JoinRequest, INVITATION_TTL_DAYS};
pub use lifecycle::InvitationLifecycle;
pub use manager::{DiscussionManager, InvitationManager, MembershipManager};
pub use manager_impl::DiscussionManagerImpl;
pub use membership::{Membership, Permission, Role};
pub use registry::MembershipRegistry;
pub use storage::DiscussionSqlStore;
pub use types::{DiscussionId, InvitationId, MembershipId};
