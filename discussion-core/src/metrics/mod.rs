//! Metrics for the discussion core
//!
//! Counters go through the `metrics` facade. Nothing is exported unless the
//! embedding binary installs a recorder; without one every call is a no-op.

use metrics::{counter, describe_counter};

pub const DISCUSSION_CREATED: &str = "discussion.created";
pub const DISCUSSION_DELETED: &str = "discussion.deleted";
pub const MEMBERSHIP_ROLE_UPDATED: &str = "membership.role_updated";
pub const MEMBERSHIP_REMOVED: &str = "membership.removed";
pub const INVITATION_CREATED: &str = "invitation.created";
pub const INVITATION_ACCEPTED: &str = "invitation.accepted";
pub const INVITATION_DELETED: &str = "invitation.deleted";
pub const AUTHORIZATION_DENIED: &str = "authorization.denied";

/// Initialize metrics with descriptions
pub fn init_metrics() {
    // Discussion metrics
    describe_counter!(DISCUSSION_CREATED, "Number of discussions created");
    describe_counter!(DISCUSSION_DELETED, "Number of discussions deleted");

    // Membership metrics
    describe_counter!(MEMBERSHIP_ROLE_UPDATED, "Number of editor flag changes");
    describe_counter!(MEMBERSHIP_REMOVED, "Number of members removed by an owner");

    // Invitation metrics
    describe_counter!(INVITATION_CREATED, "Number of invitations created");
    describe_counter!(INVITATION_ACCEPTED, "Number of invitations accepted");
    describe_counter!(INVITATION_DELETED, "Number of invitations revoked or withdrawn");

    // Guard metrics
    describe_counter!(AUTHORIZATION_DENIED, "Number of requests refused by the guard");
}

/// Record a counter metric
pub fn record_counter(name: &'static str, value: u64) {
    counter!(name).increment(value);
}
