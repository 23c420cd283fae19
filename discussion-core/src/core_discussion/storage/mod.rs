//! Storage layer for discussions, memberships and invitations
//!
//! Provides SQL-based persistence for the discussion core.

pub mod migrations;
pub mod sql_store;

pub use migrations::{migrate, rollback_migration, CURRENT_DISCUSSION_SCHEMA_VERSION};
pub use sql_store::DiscussionSqlStore;
