//! Discussion membership and invitation core
//!
//! Users form discussions, members hold an Owner, Editor or Member role, and
//! owners invite other users who must accept within seven days. See
//! [`core_discussion`] for the state machine and its authorization rules.

pub mod config;
pub mod core_discussion;
pub mod core_identity;
pub mod logging;
pub mod metrics;
#[cfg(any(test, feature = "test-utils"))]
pub mod test_utils;

pub use config::{Config, ConfigError, StoreConfig};
pub use core_discussion::{
    AsyncDiscussionManager, DiscussionError, DiscussionManagerImpl, DiscussionResult,
    DiscussionSqlStore,
};
pub use core_identity::{UserId, UserProfile};
pub use logging::{init_logging, LogLevel};
