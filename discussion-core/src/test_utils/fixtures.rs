//! Test fixtures for creating common test objects
//!
//! [`TestHarness`] wires a [`DiscussionManagerImpl`] to an in-memory store
//! whose users table doubles as the directory, and to a [`FixedClock`] the
//! test moves by hand.

use crate::core_discussion::{
    AsyncDiscussionManager, Clock, DiscussionManagerImpl, DiscussionSqlStore, FixedClock,
};
use crate::core_identity::{UserDirectory, UserId, UserProfile};
use chrono::{DateTime, TimeZone, Utc};
use std::sync::Arc;

/// Instant every harness clock starts at
pub fn test_epoch() -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2024, 4, 1, 9, 30, 0).unwrap()
}

/// Builder for creating test user profiles
pub struct TestUserBuilder {
    username: String,
    first_name: String,
    last_name: String,
}

impl TestUserBuilder {
    pub fn new(username: impl Into<String>) -> Self {
        Self {
            username: username.into(),
            first_name: String::new(),
            last_name: String::new(),
        }
    }

    pub fn with_name(mut self, first: impl Into<String>, last: impl Into<String>) -> Self {
        self.first_name = first.into();
        self.last_name = last.into();
        self
    }

    pub fn build(self) -> UserProfile {
        UserProfile::new(self.username).with_name(self.first_name, self.last_name)
    }
}

/// Store, clock and manager sharing one in-memory database
pub struct TestHarness {
    pub store: DiscussionSqlStore,
    pub clock: Arc<FixedClock>,
    pub manager: DiscussionManagerImpl,
}

impl TestHarness {
    pub fn new() -> Self {
        Self::starting_at(test_epoch())
    }

    pub fn starting_at(now: DateTime<Utc>) -> Self {
        let store = match DiscussionSqlStore::memory() {
            Ok(store) => store,
            Err(e) => panic!("in-memory store failed to open: {}", e),
        };
        let clock = Arc::new(FixedClock::new(now));
        let directory: Arc<dyn UserDirectory> = Arc::new(store.clone());
        let manager = DiscussionManagerImpl::new(store.clone(), directory, clock.clone());

        Self {
            store,
            clock,
            manager,
        }
    }

    pub fn now(&self) -> DateTime<Utc> {
        self.clock.now()
    }

    /// Register `username` and return its id
    pub fn user(&self, username: &str) -> UserId {
        self.register(TestUserBuilder::new(username).build())
    }

    pub fn register(&self, profile: UserProfile) -> UserId {
        match self.store.register_user(&profile) {
            Ok(profile) => profile.id,
            Err(e) => panic!("failed to register {}: {}", profile.username, e),
        }
    }

    /// An async manager over the same store and clock
    pub fn async_manager(&self) -> AsyncDiscussionManager {
        let directory: Arc<dyn UserDirectory> = Arc::new(self.store.clone());
        AsyncDiscussionManager::new(self.store.clone(), directory, self.clock.clone())
    }
}

impl Default for TestHarness {
    fn default() -> Self {
        Self::new()
    }
}
