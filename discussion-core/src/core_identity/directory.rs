//! User directory and identity provider seams
//!
//! The discussion core never authenticates anyone itself. It asks a
//! [`UserDirectory`] to turn an invitee's username into a [`UserId`], and a
//! request layer asks an [`IdentityProvider`] who is making the request.

use super::profile::{is_valid_username, Principal, UserProfile};
use super::user_id::UserId;
use std::collections::HashMap;
use std::sync::RwLock;
use thiserror::Error;

/// Identity lookup errors
#[derive(Debug, Error)]
pub enum IdentityError {
    #[error("Username already taken: {0}")]
    UsernameTaken(String),

    #[error("Invalid username: {0:?}")]
    InvalidUsername(String),

    #[error("No authenticated user")]
    Unauthenticated,

    #[error("Directory lookup failed: {0}")]
    Lookup(String),
}

/// Resolves usernames and user ids against the set of known users
pub trait UserDirectory: Send + Sync {
    /// Find the user registered under `username`
    fn resolve_username(&self, username: &str) -> Result<Option<UserId>, IdentityError>;

    /// Fetch the profile of a known user
    fn profile(&self, user_id: &UserId) -> Result<Option<UserProfile>, IdentityError>;
}

/// Supplies the principal behind the current request
pub trait IdentityProvider {
    fn current_user(&self) -> Result<Principal, IdentityError>;
}

/// Directory held entirely in memory
#[derive(Debug, Default)]
pub struct InMemoryDirectory {
    by_username: RwLock<HashMap<String, UserProfile>>,
}

impl InMemoryDirectory {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a profile; usernames are unique
    pub fn register(&self, profile: UserProfile) -> Result<UserProfile, IdentityError> {
        if !is_valid_username(&profile.username) {
            return Err(IdentityError::InvalidUsername(profile.username));
        }

        let mut users = self.by_username.write().unwrap_or_else(|e| e.into_inner());
        if users.contains_key(&profile.username) {
            return Err(IdentityError::UsernameTaken(profile.username));
        }
        users.insert(profile.username.clone(), profile.clone());
        Ok(profile)
    }

    pub fn len(&self) -> usize {
        self.by_username.read().unwrap_or_else(|e| e.into_inner()).len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl UserDirectory for InMemoryDirectory {
    fn resolve_username(&self, username: &str) -> Result<Option<UserId>, IdentityError> {
        let users = self.by_username.read().unwrap_or_else(|e| e.into_inner());
        Ok(users.get(username).map(|p| p.id.clone()))
    }

    fn profile(&self, user_id: &UserId) -> Result<Option<UserProfile>, IdentityError> {
        let users = self.by_username.read().unwrap_or_else(|e| e.into_inner());
        Ok(users.values().find(|p| &p.id == user_id).cloned())
    }
}

/// Identity asserted by username, looked up in a directory.
///
/// Used by trusted local front ends (the CLI) where the caller names the
/// account it acts as.
pub struct AssumedIdentity<'a> {
    directory: &'a dyn UserDirectory,
    username: String,
}

impl<'a> AssumedIdentity<'a> {
    pub fn new(directory: &'a dyn UserDirectory, username: impl Into<String>) -> Self {
        Self {
            directory,
            username: username.into(),
        }
    }
}

impl IdentityProvider for AssumedIdentity<'_> {
    fn current_user(&self) -> Result<Principal, IdentityError> {
        let user_id = self
            .directory
            .resolve_username(&self.username)?
            .ok_or(IdentityError::Unauthenticated)?;
        let profile = self
            .directory
            .profile(&user_id)?
            .ok_or(IdentityError::Unauthenticated)?;

        Ok(Principal::from(&profile))
    }
}
