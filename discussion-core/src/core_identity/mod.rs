//! Identity boundary
//!
//! Users live outside the discussion core. This module holds the handle types
//! the core accepts from the outside (`UserId`, `Principal`) and the traits
//! through which it looks users up.

mod directory;
mod profile;
mod user_id;

pub use directory::{AssumedIdentity, IdentityError, IdentityProvider, InMemoryDirectory, UserDirectory};
pub use profile::{is_valid_username, Principal, UserProfile, MAX_USERNAME_LEN};
pub use user_id::UserId;
