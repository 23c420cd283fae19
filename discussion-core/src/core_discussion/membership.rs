//! Membership records, roles and the permission table

use super::types::{DiscussionId, MembershipId};
use crate::core_identity::UserId;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Role a member holds in one discussion
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Role {
    /// Full control: edit or delete the discussion, manage members and invitations
    Owner,
    /// Elevated, non-administrative access
    Editor,
    /// Plain participant
    Member,
}

/// Permission classes checked by the authorization guard
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Permission {
    /// See the discussion, its members and its invitations
    View,
    /// Edit-level access
    Edit,
    /// Manage the discussion, its members and invitations
    Administer,
}

impl Role {
    /// Permissions granted by each role
    pub fn permissions(self) -> &'static [Permission] {
        match self {
            Role::Owner => &[Permission::View, Permission::Edit, Permission::Administer],
            Role::Editor => &[Permission::View, Permission::Edit],
            Role::Member => &[Permission::View],
        }
    }

    pub fn grants(self, permission: Permission) -> bool {
        self.permissions().contains(&permission)
    }

    /// Role after setting the editor flag. Owner status never changes here.
    pub fn with_editor(self, is_editor: bool) -> Role {
        match (self, is_editor) {
            (Role::Owner, _) => Role::Owner,
            (_, true) => Role::Editor,
            (_, false) => Role::Member,
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Role::Owner => "Owner",
            Role::Editor => "Editor",
            Role::Member => "Member",
        }
    }
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Role {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "Owner" => Ok(Role::Owner),
            "Editor" => Ok(Role::Editor),
            "Member" => Ok(Role::Member),
            other => Err(format!("unknown role: {}", other)),
        }
    }
}

/// One user's participation in one discussion
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Membership {
    pub id: MembershipId,
    pub discussion_id: DiscussionId,
    pub user_id: UserId,
    pub role: Role,
}

impl Membership {
    pub fn is_owner(&self) -> bool {
        self.role == Role::Owner
    }

    /// True only for the Editor role; owners answer through `is_owner`
    pub fn is_editor(&self) -> bool {
        self.role == Role::Editor
    }

    pub fn can(&self, permission: Permission) -> bool {
        self.role.grants(permission)
    }
}
