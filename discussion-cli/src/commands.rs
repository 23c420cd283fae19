//! Subcommands and their execution against the discussion core

use anyhow::{anyhow, Result};
use clap::{ArgAction, Subcommand};
use discussion_core::core_discussion::{
    AsyncDiscussionManager, DiscussionId, InvitationId, JoinRequest, MembershipId,
};
use discussion_core::core_identity::{
    AssumedIdentity, IdentityProvider, Principal, UserId, UserProfile,
};
use discussion_core::DiscussionSqlStore;
use serde_json::{json, Value};

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Manage local users
    #[command(subcommand)]
    User(UserCommand),

    /// Create, list, rename and delete discussions
    #[command(subcommand)]
    Discussion(DiscussionCommand),

    /// Inspect and manage members of a discussion
    #[command(subcommand)]
    Members(MembersCommand),

    /// Create, list, accept and delete invitations
    #[command(subcommand)]
    Invite(InviteCommand),
}

#[derive(Subcommand, Debug)]
pub enum UserCommand {
    /// Register a new user
    Register {
        username: String,
        #[arg(long, default_value = "")]
        first_name: String,
        #[arg(long, default_value = "")]
        last_name: String,
    },
    /// List registered users
    List,
    /// Show the user named by --as
    Whoami,
}

#[derive(Subcommand, Debug)]
pub enum DiscussionCommand {
    /// Create a discussion owned by the acting user
    Create { name: String },
    /// List discussions the acting user belongs to
    List,
    /// Show one discussion
    Show { discussion: DiscussionId },
    /// Rename a discussion (owner only)
    Rename { discussion: DiscussionId, name: String },
    /// Delete a discussion with its members and invitations (owner only)
    Delete { discussion: DiscussionId },
}

#[derive(Subcommand, Debug)]
pub enum MembersCommand {
    /// List members of a discussion
    List { discussion: DiscussionId },
    /// Set or clear the editor flag of a membership (owner only)
    SetEditor {
        membership: MembershipId,
        #[arg(action = ArgAction::Set)]
        editor: bool,
    },
    /// Remove a member (owner only)
    Remove { membership: MembershipId },
}

#[derive(Subcommand, Debug)]
pub enum InviteCommand {
    /// Invite a user by username (owner only)
    Create { discussion: DiscussionId, username: String },
    /// List pending invitations addressed to the acting user
    ListMine,
    /// List every invitation of a discussion
    ListFor { discussion: DiscussionId },
    /// Show an invitation the acting user can accept
    Show { invitation: InvitationId },
    /// Accept an invitation
    Accept { invitation: InvitationId },
    /// Revoke or withdraw an invitation
    Delete { invitation: InvitationId },
}

fn principal(store: &DiscussionSqlStore, as_user: Option<&str>) -> Result<Principal> {
    let username = as_user.ok_or_else(|| anyhow!("this command needs --as <username>"))?;
    Ok(AssumedIdentity::new(store, username).current_user()?)
}

/// Run one command and return what it should print
pub async fn execute(
    store: DiscussionSqlStore,
    as_user: Option<&str>,
    command: Command,
) -> Result<Value> {
    match command {
        Command::User(cmd) => execute_user(&store, as_user, &cmd),
        Command::Discussion(cmd) => {
            let (manager, me) = act_as(store, as_user)?;
            execute_discussion(&manager, &me.user_id, cmd).await
        }
        Command::Members(cmd) => {
            let (manager, me) = act_as(store, as_user)?;
            execute_members(&manager, &me.user_id, cmd).await
        }
        Command::Invite(cmd) => {
            let (manager, me) = act_as(store, as_user)?;
            execute_invite(&manager, &me.user_id, cmd).await
        }
    }
}

fn act_as(
    store: DiscussionSqlStore,
    as_user: Option<&str>,
) -> Result<(AsyncDiscussionManager, Principal)> {
    let me = principal(&store, as_user)?;
    Ok((AsyncDiscussionManager::with_system_clock(store), me))
}

async fn execute_discussion(
    manager: &AsyncDiscussionManager,
    user: &UserId,
    command: DiscussionCommand,
) -> Result<Value> {
    let output = match command {
        DiscussionCommand::Create { name } => {
            let (discussion, membership) = manager.create_discussion(&name, user).await?;
            json!({ "discussion": discussion, "membership": membership })
        }
        DiscussionCommand::List => {
            let mut rows = Vec::new();
            for membership in manager.list_user_discussions(user).await? {
                let discussion = manager
                    .get_discussion(membership.discussion_id, user)
                    .await?;
                rows.push(json!({ "discussion": discussion, "membership": membership }));
            }
            Value::Array(rows)
        }
        DiscussionCommand::Show { discussion } => {
            json!(manager.get_discussion(discussion, user).await?)
        }
        DiscussionCommand::Rename { discussion, name } => {
            json!(manager.rename_discussion(discussion, user, &name).await?)
        }
        DiscussionCommand::Delete { discussion } => {
            manager.delete_discussion(discussion, user).await?;
            json!({ "deleted": discussion })
        }
    };
    Ok(output)
}

async fn execute_members(
    manager: &AsyncDiscussionManager,
    user: &UserId,
    command: MembersCommand,
) -> Result<Value> {
    let output = match command {
        MembersCommand::List { discussion } => json!(manager.list_members(discussion, user).await?),
        MembersCommand::SetEditor { membership, editor } => {
            json!(manager.set_editor(membership, user, editor).await?)
        }
        MembersCommand::Remove { membership } => {
            manager.remove_member(membership, user).await?;
            json!({ "removed": membership })
        }
    };
    Ok(output)
}

async fn execute_invite(
    manager: &AsyncDiscussionManager,
    user: &UserId,
    command: InviteCommand,
) -> Result<Value> {
    let output = match command {
        InviteCommand::Create {
            discussion,
            username,
        } => json!(manager.invite(discussion, user, &username).await?),
        InviteCommand::ListMine => json!(manager.list_my_invitations(user).await?),
        InviteCommand::ListFor { discussion } => {
            json!(manager.list_discussion_invitations(discussion, user).await?)
        }
        InviteCommand::Show { invitation } => {
            json!(manager.invitation_to_join(invitation, user).await?)
        }
        InviteCommand::Accept { invitation } => {
            // Submit exactly what the invitation offers
            let shown = manager.invitation_to_join(invitation, user).await?;
            let request = JoinRequest::for_invitation(&shown);
            json!(manager.accept_invitation(invitation, user, &request).await?)
        }
        InviteCommand::Delete { invitation } => {
            manager.delete_invitation(invitation, user).await?;
            json!({ "deleted": invitation })
        }
    };
    Ok(output)
}

fn execute_user(
    store: &DiscussionSqlStore,
    as_user: Option<&str>,
    command: &UserCommand,
) -> Result<Value> {
    match command {
        UserCommand::Register {
            username,
            first_name,
            last_name,
        } => {
            let profile = UserProfile::new(username.as_str())
                .with_name(first_name.as_str(), last_name.as_str());
            let profile = store.register_user(&profile)?;
            Ok(json!({
                "id": profile.id,
                "username": profile.username,
                "display_name": profile.display_name(),
            }))
        }
        UserCommand::List => {
            let users: Vec<Value> = store
                .list_users()?
                .iter()
                .map(|p| json!({ "id": p.id, "username": p.username, "display_name": p.display_name() }))
                .collect();
            Ok(Value::Array(users))
        }
        UserCommand::Whoami => Ok(json!(principal(store, as_user)?)),
    }
}
