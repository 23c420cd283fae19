//! Discussion core over a file-backed SQLite store

use chrono::Duration;
use discussion_core::config::{Config, StoreConfig};
use discussion_core::core_discussion::{
    DiscussionError, DiscussionManager, DiscussionManagerImpl, DiscussionSqlStore, FixedClock,
    InvitationManager, JoinRequest, MembershipManager, Role,
};
use discussion_core::core_identity::{UserDirectory, UserProfile};
use discussion_core::test_utils::test_epoch;
use std::sync::Arc;
use tempfile::TempDir;

fn file_config(dir: &TempDir) -> StoreConfig {
    StoreConfig {
        database_path: Some(dir.path().join("discussions.db")),
        ..StoreConfig::default()
    }
}

fn manager_over(store: &DiscussionSqlStore, clock: &Arc<FixedClock>) -> DiscussionManagerImpl {
    let directory: Arc<dyn UserDirectory> = Arc::new(store.clone());
    DiscussionManagerImpl::new(store.clone(), directory, clock.clone())
}

#[test]
fn test_invitation_survives_restart_and_expires() {
    let dir = TempDir::new().unwrap();
    let config = file_config(&dir);
    let clock = Arc::new(FixedClock::new(test_epoch()));

    let (team_id, invitation) = {
        let store = DiscussionSqlStore::open(&config).unwrap();
        let owner = store.register_user(&UserProfile::new("olivia")).unwrap().id;
        store.register_user(&UserProfile::new("xavier")).unwrap();

        let mut manager = manager_over(&store, &clock);
        let (team, _) = manager.create_discussion("Team A", &owner).unwrap();
        (team.id, manager.invite(team.id, &owner, "xavier").unwrap())
    };

    let store = DiscussionSqlStore::open(&config).unwrap();
    let guest = store.resolve_username("xavier").unwrap().unwrap();
    let owner = store.resolve_username("olivia").unwrap().unwrap();
    let mut manager = manager_over(&store, &clock);

    let reloaded = manager.invitation_to_join(invitation.id, &guest).unwrap();
    assert_eq!(reloaded, invitation);

    clock.set(invitation.expires_at + Duration::microseconds(1));
    let result = manager.accept_invitation(
        invitation.id,
        &guest,
        &JoinRequest::for_invitation(&invitation),
    );
    assert!(matches!(result, Err(DiscussionError::Expired(_))));
    assert_eq!(
        manager.list_discussion_invitations(team_id, &owner).unwrap(),
        vec![invitation]
    );
}

#[test]
fn test_accepted_membership_persists() {
    let dir = TempDir::new().unwrap();
    let config = file_config(&dir);
    let clock = Arc::new(FixedClock::new(test_epoch()));

    let team_id = {
        let store = DiscussionSqlStore::open(&config).unwrap();
        let owner = store.register_user(&UserProfile::new("olivia")).unwrap().id;
        let guest = store.register_user(&UserProfile::new("xavier")).unwrap().id;
        let mut manager = manager_over(&store, &clock);

        let (team, _) = manager.create_discussion("Team A", &owner).unwrap();
        let invitation = manager.invite(team.id, &owner, "xavier").unwrap();
        let joined = manager
            .accept_invitation(invitation.id, &guest, &JoinRequest::for_invitation(&invitation))
            .unwrap();
        manager.set_editor(joined.id, &owner, true).unwrap();
        team.id
    };

    let store = DiscussionSqlStore::open(&config).unwrap();
    let owner = store.resolve_username("olivia").unwrap().unwrap();
    let manager = manager_over(&store, &clock);

    let mut roles: Vec<Role> = manager
        .list_members(team_id, &owner)
        .unwrap()
        .into_iter()
        .map(|m| m.role)
        .collect();
    roles.sort_by_key(|r| r.as_str());
    assert_eq!(roles, vec![Role::Editor, Role::Owner]);
}

#[test]
fn test_config_file_drives_store() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("discussion.toml");

    let mut config = Config::default();
    config.store = file_config(&dir);
    config.save_to_file(&path).unwrap();

    let loaded = Config::from_file(&path).unwrap();
    let store = DiscussionSqlStore::open(&loaded.store).unwrap();
    store.register_user(&UserProfile::new("olivia")).unwrap();

    assert!(dir.path().join("discussions.db").exists());
}
