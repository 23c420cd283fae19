//! SQL-based storage implementation for discussions, memberships and invitations

use super::super::discussion::Discussion;
use super::super::errors::{DiscussionError, DiscussionResult, Record};
use super::super::invitation::Invitation;
use super::super::membership::{Membership, Role};
use super::super::types::{DiscussionId, InvitationId, MembershipId};
use crate::config::StoreConfig;
use crate::core_identity::{is_valid_username, IdentityError, UserDirectory, UserId, UserProfile};
use chrono::{DateTime, Utc};
use r2d2::Pool;
use r2d2_sqlite::SqliteConnectionManager;
use rusqlite::ffi::{SQLITE_CONSTRAINT_FOREIGNKEY, SQLITE_CONSTRAINT_UNIQUE};
use rusqlite::types::Type;
use rusqlite::{params, OptionalExtension, Params, Row};

/// SQL-based record store for the discussion core
#[derive(Clone)]
pub struct DiscussionSqlStore {
    pool: Pool<SqliteConnectionManager>,
}

impl std::fmt::Debug for DiscussionSqlStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("DiscussionSqlStore")
            .field("connections", &self.pool.state().connections)
            .finish()
    }
}

impl DiscussionSqlStore {
    /// Create a store over an existing pool, running migrations first
    pub fn new(pool: Pool<SqliteConnectionManager>) -> DiscussionResult<Self> {
        super::migrations::migrate(&pool)?;
        Ok(Self { pool })
    }

    /// Open the store described by `config`; no path means in-memory
    pub fn open(config: &StoreConfig) -> DiscussionResult<Self> {
        let Some(path) = &config.database_path else {
            return Self::memory();
        };

        let busy_timeout = config.busy_timeout;
        let manager = SqliteConnectionManager::file(path).with_init(move |c| {
            c.busy_timeout(busy_timeout)?;
            c.execute_batch("PRAGMA foreign_keys = ON;")
        });
        let pool = Pool::builder().max_size(config.pool_size).build(manager)?;

        tracing::debug!(path = %path.display(), pool_size = config.pool_size, "Opened discussion store");
        Self::new(pool)
    }

    /// Create a new in-memory store
    pub fn memory() -> DiscussionResult<Self> {
        let manager = SqliteConnectionManager::memory()
            .with_init(|c| c.execute_batch("PRAGMA foreign_keys = ON;"));
        // A second connection would open a second, empty database
        let pool = Pool::builder().max_size(1).build(manager)?;

        Self::new(pool)
    }

    fn query_all<T, P: Params>(
        &self,
        sql: &str,
        params: P,
        map: fn(&Row<'_>) -> rusqlite::Result<T>,
    ) -> DiscussionResult<Vec<T>> {
        let conn = self.pool.get()?;
        let mut stmt = conn.prepare(sql)?;
        let rows = stmt.query_map(params, map)?.collect::<Result<Vec<_>, _>>()?;
        Ok(rows)
    }

    fn query_opt<T, P: Params>(
        &self,
        sql: &str,
        params: P,
        map: fn(&Row<'_>) -> rusqlite::Result<T>,
    ) -> DiscussionResult<Option<T>> {
        let conn = self.pool.get()?;
        let found = conn.query_row(sql, params, map).optional()?;
        Ok(found)
    }

    // ===== Discussion Operations =====

    /// Insert a discussion together with its owner membership in one transaction
    pub fn insert_discussion_with_owner(
        &self,
        name: &str,
        owner: &UserId,
    ) -> DiscussionResult<(Discussion, Membership)> {
        let mut conn = self.pool.get()?;
        let tx = conn.transaction()?;

        tx.execute("INSERT INTO discussions (name) VALUES (?)", params![name])?;
        let discussion_id = DiscussionId(tx.last_insert_rowid());

        tx.execute(
            "INSERT INTO memberships (discussion_id, user_id, role) VALUES (?, ?, ?)",
            params![discussion_id.0, owner.as_str(), Role::Owner.as_str()],
        )
        .map_err(|e| membership_insert_error(e, discussion_id))?;
        let membership_id = MembershipId(tx.last_insert_rowid());

        tx.commit()?;

        Ok((
            Discussion {
                id: discussion_id,
                name: name.to_string(),
            },
            Membership {
                id: membership_id,
                discussion_id,
                user_id: owner.clone(),
                role: Role::Owner,
            },
        ))
    }

    pub fn get_discussion(&self, id: DiscussionId) -> DiscussionResult<Option<Discussion>> {
        self.query_opt(
            "SELECT id, name FROM discussions WHERE id = ?",
            params![id.0],
            discussion_from_row,
        )
    }

    /// Returns false when no such discussion exists
    pub fn rename_discussion(&self, id: DiscussionId, name: &str) -> DiscussionResult<bool> {
        let conn = self.pool.get()?;
        let rows = conn.execute(
            "UPDATE discussions SET name = ? WHERE id = ?",
            params![name, id.0],
        )?;
        Ok(rows > 0)
    }

    /// Delete a discussion (cascades to memberships and invitations)
    pub fn delete_discussion(&self, id: DiscussionId) -> DiscussionResult<bool> {
        let conn = self.pool.get()?;
        let rows = conn.execute("DELETE FROM discussions WHERE id = ?", params![id.0])?;
        Ok(rows > 0)
    }

    // ===== Membership Operations =====

    pub fn insert_membership(
        &self,
        discussion_id: DiscussionId,
        user_id: &UserId,
        role: Role,
    ) -> DiscussionResult<Membership> {
        let conn = self.pool.get()?;
        conn.execute(
            "INSERT INTO memberships (discussion_id, user_id, role) VALUES (?, ?, ?)",
            params![discussion_id.0, user_id.as_str(), role.as_str()],
        )
        .map_err(|e| membership_insert_error(e, discussion_id))?;

        Ok(Membership {
            id: MembershipId(conn.last_insert_rowid()),
            discussion_id,
            user_id: user_id.clone(),
            role,
        })
    }

    pub fn get_membership(&self, id: MembershipId) -> DiscussionResult<Option<Membership>> {
        self.query_opt(
            "SELECT id, discussion_id, user_id, role FROM memberships WHERE id = ?",
            params![id.0],
            membership_from_row,
        )
    }

    /// The unique membership of `user_id` in `discussion_id`, if any
    pub fn find_membership(
        &self,
        discussion_id: DiscussionId,
        user_id: &UserId,
    ) -> DiscussionResult<Option<Membership>> {
        self.query_opt(
            "SELECT id, discussion_id, user_id, role FROM memberships
             WHERE discussion_id = ? AND user_id = ?",
            params![discussion_id.0, user_id.as_str()],
            membership_from_row,
        )
    }

    pub fn list_memberships_for_user(&self, user_id: &UserId) -> DiscussionResult<Vec<Membership>> {
        self.query_all(
            "SELECT id, discussion_id, user_id, role FROM memberships
             WHERE user_id = ? ORDER BY id",
            params![user_id.as_str()],
            membership_from_row,
        )
    }

    pub fn list_memberships_for_discussion(
        &self,
        discussion_id: DiscussionId,
    ) -> DiscussionResult<Vec<Membership>> {
        self.query_all(
            "SELECT id, discussion_id, user_id, role FROM memberships
             WHERE discussion_id = ? ORDER BY id",
            params![discussion_id.0],
            membership_from_row,
        )
    }

    /// Overwrite a membership's role, returning the updated row
    pub fn set_membership_role(
        &self,
        id: MembershipId,
        role: Role,
    ) -> DiscussionResult<Option<Membership>> {
        let conn = self.pool.get()?;
        let rows = conn.execute(
            "UPDATE memberships SET role = ? WHERE id = ?",
            params![role.as_str(), id.0],
        )?;
        if rows == 0 {
            return Ok(None);
        }

        let updated = conn
            .query_row(
                "SELECT id, discussion_id, user_id, role FROM memberships WHERE id = ?",
                params![id.0],
                membership_from_row,
            )
            .optional()?;
        Ok(updated)
    }

    pub fn delete_membership(&self, id: MembershipId) -> DiscussionResult<bool> {
        let conn = self.pool.get()?;
        let rows = conn.execute("DELETE FROM memberships WHERE id = ?", params![id.0])?;
        Ok(rows > 0)
    }

    // ===== Invitation Operations =====

    pub fn insert_invitation(
        &self,
        discussion_id: DiscussionId,
        inviter_id: &UserId,
        invitee_id: &UserId,
        expires_at: DateTime<Utc>,
    ) -> DiscussionResult<Invitation> {
        let conn = self.pool.get()?;
        conn.execute(
            "INSERT INTO invitations (discussion_id, inviter_id, invitee_id, expires_at)
             VALUES (?, ?, ?, ?)",
            params![
                discussion_id.0,
                inviter_id.as_str(),
                invitee_id.as_str(),
                expires_at.timestamp_micros(),
            ],
        )
        .map_err(|e| match constraint_code(&e) {
            Some(code) if code == SQLITE_CONSTRAINT_UNIQUE => {
                DiscussionError::AlreadyInvited(discussion_id)
            }
            Some(code) if code == SQLITE_CONSTRAINT_FOREIGNKEY => {
                DiscussionError::NotFound(Record::Discussion(discussion_id))
            }
            _ => e.into(),
        })?;

        Ok(Invitation {
            id: InvitationId(conn.last_insert_rowid()),
            discussion_id,
            inviter_id: inviter_id.clone(),
            invitee_id: invitee_id.clone(),
            expires_at,
        })
    }

    pub fn get_invitation(&self, id: InvitationId) -> DiscussionResult<Option<Invitation>> {
        self.query_opt(
            "SELECT id, discussion_id, inviter_id, invitee_id, expires_at
             FROM invitations WHERE id = ?",
            params![id.0],
            invitation_from_row,
        )
    }

    /// Any row, expired or not, for this discussion and invitee
    pub fn find_invitation(
        &self,
        discussion_id: DiscussionId,
        invitee_id: &UserId,
    ) -> DiscussionResult<Option<Invitation>> {
        self.query_opt(
            "SELECT id, discussion_id, inviter_id, invitee_id, expires_at
             FROM invitations WHERE discussion_id = ? AND invitee_id = ?",
            params![discussion_id.0, invitee_id.as_str()],
            invitation_from_row,
        )
    }

    /// Invitations addressed to `invitee_id` whose deadline is after `now`
    pub fn list_invitations_for_invitee(
        &self,
        invitee_id: &UserId,
        now: DateTime<Utc>,
    ) -> DiscussionResult<Vec<Invitation>> {
        self.query_all(
            "SELECT id, discussion_id, inviter_id, invitee_id, expires_at
             FROM invitations WHERE invitee_id = ? AND expires_at > ?
             ORDER BY expires_at, id",
            params![invitee_id.as_str(), now.timestamp_micros()],
            invitation_from_row,
        )
    }

    pub fn list_invitations_for_discussion(
        &self,
        discussion_id: DiscussionId,
    ) -> DiscussionResult<Vec<Invitation>> {
        self.query_all(
            "SELECT id, discussion_id, inviter_id, invitee_id, expires_at
             FROM invitations WHERE discussion_id = ?
             ORDER BY expires_at, id",
            params![discussion_id.0],
            invitation_from_row,
        )
    }

    pub fn delete_invitation(&self, id: InvitationId) -> DiscussionResult<bool> {
        let conn = self.pool.get()?;
        let rows = conn.execute("DELETE FROM invitations WHERE id = ?", params![id.0])?;
        Ok(rows > 0)
    }

    /// Turn an invitation into a plain membership.
    ///
    /// The membership insert and the invitation delete share one transaction:
    /// if either fails, neither is applied and the invitation stays usable.
    pub fn convert_invitation(&self, invitation: &Invitation) -> DiscussionResult<Membership> {
        let mut conn = self.pool.get()?;
        let tx = conn.transaction()?;

        tx.execute(
            "INSERT INTO memberships (discussion_id, user_id, role) VALUES (?, ?, ?)",
            params![
                invitation.discussion_id.0,
                invitation.invitee_id.as_str(),
                Role::Member.as_str()
            ],
        )
        .map_err(|e| membership_insert_error(e, invitation.discussion_id))?;
        let membership_id = MembershipId(tx.last_insert_rowid());

        let deleted = tx.execute(
            "DELETE FROM invitations WHERE id = ?",
            params![invitation.id.0],
        )?;
        if deleted == 0 {
            // Consumed by a concurrent accept or revoked meanwhile; dropping tx rolls back
            return Err(DiscussionError::NotFound(Record::Invitation(invitation.id)));
        }

        tx.commit()?;

        Ok(Membership {
            id: membership_id,
            discussion_id: invitation.discussion_id,
            user_id: invitation.invitee_id.clone(),
            role: Role::Member,
        })
    }

    // ===== User Directory =====

    /// Register a user in the local directory
    pub fn register_user(&self, profile: &UserProfile) -> Result<UserProfile, IdentityError> {
        if !is_valid_username(&profile.username) {
            return Err(IdentityError::InvalidUsername(profile.username.clone()));
        }

        let conn = self.pool.get().map_err(|e| IdentityError::Lookup(e.to_string()))?;
        conn.execute(
            "INSERT INTO users (id, username, first_name, last_name) VALUES (?, ?, ?, ?)",
            params![
                profile.id.as_str(),
                &profile.username,
                &profile.first_name,
                &profile.last_name,
            ],
        )
        .map_err(|e| match constraint_code(&e) {
            Some(code) if code == SQLITE_CONSTRAINT_UNIQUE => {
                IdentityError::UsernameTaken(profile.username.clone())
            }
            _ => IdentityError::Lookup(e.to_string()),
        })?;

        Ok(profile.clone())
    }

    pub fn list_users(&self) -> Result<Vec<UserProfile>, IdentityError> {
        self.query_all(
            "SELECT id, username, first_name, last_name FROM users ORDER BY username",
            [],
            profile_from_row,
        )
        .map_err(|e| IdentityError::Lookup(e.to_string()))
    }
}

impl UserDirectory for DiscussionSqlStore {
    fn resolve_username(&self, username: &str) -> Result<Option<UserId>, IdentityError> {
        self.query_opt(
            "SELECT id FROM users WHERE username = ?",
            params![username],
            |row| Ok(UserId::new(row.get::<_, String>(0)?)),
        )
        .map_err(|e| IdentityError::Lookup(e.to_string()))
    }

    fn profile(&self, user_id: &UserId) -> Result<Option<UserProfile>, IdentityError> {
        self.query_opt(
            "SELECT id, username, first_name, last_name FROM users WHERE id = ?",
            params![user_id.as_str()],
            profile_from_row,
        )
        .map_err(|e| IdentityError::Lookup(e.to_string()))
    }
}

// ===== Row mapping =====

fn constraint_code(err: &rusqlite::Error) -> Option<i32> {
    match err {
        rusqlite::Error::SqliteFailure(e, _) if e.code == rusqlite::ErrorCode::ConstraintViolation => {
            Some(e.extended_code)
        }
        _ => None,
    }
}

fn membership_insert_error(err: rusqlite::Error, discussion_id: DiscussionId) -> DiscussionError {
    match constraint_code(&err) {
        Some(code) if code == SQLITE_CONSTRAINT_UNIQUE => {
            DiscussionError::DuplicateMembership(discussion_id)
        }
        Some(code) if code == SQLITE_CONSTRAINT_FOREIGNKEY => {
            DiscussionError::NotFound(Record::Discussion(discussion_id))
        }
        _ => err.into(),
    }
}

fn micros_to_utc(idx: usize, micros: i64) -> rusqlite::Result<DateTime<Utc>> {
    DateTime::from_timestamp_micros(micros).ok_or(rusqlite::Error::IntegralValueOutOfRange(idx, micros))
}

fn discussion_from_row(row: &Row<'_>) -> rusqlite::Result<Discussion> {
    Ok(Discussion {
        id: DiscussionId(row.get(0)?),
        name: row.get(1)?,
    })
}

fn membership_from_row(row: &Row<'_>) -> rusqlite::Result<Membership> {
    let role_str: String = row.get(3)?;
    let role = role_str
        .parse::<Role>()
        .map_err(|e| rusqlite::Error::FromSqlConversionFailure(3, Type::Text, e.into()))?;

    Ok(Membership {
        id: MembershipId(row.get(0)?),
        discussion_id: DiscussionId(row.get(1)?),
        user_id: UserId::new(row.get::<_, String>(2)?),
        role,
    })
}

fn invitation_from_row(row: &Row<'_>) -> rusqlite::Result<Invitation> {
    Ok(Invitation {
        id: InvitationId(row.get(0)?),
        discussion_id: DiscussionId(row.get(1)?),
        inviter_id: UserId::new(row.get::<_, String>(2)?),
        invitee_id: UserId::new(row.get::<_, String>(3)?),
        expires_at: micros_to_utc(4, row.get(4)?)?,
    })
}

fn profile_from_row(row: &Row<'_>) -> rusqlite::Result<UserProfile> {
    Ok(UserProfile {
        id: UserId::new(row.get::<_, String>(0)?),
        username: row.get(1)?,
        first_name: row.get(2)?,
        last_name: row.get(3)?,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{Duration, TimeZone};

    fn deadline() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2024, 4, 8, 12, 0, 0).unwrap() + Duration::microseconds(123)
    }

    fn store_with_discussion() -> (DiscussionSqlStore, Discussion, Membership) {
        let store = DiscussionSqlStore::memory().unwrap();
        let (discussion, owner) = store
            .insert_discussion_with_owner("Team A", &UserId::new("owner"))
            .unwrap();
        (store, discussion, owner)
    }

    #[test]
    fn test_create_discussion_with_owner() {
        let (store, discussion, owner) = store_with_discussion();

        assert_eq!(store.get_discussion(discussion.id).unwrap(), Some(discussion.clone()));
        let found = store
            .find_membership(discussion.id, &UserId::new("owner"))
            .unwrap()
            .unwrap();
        assert_eq!(found, owner);
        assert_eq!(found.role, Role::Owner);
    }

    #[test]
    fn test_duplicate_membership_rejected_by_store() {
        let (store, discussion, _) = store_with_discussion();

        let result = store.insert_membership(discussion.id, &UserId::new("owner"), Role::Member);
        assert!(matches!(result, Err(DiscussionError::DuplicateMembership(id)) if id == discussion.id));
        assert_eq!(store.list_memberships_for_discussion(discussion.id).unwrap().len(), 1);
    }

    #[test]
    fn test_membership_for_missing_discussion() {
        let store = DiscussionSqlStore::memory().unwrap();
        let result = store.insert_membership(DiscussionId(99), &UserId::new("x"), Role::Member);
        assert!(matches!(
            result,
            Err(DiscussionError::NotFound(Record::Discussion(DiscussionId(99))))
        ));
    }

    #[test]
    fn test_invitation_round_trip_keeps_microseconds() {
        let (store, discussion, _) = store_with_discussion();
        let invitation = store
            .insert_invitation(discussion.id, &UserId::new("owner"), &UserId::new("guest"), deadline())
            .unwrap();

        let loaded = store.get_invitation(invitation.id).unwrap().unwrap();
        assert_eq!(loaded, invitation);
        assert_eq!(loaded.expires_at, deadline());
    }

    #[test]
    fn test_second_invitation_for_pair_rejected() {
        let (store, discussion, _) = store_with_discussion();
        let owner = UserId::new("owner");
        let guest = UserId::new("guest");
        store.insert_invitation(discussion.id, &owner, &guest, deadline()).unwrap();

        let result = store.insert_invitation(discussion.id, &owner, &guest, deadline());
        assert!(matches!(result, Err(DiscussionError::AlreadyInvited(_))));
    }

    #[test]
    fn test_invitee_listing_filters_and_orders() {
        let store = DiscussionSqlStore::memory().unwrap();
        let owner = UserId::new("owner");
        let guest = UserId::new("guest");
        let (a, _) = store.insert_discussion_with_owner("A", &owner).unwrap();
        let (b, _) = store.insert_discussion_with_owner("B", &owner).unwrap();
        let (c, _) = store.insert_discussion_with_owner("C", &owner).unwrap();

        let now = deadline();
        store.insert_invitation(a.id, &owner, &guest, now + Duration::days(2)).unwrap();
        store.insert_invitation(b.id, &owner, &guest, now + Duration::days(1)).unwrap();
        store.insert_invitation(c.id, &owner, &guest, now).unwrap();

        let listed = store.list_invitations_for_invitee(&guest, now).unwrap();
        let ids: Vec<_> = listed.iter().map(|i| i.discussion_id).collect();
        assert_eq!(ids, vec![b.id, a.id]);
    }

    #[test]
    fn test_convert_invitation_is_atomic() {
        let (store, discussion, _) = store_with_discussion();
        let guest = UserId::new("guest");
        let invitation = store
            .insert_invitation(discussion.id, &UserId::new("owner"), &guest, deadline())
            .unwrap();

        // A membership appearing out of band makes the conversion fail
        store.insert_membership(discussion.id, &guest, Role::Member).unwrap();
        let result = store.convert_invitation(&invitation);
        assert!(matches!(result, Err(DiscussionError::DuplicateMembership(_))));
        assert!(store.get_invitation(invitation.id).unwrap().is_some());
    }

    #[test]
    fn test_convert_invitation_consumes_row() {
        let (store, discussion, _) = store_with_discussion();
        let guest = UserId::new("guest");
        let invitation = store
            .insert_invitation(discussion.id, &UserId::new("owner"), &guest, deadline())
            .unwrap();

        let membership = store.convert_invitation(&invitation).unwrap();
        assert_eq!(membership.role, Role::Member);
        assert_eq!(membership.user_id, guest);
        assert!(store.get_invitation(invitation.id).unwrap().is_none());

        // Replaying the same invitation finds nothing to consume
        let replay = store.convert_invitation(&invitation);
        assert!(replay.is_err());
        assert_eq!(store.list_memberships_for_discussion(discussion.id).unwrap().len(), 2);
    }

    #[test]
    fn test_cascade_delete_discussion() {
        let (store, discussion, owner) = store_with_discussion();
        let invitation = store
            .insert_invitation(discussion.id, &owner.user_id, &UserId::new("guest"), deadline())
            .unwrap();

        assert!(store.delete_discussion(discussion.id).unwrap());
        assert!(store.get_membership(owner.id).unwrap().is_none());
        assert!(store.get_invitation(invitation.id).unwrap().is_none());
        assert!(!store.delete_discussion(discussion.id).unwrap());
    }

    #[test]
    fn test_set_membership_role() {
        let (store, discussion, _) = store_with_discussion();
        let member = store
            .insert_membership(discussion.id, &UserId::new("x"), Role::Member)
            .unwrap();

        let updated = store.set_membership_role(member.id, Role::Editor).unwrap().unwrap();
        assert_eq!(updated.role, Role::Editor);
        assert_eq!(updated.user_id, member.user_id);
        assert!(store.set_membership_role(MembershipId(404), Role::Editor).unwrap().is_none());
    }

    #[test]
    fn test_user_directory() {
        let store = DiscussionSqlStore::memory().unwrap();
        let alice = store
            .register_user(&UserProfile::new("alice").with_name("Alice", "Liddell"))
            .unwrap();

        assert_eq!(store.resolve_username("alice").unwrap(), Some(alice.id.clone()));
        assert_eq!(store.resolve_username("bob").unwrap(), None);
        assert_eq!(store.profile(&alice.id).unwrap().unwrap().display_name(), "Liddell, Alice");

        let taken = store.register_user(&UserProfile::new("alice"));
        assert!(matches!(taken, Err(IdentityError::UsernameTaken(_))));
        assert_eq!(store.list_users().unwrap().len(), 1);
    }

    #[test]
    fn test_file_store_persists() {
        let dir = tempfile::tempdir().unwrap();
        let config = StoreConfig {
            database_path: Some(dir.path().join("discussions.db")),
            ..StoreConfig::default()
        };

        let discussion = {
            let store = DiscussionSqlStore::open(&config).unwrap();
            store
                .insert_discussion_with_owner("Persistent", &UserId::new("owner"))
                .unwrap()
                .0
        };

        let reopened = DiscussionSqlStore::open(&config).unwrap();
        assert_eq!(reopened.get_discussion(discussion.id).unwrap(), Some(discussion));
    }
}
