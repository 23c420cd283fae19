//! Database migrations for discussions, memberships and invitations
//!
//! Each migration is applied in its own transaction and recorded in the
//! `discussion_schema_version` table.

use chrono::Utc;
use r2d2::Pool;
use r2d2_sqlite::SqliteConnectionManager;
use rusqlite::{params, Connection, OptionalExtension};

/// Current schema version for core_discussion
pub const CURRENT_DISCUSSION_SCHEMA_VERSION: i32 = 1;

/// Migration descriptor
pub struct Migration {
    pub version: i32,
    pub description: &'static str,
    pub up_sql: &'static str,
    pub down_sql: Option<&'static str>,
}

/// All available migrations in order
pub fn get_migrations() -> Vec<Migration> {
    vec![Migration {
        version: 1,
        description: "Initial discussions, memberships and invitations schema",
        up_sql: r#"
            -- Known users (directory for invitee lookup)
            CREATE TABLE IF NOT EXISTS users (
                id TEXT PRIMARY KEY,                    -- UserId
                username TEXT NOT NULL UNIQUE,
                first_name TEXT NOT NULL DEFAULT '',
                last_name TEXT NOT NULL DEFAULT ''
            );

            -- Discussions (groups)
            CREATE TABLE IF NOT EXISTS discussions (
                id INTEGER PRIMARY KEY AUTOINCREMENT,
                name TEXT NOT NULL
            );

            -- Memberships (user in discussion with role)
            CREATE TABLE IF NOT EXISTS memberships (
                id INTEGER PRIMARY KEY AUTOINCREMENT,
                discussion_id INTEGER NOT NULL,
                user_id TEXT NOT NULL,                  -- UserId, identity lifecycle is external
                role TEXT NOT NULL CHECK(role IN ('Owner', 'Editor', 'Member')),
                UNIQUE (discussion_id, user_id),
                FOREIGN KEY (discussion_id) REFERENCES discussions(id) ON DELETE CASCADE
            );

            CREATE INDEX IF NOT EXISTS idx_memberships_user ON memberships(user_id);

            -- Invitations (one row per discussion/invitee, never updated)
            CREATE TABLE IF NOT EXISTS invitations (
                id INTEGER PRIMARY KEY AUTOINCREMENT,
                discussion_id INTEGER NOT NULL,
                inviter_id TEXT NOT NULL,
                invitee_id TEXT NOT NULL,
                expires_at INTEGER NOT NULL,            -- UTC microseconds since epoch
                UNIQUE (discussion_id, invitee_id),
                FOREIGN KEY (discussion_id) REFERENCES discussions(id) ON DELETE CASCADE
            );

            CREATE INDEX IF NOT EXISTS idx_invitations_invitee ON invitations(invitee_id, expires_at);
            CREATE INDEX IF NOT EXISTS idx_invitations_expires ON invitations(expires_at);
        "#,
        down_sql: Some(
            r#"
            DROP INDEX IF EXISTS idx_invitations_expires;
            DROP INDEX IF EXISTS idx_invitations_invitee;
            DROP TABLE IF EXISTS invitations;

            DROP INDEX IF EXISTS idx_memberships_user;
            DROP TABLE IF EXISTS memberships;

            DROP TABLE IF EXISTS discussions;
            DROP TABLE IF EXISTS users;
        "#,
        ),
    }]
}

fn ensure_version_table(conn: &Connection) -> Result<(), rusqlite::Error> {
    conn.execute(
        "CREATE TABLE IF NOT EXISTS discussion_schema_version (
            version INTEGER PRIMARY KEY,
            applied_at INTEGER NOT NULL
        )",
        [],
    )?;
    Ok(())
}

/// Get current schema version from database
pub fn get_current_version(conn: &Connection) -> Result<i32, rusqlite::Error> {
    ensure_version_table(conn)?;

    let version: Option<i32> = conn
        .query_row(
            "SELECT version FROM discussion_schema_version ORDER BY version DESC LIMIT 1",
            [],
            |row| row.get(0),
        )
        .optional()?;

    Ok(version.unwrap_or(0))
}

/// Run all pending migrations
pub fn migrate(pool: &Pool<SqliteConnectionManager>) -> Result<(), super::super::DiscussionError> {
    let mut conn = pool.get()?;
    let current_version = get_current_version(&conn)?;

    let pending: Vec<_> = get_migrations()
        .into_iter()
        .filter(|m| m.version > current_version)
        .collect();

    for migration in pending {
        let tx = conn.transaction()?;

        tx.execute_batch(migration.up_sql)?;
        tx.execute(
            "INSERT INTO discussion_schema_version (version, applied_at) VALUES (?, ?)",
            params![migration.version, Utc::now().timestamp_millis()],
        )?;

        tx.commit()?;

        tracing::info!(
            version = migration.version,
            description = migration.description,
            "Applied discussion schema migration"
        );
    }

    Ok(())
}

/// Undo one applied migration through its `down_sql`
pub fn rollback_migration(
    pool: &Pool<SqliteConnectionManager>,
    version: i32,
) -> Result<(), super::super::DiscussionError> {
    use super::super::DiscussionError;

    let migration = get_migrations()
        .into_iter()
        .find(|m| m.version == version)
        .ok_or_else(|| DiscussionError::Storage(format!("Migration version {} not found", version)))?;
    let down_sql = migration.down_sql.ok_or_else(|| {
        DiscussionError::Storage(format!("No rollback available for version {}", version))
    })?;

    let mut conn = pool.get()?;
    let tx = conn.transaction()?;

    tx.execute_batch(down_sql)?;
    tx.execute(
        "DELETE FROM discussion_schema_version WHERE version = ?",
        params![version],
    )?;
    tx.commit()?;

    tracing::info!(version, "Rolled back discussion schema migration");
    Ok(())
}

/// Get the latest migration version available
pub fn get_latest_version() -> i32 {
    get_migrations().iter().map(|m| m.version).max().unwrap_or(0)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn setup_test_pool() -> Pool<SqliteConnectionManager> {
        let manager = SqliteConnectionManager::memory()
            .with_init(|c| c.execute_batch("PRAGMA foreign_keys = ON;"));
        Pool::builder().max_size(1).build(manager).expect("Failed to create pool")
    }

    #[test]
    fn test_initial_migration() {
        let pool = setup_test_pool();
        migrate(&pool).expect("Migration failed");

        let conn = pool.get().unwrap();
        let tables: Vec<String> = conn
            .prepare("SELECT name FROM sqlite_master WHERE type='table' ORDER BY name")
            .unwrap()
            .query_map([], |row| row.get(0))
            .unwrap()
            .collect::<Result<_, _>>()
            .unwrap();

        for table in ["users", "discussions", "memberships", "invitations"] {
            assert!(tables.contains(&table.to_string()), "missing table {}", table);
        }
    }

    #[test]
    fn test_idempotent_migrations() {
        let pool = setup_test_pool();
        migrate(&pool).expect("First migration failed");
        migrate(&pool).expect("Second migration failed");

        let conn = pool.get().unwrap();
        assert_eq!(get_current_version(&conn).unwrap(), CURRENT_DISCUSSION_SCHEMA_VERSION);
        assert_eq!(get_latest_version(), CURRENT_DISCUSSION_SCHEMA_VERSION);
    }

    #[test]
    fn test_rollback_then_reapply() {
        let pool = setup_test_pool();
        migrate(&pool).unwrap();

        rollback_migration(&pool, 1).unwrap();
        {
            let conn = pool.get().unwrap();
            assert_eq!(get_current_version(&conn).unwrap(), 0);
            let left: i64 = conn
                .query_row(
                    "SELECT COUNT(*) FROM sqlite_master WHERE type='table' AND name='invitations'",
                    [],
                    |row| row.get(0),
                )
                .unwrap();
            assert_eq!(left, 0);
        }

        migrate(&pool).unwrap();
        let conn = pool.get().unwrap();
        assert_eq!(get_current_version(&conn).unwrap(), CURRENT_DISCUSSION_SCHEMA_VERSION);
    }

    #[test]
    fn test_rollback_unknown_version() {
        let pool = setup_test_pool();
        migrate(&pool).unwrap();

        let result = rollback_migration(&pool, 42);
        assert!(matches!(result, Err(crate::core_discussion::DiscussionError::Storage(_))));
    }

    #[test]
    fn test_membership_pair_is_unique() {
        let pool = setup_test_pool();
        migrate(&pool).unwrap();
        let conn = pool.get().unwrap();

        conn.execute("INSERT INTO discussions (id, name) VALUES (1, 'Team A')", [])
            .unwrap();
        conn.execute(
            "INSERT INTO memberships (discussion_id, user_id, role) VALUES (1, 'u1', 'Owner')",
            [],
        )
        .unwrap();

        let dup = conn.execute(
            "INSERT INTO memberships (discussion_id, user_id, role) VALUES (1, 'u1', 'Member')",
            [],
        );
        assert!(dup.is_err());
    }

    #[test]
    fn test_cascade_on_discussion_delete() {
        let pool = setup_test_pool();
        migrate(&pool).unwrap();
        let conn = pool.get().unwrap();

        conn.execute("INSERT INTO discussions (id, name) VALUES (1, 'Team A')", [])
            .unwrap();
        conn.execute(
            "INSERT INTO memberships (discussion_id, user_id, role) VALUES (1, 'u1', 'Owner')",
            [],
        )
        .unwrap();
        conn.execute(
            "INSERT INTO invitations (discussion_id, inviter_id, invitee_id, expires_at)
             VALUES (1, 'u1', 'u2', 0)",
            [],
        )
        .unwrap();

        conn.execute("DELETE FROM discussions WHERE id = 1", []).unwrap();

        let remaining: i64 = conn
            .query_row(
                "SELECT (SELECT COUNT(*) FROM memberships) + (SELECT COUNT(*) FROM invitations)",
                [],
                |row| row.get(0),
            )
            .unwrap();
        assert_eq!(remaining, 0);
    }
}
