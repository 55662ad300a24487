//! Database schema migrations for the SQLite grant catalog.
//!
//! We use a simple versioned migration system. Each migration is a SQL string
//! that transforms the schema from version N to N+1.

use rusqlite::Connection;

use crate::error::{RemoteError, Result};

/// Current schema version.
pub const CURRENT_VERSION: u32 = 1;

/// Initialize or migrate the database schema.
///
/// This function is idempotent - it can be called multiple times safely.
pub fn migrate(conn: &mut Connection) -> Result<()> {
    conn.execute(
        "CREATE TABLE IF NOT EXISTS schema_migrations (
            version INTEGER PRIMARY KEY,
            applied_at INTEGER NOT NULL
        )",
        [],
    )?;

    let current: u32 = conn.query_row(
        "SELECT COALESCE(MAX(version), 0) FROM schema_migrations",
        [],
        |row| row.get(0),
    )?;

    if current > CURRENT_VERSION {
        return Err(RemoteError::Migration(format!(
            "database schema version {} is newer than supported version {}",
            current, CURRENT_VERSION
        )));
    }

    if current < CURRENT_VERSION {
        let tx = conn.transaction()?;

        for version in (current + 1)..=CURRENT_VERSION {
            apply_migration(&tx, version)?;

            tx.execute(
                "INSERT INTO schema_migrations (version, applied_at) VALUES (?1, ?2)",
                rusqlite::params![version, now_millis()],
            )?;
            tracing::debug!(version, "applied grant catalog migration");
        }

        tx.commit()?;
    }

    Ok(())
}

/// Apply a specific migration version.
fn apply_migration(conn: &Connection, version: u32) -> Result<()> {
    match version {
        1 => apply_v1(conn),
        _ => Err(RemoteError::Migration(format!(
            "unknown migration version: {}",
            version
        ))),
    }
}

/// Migration v1: Initial schema.
fn apply_v1(conn: &Connection) -> Result<()> {
    conn.execute_batch(
        r#"
        -- Objects that grants can be attached to
        CREATE TABLE objects (
            kind TEXT NOT NULL,               -- ObjectKind keyword, e.g. INTEGRATION
            name TEXT NOT NULL,
            created_at INTEGER NOT NULL,
            PRIMARY KEY (kind, name)
        );

        -- One row per (object, privilege, grantee)
        CREATE TABLE grants (
            kind TEXT NOT NULL,
            object TEXT NOT NULL,
            privilege TEXT NOT NULL,          -- canonical token; ALL is stored expanded
            grantee_type TEXT NOT NULL,       -- ROLE or SHARE
            grantee_name TEXT NOT NULL,
            grant_option INTEGER NOT NULL DEFAULT 0,
            granted_by TEXT NOT NULL,
            created_at INTEGER NOT NULL,

            PRIMARY KEY (kind, object, privilege, grantee_type, grantee_name)
        );

        CREATE INDEX idx_grants_grantee ON grants(grantee_type, grantee_name);
        "#,
    )?;

    Ok(())
}

/// Get current time in milliseconds.
pub(crate) fn now_millis() -> i64 {
    use std::time::{SystemTime, UNIX_EPOCH};
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_millis() as i64)
        .unwrap_or_default()
}
