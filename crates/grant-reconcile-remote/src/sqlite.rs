//! SQLite implementation of the RemoteExecutor trait.
//!
//! A local grant catalog with the same semantics as the remote system, used
//! for offline reconciliation and integration tests. It uses rusqlite with
//! bundled SQLite, wrapped in async via tokio::spawn_blocking.

use std::path::Path;
use std::sync::{Arc, Mutex, MutexGuard};

use async_trait::async_trait;
use rusqlite::{params, Connection, OptionalExtension};

use grant_reconcile_core::PRIVILEGE_OWNERSHIP;

use crate::error::{RemoteError, Result};
use crate::memory::DEFAULT_GRANTOR;
use crate::migration::{self, now_millis};
use crate::statement::{recorded_privileges, ObjectKind, Statement};
use crate::traits::{GrantRow, GranteeType, RemoteExecutor};

/// SQLite-backed grant catalog.
///
/// Thread-safe via internal Mutex. Statement execution runs on the blocking
/// pool so it never stalls the async runtime.
pub struct SqliteRemote {
    /// The SQLite connection, protected by a mutex.
    conn: Arc<Mutex<Connection>>,
    /// Role recorded as `granted_by`.
    grantor: String,
}

impl SqliteRemote {
    /// Open a catalog at the given path.
    ///
    /// Creates the file and runs migrations if it doesn't exist.
    pub fn open(path: impl AsRef<Path>) -> Result<Self> {
        let mut conn = Connection::open(path)?;
        migration::migrate(&mut conn)?;
        Ok(Self::from_connection(conn))
    }

    /// Open an in-memory catalog.
    ///
    /// Useful for testing.
    pub fn open_memory() -> Result<Self> {
        let mut conn = Connection::open_in_memory()?;
        migration::migrate(&mut conn)?;
        Ok(Self::from_connection(conn))
    }

    fn from_connection(conn: Connection) -> Self {
        Self {
            conn: Arc::new(Mutex::new(conn)),
            grantor: DEFAULT_GRANTOR.to_string(),
        }
    }

    /// Set the role recorded as `granted_by` on new grants.
    pub fn with_grantor(mut self, grantor: impl Into<String>) -> Self {
        self.grantor = grantor.into();
        self
    }

    /// Create an integration. Existing integrations keep their grants.
    pub fn create_integration(&self, name: &str) -> Result<()> {
        let conn = lock(&self.conn)?;
        conn.execute(
            "INSERT OR IGNORE INTO objects (kind, name, created_at) VALUES (?1, ?2, ?3)",
            params![ObjectKind::Integration.keyword(), name, now_millis()],
        )?;
        Ok(())
    }

    /// Drop an integration and every grant on it.
    ///
    /// Returns false if it did not exist.
    pub fn drop_integration(&self, name: &str) -> Result<bool> {
        let mut conn = lock(&self.conn)?;
        let kind = ObjectKind::Integration.keyword();

        let tx = conn.transaction()?;
        tx.execute(
            "DELETE FROM grants WHERE kind = ?1 AND object = ?2",
            params![kind, name],
        )?;
        let removed = tx.execute(
            "DELETE FROM objects WHERE kind = ?1 AND name = ?2",
            params![kind, name],
        )?;
        tx.commit()?;

        Ok(removed > 0)
    }

    /// Run a closure against the connection on the blocking pool.
    async fn run_blocking<F, T>(&self, f: F) -> Result<T>
    where
        F: FnOnce(&mut Connection) -> Result<T> + Send + 'static,
        T: Send + 'static,
    {
        let conn = Arc::clone(&self.conn);

        tokio::task::spawn_blocking(move || {
            let mut conn = lock(&conn)?;
            f(&mut conn)
        })
        .await
        .map_err(|e| RemoteError::Task(format!("spawn_blocking failed: {}", e)))?
    }
}

fn lock(conn: &Mutex<Connection>) -> Result<MutexGuard<'_, Connection>> {
    conn.lock()
        .map_err(|e| RemoteError::Task(format!("connection mutex poisoned: {}", e)))
}

/// Fail with `ObjectNotFound` unless the object exists.
fn ensure_object(conn: &Connection, kind: ObjectKind, name: &str) -> Result<()> {
    let exists: Option<i64> = conn
        .query_row(
            "SELECT 1 FROM objects WHERE kind = ?1 AND name = ?2",
            params![kind.keyword(), name],
            |row| row.get(0),
        )
        .optional()?;

    match exists {
        Some(_) => Ok(()),
        None => Err(RemoteError::ObjectNotFound {
            kind: kind.keyword().to_string(),
            name: name.to_string(),
        }),
    }
}

fn recorded_or_reject(kind: ObjectKind, privilege: &str) -> Result<Vec<&'static str>> {
    recorded_privileges(kind, privilege).ok_or_else(|| {
        RemoteError::Rejected(format!("invalid privilege {} for {}", privilege, kind))
    })
}

fn apply_grant(
    conn: &mut Connection,
    kind: ObjectKind,
    object: &str,
    privilege: &str,
    role: &str,
    with_grant_option: bool,
    grantor: &str,
) -> Result<()> {
    let tx = conn.transaction()?;
    ensure_object(&tx, kind, object)?;
    let recorded = recorded_or_reject(kind, privilege)?;

    for privilege in recorded {
        if privilege == PRIVILEGE_OWNERSHIP {
            tx.execute(
                "DELETE FROM grants
                 WHERE kind = ?1 AND object = ?2 AND privilege = ?3
                   AND NOT (grantee_type = 'ROLE' AND grantee_name = ?4)",
                params![kind.keyword(), object, privilege, role],
            )?;
        }

        tx.execute(
            "INSERT INTO grants (
                kind, object, privilege, grantee_type, grantee_name,
                grant_option, granted_by, created_at
            ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8)
            ON CONFLICT (kind, object, privilege, grantee_type, grantee_name)
            DO UPDATE SET grant_option = MAX(grant_option, excluded.grant_option)",
            params![
                kind.keyword(),
                object,
                privilege,
                GranteeType::Role.keyword(),
                role,
                with_grant_option,
                grantor,
                now_millis(),
            ],
        )?;
    }

    tx.commit()?;
    Ok(())
}

fn apply_revoke(
    conn: &mut Connection,
    kind: ObjectKind,
    object: &str,
    privilege: &str,
    role: &str,
) -> Result<()> {
    let tx = conn.transaction()?;
    ensure_object(&tx, kind, object)?;
    let recorded = recorded_or_reject(kind, privilege)?;

    for privilege in recorded {
        tx.execute(
            "DELETE FROM grants
             WHERE kind = ?1 AND object = ?2 AND privilege = ?3
               AND grantee_type = ?4 AND grantee_name = ?5",
            params![
                kind.keyword(),
                object,
                privilege,
                GranteeType::Role.keyword(),
                role
            ],
        )?;
    }

    tx.commit()?;
    Ok(())
}

fn show_grants(conn: &Connection, kind: ObjectKind, object: &str) -> Result<Vec<GrantRow>> {
    ensure_object(conn, kind, object)?;

    let mut stmt = conn.prepare(
        "SELECT privilege, grantee_type, grantee_name, grant_option, granted_by
         FROM grants WHERE kind = ?1 AND object = ?2
         ORDER BY privilege, grantee_type, grantee_name",
    )?;

    let raw = stmt
        .query_map(params![kind.keyword(), object], |row| {
            Ok((
                row.get::<_, String>(0)?,
                row.get::<_, String>(1)?,
                row.get::<_, String>(2)?,
                row.get::<_, bool>(3)?,
                row.get::<_, String>(4)?,
            ))
        })?
        .collect::<rusqlite::Result<Vec<_>>>()?;

    raw.into_iter()
        .map(
            |(privilege, grantee_type, grantee_name, grant_option, granted_by)| {
                let grantee_type = GranteeType::from_keyword(&grantee_type).ok_or_else(|| {
                    RemoteError::InvalidData(format!("unknown grantee type {:?}", grantee_type))
                })?;
                Ok(GrantRow {
                    privilege,
                    granted_on: kind,
                    name: object.to_string(),
                    grantee_type,
                    grantee_name,
                    grant_option,
                    granted_by,
                })
            },
        )
        .collect()
}

#[async_trait]
impl RemoteExecutor for SqliteRemote {
    async fn execute(&self, statement: &Statement) -> Result<()> {
        tracing::debug!(statement = %statement, "executing against sqlite catalog");

        let statement = statement.clone();
        let grantor = self.grantor.clone();

        self.run_blocking(move |conn| match statement {
            Statement::Grant {
                kind,
                object,
                privilege,
                role,
                with_grant_option,
            } => apply_grant(
                conn,
                kind,
                &object,
                &privilege,
                &role,
                with_grant_option,
                &grantor,
            ),
            Statement::Revoke {
                kind,
                object,
                privilege,
                role,
            } => apply_revoke(conn, kind, &object, &privilege, &role),
            query @ Statement::ShowGrants { .. } => Err(RemoteError::Rejected(format!(
                "query statement passed to execute: {}",
                query
            ))),
        })
        .await
    }

    async fn query_grants(&self, statement: &Statement) -> Result<Vec<GrantRow>> {
        tracing::debug!(statement = %statement, "querying sqlite catalog");

        let statement = statement.clone();

        self.run_blocking(move |conn| match statement {
            Statement::ShowGrants { kind, object } => show_grants(conn, kind, &object),
            other => Err(RemoteError::Rejected(format!(
                "non-query statement passed to query_grants: {}",
                other
            ))),
        })
        .await
    }
}
