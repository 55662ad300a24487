//! RemoteExecutor trait: the abstract interface to the access-control system.
//!
//! This trait keeps the lifecycle controller independent of how statements
//! reach the remote system. Implementations include an in-memory account
//! and a SQLite-backed grant catalog.

use std::fmt;
use std::sync::Arc;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::error::Result;
use crate::statement::{ObjectKind, Statement};

/// Kind of principal receiving a grant.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum GranteeType {
    Role,
    Share,
}

impl GranteeType {
    /// Keyword as reported in `SHOW GRANTS` output.
    pub fn keyword(&self) -> &'static str {
        match self {
            GranteeType::Role => "ROLE",
            GranteeType::Share => "SHARE",
        }
    }

    /// Parse a `granted_to` keyword.
    pub fn from_keyword(keyword: &str) -> Option<Self> {
        match keyword {
            "ROLE" => Some(GranteeType::Role),
            "SHARE" => Some(GranteeType::Share),
            _ => None,
        }
    }
}

impl fmt::Display for GranteeType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.keyword())
    }
}

/// One row of `SHOW GRANTS ON <object>` output.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GrantRow {
    /// Privilege token as recorded by the remote system.
    pub privilege: String,
    /// Kind of object the grant is on.
    pub granted_on: ObjectKind,
    /// Object name.
    pub name: String,
    /// Kind of grantee.
    pub grantee_type: GranteeType,
    /// Grantee name.
    pub grantee_name: String,
    /// Whether the grantee may re-grant.
    pub grant_option: bool,
    /// Role that issued the grant.
    pub granted_by: String,
}

/// The RemoteExecutor trait: async interface for running grant statements.
///
/// Every call is one round trip. Implementations do not retry; retry and
/// timeout policy belong to the client behind the trait.
///
/// # Design Notes
///
/// - A statement against a missing object fails with
///   [`RemoteError::ObjectNotFound`](crate::RemoteError::ObjectNotFound).
/// - `REVOKE` of a privilege the grantee does not hold succeeds.
/// - `execute` rejects queries and `query_grants` rejects anything else.
#[async_trait]
pub trait RemoteExecutor: Send + Sync {
    /// Run a `GRANT` or `REVOKE` statement.
    async fn execute(&self, statement: &Statement) -> Result<()>;

    /// Run a `SHOW GRANTS` statement and return its rows.
    async fn query_grants(&self, statement: &Statement) -> Result<Vec<GrantRow>>;
}

#[async_trait]
impl<E: RemoteExecutor + ?Sized> RemoteExecutor for Arc<E> {
    async fn execute(&self, statement: &Statement) -> Result<()> {
        (**self).execute(statement).await
    }

    async fn query_grants(&self, statement: &Statement) -> Result<Vec<GrantRow>> {
        (**self).query_grants(statement).await
    }
}
