//! In-memory implementation of the RemoteExecutor trait.
//!
//! This is primarily for testing. It has the same semantics as the SQLite
//! catalog but keeps everything in memory, and it records every statement
//! it receives so tests can assert on what was sent.

use std::collections::{BTreeMap, VecDeque};
use std::sync::{PoisonError, RwLock, RwLockReadGuard, RwLockWriteGuard};

use async_trait::async_trait;

use grant_reconcile_core::PRIVILEGE_OWNERSHIP;

use crate::error::{RemoteError, Result};
use crate::statement::{recorded_privileges, ObjectKind, Statement};
use crate::traits::{GrantRow, GranteeType, RemoteExecutor};

/// Role recorded as `granted_by` unless overridden.
pub const DEFAULT_GRANTOR: &str = "ACCOUNTADMIN";

/// In-memory remote account.
///
/// All data is lost when the value is dropped. Thread-safe via RwLock.
pub struct MemoryRemote {
    inner: RwLock<MemoryRemoteInner>,
}

struct MemoryRemoteInner {
    /// Grant rows indexed by integration name.
    integrations: BTreeMap<String, Vec<GrantRow>>,

    /// Every statement received, in order.
    statements: Vec<Statement>,

    /// Rejections to return for the next statements.
    injected_failures: VecDeque<String>,

    /// Role recorded as `granted_by`.
    grantor: String,
}

impl MemoryRemote {
    /// Create an empty account.
    pub fn new() -> Self {
        Self {
            inner: RwLock::new(MemoryRemoteInner {
                integrations: BTreeMap::new(),
                statements: Vec::new(),
                injected_failures: VecDeque::new(),
                grantor: DEFAULT_GRANTOR.to_string(),
            }),
        }
    }

    /// Set the role recorded as `granted_by` on new grants.
    pub fn with_grantor(self, grantor: impl Into<String>) -> Self {
        self.write().grantor = grantor.into();
        self
    }

    /// Create an integration. Existing integrations keep their grants.
    pub fn create_integration(&self, name: &str) {
        self.write().integrations.entry(name.to_string()).or_default();
    }

    /// Drop an integration and every grant on it.
    ///
    /// Returns false if it did not exist.
    pub fn drop_integration(&self, name: &str) -> bool {
        self.write().integrations.remove(name).is_some()
    }

    /// Grant a privilege to a share, bypassing statement execution.
    pub fn grant_to_share(&self, name: &str, share: &str, privilege: &str) -> Result<()> {
        let mut inner = self.write();
        let grantor = inner.grantor.clone();
        let rows = rows_mut(&mut inner.integrations, ObjectKind::Integration, name)?;
        rows.push(GrantRow {
            privilege: privilege.to_string(),
            granted_on: ObjectKind::Integration,
            name: name.to_string(),
            grantee_type: GranteeType::Share,
            grantee_name: share.to_string(),
            grant_option: false,
            granted_by: grantor,
        });
        Ok(())
    }

    /// Make the next statement fail with [`RemoteError::Rejected`].
    pub fn fail_next(&self, message: impl Into<String>) {
        self.write().injected_failures.push_back(message.into());
    }

    /// Every statement received so far.
    pub fn statements(&self) -> Vec<Statement> {
        self.read().statements.clone()
    }

    /// Forget the statement log.
    pub fn clear_statements(&self) {
        self.write().statements.clear();
    }

    fn read(&self) -> RwLockReadGuard<'_, MemoryRemoteInner> {
        self.inner.read().unwrap_or_else(PoisonError::into_inner)
    }

    fn write(&self) -> RwLockWriteGuard<'_, MemoryRemoteInner> {
        self.inner.write().unwrap_or_else(PoisonError::into_inner)
    }
}

impl Default for MemoryRemote {
    fn default() -> Self {
        Self::new()
    }
}

fn rows_mut<'a>(
    integrations: &'a mut BTreeMap<String, Vec<GrantRow>>,
    kind: ObjectKind,
    name: &str,
) -> Result<&'a mut Vec<GrantRow>> {
    integrations
        .get_mut(name)
        .ok_or_else(|| RemoteError::ObjectNotFound {
            kind: kind.keyword().to_string(),
            name: name.to_string(),
        })
}

fn invalid_privilege(kind: ObjectKind, privilege: &str) -> RemoteError {
    RemoteError::Rejected(format!("invalid privilege {} for {}", privilege, kind))
}

fn is_role_grant(row: &GrantRow, privilege: &str, role: &str) -> bool {
    row.privilege == privilege && row.grantee_type == GranteeType::Role && row.grantee_name == role
}

impl MemoryRemoteInner {
    /// Log the statement and pop an injected failure, if any.
    fn admit(&mut self, statement: &Statement) -> Result<()> {
        self.statements.push(statement.clone());
        match self.injected_failures.pop_front() {
            Some(message) => Err(RemoteError::Rejected(message)),
            None => Ok(()),
        }
    }
}

#[async_trait]
impl RemoteExecutor for MemoryRemote {
    async fn execute(&self, statement: &Statement) -> Result<()> {
        let mut inner = self.write();
        inner.admit(statement)?;
        let grantor = inner.grantor.clone();

        match statement {
            Statement::Grant {
                kind,
                object,
                privilege,
                role,
                with_grant_option,
            } => {
                let rows = rows_mut(&mut inner.integrations, *kind, object)?;
                let recorded = recorded_privileges(*kind, privilege)
                    .ok_or_else(|| invalid_privilege(*kind, privilege))?;

                for privilege in recorded {
                    if privilege == PRIVILEGE_OWNERSHIP {
                        rows.retain(|r| {
                            r.privilege != PRIVILEGE_OWNERSHIP || r.grantee_name == *role
                        });
                    }
                    match rows.iter().position(|r| is_role_grant(r, privilege, role)) {
                        Some(i) => rows[i].grant_option |= *with_grant_option,
                        None => rows.push(GrantRow {
                            privilege: privilege.to_string(),
                            granted_on: *kind,
                            name: object.clone(),
                            grantee_type: GranteeType::Role,
                            grantee_name: role.clone(),
                            grant_option: *with_grant_option,
                            granted_by: grantor.clone(),
                        }),
                    }
                }
                Ok(())
            }
            Statement::Revoke {
                kind,
                object,
                privilege,
                role,
            } => {
                let rows = rows_mut(&mut inner.integrations, *kind, object)?;
                let recorded = recorded_privileges(*kind, privilege)
                    .ok_or_else(|| invalid_privilege(*kind, privilege))?;

                rows.retain(|r| !recorded.iter().any(|p| is_role_grant(r, p, role)));
                Ok(())
            }
            Statement::ShowGrants { .. } => Err(RemoteError::Rejected(format!(
                "query statement passed to execute: {}",
                statement
            ))),
        }
    }

    async fn query_grants(&self, statement: &Statement) -> Result<Vec<GrantRow>> {
        let mut inner = self.write();
        inner.admit(statement)?;

        match statement {
            Statement::ShowGrants { kind, object } => {
                let mut rows = rows_mut(&mut inner.integrations, *kind, object)?.clone();
                rows.sort_by(|a, b| {
                    (&a.privilege, a.grantee_type, &a.grantee_name)
                        .cmp(&(&b.privilege, b.grantee_type, &b.grantee_name))
                });
                Ok(rows)
            }
            _ => Err(RemoteError::Rejected(format!(
                "non-query statement passed to query_grants: {}",
                statement
            ))),
        }
    }
}
