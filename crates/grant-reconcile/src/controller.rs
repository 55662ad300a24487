//! The lifecycle controller: create, read and delete for integration grants.
//!
//! Nothing here is cached between calls. Every read derives the grant's
//! state from the remote system and the decoded identity alone, so drift
//! made out of band is picked up on the next read.

use std::collections::{BTreeMap, BTreeSet};
use std::sync::Arc;

use tracing::{debug, info, warn};

use grant_reconcile_core::{
    GrantIdentity, GrantSpec, GrantState, PrivilegeSet, INTEGRATION_PRIVILEGES, PRIVILEGE_ALL,
};
use grant_reconcile_remote::{GrantRow, GranteeType, IntegrationGrantBuilder, RemoteExecutor};

use crate::config::ControllerConfig;
use crate::error::{ReconcileError, Result};

/// Result of reading a grant.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ReadOutcome {
    /// The grant exists; declared state reflects what the remote reports.
    Present(GrantState),
    /// The grant (or its integration) is gone. The caller should drop it
    /// from declared state.
    NotFound,
}

impl ReadOutcome {
    /// Whether the grant still exists.
    pub fn is_present(&self) -> bool {
        matches!(self, ReadOutcome::Present(_))
    }

    /// The observed state, if present.
    pub fn into_state(self) -> Option<GrantState> {
        match self {
            ReadOutcome::Present(state) => Some(state),
            ReadOutcome::NotFound => None,
        }
    }
}

/// Reconciles grants on account-level integrations.
///
/// Every field of a grant is fixed at creation. The controller has no
/// update: a changed resource name, privilege or grant option is a delete
/// of the old identity followed by a create.
///
/// Callers must not run two operations on the same identity concurrently.
pub struct IntegrationGrantController<E: RemoteExecutor> {
    /// Shared executor, owned by the caller.
    remote: Arc<E>,
    /// Configuration.
    config: ControllerConfig,
    /// Privileges legal on integrations.
    privileges: &'static PrivilegeSet,
}

impl<E: RemoteExecutor> IntegrationGrantController<E> {
    /// Create a controller over a shared executor.
    pub fn new(remote: Arc<E>, config: ControllerConfig) -> Self {
        Self {
            remote,
            config,
            privileges: &INTEGRATION_PRIVILEGES,
        }
    }

    /// Get the executor.
    pub fn remote(&self) -> &E {
        &self.remote
    }

    /// Get the configuration.
    pub fn config(&self) -> &ControllerConfig {
        &self.config
    }

    /// Privileges accepted by [`create`](Self::create).
    pub fn privileges(&self) -> &'static PrivilegeSet {
        self.privileges
    }

    /// Issue the declared grant and return its reconciled state.
    ///
    /// Validation happens before any statement is sent, and a grant must
    /// name at least one role. Grants are issued one role at a time; if one
    /// fails, grants already issued stay in place and the error is returned.
    ///
    /// With `read_after_create` set, the result comes from a read of the
    /// new identity. Grants and read are not atomic: if the read sees
    /// nothing, [`ReconcileError::VanishedAfterCreate`] is returned and the
    /// issued grants are left as they are.
    pub async fn create(&self, spec: &GrantSpec) -> Result<GrantState> {
        let identity = spec.to_identity(self.privileges)?;
        let builder = IntegrationGrantBuilder::new(&identity.resource_name);

        for role in &spec.roles {
            let statement = builder.grant(role, &identity.privilege, identity.grant_option);
            debug!(statement = %statement, "issuing grant");
            self.remote.execute(&statement).await?;
        }

        info!(
            integration = %identity.resource_name,
            privilege = %identity.privilege,
            grant_option = identity.grant_option,
            roles = spec.roles.len(),
            "granted integration privilege"
        );

        if !self.config.read_after_create {
            return Ok(GrantState::new(&identity, spec.roles.clone()));
        }

        let id = identity.encode();
        match self.read(&id).await? {
            ReadOutcome::Present(state) => Ok(state),
            ReadOutcome::NotFound => Err(ReconcileError::VanishedAfterCreate { identity: id }),
        }
    }

    /// Derive the current state of a grant from the remote system.
    ///
    /// An identity whose privilege is not legal on integrations is
    /// malformed and sends nothing.
    ///
    /// Resource name, privilege and grant option come from the identity;
    /// roles come from the remote grant rows. The returned state always
    /// carries the current identity encoding, so a legacy identity comes
    /// back upgraded.
    pub async fn read(&self, id: &str) -> Result<ReadOutcome> {
        let identity = GrantIdentity::decode_checked(id, self.privileges)?;
        let builder = IntegrationGrantBuilder::new(&identity.resource_name);

        let rows = match self.remote.query_grants(&builder.show()).await {
            Ok(rows) => rows,
            Err(e) if e.is_not_found() => {
                warn!(
                    integration = %identity.resource_name,
                    "integration no longer exists, grant removed"
                );
                return Ok(ReadOutcome::NotFound);
            }
            Err(e) => return Err(e.into()),
        };

        let roles = matching_roles(&rows, &identity, self.privileges);
        if roles.is_empty() {
            warn!(
                integration = %identity.resource_name,
                privilege = %identity.privilege,
                grant_option = identity.grant_option,
                "no matching grant found, grant removed"
            );
            return Ok(ReadOutcome::NotFound);
        }

        Ok(ReadOutcome::Present(GrantState::new(&identity, roles)))
    }

    /// Revoke the grant from every role in the declared state.
    ///
    /// Revoking a privilege a role no longer holds succeeds. A missing
    /// integration means every grant on it is gone too; that counts as
    /// success when `tolerate_missing_on_delete` is set.
    pub async fn delete(&self, state: &GrantState) -> Result<()> {
        let identity = GrantIdentity::decode_checked(&state.id, self.privileges)?;
        let builder = IntegrationGrantBuilder::new(&identity.resource_name);

        for role in &state.spec.roles {
            let statement = builder.revoke(role, &identity.privilege);
            debug!(statement = %statement, "issuing revoke");

            match self.remote.execute(&statement).await {
                Ok(()) => {}
                Err(e) if e.is_not_found() && self.config.tolerate_missing_on_delete => {
                    warn!(
                        integration = %identity.resource_name,
                        "integration already gone, nothing to revoke"
                    );
                    return Ok(());
                }
                Err(e) => return Err(e.into()),
            }
        }

        info!(
            integration = %identity.resource_name,
            privilege = %identity.privilege,
            roles = state.spec.roles.len(),
            "revoked integration privilege"
        );
        Ok(())
    }
}

/// Roles holding the identity's privilege with the identity's grant option.
///
/// Share grantees are ignored. For `ALL`, a role must hold every privilege
/// `ALL` expands to on this kind.
fn matching_roles(
    rows: &[GrantRow],
    identity: &GrantIdentity,
    privileges: &PrivilegeSet,
) -> BTreeSet<String> {
    let role_rows = rows
        .iter()
        .filter(|r| r.grantee_type == GranteeType::Role && r.grant_option == identity.grant_option);

    if !identity.privilege.eq_ignore_ascii_case(PRIVILEGE_ALL) {
        return role_rows
            .filter(|r| r.privilege.eq_ignore_ascii_case(&identity.privilege))
            .map(|r| r.grantee_name.clone())
            .collect();
    }

    let required = privileges.expand_all();
    let mut held: BTreeMap<&str, BTreeSet<String>> = BTreeMap::new();
    for row in role_rows {
        held.entry(row.grantee_name.as_str())
            .or_default()
            .insert(row.privilege.to_ascii_uppercase());
    }

    held.into_iter()
        .filter(|(_, privs)| {
            privs.contains(PRIVILEGE_ALL) || required.iter().all(|p| privs.contains(*p))
        })
        .map(|(role, _)| role.to_string())
        .collect()
}
