//! Declared grant state.
//!
//! A [`GrantSpec`] is what the caller wants; a [`GrantState`] is what the
//! caller gets back after a create or read, with the encoded identity it
//! must persist.

use std::collections::BTreeSet;

use serde::{Deserialize, Serialize};

use crate::error::{CoreError, Result};
use crate::identity::GrantIdentity;
use crate::privilege::PrivilegeSet;

/// Desired state of one grant.
///
/// Roles are a set: order and duplicates in the input do not matter.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct GrantSpec {
    /// Object the privilege applies to.
    pub resource_name: String,

    /// Declared privilege. Empty means the resource kind's default.
    #[serde(default)]
    pub privilege: String,

    /// Roles receiving the privilege.
    #[serde(default)]
    pub roles: BTreeSet<String>,

    /// Whether grantees may re-grant the privilege.
    #[serde(default)]
    pub grant_option: bool,
}

impl GrantSpec {
    /// Create a spec for a resource with the default privilege and no roles.
    pub fn new(resource_name: impl Into<String>) -> Self {
        Self {
            resource_name: resource_name.into(),
            ..Self::default()
        }
    }

    /// Set the privilege.
    pub fn privilege(mut self, privilege: impl Into<String>) -> Self {
        self.privilege = privilege.into();
        self
    }

    /// Add a grantee role.
    pub fn role(mut self, role: impl Into<String>) -> Self {
        self.roles.insert(role.into());
        self
    }

    /// Add several grantee roles.
    pub fn roles<I, R>(mut self, roles: I) -> Self
    where
        I: IntoIterator<Item = R>,
        R: Into<String>,
    {
        self.roles.extend(roles.into_iter().map(Into::into));
        self
    }

    /// Allow grantees to re-grant the privilege.
    pub fn with_grant_option(mut self, grant_option: bool) -> Self {
        self.grant_option = grant_option;
        self
    }

    /// Validate against a privilege set and derive the grant identity.
    ///
    /// The identity carries the canonical privilege token, so `"usage"`
    /// and `""` both become `USAGE` for integrations.
    pub fn to_identity(&self, privileges: &PrivilegeSet) -> Result<GrantIdentity> {
        if self.resource_name.trim().is_empty() {
            return Err(CoreError::EmptyResourceName);
        }
        if self.roles.is_empty() {
            return Err(CoreError::EmptyRoleSet);
        }
        if self.roles.iter().any(|role| role.trim().is_empty()) {
            return Err(CoreError::EmptyRoleName);
        }
        let privilege = privileges.normalize(&self.privilege)?;
        Ok(GrantIdentity::new(
            self.resource_name.clone(),
            privilege,
            self.grant_option,
        ))
    }

    /// Project an identity and an observed role set onto declared fields.
    pub fn from_identity(identity: &GrantIdentity, roles: BTreeSet<String>) -> Self {
        Self {
            resource_name: identity.resource_name.clone(),
            privilege: identity.privilege.clone(),
            roles,
            grant_option: identity.grant_option,
        }
    }
}

/// Declared state of a reconciled grant, keyed by its encoded identity.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GrantState {
    /// Encoded [`GrantIdentity`]; the only value the caller persists.
    pub id: String,

    /// Declared fields as last reconciled.
    pub spec: GrantSpec,
}

impl GrantState {
    /// Build state from an identity and observed roles.
    pub fn new(identity: &GrantIdentity, roles: BTreeSet<String>) -> Self {
        Self {
            id: identity.encode(),
            spec: GrantSpec::from_identity(identity, roles),
        }
    }

    /// Decode the stored identity.
    pub fn identity(&self) -> Result<GrantIdentity> {
        GrantIdentity::decode(&self.id)
    }
}
