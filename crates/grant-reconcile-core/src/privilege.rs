//! Privilege sets.
//!
//! Each grantable resource kind owns one immutable [`PrivilegeSet`] listing
//! the privilege tokens the remote system accepts for it.

use crate::error::{CoreError, Result};

/// `ALL` privilege token.
pub const PRIVILEGE_ALL: &str = "ALL";
/// `USAGE` privilege token.
pub const PRIVILEGE_USAGE: &str = "USAGE";
/// `OWNERSHIP` privilege token.
pub const PRIVILEGE_OWNERSHIP: &str = "OWNERSHIP";

/// Privileges grantable on an account-level integration.
pub const INTEGRATION_PRIVILEGES: PrivilegeSet = PrivilegeSet::new(
    "integration",
    &[PRIVILEGE_ALL, PRIVILEGE_USAGE, PRIVILEGE_OWNERSHIP],
    PRIVILEGE_USAGE,
);

/// The privileges legal for one resource kind.
///
/// Tokens are stored upper-case; lookups are case-insensitive.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PrivilegeSet {
    kind: &'static str,
    privileges: &'static [&'static str],
    default: &'static str,
}

impl PrivilegeSet {
    /// Create a privilege set. `default` should be one of `privileges`.
    pub const fn new(
        kind: &'static str,
        privileges: &'static [&'static str],
        default: &'static str,
    ) -> Self {
        Self {
            kind,
            privileges,
            default,
        }
    }

    /// The resource kind this set applies to.
    pub fn kind(&self) -> &'static str {
        self.kind
    }

    /// The privilege used when none is declared.
    pub fn default_privilege(&self) -> &'static str {
        self.default
    }

    /// All legal tokens, in declaration order.
    pub fn list(&self) -> &'static [&'static str] {
        self.privileges
    }

    /// Case-insensitive membership test.
    pub fn is_valid(&self, token: &str) -> bool {
        self.lookup(token).is_some()
    }

    /// Map a declared privilege to its canonical token.
    ///
    /// Blank input yields the default privilege.
    pub fn normalize(&self, token: &str) -> Result<&'static str> {
        let token = token.trim();
        if token.is_empty() {
            return Ok(self.default);
        }
        self.lookup(token).ok_or_else(|| CoreError::InvalidPrivilege {
            privilege: token.to_string(),
            allowed: self.privileges.join(", "),
        })
    }

    /// The privileges `ALL` stands for on this kind.
    ///
    /// `ALL` never includes `OWNERSHIP`.
    pub fn expand_all(&self) -> Vec<&'static str> {
        self.privileges
            .iter()
            .copied()
            .filter(|p| *p != PRIVILEGE_ALL && *p != PRIVILEGE_OWNERSHIP)
            .collect()
    }

    fn lookup(&self, token: &str) -> Option<&'static str> {
        self.privileges
            .iter()
            .copied()
            .find(|p| p.eq_ignore_ascii_case(token))
    }
}
