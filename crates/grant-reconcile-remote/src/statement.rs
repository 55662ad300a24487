//! Typed grant statements.
//!
//! A [`Statement`] is the unit of work sent to a [`RemoteExecutor`]. Its
//! `Display` impl renders the SQL text a production client would send:
//!
//! ```text
//! GRANT USAGE ON INTEGRATION "my_int" TO ROLE "ANALYST" WITH GRANT OPTION
//! REVOKE USAGE ON INTEGRATION "my_int" FROM ROLE "ANALYST"
//! SHOW GRANTS ON INTEGRATION "my_int"
//! ```
//!
//! [`RemoteExecutor`]: crate::RemoteExecutor

use std::fmt;

use serde::{Deserialize, Serialize};

use grant_reconcile_core::{PrivilegeSet, INTEGRATION_PRIVILEGES, PRIVILEGE_ALL};

/// Kind of object a grant applies to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ObjectKind {
    /// Account-level integration (storage, API, notification, security).
    Integration,
}

impl ObjectKind {
    /// Keyword used in SQL and in `granted_on` columns.
    pub fn keyword(&self) -> &'static str {
        match self {
            ObjectKind::Integration => "INTEGRATION",
        }
    }

    /// Privileges grantable on this kind.
    pub fn privileges(&self) -> &'static PrivilegeSet {
        match self {
            ObjectKind::Integration => &INTEGRATION_PRIVILEGES,
        }
    }
}

impl fmt::Display for ObjectKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.keyword())
    }
}

/// A statement against the remote access-control system.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum Statement {
    /// Grant a privilege on an object to a role.
    Grant {
        kind: ObjectKind,
        object: String,
        privilege: String,
        role: String,
        with_grant_option: bool,
    },

    /// Revoke a privilege on an object from a role.
    Revoke {
        kind: ObjectKind,
        object: String,
        privilege: String,
        role: String,
    },

    /// List every grant on an object.
    ShowGrants { kind: ObjectKind, object: String },
}

impl Statement {
    /// The object kind this statement targets.
    pub fn kind(&self) -> ObjectKind {
        match self {
            Statement::Grant { kind, .. }
            | Statement::Revoke { kind, .. }
            | Statement::ShowGrants { kind, .. } => *kind,
        }
    }

    /// The object name this statement targets.
    pub fn object(&self) -> &str {
        match self {
            Statement::Grant { object, .. }
            | Statement::Revoke { object, .. }
            | Statement::ShowGrants { object, .. } => object,
        }
    }

    /// Whether the statement returns grant rows.
    pub fn is_query(&self) -> bool {
        matches!(self, Statement::ShowGrants { .. })
    }
}

impl fmt::Display for Statement {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Statement::Grant {
                kind,
                object,
                privilege,
                role,
                with_grant_option,
            } => {
                write!(
                    f,
                    "GRANT {} ON {} {} TO ROLE {}",
                    privilege,
                    kind,
                    quote_identifier(object),
                    quote_identifier(role)
                )?;
                if *with_grant_option {
                    f.write_str(" WITH GRANT OPTION")?;
                }
                Ok(())
            }
            Statement::Revoke {
                kind,
                object,
                privilege,
                role,
            } => write!(
                f,
                "REVOKE {} ON {} {} FROM ROLE {}",
                privilege,
                kind,
                quote_identifier(object),
                quote_identifier(role)
            ),
            Statement::ShowGrants { kind, object } => {
                write!(f, "SHOW GRANTS ON {} {}", kind, quote_identifier(object))
            }
        }
    }
}

/// Double-quote an identifier, doubling embedded quotes.
pub fn quote_identifier(name: &str) -> String {
    format!("\"{}\"", name.replace('"', "\"\""))
}

/// Check a privilege against the object kind and expand `ALL`.
///
/// Returns the canonical tokens the remote system records, or `None` when
/// the privilege is not grantable on `kind`.
pub(crate) fn recorded_privileges(kind: ObjectKind, privilege: &str) -> Option<Vec<&'static str>> {
    if privilege.trim().is_empty() {
        return None;
    }
    let privileges = kind.privileges();
    let canonical = privileges.normalize(privilege).ok()?;
    if canonical == PRIVILEGE_ALL {
        Some(privileges.expand_all())
    } else {
        Some(vec![canonical])
    }
}

/// Builds statements for grants on one integration.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct IntegrationGrantBuilder {
    name: String,
}

impl IntegrationGrantBuilder {
    /// Create a builder for the named integration.
    pub fn new(name: impl Into<String>) -> Self {
        Self { name: name.into() }
    }

    /// The integration name.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// `GRANT <privilege> ON INTEGRATION <name> TO ROLE <role>`.
    pub fn grant(&self, role: &str, privilege: &str, with_grant_option: bool) -> Statement {
        Statement::Grant {
            kind: ObjectKind::Integration,
            object: self.name.clone(),
            privilege: privilege.to_string(),
            role: role.to_string(),
            with_grant_option,
        }
    }

    /// `REVOKE <privilege> ON INTEGRATION <name> FROM ROLE <role>`.
    pub fn revoke(&self, role: &str, privilege: &str) -> Statement {
        Statement::Revoke {
            kind: ObjectKind::Integration,
            object: self.name.clone(),
            privilege: privilege.to_string(),
            role: role.to_string(),
        }
    }

    /// `SHOW GRANTS ON INTEGRATION <name>`.
    pub fn show(&self) -> Statement {
        Statement::ShowGrants {
            kind: ObjectKind::Integration,
            object: self.name.clone(),
        }
    }
}
