//! Error types for the Grant Reconcile Core.

use thiserror::Error;

/// Errors raised before any remote call is made.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum CoreError {
    /// The identity string does not decode to a well-formed grant tuple.
    #[error("malformed grant identity {identity:?}: {reason}")]
    MalformedIdentity { identity: String, reason: String },

    /// The privilege is not legal for the resource kind.
    #[error("invalid privilege {privilege:?}: expected one of {allowed}")]
    InvalidPrivilege { privilege: String, allowed: String },

    /// The declared resource name is empty.
    #[error("resource name must not be empty")]
    EmptyResourceName,

    /// The declared grant names no roles.
    #[error("at least one role must be granted")]
    EmptyRoleSet,

    /// A declared grantee role name is empty.
    #[error("role names must not be empty")]
    EmptyRoleName,
}

impl CoreError {
    pub(crate) fn malformed(identity: &str, reason: impl Into<String>) -> Self {
        CoreError::MalformedIdentity {
            identity: identity.to_string(),
            reason: reason.into(),
        }
    }
}

/// Result type for core operations.
pub type Result<T> = std::result::Result<T, CoreError>;
