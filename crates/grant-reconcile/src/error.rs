//! Error types for the lifecycle controller.

use grant_reconcile_core::CoreError;
use grant_reconcile_remote::RemoteError;
use thiserror::Error;

/// Errors that can occur during create, read or delete.
///
/// A grant that has disappeared remotely is not an error; see
/// [`ReadOutcome::NotFound`](crate::ReadOutcome::NotFound).
#[derive(Debug, Error)]
pub enum ReconcileError {
    /// The identity string does not decode to a grant tuple.
    #[error("malformed grant identity {identity:?}: {reason}")]
    MalformedIdentity { identity: String, reason: String },

    /// The declared privilege is not legal for the resource kind.
    #[error("invalid privilege {privilege:?}: expected one of {allowed}")]
    InvalidPrivilege { privilege: String, allowed: String },

    /// The declared resource name is empty.
    #[error("resource name must not be empty")]
    EmptyResourceName,

    /// The declared grant names no roles.
    #[error("at least one role must be granted")]
    EmptyRoleSet,

    /// A declared role name is empty.
    #[error("role names must not be empty")]
    EmptyRoleName,

    /// The remote system rejected or failed a statement.
    #[error("remote grant error: {0}")]
    Remote(#[from] RemoteError),

    /// Grants were issued but the read-back did not see them.
    ///
    /// The grants may still exist remotely; nothing was rolled back.
    #[error("grant {identity} was issued but is not visible on the remote system")]
    VanishedAfterCreate { identity: String },
}

impl From<CoreError> for ReconcileError {
    fn from(e: CoreError) -> Self {
        match e {
            CoreError::MalformedIdentity { identity, reason } => {
                ReconcileError::MalformedIdentity { identity, reason }
            }
            CoreError::InvalidPrivilege { privilege, allowed } => {
                ReconcileError::InvalidPrivilege { privilege, allowed }
            }
            CoreError::EmptyResourceName => ReconcileError::EmptyResourceName,
            CoreError::EmptyRoleSet => ReconcileError::EmptyRoleSet,
            CoreError::EmptyRoleName => ReconcileError::EmptyRoleName,
        }
    }
}

/// Result type for lifecycle operations.
pub type Result<T> = std::result::Result<T, ReconcileError>;
