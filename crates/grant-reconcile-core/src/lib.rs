//! # Grant Reconcile Core
//!
//! Pure primitives for reconciling declared privilege grants against a
//! remote access-control system.
//!
//! This crate contains no I/O and no remote calls. It is pure computation
//! over grant identities and declared state.
//!
//! ## Key Types
//!
//! - [`GrantIdentity`] - The durable `(resource, privilege, grant option)` key
//! - [`PrivilegeSet`] - The privileges legal for one resource kind
//! - [`GrantSpec`] - Declared (desired) state of one grant
//! - [`GrantState`] - Declared state paired with its encoded identity
//!
//! ## Identity Encoding
//!
//! Identities are encoded with length-prefixed fields so that any resource
//! name round-trips. See the [`identity`] module.

pub mod error;
pub mod identity;
pub mod privilege;
pub mod spec;

pub use error::{CoreError, Result};
pub use identity::{GrantIdentity, IDENTITY_PREFIX};
pub use privilege::{
    PrivilegeSet, INTEGRATION_PRIVILEGES, PRIVILEGE_ALL, PRIVILEGE_OWNERSHIP, PRIVILEGE_USAGE,
};
pub use spec::{GrantSpec, GrantState};
