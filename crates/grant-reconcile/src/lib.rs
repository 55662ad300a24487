//! # Grant Reconcile
//!
//! Reconciles declared privilege grants on account-level integrations
//! against the live state of a remote access-control system.
//!
//! ## Overview
//!
//! A declarative-state engine drives one grant through three operations:
//!
//! - **Create**: issue the grant, build its identity, read it back
//! - **Read**: re-derive the grant from remote state, or report it gone
//! - **Delete**: revoke the grant
//!
//! The identity string returned by create is the only thing the engine
//! persists. Every later read and delete decodes it again.
//!
//! ## Key Concepts
//!
//! - **Identity**: `(resource name, privilege, grant option)`, immutable.
//!   Changing any part means delete then create.
//! - **Drift**: grants changed outside the engine. Read reports what the
//!   remote system has, and [`ReadOutcome::NotFound`] when nothing matches.
//! - **No transactions**: create's grant and read-back are separate round
//!   trips. A failure between them surfaces as an error with the grants
//!   left in place.
//!
//! ## Usage
//!
//! ```rust,no_run
//! use std::sync::Arc;
//!
//! use grant_reconcile::{ControllerConfig, GrantSpec, IntegrationGrantController, ReadOutcome};
//! use grant_reconcile::remote::MemoryRemote;
//!
//! async fn example() {
//!     let remote = Arc::new(MemoryRemote::new());
//!     remote.create_integration("my_storage_int");
//!
//!     let controller = IntegrationGrantController::new(remote, ControllerConfig::default());
//!
//!     let spec = GrantSpec::new("my_storage_int").role("ANALYST");
//!     let state = controller.create(&spec).await.unwrap();
//!
//!     match controller.read(&state.id).await.unwrap() {
//!         ReadOutcome::Present(state) => println!("roles: {:?}", state.spec.roles),
//!         ReadOutcome::NotFound => println!("grant removed out of band"),
//!     }
//!
//!     controller.delete(&state).await.unwrap();
//! }
//! ```
//!
//! ## Re-exports
//!
//! - `grant_reconcile::core` - Identity codec, privilege sets, declared state
//! - `grant_reconcile::remote` - Statement builder and executors

pub mod config;
pub mod controller;
pub mod error;

pub use grant_reconcile_core as core;
pub use grant_reconcile_remote as remote;

pub use config::ControllerConfig;
pub use controller::{IntegrationGrantController, ReadOutcome};
pub use error::{ReconcileError, Result};

pub use grant_reconcile_core::{
    GrantIdentity, GrantSpec, GrantState, PrivilegeSet, INTEGRATION_PRIVILEGES,
};
pub use grant_reconcile_remote::{RemoteError, RemoteExecutor};
