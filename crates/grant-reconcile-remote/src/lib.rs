//! # Grant Reconcile Remote
//!
//! The remote side of grant reconciliation: typed grant statements and the
//! executors that run them.
//!
//! ## Overview
//!
//! The lifecycle controller never talks to the access-control system
//! directly. It builds [`Statement`]s with an [`IntegrationGrantBuilder`]
//! and hands them to a [`RemoteExecutor`]. A production client renders each
//! statement to SQL via `Display`; the executors in this crate interpret the
//! typed statement against a local grant catalog instead.
//!
//! ## Key Types
//!
//! - [`RemoteExecutor`] - The async trait for running statements
//! - [`MemoryRemote`] - In-memory account for tests and dry runs
//! - [`SqliteRemote`] - SQLite-backed grant catalog
//! - [`Statement`] - `GRANT`, `REVOKE` or `SHOW GRANTS`
//! - [`GrantRow`] - One row of `SHOW GRANTS` output
//!
//! ## Usage
//!
//! ```rust,no_run
//! use grant_reconcile_remote::{IntegrationGrantBuilder, MemoryRemote, RemoteExecutor};
//!
//! async fn example() {
//!     let remote = MemoryRemote::new();
//!     remote.create_integration("my_storage_int");
//!
//!     let builder = IntegrationGrantBuilder::new("my_storage_int");
//!     remote
//!         .execute(&builder.grant("ANALYST", "USAGE", false))
//!         .await
//!         .unwrap();
//!
//!     let rows = remote.query_grants(&builder.show()).await.unwrap();
//!     assert_eq!(rows.len(), 1);
//! }
//! ```
//!
//! ## Design Notes
//!
//! - **Missing objects**: statements against an integration that does not
//!   exist fail with [`RemoteError::ObjectNotFound`]
//! - **Idempotent revoke**: revoking a grant that is not present is a no-op
//! - **Ownership is exclusive**: granting `OWNERSHIP` moves it off any
//!   previous owner

pub mod error;
pub mod memory;
pub mod migration;
pub mod sqlite;
pub mod statement;
pub mod traits;

pub use error::{RemoteError, Result};
pub use memory::MemoryRemote;
pub use sqlite::SqliteRemote;
pub use statement::{quote_identifier, IntegrationGrantBuilder, ObjectKind, Statement};
pub use traits::{GrantRow, GranteeType, RemoteExecutor};
