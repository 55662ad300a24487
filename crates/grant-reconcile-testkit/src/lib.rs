//! # Grant Reconcile Testkit
//!
//! Testing utilities for grant reconciliation.
//!
//! ## Overview
//!
//! This crate provides:
//!
//! - **Golden vectors**: Identity strings with their expected decodings, in
//!   both the current and the legacy format
//! - **Generators**: Proptest strategies for identities and declared grants
//! - **Fixtures**: A controller wired to an in-memory remote with the
//!   integration already created
//!
//! ## Golden Vectors
//!
//! Golden vectors pin the identity encoding so stored identities keep
//! decoding across releases:
//!
//! ```rust
//! use grant_reconcile_testkit::vectors::{all_vectors, verify_all_vectors};
//!
//! for vector in all_vectors() {
//!     println!("{}: {}", vector.name, vector.encoded);
//! }
//! assert!(verify_all_vectors().iter().all(|(_, ok, _)| *ok));
//! ```
//!
//! ## Property Testing
//!
//! Use the generators with proptest:
//!
//! ```rust,ignore
//! use proptest::prelude::*;
//! use grant_reconcile_testkit::generators::identity;
//!
//! proptest! {
//!     #[test]
//!     fn identity_round_trips(id in identity()) {
//!         prop_assert_eq!(GrantIdentity::decode(&id.encode()).unwrap(), id);
//!     }
//! }
//! ```
//!
//! ## Fixtures
//!
//! ```rust,ignore
//! use grant_reconcile_testkit::fixtures::ControllerFixture;
//!
//! let fixture = ControllerFixture::new();
//! let state = fixture.controller.create(&fixture.spec().role("ANALYST")).await?;
//! ```

pub mod fixtures;
pub mod generators;
pub mod vectors;

pub use fixtures::ControllerFixture;
pub use vectors::{all_vectors, IdentityVector};
