//! Proptest strategies for property-based testing.

use proptest::prelude::*;

use grant_reconcile_core::{GrantIdentity, GrantSpec, INTEGRATION_PRIVILEGES};

/// Generate a resource name.
///
/// Mixes plain identifiers with names containing the characters both
/// identity formats treat as structure.
pub fn resource_name() -> impl Strategy<Value = String> {
    prop_oneof![
        "[a-z][a-z0-9_]{0,31}",
        "[a-zA-Z0-9_|,:\" ]{1,24}",
        "\\PC{1,16}",
    ]
}

/// Generate a role name.
pub fn role_name() -> impl Strategy<Value = String> {
    "[A-Z][A-Z0-9_]{0,15}"
}

/// Generate a privilege accepted on integrations, in any letter case.
pub fn privilege() -> impl Strategy<Value = String> {
    (
        prop::sample::select(INTEGRATION_PRIVILEGES.list()),
        any::<bool>(),
    )
        .prop_map(|(p, lower)| if lower { p.to_ascii_lowercase() } else { p.to_string() })
}

/// Generate a privilege token that is not legal on integrations.
pub fn invalid_privilege() -> impl Strategy<Value = String> {
    "[A-Za-z_ ]{1,16}".prop_filter("must not be a legal privilege", |p| {
        !p.trim().is_empty() && !INTEGRATION_PRIVILEGES.is_valid(p.trim())
    })
}

/// Generate an identity with a canonical privilege.
pub fn identity() -> impl Strategy<Value = GrantIdentity> {
    (
        resource_name(),
        prop::sample::select(INTEGRATION_PRIVILEGES.list()),
        any::<bool>(),
    )
        .prop_map(|(name, privilege, grant_option)| {
            GrantIdentity::new(name, privilege, grant_option)
        })
}

/// Generate a declared grant with a valid privilege and 1 to `max_roles` roles.
pub fn grant_spec(max_roles: usize) -> impl Strategy<Value = GrantSpec> {
    (
        "[a-z][a-z0-9_]{0,31}",
        privilege(),
        prop::collection::btree_set(role_name(), 1..=max_roles.max(1)),
        any::<bool>(),
    )
        .prop_map(|(name, privilege, roles, grant_option)| {
            GrantSpec::new(name)
                .privilege(privilege)
                .roles(roles)
                .with_grant_option(grant_option)
        })
}
