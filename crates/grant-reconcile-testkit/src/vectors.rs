//! Golden test vectors for the grant identity codec.
//!
//! Identities are persisted by the engine that drives the controller, so an
//! encoding change breaks every grant already recorded. These vectors pin
//! the current format and the legacy strings that must keep decoding.

use grant_reconcile_core::GrantIdentity;
use serde::{Deserialize, Serialize};

/// A golden identity vector.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct IdentityVector {
    /// Human-readable name for the vector.
    pub name: String,
    /// Integration name.
    pub resource_name: String,
    /// Privilege as stored in the identity.
    pub privilege: String,
    /// Whether the grant carries the grant option.
    pub grant_option: bool,
    /// Expected current encoding.
    pub encoded: String,
    /// Legacy encodings that must decode to the same tuple.
    #[serde(default)]
    pub legacy: Vec<String>,
}

impl IdentityVector {
    /// The identity this vector describes.
    pub fn identity(&self) -> GrantIdentity {
        GrantIdentity::new(&self.resource_name, &self.privilege, self.grant_option)
    }

    /// Check this vector against the codec.
    ///
    /// Returns the first mismatch found, described for a test failure.
    pub fn verify(&self) -> Result<(), String> {
        let identity = self.identity();

        let encoded = identity.encode();
        if encoded != self.encoded {
            return Err(format!("encoded as {:?}, expected {:?}", encoded, self.encoded));
        }

        let mut inputs = vec![&self.encoded];
        inputs.extend(self.legacy.iter());
        for input in inputs {
            match GrantIdentity::decode(input) {
                Ok(decoded) if decoded == identity => {}
                Ok(decoded) => {
                    return Err(format!("{:?} decoded to {:?}", input, decoded));
                }
                Err(e) => return Err(format!("{:?} failed to decode: {}", input, e)),
            }
        }

        Ok(())
    }
}

fn vector(
    name: &str,
    resource_name: &str,
    privilege: &str,
    grant_option: bool,
    encoded: &str,
    legacy: &[&str],
) -> IdentityVector {
    IdentityVector {
        name: name.to_string(),
        resource_name: resource_name.to_string(),
        privilege: privilege.to_string(),
        grant_option,
        encoded: encoded.to_string(),
        legacy: legacy.iter().map(|s| s.to_string()).collect(),
    }
}

/// Get all golden identity vectors.
pub fn all_vectors() -> Vec<IdentityVector> {
    vec![
        vector(
            "storage integration, usage",
            "my_storage_int",
            "USAGE",
            false,
            "grant.v1:14:my_storage_int,5:USAGE,false",
            &["my_storage_int|||USAGE", "my_storage_int|||USAGE|false"],
        ),
        vector(
            "storage integration, usage with grant option",
            "my_storage_int",
            "USAGE",
            true,
            "grant.v1:14:my_storage_int,5:USAGE,true",
            &["my_storage_int|||USAGE|true"],
        ),
        vector(
            "ownership on a name containing the legacy delimiter",
            "a|b",
            "OWNERSHIP",
            true,
            "grant.v1:3:a|b,9:OWNERSHIP,true",
            &["\"a|b\"|||OWNERSHIP|true"],
        ),
        vector(
            "all on a name containing v1 separators",
            "int,with:colons",
            "ALL",
            false,
            "grant.v1:15:int,with:colons,3:ALL,false",
            &["int,with:colons|||ALL|false"],
        ),
        vector(
            "quoted name with an embedded quote",
            "say \"hi\"",
            "USAGE",
            false,
            "grant.v1:8:say \"hi\",5:USAGE,false",
            &["\"say \"\"hi\"\"\"|||USAGE"],
        ),
        vector(
            "multibyte name, length counts bytes",
            "données",
            "USAGE",
            false,
            "grant.v1:8:données,5:USAGE,false",
            &[],
        ),
    ]
}

/// Verify all golden vectors.
///
/// Returns `(name, passed, detail)` for each vector. `detail` is the
/// mismatch on failure and the encoding on success.
pub fn verify_all_vectors() -> Vec<(String, bool, String)> {
    all_vectors()
        .iter()
        .map(|v| match v.verify() {
            Ok(()) => (v.name.clone(), true, v.encoded.clone()),
            Err(detail) => (v.name.clone(), false, detail),
        })
        .collect()
}

/// Load vectors from JSON, for fixtures shared with other implementations.
pub fn vectors_from_json(json: &str) -> serde_json::Result<Vec<IdentityVector>> {
    serde_json::from_str(json)
}

/// Serialize the built-in vectors to pretty JSON.
pub fn vectors_to_json() -> serde_json::Result<String> {
    serde_json::to_string_pretty(&all_vectors())
}
