//! Grant identity encoding.
//!
//! A [`GrantIdentity`] is the durable key of one reconciled grant. It is
//! handed to the caller as an opaque string and decoded again on every
//! read and delete, so the encoding must be unambiguous for any resource
//! name and stable across versions.
//!
//! Current format (v1):
//!
//! ```text
//! grant.v1:<len>:<resource_name>,<len>:<privilege>,<true|false>
//! ```
//!
//! `<len>` is the byte length of the field that follows it, so resource
//! names may contain any character, including `,`, `:` and `|`.
//!
//! Identities written by earlier releases are `|`-separated CSV records
//! (`resource|schema|object|privilege[|grant_option]`). They are still
//! accepted by [`GrantIdentity::decode`].

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::{CoreError, Result};
use crate::privilege::PrivilegeSet;

/// Prefix marking a v1 encoded identity.
pub const IDENTITY_PREFIX: &str = "grant.v1:";

/// Field separator of the legacy CSV encoding.
const LEGACY_DELIMITER: char = '|';

/// The `(resource name, privilege, grant option)` tuple of one grant.
///
/// Two grants with the same tuple are the same logical grant. Every field
/// is fixed at creation; changing any of them means destroying the grant
/// and creating a new one.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct GrantIdentity {
    /// Name of the object the privilege applies to.
    pub resource_name: String,

    /// Privilege token, e.g. `USAGE`.
    pub privilege: String,

    /// Whether grantees may re-grant the privilege.
    pub grant_option: bool,
}

impl GrantIdentity {
    /// Create a new identity.
    pub fn new(
        resource_name: impl Into<String>,
        privilege: impl Into<String>,
        grant_option: bool,
    ) -> Self {
        Self {
            resource_name: resource_name.into(),
            privilege: privilege.into(),
            grant_option,
        }
    }

    /// Encode to the current (v1) string format.
    pub fn encode(&self) -> String {
        format!(
            "{}{}:{},{}:{},{}",
            IDENTITY_PREFIX,
            self.resource_name.len(),
            self.resource_name,
            self.privilege.len(),
            self.privilege,
            self.grant_option
        )
    }

    /// Decode an identity string in either the v1 or the legacy format.
    pub fn decode(identity: &str) -> Result<Self> {
        let decoded = match identity.strip_prefix(IDENTITY_PREFIX) {
            // A legacy resource name may itself start with the v1 prefix.
            Some(body) => match decode_v1(identity, body) {
                Ok(decoded) => decoded,
                Err(e) if identity.contains(LEGACY_DELIMITER) => {
                    decode_legacy(identity).map_err(|_| e)?
                }
                Err(e) => return Err(e),
            },
            None => decode_legacy(identity)?,
        };

        if decoded.resource_name.is_empty() {
            return Err(CoreError::malformed(identity, "empty resource name"));
        }
        if decoded.privilege.is_empty() {
            return Err(CoreError::malformed(identity, "empty privilege"));
        }

        Ok(decoded)
    }

    /// Decode an identity and check its privilege against a privilege set.
    ///
    /// The privilege comes back in canonical form, so a legacy identity
    /// stored as `usage` decodes to `USAGE`. A privilege the set does not
    /// contain makes the identity malformed.
    pub fn decode_checked(identity: &str, privileges: &PrivilegeSet) -> Result<Self> {
        let mut decoded = Self::decode(identity)?;
        let canonical = privileges.normalize(&decoded.privilege).map_err(|_| {
            CoreError::malformed(
                identity,
                format!(
                    "privilege {:?} is not valid on {}",
                    decoded.privilege,
                    privileges.kind()
                ),
            )
        })?;
        decoded.privilege = canonical.to_string();
        Ok(decoded)
    }

    /// Check whether an identity string uses the legacy CSV format.
    ///
    /// Callers that persist identities can use this to re-store the v1
    /// encoding after a successful read.
    pub fn is_legacy_encoding(identity: &str) -> bool {
        !identity.starts_with(IDENTITY_PREFIX)
    }
}

impl fmt::Display for GrantIdentity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.encode())
    }
}

impl FromStr for GrantIdentity {
    type Err = CoreError;

    fn from_str(s: &str) -> Result<Self> {
        Self::decode(s)
    }
}

/// Decode the body of a v1 identity (everything after the prefix).
fn decode_v1(identity: &str, body: &str) -> Result<GrantIdentity> {
    let mut cursor = FieldCursor {
        identity,
        rest: body,
    };

    let resource_name = cursor.length_prefixed()?;
    cursor.separator()?;
    let privilege = cursor.length_prefixed()?;
    cursor.separator()?;
    let grant_option = parse_grant_option(identity, cursor.rest)?;

    Ok(GrantIdentity {
        resource_name: resource_name.to_string(),
        privilege: privilege.to_string(),
        grant_option,
    })
}

/// Reads `<len>:<value>` fields off the front of a v1 body.
struct FieldCursor<'a> {
    identity: &'a str,
    rest: &'a str,
}

impl<'a> FieldCursor<'a> {
    fn length_prefixed(&mut self) -> Result<&'a str> {
        let colon = self
            .rest
            .find(':')
            .ok_or_else(|| CoreError::malformed(self.identity, "missing length prefix"))?;

        let digits = &self.rest[..colon];
        if digits.is_empty() || !digits.bytes().all(|b| b.is_ascii_digit()) {
            return Err(CoreError::malformed(
                self.identity,
                format!("invalid length prefix {:?}", digits),
            ));
        }
        let len: usize = digits
            .parse()
            .map_err(|_| CoreError::malformed(self.identity, "length prefix out of range"))?;

        let after = &self.rest[colon + 1..];
        if after.len() < len || !after.is_char_boundary(len) {
            return Err(CoreError::malformed(
                self.identity,
                format!("field shorter than its length prefix {}", len),
            ));
        }

        let (value, rest) = after.split_at(len);
        self.rest = rest;
        Ok(value)
    }

    fn separator(&mut self) -> Result<()> {
        match self.rest.strip_prefix(',') {
            Some(rest) => {
                self.rest = rest;
                Ok(())
            }
            None => Err(CoreError::malformed(self.identity, "expected ',' between fields")),
        }
    }
}

/// Decode a legacy `resource|schema|object|privilege[|grant_option]` record.
fn decode_legacy(identity: &str) -> Result<GrantIdentity> {
    let fields = split_legacy_record(identity)?;

    if fields.len() != 4 && fields.len() != 5 {
        return Err(CoreError::malformed(
            identity,
            format!("expected 4 or 5 fields, got {}", fields.len()),
        ));
    }

    // Integrations are account-level: schema and object must be blank.
    if !fields[1].is_empty() || !fields[2].is_empty() {
        return Err(CoreError::malformed(
            identity,
            "schema and object fields must be empty for an account-level grant",
        ));
    }

    let grant_option = match fields.get(4) {
        Some(token) => parse_grant_option(identity, token)?,
        None => false,
    };

    let mut fields = fields.into_iter();
    let resource_name = fields.next().unwrap_or_default();
    let privilege = fields.nth(2).unwrap_or_default();

    Ok(GrantIdentity {
        resource_name,
        privilege,
        grant_option,
    })
}

/// Split one CSV record using `|` as the separator.
///
/// Quoted fields may contain the separator; `""` inside quotes is a literal
/// quote. A bare quote inside an unquoted field is rejected.
fn split_legacy_record(identity: &str) -> Result<Vec<String>> {
    let mut fields = Vec::new();
    let mut field = String::new();
    let mut quoted = false;
    let mut at_field_start = true;
    let mut chars = identity.chars().peekable();

    while let Some(c) = chars.next() {
        if quoted {
            if c != '"' {
                field.push(c);
            } else if chars.peek() == Some(&'"') {
                chars.next();
                field.push('"');
            } else {
                quoted = false;
                match chars.peek() {
                    None | Some(&LEGACY_DELIMITER) => {}
                    Some(_) => {
                        return Err(CoreError::malformed(
                            identity,
                            "unexpected character after closing quote",
                        ))
                    }
                }
            }
            continue;
        }

        match c {
            LEGACY_DELIMITER => {
                fields.push(std::mem::take(&mut field));
                at_field_start = true;
                continue;
            }
            '"' if at_field_start => quoted = true,
            '"' => return Err(CoreError::malformed(identity, "bare quote in unquoted field")),
            '\n' | '\r' => return Err(CoreError::malformed(identity, "expected a single record")),
            _ => field.push(c),
        }
        at_field_start = false;
    }

    if quoted {
        return Err(CoreError::malformed(identity, "unterminated quoted field"));
    }

    fields.push(field);
    Ok(fields)
}

fn parse_grant_option(identity: &str, token: &str) -> Result<bool> {
    match token {
        "true" => Ok(true),
        "false" => Ok(false),
        other => Err(CoreError::malformed(
            identity,
            format!("grant option {:?} is not a boolean", other),
        )),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::privilege::INTEGRATION_PRIVILEGES;
    use proptest::prelude::*;

    fn assert_malformed(identity: &str) {
        match GrantIdentity::decode(identity) {
            Err(CoreError::MalformedIdentity { .. }) => {}
            other => panic!("expected MalformedIdentity for {:?}, got {:?}", identity, other),
        }
    }

    #[test]
    fn test_encode_format() {
        let id = GrantIdentity::new("my_storage_int", "USAGE", false);
        assert_eq!(id.encode(), "grant.v1:14:my_storage_int,5:USAGE,false");
    }

    #[test]
    fn test_roundtrip_with_delimiters_in_name() {
        let id = GrantIdentity::new("weird|name,with:\"stuff\"", "OWNERSHIP", true);
        let decoded = GrantIdentity::decode(&id.encode()).unwrap();
        assert_eq!(decoded, id);
    }

    #[test]
    fn test_roundtrip_multibyte_name() {
        let id = GrantIdentity::new("intégration_ü", "ALL", false);
        assert_eq!(id.to_string().parse::<GrantIdentity>().unwrap(), id);
    }

    #[test]
    fn test_decode_rejects_non_boolean_grant_option() {
        assert_malformed("grant.v1:3:foo,5:USAGE,yes");
        assert_malformed("grant.v1:3:foo,5:USAGE,");
        assert_malformed("foo|||USAGE|maybe");
    }

    #[test]
    fn test_decode_rejects_wrong_field_count() {
        assert_malformed("grant.v1:3:foo,false");
        assert_malformed("grant.v1:3:foo,5:USAGE");
        assert_malformed("foo|USAGE");
        assert_malformed("foo|||USAGE|false|extra");
        assert_malformed("");
    }

    #[test]
    fn test_decode_rejects_bad_length_prefix() {
        assert_malformed("grant.v1:99:foo,5:USAGE,false");
        assert_malformed("grant.v1:x:foo,5:USAGE,false");
        assert_malformed("grant.v1::foo,5:USAGE,false");
        assert_malformed("grant.v1:2:foo,5:USAGE,false");
    }

    #[test]
    fn test_decode_rejects_split_multibyte_char() {
        // "é" is two bytes; a length of 1 lands inside it.
        assert_malformed("grant.v1:1:é,5:USAGE,false");
    }

    #[test]
    fn test_decode_rejects_empty_fields() {
        assert_malformed("grant.v1:0:,5:USAGE,false");
        assert_malformed("grant.v1:3:foo,0:,false");
        assert_malformed("|||USAGE|false");
    }

    #[test]
    fn test_decode_legacy_five_fields() {
        let id = GrantIdentity::decode("my_storage_int|||USAGE|true").unwrap();
        assert_eq!(id, GrantIdentity::new("my_storage_int", "USAGE", true));
        assert!(GrantIdentity::is_legacy_encoding("my_storage_int|||USAGE|true"));
    }

    #[test]
    fn test_decode_legacy_four_fields_defaults_grant_option() {
        let id = GrantIdentity::decode("my_storage_int|||OWNERSHIP").unwrap();
        assert_eq!(id, GrantIdentity::new("my_storage_int", "OWNERSHIP", false));
    }

    #[test]
    fn test_decode_legacy_quoted_name() {
        let id = GrantIdentity::decode("\"a|b \"\"c\"\"\"|||USAGE|false").unwrap();
        assert_eq!(id.resource_name, "a|b \"c\"");
    }

    #[test]
    fn test_decode_legacy_rejects_schema_scoped() {
        assert_malformed("db|schema||USAGE|false");
        assert_malformed("db||table|USAGE|false");
    }

    #[test]
    fn test_decode_legacy_rejects_bad_quoting() {
        assert_malformed("a\"b|||USAGE|false");
        assert_malformed("\"unterminated|||USAGE|false");
        assert_malformed("\"a\"x|||USAGE|false");
        assert_malformed("a|||USAGE|false\nb|||USAGE|false");
    }

    #[test]
    fn test_decode_legacy_name_with_v1_prefix() {
        let id = GrantIdentity::decode("grant.v1:x|||USAGE|false").unwrap();
        assert_eq!(id, GrantIdentity::new("grant.v1:x", "USAGE", false));

        // Still malformed when neither format fits.
        assert_malformed("grant.v1:x|USAGE");
    }

    #[test]
    fn test_decode_checked_canonicalizes_privilege() {
        let id =
            GrantIdentity::decode_checked("int|||usage|true", &INTEGRATION_PRIVILEGES).unwrap();
        assert_eq!(id, GrantIdentity::new("int", "USAGE", true));
    }

    #[test]
    fn test_decode_checked_rejects_unknown_privilege() {
        let err = GrantIdentity::decode_checked(
            "grant.v1:3:foo,6:SELECT,false",
            &INTEGRATION_PRIVILEGES,
        )
        .unwrap_err();
        assert!(matches!(err, CoreError::MalformedIdentity { .. }));

        // Plain decode does not know about privilege sets.
        assert!(GrantIdentity::decode("grant.v1:3:foo,6:SELECT,false").is_ok());
    }

    #[test]
    fn test_v1_is_not_legacy() {
        let id = GrantIdentity::new("x", "USAGE", false);
        assert!(!GrantIdentity::is_legacy_encoding(&id.encode()));
    }

    #[test]
    fn test_serde_json_shape() {
        let id = GrantIdentity::new("x", "USAGE", true);
        let json = serde_json::to_string(&id).unwrap();
        assert_eq!(
            json,
            r#"{"resource_name":"x","privilege":"USAGE","grant_option":true}"#
        );
    }

    proptest! {
        #[test]
        fn prop_decode_inverts_encode(
            name in "\\PC{1,40}",
            privilege in "[A-Z_]{1,16}",
            grant_option in any::<bool>(),
        ) {
            let id = GrantIdentity::new(name, privilege, grant_option);
            prop_assert_eq!(GrantIdentity::decode(&id.encode()).unwrap(), id);
        }

        #[test]
        fn prop_decode_never_panics(input in "\\PC{0,64}") {
            let _ = GrantIdentity::decode(&input);
        }
    }
}
