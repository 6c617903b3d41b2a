use std::borrow::Cow;

use serde::{Deserialize, Serialize};

/// Role identifier as issued by the identity provider.
///
/// Roles are opaque strings; both the prefixed (`ROLE_ADMIN`) and bare
/// (`ADMIN`) spellings are in circulation and are treated alike.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Role(Cow<'static, str>);

impl Role {
    pub const ADMIN: Role = Role(Cow::Borrowed("ROLE_ADMIN"));
    pub const USER: Role = Role(Cow::Borrowed("ROLE_USER"));

    pub fn new(name: impl Into<Cow<'static, str>>) -> Self {
        Self(name.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Role name without the `ROLE_` prefix.
    pub fn bare_name(&self) -> &str {
        let s = self.as_str();
        match s.get(..5) {
            Some(prefix) if prefix.eq_ignore_ascii_case("ROLE_") => &s[5..],
            _ => s,
        }
    }

    pub fn is(&self, other: &Role) -> bool {
        self.bare_name().eq_ignore_ascii_case(other.bare_name())
    }
}

impl core::fmt::Display for Role {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.write_str(&self.0)
    }
}
