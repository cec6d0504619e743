use std::borrow::Cow;

use serde::{Deserialize, Serialize};

/// Role identifier carried in token claims.
///
/// Roles are intentionally opaque strings at this layer; the two names the
/// access rules care about are `"staff"` and `"admin"`.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Role(Cow<'static, str>);

impl Role {
    pub fn new(name: impl Into<Cow<'static, str>>) -> Self {
        Self(name.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl core::fmt::Display for Role {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.write_str(&self.0)
    }
}

/// Elevated caller: bypasses ownership scoping. Admins are staff.
pub fn is_staff(roles: &[Role]) -> bool {
    roles
        .iter()
        .any(|r| r.as_str() == "staff" || r.as_str() == "admin")
}

/// Admin caller: may manage user records.
pub fn is_admin(roles: &[Role]) -> bool {
    roles.iter().any(|r| r.as_str() == "admin")
}
