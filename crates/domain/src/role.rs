use std::fmt::{Display, Formatter};
use std::hash::{Hash, Hasher};

use serde::{Deserialize, Serialize};
use uuid::Uuid;
use wardbook_core::{AppResult, NonEmptyString};

/// Display name of the administrative role created by bootstrap.
pub const ADMIN_ROLE_NAME: &str = "Admin";

/// Unique identifier for a role record.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct RoleId(Uuid);

impl RoleId {
    /// Creates a new random role identifier.
    #[must_use]
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }

    /// Creates a role identifier from an existing UUID value.
    #[must_use]
    pub fn from_uuid(value: Uuid) -> Self {
        Self(value)
    }

    /// Returns the underlying UUID value.
    #[must_use]
    pub fn as_uuid(&self) -> Uuid {
        self.0
    }
}

impl Default for RoleId {
    fn default() -> Self {
        Self::new()
    }
}

impl Display for RoleId {
    fn fmt(&self, formatter: &mut Formatter<'_>) -> std::fmt::Result {
        write!(formatter, "{}", self.0)
    }
}

/// Role name with case-insensitive comparison semantics.
///
/// The original casing is kept for display; equality and hashing use the
/// lowercase form so "Admin", "admin" and "ADMIN" name the same role.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RoleName(String);

impl RoleName {
    /// Creates a validated role name.
    pub fn new(value: impl Into<String>) -> AppResult<Self> {
        NonEmptyString::new(value).map(|value| Self(value.into()))
    }

    /// Returns the administrative role name.
    #[must_use]
    pub fn admin() -> Self {
        Self(ADMIN_ROLE_NAME.to_owned())
    }

    /// Returns the name as entered.
    #[must_use]
    pub fn as_str(&self) -> &str {
        self.0.as_str()
    }

    /// Returns the comparison key used for uniqueness checks.
    #[must_use]
    pub fn normalized(&self) -> String {
        self.0.to_lowercase()
    }

    /// Returns whether this names the administrative role.
    #[must_use]
    pub fn is_admin(&self) -> bool {
        self.normalized() == ADMIN_ROLE_NAME.to_lowercase()
    }
}

impl PartialEq for RoleName {
    fn eq(&self, other: &Self) -> bool {
        self.normalized() == other.normalized()
    }
}

impl Eq for RoleName {}

impl Hash for RoleName {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.normalized().hash(state);
    }
}

impl Display for RoleName {
    fn fmt(&self, formatter: &mut Formatter<'_>) -> std::fmt::Result {
        formatter.write_str(self.as_str())
    }
}

/// Persisted role.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Role {
    /// Stable role identifier.
    pub id: RoleId,
    /// Role name, unique case-insensitively.
    pub name: RoleName,
}

impl Role {
    /// Returns whether this is the administrative role.
    #[must_use]
    pub fn is_admin(&self) -> bool {
        self.name.is_admin()
    }
}

#[cfg(test)]
mod tests {
    use proptest::prelude::*;

    use super::{ADMIN_ROLE_NAME, RoleName};

    #[test]
    fn admin_name_variants_are_admin() {
        for value in ["Admin", "admin", "ADMIN", " aDmIn "] {
            let name = RoleName::new(value);
            assert!(name.map(|name| name.is_admin()).unwrap_or(false));
        }
    }

    #[test]
    fn other_names_are_not_admin() {
        let name = RoleName::new("Administrator");
        assert!(!name.map(|name| name.is_admin()).unwrap_or(true));
    }

    #[test]
    fn blank_role_name_is_rejected() {
        assert!(RoleName::new("  ").is_err());
    }

    #[test]
    fn admin_constructor_keeps_display_casing() {
        assert_eq!(RoleName::admin().as_str(), ADMIN_ROLE_NAME);
    }

    proptest! {
        #[test]
        fn role_names_compare_case_insensitively(value in "[a-zA-Z][a-zA-Z ]{0,20}") {
            let upper = RoleName::new(value.to_uppercase());
            let lower = RoleName::new(value.to_lowercase());
            prop_assert!(upper.is_ok() && lower.is_ok());
            if let (Ok(upper), Ok(lower)) = (upper, lower) {
                prop_assert_eq!(upper, lower);
            }
        }
    }
}
