// SPDX-License-Identifier: MIT OR Apache-2.0
//! Administrative metadata payload types.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::AdminError;

/// URL of the administrative metadata schema.
pub const ADMIN_SCHEMA_URL: &str = "https://metadata-resources.data.bas.ac.uk/bas-metadata-generator-configuration-schemas/v2/magic-admin-v1.json";

fn far_future() -> DateTime<Utc> {
    DateTime::<Utc>::MAX_UTC
}

/// A directory/group access grant with optional expiry and comments.
///
/// Equality ignores comments; two grants are the same grant regardless of any
/// annotation.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct Permission {
    pub directory: String,
    pub group: String,
    #[serde(default = "far_future")]
    pub expiry: DateTime<Utc>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub comments: Option<String>,
}

impl Permission {
    pub fn new(directory: impl Into<String>, group: impl Into<String>) -> Self {
        Self {
            directory: directory.into(),
            group: group.into(),
            expiry: far_future(),
            comments: None,
        }
    }
}

impl PartialEq for Permission {
    fn eq(&self, other: &Self) -> bool {
        self.directory == other.directory
            && self.group == other.group
            && self.expiry == other.expiry
    }
}

impl Eq for Permission {}

/// Well-known grant giving anonymous public access.
pub fn open_access() -> Permission {
    Permission::new("*", "~everyone")
}

/// Well-known grant restricting access to BAS staff.
pub fn bas_staff() -> Permission {
    Permission::new("nerc", "~bas-staff")
}

/// Resource access level derived from admin access permissions.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum AccessLevel {
    /// Openly accessible to anyone.
    Public,
    /// Restricted to BAS staff.
    BasStaff,
    /// No access permissions set.
    NoAccess,
    /// Permissions set but not a recognised shape.
    Unknown,
}

impl AccessLevel {
    /// Display label for item pages.
    pub fn label(&self) -> &'static str {
        match self {
            Self::Public => "Public",
            Self::BasStaff => "BAS Staff",
            Self::NoAccess => "No access",
            Self::Unknown => "Unknown",
        }
    }
}

/// Administrative metadata for one resource.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct Administration {
    pub id: String,
    #[serde(default)]
    pub gitlab_issues: Vec<String>,
    #[serde(default)]
    pub access_permissions: Vec<Permission>,
    #[serde(default)]
    pub metadata_permissions: Vec<Permission>,
    #[serde(default)]
    pub resource_permissions: Vec<Permission>,
}

impl Administration {
    pub fn new(id: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            ..Default::default()
        }
    }

    /// Access level determined by access permissions.
    ///
    /// Defaults to no access where no access permissions are set.
    pub fn access_level(&self) -> AccessLevel {
        if self.access_permissions.is_empty() {
            return AccessLevel::NoAccess;
        }
        if self.access_permissions == vec![open_access()] {
            return AccessLevel::Public;
        }
        if self.access_permissions == vec![bas_staff()] {
            return AccessLevel::BasStaff;
        }
        AccessLevel::Unknown
    }

    /// Dump as a JSON string including the `$schema` key.
    pub fn dumps_json(&self) -> Result<String, AdminError> {
        let mut value = serde_json::to_value(self)?;
        if let Value::Object(obj) = &mut value {
            obj.insert("$schema".into(), Value::String(ADMIN_SCHEMA_URL.into()));
        }
        Ok(serde_json::to_string(&value)?)
    }

    /// Load from a JSON string, ignoring any `$schema` key.
    pub fn loads_json(raw: &str) -> Result<Self, AdminError> {
        let mut value: Value = serde_json::from_str(raw)?;
        if let Value::Object(obj) = &mut value {
            obj.remove("$schema");
        }
        Ok(serde_json::from_value(value)?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn permission_equality_ignores_comments() {
        let a = Permission::new("x", "x");
        let mut b = Permission::new("x", "x");
        b.comments = Some("y".into());
        assert_eq!(a, b);

        let c = Permission::new("x", "y");
        assert_ne!(a, c);
    }

    #[test]
    fn permission_expiry_defaults_far_future() {
        let permission = Permission::new("x", "x");
        assert_eq!(permission.expiry, DateTime::<Utc>::MAX_UTC);
    }

    #[test]
    fn access_level_from_permissions() {
        let mut admin = Administration::new("x");
        assert_eq!(admin.access_level(), AccessLevel::NoAccess);

        admin.access_permissions = vec![open_access()];
        assert_eq!(admin.access_level(), AccessLevel::Public);

        admin.access_permissions = vec![bas_staff()];
        assert_eq!(admin.access_level(), AccessLevel::BasStaff);

        admin.access_permissions = vec![open_access(), bas_staff()];
        assert_eq!(admin.access_level(), AccessLevel::Unknown);
    }

    #[test]
    fn json_roundtrip() {
        let mut admin = Administration::new("5d5b4e21-fd32-409c-be83-ca1c339903e5");
        admin.gitlab_issues = vec!["https://gitlab.example.com/x/y/-/issues/1".into()];
        admin.access_permissions = vec![open_access()];

        let encoded = admin.dumps_json().unwrap();
        assert!(encoded.contains("$schema"));
        let decoded = Administration::loads_json(&encoded).unwrap();
        assert_eq!(decoded, admin);
    }
}
