use std::fmt::{Display, Formatter};
use std::str::FromStr;

use grantiva_core::{AppError, AppResult};
use serde::{Deserialize, Serialize};

/// A validated permission identifier.
///
/// The canonical grammar is dot-hierarchical: `module.action[.resource]`,
/// ASCII lower-case, two or three segments. Wildcard grants use a trailing
/// `*` segment (`module.*`, `module.action.*`) or the global `*`. The legacy
/// coarse form `module:*` is accepted as a compatibility shim for scope-level
/// grants; it never participates in action-level matching.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct PermissionName(String);

impl PermissionName {
    /// Validates and wraps a permission identifier.
    pub fn new(value: impl Into<String>) -> AppResult<Self> {
        let value = value.into();

        if value == "*" {
            return Ok(Self(value));
        }

        if let Some(prefix) = value.strip_suffix(":*") {
            if is_segment(prefix) {
                return Ok(Self(value));
            }
            return Err(AppError::Validation(format!(
                "invalid coarse scope grant '{value}'"
            )));
        }

        let segments: Vec<&str> = value.split('.').collect();
        if !(2..=3).contains(&segments.len()) {
            return Err(AppError::Validation(format!(
                "permission '{value}' must have two or three dot-separated segments"
            )));
        }

        for (index, segment) in segments.iter().enumerate() {
            let last = index == segments.len() - 1;
            if last && *segment == "*" {
                continue;
            }
            if !is_segment(segment) {
                return Err(AppError::Validation(format!(
                    "permission '{value}' contains invalid segment '{segment}'"
                )));
            }
        }

        Ok(Self(value))
    }

    /// Returns the underlying identifier.
    #[must_use]
    pub fn as_str(&self) -> &str {
        self.0.as_str()
    }

    /// Returns whether this is the global wildcard `*`.
    #[must_use]
    pub fn is_global_wildcard(&self) -> bool {
        self.0 == "*"
    }

    /// Returns the module segment, or `None` for the global wildcard.
    #[must_use]
    pub fn module(&self) -> Option<&str> {
        if self.is_global_wildcard() {
            return None;
        }

        if let Some(prefix) = self.0.strip_suffix(":*") {
            return Some(prefix);
        }

        self.0.split('.').next()
    }
}

pub(crate) fn is_segment(value: &str) -> bool {
    !value.is_empty()
        && value
            .bytes()
            .all(|byte| byte.is_ascii_lowercase() || byte.is_ascii_digit() || byte == b'_')
}

impl Display for PermissionName {
    fn fmt(&self, formatter: &mut Formatter<'_>) -> std::fmt::Result {
        formatter.write_str(self.as_str())
    }
}

impl FromStr for PermissionName {
    type Err = AppError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        Self::new(value)
    }
}

impl From<PermissionName> for String {
    fn from(value: PermissionName) -> Self {
        value.0
    }
}

#[cfg(test)]
mod tests {
    use super::PermissionName;

    #[test]
    fn accepts_two_and_three_segment_identifiers() {
        assert!(PermissionName::new("reports.view").is_ok());
        assert!(PermissionName::new("crm.leads.delete").is_ok());
    }

    #[test]
    fn accepts_wildcard_forms() {
        assert!(PermissionName::new("*").is_ok());
        assert!(PermissionName::new("crm.*").is_ok());
        assert!(PermissionName::new("crm.leads.*").is_ok());
        assert!(PermissionName::new("reports:*").is_ok());
    }

    #[test]
    fn rejects_single_segment_and_oversized_identifiers() {
        assert!(PermissionName::new("reports").is_err());
        assert!(PermissionName::new("a.b.c.d").is_err());
    }

    #[test]
    fn rejects_uppercase_and_empty_segments() {
        assert!(PermissionName::new("CRM.leads.view").is_err());
        assert!(PermissionName::new("crm..view").is_err());
        assert!(PermissionName::new(":*").is_err());
    }

    #[test]
    fn wildcard_only_allowed_in_last_segment() {
        assert!(PermissionName::new("*.leads.view").is_err());
        assert!(PermissionName::new("crm.*.view").is_err());
    }

    #[test]
    fn module_extracts_first_segment() {
        let name = PermissionName::new("crm.leads.view").unwrap_or_else(|_| unreachable!());
        assert_eq!(name.module(), Some("crm"));

        let coarse = PermissionName::new("reports:*").unwrap_or_else(|_| unreachable!());
        assert_eq!(coarse.module(), Some("reports"));

        let global = PermissionName::new("*").unwrap_or_else(|_| unreachable!());
        assert_eq!(global.module(), None);
    }
}
