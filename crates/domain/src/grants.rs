use std::fmt::{Display, Formatter};

use chrono::{DateTime, Utc};
use grantiva_core::{NonEmptyString, OrgId};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::PermissionName;

/// Role identifier, unique within an organization.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct RoleId(Uuid);

impl RoleId {
    /// Creates a random role identifier.
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

/// A named, organization-scoped bundle of permissions.
///
/// An inactive role contributes no permissions regardless of membership.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Role {
    /// Stable role identifier.
    pub id: RoleId,
    /// Owning organization.
    pub org_id: OrgId,
    /// Role name shown to administrators.
    pub name: NonEmptyString,
    /// Whether the role currently contributes permissions.
    pub active: bool,
}

/// Lifecycle status of an organization membership.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MembershipStatus {
    /// Membership contributes the role's permissions.
    Active,
    /// Membership is suspended and contributes nothing.
    Inactive,
}

impl MembershipStatus {
    /// Returns whether the membership contributes permissions.
    #[must_use]
    pub fn is_active(&self) -> bool {
        matches!(self, Self::Active)
    }
}

/// Binds a subject to an organization with exactly one role.
///
/// A subject may hold memberships in several organizations; each one is
/// resolved independently and permissions never leak across organizations.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OrgMembership {
    /// Organization the membership belongs to.
    pub org_id: OrgId,
    /// Stable subject claim of the member.
    pub subject: String,
    /// The single role assigned by this membership.
    pub role_id: RoleId,
    /// Membership lifecycle status.
    pub status: MembershipStatus,
}

/// A direct permission grant to a (subject, organization) pair.
///
/// Bypasses roles. `expires_at = None` means permanent; expiry is evaluated
/// at resolution time, so no background cleanup is required for correctness.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UserGrant {
    /// Granted permission.
    pub permission: PermissionName,
    /// Optional expiry; `expires_at <= now` excludes the grant.
    pub expires_at: Option<DateTime<Utc>>,
}

impl UserGrant {
    /// Returns whether the grant is active at the given instant.
    #[must_use]
    pub fn is_active(&self, now: DateTime<Utc>) -> bool {
        self.expires_at.is_none_or(|expires_at| expires_at > now)
    }
}

#[cfg(test)]
mod tests {
    use chrono::{Duration, Utc};

    use crate::PermissionName;

    use super::UserGrant;

    fn grant(expires_at: Option<chrono::DateTime<Utc>>) -> UserGrant {
        UserGrant {
            permission: PermissionName::new("crm.leads.delete").unwrap_or_else(|_| unreachable!()),
            expires_at,
        }
    }

    #[test]
    fn permanent_grant_is_always_active() {
        assert!(grant(None).is_active(Utc::now()));
    }

    #[test]
    fn future_expiry_is_active_and_past_expiry_is_not() {
        let now = Utc::now();
        assert!(grant(Some(now + Duration::days(1))).is_active(now));
        assert!(!grant(Some(now - Duration::days(1))).is_active(now));
    }

    #[test]
    fn expiry_boundary_is_exclusive() {
        let now = Utc::now();
        assert!(!grant(Some(now)).is_active(now));
    }
}
