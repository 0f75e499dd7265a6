use std::collections::BTreeSet;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::evaluator;

/// The materialized result of grant resolution for one (subject, org) pair.
///
/// A snapshot: immutable once built, so concurrent checks need no locking.
/// Role or grant changes are not observed until the owning session is
/// re-resolved into a fresh value.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EffectivePermissionSet {
    permissions: BTreeSet<String>,
    scopes: BTreeSet<String>,
    resolved_at: DateTime<Utc>,
}

impl EffectivePermissionSet {
    /// Builds a snapshot from resolved permissions, deriving the scope set.
    #[must_use]
    pub fn from_permissions(permissions: BTreeSet<String>, resolved_at: DateTime<Utc>) -> Self {
        let scopes = evaluator::derive_scopes(&permissions);
        Self {
            permissions,
            scopes,
            resolved_at,
        }
    }

    /// Returns the resolved permission strings.
    #[must_use]
    pub fn permissions(&self) -> &BTreeSet<String> {
        &self.permissions
    }

    /// Returns the derived coarse scopes.
    #[must_use]
    pub fn scopes(&self) -> &BTreeSet<String> {
        &self.scopes
    }

    /// Returns when this snapshot was resolved.
    #[must_use]
    pub fn resolved_at(&self) -> DateTime<Utc> {
        self.resolved_at
    }

    /// Decides a `(module, action[, resource])` check against the snapshot.
    #[must_use]
    pub fn can_action(&self, module: &str, action: &str, resource: Option<&str>) -> bool {
        evaluator::can_action(&self.permissions, module, action, resource)
    }

    /// Decides a coarse scope check against the derived scopes.
    #[must_use]
    pub fn has_scope(&self, required: &str) -> bool {
        evaluator::has_scope(&self.scopes, required)
    }

    /// Decides whether every required scope is granted.
    #[must_use]
    pub fn has_all_scopes(&self, required: &[&str]) -> bool {
        evaluator::has_all_scopes(&self.scopes, required)
    }

    /// Returns whether the snapshot carries administrative access.
    #[must_use]
    pub fn is_admin(&self) -> bool {
        evaluator::is_admin(&self.permissions)
    }

    /// Returns whether the snapshot allows managing organization users.
    #[must_use]
    pub fn can_manage_users(&self) -> bool {
        evaluator::can_manage_users(&self.permissions)
    }

    /// Returns whether the snapshot allows changing organization settings.
    #[must_use]
    pub fn can_manage_settings(&self) -> bool {
        evaluator::can_manage_settings(&self.permissions)
    }

    /// Returns whether the snapshot allows viewing reports.
    #[must_use]
    pub fn can_view_reports(&self) -> bool {
        evaluator::can_view_reports(&self.permissions)
    }
}

#[cfg(test)]
mod tests {
    use std::collections::BTreeSet;

    use chrono::Utc;

    use super::EffectivePermissionSet;

    fn snapshot(values: &[&str]) -> EffectivePermissionSet {
        let permissions: BTreeSet<String> =
            values.iter().map(|value| (*value).to_owned()).collect();
        EffectivePermissionSet::from_permissions(permissions, Utc::now())
    }

    #[test]
    fn scopes_are_derived_at_construction() {
        let set = snapshot(&["crm.leads.view", "invoices.view", "reports:*"]);
        let expected: BTreeSet<String> = ["crm", "invoices", "reports:*"]
            .into_iter()
            .map(str::to_owned)
            .collect();
        assert_eq!(set.scopes(), &expected);
    }

    #[test]
    fn checks_delegate_to_the_evaluator() {
        let set = snapshot(&["crm.leads.*", "reports.view"]);
        assert!(set.can_action("crm", "leads", Some("delete")));
        assert!(set.has_scope("reports"));
        assert!(set.can_view_reports());
        assert!(!set.is_admin());
    }

    #[test]
    fn scope_checks_run_over_derived_scopes() {
        let set = snapshot(&["reports:*"]);
        assert!(set.has_scope("reports"));
        assert!(set.has_all_scopes(&["reports"]));
        assert!(!set.has_all_scopes(&["reports", "crm"]));
    }

    #[test]
    fn equal_permission_sets_compare_equal_regardless_of_insertion_order() {
        let now = Utc::now();
        let forward: BTreeSet<String> = ["a.b", "c.d"].into_iter().map(str::to_owned).collect();
        let reverse: BTreeSet<String> = ["c.d", "a.b"].into_iter().map(str::to_owned).collect();
        assert_eq!(
            EffectivePermissionSet::from_permissions(forward, now),
            EffectivePermissionSet::from_permissions(reverse, now)
        );
    }
}
