//! Pure authorization checks over an already-resolved permission set.
//!
//! Nothing in this module touches storage or suspends: every function is a
//! total projection over string sets, safe to call with stale or
//! attacker-influenced data. Malformed entries never match and never panic.
//!
//! The canonical grammar is dot-hierarchical (`module.action[.resource]`,
//! wildcards via a trailing `.*` and the global `*`). Coarse colon scopes
//! (`module:*`) are a compatibility shim honored only by [`has_scope`] and
//! carried through by [`derive_scopes`]; [`can_action`] never consults them.

use std::collections::BTreeSet;

use crate::permission::is_segment;

/// Decides whether the set satisfies a `(module, action[, resource])` check.
///
/// Candidates are tried in decreasing specificity; the first match wins and
/// there is no explicit-deny concept:
///
/// 1. exact `module.action.resource` when a resource is supplied, or the
///    exact two-segment `module.action` when it is not,
/// 2. `module.action.*`,
/// 3. `module.*`,
/// 4. the global `*`.
///
/// When the resource is omitted, a resource-specific grant never matches:
/// holding only `crm.leads.delete` does not satisfy `("crm", "leads")`.
#[must_use]
pub fn can_action(
    permissions: &BTreeSet<String>,
    module: &str,
    action: &str,
    resource: Option<&str>,
) -> bool {
    if module.is_empty() || action.is_empty() {
        return false;
    }

    let exact = match resource {
        Some(resource) if resource.is_empty() => return false,
        Some(resource) => format!("{module}.{action}.{resource}"),
        None => format!("{module}.{action}"),
    };

    permissions.contains(&exact)
        || permissions.contains(&format!("{module}.{action}.*"))
        || permissions.contains(&format!("{module}.*"))
        || permissions.contains("*")
}

/// Decides whether the set grants standing in a coarse scope.
///
/// A required scope is satisfied by literal membership, by the global `*`, or
/// by a granted `prefix:*` whose prefix equals the required scope. The dot and
/// colon forms are not convertible: `reports.view` in the set does not satisfy
/// a required `reports:*`.
#[must_use]
pub fn has_scope(scopes: &BTreeSet<String>, required: &str) -> bool {
    if required.is_empty() {
        return false;
    }

    if scopes.contains(required) || scopes.contains("*") {
        return true;
    }

    scopes.iter().any(|granted| {
        granted
            .strip_suffix(":*")
            .is_some_and(|prefix| prefix == required && is_segment(prefix))
    })
}

/// Decides whether the set grants standing in every required scope.
#[must_use]
pub fn has_all_scopes(scopes: &BTreeSet<String>, required: &[&str]) -> bool {
    required.iter().all(|scope| has_scope(scopes, scope))
}

/// Reduces a permission set to the coarse scopes it implies.
///
/// For every well-formed `a.b[.c]` the module segment `a` is emitted. The
/// global `*` and coarse `module:*` grants pass through unchanged; entries
/// with fewer than two dot segments are skipped. Strictly less precise than
/// [`can_action`] and must never gate a specific action.
#[must_use]
pub fn derive_scopes(permissions: &BTreeSet<String>) -> BTreeSet<String> {
    let mut scopes = BTreeSet::new();

    for permission in permissions {
        if permission == "*" {
            scopes.insert(permission.clone());
            continue;
        }

        if let Some(prefix) = permission.strip_suffix(":*") {
            // A coarse grant is only `module:*`; anything else is malformed.
            if is_segment(prefix) {
                scopes.insert(permission.clone());
            }
            continue;
        }

        let mut segments = permission.split('.');
        match (segments.next(), segments.next()) {
            (Some(module), Some(_)) if !module.is_empty() => {
                scopes.insert(module.to_owned());
            }
            _ => {}
        }
    }

    scopes
}

/// Returns whether the set carries administrative access.
#[must_use]
pub fn is_admin(permissions: &BTreeSet<String>) -> bool {
    can_action(permissions, "admin", "access", None)
}

/// Returns whether the set allows managing organization users.
#[must_use]
pub fn can_manage_users(permissions: &BTreeSet<String>) -> bool {
    is_admin(permissions)
        || can_action(permissions, "users", "create", None)
        || can_action(permissions, "users", "edit", None)
        || can_action(permissions, "users", "delete", None)
}

/// Returns whether the set allows changing organization settings.
#[must_use]
pub fn can_manage_settings(permissions: &BTreeSet<String>) -> bool {
    is_admin(permissions) || can_action(permissions, "settings", "edit", None)
}

/// Returns whether the set allows viewing reports.
#[must_use]
pub fn can_view_reports(permissions: &BTreeSet<String>) -> bool {
    is_admin(permissions)
        || can_action(permissions, "reports", "view", None)
        || has_scope(permissions, "reports")
}
