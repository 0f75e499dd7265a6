//! Static universe of permission identifiers the system understands.
//!
//! The catalog is pure data: roles and user grants reference these names, and
//! administrative surfaces render the labels. Retired permissions are simply
//! no longer referenced; catalog entries are never mutated.

/// A catalog entry: permission identifier plus human-readable label.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PermissionDef {
    /// Stable permission identifier (`module.action[.resource]`).
    pub name: &'static str,
    /// Human-readable label for administrative surfaces.
    pub label: &'static str,
}

/// All permissions known to the system.
pub const CATALOG: &[PermissionDef] = &[
    PermissionDef { name: "crm.leads.view", label: "View leads" },
    PermissionDef { name: "crm.leads.create", label: "Create leads" },
    PermissionDef { name: "crm.leads.edit", label: "Edit leads" },
    PermissionDef { name: "crm.leads.delete", label: "Delete leads" },
    PermissionDef { name: "crm.deals.view", label: "View deals" },
    PermissionDef { name: "crm.deals.create", label: "Create deals" },
    PermissionDef { name: "crm.deals.edit", label: "Edit deals" },
    PermissionDef { name: "crm.deals.delete", label: "Delete deals" },
    PermissionDef { name: "crm.contacts.view", label: "View contacts" },
    PermissionDef { name: "crm.contacts.create", label: "Create contacts" },
    PermissionDef { name: "crm.contacts.edit", label: "Edit contacts" },
    PermissionDef { name: "crm.contacts.delete", label: "Delete contacts" },
    PermissionDef { name: "invoices.view", label: "View invoices" },
    PermissionDef { name: "invoices.create", label: "Create invoices" },
    PermissionDef { name: "invoices.edit", label: "Edit invoices" },
    PermissionDef { name: "reports.view", label: "View reports" },
    PermissionDef { name: "reports.export", label: "Export reports" },
    PermissionDef { name: "users.view", label: "View users" },
    PermissionDef { name: "users.create", label: "Invite users" },
    PermissionDef { name: "users.edit", label: "Edit users" },
    PermissionDef { name: "users.delete", label: "Remove users" },
    PermissionDef { name: "settings.view", label: "View organization settings" },
    PermissionDef { name: "settings.edit", label: "Edit organization settings" },
    PermissionDef { name: "admin.access", label: "Full administrative access" },
];

/// Returns all catalog entries.
#[must_use]
pub fn all() -> &'static [PermissionDef] {
    CATALOG
}

/// Finds a catalog entry by permission name.
#[must_use]
pub fn find(name: &str) -> Option<&'static PermissionDef> {
    CATALOG.iter().find(|def| def.name == name)
}

/// Returns whether the catalog contains the permission name.
#[must_use]
pub fn is_known(name: &str) -> bool {
    find(name).is_some()
}

// Seed lists for environments without a populated catalog store. The grant
// aggregator is the source of truth; these exist only to bootstrap roles.
const ADMIN_SEED: &[&str] = &[
    "admin.access",
    "crm.*",
    "invoices.*",
    "reports.view",
    "reports.export",
    "users.view",
    "users.create",
    "users.edit",
    "users.delete",
    "settings.view",
    "settings.edit",
];

const MEMBER_SEED: &[&str] = &[
    "crm.leads.view",
    "crm.leads.create",
    "crm.deals.view",
    "crm.contacts.view",
    "crm.contacts.create",
    "invoices.view",
    "reports.view",
];

/// Returns the seed permission list for a freshly bootstrapped role.
#[must_use]
pub fn seed_permissions(is_admin: bool) -> &'static [&'static str] {
    if is_admin { ADMIN_SEED } else { MEMBER_SEED }
}
