//! Domain model for permission resolution: the permission grammar, the static
//! catalog, grant records, and the pure authorization evaluator.

#![forbid(unsafe_code)]

/// Static permission universe and seed role lists.
pub mod catalog;
/// Pure authorization checks over resolved permission sets.
pub mod evaluator;

mod effective;
mod grants;
mod permission;

pub use effective::EffectivePermissionSet;
pub use grants::{MembershipStatus, OrgMembership, Role, RoleId, UserGrant};
pub use permission::PermissionName;
