//! Application services and ports for permission resolution.

#![forbid(unsafe_code)]

mod audit;
mod grant_aggregator;
mod session_binder;

pub use audit::{AuditAction, AuditEvent, AuditRepository};
pub use grant_aggregator::{GrantAggregator, GrantRepository};
pub use session_binder::{PermissionSession, SessionBinder};
