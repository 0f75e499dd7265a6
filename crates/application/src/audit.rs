use async_trait::async_trait;
use grantiva_core::{AppResult, OrgId};

/// Stable audit actions emitted by session lifecycle operations.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum AuditAction {
    /// Emitted when a permission session is established.
    SessionEstablished,
    /// Emitted when a session is re-resolved.
    SessionRefreshed,
    /// Emitted when a session is invalidated.
    SessionInvalidated,
}

impl AuditAction {
    /// Returns a stable storage value for this action.
    #[must_use]
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::SessionEstablished => "session.established",
            Self::SessionRefreshed => "session.refreshed",
            Self::SessionInvalidated => "session.invalidated",
        }
    }
}

/// An audit trail entry describing a security-relevant operation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AuditEvent {
    /// Organization the operation was scoped to.
    pub org_id: OrgId,
    /// Subject the operation concerned.
    pub subject: String,
    /// What happened.
    pub action: AuditAction,
    /// Optional free-form context.
    pub detail: Option<String>,
}

/// Port for appending audit trail entries.
#[async_trait]
pub trait AuditRepository: Send + Sync {
    /// Appends one event to the audit trail.
    async fn append_event(&self, event: AuditEvent) -> AppResult<()>;
}
