use async_trait::async_trait;
use grantiva_application::{AuditEvent, AuditRepository};
use grantiva_core::AppResult;
use tokio::sync::RwLock;
use tracing::info;

/// In-memory audit trail for tests and development environments.
///
/// Events are additionally logged to tracing output so development sessions
/// show the trail without a backing store.
#[derive(Debug, Default)]
pub struct InMemoryAuditLog {
    events: RwLock<Vec<AuditEvent>>,
}

impl InMemoryAuditLog {
    /// Creates an empty audit log.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns a copy of all recorded events in append order.
    pub async fn events(&self) -> Vec<AuditEvent> {
        self.events.read().await.clone()
    }
}

#[async_trait]
impl AuditRepository for InMemoryAuditLog {
    async fn append_event(&self, event: AuditEvent) -> AppResult<()> {
        info!(
            org_id = %event.org_id,
            subject = %event.subject,
            action = event.action.as_str(),
            "audit event"
        );
        self.events.write().await.push(event);
        Ok(())
    }
}
