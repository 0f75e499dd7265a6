use std::sync::Arc;

use chrono::Utc;
use grantiva_core::{AppError, AppResult, OrgId, UserIdentity};
use grantiva_domain::EffectivePermissionSet;
use tokio::sync::RwLock;
use tracing::{debug, info};

use crate::{AuditAction, AuditEvent, AuditRepository, GrantAggregator};

/// Lifecycle of a session's permission snapshot.
///
/// `Unresolved -> Resolved -> (Resolved)* -> Invalidated`; `Invalidated` is
/// terminal and a new session must be established to recover.
#[derive(Debug, Clone)]
enum SessionState {
    Unresolved,
    Resolved(Arc<EffectivePermissionSet>),
    Invalidated,
}

/// Binds a resolved permission snapshot to one authenticated session.
///
/// The snapshot itself is immutable; refresh resolves into a new value and
/// swaps the pointer, so concurrent checks observe either the old or the new
/// snapshot, never a partial one.
pub struct PermissionSession {
    org_id: OrgId,
    subject: String,
    state: RwLock<SessionState>,
}

impl PermissionSession {
    /// Creates a session that has not been resolved yet.
    ///
    /// All checks against an unresolved session fail closed.
    #[must_use]
    pub fn unresolved(org_id: OrgId, subject: impl Into<String>) -> Self {
        Self {
            org_id,
            subject: subject.into(),
            state: RwLock::new(SessionState::Unresolved),
        }
    }

    /// Returns the organization the session is scoped to.
    #[must_use]
    pub fn org_id(&self) -> OrgId {
        self.org_id
    }

    /// Returns the subject the session belongs to.
    #[must_use]
    pub fn subject(&self) -> &str {
        self.subject.as_str()
    }

    /// Returns the current snapshot, failing closed otherwise.
    ///
    /// Unresolved and invalidated sessions surface as `Unauthorized`, which is
    /// distinct from the `Forbidden` produced by a failed permission check.
    pub async fn permissions(&self) -> AppResult<Arc<EffectivePermissionSet>> {
        match &*self.state.read().await {
            SessionState::Resolved(snapshot) => Ok(Arc::clone(snapshot)),
            SessionState::Unresolved => Err(AppError::Unauthorized(format!(
                "session for '{}' has not been resolved",
                self.subject
            ))),
            SessionState::Invalidated => Err(AppError::Unauthorized(format!(
                "session for '{}' has been invalidated",
                self.subject
            ))),
        }
    }
}

/// Establishes, refreshes and invalidates permission sessions.
#[derive(Clone)]
pub struct SessionBinder {
    aggregator: GrantAggregator,
    audit_repository: Arc<dyn AuditRepository>,
}

impl SessionBinder {
    /// Creates a binder from the aggregator and an audit sink.
    #[must_use]
    pub fn new(aggregator: GrantAggregator, audit_repository: Arc<dyn AuditRepository>) -> Self {
        Self {
            aggregator,
            audit_repository,
        }
    }

    /// Resolves grants once and binds the snapshot to a new session.
    pub async fn establish(&self, identity: &UserIdentity) -> AppResult<Arc<PermissionSession>> {
        let org_id = identity.org_id();
        let subject = identity.subject();

        let snapshot = self.resolve_snapshot(org_id, subject).await?;
        let session = PermissionSession {
            org_id,
            subject: subject.to_owned(),
            state: RwLock::new(SessionState::Resolved(Arc::clone(&snapshot))),
        };

        info!(%org_id, subject, "permission session established");
        self.append_audit(org_id, subject, AuditAction::SessionEstablished, &snapshot)
            .await?;

        Ok(Arc::new(session))
    }

    /// Re-runs the full resolution and swaps the session's snapshot.
    ///
    /// Never reuses the cached set: grants may have changed or expired since
    /// the last resolution. The resolve completes before any lock is taken,
    /// so a cancelled refresh leaves the session in its prior state.
    pub async fn refresh(
        &self,
        session: &PermissionSession,
    ) -> AppResult<Arc<EffectivePermissionSet>> {
        if matches!(&*session.state.read().await, SessionState::Invalidated) {
            return Err(AppError::Unauthorized(format!(
                "session for '{}' has been invalidated",
                session.subject
            )));
        }

        let snapshot = self
            .resolve_snapshot(session.org_id, &session.subject)
            .await?;

        {
            let mut state = session.state.write().await;
            // A concurrent invalidation wins; refresh must not resurrect.
            if matches!(&*state, SessionState::Invalidated) {
                return Err(AppError::Unauthorized(format!(
                    "session for '{}' has been invalidated",
                    session.subject
                )));
            }
            *state = SessionState::Resolved(Arc::clone(&snapshot));
        }

        debug!(org_id = %session.org_id, subject = %session.subject, "permission session refreshed");
        self.append_audit(
            session.org_id,
            &session.subject,
            AuditAction::SessionRefreshed,
            &snapshot,
        )
        .await?;

        Ok(snapshot)
    }

    /// Discards the session's snapshot; subsequent checks fail closed.
    pub async fn invalidate(&self, session: &PermissionSession) -> AppResult<()> {
        {
            let mut state = session.state.write().await;
            *state = SessionState::Invalidated;
        }

        info!(org_id = %session.org_id, subject = %session.subject, "permission session invalidated");
        self.audit_repository
            .append_event(AuditEvent {
                org_id: session.org_id,
                subject: session.subject.clone(),
                action: AuditAction::SessionInvalidated,
                detail: None,
            })
            .await
    }

    /// Returns whether the session currently allows the action.
    pub async fn check_action(
        &self,
        session: &PermissionSession,
        module: &str,
        action: &str,
        resource: Option<&str>,
    ) -> AppResult<bool> {
        let snapshot = session.permissions().await?;
        Ok(snapshot.can_action(module, action, resource))
    }

    /// Ensures the session allows the action, failing with `Forbidden`.
    pub async fn require_action(
        &self,
        session: &PermissionSession,
        module: &str,
        action: &str,
        resource: Option<&str>,
    ) -> AppResult<()> {
        if self.check_action(session, module, action, resource).await? {
            return Ok(());
        }

        let requested = match resource {
            Some(resource) => format!("{module}.{action}.{resource}"),
            None => format!("{module}.{action}"),
        };
        Err(AppError::Forbidden(format!(
            "subject '{}' is missing permission '{requested}' in organization '{}'",
            session.subject, session.org_id
        )))
    }

    async fn resolve_snapshot(
        &self,
        org_id: OrgId,
        subject: &str,
    ) -> AppResult<Arc<EffectivePermissionSet>> {
        let permissions = self.aggregator.resolve(org_id, subject).await?;
        Ok(Arc::new(EffectivePermissionSet::from_permissions(
            permissions,
            Utc::now(),
        )))
    }

    async fn append_audit(
        &self,
        org_id: OrgId,
        subject: &str,
        action: AuditAction,
        snapshot: &EffectivePermissionSet,
    ) -> AppResult<()> {
        self.audit_repository
            .append_event(AuditEvent {
                org_id,
                subject: subject.to_owned(),
                action,
                detail: Some(format!(
                    "resolved {} permissions",
                    snapshot.permissions().len()
                )),
            })
            .await
    }
}
