use std::collections::HashMap;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use grantiva_application::GrantRepository;
use grantiva_core::{AppError, AppResult, NonEmptyString, OrgId};
use grantiva_domain::{
    MembershipStatus, OrgMembership, PermissionName, Role, RoleId, UserGrant, catalog,
};
use tokio::sync::RwLock;

/// In-memory grant store for tests and development environments.
///
/// Rows are returned as stored; expiry filtering stays with the aggregator.
#[derive(Debug, Default)]
pub struct InMemoryGrantRepository {
    memberships: RwLock<HashMap<(OrgId, String), OrgMembership>>,
    roles: RwLock<HashMap<(OrgId, RoleId), Role>>,
    role_grants: RwLock<HashMap<(OrgId, RoleId), Vec<PermissionName>>>,
    user_grants: RwLock<HashMap<(OrgId, String), Vec<UserGrant>>>,
}

impl InMemoryGrantRepository {
    /// Creates an empty in-memory grant store.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Inserts or replaces a role.
    pub async fn upsert_role(&self, role: Role) {
        self.roles.write().await.insert((role.org_id, role.id), role);
    }

    /// Replaces the permission list granted to a role.
    pub async fn set_role_permissions(
        &self,
        org_id: OrgId,
        role_id: RoleId,
        permissions: Vec<PermissionName>,
    ) {
        self.role_grants
            .write()
            .await
            .insert((org_id, role_id), permissions);
    }

    /// Inserts or replaces the membership for a subject.
    pub async fn upsert_membership(&self, membership: OrgMembership) {
        self.memberships.write().await.insert(
            (membership.org_id, membership.subject.clone()),
            membership,
        );
    }

    /// Appends a direct user grant.
    pub async fn add_user_grant(
        &self,
        org_id: OrgId,
        subject: &str,
        permission: PermissionName,
        expires_at: Option<DateTime<Utc>>,
    ) {
        self.user_grants
            .write()
            .await
            .entry((org_id, subject.to_owned()))
            .or_default()
            .push(UserGrant {
                permission,
                expires_at,
            });
    }

    /// Creates an active role seeded from the static catalog lists.
    ///
    /// Bootstrap helper for stores without a populated catalog; the seeded
    /// grants are ordinary role grants once created.
    pub async fn seed_role(&self, org_id: OrgId, name: &str, is_admin: bool) -> AppResult<RoleId> {
        let role_id = RoleId::new();
        let permissions: Vec<PermissionName> = catalog::seed_permissions(is_admin)
            .iter()
            .map(|name| PermissionName::new(*name))
            .collect::<AppResult<_>>()?;

        self.upsert_role(Role {
            id: role_id,
            org_id,
            name: NonEmptyString::new(name)?,
            active: true,
        })
        .await;
        self.set_role_permissions(org_id, role_id, permissions).await;

        Ok(role_id)
    }

    /// Activates or suspends a membership.
    pub async fn set_membership_status(
        &self,
        org_id: OrgId,
        subject: &str,
        status: MembershipStatus,
    ) -> AppResult<()> {
        let mut memberships = self.memberships.write().await;
        let membership = memberships
            .get_mut(&(org_id, subject.to_owned()))
            .ok_or_else(|| {
                AppError::NotFound(format!(
                    "no membership for '{subject}' in organization '{org_id}'"
                ))
            })?;
        membership.status = status;
        Ok(())
    }
}

#[async_trait]
impl GrantRepository for InMemoryGrantRepository {
    async fn find_membership(
        &self,
        org_id: OrgId,
        subject: &str,
    ) -> AppResult<Option<OrgMembership>> {
        Ok(self
            .memberships
            .read()
            .await
            .get(&(org_id, subject.to_owned()))
            .cloned())
    }

    async fn find_role(&self, org_id: OrgId, role_id: RoleId) -> AppResult<Option<Role>> {
        Ok(self.roles.read().await.get(&(org_id, role_id)).cloned())
    }

    async fn list_role_permissions(
        &self,
        org_id: OrgId,
        role_id: RoleId,
    ) -> AppResult<Vec<PermissionName>> {
        Ok(self
            .role_grants
            .read()
            .await
            .get(&(org_id, role_id))
            .cloned()
            .unwrap_or_default())
    }

    async fn list_user_grants(&self, org_id: OrgId, subject: &str) -> AppResult<Vec<UserGrant>> {
        Ok(self
            .user_grants
            .read()
            .await
            .get(&(org_id, subject.to_owned()))
            .cloned()
            .unwrap_or_default())
    }
}
