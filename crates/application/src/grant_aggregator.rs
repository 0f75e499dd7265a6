use std::collections::BTreeSet;
use std::sync::Arc;

use async_trait::async_trait;
use chrono::Utc;
use grantiva_core::{AppResult, OrgId};
use grantiva_domain::{OrgMembership, PermissionName, Role, RoleId, UserGrant};
use tracing::debug;

/// Repository port over the membership, role-grant and user-grant stores.
///
/// Read-only. Implementations must surface store failures as
/// [`grantiva_core::AppError::Lookup`]; an unreachable store must never be
/// reported as an empty result, since callers would read that as "no
/// permissions" rather than "unknown".
#[async_trait]
pub trait GrantRepository: Send + Sync {
    /// Finds the membership binding a subject to an organization.
    async fn find_membership(
        &self,
        org_id: OrgId,
        subject: &str,
    ) -> AppResult<Option<OrgMembership>>;

    /// Finds a role within an organization.
    async fn find_role(&self, org_id: OrgId, role_id: RoleId) -> AppResult<Option<Role>>;

    /// Lists the permissions granted to a role.
    async fn list_role_permissions(
        &self,
        org_id: OrgId,
        role_id: RoleId,
    ) -> AppResult<Vec<PermissionName>>;

    /// Lists direct user grants for a subject, expired rows included.
    ///
    /// Expiry is enforced by the aggregator at resolution time so that both
    /// adapters share one contract and correctness never depends on
    /// background cleanup.
    async fn list_user_grants(&self, org_id: OrgId, subject: &str) -> AppResult<Vec<UserGrant>>;
}

/// Resolves the effective permission union for a (subject, organization) pair.
///
/// A read-only projection: the union of the active role's grants (membership
/// active AND role active) and the subject's non-expired direct grants.
#[derive(Clone)]
pub struct GrantAggregator {
    repository: Arc<dyn GrantRepository>,
}

impl GrantAggregator {
    /// Creates an aggregator from a repository implementation.
    #[must_use]
    pub fn new(repository: Arc<dyn GrantRepository>) -> Self {
        Self { repository }
    }

    /// Resolves the effective permission set for a subject in an organization.
    ///
    /// Duplicates collapse; ordering is irrelevant. Two calls with no
    /// intervening data change yield set-equal results.
    pub async fn resolve(&self, org_id: OrgId, subject: &str) -> AppResult<BTreeSet<String>> {
        let now = Utc::now();
        let mut permissions: BTreeSet<String> = BTreeSet::new();

        let membership = self.repository.find_membership(org_id, subject).await?;
        if let Some(membership) = membership.filter(|m| m.status.is_active()) {
            for permission in self.active_role_permissions(org_id, membership.role_id).await? {
                permissions.insert(permission.into());
            }
        }

        for grant in self.repository.list_user_grants(org_id, subject).await? {
            if grant.is_active(now) {
                permissions.insert(grant.permission.into());
            }
        }

        debug!(
            %org_id,
            subject,
            permission_count = permissions.len(),
            "resolved effective permissions"
        );

        Ok(permissions)
    }

    async fn active_role_permissions(
        &self,
        org_id: OrgId,
        role_id: RoleId,
    ) -> AppResult<Vec<PermissionName>> {
        match self.repository.find_role(org_id, role_id).await? {
            Some(role) if role.active => {
                self.repository.list_role_permissions(org_id, role_id).await
            }
            _ => Ok(Vec::new()),
        }
    }
}

#[cfg(test)]
mod tests {
    use std::collections::HashMap;
    use std::sync::Arc;

    use async_trait::async_trait;
    use chrono::{Duration, Utc};
    use grantiva_core::{AppError, AppResult, NonEmptyString, OrgId};
    use grantiva_domain::{
        MembershipStatus, OrgMembership, PermissionName, Role, RoleId, UserGrant,
    };

    use super::{GrantAggregator, GrantRepository};

    #[derive(Default)]
    struct FakeGrantRepository {
        memberships: HashMap<(OrgId, String), OrgMembership>,
        roles: HashMap<(OrgId, RoleId), Role>,
        role_permissions: HashMap<(OrgId, RoleId), Vec<PermissionName>>,
        user_grants: HashMap<(OrgId, String), Vec<UserGrant>>,
        unreachable: bool,
    }

    #[async_trait]
    impl GrantRepository for FakeGrantRepository {
        async fn find_membership(
            &self,
            org_id: OrgId,
            subject: &str,
        ) -> AppResult<Option<OrgMembership>> {
            self.check_reachable()?;
            Ok(self.memberships.get(&(org_id, subject.to_owned())).cloned())
        }

        async fn find_role(&self, org_id: OrgId, role_id: RoleId) -> AppResult<Option<Role>> {
            self.check_reachable()?;
            Ok(self.roles.get(&(org_id, role_id)).cloned())
        }

        async fn list_role_permissions(
            &self,
            org_id: OrgId,
            role_id: RoleId,
        ) -> AppResult<Vec<PermissionName>> {
            self.check_reachable()?;
            Ok(self
                .role_permissions
                .get(&(org_id, role_id))
                .cloned()
                .unwrap_or_default())
        }

        async fn list_user_grants(
            &self,
            org_id: OrgId,
            subject: &str,
        ) -> AppResult<Vec<UserGrant>> {
            self.check_reachable()?;
            Ok(self
                .user_grants
                .get(&(org_id, subject.to_owned()))
                .cloned()
                .unwrap_or_default())
        }
    }

    impl FakeGrantRepository {
        fn check_reachable(&self) -> AppResult<()> {
            if self.unreachable {
                return Err(AppError::Lookup("grant store unreachable".to_owned()));
            }
            Ok(())
        }
    }

    fn permission(name: &str) -> PermissionName {
        PermissionName::new(name).unwrap_or_else(|_| unreachable!())
    }

    fn sales_fixture(org_id: OrgId, status: MembershipStatus, role_active: bool) -> FakeGrantRepository {
        let role_id = RoleId::new();
        let mut repository = FakeGrantRepository::default();
        repository.memberships.insert(
            (org_id, "alice".to_owned()),
            OrgMembership {
                org_id,
                subject: "alice".to_owned(),
                role_id,
                status,
            },
        );
        repository.roles.insert(
            (org_id, role_id),
            Role {
                id: role_id,
                org_id,
                name: NonEmptyString::new("sales").unwrap_or_else(|_| unreachable!()),
                active: role_active,
            },
        );
        repository.role_permissions.insert(
            (org_id, role_id),
            vec![permission("crm.leads.view"), permission("crm.leads.create")],
        );
        repository
    }

    #[tokio::test]
    async fn expired_user_grant_is_excluded() {
        let org_id = OrgId::new();
        let mut repository = sales_fixture(org_id, MembershipStatus::Active, true);
        repository.user_grants.insert(
            (org_id, "alice".to_owned()),
            vec![UserGrant {
                permission: permission("crm.leads.delete"),
                expires_at: Some(Utc::now() - Duration::days(1)),
            }],
        );
        let aggregator = GrantAggregator::new(Arc::new(repository));

        let resolved = aggregator
            .resolve(org_id, "alice")
            .await
            .unwrap_or_default();
        assert_eq!(
            resolved,
            ["crm.leads.view", "crm.leads.create"]
                .into_iter()
                .map(str::to_owned)
                .collect()
        );
        assert!(!grantiva_domain::evaluator::can_action(
            &resolved,
            "crm",
            "leads",
            Some("delete")
        ));
    }

    #[tokio::test]
    async fn active_module_wildcard_grant_extends_the_role() {
        let org_id = OrgId::new();
        let mut repository = sales_fixture(org_id, MembershipStatus::Active, true);
        repository.user_grants.insert(
            (org_id, "alice".to_owned()),
            vec![UserGrant {
                permission: permission("crm.*"),
                expires_at: Some(Utc::now() + Duration::days(7)),
            }],
        );
        let aggregator = GrantAggregator::new(Arc::new(repository));

        let resolved = aggregator
            .resolve(org_id, "alice")
            .await
            .unwrap_or_default();
        assert!(grantiva_domain::evaluator::can_action(
            &resolved,
            "crm",
            "deals",
            Some("delete")
        ));
    }

    #[tokio::test]
    async fn inactive_membership_ignores_the_role_entirely() {
        let org_id = OrgId::new();
        let mut repository = sales_fixture(org_id, MembershipStatus::Inactive, true);
        repository.user_grants.insert(
            (org_id, "alice".to_owned()),
            vec![UserGrant {
                permission: permission("reports.view"),
                expires_at: None,
            }],
        );
        let aggregator = GrantAggregator::new(Arc::new(repository));

        let resolved = aggregator
            .resolve(org_id, "alice")
            .await
            .unwrap_or_default();
        assert_eq!(
            resolved,
            ["reports.view"].into_iter().map(str::to_owned).collect()
        );
    }

    #[tokio::test]
    async fn inactive_role_contributes_nothing() {
        let org_id = OrgId::new();
        let repository = sales_fixture(org_id, MembershipStatus::Active, false);
        let aggregator = GrantAggregator::new(Arc::new(repository));

        let resolved = aggregator.resolve(org_id, "alice").await;
        assert!(matches!(resolved, Ok(permissions) if permissions.is_empty()));
    }

    #[tokio::test]
    async fn permanent_and_future_grants_are_included() {
        let org_id = OrgId::new();
        let mut repository = FakeGrantRepository::default();
        repository.user_grants.insert(
            (org_id, "bob".to_owned()),
            vec![
                UserGrant {
                    permission: permission("invoices.view"),
                    expires_at: None,
                },
                UserGrant {
                    permission: permission("invoices.edit"),
                    expires_at: Some(Utc::now() + Duration::hours(1)),
                },
            ],
        );
        let aggregator = GrantAggregator::new(Arc::new(repository));

        let resolved = aggregator.resolve(org_id, "bob").await.unwrap_or_default();
        assert_eq!(
            resolved,
            ["invoices.view", "invoices.edit"]
                .into_iter()
                .map(str::to_owned)
                .collect()
        );
    }

    #[tokio::test]
    async fn resolution_is_idempotent_without_data_changes() {
        let org_id = OrgId::new();
        let repository = sales_fixture(org_id, MembershipStatus::Active, true);
        let aggregator = GrantAggregator::new(Arc::new(repository));

        let first = aggregator
            .resolve(org_id, "alice")
            .await
            .unwrap_or_default();
        let second = aggregator
            .resolve(org_id, "alice")
            .await
            .unwrap_or_default();
        assert_eq!(first, second);
    }

    #[tokio::test]
    async fn permissions_never_leak_across_organizations() {
        let org_id = OrgId::new();
        let other_org = OrgId::new();
        let repository = sales_fixture(org_id, MembershipStatus::Active, true);
        let aggregator = GrantAggregator::new(Arc::new(repository));

        let resolved = aggregator.resolve(other_org, "alice").await;
        assert!(matches!(resolved, Ok(permissions) if permissions.is_empty()));
    }

    #[tokio::test]
    async fn unreachable_store_surfaces_a_lookup_failure() {
        let org_id = OrgId::new();
        let repository = FakeGrantRepository {
            unreachable: true,
            ..FakeGrantRepository::default()
        };
        let aggregator = GrantAggregator::new(Arc::new(repository));

        let result = aggregator.resolve(org_id, "alice").await;
        assert!(matches!(result, Err(AppError::Lookup(_))));
    }
}
