use async_trait::async_trait;
use chrono::{DateTime, Utc};
use grantiva_application::GrantRepository;
use grantiva_core::{AppError, AppResult, NonEmptyString, OrgId};
use grantiva_domain::{MembershipStatus, OrgMembership, PermissionName, Role, RoleId, UserGrant};
use sqlx::{FromRow, PgPool};
use uuid::Uuid;

/// PostgreSQL-backed grant store over the `rbac_*` tables.
///
/// Query failures map to `AppError::Lookup`: an unreachable store is surfaced
/// to the caller, never collapsed into an empty result.
#[derive(Clone)]
pub struct PostgresGrantRepository {
    pool: PgPool,
}

impl PostgresGrantRepository {
    /// Creates a repository with the provided connection pool.
    #[must_use]
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[derive(Debug, FromRow)]
struct MembershipRow {
    role_id: Uuid,
    status: String,
}

#[derive(Debug, FromRow)]
struct RoleRow {
    id: Uuid,
    name: String,
    active: bool,
}

#[derive(Debug, FromRow)]
struct PermissionRow {
    permission: String,
}

#[derive(Debug, FromRow)]
struct UserGrantRow {
    permission: String,
    expires_at: Option<DateTime<Utc>>,
}

fn decode_permission(value: &str, org_id: OrgId) -> AppResult<PermissionName> {
    PermissionName::new(value).map_err(|error| {
        AppError::Internal(format!(
            "failed to decode permission '{value}' for organization '{org_id}': {error}"
        ))
    })
}

fn decode_status(value: &str, org_id: OrgId, subject: &str) -> AppResult<MembershipStatus> {
    match value {
        "active" => Ok(MembershipStatus::Active),
        "inactive" => Ok(MembershipStatus::Inactive),
        other => Err(AppError::Internal(format!(
            "unknown membership status '{other}' for '{subject}' in organization '{org_id}'"
        ))),
    }
}

#[async_trait]
impl GrantRepository for PostgresGrantRepository {
    async fn find_membership(
        &self,
        org_id: OrgId,
        subject: &str,
    ) -> AppResult<Option<OrgMembership>> {
        let row = sqlx::query_as::<_, MembershipRow>(
            r#"
            SELECT memberships.role_id, memberships.status
            FROM rbac_org_memberships AS memberships
            WHERE memberships.org_id = $1
              AND memberships.subject = $2
            "#,
        )
        .bind(org_id.as_uuid())
        .bind(subject)
        .fetch_optional(&self.pool)
        .await
        .map_err(|error| {
            AppError::Lookup(format!(
                "failed to load membership for '{subject}' in organization '{org_id}': {error}"
            ))
        })?;

        row.map(|row| {
            Ok(OrgMembership {
                org_id,
                subject: subject.to_owned(),
                role_id: RoleId::from_uuid(row.role_id),
                status: decode_status(&row.status, org_id, subject)?,
            })
        })
        .transpose()
    }

    async fn find_role(&self, org_id: OrgId, role_id: RoleId) -> AppResult<Option<Role>> {
        let row = sqlx::query_as::<_, RoleRow>(
            r#"
            SELECT roles.id, roles.name, roles.active
            FROM rbac_roles AS roles
            WHERE roles.org_id = $1
              AND roles.id = $2
            "#,
        )
        .bind(org_id.as_uuid())
        .bind(role_id.as_uuid())
        .fetch_optional(&self.pool)
        .await
        .map_err(|error| {
            AppError::Lookup(format!(
                "failed to load role '{role_id}' in organization '{org_id}': {error}"
            ))
        })?;

        row.map(|row| {
            Ok(Role {
                id: RoleId::from_uuid(row.id),
                org_id,
                name: NonEmptyString::new(row.name).map_err(|error| {
                    AppError::Internal(format!(
                        "failed to decode name of role '{role_id}' in organization '{org_id}': {error}"
                    ))
                })?,
                active: row.active,
            })
        })
        .transpose()
    }

    async fn list_role_permissions(
        &self,
        org_id: OrgId,
        role_id: RoleId,
    ) -> AppResult<Vec<PermissionName>> {
        let rows = sqlx::query_as::<_, PermissionRow>(
            r#"
            SELECT DISTINCT grants.permission
            FROM rbac_role_grants AS grants
            WHERE grants.org_id = $1
              AND grants.role_id = $2
            "#,
        )
        .bind(org_id.as_uuid())
        .bind(role_id.as_uuid())
        .fetch_all(&self.pool)
        .await
        .map_err(|error| {
            AppError::Lookup(format!(
                "failed to load grants for role '{role_id}' in organization '{org_id}': {error}"
            ))
        })?;

        rows.into_iter()
            .map(|row| decode_permission(&row.permission, org_id))
            .collect()
    }

    async fn list_user_grants(&self, org_id: OrgId, subject: &str) -> AppResult<Vec<UserGrant>> {
        let rows = sqlx::query_as::<_, UserGrantRow>(
            r#"
            SELECT grants.permission, grants.expires_at
            FROM rbac_user_grants AS grants
            WHERE grants.org_id = $1
              AND grants.subject = $2
            "#,
        )
        .bind(org_id.as_uuid())
        .bind(subject)
        .fetch_all(&self.pool)
        .await
        .map_err(|error| {
            AppError::Lookup(format!(
                "failed to load user grants for '{subject}' in organization '{org_id}': {error}"
            ))
        })?;

        rows.into_iter()
            .map(|row| {
                Ok(UserGrant {
                    permission: decode_permission(&row.permission, org_id)?,
                    expires_at: row.expires_at,
                })
            })
            .collect()
    }
}
