use std::str::FromStr;

use async_trait::async_trait;

use wardbook_application::AuthorizationRepository;
use wardbook_core::{AppError, AppResult};
use wardbook_domain::{Grant, Role, RoleId, RoleName};

use sqlx::{FromRow, PgPool};

/// PostgreSQL-backed repository for subject role and grant lookups.
#[derive(Clone)]
pub struct PostgresAuthorizationRepository {
    pool: PgPool,
}

impl PostgresAuthorizationRepository {
    /// Creates a repository with the provided connection pool.
    #[must_use]
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[derive(Debug, FromRow)]
pub(crate) struct RoleRow {
    pub(crate) id: uuid::Uuid,
    pub(crate) name: String,
}

impl TryFrom<RoleRow> for Role {
    type Error = AppError;

    fn try_from(row: RoleRow) -> Result<Self, Self::Error> {
        let name = RoleName::new(row.name.as_str()).map_err(|error| {
            AppError::Internal(format!(
                "failed to decode role name '{}' for role '{}': {error}",
                row.name, row.id
            ))
        })?;

        Ok(Self {
            id: RoleId::from_uuid(row.id),
            name,
        })
    }
}

#[derive(Debug, FromRow)]
struct GrantRow {
    tag: String,
}

/// Decodes a stored grant tag.
pub(crate) fn decode_grant(tag: &str, role_id: RoleId) -> AppResult<Grant> {
    Grant::from_str(tag).map_err(|error| {
        AppError::Internal(format!(
            "failed to decode grant '{tag}' for role '{role_id}': {error}"
        ))
    })
}

#[async_trait]
impl AuthorizationRepository for PostgresAuthorizationRepository {
    async fn find_role_for_subject(&self, subject: &str) -> AppResult<Option<Role>> {
        let Ok(user_id) = uuid::Uuid::parse_str(subject) else {
            return Ok(None);
        };

        let row = sqlx::query_as::<_, RoleRow>(
            r#"
            SELECT roles.id, roles.name
            FROM users
            INNER JOIN roles
                ON roles.id = users.role_id
            WHERE users.id = $1
            "#,
        )
        .bind(user_id)
        .fetch_optional(&self.pool)
        .await
        .map_err(|error| AppError::Internal(format!("failed to resolve subject role: {error}")))?;

        row.map(Role::try_from).transpose()
    }

    async fn list_grants_for_role(&self, role_id: RoleId) -> AppResult<Vec<Grant>> {
        let rows = sqlx::query_as::<_, GrantRow>(
            r#"
            SELECT tag
            FROM role_grants
            WHERE role_id = $1
            ORDER BY tag
            "#,
        )
        .bind(role_id.as_uuid())
        .fetch_all(&self.pool)
        .await
        .map_err(|error| AppError::Internal(format!("failed to load role grants: {error}")))?;

        rows.into_iter()
            .map(|row| decode_grant(row.tag.as_str(), role_id))
            .collect()
    }
}
