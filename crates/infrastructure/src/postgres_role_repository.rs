use async_trait::async_trait;
use sqlx::{FromRow, PgPool};

use wardbook_application::{RoleAdminRepository, RoleDefinition};
use wardbook_core::{AppError, AppResult};
use wardbook_domain::{Grant, Role, RoleId, RoleName};

use crate::postgres_authorization_repository::{RoleRow, decode_grant};


/// PostgreSQL-backed repository for role administration.
#[derive(Clone)]
pub struct PostgresRoleRepository {
    pool: PgPool,
}

impl PostgresRoleRepository {
    /// Creates a repository with the provided connection pool.
    #[must_use]
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[derive(Debug, FromRow)]
struct RoleGrantRow {
    role_id: uuid::Uuid,
    role_name: String,
    tag: Option<String>,
}

fn aggregate_roles(rows: Vec<RoleGrantRow>) -> AppResult<Vec<RoleDefinition>> {
    let mut definitions: Vec<RoleDefinition> = Vec::new();

    for row in rows {
        let role_id = RoleId::from_uuid(row.role_id);
        let is_same_role = definitions
            .last()
            .is_some_and(|definition| definition.role.id == role_id);
        if !is_same_role {
            let role = Role::try_from(RoleRow {
                id: row.role_id,
                name: row.role_name,
            })?;
            definitions.push(RoleDefinition {
                role,
                grants: Vec::new(),
            });
        }

        if let (Some(tag), Some(definition)) = (row.tag, definitions.last_mut()) {
            definition.grants.push(decode_grant(tag.as_str(), role_id)?);
        }
    }

    for definition in &mut definitions {
        definition.grants.sort();
    }

    Ok(definitions)
}

fn map_role_conflict(error: sqlx::Error, role_name: &RoleName, action: &str) -> AppError {
    if let sqlx::Error::Database(database_error) = &error
        && database_error.code().as_deref() == Some("23505")
    {
        return AppError::Conflict(format!("role '{role_name}' already exists"));
    }

    AppError::Internal(format!("failed to {action} role: {error}"))
}

#[async_trait]
impl RoleAdminRepository for PostgresRoleRepository {
    async fn list_roles(&self) -> AppResult<Vec<RoleDefinition>> {
        let rows = sqlx::query_as::<_, RoleGrantRow>(
            r#"
            SELECT
                roles.id AS role_id,
                roles.name AS role_name,
                grants.tag
            FROM roles
            LEFT JOIN role_grants AS grants
                ON grants.role_id = roles.id
            ORDER BY lower(roles.name), roles.id, grants.tag
            "#,
        )
        .fetch_all(&self.pool)
        .await
        .map_err(|error| AppError::Internal(format!("failed to list roles: {error}")))?;

        aggregate_roles(rows)
    }

    async fn find_role(&self, role_id: RoleId) -> AppResult<Option<Role>> {
        let row = sqlx::query_as::<_, RoleRow>(
            r#"
            SELECT id, name
            FROM roles
            WHERE id = $1
            "#,
        )
        .bind(role_id.as_uuid())
        .fetch_optional(&self.pool)
        .await
        .map_err(|error| AppError::Internal(format!("failed to load role: {error}")))?;

        row.map(Role::try_from).transpose()
    }

    async fn find_role_by_name(&self, name: &RoleName) -> AppResult<Option<Role>> {
        let row = sqlx::query_as::<_, RoleRow>(
            r#"
            SELECT id, name
            FROM roles
            WHERE lower(name) = $1
            "#,
        )
        .bind(name.normalized())
        .fetch_optional(&self.pool)
        .await
        .map_err(|error| AppError::Internal(format!("failed to resolve role by name: {error}")))?;

        row.map(Role::try_from).transpose()
    }

    async fn create_role(&self, name: RoleName) -> AppResult<Role> {
        let role_id = RoleId::new();

        sqlx::query(
            r#"
            INSERT INTO roles (id, name)
            VALUES ($1, $2)
            "#,
        )
        .bind(role_id.as_uuid())
        .bind(name.as_str())
        .execute(&self.pool)
        .await
        .map_err(|error| map_role_conflict(error, &name, "create"))?;

        Ok(Role { id: role_id, name })
    }

    async fn rename_role(&self, role_id: RoleId, name: RoleName) -> AppResult<Role> {
        let result = sqlx::query(
            r#"
            UPDATE roles
            SET name = $2
            WHERE id = $1
            "#,
        )
        .bind(role_id.as_uuid())
        .bind(name.as_str())
        .execute(&self.pool)
        .await
        .map_err(|error| map_role_conflict(error, &name, "rename"))?;

        if result.rows_affected() == 0 {
            return Err(AppError::NotFound(format!("role '{role_id}' was not found")));
        }

        Ok(Role { id: role_id, name })
    }

    async fn delete_role(&self, role_id: RoleId) -> AppResult<()> {
        let result = sqlx::query(
            r#"
            DELETE FROM roles
            WHERE id = $1
            "#,
        )
        .bind(role_id.as_uuid())
        .execute(&self.pool)
        .await
        .map_err(|error| AppError::Internal(format!("failed to delete role: {error}")))?;

        if result.rows_affected() == 0 {
            return Err(AppError::NotFound(format!("role '{role_id}' was not found")));
        }

        Ok(())
    }

    async fn count_users_with_role(&self, role_id: RoleId) -> AppResult<u64> {
        let count = sqlx::query_scalar::<_, i64>(
            r#"
            SELECT COUNT(*)
            FROM users
            WHERE role_id = $1
            "#,
        )
        .bind(role_id.as_uuid())
        .fetch_one(&self.pool)
        .await
        .map_err(|error| AppError::Internal(format!("failed to count role holders: {error}")))?;

        u64::try_from(count)
            .map_err(|error| AppError::Internal(format!("invalid role holder count: {error}")))
    }

    async fn list_grants(&self, role_id: RoleId) -> AppResult<Vec<Grant>> {
        let tags = sqlx::query_scalar::<_, String>(
            r#"
            SELECT tag
            FROM role_grants
            WHERE role_id = $1
            "#,
        )
        .bind(role_id.as_uuid())
        .fetch_all(&self.pool)
        .await
        .map_err(|error| AppError::Internal(format!("failed to list role grants: {error}")))?;

        let mut grants = tags
            .iter()
            .map(|tag| decode_grant(tag.as_str(), role_id))
            .collect::<AppResult<Vec<_>>>()?;
        grants.sort();

        Ok(grants)
    }

    async fn replace_grants(&self, role_id: RoleId, grants: Vec<Grant>) -> AppResult<()> {
        let mut transaction =
            self.pool.begin().await.map_err(|error| {
                AppError::Internal(format!("failed to begin transaction: {error}"))
            })?;

        sqlx::query(
            r#"
            DELETE FROM role_grants
            WHERE role_id = $1
            "#,
        )
        .bind(role_id.as_uuid())
        .execute(&mut *transaction)
        .await
        .map_err(|error| AppError::Internal(format!("failed to clear role grants: {error}")))?;

        for grant in &grants {
            sqlx::query(
                r#"
                INSERT INTO role_grants (role_id, tag)
                VALUES ($1, $2)
                ON CONFLICT (role_id, tag) DO NOTHING
                "#,
            )
            .bind(role_id.as_uuid())
            .bind(grant.as_str())
            .execute(&mut *transaction)
            .await
            .map_err(|error| {
                AppError::Internal(format!("failed to persist role grants: {error}"))
            })?;
        }

        transaction.commit().await.map_err(|error| {
            AppError::Internal(format!("failed to commit transaction: {error}"))
        })?;

        Ok(())
    }

    async fn ensure_grant(&self, role_id: RoleId, grant: Grant) -> AppResult<bool> {
        let result = sqlx::query(
            r#"
            INSERT INTO role_grants (role_id, tag)
            VALUES ($1, $2)
            ON CONFLICT (role_id, tag) DO NOTHING
            "#,
        )
        .bind(role_id.as_uuid())
        .bind(grant.as_str())
        .execute(&self.pool)
        .await
        .map_err(|error| AppError::Internal(format!("failed to ensure role grant: {error}")))?;

        Ok(result.rows_affected() > 0)
    }
}
