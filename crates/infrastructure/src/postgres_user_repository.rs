//! PostgreSQL-backed user repository.

use async_trait::async_trait;
use sqlx::PgPool;

use wardbook_application::{NewUserAccount, UserAccount, UserRepository};
use wardbook_core::{AppError, AppResult};
use wardbook_domain::{EmailAddress, RoleId, UserId};

/// PostgreSQL implementation of the user repository port.
#[derive(Clone)]
pub struct PostgresUserRepository {
    pool: PgPool,
}

impl PostgresUserRepository {
    /// Creates a repository with the provided connection pool.
    #[must_use]
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[derive(Debug, sqlx::FromRow)]
struct UserRow {
    id: uuid::Uuid,
    email: String,
    display_name: String,
    role_id: uuid::Uuid,
    password_hash: String,
}

impl TryFrom<UserRow> for UserAccount {
    type Error = AppError;

    fn try_from(row: UserRow) -> Result<Self, Self::Error> {
        let email = EmailAddress::new(row.email.as_str()).map_err(|error| {
            AppError::Internal(format!(
                "failed to decode email for user '{}': {error}",
                row.id
            ))
        })?;

        Ok(Self {
            id: UserId::from_uuid(row.id),
            email,
            display_name: row.display_name,
            role_id: RoleId::from_uuid(row.role_id),
            password_hash: row.password_hash,
        })
    }
}

#[async_trait]
impl UserRepository for PostgresUserRepository {
    async fn find_by_email(&self, email: &EmailAddress) -> AppResult<Option<UserAccount>> {
        let row = sqlx::query_as::<_, UserRow>(
            r#"
            SELECT id, email, display_name, role_id, password_hash
            FROM users
            WHERE email = $1
            "#,
        )
        .bind(email.as_str())
        .fetch_optional(&self.pool)
        .await
        .map_err(|error| AppError::Internal(format!("failed to find user by email: {error}")))?;

        row.map(UserAccount::try_from).transpose()
    }

    async fn find_by_id(&self, user_id: UserId) -> AppResult<Option<UserAccount>> {
        let row = sqlx::query_as::<_, UserRow>(
            r#"
            SELECT id, email, display_name, role_id, password_hash
            FROM users
            WHERE id = $1
            "#,
        )
        .bind(user_id.as_uuid())
        .fetch_optional(&self.pool)
        .await
        .map_err(|error| AppError::Internal(format!("failed to find user by id: {error}")))?;

        row.map(UserAccount::try_from).transpose()
    }

    async fn create_user(&self, input: NewUserAccount) -> AppResult<UserAccount> {
        let user_id = UserId::new();

        sqlx::query(
            r#"
            INSERT INTO users (id, email, display_name, role_id, password_hash)
            VALUES ($1, $2, $3, $4, $5)
            "#,
        )
        .bind(user_id.as_uuid())
        .bind(input.email.as_str())
        .bind(input.display_name.as_str())
        .bind(input.role_id.as_uuid())
        .bind(input.password_hash.as_str())
        .execute(&self.pool)
        .await
        .map_err(|error| {
            if let sqlx::Error::Database(database_error) = &error
                && database_error.code().as_deref() == Some("23505")
            {
                return AppError::Conflict(format!(
                    "email '{}' is already registered",
                    input.email.as_str()
                ));
            }

            AppError::Internal(format!("failed to create user: {error}"))
        })?;

        Ok(UserAccount {
            id: user_id,
            email: input.email,
            display_name: input.display_name,
            role_id: input.role_id,
            password_hash: input.password_hash,
        })
    }

    async fn delete_user(&self, user_id: UserId) -> AppResult<()> {
        let result = sqlx::query(
            r#"
            DELETE FROM users
            WHERE id = $1
            "#,
        )
        .bind(user_id.as_uuid())
        .execute(&self.pool)
        .await
        .map_err(|error| AppError::Internal(format!("failed to delete user: {error}")))?;

        if result.rows_affected() == 0 {
            return Err(AppError::NotFound(format!("user '{user_id}' was not found")));
        }

        Ok(())
    }

    async fn update_user_role(&self, user_id: UserId, role_id: RoleId) -> AppResult<()> {
        let result = sqlx::query(
            r#"
            UPDATE users
            SET role_id = $2
            WHERE id = $1
            "#,
        )
        .bind(user_id.as_uuid())
        .bind(role_id.as_uuid())
        .execute(&self.pool)
        .await
        .map_err(|error| AppError::Internal(format!("failed to update user role: {error}")))?;

        if result.rows_affected() == 0 {
            return Err(AppError::NotFound(format!("user '{user_id}' was not found")));
        }

        Ok(())
    }
}
