use async_trait::async_trait;

use wardbook_core::AppResult;
use wardbook_domain::{EmailAddress, RoleId, UserId};

/// Stored user account.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UserAccount {
    /// Stable user identifier.
    pub id: UserId,
    /// Unique login email.
    pub email: EmailAddress,
    /// Display name.
    pub display_name: String,
    /// Role assigned to the user.
    pub role_id: RoleId,
    /// Argon2 PHC hash of the password.
    pub password_hash: String,
}

/// Input for creating a user account.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewUserAccount {
    /// Unique login email.
    pub email: EmailAddress,
    /// Display name.
    pub display_name: String,
    /// Role assigned to the user.
    pub role_id: RoleId,
    /// Argon2 PHC hash of the password.
    pub password_hash: String,
}

/// Repository port for user accounts.
#[async_trait]
pub trait UserRepository: Send + Sync {
    /// Finds a user by email.
    async fn find_by_email(&self, email: &EmailAddress) -> AppResult<Option<UserAccount>>;

    /// Finds a user by identifier.
    async fn find_by_id(&self, user_id: UserId) -> AppResult<Option<UserAccount>>;

    /// Creates a user. Fails with a conflict when the email is taken.
    async fn create_user(&self, input: NewUserAccount) -> AppResult<UserAccount>;

    /// Deletes a user.
    async fn delete_user(&self, user_id: UserId) -> AppResult<()>;

    /// Moves a user to another role.
    async fn update_user_role(&self, user_id: UserId, role_id: RoleId) -> AppResult<()>;
}

/// Port for password hashing and verification.
pub trait PasswordHasher: Send + Sync {
    /// Hashes a plaintext password into a PHC string.
    fn hash_password(&self, password: &str) -> AppResult<String>;

    /// Verifies a plaintext password against a stored hash.
    fn verify_password(&self, password: &str, hash: &str) -> AppResult<bool>;
}
