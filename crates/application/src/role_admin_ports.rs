use async_trait::async_trait;

use wardbook_core::AppResult;
use wardbook_domain::{Grant, Role, RoleId, RoleName};

/// Role definition returned to callers.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RoleDefinition {
    /// Persisted role.
    pub role: Role,
    /// Stored grants, ordered by tag.
    pub grants: Vec<Grant>,
}

/// Repository port for role and grant administration.
#[async_trait]
pub trait RoleAdminRepository: Send + Sync {
    /// Lists all roles with their grants, ordered by name.
    async fn list_roles(&self) -> AppResult<Vec<RoleDefinition>>;

    /// Finds a role by identifier.
    async fn find_role(&self, role_id: RoleId) -> AppResult<Option<Role>>;

    /// Finds a role by case-insensitive name.
    async fn find_role_by_name(&self, name: &RoleName) -> AppResult<Option<Role>>;

    /// Creates a role. Fails with a conflict when the name is taken.
    async fn create_role(&self, name: RoleName) -> AppResult<Role>;

    /// Renames a role. Fails with a conflict when the name is taken.
    async fn rename_role(&self, role_id: RoleId, name: RoleName) -> AppResult<Role>;

    /// Deletes a role and its grants.
    async fn delete_role(&self, role_id: RoleId) -> AppResult<()>;

    /// Counts users currently assigned to a role.
    async fn count_users_with_role(&self, role_id: RoleId) -> AppResult<u64>;

    /// Lists stored grants for a role.
    async fn list_grants(&self, role_id: RoleId) -> AppResult<Vec<Grant>>;

    /// Replaces the full grant set of a role in one transaction.
    async fn replace_grants(&self, role_id: RoleId, grants: Vec<Grant>) -> AppResult<()>;

    /// Adds one grant if missing. Returns whether a grant was inserted.
    async fn ensure_grant(&self, role_id: RoleId, grant: Grant) -> AppResult<bool>;
}
