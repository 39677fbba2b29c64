use std::collections::{BTreeSet, HashMap};

use async_trait::async_trait;
use tokio::sync::RwLock;
use wardbook_application::{
    AuthorizationRepository, NewUserAccount, RoleAdminRepository, RoleDefinition, UserAccount,
    UserRepository,
};
use wardbook_core::{AppError, AppResult};
use wardbook_domain::{EmailAddress, Grant, Role, RoleId, RoleName, UserId};


/// In-memory roles, grants, and users.
///
/// Implements every security port so one instance can back the whole
/// security stack in tests and local runs.
#[derive(Debug, Default)]
pub struct InMemorySecurityRepository {
    roles: RwLock<HashMap<RoleId, Role>>,
    grants: RwLock<HashMap<RoleId, BTreeSet<Grant>>>,
    users: RwLock<HashMap<UserId, UserAccount>>,
}

impl InMemorySecurityRepository {
    /// Creates an empty in-memory repository.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl AuthorizationRepository for InMemorySecurityRepository {
    async fn find_role_for_subject(&self, subject: &str) -> AppResult<Option<Role>> {
        let Ok(user_id) = subject.parse::<UserId>() else {
            return Ok(None);
        };

        let role_id = self.users.read().await.get(&user_id).map(|user| user.role_id);
        let Some(role_id) = role_id else {
            return Ok(None);
        };

        Ok(self.roles.read().await.get(&role_id).cloned())
    }

    async fn list_grants_for_role(&self, role_id: RoleId) -> AppResult<Vec<Grant>> {
        self.list_grants(role_id).await
    }
}

#[async_trait]
impl RoleAdminRepository for InMemorySecurityRepository {
    async fn list_roles(&self) -> AppResult<Vec<RoleDefinition>> {
        let roles = self.roles.read().await;
        let grants = self.grants.read().await;

        let mut definitions: Vec<RoleDefinition> = roles
            .values()
            .map(|role| RoleDefinition {
                role: role.clone(),
                grants: grants
                    .get(&role.id)
                    .map(|grants| grants.iter().copied().collect())
                    .unwrap_or_default(),
            })
            .collect();
        definitions.sort_by_key(|definition| definition.role.name.normalized());

        Ok(definitions)
    }

    async fn find_role(&self, role_id: RoleId) -> AppResult<Option<Role>> {
        Ok(self.roles.read().await.get(&role_id).cloned())
    }

    async fn find_role_by_name(&self, name: &RoleName) -> AppResult<Option<Role>> {
        Ok(self
            .roles
            .read()
            .await
            .values()
            .find(|role| &role.name == name)
            .cloned())
    }

    async fn create_role(&self, name: RoleName) -> AppResult<Role> {
        let mut roles = self.roles.write().await;
        if roles.values().any(|role| role.name == name) {
            return Err(AppError::Conflict(format!("role '{name}' already exists")));
        }

        let role = Role {
            id: RoleId::new(),
            name,
        };
        roles.insert(role.id, role.clone());

        Ok(role)
    }

    async fn rename_role(&self, role_id: RoleId, name: RoleName) -> AppResult<Role> {
        let mut roles = self.roles.write().await;
        if roles
            .values()
            .any(|role| role.id != role_id && role.name == name)
        {
            return Err(AppError::Conflict(format!("role '{name}' already exists")));
        }

        let role = roles
            .get_mut(&role_id)
            .ok_or_else(|| AppError::NotFound(format!("role '{role_id}' was not found")))?;
        role.name = name;

        Ok(role.clone())
    }

    async fn delete_role(&self, role_id: RoleId) -> AppResult<()> {
        if self.roles.write().await.remove(&role_id).is_none() {
            return Err(AppError::NotFound(format!("role '{role_id}' was not found")));
        }
        self.grants.write().await.remove(&role_id);

        Ok(())
    }

    async fn count_users_with_role(&self, role_id: RoleId) -> AppResult<u64> {
        let count = self
            .users
            .read()
            .await
            .values()
            .filter(|user| user.role_id == role_id)
            .count();

        u64::try_from(count)
            .map_err(|error| AppError::Internal(format!("invalid role holder count: {error}")))
    }

    async fn list_grants(&self, role_id: RoleId) -> AppResult<Vec<Grant>> {
        Ok(self
            .grants
            .read()
            .await
            .get(&role_id)
            .map(|grants| grants.iter().copied().collect())
            .unwrap_or_default())
    }

    async fn replace_grants(&self, role_id: RoleId, grants: Vec<Grant>) -> AppResult<()> {
        self.grants
            .write()
            .await
            .insert(role_id, grants.into_iter().collect());

        Ok(())
    }

    async fn ensure_grant(&self, role_id: RoleId, grant: Grant) -> AppResult<bool> {
        Ok(self
            .grants
            .write()
            .await
            .entry(role_id)
            .or_default()
            .insert(grant))
    }
}

#[async_trait]
impl UserRepository for InMemorySecurityRepository {
    async fn find_by_email(&self, email: &EmailAddress) -> AppResult<Option<UserAccount>> {
        Ok(self
            .users
            .read()
            .await
            .values()
            .find(|user| &user.email == email)
            .cloned())
    }

    async fn find_by_id(&self, user_id: UserId) -> AppResult<Option<UserAccount>> {
        Ok(self.users.read().await.get(&user_id).cloned())
    }

    async fn create_user(&self, input: NewUserAccount) -> AppResult<UserAccount> {
        let mut users = self.users.write().await;
        if users.values().any(|user| user.email == input.email) {
            return Err(AppError::Conflict(format!(
                "email '{}' is already registered",
                input.email.as_str()
            )));
        }

        let account = UserAccount {
            id: UserId::new(),
            email: input.email,
            display_name: input.display_name,
            role_id: input.role_id,
            password_hash: input.password_hash,
        };
        users.insert(account.id, account.clone());

        Ok(account)
    }

    async fn delete_user(&self, user_id: UserId) -> AppResult<()> {
        if self.users.write().await.remove(&user_id).is_none() {
            return Err(AppError::NotFound(format!("user '{user_id}' was not found")));
        }

        Ok(())
    }

    async fn update_user_role(&self, user_id: UserId, role_id: RoleId) -> AppResult<()> {
        let mut users = self.users.write().await;
        let user = users
            .get_mut(&user_id)
            .ok_or_else(|| AppError::NotFound(format!("user '{user_id}' was not found")))?;
        user.role_id = role_id;

        Ok(())
    }
}
