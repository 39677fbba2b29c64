use std::collections::BTreeSet;
use std::str::FromStr;
use std::sync::Arc;

use tracing::info;
use wardbook_core::{AppError, AppResult, UserIdentity};
use wardbook_domain::{Grant, Permission, Role, RoleId, RoleName, ServiceDescriptor};

use crate::{AuthorizationService, ModuleAccess, RoleAdminRepository, RoleDefinition};


/// Application service for role administration.
///
/// Only administrators may call it. The admin role itself is protected: it
/// cannot be renamed, deleted, or have its grants replaced.
#[derive(Clone)]
pub struct RoleAdminService {
    authorization_service: AuthorizationService,
    repository: Arc<dyn RoleAdminRepository>,
}

impl RoleAdminService {
    /// Creates a new service from required dependencies.
    #[must_use]
    pub fn new(
        authorization_service: AuthorizationService,
        repository: Arc<dyn RoleAdminRepository>,
    ) -> Self {
        Self {
            authorization_service,
            repository,
        }
    }

    /// Lists all roles with their grants.
    pub async fn list_roles(&self, actor: &UserIdentity) -> AppResult<Vec<RoleDefinition>> {
        self.authorization_service.require_admin(actor).await?;
        self.repository.list_roles().await
    }

    /// Creates a custom role.
    pub async fn create_role(&self, actor: &UserIdentity, name: &str) -> AppResult<Role> {
        self.authorization_service.require_admin(actor).await?;

        if self
            .repository
            .find_role_by_name(&RoleName::admin())
            .await?
            .is_none()
        {
            return Err(AppError::Forbidden(
                "roles cannot be added until an admin is registered".to_owned(),
            ));
        }

        let name = RoleName::new(name)?;
        if let Some(existing) = self.repository.find_role_by_name(&name).await? {
            return Err(AppError::Conflict(format!(
                "role '{}' already exists",
                existing.name
            )));
        }

        let role = self.repository.create_role(name).await?;
        info!(role_id = %role.id, role = %role.name, actor = actor.subject(), "role created");

        Ok(role)
    }

    /// Renames a custom role.
    pub async fn rename_role(
        &self,
        actor: &UserIdentity,
        role_id: RoleId,
        name: &str,
    ) -> AppResult<Role> {
        self.authorization_service.require_admin(actor).await?;

        let role = self.require_role(role_id).await?;
        if role.is_admin() {
            return Err(AppError::PolicyViolation(
                "the admin role cannot be renamed".to_owned(),
            ));
        }

        let name = RoleName::new(name)?;
        if name.is_admin() {
            return Err(AppError::PolicyViolation(
                "no role can be renamed to the admin role".to_owned(),
            ));
        }

        if let Some(existing) = self.repository.find_role_by_name(&name).await?
            && existing.id != role_id
        {
            return Err(AppError::Conflict(format!(
                "role '{}' already exists",
                existing.name
            )));
        }

        let renamed = self.repository.rename_role(role_id, name).await?;
        info!(role_id = %role_id, from = %role.name, to = %renamed.name, "role renamed");

        Ok(renamed)
    }

    /// Deletes a custom role that no user holds.
    pub async fn delete_role(&self, actor: &UserIdentity, role_id: RoleId) -> AppResult<()> {
        self.authorization_service.require_admin(actor).await?;

        let role = self.require_role(role_id).await?;
        if role.is_admin() {
            return Err(AppError::PolicyViolation(
                "the admin role cannot be deleted".to_owned(),
            ));
        }

        let holders = self.repository.count_users_with_role(role_id).await?;
        if holders > 0 {
            return Err(AppError::Conflict(format!(
                "role '{}' is still assigned to {holders} user(s)",
                role.name
            )));
        }

        self.repository.delete_role(role_id).await?;
        info!(role_id = %role_id, role = %role.name, actor = actor.subject(), "role deleted");

        Ok(())
    }

    /// Returns a role with its stored grants.
    pub async fn role_permissions(
        &self,
        actor: &UserIdentity,
        role_id: RoleId,
    ) -> AppResult<RoleDefinition> {
        self.authorization_service.require_admin(actor).await?;

        let role = self.require_role(role_id).await?;
        let grants = self.repository.list_grants(role_id).await?;

        Ok(RoleDefinition { role, grants })
    }

    /// Replaces the grant set of a custom role with the given tags.
    pub async fn replace_role_permissions(
        &self,
        actor: &UserIdentity,
        role_id: RoleId,
        tags: &[String],
    ) -> AppResult<RoleDefinition> {
        self.authorization_service.require_admin(actor).await?;

        let role = self.require_role(role_id).await?;
        if role.is_admin() {
            return Err(AppError::PolicyViolation(
                "permissions of the admin role cannot be updated; it holds every permission"
                    .to_owned(),
            ));
        }

        let mut grants = BTreeSet::new();
        for tag in tags {
            match Grant::from_str(tag.as_str())? {
                Grant::All => {
                    return Err(AppError::Validation(format!(
                        "the '{}' grant is reserved for the admin role",
                        Grant::ALL_TAG
                    )));
                }
                grant => {
                    grants.insert(grant);
                }
            }
        }
        let grants: Vec<Grant> = grants.into_iter().collect();

        self.repository
            .replace_grants(role_id, grants.clone())
            .await?;
        info!(
            role_id = %role_id,
            role = %role.name,
            grant_count = grants.len(),
            "role permissions replaced"
        );

        Ok(RoleDefinition { role, grants })
    }

    /// Returns the registry of grantable services.
    pub async fn available_services(
        &self,
        actor: &UserIdentity,
    ) -> AppResult<Vec<ServiceDescriptor>> {
        self.authorization_service.require_admin(actor).await?;

        Ok(Permission::all()
            .iter()
            .map(Permission::descriptor)
            .collect())
    }

    /// Returns the frontend modules a role can open.
    pub async fn accessible_modules(
        &self,
        actor: &UserIdentity,
        role_id: RoleId,
    ) -> AppResult<ModuleAccess> {
        self.authorization_service.role_for(actor).await?;
        self.require_role(role_id).await?;

        self.authorization_service.accessible_modules(role_id).await
    }

    async fn require_role(&self, role_id: RoleId) -> AppResult<Role> {
        self.repository
            .find_role(role_id)
            .await?
            .ok_or_else(|| AppError::NotFound(format!("role '{role_id}' was not found")))
    }
}
