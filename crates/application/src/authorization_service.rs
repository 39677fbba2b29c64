use std::collections::BTreeSet;
use std::sync::Arc;

use async_trait::async_trait;
use wardbook_core::{AppError, AppResult, UserIdentity};
use wardbook_domain::{Grant, Permission, Role, RoleId, UserId};


/// Modules every authenticated role can open.
const ALWAYS_AVAILABLE_MODULES: [&str; 2] = ["home", "profile"];

/// Repository port for role and grant lookups.
#[async_trait]
pub trait AuthorizationRepository: Send + Sync {
    /// Resolves the role currently assigned to a subject.
    async fn find_role_for_subject(&self, subject: &str) -> AppResult<Option<Role>>;

    /// Lists stored grants for a role.
    async fn list_grants_for_role(&self, role_id: RoleId) -> AppResult<Vec<Grant>>;
}

/// Outcome of one module-permission check.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AccessDecision {
    /// The role may invoke the operation.
    Allow,
    /// The role may not invoke the operation.
    Deny,
}

impl AccessDecision {
    /// Returns whether access was granted.
    #[must_use]
    pub fn is_allowed(self) -> bool {
        matches!(self, Self::Allow)
    }
}

/// Frontend modules a role can open.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ModuleAccess {
    /// Wildcard roles see every module.
    All,
    /// Explicit module keys.
    Modules(BTreeSet<String>),
}

/// Application service for role-based authorization checks.
///
/// Every permission decision in the crate goes through this service.
#[derive(Clone)]
pub struct AuthorizationService {
    repository: Arc<dyn AuthorizationRepository>,
}

impl AuthorizationService {
    /// Creates a new authorization service from a repository implementation.
    #[must_use]
    pub fn new(repository: Arc<dyn AuthorizationRepository>) -> Self {
        Self { repository }
    }

    /// Decides whether a role may use the required permission.
    pub async fn authorize(
        &self,
        role_id: RoleId,
        required: Permission,
    ) -> AppResult<AccessDecision> {
        let grants = self.repository.list_grants_for_role(role_id).await?;

        if grants.iter().any(|grant| grant.covers(required)) {
            return Ok(AccessDecision::Allow);
        }

        Ok(AccessDecision::Deny)
    }

    /// Resolves the caller's role, denying callers without one.
    pub async fn role_for(&self, actor: &UserIdentity) -> AppResult<Role> {
        self.repository
            .find_role_for_subject(actor.subject())
            .await?
            .ok_or_else(|| {
                AppError::Forbidden(format!(
                    "subject '{}' has no resolvable role",
                    actor.subject()
                ))
            })
    }

    /// Ensures the caller's role holds the required permission.
    pub async fn require_permission(
        &self,
        actor: &UserIdentity,
        permission: Permission,
    ) -> AppResult<()> {
        let role = self.role_for(actor).await?;

        match self.authorize(role.id, permission).await? {
            AccessDecision::Allow => Ok(()),
            AccessDecision::Deny => Err(AppError::Forbidden(format!(
                "role '{}' is missing permission '{}'",
                role.name,
                permission.as_str()
            ))),
        }
    }

    /// Returns whether the caller currently has the permission.
    pub async fn has_permission(
        &self,
        actor: &UserIdentity,
        permission: Permission,
    ) -> AppResult<bool> {
        let Some(role) = self
            .repository
            .find_role_for_subject(actor.subject())
            .await?
        else {
            return Ok(false);
        };

        Ok(self.authorize(role.id, permission).await?.is_allowed())
    }

    /// Ensures the caller holds the administrative role.
    pub async fn require_admin(&self, actor: &UserIdentity) -> AppResult<Role> {
        let role = self.role_for(actor).await?;
        if !role.is_admin() {
            return Err(AppError::Forbidden(format!(
                "subject '{}' is not an administrator",
                actor.subject()
            )));
        }

        Ok(role)
    }

    /// Ensures the caller is an administrator or owns the resource.
    ///
    /// Independent of module permissions; a use case applies one rule or the
    /// other, never both.
    pub async fn require_owner_or_admin(
        &self,
        actor: &UserIdentity,
        owner: UserId,
    ) -> AppResult<()> {
        let role = self.role_for(actor).await?;
        if role.is_admin() || actor.subject() == owner.to_string() {
            return Ok(());
        }

        Err(AppError::Forbidden(format!(
            "subject '{}' neither owns the resource nor is an administrator",
            actor.subject()
        )))
    }

    /// Resolves the frontend modules unlocked for a role.
    pub async fn accessible_modules(&self, role_id: RoleId) -> AppResult<ModuleAccess> {
        let grants = self.repository.list_grants_for_role(role_id).await?;

        if grants.contains(&Grant::All) {
            return Ok(ModuleAccess::All);
        }

        let mut modules: BTreeSet<String> = grants
            .iter()
            .filter_map(|grant| match grant {
                Grant::All => None,
                Grant::Permission(permission) => Some(permission.descriptor().module.to_owned()),
            })
            .collect();
        modules.extend(ALWAYS_AVAILABLE_MODULES.iter().map(|module| (*module).to_owned()));

        Ok(ModuleAccess::Modules(modules))
    }
}
