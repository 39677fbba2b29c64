use std::sync::Arc;

use tracing::{info, warn};
use wardbook_core::{AppError, AppResult, UserIdentity};
use wardbook_domain::{EmailAddress, RoleId, UserId};

use crate::{AuthorizationService, PasswordHasher, RoleAdminRepository, UserAccount, UserRepository};

#[cfg(test)]
mod tests;

const INVALID_CREDENTIALS: &str = "invalid email or password";

/// Application service for login and user administration.
#[derive(Clone)]
pub struct UserService {
    authorization_service: AuthorizationService,
    users: Arc<dyn UserRepository>,
    roles: Arc<dyn RoleAdminRepository>,
    password_hasher: Arc<dyn PasswordHasher>,
}

impl UserService {
    /// Creates a new service from required dependencies.
    #[must_use]
    pub fn new(
        authorization_service: AuthorizationService,
        users: Arc<dyn UserRepository>,
        roles: Arc<dyn RoleAdminRepository>,
        password_hasher: Arc<dyn PasswordHasher>,
    ) -> Self {
        Self {
            authorization_service,
            users,
            roles,
            password_hasher,
        }
    }

    /// Verifies credentials and returns the session identity.
    pub async fn login(&self, email: &str, password: &str) -> AppResult<UserIdentity> {
        let Ok(email) = EmailAddress::new(email) else {
            return Err(AppError::Unauthorized(INVALID_CREDENTIALS.to_owned()));
        };

        let Some(account) = self.users.find_by_email(&email).await? else {
            warn!("login attempt for unknown email");
            return Err(AppError::Unauthorized(INVALID_CREDENTIALS.to_owned()));
        };

        if !self
            .password_hasher
            .verify_password(password, account.password_hash.as_str())?
        {
            warn!(user_id = %account.id, "login attempt with wrong password");
            return Err(AppError::Unauthorized(INVALID_CREDENTIALS.to_owned()));
        }

        info!(user_id = %account.id, "user logged in");

        Ok(UserIdentity::new(
            account.id.to_string(),
            account.display_name,
            Some(account.email.into()),
        ))
    }

    /// Deletes a user. Users holding the admin role are protected.
    pub async fn delete_user(&self, actor: &UserIdentity, user_id: UserId) -> AppResult<()> {
        self.authorization_service.require_admin(actor).await?;

        let account = self.require_user(user_id).await?;
        if self.is_admin_role(account.role_id).await? {
            return Err(AppError::PolicyViolation(
                "the admin user cannot be deleted".to_owned(),
            ));
        }

        self.users.delete_user(user_id).await?;
        info!(user_id = %user_id, actor = actor.subject(), "user deleted");

        Ok(())
    }

    /// Moves a user to another role. Admin membership can neither be granted
    /// nor revoked through this operation.
    pub async fn change_user_role(
        &self,
        actor: &UserIdentity,
        user_id: UserId,
        role_id: RoleId,
    ) -> AppResult<()> {
        self.authorization_service.require_admin(actor).await?;

        let account = self.require_user(user_id).await?;
        let target_role = self
            .roles
            .find_role(role_id)
            .await?
            .ok_or_else(|| AppError::NotFound(format!("role '{role_id}' was not found")))?;
        let currently_admin = self.is_admin_role(account.role_id).await?;

        if currently_admin && !target_role.is_admin() {
            return Err(AppError::PolicyViolation(
                "the admin user cannot be moved to another role".to_owned(),
            ));
        }
        if !currently_admin && target_role.is_admin() {
            return Err(AppError::PolicyViolation(
                "users cannot be promoted to the admin role".to_owned(),
            ));
        }

        self.users.update_user_role(user_id, role_id).await?;
        info!(user_id = %user_id, role = %target_role.name, "user role changed");

        Ok(())
    }

    async fn require_user(&self, user_id: UserId) -> AppResult<UserAccount> {
        self.users
            .find_by_id(user_id)
            .await?
            .ok_or_else(|| AppError::NotFound(format!("user '{user_id}' was not found")))
    }

    async fn is_admin_role(&self, role_id: RoleId) -> AppResult<bool> {
        Ok(self
            .roles
            .find_role(role_id)
            .await?
            .is_some_and(|role| role.is_admin()))
    }
}
