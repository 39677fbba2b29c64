use std::sync::Arc;

use tracing::info;
use wardbook_core::{AppResult, NonEmptyString};
use wardbook_domain::{EmailAddress, Grant, Role, RoleName};

use crate::{NewUserAccount, PasswordHasher, RoleAdminRepository, UserRepository};


/// Administrator account created on first start.
#[derive(Debug, Clone)]
pub struct AdminSeed {
    /// Login email of the administrator.
    pub email: String,
    /// Initial plaintext password.
    pub password: String,
    /// Display name of the administrator.
    pub display_name: String,
}

/// What a bootstrap run created.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct BootstrapReport {
    /// The admin role was created.
    pub role_created: bool,
    /// The admin user was created.
    pub user_created: bool,
    /// The admin wildcard grant was created.
    pub grant_created: bool,
}

/// Startup procedure that seeds the admin role, user, and wildcard grant.
///
/// Each step checks before it writes, so running it again is a no-op.
#[derive(Clone)]
pub struct BootstrapService {
    roles: Arc<dyn RoleAdminRepository>,
    users: Arc<dyn UserRepository>,
    password_hasher: Arc<dyn PasswordHasher>,
}

impl BootstrapService {
    /// Creates a new service from required dependencies.
    #[must_use]
    pub fn new(
        roles: Arc<dyn RoleAdminRepository>,
        users: Arc<dyn UserRepository>,
        password_hasher: Arc<dyn PasswordHasher>,
    ) -> Self {
        Self {
            roles,
            users,
            password_hasher,
        }
    }

    /// Ensures admin role, admin user and admin wildcard grant exist.
    pub async fn ensure_defaults(&self, seed: &AdminSeed) -> AppResult<BootstrapReport> {
        let (admin_role, role_created) = self.ensure_admin_role().await?;
        let user_created = self.ensure_admin_user(&admin_role, seed).await?;
        let grant_created = self.roles.ensure_grant(admin_role.id, Grant::All).await?;

        let report = BootstrapReport {
            role_created,
            user_created,
            grant_created,
        };
        info!(
            role_id = %admin_role.id,
            role_created,
            user_created,
            grant_created,
            "bootstrap defaults ensured"
        );

        Ok(report)
    }

    async fn ensure_admin_role(&self) -> AppResult<(Role, bool)> {
        let name = RoleName::admin();
        if let Some(role) = self.roles.find_role_by_name(&name).await? {
            return Ok((role, false));
        }

        let role = self.roles.create_role(name).await?;
        Ok((role, true))
    }

    async fn ensure_admin_user(&self, admin_role: &Role, seed: &AdminSeed) -> AppResult<bool> {
        let email = EmailAddress::new(seed.email.as_str())?;
        if self.users.find_by_email(&email).await?.is_some() {
            return Ok(false);
        }

        let password = NonEmptyString::new(seed.password.as_str())?;
        let display_name = NonEmptyString::new(seed.display_name.as_str())?;
        let password_hash = self.password_hasher.hash_password(password.as_str())?;

        self.users
            .create_user(NewUserAccount {
                email,
                display_name: display_name.into(),
                role_id: admin_role.id,
                password_hash,
            })
            .await?;

        Ok(true)
    }
}
