use serde::{Deserialize, Serialize};
use ts_rs::TS;
use wardbook_application::{ModuleAccess, RoleDefinition};
use wardbook_core::UserIdentity;
use wardbook_domain::{Role, ServiceDescriptor};

/// Credentials posted to the login endpoint.
#[derive(Debug, Deserialize, TS)]
#[ts(
    export,
    export_to = "../../../packages/api-types/src/generated/login-request.ts"
)]
pub struct LoginRequest {
    pub email: String,
    pub password: String,
}

/// Modules the caller's role can open. `all` is set for wildcard roles.
#[derive(Debug, Serialize, TS, PartialEq, Eq)]
#[ts(
    export,
    export_to = "../../../packages/api-types/src/generated/module-access-response.ts"
)]
pub struct ModuleAccessResponse {
    pub all: bool,
    pub modules: Vec<String>,
}

impl From<ModuleAccess> for ModuleAccessResponse {
    fn from(value: ModuleAccess) -> Self {
        match value {
            ModuleAccess::All => Self {
                all: true,
                modules: Vec::new(),
            },
            ModuleAccess::Modules(modules) => Self {
                all: false,
                modules: modules.into_iter().collect(),
            },
        }
    }
}

/// API representation of the authenticated user.
#[derive(Debug, Serialize, TS)]
#[ts(
    export,
    export_to = "../../../packages/api-types/src/generated/user-identity-response.ts"
)]
pub struct UserIdentityResponse {
    pub subject: String,
    pub display_name: String,
    pub email: Option<String>,
    pub role_id: String,
    pub role_name: String,
    pub access: ModuleAccessResponse,
}

impl UserIdentityResponse {
    pub fn new(identity: &UserIdentity, role: &Role, access: ModuleAccess) -> Self {
        Self {
            subject: identity.subject().to_owned(),
            display_name: identity.display_name().to_owned(),
            email: identity.email().map(ToOwned::to_owned),
            role_id: role.id.to_string(),
            role_name: role.name.as_str().to_owned(),
            access: ModuleAccessResponse::from(access),
        }
    }
}

/// Incoming payload for custom role creation.
#[derive(Debug, Deserialize, TS)]
#[ts(
    export,
    export_to = "../../../packages/api-types/src/generated/create-role-request.ts"
)]
pub struct CreateRoleRequest {
    pub name: String,
}

/// Incoming payload for role renames.
#[derive(Debug, Deserialize, TS)]
#[ts(
    export,
    export_to = "../../../packages/api-types/src/generated/rename-role-request.ts"
)]
pub struct RenameRoleRequest {
    pub name: String,
}

/// Incoming payload replacing a role's permission tags.
#[derive(Debug, Deserialize, TS)]
#[ts(
    export,
    export_to = "../../../packages/api-types/src/generated/replace-role-permissions-request.ts"
)]
pub struct ReplaceRolePermissionsRequest {
    pub permissions: Vec<String>,
}

/// API representation of a role and its grant tags.
#[derive(Debug, Serialize, TS)]
#[ts(
    export,
    export_to = "../../../packages/api-types/src/generated/role-response.ts"
)]
pub struct RoleResponse {
    pub role_id: String,
    pub name: String,
    pub is_admin: bool,
    pub permissions: Vec<String>,
}

impl From<RoleDefinition> for RoleResponse {
    fn from(value: RoleDefinition) -> Self {
        Self {
            role_id: value.role.id.to_string(),
            is_admin: value.role.is_admin(),
            name: value.role.name.as_str().to_owned(),
            permissions: value
                .grants
                .iter()
                .map(|grant| grant.as_str().to_owned())
                .collect(),
        }
    }
}

impl From<Role> for RoleResponse {
    fn from(value: Role) -> Self {
        Self::from(RoleDefinition {
            role: value,
            grants: Vec::new(),
        })
    }
}

/// Grantable service registry entry.
#[derive(Debug, Serialize, TS)]
#[ts(
    export,
    export_to = "../../../packages/api-types/src/generated/service-response.ts"
)]
pub struct ServiceResponse {
    pub permission: String,
    pub module: String,
    pub name: String,
}

impl From<ServiceDescriptor> for ServiceResponse {
    fn from(value: ServiceDescriptor) -> Self {
        Self {
            permission: value.permission.as_str().to_owned(),
            module: value.module.to_owned(),
            name: value.name.to_owned(),
        }
    }
}

/// Incoming payload moving a user to another role.
#[derive(Debug, Deserialize, TS)]
#[ts(
    export,
    export_to = "../../../packages/api-types/src/generated/change-user-role-request.ts"
)]
pub struct ChangeUserRoleRequest {
    pub role_id: String,
}
