use serde::Serialize;
use ts_rs::TS;

mod reports;
mod security;

pub use reports::{BulkReportRequestBody, TransportNumber};
pub use security::{
    ChangeUserRoleRequest, CreateRoleRequest, LoginRequest, ModuleAccessResponse,
    RenameRoleRequest, ReplaceRolePermissionsRequest, RoleResponse, ServiceResponse,
    UserIdentityResponse,
};

/// Health response payload.
#[derive(Debug, Serialize, TS)]
#[ts(
    export,
    export_to = "../../../packages/api-types/src/generated/health-response.ts"
)]
pub struct HealthResponse {
    pub status: &'static str,
}
