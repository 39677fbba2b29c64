use axum::Json;
use axum::extract::{Extension, Path, State};
use axum::http::StatusCode;
use uuid::Uuid;
use wardbook_core::UserIdentity;
use wardbook_domain::RoleId;

use crate::dto::{
    CreateRoleRequest, ModuleAccessResponse, RenameRoleRequest, ReplaceRolePermissionsRequest,
    RoleResponse, ServiceResponse,
};
use crate::error::ApiResult;
use crate::state::AppState;


pub async fn list_roles_handler(
    State(state): State<AppState>,
    Extension(user): Extension<UserIdentity>,
) -> ApiResult<Json<Vec<RoleResponse>>> {
    let roles = state
        .role_admin_service
        .list_roles(&user)
        .await?
        .into_iter()
        .map(RoleResponse::from)
        .collect();

    Ok(Json(roles))
}

pub async fn create_role_handler(
    State(state): State<AppState>,
    Extension(user): Extension<UserIdentity>,
    Json(payload): Json<CreateRoleRequest>,
) -> ApiResult<(StatusCode, Json<RoleResponse>)> {
    let role = state
        .role_admin_service
        .create_role(&user, payload.name.as_str())
        .await?;

    Ok((StatusCode::CREATED, Json(RoleResponse::from(role))))
}

pub async fn rename_role_handler(
    State(state): State<AppState>,
    Extension(user): Extension<UserIdentity>,
    Path(role_id): Path<Uuid>,
    Json(payload): Json<RenameRoleRequest>,
) -> ApiResult<Json<RoleResponse>> {
    let role = state
        .role_admin_service
        .rename_role(&user, RoleId::from_uuid(role_id), payload.name.as_str())
        .await?;

    Ok(Json(RoleResponse::from(role)))
}

pub async fn delete_role_handler(
    State(state): State<AppState>,
    Extension(user): Extension<UserIdentity>,
    Path(role_id): Path<Uuid>,
) -> ApiResult<StatusCode> {
    state
        .role_admin_service
        .delete_role(&user, RoleId::from_uuid(role_id))
        .await?;

    Ok(StatusCode::NO_CONTENT)
}

pub async fn role_permissions_handler(
    State(state): State<AppState>,
    Extension(user): Extension<UserIdentity>,
    Path(role_id): Path<Uuid>,
) -> ApiResult<Json<RoleResponse>> {
    let definition = state
        .role_admin_service
        .role_permissions(&user, RoleId::from_uuid(role_id))
        .await?;

    Ok(Json(RoleResponse::from(definition)))
}

pub async fn replace_role_permissions_handler(
    State(state): State<AppState>,
    Extension(user): Extension<UserIdentity>,
    Path(role_id): Path<Uuid>,
    Json(payload): Json<ReplaceRolePermissionsRequest>,
) -> ApiResult<Json<RoleResponse>> {
    let definition = state
        .role_admin_service
        .replace_role_permissions(&user, RoleId::from_uuid(role_id), &payload.permissions)
        .await?;

    Ok(Json(RoleResponse::from(definition)))
}

pub async fn list_services_handler(
    State(state): State<AppState>,
    Extension(user): Extension<UserIdentity>,
) -> ApiResult<Json<Vec<ServiceResponse>>> {
    let services = state
        .role_admin_service
        .available_services(&user)
        .await?
        .into_iter()
        .map(ServiceResponse::from)
        .collect();

    Ok(Json(services))
}

pub async fn role_modules_handler(
    State(state): State<AppState>,
    Extension(user): Extension<UserIdentity>,
    Path(role_id): Path<Uuid>,
) -> ApiResult<Json<ModuleAccessResponse>> {
    let access = state
        .role_admin_service
        .accessible_modules(&user, RoleId::from_uuid(role_id))
        .await?;

    Ok(Json(ModuleAccessResponse::from(access)))
}
