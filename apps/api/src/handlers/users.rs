use axum::Json;
use axum::extract::{Extension, Path, State};
use axum::http::StatusCode;
use uuid::Uuid;
use wardbook_core::UserIdentity;
use wardbook_domain::UserId;

use super::parse_role_id;
use crate::dto::ChangeUserRoleRequest;
use crate::error::ApiResult;
use crate::state::AppState;


pub async fn delete_user_handler(
    State(state): State<AppState>,
    Extension(user): Extension<UserIdentity>,
    Path(user_id): Path<Uuid>,
) -> ApiResult<StatusCode> {
    state
        .user_service
        .delete_user(&user, UserId::from_uuid(user_id))
        .await?;

    Ok(StatusCode::NO_CONTENT)
}

pub async fn change_user_role_handler(
    State(state): State<AppState>,
    Extension(user): Extension<UserIdentity>,
    Path(user_id): Path<Uuid>,
    Json(payload): Json<ChangeUserRoleRequest>,
) -> ApiResult<StatusCode> {
    let role_id = parse_role_id(payload.role_id.as_str())?;
    state
        .user_service
        .change_user_role(&user, UserId::from_uuid(user_id), role_id)
        .await?;

    Ok(StatusCode::NO_CONTENT)
}
