use axum::Json;
use axum::extract::{Extension, State};
use axum::http::StatusCode;
use tower_sessions::Session;
use tracing::info;
use wardbook_core::{AppError, UserIdentity};

use crate::dto::{LoginRequest, UserIdentityResponse};
use crate::error::ApiResult;
use crate::state::AppState;


pub const SESSION_USER_KEY: &str = "user_identity";

pub async fn login_handler(
    State(state): State<AppState>,
    session: Session,
    Json(payload): Json<LoginRequest>,
) -> ApiResult<Json<UserIdentityResponse>> {
    let identity = state
        .user_service
        .login(&payload.email, &payload.password)
        .await?;

    // Fresh session id on privilege change.
    session
        .cycle_id()
        .await
        .map_err(|error| AppError::Internal(format!("failed to cycle session id: {error}")))?;
    session
        .insert(SESSION_USER_KEY, &identity)
        .await
        .map_err(|error| {
            AppError::Internal(format!("failed to persist session identity: {error}"))
        })?;
    info!(subject = identity.subject(), "session established");

    Ok(Json(describe_identity(&state, &identity).await?))
}

pub async fn logout_handler(session: Session) -> ApiResult<StatusCode> {
    session
        .delete()
        .await
        .map_err(|error| AppError::Internal(format!("failed to delete session: {error}")))?;

    Ok(StatusCode::NO_CONTENT)
}

pub async fn me_handler(
    State(state): State<AppState>,
    Extension(user): Extension<UserIdentity>,
) -> ApiResult<Json<UserIdentityResponse>> {
    Ok(Json(describe_identity(&state, &user).await?))
}

async fn describe_identity(
    state: &AppState,
    identity: &UserIdentity,
) -> ApiResult<UserIdentityResponse> {
    let role = state.authorization_service.role_for(identity).await?;
    let access = state
        .authorization_service
        .accessible_modules(role.id)
        .await?;

    Ok(UserIdentityResponse::new(identity, &role, access))
}
