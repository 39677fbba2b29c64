use axum::Json;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use serde::Serialize;
use tracing::error;
use ts_rs::TS;
use wardbook_core::AppError;

/// API error payload.
#[derive(Debug, Serialize, TS)]
#[ts(
    export,
    export_to = "../../../packages/api-types/src/generated/error-response.ts"
)]
pub struct ErrorResponse {
    message: String,
}

/// HTTP API error wrapper around core application errors.
#[derive(Debug)]
pub struct ApiError(pub AppError);

impl From<AppError> for ApiError {
    fn from(value: AppError) -> Self {
        Self(value)
    }
}

impl ApiError {
    pub(crate) fn status(&self) -> StatusCode {
        match self.0 {
            AppError::Validation(_) => StatusCode::BAD_REQUEST,
            AppError::NotFound(_) => StatusCode::NOT_FOUND,
            AppError::Conflict(_) => StatusCode::CONFLICT,
            AppError::Unauthorized(_) => StatusCode::UNAUTHORIZED,
            AppError::Forbidden(_) | AppError::PolicyViolation(_) => StatusCode::FORBIDDEN,
            AppError::Render(_) | AppError::Storage(_) | AppError::Internal(_) => {
                StatusCode::INTERNAL_SERVER_ERROR
            }
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.status();
        if status.is_server_error() {
            error!(error = %self.0, "request failed");
        }

        let payload = Json(ErrorResponse {
            message: self.0.to_string(),
        });

        (status, payload).into_response()
    }
}

/// Standard API result type.
pub type ApiResult<T> = Result<T, ApiError>;

#[cfg(test)]
mod tests {
    use axum::http::StatusCode;
    use axum::response::IntoResponse;
    use wardbook_core::AppError;

    use super::ApiError;

    #[test]
    fn every_error_kind_maps_to_its_status() {
        let cases = [
            (AppError::Validation("bad ward".to_owned()), StatusCode::BAD_REQUEST),
            (AppError::NotFound("no data".to_owned()), StatusCode::NOT_FOUND),
            (AppError::Conflict("taken".to_owned()), StatusCode::CONFLICT),
            (AppError::Unauthorized("login".to_owned()), StatusCode::UNAUTHORIZED),
            (AppError::Forbidden("denied".to_owned()), StatusCode::FORBIDDEN),
            (AppError::PolicyViolation("admin".to_owned()), StatusCode::FORBIDDEN),
            (AppError::Render("timeout".to_owned()), StatusCode::INTERNAL_SERVER_ERROR),
            (AppError::Storage("disk".to_owned()), StatusCode::INTERNAL_SERVER_ERROR),
            (AppError::Internal("db".to_owned()), StatusCode::INTERNAL_SERVER_ERROR),
        ];

        for (error, expected) in cases {
            assert_eq!(ApiError(error).into_response().status(), expected);
        }
    }

    #[test]
    fn policy_violations_keep_their_message_prefix() {
        let error = ApiError(AppError::PolicyViolation(
            "the admin role cannot be deleted".to_owned(),
        ));

        assert!(error.0.to_string().starts_with("policy violation"));
    }
}
