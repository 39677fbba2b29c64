use axum::http::header::{CONTENT_DISPOSITION, CONTENT_TYPE};
use axum::http::{HeaderName, HeaderValue, Method};
use tower_http::cors::CorsLayer;
use wardbook_core::AppError;

use crate::handlers::reports::{
    REPORT_DIAGNOSTICS_HEADER, REPORT_FAILED_HEADER, REPORT_GENERATED_HEADER,
    REPORT_MERGED_HEADER, REPORT_TOTAL_HEADER,
};

pub(super) fn build_cors_layer(frontend_url: &str) -> Result<CorsLayer, AppError> {
    Ok(CorsLayer::new()
        .allow_origin(
            HeaderValue::from_str(frontend_url)
                .map_err(|error| AppError::Internal(format!("invalid FRONTEND_URL: {error}")))?,
        )
        .allow_credentials(true)
        .allow_methods([
            Method::GET,
            Method::POST,
            Method::PUT,
            Method::PATCH,
            Method::DELETE,
            Method::OPTIONS,
        ])
        .allow_headers([CONTENT_TYPE])
        // Download clients read the bulk summary from these.
        .expose_headers([
            CONTENT_DISPOSITION,
            HeaderName::from_static(REPORT_TOTAL_HEADER),
            HeaderName::from_static(REPORT_MERGED_HEADER),
            HeaderName::from_static(REPORT_FAILED_HEADER),
            HeaderName::from_static(REPORT_GENERATED_HEADER),
            HeaderName::from_static(REPORT_DIAGNOSTICS_HEADER),
        ]))
}
