use axum::Json;
use axum::extract::rejection::JsonRejection;
use axum::extract::{Extension, Path, State};
use axum::http::{HeaderMap, HeaderName, HeaderValue, header};
use axum::response::{IntoResponse, Response};
use tracing::warn;
use uuid::Uuid;
use wardbook_application::{BulkReportRequest, BulkReportSummary, ReportDocument};
use wardbook_core::{AppError, UserIdentity};
use wardbook_domain::SurveyId;

use crate::dto::BulkReportRequestBody;
use crate::error::ApiResult;
use crate::state::AppState;


pub const REPORT_TOTAL_HEADER: &str = "x-report-total";
pub const REPORT_MERGED_HEADER: &str = "x-report-merged";
pub const REPORT_FAILED_HEADER: &str = "x-report-failed";
pub const REPORT_GENERATED_HEADER: &str = "x-report-generated";
pub const REPORT_DIAGNOSTICS_HEADER: &str = "x-report-diagnostics";

const MAX_HEADER_DIAGNOSTICS: usize = 20;

pub async fn single_report_handler(
    State(state): State<AppState>,
    Extension(user): Extension<UserIdentity>,
    Path(survey_id): Path<Uuid>,
) -> ApiResult<Response> {
    let document = state
        .report_service
        .single_report(&user, SurveyId::from_uuid(survey_id))
        .await?;

    pdf_response(document, HeaderMap::new())
}

pub async fn bulk_report_handler(
    State(state): State<AppState>,
    Extension(user): Extension<UserIdentity>,
    payload: Result<Json<BulkReportRequestBody>, JsonRejection>,
) -> ApiResult<Response> {
    // Malformed selectors are client errors like any other bad selector.
    let Json(payload) = payload.map_err(|rejection| {
        AppError::Validation(format!("invalid bulk report selector: {}", rejection.body_text()))
    })?;
    let request = BulkReportRequest::from(payload);
    let report = state.report_service.bulk_report(&user, &request).await?;

    pdf_response(report.document, summary_headers(&report.summary))
}

pub async fn download_survey_pdf_handler(
    State(state): State<AppState>,
    Extension(user): Extension<UserIdentity>,
    Path(survey_id): Path<Uuid>,
) -> ApiResult<Response> {
    let document = state
        .report_service
        .download_survey_pdf(&user, SurveyId::from_uuid(survey_id))
        .await?;

    pdf_response(document, HeaderMap::new())
}

pub async fn regenerate_survey_pdf_handler(
    State(state): State<AppState>,
    Extension(user): Extension<UserIdentity>,
    Path(survey_id): Path<Uuid>,
) -> ApiResult<Response> {
    let document = state
        .report_service
        .regenerate_survey_pdf(&user, SurveyId::from_uuid(survey_id))
        .await?;

    pdf_response(document, HeaderMap::new())
}

fn pdf_response(document: ReportDocument, mut headers: HeaderMap) -> ApiResult<Response> {
    let disposition = HeaderValue::from_str(&format!(
        "attachment; filename=\"{}\"",
        document.file_name
    ))
    .map_err(|error| AppError::Internal(format!("invalid report file name: {error}")))?;

    headers.insert(header::CONTENT_TYPE, HeaderValue::from_static("application/pdf"));
    headers.insert(header::CONTENT_DISPOSITION, disposition);

    Ok((headers, document.bytes).into_response())
}

fn summary_headers(summary: &BulkReportSummary) -> HeaderMap {
    let mut headers = HeaderMap::new();
    for (name, value) in [
        (REPORT_TOTAL_HEADER, summary.total_selected),
        (REPORT_MERGED_HEADER, summary.merged),
        (REPORT_FAILED_HEADER, summary.failed),
        (REPORT_GENERATED_HEADER, summary.generated),
    ] {
        headers.insert(HeaderName::from_static(name), HeaderValue::from(value));
    }

    if summary.diagnostics.is_empty() {
        return headers;
    }

    let shown = &summary.diagnostics[..summary.diagnostics.len().min(MAX_HEADER_DIAGNOSTICS)];
    match serde_json::to_vec(shown)
        .map_err(|error| error.to_string())
        .and_then(|json| HeaderValue::from_bytes(&json).map_err(|error| error.to_string()))
    {
        Ok(value) => {
            headers.insert(HeaderName::from_static(REPORT_DIAGNOSTICS_HEADER), value);
        }
        Err(error) => warn!(%error, "bulk report diagnostics omitted from response headers"),
    }

    headers
}
