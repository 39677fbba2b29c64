mod bulk;

use std::sync::Arc;

use serde::Serialize;
use wardbook_core::{AppError, AppResult, UserIdentity};
use wardbook_domain::{Permission, PropertyNumber, Survey, SurveyId};

use crate::{ArtifactCache, AuthorizationService, DocumentCompositor, RenderMode, SurveyRecordStore};


/// A PDF ready to be sent as a download.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReportDocument {
    /// Suggested download file name.
    pub file_name: String,
    /// PDF bytes.
    pub bytes: Vec<u8>,
}

/// Why one record of a bulk run is missing from the merged document.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ReportDiagnostic {
    /// Survey that failed.
    pub survey_id: SurveyId,
    /// Property number of the survey.
    pub property: PropertyNumber,
    /// Failure reason.
    pub reason: String,
}

/// Counts and diagnostics of a bulk run.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize)]
pub struct BulkReportSummary {
    /// Records matched by the selector.
    pub total_selected: usize,
    /// Records whose pages made it into the merged document.
    pub merged: usize,
    /// Records reported in `diagnostics`.
    pub failed: usize,
    /// Artifacts rendered during this run rather than read from storage.
    pub generated: usize,
    /// Per-record failures, ordered by property number.
    pub diagnostics: Vec<ReportDiagnostic>,
}

/// Merged bulk document plus its summary.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BulkReport {
    /// Merged PDF.
    pub document: ReportDocument,
    /// Run summary.
    pub summary: BulkReportSummary,
}

/// Raw bulk selector as received from callers.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct BulkReportRequest {
    /// Ward number, required.
    pub ward_no: String,
    /// Inclusive range start.
    pub property_no_start: Option<String>,
    /// Inclusive range end.
    pub property_no_end: Option<String>,
}

/// Application service for per-record and bulk report downloads.
#[derive(Clone)]
pub struct ReportService {
    authorization_service: AuthorizationService,
    records: Arc<dyn SurveyRecordStore>,
    cache: ArtifactCache,
    compositor: Arc<dyn DocumentCompositor>,
    bulk_concurrency: usize,
}

impl ReportService {
    /// Creates a new service that processes bulk runs sequentially.
    #[must_use]
    pub fn new(
        authorization_service: AuthorizationService,
        records: Arc<dyn SurveyRecordStore>,
        cache: ArtifactCache,
        compositor: Arc<dyn DocumentCompositor>,
    ) -> Self {
        Self {
            authorization_service,
            records,
            cache,
            compositor,
            bulk_concurrency: 1,
        }
    }

    /// Sets how many records a bulk run renders in parallel. Zero means one.
    #[must_use]
    pub fn with_bulk_concurrency(mut self, bulk_concurrency: usize) -> Self {
        self.bulk_concurrency = bulk_concurrency.max(1);
        self
    }

    /// Returns the single-record report, rendering it when not cached.
    pub async fn single_report(
        &self,
        actor: &UserIdentity,
        survey_id: SurveyId,
    ) -> AppResult<ReportDocument> {
        self.authorization_service
            .require_permission(actor, Permission::GenerateReport115)
            .await?;

        let survey = self.require_survey(survey_id).await?;
        let artifact = self
            .cache
            .get_or_render(&survey, RenderMode::ReuseExisting)
            .await
            .into_result()?;

        Ok(ReportDocument {
            file_name: format!(
                "Report_115_Single_Ward_{}_Property_{}.pdf",
                survey.ward, survey.property
            ),
            bytes: artifact.bytes,
        })
    }

    /// Returns the cached survey PDF, rendering it when missing.
    pub async fn download_survey_pdf(
        &self,
        actor: &UserIdentity,
        survey_id: SurveyId,
    ) -> AppResult<ReportDocument> {
        self.authorization_service
            .require_permission(actor, Permission::DownloadSurveyPdf)
            .await?;

        let survey = self.require_survey(survey_id).await?;
        self.cached_download(&survey, RenderMode::ReuseExisting).await
    }

    /// Deletes the stored survey PDF and renders a fresh one.
    ///
    /// Allowed for the survey's creator and for administrators.
    pub async fn regenerate_survey_pdf(
        &self,
        actor: &UserIdentity,
        survey_id: SurveyId,
    ) -> AppResult<ReportDocument> {
        let survey = self.require_survey(survey_id).await?;
        self.authorization_service
            .require_owner_or_admin(actor, survey.created_by)
            .await?;

        self.cached_download(&survey, RenderMode::ForceRegenerate)
            .await
    }

    async fn cached_download(&self, survey: &Survey, mode: RenderMode) -> AppResult<ReportDocument> {
        let artifact = self.cache.get_or_render(survey, mode).await.into_result()?;

        Ok(ReportDocument {
            file_name: format!(
                "Survey_Ward_{}_Property_{}.pdf",
                survey.ward, survey.property
            ),
            bytes: artifact.bytes,
        })
    }

    async fn require_survey(&self, survey_id: SurveyId) -> AppResult<Survey> {
        self.records
            .find_survey(survey_id)
            .await?
            .ok_or_else(|| AppError::NotFound(format!("survey '{survey_id}' was not found")))
    }
}
