use std::sync::Arc;

use chrono::Local;
use tokio::sync::Semaphore;
use tokio::task::JoinSet;
use tracing::{info, warn};
use wardbook_core::{AppError, AppResult, UserIdentity};
use wardbook_domain::{Permission, Survey, SurveySelector};

use super::{
    BulkReport, BulkReportRequest, BulkReportSummary, ReportDiagnostic, ReportDocument,
    ReportService,
};
use crate::{
    ArtifactFailure, ArtifactFailureKind, ArtifactOutcome, ArtifactSource, DocumentPart,
    MergedDocument, RenderMode,
};

impl ReportService {
    /// Merges the reports of every survey matched by the selector.
    ///
    /// Records that cannot be rendered or parsed are skipped and reported in
    /// the summary. Pages follow property number order.
    pub async fn bulk_report(
        &self,
        actor: &UserIdentity,
        request: &BulkReportRequest,
    ) -> AppResult<BulkReport> {
        self.authorization_service
            .require_permission(actor, Permission::GenerateReport115)
            .await?;

        let selector = SurveySelector::parse(
            request.ward_no.as_str(),
            request.property_no_start.as_deref(),
            request.property_no_end.as_deref(),
        )?;

        let surveys = self.records.list_surveys(&selector).await?;
        if surveys.is_empty() {
            return Err(AppError::NotFound(no_data_message(&selector)));
        }

        let outcomes = self.collect_artifacts(&surveys).await;

        let mut summary = BulkReportSummary {
            total_selected: surveys.len(),
            ..BulkReportSummary::default()
        };
        let mut parts = Vec::with_capacity(surveys.len());
        for (survey, outcome) in surveys.iter().zip(outcomes) {
            match outcome {
                ArtifactOutcome::Ready(artifact) => {
                    if artifact.source == ArtifactSource::Rendered {
                        summary.generated += 1;
                    }
                    parts.push(DocumentPart {
                        label: survey.id.to_string(),
                        bytes: artifact.bytes,
                    });
                }
                ArtifactOutcome::Failed(failure) => {
                    warn!(survey_id = %survey.id, reason = %failure.message, "report excluded from bulk merge");
                    summary.diagnostics.push(diagnostic(survey, failure.message));
                }
            }
        }

        let merged = if parts.is_empty() {
            MergedDocument {
                bytes: Vec::new(),
                page_count: 0,
                merged_labels: Vec::new(),
                rejected: Vec::new(),
            }
        } else {
            self.merge_parts(parts).await?
        };

        for rejected in merged.rejected {
            if let Some(survey) = surveys
                .iter()
                .find(|survey| survey.id.to_string() == rejected.label)
            {
                warn!(survey_id = %survey.id, reason = %rejected.reason, "corrupt report skipped during merge");
                summary.diagnostics.push(diagnostic(
                    survey,
                    format!("unreadable PDF: {}", rejected.reason),
                ));
            }
        }
        summary
            .diagnostics
            .sort_by_key(|diagnostic| diagnostic.property);
        summary.merged = merged.merged_labels.len();
        summary.failed = summary.diagnostics.len();

        info!(
            ward = %selector.ward,
            total_selected = summary.total_selected,
            merged = summary.merged,
            failed = summary.failed,
            generated = summary.generated,
            pages = merged.page_count,
            "bulk report merged"
        );

        if summary.merged == 0 {
            return Err(AppError::Render(format!(
                "none of the {} selected reports could be merged",
                summary.total_selected
            )));
        }

        Ok(BulkReport {
            document: ReportDocument {
                file_name: bulk_file_name(&selector),
                bytes: merged.bytes,
            },
            summary,
        })
    }

    async fn collect_artifacts(&self, surveys: &[Survey]) -> Vec<ArtifactOutcome> {
        if self.bulk_concurrency <= 1 {
            let mut outcomes = Vec::with_capacity(surveys.len());
            for survey in surveys {
                outcomes.push(
                    self.cache
                        .get_or_render(survey, RenderMode::ReuseExisting)
                        .await,
                );
            }
            return outcomes;
        }

        let permits = Arc::new(Semaphore::new(self.bulk_concurrency));
        let mut tasks = JoinSet::new();
        for (index, survey) in surveys.iter().cloned().enumerate() {
            let cache = self.cache.clone();
            let permits = permits.clone();
            tasks.spawn(async move {
                let _permit = permits.acquire_owned().await;
                let outcome = cache
                    .get_or_render(&survey, RenderMode::ReuseExisting)
                    .await;
                (index, outcome)
            });
        }

        let mut slots: Vec<Option<ArtifactOutcome>> = vec![None; surveys.len()];
        while let Some(joined) = tasks.join_next().await {
            match joined {
                Ok((index, outcome)) => {
                    if let Some(slot) = slots.get_mut(index) {
                        *slot = Some(outcome);
                    }
                }
                Err(error) => warn!(%error, "bulk render task aborted"),
            }
        }

        slots
            .into_iter()
            .map(|slot| {
                slot.unwrap_or_else(|| {
                    ArtifactOutcome::Failed(ArtifactFailure {
                        kind: ArtifactFailureKind::Render,
                        message: "render task aborted".to_owned(),
                    })
                })
            })
            .collect()
    }

    async fn merge_parts(&self, parts: Vec<DocumentPart>) -> AppResult<MergedDocument> {
        let compositor = self.compositor.clone();
        tokio::task::spawn_blocking(move || compositor.merge(parts))
            .await
            .map_err(|error| AppError::Render(format!("merge task failed: {error}")))?
    }
}

fn diagnostic(survey: &Survey, reason: String) -> ReportDiagnostic {
    ReportDiagnostic {
        survey_id: survey.id,
        property: survey.property,
        reason,
    }
}

fn no_data_message(selector: &SurveySelector) -> String {
    match selector.range {
        Some(range) => format!(
            "no data available for ward {}, property {}-{}",
            selector.ward,
            range.start(),
            range.end()
        ),
        None => format!("no data available for ward {}", selector.ward),
    }
}

fn bulk_file_name(selector: &SurveySelector) -> String {
    let stamp = Local::now().format("%Y%m%d_%H%M%S");
    match selector.range {
        Some(range) => format!(
            "Survey_Reports_Ward_{}_Property_{}_to_{}_{stamp}.pdf",
            selector.ward,
            range.start(),
            range.end()
        ),
        None => format!("Survey_Reports_Ward_{}_All_{stamp}.pdf", selector.ward),
    }
}
