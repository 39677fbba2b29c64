mod record_locks;

use std::sync::Arc;
use std::time::Duration;

use tracing::{info, warn};
use wardbook_core::{AppError, AppResult};
use wardbook_domain::{Survey, SurveyId};

use crate::{ArtifactStorage, SurveyRecordStore, SurveyReportRenderer};

use self::record_locks::RecordLocks;


/// Render timeout used when none is configured.
///
/// The timeout bounds how long a caller waits; a composition already running
/// on the blocking pool still finishes in the background.
pub const DEFAULT_RENDER_TIMEOUT: Duration = Duration::from_secs(60);

/// Whether a cached artifact may be reused.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RenderMode {
    /// Return the stored artifact when it is present and readable.
    ReuseExisting,
    /// Delete the stored artifact and render a fresh one.
    ForceRegenerate,
}

/// Where the returned bytes came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ArtifactSource {
    /// Read back from storage.
    Cache,
    /// Rendered during this call.
    Rendered,
}

/// A readable report artifact.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Artifact {
    /// Survey the artifact belongs to.
    pub survey_id: SurveyId,
    /// Relative storage key.
    pub key: String,
    /// PDF bytes.
    pub bytes: Vec<u8>,
    /// Cache hit or fresh render.
    pub source: ArtifactSource,
}

/// Failure category of an artifact request.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ArtifactFailureKind {
    /// The renderer returned an error.
    Render,
    /// Storage or the record reference could not be updated.
    Storage,
    /// Rendering exceeded the configured timeout.
    Timeout,
}

/// Why an artifact could not be produced.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ArtifactFailure {
    /// Failure category.
    pub kind: ArtifactFailureKind,
    /// Human-readable reason.
    pub message: String,
}

/// Outcome of [`ArtifactCache::get_or_render`]. Failures are values, never errors.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ArtifactOutcome {
    /// Artifact is available.
    Ready(Artifact),
    /// Artifact could not be produced.
    Failed(ArtifactFailure),
}

impl ArtifactOutcome {
    fn failed(kind: ArtifactFailureKind, message: impl Into<String>) -> Self {
        Self::Failed(ArtifactFailure {
            kind,
            message: message.into(),
        })
    }

    /// Converts the outcome for callers that abort on failure.
    pub fn into_result(self) -> AppResult<Artifact> {
        match self {
            Self::Ready(artifact) => Ok(artifact),
            Self::Failed(failure) => match failure.kind {
                ArtifactFailureKind::Render | ArtifactFailureKind::Timeout => {
                    Err(AppError::Render(failure.message))
                }
                ArtifactFailureKind::Storage => Err(AppError::Storage(failure.message)),
            },
        }
    }
}

/// Maps survey records to persisted report artifacts.
///
/// Presence at the deterministic storage path is the only validity check.
/// Generation for one record is serialized; a caller that waited for the lock
/// probes storage again and reuses what the previous holder wrote.
#[derive(Clone)]
pub struct ArtifactCache {
    records: Arc<dyn SurveyRecordStore>,
    storage: Arc<dyn ArtifactStorage>,
    renderer: Arc<dyn SurveyReportRenderer>,
    locks: Arc<RecordLocks>,
    render_timeout: Duration,
}

impl ArtifactCache {
    /// Creates a cache with the default render timeout.
    #[must_use]
    pub fn new(
        records: Arc<dyn SurveyRecordStore>,
        storage: Arc<dyn ArtifactStorage>,
        renderer: Arc<dyn SurveyReportRenderer>,
    ) -> Self {
        Self {
            records,
            storage,
            renderer,
            locks: Arc::new(RecordLocks::default()),
            render_timeout: DEFAULT_RENDER_TIMEOUT,
        }
    }

    /// Overrides the per-record render timeout.
    #[must_use]
    pub fn with_render_timeout(mut self, render_timeout: Duration) -> Self {
        self.render_timeout = render_timeout;
        self
    }

    /// Returns the survey's artifact, rendering and persisting it when needed.
    pub async fn get_or_render(&self, survey: &Survey, mode: RenderMode) -> ArtifactOutcome {
        let _guard = self.locks.acquire(survey.id).await;
        let key = survey.artifact_path();

        if mode == RenderMode::ReuseExisting
            && let Some(bytes) = self.probe(survey, key.as_str()).await
        {
            self.reconcile_reference(survey, key.as_str()).await;
            return ArtifactOutcome::Ready(Artifact {
                survey_id: survey.id,
                key,
                bytes,
                source: ArtifactSource::Cache,
            });
        }

        if let Err(error) = self.discard_stale(survey, key.as_str()).await {
            return ArtifactOutcome::failed(
                ArtifactFailureKind::Storage,
                format!("failed to discard stale artifact: {error}"),
            );
        }

        let bytes = match tokio::time::timeout(self.render_timeout, self.renderer.render(survey))
            .await
        {
            Ok(Ok(bytes)) => bytes,
            Ok(Err(error)) => {
                warn!(survey_id = %survey.id, %error, "report rendering failed");
                return ArtifactOutcome::failed(ArtifactFailureKind::Render, error.to_string());
            }
            Err(_) => {
                warn!(survey_id = %survey.id, timeout_secs = self.render_timeout.as_secs(), "report rendering timed out");
                return ArtifactOutcome::failed(
                    ArtifactFailureKind::Timeout,
                    format!(
                        "rendering exceeded the {}s timeout",
                        self.render_timeout.as_secs()
                    ),
                );
            }
        };

        if let Err(error) = self.storage.write(key.as_str(), bytes.as_slice()).await {
            warn!(survey_id = %survey.id, %error, "failed to persist report artifact");
            return ArtifactOutcome::failed(ArtifactFailureKind::Storage, error.to_string());
        }

        if let Err(error) = self
            .records
            .set_artifact_key(survey.id, Some(key.clone()))
            .await
        {
            warn!(survey_id = %survey.id, %error, "failed to record artifact reference");
            return ArtifactOutcome::failed(ArtifactFailureKind::Storage, error.to_string());
        }

        info!(
            survey_id = %survey.id,
            ward = %survey.ward,
            property = %survey.property,
            size = bytes.len(),
            "report artifact generated"
        );

        ArtifactOutcome::Ready(Artifact {
            survey_id: survey.id,
            key,
            bytes,
            source: ArtifactSource::Rendered,
        })
    }

    async fn probe(&self, survey: &Survey, key: &str) -> Option<Vec<u8>> {
        match self.storage.exists(key).await {
            Ok(true) => {}
            Ok(false) => return None,
            Err(error) => {
                warn!(survey_id = %survey.id, %error, "artifact probe failed, regenerating");
                return None;
            }
        }

        match self.storage.read(key).await {
            Ok(bytes) => Some(bytes),
            Err(error) => {
                warn!(survey_id = %survey.id, %error, "stored artifact is unreadable, regenerating");
                None
            }
        }
    }

    async fn reconcile_reference(&self, survey: &Survey, key: &str) {
        if survey.artifact_key.as_deref() == Some(key) {
            return;
        }

        if let Err(error) = self
            .records
            .set_artifact_key(survey.id, Some(key.to_owned()))
            .await
        {
            warn!(survey_id = %survey.id, %error, "failed to reconcile artifact reference");
        }
    }

    async fn discard_stale(&self, survey: &Survey, key: &str) -> AppResult<()> {
        self.storage.delete(key).await?;

        if let Some(previous) = survey.artifact_key.as_deref() {
            if previous != key {
                self.storage.delete(previous).await?;
            }
            self.records.set_artifact_key(survey.id, None).await?;
        }

        Ok(())
    }
}
