use async_trait::async_trait;
use serde_json::Value;

use wardbook_core::AppResult;
use wardbook_domain::{FloorEntry, Survey, SurveyId, SurveySelector};

/// Repository port for survey records as seen by the report pipeline.
#[async_trait]
pub trait SurveyRecordStore: Send + Sync {
    /// Loads one survey by identifier.
    async fn find_survey(&self, survey_id: SurveyId) -> AppResult<Option<Survey>>;

    /// Lists surveys matching a selector, ordered by property number ascending.
    async fn list_surveys(&self, selector: &SurveySelector) -> AppResult<Vec<Survey>>;

    /// Lists floor line items of a survey.
    async fn list_floors(&self, survey_id: SurveyId) -> AppResult<Vec<FloorEntry>>;

    /// Writes or clears the survey's artifact reference.
    async fn set_artifact_key(&self, survey_id: SurveyId, key: Option<String>) -> AppResult<()>;
}

/// Blob storage addressed by relative keys such as `reports/<file>.pdf`.
#[async_trait]
pub trait ArtifactStorage: Send + Sync {
    /// Writes bytes at a key, replacing existing content.
    async fn write(&self, key: &str, bytes: &[u8]) -> AppResult<()>;

    /// Reads the bytes stored at a key.
    async fn read(&self, key: &str) -> AppResult<Vec<u8>>;

    /// Returns whether a blob exists at a key.
    async fn exists(&self, key: &str) -> AppResult<bool>;

    /// Deletes a blob. Deleting a missing key succeeds.
    async fn delete(&self, key: &str) -> AppResult<()>;
}

/// Renders named templates to markup.
pub trait TemplateEngine: Send + Sync {
    /// Renders a template with a JSON context.
    fn render(&self, template_name: &str, context: &Value) -> AppResult<String>;
}

/// One input document of a merge, labelled for diagnostics.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DocumentPart {
    /// Caller-chosen label reported back for rejected parts.
    pub label: String,
    /// Raw PDF bytes.
    pub bytes: Vec<u8>,
}

/// A part the compositor could not merge.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RejectedPart {
    /// Label of the rejected part.
    pub label: String,
    /// Parse or copy failure.
    pub reason: String,
}

/// Result of a lenient merge.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MergedDocument {
    /// Merged PDF bytes. Empty when nothing was merged.
    pub bytes: Vec<u8>,
    /// Total page count of the merged document.
    pub page_count: usize,
    /// Labels of merged parts, in input order.
    pub merged_labels: Vec<String>,
    /// Parts skipped because they could not be parsed.
    pub rejected: Vec<RejectedPart>,
}

/// Turns markup into paged PDF documents and concatenates PDFs.
///
/// Both operations are CPU-bound and are called from blocking tasks.
pub trait DocumentCompositor: Send + Sync {
    /// Composes markup into a PDF document.
    fn compose(&self, markup: &str) -> AppResult<Vec<u8>>;

    /// Appends every page of every readable part, in order.
    fn merge(&self, parts: Vec<DocumentPart>) -> AppResult<MergedDocument>;
}

/// Renders one survey record to PDF bytes.
#[async_trait]
pub trait SurveyReportRenderer: Send + Sync {
    /// Renders the fixed report layout for a survey.
    async fn render(&self, survey: &Survey) -> AppResult<Vec<u8>>;
}
