use std::sync::Arc;

use async_trait::async_trait;
use chrono::NaiveDate;
use serde::Serialize;
use tracing::{error, warn};
use wardbook_core::{AppError, AppResult};
use wardbook_domain::{FloorEntry, Survey};

use crate::{DocumentCompositor, SurveyRecordStore, SurveyReportRenderer, TemplateEngine};

#[cfg(test)]
mod tests;

/// Template name of the per-record report layout.
pub const REPORT_115_TEMPLATE: &str = "report_115";

/// Name of the local body printed in the report header.
pub const ULB_SYSTEM_NAME: &str = "Dehu Nagar Parishad";

const REPORT_DATE_FORMAT: &str = "%d/%m/%Y";
const LOGO_PATH: &str = "images/dehulogo.png";
const SIGNATURE_PATH: &str = "images/signature.png";
const REGULAR_FONT_PATH: &str = "fonts/NotoSansDevanagari-Regular.ttf";
const BOLD_FONT_PATH: &str = "fonts/NotoSansDevanagari-Bold.ttf";

/// Absolute URL builder for report assets.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReportAssets {
    base_url: String,
}

impl ReportAssets {
    /// Creates an asset builder rooted at an absolute base URL.
    #[must_use]
    pub fn new(base_url: impl Into<String>) -> Self {
        let base_url = base_url.into();
        let base_url = format!("{}/", base_url.trim_end_matches('/'));
        Self { base_url }
    }

    /// URL of a file served from the media root.
    #[must_use]
    pub fn media_url(&self, relative_path: &str) -> String {
        format!(
            "{}media/{}",
            self.base_url,
            relative_path.trim_start_matches('/')
        )
    }

    /// URL of a file served from the static root.
    #[must_use]
    pub fn static_url(&self, relative_path: &str) -> String {
        format!(
            "{}static/{}",
            self.base_url,
            relative_path.trim_start_matches('/')
        )
    }
}

/// Header block of the report.
#[derive(Debug, Clone, Serialize)]
pub struct UlbInfo {
    /// Name of the local body.
    pub system_name: &'static str,
}

/// Survey fields plus display-formatted tax amounts.
#[derive(Debug, Clone, Serialize)]
pub struct ReportEntry<'a> {
    #[serde(flatten)]
    survey: &'a Survey,
    pending_tax: String,
    current_tax: String,
    total_tax: String,
}

/// Template context for one report.
#[derive(Debug, Clone, Serialize)]
pub struct ReportContext<'a> {
    /// The survey being reported.
    pub entry: ReportEntry<'a>,
    /// Floor line items sorted by floor number.
    pub floors: Vec<FloorEntry>,
    /// Whether the floor table is printed.
    pub has_floors: bool,
    /// Header block.
    pub ulb: UlbInfo,
    /// Notice date, `dd/mm/YYYY`.
    pub notice_date: String,
    /// Print date, `dd/mm/YYYY`.
    pub current_date: String,
    /// Absolute logo URL.
    pub logo_url: String,
    /// Absolute signature URL.
    pub signature_url: String,
    /// Absolute regular font URL.
    pub regular_font_url: String,
    /// Absolute bold font URL.
    pub bold_font_url: String,
    /// `None` serializes as `null`, the template's absent marker.
    pub property_image_url: Option<String>,
}

impl<'a> ReportContext<'a> {
    /// Builds the context for a survey. Floors are sorted by floor number.
    #[must_use]
    pub fn build(
        survey: &'a Survey,
        mut floors: Vec<FloorEntry>,
        assets: &ReportAssets,
        today: NaiveDate,
    ) -> Self {
        floors.sort_by_key(|floor| floor.floor_number);
        let date = today.format(REPORT_DATE_FORMAT).to_string();

        Self {
            entry: ReportEntry {
                survey,
                pending_tax: format_rupees(survey.pending_tax_paise),
                current_tax: format_rupees(survey.current_tax_paise),
                total_tax: format_rupees(survey.total_tax_paise),
            },
            has_floors: !floors.is_empty(),
            floors,
            ulb: UlbInfo {
                system_name: ULB_SYSTEM_NAME,
            },
            notice_date: date.clone(),
            current_date: date,
            logo_url: assets.media_url(LOGO_PATH),
            signature_url: assets.media_url(SIGNATURE_PATH),
            regular_font_url: assets.static_url(REGULAR_FONT_PATH),
            bold_font_url: assets.static_url(BOLD_FONT_PATH),
            property_image_url: property_image_url(survey, assets),
        }
    }
}

fn property_image_url(survey: &Survey, assets: &ReportAssets) -> Option<String> {
    let photo = survey.connection_photo.as_deref()?;
    if photo.trim().is_empty() || photo.contains("..") {
        warn!(survey_id = %survey.id, "ignoring unusable connection photo path");
        return None;
    }

    Some(assets.media_url(photo))
}

/// Formats an amount in paise as rupees with two decimals.
#[must_use]
pub fn format_rupees(paise: i64) -> String {
    let sign = if paise < 0 { "-" } else { "" };
    let absolute = paise.unsigned_abs();
    format!("{sign}{}.{:02}", absolute / 100, absolute % 100)
}

/// Renders the report layout through a template engine and compositor.
#[derive(Clone)]
pub struct TemplateReportRenderer {
    records: Arc<dyn SurveyRecordStore>,
    templates: Arc<dyn TemplateEngine>,
    compositor: Arc<dyn DocumentCompositor>,
    assets: ReportAssets,
}

impl TemplateReportRenderer {
    /// Creates a renderer from required dependencies.
    #[must_use]
    pub fn new(
        records: Arc<dyn SurveyRecordStore>,
        templates: Arc<dyn TemplateEngine>,
        compositor: Arc<dyn DocumentCompositor>,
        assets: ReportAssets,
    ) -> Self {
        Self {
            records,
            templates,
            compositor,
            assets,
        }
    }

    async fn floors_for(&self, survey: &Survey) -> Vec<FloorEntry> {
        match self.records.list_floors(survey.id).await {
            Ok(floors) => floors,
            Err(error) => {
                error!(survey_id = %survey.id, %error, "failed to load floor data, rendering without floors");
                Vec::new()
            }
        }
    }
}

#[async_trait]
impl SurveyReportRenderer for TemplateReportRenderer {
    async fn render(&self, survey: &Survey) -> AppResult<Vec<u8>> {
        let floors = self.floors_for(survey).await;
        let today = chrono::Local::now().date_naive();
        let context = ReportContext::build(survey, floors, &self.assets, today);
        let context = serde_json::to_value(&context).map_err(|error| {
            AppError::Render(format!("failed to serialize report context: {error}"))
        })?;

        let markup = self.templates.render(REPORT_115_TEMPLATE, &context)?;

        let compositor = self.compositor.clone();
        tokio::task::spawn_blocking(move || compositor.compose(markup.as_str()))
            .await
            .map_err(|error| AppError::Render(format!("document composition task failed: {error}")))?
    }
}
