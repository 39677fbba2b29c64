use std::sync::{Arc, Mutex, PoisonError};

use chrono::NaiveDate;
use serde_json::Value;
use wardbook_core::AppResult;
use wardbook_domain::{FloorEntry, UserId};

use super::{REPORT_115_TEMPLATE, ReportAssets, ReportContext, TemplateReportRenderer, format_rupees};
use crate::test_support::{FakeCompositor, FakeSurveyStore, survey};
use crate::{SurveyReportRenderer, TemplateEngine};

#[derive(Default)]
struct CapturingTemplateEngine {
    contexts: Mutex<Vec<(String, Value)>>,
}

impl CapturingTemplateEngine {
    fn last_context(&self) -> Option<Value> {
        self.contexts
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .last()
            .map(|(_, context)| context.clone())
    }
}

impl TemplateEngine for CapturingTemplateEngine {
    fn render(&self, template_name: &str, context: &Value) -> AppResult<String> {
        self.contexts
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .push((template_name.to_owned(), context.clone()));
        Ok(format!("<p>{template_name}</p>"))
    }
}

fn floor(floor_number: i32) -> FloorEntry {
    FloorEntry {
        floor_number,
        usage: Some("Residential".to_owned()),
        construction_type: Some("RCC".to_owned()),
        area_sq_ft: Some("450".to_owned()),
    }
}

fn assets() -> ReportAssets {
    ReportAssets::new("https://wardbook.example.in")
}

#[test]
fn context_sorts_floors_and_formats_dates() {
    let survey = survey(3, 42, UserId::new());
    let today = NaiveDate::from_ymd_opt(2026, 3, 7).unwrap_or_default();

    let context = ReportContext::build(&survey, vec![floor(2), floor(0), floor(1)], &assets(), today);

    let order: Vec<i32> = context
        .floors
        .iter()
        .map(|floor| floor.floor_number)
        .collect();
    assert_eq!(order, vec![0, 1, 2]);
    assert!(context.has_floors);
    assert_eq!(context.notice_date, "07/03/2026");
    assert_eq!(context.current_date, "07/03/2026");
}

#[test]
fn asset_urls_are_absolute() {
    let survey = survey(3, 42, UserId::new());
    let today = NaiveDate::from_ymd_opt(2026, 1, 1).unwrap_or_default();

    let context = ReportContext::build(&survey, Vec::new(), &assets(), today);

    assert_eq!(
        context.logo_url,
        "https://wardbook.example.in/media/images/dehulogo.png"
    );
    assert_eq!(
        context.bold_font_url,
        "https://wardbook.example.in/static/fonts/NotoSansDevanagari-Bold.ttf"
    );
    assert!(!context.has_floors);
}

#[test]
fn missing_photo_serializes_as_null() {
    let mut with_photo = survey(3, 42, UserId::new());
    with_photo.connection_photo = Some("connection_photos/42.jpg".to_owned());
    let without_photo = survey(3, 43, UserId::new());
    let today = NaiveDate::from_ymd_opt(2026, 1, 1).unwrap_or_default();

    let present = serde_json::to_value(ReportContext::build(&with_photo, Vec::new(), &assets(), today));
    let absent = serde_json::to_value(ReportContext::build(&without_photo, Vec::new(), &assets(), today));

    assert_eq!(
        present.ok().and_then(|value| value.get("property_image_url").cloned()),
        Some(Value::String(
            "https://wardbook.example.in/media/connection_photos/42.jpg".to_owned()
        ))
    );
    assert_eq!(
        absent.ok().and_then(|value| value.get("property_image_url").cloned()),
        Some(Value::Null)
    );
}

#[test]
fn entry_exposes_survey_fields_and_rupee_amounts() {
    let mut survey = survey(3, 42, UserId::new());
    survey.property_owner_name = Some("Sunita Pawar".to_owned());
    survey.total_tax_paise = 123_450;
    let today = NaiveDate::from_ymd_opt(2026, 1, 1).unwrap_or_default();

    let value = serde_json::to_value(ReportContext::build(&survey, Vec::new(), &assets(), today));
    let entry = value.ok().and_then(|value| value.get("entry").cloned());

    assert_eq!(
        entry
            .as_ref()
            .and_then(|entry| entry.get("property_owner_name"))
            .and_then(Value::as_str),
        Some("Sunita Pawar")
    );
    assert_eq!(
        entry
            .as_ref()
            .and_then(|entry| entry.get("total_tax"))
            .and_then(Value::as_str),
        Some("1234.50")
    );
}

#[test]
fn rupee_formatting_handles_small_and_negative_amounts() {
    assert_eq!(format_rupees(0), "0.00");
    assert_eq!(format_rupees(5), "0.05");
    assert_eq!(format_rupees(-250), "-2.50");
}

#[tokio::test]
async fn floor_failure_renders_with_empty_floors() {
    let records = Arc::new(FakeSurveyStore::default());
    let templates = Arc::new(CapturingTemplateEngine::default());
    let survey = survey(3, 42, UserId::new());
    records.set_floors(survey.id, vec![floor(1)]).await;
    records.fail_floor_queries().await;

    let renderer = TemplateReportRenderer::new(
        records,
        templates.clone(),
        Arc::new(FakeCompositor),
        assets(),
    );
    let bytes = renderer.render(&survey).await;

    assert!(bytes.is_ok_and(|bytes| bytes.starts_with(b"%PDF")));
    let context = templates.last_context();
    assert_eq!(
        context.as_ref().and_then(|context| context.get("has_floors")),
        Some(&Value::Bool(false))
    );
    assert_eq!(
        context
            .as_ref()
            .and_then(|context| context.get("floors"))
            .and_then(Value::as_array)
            .map(Vec::len),
        Some(0)
    );
}

#[tokio::test]
async fn renderer_uses_the_report_template() {
    let records = Arc::new(FakeSurveyStore::default());
    let templates = Arc::new(CapturingTemplateEngine::default());
    let survey = survey(3, 42, UserId::new());

    let renderer = TemplateReportRenderer::new(
        records,
        templates.clone(),
        Arc::new(FakeCompositor),
        assets(),
    );
    let bytes = renderer.render(&survey).await;

    assert!(bytes.is_ok());
    let names: Vec<String> = templates
        .contexts
        .lock()
        .unwrap_or_else(PoisonError::into_inner)
        .iter()
        .map(|(name, _)| name.clone())
        .collect();
    assert_eq!(names, vec![REPORT_115_TEMPLATE.to_owned()]);
}
