use std::path::Path;

use handlebars::{
    Context, Handlebars, Helper, HelperResult, Output, RenderContext, RenderErrorReason, no_escape,
};
use serde_json::Value;
use tracing::info;
use wardbook_application::{REPORT_115_TEMPLATE, TemplateEngine};
use wardbook_core::{AppError, AppResult};

const TEMPLATE_EXTENSION: &str = "hbs";
const DEFAULT_REPORT_115: &str = include_str!("../templates/report_115.hbs");

/// Writes the parameter, or `-` when it is null or blank.
fn dash_helper(
    helper: &Helper,
    _: &Handlebars,
    _: &Context,
    _: &mut RenderContext,
    out: &mut dyn Output,
) -> HelperResult {
    let value = helper.param(0).map(|param| param.value());
    let rendered = match value {
        None | Some(Value::Null) => "-".to_owned(),
        Some(Value::String(text)) if text.trim().is_empty() => "-".to_owned(),
        Some(Value::String(text)) => text.clone(),
        Some(Value::Number(number)) => number.to_string(),
        Some(Value::Bool(flag)) => flag.to_string(),
        Some(_) => {
            return Err(RenderErrorReason::InvalidParamType("scalar").into());
        }
    };

    out.write(rendered.as_str())?;
    Ok(())
}

/// Template engine over a Handlebars registry.
///
/// The report layout is embedded; a template directory can override it.
pub struct HandlebarsTemplateEngine {
    registry: Handlebars<'static>,
}

impl HandlebarsTemplateEngine {
    /// Creates an engine with the embedded report templates.
    pub fn new() -> AppResult<Self> {
        let mut registry = Handlebars::new();
        registry.set_strict_mode(false);
        // Output is composed into PDF text, not HTML.
        registry.register_escape_fn(no_escape);
        registry.register_helper("dash", Box::new(dash_helper));
        registry
            .register_template_string(REPORT_115_TEMPLATE, DEFAULT_REPORT_115)
            .map_err(|error| {
                AppError::Internal(format!("failed to register embedded report template: {error}"))
            })?;

        Ok(Self { registry })
    }

    /// Creates an engine and registers every `*.hbs` file of `directory`,
    /// named after its file stem, over the embedded templates.
    pub fn with_template_dir(directory: &Path) -> AppResult<Self> {
        let mut engine = Self::new()?;
        let entries = std::fs::read_dir(directory).map_err(|error| {
            AppError::Internal(format!(
                "failed to read template directory '{}': {error}",
                directory.display()
            ))
        })?;

        for entry in entries {
            let path = entry
                .map_err(|error| {
                    AppError::Internal(format!("failed to read template directory entry: {error}"))
                })?
                .path();
            if path.extension().and_then(|extension| extension.to_str()) != Some(TEMPLATE_EXTENSION)
            {
                continue;
            }
            let Some(name) = path.file_stem().and_then(|stem| stem.to_str()) else {
                continue;
            };

            engine
                .registry
                .register_template_file(name, &path)
                .map_err(|error| {
                    AppError::Internal(format!(
                        "failed to register template '{}': {error}",
                        path.display()
                    ))
                })?;
            info!(template = name, path = %path.display(), "registered template override");
        }

        Ok(engine)
    }

    /// Returns whether a template is registered under `name`.
    #[must_use]
    pub fn has_template(&self, name: &str) -> bool {
        self.registry.has_template(name)
    }
}

impl TemplateEngine for HandlebarsTemplateEngine {
    fn render(&self, template_name: &str, context: &Value) -> AppResult<String> {
        if !self.registry.has_template(template_name) {
            return Err(AppError::Render(format!(
                "template '{template_name}' is not registered"
            )));
        }

        self.registry
            .render(template_name, context)
            .map_err(|error| {
                AppError::Render(format!("failed to render template '{template_name}': {error}"))
            })
    }
}

#[cfg(test)]
mod tests {
    use serde_json::json;
    use wardbook_application::{REPORT_115_TEMPLATE, TemplateEngine};
    use wardbook_core::AppError;

    use super::HandlebarsTemplateEngine;

    fn engine() -> HandlebarsTemplateEngine {
        match HandlebarsTemplateEngine::new() {
            Ok(engine) => engine,
            Err(error) => panic!("embedded templates should register: {error}"),
        }
    }

    fn report_context() -> serde_json::Value {
        json!({
            "entry": {
                "ward": 3,
                "property": 42,
                "property_owner_name": "Sunita Pawar",
                "address": "  ",
                "number_of_water_connections": 2,
                "pending_tax": "100.00",
                "current_tax": "250.50",
                "total_tax": "350.50"
            },
            "floors": [
                {"floor_number": 0, "usage": "Residential", "construction_type": "RCC", "area_sq_ft": "650"},
                {"floor_number": 1, "usage": null, "construction_type": "RCC", "area_sq_ft": "500"}
            ],
            "has_floors": true,
            "ulb": {"system_name": "Dehu Nagar Parishad"},
            "notice_date": "07/03/2026",
            "current_date": "07/03/2026",
            "property_image_url": null
        })
    }

    #[test]
    fn report_layout_prints_fields_and_floors() {
        let rendered = engine().render(REPORT_115_TEMPLATE, &report_context());

        let Ok(markup) = rendered else {
            panic!("report should render");
        };
        assert!(markup.starts_with("# Dehu Nagar Parishad"));
        assert!(markup.contains("Ward number: 3"));
        assert!(markup.contains("Property number: 42"));
        assert!(markup.contains("Owner: Sunita Pawar"));
        assert!(markup.contains("Address: -"));
        assert!(markup.contains("Number of connections: 2"));
        assert!(markup.contains("Floor 0: Residential / RCC / 650 sq ft"));
        assert!(markup.contains("Floor 1: - / RCC / 500 sq ft"));
        assert!(markup.contains("Connection photo: not available"));
        assert!(markup.contains("Total tax: 350.50"));
    }

    #[test]
    fn values_are_not_html_escaped() {
        let mut context = report_context();
        context["entry"]["property_owner_name"] = json!("Patil & Sons <Trust>");

        let markup = engine().render(REPORT_115_TEMPLATE, &context).ok();

        assert!(
            markup
                .as_deref()
                .is_some_and(|markup| markup.contains("Owner: Patil & Sons <Trust>"))
        );
    }

    #[test]
    fn unknown_template_is_a_render_error() {
        let result = engine().render("report_999", &json!({}));

        assert!(matches!(result, Err(AppError::Render(_))));
    }

    #[test]
    fn template_directory_overrides_embedded_layout() {
        let directory = match tempfile::tempdir() {
            Ok(directory) => directory,
            Err(error) => panic!("failed to create temp dir: {error}"),
        };
        let written = std::fs::write(
            directory.path().join("report_115.hbs"),
            "# Custom {{entry.ward}}/{{entry.property}}",
        );
        assert!(written.is_ok());
        assert!(std::fs::write(directory.path().join("notes.txt"), "ignored").is_ok());

        let engine = match HandlebarsTemplateEngine::with_template_dir(directory.path()) {
            Ok(engine) => engine,
            Err(error) => panic!("override directory should load: {error}"),
        };

        assert!(!engine.has_template("notes"));
        assert_eq!(
            engine.render(REPORT_115_TEMPLATE, &report_context()).ok(),
            Some("# Custom 3/42".to_owned())
        );
    }
}
