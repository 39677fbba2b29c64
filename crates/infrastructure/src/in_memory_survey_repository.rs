use std::collections::HashMap;

use async_trait::async_trait;
use tokio::sync::RwLock;
use wardbook_application::SurveyRecordStore;
use wardbook_core::{AppError, AppResult};
use wardbook_domain::{FloorEntry, Survey, SurveyId, SurveySelector};

/// In-memory survey record store.
#[derive(Debug, Default)]
pub struct InMemorySurveyRepository {
    surveys: RwLock<HashMap<SurveyId, Survey>>,
    floors: RwLock<HashMap<SurveyId, Vec<FloorEntry>>>,
}

impl InMemorySurveyRepository {
    /// Creates an empty in-memory repository.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Stores a survey. Ward and property must be unique together.
    pub async fn insert_survey(&self, survey: Survey) -> AppResult<()> {
        let mut surveys = self.surveys.write().await;
        if surveys
            .values()
            .any(|stored| stored.ward == survey.ward && stored.property == survey.property)
        {
            return Err(AppError::Conflict(format!(
                "survey for ward {} property {} already exists",
                survey.ward, survey.property
            )));
        }

        surveys.insert(survey.id, survey);
        Ok(())
    }

    /// Replaces the floor line items of a survey.
    pub async fn replace_floors(&self, survey_id: SurveyId, floors: Vec<FloorEntry>) {
        self.floors.write().await.insert(survey_id, floors);
    }
}

#[async_trait]
impl SurveyRecordStore for InMemorySurveyRepository {
    async fn find_survey(&self, survey_id: SurveyId) -> AppResult<Option<Survey>> {
        Ok(self.surveys.read().await.get(&survey_id).cloned())
    }

    async fn list_surveys(&self, selector: &SurveySelector) -> AppResult<Vec<Survey>> {
        let mut matching: Vec<Survey> = self
            .surveys
            .read()
            .await
            .values()
            .filter(|survey| selector.matches(survey))
            .cloned()
            .collect();
        matching.sort_by_key(|survey| survey.property);

        Ok(matching)
    }

    async fn list_floors(&self, survey_id: SurveyId) -> AppResult<Vec<FloorEntry>> {
        let mut floors = self
            .floors
            .read()
            .await
            .get(&survey_id)
            .cloned()
            .unwrap_or_default();
        floors.sort_by_key(|floor| floor.floor_number);

        Ok(floors)
    }

    async fn set_artifact_key(&self, survey_id: SurveyId, key: Option<String>) -> AppResult<()> {
        let mut surveys = self.surveys.write().await;
        let survey = surveys
            .get_mut(&survey_id)
            .ok_or_else(|| AppError::NotFound(format!("survey '{survey_id}' was not found")))?;
        survey.artifact_key = key;

        Ok(())
    }
}
