//! PostgreSQL-backed survey record store.

use async_trait::async_trait;
use sqlx::{FromRow, PgPool};

use wardbook_application::SurveyRecordStore;
use wardbook_core::{AppError, AppResult};
use wardbook_domain::{
    FloorEntry, PropertyNumber, Survey, SurveyId, SurveySelector, UserId, WardNumber,
};


const SURVEY_COLUMNS: &str = r#"
    id, ward_no, property_no, old_connection_number, property_description,
    property_owner_name, property_owner_name_marathi, property_type,
    water_connection_owner_name, water_connection_owner_name_marathi,
    connection_type, connection_size, number_of_water_connections,
    mobile_number, address, address_marathi, pending_tax_paise,
    current_tax_paise, total_tax_paise, connection_photo, remarks,
    remarks_marathi, road_name, pincode, created_by, artifact_key
"#;

/// PostgreSQL implementation of the survey record store.
#[derive(Clone)]
pub struct PostgresSurveyRepository {
    pool: PgPool,
}

impl PostgresSurveyRepository {
    /// Creates a repository with the provided connection pool.
    #[must_use]
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[derive(Debug, FromRow)]
struct SurveyRow {
    id: uuid::Uuid,
    ward_no: i32,
    property_no: i32,
    old_connection_number: Option<String>,
    property_description: Option<String>,
    property_owner_name: Option<String>,
    property_owner_name_marathi: Option<String>,
    property_type: Option<String>,
    water_connection_owner_name: Option<String>,
    water_connection_owner_name_marathi: Option<String>,
    connection_type: Option<String>,
    connection_size: Option<String>,
    number_of_water_connections: Option<i32>,
    mobile_number: Option<String>,
    address: Option<String>,
    address_marathi: Option<String>,
    pending_tax_paise: i64,
    current_tax_paise: i64,
    total_tax_paise: i64,
    connection_photo: Option<String>,
    remarks: Option<String>,
    remarks_marathi: Option<String>,
    road_name: Option<String>,
    pincode: Option<String>,
    created_by: uuid::Uuid,
    artifact_key: Option<String>,
}

fn non_negative(value: i32, column: &str, survey_id: uuid::Uuid) -> AppResult<u32> {
    u32::try_from(value).map_err(|_| {
        AppError::Internal(format!(
            "survey '{survey_id}' has invalid {column} value {value}"
        ))
    })
}

impl TryFrom<SurveyRow> for Survey {
    type Error = AppError;

    fn try_from(row: SurveyRow) -> Result<Self, Self::Error> {
        let ward = WardNumber::new(non_negative(row.ward_no, "ward_no", row.id)?)?;
        let property = PropertyNumber::new(non_negative(row.property_no, "property_no", row.id)?)?;
        let number_of_water_connections = row
            .number_of_water_connections
            .map(|value| non_negative(value, "number_of_water_connections", row.id))
            .transpose()?;

        Ok(Self {
            id: SurveyId::from_uuid(row.id),
            ward,
            property,
            old_connection_number: row.old_connection_number,
            property_description: row.property_description,
            property_owner_name: row.property_owner_name,
            property_owner_name_marathi: row.property_owner_name_marathi,
            property_type: row.property_type,
            water_connection_owner_name: row.water_connection_owner_name,
            water_connection_owner_name_marathi: row.water_connection_owner_name_marathi,
            connection_type: row.connection_type,
            connection_size: row.connection_size,
            number_of_water_connections,
            mobile_number: row.mobile_number,
            address: row.address,
            address_marathi: row.address_marathi,
            pending_tax_paise: row.pending_tax_paise,
            current_tax_paise: row.current_tax_paise,
            total_tax_paise: row.total_tax_paise,
            connection_photo: row.connection_photo,
            remarks: row.remarks,
            remarks_marathi: row.remarks_marathi,
            road_name: row.road_name,
            pincode: row.pincode,
            created_by: UserId::from_uuid(row.created_by),
            artifact_key: row.artifact_key,
        })
    }
}

#[derive(Debug, FromRow)]
struct FloorRow {
    floor_number: i32,
    usage: Option<String>,
    construction_type: Option<String>,
    area_sq_ft: Option<String>,
}

impl From<FloorRow> for FloorEntry {
    fn from(row: FloorRow) -> Self {
        Self {
            floor_number: row.floor_number,
            usage: row.usage,
            construction_type: row.construction_type,
            area_sq_ft: row.area_sq_ft,
        }
    }
}

fn as_column(value: u32) -> AppResult<i32> {
    i32::try_from(value)
        .map_err(|_| AppError::Validation(format!("number {value} is out of range")))
}

#[async_trait]
impl SurveyRecordStore for PostgresSurveyRepository {
    async fn find_survey(&self, survey_id: SurveyId) -> AppResult<Option<Survey>> {
        let query = format!("SELECT {SURVEY_COLUMNS} FROM surveys WHERE id = $1");
        let row = sqlx::query_as::<_, SurveyRow>(query.as_str())
            .bind(survey_id.as_uuid())
            .fetch_optional(&self.pool)
            .await
            .map_err(|error| AppError::Internal(format!("failed to load survey: {error}")))?;

        row.map(Survey::try_from).transpose()
    }

    async fn list_surveys(&self, selector: &SurveySelector) -> AppResult<Vec<Survey>> {
        let (start, end) = match selector.range {
            Some(range) => (
                Some(as_column(range.start().value())?),
                Some(as_column(range.end().value())?),
            ),
            None => (None, None),
        };

        let query = format!(
            r#"
            SELECT {SURVEY_COLUMNS}
            FROM surveys
            WHERE ward_no = $1
                AND ($2::INTEGER IS NULL OR property_no >= $2)
                AND ($3::INTEGER IS NULL OR property_no <= $3)
            ORDER BY property_no ASC
            "#
        );
        let rows = sqlx::query_as::<_, SurveyRow>(query.as_str())
            .bind(as_column(selector.ward.value())?)
            .bind(start)
            .bind(end)
            .fetch_all(&self.pool)
            .await
            .map_err(|error| AppError::Internal(format!("failed to list surveys: {error}")))?;

        rows.into_iter().map(Survey::try_from).collect()
    }

    async fn list_floors(&self, survey_id: SurveyId) -> AppResult<Vec<FloorEntry>> {
        let rows = sqlx::query_as::<_, FloorRow>(
            r#"
            SELECT floor_number, usage, construction_type, area_sq_ft
            FROM survey_floors
            WHERE survey_id = $1
            ORDER BY floor_number
            "#,
        )
        .bind(survey_id.as_uuid())
        .fetch_all(&self.pool)
        .await
        .map_err(|error| AppError::Internal(format!("failed to load survey floors: {error}")))?;

        Ok(rows.into_iter().map(FloorEntry::from).collect())
    }

    async fn set_artifact_key(&self, survey_id: SurveyId, key: Option<String>) -> AppResult<()> {
        sqlx::query(
            r#"
            UPDATE surveys
            SET artifact_key = $2, updated_at = now()
            WHERE id = $1
            "#,
        )
        .bind(survey_id.as_uuid())
        .bind(key)
        .execute(&self.pool)
        .await
        .map_err(|error| {
            AppError::Internal(format!("failed to update survey artifact reference: {error}"))
        })?;

        Ok(())
    }
}
