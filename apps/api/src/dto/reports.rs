use serde::Deserialize;
use ts_rs::TS;
use wardbook_application::BulkReportRequest;

/// A number sent either as JSON number or as text.
#[derive(Debug, Clone, Deserialize, TS)]
#[serde(untagged)]
#[ts(
    export,
    export_to = "../../../packages/api-types/src/generated/transport-number.ts"
)]
pub enum TransportNumber {
    Number(i64),
    Text(String),
}

impl TransportNumber {
    fn into_text(self) -> String {
        match self {
            Self::Number(value) => value.to_string(),
            Self::Text(value) => value,
        }
    }
}

/// Bulk report selector posted by the frontend.
#[derive(Debug, Deserialize, TS)]
#[ts(
    export,
    export_to = "../../../packages/api-types/src/generated/bulk-report-request.ts"
)]
pub struct BulkReportRequestBody {
    #[serde(default)]
    pub ward_no: Option<TransportNumber>,
    #[serde(default)]
    pub property_no_start: Option<TransportNumber>,
    #[serde(default)]
    pub property_no_end: Option<TransportNumber>,
}

impl From<BulkReportRequestBody> for BulkReportRequest {
    fn from(value: BulkReportRequestBody) -> Self {
        Self {
            ward_no: value
                .ward_no
                .map(TransportNumber::into_text)
                .unwrap_or_default(),
            property_no_start: value.property_no_start.map(TransportNumber::into_text),
            property_no_end: value.property_no_end.map(TransportNumber::into_text),
        }
    }
}
