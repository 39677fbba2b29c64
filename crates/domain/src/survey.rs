use std::fmt::{Display, Formatter};
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use uuid::Uuid;
use wardbook_core::{AppError, AppResult};

use crate::UserId;

/// Unique identifier for a survey record.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct SurveyId(Uuid);

impl SurveyId {
    /// Creates a new random survey identifier.
    #[must_use]
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }

    /// Creates a survey identifier from an existing UUID value.
    #[must_use]
    pub fn from_uuid(value: Uuid) -> Self {
        Self(value)
    }

    /// Returns the underlying UUID value.
    #[must_use]
    pub fn as_uuid(&self) -> Uuid {
        self.0
    }
}

impl Default for SurveyId {
    fn default() -> Self {
        Self::new()
    }
}

impl Display for SurveyId {
    fn fmt(&self, formatter: &mut Formatter<'_>) -> std::fmt::Result {
        write!(formatter, "{}", self.0)
    }
}

macro_rules! positive_number {
    ($(#[$meta:meta])* $name:ident, $label:literal) => {
        #[doc = concat!("Positive ", $label, ".")]
        $(#[$meta])*
        #[derive(
            Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize,
        )]
        pub struct $name(u32);

        impl $name {
            #[doc = concat!("Creates a validated ", $label, ".")]
            pub fn new(value: u32) -> AppResult<Self> {
                if value == 0 {
                    return Err(AppError::Validation(format!(
                        "{} must be a positive integer",
                        $label
                    )));
                }

                Ok(Self(value))
            }

            /// Returns the numeric value.
            #[must_use]
            pub fn value(&self) -> u32 {
                self.0
            }
        }

        impl FromStr for $name {
            type Err = AppError;

            fn from_str(value: &str) -> Result<Self, Self::Err> {
                let parsed = value.trim().parse::<u32>().map_err(|_| {
                    AppError::Validation(format!(
                        "{} must be a positive integer, got '{value}'",
                        $label
                    ))
                })?;

                Self::new(parsed)
            }
        }

        impl Display for $name {
            fn fmt(&self, formatter: &mut Formatter<'_>) -> std::fmt::Result {
                write!(formatter, "{}", self.0)
            }
        }
    };
}

positive_number!(WardNumber, "ward number");
positive_number!(
    ///
    /// Only purely numeric property numbers are representable, so numbering
    /// schemes with suffixes such as "12A" are rejected. In exchange ranges
    /// and ordering are numeric.
    PropertyNumber,
    "property number"
);

/// Inclusive property-number range.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PropertyRange {
    start: PropertyNumber,
    end: PropertyNumber,
}

impl PropertyRange {
    /// Creates a range, rejecting a start bound above the end bound.
    pub fn new(start: PropertyNumber, end: PropertyNumber) -> AppResult<Self> {
        if start > end {
            return Err(AppError::Validation(format!(
                "property range start {start} must not exceed end {end}"
            )));
        }

        Ok(Self { start, end })
    }

    /// Returns the lower bound.
    #[must_use]
    pub fn start(&self) -> PropertyNumber {
        self.start
    }

    /// Returns the upper bound.
    #[must_use]
    pub fn end(&self) -> PropertyNumber {
        self.end
    }

    /// Returns whether the property number lies inside both bounds.
    #[must_use]
    pub fn contains(&self, value: PropertyNumber) -> bool {
        self.start <= value && value <= self.end
    }
}

/// Record selection used by bulk report generation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SurveySelector {
    /// Ward whose surveys are selected.
    pub ward: WardNumber,
    /// Optional inclusive property-number range inside the ward.
    pub range: Option<PropertyRange>,
}

impl SurveySelector {
    /// Parses a selector from transport values.
    ///
    /// Blank range bounds count as absent. A range applies only when both
    /// bounds are given; a lone bound selects the whole ward.
    pub fn parse(ward: &str, start: Option<&str>, end: Option<&str>) -> AppResult<Self> {
        if ward.trim().is_empty() {
            return Err(AppError::Validation("ward number is required".to_owned()));
        }
        let ward = WardNumber::from_str(ward)?;

        let start = start.filter(|value| !value.trim().is_empty());
        let end = end.filter(|value| !value.trim().is_empty());

        let range = match (start, end) {
            (Some(start), Some(end)) => Some(PropertyRange::new(
                PropertyNumber::from_str(start)?,
                PropertyNumber::from_str(end)?,
            )?),
            _ => None,
        };

        Ok(Self { ward, range })
    }

    /// Returns whether the survey falls inside this selection.
    #[must_use]
    pub fn matches(&self, survey: &Survey) -> bool {
        survey.ward == self.ward
            && self
                .range
                .is_none_or(|range| range.contains(survey.property))
    }
}

/// Floor-level line item of a survey.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FloorEntry {
    /// Floor number, ground floor is zero.
    pub floor_number: i32,
    /// Usage of the floor (residential, shop, ...).
    pub usage: Option<String>,
    /// Construction type of the floor.
    pub construction_type: Option<String>,
    /// Built-up area in square feet as surveyed.
    pub area_sq_ft: Option<String>,
}

/// Property and water-connection survey record.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Survey {
    /// Stable survey identifier.
    pub id: SurveyId,
    /// Ward the property belongs to.
    pub ward: WardNumber,
    /// Property number, unique inside the ward.
    pub property: PropertyNumber,
    /// Old water connection number.
    pub old_connection_number: Option<String>,
    /// Property description.
    pub property_description: Option<String>,
    /// Property owner name.
    pub property_owner_name: Option<String>,
    /// Property owner name in Marathi.
    pub property_owner_name_marathi: Option<String>,
    /// Property type.
    pub property_type: Option<String>,
    /// Water connection owner name.
    pub water_connection_owner_name: Option<String>,
    /// Water connection owner name in Marathi.
    pub water_connection_owner_name_marathi: Option<String>,
    /// Authorized or unauthorized connection.
    pub connection_type: Option<String>,
    /// Connection pipe size.
    pub connection_size: Option<String>,
    /// Number of water connections on the property.
    pub number_of_water_connections: Option<u32>,
    /// Contact mobile number.
    pub mobile_number: Option<String>,
    /// Postal address.
    pub address: Option<String>,
    /// Postal address in Marathi.
    pub address_marathi: Option<String>,
    /// Pending tax in paise.
    pub pending_tax_paise: i64,
    /// Current tax in paise.
    pub current_tax_paise: i64,
    /// Total tax in paise.
    pub total_tax_paise: i64,
    /// Storage key of the connection photo, relative to the media root.
    pub connection_photo: Option<String>,
    /// Surveyor remarks.
    pub remarks: Option<String>,
    /// Surveyor remarks in Marathi.
    pub remarks_marathi: Option<String>,
    /// Road name.
    pub road_name: Option<String>,
    /// Postal code.
    pub pincode: Option<String>,
    /// User who created the survey.
    pub created_by: UserId,
    /// Storage key of the cached report, when one was generated.
    pub artifact_key: Option<String>,
}

impl Survey {
    /// Storage prefix for rendered reports.
    pub const ARTIFACT_PREFIX: &'static str = "reports";

    /// Creates a survey with only its identifying fields set.
    #[must_use]
    pub fn new(ward: WardNumber, property: PropertyNumber, created_by: UserId) -> Self {
        Self {
            id: SurveyId::new(),
            ward,
            property,
            old_connection_number: None,
            property_description: None,
            property_owner_name: None,
            property_owner_name_marathi: None,
            property_type: None,
            water_connection_owner_name: None,
            water_connection_owner_name_marathi: None,
            connection_type: None,
            connection_size: None,
            number_of_water_connections: None,
            mobile_number: None,
            address: None,
            address_marathi: None,
            pending_tax_paise: 0,
            current_tax_paise: 0,
            total_tax_paise: 0,
            connection_photo: None,
            remarks: None,
            remarks_marathi: None,
            road_name: None,
            pincode: None,
            created_by,
            artifact_key: None,
        }
    }

    /// Returns the deterministic file name of the cached report.
    #[must_use]
    pub fn artifact_file_name(&self) -> String {
        format!(
            "Survey_Report_Ward_{}_Property_{}_{}.pdf",
            self.ward, self.property, self.id
        )
    }

    /// Returns the deterministic storage key of the cached report.
    #[must_use]
    pub fn artifact_path(&self) -> String {
        format!("{}/{}", Self::ARTIFACT_PREFIX, self.artifact_file_name())
    }
}
