use std::fmt::{Display, Formatter};
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use wardbook_core::AppError;

/// Module permissions enforced by application policy checks.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum Permission {
    /// Allows listing and reading surveys.
    AccessSurvey,
    /// Allows creating surveys.
    CreateSurvey,
    /// Allows editing surveys.
    EditSurvey,
    /// Allows deleting surveys.
    DeleteSurvey,
    /// Allows exporting surveys to spreadsheets.
    ExportSurvey,
    /// Allows importing surveys from spreadsheets.
    ImportSurvey,
    /// Allows downloading the import template.
    DownloadSurveyTemplate,
    /// Allows generating single and bulk 115 reports.
    #[serde(rename = "generate-report-115")]
    GenerateReport115,
    /// Allows downloading the cached survey PDF.
    DownloadSurveyPdf,
}

/// Registry entry describing the UI module unlocked by one permission.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ServiceDescriptor {
    /// Permission tag granting the service.
    pub permission: Permission,
    /// Frontend module key.
    pub module: &'static str,
    /// Human-readable service name.
    pub name: &'static str,
}

impl Permission {
    /// Returns a stable storage value for this permission.
    #[must_use]
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::AccessSurvey => "access-survey",
            Self::CreateSurvey => "create-survey",
            Self::EditSurvey => "edit-survey",
            Self::DeleteSurvey => "delete-survey",
            Self::ExportSurvey => "export-survey",
            Self::ImportSurvey => "import-survey",
            Self::DownloadSurveyTemplate => "download-survey-template",
            Self::GenerateReport115 => "generate-report-115",
            Self::DownloadSurveyPdf => "download-survey-pdf",
        }
    }

    /// Returns all known permissions.
    #[must_use]
    pub fn all() -> &'static [Self] {
        const ALL: &[Permission] = &[
            Permission::AccessSurvey,
            Permission::CreateSurvey,
            Permission::EditSurvey,
            Permission::DeleteSurvey,
            Permission::ExportSurvey,
            Permission::ImportSurvey,
            Permission::DownloadSurveyTemplate,
            Permission::GenerateReport115,
            Permission::DownloadSurveyPdf,
        ];

        ALL
    }

    /// Returns the registry entry for this permission.
    #[must_use]
    pub fn descriptor(&self) -> ServiceDescriptor {
        let (module, name) = match self {
            Self::AccessSurvey => ("accesssurvey", "Access Survey"),
            Self::CreateSurvey => ("createsurvey", "Create Survey"),
            Self::EditSurvey => ("editsurvey", "Edit Survey"),
            Self::DeleteSurvey => ("deletesurvey", "Delete Survey"),
            Self::ExportSurvey => ("exportsurvey", "Export Survey"),
            Self::ImportSurvey => ("importsurvey", "Import Survey"),
            Self::DownloadSurveyTemplate => ("surveytemplate", "Download Survey Template"),
            Self::GenerateReport115 => ("report115", "Generate Report 115"),
            Self::DownloadSurveyPdf => ("surveypdf", "Download Survey PDF"),
        };

        ServiceDescriptor {
            permission: *self,
            module,
            name,
        }
    }

    /// Parses a transport value into a permission.
    pub fn from_transport(value: &str) -> Result<Self, AppError> {
        Self::from_str(value)
    }
}

impl Display for Permission {
    fn fmt(&self, formatter: &mut Formatter<'_>) -> std::fmt::Result {
        formatter.write_str(self.as_str())
    }
}

impl FromStr for Permission {
    type Err = AppError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        Self::all()
            .iter()
            .copied()
            .find(|permission| permission.as_str() == value)
            .ok_or_else(|| AppError::Validation(format!("unknown permission value '{value}'")))
    }
}

/// One stored role grant: either the wildcard or a single module permission.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum Grant {
    /// Wildcard grant implying every permission.
    All,
    /// Grant of one specific permission.
    Permission(Permission),
}

impl Grant {
    /// Storage value of the wildcard grant.
    pub const ALL_TAG: &'static str = "all";

    /// Returns the stored tag for this grant.
    #[must_use]
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::All => Self::ALL_TAG,
            Self::Permission(permission) => permission.as_str(),
        }
    }

    /// Returns whether this grant satisfies the required permission.
    ///
    /// Matching is exact; tags are never treated as prefixes or patterns.
    #[must_use]
    pub fn covers(&self, required: Permission) -> bool {
        match self {
            Self::All => true,
            Self::Permission(permission) => *permission == required,
        }
    }
}

impl FromStr for Grant {
    type Err = AppError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        if value == Self::ALL_TAG {
            return Ok(Self::All);
        }

        Permission::from_str(value).map(Self::Permission)
    }
}

impl From<Permission> for Grant {
    fn from(value: Permission) -> Self {
        Self::Permission(value)
    }
}

#[cfg(test)]
mod tests {
    use std::str::FromStr;

    use super::{Grant, Permission};

    #[test]
    fn permission_roundtrip_storage_value() {
        for permission in Permission::all() {
            let restored = Permission::from_str(permission.as_str());
            assert_eq!(restored.ok(), Some(*permission));
        }
    }

    #[test]
    fn unknown_permission_is_rejected() {
        assert!(Permission::from_str("generate-report").is_err());
        assert!(Permission::from_str("Access-Survey").is_err());
    }

    #[test]
    fn wildcard_grant_is_parsed_separately() {
        assert_eq!(Grant::from_str("all").ok(), Some(Grant::All));
        assert!(Permission::from_str("all").is_err());
    }

    #[test]
    fn wildcard_covers_every_permission() {
        assert!(
            Permission::all()
                .iter()
                .all(|permission| Grant::All.covers(*permission))
        );
    }

    #[test]
    fn specific_grant_requires_exact_match() {
        let grant = Grant::Permission(Permission::GenerateReport115);
        assert!(grant.covers(Permission::GenerateReport115));
        assert!(!grant.covers(Permission::DownloadSurveyPdf));
    }

    #[test]
    fn descriptor_and_display_use_storage_tags() {
        assert_eq!(
            Permission::GenerateReport115.descriptor().permission.as_str(),
            "generate-report-115"
        );
        assert_eq!(Permission::DownloadSurveyPdf.to_string(), "download-survey-pdf");
    }
}
