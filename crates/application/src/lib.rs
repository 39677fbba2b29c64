//! Application services and ports.

#![forbid(unsafe_code)]

mod artifact_cache;
mod authorization_service;
mod bootstrap_service;
mod report_ports;
mod report_renderer;
mod report_service;
mod role_admin_ports;
mod role_admin_service;
mod user_ports;
mod user_service;

#[cfg(test)]
mod test_support;

pub use artifact_cache::{
    Artifact, ArtifactCache, ArtifactFailure, ArtifactFailureKind, ArtifactOutcome,
    ArtifactSource, DEFAULT_RENDER_TIMEOUT, RenderMode,
};
pub use authorization_service::{
    AccessDecision, AuthorizationRepository, AuthorizationService, ModuleAccess,
};
pub use bootstrap_service::{AdminSeed, BootstrapReport, BootstrapService};
pub use report_ports::{
    ArtifactStorage, DocumentCompositor, DocumentPart, MergedDocument, RejectedPart,
    SurveyRecordStore, SurveyReportRenderer, TemplateEngine,
};
pub use report_renderer::{
    REPORT_115_TEMPLATE, ReportAssets, ReportContext, ReportEntry, TemplateReportRenderer,
    ULB_SYSTEM_NAME, UlbInfo, format_rupees,
};
pub use report_service::{
    BulkReport, BulkReportRequest, BulkReportSummary, ReportDiagnostic, ReportDocument,
    ReportService,
};
pub use role_admin_ports::{RoleAdminRepository, RoleDefinition};
pub use role_admin_service::RoleAdminService;
pub use user_ports::{NewUserAccount, PasswordHasher, UserAccount, UserRepository};
pub use user_service::UserService;
