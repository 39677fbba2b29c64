use std::sync::Arc;
use std::time::Duration;

use wardbook_application::{
    ArtifactCache, ArtifactStorage, AuthorizationRepository, AuthorizationService,
    BootstrapService, DocumentCompositor, PasswordHasher, ReportAssets, ReportService,
    RoleAdminRepository, RoleAdminService, SurveyRecordStore, TemplateEngine,
    TemplateReportRenderer, UserRepository, UserService,
};

/// Adapters behind every application port.
#[derive(Clone)]
pub struct ServicePorts {
    pub authorization: Arc<dyn AuthorizationRepository>,
    pub roles: Arc<dyn RoleAdminRepository>,
    pub users: Arc<dyn UserRepository>,
    pub password_hasher: Arc<dyn PasswordHasher>,
    pub records: Arc<dyn SurveyRecordStore>,
    pub storage: Arc<dyn ArtifactStorage>,
    pub templates: Arc<dyn TemplateEngine>,
    pub compositor: Arc<dyn DocumentCompositor>,
}

/// Report pipeline tuning.
#[derive(Debug, Clone)]
pub struct ReportOptions {
    pub asset_base_url: String,
    pub render_timeout: Duration,
    pub bulk_concurrency: usize,
}

/// Shared application state.
#[derive(Clone)]
pub struct AppState {
    pub authorization_service: AuthorizationService,
    pub role_admin_service: RoleAdminService,
    pub user_service: UserService,
    pub report_service: ReportService,
    pub frontend_url: String,
}

impl AppState {
    /// Wires the application services over the given adapters.
    pub fn from_ports(ports: &ServicePorts, options: &ReportOptions, frontend_url: String) -> Self {
        let authorization_service = AuthorizationService::new(ports.authorization.clone());

        let renderer = Arc::new(TemplateReportRenderer::new(
            ports.records.clone(),
            ports.templates.clone(),
            ports.compositor.clone(),
            ReportAssets::new(options.asset_base_url.clone()),
        ));
        let cache = ArtifactCache::new(ports.records.clone(), ports.storage.clone(), renderer)
            .with_render_timeout(options.render_timeout);

        Self {
            role_admin_service: RoleAdminService::new(
                authorization_service.clone(),
                ports.roles.clone(),
            ),
            user_service: UserService::new(
                authorization_service.clone(),
                ports.users.clone(),
                ports.roles.clone(),
                ports.password_hasher.clone(),
            ),
            report_service: ReportService::new(
                authorization_service.clone(),
                ports.records.clone(),
                cache,
                ports.compositor.clone(),
            )
            .with_bulk_concurrency(options.bulk_concurrency),
            authorization_service,
            frontend_url,
        }
    }
}

impl ServicePorts {
    /// Startup seeding over the same adapters as the request path.
    pub fn bootstrap_service(&self) -> BootstrapService {
        BootstrapService::new(
            self.roles.clone(),
            self.users.clone(),
            self.password_hasher.clone(),
        )
    }
}
