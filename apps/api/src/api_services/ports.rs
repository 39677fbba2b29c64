use std::sync::Arc;

use sqlx::PgPool;
use tracing::info;
use wardbook_core::AppError;
use wardbook_infrastructure::{
    Argon2PasswordHasher, FilesystemArtifactStorage, HandlebarsTemplateEngine,
    LopdfDocumentCompositor, PostgresAuthorizationRepository, PostgresRoleRepository,
    PostgresSurveyRepository, PostgresUserRepository,
};

use crate::api_config::ApiConfig;
use crate::state::ServicePorts;

/// Builds the production adapters: Postgres records, local artifact storage
/// and the bundled or overridden report templates.
pub async fn postgres_ports(pool: PgPool, config: &ApiConfig) -> Result<ServicePorts, AppError> {
    let templates = match config.report_template_dir.as_deref() {
        Some(directory) => HandlebarsTemplateEngine::with_template_dir(directory)?,
        None => HandlebarsTemplateEngine::new()?,
    };
    let storage = FilesystemArtifactStorage::new(config.artifact_root.clone()).await?;
    info!(root = %storage.root().display(), "artifact storage ready");

    Ok(ServicePorts {
        authorization: Arc::new(PostgresAuthorizationRepository::new(pool.clone())),
        roles: Arc::new(PostgresRoleRepository::new(pool.clone())),
        users: Arc::new(PostgresUserRepository::new(pool.clone())),
        password_hasher: Arc::new(Argon2PasswordHasher::new()),
        records: Arc::new(PostgresSurveyRepository::new(pool)),
        storage: Arc::new(storage),
        templates: Arc::new(templates),
        compositor: Arc::new(LopdfDocumentCompositor::new()),
    })
}
