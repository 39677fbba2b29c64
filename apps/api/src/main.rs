//! Wardbook API composition root.

#![forbid(unsafe_code)]

mod api_config;
mod api_router;
mod api_services;
mod auth;
mod dto;
mod error;
mod handlers;
mod middleware;
mod state;

use tracing::info;
use wardbook_core::AppError;

use crate::api_config::{ApiConfig, init_tracing};
use crate::state::{AppState, ReportOptions};

#[tokio::main]
async fn main() -> Result<(), AppError> {
    dotenvy::dotenv().ok();
    init_tracing();

    let config = ApiConfig::load()?;
    let pool = api_services::connect_and_migrate(&config.database_url).await?;

    if config.migrate_only {
        info!("database migrations applied successfully");
        return Ok(());
    }

    let session_layer =
        api_services::build_postgres_session_layer(pool.clone(), config.cookie_secure).await?;
    let ports = api_services::postgres_ports(pool, &config).await?;

    let bootstrap = ports
        .bootstrap_service()
        .ensure_defaults(&config.admin_seed)
        .await?;
    info!(
        role_created = bootstrap.role_created,
        user_created = bootstrap.user_created,
        grant_created = bootstrap.grant_created,
        "startup seeding finished"
    );

    let options = ReportOptions {
        asset_base_url: config.report_asset_base_url.to_string(),
        render_timeout: config.report_render_timeout,
        bulk_concurrency: config.report_bulk_concurrency,
    };
    let app_state = AppState::from_ports(&ports, &options, config.frontend_url.clone());
    let app = api_router::build_router(app_state, &config.frontend_url, session_layer)?;

    let address = config.socket_address()?;
    let listener = tokio::net::TcpListener::bind(address)
        .await
        .map_err(|error| AppError::Internal(format!("failed to bind listener: {error}")))?;

    info!(%address, "wardbook-api listening");

    axum::serve(listener, app)
        .await
        .map_err(|error| AppError::Internal(format!("api server error: {error}")))
}
