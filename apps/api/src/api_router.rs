mod cors;

use axum::Router;
use axum::middleware::{from_fn, from_fn_with_state};
use axum::routing::{delete, get, post, put};
use tower_http::trace::TraceLayer;
use tower_sessions::{SessionManagerLayer, SessionStore};
use wardbook_core::AppError;

use crate::state::AppState;
use crate::{auth, handlers, middleware};

pub fn build_router<S>(
    app_state: AppState,
    frontend_url: &str,
    session_layer: SessionManagerLayer<S>,
) -> Result<Router, AppError>
where
    S: SessionStore + Clone,
{
    let protected_routes = Router::new()
        .route("/auth/me", get(auth::me_handler))
        .route(
            "/api/roles",
            get(handlers::roles::list_roles_handler).post(handlers::roles::create_role_handler),
        )
        .route(
            "/api/roles/services",
            get(handlers::roles::list_services_handler),
        )
        .route(
            "/api/roles/{role_id}",
            put(handlers::roles::rename_role_handler).delete(handlers::roles::delete_role_handler),
        )
        .route(
            "/api/roles/{role_id}/permissions",
            get(handlers::roles::role_permissions_handler)
                .put(handlers::roles::replace_role_permissions_handler),
        )
        .route(
            "/api/roles/{role_id}/modules",
            get(handlers::roles::role_modules_handler),
        )
        .route(
            "/api/users/{user_id}",
            delete(handlers::users::delete_user_handler),
        )
        .route(
            "/api/users/{user_id}/role",
            put(handlers::users::change_user_role_handler),
        )
        .route(
            "/api/reports/115/single/{survey_id}",
            get(handlers::reports::single_report_handler),
        )
        .route(
            "/api/reports/115/bulk",
            post(handlers::reports::bulk_report_handler),
        )
        .route(
            "/api/surveys/{survey_id}/pdf",
            get(handlers::reports::download_survey_pdf_handler),
        )
        .route(
            "/api/surveys/{survey_id}/pdf/regenerate",
            post(handlers::reports::regenerate_survey_pdf_handler),
        )
        .route_layer(from_fn(middleware::require_auth));

    Ok(Router::new()
        .route("/health", get(handlers::health::health_handler))
        .route("/auth/login", post(auth::login_handler))
        .route("/auth/logout", post(auth::logout_handler))
        .merge(protected_routes)
        .route_layer(from_fn_with_state(
            app_state.clone(),
            middleware::require_same_origin_for_mutations,
        ))
        .layer(TraceLayer::new_for_http())
        .layer(cors::build_cors_layer(frontend_url)?)
        .layer(session_layer)
        .with_state(app_state))
}
