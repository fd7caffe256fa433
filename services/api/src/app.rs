//! services/api/src/app.rs
//!
//! Assembles the HTTP router. Shared by the `api` binary and the integration tests.

use crate::web::{
    auth::{counsellor_login_handler, logout_handler, session_handler, student_login_handler},
    load_session, require_counsellor, require_student,
    rest::{
        assign_case_handler, create_case_handler, dashboard_handler, get_case_handler,
        health_handler, list_cases_handler, resolve_case_handler, ApiDoc,
    },
    state::AppState,
    ws_handler,
};
use axum::{
    middleware as axum_middleware,
    routing::{get, post},
    Router,
};
use std::sync::Arc;
use tower_http::cors::CorsLayer;
use utoipa::OpenApi;
use utoipa_swagger_ui::SwaggerUi;

/// Builds the full application router.
///
/// Every request passes through `load_session`; the role gates sit inside it.
pub fn build_router(app_state: Arc<AppState>, cors: Option<CorsLayer>) -> Router {
    // Public routes (no session required)
    let public_routes = Router::new()
        .route("/auth/student/login", post(student_login_handler))
        .route("/auth/counsellor/login", post(counsellor_login_handler))
        .route("/auth/logout", post(logout_handler))
        .route("/auth/session", get(session_handler))
        .route("/health", get(health_handler));

    let student_routes = Router::new()
        .route("/cases", post(create_case_handler))
        .route_layer(axum_middleware::from_fn(require_student));

    let counsellor_routes = Router::new()
        .route("/cases", get(list_cases_handler))
        .route("/cases/{id}", get(get_case_handler))
        .route("/cases/{id}/assign", post(assign_case_handler))
        .route("/cases/{id}/resolve", post(resolve_case_handler))
        .route("/dashboard/{section}", get(dashboard_handler))
        .route("/ws", get(ws_handler))
        .route_layer(axum_middleware::from_fn(require_counsellor));

    let mut api_router = Router::new()
        .merge(public_routes)
        .merge(student_routes)
        .merge(counsellor_routes)
        .layer(axum_middleware::from_fn(load_session))
        .with_state(app_state);

    if let Some(cors) = cors {
        api_router = api_router.layer(cors);
    }

    // Merge the API router with the Swagger UI router for a complete application.
    Router::new()
        .merge(api_router)
        .merge(SwaggerUi::new("/swagger-ui").url("/api-docs/openapi.json", ApiDoc::openapi()))
}
