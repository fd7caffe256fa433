//! services/api/src/web/auth.rs
//!
//! Mock session endpoints. Login records the claimed role in a cookie; nothing is
//! verified against a backend.

use crate::web::middleware::SESSION_COOKIE;
use axum::{
    http::{header, StatusCode},
    response::IntoResponse,
    Extension, Json,
};
use campus_support_core::session::SessionState;
use chrono::Duration;
use serde::{Deserialize, Serialize};
use tracing::{info, warn};
use utoipa::ToSchema;

//=========================================================================================
// Request/Response Types
//=========================================================================================

#[derive(Deserialize, ToSchema)]
pub struct StudentLoginRequest {
    pub student_id: String,
    pub password: String,
}

#[derive(Deserialize, ToSchema)]
pub struct CounsellorLoginRequest {
    pub email: String,
    pub password: String,
}

#[derive(Serialize, ToSchema)]
pub struct SessionResponse {
    /// `student`, `counsellor`, or null when anonymous.
    pub role: Option<String>,
    pub student_id: Option<String>,
    /// Where the client should navigate for this role.
    pub redirect: String,
}

impl From<&SessionState> for SessionResponse {
    fn from(session: &SessionState) -> Self {
        Self {
            role: session.role().map(|r| r.as_str().to_string()),
            student_id: session.student_id().map(str::to_string),
            redirect: session.home_route().to_string(),
        }
    }
}

/// The student id is free text, so the value is percent-encoded to keep `;` and `,`
/// from ending the cookie early.
fn session_cookie(session: &SessionState) -> String {
    format!(
        "{}={}; HttpOnly; Secure; SameSite=Lax; Path=/; Max-Age={}",
        SESSION_COOKIE,
        urlencoding::encode(&session.to_string()),
        Duration::days(30).num_seconds()
    )
}

fn start_session(session: SessionState) -> impl IntoResponse {
    let cookie = session_cookie(&session);
    (
        StatusCode::OK,
        [(header::SET_COOKIE, cookie)],
        Json(SessionResponse::from(&session)),
    )
}

//=========================================================================================
// Handlers
//=========================================================================================

/// POST /auth/student/login - Start a student session
#[utoipa::path(
    post,
    path = "/auth/student/login",
    request_body = StudentLoginRequest,
    responses(
        (status = 200, description = "Session started", body = SessionResponse),
        (status = 400, description = "Student ID or password missing")
    )
)]
pub async fn student_login_handler(
    Json(req): Json<StudentLoginRequest>,
) -> Result<impl IntoResponse, (StatusCode, String)> {
    let session = SessionState::login_student(&req.student_id, &req.password).map_err(|e| {
        warn!("Rejected student login: {}", e);
        (StatusCode::BAD_REQUEST, e.to_string())
    })?;
    info!(student_id = ?session.student_id(), "Student session started");
    Ok(start_session(session))
}

/// POST /auth/counsellor/login - Start a counsellor session
#[utoipa::path(
    post,
    path = "/auth/counsellor/login",
    request_body = CounsellorLoginRequest,
    responses(
        (status = 200, description = "Session started", body = SessionResponse),
        (status = 400, description = "Email or password missing")
    )
)]
pub async fn counsellor_login_handler(
    Json(req): Json<CounsellorLoginRequest>,
) -> Result<impl IntoResponse, (StatusCode, String)> {
    let session = SessionState::login_counsellor(&req.email, &req.password).map_err(|e| {
        warn!("Rejected counsellor login: {}", e);
        (StatusCode::BAD_REQUEST, e.to_string())
    })?;
    info!("Counsellor session started");
    Ok(start_session(session))
}

/// POST /auth/logout - Clear the session cookie
#[utoipa::path(
    post,
    path = "/auth/logout",
    responses((status = 200, description = "Logout successful"))
)]
pub async fn logout_handler() -> impl IntoResponse {
    let cookie = format!(
        "{}=; HttpOnly; Secure; SameSite=Lax; Path=/; Max-Age=0",
        SESSION_COOKIE
    );
    (StatusCode::OK, [(header::SET_COOKIE, cookie)])
}

/// GET /auth/session - Report who the cookie says the caller is
#[utoipa::path(
    get,
    path = "/auth/session",
    responses((status = 200, description = "Current session", body = SessionResponse))
)]
pub async fn session_handler(Extension(session): Extension<SessionState>) -> Json<SessionResponse> {
    Json(SessionResponse::from(&session))
}
