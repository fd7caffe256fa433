//! services/api/src/web/rest.rs
//!
//! Contains the Axum handlers for the REST API endpoints and the master
//! definition for the OpenAPI specification.

use crate::web::{
    auth::{self, CounsellorLoginRequest, SessionResponse, StudentLoginRequest},
    live_view::fetch_view,
    models::{
        AssignCaseRequest, AssignOverviewResponse, AssignableCaseResponse, CaseResponse,
        CreateCaseRequest, DashboardSummaryResponse, HostelDetailResponse, ListCasesQuery,
        TeamMemberResponse, ViewModel,
    },
    state::AppState,
};
use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    response::{IntoResponse, Json},
};
use campus_support_core::{
    domain::{CaseFilter, CaseStatus, HelpType, Hostel},
    intake::{IntakeForm, SubmitError},
    ports::PortError,
    views::{is_known_counsellor, DashboardSection},
};
use std::sync::Arc;
use tracing::{error, info};
use utoipa::OpenApi;
use uuid::Uuid;

//=========================================================================================
// OpenAPI Master Definition
//=========================================================================================

#[derive(OpenApi)]
#[openapi(
    paths(
        create_case_handler,
        list_cases_handler,
        get_case_handler,
        assign_case_handler,
        resolve_case_handler,
        dashboard_handler,
        health_handler,
        auth::student_login_handler,
        auth::counsellor_login_handler,
        auth::logout_handler,
        auth::session_handler,
    ),
    components(
        schemas(
            CreateCaseRequest,
            AssignCaseRequest,
            CaseResponse,
            ViewModel,
            DashboardSummaryResponse,
            AssignOverviewResponse,
            AssignableCaseResponse,
            HostelDetailResponse,
            TeamMemberResponse,
            StudentLoginRequest,
            CounsellorLoginRequest,
            SessionResponse,
        )
    ),
    tags(
        (name = "Campus Support API", description = "Student case intake and counsellor triage.")
    )
)]
pub struct ApiDoc;

//=========================================================================================
// Error Mapping
//=========================================================================================

const TRY_AGAIN: &str = "Please try again.";

/// Logs the detail and hands the caller a generic message.
fn port_failure(context: &str, e: PortError) -> (StatusCode, String) {
    match e {
        PortError::NotFound(detail) => {
            info!("{}: {}", context, detail);
            (StatusCode::NOT_FOUND, "Case not found.".to_string())
        }
        other => {
            error!("{}: {:?}", context, other);
            (StatusCode::INTERNAL_SERVER_ERROR, TRY_AGAIN.to_string())
        }
    }
}

fn bad_request(message: impl Into<String>) -> (StatusCode, String) {
    (StatusCode::BAD_REQUEST, message.into())
}

//=========================================================================================
// REST API Handlers
//=========================================================================================

/// Submit a help request from the student intake form.
///
/// A blank note is stored as `"<help_type> request"`.
#[utoipa::path(
    post,
    path = "/cases",
    request_body = CreateCaseRequest,
    responses(
        (status = 201, description = "Case created", body = CaseResponse),
        (status = 400, description = "A required field is missing or unknown"),
        (status = 401, description = "Not logged in as a student"),
        (status = 500, description = "Submission failed")
    )
)]
pub async fn create_case_handler(
    State(app_state): State<Arc<AppState>>,
    Json(req): Json<CreateCaseRequest>,
) -> Result<impl IntoResponse, (StatusCode, String)> {
    let mut form = IntakeForm {
        student_id: req.student_id,
        hostel_name: req
            .hostel_name
            .filter(|h| !h.is_empty())
            .map(|h| h.parse::<Hostel>())
            .transpose()
            .map_err(|e| bad_request(format!("{}", e)))?,
        help_type: req
            .help_type
            .filter(|t| !t.is_empty())
            .map(|t| t.parse::<HelpType>())
            .transpose()
            .map_err(|e| bad_request(format!("{}", e)))?,
        note: req.note,
        recording: req.recording,
    };

    match form.submit(app_state.cases.as_ref()).await {
        Ok(case) => Ok((StatusCode::CREATED, Json(CaseResponse::from(&case)))),
        Err(SubmitError::Validation(e)) => Err(bad_request(e.to_string())),
        Err(SubmitError::Port(e)) => Err(port_failure("Failed to submit case", e)),
    }
}

/// List cases, newest first, optionally filtered by status.
#[utoipa::path(
    get,
    path = "/cases",
    params(ListCasesQuery),
    responses(
        (status = 200, description = "Matching cases", body = [CaseResponse]),
        (status = 400, description = "Unknown status"),
        (status = 401, description = "Not logged in as a counsellor")
    )
)]
pub async fn list_cases_handler(
    State(app_state): State<Arc<AppState>>,
    Query(query): Query<ListCasesQuery>,
) -> Result<impl IntoResponse, (StatusCode, String)> {
    let filter = match query.status.as_deref() {
        None | Some("") => CaseFilter::all(),
        Some(raw) => CaseFilter::with_status(
            raw.parse::<CaseStatus>()
                .map_err(|e| bad_request(e.to_string()))?,
        ),
    };
    let cases = app_state
        .cases
        .list_cases(filter)
        .await
        .map_err(|e| port_failure("Error fetching cases", e))?;
    Ok(Json(cases.iter().map(CaseResponse::from).collect::<Vec<_>>()))
}

/// Fetch one case for the detail dialog.
#[utoipa::path(
    get,
    path = "/cases/{id}",
    params(("id" = Uuid, Path, description = "Case id")),
    responses(
        (status = 200, description = "The case", body = CaseResponse),
        (status = 404, description = "No such case")
    )
)]
pub async fn get_case_handler(
    State(app_state): State<Arc<AppState>>,
    Path(id): Path<Uuid>,
) -> Result<impl IntoResponse, (StatusCode, String)> {
    let case = app_state
        .cases
        .get_case(id)
        .await
        .map_err(|e| port_failure("Error fetching case", e))?;
    Ok(Json(CaseResponse::from(&case)))
}

/// Assign a case to a counsellor from the roster.
///
/// The current status is not checked; assigning again replaces the counsellor.
#[utoipa::path(
    post,
    path = "/cases/{id}/assign",
    params(("id" = Uuid, Path, description = "Case id")),
    request_body = AssignCaseRequest,
    responses(
        (status = 204, description = "Case assigned"),
        (status = 400, description = "Counsellor missing or not on the roster"),
        (status = 500, description = "Assignment failed")
    )
)]
pub async fn assign_case_handler(
    State(app_state): State<Arc<AppState>>,
    Path(id): Path<Uuid>,
    Json(req): Json<AssignCaseRequest>,
) -> Result<impl IntoResponse, (StatusCode, String)> {
    let counsellor = req.counsellor.trim();
    if !is_known_counsellor(counsellor) {
        return Err(bad_request("Please select both a case and counsellor"));
    }
    app_state
        .cases
        .assign_case(id, counsellor)
        .await
        .map_err(|e| port_failure("Error assigning counsellor", e))?;
    info!(case_id = %id, counsellor, "Case assigned");
    Ok(StatusCode::NO_CONTENT)
}

/// Mark a case resolved. The prior status is not checked.
#[utoipa::path(
    post,
    path = "/cases/{id}/resolve",
    params(("id" = Uuid, Path, description = "Case id")),
    responses(
        (status = 204, description = "Case resolved"),
        (status = 500, description = "Resolution failed")
    )
)]
pub async fn resolve_case_handler(
    State(app_state): State<Arc<AppState>>,
    Path(id): Path<Uuid>,
) -> Result<impl IntoResponse, (StatusCode, String)> {
    app_state
        .cases
        .resolve_case(id)
        .await
        .map_err(|e| port_failure("Error resolving case", e))?;
    info!(case_id = %id, "Case resolved");
    Ok(StatusCode::NO_CONTENT)
}

/// Render one dashboard section from a fresh fetch.
#[utoipa::path(
    get,
    path = "/dashboard/{section}",
    params(
        (
            "section" = String,
            Path,
            description = "dashboard | hostel-detail | team-members | pending-cases | \
                           solved-cases | assign-counsellor"
        )
    ),
    responses(
        (status = 200, description = "Rendered section", body = ViewModel),
        (status = 404, description = "Unknown section")
    )
)]
pub async fn dashboard_handler(
    State(app_state): State<Arc<AppState>>,
    Path(section): Path<String>,
) -> Result<impl IntoResponse, (StatusCode, String)> {
    let section = section
        .parse::<DashboardSection>()
        .map_err(|e| (StatusCode::NOT_FOUND, e.to_string()))?;
    let view = fetch_view(section, app_state.cases.as_ref())
        .await
        .map_err(|e| port_failure("Error loading dashboard", e))?;
    Ok(Json(ViewModel::from(&view)))
}

#[utoipa::path(
    get,
    path = "/health",
    responses((status = 200, description = "Service is up"))
)]
pub async fn health_handler() -> StatusCode {
    StatusCode::OK
}
