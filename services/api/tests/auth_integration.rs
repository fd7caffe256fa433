//! Integration tests for the mock session endpoints and the role gates.

mod common;

use axum::http::{header, Method, StatusCode};
use common::{
    get_request, json_request, parse_response_body, TestApp, COUNSELLOR_COOKIE, STUDENT_COOKIE,
};
use serde_json::json;

#[tokio::test]
async fn test_student_login_sets_session_cookie() {
    let app = TestApp::new().await;

    let response = app
        .send(json_request(
            Method::POST,
            "/auth/student/login",
            json!({ "student_id": " CS21B001 ", "password": "secret" }),
            None,
        ))
        .await;

    assert_eq!(response.status(), StatusCode::OK);
    let cookie = response
        .headers()
        .get(header::SET_COOKIE)
        .unwrap()
        .to_str()
        .unwrap()
        .to_string();
    assert!(cookie.starts_with("session=student%3ACS21B001;"));
    assert!(cookie.contains("HttpOnly"));

    let body = parse_response_body(response).await;
    assert_eq!(body["role"], "student");
    assert_eq!(body["student_id"], "CS21B001");
    assert_eq!(body["redirect"], "/student-dashboard");
}

#[tokio::test]
async fn test_student_id_with_cookie_separators_survives_round_trip() {
    let app = TestApp::new().await;

    let response = app
        .send(json_request(
            Method::POST,
            "/auth/student/login",
            json!({ "student_id": "CS21;B001,x", "password": "secret" }),
            None,
        ))
        .await;
    assert_eq!(response.status(), StatusCode::OK);
    let set_cookie = response
        .headers()
        .get(header::SET_COOKIE)
        .unwrap()
        .to_str()
        .unwrap()
        .to_string();

    // Send back only the name=value pair, as a browser would.
    let pair = set_cookie.split(';').next().unwrap().to_string();
    let response = app.send(get_request("/auth/session", Some(&pair))).await;
    let body = parse_response_body(response).await;
    assert_eq!(body["role"], "student");
    assert_eq!(body["student_id"], "CS21;B001,x");
}

#[tokio::test]
async fn test_counsellor_login_redirects_to_dashboard() {
    let app = TestApp::new().await;

    let response = app
        .send(json_request(
            Method::POST,
            "/auth/counsellor/login",
            json!({ "email": "counsellor@campus.edu", "password": "secret" }),
            None,
        ))
        .await;

    assert_eq!(response.status(), StatusCode::OK);
    let body = parse_response_body(response).await;
    assert_eq!(body["role"], "counsellor");
    assert_eq!(body["redirect"], "/counsellor-dashboard");
}

#[tokio::test]
async fn test_login_with_missing_password_is_rejected() {
    let app = TestApp::new().await;

    let response = app
        .send(json_request(
            Method::POST,
            "/auth/student/login",
            json!({ "student_id": "CS21B001", "password": "" }),
            None,
        ))
        .await;

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_session_endpoint_reports_cookie_state() {
    let app = TestApp::new().await;

    let response = app
        .send(get_request("/auth/session", Some(STUDENT_COOKIE)))
        .await;
    let body = parse_response_body(response).await;
    assert_eq!(body["role"], "student");

    let response = app.send(get_request("/auth/session", None)).await;
    let body = parse_response_body(response).await;
    assert!(body["role"].is_null());
    assert_eq!(body["redirect"], "/");
}

#[tokio::test]
async fn test_logout_clears_cookie() {
    let app = TestApp::new().await;

    let response = app
        .send(json_request(
            Method::POST,
            "/auth/logout",
            json!({}),
            Some(COUNSELLOR_COOKIE),
        ))
        .await;

    assert_eq!(response.status(), StatusCode::OK);
    let cookie = response.headers().get(header::SET_COOKIE).unwrap();
    assert!(cookie.to_str().unwrap().contains("Max-Age=0"));
}

// ============================================================================
// Role Gate Tests
// ============================================================================

#[tokio::test]
async fn test_dashboard_requires_counsellor_session() {
    let app = TestApp::new().await;

    let response = app.send(get_request("/dashboard/dashboard", None)).await;
    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);

    let response = app
        .send(get_request("/dashboard/dashboard", Some(STUDENT_COOKIE)))
        .await;
    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);

    let response = app
        .send(get_request("/dashboard/dashboard", Some(COUNSELLOR_COOKIE)))
        .await;
    assert_eq!(response.status(), StatusCode::OK);
}

#[tokio::test]
async fn test_intake_requires_student_session() {
    let app = TestApp::new().await;
    let form = json!({
        "student_id": "CS21B001",
        "hostel_name": "Vaigai Hostel",
        "help_type": "TALK"
    });

    let response = app
        .send(json_request(Method::POST, "/cases", form.clone(), None))
        .await;
    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);

    let response = app
        .send(json_request(
            Method::POST,
            "/cases",
            form,
            Some(COUNSELLOR_COOKIE),
        ))
        .await;
    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn test_tampered_cookie_is_treated_as_anonymous() {
    let app = TestApp::new().await;

    let response = app
        .send(get_request("/cases", Some("session=admin")))
        .await;

    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn test_health_is_public() {
    let app = TestApp::new().await;

    let response = app.send(get_request("/health", None)).await;

    assert_eq!(response.status(), StatusCode::OK);
}
