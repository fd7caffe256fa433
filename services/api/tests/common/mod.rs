//! Shared helpers for the API integration tests.
//!
//! Every test app runs against a fresh in-memory case store with the change-feed
//! pump running, so live views see mutations exactly as they would in production.

#![allow(dead_code)]

use api_lib::{
    adapters::InMemoryCaseStore, app::build_router, feed::spawn_change_feed,
    web::state::AppState,
};
use axum::{
    body::Body,
    http::{header, Method, Request},
    response::Response,
    Router,
};
use campus_support_core::sync::ChangeDispatcher;
use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;
use tokio_util::sync::CancellationToken;

pub const STUDENT_COOKIE: &str = "session=student:CS21B001";
pub const COUNSELLOR_COOKIE: &str = "session=counsellor";

/// A running test app. Dropping it stops the feed pump.
pub struct TestApp {
    pub store: Arc<InMemoryCaseStore>,
    pub state: Arc<AppState>,
    pub router: Router,
    shutdown: CancellationToken,
}

impl TestApp {
    pub async fn new() -> Self {
        let store = Arc::new(InMemoryCaseStore::new());
        let dispatcher = ChangeDispatcher::new();
        let shutdown = CancellationToken::new();
        spawn_change_feed(store.clone(), dispatcher.clone(), shutdown.clone());

        let state = Arc::new(AppState {
            cases: store.clone(),
            dispatcher,
        });
        let router = build_router(state.clone(), None);

        // Let the pump subscribe before the test starts mutating.
        tokio::time::sleep(Duration::from_millis(20)).await;

        Self {
            store,
            state,
            router,
            shutdown,
        }
    }

    /// Serves the router on an ephemeral local port for clients that need a real
    /// socket, such as the live dashboard WebSocket.
    pub async fn serve(&self) -> SocketAddr {
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        let router = self.router.clone();
        tokio::spawn(async move {
            axum::serve(listener, router).await.unwrap();
        });
        addr
    }

    /// Sends one request through a clone of the router.
    pub async fn send(&self, request: Request<Body>) -> Response {
        use tower::ServiceExt;
        self.router.clone().oneshot(request).await.unwrap()
    }
}

impl Drop for TestApp {
    fn drop(&mut self) {
        self.shutdown.cancel();
    }
}

pub fn get_request(uri: &str, cookie: Option<&str>) -> Request<Body> {
    let mut builder = Request::builder().method(Method::GET).uri(uri);
    if let Some(cookie) = cookie {
        builder = builder.header(header::COOKIE, cookie);
    }
    builder.body(Body::empty()).unwrap()
}

pub fn json_request(
    method: Method,
    uri: &str,
    body: serde_json::Value,
    cookie: Option<&str>,
) -> Request<Body> {
    let mut builder = Request::builder()
        .method(method)
        .uri(uri)
        .header(header::CONTENT_TYPE, "application/json");
    if let Some(cookie) = cookie {
        builder = builder.header(header::COOKIE, cookie);
    }
    builder.body(Body::from(body.to_string())).unwrap()
}

pub async fn parse_response_body(response: Response) -> serde_json::Value {
    let body = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();
    serde_json::from_slice(&body).unwrap_or(serde_json::Value::Null)
}

pub async fn response_text(response: Response) -> String {
    let body = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();
    String::from_utf8_lossy(&body).into_owned()
}

/// Submits an intake form as the default student and returns the created case.
pub async fn submit_case(
    app: &TestApp,
    hostel: &str,
    help_type: &str,
    note: &str,
) -> serde_json::Value {
    let response = app
        .send(json_request(
            Method::POST,
            "/cases",
            serde_json::json!({
                "student_id": "CS21B001",
                "hostel_name": hostel,
                "help_type": help_type,
                "note": note,
            }),
            Some(STUDENT_COOKIE),
        ))
        .await;
    assert_eq!(response.status(), axum::http::StatusCode::CREATED);
    parse_response_body(response).await
}
