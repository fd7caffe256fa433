//! Integration tests for the live dashboard WebSocket.
//!
//! The router is served on a local port and driven with a real WebSocket client.

mod common;

use campus_support_core::{
    domain::{HelpType, Hostel, NewCase},
    ports::CaseRepository,
};
use common::{TestApp, COUNSELLOR_COOKIE, STUDENT_COOKIE};
use futures::{SinkExt, StreamExt};
use serde_json::{json, Value};
use std::net::SocketAddr;
use std::time::Duration;
use tokio::net::TcpStream;
use tokio::time::timeout;
use tokio_tungstenite::{
    connect_async,
    tungstenite::{
        client::IntoClientRequest,
        http::{header, HeaderValue, StatusCode},
        Message,
    },
    MaybeTlsStream, WebSocketStream,
};

type Client = WebSocketStream<MaybeTlsStream<TcpStream>>;

const WAIT: Duration = Duration::from_secs(2);

async fn connect(addr: SocketAddr, cookie: &'static str) -> Client {
    let mut request = format!("ws://{}/ws", addr).into_client_request().unwrap();
    request
        .headers_mut()
        .insert(header::COOKIE, HeaderValue::from_static(cookie));
    let (client, _) = connect_async(request).await.unwrap();
    client
}

async fn send_json(client: &mut Client, value: Value) {
    client
        .send(Message::Text(value.to_string().into()))
        .await
        .unwrap();
}

/// Reads the next text frame as JSON, skipping control frames.
async fn next_json(client: &mut Client) -> Value {
    timeout(WAIT, async {
        loop {
            match client.next().await {
                Some(Ok(Message::Text(text))) => {
                    return serde_json::from_str(text.as_str()).unwrap();
                }
                Some(Ok(_)) => continue,
                other => panic!("socket ended early: {:?}", other),
            }
        }
    })
    .await
    .expect("timed out waiting for a server message")
}

/// Reads messages until one satisfies `done`.
async fn next_matching<F>(client: &mut Client, done: F) -> Value
where
    F: Fn(&Value) -> bool,
{
    loop {
        let msg = next_json(client).await;
        if done(&msg) {
            return msg;
        }
    }
}

fn urgent_case(student_id: &str) -> NewCase {
    NewCase {
        student_id: student_id.to_string(),
        hostel_name: Hostel::Vaigai,
        help_type: HelpType::Urgent,
        note_type: None,
        note_content: Some("URGENT request".to_string()),
    }
}

fn case_ids(snapshot: &Value) -> Vec<String> {
    snapshot["view"]["data"]
        .as_array()
        .unwrap()
        .iter()
        .map(|c| c["id"].as_str().unwrap().to_string())
        .collect()
}

#[tokio::test]
async fn test_init_then_insert_pushes_new_snapshot() {
    let app = TestApp::new().await;
    let addr = app.serve().await;
    let mut client = connect(addr, COUNSELLOR_COOKIE).await;

    send_json(&mut client, json!({ "type": "init", "section": "pending-cases" })).await;
    let first = next_json(&mut client).await;
    assert_eq!(first["type"], "view_snapshot");
    assert_eq!(first["revision"], 0);
    assert_eq!(first["view"]["section"], "pending-cases");
    assert!(case_ids(&first).is_empty());

    let case = app.store.create_case(urgent_case("CS21B001")).await.unwrap();
    let id = case.id.to_string();

    let pushed = next_matching(&mut client, |m| {
        m["type"] == "view_snapshot" && case_ids(m).contains(&id)
    })
    .await;
    assert!(pushed["revision"].as_u64().unwrap() >= 1);
}

#[tokio::test]
async fn test_first_message_must_be_init() {
    let app = TestApp::new().await;
    let addr = app.serve().await;
    let mut client = connect(addr, COUNSELLOR_COOKIE).await;

    send_json(&mut client, json!({ "type": "refresh" })).await;

    let msg = next_json(&mut client).await;
    assert_eq!(msg["type"], "error");
    assert_eq!(msg["message"], "Expected an init message.");
}

#[tokio::test]
async fn test_unknown_section_reports_error() {
    let app = TestApp::new().await;
    let addr = app.serve().await;
    let mut client = connect(addr, COUNSELLOR_COOKIE).await;

    send_json(&mut client, json!({ "type": "init", "section": "settings" })).await;

    let msg = next_json(&mut client).await;
    assert_eq!(msg["type"], "error");
    assert_eq!(msg["message"], "Unknown section 'settings'");
}

#[tokio::test]
async fn test_navigate_remounts_another_section() {
    let app = TestApp::new().await;
    let addr = app.serve().await;
    let mut client = connect(addr, COUNSELLOR_COOKIE).await;

    send_json(&mut client, json!({ "type": "init", "section": "dashboard" })).await;
    let first = next_json(&mut client).await;
    assert_eq!(first["view"]["section"], "dashboard");

    send_json(&mut client, json!({ "type": "navigate", "section": "team-members" })).await;
    let next = next_json(&mut client).await;
    assert_eq!(next["type"], "view_snapshot");
    assert_eq!(next["revision"], 0);
    assert_eq!(next["view"]["section"], "team-members");
    assert_eq!(next["view"]["data"].as_array().unwrap().len(), 9);
}

#[tokio::test]
async fn test_assign_and_resolve_over_socket() {
    let app = TestApp::new().await;
    let case = app.store.create_case(urgent_case("CS21B001")).await.unwrap();
    let id = case.id.to_string();
    let addr = app.serve().await;
    let mut client = connect(addr, COUNSELLOR_COOKIE).await;

    send_json(&mut client, json!({ "type": "init", "section": "pending-cases" })).await;
    let first = next_json(&mut client).await;
    assert_eq!(case_ids(&first), vec![id.clone()]);

    send_json(
        &mut client,
        json!({ "type": "assign", "case_id": &id, "counsellor": "Counsellor 2" }),
    )
    .await;

    // The ack and the refetched snapshot race; wait for both.
    let mut acked = false;
    let mut left_pending = false;
    while !(acked && left_pending) {
        let msg = next_json(&mut client).await;
        match msg["type"].as_str() {
            Some("action_ok") => {
                assert_eq!(msg["action"], "assign");
                assert_eq!(msg["case_id"], id.as_str());
                acked = true;
            }
            Some("view_snapshot") => left_pending |= case_ids(&msg).is_empty(),
            other => panic!("unexpected message type {:?}", other),
        }
    }

    send_json(&mut client, json!({ "type": "resolve", "case_id": &id })).await;
    let ack = next_matching(&mut client, |m| m["type"] == "action_ok").await;
    assert_eq!(ack["action"], "resolve");

    let stored = app.store.get_case(case.id).await.unwrap();
    assert_eq!(stored.assigned_counsellor.as_deref(), Some("Counsellor 2"));
    assert!(stored.resolved_at.is_some());
}

#[tokio::test]
async fn test_assign_to_unknown_counsellor_reports_error() {
    let app = TestApp::new().await;
    let case = app.store.create_case(urgent_case("CS21B001")).await.unwrap();
    let addr = app.serve().await;
    let mut client = connect(addr, COUNSELLOR_COOKIE).await;

    send_json(&mut client, json!({ "type": "init", "section": "assign-counsellor" })).await;
    next_json(&mut client).await;

    send_json(
        &mut client,
        json!({ "type": "assign", "case_id": case.id, "counsellor": "Somebody" }),
    )
    .await;
    let msg = next_matching(&mut client, |m| m["type"] != "view_snapshot").await;
    assert_eq!(msg["type"], "error");
    assert_eq!(msg["message"], "Please select both a case and counsellor");
    assert!(app.store.get_case(case.id).await.unwrap().assigned_counsellor.is_none());
}

#[tokio::test]
async fn test_student_session_cannot_open_socket() {
    let app = TestApp::new().await;
    let addr = app.serve().await;

    let mut request = format!("ws://{}/ws", addr).into_client_request().unwrap();
    request
        .headers_mut()
        .insert(header::COOKIE, HeaderValue::from_static(STUDENT_COOKIE));

    match connect_async(request).await {
        Err(tokio_tungstenite::tungstenite::Error::Http(response)) => {
            assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
        }
        other => panic!("expected a rejected handshake, got {:?}", other.map(|_| ())),
    }
}
