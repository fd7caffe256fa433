//! services/api/src/web/ws_handler.rs
//!
//! This is the main entry point and control loop for a counsellor's live dashboard
//! connection. Each connection mounts one live view at a time and pushes a fresh
//! snapshot after every completed re-fetch.

use crate::{
    error::ApiError,
    web::{
        live_view::{LiveView, ViewSnapshot},
        models::ViewModel,
        protocol::{ClientMessage, ServerMessage},
        state::AppState,
    },
};
use axum::{
    extract::{
        ws::{Message, WebSocket},
        State, WebSocketUpgrade,
    },
    response::Response,
};
use campus_support_core::views::{is_known_counsellor, DashboardSection};
use futures::{
    stream::{SplitSink, StreamExt},
    SinkExt,
};
use std::sync::Arc;
use tracing::{error, info, warn};

type WsSender = SplitSink<WebSocket, Message>;

const TRY_AGAIN: &str = "Please try again.";

/// The handler for upgrading HTTP requests to WebSocket connections.
/// Mounted behind the counsellor session gate.
pub async fn ws_handler(ws: WebSocketUpgrade, State(app_state): State<Arc<AppState>>) -> Response {
    ws.on_upgrade(move |socket| handle_socket(socket, app_state))
}

async fn send_message(sender: &mut WsSender, msg: &ServerMessage) -> Result<(), ApiError> {
    let json = serde_json::to_string(msg)?;
    sender.send(Message::Text(json.into())).await?;
    Ok(())
}

async fn send_snapshot(sender: &mut WsSender, snapshot: &ViewSnapshot) -> Result<(), ApiError> {
    let msg = ServerMessage::ViewSnapshot {
        revision: snapshot.revision,
        view: ViewModel::from(&snapshot.view),
    };
    send_message(sender, &msg).await
}

async fn send_error(sender: &mut WsSender, message: impl Into<String>) {
    let msg = ServerMessage::Error {
        message: message.into(),
    };
    if let Err(e) = send_message(sender, &msg).await {
        error!("Failed to send error message: {:?}", e);
    }
}

/// Mounts `section` and pushes its first snapshot.
async fn mount_section(
    app_state: &AppState,
    sender: &mut WsSender,
    raw_section: &str,
) -> Option<LiveView> {
    let section = match raw_section.parse::<DashboardSection>() {
        Ok(section) => section,
        Err(e) => {
            warn!("Client asked for an unknown section: {}", e);
            send_error(sender, format!("Unknown section '{}'", raw_section)).await;
            return None;
        }
    };
    match LiveView::mount(section, app_state.cases.clone(), &app_state.dispatcher).await {
        Ok(view) => {
            if let Err(e) = send_snapshot(sender, &view.current()).await {
                error!("Failed to send initial snapshot: {:?}", e);
            }
            Some(view)
        }
        Err(e) => {
            error!("Error loading section {}: {:?}", section, e);
            send_error(sender, TRY_AGAIN).await;
            None
        }
    }
}

async fn handle_socket(socket: WebSocket, app_state: Arc<AppState>) {
    info!("New live dashboard connection established");
    let (mut sender, mut receiver) = socket.split();

    // --- 1. Initialization Phase ---
    let mut view = match receiver.next().await {
        Some(Ok(Message::Text(init_json))) => {
            match serde_json::from_str::<ClientMessage>(&init_json) {
                Ok(ClientMessage::Init { section }) => {
                    match mount_section(&app_state, &mut sender, &section).await {
                        Some(view) => view,
                        None => return,
                    }
                }
                _ => {
                    error!("First message was not a valid Init message.");
                    send_error(&mut sender, "Expected an init message.").await;
                    return;
                }
            }
        }
        _ => {
            error!("Client disconnected before sending Init message.");
            return;
        }
    };

    // --- 2. Main Message Loop ---
    loop {
        tokio::select! {
            changed = view.changed() => match changed {
                Some(snapshot) => {
                    if let Err(e) = send_snapshot(&mut sender, &snapshot).await {
                        warn!("Failed to push snapshot, closing: {:?}", e);
                        break;
                    }
                }
                None => {
                    warn!("Live view stopped unexpectedly.");
                    break;
                }
            },
            incoming = receiver.next() => match incoming {
                Some(Ok(Message::Text(text))) => {
                    handle_text_message(text.as_str(), &app_state, &mut view, &mut sender).await;
                }
                Some(Ok(Message::Close(_))) => {
                    info!("Client sent close message.");
                    break;
                }
                Some(Ok(_)) => {}
                Some(Err(e)) => {
                    warn!("WebSocket receive failed: {:?}", e);
                    break;
                }
                None => {
                    info!("Client disconnected.");
                    break;
                }
            }
        }
    }

    // --- 3. Cleanup ---
    // Dropping the view unregisters it from the dispatcher and stops its refetch task.
    drop(view);
    info!("Live dashboard connection closed.");
}

/// Helper function to handle the logic for different `ClientMessage` variants.
async fn handle_text_message(
    text: &str,
    app_state: &AppState,
    view: &mut LiveView,
    sender: &mut WsSender,
) {
    let client_msg = match serde_json::from_str::<ClientMessage>(text) {
        Ok(msg) => msg,
        Err(e) => {
            warn!("Failed to deserialize client message: {}", e);
            return;
        }
    };

    match client_msg {
        ClientMessage::Init { .. } => {
            warn!("Received subsequent Init message, which is ignored.");
        }
        ClientMessage::Navigate { section } => {
            if let Some(next) = mount_section(app_state, sender, &section).await {
                info!(from = %view.section(), to = %next.section(), "Navigated");
                *view = next;
            }
        }
        ClientMessage::Refresh => view.refresh(),
        ClientMessage::Assign {
            case_id,
            counsellor,
        } => {
            let counsellor = counsellor.trim();
            if !is_known_counsellor(counsellor) {
                send_error(sender, "Please select both a case and counsellor").await;
                return;
            }
            match app_state.cases.assign_case(case_id, counsellor).await {
                Ok(()) => {
                    info!(%case_id, counsellor, "Case assigned");
                    ack(sender, "assign", case_id).await;
                }
                Err(e) => {
                    error!("Error assigning counsellor: {:?}", e);
                    send_error(sender, TRY_AGAIN).await;
                }
            }
        }
        ClientMessage::Resolve { case_id } => match app_state.cases.resolve_case(case_id).await {
            Ok(()) => {
                info!(%case_id, "Case resolved");
                ack(sender, "resolve", case_id).await;
            }
            Err(e) => {
                error!("Error resolving case: {:?}", e);
                send_error(sender, TRY_AGAIN).await;
            }
        },
    }
}

async fn ack(sender: &mut WsSender, action: &str, case_id: uuid::Uuid) {
    let msg = ServerMessage::ActionOk {
        action: action.to_string(),
        case_id,
    };
    if let Err(e) = send_message(sender, &msg).await {
        error!("Failed to send action acknowledgement: {:?}", e);
    }
}
