//! services/api/src/web/protocol.rs
//!
//! Defines the WebSocket message protocol between the counsellor dashboard and the
//! API server.

use crate::web::models::ViewModel;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

//=========================================================================================
// Messages Sent FROM the Client (Browser) TO the Server
//=========================================================================================

#[derive(Deserialize, Debug, PartialEq)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ClientMessage {
    /// Mounts the first section. This must be the first message sent on the connection.
    Init { section: String },

    /// Switches to another section, tearing down the current live view.
    Navigate { section: String },

    /// Forces a re-fetch of the current section.
    Refresh,

    Assign { case_id: Uuid, counsellor: String },

    Resolve { case_id: Uuid },
}

//=========================================================================================
// Messages Sent FROM the Server TO the Client (Browser)
//=========================================================================================

#[derive(Serialize, Debug, Clone)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ServerMessage {
    /// The full current state of the mounted section. Replaces whatever the client holds.
    ViewSnapshot { revision: u64, view: ViewModel },

    /// A counsellor action was accepted. The resulting change arrives as a snapshot.
    ActionOk { action: String, case_id: Uuid },

    /// A user-facing failure. Never carries diagnostic detail.
    Error { message: String },
}
