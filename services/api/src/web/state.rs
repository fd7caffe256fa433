//! services/api/src/web/state.rs
//!
//! Defines the application's shared state.

use campus_support_core::ports::CaseRepository;
use campus_support_core::sync::ChangeDispatcher;
use std::sync::Arc;

//=========================================================================================
// AppState (Shared Across All Connections)
//=========================================================================================

/// The shared application state, created once at startup and passed to all handlers.
#[derive(Clone)]
pub struct AppState {
    pub cases: Arc<dyn CaseRepository>,
    /// The one change-feed registry every live view registers with.
    pub dispatcher: ChangeDispatcher,
}
