pub mod auth;
pub mod live_view;
pub mod middleware;
pub mod models;
pub mod protocol;
pub mod rest;
pub mod state;
pub mod ws_handler;

// Re-export the main WebSocket handler to make it easily accessible
// to the router builder.
pub use live_view::{LiveView, ViewSnapshot};
pub use middleware::{load_session, require_counsellor, require_student};
pub use ws_handler::ws_handler;
