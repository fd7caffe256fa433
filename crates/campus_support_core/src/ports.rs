//! crates/campus_support_core/src/ports.rs
//!
//! Defines the service contracts (traits) for the application's core logic.
//! These traits form the boundary of the hexagonal architecture, allowing the core
//! to be independent of the concrete case store (Postgres or in-process).

use crate::domain::{Case, CaseFilter, NewCase};
use async_trait::async_trait;
use futures::Stream;
use std::fmt;
use std::pin::Pin;
use std::str::FromStr;
use uuid::Uuid;

//=========================================================================================
// Generic Port Error and Result Types
//=========================================================================================

/// A generic error type for all port operations.
/// This abstracts away the specific errors from the backing store.
#[derive(Debug, thiserror::Error)]
pub enum PortError {
    #[error("Item not found: {0}")]
    NotFound(String),
    /// A read against the case store failed.
    #[error("Query failed: {0}")]
    Query(String),
    /// An insert or update against the case store failed.
    #[error("Submission failed: {0}")]
    Submission(String),
    #[error("An unexpected error occurred: {0}")]
    Unexpected(String),
}

/// A convenience type alias for `Result<T, PortError>`.
pub type PortResult<T> = Result<T, PortError>;

//=========================================================================================
// Change Events
//=========================================================================================

/// The row-level mutation that produced a change event.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ChangeKind {
    Insert,
    Update,
    Delete,
}

impl ChangeKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            ChangeKind::Insert => "INSERT",
            ChangeKind::Update => "UPDATE",
            ChangeKind::Delete => "DELETE",
        }
    }
}

impl fmt::Display for ChangeKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ChangeKind {
    type Err = PortError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_uppercase().as_str() {
            "INSERT" => Ok(ChangeKind::Insert),
            "UPDATE" => Ok(ChangeKind::Update),
            "DELETE" => Ok(ChangeKind::Delete),
            other => Err(PortError::Unexpected(format!("Unknown change kind '{}'", other))),
        }
    }
}

/// One notification from a table's change feed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ChangeEvent {
    pub table: String,
    pub kind: ChangeKind,
    pub record_id: Option<Uuid>,
}

impl ChangeEvent {
    pub fn new(table: impl Into<String>, kind: ChangeKind, record_id: Option<Uuid>) -> Self {
        Self {
            table: table.into(),
            kind,
            record_id,
        }
    }
}

/// A boxed stream of change events, as handed out by a `ChangeFeed`.
pub type ChangeStream = Pin<Box<dyn Stream<Item = ChangeEvent> + Send>>;

//=========================================================================================
// Service Ports (Traits)
//=========================================================================================

#[async_trait]
pub trait CaseRepository: Send + Sync {
    /// Lists cases matching `filter`, newest first.
    async fn list_cases(&self, filter: CaseFilter) -> PortResult<Vec<Case>>;

    async fn get_case(&self, id: Uuid) -> PortResult<Case>;

    /// Inserts one case with `status = pending` and no counsellor.
    /// Required fields are checked by the caller before this is invoked.
    async fn create_case(&self, new_case: NewCase) -> PortResult<Case>;

    /// Marks a case assigned to `counsellor`. Does not check the current status,
    /// so a second call overwrites the previous counsellor.
    async fn assign_case(&self, id: Uuid, counsellor: &str) -> PortResult<()>;

    /// Marks a case resolved. Does not check the current status.
    async fn resolve_case(&self, id: Uuid) -> PortResult<()>;
}

#[async_trait]
pub trait ChangeFeed: Send + Sync {
    /// Opens a standing subscription to insert/update/delete events on `table`.
    /// The stream ends when the underlying connection is lost.
    async fn subscribe(&self, table: &str) -> PortResult<ChangeStream>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn change_kind_parses_case_insensitively() {
        assert_eq!("insert".parse::<ChangeKind>().unwrap(), ChangeKind::Insert);
        assert_eq!("DELETE".parse::<ChangeKind>().unwrap(), ChangeKind::Delete);
        assert!("truncate".parse::<ChangeKind>().is_err());
    }
}
