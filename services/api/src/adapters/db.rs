//! services/api/src/adapters/db.rs
//!
//! This module contains the Postgres adapter, which is the concrete implementation
//! of the `CaseRepository` and `ChangeFeed` ports from the `core` crate. It handles
//! all interactions with the `student_cases` table using `sqlx`, and turns the
//! table's `NOTIFY` traffic into a change stream.

use async_trait::async_trait;
use campus_support_core::domain::{Case, CaseFilter, CaseStatus, NewCase, NoteType};
use campus_support_core::ports::{
    CaseRepository, ChangeEvent, ChangeFeed, ChangeKind, ChangeStream, PortError, PortResult,
};
use chrono::{DateTime, Utc};
use serde::Deserialize;
use sqlx::postgres::PgListener;
use sqlx::{FromRow, PgPool};
use tracing::{error, info, warn};
use uuid::Uuid;

//=========================================================================================
// The Main Adapter Struct
//=========================================================================================

/// A database adapter that implements the case store ports.
#[derive(Clone)]
pub struct DbAdapter {
    pool: PgPool,
}

impl DbAdapter {
    /// Creates a new `DbAdapter`.
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Applies the bundled development schema. Only used when `RUN_MIGRATIONS` is set.
    pub async fn run_migrations(&self) -> Result<(), sqlx::migrate::MigrateError> {
        sqlx::migrate!("./migrations").run(&self.pool).await?;
        Ok(())
    }
}

const CASE_COLUMNS: &str = "id, student_id, hostel_name, help_type, note_type, note_content, \
     status, assigned_counsellor, created_at, assigned_at, resolved_at";

//=========================================================================================
// "Impure" Database Record Structs
//=========================================================================================

#[derive(FromRow)]
struct CaseRecord {
    id: Uuid,
    student_id: String,
    hostel_name: String,
    help_type: String,
    note_type: Option<String>,
    note_content: Option<String>,
    status: String,
    assigned_counsellor: Option<String>,
    created_at: DateTime<Utc>,
    assigned_at: Option<DateTime<Utc>>,
    resolved_at: Option<DateTime<Utc>>,
}

impl CaseRecord {
    fn to_domain(self) -> PortResult<Case> {
        let id = self.id;
        let corrupt = |e: campus_support_core::domain::UnknownVariant| {
            PortError::Query(format!("Case {} has {}", id, e))
        };
        Ok(Case {
            id,
            hostel_name: self.hostel_name.parse().map_err(corrupt)?,
            help_type: self.help_type.parse().map_err(corrupt)?,
            note_type: self
                .note_type
                .as_deref()
                .map(str::parse::<NoteType>)
                .transpose()
                .map_err(corrupt)?,
            status: self.status.parse().map_err(corrupt)?,
            student_id: self.student_id,
            note_content: self.note_content,
            assigned_counsellor: self.assigned_counsellor,
            created_at: self.created_at,
            assigned_at: self.assigned_at,
            resolved_at: self.resolved_at,
        })
    }
}

/// The JSON body the table trigger attaches to each notification.
#[derive(Deserialize)]
struct NotificationPayload {
    table: String,
    kind: String,
    record_id: Option<Uuid>,
}

/// Decodes a notification. A payload we cannot read still means "something changed",
/// so it degrades to a generic update on the listened table.
fn parse_notification(table: &str, payload: &str) -> ChangeEvent {
    match serde_json::from_str::<NotificationPayload>(payload) {
        Ok(p) => match p.kind.parse::<ChangeKind>() {
            Ok(kind) => ChangeEvent::new(p.table, kind, p.record_id),
            Err(e) => {
                warn!("Unrecognised change kind in notification: {}", e);
                ChangeEvent::new(p.table, ChangeKind::Update, p.record_id)
            }
        },
        Err(e) => {
            warn!("Malformed change notification on '{}': {}", table, e);
            ChangeEvent::new(table, ChangeKind::Update, None)
        }
    }
}

//=========================================================================================
// `CaseRepository` Trait Implementation
//=========================================================================================

#[async_trait]
impl CaseRepository for DbAdapter {
    async fn list_cases(&self, filter: CaseFilter) -> PortResult<Vec<Case>> {
        let sql = format!(
            "SELECT {} FROM student_cases \
             WHERE ($1::text IS NULL OR status = $1) ORDER BY created_at DESC",
            CASE_COLUMNS
        );
        let records = sqlx::query_as::<_, CaseRecord>(&sql)
            .bind(filter.status.map(|s| s.as_str()))
            .fetch_all(&self.pool)
            .await
            .map_err(|e| PortError::Query(e.to_string()))?;

        records.into_iter().map(CaseRecord::to_domain).collect()
    }

    async fn get_case(&self, id: Uuid) -> PortResult<Case> {
        let sql = format!("SELECT {} FROM student_cases WHERE id = $1", CASE_COLUMNS);
        let record = sqlx::query_as::<_, CaseRecord>(&sql)
            .bind(id)
            .fetch_one(&self.pool)
            .await
            .map_err(|e| match e {
                sqlx::Error::RowNotFound => PortError::NotFound(format!("Case {} not found", id)),
                _ => PortError::Query(e.to_string()),
            })?;
        record.to_domain()
    }

    async fn create_case(&self, new_case: NewCase) -> PortResult<Case> {
        let sql = format!(
            "INSERT INTO student_cases \
             (student_id, hostel_name, help_type, note_type, note_content, status) \
             VALUES ($1, $2, $3, $4, $5, $6) RETURNING {}",
            CASE_COLUMNS
        );
        let record = sqlx::query_as::<_, CaseRecord>(&sql)
            .bind(&new_case.student_id)
            .bind(new_case.hostel_name.as_str())
            .bind(new_case.help_type.as_str())
            .bind(new_case.note_type.map(|t| t.as_str()))
            .bind(&new_case.note_content)
            .bind(CaseStatus::Pending.as_str())
            .fetch_one(&self.pool)
            .await
            .map_err(|e| PortError::Submission(e.to_string()))?;
        record.to_domain()
    }

    async fn assign_case(&self, id: Uuid, counsellor: &str) -> PortResult<()> {
        sqlx::query(
            "UPDATE student_cases SET status = $1, assigned_counsellor = $2, assigned_at = $3 \
             WHERE id = $4",
        )
        .bind(CaseStatus::Assigned.as_str())
        .bind(counsellor)
        .bind(Utc::now())
        .bind(id)
        .execute(&self.pool)
        .await
        .map_err(|e| PortError::Submission(e.to_string()))?;
        Ok(())
    }

    async fn resolve_case(&self, id: Uuid) -> PortResult<()> {
        sqlx::query("UPDATE student_cases SET status = $1, resolved_at = $2 WHERE id = $3")
            .bind(CaseStatus::Resolved.as_str())
            .bind(Utc::now())
            .bind(id)
            .execute(&self.pool)
            .await
            .map_err(|e| PortError::Submission(e.to_string()))?;
        Ok(())
    }
}

//=========================================================================================
// `ChangeFeed` Trait Implementation
//=========================================================================================

#[async_trait]
impl ChangeFeed for DbAdapter {
    async fn subscribe(&self, table: &str) -> PortResult<ChangeStream> {
        let mut listener = PgListener::connect_with(&self.pool)
            .await
            .map_err(|e| PortError::Query(e.to_string()))?;
        listener
            .listen(table)
            .await
            .map_err(|e| PortError::Query(e.to_string()))?;
        info!("Listening for changes on '{}'", table);

        let table = table.to_string();
        let stream = async_stream::stream! {
            loop {
                match listener.try_recv().await {
                    Ok(Some(notification)) => {
                        yield parse_notification(&table, notification.payload());
                    }
                    Ok(None) => {
                        // The listener reconnects on the next call; anything sent in
                        // between is lost, so tell every view to re-fetch.
                        warn!("Change feed connection lost; reconnecting");
                        yield ChangeEvent::new(table.clone(), ChangeKind::Update, None);
                    }
                    Err(e) => {
                        error!("Change feed failed: {:?}", e);
                        break;
                    }
                }
            }
        };
        Ok(Box::pin(stream))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn notification_payload_is_decoded() {
        let id = Uuid::new_v4();
        let payload = format!(
            r#"{{"table":"student_cases","kind":"INSERT","record_id":"{}"}}"#,
            id
        );
        let event = parse_notification("student_cases", &payload);
        assert_eq!(event, ChangeEvent::new("student_cases", ChangeKind::Insert, Some(id)));
    }

    #[test]
    fn unreadable_payload_still_signals_a_change() {
        let event = parse_notification("student_cases", "not json");
        assert_eq!(event.table, "student_cases");
        assert_eq!(event.kind, ChangeKind::Update);
        assert_eq!(event.record_id, None);
    }

    #[test]
    fn record_with_unknown_status_is_a_query_error() {
        let record = CaseRecord {
            id: Uuid::new_v4(),
            student_id: "CS21B001".to_string(),
            hostel_name: "Vaigai Hostel".to_string(),
            help_type: "TALK".to_string(),
            note_type: Some("text".to_string()),
            note_content: Some("hello".to_string()),
            status: "archived".to_string(),
            assigned_counsellor: None,
            created_at: Utc::now(),
            assigned_at: None,
            resolved_at: None,
        };
        assert!(matches!(record.to_domain(), Err(PortError::Query(_))));
    }
}
