//! services/api/src/adapters/memory.rs
//!
//! An in-process case store used when no `DATABASE_URL` is configured and by the
//! integration tests. Mutations are announced on a broadcast channel, which plays
//! the role of the database trigger.

use async_trait::async_trait;
use campus_support_core::domain::{Case, CaseFilter, CaseStatus, NewCase, CASES_TABLE};
use campus_support_core::ports::{
    CaseRepository, ChangeEvent, ChangeFeed, ChangeKind, ChangeStream, PortError, PortResult,
};
use chrono::Utc;
use tokio::sync::{broadcast, RwLock};
use tracing::warn;
use uuid::Uuid;

const EVENT_BUFFER: usize = 256;

pub struct InMemoryCaseStore {
    cases: RwLock<Vec<Case>>,
    events: broadcast::Sender<ChangeEvent>,
}

impl Default for InMemoryCaseStore {
    fn default() -> Self {
        Self::new()
    }
}

impl InMemoryCaseStore {
    pub fn new() -> Self {
        let (events, _) = broadcast::channel(EVENT_BUFFER);
        Self {
            cases: RwLock::new(Vec::new()),
            events,
        }
    }

    fn announce(&self, kind: ChangeKind, id: Uuid) {
        // No receivers just means nobody is watching yet.
        let _ = self
            .events
            .send(ChangeEvent::new(CASES_TABLE, kind, Some(id)));
    }

    /// Applies `mutate` to the case with `id`. Unknown ids match nothing,
    /// as an `UPDATE ... WHERE id = $1` would.
    async fn update<F>(&self, id: Uuid, mutate: F)
    where
        F: FnOnce(&mut Case),
    {
        let updated = {
            let mut cases = self.cases.write().await;
            match cases.iter_mut().find(|c| c.id == id) {
                Some(case) => {
                    mutate(case);
                    true
                }
                None => false,
            }
        };
        if updated {
            self.announce(ChangeKind::Update, id);
        }
    }
}

#[async_trait]
impl CaseRepository for InMemoryCaseStore {
    async fn list_cases(&self, filter: CaseFilter) -> PortResult<Vec<Case>> {
        let cases = self.cases.read().await;
        // Newest first; insertion order breaks timestamp ties.
        let mut matching: Vec<Case> = cases
            .iter()
            .rev()
            .filter(|c| filter.matches(c))
            .cloned()
            .collect();
        matching.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        Ok(matching)
    }

    async fn get_case(&self, id: Uuid) -> PortResult<Case> {
        self.cases
            .read()
            .await
            .iter()
            .find(|c| c.id == id)
            .cloned()
            .ok_or_else(|| PortError::NotFound(format!("Case {} not found", id)))
    }

    async fn create_case(&self, new_case: NewCase) -> PortResult<Case> {
        let case = Case {
            id: Uuid::new_v4(),
            student_id: new_case.student_id,
            hostel_name: new_case.hostel_name,
            help_type: new_case.help_type,
            note_type: new_case.note_type,
            note_content: new_case.note_content,
            status: CaseStatus::Pending,
            assigned_counsellor: None,
            created_at: Utc::now(),
            assigned_at: None,
            resolved_at: None,
        };
        self.cases.write().await.push(case.clone());
        self.announce(ChangeKind::Insert, case.id);
        Ok(case)
    }

    async fn assign_case(&self, id: Uuid, counsellor: &str) -> PortResult<()> {
        self.update(id, |case| {
            case.status = CaseStatus::Assigned;
            case.assigned_counsellor = Some(counsellor.to_string());
            case.assigned_at = Some(Utc::now());
        })
        .await;
        Ok(())
    }

    async fn resolve_case(&self, id: Uuid) -> PortResult<()> {
        self.update(id, |case| {
            case.status = CaseStatus::Resolved;
            case.resolved_at = Some(Utc::now());
        })
        .await;
        Ok(())
    }
}

#[async_trait]
impl ChangeFeed for InMemoryCaseStore {
    async fn subscribe(&self, table: &str) -> PortResult<ChangeStream> {
        let mut receiver = self.events.subscribe();
        let table = table.to_string();
        let stream = async_stream::stream! {
            loop {
                match receiver.recv().await {
                    Ok(event) if event.table == table => {
                        yield event;
                    }
                    Ok(_) => {}
                    Err(broadcast::error::RecvError::Lagged(missed)) => {
                        warn!(missed, "Change feed lagged; forcing a re-fetch");
                        yield ChangeEvent::new(table.clone(), ChangeKind::Update, None);
                    }
                    Err(broadcast::error::RecvError::Closed) => break,
                }
            }
        };
        Ok(Box::pin(stream))
    }
}
