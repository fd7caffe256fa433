//! crates/campus_support_core/src/intake.rs
//!
//! The student intake form: field state, client-side validation, and the
//! single insert performed on submit.

use crate::domain::{Case, HelpType, Hostel, NewCase, NoteType};
use crate::ports::{CaseRepository, PortError};
use tracing::{error, info};

/// Pre-network validation failures. Checked in field order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
pub enum ValidationError {
    #[error("Please enter your Student ID")]
    MissingStudentId,
    #[error("Please select your hostel")]
    MissingHostel,
    #[error("Please select a request type")]
    MissingHelpType,
}

/// Why a submission did not produce a case.
#[derive(Debug, thiserror::Error)]
pub enum SubmitError {
    #[error(transparent)]
    Validation(#[from] ValidationError),
    #[error(transparent)]
    Port(#[from] PortError),
}

/// The fields a student fills in before submitting a request.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct IntakeForm {
    pub student_id: String,
    pub hostel_name: Option<Hostel>,
    pub help_type: Option<HelpType>,
    pub note: String,
    /// UI toggle only. Nothing is recorded.
    pub recording: bool,
}

impl IntakeForm {
    pub fn new() -> Self {
        Self::default()
    }

    /// Whether the submit control should be enabled.
    pub fn is_submittable(&self) -> bool {
        self.validate().is_ok()
    }

    pub fn toggle_recording(&mut self) -> bool {
        self.recording = !self.recording;
        self.recording
    }

    /// Checks the required fields and builds the row to insert.
    pub fn validate(&self) -> Result<NewCase, ValidationError> {
        let student_id = self.student_id.trim();
        if student_id.is_empty() {
            return Err(ValidationError::MissingStudentId);
        }
        let hostel_name = self.hostel_name.ok_or(ValidationError::MissingHostel)?;
        let help_type = self.help_type.ok_or(ValidationError::MissingHelpType)?;

        let note = self.note.trim();
        // The recording toggle never labels a case; only typed text does.
        let note_type = (!note.is_empty()).then_some(NoteType::Text);
        let note_content = if note.is_empty() {
            format!("{} request", help_type)
        } else {
            note.to_string()
        };

        Ok(NewCase {
            student_id: student_id.to_string(),
            hostel_name,
            help_type,
            note_type,
            note_content: Some(note_content),
        })
    }

    /// Validates, inserts one case, and clears the form on success.
    /// On any failure the fields are left untouched so the student can retry.
    pub async fn submit(&mut self, repo: &dyn CaseRepository) -> Result<Case, SubmitError> {
        let new_case = self.validate()?;
        match repo.create_case(new_case).await {
            Ok(case) => {
                info!(case_id = %case.id, help_type = %case.help_type, "Case submitted");
                *self = Self::default();
                Ok(case)
            }
            Err(e) => {
                error!("Error submitting case: {:?}", e);
                Err(SubmitError::Port(e))
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::{CaseFilter, CaseStatus};
    use crate::ports::PortResult;
    use async_trait::async_trait;
    use chrono::Utc;
    use std::sync::Mutex;
    use uuid::Uuid;

    /// Records inserts; optionally fails every write.
    #[derive(Default)]
    struct RecordingRepo {
        inserted: Mutex<Vec<NewCase>>,
        fail: bool,
    }

    #[async_trait]
    impl CaseRepository for RecordingRepo {
        async fn list_cases(&self, _filter: CaseFilter) -> PortResult<Vec<Case>> {
            Ok(Vec::new())
        }

        async fn get_case(&self, id: Uuid) -> PortResult<Case> {
            Err(PortError::NotFound(id.to_string()))
        }

        async fn create_case(&self, new_case: NewCase) -> PortResult<Case> {
            if self.fail {
                return Err(PortError::Submission("store offline".to_string()));
            }
            self.inserted.lock().unwrap().push(new_case.clone());
            Ok(Case {
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
            })
        }

        async fn assign_case(&self, _id: Uuid, _counsellor: &str) -> PortResult<()> {
            Ok(())
        }

        async fn resolve_case(&self, _id: Uuid) -> PortResult<()> {
            Ok(())
        }
    }

    fn filled_form() -> IntakeForm {
        IntakeForm {
            student_id: "  CS21B001 ".to_string(),
            hostel_name: Some(Hostel::Vaigai),
            help_type: Some(HelpType::Urgent),
            ..IntakeForm::default()
        }
    }

    #[test]
    fn blank_note_synthesizes_content_without_note_type() {
        let new_case = filled_form().validate().unwrap();
        assert_eq!(new_case.student_id, "CS21B001");
        assert_eq!(new_case.note_type, None);
        assert_eq!(new_case.note_content.as_deref(), Some("URGENT request"));
    }

    #[test]
    fn text_note_is_trimmed_and_typed() {
        let mut form = filled_form();
        form.note = "  exams are piling up \n".to_string();
        let new_case = form.validate().unwrap();
        assert_eq!(new_case.note_type, Some(NoteType::Text));
        assert_eq!(new_case.note_content.as_deref(), Some("exams are piling up"));
    }

    #[test]
    fn recording_toggle_does_not_set_note_type() {
        let mut form = filled_form();
        assert!(form.toggle_recording());
        let new_case = form.validate().unwrap();
        assert_eq!(new_case.note_type, None);
        assert_eq!(new_case.note_content.as_deref(), Some("URGENT request"));

        form.note = "spoken and typed".to_string();
        assert_eq!(form.validate().unwrap().note_type, Some(NoteType::Text));
    }

    #[test]
    fn missing_fields_are_reported_in_order() {
        let mut form = IntakeForm::new();
        form.student_id = "   ".to_string();
        assert_eq!(form.validate(), Err(ValidationError::MissingStudentId));
        form.student_id = "ME21B032".to_string();
        assert_eq!(form.validate(), Err(ValidationError::MissingHostel));
        form.hostel_name = Some(Hostel::Sarayu);
        assert_eq!(form.validate(), Err(ValidationError::MissingHelpType));
        assert!(!form.is_submittable());
        form.help_type = Some(HelpType::Talk);
        assert!(form.is_submittable());
    }

    #[tokio::test]
    async fn blank_student_id_never_reaches_the_repository() {
        let repo = RecordingRepo::default();
        let mut form = filled_form();
        form.student_id = " \t".to_string();

        let err = form.submit(&repo).await.unwrap_err();
        assert!(matches!(err, SubmitError::Validation(ValidationError::MissingStudentId)));
        assert!(repo.inserted.lock().unwrap().is_empty());
    }

    #[tokio::test]
    async fn successful_submit_clears_the_form() {
        let repo = RecordingRepo::default();
        let mut form = filled_form();
        form.note = "need to talk".to_string();
        form.recording = true;

        let case = form.submit(&repo).await.unwrap();
        assert_eq!(case.status, CaseStatus::Pending);
        assert_eq!(case.assigned_counsellor, None);
        assert_eq!(form, IntakeForm::default());
        assert_eq!(repo.inserted.lock().unwrap().len(), 1);
    }

    #[tokio::test]
    async fn failed_submit_keeps_the_fields() {
        let repo = RecordingRepo {
            fail: true,
            ..RecordingRepo::default()
        };
        let mut form = filled_form();
        form.note = "please call".to_string();
        let before = form.clone();

        let err = form.submit(&repo).await.unwrap_err();
        assert!(matches!(err, SubmitError::Port(PortError::Submission(_))));
        assert_eq!(form, before);
    }
}
