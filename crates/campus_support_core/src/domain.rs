//! crates/campus_support_core/src/domain.rs
//!
//! Defines the pure, core data structures for the application.
//! These structs are independent of any database or serialization format.

use chrono::{DateTime, Utc};
use std::fmt;
use std::str::FromStr;
use uuid::Uuid;

/// The name of the single shared table every case lives in.
pub const CASES_TABLE: &str = "student_cases";

/// Error returned when a stored or submitted label does not match any known variant.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("Unknown {kind} value: '{value}'")]
pub struct UnknownVariant {
    pub kind: &'static str,
    pub value: String,
}

impl UnknownVariant {
    fn new(kind: &'static str, value: &str) -> Self {
        Self {
            kind,
            value: value.to_string(),
        }
    }
}

//=========================================================================================
// Enumerations
//=========================================================================================

/// Urgency classification chosen by the student. Immutable after creation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum HelpType {
    Urgent,
    Talk,
    SelfHelp,
}

impl HelpType {
    pub const ALL: [HelpType; 3] = [HelpType::Urgent, HelpType::Talk, HelpType::SelfHelp];

    pub fn as_str(&self) -> &'static str {
        match self {
            HelpType::Urgent => "URGENT",
            HelpType::Talk => "TALK",
            HelpType::SelfHelp => "SELF-HELP",
        }
    }
}

impl fmt::Display for HelpType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for HelpType {
    type Err = UnknownVariant;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "URGENT" => Ok(HelpType::Urgent),
            "TALK" => Ok(HelpType::Talk),
            "SELF-HELP" => Ok(HelpType::SelfHelp),
            other => Err(UnknownVariant::new("help_type", other)),
        }
    }
}

/// How the student attached their note. `Voice` is a label only; no audio is stored.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NoteType {
    Text,
    Voice,
}

impl NoteType {
    pub fn as_str(&self) -> &'static str {
        match self {
            NoteType::Text => "text",
            NoteType::Voice => "voice",
        }
    }
}

impl fmt::Display for NoteType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for NoteType {
    type Err = UnknownVariant;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "text" => Ok(NoteType::Text),
            "voice" => Ok(NoteType::Voice),
            other => Err(UnknownVariant::new("note_type", other)),
        }
    }
}

/// Lifecycle position of a case: `Pending -> Assigned -> Resolved`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum CaseStatus {
    Pending,
    Assigned,
    Resolved,
}

impl CaseStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            CaseStatus::Pending => "pending",
            CaseStatus::Assigned => "assigned",
            CaseStatus::Resolved => "resolved",
        }
    }
}

impl fmt::Display for CaseStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for CaseStatus {
    type Err = UnknownVariant;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "pending" => Ok(CaseStatus::Pending),
            "assigned" => Ok(CaseStatus::Assigned),
            "resolved" => Ok(CaseStatus::Resolved),
            other => Err(UnknownVariant::new("status", other)),
        }
    }
}

/// The residential facilities a student can pick from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Hostel {
    Vaigai,
    Sarayu,
}

impl Hostel {
    pub const ALL: [Hostel; 2] = [Hostel::Vaigai, Hostel::Sarayu];

    pub fn as_str(&self) -> &'static str {
        match self {
            Hostel::Vaigai => "Vaigai Hostel",
            Hostel::Sarayu => "Sarayu Hostel",
        }
    }
}

impl fmt::Display for Hostel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Hostel {
    type Err = UnknownVariant;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Hostel::ALL
            .into_iter()
            .find(|h| h.as_str() == s)
            .ok_or_else(|| UnknownVariant::new("hostel_name", s))
    }
}

//=========================================================================================
// Entities
//=========================================================================================

/// One student support request record.
#[derive(Debug, Clone, PartialEq)]
pub struct Case {
    pub id: Uuid,
    pub student_id: String,
    pub hostel_name: Hostel,
    pub help_type: HelpType,
    pub note_type: Option<NoteType>,
    pub note_content: Option<String>,
    pub status: CaseStatus,
    /// Only meaningful once the case has been assigned.
    pub assigned_counsellor: Option<String>,
    pub created_at: DateTime<Utc>,
    pub assigned_at: Option<DateTime<Utc>>,
    pub resolved_at: Option<DateTime<Utc>>,
}

impl Case {
    /// Cases that still need counsellor attention.
    pub fn is_active(&self) -> bool {
        self.status != CaseStatus::Resolved
    }
}

/// The five fields a student supplies when opening a case.
/// Status is always `Pending` on insert, so it is not part of this struct.
#[derive(Debug, Clone, PartialEq)]
pub struct NewCase {
    pub student_id: String,
    pub hostel_name: Hostel,
    pub help_type: HelpType,
    pub note_type: Option<NoteType>,
    pub note_content: Option<String>,
}

/// Query filter for listing cases. Ordering is always newest first.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct CaseFilter {
    pub status: Option<CaseStatus>,
}

impl CaseFilter {
    pub fn all() -> Self {
        Self { status: None }
    }

    pub fn with_status(status: CaseStatus) -> Self {
        Self {
            status: Some(status),
        }
    }

    pub fn matches(&self, case: &Case) -> bool {
        self.status.map_or(true, |s| case.status == s)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn help_type_labels_round_trip_through_from_str() {
        for help_type in HelpType::ALL {
            assert_eq!(help_type.as_str().parse::<HelpType>(), Ok(help_type));
        }
        assert!("self-help".parse::<HelpType>().is_err());
    }

    #[test]
    fn hostel_parses_display_name_only() {
        assert_eq!("Sarayu Hostel".parse::<Hostel>(), Ok(Hostel::Sarayu));
        let err = "Sarayu".parse::<Hostel>().unwrap_err();
        assert_eq!(err.kind, "hostel_name");
    }

    #[test]
    fn status_ordering_follows_lifecycle() {
        assert!(CaseStatus::Pending < CaseStatus::Assigned);
        assert!(CaseStatus::Assigned < CaseStatus::Resolved);
    }
}
