//! crates/campus_support_core/src/views.rs
//!
//! Counsellor dashboard sections and the view models they render from a
//! snapshot of cases. Filtering happens at fetch time through each section's
//! `query`; rendering only shapes what was fetched.

use crate::domain::{Case, CaseFilter, CaseStatus, HelpType, Hostel};
use std::fmt;
use std::str::FromStr;
use uuid::Uuid;

/// How many cases the dashboard's "recent" table shows.
pub const RECENT_CASES_LIMIT: usize = 10;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum DashboardSection {
    Dashboard,
    HostelDetail,
    TeamMembers,
    PendingCases,
    SolvedCases,
    AssignCounsellor,
}

impl DashboardSection {
    pub const ALL: [DashboardSection; 6] = [
        DashboardSection::Dashboard,
        DashboardSection::HostelDetail,
        DashboardSection::TeamMembers,
        DashboardSection::PendingCases,
        DashboardSection::SolvedCases,
        DashboardSection::AssignCounsellor,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            DashboardSection::Dashboard => "dashboard",
            DashboardSection::HostelDetail => "hostel-detail",
            DashboardSection::TeamMembers => "team-members",
            DashboardSection::PendingCases => "pending-cases",
            DashboardSection::SolvedCases => "solved-cases",
            DashboardSection::AssignCounsellor => "assign-counsellor",
        }
    }

    /// The fetch this section issues, or `None` for sections backed by static data.
    pub fn query(&self) -> Option<CaseFilter> {
        match self {
            DashboardSection::Dashboard | DashboardSection::HostelDetail => Some(CaseFilter::all()),
            DashboardSection::PendingCases | DashboardSection::AssignCounsellor => {
                Some(CaseFilter::with_status(CaseStatus::Pending))
            }
            DashboardSection::SolvedCases => Some(CaseFilter::with_status(CaseStatus::Resolved)),
            DashboardSection::TeamMembers => None,
        }
    }

    /// Builds this section's view model from a freshly fetched snapshot.
    pub fn render(&self, cases: &[Case]) -> DashboardView {
        match self {
            DashboardSection::Dashboard => {
                DashboardView::Dashboard(DashboardSummary::from_cases(cases))
            }
            DashboardSection::HostelDetail => DashboardView::HostelDetail(hostel_details(cases)),
            DashboardSection::TeamMembers => DashboardView::TeamMembers(team_roster()),
            DashboardSection::PendingCases => DashboardView::PendingCases(cases.to_vec()),
            DashboardSection::SolvedCases => DashboardView::SolvedCases(cases.to_vec()),
            DashboardSection::AssignCounsellor => DashboardView::AssignCounsellor(AssignOverview {
                pending: cases.iter().map(AssignableCase::from).collect(),
                counsellors: counsellor_names(),
            }),
        }
    }
}

impl fmt::Display for DashboardSection {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for DashboardSection {
    type Err = crate::domain::UnknownVariant;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        DashboardSection::ALL
            .into_iter()
            .find(|section| section.as_str() == s)
            .ok_or_else(|| crate::domain::UnknownVariant {
                kind: "section",
                value: s.to_string(),
            })
    }
}

/// A rendered dashboard section.
#[derive(Debug, Clone, PartialEq)]
pub enum DashboardView {
    Dashboard(DashboardSummary),
    HostelDetail(Vec<HostelDetail>),
    TeamMembers(Vec<TeamMember>),
    PendingCases(Vec<Case>),
    SolvedCases(Vec<Case>),
    AssignCounsellor(AssignOverview),
}

//=========================================================================================
// Dashboard
//=========================================================================================

#[derive(Debug, Clone, PartialEq)]
pub struct DashboardSummary {
    pub pending_count: usize,
    pub resolved_count: usize,
    pub counsellor_count: usize,
    pub recent: Vec<Case>,
}

impl DashboardSummary {
    pub fn from_cases(cases: &[Case]) -> Self {
        Self {
            pending_count: count_status(cases, CaseStatus::Pending),
            resolved_count: count_status(cases, CaseStatus::Resolved),
            counsellor_count: TEAM.len(),
            recent: cases.iter().take(RECENT_CASES_LIMIT).cloned().collect(),
        }
    }
}

fn count_status(cases: &[Case], status: CaseStatus) -> usize {
    cases.iter().filter(|c| c.status == status).count()
}

//=========================================================================================
// Assign Counsellor
//=========================================================================================

/// The projection the assignment picker needs.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AssignableCase {
    pub id: Uuid,
    pub student_id: String,
    pub help_type: HelpType,
    pub status: CaseStatus,
}

impl From<&Case> for AssignableCase {
    fn from(case: &Case) -> Self {
        Self {
            id: case.id,
            student_id: case.student_id.clone(),
            help_type: case.help_type,
            status: case.status,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AssignOverview {
    pub pending: Vec<AssignableCase>,
    pub counsellors: Vec<&'static str>,
}

//=========================================================================================
// Hostel Detail
//=========================================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HostelCondition {
    Stable,
    AttentionNeeded,
}

impl HostelCondition {
    pub fn as_str(&self) -> &'static str {
        match self {
            HostelCondition::Stable => "Stable",
            HostelCondition::AttentionNeeded => "Attention Needed",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HostelDetail {
    pub hostel: Hostel,
    pub total_students: u32,
    pub description: &'static str,
    pub active_cases: usize,
    pub urgent_cases: usize,
    pub condition: HostelCondition,
}

fn hostel_profile(hostel: Hostel) -> (u32, &'static str) {
    match hostel {
        Hostel::Vaigai => (450, "Main residential facility for undergraduate students"),
        Hostel::Sarayu => (380, "Graduate and postgraduate residential facility"),
    }
}

/// Per-hostel load. Counts only cases that are not yet resolved.
pub fn hostel_details(cases: &[Case]) -> Vec<HostelDetail> {
    Hostel::ALL
        .into_iter()
        .map(|hostel| {
            let (total_students, description) = hostel_profile(hostel);
            let active: Vec<&Case> = cases
                .iter()
                .filter(|c| c.hostel_name == hostel && c.is_active())
                .collect();
            let urgent_cases = active
                .iter()
                .filter(|c| c.help_type == HelpType::Urgent)
                .count();
            HostelDetail {
                hostel,
                total_students,
                description,
                active_cases: active.len(),
                urgent_cases,
                condition: if urgent_cases > 0 {
                    HostelCondition::AttentionNeeded
                } else {
                    HostelCondition::Stable
                },
            }
        })
        .collect()
}

//=========================================================================================
// Team Members
//=========================================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Availability {
    Available,
    Busy,
    Offline,
}

impl Availability {
    pub fn as_str(&self) -> &'static str {
        match self {
            Availability::Available => "available",
            Availability::Busy => "busy",
            Availability::Offline => "offline",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TeamMember {
    pub id: u32,
    pub name: &'static str,
    pub specialization: &'static str,
    pub active_cases: u32,
    pub availability: Availability,
}

const TEAM: [(&str, &str, u32, Availability); 9] = [
    ("Counsellor 1", "Academic Stress", 12, Availability::Available),
    ("Counsellor 2", "Personal Issues", 8, Availability::Busy),
    ("Counsellor 3", "Career Guidance", 15, Availability::Available),
    ("Counsellor 4", "Mental Health", 6, Availability::Available),
    ("Counsellor 5", "Academic Stress", 10, Availability::Offline),
    ("Counsellor 6", "Social Issues", 9, Availability::Available),
    ("Counsellor 7", "Personal Issues", 11, Availability::Busy),
    ("Counsellor 8", "Career Guidance", 7, Availability::Available),
    ("Counsellor 9", "Mental Health", 13, Availability::Available),
];

pub fn team_roster() -> Vec<TeamMember> {
    TEAM.iter()
        .zip(1..)
        .map(|(&(name, specialization, active_cases, availability), id)| TeamMember {
            id,
            name,
            specialization,
            active_cases,
            availability,
        })
        .collect()
}

/// Names offered by the assignment picker.
pub fn counsellor_names() -> Vec<&'static str> {
    TEAM.iter().map(|(name, ..)| *name).collect()
}

pub fn is_known_counsellor(name: &str) -> bool {
    TEAM.iter().any(|(n, ..)| *n == name)
}
