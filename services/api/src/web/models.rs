//! services/api/src/web/models.rs
//!
//! JSON payloads shared by the REST handlers and the live-view WebSocket, and
//! their conversions from the core view models.

use campus_support_core::domain::Case;
use campus_support_core::views::{
    AssignOverview, AssignableCase, DashboardSummary, DashboardView, HostelDetail, TeamMember,
};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;
use uuid::Uuid;

//=========================================================================================
// Requests
//=========================================================================================

/// The student intake form as submitted by the browser.
#[derive(Debug, Deserialize, ToSchema)]
pub struct CreateCaseRequest {
    #[serde(default)]
    pub student_id: String,
    /// One of `Vaigai Hostel`, `Sarayu Hostel`.
    pub hostel_name: Option<String>,
    /// One of `URGENT`, `TALK`, `SELF-HELP`.
    pub help_type: Option<String>,
    #[serde(default)]
    pub note: String,
    /// Whether the voice-note toggle was on. No audio is uploaded.
    #[serde(default)]
    pub recording: bool,
}

#[derive(Debug, Deserialize, ToSchema)]
pub struct AssignCaseRequest {
    pub counsellor: String,
}

#[derive(Debug, Deserialize, utoipa::IntoParams)]
pub struct ListCasesQuery {
    /// Optional status filter: `pending`, `assigned` or `resolved`.
    pub status: Option<String>,
}

//=========================================================================================
// Responses
//=========================================================================================

#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct CaseResponse {
    pub id: Uuid,
    pub student_id: String,
    pub hostel_name: String,
    pub help_type: String,
    pub note_type: Option<String>,
    pub note_content: Option<String>,
    pub status: String,
    pub assigned_counsellor: Option<String>,
    pub created_at: DateTime<Utc>,
    pub assigned_at: Option<DateTime<Utc>>,
    pub resolved_at: Option<DateTime<Utc>>,
}

impl From<&Case> for CaseResponse {
    fn from(case: &Case) -> Self {
        Self {
            id: case.id,
            student_id: case.student_id.clone(),
            hostel_name: case.hostel_name.to_string(),
            help_type: case.help_type.to_string(),
            note_type: case.note_type.map(|t| t.to_string()),
            note_content: case.note_content.clone(),
            status: case.status.to_string(),
            assigned_counsellor: case.assigned_counsellor.clone(),
            created_at: case.created_at,
            assigned_at: case.assigned_at,
            resolved_at: case.resolved_at,
        }
    }
}

fn cases_response(cases: &[Case]) -> Vec<CaseResponse> {
    cases.iter().map(CaseResponse::from).collect()
}

#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct DashboardSummaryResponse {
    pub pending_count: usize,
    pub resolved_count: usize,
    pub counsellor_count: usize,
    pub recent: Vec<CaseResponse>,
}

impl From<&DashboardSummary> for DashboardSummaryResponse {
    fn from(summary: &DashboardSummary) -> Self {
        Self {
            pending_count: summary.pending_count,
            resolved_count: summary.resolved_count,
            counsellor_count: summary.counsellor_count,
            recent: cases_response(&summary.recent),
        }
    }
}

#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct AssignableCaseResponse {
    pub id: Uuid,
    pub student_id: String,
    pub help_type: String,
    pub status: String,
}

impl From<&AssignableCase> for AssignableCaseResponse {
    fn from(case: &AssignableCase) -> Self {
        Self {
            id: case.id,
            student_id: case.student_id.clone(),
            help_type: case.help_type.to_string(),
            status: case.status.to_string(),
        }
    }
}

#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct AssignOverviewResponse {
    pub pending: Vec<AssignableCaseResponse>,
    pub counsellors: Vec<String>,
}

impl From<&AssignOverview> for AssignOverviewResponse {
    fn from(overview: &AssignOverview) -> Self {
        Self {
            pending: overview.pending.iter().map(Into::into).collect(),
            counsellors: overview.counsellors.iter().map(|c| c.to_string()).collect(),
        }
    }
}

#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct HostelDetailResponse {
    pub name: String,
    pub total_students: u32,
    pub description: String,
    pub active_cases: usize,
    pub urgent_cases: usize,
    pub condition: String,
}

impl From<&HostelDetail> for HostelDetailResponse {
    fn from(detail: &HostelDetail) -> Self {
        Self {
            name: detail.hostel.to_string(),
            total_students: detail.total_students,
            description: detail.description.to_string(),
            active_cases: detail.active_cases,
            urgent_cases: detail.urgent_cases,
            condition: detail.condition.as_str().to_string(),
        }
    }
}

#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct TeamMemberResponse {
    pub id: u32,
    pub name: String,
    pub specialization: String,
    pub active_cases: u32,
    pub status: String,
}

impl From<&TeamMember> for TeamMemberResponse {
    fn from(member: &TeamMember) -> Self {
        Self {
            id: member.id,
            name: member.name.to_string(),
            specialization: member.specialization.to_string(),
            active_cases: member.active_cases,
            status: member.availability.as_str().to_string(),
        }
    }
}

/// A rendered dashboard section, tagged by section name.
#[derive(Debug, Clone, Serialize, ToSchema)]
#[serde(tag = "section", content = "data", rename_all = "kebab-case")]
pub enum ViewModel {
    Dashboard(DashboardSummaryResponse),
    HostelDetail(Vec<HostelDetailResponse>),
    TeamMembers(Vec<TeamMemberResponse>),
    PendingCases(Vec<CaseResponse>),
    SolvedCases(Vec<CaseResponse>),
    AssignCounsellor(AssignOverviewResponse),
}

impl From<&DashboardView> for ViewModel {
    fn from(view: &DashboardView) -> Self {
        match view {
            DashboardView::Dashboard(summary) => ViewModel::Dashboard(summary.into()),
            DashboardView::HostelDetail(details) => {
                ViewModel::HostelDetail(details.iter().map(Into::into).collect())
            }
            DashboardView::TeamMembers(members) => {
                ViewModel::TeamMembers(members.iter().map(Into::into).collect())
            }
            DashboardView::PendingCases(cases) => ViewModel::PendingCases(cases_response(cases)),
            DashboardView::SolvedCases(cases) => ViewModel::SolvedCases(cases_response(cases)),
            DashboardView::AssignCounsellor(overview) => {
                ViewModel::AssignCounsellor(overview.into())
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use campus_support_core::views::DashboardSection;

    #[test]
    fn view_model_is_tagged_with_the_section_name() {
        let view = DashboardSection::TeamMembers.render(&[]);
        let json = serde_json::to_value(ViewModel::from(&view)).unwrap();
        assert_eq!(json["section"], "team-members");
        assert_eq!(json["data"].as_array().unwrap().len(), 9);
        assert_eq!(json["data"][1]["status"], "busy");
    }
}
