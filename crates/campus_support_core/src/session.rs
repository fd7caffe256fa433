//! crates/campus_support_core/src/session.rs
//!
//! The mock session gate. Logging in only records which role the caller
//! claims; credentials are never checked against a backend.

use std::fmt;
use std::str::FromStr;

#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
pub enum LoginError {
    #[error("Student ID and password are required")]
    MissingStudentCredentials,
    #[error("Email and password are required")]
    MissingCounsellorCredentials,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Role {
    Student,
    Counsellor,
}

impl Role {
    pub fn as_str(&self) -> &'static str {
        match self {
            Role::Student => "student",
            Role::Counsellor => "counsellor",
        }
    }
}

/// Who the current caller claims to be.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub enum SessionState {
    #[default]
    Anonymous,
    Student(String),
    Counsellor,
}

impl SessionState {
    pub fn login_student(student_id: &str, password: &str) -> Result<Self, LoginError> {
        let student_id = student_id.trim();
        if student_id.is_empty() || password.is_empty() {
            return Err(LoginError::MissingStudentCredentials);
        }
        Ok(SessionState::Student(student_id.to_string()))
    }

    pub fn login_counsellor(email: &str, password: &str) -> Result<Self, LoginError> {
        if email.trim().is_empty() || password.is_empty() {
            return Err(LoginError::MissingCounsellorCredentials);
        }
        Ok(SessionState::Counsellor)
    }

    pub fn role(&self) -> Option<Role> {
        match self {
            SessionState::Anonymous => None,
            SessionState::Student(_) => Some(Role::Student),
            SessionState::Counsellor => Some(Role::Counsellor),
        }
    }

    pub fn student_id(&self) -> Option<&str> {
        match self {
            SessionState::Student(id) => Some(id),
            _ => None,
        }
    }

    pub fn has_role(&self, role: Role) -> bool {
        self.role() == Some(role)
    }

    /// Where a caller in this state lands after login.
    pub fn home_route(&self) -> &'static str {
        match self {
            SessionState::Anonymous => "/",
            SessionState::Student(_) => "/student-dashboard",
            SessionState::Counsellor => "/counsellor-dashboard",
        }
    }
}

/// Renders the value persisted in the client-side session cookie.
impl fmt::Display for SessionState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SessionState::Anonymous => Ok(()),
            SessionState::Student(id) => write!(f, "student:{}", id),
            SessionState::Counsellor => f.write_str("counsellor"),
        }
    }
}

/// Parses a session cookie value. Anything unrecognised is anonymous.
impl FromStr for SessionState {
    type Err = std::convert::Infallible;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let state = match s.trim() {
            "counsellor" => SessionState::Counsellor,
            other => match other.strip_prefix("student:") {
                Some(id) if !id.trim().is_empty() => SessionState::Student(id.trim().to_string()),
                _ => SessionState::Anonymous,
            },
        };
        Ok(state)
    }
}
