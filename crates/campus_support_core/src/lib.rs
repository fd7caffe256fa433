pub mod domain;
pub mod intake;
pub mod ports;
pub mod session;
pub mod sync;
pub mod views;

pub use domain::{Case, CaseFilter, CaseStatus, HelpType, Hostel, NewCase, NoteType, CASES_TABLE};
pub use intake::{IntakeForm, SubmitError, ValidationError};
pub use ports::{
    CaseRepository, ChangeEvent, ChangeFeed, ChangeKind, ChangeStream, PortError, PortResult,
};
pub use session::{LoginError, Role, SessionState};
pub use sync::{ChangeDispatcher, Subscription};
pub use views::{DashboardSection, DashboardView};
