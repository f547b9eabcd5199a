//! Store actions.
//!
//! The serde shape (`{"type": "...", "payload": ...}`) is what the server
//! pushes in `state-update` events, so those payloads dispatch unchanged.

use coursehub_shared::{
    AttendanceRecord, ClassSession, Course, GradeItem, Payment, ScheduleEvent, SupportTicket,
    User,
};
use serde::{Deserialize, Serialize};

use super::state::AuthState;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", content = "payload")]
pub enum Action {
    // --- auth ---
    #[serde(rename = "auth/loginRequested")]
    LoginRequested,
    #[serde(rename = "auth/loginSucceeded")]
    LoginSucceeded { token: String, user: User },
    #[serde(rename = "auth/loginFailed")]
    LoginFailed(String),
    #[serde(rename = "auth/logout")]
    Logout,
    /// The backend rejected the token; the session is gone.
    #[serde(rename = "auth/sessionExpired")]
    SessionExpired,
    #[serde(rename = "auth/rehydrated")]
    AuthRehydrated(AuthState),

    // --- catalog ---
    #[serde(rename = "courses/loaded")]
    CoursesLoaded(Vec<Course>),

    // --- classes ---
    #[serde(rename = "classes/requested")]
    ClassesRequested,
    #[serde(rename = "classes/loaded")]
    ClassesLoaded(Vec<ClassSession>),
    #[serde(rename = "classes/failed")]
    ClassesFailed(String),

    // --- schedule ---
    #[serde(rename = "schedule/requested")]
    ScheduleRequested,
    #[serde(rename = "schedule/loaded")]
    ScheduleLoaded(Vec<ScheduleEvent>),
    #[serde(rename = "schedule/failed")]
    ScheduleFailed(String),
    #[serde(rename = "schedule/eventUpserted")]
    ScheduleEventUpserted(ScheduleEvent),
    #[serde(rename = "schedule/eventRemoved")]
    ScheduleEventRemoved { id: String },

    // --- attendance ---
    #[serde(rename = "attendance/requested")]
    AttendanceRequested,
    #[serde(rename = "attendance/loaded")]
    AttendanceLoaded(Vec<AttendanceRecord>),
    #[serde(rename = "attendance/failed")]
    AttendanceFailed(String),
    #[serde(rename = "attendance/recordUpserted")]
    AttendanceRecordUpserted(AttendanceRecord),

    // --- payments ---
    #[serde(rename = "payments/requested")]
    PaymentsRequested,
    #[serde(rename = "payments/loaded")]
    PaymentsLoaded(Vec<Payment>),
    #[serde(rename = "payments/failed")]
    PaymentsFailed(String),

    // --- support ---
    #[serde(rename = "tickets/requested")]
    TicketsRequested,
    #[serde(rename = "tickets/loaded")]
    TicketsLoaded(Vec<SupportTicket>),
    #[serde(rename = "tickets/failed")]
    TicketsFailed(String),

    // --- grades ---
    #[serde(rename = "grades/loaded")]
    GradesLoaded(Vec<GradeItem>),

    // --- cart ---
    #[serde(rename = "cart/added")]
    CartAdded {
        #[serde(rename = "courseId")]
        course_id: String,
    },
    #[serde(rename = "cart/removed")]
    CartRemoved {
        #[serde(rename = "courseId")]
        course_id: String,
    },
    #[serde(rename = "cart/cleared")]
    CartCleared,
}

impl Action {
    /// Actions after which the auth slice must be written to storage.
    pub fn changes_auth(&self) -> bool {
        matches!(
            self,
            Action::LoginSucceeded { .. } | Action::Logout | Action::SessionExpired
        )
    }
}
