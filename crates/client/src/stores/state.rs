//! Application state slices.

use chrono::{DateTime, Utc};
use coursehub_shared::{
    AttendanceRecord, ClassSession, Course, GradeItem, Payment, ScheduleEvent, SupportTicket,
    User,
};
use serde::{Deserialize, Serialize};

/// A cached list of backend records plus its fetch status.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ListSlice<T> {
    pub items: Vec<T>,
    pub loading: bool,
    pub error: Option<String>,
    pub last_updated: Option<DateTime<Utc>>,
}

impl<T> Default for ListSlice<T> {
    fn default() -> Self {
        Self {
            items: Vec::new(),
            loading: false,
            error: None,
            last_updated: None,
        }
    }
}

impl<T> ListSlice<T> {
    pub(crate) fn requested(mut self) -> Self {
        self.loading = true;
        self.error = None;
        self
    }

    pub(crate) fn loaded(items: Vec<T>) -> Self {
        Self {
            items,
            loading: false,
            error: None,
            last_updated: Some(Utc::now()),
        }
    }

    /// Keeps the previously cached items so the view still has something to show.
    pub(crate) fn failed(mut self, error: String) -> Self {
        self.loading = false;
        self.error = Some(error);
        self
    }
}

/// The persisted part of the state.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AuthState {
    pub token: Option<String>,
    pub user: Option<User>,
    #[serde(skip)]
    pub loading: bool,
    #[serde(skip)]
    pub error: Option<String>,
}

impl AuthState {
    pub fn is_authenticated(&self) -> bool {
        self.token.is_some()
    }
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct AppState {
    pub auth: AuthState,
    pub courses: ListSlice<Course>,
    pub classes: ListSlice<ClassSession>,
    pub schedule: ListSlice<ScheduleEvent>,
    pub attendance: ListSlice<AttendanceRecord>,
    pub payments: ListSlice<Payment>,
    pub tickets: ListSlice<SupportTicket>,
    pub grades: ListSlice<GradeItem>,
    /// Course ids in the enrollment cart, in insertion order.
    pub cart: Vec<String>,
}
