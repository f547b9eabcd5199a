//! The pure state transition function.

use super::actions::Action;
use super::state::{AppState, AuthState, ListSlice};

/// Replace the item with the same id, or append it.
fn upsert<T>(items: &mut Vec<T>, item: T, id: impl Fn(&T) -> &str) {
    let key = id(&item).to_string();
    match items.iter_mut().find(|existing| id(existing) == key) {
        Some(existing) => *existing = item,
        None => items.push(item),
    }
}

pub fn reduce(mut state: AppState, action: Action) -> AppState {
    match action {
        Action::LoginRequested => {
            state.auth.loading = true;
            state.auth.error = None;
        }
        Action::LoginSucceeded { token, user } => {
            state.auth = AuthState {
                token: Some(token),
                user: Some(user),
                loading: false,
                error: None,
            };
        }
        Action::LoginFailed(error) => {
            state.auth.loading = false;
            state.auth.error = Some(error);
        }
        Action::Logout => {
            // Everything cached belongs to the previous user.
            state = AppState::default();
        }
        Action::SessionExpired => {
            state = AppState {
                auth: AuthState {
                    error: Some("Your session has expired. Please sign in again.".to_string()),
                    ..AuthState::default()
                },
                ..AppState::default()
            };
        }
        Action::AuthRehydrated(auth) => {
            state.auth = AuthState {
                loading: false,
                error: None,
                ..auth
            };
        }

        Action::CoursesLoaded(items) => state.courses = ListSlice::loaded(items),

        Action::ClassesRequested => state.classes = state.classes.requested(),
        Action::ClassesLoaded(items) => state.classes = ListSlice::loaded(items),
        Action::ClassesFailed(error) => state.classes = state.classes.failed(error),

        Action::ScheduleRequested => state.schedule = state.schedule.requested(),
        Action::ScheduleLoaded(items) => state.schedule = ListSlice::loaded(items),
        Action::ScheduleFailed(error) => state.schedule = state.schedule.failed(error),
        Action::ScheduleEventUpserted(event) => {
            upsert(&mut state.schedule.items, event, |e| e.id.as_str());
        }
        Action::ScheduleEventRemoved { id } => {
            state.schedule.items.retain(|e| e.id != id);
        }

        Action::AttendanceRequested => state.attendance = state.attendance.requested(),
        Action::AttendanceLoaded(items) => state.attendance = ListSlice::loaded(items),
        Action::AttendanceFailed(error) => state.attendance = state.attendance.failed(error),
        Action::AttendanceRecordUpserted(record) => {
            upsert(&mut state.attendance.items, record, |r| r.id.as_str());
        }

        Action::PaymentsRequested => state.payments = state.payments.requested(),
        Action::PaymentsLoaded(items) => state.payments = ListSlice::loaded(items),
        Action::PaymentsFailed(error) => state.payments = state.payments.failed(error),

        Action::TicketsRequested => state.tickets = state.tickets.requested(),
        Action::TicketsLoaded(items) => state.tickets = ListSlice::loaded(items),
        Action::TicketsFailed(error) => state.tickets = state.tickets.failed(error),

        Action::GradesLoaded(items) => state.grades = ListSlice::loaded(items),

        Action::CartAdded { course_id } => {
            if !state.cart.contains(&course_id) {
                state.cart.push(course_id);
            }
        }
        Action::CartRemoved { course_id } => state.cart.retain(|id| *id != course_id),
        Action::CartCleared => state.cart.clear(),
    }
    state
}
