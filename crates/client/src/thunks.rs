//! Async action creators.
//!
//! Each thunk brackets one backend call with a `*Requested` action and a
//! `*Loaded` / `*Failed` action. Errors end here as a user-facing message in
//! the store; nothing is returned to the caller except whether it worked.

use coursehub_shared::{ApiError, LoginRequest, LoginResponse};
use serde::de::DeserializeOwned;

use crate::api_client::ApiClient;
use crate::stores::{Action, Store};

async fn fetch_list<T: DeserializeOwned>(
    store: &Store,
    api: &ApiClient,
    path: &str,
    requested: Action,
    loaded: fn(Vec<T>) -> Action,
    failed: fn(String) -> Action,
) -> bool {
    store.dispatch(requested);
    match api.get_json::<Vec<T>>(path).await {
        Ok(items) => {
            crate::log_debug!("thunk: {} returned {} items", path, items.len());
            store.dispatch(loaded(items));
            true
        }
        Err(e) => {
            report_failure(store, api, path, &e);
            store.dispatch(failed(e.user_message()));
            false
        }
    }
}

fn report_failure(store: &Store, api: &ApiClient, path: &str, e: &ApiError) {
    if e.is_unauthorized() {
        crate::log_warn!("thunk: {} rejected the session token", path);
        api.set_token(None);
        store.dispatch(Action::SessionExpired);
    } else if e.is_network() {
        crate::log_warn!("thunk: {} unreachable: {}", path, e);
    } else {
        crate::log_error!("thunk: {} failed: {}", path, e);
    }
}

pub async fn fetch_classes(store: &Store, api: &ApiClient) -> bool {
    fetch_list(
        store,
        api,
        "/classes",
        Action::ClassesRequested,
        Action::ClassesLoaded,
        Action::ClassesFailed,
    )
    .await
}

pub async fn fetch_schedule(store: &Store, api: &ApiClient) -> bool {
    fetch_list(
        store,
        api,
        "/schedule",
        Action::ScheduleRequested,
        Action::ScheduleLoaded,
        Action::ScheduleFailed,
    )
    .await
}

pub async fn fetch_attendance(store: &Store, api: &ApiClient) -> bool {
    fetch_list(
        store,
        api,
        "/attendance",
        Action::AttendanceRequested,
        Action::AttendanceLoaded,
        Action::AttendanceFailed,
    )
    .await
}

pub async fn fetch_payments(store: &Store, api: &ApiClient) -> bool {
    fetch_list(
        store,
        api,
        "/payments",
        Action::PaymentsRequested,
        Action::PaymentsLoaded,
        Action::PaymentsFailed,
    )
    .await
}

pub async fn fetch_tickets(store: &Store, api: &ApiClient) -> bool {
    fetch_list(
        store,
        api,
        "/support/tickets",
        Action::TicketsRequested,
        Action::TicketsLoaded,
        Action::TicketsFailed,
    )
    .await
}

/// On success the client is switched to the new token before the store
/// hears about it, so thunks triggered by the login already authenticate.
pub async fn login(store: &Store, api: &ApiClient, email: &str, password: &str) -> bool {
    store.dispatch(Action::LoginRequested);
    let request = LoginRequest {
        email: email.to_string(),
        password: password.to_string(),
    };
    match api.post_json::<_, LoginResponse>("/auth/login", &request).await {
        Ok(LoginResponse { token, user }) => {
            crate::log_info!("thunk: signed in as {}", user.email);
            api.set_token(Some(token.clone()));
            store.dispatch(Action::LoginSucceeded { token, user });
            true
        }
        Err(e) => {
            crate::log_warn!("thunk: login failed: {}", e);
            store.dispatch(Action::LoginFailed(e.user_message()));
            false
        }
    }
}

pub fn logout(store: &Store, api: &ApiClient) {
    api.set_token(None);
    store.dispatch(Action::Logout);
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::stores::AppState;
    use crate::test_support::{local_api, scripted_server, CannedResponse};
    use coursehub_shared::ProblemDetails;
    use serde_json::json;

    fn schedule_json() -> serde_json::Value {
        json!([
            {"id": "e1", "title": "Math", "startsAt": "2026-03-02T09:00:00Z", "endsAt": "2026-03-02T10:00:00Z"},
            {"id": "e2", "title": "Art", "startsAt": "2026-03-02T11:00:00Z", "endsAt": "2026-03-02T12:00:00Z"}
        ])
    }

    #[tokio::test]
    async fn fetch_schedule_loads_items() {
        let server = scripted_server(vec![CannedResponse::json(200, schedule_json())]).await;
        let store = Store::new(AppState::default());
        let api = local_api(&server.base_url);

        assert!(fetch_schedule(&store, &api).await);

        let schedule = store.state().schedule;
        assert_eq!(schedule.items.len(), 2);
        assert!(!schedule.loading);
        assert!(schedule.error.is_none());
        assert!(schedule.last_updated.is_some());
    }

    #[tokio::test]
    async fn failure_becomes_user_message() {
        let problem = ProblemDetails::internal_error("Timetable service is down");
        let server = scripted_server(vec![CannedResponse::problem(
            500,
            serde_json::to_value(&problem).unwrap(),
        )])
        .await;
        let store = Store::new(AppState::default());
        let api = local_api(&server.base_url);

        assert!(!fetch_classes(&store, &api).await);

        let classes = store.state().classes;
        assert!(!classes.loading);
        assert_eq!(classes.error.as_deref(), Some("Timetable service is down"));
    }

    #[tokio::test]
    async fn unauthorized_expires_session() {
        let server = scripted_server(vec![
            CannedResponse::json(
                200,
                json!({"token": "t1", "user": {"id": "u1", "email": "ada@example.com", "name": "Ada", "role": "student"}}),
            ),
            CannedResponse::json(401, json!({"message": "expired"})),
        ])
        .await;
        let store = Store::new(AppState::default());
        let api = local_api(&server.base_url);

        assert!(login(&store, &api, "ada@example.com", "pw").await);
        assert_eq!(api.token().as_deref(), Some("t1"));
        assert!(store.state().auth.is_authenticated());

        assert!(!fetch_payments(&store, &api).await);
        assert_eq!(api.token(), None);
        assert!(!store.state().auth.is_authenticated());

        let seen = server.seen();
        assert_eq!(seen[0].path, "/auth/login");
        assert_eq!(seen[1].path, "/payments");
        assert_eq!(seen[1].header("authorization"), Some("Bearer t1"));
    }

    #[tokio::test]
    async fn failed_login_keeps_user_signed_out() {
        let problem = ProblemDetails::bad_request("Invalid email or password");
        let server = scripted_server(vec![CannedResponse::problem(
            400,
            serde_json::to_value(&problem).unwrap(),
        )])
        .await;
        let store = Store::new(AppState::default());
        let api = local_api(&server.base_url);

        assert!(!login(&store, &api, "ada@example.com", "nope").await);
        let auth = store.state().auth;
        assert!(!auth.is_authenticated());
        assert!(!auth.loading);
        assert_eq!(auth.error.as_deref(), Some("Invalid email or password"));
    }

    #[tokio::test]
    async fn network_failure_is_reported() {
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        drop(listener);

        let store = Store::new(AppState::default());
        let api = local_api(&format!("http://{addr}"));

        assert!(!fetch_tickets(&store, &api).await);
        let tickets = store.state().tickets;
        assert!(tickets.error.unwrap().contains("Unable to reach the server"));
    }
}
