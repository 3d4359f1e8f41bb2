//! HTTP API module
//!
//! This module contains all HTTP endpoint handlers and response structures.

pub mod handlers;
pub mod responses;

use std::sync::Arc;
use axum::{
    routing::{get, post},
    Router,
};
use tower_http::{cors::CorsLayer, trace::TraceLayer};

use crate::state::AppState;
use handlers::*;

/// Create the HTTP router with all endpoints
pub fn create_router(state: Arc<AppState>) -> Router {
    Router::new()
        .route("/auth/register", post(register_handler))
        .route("/auth/login", post(login_handler))
        .route("/auth/logout", post(logout_handler))
        .route("/auth/me", get(me_handler))
        .route("/sessions", get(list_sessions_handler).post(create_session_handler))
        .route("/stats", get(stats_handler))
        .route(
            "/timer",
            get(get_timer_handler)
                .post(start_timer_handler)
                .delete(delete_timer_handler),
        )
        .route("/timer/toggle", post(toggle_timer_handler))
        .route("/timer/skip", post(skip_timer_handler))
        .route("/timer/events", get(timer_events_handler))
        .route("/health", get(health_handler))
        .layer(CorsLayer::permissive())
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

#[cfg(test)]
mod tests {
    use std::time::Duration;

    use async_trait::async_trait;
    use axum::{
        body::{to_bytes, Body},
        http::{Method, Request, StatusCode},
    };
    use futures::StreamExt;
    use serde_json::{json, Value};
    use tokio::{sync::broadcast, time::timeout};
    use tower::ServiceExt;

    use super::*;
    use crate::{
        error::{Error, Result},
        services::{InMemoryAuth, SessionStore},
        state::{
            NewSession, SessionId, StudySession, TimerEvent, TimerEventKind, UserId, UserProfile,
        },
    };

    /// A store whose session reads and writes always fail
    struct UnavailableStore;

    #[async_trait]
    impl SessionStore for UnavailableStore {
        async fn list_sessions(&self, _user_id: &UserId) -> Result<Vec<StudySession>> {
            Err(Error::Store("backend unavailable".to_string()))
        }

        async fn create_session(
            &self,
            _user_id: &UserId,
            _session: NewSession,
        ) -> Result<SessionId> {
            Err(Error::Store("backend unavailable".to_string()))
        }

        async fn put_profile(&self, _user_id: &UserId, _profile: UserProfile) -> Result<()> {
            Ok(())
        }

        async fn get_profile(&self, _user_id: &UserId) -> Result<Option<UserProfile>> {
            Ok(None)
        }
    }

    fn app() -> (Router, Arc<AppState>) {
        let state = Arc::new(AppState::new(
            0,
            "127.0.0.1".to_string(),
            Duration::from_secs(1),
            16,
        ));
        (create_router(Arc::clone(&state)), state)
    }

    async fn send(
        app: &Router,
        method: Method,
        uri: &str,
        token: Option<&str>,
        body: Option<Value>,
    ) -> (StatusCode, Value) {
        let mut builder = Request::builder().method(method).uri(uri);
        if let Some(token) = token {
            builder = builder.header("authorization", format!("Bearer {}", token));
        }
        let request = match body {
            Some(body) => builder
                .header("content-type", "application/json")
                .body(Body::from(body.to_string()))
                .unwrap(),
            None => builder.body(Body::empty()).unwrap(),
        };

        let response = app.clone().oneshot(request).await.unwrap();
        let status = response.status();
        let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        let value = if bytes.is_empty() {
            Value::Null
        } else {
            serde_json::from_slice(&bytes).unwrap()
        };
        (status, value)
    }

    async fn register_as(app: &Router, email: &str) -> String {
        let (status, body) = send(
            app,
            Method::POST,
            "/auth/register",
            None,
            Some(json!({"name": "Ada", "email": email, "password": "secret1"})),
        )
        .await;
        assert_eq!(status, StatusCode::OK);
        body["token"].as_str().unwrap().to_string()
    }

    async fn register(app: &Router) -> String {
        register_as(app, "ada@example.com").await
    }

    async fn open_events(
        app: &Router,
        token: &str,
    ) -> impl futures::Stream<Item = std::result::Result<axum::body::Bytes, axum::Error>> + Unpin
    {
        let request = Request::builder()
            .method(Method::GET)
            .uri("/timer/events")
            .header("authorization", format!("Bearer {}", token))
            .body(Body::empty())
            .unwrap();
        let response = app.clone().oneshot(request).await.unwrap();
        assert_eq!(response.status(), StatusCode::OK);
        Box::pin(response.into_body().into_data_stream())
    }

    #[tokio::test]
    async fn health_is_public() {
        let (app, _) = app();
        let (status, body) = send(&app, Method::GET, "/health", None, None).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["status"], "ok");
        assert_eq!(body["host"], "127.0.0.1");
        assert_eq!(body["port"], 0);
        assert_eq!(body["active_timers"], 0);
    }

    #[tokio::test]
    async fn protected_routes_need_a_token() {
        let (app, _) = app();
        let (status, _) = send(&app, Method::GET, "/sessions", None, None).await;
        assert_eq!(status, StatusCode::UNAUTHORIZED);

        let (status, _) = send(&app, Method::GET, "/timer", Some("bogus"), None).await;
        assert_eq!(status, StatusCode::UNAUTHORIZED);
    }

    #[tokio::test]
    async fn register_login_and_profile() {
        let (app, _) = app();
        let token = register(&app).await;

        let (status, body) = send(&app, Method::GET, "/auth/me", Some(&token), None).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["name"], "Ada");
        assert_eq!(body["email"], "ada@example.com");

        let (status, _) = send(
            &app,
            Method::POST,
            "/auth/register",
            None,
            Some(json!({"name": "Ada", "email": "ada@example.com", "password": "secret1"})),
        )
        .await;
        assert_eq!(status, StatusCode::CONFLICT);

        let (status, _) = send(
            &app,
            Method::POST,
            "/auth/login",
            None,
            Some(json!({"email": "ada@example.com", "password": "wrong!!"})),
        )
        .await;
        assert_eq!(status, StatusCode::UNAUTHORIZED);

        let (status, body) = send(
            &app,
            Method::POST,
            "/auth/login",
            None,
            Some(json!({"email": "ada@example.com", "password": "secret1"})),
        )
        .await;
        assert_eq!(status, StatusCode::OK);
        assert!(body["token"].is_string());
    }

    #[tokio::test]
    async fn creating_a_session_starts_the_timer() {
        let (app, state) = app();
        let token = register(&app).await;

        let (status, body) = send(
            &app,
            Method::POST,
            "/sessions",
            Some(&token),
            Some(json!({"subject": "Math", "hours": 1, "minutes": 15})),
        )
        .await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["pomodoro_sessions"], 2);
        assert_eq!(body["session"]["duration_display"], "1h 15m");
        assert_eq!(body["timer"]["display"], "25:00");
        assert_eq!(body["timer"]["mode"], "Study Time");
        assert_eq!(state.active_timer_count(), 1);

        let (status, body) = send(&app, Method::GET, "/sessions", Some(&token), None).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body.as_array().unwrap().len(), 1);
        assert_eq!(body[0]["subject"], "Math");

        let (status, body) = send(&app, Method::GET, "/stats", Some(&token), None).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["today"].as_array().unwrap().len(), 1);
        assert_eq!(body["week_study_minutes"], 50);
    }

    #[tokio::test]
    async fn short_session_is_saved_without_a_timer() {
        let (app, state) = app();
        let token = register(&app).await;

        let (status, body) = send(
            &app,
            Method::POST,
            "/sessions",
            Some(&token),
            Some(json!({"subject": "Reading", "minutes": 20})),
        )
        .await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["pomodoro_sessions"], 0);
        assert!(body["session"].is_object());
        assert!(body["timer"].is_null());
        assert_eq!(body["warnings"].as_array().unwrap().len(), 1);
        assert_eq!(state.active_timer_count(), 0);
    }

    #[tokio::test]
    async fn invalid_session_form_is_rejected() {
        let (app, _) = app();
        let token = register(&app).await;

        let (status, body) = send(
            &app,
            Method::POST,
            "/sessions",
            Some(&token),
            Some(json!({"subject": "Math"})),
        )
        .await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body["status"], "error");
    }

    #[tokio::test]
    async fn timer_controls() {
        let (app, _) = app();
        let token = register(&app).await;

        let (status, _) = send(&app, Method::GET, "/timer", Some(&token), None).await;
        assert_eq!(status, StatusCode::NOT_FOUND);

        let (status, _) = send(
            &app,
            Method::POST,
            "/timer",
            Some(&token),
            Some(json!({"subject": "Math", "pomodoro_sessions": 0})),
        )
        .await;
        assert_eq!(status, StatusCode::BAD_REQUEST);

        let (status, body) = send(
            &app,
            Method::POST,
            "/timer",
            Some(&token),
            Some(json!({"subject": "Math", "pomodoro_sessions": 1})),
        )
        .await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["is_running"], false);

        let (_, body) = send(&app, Method::POST, "/timer/toggle", Some(&token), None).await;
        assert_eq!(body["is_running"], true);

        let (_, body) = send(&app, Method::POST, "/timer/skip", Some(&token), None).await;
        assert_eq!(body["phase"], "break");
        assert_eq!(body["display"], "05:00");

        let (_, body) = send(&app, Method::POST, "/timer/skip", Some(&token), None).await;
        assert_eq!(body["is_completed"], true);
        assert_eq!(body["is_running"], false);
        assert_eq!(body["mode"], "Session Completed!");

        let (status, _) = send(&app, Method::DELETE, "/timer", Some(&token), None).await;
        assert_eq!(status, StatusCode::OK);
        let (status, _) = send(&app, Method::DELETE, "/timer", Some(&token), None).await;
        assert_eq!(status, StatusCode::NOT_FOUND);
    }

    #[tokio::test]
    async fn logout_disposes_timer_and_token() {
        let (app, state) = app();
        let token = register(&app).await;

        send(
            &app,
            Method::POST,
            "/timer",
            Some(&token),
            Some(json!({"subject": "Math", "pomodoro_sessions": 2})),
        )
        .await;
        assert_eq!(state.active_timer_count(), 1);

        let (status, _) = send(&app, Method::POST, "/auth/logout", Some(&token), None).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(state.active_timer_count(), 0);

        let (status, _) = send(&app, Method::GET, "/sessions", Some(&token), None).await;
        assert_eq!(status, StatusCode::UNAUTHORIZED);
    }

    #[tokio::test]
    async fn timer_starts_even_when_session_is_not_saved() {
        let state = Arc::new(AppState::with_collaborators(
            0,
            "127.0.0.1".to_string(),
            Duration::from_secs(1),
            16,
            Arc::new(InMemoryAuth::new()),
            Arc::new(UnavailableStore),
        ));
        let app = create_router(Arc::clone(&state));
        let token = register(&app).await;

        let (status, body) = send(
            &app,
            Method::POST,
            "/sessions",
            Some(&token),
            Some(json!({"subject": "Math", "hours": 1})),
        )
        .await;
        assert_eq!(status, StatusCode::OK);
        assert!(body["session"].is_null());
        assert_eq!(body["timer"]["subject"], "Math");
        assert_eq!(body["timer"]["total_sessions_planned"], 2);
        let warnings = body["warnings"].as_array().unwrap();
        assert_eq!(warnings.len(), 1);
        assert!(warnings[0].as_str().unwrap().contains("not saved"));
        assert_eq!(state.active_timer_count(), 1);

        let (_, body) = send(&app, Method::POST, "/timer/toggle", Some(&token), None).await;
        assert_eq!(body["is_running"], true);
    }

    #[tokio::test]
    async fn timer_events_reach_only_their_owner() {
        let (app, state) = app();
        let alice = register_as(&app, "alice@example.com").await;
        let bob = register_as(&app, "bob@example.com").await;
        let alice_id = state.authenticate(&alice).await.unwrap();
        let bob_id = state.authenticate(&bob).await.unwrap();
        state.start_timer(&alice_id, "Math", 2).unwrap();
        state.start_timer(&bob_id, "Art", 2).unwrap();

        let mut alice_events = open_events(&app, &alice).await;
        let mut bob_events = open_events(&app, &bob).await;

        let (status, _) = send(&app, Method::POST, "/timer/skip", Some(&alice), None).await;
        assert_eq!(status, StatusCode::OK);

        let frame = timeout(Duration::from_secs(1), alice_events.next())
            .await
            .unwrap()
            .unwrap()
            .unwrap();
        let text = String::from_utf8(frame.to_vec()).unwrap();
        assert!(text.contains("event: timer"));
        assert!(text.contains("break_started"));
        assert!(text.contains("Math"));

        assert!(timeout(Duration::from_millis(100), bob_events.next())
            .await
            .is_err());
    }

    #[tokio::test]
    async fn next_user_event_skips_other_users() {
        let (tx, mut rx) = broadcast::channel(8);
        let alice = "alice".to_string();

        tx.send(TimerEvent::new(
            "bob".to_string(),
            "Art".to_string(),
            TimerEventKind::Completed,
        ))
        .unwrap();
        tx.send(TimerEvent::new(
            alice.clone(),
            "Math".to_string(),
            TimerEventKind::BreakStarted { session: 1 },
        ))
        .unwrap();

        let event = next_user_event(&mut rx, &alice).await.unwrap();
        assert_eq!(event.subject, "Math");
        assert_eq!(event.kind, TimerEventKind::BreakStarted { session: 1 });

        drop(tx);
        assert!(next_user_event(&mut rx, &alice).await.is_none());
    }
}
