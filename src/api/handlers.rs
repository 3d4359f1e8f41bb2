//! HTTP endpoint handlers

use std::{convert::Infallible, sync::Arc};

use axum::{
    async_trait,
    extract::{FromRequestParts, State},
    http::{header::AUTHORIZATION, request::Parts, HeaderMap},
    response::{
        sse::{Event, KeepAlive, Sse},
        Json,
    },
};
use chrono::Utc;
use futures::stream::{self, Stream};
use tokio::sync::broadcast::{self, error::RecvError};
use tracing::{debug, info, warn};

use super::responses::{
    ApiResponse, AuthResponse, CreateSessionRequest, CreateSessionResponse, HealthResponse,
    LoginRequest, RegisterRequest, SessionView, StartTimerRequest,
};
use crate::{
    error::{Error, Result},
    services::{summarize, StudyStats},
    state::{AppState, NewSession, TimerEvent, UserId, UserProfile},
    tasks::TimerSnapshot,
};

/// The signed-in caller, resolved from `Authorization: Bearer <token>`
#[derive(Debug, Clone)]
pub struct AuthUser {
    pub user_id: UserId,
    pub token: String,
}

fn bearer_token(headers: &HeaderMap) -> Result<&str> {
    headers
        .get(AUTHORIZATION)
        .and_then(|value| value.to_str().ok())
        .and_then(|value| value.strip_prefix("Bearer "))
        .map(str::trim)
        .filter(|token| !token.is_empty())
        .ok_or(Error::Unauthorized)
}

#[async_trait]
impl FromRequestParts<Arc<AppState>> for AuthUser {
    type Rejection = Error;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &Arc<AppState>,
    ) -> std::result::Result<Self, Self::Rejection> {
        let token = bearer_token(&parts.headers)?.to_string();
        let user_id = state.authenticate(&token).await?;
        Ok(Self { user_id, token })
    }
}

/// Handle POST /auth/register - Create an account and sign in
pub async fn register_handler(
    State(state): State<Arc<AppState>>,
    Json(req): Json<RegisterRequest>,
) -> Result<Json<AuthResponse>> {
    let session = state.auth.register(&req.email, &req.password).await?;

    let profile = UserProfile {
        uid: session.user_id.clone(),
        name: req.name.trim().to_string(),
        email: req.email.trim().to_lowercase(),
    };
    // The account exists even if the profile write fails
    if let Err(e) = state.store.put_profile(&session.user_id, profile).await {
        warn!("Failed to store profile for {}: {}", session.user_id, e);
    }

    Ok(Json(AuthResponse {
        user_id: session.user_id,
        token: session.token,
    }))
}

/// Handle POST /auth/login
pub async fn login_handler(
    State(state): State<Arc<AppState>>,
    Json(req): Json<LoginRequest>,
) -> Result<Json<AuthResponse>> {
    let session = state.auth.sign_in(&req.email, &req.password).await?;
    Ok(Json(AuthResponse {
        user_id: session.user_id,
        token: session.token,
    }))
}

/// Handle POST /auth/logout - Sign out and tear down the caller's timer
pub async fn logout_handler(
    State(state): State<Arc<AppState>>,
    user: AuthUser,
) -> Result<Json<ApiResponse>> {
    state.dispose_timer(&user.user_id)?;
    state.auth.sign_out(&user.token).await;
    info!("User {} logged out", user.user_id);
    Ok(Json(ApiResponse::ok("Signed out")))
}

/// Handle GET /auth/me
pub async fn me_handler(
    State(state): State<Arc<AppState>>,
    user: AuthUser,
) -> Result<Json<UserProfile>> {
    state
        .store
        .get_profile(&user.user_id)
        .await?
        .map(Json)
        .ok_or_else(|| Error::NotFound("profile".to_string()))
}

/// Handle GET /sessions - List the caller's sessions
pub async fn list_sessions_handler(
    State(state): State<Arc<AppState>>,
    user: AuthUser,
) -> Result<Json<Vec<SessionView>>> {
    let sessions = state.store.list_sessions(&user.user_id).await?;
    Ok(Json(sessions.into_iter().map(SessionView::from).collect()))
}

/// Handle POST /sessions - Record a session and hand it to the timer
pub async fn create_session_handler(
    State(state): State<Arc<AppState>>,
    user: AuthUser,
    Json(req): Json<CreateSessionRequest>,
) -> Result<Json<CreateSessionResponse>> {
    let new_session = NewSession::from_form(&req.subject, req.hours, req.minutes, Utc::now())?;
    let mut warnings = Vec::new();

    let session = match state
        .store
        .create_session(&user.user_id, new_session.clone())
        .await
    {
        Ok(id) => Some(SessionView::from(new_session.clone().into_session(id))),
        Err(e) => {
            warn!("Failed to store session for {}: {}", user.user_id, e);
            warnings.push(format!("Session was not saved: {}", e));
            None
        }
    };

    let timer = match state.start_timer(
        &user.user_id,
        &new_session.subject,
        new_session.pomodoro_sessions,
    ) {
        Ok(snapshot) => Some(snapshot),
        Err(e @ Error::InvalidConfiguration(_)) => {
            warnings.push(format!("Timer not started: {}", e));
            None
        }
        Err(e) => return Err(e),
    };

    info!(
        "User {} created session {:?}: {} min, {} pomodoro(s)",
        user.user_id,
        new_session.subject,
        new_session.duration_minutes,
        new_session.pomodoro_sessions
    );

    Ok(Json(CreateSessionResponse {
        session,
        pomodoro_sessions: new_session.pomodoro_sessions,
        timer,
        warnings,
    }))
}

/// Handle GET /stats - Today's sessions and last week's totals
pub async fn stats_handler(
    State(state): State<Arc<AppState>>,
    user: AuthUser,
) -> Result<Json<StudyStats>> {
    let sessions = state.store.list_sessions(&user.user_id).await?;
    Ok(Json(summarize(&sessions, Utc::now())))
}

/// Handle POST /timer - Start a timer from a handoff
pub async fn start_timer_handler(
    State(state): State<Arc<AppState>>,
    user: AuthUser,
    Json(req): Json<StartTimerRequest>,
) -> Result<Json<TimerSnapshot>> {
    let subject = req.subject.trim();
    if subject.is_empty() {
        return Err(Error::InvalidInput("subject is required".to_string()));
    }
    Ok(Json(state.start_timer(
        &user.user_id,
        subject,
        req.pomodoro_sessions,
    )?))
}

/// Handle GET /timer
pub async fn get_timer_handler(
    State(state): State<Arc<AppState>>,
    user: AuthUser,
) -> Result<Json<TimerSnapshot>> {
    Ok(Json(state.active_timer(&user.user_id)?.snapshot()?))
}

/// Handle POST /timer/toggle - Start or pause
pub async fn toggle_timer_handler(
    State(state): State<Arc<AppState>>,
    user: AuthUser,
) -> Result<Json<TimerSnapshot>> {
    Ok(Json(state.active_timer(&user.user_id)?.toggle()?))
}

/// Handle POST /timer/skip - Jump to the next phase
pub async fn skip_timer_handler(
    State(state): State<Arc<AppState>>,
    user: AuthUser,
) -> Result<Json<TimerSnapshot>> {
    Ok(Json(state.active_timer(&user.user_id)?.skip()?))
}

/// Handle DELETE /timer - Leave the timer screen
pub async fn delete_timer_handler(
    State(state): State<Arc<AppState>>,
    user: AuthUser,
) -> Result<Json<ApiResponse>> {
    if state.dispose_timer(&user.user_id)? {
        Ok(Json(ApiResponse::ok("Timer disposed")))
    } else {
        Err(Error::NotFound("no active timer".to_string()))
    }
}

/// Wait for the next bus event that belongs to `user_id`.
///
/// Returns `None` once the bus is closed.
pub async fn next_user_event(
    rx: &mut broadcast::Receiver<TimerEvent>,
    user_id: &UserId,
) -> Option<TimerEvent> {
    loop {
        match rx.recv().await {
            Ok(event) if &event.user_id == user_id => return Some(event),
            Ok(_) => {}
            Err(RecvError::Lagged(skipped)) => {
                warn!("Timer event stream for {} lagged by {}", user_id, skipped);
            }
            Err(RecvError::Closed) => return None,
        }
    }
}

/// Handle GET /timer/events - Stream the caller's timer events
pub async fn timer_events_handler(
    State(state): State<Arc<AppState>>,
    user: AuthUser,
) -> Sse<impl Stream<Item = std::result::Result<Event, Infallible>>> {
    let rx = state.subscribe_events();
    let user_id = user.user_id;
    debug!("User {} subscribed to timer events", user_id);

    let events = stream::unfold(rx, move |mut rx| {
        let user_id = user_id.clone();
        async move {
            loop {
                let event = next_user_event(&mut rx, &user_id).await?;
                match Event::default().event("timer").json_data(&event) {
                    Ok(sse_event) => return Some((Ok(sse_event), rx)),
                    Err(e) => warn!("Failed to encode timer event: {}", e),
                }
            }
        }
    });

    Sse::new(events).keep_alive(KeepAlive::default())
}

/// Handle GET /health - Health check endpoint
pub async fn health_handler(State(state): State<Arc<AppState>>) -> Json<HealthResponse> {
    Json(HealthResponse::ok(
        state.get_uptime(),
        state.host.clone(),
        state.port,
        state.active_timer_count(),
    ))
}
