//! REST endpoints for household login and the parent PIN gate.

use std::sync::Arc;

use axum::extract::State;
use axum::http::{header, HeaderMap, StatusCode};
use axum::response::{IntoResponse, Response};
use axum::routing::{get, post};
use axum::{Json, Router};
use chrono::Local;
use secrecy::ExposeSecret;
use serde::Deserialize;
use serde_json::json;
use tracing::{info, warn};

use crate::auth::gate::GateOutcome;
use crate::auth::session::{self, SessionStore};
use crate::config::ChoreboardConfig;
use crate::error::{AuthError, ConfigError, Error};

/// Shared state for auth routes.
#[derive(Clone)]
pub struct AuthRouteState {
    pub sessions: Arc<SessionStore>,
    pub config: Arc<ChoreboardConfig>,
}

#[derive(Debug, Deserialize)]
struct LoginRequest {
    password: String,
}

#[derive(Debug, Deserialize)]
struct ParentLoginRequest {
    pin: String,
}

/// GET /api/login
///
/// Reports whether the current session is household-authorized.
async fn login_status(
    State(state): State<AuthRouteState>,
    headers: HeaderMap,
) -> impl IntoResponse {
    let now = Local::now().naive_local();
    let authorized = match session::session_id_from_headers(&headers) {
        Some(id) => state
            .sessions
            .get(&id, now)
            .await
            .is_some_and(|s| s.household),
        None => false,
    };

    if authorized {
        Json(json!({ "authorized": true })).into_response()
    } else {
        (
            StatusCode::UNAUTHORIZED,
            Json(json!({ "authorized": false })),
        )
            .into_response()
    }
}

/// POST /api/login
///
/// Checks the household password and marks the session. The session
/// cookie is minted on first login and reissued afterwards, keeping
/// any PIN gate state attached to it.
async fn login(
    State(state): State<AuthRouteState>,
    headers: HeaderMap,
    Json(body): Json<LoginRequest>,
) -> Result<Response, Error> {
    let expected = state
        .config
        .password
        .as_ref()
        .ok_or_else(|| ConfigError::MissingEnvVar("CHOREBOARD_PASSWORD".to_string()))?;

    if body.password.as_str() != expected.expose_secret() {
        warn!("Household login failed");
        return Err(AuthError::Unauthorized.into());
    }

    let now = Local::now().naive_local();
    let id = match session::session_id_from_headers(&headers) {
        Some(id) if state.sessions.get(&id, now).await.is_some() => id,
        _ => state.sessions.create(now).await,
    };
    state.sessions.mark_household(&id).await;
    info!("Household login succeeded");

    Ok((
        StatusCode::OK,
        [(header::SET_COOKIE, session::session_set_cookie(&id))],
        Json(json!({ "ok": true })),
    )
        .into_response())
}

/// POST /api/parent-login
///
/// Runs the submitted PIN through the session's gate. The gate checks
/// its lockout before comparing, so probing a locked gate neither
/// succeeds nor consumes attempts.
async fn parent_login(
    State(state): State<AuthRouteState>,
    headers: HeaderMap,
    Json(body): Json<ParentLoginRequest>,
) -> Result<Response, Error> {
    let now = Local::now().naive_local();

    let id = session::session_id_from_headers(&headers).ok_or(AuthError::Unauthorized)?;
    let current = state
        .sessions
        .get(&id, now)
        .await
        .ok_or(AuthError::Unauthorized)?;
    if !current.household {
        return Err(AuthError::Unauthorized.into());
    }

    let expected = state
        .config
        .parent_pin
        .as_ref()
        .ok_or_else(|| ConfigError::MissingEnvVar("CHOREBOARD_PARENT_PIN".to_string()))?;
    let pin_matches = body.pin.as_str() == expected.expose_secret();

    match state.sessions.submit_pin(&id, pin_matches, now).await {
        Some(GateOutcome::Granted) => {
            info!("Parent access granted");
            Ok(Json(json!({ "ok": true })).into_response())
        }
        Some(GateOutcome::Denied) => {
            warn!("Parent PIN rejected");
            Err(AuthError::Unauthorized.into())
        }
        Some(GateOutcome::Locked {
            retry_after_seconds,
        }) => {
            warn!(retry_after_seconds, "Parent gate locked");
            Err(AuthError::Locked {
                retry_after_seconds,
            }
            .into())
        }
        None => Err(AuthError::Unauthorized.into()),
    }
}

/// Build the auth REST routes.
pub fn auth_routes(state: AuthRouteState) -> Router {
    Router::new()
        .route("/api/login", get(login_status).post(login))
        .route("/api/parent-login", post(parent_login))
        .with_state(state)
}
