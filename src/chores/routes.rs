//! REST endpoints for the checklist, the parent editor, and the reports.

use std::sync::Arc;

use axum::extract::{Path, State};
use axum::http::HeaderMap;
use axum::response::IntoResponse;
use axum::routing::{get, patch, post};
use axum::{Json, Router};
use chrono::{Local, NaiveDateTime};
use serde::{Deserialize, Serialize};
use serde_json::json;
use tokio::sync::Mutex;
use tracing::{debug, warn};
use uuid::Uuid;

use crate::auth::session::{self, Session, SessionStore};
use crate::calendar;
use crate::chores::model::{Checkoff, Chore, ChoreKind, ChoreUpdate, DayPart, Settings};
use crate::chores::rewards::RewardLedger;
use crate::chores::scoring::{self, Badge, ChildScore};
use crate::chores::toggle::{self, ToggleOutcome};
use crate::config::{Child, ChoreboardConfig};
use crate::error::{AuthError, DatabaseError, Error, ValidationError};
use crate::store::Database;

/// Shared state for chore routes.
#[derive(Clone)]
pub struct ChoreRouteState {
    pub db: Arc<dyn Database>,
    pub sessions: Arc<SessionStore>,
    pub rewards: Arc<RewardLedger>,
    /// Serializes each toggle's find-then-mutate pair.
    pub toggle_lock: Arc<Mutex<()>>,
    pub config: Arc<ChoreboardConfig>,
}

// ── Request / response bodies ───────────────────────────────────────

#[derive(Debug, Deserialize)]
struct CreateChoreRequest {
    title: String,
    #[serde(rename = "type")]
    kind: ChoreKind,
    owner: String,
    #[serde(default)]
    day_part: Option<DayPart>,
}

#[derive(Debug, Deserialize)]
struct ReorderRequest {
    ids: Vec<Uuid>,
}

#[derive(Debug, Serialize)]
struct SummaryResponse {
    week_key: String,
    children: Vec<ChildSummary>,
}

#[derive(Debug, Serialize)]
struct ChildSummary {
    slug: String,
    display_name: String,
    day_fraction: f64,
    week_fraction: f64,
    chores: Vec<ChoreEntry>,
}

/// A chore plus its done-state for the current period.
#[derive(Debug, Serialize)]
struct ChoreEntry {
    #[serde(flatten)]
    chore: Chore,
    done: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    reward: Option<String>,
}

#[derive(Debug, Serialize)]
struct ProgressResponse {
    settings: Settings,
    weeks: Vec<WeekReport>,
}

#[derive(Debug, Serialize)]
struct WeekReport {
    week_key: String,
    start: NaiveDateTime,
    end: NaiveDateTime,
    current: bool,
    children: Vec<ChildWeek>,
}

#[derive(Debug, Serialize)]
struct ChildWeek {
    slug: String,
    display_name: String,
    fraction: f64,
    badge: Badge,
}

// ── Auth and validation helpers ─────────────────────────────────────

async fn require_household(
    state: &ChoreRouteState,
    headers: &HeaderMap,
    now: NaiveDateTime,
) -> Result<Session, Error> {
    let id = session::session_id_from_headers(headers).ok_or(AuthError::Unauthorized)?;
    let current = state
        .sessions
        .get(&id, now)
        .await
        .ok_or(AuthError::Unauthorized)?;
    if !current.household {
        return Err(AuthError::Unauthorized.into());
    }
    Ok(current)
}

async fn require_parent(
    state: &ChoreRouteState,
    headers: &HeaderMap,
    now: NaiveDateTime,
) -> Result<Session, Error> {
    let current = require_household(state, headers, now).await?;
    if !current.is_parent(now) {
        return Err(AuthError::ParentRequired.into());
    }
    Ok(current)
}

fn validate_title(title: &str) -> Result<String, ValidationError> {
    let trimmed = title.trim();
    if trimmed.is_empty() {
        return Err(ValidationError::EmptyTitle);
    }
    Ok(trimmed.to_string())
}

fn validate_thresholds(settings: &Settings) -> Result<(), ValidationError> {
    for (name, value) in [
        ("trophy_threshold", settings.trophy_threshold),
        ("apple_threshold", settings.apple_threshold),
    ] {
        if !(0.0..=1.0).contains(&value) {
            return Err(ValidationError::ThresholdOutOfRange {
                name: name.to_string(),
                value,
            });
        }
    }
    if settings.trophy_threshold < settings.apple_threshold {
        return Err(ValidationError::ThresholdOrder);
    }
    Ok(())
}

fn chore_not_found(id: Uuid) -> DatabaseError {
    DatabaseError::NotFound {
        entity: "chore".to_string(),
        id: id.to_string(),
    }
}

// ── Handlers ────────────────────────────────────────────────────────

async fn health() -> impl IntoResponse {
    Json(json!({
        "status": "ok",
        "service": "choreboard"
    }))
}

/// GET /api/chores
async fn list_chores(
    State(state): State<ChoreRouteState>,
    headers: HeaderMap,
) -> Result<Json<Vec<Chore>>, Error> {
    let now = Local::now().naive_local();
    require_household(&state, &headers, now).await?;

    let chores = state.db.get_active_chores().await?;
    Ok(Json(chores))
}

/// POST /api/chores
///
/// Creates a chore at the end of its owner+kind(+day_part) group.
async fn create_chore(
    State(state): State<ChoreRouteState>,
    headers: HeaderMap,
    Json(body): Json<CreateChoreRequest>,
) -> Result<Json<Chore>, Error> {
    let now = Local::now().naive_local();
    require_parent(&state, &headers, now).await?;

    let title = validate_title(&body.title)?;
    if state.config.child(&body.owner).is_none() {
        return Err(ValidationError::UnknownChild(body.owner).into());
    }
    if body.kind == ChoreKind::Weekly && body.day_part.is_some() {
        return Err(ValidationError::DayPartOnWeekly.into());
    }

    let position = state
        .db
        .max_position(&body.owner, body.kind, body.day_part)
        .await?
        + 1;

    let mut chore = Chore::new(title, body.kind, body.owner).with_position(position);
    chore.day_part = body.day_part;
    state.db.add_chore(&chore).await?;

    Ok(Json(chore))
}

/// PATCH /api/chores/{id}
///
/// Partial update; `day_part: null` clears the subgroup.
async fn patch_chore(
    State(state): State<ChoreRouteState>,
    Path(id): Path<Uuid>,
    headers: HeaderMap,
    Json(mut body): Json<ChoreUpdate>,
) -> Result<Json<Chore>, Error> {
    let now = Local::now().naive_local();
    require_parent(&state, &headers, now).await?;

    if let Some(title) = &body.title {
        body.title = Some(validate_title(title)?);
    }

    // Assigning a day part only makes sense on a daily chore
    if matches!(body.day_part, Some(Some(_))) {
        let current = state
            .db
            .get_chore(id)
            .await?
            .ok_or_else(|| chore_not_found(id))?;
        if current.kind == ChoreKind::Weekly {
            return Err(ValidationError::DayPartOnWeekly.into());
        }
    }

    let updated = state.db.update_chore(id, &body).await?;
    Ok(Json(updated))
}

/// DELETE /api/chores/{id}
///
/// Soft delete; checkoff history stays behind.
async fn delete_chore(
    State(state): State<ChoreRouteState>,
    Path(id): Path<Uuid>,
    headers: HeaderMap,
) -> Result<Json<serde_json::Value>, Error> {
    let now = Local::now().naive_local();
    require_parent(&state, &headers, now).await?;

    state.db.soft_delete_chore(id).await?;
    Ok(Json(json!({ "ok": true })))
}

/// POST /api/chores/reorder
///
/// Rewrites positions 1..n in the order given. Unknown ids are skipped
/// so a stale editor list cannot wedge the whole reorder.
async fn reorder_chores(
    State(state): State<ChoreRouteState>,
    headers: HeaderMap,
    Json(body): Json<ReorderRequest>,
) -> Result<Json<serde_json::Value>, Error> {
    let now = Local::now().naive_local();
    require_parent(&state, &headers, now).await?;

    if body.ids.is_empty() {
        return Err(ValidationError::EmptyReorder.into());
    }

    for (index, chore_id) in body.ids.iter().enumerate() {
        let update = ChoreUpdate {
            title: None,
            position: Some(index as i64 + 1),
            day_part: None,
        };
        match state.db.update_chore(*chore_id, &update).await {
            Ok(_) => {}
            Err(DatabaseError::NotFound { .. }) => {
                warn!(id = %chore_id, "Reorder skipped unknown chore");
            }
            Err(e) => return Err(e.into()),
        }
    }

    debug!(count = body.ids.len(), "Chores reordered");
    Ok(Json(json!({ "ok": true })))
}

/// POST /api/chores/{id}/toggle
///
/// The lock is held across the find-then-mutate pair, so a rapid
/// double-click lands as mark + unmark instead of two inserts.
async fn toggle_chore(
    State(state): State<ChoreRouteState>,
    Path(id): Path<Uuid>,
    headers: HeaderMap,
) -> Result<Json<ToggleOutcome>, Error> {
    let now = Local::now().naive_local();
    require_household(&state, &headers, now).await?;

    let _guard = state.toggle_lock.lock().await;

    let chore = state
        .db
        .get_chore(id)
        .await?
        .filter(|c| c.active)
        .ok_or_else(|| chore_not_found(id))?;

    let outcome = toggle::toggle_chore(state.db.as_ref(), &state.rewards, &chore, now).await?;
    Ok(Json(outcome))
}

/// GET /api/summary
///
/// Everything the checklist needs in one response: chores per child
/// with their done-state and reward, fractions, and the week key.
async fn get_summary(
    State(state): State<ChoreRouteState>,
    headers: HeaderMap,
) -> Result<Json<SummaryResponse>, Error> {
    let now = Local::now().naive_local();
    require_household(&state, &headers, now).await?;

    let chores = state.db.get_active_chores().await?;
    let checkoffs = state
        .db
        .get_checkoffs_in_range(calendar::start_of_week(now), calendar::end_of_week(now))
        .await?;

    let owners: Vec<String> = state
        .config
        .children
        .iter()
        .map(|c| c.slug.clone())
        .collect();
    let scores = scoring::score_children(&chores, &checkoffs, &owners, now);
    let done = scoring::done_sets(&chores, &checkoffs, now);

    let mut children = Vec::new();
    for child in &state.config.children {
        let score = scores.get(&child.slug).copied().unwrap_or(ChildScore {
            day_fraction: 0.0,
            week_fraction: 0.0,
        });

        let mut entries = Vec::new();
        for chore in chores.iter().filter(|c| c.owner == child.slug) {
            let is_done = match chore.kind {
                ChoreKind::Daily => done.today.contains(&chore.id),
                ChoreKind::Weekly => done.week.contains(&chore.id),
            };
            let reward = if is_done {
                state
                    .rewards
                    .get(chore.id, &toggle::period_key(chore.kind, now))
                    .await
            } else {
                None
            };
            entries.push(ChoreEntry {
                chore: chore.clone(),
                done: is_done,
                reward,
            });
        }

        children.push(ChildSummary {
            slug: child.slug.clone(),
            display_name: child.display_name.clone(),
            day_fraction: score.day_fraction,
            week_fraction: score.week_fraction,
            chores: entries,
        });
    }

    Ok(Json(SummaryResponse {
        week_key: calendar::week_key(now),
        children,
    }))
}

/// GET /api/progress
///
/// The current week plus the trailing history, all scored against the
/// current chore set.
async fn get_progress(
    State(state): State<ChoreRouteState>,
    headers: HeaderMap,
) -> Result<Json<ProgressResponse>, Error> {
    let now = Local::now().naive_local();
    require_household(&state, &headers, now).await?;

    let chores = state.db.get_active_chores().await?;
    let windows = calendar::past_week_windows(now, calendar::HISTORY_WEEKS);
    let from = windows
        .last()
        .map(|w| w.0)
        .unwrap_or_else(|| calendar::start_of_week(now));

    let ids: Vec<Uuid> = chores.iter().map(|c| c.id).collect();
    let checkoffs = state
        .db
        .get_checkoffs_for_chores(&ids, from, calendar::end_of_week(now))
        .await?;
    let settings = state.db.get_settings().await?.unwrap_or_default();

    let mut weeks = Vec::with_capacity(windows.len() + 1);
    weeks.push(build_week(
        &state.config.children,
        &chores,
        &checkoffs,
        now,
        true,
        &settings,
    ));
    for (_, end) in windows {
        weeks.push(build_week(
            &state.config.children,
            &chores,
            &checkoffs,
            end,
            false,
            &settings,
        ));
    }

    Ok(Json(ProgressResponse { settings, weeks }))
}

fn build_week(
    children: &[Child],
    chores: &[Chore],
    checkoffs: &[Checkoff],
    reference: NaiveDateTime,
    current: bool,
    settings: &Settings,
) -> WeekReport {
    let entries = children
        .iter()
        .map(|child| {
            let fraction = scoring::week_fraction(chores, checkoffs, &child.slug, reference);
            ChildWeek {
                slug: child.slug.clone(),
                display_name: child.display_name.clone(),
                fraction,
                badge: scoring::badge_for(fraction, settings),
            }
        })
        .collect();

    WeekReport {
        week_key: calendar::week_key(reference),
        start: calendar::start_of_week(reference),
        end: calendar::end_of_week(reference),
        current,
        children: entries,
    }
}

/// GET /api/settings
async fn get_settings(
    State(state): State<ChoreRouteState>,
    headers: HeaderMap,
) -> Result<Json<Settings>, Error> {
    let now = Local::now().naive_local();
    require_parent(&state, &headers, now).await?;

    Ok(Json(state.db.get_settings().await?.unwrap_or_default()))
}

/// PUT /api/settings
async fn put_settings(
    State(state): State<ChoreRouteState>,
    headers: HeaderMap,
    Json(body): Json<Settings>,
) -> Result<Json<Settings>, Error> {
    let now = Local::now().naive_local();
    require_parent(&state, &headers, now).await?;

    validate_thresholds(&body)?;
    state.db.save_settings(&body).await?;
    Ok(Json(body))
}

/// Build the chore REST routes.
pub fn chore_routes(state: ChoreRouteState) -> Router {
    Router::new()
        .route("/health", get(health))
        .route("/api/chores", get(list_chores).post(create_chore))
        .route("/api/chores/reorder", post(reorder_chores))
        .route(
            "/api/chores/{id}",
            patch(patch_chore).delete(delete_chore),
        )
        .route("/api/chores/{id}/toggle", post(toggle_chore))
        .route("/api/summary", get(get_summary))
        .route("/api/progress", get(get_progress))
        .route("/api/settings", get(get_settings).put(put_settings))
        .with_state(state)
}
