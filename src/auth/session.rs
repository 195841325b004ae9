//! Server-side sessions — in-memory store addressed by an opaque cookie.
//!
//! A session records whether the household password was entered, the
//! parent-access deadline, and the PIN gate state. Nothing about auth
//! is stored client-side beyond the random session id.

use std::collections::HashMap;
use std::sync::Arc;

use axum::http::{header, HeaderMap};
use chrono::{Duration, NaiveDateTime};
use tokio::sync::RwLock;
use tracing::{debug, info};

use crate::auth::gate::{self, GateOutcome, GateState};
use crate::calendar;
use crate::chores::rewards::RewardLedger;

/// Name of the session cookie.
pub const SESSION_COOKIE: &str = "hh_session";
/// Cookie lifetime issued at login: one year.
pub const SESSION_COOKIE_MAX_AGE: i64 = 60 * 60 * 24 * 365;
/// Sessions idle for longer than this are swept.
const SESSION_IDLE_SECONDS: i64 = 60 * 60 * 24 * 30;

/// Per-client session state.
#[derive(Debug, Clone)]
pub struct Session {
    /// Household password was entered on this session.
    pub household: bool,
    /// Parent access granted until this time, if at all.
    pub parent_until: Option<NaiveDateTime>,
    /// PIN gate state for this session.
    pub gate: GateState,
    pub created_at: NaiveDateTime,
    pub last_seen: NaiveDateTime,
}

impl Session {
    /// Whether this session currently has parent access.
    pub fn is_parent(&self, now: NaiveDateTime) -> bool {
        self.household && self.parent_until.is_some_and(|until| now < until)
    }
}

/// In-memory session store keyed by opaque random ids.
pub struct SessionStore {
    sessions: RwLock<HashMap<String, Session>>,
}

impl SessionStore {
    /// Create a new session store.
    pub fn new() -> Arc<Self> {
        Arc::new(Self {
            sessions: RwLock::new(HashMap::new()),
        })
    }

    /// Mint a fresh session and return its id.
    pub async fn create(&self, now: NaiveDateTime) -> String {
        let id: u128 = rand::random();
        let id = format!("{id:032x}");

        let mut sessions = self.sessions.write().await;
        sessions.insert(
            id.clone(),
            Session {
                household: false,
                parent_until: None,
                gate: GateState::Open,
                created_at: now,
                last_seen: now,
            },
        );
        debug!(count = sessions.len(), "Session created");
        id
    }

    /// Look up a session, refreshing its idle clock.
    pub async fn get(&self, id: &str, now: NaiveDateTime) -> Option<Session> {
        let mut sessions = self.sessions.write().await;
        let session = sessions.get_mut(id)?;
        session.last_seen = now;
        Some(session.clone())
    }

    /// Mark a session as household-authorized. Returns false if unknown.
    pub async fn mark_household(&self, id: &str) -> bool {
        let mut sessions = self.sessions.write().await;
        match sessions.get_mut(id) {
            Some(session) => {
                session.household = true;
                debug!("Session marked household");
                true
            }
            None => false,
        }
    }

    /// Run one PIN submission through the session's gate.
    ///
    /// The read-modify-write happens under the write lock, so two racing
    /// submissions cannot both consume the same attempt. A granted
    /// outcome also starts the parent-access window.
    pub async fn submit_pin(
        &self,
        id: &str,
        pin_matches: bool,
        now: NaiveDateTime,
    ) -> Option<GateOutcome> {
        let mut sessions = self.sessions.write().await;
        let session = sessions.get_mut(id)?;

        let (gate, outcome) = gate::submit(session.gate, pin_matches, now);
        session.gate = gate;
        session.last_seen = now;

        if outcome == GateOutcome::Granted {
            session.parent_until = Some(now + Duration::seconds(gate::PARENT_GRANT_SECONDS));
        }

        debug!(gate = %session.gate, "PIN submission processed");
        Some(outcome)
    }

    /// Drop sessions idle past their TTL. Returns the number removed.
    pub async fn prune_idle(&self, now: NaiveDateTime) -> usize {
        let cutoff = now - Duration::seconds(SESSION_IDLE_SECONDS);
        let mut sessions = self.sessions.write().await;
        let before = sessions.len();
        sessions.retain(|_, session| session.last_seen >= cutoff);
        let removed = before - sessions.len();
        if removed > 0 {
            info!(count = removed, "Pruned idle sessions");
        }
        removed
    }

    /// Number of live sessions.
    pub async fn len(&self) -> usize {
        self.sessions.read().await.len()
    }

    /// Check if the store is empty.
    pub async fn is_empty(&self) -> bool {
        self.sessions.read().await.is_empty()
    }
}

/// Extract the session id from a request's Cookie header.
pub fn session_id_from_headers(headers: &HeaderMap) -> Option<String> {
    let cookies = headers.get(header::COOKIE)?.to_str().ok()?;
    cookies.split(';').find_map(|pair| {
        let (name, value) = pair.trim().split_once('=')?;
        (name == SESSION_COOKIE).then(|| value.to_string())
    })
}

/// Build the Set-Cookie value for a session id.
pub fn session_set_cookie(id: &str) -> String {
    format!(
        "{SESSION_COOKIE}={id}; Path=/; HttpOnly; SameSite=Lax; Max-Age={SESSION_COOKIE_MAX_AGE}"
    )
}

/// Spawn a background task that sweeps idle sessions and stale rewards
/// every 60 seconds.
pub fn spawn_sweep_task(
    sessions: Arc<SessionStore>,
    rewards: Arc<RewardLedger>,
) -> tokio::task::JoinHandle<()> {
    tokio::spawn(async move {
        let mut interval = tokio::time::interval(tokio::time::Duration::from_secs(60));
        loop {
            interval.tick().await;
            let now = chrono::Local::now().naive_local();
            sessions.prune_idle(now).await;

            // Rewards outside the current day and week can never be
            // shown again
            let live = [calendar::day_key(now), calendar::week_key(now)];
            rewards.prune(&live).await;
        }
    })
}
