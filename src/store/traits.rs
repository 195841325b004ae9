//! Backend-agnostic `Database` trait — single async interface for all
//! persistence. One concrete implementation is selected at process start
//! and shared as `Arc<dyn Database>`.

use async_trait::async_trait;
use chrono::NaiveDateTime;
use uuid::Uuid;

use crate::chores::model::{Checkoff, Chore, ChoreKind, ChoreUpdate, DayPart, Settings};
use crate::error::DatabaseError;

/// Database trait covering chores, checkoffs, and settings.
///
/// Range arguments are inclusive on both ends, matching the period windows
/// from `calendar` (`[midnight, 23:59:59.999]`).
#[async_trait]
pub trait Database: Send + Sync {
    /// Run all pending schema migrations.
    async fn run_migrations(&self) -> Result<(), DatabaseError>;

    // ── Chores ──────────────────────────────────────────────────────

    /// All active chores, ordered by position (insertion order breaks ties).
    async fn get_active_chores(&self) -> Result<Vec<Chore>, DatabaseError>;

    /// Fetch one chore by id, active or not.
    async fn get_chore(&self, id: Uuid) -> Result<Option<Chore>, DatabaseError>;

    /// Insert a new chore.
    async fn add_chore(&self, chore: &Chore) -> Result<(), DatabaseError>;

    /// Apply a partial update and return the updated chore.
    async fn update_chore(&self, id: Uuid, update: &ChoreUpdate) -> Result<Chore, DatabaseError>;

    /// Flip a chore's `active` flag to false. Checkoff history stays.
    async fn soft_delete_chore(&self, id: Uuid) -> Result<(), DatabaseError>;

    /// Highest position in the (owner, kind, day_part) group, or 0 if empty.
    async fn max_position(
        &self,
        owner: &str,
        kind: ChoreKind,
        day_part: Option<DayPart>,
    ) -> Result<i64, DatabaseError>;

    // ── Settings ────────────────────────────────────────────────────

    /// The singleton settings row, if one was ever saved.
    async fn get_settings(&self) -> Result<Option<Settings>, DatabaseError>;

    /// Overwrite the singleton settings row.
    async fn save_settings(&self, settings: &Settings) -> Result<(), DatabaseError>;

    // ── Checkoffs ───────────────────────────────────────────────────

    /// All checkoffs with `done_at` in `[from, to]`.
    async fn get_checkoffs_in_range(
        &self,
        from: NaiveDateTime,
        to: NaiveDateTime,
    ) -> Result<Vec<Checkoff>, DatabaseError>;

    /// Checkoffs for the given chores with `done_at` in `[from, to]`.
    async fn get_checkoffs_for_chores(
        &self,
        chore_ids: &[Uuid],
        from: NaiveDateTime,
        to: NaiveDateTime,
    ) -> Result<Vec<Checkoff>, DatabaseError>;

    /// First checkoff for a chore with `done_at` in `[from, to]`, if any.
    async fn find_checkoff_in_range(
        &self,
        chore_id: Uuid,
        from: NaiveDateTime,
        to: NaiveDateTime,
    ) -> Result<Option<Checkoff>, DatabaseError>;

    /// Insert a new checkoff.
    async fn insert_checkoff(&self, checkoff: &Checkoff) -> Result<(), DatabaseError>;

    /// Delete a checkoff by id.
    async fn delete_checkoff(&self, id: Uuid) -> Result<(), DatabaseError>;
}
