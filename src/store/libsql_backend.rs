//! libSQL backend — async `Database` trait implementation.
//!
//! One backend covers all three data modes: a remote Turso database, a
//! local file, or in-memory for tests.

use std::path::Path;
use std::sync::Arc;

use async_trait::async_trait;
use chrono::NaiveDateTime;
use libsql::{Connection, Database as LibSqlDatabase, params};
use tracing::{debug, info, warn};
use uuid::Uuid;

use crate::chores::model::{Checkoff, Chore, ChoreKind, ChoreUpdate, DayPart, Settings};
use crate::error::DatabaseError;
use crate::store::migrations;
use crate::store::traits::Database;

/// libSQL database backend.
///
/// Stores a single connection that is reused for all operations.
/// `libsql::Connection` is `Send + Sync` and safe for concurrent async use.
pub struct LibSqlBackend {
    #[allow(dead_code)]
    db: Arc<LibSqlDatabase>,
    conn: Connection,
}

impl LibSqlBackend {
    /// Connect to a remote (Turso) database.
    pub async fn new_remote(url: &str, auth_token: &str) -> Result<Self, DatabaseError> {
        let db = libsql::Builder::new_remote(url.to_string(), auth_token.to_string())
            .build()
            .await
            .map_err(|e| {
                DatabaseError::Connection(format!("Failed to open remote database: {e}"))
            })?;

        let conn = db
            .connect()
            .map_err(|e| DatabaseError::Connection(format!("Failed to create connection: {e}")))?;

        info!(url = %url, "Remote database opened");
        Ok(Self {
            db: Arc::new(db),
            conn,
        })
    }

    /// Open (or create) a local database file.
    pub async fn new_local(path: &Path) -> Result<Self, DatabaseError> {
        if let Some(parent) = path.parent() {
            if !parent.as_os_str().is_empty() {
                std::fs::create_dir_all(parent).map_err(|e| {
                    DatabaseError::Connection(format!("Failed to create database directory: {e}"))
                })?;
            }
        }

        let db = libsql::Builder::new_local(path)
            .build()
            .await
            .map_err(|e| DatabaseError::Connection(format!("Failed to open database: {e}")))?;

        let conn = db
            .connect()
            .map_err(|e| DatabaseError::Connection(format!("Failed to create connection: {e}")))?;

        info!(path = %path.display(), "Database opened");
        Ok(Self {
            db: Arc::new(db),
            conn,
        })
    }

    /// Create an in-memory database (for tests).
    pub async fn new_memory() -> Result<Self, DatabaseError> {
        let db = libsql::Builder::new_local(":memory:")
            .build()
            .await
            .map_err(|e| {
                DatabaseError::Connection(format!("Failed to create in-memory database: {e}"))
            })?;

        let conn = db
            .connect()
            .map_err(|e| DatabaseError::Connection(format!("Failed to create connection: {e}")))?;

        Ok(Self {
            db: Arc::new(db),
            conn,
        })
    }

    /// Get the connection.
    fn conn(&self) -> &Connection {
        &self.conn
    }
}

// ── Helper functions ────────────────────────────────────────────────

/// Format a timestamp for storage.
///
/// Millisecond precision, no timezone suffix. This format sorts
/// lexicographically, which the `done_at` range queries rely on.
fn fmt_datetime(dt: NaiveDateTime) -> String {
    dt.format("%Y-%m-%dT%H:%M:%S%.3f").to_string()
}

/// Parse a stored datetime string.
fn parse_datetime(s: &str) -> NaiveDateTime {
    // Our canonical write format, with or without fractional seconds
    if let Ok(dt) = NaiveDateTime::parse_from_str(s, "%Y-%m-%dT%H:%M:%S%.f") {
        return dt;
    }
    // SQLite datetime() output
    if let Ok(dt) = NaiveDateTime::parse_from_str(s, "%Y-%m-%d %H:%M:%S%.f") {
        return dt;
    }
    NaiveDateTime::MIN
}

/// Convert a ChoreKind to its DB string.
fn kind_to_str(kind: ChoreKind) -> &'static str {
    match kind {
        ChoreKind::Daily => "daily",
        ChoreKind::Weekly => "weekly",
    }
}

/// Parse a kind string from the DB.
fn str_to_kind(s: &str) -> ChoreKind {
    match s {
        "weekly" => ChoreKind::Weekly,
        _ => ChoreKind::Daily,
    }
}

fn day_part_to_str(part: DayPart) -> &'static str {
    match part {
        DayPart::Morning => "morning",
        DayPart::Evening => "evening",
    }
}

fn str_to_day_part(s: &str) -> Option<DayPart> {
    match s {
        "morning" => Some(DayPart::Morning),
        "evening" => Some(DayPart::Evening),
        _ => None,
    }
}

/// Convert `Option<&str>` to libsql Value.
fn opt_text(s: Option<&str>) -> libsql::Value {
    match s {
        Some(s) => libsql::Value::Text(s.to_string()),
        None => libsql::Value::Null,
    }
}

const CHORE_COLUMNS: &str = "id, title, kind, owner, active, position, created_at, day_part";
const CHECKOFF_COLUMNS: &str = "id, chore_id, done_at";

/// Map a libsql Row to a Chore.
///
/// Column order matches CHORE_COLUMNS:
/// 0:id, 1:title, 2:kind, 3:owner, 4:active, 5:position, 6:created_at, 7:day_part
fn row_to_chore(row: &libsql::Row) -> Result<Chore, DatabaseError> {
    let id_str: String = row
        .get(0)
        .map_err(|e| DatabaseError::Query(format!("chore.id: {e}")))?;
    let id =
        Uuid::parse_str(&id_str).map_err(|e| DatabaseError::Query(format!("chore.id parse: {e}")))?;

    let title: String = row
        .get(1)
        .map_err(|e| DatabaseError::Query(format!("chore.title: {e}")))?;
    let kind_str: String = row
        .get(2)
        .map_err(|e| DatabaseError::Query(format!("chore.kind: {e}")))?;
    let owner: String = row
        .get(3)
        .map_err(|e| DatabaseError::Query(format!("chore.owner: {e}")))?;
    let created_str: String = row
        .get(6)
        .map_err(|e| DatabaseError::Query(format!("chore.created_at: {e}")))?;
    let day_part_str: Option<String> = row.get(7).ok();

    Ok(Chore {
        id,
        title,
        kind: str_to_kind(&kind_str),
        owner,
        day_part: day_part_str.as_deref().and_then(str_to_day_part),
        active: row.get::<i64>(4).unwrap_or(0) != 0,
        position: row.get(5).unwrap_or(0),
        created_at: parse_datetime(&created_str),
    })
}

/// Map a libsql Row to a Checkoff.
///
/// Column order matches CHECKOFF_COLUMNS: 0:id, 1:chore_id, 2:done_at
fn row_to_checkoff(row: &libsql::Row) -> Result<Checkoff, DatabaseError> {
    let id_str: String = row
        .get(0)
        .map_err(|e| DatabaseError::Query(format!("checkoff.id: {e}")))?;
    let id = Uuid::parse_str(&id_str)
        .map_err(|e| DatabaseError::Query(format!("checkoff.id parse: {e}")))?;

    let chore_id_str: String = row
        .get(1)
        .map_err(|e| DatabaseError::Query(format!("checkoff.chore_id: {e}")))?;
    let chore_id = Uuid::parse_str(&chore_id_str)
        .map_err(|e| DatabaseError::Query(format!("checkoff.chore_id parse: {e}")))?;

    let done_str: String = row
        .get(2)
        .map_err(|e| DatabaseError::Query(format!("checkoff.done_at: {e}")))?;

    Ok(Checkoff {
        id,
        chore_id,
        done_at: parse_datetime(&done_str),
    })
}

// ── Database trait implementation ───────────────────────────────────

#[async_trait]
impl Database for LibSqlBackend {
    async fn run_migrations(&self) -> Result<(), DatabaseError> {
        migrations::run_migrations(self.conn()).await
    }

    // ── Chores ──────────────────────────────────────────────────────

    async fn get_active_chores(&self) -> Result<Vec<Chore>, DatabaseError> {
        let sql = format!(
            "SELECT {CHORE_COLUMNS} FROM chores WHERE active = 1 ORDER BY position, created_at"
        );
        let mut rows = self
            .conn()
            .query(&sql, ())
            .await
            .map_err(|e| DatabaseError::Query(format!("get_active_chores: {e}")))?;

        let mut chores = Vec::new();
        while let Ok(Some(row)) = rows.next().await {
            match row_to_chore(&row) {
                Ok(chore) => chores.push(chore),
                Err(e) => warn!("Skipping malformed chore row: {e}"),
            }
        }
        Ok(chores)
    }

    async fn get_chore(&self, id: Uuid) -> Result<Option<Chore>, DatabaseError> {
        let sql = format!("SELECT {CHORE_COLUMNS} FROM chores WHERE id = ?1 LIMIT 1");
        let mut rows = self
            .conn()
            .query(&sql, params![id.to_string()])
            .await
            .map_err(|e| DatabaseError::Query(format!("get_chore: {e}")))?;

        match rows.next().await {
            Ok(Some(row)) => Ok(Some(row_to_chore(&row)?)),
            _ => Ok(None),
        }
    }

    async fn add_chore(&self, chore: &Chore) -> Result<(), DatabaseError> {
        self.conn()
            .execute(
                "INSERT INTO chores (id, title, kind, owner, active, position, created_at, day_part)
                 VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8)",
                params![
                    chore.id.to_string(),
                    chore.title.as_str(),
                    kind_to_str(chore.kind),
                    chore.owner.as_str(),
                    chore.active as i64,
                    chore.position,
                    fmt_datetime(chore.created_at),
                    opt_text(chore.day_part.map(day_part_to_str)),
                ],
            )
            .await
            .map_err(|e| DatabaseError::Query(format!("add_chore: {e}")))?;

        debug!(id = %chore.id, title = %chore.title, "Added chore");
        Ok(())
    }

    async fn update_chore(&self, id: Uuid, update: &ChoreUpdate) -> Result<Chore, DatabaseError> {
        if update.is_empty() {
            return self
                .get_chore(id)
                .await?
                .ok_or_else(|| DatabaseError::NotFound {
                    entity: "chore".to_string(),
                    id: id.to_string(),
                });
        }

        let mut sets: Vec<String> = Vec::new();
        let mut values: Vec<libsql::Value> = Vec::new();

        if let Some(title) = &update.title {
            values.push(libsql::Value::Text(title.clone()));
            sets.push(format!("title = ?{}", values.len()));
        }
        if let Some(position) = update.position {
            values.push(libsql::Value::Integer(position));
            sets.push(format!("position = ?{}", values.len()));
        }
        if let Some(day_part) = update.day_part {
            values.push(opt_text(day_part.map(day_part_to_str)));
            sets.push(format!("day_part = ?{}", values.len()));
        }

        values.push(libsql::Value::Text(id.to_string()));
        let sql = format!(
            "UPDATE chores SET {} WHERE id = ?{}",
            sets.join(", "),
            values.len()
        );

        let affected = self
            .conn()
            .execute(&sql, values)
            .await
            .map_err(|e| DatabaseError::Query(format!("update_chore: {e}")))?;

        if affected == 0 {
            return Err(DatabaseError::NotFound {
                entity: "chore".to_string(),
                id: id.to_string(),
            });
        }

        debug!(id = %id, "Updated chore");
        self.get_chore(id)
            .await?
            .ok_or_else(|| DatabaseError::NotFound {
                entity: "chore".to_string(),
                id: id.to_string(),
            })
    }

    async fn soft_delete_chore(&self, id: Uuid) -> Result<(), DatabaseError> {
        let affected = self
            .conn()
            .execute(
                "UPDATE chores SET active = 0 WHERE id = ?1",
                params![id.to_string()],
            )
            .await
            .map_err(|e| DatabaseError::Query(format!("soft_delete_chore: {e}")))?;

        if affected == 0 {
            return Err(DatabaseError::NotFound {
                entity: "chore".to_string(),
                id: id.to_string(),
            });
        }

        debug!(id = %id, "Soft-deleted chore");
        Ok(())
    }

    async fn max_position(
        &self,
        owner: &str,
        kind: ChoreKind,
        day_part: Option<DayPart>,
    ) -> Result<i64, DatabaseError> {
        // `IS` instead of `=` so a NULL day_part matches the NULL group
        let mut rows = self
            .conn()
            .query(
                "SELECT COALESCE(MAX(position), 0) FROM chores
                 WHERE active = 1 AND owner = ?1 AND kind = ?2 AND day_part IS ?3",
                params![
                    owner,
                    kind_to_str(kind),
                    opt_text(day_part.map(day_part_to_str))
                ],
            )
            .await
            .map_err(|e| DatabaseError::Query(format!("max_position: {e}")))?;

        match rows.next().await {
            Ok(Some(row)) => {
                let max: i64 = row
                    .get(0)
                    .map_err(|e| DatabaseError::Query(format!("max_position: {e}")))?;
                Ok(max)
            }
            _ => Ok(0),
        }
    }

    // ── Settings ────────────────────────────────────────────────────

    async fn get_settings(&self) -> Result<Option<Settings>, DatabaseError> {
        let mut rows = self
            .conn()
            .query(
                "SELECT trophy_threshold, apple_threshold FROM settings WHERE id = 1",
                (),
            )
            .await
            .map_err(|e| DatabaseError::Query(format!("get_settings: {e}")))?;

        match rows.next().await {
            Ok(Some(row)) => {
                let trophy_threshold: f64 = row
                    .get(0)
                    .map_err(|e| DatabaseError::Query(format!("settings.trophy: {e}")))?;
                let apple_threshold: f64 = row
                    .get(1)
                    .map_err(|e| DatabaseError::Query(format!("settings.apple: {e}")))?;
                Ok(Some(Settings {
                    trophy_threshold,
                    apple_threshold,
                }))
            }
            _ => Ok(None),
        }
    }

    async fn save_settings(&self, settings: &Settings) -> Result<(), DatabaseError> {
        self.conn()
            .execute(
                "INSERT INTO settings (id, trophy_threshold, apple_threshold, updated_at)
                 VALUES (1, ?1, ?2, datetime('now'))
                 ON CONFLICT(id) DO UPDATE SET
                     trophy_threshold = excluded.trophy_threshold,
                     apple_threshold = excluded.apple_threshold,
                     updated_at = excluded.updated_at",
                params![settings.trophy_threshold, settings.apple_threshold],
            )
            .await
            .map_err(|e| DatabaseError::Query(format!("save_settings: {e}")))?;

        debug!(
            trophy = settings.trophy_threshold,
            apple = settings.apple_threshold,
            "Saved settings"
        );
        Ok(())
    }

    // ── Checkoffs ───────────────────────────────────────────────────

    async fn get_checkoffs_in_range(
        &self,
        from: NaiveDateTime,
        to: NaiveDateTime,
    ) -> Result<Vec<Checkoff>, DatabaseError> {
        let sql = format!(
            "SELECT {CHECKOFF_COLUMNS} FROM checkoffs
             WHERE done_at >= ?1 AND done_at <= ?2 ORDER BY done_at"
        );
        let mut rows = self
            .conn()
            .query(&sql, params![fmt_datetime(from), fmt_datetime(to)])
            .await
            .map_err(|e| DatabaseError::Query(format!("get_checkoffs_in_range: {e}")))?;

        let mut checkoffs = Vec::new();
        while let Ok(Some(row)) = rows.next().await {
            match row_to_checkoff(&row) {
                Ok(checkoff) => checkoffs.push(checkoff),
                Err(e) => warn!("Skipping malformed checkoff row: {e}"),
            }
        }
        Ok(checkoffs)
    }

    async fn get_checkoffs_for_chores(
        &self,
        chore_ids: &[Uuid],
        from: NaiveDateTime,
        to: NaiveDateTime,
    ) -> Result<Vec<Checkoff>, DatabaseError> {
        if chore_ids.is_empty() {
            return Ok(Vec::new());
        }

        let mut values: Vec<libsql::Value> = chore_ids
            .iter()
            .map(|id| libsql::Value::Text(id.to_string()))
            .collect();
        let placeholders: Vec<String> = (1..=chore_ids.len()).map(|i| format!("?{i}")).collect();

        values.push(libsql::Value::Text(fmt_datetime(from)));
        values.push(libsql::Value::Text(fmt_datetime(to)));

        let sql = format!(
            "SELECT {CHECKOFF_COLUMNS} FROM checkoffs
             WHERE chore_id IN ({}) AND done_at >= ?{} AND done_at <= ?{}
             ORDER BY done_at",
            placeholders.join(", "),
            chore_ids.len() + 1,
            chore_ids.len() + 2
        );

        let mut rows = self
            .conn()
            .query(&sql, values)
            .await
            .map_err(|e| DatabaseError::Query(format!("get_checkoffs_for_chores: {e}")))?;

        let mut checkoffs = Vec::new();
        while let Ok(Some(row)) = rows.next().await {
            match row_to_checkoff(&row) {
                Ok(checkoff) => checkoffs.push(checkoff),
                Err(e) => warn!("Skipping malformed checkoff row: {e}"),
            }
        }
        Ok(checkoffs)
    }

    async fn find_checkoff_in_range(
        &self,
        chore_id: Uuid,
        from: NaiveDateTime,
        to: NaiveDateTime,
    ) -> Result<Option<Checkoff>, DatabaseError> {
        let sql = format!(
            "SELECT {CHECKOFF_COLUMNS} FROM checkoffs
             WHERE chore_id = ?1 AND done_at >= ?2 AND done_at <= ?3
             ORDER BY done_at LIMIT 1"
        );
        let mut rows = self
            .conn()
            .query(
                &sql,
                params![chore_id.to_string(), fmt_datetime(from), fmt_datetime(to)],
            )
            .await
            .map_err(|e| DatabaseError::Query(format!("find_checkoff_in_range: {e}")))?;

        match rows.next().await {
            Ok(Some(row)) => Ok(Some(row_to_checkoff(&row)?)),
            _ => Ok(None),
        }
    }

    async fn insert_checkoff(&self, checkoff: &Checkoff) -> Result<(), DatabaseError> {
        self.conn()
            .execute(
                "INSERT INTO checkoffs (id, chore_id, done_at) VALUES (?1, ?2, ?3)",
                params![
                    checkoff.id.to_string(),
                    checkoff.chore_id.to_string(),
                    fmt_datetime(checkoff.done_at),
                ],
            )
            .await
            .map_err(|e| DatabaseError::Query(format!("insert_checkoff: {e}")))?;

        debug!(id = %checkoff.id, chore_id = %checkoff.chore_id, "Inserted checkoff");
        Ok(())
    }

    async fn delete_checkoff(&self, id: Uuid) -> Result<(), DatabaseError> {
        let affected = self
            .conn()
            .execute(
                "DELETE FROM checkoffs WHERE id = ?1",
                params![id.to_string()],
            )
            .await
            .map_err(|e| DatabaseError::Query(format!("delete_checkoff: {e}")))?;

        if affected == 0 {
            return Err(DatabaseError::NotFound {
                entity: "checkoff".to_string(),
                id: id.to_string(),
            });
        }

        debug!(id = %id, "Deleted checkoff");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;

    async fn test_backend() -> LibSqlBackend {
        let backend = LibSqlBackend::new_memory().await.unwrap();
        backend.run_migrations().await.unwrap();
        backend
    }

    fn at(y: i32, m: u32, d: u32, h: u32, min: u32) -> NaiveDateTime {
        NaiveDate::from_ymd_opt(y, m, d)
            .unwrap()
            .and_hms_opt(h, min, 0)
            .unwrap()
    }

    #[tokio::test]
    async fn add_and_fetch_chore_round_trip() {
        let backend = test_backend().await;

        let chore = Chore::new("Make bed", ChoreKind::Daily, "astrid")
            .with_position(3)
            .with_day_part(DayPart::Morning);
        backend.add_chore(&chore).await.unwrap();

        let fetched = backend.get_chore(chore.id).await.unwrap().unwrap();
        assert_eq!(fetched.id, chore.id);
        assert_eq!(fetched.title, "Make bed");
        assert_eq!(fetched.kind, ChoreKind::Daily);
        assert_eq!(fetched.owner, "astrid");
        assert_eq!(fetched.day_part, Some(DayPart::Morning));
        assert_eq!(fetched.position, 3);
        assert!(fetched.active);
    }

    #[tokio::test]
    async fn get_chore_missing_returns_none() {
        let backend = test_backend().await;
        let found = backend.get_chore(Uuid::new_v4()).await.unwrap();
        assert!(found.is_none());
    }

    #[tokio::test]
    async fn local_open_creates_directory_and_persists() {
        let tmp = tempfile::tempdir().unwrap();
        let db_path = tmp.path().join("nested").join("choreboard.db");

        let backend = LibSqlBackend::new_local(&db_path).await.unwrap();
        backend.run_migrations().await.unwrap();

        let chore = Chore::new("Make bed", ChoreKind::Daily, "astrid");
        backend.add_chore(&chore).await.unwrap();
        assert!(db_path.exists());
        drop(backend);

        let reopened = LibSqlBackend::new_local(&db_path).await.unwrap();
        let found = reopened.get_chore(chore.id).await.unwrap().unwrap();
        assert_eq!(found.title, "Make bed");
    }

    #[tokio::test]
    async fn active_chores_ordered_by_position() {
        let backend = test_backend().await;

        let second = Chore::new("Feed cat", ChoreKind::Daily, "emilia").with_position(2);
        let first = Chore::new("Make bed", ChoreKind::Daily, "emilia").with_position(1);
        backend.add_chore(&second).await.unwrap();
        backend.add_chore(&first).await.unwrap();

        let chores = backend.get_active_chores().await.unwrap();
        assert_eq!(chores.len(), 2);
        assert_eq!(chores[0].title, "Make bed");
        assert_eq!(chores[1].title, "Feed cat");
    }

    #[tokio::test]
    async fn soft_delete_hides_chore_but_keeps_checkoffs() {
        let backend = test_backend().await;

        let chore = Chore::new("Water plants", ChoreKind::Weekly, "astrid");
        backend.add_chore(&chore).await.unwrap();

        let done_at = at(2025, 8, 20, 16, 30);
        backend
            .insert_checkoff(&Checkoff::new(chore.id, done_at))
            .await
            .unwrap();

        backend.soft_delete_chore(chore.id).await.unwrap();

        let active = backend.get_active_chores().await.unwrap();
        assert!(active.is_empty());

        // History survives the delete
        let checkoffs = backend
            .get_checkoffs_in_range(at(2025, 8, 18, 0, 0), at(2025, 8, 24, 23, 59))
            .await
            .unwrap();
        assert_eq!(checkoffs.len(), 1);
        assert_eq!(checkoffs[0].chore_id, chore.id);
    }

    #[tokio::test]
    async fn update_chore_changes_only_given_fields() {
        let backend = test_backend().await;

        let chore = Chore::new("Brush teeth", ChoreKind::Daily, "emilia")
            .with_position(5)
            .with_day_part(DayPart::Evening);
        backend.add_chore(&chore).await.unwrap();

        let update = ChoreUpdate {
            title: Some("Brush teeth well".to_string()),
            position: None,
            day_part: None,
        };
        let updated = backend.update_chore(chore.id, &update).await.unwrap();

        assert_eq!(updated.title, "Brush teeth well");
        assert_eq!(updated.position, 5);
        assert_eq!(updated.day_part, Some(DayPart::Evening));
    }

    #[tokio::test]
    async fn update_chore_can_clear_day_part() {
        let backend = test_backend().await;

        let chore =
            Chore::new("Tidy room", ChoreKind::Daily, "astrid").with_day_part(DayPart::Morning);
        backend.add_chore(&chore).await.unwrap();

        let update = ChoreUpdate {
            title: None,
            position: None,
            day_part: Some(None),
        };
        let updated = backend.update_chore(chore.id, &update).await.unwrap();
        assert_eq!(updated.day_part, None);
    }

    #[tokio::test]
    async fn update_missing_chore_is_not_found() {
        let backend = test_backend().await;

        let update = ChoreUpdate {
            title: Some("Anything".to_string()),
            position: None,
            day_part: None,
        };
        let err = backend
            .update_chore(Uuid::new_v4(), &update)
            .await
            .unwrap_err();
        assert!(matches!(err, DatabaseError::NotFound { .. }));
    }

    #[tokio::test]
    async fn empty_update_returns_current_chore() {
        let backend = test_backend().await;

        let chore = Chore::new("Set table", ChoreKind::Daily, "emilia");
        backend.add_chore(&chore).await.unwrap();

        let update = ChoreUpdate {
            title: None,
            position: None,
            day_part: None,
        };
        let unchanged = backend.update_chore(chore.id, &update).await.unwrap();
        assert_eq!(unchanged.title, "Set table");
    }

    #[tokio::test]
    async fn max_position_scoped_to_owner_kind_and_day_part() {
        let backend = test_backend().await;

        backend
            .add_chore(
                &Chore::new("Make bed", ChoreKind::Daily, "astrid")
                    .with_position(4)
                    .with_day_part(DayPart::Morning),
            )
            .await
            .unwrap();
        backend
            .add_chore(
                &Chore::new("Read book", ChoreKind::Daily, "astrid")
                    .with_position(9)
                    .with_day_part(DayPart::Evening),
            )
            .await
            .unwrap();
        backend
            .add_chore(&Chore::new("Vacuum", ChoreKind::Weekly, "astrid").with_position(7))
            .await
            .unwrap();

        let morning = backend
            .max_position("astrid", ChoreKind::Daily, Some(DayPart::Morning))
            .await
            .unwrap();
        assert_eq!(morning, 4);

        let weekly = backend
            .max_position("astrid", ChoreKind::Weekly, None)
            .await
            .unwrap();
        assert_eq!(weekly, 7);

        // Empty group
        let emilia = backend
            .max_position("emilia", ChoreKind::Daily, None)
            .await
            .unwrap();
        assert_eq!(emilia, 0);
    }

    #[tokio::test]
    async fn settings_upsert_round_trip() {
        let backend = test_backend().await;

        assert!(backend.get_settings().await.unwrap().is_none());

        backend
            .save_settings(&Settings {
                trophy_threshold: 0.95,
                apple_threshold: 0.85,
            })
            .await
            .unwrap();
        let saved = backend.get_settings().await.unwrap().unwrap();
        assert_eq!(saved.trophy_threshold, 0.95);

        // Second save overwrites the singleton row
        backend
            .save_settings(&Settings {
                trophy_threshold: 0.9,
                apple_threshold: 0.8,
            })
            .await
            .unwrap();
        let resaved = backend.get_settings().await.unwrap().unwrap();
        assert_eq!(resaved.trophy_threshold, 0.9);
        assert_eq!(resaved.apple_threshold, 0.8);
    }

    #[tokio::test]
    async fn checkoff_range_is_inclusive() {
        let backend = test_backend().await;

        let chore = Chore::new("Feed cat", ChoreKind::Daily, "astrid");
        backend.add_chore(&chore).await.unwrap();

        let from = at(2025, 8, 18, 0, 0);
        let to = at(2025, 8, 19, 0, 0);
        backend
            .insert_checkoff(&Checkoff::new(chore.id, from))
            .await
            .unwrap();
        backend
            .insert_checkoff(&Checkoff::new(chore.id, to))
            .await
            .unwrap();
        backend
            .insert_checkoff(&Checkoff::new(chore.id, at(2025, 8, 19, 0, 1)))
            .await
            .unwrap();

        let in_range = backend.get_checkoffs_in_range(from, to).await.unwrap();
        assert_eq!(in_range.len(), 2);
    }

    #[tokio::test]
    async fn find_checkoff_returns_earliest_in_range() {
        let backend = test_backend().await;

        let chore = Chore::new("Do homework", ChoreKind::Daily, "emilia");
        backend.add_chore(&chore).await.unwrap();

        backend
            .insert_checkoff(&Checkoff::new(chore.id, at(2025, 8, 20, 18, 0)))
            .await
            .unwrap();
        backend
            .insert_checkoff(&Checkoff::new(chore.id, at(2025, 8, 20, 9, 0)))
            .await
            .unwrap();

        let found = backend
            .find_checkoff_in_range(chore.id, at(2025, 8, 20, 0, 0), at(2025, 8, 20, 23, 59))
            .await
            .unwrap()
            .unwrap();
        assert_eq!(found.done_at, at(2025, 8, 20, 9, 0));

        let missing = backend
            .find_checkoff_in_range(chore.id, at(2025, 8, 21, 0, 0), at(2025, 8, 21, 23, 59))
            .await
            .unwrap();
        assert!(missing.is_none());
    }

    #[tokio::test]
    async fn checkoffs_for_chores_filters_by_id() {
        let backend = test_backend().await;

        let mine = Chore::new("Make bed", ChoreKind::Daily, "astrid");
        let other = Chore::new("Feed cat", ChoreKind::Daily, "emilia");
        backend.add_chore(&mine).await.unwrap();
        backend.add_chore(&other).await.unwrap();

        backend
            .insert_checkoff(&Checkoff::new(mine.id, at(2025, 8, 20, 8, 0)))
            .await
            .unwrap();
        backend
            .insert_checkoff(&Checkoff::new(other.id, at(2025, 8, 20, 8, 5)))
            .await
            .unwrap();

        let from = at(2025, 8, 20, 0, 0);
        let to = at(2025, 8, 20, 23, 59);

        let only_mine = backend
            .get_checkoffs_for_chores(&[mine.id], from, to)
            .await
            .unwrap();
        assert_eq!(only_mine.len(), 1);
        assert_eq!(only_mine[0].chore_id, mine.id);

        let none = backend
            .get_checkoffs_for_chores(&[], from, to)
            .await
            .unwrap();
        assert!(none.is_empty());
    }

    #[tokio::test]
    async fn delete_checkoff_removes_row() {
        let backend = test_backend().await;

        let chore = Chore::new("Water plants", ChoreKind::Weekly, "astrid");
        backend.add_chore(&chore).await.unwrap();

        let checkoff = Checkoff::new(chore.id, at(2025, 8, 20, 10, 0));
        backend.insert_checkoff(&checkoff).await.unwrap();
        backend.delete_checkoff(checkoff.id).await.unwrap();

        let remaining = backend
            .get_checkoffs_in_range(at(2025, 8, 20, 0, 0), at(2025, 8, 20, 23, 59))
            .await
            .unwrap();
        assert!(remaining.is_empty());

        let err = backend.delete_checkoff(checkoff.id).await.unwrap_err();
        assert!(matches!(err, DatabaseError::NotFound { .. }));
    }
}
