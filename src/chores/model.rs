//! Chore data model — chores, checkoffs, and settings.

use chrono::{Local, NaiveDateTime};
use serde::{Deserialize, Deserializer, Serialize};
use uuid::Uuid;

/// How often a chore recurs.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ChoreKind {
    /// One checkoff per calendar day.
    Daily,
    /// One checkoff per Monday..Sunday week.
    Weekly,
}

impl std::fmt::Display for ChoreKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            Self::Daily => "daily",
            Self::Weekly => "weekly",
        };
        write!(f, "{s}")
    }
}

/// Optional subgroup for daily chores on the checklist.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DayPart {
    Morning,
    Evening,
}

impl std::fmt::Display for DayPart {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            Self::Morning => "morning",
            Self::Evening => "evening",
        };
        write!(f, "{s}")
    }
}

/// A recurring task assigned to one child.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Chore {
    /// Unique ID.
    pub id: Uuid,
    /// Display text.
    pub title: String,
    /// Daily or weekly cadence.
    #[serde(rename = "type")]
    pub kind: ChoreKind,
    /// Slug of the child this chore belongs to.
    pub owner: String,
    /// Morning/evening subgroup for daily chores.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub day_part: Option<DayPart>,
    /// Soft-delete flag. Inactive chores keep their checkoff history.
    pub active: bool,
    /// Ordering key within the chore's owner+kind(+day_part) group.
    /// Ties fall back to insertion order.
    pub position: i64,
    /// When the chore was created.
    pub created_at: NaiveDateTime,
}

impl Chore {
    /// Create a new active chore at position 0.
    pub fn new(title: impl Into<String>, kind: ChoreKind, owner: impl Into<String>) -> Self {
        Self {
            id: Uuid::new_v4(),
            title: title.into(),
            kind,
            owner: owner.into(),
            day_part: None,
            active: true,
            position: 0,
            created_at: Local::now().naive_local(),
        }
    }

    /// Builder: set the ordering position.
    pub fn with_position(mut self, position: i64) -> Self {
        self.position = position;
        self
    }

    /// Builder: set the day part.
    pub fn with_day_part(mut self, day_part: DayPart) -> Self {
        self.day_part = Some(day_part);
        self
    }
}

/// A timestamped completion record for one chore.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Checkoff {
    /// Unique ID.
    pub id: Uuid,
    /// The chore this checkoff completes.
    pub chore_id: Uuid,
    /// Local wall-clock time the chore was marked done.
    pub done_at: NaiveDateTime,
}

impl Checkoff {
    /// Create a new checkoff for a chore at the given instant.
    pub fn new(chore_id: Uuid, done_at: NaiveDateTime) -> Self {
        Self {
            id: Uuid::new_v4(),
            chore_id,
            done_at,
        }
    }
}

/// Badge thresholds for the progress report. Singleton record.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Settings {
    /// Fraction at or above which a week earns the trophy badge.
    pub trophy_threshold: f64,
    /// Fraction at or above which a week earns the apple badge.
    pub apple_threshold: f64,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            trophy_threshold: 0.95,
            apple_threshold: 0.85,
        }
    }
}

/// Partial update for a chore. `day_part` distinguishes "leave alone"
/// (field absent) from "clear" (field present and null).
#[derive(Debug, Clone, Default, Deserialize)]
pub struct ChoreUpdate {
    #[serde(default)]
    pub title: Option<String>,
    #[serde(default)]
    pub position: Option<i64>,
    #[serde(default, deserialize_with = "double_option")]
    pub day_part: Option<Option<DayPart>>,
}

impl ChoreUpdate {
    /// True when the update would change nothing.
    pub fn is_empty(&self) -> bool {
        self.title.is_none() && self.position.is_none() && self.day_part.is_none()
    }
}

/// Deserialize a field so that `null` becomes `Some(None)` while an absent
/// field stays `None` (via `#[serde(default)]`).
fn double_option<'de, T, D>(deserializer: D) -> Result<Option<Option<T>>, D::Error>
where
    T: Deserialize<'de>,
    D: Deserializer<'de>,
{
    Deserialize::deserialize(deserializer).map(Some)
}
