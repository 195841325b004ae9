//! Completion scoring — turns chores + checkoffs into per-child fractions.
//!
//! All functions are pure over slices and a reference instant, so live
//! summaries and historical weeks share one formula. A week is scored out of
//! `7 × #daily + 2 × #weekly` opportunities; daily chores earn one point per
//! distinct calendar day with a checkoff (capped at 7), weekly chores earn
//! two points for a single checkoff in the week. Checkoffs dated after the
//! reference instant never count toward the week.

use std::collections::{HashMap, HashSet};

use chrono::NaiveDateTime;
use serde::Serialize;
use uuid::Uuid;

use crate::calendar;
use crate::chores::model::{Checkoff, Chore, ChoreKind, Settings};

/// Completion fractions for one child at a reference instant.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct ChildScore {
    /// Fraction of today's daily chores done, in [0,1].
    pub day_fraction: f64,
    /// Weighted fraction of this week's opportunities done, in [0,1].
    pub week_fraction: f64,
}

/// Which chores are currently marked done, for the checklist UI.
#[derive(Debug, Clone, Default)]
pub struct DoneSets {
    /// Chores with a checkoff inside today's window.
    pub today: HashSet<Uuid>,
    /// Chores with a checkoff inside the current week's window.
    pub week: HashSet<Uuid>,
}

/// Badge earned by a week fraction, picked by threshold comparison.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(tag = "tier", rename_all = "snake_case")]
pub enum Badge {
    Trophy,
    Apple,
    Percent { percent: u32 },
}

/// Fraction of the child's daily chores with a checkoff inside the day
/// containing `reference`. Zero daily chores gives 0, never NaN.
pub fn day_fraction(
    chores: &[Chore],
    checkoffs: &[Checkoff],
    owner: &str,
    reference: NaiveDateTime,
) -> f64 {
    let day_start = calendar::start_of_day(reference);
    let day_end = calendar::end_of_day(reference);

    let daily: Vec<&Chore> = chores
        .iter()
        .filter(|c| c.owner == owner && c.kind == ChoreKind::Daily)
        .collect();
    if daily.is_empty() {
        return 0.0;
    }

    let done = daily
        .iter()
        .filter(|chore| {
            checkoffs
                .iter()
                .any(|r| r.chore_id == chore.id && r.done_at >= day_start && r.done_at <= day_end)
        })
        .count();

    done as f64 / daily.len() as f64
}

/// Weighted completion fraction for the week containing `reference`,
/// counting only checkoffs with `done_at` at or before `reference`.
///
/// For a fully elapsed week, pass the week's last instant as the reference
/// and the cutoff is vacuous.
pub fn week_fraction(
    chores: &[Chore],
    checkoffs: &[Checkoff],
    owner: &str,
    reference: NaiveDateTime,
) -> f64 {
    let week_start = calendar::start_of_week(reference);
    let week_end = calendar::end_of_week(reference);

    let mut daily = Vec::new();
    let mut weekly = Vec::new();
    for chore in chores.iter().filter(|c| c.owner == owner) {
        match chore.kind {
            ChoreKind::Daily => daily.push(chore),
            ChoreKind::Weekly => weekly.push(chore),
        }
    }

    let denominator = 7 * daily.len() + 2 * weekly.len();
    if denominator == 0 {
        return 0.0;
    }

    let in_week = |r: &&Checkoff| {
        r.done_at >= week_start && r.done_at <= week_end && r.done_at <= reference
    };

    let mut daily_numerator = 0usize;
    for chore in &daily {
        let days: HashSet<_> = checkoffs
            .iter()
            .filter(in_week)
            .filter(|r| r.chore_id == chore.id)
            .map(|r| r.done_at.date())
            .collect();
        daily_numerator += days.len().min(7);
    }

    let mut weekly_numerator = 0usize;
    for chore in &weekly {
        let any = checkoffs
            .iter()
            .filter(in_week)
            .any(|r| r.chore_id == chore.id);
        if any {
            weekly_numerator += 2;
        }
    }

    (daily_numerator + weekly_numerator) as f64 / denominator as f64
}

/// Day and week fractions for one child.
pub fn score_child(
    chores: &[Chore],
    checkoffs: &[Checkoff],
    owner: &str,
    reference: NaiveDateTime,
) -> ChildScore {
    ChildScore {
        day_fraction: day_fraction(chores, checkoffs, owner, reference),
        week_fraction: week_fraction(chores, checkoffs, owner, reference),
    }
}

/// Fractions for every listed child, keyed by slug.
pub fn score_children(
    chores: &[Chore],
    checkoffs: &[Checkoff],
    owners: &[String],
    reference: NaiveDateTime,
) -> HashMap<String, ChildScore> {
    owners
        .iter()
        .map(|owner| {
            (
                owner.clone(),
                score_child(chores, checkoffs, owner, reference),
            )
        })
        .collect()
}

/// Per-chore done state for today and for the current week.
pub fn done_sets(chores: &[Chore], checkoffs: &[Checkoff], reference: NaiveDateTime) -> DoneSets {
    let day_start = calendar::start_of_day(reference);
    let day_end = calendar::end_of_day(reference);
    let week_start = calendar::start_of_week(reference);
    let week_end = calendar::end_of_week(reference);

    let mut sets = DoneSets::default();
    for chore in chores {
        for r in checkoffs.iter().filter(|r| r.chore_id == chore.id) {
            if r.done_at >= day_start && r.done_at <= day_end {
                sets.today.insert(chore.id);
            }
            if r.done_at >= week_start && r.done_at <= week_end {
                sets.week.insert(chore.id);
            }
        }
    }
    sets
}

/// Pick the badge for a fraction. Thresholds are inclusive.
pub fn badge_for(fraction: f64, settings: &Settings) -> Badge {
    if fraction >= settings.trophy_threshold {
        Badge::Trophy
    } else if fraction >= settings.apple_threshold {
        Badge::Apple
    } else {
        Badge::Percent {
            percent: (fraction * 100.0).round() as u32,
        }
    }
}
