//! Parent gate state machine.
//!
//! Guards the parent PIN behind an attempt counter and a lockout window
//! so a child cannot brute-force their way into the editor.

use chrono::{Duration, NaiveDateTime};

/// Wrong attempts allowed before the gate locks.
pub const MAX_ATTEMPTS: u32 = 2;
/// How long the gate stays locked, in seconds.
pub const LOCKOUT_SECONDS: i64 = 300;
/// How long a failed-attempt count is remembered, in seconds.
pub const ATTEMPT_TTL_SECONDS: i64 = 600;
/// How long a successful PIN entry keeps parent access, in seconds.
pub const PARENT_GRANT_SECONDS: i64 = 600;

/// State of the parent gate for one session.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GateState {
    /// No failed attempts on record.
    Open,
    /// One or more recent failures, counting toward a lockout.
    Attempting {
        failures: u32,
        last_failure: NaiveDateTime,
    },
    /// Locked out until the deadline passes.
    Locked { until: NaiveDateTime },
}

impl GateState {
    /// Collapse expired lockouts and stale attempt counts back to Open.
    fn effective(self, now: NaiveDateTime) -> GateState {
        match self {
            GateState::Locked { until } if now >= until => GateState::Open,
            GateState::Attempting { last_failure, .. }
                if now - last_failure > Duration::seconds(ATTEMPT_TTL_SECONDS) =>
            {
                GateState::Open
            }
            other => other,
        }
    }
}

impl std::fmt::Display for GateState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            Self::Open => "open",
            Self::Attempting { .. } => "attempting",
            Self::Locked { .. } => "locked",
        };
        write!(f, "{s}")
    }
}

/// What a PIN submission produced.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GateOutcome {
    /// PIN matched; parent access granted.
    Granted,
    /// PIN did not match; more attempts remain.
    Denied,
    /// Gate is locked; retry after the given number of seconds.
    Locked { retry_after_seconds: i64 },
}

/// Feed one PIN submission through the gate.
///
/// A locked gate rejects without looking at the PIN, so probing during
/// a lockout neither extends the lock nor consumes attempts. The
/// lockout check runs before the PIN comparison.
pub fn submit(
    state: GateState,
    pin_matches: bool,
    now: NaiveDateTime,
) -> (GateState, GateOutcome) {
    let state = state.effective(now);

    if let GateState::Locked { until } = state {
        return (
            state,
            GateOutcome::Locked {
                retry_after_seconds: seconds_until(until, now),
            },
        );
    }

    if pin_matches {
        return (GateState::Open, GateOutcome::Granted);
    }

    let failures = match state {
        GateState::Attempting { failures, .. } => failures + 1,
        _ => 1,
    };

    if failures >= MAX_ATTEMPTS {
        let until = now + Duration::seconds(LOCKOUT_SECONDS);
        (
            GateState::Locked { until },
            GateOutcome::Locked {
                retry_after_seconds: LOCKOUT_SECONDS,
            },
        )
    } else {
        (
            GateState::Attempting {
                failures,
                last_failure: now,
            },
            GateOutcome::Denied,
        )
    }
}

/// Seconds from `now` until `until`, rounded up.
fn seconds_until(until: NaiveDateTime, now: NaiveDateTime) -> i64 {
    let ms = (until - now).num_milliseconds();
    (ms + 999) / 1000
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;

    fn at(h: u32, min: u32) -> NaiveDateTime {
        NaiveDate::from_ymd_opt(2025, 8, 20)
            .unwrap()
            .and_hms_opt(h, min, 0)
            .unwrap()
    }

    #[test]
    fn correct_pin_grants_access() {
        let (state, outcome) = submit(GateState::Open, true, at(9, 0));
        assert_eq!(state, GateState::Open);
        assert_eq!(outcome, GateOutcome::Granted);
    }

    #[test]
    fn wrong_pin_counts_an_attempt() {
        let (state, outcome) = submit(GateState::Open, false, at(9, 0));
        assert_eq!(outcome, GateOutcome::Denied);
        assert_eq!(
            state,
            GateState::Attempting {
                failures: 1,
                last_failure: at(9, 0)
            }
        );
    }

    #[test]
    fn second_wrong_pin_locks_the_gate() {
        let (one_down, _) = submit(GateState::Open, false, at(9, 0));
        let (state, outcome) = submit(one_down, false, at(9, 1));

        assert_eq!(
            outcome,
            GateOutcome::Locked {
                retry_after_seconds: LOCKOUT_SECONDS
            }
        );
        assert_eq!(
            state,
            GateState::Locked {
                until: at(9, 1) + Duration::seconds(LOCKOUT_SECONDS)
            }
        );
    }

    #[test]
    fn locked_gate_rejects_correct_pin() {
        let locked = GateState::Locked { until: at(9, 10) };
        let (state, outcome) = submit(locked, true, at(9, 5));

        assert_eq!(state, locked);
        assert_eq!(
            outcome,
            GateOutcome::Locked {
                retry_after_seconds: 300
            }
        );
    }

    #[test]
    fn probing_while_locked_does_not_extend_the_lock() {
        let locked = GateState::Locked { until: at(9, 10) };
        let (state, _) = submit(locked, false, at(9, 5));
        assert_eq!(state, locked);
    }

    #[test]
    fn lockout_expires() {
        let locked = GateState::Locked { until: at(9, 10) };
        let (state, outcome) = submit(locked, true, at(9, 10));

        assert_eq!(state, GateState::Open);
        assert_eq!(outcome, GateOutcome::Granted);
    }

    #[test]
    fn wrong_pin_after_expired_lockout_starts_fresh() {
        let locked = GateState::Locked { until: at(9, 10) };
        let (state, outcome) = submit(locked, false, at(9, 15));

        assert_eq!(outcome, GateOutcome::Denied);
        assert_eq!(
            state,
            GateState::Attempting {
                failures: 1,
                last_failure: at(9, 15)
            }
        );
    }

    #[test]
    fn stale_attempts_are_forgotten() {
        let old = GateState::Attempting {
            failures: 1,
            last_failure: at(9, 0),
        };
        // Eleven minutes later, past the attempt TTL
        let (state, outcome) = submit(old, false, at(9, 11));

        assert_eq!(outcome, GateOutcome::Denied);
        assert_eq!(
            state,
            GateState::Attempting {
                failures: 1,
                last_failure: at(9, 11)
            }
        );
    }

    #[test]
    fn recent_attempts_accumulate() {
        let recent = GateState::Attempting {
            failures: 1,
            last_failure: at(9, 0),
        };
        // Five minutes later, still within the TTL
        let (state, _) = submit(recent, false, at(9, 5));
        assert!(matches!(state, GateState::Locked { .. }));
    }

    #[test]
    fn correct_pin_clears_attempt_count() {
        let attempting = GateState::Attempting {
            failures: 1,
            last_failure: at(9, 0),
        };
        let (state, outcome) = submit(attempting, true, at(9, 1));

        assert_eq!(state, GateState::Open);
        assert_eq!(outcome, GateOutcome::Granted);
    }

    #[test]
    fn retry_after_rounds_up() {
        let until = at(9, 0) + Duration::milliseconds(100_500);
        let locked = GateState::Locked { until };
        let (_, outcome) = submit(locked, false, at(9, 0));

        assert_eq!(
            outcome,
            GateOutcome::Locked {
                retry_after_seconds: 101
            }
        );
    }

    #[test]
    fn gate_state_display() {
        assert_eq!(GateState::Open.to_string(), "open");
        assert_eq!(
            GateState::Locked { until: at(9, 0) }.to_string(),
            "locked"
        );
    }
}
