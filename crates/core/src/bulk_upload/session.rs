//! Upload session lifecycle and derived progress.
//!
//! A session is created before any file bytes arrive, moves to
//! `processing` when ingestion starts, and ends in `completed` or
//! `failed`. Transitions only move forward; terminal states are final.
//! Cancellation is modelled as a transition to `failed`, never as an
//! in-place mutation of a terminal session.

use serde::{Deserialize, Serialize};

// ── Status ───────────────────────────────────────────────────────────

/// Lifecycle status of an upload session.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SessionStatus {
    Created,
    Processing,
    Completed,
    Failed,
}

impl SessionStatus {
    /// Return the status name as stored in the database.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Created => "created",
            Self::Processing => "processing",
            Self::Completed => "completed",
            Self::Failed => "failed",
        }
    }

    /// Parse a status string. Returns `None` for unknown values.
    pub fn from_str(s: &str) -> Option<Self> {
        match s {
            "created" => Some(Self::Created),
            "processing" => Some(Self::Processing),
            "completed" => Some(Self::Completed),
            "failed" => Some(Self::Failed),
            _ => None,
        }
    }

    /// All valid status values.
    pub const ALL: &'static [&'static str] = &["created", "processing", "completed", "failed"];

    /// Whether this status admits no further transitions.
    pub fn is_terminal(&self) -> bool {
        matches!(self, Self::Completed | Self::Failed)
    }

    /// Whether `self -> to` is a legal forward transition.
    pub fn can_transition(&self, to: SessionStatus) -> bool {
        matches!(
            (self, to),
            (Self::Created, Self::Processing)
                | (Self::Created, Self::Failed)
                | (Self::Processing, Self::Completed)
                | (Self::Processing, Self::Failed)
        )
    }
}

impl std::fmt::Display for SessionStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

// ── Derived progress ─────────────────────────────────────────────────

/// Percentage of expected rows processed, for client-side polling.
///
/// 0 before processing starts, 100 on completion, 0 on failure (the
/// phase field of the snapshot tells the client which zero it is).
pub fn progress_percentage(status: SessionStatus, processed_rows: i32, expected_rows: i32) -> f64 {
    match status {
        SessionStatus::Created | SessionStatus::Failed => 0.0,
        SessionStatus::Completed => 100.0,
        SessionStatus::Processing => {
            if expected_rows <= 0 {
                0.0
            } else {
                (f64::from(processed_rows) / f64::from(expected_rows) * 100.0).clamp(0.0, 100.0)
            }
        }
    }
}

/// Linear-extrapolation estimate of seconds remaining.
///
/// Only meaningful mid-processing: requires `processed_rows > 0` and a
/// positive elapsed time, otherwise `None`. `total_rows` is the
/// server-confirmed row count when known, else the client estimate.
pub fn estimated_seconds_remaining(
    status: SessionStatus,
    processed_rows: i32,
    total_rows: i32,
    elapsed_secs: f64,
) -> Option<f64> {
    if status != SessionStatus::Processing || processed_rows <= 0 || elapsed_secs <= 0.0 {
        return None;
    }
    let remaining = i64::from(total_rows) - i64::from(processed_rows);
    if remaining <= 0 {
        return None;
    }
    Some(elapsed_secs / f64::from(processed_rows) * remaining as f64)
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use SessionStatus::*;

    #[test]
    fn status_names_round_trip() {
        for name in SessionStatus::ALL {
            let status = SessionStatus::from_str(name).expect("known status");
            assert_eq!(status.as_str(), *name);
        }
        assert_eq!(SessionStatus::from_str("queued"), None);
    }

    #[test]
    fn happy_path_transitions_are_legal() {
        assert!(Created.can_transition(Processing));
        assert!(Processing.can_transition(Completed));
        assert!(Processing.can_transition(Failed));
        assert!(Created.can_transition(Failed));
    }

    #[test]
    fn terminal_states_admit_nothing() {
        for from in [Completed, Failed] {
            assert!(from.is_terminal());
            for to in [Created, Processing, Completed, Failed] {
                assert!(!from.can_transition(to), "{from} -> {to}");
            }
        }
    }

    #[test]
    fn no_backward_or_self_transitions() {
        assert!(!Processing.can_transition(Created));
        assert!(!Created.can_transition(Created));
        assert!(!Created.can_transition(Completed));
        assert!(!Processing.can_transition(Processing));
    }

    // -- progress --

    #[test]
    fn percentage_by_phase() {
        assert_eq!(progress_percentage(Created, 0, 100), 0.0);
        assert_eq!(progress_percentage(Processing, 40, 100), 40.0);
        assert_eq!(progress_percentage(Completed, 100, 100), 100.0);
        assert_eq!(progress_percentage(Failed, 40, 100), 0.0);
    }

    #[test]
    fn percentage_clamps_when_estimate_was_low() {
        assert_eq!(progress_percentage(Processing, 150, 100), 100.0);
    }

    #[test]
    fn percentage_handles_zero_expected_rows() {
        assert_eq!(progress_percentage(Processing, 10, 0), 0.0);
    }

    // -- eta --

    #[test]
    fn eta_is_linear_extrapolation() {
        // 40 rows in 10s -> 60 remaining at 0.25 s/row = 15s.
        let eta = estimated_seconds_remaining(Processing, 40, 100, 10.0).expect("mid-processing");
        assert!((eta - 15.0).abs() < 1e-9);
    }

    #[test]
    fn eta_absent_outside_processing() {
        assert_eq!(estimated_seconds_remaining(Created, 0, 100, 5.0), None);
        assert_eq!(estimated_seconds_remaining(Completed, 100, 100, 5.0), None);
        assert_eq!(estimated_seconds_remaining(Failed, 40, 100, 5.0), None);
    }

    #[test]
    fn eta_requires_progress_and_remaining_work() {
        assert_eq!(estimated_seconds_remaining(Processing, 0, 100, 5.0), None);
        assert_eq!(estimated_seconds_remaining(Processing, 100, 100, 5.0), None);
        assert_eq!(estimated_seconds_remaining(Processing, 40, 100, 0.0), None);
    }
}
