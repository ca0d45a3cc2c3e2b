//! Per-reservation attendance state machine.
//!
//! `Reserved` is the only live state; `Cancelled`, `Present` and `Absent`
//! are terminal. Attendance marking may re-mark `Present`/`Absent` rows
//! (idempotent bulk marking) but never touches `Cancelled` ones.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "snake_case")]
pub enum AttendanceState {
    Reserved,
    Cancelled,
    Present,
    Absent,
}

impl AttendanceState {
    pub fn is_terminal(self) -> bool {
        !matches!(self, AttendanceState::Reserved)
    }

    /// Member- or cascade-initiated cancellation. Terminal states stay put.
    pub fn cancel(self) -> Option<AttendanceState> {
        match self {
            AttendanceState::Reserved => Some(AttendanceState::Cancelled),
            _ => None,
        }
    }

    /// Bulk attendance marking: `Reserved` rows transition, already-marked
    /// rows may be re-marked, cancelled rows are untouched.
    pub fn mark(self, present: bool) -> Option<AttendanceState> {
        match self {
            AttendanceState::Reserved | AttendanceState::Present | AttendanceState::Absent => {
                Some(if present {
                    AttendanceState::Present
                } else {
                    AttendanceState::Absent
                })
            }
            AttendanceState::Cancelled => None,
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            AttendanceState::Reserved => "reserved",
            AttendanceState::Cancelled => "cancelled",
            AttendanceState::Present => "present",
            AttendanceState::Absent => "absent",
        }
    }
}

impl fmt::Display for AttendanceState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for AttendanceState {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "reserved" => Ok(AttendanceState::Reserved),
            "cancelled" => Ok(AttendanceState::Cancelled),
            "present" => Ok(AttendanceState::Present),
            "absent" => Ok(AttendanceState::Absent),
            other => Err(format!("unknown attendance state: {other}")),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn reserved_is_the_only_live_state() {
        assert!(!AttendanceState::Reserved.is_terminal());
        assert!(AttendanceState::Cancelled.is_terminal());
        assert!(AttendanceState::Present.is_terminal());
        assert!(AttendanceState::Absent.is_terminal());
    }

    #[test]
    fn cancel_only_leaves_reserved() {
        assert_eq!(
            AttendanceState::Reserved.cancel(),
            Some(AttendanceState::Cancelled)
        );
        assert_eq!(AttendanceState::Cancelled.cancel(), None);
        assert_eq!(AttendanceState::Present.cancel(), None);
        assert_eq!(AttendanceState::Absent.cancel(), None);
    }

    #[test]
    fn marking_is_idempotent_for_marked_rows() {
        assert_eq!(
            AttendanceState::Reserved.mark(true),
            Some(AttendanceState::Present)
        );
        assert_eq!(
            AttendanceState::Reserved.mark(false),
            Some(AttendanceState::Absent)
        );
        // Re-marking flips or confirms already-marked rows.
        assert_eq!(
            AttendanceState::Absent.mark(true),
            Some(AttendanceState::Present)
        );
        assert_eq!(
            AttendanceState::Present.mark(true),
            Some(AttendanceState::Present)
        );
        // Cancelled rows are never re-marked.
        assert_eq!(AttendanceState::Cancelled.mark(true), None);
        assert_eq!(AttendanceState::Cancelled.mark(false), None);
    }

    #[test]
    fn states_round_trip_through_db_text() {
        for state in [
            AttendanceState::Reserved,
            AttendanceState::Cancelled,
            AttendanceState::Present,
            AttendanceState::Absent,
        ] {
            assert_eq!(state.as_str().parse::<AttendanceState>().unwrap(), state);
        }
    }
}
