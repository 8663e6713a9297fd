use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::breath::{BreathPattern, Phase, SessionState};
use crate::history::SessionRecord;
use crate::session::SessionKind;

/// Every state change of a breathing session produces an Event.
/// Front ends render them; history and streak tracking consume `SessionEnded`.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type")]
pub enum Event {
    SessionStarted {
        session_id: String,
        kind: SessionKind,
        week: u8,
        pattern: BreathPattern,
        target_secs: u64,
        at: DateTime<Utc>,
    },
    SessionPaused {
        elapsed_secs: u64,
        at: DateTime<Utc>,
    },
    SessionResumed {
        elapsed_secs: u64,
        at: DateTime<Utc>,
    },
    PhaseChanged {
        from: Phase,
        to: Phase,
        label: String,
        breath_count: u32,
        at: DateTime<Utc>,
    },
    SessionEnded {
        record: SessionRecord,
        streak: u32,
        at: DateTime<Utc>,
    },
    CalibrationCompleted {
        rate: u32,
        breaths: u32,
        at: DateTime<Utc>,
    },
    WeekChanged {
        week: u8,
        focus: String,
        pattern: BreathPattern,
        at: DateTime<Utc>,
    },
    StateSnapshot {
        state: SessionState,
        kind: SessionKind,
        phase: Option<Phase>,
        label: String,
        progress: f64,
        scale: f64,
        breath_count: u32,
        elapsed_secs: u64,
        remaining_secs: u64,
        at: DateTime<Utc>,
    },
}
