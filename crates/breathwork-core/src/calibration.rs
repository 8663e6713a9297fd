//! One-minute calibration run.
//!
//! Breathes a slow `3s in / 3s out` pattern for a fixed time and turns the
//! completed breaths into a resting rate, clamped to 5..=7 breaths per
//! minute. The user's own pattern is handed back untouched afterwards.

use serde::{Deserialize, Serialize};

use crate::breath::{BreathPattern, Frame};
use crate::error::PatternError;
use crate::events::Event;
use crate::history::SessionRecord;
use crate::session::{to_datetime, BreathSession, SessionKind};

pub const DEFAULT_CALIBRATION_SECS: u64 = 60;
pub const MIN_RATE: u32 = 5;
pub const MAX_RATE: u32 = 7;

/// Result of the most recent calibration.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct CalibrationState {
    /// Breaths per minute.
    pub rate: u32,
    pub complete: bool,
}

impl Default for CalibrationState {
    fn default() -> Self {
        Self {
            rate: 6,
            complete: false,
        }
    }
}

/// Breaths per minute over `duration_secs`, clamped to the supported range.
pub fn rate_from_breaths(breaths: u32, duration_secs: u64) -> u32 {
    let per_minute = if duration_secs == 0 {
        breaths
    } else {
        (breaths as f64 * 60.0 / duration_secs as f64).round() as u32
    };
    per_minute.clamp(MIN_RATE, MAX_RATE)
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Calibration {
    session: BreathSession,
    restore: BreathPattern,
}

#[derive(Debug, Clone)]
pub struct CalibrationOutcome {
    pub state: CalibrationState,
    pub record: SessionRecord,
    /// The pattern that was active before calibrating.
    pub restored_pattern: BreathPattern,
    pub event: Event,
}

impl Calibration {
    pub fn begin(
        restore: BreathPattern,
        week: u8,
        duration_secs: u64,
        now_ms: u64,
    ) -> Result<(Self, Event), PatternError> {
        let (session, event) = BreathSession::start(
            SessionKind::Calibration,
            week,
            BreathPattern::calibration(),
            duration_secs,
            now_ms,
        )?;
        Ok((Self { session, restore }, event))
    }

    pub fn session(&self) -> &BreathSession {
        &self.session
    }

    pub fn tick(&mut self, now_ms: u64) -> Option<Frame> {
        self.session.tick(now_ms)
    }

    /// True once the calibration time has been breathed.
    pub fn is_due(&self, now_ms: u64) -> bool {
        self.session.is_complete(now_ms)
    }

    pub fn finish(self, now_ms: u64) -> CalibrationOutcome {
        let record = self.session.end(now_ms);
        let rate = rate_from_breaths(record.breaths, record.duration_secs);
        tracing::info!(
            "Calibration complete: {} breaths in {}s -> {} bpm",
            record.breaths, record.duration_secs, rate
        );
        let event = Event::CalibrationCompleted {
            rate,
            breaths: record.breaths,
            at: to_datetime(now_ms),
        };
        CalibrationOutcome {
            state: CalibrationState {
                rate,
                complete: true,
            },
            record,
            restored_pattern: self.restore,
            event,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const T0: u64 = 1_700_000_000_000;

    #[test]
    fn rate_is_clamped() {
        assert_eq!(rate_from_breaths(10, 60), 7);
        assert_eq!(rate_from_breaths(2, 60), 5);
        assert_eq!(rate_from_breaths(6, 60), 6);
        assert_eq!(rate_from_breaths(3, 30), 6);
        assert_eq!(rate_from_breaths(9, 0), 7);
    }

    #[test]
    fn full_minute_calibration() {
        let week6 = BreathPattern::new(6.0, 8.0, 3.0, 2.0);
        let (mut cal, _) = Calibration::begin(week6, 6, DEFAULT_CALIBRATION_SECS, T0).unwrap();
        let mut t = T0;
        while !cal.is_due(t) {
            cal.tick(t);
            t += 100;
        }
        cal.tick(t);
        let outcome = cal.finish(t);

        assert_eq!(outcome.record.kind, SessionKind::Calibration);
        assert_eq!(outcome.record.breaths, 10);
        assert_eq!(outcome.state, CalibrationState { rate: 7, complete: true });
        assert_eq!(outcome.restored_pattern, week6);
        assert!(matches!(outcome.event, Event::CalibrationCompleted { rate: 7, .. }));
    }

    #[test]
    fn default_state_is_incomplete() {
        let state = CalibrationState::default();
        assert_eq!(state.rate, 6);
        assert!(!state.complete);
    }
}
