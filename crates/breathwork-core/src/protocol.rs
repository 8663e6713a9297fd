//! Ten-week progressive breathing protocol.
//!
//! Each week lengthens the inhale/exhale or introduces longer holds. The
//! user advances manually; nothing here moves the week forward on its own.

use serde::{Deserialize, Serialize};

use crate::breath::BreathPattern;
use crate::error::ValidationError;

pub const FIRST_WEEK: u8 = 1;
pub const LAST_WEEK: u8 = 10;

/// (inhale, exhale, inhale_hold, exhale_hold, focus) per week.
const WEEKS: [(f64, f64, f64, f64, &str); 10] = [
    (4.0, 6.0, 0.0, 0.0, "Foundation"),
    (4.0, 6.0, 1.0, 0.0, "Building"),
    (4.0, 6.0, 2.0, 1.0, "Deepening"),
    (5.0, 7.0, 2.0, 1.0, "Expanding"),
    (5.0, 7.0, 3.0, 2.0, "Refinement"),
    (6.0, 8.0, 3.0, 2.0, "Integration"),
    (6.0, 8.0, 4.0, 3.0, "Strength"),
    (7.0, 9.0, 4.0, 3.0, "Mastery"),
    (7.0, 9.0, 5.0, 4.0, "Application"),
    (8.0, 10.0, 5.0, 4.0, "Autonomy"),
];

/// A week number in `1..=10`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "u8", into = "u8")]
pub struct ProtocolWeek(u8);

impl ProtocolWeek {
    pub fn new(week: u8) -> Result<Self, ValidationError> {
        if (FIRST_WEEK..=LAST_WEEK).contains(&week) {
            Ok(Self(week))
        } else {
            Err(ValidationError::OutOfRange {
                field: "week".into(),
                value: week as i64,
                min: FIRST_WEEK as i64,
                max: LAST_WEEK as i64,
            })
        }
    }

    pub fn first() -> Self {
        Self(FIRST_WEEK)
    }

    pub fn number(&self) -> u8 {
        self.0
    }

    pub fn pattern(&self) -> BreathPattern {
        let (inhale, exhale, inhale_hold, exhale_hold, _) = WEEKS[self.index()];
        BreathPattern::new(inhale, exhale, inhale_hold, exhale_hold)
    }

    /// One-word theme of the week.
    pub fn focus(&self) -> &'static str {
        WEEKS[self.index()].4
    }

    /// The following week, or `None` after the last one.
    pub fn next(&self) -> Option<Self> {
        Self::new(self.0 + 1).ok()
    }

    pub fn all() -> impl Iterator<Item = ProtocolWeek> {
        (FIRST_WEEK..=LAST_WEEK).map(ProtocolWeek)
    }

    fn index(&self) -> usize {
        (self.0 - FIRST_WEEK) as usize
    }
}

impl Default for ProtocolWeek {
    fn default() -> Self {
        Self::first()
    }
}

impl TryFrom<u8> for ProtocolWeek {
    type Error = ValidationError;

    fn try_from(week: u8) -> Result<Self, Self::Error> {
        Self::new(week)
    }
}

impl From<ProtocolWeek> for u8 {
    fn from(week: ProtocolWeek) -> Self {
        week.0
    }
}

impl std::fmt::Display for ProtocolWeek {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "Week {}", self.0)
    }
}

/// Row of the protocol overview.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WeekInfo {
    pub week: ProtocolWeek,
    pub focus: String,
    pub pattern: BreathPattern,
    pub breaths_per_minute: f64,
}

impl From<ProtocolWeek> for WeekInfo {
    fn from(week: ProtocolWeek) -> Self {
        let pattern = week.pattern();
        Self {
            week,
            focus: week.focus().to_string(),
            pattern,
            breaths_per_minute: pattern.breaths_per_minute(),
        }
    }
}

/// The user's position in the protocol and the pattern sessions will use.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProtocolProgress {
    pub current_week: ProtocolWeek,
    pub pattern: BreathPattern,
}

impl ProtocolProgress {
    /// Jump to `week`, replacing the pattern with that week's.
    pub fn set_week(&mut self, week: u8) -> Result<ProtocolWeek, ValidationError> {
        let week = ProtocolWeek::new(week)?;
        self.current_week = week;
        self.pattern = week.pattern();
        tracing::info!("Protocol moved to {} ({})", week, week.focus());
        Ok(week)
    }

    /// Advance one week. Stays put after the final week.
    pub fn next_week(&mut self) -> Option<ProtocolWeek> {
        let next = self.current_week.next()?;
        self.set_week(next.number()).ok()
    }

    /// Use a custom pattern without changing the week.
    pub fn set_pattern(&mut self, pattern: BreathPattern) -> Result<(), crate::error::PatternError> {
        pattern.validate()?;
        self.pattern = pattern;
        Ok(())
    }
}

impl Default for ProtocolProgress {
    fn default() -> Self {
        let week = ProtocolWeek::first();
        Self {
            current_week: week,
            pattern: week.pattern(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn every_week_pattern_is_valid() {
        for week in ProtocolWeek::all() {
            assert!(week.pattern().validate().is_ok(), "{week}");
        }
        assert_eq!(ProtocolWeek::all().count(), 10);
    }

    #[test]
    fn week_one_and_six() {
        let w1 = ProtocolWeek::new(1).unwrap();
        assert_eq!(w1.pattern(), BreathPattern::new(4.0, 6.0, 0.0, 0.0));
        assert_eq!(w1.focus(), "Foundation");

        let w6 = ProtocolWeek::new(6).unwrap();
        assert_eq!(w6.pattern(), BreathPattern::new(6.0, 8.0, 3.0, 2.0));
        assert_eq!(w6.focus(), "Integration");
    }

    #[test]
    fn rejects_out_of_range_weeks() {
        assert!(ProtocolWeek::new(0).is_err());
        assert!(ProtocolWeek::new(11).is_err());
        assert!(serde_json::from_str::<ProtocolWeek>("12").is_err());
        assert_eq!(serde_json::from_str::<ProtocolWeek>("3").unwrap().number(), 3);
    }

    #[test]
    fn next_week_stops_at_ten() {
        let mut progress = ProtocolProgress::default();
        for expected in 2..=10 {
            assert_eq!(progress.next_week().map(|w| w.number()), Some(expected));
        }
        assert!(progress.next_week().is_none());
        assert_eq!(progress.current_week.number(), 10);
        assert_eq!(progress.pattern, BreathPattern::new(8.0, 10.0, 5.0, 4.0));
    }

    #[test]
    fn invalid_set_week_keeps_progress() {
        let mut progress = ProtocolProgress::default();
        progress.set_week(4).unwrap();
        assert!(progress.set_week(0).is_err());
        assert_eq!(progress.current_week.number(), 4);
        assert_eq!(progress.pattern, ProtocolWeek::new(4).unwrap().pattern());
    }

    #[test]
    fn custom_pattern_is_validated() {
        let mut progress = ProtocolProgress::default();
        assert!(progress.set_pattern(BreathPattern::new(0.0, 4.0, 0.0, 0.0)).is_err());
        assert_eq!(progress.pattern, BreathPattern::default());
        progress.set_pattern(BreathPattern::new(5.5, 5.5, 0.0, 0.0)).unwrap();
        assert_eq!(progress.current_week.number(), 1);
    }

    #[test]
    fn week_info_reports_rate() {
        let info = WeekInfo::from(ProtocolWeek::new(6).unwrap());
        assert!((info.breaths_per_minute - 60.0 / 19.0).abs() < 1e-9);
    }
}
