use serde::{Deserialize, Serialize};

use super::phase::Phase;
use crate::error::PatternError;

/// Durations, in seconds, of the four phases of one breath cycle.
///
/// A hold of `0.0` means that phase is skipped entirely.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BreathPattern {
    pub inhale: f64,
    pub exhale: f64,
    #[serde(default)]
    pub inhale_hold: f64,
    #[serde(default)]
    pub exhale_hold: f64,
}

impl BreathPattern {
    pub fn new(inhale: f64, exhale: f64, inhale_hold: f64, exhale_hold: f64) -> Self {
        Self {
            inhale,
            exhale,
            inhale_hold,
            exhale_hold,
        }
    }

    /// Slow, even pattern used by the calibration routine.
    pub fn calibration() -> Self {
        Self::new(3.0, 3.0, 0.0, 0.0)
    }

    /// Reject patterns the engine cannot run.
    ///
    /// Inhale and exhale must last at least one millisecond once rounded;
    /// holds may be zero.
    pub fn validate(&self) -> Result<(), PatternError> {
        for (field, phase) in [("inhale", Phase::Inhale), ("exhale", Phase::Exhale)] {
            let value = self.duration_of(phase);
            if !value.is_finite() || value <= 0.0 || self.duration_ms(phase) == 0 {
                return Err(PatternError::InvalidPattern {
                    field,
                    requirement: "at least 1 ms",
                    value,
                });
            }
        }
        for (field, value) in [
            ("inhaleHold", self.inhale_hold),
            ("exhaleHold", self.exhale_hold),
        ] {
            if !value.is_finite() || value < 0.0 {
                return Err(PatternError::InvalidPattern {
                    field,
                    requirement: "zero or greater",
                    value,
                });
            }
        }
        Ok(())
    }

    pub fn duration_of(&self, phase: Phase) -> f64 {
        match phase {
            Phase::Inhale => self.inhale,
            Phase::InhaleHold => self.inhale_hold,
            Phase::Exhale => self.exhale,
            Phase::ExhaleHold => self.exhale_hold,
        }
    }

    /// Phase duration in whole milliseconds.
    pub fn duration_ms(&self, phase: Phase) -> u64 {
        (self.duration_of(phase).max(0.0) * 1000.0).round() as u64
    }

    /// Whether the cycle passes through `phase` at all.
    pub fn visits(&self, phase: Phase) -> bool {
        self.duration_ms(phase) > 0
    }

    pub fn cycle_secs(&self) -> f64 {
        self.inhale + self.inhale_hold + self.exhale + self.exhale_hold
    }

    pub fn breaths_per_minute(&self) -> f64 {
        let cycle = self.cycle_secs();
        if cycle <= 0.0 {
            return 0.0;
        }
        60.0 / cycle
    }
}

impl Default for BreathPattern {
    /// Protocol week 1.
    fn default() -> Self {
        Self::new(4.0, 6.0, 0.0, 0.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_is_week_one() {
        let p = BreathPattern::default();
        assert_eq!(p, BreathPattern::new(4.0, 6.0, 0.0, 0.0));
        assert_eq!(p.cycle_secs(), 10.0);
        assert_eq!(p.breaths_per_minute(), 6.0);
    }

    #[test]
    fn zero_holds_are_valid() {
        assert!(BreathPattern::new(4.0, 6.0, 0.0, 0.0).validate().is_ok());
        assert!(!BreathPattern::default().visits(Phase::InhaleHold));
        assert!(!BreathPattern::default().visits(Phase::ExhaleHold));
    }

    #[test]
    fn rejects_zero_inhale() {
        let err = BreathPattern::new(0.0, 6.0, 0.0, 0.0).validate().unwrap_err();
        assert!(matches!(
            err,
            PatternError::InvalidPattern { field: "inhale", .. }
        ));
    }

    #[test]
    fn rejects_negative_exhale_and_hold() {
        assert!(BreathPattern::new(4.0, -1.0, 0.0, 0.0).validate().is_err());
        assert!(BreathPattern::new(4.0, 6.0, -0.5, 0.0).validate().is_err());
        assert!(BreathPattern::new(f64::NAN, 6.0, 0.0, 0.0).validate().is_err());
    }

    #[test]
    fn rejects_durations_that_round_to_zero_ms() {
        let err = BreathPattern::new(0.0004, 6.0, 0.0, 0.0).validate().unwrap_err();
        assert!(matches!(
            err,
            PatternError::InvalidPattern { field: "inhale", .. }
        ));
        assert!(BreathPattern::new(4.0, 0.0001, 0.0, 0.0).validate().is_err());
        assert!(BreathPattern::new(0.001, 0.001, 0.0, 0.0).validate().is_ok());
        // Sub-millisecond holds are simply skipped.
        assert!(BreathPattern::new(4.0, 6.0, 0.0004, 0.0).validate().is_ok());
    }

    #[test]
    fn week_six_cycle_is_nineteen_seconds() {
        let p = BreathPattern::new(6.0, 8.0, 3.0, 2.0);
        assert_eq!(p.cycle_secs(), 19.0);
        assert_eq!(p.duration_ms(Phase::InhaleHold), 3000);
    }

    #[test]
    fn deserializes_camel_case_with_missing_holds() {
        let p: BreathPattern = serde_json::from_str(r#"{"inhale":5,"exhale":7}"#).unwrap();
        assert_eq!(p, BreathPattern::new(5.0, 7.0, 0.0, 0.0));
        let p: BreathPattern = serde_json::from_str(
            r#"{"inhale":5,"exhale":7,"inhaleHold":2,"exhaleHold":1}"#,
        )
        .unwrap();
        assert_eq!(p.exhale_hold, 1.0);
    }
}
