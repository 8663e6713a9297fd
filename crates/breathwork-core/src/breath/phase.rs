use serde::{Deserialize, Serialize};

/// Scale of the breathing circle when fully contracted.
pub const SCALE_MIN: f64 = 1.0;
/// Scale of the breathing circle when fully expanded.
pub const SCALE_MAX: f64 = 1.5;
/// Tone frequency (Hz) at the bottom of the breath.
pub const TONE_LOW_HZ: f64 = 200.0;
/// Tone frequency (Hz) at the top of the breath.
pub const TONE_HIGH_HZ: f64 = 400.0;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum Phase {
    Inhale,
    InhaleHold,
    Exhale,
    ExhaleHold,
}

impl Phase {
    pub const ALL: [Phase; 4] = [
        Phase::Inhale,
        Phase::InhaleHold,
        Phase::Exhale,
        Phase::ExhaleHold,
    ];

    /// Prompt shown to the user during this phase.
    pub fn label(&self) -> &'static str {
        match self {
            Phase::Inhale => "Breathe In",
            Phase::InhaleHold | Phase::ExhaleHold => "Hold",
            Phase::Exhale => "Breathe Out",
        }
    }

    pub fn is_hold(&self) -> bool {
        matches!(self, Phase::InhaleHold | Phase::ExhaleHold)
    }
}

impl std::fmt::Display for Phase {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            Phase::Inhale => "inhale",
            Phase::InhaleHold => "inhaleHold",
            Phase::Exhale => "exhale",
            Phase::ExhaleHold => "exhaleHold",
        };
        f.write_str(s)
    }
}

/// Circle scale for a phase at `progress` in `[0, 1]`.
///
/// Expands 1.0 -> 1.5 on inhale, holds expanded, contracts on exhale,
/// holds contracted.
pub fn scale_for(phase: Phase, progress: f64) -> f64 {
    let span = SCALE_MAX - SCALE_MIN;
    match phase {
        Phase::Inhale => SCALE_MIN + span * progress,
        Phase::InhaleHold => SCALE_MAX,
        Phase::Exhale => SCALE_MAX - span * progress,
        Phase::ExhaleHold => SCALE_MIN,
    }
}

/// Feedback tone frequency in Hz, tracking [`scale_for`] one to one.
pub fn tone_frequency_for(phase: Phase, progress: f64) -> f64 {
    let span = TONE_HIGH_HZ - TONE_LOW_HZ;
    match phase {
        Phase::Inhale => TONE_LOW_HZ + span * progress,
        Phase::InhaleHold => TONE_HIGH_HZ,
        Phase::Exhale => TONE_HIGH_HZ - span * progress,
        Phase::ExhaleHold => TONE_LOW_HZ,
    }
}
