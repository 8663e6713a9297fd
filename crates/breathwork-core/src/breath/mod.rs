mod engine;
mod pattern;
mod phase;

pub use engine::{now_ms, BreathEngine, Frame, PhaseState, SessionState, Transition};
pub use pattern::BreathPattern;
pub use phase::{
    scale_for, tone_frequency_for, Phase, SCALE_MAX, SCALE_MIN, TONE_HIGH_HZ, TONE_LOW_HZ,
};
