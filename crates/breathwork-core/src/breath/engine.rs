//! Breathing phase engine.
//!
//! The engine is a wall-clock-based state machine. It does not use
//! internal threads - the caller is responsible for calling `tick()` once per
//! animation frame with a monotonic non-decreasing timestamp.
//!
//! ## Phase Transitions
//!
//! ```text
//! Inhale -> [InhaleHold] -> Exhale -> [ExhaleHold] -> Inhale (+1 breath)
//! ```
//!
//! Holds with zero duration are never entered. Every phase's elapsed time is
//! measured from its stored start timestamp, so missed frames never
//! accumulate drift.
//!
//! ## Usage
//!
//! ```ignore
//! let mut engine = BreathEngine::new();
//! engine.start(BreathPattern::default(), now_ms())?;
//! // Once per frame:
//! if let Some(frame) = engine.tick(now_ms()) {
//!     render(frame.scale);
//! }
//! ```

use serde::{Deserialize, Serialize};

use super::pattern::BreathPattern;
use super::phase::{scale_for, tone_frequency_for, Phase};
use crate::error::PatternError;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SessionState {
    Idle,
    Running,
    Paused,
}

/// Position inside the breath cycle. Mutated only by [`BreathEngine::tick`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct PhaseState {
    pub phase: Phase,
    /// Epoch milliseconds at which `phase` was entered.
    pub phase_start_ms: u64,
    pub breath_count: u32,
}

impl PhaseState {
    fn fresh(now_ms: u64) -> Self {
        Self {
            phase: Phase::Inhale,
            phase_start_ms: now_ms,
            breath_count: 0,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Transition {
    pub from: Phase,
    pub to: Phase,
    /// True when this transition closed a full cycle.
    pub breath_completed: bool,
}

/// Everything a renderer or audio collaborator needs for one frame.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Frame {
    pub phase: Phase,
    /// 0.0 .. 1.0 progress within the current phase.
    pub progress: f64,
    pub scale: f64,
    pub frequency: f64,
    pub elapsed_ms: u64,
    pub breath_count: u32,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub transition: Option<Transition>,
}

/// Core breathing engine.
///
/// Operates on caller-supplied timestamps -- no internal thread.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BreathEngine {
    pattern: BreathPattern,
    state: SessionState,
    #[serde(default)]
    phase: Option<PhaseState>,
    /// Elapsed time inside the current phase, frozen while paused.
    #[serde(default)]
    paused_elapsed_ms: Option<u64>,
}

impl BreathEngine {
    pub fn new() -> Self {
        Self {
            pattern: BreathPattern::default(),
            state: SessionState::Idle,
            phase: None,
            paused_elapsed_ms: None,
        }
    }

    // ── Queries ──────────────────────────────────────────────────────

    pub fn state(&self) -> SessionState {
        self.state
    }

    pub fn pattern(&self) -> &BreathPattern {
        &self.pattern
    }

    pub fn phase_state(&self) -> Option<&PhaseState> {
        self.phase.as_ref()
    }

    pub fn breath_count(&self) -> u32 {
        self.phase.map(|p| p.breath_count).unwrap_or(0)
    }

    /// Elapsed milliseconds inside the current phase as of `now_ms`.
    pub fn elapsed_ms(&self, now_ms: u64) -> u64 {
        if let Some(frozen) = self.paused_elapsed_ms {
            return frozen;
        }
        self.phase
            .map(|p| now_ms.saturating_sub(p.phase_start_ms))
            .unwrap_or(0)
    }

    /// Compute the frame for `now_ms` without advancing the phase.
    pub fn peek(&self, now_ms: u64) -> Option<Frame> {
        let ps = self.phase?;
        Some(self.frame(&ps, self.elapsed_ms(now_ms), None))
    }

    // ── Commands ─────────────────────────────────────────────────────

    /// Begin a new cycle sequence with `pattern`.
    ///
    /// An invalid pattern is rejected before any state is touched.
    pub fn start(
        &mut self,
        pattern: BreathPattern,
        now_ms: u64,
    ) -> Result<PhaseState, PatternError> {
        pattern.validate()?;
        self.pattern = pattern;
        self.state = SessionState::Running;
        self.paused_elapsed_ms = None;
        let ps = PhaseState::fresh(now_ms);
        self.phase = Some(ps);
        tracing::debug!(
            "Breath engine started: inhale={}s exhale={}s holds={}s/{}s",
            pattern.inhale, pattern.exhale, pattern.inhale_hold, pattern.exhale_hold
        );
        Ok(ps)
    }

    /// Advance to `now_ms`. Returns `None` unless running.
    ///
    /// At most one phase transition is applied per call.
    pub fn tick(&mut self, now_ms: u64) -> Option<Frame> {
        if self.state != SessionState::Running {
            return None;
        }
        let pattern = self.pattern;
        let ps = self.phase.as_mut()?;

        let mut elapsed = now_ms.saturating_sub(ps.phase_start_ms);
        let mut transition = None;
        if elapsed >= pattern.duration_ms(ps.phase) {
            let from = ps.phase;
            let (to, breath_completed) = next_phase(&pattern, from);
            ps.phase = to;
            ps.phase_start_ms = now_ms;
            if breath_completed {
                ps.breath_count += 1;
            }
            elapsed = 0;
            tracing::debug!(
                "Phase {} -> {} (breaths: {})",
                from, to, ps.breath_count
            );
            transition = Some(Transition {
                from,
                to,
                breath_completed,
            });
        }

        let ps = *ps;
        Some(self.frame(&ps, elapsed, transition))
    }

    /// Freeze the current phase. Returns the frozen elapsed time.
    pub fn pause(&mut self, now_ms: u64) -> Option<u64> {
        if self.state != SessionState::Running {
            return None;
        }
        let elapsed = self.elapsed_ms(now_ms);
        self.paused_elapsed_ms = Some(elapsed);
        self.state = SessionState::Paused;
        Some(elapsed)
    }

    /// Continue the frozen phase, re-anchoring its start so the paused
    /// interval is not counted.
    pub fn resume(&mut self, now_ms: u64) -> Option<u64> {
        if self.state != SessionState::Paused {
            return None;
        }
        let elapsed = self.paused_elapsed_ms.take().unwrap_or(0);
        if let Some(ps) = self.phase.as_mut() {
            ps.phase_start_ms = now_ms.saturating_sub(elapsed);
        }
        self.state = SessionState::Running;
        Some(elapsed)
    }

    /// Halt ticking. Phase state stays readable; returns the breath count.
    pub fn stop(&mut self) -> u32 {
        self.state = SessionState::Idle;
        self.paused_elapsed_ms = None;
        self.breath_count()
    }

    /// Discard the phase state after the owner has read it.
    pub fn take_phase(&mut self) -> Option<PhaseState> {
        self.stop();
        self.phase.take()
    }

    // ── Internal ─────────────────────────────────────────────────────

    fn frame(&self, ps: &PhaseState, elapsed_ms: u64, transition: Option<Transition>) -> Frame {
        let duration = self.pattern.duration_ms(ps.phase);
        let progress = if duration == 0 {
            0.0
        } else {
            (elapsed_ms as f64 / duration as f64).clamp(0.0, 1.0)
        };
        Frame {
            phase: ps.phase,
            progress,
            scale: scale_for(ps.phase, progress),
            frequency: tone_frequency_for(ps.phase, progress),
            elapsed_ms,
            breath_count: ps.breath_count,
            transition,
        }
    }
}

impl Default for BreathEngine {
    fn default() -> Self {
        Self::new()
    }
}

/// Successor of `phase`, and whether entering it completes a breath.
fn next_phase(pattern: &BreathPattern, phase: Phase) -> (Phase, bool) {
    match phase {
        Phase::Inhale if pattern.visits(Phase::InhaleHold) => (Phase::InhaleHold, false),
        Phase::Inhale | Phase::InhaleHold => (Phase::Exhale, false),
        Phase::Exhale if pattern.visits(Phase::ExhaleHold) => (Phase::ExhaleHold, false),
        Phase::Exhale | Phase::ExhaleHold => (Phase::Inhale, true),
    }
}

/// Current wall-clock time in epoch milliseconds.
pub fn now_ms() -> u64 {
    std::time::SystemTime::now()
        .duration_since(std::time::UNIX_EPOCH)
        .unwrap_or_default()
        .as_millis() as u64
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    const T0: u64 = 1_700_000_000_000;

    fn started(pattern: BreathPattern) -> BreathEngine {
        let mut engine = BreathEngine::new();
        engine.start(pattern, T0).unwrap();
        engine
    }

    /// Tick every `step_ms` from T0 up to and including `T0 + until_ms`,
    /// recording every phase entered.
    fn run(engine: &mut BreathEngine, until_ms: u64, step_ms: u64) -> Vec<Phase> {
        let mut visited = vec![Phase::Inhale];
        let mut t = step_ms;
        while t <= until_ms {
            if let Some(Transition { to, .. }) = engine.tick(T0 + t).and_then(|f| f.transition) {
                visited.push(to);
            }
            t += step_ms;
        }
        visited
    }

    #[test]
    fn start_initializes_phase_state() {
        let mut engine = BreathEngine::new();
        assert_eq!(engine.state(), SessionState::Idle);
        let ps = engine.start(BreathPattern::default(), T0).unwrap();
        assert_eq!(ps, PhaseState { phase: Phase::Inhale, phase_start_ms: T0, breath_count: 0 });
        assert_eq!(engine.state(), SessionState::Running);
    }

    #[test]
    fn week_one_scenario() {
        let mut engine = started(BreathPattern::new(4.0, 6.0, 0.0, 0.0));

        let f = engine.tick(T0).unwrap();
        assert_eq!((f.phase, f.progress, f.scale), (Phase::Inhale, 0.0, 1.0));

        let f = engine.tick(T0 + 2_000).unwrap();
        assert_eq!((f.phase, f.progress, f.scale), (Phase::Inhale, 0.5, 1.25));

        let f = engine.tick(T0 + 4_000).unwrap();
        assert_eq!((f.phase, f.progress, f.scale), (Phase::Exhale, 0.0, 1.5));
        assert_eq!(f.transition.map(|t| t.from), Some(Phase::Inhale));

        let f = engine.tick(T0 + 10_000).unwrap();
        assert_eq!(f.phase, Phase::Inhale);
        assert_eq!(f.breath_count, 1);
        assert!(f.transition.unwrap().breath_completed);
    }

    #[test]
    fn week_six_three_cycles() {
        let mut engine = started(BreathPattern::new(6.0, 8.0, 3.0, 2.0));
        run(&mut engine, 57_000, 100);
        assert_eq!(engine.breath_count(), 3);
        assert_eq!(engine.phase_state().unwrap().phase, Phase::Inhale);
    }

    #[test]
    fn visits_holds_in_order_when_present() {
        let mut engine = started(BreathPattern::new(6.0, 8.0, 3.0, 2.0));
        let visited = run(&mut engine, 19_000, 50);
        assert_eq!(
            visited,
            vec![Phase::Inhale, Phase::InhaleHold, Phase::Exhale, Phase::ExhaleHold, Phase::Inhale]
        );
    }

    #[test]
    fn skips_zero_holds() {
        let mut engine = started(BreathPattern::new(4.0, 6.0, 0.0, 2.0));
        let visited = run(&mut engine, 60_000, 100);
        assert!(!visited.contains(&Phase::InhaleHold));
        assert!(visited.contains(&Phase::ExhaleHold));
    }

    #[test]
    fn invalid_start_leaves_state_untouched() {
        let mut engine = started(BreathPattern::default());
        engine.tick(T0 + 5_000);
        let before = *engine.phase_state().unwrap();

        let err = engine
            .start(BreathPattern::new(0.0, 6.0, 0.0, 0.0), T0 + 6_000)
            .unwrap_err();
        assert!(matches!(err, PatternError::InvalidPattern { field: "inhale", .. }));
        assert_eq!(*engine.phase_state().unwrap(), before);
        assert_eq!(engine.state(), SessionState::Running);
        assert_eq!(engine.pattern(), &BreathPattern::default());
    }

    #[test]
    fn pause_excludes_paused_interval() {
        let mut engine = started(BreathPattern::new(10.0, 10.0, 0.0, 0.0));
        engine.tick(T0 + 2_000);
        assert_eq!(engine.pause(T0 + 2_000), Some(2_000));

        assert!(engine.tick(T0 + 7_000).is_none());
        assert_eq!(engine.elapsed_ms(T0 + 12_000), 2_000);

        engine.resume(T0 + 12_000);
        let f = engine.tick(T0 + 14_000).unwrap();
        assert_eq!(f.elapsed_ms, 4_000);
        assert_eq!(f.phase, Phase::Inhale);
    }

    #[test]
    fn pause_and_resume_require_matching_state() {
        let mut engine = BreathEngine::new();
        assert!(engine.pause(T0).is_none());
        assert!(engine.resume(T0).is_none());
        engine.start(BreathPattern::default(), T0).unwrap();
        assert!(engine.resume(T0).is_none());
        assert!(engine.pause(T0).is_some());
        assert!(engine.pause(T0).is_none());
    }

    #[test]
    fn stop_keeps_phase_for_inspection() {
        let mut engine = started(BreathPattern::default());
        run(&mut engine, 20_000, 100);
        assert_eq!(engine.stop(), 2);
        assert_eq!(engine.state(), SessionState::Idle);
        assert!(engine.tick(T0 + 30_000).is_none());
        assert_eq!(engine.breath_count(), 2);
        assert_eq!(engine.take_phase().map(|p| p.breath_count), Some(2));
        assert!(engine.phase_state().is_none());
    }

    #[test]
    fn one_transition_per_tick_after_a_long_gap() {
        let mut engine = started(BreathPattern::default());
        let f = engine.tick(T0 + 60_000).unwrap();
        assert_eq!(f.phase, Phase::Exhale);
        assert_eq!(f.breath_count, 0);
    }

    #[test]
    fn non_monotonic_timestamp_reads_as_zero_elapsed() {
        let mut engine = started(BreathPattern::default());
        let f = engine.tick(T0 - 500).unwrap();
        assert_eq!(f.elapsed_ms, 0);
        assert_eq!(f.progress, 0.0);
    }

    #[test]
    fn peek_does_not_advance() {
        let engine = started(BreathPattern::default());
        let f = engine.peek(T0 + 5_000).unwrap();
        assert_eq!(f.phase, Phase::Inhale);
        assert_eq!(f.progress, 1.0);
        assert_eq!(engine.phase_state().unwrap().phase, Phase::Inhale);
    }

    #[test]
    fn engine_serde_roundtrip_preserves_pause() {
        let mut engine = started(BreathPattern::default());
        engine.pause(T0 + 1_500);
        let json = serde_json::to_string(&engine).unwrap();
        let restored: BreathEngine = serde_json::from_str(&json).unwrap();
        assert_eq!(restored.state(), SessionState::Paused);
        assert_eq!(restored.elapsed_ms(T0 + 99_000), 1_500);
    }

    proptest! {
        #[test]
        fn one_breath_per_cycle(
            inhale in 1u32..8,
            exhale in 1u32..10,
            inhale_hold in 0u32..5,
            exhale_hold in 0u32..5,
            cycles in 1u32..4,
        ) {
            let pattern = BreathPattern::new(
                inhale as f64, exhale as f64, inhale_hold as f64, exhale_hold as f64,
            );
            let mut engine = started(pattern);
            let cycle_ms = (pattern.cycle_secs() * 1000.0) as u64;
            let visited = run(&mut engine, cycle_ms * cycles as u64, 250);
            prop_assert_eq!(engine.breath_count(), cycles);
            if inhale_hold == 0 {
                prop_assert!(!visited.contains(&Phase::InhaleHold));
            }
            if exhale_hold == 0 {
                prop_assert!(!visited.contains(&Phase::ExhaleHold));
            }
        }

        #[test]
        fn progress_stays_in_unit_range(offsets in proptest::collection::vec(0u64..3_000, 1..50)) {
            let mut engine = started(BreathPattern::new(4.0, 6.0, 1.0, 2.0));
            let mut t = T0;
            for dt in offsets {
                t += dt;
                let f = engine.tick(t).unwrap();
                prop_assert!((0.0..=1.0).contains(&f.progress));
                prop_assert!((1.0..=1.5).contains(&f.scale));
            }
        }
    }
}
