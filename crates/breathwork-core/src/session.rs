//! A breathing session: the phase engine plus the session clock.
//!
//! The session clock counts active time only. Pausing stops both the clock
//! and the engine; resuming restarts both from the same timestamp.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::breath::{BreathEngine, BreathPattern, Frame, Phase, SessionState};
use crate::error::{PatternError, ValidationError};
use crate::events::Event;
use crate::history::SessionRecord;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SessionKind {
    Quick,
    Full,
    Calibration,
    Custom,
}

impl SessionKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            SessionKind::Quick => "quick",
            SessionKind::Full => "full",
            SessionKind::Calibration => "calibration",
            SessionKind::Custom => "custom",
        }
    }
}

impl std::str::FromStr for SessionKind {
    type Err = ValidationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "quick" => Ok(SessionKind::Quick),
            "full" => Ok(SessionKind::Full),
            "calibration" => Ok(SessionKind::Calibration),
            "custom" => Ok(SessionKind::Custom),
            other => Err(ValidationError::InvalidValue {
                field: "kind".into(),
                message: format!("unknown session kind '{other}'"),
            }),
        }
    }
}

/// Which optional cues the user has switched on.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct FeedbackSettings {
    pub sound: bool,
    pub vibration: bool,
}

/// Per-frame output for the visual, audio and haptic collaborators.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FeedbackFrame {
    pub phase: Phase,
    pub label: String,
    pub progress: f64,
    pub scale: f64,
    /// Tone to play, present only with sound enabled.
    pub frequency: Option<f64>,
    /// Haptic cue on phase changes, only with vibration enabled.
    pub pulse: bool,
    pub breath_count: u32,
}

impl FeedbackFrame {
    pub fn new(frame: &Frame, settings: FeedbackSettings) -> Self {
        Self {
            phase: frame.phase,
            label: frame.phase.label().to_string(),
            progress: frame.progress,
            scale: frame.scale,
            frequency: settings.sound.then_some(frame.frequency),
            pulse: settings.vibration && frame.transition.is_some(),
            breath_count: frame.breath_count,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BreathSession {
    id: String,
    kind: SessionKind,
    week: u8,
    target_secs: u64,
    started_at_ms: u64,
    /// Active time banked before the current running stretch.
    active_ms: u64,
    /// Start of the current running stretch; `None` while paused.
    running_since_ms: Option<u64>,
    engine: BreathEngine,
}

impl BreathSession {
    /// Start a session. Fails without side effects on an invalid pattern.
    pub fn start(
        kind: SessionKind,
        week: u8,
        pattern: BreathPattern,
        target_secs: u64,
        now_ms: u64,
    ) -> Result<(Self, Event), PatternError> {
        let mut engine = BreathEngine::new();
        engine.start(pattern, now_ms)?;
        let session = Self {
            id: Uuid::new_v4().to_string(),
            kind,
            week,
            target_secs,
            started_at_ms: now_ms,
            active_ms: 0,
            running_since_ms: Some(now_ms),
            engine,
        };
        tracing::info!(
            "Session {} started ({}, week {}, {}s)",
            session.id, kind.as_str(), week, target_secs
        );
        let event = Event::SessionStarted {
            session_id: session.id.clone(),
            kind,
            week,
            pattern,
            target_secs,
            at: to_datetime(now_ms),
        };
        Ok((session, event))
    }

    // ── Queries ──────────────────────────────────────────────────────

    pub fn id(&self) -> &str {
        &self.id
    }

    pub fn kind(&self) -> SessionKind {
        self.kind
    }

    pub fn week(&self) -> u8 {
        self.week
    }

    pub fn state(&self) -> SessionState {
        self.engine.state()
    }

    pub fn engine(&self) -> &BreathEngine {
        &self.engine
    }

    pub fn breath_count(&self) -> u32 {
        self.engine.breath_count()
    }

    pub fn elapsed_ms(&self, now_ms: u64) -> u64 {
        let running = self
            .running_since_ms
            .map(|since| now_ms.saturating_sub(since))
            .unwrap_or(0);
        self.active_ms + running
    }

    /// Whole seconds of active practice.
    pub fn elapsed_secs(&self, now_ms: u64) -> u64 {
        self.elapsed_ms(now_ms) / 1000
    }

    pub fn remaining_secs(&self, now_ms: u64) -> u64 {
        self.target_secs.saturating_sub(self.elapsed_secs(now_ms))
    }

    pub fn is_complete(&self, now_ms: u64) -> bool {
        self.elapsed_ms(now_ms) >= self.target_secs.saturating_mul(1000)
    }

    pub fn snapshot(&self, now_ms: u64) -> Event {
        let frame = self.engine.peek(now_ms);
        Event::StateSnapshot {
            state: self.state(),
            kind: self.kind,
            phase: frame.map(|f| f.phase),
            label: frame.map(|f| f.phase.label()).unwrap_or_default().to_string(),
            progress: frame.map(|f| f.progress).unwrap_or(0.0),
            scale: frame.map(|f| f.scale).unwrap_or(1.0),
            breath_count: self.breath_count(),
            elapsed_secs: self.elapsed_secs(now_ms),
            remaining_secs: self.remaining_secs(now_ms),
            at: to_datetime(now_ms),
        }
    }

    // ── Commands ─────────────────────────────────────────────────────

    pub fn tick(&mut self, now_ms: u64) -> Option<Frame> {
        self.engine.tick(now_ms)
    }

    /// Advance to `now_ms` after a gap, applying every phase boundary that
    /// fell inside it at its exact timestamp. Returns the frames produced.
    pub fn advance_to(&mut self, now_ms: u64) -> Vec<Frame> {
        let pattern = *self.engine.pattern();
        let cycle_ms = Phase::ALL
            .iter()
            .fold(0u64, |sum, p| sum.saturating_add(pattern.duration_ms(*p)));
        let mut frames = Vec::new();
        if cycle_ms > 0 {
            while let Some(ps) = self.engine.phase_state().copied() {
                let Some(boundary) = ps.phase_start_ms.checked_add(pattern.duration_ms(ps.phase))
                else {
                    break;
                };
                if self.state() != SessionState::Running
                    || boundary <= ps.phase_start_ms
                    || boundary >= now_ms
                {
                    break;
                }
                frames.extend(self.engine.tick(boundary));
            }
        }
        frames.extend(self.engine.tick(now_ms));
        frames
    }

    pub fn pause(&mut self, now_ms: u64) -> Option<Event> {
        self.engine.pause(now_ms)?;
        self.active_ms = self.elapsed_ms(now_ms);
        self.running_since_ms = None;
        Some(Event::SessionPaused {
            elapsed_secs: self.elapsed_secs(now_ms),
            at: to_datetime(now_ms),
        })
    }

    pub fn resume(&mut self, now_ms: u64) -> Option<Event> {
        self.engine.resume(now_ms)?;
        self.running_since_ms = Some(now_ms);
        Some(Event::SessionResumed {
            elapsed_secs: self.elapsed_secs(now_ms),
            at: to_datetime(now_ms),
        })
    }

    /// Pause when running, resume when paused.
    pub fn toggle_pause(&mut self, now_ms: u64) -> Option<Event> {
        match self.state() {
            SessionState::Running => self.pause(now_ms),
            SessionState::Paused => self.resume(now_ms),
            SessionState::Idle => None,
        }
    }

    /// Stop the session and produce its history record.
    pub fn end(mut self, now_ms: u64) -> SessionRecord {
        let duration_secs = self.elapsed_secs(now_ms);
        let breaths = self.engine.take_phase().map(|p| p.breath_count).unwrap_or(0);
        tracing::info!(
            "Session {} ended: {} breaths in {}s",
            self.id, breaths, duration_secs
        );
        SessionRecord {
            id: self.id,
            kind: self.kind,
            week: self.week,
            breaths,
            duration_secs,
            started_at: to_datetime(self.started_at_ms),
            ended_at: to_datetime(now_ms),
        }
    }
}

/// `PhaseChanged` event for a frame that crossed a phase boundary.
pub fn transition_event(frame: &Frame, now_ms: u64) -> Option<Event> {
    let t = frame.transition?;
    Some(Event::PhaseChanged {
        from: t.from,
        to: t.to,
        label: t.to.label().to_string(),
        breath_count: frame.breath_count,
        at: to_datetime(now_ms),
    })
}

pub(crate) fn to_datetime(ms: u64) -> DateTime<Utc> {
    DateTime::from_timestamp_millis(ms as i64).unwrap_or_default()
}
