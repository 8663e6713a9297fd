//! # Breathwork Core Library
//!
//! This library provides the core logic for the Breathwork breathing trainer.
//! Every operation is available through the standalone `breathwork` CLI; any
//! graphical front end is a thin layer over the same library.
//!
//! ## Architecture
//!
//! - **Breath Engine**: A wall-clock-based phase state machine that requires
//!   the caller to invoke `tick()` once per frame
//! - **Session**: Active-time clock, pause/resume and feedback parameters
//!   around the engine
//! - **Protocol**: The 10-week progressive pattern table
//! - **Storage**: SQLite-based history and TOML-based configuration
//!
//! ## Key Components
//!
//! - [`BreathEngine`]: Phase state machine
//! - [`BreathSession`]: One practice session
//! - [`Database`]: Session history and persisted state
//! - [`Config`]: Application configuration management

pub mod breath;
pub mod calibration;
pub mod error;
pub mod events;
pub mod history;
pub mod hrv;
pub mod protocol;
pub mod session;
pub mod storage;

pub use breath::{
    now_ms, scale_for, tone_frequency_for, BreathEngine, BreathPattern, Frame, Phase, PhaseState,
    SessionState,
};
pub use calibration::{Calibration, CalibrationOutcome, CalibrationState};
pub use error::{ConfigError, CoreError, DatabaseError, PatternError, ValidationError};
pub use events::Event;
pub use history::{SessionRecord, StreakState};
pub use hrv::{correlate, summarize, CorrelatedDay, HrvData, HrvSummary};
pub use protocol::{ProtocolProgress, ProtocolWeek, WeekInfo};
pub use session::{transition_event, BreathSession, FeedbackFrame, FeedbackSettings, SessionKind};
pub use storage::{Config, Database, HistoryStats};
