//! Guided sessions run in the terminal, ticking the engine on a fixed
//! frame interval until the target time is reached.

use std::io::Write;
use std::time::Duration;

use breathwork_core::storage::database::{CALIBRATION_KEY, PROTOCOL_KEY};
use breathwork_core::{
    now_ms, transition_event, BreathSession, Calibration, Config, Database, Event, FeedbackFrame,
    FeedbackSettings, Frame,
};
use clap::Args;

use super::session::{target_for, KindArg};
use super::{finish_session, load_protocol, print_json, CliResult};

#[derive(Args)]
pub struct BreatheArgs {
    #[arg(long, value_enum, default_value = "full")]
    kind: KindArg,
    /// Override the session length in minutes
    #[arg(long)]
    minutes: Option<u64>,
    /// Print every event as JSON instead of prompts
    #[arg(long)]
    json: bool,
}

/// Something the live loop can drive frame by frame.
trait Guided {
    fn tick(&mut self, now_ms: u64) -> Option<Frame>;
    fn is_done(&self, now_ms: u64) -> bool;
}

impl Guided for BreathSession {
    fn tick(&mut self, now_ms: u64) -> Option<Frame> {
        BreathSession::tick(self, now_ms)
    }

    fn is_done(&self, now_ms: u64) -> bool {
        self.is_complete(now_ms)
    }
}

impl Guided for Calibration {
    fn tick(&mut self, now_ms: u64) -> Option<Frame> {
        Calibration::tick(self, now_ms)
    }

    fn is_done(&self, now_ms: u64) -> bool {
        self.is_due(now_ms)
    }
}

/// Tick `guided` every `interval` until it is done. Returns the end time.
fn run_frames(
    guided: &mut impl Guided,
    interval: Duration,
    feedback: FeedbackSettings,
    json: bool,
) -> CliResult<u64> {
    loop {
        let now = now_ms();
        if guided.is_done(now) {
            guided.tick(now);
            return Ok(now);
        }
        if let Some(frame) = guided.tick(now) {
            render(&frame, feedback, json, now)?;
        }
        std::thread::sleep(interval);
    }
}

fn render(frame: &Frame, feedback: FeedbackSettings, json: bool, now: u64) -> CliResult {
    let Some(event) = transition_event(frame, now) else {
        return Ok(());
    };
    if json {
        println!("{}", serde_json::to_string(&event)?);
        return Ok(());
    }
    let cue = FeedbackFrame::new(frame, feedback);
    let mut line = format!("{:<12} breaths: {}", cue.label, cue.breath_count);
    if let Some(hz) = cue.frequency {
        line.push_str(&format!("  tone {hz:.0} Hz"));
    }
    if cue.pulse {
        line.push_str("  ~");
    }
    let mut out = std::io::stdout().lock();
    writeln!(out, "{line}")?;
    out.flush()?;
    Ok(())
}

pub fn breathe(args: BreatheArgs) -> CliResult {
    let mut db = Database::open()?;
    let config = Config::load_or_default();
    let progress = load_protocol(&db)?;
    let (kind, target) = target_for(&config, args.kind, args.minutes);
    let interval = Duration::from_millis(config.session.frame_interval_ms.max(1));

    let (mut session, started) = BreathSession::start(
        kind,
        progress.current_week.number(),
        progress.pattern,
        target,
        now_ms(),
    )?;
    if args.json {
        println!("{}", serde_json::to_string(&started)?);
    } else {
        println!(
            "{} ({}) for {} min. Breathe In",
            progress.current_week,
            progress.current_week.focus(),
            target / 60
        );
    }

    let end = run_frames(&mut session, interval, config.feedback(), args.json)?;
    let record = session.end(end);
    let event = finish_session(&mut db, record)?;
    print_json(&event)
}

pub fn calibrate() -> CliResult {
    let mut db = Database::open()?;
    let config = Config::load_or_default();
    let progress = load_protocol(&db)?;
    let interval = Duration::from_millis(config.session.frame_interval_ms.max(1));

    let (mut calibration, _) = Calibration::begin(
        progress.pattern,
        progress.current_week.number(),
        config.calibration.duration_secs,
        now_ms(),
    )?;
    println!(
        "Calibrating for {}s: breathe with the prompts",
        config.calibration.duration_secs
    );

    let end = run_frames(&mut calibration, interval, config.feedback(), false)?;

    let outcome = calibration.finish(end);
    db.save_json(CALIBRATION_KEY, &outcome.state)?;
    let mut restored = progress;
    restored.pattern = outcome.restored_pattern;
    db.save_json(PROTOCOL_KEY, &restored)?;
    let ended: Event = finish_session(&mut db, outcome.record)?;
    tracing::debug!("Calibration session recorded: {:?}", ended);
    print_json(&outcome.event)
}
