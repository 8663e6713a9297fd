use breathwork_core::storage::database::ACTIVE_SESSION_KEY;
use breathwork_core::{now_ms, transition_event, BreathSession, Config, Database, SessionKind};
use clap::{Subcommand, ValueEnum};

use super::{finish_session, load_protocol, print_json, CliResult};

#[derive(Clone, Copy, ValueEnum)]
pub enum KindArg {
    Quick,
    Full,
}

impl From<KindArg> for SessionKind {
    fn from(kind: KindArg) -> Self {
        match kind {
            KindArg::Quick => SessionKind::Quick,
            KindArg::Full => SessionKind::Full,
        }
    }
}

#[derive(Subcommand)]
pub enum SessionAction {
    /// Start a session with the current protocol pattern
    Start {
        #[arg(long, value_enum, default_value = "full")]
        kind: KindArg,
        /// Override the session length in minutes
        #[arg(long)]
        minutes: Option<u64>,
    },
    /// Pause the running session
    Pause,
    /// Resume the paused session
    Resume,
    /// Advance the session to now and print its state as JSON
    Status,
    /// End the session and record it in history
    End,
}

fn load_active(db: &Database) -> CliResult<BreathSession> {
    db.load_json::<BreathSession>(ACTIVE_SESSION_KEY)?
        .ok_or_else(|| "no active session".into())
}

/// Resolve the session kind and target length for a start request.
pub fn target_for(config: &Config, kind: KindArg, minutes: Option<u64>) -> (SessionKind, u64) {
    match minutes {
        Some(m) => (SessionKind::Custom, m.saturating_mul(60)),
        None => {
            let kind = SessionKind::from(kind);
            (kind, config.target_secs(kind))
        }
    }
}

pub fn run(action: SessionAction) -> CliResult {
    let mut db = Database::open()?;
    let now = now_ms();

    match action {
        SessionAction::Start { kind, minutes } => {
            if db.kv_get(ACTIVE_SESSION_KEY)?.is_some() {
                return Err("a session is already active; end it first".into());
            }
            let config = Config::load_or_default();
            let progress = load_protocol(&db)?;
            let (kind, target) = target_for(&config, kind, minutes);
            let (session, event) = BreathSession::start(
                kind,
                progress.current_week.number(),
                progress.pattern,
                target,
                now,
            )?;
            db.save_json(ACTIVE_SESSION_KEY, &session)?;
            print_json(&event)?;
        }
        SessionAction::Pause => {
            let mut session = load_active(&db)?;
            session.advance_to(now);
            let event = session.pause(now).ok_or("session is not running")?;
            db.save_json(ACTIVE_SESSION_KEY, &session)?;
            print_json(&event)?;
        }
        SessionAction::Resume => {
            let mut session = load_active(&db)?;
            let event = session.resume(now).ok_or("session is not paused")?;
            db.save_json(ACTIVE_SESSION_KEY, &session)?;
            print_json(&event)?;
        }
        SessionAction::Status => {
            let mut session = load_active(&db)?;
            let frames = session.advance_to(now);
            db.save_json(ACTIVE_SESSION_KEY, &session)?;
            print_json(&session.snapshot(now))?;
            for event in frames.iter().filter_map(|f| transition_event(f, now)) {
                tracing::debug!("Caught up: {:?}", event);
            }
        }
        SessionAction::End => {
            let mut session = load_active(&db)?;
            session.advance_to(now);
            let record = session.end(now);
            let event = finish_session(&mut db, record)?;
            db.kv_delete(ACTIVE_SESSION_KEY)?;
            print_json(&event)?;
        }
    }
    Ok(())
}
