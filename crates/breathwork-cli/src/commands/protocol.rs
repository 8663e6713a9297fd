use breathwork_core::storage::database::{CALIBRATION_KEY, PROTOCOL_KEY};
use breathwork_core::{
    BreathPattern, CalibrationState, Database, Event, ProtocolProgress, ProtocolWeek, WeekInfo,
};
use chrono::Utc;
use clap::Subcommand;
use serde::Serialize;

use super::{load_protocol, print_json, CliResult};

#[derive(Subcommand)]
pub enum ProtocolAction {
    /// Show the current week, pattern and calibration
    Show,
    /// List all ten weeks
    List,
    /// Jump to a week (1-10)
    Set { week: u8 },
    /// Advance to the next week
    Next,
    /// Use a custom pattern (seconds) without changing the week
    Pattern {
        inhale: f64,
        exhale: f64,
        #[arg(default_value = "0")]
        inhale_hold: f64,
        #[arg(default_value = "0")]
        exhale_hold: f64,
    },
}

#[derive(Serialize)]
struct ProtocolView {
    week: WeekInfo,
    pattern: BreathPattern,
    calibration: CalibrationState,
}

fn week_changed(progress: &ProtocolProgress) -> Event {
    Event::WeekChanged {
        week: progress.current_week.number(),
        focus: progress.current_week.focus().to_string(),
        pattern: progress.pattern,
        at: Utc::now(),
    }
}

pub fn run(action: ProtocolAction) -> CliResult {
    let db = Database::open()?;
    let mut progress = load_protocol(&db)?;

    match action {
        ProtocolAction::Show => {
            let calibration: CalibrationState = db.load_json(CALIBRATION_KEY)?.unwrap_or_default();
            print_json(&ProtocolView {
                week: progress.current_week.into(),
                pattern: progress.pattern,
                calibration,
            })?;
        }
        ProtocolAction::List => {
            let weeks: Vec<WeekInfo> = ProtocolWeek::all().map(WeekInfo::from).collect();
            print_json(&weeks)?;
        }
        ProtocolAction::Set { week } => {
            progress.set_week(week)?;
            db.save_json(PROTOCOL_KEY, &progress)?;
            print_json(&week_changed(&progress))?;
        }
        ProtocolAction::Next => {
            if progress.next_week().is_none() {
                return Err(format!("already at the final week ({})", progress.current_week).into());
            }
            db.save_json(PROTOCOL_KEY, &progress)?;
            print_json(&week_changed(&progress))?;
        }
        ProtocolAction::Pattern {
            inhale,
            exhale,
            inhale_hold,
            exhale_hold,
        } => {
            progress.set_pattern(BreathPattern::new(inhale, exhale, inhale_hold, exhale_hold))?;
            db.save_json(PROTOCOL_KEY, &progress)?;
            print_json(&progress)?;
        }
    }
    Ok(())
}
