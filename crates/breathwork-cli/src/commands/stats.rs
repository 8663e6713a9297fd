use breathwork_core::Database;
use chrono::Local;
use clap::Subcommand;
use serde::Serialize;

use super::{print_json, CliResult};

#[derive(Subcommand)]
pub enum StatsAction {
    /// Today's stats
    Today,
    /// All-time stats
    All,
}

#[derive(Subcommand)]
pub enum HistoryAction {
    /// List finished sessions, most recent first
    List {
        #[arg(long)]
        limit: Option<usize>,
    },
}

#[derive(Serialize)]
struct StreakView {
    streak: u32,
    last_session_date: Option<chrono::NaiveDate>,
}

pub fn run_stats(action: StatsAction) -> CliResult {
    let db = Database::open()?;

    match action {
        StatsAction::Today => print_json(&db.stats_today()?),
        StatsAction::All => print_json(&db.stats_all()?),
    }
}

pub fn run_history(action: HistoryAction) -> CliResult {
    let db = Database::open()?;

    match action {
        HistoryAction::List { limit } => print_json(&db.list_sessions(limit)?),
    }
}

pub fn streak() -> CliResult {
    let db = Database::open()?;
    let state = db.streak()?;
    print_json(&StreakView {
        streak: state.current(Local::now().date_naive()),
        last_session_date: state.last_session_date,
    })
}
