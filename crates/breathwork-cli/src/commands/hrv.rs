use std::path::PathBuf;

use breathwork_core::{correlate, summarize, Config, CorrelatedDay, Database, HrvData, HrvSummary};
use clap::Subcommand;
use serde::Serialize;

use super::{print_json, CliResult};

#[derive(Subcommand)]
pub enum HrvAction {
    /// Correlate recent readiness scores with practice days
    Show {
        /// Path to the JSON export (defaults to hrv.data_path)
        #[arg(long)]
        file: Option<PathBuf>,
        /// Number of most recent days to include
        #[arg(long)]
        days: Option<usize>,
    },
}

#[derive(Serialize)]
struct HrvView {
    days: Vec<CorrelatedDay>,
    summary: HrvSummary,
}

pub fn run(action: HrvAction) -> CliResult {
    match action {
        HrvAction::Show { file, days } => {
            let config = Config::load_or_default();
            let path = file
                .or_else(|| config.hrv.data_path.as_ref().map(PathBuf::from))
                .ok_or("no HRV export configured; pass --file or set hrv.data_path")?;
            let data = HrvData::load_or_empty(&path);
            let db = Database::open()?;
            let history = db.list_sessions(None)?;
            let rows = correlate(&data, &history, days.unwrap_or(config.hrv.window_days));
            let summary = summarize(&rows);
            print_json(&HrvView { days: rows, summary })
        }
    }
}
