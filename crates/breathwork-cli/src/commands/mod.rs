pub mod config;
pub mod hrv;
pub mod live;
pub mod protocol;
pub mod session;
pub mod stats;

use breathwork_core::storage::database::PROTOCOL_KEY;
use breathwork_core::{Database, Event, ProtocolProgress, SessionRecord};
use serde::Serialize;

pub type CliResult<T = ()> = Result<T, Box<dyn std::error::Error>>;

pub fn print_json<T: Serialize>(value: &T) -> CliResult {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}

pub fn load_protocol(db: &Database) -> CliResult<ProtocolProgress> {
    Ok(db.load_json(PROTOCOL_KEY)?.unwrap_or_default())
}

/// Persist a finished session and build its `SessionEnded` event.
pub fn finish_session(db: &mut Database, record: SessionRecord) -> CliResult<Event> {
    let streak = db.complete_session(&record)?;
    let at = record.ended_at;
    Ok(Event::SessionEnded { record, streak, at })
}
