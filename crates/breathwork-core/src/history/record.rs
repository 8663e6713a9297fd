use chrono::{DateTime, Local, NaiveDate, Utc};
use serde::{Deserialize, Serialize};

use crate::session::SessionKind;

/// One finished session, as persisted in history.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SessionRecord {
    pub id: String,
    pub kind: SessionKind,
    pub week: u8,
    pub breaths: u32,
    /// Active time, excluding pauses.
    pub duration_secs: u64,
    pub started_at: DateTime<Utc>,
    pub ended_at: DateTime<Utc>,
}

impl SessionRecord {
    /// Calendar day the session ended on, in the user's local time zone.
    pub fn local_day(&self) -> NaiveDate {
        self.ended_at.with_timezone(&Local).date_naive()
    }

    pub fn duration_min(&self) -> f64 {
        self.duration_secs as f64 / 60.0
    }
}
