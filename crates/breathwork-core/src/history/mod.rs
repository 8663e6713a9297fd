//! Completed session records and the daily practice streak.

mod record;
mod streak;

pub use record::SessionRecord;
pub use streak::StreakState;
