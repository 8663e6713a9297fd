//! Consecutive-day practice streak.
//!
//! The streak counts calendar days in a row with at least one finished
//! session. Only finished sessions move it; reading it never does.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct StreakState {
    pub streak: u32,
    #[serde(default)]
    pub last_session_date: Option<NaiveDate>,
}

impl StreakState {
    /// Register a finished session on `day` and return the new streak.
    pub fn record_session(&mut self, day: NaiveDate) -> u32 {
        match self.last_session_date {
            None => {
                self.streak = 1;
                self.last_session_date = Some(day);
            }
            Some(last) => {
                let days_since = (day - last).num_days();
                match days_since {
                    0 => self.streak = self.streak.max(1),
                    1 => {
                        self.streak += 1;
                        self.last_session_date = Some(day);
                    }
                    d if d > 1 => {
                        tracing::info!("Streak of {} broken after {} days", self.streak, d);
                        self.streak = 1;
                        self.last_session_date = Some(day);
                    }
                    // Clock moved backwards; keep the later date.
                    _ => {}
                }
            }
        }
        self.streak
    }

    /// Streak as seen on `today`: zero once a whole day was missed.
    pub fn current(&self, today: NaiveDate) -> u32 {
        match self.last_session_date {
            Some(last) if (today - last).num_days() <= 1 => self.streak,
            _ => 0,
        }
    }
}
