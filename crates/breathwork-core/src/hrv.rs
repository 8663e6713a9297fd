//! Correlation of breathing sessions with externally exported readiness /
//! HRV scores.
//!
//! The export is a JSON document of the form
//! `{ "data": [ { "day": "2026-03-01", "score": 78 }, ... ] }`. Entries
//! without a score count as zero readiness.

use std::collections::HashSet;
use std::path::Path;

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use crate::error::Result;
use crate::history::SessionRecord;

pub const DEFAULT_WINDOW_DAYS: usize = 14;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HrvDay {
    pub day: NaiveDate,
    #[serde(default)]
    pub score: Option<u32>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct HrvData {
    #[serde(default)]
    pub data: Vec<HrvDay>,
}

impl HrvData {
    pub fn from_json(json: &str) -> Result<Self> {
        let mut data: HrvData = serde_json::from_str(json)?;
        data.data.sort_by_key(|d| d.day);
        Ok(data)
    }

    /// Read an export from disk.
    ///
    /// # Errors
    /// Returns an error if the file cannot be read or is not valid JSON.
    pub fn load(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)?;
        Self::from_json(&content)
    }

    /// Like [`HrvData::load`], but a missing or broken export is simply empty.
    pub fn load_or_empty(path: &Path) -> Self {
        Self::load(path).unwrap_or_else(|e| {
            tracing::warn!("HRV data not available at {}: {}", path.display(), e);
            Self::default()
        })
    }
}

/// One day of the correlation view.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CorrelatedDay {
    pub day: NaiveDate,
    pub readiness: u32,
    pub had_session: bool,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct HrvSummary {
    pub days: usize,
    pub session_days: usize,
    pub mean_readiness_with_session: Option<f64>,
    pub mean_readiness_without_session: Option<f64>,
}

/// Mark each of the last `window` exported days with whether a session
/// finished on it.
pub fn correlate(data: &HrvData, history: &[SessionRecord], window: usize) -> Vec<CorrelatedDay> {
    let practiced: HashSet<NaiveDate> = history.iter().map(|r| r.local_day()).collect();
    let skip = data.data.len().saturating_sub(window);
    data.data
        .iter()
        .skip(skip)
        .map(|d| CorrelatedDay {
            day: d.day,
            readiness: d.score.unwrap_or(0),
            had_session: practiced.contains(&d.day),
        })
        .collect()
}

pub fn summarize(days: &[CorrelatedDay]) -> HrvSummary {
    fn mean<'a>(it: impl Iterator<Item = &'a CorrelatedDay>) -> Option<f64> {
        let (sum, n) = it.fold((0u64, 0u64), |(s, n), d| (s + d.readiness as u64, n + 1));
        (n > 0).then(|| sum as f64 / n as f64)
    }

    HrvSummary {
        days: days.len(),
        session_days: days.iter().filter(|d| d.had_session).count(),
        mean_readiness_with_session: mean(days.iter().filter(|d| d.had_session)),
        mean_readiness_without_session: mean(days.iter().filter(|d| !d.had_session)),
    }
}
