use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::EventRecord;

/// Per-run counters reported alongside the events.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct HarvestStats {
    /// Locations whose processing was attempted.
    pub locations_scraped: usize,
    /// Locations that contributed at least one record.
    pub successful_scrapes: usize,
    /// Set when the run stopped early on an interrupt.
    pub interrupted: bool,
}

/// The persisted document for one harvest run.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HarvestResult {
    pub last_updated: DateTime<Utc>,
    pub total_events: usize,
    pub locations_scraped: usize,
    pub successful_scrapes: usize,
    pub events: Vec<EventRecord>,
}

/// Sorts records by their free-text `date` (plain string order, ties keep
/// discovery order) and wraps them with the run counters.
pub fn compose(
    mut events: Vec<EventRecord>,
    stats: HarvestStats,
    last_updated: DateTime<Utc>,
) -> HarvestResult {
    events.sort_by(|a, b| a.date().cmp(b.date()));
    HarvestResult {
        last_updated,
        total_events: events.len(),
        locations_scraped: stats.locations_scraped,
        successful_scrapes: stats.successful_scrapes,
        events,
    }
}
