//! Harvest core: pure domain types, event identity, deduplication and
//! content classification. No IO happens here.
mod classify;
mod envelope;
mod location;
mod record;
mod store;

pub use classify::{classify, Classification, BLOCKED_MARKERS, EMPTY_MARKERS};
pub use envelope::{compose, HarvestResult, HarvestStats};
pub use location::{default_locations, Location, RawQuery};
pub use record::{
    fingerprint, EventCandidate, EventId, EventRecord, DATE_TBA, LOCATION_TBA, UNKNOWN_TITLE,
};
pub use store::{MergeOutcome, MergeStore};
