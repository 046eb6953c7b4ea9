//! Harvest engine: page acquisition, extraction and the harvest loop.
mod acquire;
#[cfg(feature = "browser")]
mod browser;
mod extract;
mod harvest;
mod jitter;
mod persist;
mod text;
mod types;

pub use acquire::{search_url, AcquireSettings, HttpAcquirer, PageAcquirer, DEFAULT_USER_AGENT};
#[cfg(feature = "browser")]
pub use browser::{find_browser, BrowserAcquirer, BROWSER_PATH_ENV};
pub use extract::{
    CascadeExtractor, ExtractError, Extraction, ExtractionSkip, Extractor, DEFAULT_MAX_ELEMENTS,
    DEFAULT_STRATEGIES, MAX_FALLBACK_TITLE_CHARS,
};
pub use harvest::{
    ChannelProgressSink, Clock, HarvestRun, HarvestSettings, Harvester, NoopProgressSink,
    ProgressSink,
};
pub use jitter::JitterRange;
pub use persist::{load_result, AtomicFileWriter, PersistError};
pub use types::{
    AcquiredContent, AcquisitionError, FailureKind, HarvestEvent, LocationOutcome, LocationReport,
};

/// Failures that end a run instead of degrading a single location.
#[derive(Debug, thiserror::Error)]
pub enum HarvestError {
    #[error("page acquirer could not start: {0}")]
    AcquirerInit(AcquisitionError),
    #[error(transparent)]
    Persist(#[from] PersistError),
}
