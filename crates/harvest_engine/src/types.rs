use std::fmt;

/// Rendered page content for one query.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AcquiredContent {
    pub html: String,
    pub final_url: String,
    pub status: u16,
    pub encoding_label: String,
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("{kind}: {message}")]
pub struct AcquisitionError {
    pub kind: FailureKind,
    pub message: String,
}

impl AcquisitionError {
    pub fn new(kind: FailureKind, message: impl Into<String>) -> Self {
        Self {
            kind,
            message: message.into(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FailureKind {
    InvalidUrl,
    HttpStatus(u16),
    Timeout,
    TooLarge { max_bytes: u64, actual: Option<u64> },
    Decode { encoding: String },
    Backend,
    Network,
}

impl fmt::Display for FailureKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FailureKind::InvalidUrl => write!(f, "invalid url"),
            FailureKind::HttpStatus(code) => write!(f, "http status {code}"),
            FailureKind::Timeout => write!(f, "timeout"),
            FailureKind::TooLarge { max_bytes, actual } => {
                write!(f, "response too large (max {max_bytes}, actual {actual:?})")
            }
            FailureKind::Decode { encoding } => write!(f, "could not decode body as {encoding}"),
            FailureKind::Backend => write!(f, "acquisition backend unavailable"),
            FailureKind::Network => write!(f, "network error"),
        }
    }
}

/// How a single location ended.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LocationOutcome {
    /// Extraction ran; `found` candidates, `new_events` of them first seen.
    Extracted { found: usize, new_events: usize },
    /// Page was clean but no selector strategy matched.
    NoMarkup,
    /// Target reported no events.
    Empty,
    /// Still blocked after the retry ceiling.
    Blocked,
    AcquisitionFailed(FailureKind),
}

impl LocationOutcome {
    pub fn contributed(&self) -> bool {
        matches!(self, LocationOutcome::Extracted { found, .. } if *found > 0)
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LocationReport {
    pub location: String,
    pub outcome: LocationOutcome,
    /// Number of calls made to the page acquirer.
    pub attempts: u32,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum HarvestEvent {
    LocationStarted {
        index: usize,
        total: usize,
        location: String,
    },
    LocationFinished(LocationReport),
}
