/// Outcome of inspecting acquired page content.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Classification {
    Clean,
    /// An anti-automation system answered instead of the target.
    Blocked,
    /// The target explicitly reported that nothing matched the query.
    Empty,
}

pub const BLOCKED_MARKERS: &[&str] = &[
    "incapsula",
    "_incapsula_resource",
    "access denied",
    "request unsuccessful",
    "pardon our interruption",
    "please verify you are a human",
];

pub const EMPTY_MARKERS: &[&str] = &["no events", "no results"];

/// Classifies page content by case-insensitive marker matching.
/// Blocking markers take precedence over "no results" phrasing.
pub fn classify(content: &str) -> Classification {
    let lowered = content.to_lowercase();
    if BLOCKED_MARKERS.iter().any(|marker| lowered.contains(marker)) {
        Classification::Blocked
    } else if EMPTY_MARKERS.iter().any(|marker| lowered.contains(marker)) {
        Classification::Empty
    } else {
        Classification::Clean
    }
}
