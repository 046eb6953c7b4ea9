use std::fmt;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};

use crate::Location;

pub const UNKNOWN_TITLE: &str = "Unknown Event";
pub const DATE_TBA: &str = "Date TBA";
pub const LOCATION_TBA: &str = "Location TBA";

/// Stable identity of an event: hex SHA-256 over `title|date|location|address`.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct EventId(String);

impl EventId {
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for EventId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Computes the identity of an event from its four identity fields.
///
/// Description, event type and provenance never take part, so the same
/// physical event found from two search origins collapses to one id.
pub fn fingerprint(title: &str, date: &str, location: &str, address: &str) -> EventId {
    let mut hasher = Sha256::new();
    hasher.update(title.as_bytes());
    hasher.update(b"|");
    hasher.update(date.as_bytes());
    hasher.update(b"|");
    hasher.update(location.as_bytes());
    hasher.update(b"|");
    hasher.update(address.as_bytes());
    EventId(format!("{:x}", hasher.finalize()))
}

/// Event fields recovered from one page element, before provenance is known.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EventCandidate {
    pub title: String,
    pub date: String,
    pub location: String,
    pub address: String,
    pub description: String,
    pub event_type: String,
}

impl Default for EventCandidate {
    fn default() -> Self {
        Self {
            title: UNKNOWN_TITLE.to_string(),
            date: DATE_TBA.to_string(),
            location: LOCATION_TBA.to_string(),
            address: String::new(),
            description: String::new(),
            event_type: String::new(),
        }
    }
}

impl EventCandidate {
    pub fn fingerprint(&self) -> EventId {
        fingerprint(&self.title, &self.date, &self.location, &self.address)
    }
}

/// The durable unit of output.
///
/// Only constructible from a candidate plus provenance, so `id` always
/// matches the identity fields it was derived from.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EventRecord {
    title: String,
    date: String,
    location: String,
    address: String,
    description: String,
    event_type: String,
    search_city: String,
    search_latitude: f64,
    search_longitude: f64,
    id: EventId,
    last_seen: DateTime<Utc>,
}

impl EventRecord {
    pub fn observe(candidate: EventCandidate, origin: &Location, seen_at: DateTime<Utc>) -> Self {
        let id = candidate.fingerprint();
        let EventCandidate {
            title,
            date,
            location,
            address,
            description,
            event_type,
        } = candidate;
        Self {
            title,
            date,
            location,
            address,
            description,
            event_type,
            search_city: origin.name.clone(),
            search_latitude: origin.latitude,
            search_longitude: origin.longitude,
            id,
            last_seen: seen_at,
        }
    }

    pub fn id(&self) -> &EventId {
        &self.id
    }

    pub fn title(&self) -> &str {
        &self.title
    }

    pub fn date(&self) -> &str {
        &self.date
    }

    pub fn location(&self) -> &str {
        &self.location
    }

    pub fn address(&self) -> &str {
        &self.address
    }

    pub fn description(&self) -> &str {
        &self.description
    }

    pub fn event_type(&self) -> &str {
        &self.event_type
    }

    pub fn search_city(&self) -> &str {
        &self.search_city
    }

    pub fn search_latitude(&self) -> f64 {
        self.search_latitude
    }

    pub fn search_longitude(&self) -> f64 {
        self.search_longitude
    }

    pub fn last_seen(&self) -> DateTime<Utc> {
        self.last_seen
    }

    /// Moves `last_seen` forward; an older timestamp leaves it unchanged.
    pub(crate) fn touch(&mut self, seen_at: DateTime<Utc>) {
        if seen_at > self.last_seen {
            self.last_seen = seen_at;
        }
    }

    /// Recomputes `id` from the identity fields. Used for records read back
    /// from a previous run, whose stored id is not trusted.
    pub(crate) fn rekey(mut self) -> Self {
        self.id = fingerprint(&self.title, &self.date, &self.location, &self.address);
        self
    }
}
