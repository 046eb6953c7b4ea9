use harvest_core::{EventCandidate, DATE_TBA, LOCATION_TBA, UNKNOWN_TITLE};
use harvest_logging::{harvest_debug, harvest_warn};
use scraper::{ElementRef, Html, Selector};

use crate::text::{visible_lines, visible_text};

pub const DEFAULT_MAX_ELEMENTS: usize = 20;
/// Longest title kept when a whole element's text becomes the title.
pub const MAX_FALLBACK_TITLE_CHARS: usize = 200;

/// Container selectors, most specific first.
pub const DEFAULT_STRATEGIES: &[&str] = &[
    ".event-item",
    ".event-card",
    "[class*='event']",
    "[data-event-id]",
];

const TITLE_SELECTORS: &[&str] = &[".event-title", "h3"];
const DATE_SELECTORS: &[&str] = &[".event-date", ".date"];
const LOCATION_SELECTORS: &[&str] = &[".event-location", ".location"];
const ADDRESS_SELECTORS: &[&str] = &[".event-address", ".address"];
const DESCRIPTION_SELECTORS: &[&str] = &[".event-description"];
const TYPE_SELECTORS: &[&str] = &[".event-type"];

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Extraction {
    pub candidates: Vec<EventCandidate>,
    /// Selector of the strategy that matched, `None` when nothing did.
    pub strategy: Option<String>,
    /// Matched elements that produced no candidate.
    pub skipped: usize,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExtractionSkip {
    NoText,
}

#[derive(Debug, thiserror::Error, PartialEq, Eq)]
pub enum ExtractError {
    #[error("invalid selector {selector:?}: {message}")]
    InvalidSelector { selector: String, message: String },
    #[error("at least one selector strategy is required")]
    NoStrategies,
}

pub trait Extractor: Send + Sync {
    /// Recovers event candidates from clean page content. `origin` names the
    /// search city and is the location fallback for positional parsing.
    fn extract(&self, html: &str, origin: Option<&str>) -> Extraction;
}

struct Strategy {
    source: String,
    selector: Selector,
}

/// Selector cascade with per-field fallbacks and a positional text fallback.
pub struct CascadeExtractor {
    strategies: Vec<Strategy>,
    fields: FieldSelectors,
    max_elements: usize,
}

impl CascadeExtractor {
    pub fn new() -> Self {
        let strategies = DEFAULT_STRATEGIES
            .iter()
            .filter_map(|source| {
                parse_logged(source).map(|selector| Strategy {
                    source: source.to_string(),
                    selector,
                })
            })
            .collect();
        Self {
            strategies,
            fields: FieldSelectors::new(),
            max_elements: DEFAULT_MAX_ELEMENTS,
        }
    }

    /// Replaces the container cascade, e.g. after the target's markup changed.
    pub fn with_strategies<S: AsRef<str>>(sources: &[S]) -> Result<Self, ExtractError> {
        if sources.is_empty() {
            return Err(ExtractError::NoStrategies);
        }
        let strategies = sources
            .iter()
            .map(|source| {
                let source = source.as_ref();
                Selector::parse(source)
                    .map(|selector| Strategy {
                        source: source.to_string(),
                        selector,
                    })
                    .map_err(|err| ExtractError::InvalidSelector {
                        selector: source.to_string(),
                        message: err.to_string(),
                    })
            })
            .collect::<Result<Vec<_>, _>>()?;
        Ok(Self {
            strategies,
            ..Self::new()
        })
    }

    pub fn with_max_elements(mut self, max_elements: usize) -> Self {
        self.max_elements = max_elements;
        self
    }

    pub fn strategy_sources(&self) -> Vec<&str> {
        self.strategies.iter().map(|s| s.source.as_str()).collect()
    }

    fn parse_element(
        &self,
        element: ElementRef<'_>,
        origin: Option<&str>,
    ) -> Result<EventCandidate, ExtractionSkip> {
        let lines = visible_lines(element);
        if lines.is_empty() {
            return Err(ExtractionSkip::NoText);
        }
        Ok(self
            .fields
            .extract(element)
            .unwrap_or_else(|| positional(lines, origin)))
    }
}

impl Default for CascadeExtractor {
    fn default() -> Self {
        Self::new()
    }
}

impl Extractor for CascadeExtractor {
    fn extract(&self, html: &str, origin: Option<&str>) -> Extraction {
        let doc = Html::parse_document(html);

        let matched = self.strategies.iter().find_map(|strategy| {
            let elements: Vec<ElementRef<'_>> = doc.select(&strategy.selector).collect();
            (!elements.is_empty()).then_some((strategy, elements))
        });

        let Some((strategy, elements)) = matched else {
            return Extraction {
                candidates: Vec::new(),
                strategy: None,
                skipped: 0,
            };
        };

        if elements.len() > self.max_elements {
            harvest_debug!(
                "Strategy {} matched {} elements, keeping the first {}",
                strategy.source,
                elements.len(),
                self.max_elements
            );
        }

        let mut candidates = Vec::new();
        let mut skipped = 0;
        for element in elements.into_iter().take(self.max_elements) {
            match self.parse_element(element, origin) {
                Ok(candidate) => candidates.push(candidate),
                Err(reason) => {
                    harvest_debug!("Skipping element matched by {}: {:?}", strategy.source, reason);
                    skipped += 1;
                }
            }
        }

        Extraction {
            candidates,
            strategy: Some(strategy.source.clone()),
            skipped,
        }
    }
}

struct FieldSelectors {
    title: Vec<Selector>,
    date: Vec<Selector>,
    location: Vec<Selector>,
    address: Vec<Selector>,
    description: Vec<Selector>,
    event_type: Vec<Selector>,
}

impl FieldSelectors {
    fn new() -> Self {
        Self {
            title: parse_chain(TITLE_SELECTORS),
            date: parse_chain(DATE_SELECTORS),
            location: parse_chain(LOCATION_SELECTORS),
            address: parse_chain(ADDRESS_SELECTORS),
            description: parse_chain(DESCRIPTION_SELECTORS),
            event_type: parse_chain(TYPE_SELECTORS),
        }
    }

    /// Field-by-field extraction. `None` when the element has none of the
    /// known field markup at all.
    fn extract(&self, element: ElementRef<'_>) -> Option<EventCandidate> {
        let title = first_text(element, &self.title);
        let date = first_text(element, &self.date);
        let location = first_text(element, &self.location);
        let address = first_text(element, &self.address);
        let description = first_lines(element, &self.description);
        let event_type = first_text(element, &self.event_type);

        let found_any = [&title, &date, &location, &address, &description, &event_type]
            .iter()
            .any(|field| field.is_some());
        if !found_any {
            return None;
        }

        Some(EventCandidate {
            title: title.unwrap_or_else(|| UNKNOWN_TITLE.to_string()),
            date: date.unwrap_or_else(|| DATE_TBA.to_string()),
            location: location.unwrap_or_else(|| LOCATION_TBA.to_string()),
            address: address.unwrap_or_default(),
            description: description.unwrap_or_default(),
            event_type: event_type.unwrap_or_default(),
        })
    }
}

/// Line 0 title, 1 date, 2 location, 3 address, the rest description.
/// A single line becomes a (truncated) title on its own.
fn positional(mut lines: Vec<String>, origin: Option<&str>) -> EventCandidate {
    let location_default = origin.unwrap_or(LOCATION_TBA).to_string();
    if lines.len() < 2 {
        let title = lines.pop().unwrap_or_default();
        return EventCandidate {
            title: truncate_chars(&title, MAX_FALLBACK_TITLE_CHARS),
            location: location_default,
            ..EventCandidate::default()
        };
    }

    let description = if lines.len() > 4 {
        lines.split_off(4).join("\n")
    } else {
        String::new()
    };
    let mut fields = lines.into_iter();
    EventCandidate {
        title: fields.next().unwrap_or_else(|| UNKNOWN_TITLE.to_string()),
        date: fields.next().unwrap_or_else(|| DATE_TBA.to_string()),
        location: fields.next().unwrap_or(location_default),
        address: fields.next().unwrap_or_default(),
        description,
        event_type: String::new(),
    }
}

fn first_text(element: ElementRef<'_>, chain: &[Selector]) -> Option<String> {
    chain.iter().find_map(|selector| {
        element
            .select(selector)
            .map(visible_text)
            .find(|text| !text.is_empty())
    })
}

fn first_lines(element: ElementRef<'_>, chain: &[Selector]) -> Option<String> {
    chain.iter().find_map(|selector| {
        element
            .select(selector)
            .map(|node| visible_lines(node).join("\n"))
            .find(|text| !text.is_empty())
    })
}

fn parse_chain(sources: &[&str]) -> Vec<Selector> {
    sources.iter().filter_map(|source| parse_logged(source)).collect()
}

fn parse_logged(source: &str) -> Option<Selector> {
    match Selector::parse(source) {
        Ok(selector) => Some(selector),
        Err(err) => {
            harvest_warn!("Ignoring invalid selector {:?}: {}", source, err);
            None
        }
    }
}

fn truncate_chars(text: &str, max: usize) -> String {
    text.chars().take(max).collect()
}
