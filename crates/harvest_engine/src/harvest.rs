use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;

use chrono::{DateTime, NaiveDate, Utc};
use harvest_core::{
    classify, compose, Classification, EventRecord, HarvestResult, HarvestStats, Location,
    MergeOutcome, MergeStore,
};
use harvest_logging::{harvest_debug, harvest_info, harvest_warn};
use tokio_util::sync::CancellationToken;

use crate::{
    AtomicFileWriter, CascadeExtractor, Extractor, HarvestError, HarvestEvent, JitterRange,
    LocationOutcome, LocationReport, PageAcquirer,
};

pub type Clock = Arc<dyn Fn() -> DateTime<Utc> + Send + Sync>;

#[derive(Debug, Clone)]
pub struct HarvestSettings {
    /// Extra attempts for a location whose page is blocked.
    pub max_retries: u32,
    /// Backoff unit; the n-th retry waits `n * retry_backoff`.
    pub retry_backoff: Duration,
    /// Pause between consecutive locations.
    pub rate_limit: JitterRange,
}

impl Default for HarvestSettings {
    fn default() -> Self {
        Self {
            max_retries: 2,
            retry_backoff: Duration::from_secs(10),
            rate_limit: JitterRange::from_secs(2, 7),
        }
    }
}

pub trait ProgressSink: Send + Sync {
    fn emit(&self, event: HarvestEvent);
}

#[derive(Debug, Default)]
pub struct NoopProgressSink;

impl ProgressSink for NoopProgressSink {
    fn emit(&self, _event: HarvestEvent) {}
}

pub struct ChannelProgressSink {
    tx: std::sync::mpsc::Sender<HarvestEvent>,
}

impl ChannelProgressSink {
    pub fn new(tx: std::sync::mpsc::Sender<HarvestEvent>) -> Self {
        Self { tx }
    }
}

impl ProgressSink for ChannelProgressSink {
    fn emit(&self, event: HarvestEvent) {
        let _ = self.tx.send(event);
    }
}

/// Result of a (possibly interrupted) run: the accumulated store plus counters.
#[derive(Debug)]
pub struct HarvestRun {
    pub store: MergeStore,
    pub stats: HarvestStats,
}

impl HarvestRun {
    /// Composes the output document and writes it atomically.
    pub fn publish(
        self,
        writer: &AtomicFileWriter,
        last_updated: DateTime<Utc>,
    ) -> Result<HarvestResult, HarvestError> {
        let result = compose(self.store.into_records(), self.stats, last_updated);
        writer.write_result(&result)?;
        Ok(result)
    }
}

/// Drives the per-location loop: acquire, classify, retry, extract, merge.
///
/// Locations are processed strictly one after another; the store is owned by
/// the loop, so merges never race.
pub struct Harvester {
    acquirer: Arc<dyn PageAcquirer>,
    extractor: Arc<dyn Extractor>,
    settings: HarvestSettings,
    clock: Clock,
    sink: Arc<dyn ProgressSink>,
    cancel: CancellationToken,
    page_dump: Option<PathBuf>,
}

impl Harvester {
    pub fn new(acquirer: Arc<dyn PageAcquirer>, settings: HarvestSettings) -> Self {
        Self {
            acquirer,
            extractor: Arc::new(CascadeExtractor::new()),
            settings,
            clock: Arc::new(Utc::now),
            sink: Arc::new(NoopProgressSink),
            cancel: CancellationToken::new(),
            page_dump: None,
        }
    }

    pub fn with_extractor(mut self, extractor: Arc<dyn Extractor>) -> Self {
        self.extractor = extractor;
        self
    }

    pub fn with_clock(mut self, clock: Clock) -> Self {
        self.clock = clock;
        self
    }

    pub fn with_progress_sink(mut self, sink: Arc<dyn ProgressSink>) -> Self {
        self.sink = sink;
        self
    }

    pub fn with_cancellation(mut self, cancel: CancellationToken) -> Self {
        self.cancel = cancel;
        self
    }

    /// Saves the page of every location whose markup matched no strategy
    /// into `dir`, one `<location>.html` per location.
    pub fn with_page_dump(mut self, dir: impl Into<PathBuf>) -> Self {
        self.page_dump = Some(dir.into());
        self
    }

    pub async fn run(&self, locations: &[Location], mut store: MergeStore) -> HarvestRun {
        let as_of = (self.clock)().date_naive();
        let total = locations.len();
        let mut stats = HarvestStats::default();
        harvest_info!("Harvesting {} locations for {}", total, as_of);

        for (index, location) in locations.iter().enumerate() {
            if self.cancel.is_cancelled() {
                stats.interrupted = true;
                break;
            }

            stats.locations_scraped += 1;
            self.sink.emit(HarvestEvent::LocationStarted {
                index,
                total,
                location: location.name.clone(),
            });
            harvest_info!(
                "[{}/{}] {} ({}, {})",
                index + 1,
                total,
                location.name,
                location.latitude,
                location.longitude
            );

            let (mut report, records) = self.harvest_location(location, as_of).await;
            let found = records.len();
            let mut new_events = 0;
            for record in records {
                if store.merge(record) == MergeOutcome::Inserted {
                    new_events += 1;
                }
            }
            if let LocationOutcome::Extracted { .. } = report.outcome {
                report.outcome = LocationOutcome::Extracted { found, new_events };
            }
            if report.outcome.contributed() {
                stats.successful_scrapes += 1;
            }
            self.sink.emit(HarvestEvent::LocationFinished(report));

            // Cancellation may have cut a retry backoff short.
            if self.cancel.is_cancelled() {
                stats.interrupted = true;
                break;
            }
            if index + 1 < total && !self.pause(self.settings.rate_limit.sample()).await {
                stats.interrupted = true;
                break;
            }
        }

        harvest_info!(
            "Harvest finished: {}/{} locations yielded events, {} unique events{}",
            stats.successful_scrapes,
            stats.locations_scraped,
            store.len(),
            if stats.interrupted { " (interrupted)" } else { "" }
        );
        HarvestRun { store, stats }
    }

    /// Processes one location and returns its report with the stamped
    /// records. Never fails: every problem degrades to zero records.
    pub async fn harvest_location(
        &self,
        location: &Location,
        as_of: NaiveDate,
    ) -> (LocationReport, Vec<EventRecord>) {
        let query = location.query(as_of);
        let mut attempts = 0;

        let content = loop {
            attempts += 1;
            let content = match self.acquirer.acquire(&query).await {
                Ok(content) => content,
                Err(err) => {
                    harvest_warn!("{}: acquisition failed: {}", location.name, err);
                    let outcome = LocationOutcome::AcquisitionFailed(err.kind);
                    return without_records(location, outcome, attempts);
                }
            };

            match classify(&content.html) {
                Classification::Clean => break content,
                Classification::Empty => {
                    harvest_info!("{}: no events listed", location.name);
                    return without_records(location, LocationOutcome::Empty, attempts);
                }
                Classification::Blocked => {
                    if attempts > self.settings.max_retries {
                        harvest_warn!(
                            "{}: still blocked after {} attempts, skipping",
                            location.name,
                            attempts
                        );
                        return without_records(location, LocationOutcome::Blocked, attempts);
                    }
                    let backoff = self.settings.retry_backoff * attempts;
                    harvest_warn!(
                        "{}: blocked (attempt {}), retrying in {:?}",
                        location.name,
                        attempts,
                        backoff
                    );
                    if !self.pause(backoff).await {
                        return without_records(location, LocationOutcome::Blocked, attempts);
                    }
                }
            }
        };

        let extraction = self.extractor.extract(&content.html, Some(&location.name));
        let Some(strategy) = extraction.strategy else {
            harvest_warn!(
                "{}: no event markup matched; selectors may need an update",
                location.name
            );
            if let Some(dir) = &self.page_dump {
                dump_page(dir, location, &content.html);
            }
            return without_records(location, LocationOutcome::NoMarkup, attempts);
        };

        harvest_debug!(
            "{}: strategy {} gave {} candidates ({} skipped)",
            location.name,
            strategy,
            extraction.candidates.len(),
            extraction.skipped
        );
        let seen_at = (self.clock)();
        let records: Vec<EventRecord> = extraction
            .candidates
            .into_iter()
            .map(|candidate| EventRecord::observe(candidate, location, seen_at))
            .collect();
        harvest_info!("{}: {} events", location.name, records.len());

        let outcome = LocationOutcome::Extracted {
            found: records.len(),
            new_events: 0,
        };
        (
            LocationReport {
                location: location.name.clone(),
                outcome,
                attempts,
            },
            records,
        )
    }

    /// Waits unless cancelled. Returns `false` when the wait was cut short.
    async fn pause(&self, duration: Duration) -> bool {
        if duration.is_zero() {
            return !self.cancel.is_cancelled();
        }
        tokio::select! {
            _ = tokio::time::sleep(duration) => true,
            _ = self.cancel.cancelled() => false,
        }
    }
}

fn dump_page(dir: &Path, location: &Location, html: &str) {
    let target = dir.join(format!("{}.html", file_stem(&location.name)));
    match AtomicFileWriter::new(&target).write(html) {
        Ok(()) => harvest_info!("{}: page saved to {}", location.name, target.display()),
        Err(err) => harvest_warn!("{}: could not save page: {}", location.name, err),
    }
}

/// "San Antonio" -> "san-antonio".
fn file_stem(name: &str) -> String {
    let mut stem = String::with_capacity(name.len());
    for ch in name.chars() {
        if ch.is_alphanumeric() {
            stem.extend(ch.to_lowercase());
        } else if !stem.is_empty() && !stem.ends_with('-') {
            stem.push('-');
        }
    }
    while stem.ends_with('-') {
        stem.pop();
    }
    if stem.is_empty() {
        stem.push_str("location");
    }
    stem
}

fn without_records(
    location: &Location,
    outcome: LocationOutcome,
    attempts: u32,
) -> (LocationReport, Vec<EventRecord>) {
    (
        LocationReport {
            location: location.name.clone(),
            outcome,
            attempts,
        },
        Vec::new(),
    )
}
