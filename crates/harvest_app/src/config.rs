use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

use anyhow::Context;
use harvest_core::{default_locations, Location};
use harvest_engine::{
    AcquireSettings, CascadeExtractor, ExtractError, HarvestSettings, JitterRange,
    DEFAULT_MAX_ELEMENTS,
};
use serde::{Deserialize, Serialize};

use crate::acquirer::AcquirerKind;
use crate::logging::LogDestination;

/// A wait range in whole seconds, as written in the config file.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct SecondsRange {
    pub min: u64,
    pub max: u64,
}

impl From<JitterRange> for SecondsRange {
    fn from(range: JitterRange) -> Self {
        Self {
            min: range.min().as_secs(),
            max: range.max().as_secs(),
        }
    }
}

impl From<SecondsRange> for JitterRange {
    fn from(range: SecondsRange) -> Self {
        JitterRange::from_secs(range.min, range.max)
    }
}

/// Settings read from the optional RON config file. Every field may be
/// omitted; command-line flags win over anything set here.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct AppConfig {
    pub output: PathBuf,
    pub carry_forward: bool,
    /// Replaces the built-in location grid.
    pub locations: Option<Vec<Location>>,
    pub limit: Option<usize>,
    pub log: LogDestination,
    /// Replaces the default container selector cascade.
    pub selectors: Option<Vec<String>>,
    pub max_elements: usize,
    /// Saves pages that matched no selector here, for selector debugging.
    pub dump_pages: Option<PathBuf>,
    pub acquirer: AcquirerKind,
    /// Chrome executable for the browser acquirer; searched for when unset.
    pub browser_path: Option<PathBuf>,
    pub base_url: String,
    pub user_agent: String,
    pub request_timeout_secs: u64,
    pub settle_secs: SecondsRange,
    pub rate_limit_secs: SecondsRange,
    pub retry_backoff_secs: u64,
    pub max_retries: u32,
}

impl Default for AppConfig {
    fn default() -> Self {
        let acquire = AcquireSettings::default();
        let harvest = HarvestSettings::default();
        Self {
            output: PathBuf::from("events.json"),
            carry_forward: false,
            locations: None,
            limit: None,
            log: LogDestination::default(),
            selectors: None,
            max_elements: DEFAULT_MAX_ELEMENTS,
            dump_pages: None,
            acquirer: AcquirerKind::default(),
            browser_path: None,
            base_url: acquire.base_url,
            user_agent: acquire.user_agent,
            request_timeout_secs: acquire.request_timeout.as_secs(),
            settle_secs: acquire.settle.into(),
            rate_limit_secs: harvest.rate_limit.into(),
            retry_backoff_secs: harvest.retry_backoff.as_secs(),
            max_retries: harvest.max_retries,
        }
    }
}

impl AppConfig {
    pub fn load(path: &Path) -> anyhow::Result<Self> {
        let content = fs::read_to_string(path)
            .with_context(|| format!("could not read config {}", path.display()))?;
        Self::parse(&content).with_context(|| format!("invalid config {}", path.display()))
    }

    pub fn parse(content: &str) -> anyhow::Result<Self> {
        Ok(ron::from_str(content)?)
    }

    /// The query plan for this run, cut to `limit` when one is set.
    pub fn locations(&self) -> Vec<Location> {
        let mut locations = self.locations.clone().unwrap_or_else(default_locations);
        if let Some(limit) = self.limit {
            locations.truncate(limit);
        }
        locations
    }

    pub fn acquire_settings(&self) -> AcquireSettings {
        AcquireSettings {
            base_url: self.base_url.clone(),
            user_agent: self.user_agent.clone(),
            request_timeout: Duration::from_secs(self.request_timeout_secs),
            settle: self.settle_secs.into(),
            ..AcquireSettings::default()
        }
    }

    pub fn harvest_settings(&self) -> HarvestSettings {
        HarvestSettings {
            max_retries: self.max_retries,
            retry_backoff: Duration::from_secs(self.retry_backoff_secs),
            rate_limit: self.rate_limit_secs.into(),
        }
    }

    pub fn extractor(&self) -> Result<CascadeExtractor, ExtractError> {
        let extractor = match &self.selectors {
            Some(selectors) => CascadeExtractor::with_strategies(selectors.as_slice())?,
            None => CascadeExtractor::new(),
        };
        Ok(extractor.with_max_elements(self.max_elements))
    }
}
