use std::path::PathBuf;

use clap::Parser;
use log::LevelFilter;

use crate::acquirer::AcquirerKind;
use crate::config::AppConfig;
use crate::logging::LogDestination;

#[derive(Debug, Parser)]
#[command(
    name = "event-harvest",
    about = "Harvests event listings from a grid of search locations into one JSON document",
    version
)]
pub struct Args {
    /// RON config file. Built-in defaults apply when omitted.
    #[arg(long)]
    pub config: Option<PathBuf>,

    /// Output JSON path.
    #[arg(short, long)]
    pub output: Option<PathBuf>,

    /// Merge the previous document at the output path into this run.
    #[arg(long)]
    pub carry_forward: bool,

    /// Only harvest the first N locations.
    #[arg(long, value_name = "N")]
    pub limit: Option<usize>,

    /// How pages are fetched.
    #[arg(long, value_enum)]
    pub acquirer: Option<AcquirerKind>,

    /// Save pages whose markup matched no selector into DIR.
    #[arg(long, value_name = "DIR")]
    pub dump_pages: Option<PathBuf>,

    /// Where log output goes.
    #[arg(long, value_enum)]
    pub log: Option<LogDestination>,

    /// Log at debug level.
    #[arg(short, long)]
    pub verbose: bool,
}

impl Args {
    /// Applies flags on top of the file config; flags always win.
    pub fn apply(&self, config: &mut AppConfig) {
        if let Some(output) = &self.output {
            config.output = output.clone();
        }
        if self.carry_forward {
            config.carry_forward = true;
        }
        if let Some(limit) = self.limit {
            config.limit = Some(limit);
        }
        if let Some(acquirer) = self.acquirer {
            config.acquirer = acquirer;
        }
        if let Some(dir) = &self.dump_pages {
            config.dump_pages = Some(dir.clone());
        }
        if let Some(log) = self.log {
            config.log = log;
        }
    }

    pub fn log_level(&self) -> LevelFilter {
        if self.verbose {
            LevelFilter::Debug
        } else {
            LevelFilter::Info
        }
    }
}
