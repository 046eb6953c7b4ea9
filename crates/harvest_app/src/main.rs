mod acquirer;
mod cli;
mod config;
mod logging;
mod progress;

use std::sync::Arc;

use anyhow::Context;
use chrono::Utc;
use clap::Parser;
use harvest_core::MergeStore;
use harvest_engine::{load_result, AtomicFileWriter, Harvester};
use harvest_logging::{harvest_info, harvest_warn};
use tokio_util::sync::CancellationToken;

use crate::acquirer::build_acquirer;
use crate::cli::Args;
use crate::config::AppConfig;
use crate::progress::ConsoleProgress;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let args = Args::parse();
    let mut config = match &args.config {
        Some(path) => AppConfig::load(path)?,
        None => AppConfig::default(),
    };
    args.apply(&mut config);
    logging::initialize(config.log, args.log_level());

    run(config).await
}

async fn run(config: AppConfig) -> anyhow::Result<()> {
    let locations = config.locations();
    let extractor = config
        .extractor()
        .context("selector override is not usable")?;
    let acquirer = build_acquirer(&config).await?;

    let mut store = MergeStore::new();
    if config.carry_forward {
        let previous = load_result(&config.output).with_context(|| {
            format!("could not load previous output {}", config.output.display())
        })?;
        match previous {
            Some(previous) => {
                let carried = store.carry_forward(previous.events);
                harvest_info!(
                    "Carried forward {} events from {}",
                    carried,
                    config.output.display()
                );
            }
            None => harvest_info!("No previous output at {}", config.output.display()),
        }
    }

    let cancel = CancellationToken::new();
    tokio::spawn({
        let cancel = cancel.clone();
        async move {
            if tokio::signal::ctrl_c().await.is_ok() {
                harvest_warn!("Interrupted; writing what was harvested so far");
                cancel.cancel();
            }
        }
    });

    let mut harvester = Harvester::new(acquirer, config.harvest_settings())
        .with_extractor(Arc::new(extractor))
        .with_progress_sink(Arc::new(ConsoleProgress))
        .with_cancellation(cancel);
    if let Some(dir) = &config.dump_pages {
        harvester = harvester.with_page_dump(dir.clone());
    }
    let run = harvester.run(&locations, store).await;
    let interrupted = run.stats.interrupted;

    let writer = AtomicFileWriter::new(&config.output);
    let result = run
        .publish(&writer, Utc::now())
        .with_context(|| format!("could not write {}", writer.target().display()))?;
    harvest_info!("Saved {} events to {}", result.total_events, writer.target().display());

    println!(
        "{} events from {}/{} locations written to {}{}",
        result.total_events,
        result.successful_scrapes,
        result.locations_scraped,
        writer.target().display(),
        if interrupted { " (interrupted)" } else { "" }
    );
    Ok(())
}
