//! tunepress - ABC tunebook to MP3 batch renderer
//!
//! Reads one ABC source document, stamps a fixed MIDI directive set into
//! every tune, and renders each tune to a peak-normalized MP3 through
//! abc2midi, fluidsynth, and libmp3lame. Tunes are processed independently
//! on a bounded worker pool; one bad tune never stops the batch.

use anyhow::Result;
use clap::Parser;
use tracing::{info, warn};
use tunepress::config::{Args, Config};
use tunepress::orchestrator::{BatchOrchestrator, TuneResult};

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive(tracing::Level::INFO.into()),
        )
        .init();

    info!(
        "Starting tunepress v{} [{}] built {} ({})",
        env!("CARGO_PKG_VERSION"),
        env!("GIT_HASH"),
        env!("BUILD_TIMESTAMP"),
        env!("BUILD_PROFILE")
    );

    let config = Config::resolve(Args::parse())?;
    info!(
        source = %config.source.display(),
        output_dir = %config.output_dir.display(),
        sound_font = %config.sound_font.display(),
        workers = config.workers,
        strict = config.strict,
        "Configuration resolved"
    );

    let report = BatchOrchestrator::new(config).run().await?;

    for outcome in &report.outcomes {
        if let TuneResult::Failed(reason) = &outcome.result {
            warn!(tune = %outcome.label, reason = %reason, "Not converted");
        }
    }
    info!(
        converted = report.converted(),
        failed = report.failed(),
        "Done"
    );

    Ok(())
}
