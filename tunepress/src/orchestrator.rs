//! Batch orchestration
//!
//! Splits the tunebook, injects the directive set into every tune, and fans
//! the tunes out across a bounded worker pool. Every tune gets exactly one
//! outcome; a failing tune never takes its siblings down, and the collected
//! outcomes become the end-of-run batch report.

use crate::config::Config;
use crate::error::{Error, Result};
use crate::notation;
use crate::pipeline::ConversionPipeline;
use chrono::{DateTime, Utc};
use std::path::PathBuf;
use std::sync::Arc;
use tokio::sync::Semaphore;
use tokio::task::JoinSet;
use tracing::{error, info, warn};

/// What became of one tune
#[derive(Debug, Clone)]
pub enum TuneResult {
    /// MP3 written to this path
    Converted(PathBuf),
    /// Pipeline failed; human-readable reason
    Failed(String),
}

/// Per-tune outcome
#[derive(Debug, Clone)]
pub struct TuneOutcome {
    /// Zero-based position in the source document
    pub position: usize,
    /// Display label: the output stem when derivable, else `tune <n>`
    pub label: String,
    pub result: TuneResult,
}

/// Aggregated results for one run, in source-document order
#[derive(Debug)]
pub struct BatchReport {
    pub outcomes: Vec<TuneOutcome>,
    pub started: DateTime<Utc>,
    pub finished: DateTime<Utc>,
}

impl BatchReport {
    pub fn converted(&self) -> usize {
        self.outcomes
            .iter()
            .filter(|o| matches!(o.result, TuneResult::Converted(_)))
            .count()
    }

    pub fn failed(&self) -> usize {
        self.outcomes.len() - self.converted()
    }
}

/// Whole-tunebook driver
pub struct BatchOrchestrator {
    config: Arc<Config>,
}

impl BatchOrchestrator {
    pub fn new(config: Config) -> Self {
        Self {
            config: Arc::new(config),
        }
    }

    /// Run the whole batch: read, split, inject, render, report.
    ///
    /// Only configuration and source-document problems are errors here;
    /// per-tune failures live inside the report.
    pub async fn run(&self) -> Result<BatchReport> {
        let started = Utc::now();

        let document = tokio::fs::read_to_string(&self.config.source)
            .await
            .map_err(|e| {
                Error::Config(format!(
                    "cannot read source document {}: {}",
                    self.config.source.display(),
                    e
                ))
            })?;

        let directives = self.config.midi_directives();
        let tunes: Vec<String> = notation::split_tunes(&document)
            .map(|body| notation::inject_directives(body, &directives))
            .collect();

        info!(
            source = %self.config.source.display(),
            tunes = tunes.len(),
            workers = self.config.workers,
            "Starting batch"
        );

        tokio::fs::create_dir_all(&self.config.output_dir).await?;

        let pipeline = Arc::new(ConversionPipeline::new(self.config.clone()));
        let semaphore = Arc::new(Semaphore::new(self.config.workers));
        let mut join_set = JoinSet::new();

        for (position, tune) in tunes.into_iter().enumerate() {
            // Acquire before spawning: the loop itself throttles to the pool
            // width, and the task holds the permit for its whole run.
            let permit = semaphore
                .clone()
                .acquire_owned()
                .await
                .map_err(|e| Error::Internal(format!("worker pool closed: {}", e)))?;
            let pipeline = pipeline.clone();

            join_set.spawn(async move {
                let _permit = permit;
                let label = tune_label(position, &tune);
                let result = match pipeline.process_tune(&tune).await {
                    Ok(path) => {
                        info!(tune = %label, mp3 = %path.display(), "Tune complete");
                        TuneResult::Converted(path)
                    }
                    Err(e) => {
                        error!(tune = %label, error = %e, "Tune failed");
                        TuneResult::Failed(e.to_string())
                    }
                };
                TuneOutcome {
                    position,
                    label,
                    result,
                }
            });
        }

        let mut outcomes = Vec::new();
        while let Some(joined) = join_set.join_next().await {
            match joined {
                Ok(outcome) => outcomes.push(outcome),
                Err(e) => warn!(error = %e, "Tune task aborted"),
            }
        }
        outcomes.sort_by_key(|o| o.position);

        let finished = Utc::now();
        let report = BatchReport {
            outcomes,
            started,
            finished,
        };
        info!(
            converted = report.converted(),
            failed = report.failed(),
            elapsed_ms = (finished - started).num_milliseconds(),
            "Batch complete"
        );
        Ok(report)
    }
}

/// Best-effort display label; never fails, even for index-less tunes.
fn tune_label(position: usize, tune_abc: &str) -> String {
    match ConversionPipeline::tune_stem(tune_abc) {
        Ok(stem) => stem,
        Err(_) => format!("tune {}", position + 1),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn label_falls_back_to_position() {
        assert_eq!(tune_label(0, "T:No Index\n"), "tune 1");
        assert_eq!(tune_label(4, "X:banana\n"), "tune 5");
        assert_eq!(tune_label(0, "X:2\nT:Named\n"), "0002_-_Named");
    }

    #[test]
    fn report_tallies() {
        let report = BatchReport {
            outcomes: vec![
                TuneOutcome {
                    position: 0,
                    label: "0001_-_A".to_string(),
                    result: TuneResult::Converted(PathBuf::from("output/0001_-_A.mp3")),
                },
                TuneOutcome {
                    position: 1,
                    label: "tune 2".to_string(),
                    result: TuneResult::Failed("tune has no X: index line".to_string()),
                },
            ],
            started: Utc::now(),
            finished: Utc::now(),
        };
        assert_eq!(report.converted(), 1);
        assert_eq!(report.failed(), 1);
    }
}
