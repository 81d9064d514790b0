//! Decode-validate-merge orchestration

use crate::Result;
use nibrs_flatfile::{DecodeEvent, Decoder, DecoderConfig};
use nibrs_model::NibrsError;
use nibrs_validation::ReportValidator;
use serde::{Deserialize, Serialize};
use std::io::BufRead;
use std::sync::Arc;
use std::time::{Duration, Instant};
use tokio::sync::Semaphore;
use tokio::task::JoinSet;
use tracing::{debug, info, warn};

/// Configuration for pipeline processing
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct PipelineConfig {
    /// Maximum number of reports validated in parallel
    pub max_concurrency: usize,
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self { max_concurrency: 4 }
    }
}

/// Statistics for one pipeline run
#[derive(Debug, Default, Clone, PartialEq, Serialize)]
pub struct PipelineStats {
    /// Reports decoded and validated
    pub reports: usize,
    /// Incidents the decoder could not build
    pub failures: usize,
    /// Errors in the merged output, warnings excluded
    pub errors: usize,
    /// Warnings in the merged output
    pub warnings: usize,
    /// Wall-clock time of the run
    pub elapsed: Duration,
}

impl PipelineStats {
    /// Reports plus failures handled per second.
    #[must_use]
    #[allow(clippy::cast_precision_loss)]
    pub fn throughput(&self) -> f64 {
        let seconds = self.elapsed.as_secs_f64();
        if seconds > 0.0 {
            (self.reports + self.failures) as f64 / seconds
        } else {
            0.0
        }
    }
}

/// Result of a pipeline run
#[derive(Debug, Clone)]
pub struct PipelineOutcome {
    /// Every error in submission order
    pub errors: Vec<NibrsError>,
    pub stats: PipelineStats,
}

/// Decodes a submission and validates its reports concurrently
pub struct Pipeline {
    validator: Arc<ReportValidator>,
    decoder: DecoderConfig,
    config: PipelineConfig,
}

impl Pipeline {
    #[must_use]
    pub fn new(validator: ReportValidator) -> Self {
        Self {
            validator: Arc::new(validator),
            decoder: DecoderConfig::default(),
            config: PipelineConfig::default(),
        }
    }

    #[must_use]
    pub fn with_decoder(mut self, decoder: DecoderConfig) -> Self {
        self.decoder = decoder;
        self
    }

    #[must_use]
    pub fn with_config(mut self, config: PipelineConfig) -> Self {
        self.config = config;
        self
    }

    /// Decode `reader` and validate every report it holds.
    ///
    /// Errors come back in the order their reports (or decode failures) appear
    /// in the input, not the order validation finished in.
    ///
    /// Decoding reads `reader` synchronously on the calling task; each report is
    /// validated on the blocking pool.
    ///
    /// # Errors
    ///
    /// Returns [`crate::Error::Decode`] if reading the input fails and
    /// [`crate::Error::Task`] if a validation task panics.
    pub async fn run<R: BufRead>(&self, reader: R) -> Result<PipelineOutcome> {
        let started = Instant::now();
        let limiter = Arc::new(Semaphore::new(self.config.max_concurrency.max(1)));
        let mut tasks = JoinSet::new();
        let mut slots: Vec<Vec<NibrsError>> = Vec::new();
        let mut stats = PipelineStats::default();

        let mut decoder = Decoder::new(reader, self.decoder.clone());
        for event in decoder.by_ref() {
            let sequence = slots.len();
            slots.push(Vec::new());
            match event {
                DecodeEvent::Report(report) => {
                    stats.reports += 1;
                    let permit = Arc::clone(&limiter).acquire_owned().await?;
                    let validator = Arc::clone(&self.validator);
                    tasks.spawn_blocking(move || {
                        let errors = validator.validate(&report);
                        drop(permit);
                        (sequence, errors)
                    });
                }
                DecodeEvent::Failure(failure) => {
                    stats.failures += 1;
                    warn!(
                        identifier = failure.identifier.as_deref().unwrap_or_default(),
                        code = %failure.error.code,
                        "Report could not be decoded"
                    );
                    slots[sequence].push(failure.error);
                }
            }
        }
        let read_error = decoder.take_error();

        while let Some(joined) = tasks.join_next().await {
            let (sequence, errors) = joined?;
            debug!(sequence, errors = errors.len(), "Validation task finished");
            slots[sequence] = errors;
        }
        if let Some(error) = read_error {
            return Err(error.into());
        }

        let errors: Vec<NibrsError> = slots.into_iter().flatten().collect();
        stats.warnings = errors.iter().filter(|e| e.warning).count();
        stats.errors = errors.len() - stats.warnings;
        stats.elapsed = started.elapsed();

        info!(
            reports = stats.reports,
            failures = stats.failures,
            errors = stats.errors,
            warnings = stats.warnings,
            elapsed_ms = u64::try_from(stats.elapsed.as_millis()).unwrap_or(u64::MAX),
            "Pipeline finished"
        );
        Ok(PipelineOutcome { errors, stats })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use nibrs_catalog::Catalog;

    const ZERO: &str = "00430I062016    WA1234567000000000000052016";

    fn pipeline() -> Pipeline {
        Pipeline::new(ReportValidator::new(&Catalog::builtin()).unwrap())
    }

    #[tokio::test]
    async fn test_empty_input() {
        let outcome = pipeline().run("".as_bytes()).await.unwrap();
        assert!(outcome.errors.is_empty());
        assert_eq!(outcome.stats.reports, 0);
    }

    #[tokio::test]
    async fn test_clean_zero_reports() {
        let input = format!("{ZERO}\n{ZERO}\n");
        let outcome = pipeline().run(input.as_bytes()).await.unwrap();
        assert!(outcome.errors.is_empty());
        assert_eq!(outcome.stats.reports, 2);
        assert_eq!(outcome.stats.failures, 0);
    }

    #[tokio::test]
    async fn test_zero_concurrency_still_runs() {
        let outcome = pipeline()
            .with_config(PipelineConfig { max_concurrency: 0 })
            .run(format!("{ZERO}\n").as_bytes())
            .await
            .unwrap();
        assert_eq!(outcome.stats.reports, 1);
    }

    #[tokio::test(flavor = "current_thread")]
    async fn test_validation_off_the_runtime_thread() {
        let input = format!("{ZERO}\n").repeat(12);
        let outcome = pipeline()
            .with_config(PipelineConfig { max_concurrency: 3 })
            .run(input.as_bytes())
            .await
            .unwrap();
        assert_eq!(outcome.stats.reports, 12);
        assert!(outcome.errors.is_empty());
    }

    #[test]
    fn test_throughput_without_elapsed_time() {
        let stats = PipelineStats {
            reports: 3,
            ..PipelineStats::default()
        };
        assert!(stats.throughput().abs() < f64::EPSILON);
    }
}
