//! Metrics collection for export runs

use crate::timing::Stage;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::sync::{Mutex, OnceLock};

/// Samples kept per stage; the oldest are dropped first
const MAX_SAMPLES_PER_STAGE: usize = 1000;

/// Global metrics instance
static GLOBAL_METRICS: OnceLock<Mutex<ExportMetrics>> = OnceLock::new();

/// Get the global metrics instance.
///
/// Stage timers record here when they drop.
pub fn global_metrics() -> &'static Mutex<ExportMetrics> {
    GLOBAL_METRICS.get_or_init(|| Mutex::new(ExportMetrics::new()))
}

/// How an export request ended
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum ExportOutcomeKind {
    Completed,
    Failed,
    /// Rejected because the target already had an export in flight
    Skipped,
}

/// Per-stage timings and export counters.
#[derive(Debug, Clone)]
pub struct ExportMetrics {
    stage_times: BTreeMap<Stage, Vec<f64>>,
    completed: usize,
    failed: usize,
    skipped: usize,
    pages: usize,
    bytes: usize,
}

impl ExportMetrics {
    pub fn new() -> Self {
        Self {
            stage_times: BTreeMap::new(),
            completed: 0,
            failed: 0,
            skipped: 0,
            pages: 0,
            bytes: 0,
        }
    }

    /// Record one stage duration.
    pub fn record_stage(&mut self, stage: Stage, duration_ms: f64) {
        let times = self.stage_times.entry(stage).or_default();
        if times.len() >= MAX_SAMPLES_PER_STAGE {
            times.remove(0);
        }
        times.push(duration_ms);
    }

    /// Record how an export ended. `pages` and `bytes` count only for
    /// completed exports.
    pub fn record_outcome(&mut self, outcome: ExportOutcomeKind, pages: usize, bytes: usize) {
        match outcome {
            ExportOutcomeKind::Completed => {
                self.completed += 1;
                self.pages += pages;
                self.bytes += bytes;
            }
            ExportOutcomeKind::Failed => self.failed += 1,
            ExportOutcomeKind::Skipped => self.skipped += 1,
        }

        tracing::trace!(
            target: "perf::export",
            outcome = ?outcome,
            pages,
            bytes,
            "export recorded"
        );
    }

    /// Raw samples for one stage
    pub fn stage_times(&self, stage: Stage) -> &[f64] {
        self.stage_times
            .get(&stage)
            .map(Vec::as_slice)
            .unwrap_or(&[])
    }

    /// Get a summary of all collected metrics.
    pub fn summary(&self) -> ExportSummary {
        ExportSummary {
            stages: self
                .stage_times
                .iter()
                .map(|(stage, times)| (*stage, TimingStats::from_samples(times)))
                .collect(),
            completed: self.completed,
            failed: self.failed,
            skipped: self.skipped,
            total_pages: self.pages,
            total_bytes: self.bytes,
        }
    }
}

impl Default for ExportMetrics {
    fn default() -> Self {
        Self::new()
    }
}

/// Summary of export metrics.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ExportSummary {
    /// Statistics for each stage that ran at least once
    pub stages: BTreeMap<Stage, TimingStats>,
    pub completed: usize,
    pub failed: usize,
    pub skipped: usize,
    pub total_pages: usize,
    pub total_bytes: usize,
}

impl ExportSummary {
    /// Pretty JSON for printing
    pub fn to_json(&self) -> serde_json::Result<String> {
        serde_json::to_string_pretty(self)
    }
}

impl std::fmt::Display for ExportSummary {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        writeln!(
            f,
            "exports: {} completed, {} failed, {} skipped ({} pages, {} bytes)",
            self.completed, self.failed, self.skipped, self.total_pages, self.total_bytes
        )?;
        for (stage, stats) in &self.stages {
            writeln!(
                f,
                "  {:<9} n={:<4} mean={:.2}ms p95={:.2}ms max={:.2}ms",
                stage.as_str(),
                stats.count,
                stats.mean_ms,
                stats.p95_ms,
                stats.max_ms
            )?;
        }
        Ok(())
    }
}

/// Statistical summary of timing data.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TimingStats {
    /// Number of samples
    pub count: usize,
    /// Minimum time in milliseconds
    pub min_ms: f64,
    /// Maximum time in milliseconds
    pub max_ms: f64,
    /// Mean time in milliseconds
    pub mean_ms: f64,
    /// Median time in milliseconds
    pub median_ms: f64,
    /// 95th percentile in milliseconds
    pub p95_ms: f64,
    /// Total time in milliseconds
    pub total_ms: f64,
}

impl TimingStats {
    /// Calculate statistics from a slice of samples.
    pub fn from_samples(samples: &[f64]) -> Self {
        if samples.is_empty() {
            return Self::default();
        }

        let count = samples.len();
        let mut sorted: Vec<f64> = samples.to_vec();
        sorted.sort_by(|a, b| a.partial_cmp(b).unwrap_or(std::cmp::Ordering::Equal));

        let total_ms: f64 = samples.iter().sum();
        let median_ms = if count % 2 == 0 {
            (sorted[count / 2 - 1] + sorted[count / 2]) / 2.0
        } else {
            sorted[count / 2]
        };

        Self {
            count,
            min_ms: sorted[0],
            max_ms: sorted[count - 1],
            mean_ms: total_ms / count as f64,
            median_ms,
            p95_ms: percentile(&sorted, 95.0),
            total_ms,
        }
    }
}

/// Calculate a percentile from sorted samples.
fn percentile(sorted: &[f64], p: f64) -> f64 {
    if sorted.is_empty() {
        return 0.0;
    }
    if sorted.len() == 1 {
        return sorted[0];
    }

    let rank = (p / 100.0) * (sorted.len() - 1) as f64;
    let lower = rank.floor() as usize;
    let upper = rank.ceil() as usize;
    let fraction = rank - lower as f64;

    if upper >= sorted.len() {
        sorted[sorted.len() - 1]
    } else {
        sorted[lower] + fraction * (sorted[upper] - sorted[lower])
    }
}
