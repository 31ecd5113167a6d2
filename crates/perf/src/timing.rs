//! Timing utilities for export stages

use serde::{Deserialize, Serialize};
use std::time::Instant;

/// Pipeline stage being timed
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Stage {
    /// Scene rasterization
    Capture,
    /// Page slice computation
    Paginate,
    /// Document serialization
    Assemble,
    /// Handing the artifact to the download sink
    Save,
    /// Whole export, first stage to last
    Export,
}

impl Stage {
    pub fn as_str(&self) -> &'static str {
        match self {
            Stage::Capture => "capture",
            Stage::Paginate => "paginate",
            Stage::Assemble => "assemble",
            Stage::Save => "save",
            Stage::Export => "export",
        }
    }
}

impl std::fmt::Display for Stage {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A timer that measures elapsed time from creation to drop.
///
/// When the `telemetry` feature is enabled, the timer logs the elapsed time
/// at `trace` level when dropped and records it into the global metrics.
///
/// # Example
///
/// ```rust
/// use perf::{Stage, StageTimer};
///
/// fn assemble() {
///     let _timer = StageTimer::new(Stage::Assemble);
///     // ... assembly ...
///     // Timer records on drop
/// }
/// ```
pub struct StageTimer {
    stage: Stage,
    start: Instant,
}

impl StageTimer {
    /// Start timing `stage`
    #[inline]
    pub fn new(stage: Stage) -> Self {
        Self {
            stage,
            start: Instant::now(),
        }
    }

    /// Get the elapsed time in milliseconds.
    #[inline]
    pub fn elapsed_ms(&self) -> f64 {
        self.start.elapsed().as_secs_f64() * 1000.0
    }
}

#[cfg(feature = "telemetry")]
impl Drop for StageTimer {
    fn drop(&mut self) {
        let elapsed_ms = self.elapsed_ms();

        tracing::trace!(
            target: "perf",
            stage = self.stage.as_str(),
            elapsed_ms = elapsed_ms,
            "stage completed"
        );

        if let Ok(mut metrics) = crate::global_metrics().lock() {
            metrics.record_stage(self.stage, elapsed_ms);
        }
    }
}

#[cfg(not(feature = "telemetry"))]
impl Drop for StageTimer {
    fn drop(&mut self) {
        // No-op when telemetry is disabled
    }
}
