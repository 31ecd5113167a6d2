//! Export Stage Timing and Metrics
//!
//! This crate provides timing infrastructure for the export pipeline:
//! - RAII stage timers that log on drop
//! - A process-wide collector of per-stage timings and export outcomes
//!
//! # Feature Flags
//!
//! - `telemetry` (default): Enables timing collection
//!
//! # Example
//!
//! ```rust
//! use perf::{global_metrics, Stage, StageTimer};
//!
//! fn paginate() {
//!     let _timer = StageTimer::new(Stage::Paginate);
//!     // ... pagination ...
//! }
//!
//! paginate();
//! let summary = global_metrics().lock().unwrap().summary();
//! ```

mod metrics;
mod timing;

pub use metrics::*;
pub use timing::*;
