//! Export settings
//!
//! Run-wide configuration for the export pipeline, read from a camelCase
//! JSON file with defaults for anything missing.

use crate::Result;
use export_model::{PageFrame, DEFAULT_JPEG_QUALITY};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

pub const SETTINGS_FILE_NAME: &str = "export-settings.json";

/// Allowed range for the low tier scale
pub const LOW_SCALE_RANGE: (f32, f32) = (1.0, 1.2);

/// Export configuration, constant for a run
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase", default)]
pub struct ExportSettings {
    /// Directory the download sink writes into
    pub output_dir: PathBuf,
    /// Physical page size
    pub page_frame: PageFrame,
    /// Capture scale for the high tier
    pub high_scale: f32,
    /// Capture scale for the low tier, kept within 1.0-1.2
    pub low_scale: f32,
    /// JPEG quality for the low tier (1-100)
    pub jpeg_quality: u8,
    /// Flate-compress page content streams
    pub compress: bool,
    /// Upper bound on the wait for a render pass before automatic export
    pub render_ready_timeout_ms: u64,
    /// Font file used instead of system discovery
    #[serde(skip_serializing_if = "Option::is_none")]
    pub font_path: Option<PathBuf>,
    /// Producer written into the document info
    pub producer: String,
}

impl Default for ExportSettings {
    fn default() -> Self {
        Self {
            output_dir: PathBuf::from("."),
            page_frame: PageFrame::A4,
            high_scale: 2.0,
            low_scale: 1.0,
            jpeg_quality: DEFAULT_JPEG_QUALITY,
            compress: true,
            render_ready_timeout_ms: 10_000,
            font_path: None,
            producer: crate::pdf::DEFAULT_PRODUCER.to_string(),
        }
    }
}

impl ExportSettings {
    /// Clamp out-of-range values into their valid ranges
    pub fn normalized(mut self) -> Self {
        let (min, max) = LOW_SCALE_RANGE;
        if !(min..=max).contains(&self.low_scale) {
            let clamped = if self.low_scale.is_nan() {
                min
            } else {
                self.low_scale.clamp(min, max)
            };
            tracing::warn!(
                "lowScale {} outside {}-{}, using {}",
                self.low_scale,
                min,
                max,
                clamped
            );
            self.low_scale = clamped;
        }
        if !(self.high_scale.is_finite() && self.high_scale > 0.0) {
            tracing::warn!("Invalid highScale {}, using 2.0", self.high_scale);
            self.high_scale = 2.0;
        }
        self.jpeg_quality = self.jpeg_quality.clamp(1, 100);
        self
    }

    /// Scale for a tier
    pub fn scale_for(&self, tier: export_model::FidelityTier) -> f32 {
        match tier {
            export_model::FidelityTier::High => self.high_scale,
            export_model::FidelityTier::Low => self.low_scale,
        }
    }

    pub fn render_ready_timeout(&self) -> std::time::Duration {
        std::time::Duration::from_millis(self.render_ready_timeout_ms)
    }
}

/// Reads `export-settings.json` from a config directory
#[derive(Debug, Clone)]
pub struct SettingsManager {
    settings_path: PathBuf,
}

impl SettingsManager {
    pub fn new(config_dir: impl AsRef<Path>) -> Self {
        Self {
            settings_path: config_dir.as_ref().join(SETTINGS_FILE_NAME),
        }
    }

    pub fn settings_path(&self) -> &Path {
        &self.settings_path
    }

    /// Load and normalize the settings file.
    ///
    /// A missing file gives the defaults. An unparsable one also gives the
    /// defaults, with a warning; only read errors are returned.
    pub async fn load(&self) -> Result<ExportSettings> {
        let content = match tokio::fs::read_to_string(&self.settings_path).await {
            Ok(content) => content,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                tracing::debug!(path = %self.settings_path.display(), "no settings file, using defaults");
                return Ok(ExportSettings::default());
            }
            Err(e) => return Err(e.into()),
        };

        match serde_json::from_str::<ExportSettings>(&content) {
            Ok(settings) => Ok(settings.normalized()),
            Err(e) => {
                tracing::warn!(
                    "Failed to parse settings file {}, using defaults: {}",
                    self.settings_path.display(),
                    e
                );
                Ok(ExportSettings::default())
            }
        }
    }
}
