//! PDF Export Options

use super::document::PdfVersion;
use chrono::{DateTime, FixedOffset};
use serde::{Deserialize, Serialize};

pub const DEFAULT_PRODUCER: &str = "invoice-export";

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct PdfExportOptions {
    /// Document title; the assembler falls back to the file stem
    #[serde(default)]
    pub title: Option<String>,
    #[serde(default)]
    pub creator: Option<String>,
    #[serde(default = "default_producer")]
    pub producer: String,
    /// Flate-compress page content streams
    #[serde(default = "default_compress")]
    pub compress: bool,
    #[serde(default)]
    pub pdf_version: PdfVersionOption,
    /// Fixed creation date; the current local time is used when unset
    #[serde(skip)]
    pub creation_date: Option<DateTime<FixedOffset>>,
}

fn default_producer() -> String {
    DEFAULT_PRODUCER.to_string()
}

fn default_compress() -> bool {
    true
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum PdfVersionOption {
    V14,
    #[default]
    V17,
}

impl From<PdfVersionOption> for PdfVersion {
    fn from(opt: PdfVersionOption) -> Self {
        match opt {
            PdfVersionOption::V14 => PdfVersion::V1_4,
            PdfVersionOption::V17 => PdfVersion::V1_7,
        }
    }
}

impl Default for PdfExportOptions {
    fn default() -> Self {
        Self {
            title: None,
            creator: None,
            producer: default_producer(),
            compress: true,
            pdf_version: PdfVersionOption::default(),
            creation_date: None,
        }
    }
}

impl PdfExportOptions {
    pub fn with_producer(mut self, producer: impl Into<String>) -> Self {
        self.producer = producer.into();
        self
    }

    pub fn with_compression(mut self, compress: bool) -> Self {
        self.compress = compress;
        self
    }
}
