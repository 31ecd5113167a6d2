//! Fidelity tiers and the image encodings they select

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Default JPEG quality used by the web tier (0.7 on a 0..1 scale)
pub const DEFAULT_JPEG_QUALITY: u8 = 70;

/// Quality-versus-size trade-off requested for one export.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum FidelityTier {
    /// Print fidelity: double pixel density, lossless image data
    #[default]
    High,
    /// Email/web weight: native pixel density, JPEG image data
    Low,
}

impl FidelityTier {
    /// Default capture scale factor for this tier
    pub fn default_scale(&self) -> f32 {
        match self {
            FidelityTier::High => 2.0,
            FidelityTier::Low => 1.0,
        }
    }

    /// Image encoding used when the capture is placed into the document
    pub fn encoding(&self, jpeg_quality: u8) -> ImageEncoding {
        match self {
            FidelityTier::High => ImageEncoding::Lossless,
            FidelityTier::Low => ImageEncoding::Jpeg {
                quality: jpeg_quality.clamp(1, 100),
            },
        }
    }

    /// Suffix inserted before the file extension of the artifact
    pub fn file_suffix(&self) -> &'static str {
        match self {
            FidelityTier::High => "",
            FidelityTier::Low => "-Web",
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            FidelityTier::High => "high",
            FidelityTier::Low => "low",
        }
    }
}

impl fmt::Display for FidelityTier {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for FidelityTier {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "high" | "print" => Ok(FidelityTier::High),
            "low" | "web" => Ok(FidelityTier::Low),
            other => Err(format!("unknown fidelity tier '{}' (expected high or low)", other)),
        }
    }
}

/// How captured pixels are encoded inside the output document
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "lowercase")]
pub enum ImageEncoding {
    /// Raw samples, compressed only by the document's own stream compression
    Lossless,
    /// Baseline JPEG at the given quality (1-100)
    Jpeg { quality: u8 },
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_tier_scales() {
        assert_eq!(FidelityTier::High.default_scale(), 2.0);
        assert_eq!(FidelityTier::Low.default_scale(), 1.0);
    }

    #[test]
    fn test_tier_encodings() {
        assert_eq!(FidelityTier::High.encoding(70), ImageEncoding::Lossless);
        assert_eq!(
            FidelityTier::Low.encoding(DEFAULT_JPEG_QUALITY),
            ImageEncoding::Jpeg { quality: 70 }
        );
        assert_eq!(
            FidelityTier::Low.encoding(0),
            ImageEncoding::Jpeg { quality: 1 }
        );
    }

    #[test]
    fn test_file_suffix() {
        assert_eq!(FidelityTier::High.file_suffix(), "");
        assert_eq!(FidelityTier::Low.file_suffix(), "-Web");
    }

    #[test]
    fn test_parse_tier() {
        assert_eq!("high".parse::<FidelityTier>(), Ok(FidelityTier::High));
        assert_eq!("LOW".parse::<FidelityTier>(), Ok(FidelityTier::Low));
        assert_eq!("web".parse::<FidelityTier>(), Ok(FidelityTier::Low));
        assert!("medium".parse::<FidelityTier>().is_err());
    }

    #[test]
    fn test_tier_serialization() {
        assert_eq!(serde_json::to_string(&FidelityTier::High).unwrap(), "\"high\"");
        assert_eq!(serde_json::to_string(&FidelityTier::Low).unwrap(), "\"low\"");
    }
}
