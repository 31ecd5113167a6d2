//! Resource loading for embedded images
//!
//! Loading is fail-soft: the rasterizer logs a warning and omits the image
//! whenever a loader or the decoder reports an error.

use crate::error::ResourceError;
use base64::Engine;
use percent_encoding::percent_decode_str;
use std::path::{Path, PathBuf};
use tiny_skia::{ColorU8, Pixmap};

/// Fetches the bytes behind an image source string
pub trait ResourceLoader: Send + Sync {
    fn fetch(&self, source: &str) -> Result<Vec<u8>, ResourceError>;
}

/// Loads `data:` URLs, `file:` URLs and filesystem paths.
///
/// Relative paths resolve against `base_dir` when one is set. Network URLs
/// are reported as unsupported; hosts that need them supply their own loader.
#[derive(Debug, Clone, Default)]
pub struct FileResourceLoader {
    base_dir: Option<PathBuf>,
}

impl FileResourceLoader {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_base_dir(base_dir: impl Into<PathBuf>) -> Self {
        Self {
            base_dir: Some(base_dir.into()),
        }
    }

    fn resolve_path(&self, path: &Path) -> PathBuf {
        match &self.base_dir {
            Some(base) if path.is_relative() => base.join(path),
            _ => path.to_path_buf(),
        }
    }

    fn read(&self, path: &Path) -> Result<Vec<u8>, ResourceError> {
        let path = self.resolve_path(path);
        std::fs::read(&path).map_err(|source| ResourceError::Io {
            path: path.display().to_string(),
            source,
        })
    }
}

impl ResourceLoader for FileResourceLoader {
    fn fetch(&self, source: &str) -> Result<Vec<u8>, ResourceError> {
        let source = source.trim();
        if let Some(rest) = source.strip_prefix("data:") {
            return parse_data_url(rest).map(|(_, bytes)| bytes);
        }
        if let Some(rest) = source.strip_prefix("file://") {
            let decoded = percent_decode_str(rest).decode_utf8_lossy();
            return self.read(Path::new(decoded.as_ref()));
        }
        if let Some((scheme, _)) = source.split_once("://") {
            return Err(ResourceError::UnsupportedScheme(scheme.to_string()));
        }
        self.read(Path::new(source))
    }
}

/// Split the body of a `data:` URL (without the prefix) into its media type
/// and payload bytes.
pub fn parse_data_url(body: &str) -> Result<(String, Vec<u8>), ResourceError> {
    let (header, payload) = body.split_once(',').ok_or(ResourceError::InvalidDataUrl)?;
    let mime = header
        .split(';')
        .next()
        .filter(|m| !m.is_empty())
        .unwrap_or("text/plain")
        .to_string();

    let bytes = if header.split(';').any(|p| p.eq_ignore_ascii_case("base64")) {
        let compact: String = payload.chars().filter(|c| !c.is_whitespace()).collect();
        base64::engine::general_purpose::STANDARD
            .decode(compact)
            .map_err(|_| ResourceError::InvalidDataUrl)?
    } else {
        percent_decode_str(payload).collect()
    };
    Ok((mime, bytes))
}

/// Decode PNG/JPEG bytes into a premultiplied pixmap
pub fn decode_image(bytes: &[u8]) -> Result<Pixmap, ResourceError> {
    let decoded = image::load_from_memory(bytes)
        .map_err(|e| ResourceError::Decode(e.to_string()))?
        .to_rgba8();
    let (width, height) = decoded.dimensions();
    let mut pixmap = Pixmap::new(width, height)
        .ok_or_else(|| ResourceError::Decode(format!("image too large: {}x{}", width, height)))?;

    for (dst, src) in pixmap.pixels_mut().iter_mut().zip(decoded.pixels()) {
        let [r, g, b, a] = src.0;
        *dst = ColorU8::from_rgba(r, g, b, a).premultiply();
    }
    Ok(pixmap)
}
