//! Render target handles

use serde::{Deserialize, Serialize};
use std::fmt;

/// Opaque handle to a laid-out visual subtree owned by the host UI.
///
/// The pipeline only ever reads through a target; it never mutates what the
/// handle points at.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct RenderTarget(String);

impl RenderTarget {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// A handle with no characters can never resolve to a node.
    pub fn is_blank(&self) -> bool {
        self.0.trim().is_empty()
    }
}

impl fmt::Display for RenderTarget {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

impl From<&str> for RenderTarget {
    fn from(s: &str) -> Self {
        Self::new(s)
    }
}

impl From<String> for RenderTarget {
    fn from(s: String) -> Self {
        Self(s)
    }
}
