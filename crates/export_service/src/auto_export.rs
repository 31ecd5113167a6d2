//! Automatic export on page load
//!
//! A page opened with `download=true` in its query exports itself once its
//! data has loaded and its render target has been painted at least once.

use crate::error::{ExportError, Result};
use crate::orchestrator::{ExportOrchestrator, ExportOutcome};
use capture_engine::{wait_for_render, RenderWait};
use export_model::{FidelityTier, RenderTarget};
use percent_encoding::percent_decode_str;
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::Duration;
use store::DownloadSink;

/// Tier used by automatic exports
pub const AUTO_EXPORT_TIER: FidelityTier = FidelityTier::High;

/// Flags read from a page's navigation query
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct NavigationQuery {
    pub download: bool,
}

impl NavigationQuery {
    /// Parse `download=true&...` (a leading `?` is allowed)
    pub fn parse(query: &str) -> Self {
        let mut parsed = Self::default();
        for pair in query.trim_start_matches('?').split('&') {
            let (key, value) = pair.split_once('=').unwrap_or((pair, ""));
            let value = percent_decode_str(value).decode_utf8_lossy();
            if key == "download" {
                parsed.download = value == "true";
            }
        }
        parsed
    }
}

/// What the page knows when deciding whether to fire
#[derive(Debug, Clone, Copy, Default)]
pub struct PageReadiness {
    pub loading: bool,
    pub has_error: bool,
    pub has_invoice: bool,
}

impl PageReadiness {
    pub fn loaded() -> Self {
        Self {
            loading: false,
            has_error: false,
            has_invoice: true,
        }
    }

    fn is_ready(&self) -> bool {
        !self.loading && !self.has_error && self.has_invoice
    }
}

/// Fires at most one automatic export per page load
#[derive(Debug)]
pub struct AutoExportTrigger {
    requested: bool,
    fired: AtomicBool,
    render_timeout: Duration,
}

impl AutoExportTrigger {
    pub fn new(query: &NavigationQuery, render_timeout: Duration) -> Self {
        Self {
            requested: query.download,
            fired: AtomicBool::new(false),
            render_timeout,
        }
    }

    pub fn is_requested(&self) -> bool {
        self.requested
    }

    pub fn has_fired(&self) -> bool {
        self.fired.load(Ordering::SeqCst)
    }

    /// Run the automatic export if every condition holds.
    ///
    /// Returns `Ok(None)` when the trigger does not fire: not requested,
    /// already fired, page not ready, or a manual export of `target` in
    /// flight. The last two leave the trigger armed.
    pub async fn fire<S: DownloadSink>(
        &self,
        readiness: PageReadiness,
        orchestrator: &ExportOrchestrator<S>,
        target: &RenderTarget,
        file_name: &str,
    ) -> Result<Option<ExportOutcome>> {
        if !self.requested || self.has_fired() || !readiness.is_ready() {
            return Ok(None);
        }
        if orchestrator.is_in_flight(target) {
            tracing::debug!(%target, "automatic export deferred: export in flight");
            return Ok(None);
        }
        if self.fired.swap(true, Ordering::SeqCst) {
            return Ok(None);
        }

        match wait_for_render(orchestrator.host().as_ref(), target, self.render_timeout).await {
            RenderWait::Ready(passes) => {
                tracing::debug!(%target, passes, "render settled, starting automatic export");
            }
            RenderWait::TimedOut => {
                let err = ExportError::RenderTimeout(self.render_timeout);
                tracing::error!(%target, error = %err, message = err.user_message(), "automatic export failed");
                return Err(err);
            }
            RenderWait::Detached => {
                let err = ExportError::TargetNotFound(target.clone());
                tracing::error!(%target, error = %err, message = err.user_message(), "automatic export failed");
                return Err(err);
            }
        }

        orchestrator
            .export_document(target, file_name, AUTO_EXPORT_TIER)
            .await
            .map(Some)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_query() {
        assert!(NavigationQuery::parse("download=true").download);
        assert!(NavigationQuery::parse("?tab=1&download=true").download);
        assert!(!NavigationQuery::parse("download=false").download);
        assert!(!NavigationQuery::parse("download=TRUE").download);
        assert!(!NavigationQuery::parse("download").download);
        assert!(!NavigationQuery::parse("").download);
        assert!(NavigationQuery::parse("download=%74rue").download);
    }

    #[test]
    fn test_readiness() {
        assert!(PageReadiness::loaded().is_ready());
        assert!(!PageReadiness::default().is_ready());
        assert!(!PageReadiness {
            has_error: true,
            ..PageReadiness::loaded()
        }
        .is_ready());
        assert!(!PageReadiness {
            loading: true,
            ..PageReadiness::loaded()
        }
        .is_ready());
    }

    #[test]
    fn test_trigger_flags() {
        let trigger = AutoExportTrigger::new(
            &NavigationQuery { download: true },
            Duration::from_secs(10),
        );
        assert!(trigger.is_requested());
        assert!(!trigger.has_fired());
    }
}
