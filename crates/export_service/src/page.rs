//! Invoice export page
//!
//! Loads an invoice with its client and the sender profile, renders the
//! invoice sheet into the scene registry, and serves manual and automatic
//! exports of it.

use crate::auto_export::{AutoExportTrigger, NavigationQuery, PageReadiness};
use crate::error::ExportError;
use crate::orchestrator::{ExportOrchestrator, ExportOutcome};
use capture_engine::SceneRegistry;
use export_model::{FidelityTier, RenderTarget};
use invoice_view::{Client, Invoice, InvoiceSheet, SenderDetails, INVOICE_TARGET_ID};
use percent_encoding::percent_decode_str;
use serde::de::DeserializeOwned;
use std::future::Future;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;
use store::DownloadSink;
use thiserror::Error;

/// Failure reading from the invoice backend
#[derive(Debug, Error)]
pub enum SourceError {
    #[error("Failed to read {}: {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Failed to parse {}: {source}", path.display())]
    Parse {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },
}

#[derive(Debug, Error)]
pub enum PageError {
    #[error("Missing invoice id")]
    MissingId,

    #[error("Invoice not found: {0}")]
    NotFound(String),

    #[error("No client data for invoice {0}")]
    ClientUnavailable(String),

    #[error("Failed to load invoice: {0}")]
    Load(#[from] SourceError),
}

impl PageError {
    /// Message shown in place of the sheet
    pub fn user_message(&self) -> &'static str {
        match self {
            PageError::MissingId => "Falta el ID de la factura.",
            PageError::NotFound(_) => "Factura no encontrada.",
            PageError::ClientUnavailable(_) => {
                "Datos de factura o cliente no disponibles. Verifique que la factura y el cliente asociado existan."
            }
            PageError::Load(_) => "Error al cargar los detalles de la factura.",
        }
    }
}

/// Read side of the invoicing backend
pub trait InvoiceSource: Send + Sync {
    fn invoice(&self, id: &str)
        -> impl Future<Output = Result<Option<Invoice>, SourceError>> + Send;

    fn client(&self, id: &str) -> impl Future<Output = Result<Option<Client>, SourceError>> + Send;

    /// The sender profile, `None` when it has never been saved
    fn sender_settings(&self) -> impl Future<Output = Result<Option<SenderDetails>, SourceError>> + Send;
}

/// Backend snapshot on disk: `invoices/<id>.json`, `clients/<id>.json` and
/// `settings.json` under one root
#[derive(Debug, Clone)]
pub struct JsonDirectorySource {
    root: PathBuf,
}

impl JsonDirectorySource {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    fn record_path(&self, collection: &str, id: &str) -> Option<PathBuf> {
        let valid = !id.is_empty() && id != "." && id != ".." && !id.contains(['/', '\\', '\0']);
        valid.then(|| self.root.join(collection).join(format!("{}.json", id)))
    }
}

async fn read_json<T: DeserializeOwned>(path: PathBuf) -> Result<Option<T>, SourceError> {
    let content = match tokio::fs::read_to_string(&path).await {
        Ok(content) => content,
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(None),
        Err(source) => return Err(SourceError::Io { path, source }),
    };
    serde_json::from_str(&content)
        .map(Some)
        .map_err(|source| SourceError::Parse { path, source })
}

impl InvoiceSource for JsonDirectorySource {
    async fn invoice(&self, id: &str) -> Result<Option<Invoice>, SourceError> {
        match self.record_path("invoices", id) {
            Some(path) => read_json(path).await,
            None => Ok(None),
        }
    }

    async fn client(&self, id: &str) -> Result<Option<Client>, SourceError> {
        match self.record_path("clients", id) {
            Some(path) => read_json(path).await,
            None => Ok(None),
        }
    }

    async fn sender_settings(&self) -> Result<Option<SenderDetails>, SourceError> {
        read_json(self.root.join("settings.json")).await
    }
}

/// A parsed page location, `/invoices/<id>/pdf?download=true`
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PageRoute {
    pub invoice_id: Option<String>,
    pub query: NavigationQuery,
}

impl PageRoute {
    pub fn parse(location: &str) -> Self {
        let (path, query) = location.split_once('?').unwrap_or((location, ""));
        let segments: Vec<&str> = path.split('/').filter(|s| !s.is_empty()).collect();
        let invoice_id = match segments.as_slice() {
            ["invoices", id, ..] => Some(percent_decode_str(id).decode_utf8_lossy().into_owned()),
            _ => None,
        }
        .filter(|id| !id.trim().is_empty());
        Self {
            invoice_id,
            query: NavigationQuery::parse(query),
        }
    }
}

/// Everything the sheet needs
#[derive(Debug, Clone)]
pub struct LoadedInvoice {
    pub invoice: Invoice,
    /// Fetched client, or the invoice's embedded copy
    pub client: Client,
    pub sender: SenderDetails,
}

impl LoadedInvoice {
    pub fn base_file_name(&self) -> String {
        self.invoice.base_file_name(Some(&self.client))
    }
}

/// One open page: the loaded data and its automatic-export guard
#[derive(Debug)]
pub struct PageSession {
    pub loaded: LoadedInvoice,
    pub file_name: String,
    pub trigger: AutoExportTrigger,
}

/// The page hosting the invoice sheet render target
pub struct InvoicePage<Src, S> {
    source: Src,
    registry: Arc<SceneRegistry>,
    orchestrator: Arc<ExportOrchestrator<S>>,
    target: RenderTarget,
    render_timeout: Duration,
}

impl<Src: InvoiceSource, S: DownloadSink> InvoicePage<Src, S> {
    /// `registry` must be the host the orchestrator captures from
    pub fn new(
        source: Src,
        registry: Arc<SceneRegistry>,
        orchestrator: Arc<ExportOrchestrator<S>>,
        render_timeout: Duration,
    ) -> Self {
        Self {
            source,
            registry,
            orchestrator,
            target: RenderTarget::new(INVOICE_TARGET_ID),
            render_timeout,
        }
    }

    pub fn target(&self) -> &RenderTarget {
        &self.target
    }

    pub fn orchestrator(&self) -> &Arc<ExportOrchestrator<S>> {
        &self.orchestrator
    }

    /// Fetch the invoice, sender profile and client
    pub async fn load(&self, invoice_id: Option<&str>) -> Result<LoadedInvoice, PageError> {
        let id = invoice_id.ok_or(PageError::MissingId)?;

        let (settings, invoice) =
            tokio::join!(self.source.sender_settings(), self.source.invoice(id));
        let sender = settings?.unwrap_or_default();
        let invoice = invoice?.ok_or_else(|| PageError::NotFound(id.to_string()))?;

        let client = if invoice.client_id.is_empty() {
            invoice.client.clone()
        } else {
            match self.source.client(&invoice.client_id).await {
                Ok(Some(client)) => Some(client),
                Ok(None) => invoice.client.clone(),
                Err(e) => {
                    tracing::warn!(client_id = %invoice.client_id, error = %e, "using embedded client");
                    invoice.client.clone()
                }
            }
        };
        let Some(client) = client else {
            tracing::warn!(invoice = %invoice.id, client_id = %invoice.client_id, "invoice has no client data");
            return Err(PageError::ClientUnavailable(invoice.id));
        };

        Ok(LoadedInvoice {
            invoice,
            client,
            sender,
        })
    }

    /// Lay out the sheet, attach it, and complete a render pass
    pub fn render(&self, loaded: &LoadedInvoice) {
        let sheet = InvoiceSheet::new(&loaded.invoice, Some(&loaded.client), &loaded.sender);
        let scene = sheet.render(self.orchestrator.engine().fonts().as_ref());
        self.registry.attach(&self.target, scene);
        self.registry.present(&self.target);
    }

    /// Open the page at `location`: load, render, and arm the automatic
    /// export when the query asks for one
    pub async fn open(&self, location: &str) -> Result<PageSession, PageError> {
        let route = PageRoute::parse(location);
        let loaded = match self.load(route.invoice_id.as_deref()).await {
            Ok(loaded) => loaded,
            Err(e) => {
                tracing::error!(location, error = %e, "failed to load invoice page");
                return Err(e);
            }
        };
        self.render(&loaded);

        Ok(PageSession {
            file_name: loaded.base_file_name(),
            loaded,
            trigger: AutoExportTrigger::new(&route.query, self.render_timeout),
        })
    }

    /// Manual export from the page's download button
    pub async fn export(
        &self,
        session: &PageSession,
        tier: FidelityTier,
    ) -> Result<ExportOutcome, ExportError> {
        self.orchestrator
            .export_document(&self.target, &session.file_name, tier)
            .await
    }

    /// Run the automatic export if the page was opened with `download=true`
    pub async fn auto_export(
        &self,
        session: &PageSession,
    ) -> Result<Option<ExportOutcome>, ExportError> {
        session
            .trigger
            .fire(
                PageReadiness::loaded(),
                &self.orchestrator,
                &self.target,
                &session.file_name,
            )
            .await
    }

    /// Leave the page; the render target is detached
    pub fn close(&self) {
        self.registry.detach(&self.target);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_route() {
        let route = PageRoute::parse("/invoices/abc-123/pdf?download=true");
        assert_eq!(route.invoice_id.as_deref(), Some("abc-123"));
        assert!(route.query.download);

        let route = PageRoute::parse("/invoices/abc%20123/pdf");
        assert_eq!(route.invoice_id.as_deref(), Some("abc 123"));
        assert!(!route.query.download);

        assert_eq!(PageRoute::parse("/invoices/").invoice_id, None);
        assert_eq!(PageRoute::parse("/clients/1").invoice_id, None);
    }

    #[test]
    fn test_page_error_messages() {
        assert_eq!(PageError::MissingId.user_message(), "Falta el ID de la factura.");
        assert_eq!(
            PageError::NotFound("x".into()).user_message(),
            "Factura no encontrada."
        );
        assert!(PageError::ClientUnavailable("5".into())
            .user_message()
            .starts_with("Datos de factura o cliente no disponibles."));
    }

    #[test]
    fn test_record_path_rejects_traversal() {
        let source = JsonDirectorySource::new("/data");
        assert!(source.record_path("invoices", "../secret").is_none());
        assert!(source.record_path("invoices", "").is_none());
        assert_eq!(
            source.record_path("invoices", "7"),
            Some(PathBuf::from("/data/invoices/7.json"))
        );
    }

    #[tokio::test]
    async fn test_json_source_missing_records() {
        let dir = tempfile::TempDir::new().unwrap();
        let source = JsonDirectorySource::new(dir.path());
        assert!(source.invoice("1").await.unwrap().is_none());
        assert!(source.client("1").await.unwrap().is_none());
        assert!(source.sender_settings().await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_json_source_parse_error() {
        let dir = tempfile::TempDir::new().unwrap();
        std::fs::create_dir(dir.path().join("invoices")).unwrap();
        std::fs::write(dir.path().join("invoices/1.json"), "{").unwrap();
        let source = JsonDirectorySource::new(dir.path());
        assert!(matches!(
            source.invoice("1").await,
            Err(SourceError::Parse { .. })
        ));
    }
}
