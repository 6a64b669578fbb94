//! Command-level wiring: the user-facing operations and the document
//! lifecycle callbacks, in front of the analyzer, scheduler, fix engine, and
//! report panel.

use crate::analyzer::VulnerabilityAnalyzer;
use crate::client::FrameworkClient;
use crate::config::Settings;
use crate::diagnostics::{Diagnostic, DiagnosticStore};
use crate::document::{Document, DocumentUri};
use crate::fix::FixEngine;
use crate::host::{PanelId, Workbench};
use crate::report::ReportPanel;
use crate::scheduler::{AnalysisScheduler, DocumentAnalysis};
use crate::vulnerability::Vulnerability;
use crate::workspace::{CancelFlag, ScanProgress, ScanSummary, WorkspaceScanner};
use anyhow::Result;
use std::path::{Path, PathBuf};
use std::sync::{Arc, PoisonError, RwLock};

pub struct Engine {
    settings: Arc<RwLock<Settings>>,
    settings_path: Option<PathBuf>,
    store: Arc<DiagnosticStore>,
    workbench: Arc<dyn Workbench>,
    analyzer: Arc<VulnerabilityAnalyzer>,
    scheduler: AnalysisScheduler,
    scanner: WorkspaceScanner,
    fixer: FixEngine,
    report: ReportPanel,
}

impl Engine {
    /// Build an engine persisting settings to the user's config location.
    pub fn new(settings: Settings, workbench: Arc<dyn Workbench>) -> Self {
        let path = Settings::default_path();
        Self::with_settings_path(settings, workbench, path)
    }

    pub fn with_settings_path(
        settings: Settings,
        workbench: Arc<dyn Workbench>,
        settings_path: Option<PathBuf>,
    ) -> Self {
        let settings = Arc::new(RwLock::new(settings));
        let store = Arc::new(DiagnosticStore::new());
        let api_url = settings
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .api_url
            .clone();
        let client = FrameworkClient::new(api_url);

        let analyzer = Arc::new(VulnerabilityAnalyzer::new(
            client.clone(),
            Arc::clone(&store),
            Arc::clone(&workbench),
            Arc::clone(&settings),
        ));
        let analysis: Arc<dyn DocumentAnalysis> = Arc::clone(&analyzer) as _;
        let scheduler = AnalysisScheduler::new(Arc::clone(&analysis), Arc::clone(&settings));
        let scanner = WorkspaceScanner::new(analysis);
        let fixer = FixEngine::new(client, Arc::clone(&workbench), Arc::clone(&settings));

        Self {
            settings,
            settings_path,
            store,
            workbench,
            analyzer,
            scheduler,
            scanner,
            fixer,
            report: ReportPanel::new(),
        }
    }

    pub fn store(&self) -> &DiagnosticStore {
        &self.store
    }

    pub fn settings(&self) -> Settings {
        self.settings
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    /// Analyze the active document, warning when there is none.
    pub async fn analyze_current_file(&self) {
        let Some(document) = self.workbench.active_document() else {
            self.workbench.warn("No active editor");
            return;
        };
        self.analyzer.analyze_document(&document).await;
        self.workbench.info("Analysis complete!");
    }

    /// Analyze one specific document (the on-demand path).
    pub async fn analyze_document(&self, document: &Document) {
        self.analyzer.analyze_document(document).await;
    }

    /// Sequential, cancellable scan of every supported file under `root`.
    pub async fn analyze_workspace(
        &self,
        root: &Path,
        cancel: &CancelFlag,
        progress: impl FnMut(&ScanProgress),
    ) -> Result<ScanSummary> {
        let summary = self.scanner.scan(root, cancel, progress).await?;
        self.workbench.info(&format!(
            "Analysis complete! Analyzed {} files.",
            summary.analyzed
        ));
        Ok(summary)
    }

    /// Fix one finding. Falls back to the active document when the caller
    /// does not supply one; without either, the request is dropped with a
    /// log line.
    pub async fn fix_vulnerability(
        &self,
        vulnerability: &Vulnerability,
        document: Option<&Document>,
        diagnostic: Option<&Diagnostic>,
    ) {
        let resolved = match document {
            Some(document) => Some(document.clone()),
            None => self.workbench.active_document(),
        };
        let Some(document) = resolved else {
            tracing::warn!("fix requested with no document and no active editor");
            return;
        };
        self.fixer
            .fix_vulnerability(vulnerability, &document, diagnostic)
            .await;
    }

    /// Flip privacy-first mode, persist it, and report the resulting mode.
    pub fn toggle_privacy_mode(&self) {
        let mode = {
            let mut settings = self.settings.write().unwrap_or_else(PoisonError::into_inner);
            let mode = settings.toggle_privacy();
            if let Some(path) = &self.settings_path {
                if let Err(err) = settings.save_to(path) {
                    tracing::warn!("failed to persist settings: {err:#}");
                }
            }
            mode
        };
        self.workbench.info(&format!("Switched to {mode} mode"));
    }

    /// Open the report panel, or reveal the one already open.
    pub fn show_report(&self) {
        self.report.create_or_show(self.workbench.as_ref(), &self.store);
    }

    pub fn report_panel_closed(&self, panel: PanelId) {
        self.report.panel_closed(panel);
    }

    // Document lifecycle, forwarded to the scheduler.

    pub async fn document_opened(&self, document: &Document) {
        self.scheduler.document_opened(document).await;
    }

    pub async fn document_saved(&self, document: &Document) {
        self.scheduler.document_saved(document).await;
    }

    pub fn document_changed(&self, document: &Document) {
        self.scheduler.document_changed(document);
    }

    /// Drop a closed document's diagnostics and any pending pass.
    pub fn document_closed(&self, uri: &DocumentUri) {
        self.scheduler.cancel_pending(uri);
        self.store.remove(uri);
        self.workbench.publish_diagnostics(uri, &[]);
    }

    /// The deactivate path: every diagnostic set is dropped.
    pub fn shutdown(&self) {
        self.store.clear();
    }
}
