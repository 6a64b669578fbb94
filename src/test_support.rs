//! Shared test doubles.

use crate::diagnostics::Diagnostic;
use crate::document::{Document, DocumentUri};
use crate::host::{PanelId, Workbench};
use anyhow::Result;
use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Mutex;

/// A [`Workbench`] that records every call for assertions.
#[derive(Default)]
pub struct RecordingWorkbench {
    pub notices: Mutex<Vec<(&'static str, String)>>,
    pub edits: Mutex<Vec<(DocumentUri, String)>>,
    pub staged: Mutex<Vec<(DocumentUri, String, String)>>,
    pub published: Mutex<Vec<(DocumentUri, Vec<Diagnostic>)>>,
    pub panels: Mutex<Vec<(PanelId, String, String)>>,
    pub reveals: Mutex<Vec<PanelId>>,
    pub active: Mutex<Option<Document>>,
    next_panel: AtomicU64,
}

impl RecordingWorkbench {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn set_active_document(&self, document: Option<Document>) {
        *self.active.lock().unwrap() = document;
    }

    pub fn notices_of(&self, level: &str) -> Vec<String> {
        self.notices
            .lock()
            .unwrap()
            .iter()
            .filter(|(l, _)| *l == level)
            .map(|(_, m)| m.clone())
            .collect()
    }

    pub fn edited_text(&self, uri: &DocumentUri) -> Option<String> {
        self.edits
            .lock()
            .unwrap()
            .iter()
            .rev()
            .find(|(u, _)| u == uri)
            .map(|(_, text)| text.clone())
    }

    /// The most recently published set per document.
    pub fn published_for(&self, uri: &DocumentUri) -> Option<Vec<Diagnostic>> {
        self.published
            .lock()
            .unwrap()
            .iter()
            .rev()
            .find(|(u, _)| u == uri)
            .map(|(_, diags)| diags.clone())
    }
}

impl Workbench for RecordingWorkbench {
    fn info(&self, message: &str) {
        self.notices.lock().unwrap().push(("info", message.to_string()));
    }

    fn warn(&self, message: &str) {
        self.notices.lock().unwrap().push(("warn", message.to_string()));
    }

    fn error(&self, message: &str) {
        self.notices.lock().unwrap().push(("error", message.to_string()));
    }

    fn active_document(&self) -> Option<Document> {
        self.active.lock().unwrap().clone()
    }

    fn apply_edit(&self, uri: &DocumentUri, new_text: &str) -> Result<()> {
        self.edits
            .lock()
            .unwrap()
            .push((uri.clone(), new_text.to_string()));
        Ok(())
    }

    fn stage_fix(&self, document: &Document, proposed: &str, title: &str) -> Result<()> {
        self.staged.lock().unwrap().push((
            document.uri().clone(),
            proposed.to_string(),
            title.to_string(),
        ));
        Ok(())
    }

    fn publish_diagnostics(&self, uri: &DocumentUri, diagnostics: &[Diagnostic]) {
        self.published
            .lock()
            .unwrap()
            .push((uri.clone(), diagnostics.to_vec()));
    }

    fn open_panel(&self, title: &str, html: &str) -> PanelId {
        let panel = PanelId(self.next_panel.fetch_add(1, Ordering::Relaxed));
        self.panels
            .lock()
            .unwrap()
            .push((panel, title.to_string(), html.to_string()));
        panel
    }

    fn reveal_panel(&self, panel: PanelId) {
        self.reveals.lock().unwrap().push(panel);
    }
}

/// A [`crate::scheduler::DocumentAnalysis`] stub that counts invocations per
/// document.
#[derive(Default)]
pub struct CountingAnalysis {
    pub passes: Mutex<Vec<DocumentUri>>,
}

impl CountingAnalysis {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn count(&self) -> usize {
        self.passes.lock().unwrap().len()
    }

    pub fn count_for(&self, uri: &DocumentUri) -> usize {
        self.passes.lock().unwrap().iter().filter(|u| *u == uri).count()
    }

    pub fn per_document(&self) -> HashMap<DocumentUri, usize> {
        let mut counts = HashMap::new();
        for uri in self.passes.lock().unwrap().iter() {
            *counts.entry(uri.clone()).or_insert(0) += 1;
        }
        counts
    }
}

impl crate::scheduler::DocumentAnalysis for CountingAnalysis {
    fn analyze(&self, document: Document) -> futures::future::BoxFuture<'static, ()> {
        self.passes.lock().unwrap().push(document.uri().clone());
        Box::pin(async {})
    }
}
