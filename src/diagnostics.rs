//! Diagnostics derived from findings, and the per-document store.
//!
//! A document's diagnostic set is replaced wholesale every time an analysis
//! pass completes; nothing ever patches a set in place. The store is the one
//! piece of shared mutable state in the engine, and pass generations keep a
//! slow response from clobbering the result of a newer pass.

use crate::document::{Document, DocumentUri};
use crate::vulnerability::{Severity, Vulnerability};
use std::collections::HashMap;
use std::sync::{Mutex, MutexGuard, PoisonError};

/// Source tag distinguishing this engine's diagnostics from other producers'.
pub const DIAGNOSTIC_SOURCE: &str = "vigil";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DiagnosticSeverity {
    Error,
    Warning,
    Information,
    Hint,
}

impl DiagnosticSeverity {
    pub fn label(&self) -> &'static str {
        match self {
            DiagnosticSeverity::Error => "error",
            DiagnosticSeverity::Warning => "warning",
            DiagnosticSeverity::Information => "info",
            DiagnosticSeverity::Hint => "hint",
        }
    }
}

impl From<&Severity> for DiagnosticSeverity {
    fn from(severity: &Severity) -> Self {
        match severity {
            Severity::Critical | Severity::High => DiagnosticSeverity::Error,
            Severity::Medium => DiagnosticSeverity::Warning,
            Severity::Low => DiagnosticSeverity::Information,
            Severity::Other(_) => DiagnosticSeverity::Warning,
        }
    }
}

/// 0-based line/column range; columns count characters.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Range {
    pub start_line: u32,
    pub start_column: u32,
    pub end_line: u32,
    pub end_column: u32,
}

impl Range {
    /// The full extent of one line.
    pub fn line(line: u32, length: u32) -> Self {
        Self {
            start_line: line,
            start_column: 0,
            end_line: line,
            end_column: length,
        }
    }
}

/// An editor-visible marker derived from one finding.
#[derive(Debug, Clone, PartialEq)]
pub struct Diagnostic {
    pub range: Range,
    pub severity: DiagnosticSeverity,
    pub message: String,
    pub source: String,
    /// Weakness classifier when known, otherwise the finding's category.
    pub code: String,
    /// Extra context shown alongside the marker.
    pub cwe_note: String,
    /// The finding this diagnostic was derived from. The action bridge and
    /// the fix workflow read this; they never re-parse message text.
    pub vulnerability: Option<Vulnerability>,
}

/// Convert a pass's findings into the document's diagnostic set.
pub fn from_vulnerabilities(
    document: &Document,
    vulnerabilities: &[Vulnerability],
) -> Vec<Diagnostic> {
    vulnerabilities
        .iter()
        .map(|vulnerability| to_diagnostic(document, vulnerability))
        .collect()
}

fn to_diagnostic(document: &Document, vulnerability: &Vulnerability) -> Diagnostic {
    // Service lines are 1-based; a bad report clamps to the first line.
    let line = vulnerability.line.saturating_sub(1).max(0) as u32;
    let length = document
        .line_text(line as usize)
        .map(|text| text.chars().count() as u32)
        .unwrap_or(0);

    Diagnostic {
        range: Range::line(line, length),
        severity: DiagnosticSeverity::from(&vulnerability.severity),
        message: format!("{}: {}", vulnerability.kind, vulnerability.message),
        source: DIAGNOSTIC_SOURCE.to_string(),
        code: vulnerability
            .cwe
            .clone()
            .unwrap_or_else(|| vulnerability.kind.clone()),
        cwe_note: format!("CWE: {}", vulnerability.cwe.as_deref().unwrap_or("N/A")),
        vulnerability: Some(vulnerability.clone()),
    }
}

#[derive(Default)]
struct DocumentState {
    latest_pass: u64,
    diagnostics: Vec<Diagnostic>,
}

/// Per-document diagnostic sets with atomic replacement.
#[derive(Default)]
pub struct DiagnosticStore {
    documents: Mutex<HashMap<DocumentUri, DocumentState>>,
}

impl DiagnosticStore {
    pub fn new() -> Self {
        Self::default()
    }

    fn lock(&self) -> MutexGuard<'_, HashMap<DocumentUri, DocumentState>> {
        self.documents.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Start an analysis pass for a document. The returned generation must
    /// be handed back to [`DiagnosticStore::complete_pass`].
    pub fn begin_pass(&self, uri: &DocumentUri) -> u64 {
        let mut documents = self.lock();
        let state = documents.entry(uri.clone()).or_default();
        state.latest_pass += 1;
        state.latest_pass
    }

    /// Replace the document's set with the result of a pass.
    ///
    /// Returns `false` and changes nothing when a newer pass has started
    /// since `generation`, or when the document was closed in the meantime.
    pub fn complete_pass(
        &self,
        uri: &DocumentUri,
        generation: u64,
        diagnostics: Vec<Diagnostic>,
    ) -> bool {
        let mut documents = self.lock();
        let Some(state) = documents.get_mut(uri) else {
            return false;
        };
        if generation != state.latest_pass {
            return false;
        }
        state.diagnostics = diagnostics;
        true
    }

    pub fn get(&self, uri: &DocumentUri) -> Vec<Diagnostic> {
        self.lock()
            .get(uri)
            .map(|state| state.diagnostics.clone())
            .unwrap_or_default()
    }

    /// Every document with at least one diagnostic, in uri order.
    pub fn all(&self) -> Vec<(DocumentUri, Vec<Diagnostic>)> {
        let documents = self.lock();
        let mut entries: Vec<(DocumentUri, Vec<Diagnostic>)> = documents
            .iter()
            .filter(|(_, state)| !state.diagnostics.is_empty())
            .map(|(uri, state)| (uri.clone(), state.diagnostics.clone()))
            .collect();
        entries.sort_by(|a, b| a.0.cmp(&b.0));
        entries
    }

    pub fn total(&self) -> usize {
        self.lock()
            .values()
            .map(|state| state.diagnostics.len())
            .sum()
    }

    /// Drop a closed document's state entirely.
    pub fn remove(&self, uri: &DocumentUri) {
        self.lock().remove(uri);
    }

    pub fn clear(&self) {
        self.lock().clear();
    }
}
