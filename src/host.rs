//! Editor host capabilities.
//!
//! Everything the engine needs from the surrounding editor fits behind one
//! narrow trait, so the lifecycle logic runs identically under a real editor
//! adapter, the headless console host, and the test doubles.

use crate::diagnostics::Diagnostic;
use crate::document::{Document, DocumentUri};
use anyhow::Result;

/// Handle to an open report panel.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct PanelId(pub u64);

pub trait Workbench: Send + Sync {
    fn info(&self, message: &str);
    fn warn(&self, message: &str);
    fn error(&self, message: &str);

    /// The document the user is currently looking at, if any.
    fn active_document(&self) -> Option<Document>;

    /// Replace the entire content of `uri` in one edit.
    fn apply_edit(&self, uri: &DocumentUri, new_text: &str) -> Result<()>;

    /// Write `proposed` to a scratch location and present it as a diff
    /// against `document`. The real buffer stays untouched; accepting the
    /// change is the user's business.
    fn stage_fix(&self, document: &Document, proposed: &str, title: &str) -> Result<()>;

    /// Mirror a document's freshly replaced diagnostic set.
    fn publish_diagnostics(&self, uri: &DocumentUri, diagnostics: &[Diagnostic]);

    /// Open a report panel and return a handle for later reveals.
    fn open_panel(&self, title: &str, html: &str) -> PanelId;

    /// Bring an already open panel back into view.
    fn reveal_panel(&self, panel: PanelId);
}
