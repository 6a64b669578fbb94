//! Fix generation and application.

use crate::client::FrameworkClient;
use crate::config::Settings;
use crate::diagnostics::Diagnostic;
use crate::document::Document;
use crate::host::Workbench;
use crate::vulnerability::Vulnerability;
use std::sync::{Arc, PoisonError, RwLock};

pub struct FixEngine {
    client: FrameworkClient,
    workbench: Arc<dyn Workbench>,
    settings: Arc<RwLock<Settings>>,
}

impl FixEngine {
    pub fn new(
        client: FrameworkClient,
        workbench: Arc<dyn Workbench>,
        settings: Arc<RwLock<Settings>>,
    ) -> Self {
        Self {
            client,
            workbench,
            settings,
        }
    }

    /// Ask the service to fix one finding, then apply or stage the result.
    ///
    /// The document snapshot is trusted as-is; whether the buffer has moved
    /// under the diagnostic since analysis is the caller's risk. A failed
    /// fix is terminal for this invocation: no retry, no edit.
    pub async fn fix_vulnerability(
        &self,
        vulnerability: &Vulnerability,
        document: &Document,
        _diagnostic: Option<&Diagnostic>,
    ) {
        let Some(language) = document.language() else {
            tracing::warn!(
                "fix requested for unsupported language {:?}",
                document.language_id()
            );
            return;
        };

        let fixed = match self
            .client
            .fix(document.text(), vulnerability, language)
            .await
        {
            Ok(fixed) => fixed,
            Err(err) => {
                self.workbench
                    .error(&format!("Failed to fix vulnerability: {err}"));
                return;
            }
        };

        if fixed.is_empty() {
            self.workbench.error("Fix generation failed");
            return;
        }

        let auto_fix = self
            .settings
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .auto_fix;

        if auto_fix {
            match self.workbench.apply_edit(document.uri(), &fixed) {
                Ok(()) => self.workbench.info("Fix applied successfully!"),
                Err(err) => self
                    .workbench
                    .error(&format!("Failed to apply fix: {err}")),
            }
        } else {
            let title = format!("Fix for {}", vulnerability.kind);
            if let Err(err) = self.workbench.stage_fix(document, &fixed, &title) {
                self.workbench
                    .error(&format!("Failed to stage fix: {err}"));
            }
        }
    }
}
