//! Document analysis: remote findings in, diagnostic sets out.

use crate::client::{ClientError, FrameworkClient};
use crate::config::Settings;
use crate::diagnostics::{self, DiagnosticStore};
use crate::document::Document;
use crate::host::Workbench;
use crate::scheduler::DocumentAnalysis;
use futures::future::BoxFuture;
use std::sync::{Arc, PoisonError, RwLock};

#[derive(Clone)]
pub struct VulnerabilityAnalyzer {
    client: FrameworkClient,
    store: Arc<DiagnosticStore>,
    workbench: Arc<dyn Workbench>,
    settings: Arc<RwLock<Settings>>,
}

impl VulnerabilityAnalyzer {
    pub fn new(
        client: FrameworkClient,
        store: Arc<DiagnosticStore>,
        workbench: Arc<dyn Workbench>,
        settings: Arc<RwLock<Settings>>,
    ) -> Self {
        Self {
            client,
            store,
            workbench,
            settings,
        }
    }

    /// Analyze one document and replace its diagnostic set.
    ///
    /// Documents outside the supported-language set are ignored. Failures
    /// never escape: an unreachable service surfaces as one error notice
    /// naming the endpoint, anything else is logged and the previous set
    /// stays put until a later pass succeeds or the document closes.
    pub async fn analyze_document(&self, document: &Document) {
        let Some(language) = document.language() else {
            return;
        };

        let privacy_first_mode = self
            .settings
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .privacy_first_mode;

        let generation = self.store.begin_pass(document.uri());
        match self
            .client
            .analyze(document.text(), language, privacy_first_mode)
            .await
        {
            Ok(vulnerabilities) => {
                tracing::debug!(
                    uri = %document.uri(),
                    findings = vulnerabilities.len(),
                    "analysis pass completed"
                );
                let set = diagnostics::from_vulnerabilities(document, &vulnerabilities);
                if self.store.complete_pass(document.uri(), generation, set) {
                    self.workbench
                        .publish_diagnostics(document.uri(), &self.store.get(document.uri()));
                } else {
                    tracing::debug!(uri = %document.uri(), "discarding superseded analysis pass");
                }
            }
            Err(ClientError::ConnectionRefused { url }) => {
                self.workbench.error(&format!(
                    "Cannot connect to the analysis service. Make sure it is running on {url}"
                ));
            }
            Err(err) => {
                tracing::warn!(uri = %document.uri(), "analysis failed: {err}");
            }
        }
    }
}

impl DocumentAnalysis for VulnerabilityAnalyzer {
    fn analyze(&self, document: Document) -> BoxFuture<'static, ()> {
        let analyzer = self.clone();
        Box::pin(async move {
            analyzer.analyze_document(&document).await;
        })
    }
}
