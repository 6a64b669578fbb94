//! When analysis runs: immediately on open and save, debounced on edit.
//!
//! Each document has at most one scheduled-but-not-yet-run pass; a new edit
//! cancels and replaces the pending timer, it never queues a second. Once a
//! pass has claimed its slot and started, it runs to completion; there is
//! no mid-flight abort.

use crate::config::Settings;
use crate::document::{Document, DocumentUri};
use futures::future::BoxFuture;
use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError, RwLock};
use std::time::Duration;
use tokio::task::JoinHandle;

/// Quiet period after the last edit before an automatic pass runs.
pub const DEBOUNCE: Duration = Duration::from_millis(1000);

/// Anything that can run one analysis pass over a document snapshot.
pub trait DocumentAnalysis: Send + Sync {
    fn analyze(&self, document: Document) -> BoxFuture<'static, ()>;
}

struct PendingPass {
    seq: u64,
    handle: JoinHandle<()>,
}

pub struct AnalysisScheduler {
    analysis: Arc<dyn DocumentAnalysis>,
    settings: Arc<RwLock<Settings>>,
    pending: Arc<Mutex<HashMap<DocumentUri, PendingPass>>>,
    next_seq: AtomicU64,
}

fn lock_pending(
    pending: &Mutex<HashMap<DocumentUri, PendingPass>>,
) -> MutexGuard<'_, HashMap<DocumentUri, PendingPass>> {
    pending.lock().unwrap_or_else(PoisonError::into_inner)
}

impl AnalysisScheduler {
    pub fn new(analysis: Arc<dyn DocumentAnalysis>, settings: Arc<RwLock<Settings>>) -> Self {
        Self {
            analysis,
            settings,
            pending: Arc::new(Mutex::new(HashMap::new())),
            next_seq: AtomicU64::new(1),
        }
    }

    fn should_run(&self, document: &Document) -> bool {
        let enabled = self
            .settings
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .enable;
        enabled && document.language().is_some()
    }

    /// Opening a document triggers an immediate pass.
    pub async fn document_opened(&self, document: &Document) {
        if self.should_run(document) {
            self.analysis.analyze(document.clone()).await;
        }
    }

    /// Saving triggers an immediate pass.
    pub async fn document_saved(&self, document: &Document) {
        if self.should_run(document) {
            self.analysis.analyze(document.clone()).await;
        }
    }

    /// An edit schedules a pass after [`DEBOUNCE`] of inactivity, replacing
    /// any pass already scheduled for the same document.
    pub fn document_changed(&self, document: &Document) {
        if !self.should_run(document) {
            return;
        }

        let uri = document.uri().clone();
        let seq = self.next_seq.fetch_add(1, Ordering::Relaxed);
        let snapshot = document.clone();
        let analysis = Arc::clone(&self.analysis);

        let handle = tokio::spawn({
            let pending = Arc::clone(&self.pending);
            let uri = uri.clone();
            async move {
                tokio::time::sleep(DEBOUNCE).await;
                // Claim the slot before running. A later edit cancels the
                // timer through the map; a pass that got this far is no
                // longer cancellable.
                {
                    let mut pending = lock_pending(&pending);
                    match pending.get(&uri) {
                        Some(entry) if entry.seq == seq => {
                            pending.remove(&uri);
                        }
                        _ => return,
                    }
                }
                analysis.analyze(snapshot).await;
            }
        });

        let mut pending = lock_pending(&self.pending);
        if let Some(previous) = pending.insert(uri, PendingPass { seq, handle }) {
            previous.handle.abort();
        }
    }

    /// Drop a document's scheduled (not yet running) pass, if any.
    pub fn cancel_pending(&self, uri: &DocumentUri) {
        if let Some(previous) = lock_pending(&self.pending).remove(uri) {
            previous.handle.abort();
        }
    }
}

impl Drop for AnalysisScheduler {
    fn drop(&mut self) {
        for (_, pass) in lock_pending(&self.pending).drain() {
            pass.handle.abort();
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_support::CountingAnalysis;
    use tokio::time::{advance, Duration};

    fn scheduler(
        analysis: Arc<CountingAnalysis>,
        settings: Settings,
    ) -> AnalysisScheduler {
        AnalysisScheduler::new(analysis, Arc::new(RwLock::new(settings)))
    }

    fn python_doc(uri: &str) -> Document {
        Document::new(DocumentUri::new(uri), "python", "x = 1")
    }

    async fn settle() {
        for _ in 0..20 {
            tokio::task::yield_now().await;
        }
    }

    #[tokio::test(start_paused = true)]
    async fn test_three_edits_inside_the_window_run_once() {
        let analysis = Arc::new(CountingAnalysis::new());
        let scheduler = scheduler(Arc::clone(&analysis), Settings::default());
        let doc = python_doc("file:///a.py");

        // Yield after each edit so the scheduled task registers its timer
        // before the clock moves.
        scheduler.document_changed(&doc);
        settle().await;
        advance(Duration::from_millis(300)).await;
        scheduler.document_changed(&doc);
        settle().await;
        advance(Duration::from_millis(300)).await;
        scheduler.document_changed(&doc);
        settle().await;

        // 999ms after the last edit: still quiet.
        advance(Duration::from_millis(999)).await;
        settle().await;
        assert_eq!(analysis.count(), 0);

        advance(Duration::from_millis(2)).await;
        settle().await;
        assert_eq!(analysis.count(), 1);

        // Nothing else fires later.
        advance(Duration::from_secs(5)).await;
        settle().await;
        assert_eq!(analysis.count(), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn test_documents_debounce_independently() {
        let analysis = Arc::new(CountingAnalysis::new());
        let scheduler = scheduler(Arc::clone(&analysis), Settings::default());
        let a = python_doc("file:///a.py");
        let b = python_doc("file:///b.py");

        scheduler.document_changed(&a);
        scheduler.document_changed(&b);
        settle().await;
        advance(Duration::from_millis(1001)).await;
        settle().await;

        let counts = analysis.per_document();
        assert_eq!(counts.get(a.uri()), Some(&1));
        assert_eq!(counts.get(b.uri()), Some(&1));
    }

    #[tokio::test(start_paused = true)]
    async fn test_cancel_pending_drops_the_timer() {
        let analysis = Arc::new(CountingAnalysis::new());
        let scheduler = scheduler(Arc::clone(&analysis), Settings::default());
        let doc = python_doc("file:///a.py");

        scheduler.document_changed(&doc);
        settle().await;
        scheduler.cancel_pending(doc.uri());
        advance(Duration::from_secs(2)).await;
        settle().await;
        assert_eq!(analysis.count(), 0);
    }

    #[tokio::test(start_paused = true)]
    async fn test_disabled_or_unsupported_documents_never_schedule() {
        let analysis = Arc::new(CountingAnalysis::new());
        let mut settings = Settings::default();
        settings.enable = false;
        let off = scheduler(Arc::clone(&analysis), settings);
        off.document_changed(&python_doc("file:///a.py"));
        off.document_opened(&python_doc("file:///a.py")).await;

        let on = AnalysisScheduler::new(
            Arc::clone(&analysis) as Arc<dyn DocumentAnalysis>,
            Arc::new(RwLock::new(Settings::default())),
        );
        let ruby = Document::new(DocumentUri::new("file:///a.rb"), "ruby", "puts 1");
        on.document_changed(&ruby);
        on.document_saved(&ruby).await;

        advance(Duration::from_secs(2)).await;
        settle().await;
        assert_eq!(analysis.count(), 0);
    }

    #[tokio::test(start_paused = true)]
    async fn test_open_and_save_run_immediately() {
        let analysis = Arc::new(CountingAnalysis::new());
        let scheduler = scheduler(Arc::clone(&analysis), Settings::default());
        let doc = python_doc("file:///a.py");

        scheduler.document_opened(&doc).await;
        scheduler.document_saved(&doc).await;
        assert_eq!(analysis.count(), 2);
    }
}
