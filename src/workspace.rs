//! Workspace discovery and the batch scan.
//!
//! A batch scan walks the discovered files one at a time, checking its
//! cancel flag before each file. Cancelling keeps every diagnostic set
//! already produced and leaves the unvisited files exactly as they were.

use crate::document::{Document, DocumentUri};
use crate::language::Language;
use crate::scheduler::DocumentAnalysis;
use anyhow::{anyhow, Result};
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use walkdir::WalkDir;

/// Cooperative cancellation for one batch scan.
#[derive(Debug, Clone, Default)]
pub struct CancelFlag(Arc<AtomicBool>);

impl CancelFlag {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn cancel(&self) {
        self.0.store(true, Ordering::Relaxed);
    }

    pub fn is_cancelled(&self) -> bool {
        self.0.load(Ordering::Relaxed)
    }
}

/// Progress after each processed file.
#[derive(Debug, Clone)]
pub struct ScanProgress {
    pub processed: usize,
    pub total: usize,
    pub path: PathBuf,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ScanSummary {
    pub analyzed: usize,
    pub skipped: usize,
    pub total: usize,
    pub cancelled: bool,
}

/// Collect the analyzable files under `root`.
///
/// A file qualifies when its extension maps onto a supported language and no
/// ancestor directory is named `node_modules`. Output is sorted so scans are
/// deterministic.
pub fn discover(root: &Path) -> Vec<PathBuf> {
    let mut files: Vec<PathBuf> = WalkDir::new(root)
        .follow_links(false)
        .into_iter()
        .filter_entry(|entry| entry.file_name().to_str() != Some("node_modules"))
        .filter_map(|entry| entry.ok())
        .filter(|entry| entry.file_type().is_file())
        .map(|entry| entry.into_path())
        .filter(|path| {
            path.extension()
                .and_then(|ext| ext.to_str())
                .and_then(Language::from_extension)
                .is_some()
        })
        .collect();
    files.sort();
    files
}

/// Read a file into a document snapshot, inferring the language from its
/// extension.
pub fn load_document(path: &Path) -> Result<Document> {
    let ext = path.extension().and_then(|e| e.to_str()).unwrap_or_default();
    let language = Language::from_extension(ext)
        .ok_or_else(|| anyhow!("unsupported file type: {}", path.display()))?;
    let text = std::fs::read_to_string(path)
        .map_err(|err| anyhow!("failed to read {}: {err}", path.display()))?;
    Ok(Document::new(
        DocumentUri::from_path(path),
        language.id(),
        text,
    ))
}

pub struct WorkspaceScanner {
    analysis: Arc<dyn DocumentAnalysis>,
}

impl WorkspaceScanner {
    pub fn new(analysis: Arc<dyn DocumentAnalysis>) -> Self {
        Self { analysis }
    }

    /// Analyze every discovered file under `root`, sequentially.
    ///
    /// Unreadable files are logged and skipped; they never abort the scan.
    pub async fn scan(
        &self,
        root: &Path,
        cancel: &CancelFlag,
        mut progress: impl FnMut(&ScanProgress),
    ) -> Result<ScanSummary> {
        let files = discover(root);
        let total = files.len();
        let mut summary = ScanSummary {
            total,
            ..Default::default()
        };
        tracing::debug!(total, root = %root.display(), "workspace scan starting");

        for (index, path) in files.iter().enumerate() {
            if cancel.is_cancelled() {
                summary.cancelled = true;
                tracing::debug!(processed = index, total, "workspace scan cancelled");
                break;
            }
            match load_document(path) {
                Ok(document) => {
                    self.analysis.analyze(document).await;
                    summary.analyzed += 1;
                }
                Err(err) => {
                    tracing::warn!("skipping {}: {err}", path.display());
                    summary.skipped += 1;
                }
            }
            progress(&ScanProgress {
                processed: index + 1,
                total,
                path: path.clone(),
            });
        }

        Ok(summary)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_support::CountingAnalysis;
    use std::fs;

    fn touch(root: &Path, relative: &str) {
        let path = root.join(relative);
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent).unwrap();
        }
        fs::write(&path, "content").unwrap();
    }

    #[test]
    fn test_discover_filters_and_sorts() {
        let dir = tempfile::tempdir().unwrap();
        let root = dir.path();
        touch(root, "b/app.py");
        touch(root, "a/index.js");
        touch(root, "a/util.ts");
        touch(root, "a/legacy.java");
        touch(root, "a/native.cpp");
        touch(root, "a/low.c");
        touch(root, "readme.md");
        touch(root, "main.rs");
        touch(root, "node_modules/dep/index.js");
        touch(root, "a/node_modules/nested/x.py");

        let files = discover(root);
        let names: Vec<String> = files
            .iter()
            .map(|p| p.strip_prefix(root).unwrap().display().to_string())
            .collect();
        assert_eq!(
            names,
            vec![
                "a/index.js",
                "a/legacy.java",
                "a/low.c",
                "a/native.cpp",
                "a/util.ts",
                "b/app.py",
            ]
        );
    }

    #[tokio::test]
    async fn test_scan_visits_every_file_in_order() {
        let dir = tempfile::tempdir().unwrap();
        let root = dir.path();
        touch(root, "a.py");
        touch(root, "b.py");
        touch(root, "c.py");

        let analysis = Arc::new(CountingAnalysis::new());
        let scanner = WorkspaceScanner::new(Arc::clone(&analysis) as _);
        let mut seen = Vec::new();
        let summary = scanner
            .scan(root, &CancelFlag::new(), |p| seen.push(p.path.clone()))
            .await
            .unwrap();

        assert_eq!(summary.analyzed, 3);
        assert_eq!(summary.total, 3);
        assert!(!summary.cancelled);
        assert_eq!(seen.len(), 3);
        assert_eq!(analysis.count(), 3);
    }

    #[tokio::test]
    async fn test_cancel_after_n_files_leaves_the_rest_unvisited() {
        let dir = tempfile::tempdir().unwrap();
        let root = dir.path();
        for name in ["a.py", "b.py", "c.py", "d.py"] {
            touch(root, name);
        }

        let analysis = Arc::new(CountingAnalysis::new());
        let scanner = WorkspaceScanner::new(Arc::clone(&analysis) as _);
        let cancel = CancelFlag::new();
        let summary = {
            let cancel = cancel.clone();
            scanner
                .scan(root, &cancel.clone(), move |p| {
                    if p.processed == 2 {
                        cancel.cancel();
                    }
                })
                .await
                .unwrap()
        };

        assert!(summary.cancelled);
        assert_eq!(summary.analyzed, 2);
        assert_eq!(summary.total, 4);
        // Only the first two discovered files ever reached analysis.
        assert_eq!(analysis.count(), 2);
    }
}
