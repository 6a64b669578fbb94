use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use similar::{ChangeTag, TextDiff};
use std::fs;
use std::path::PathBuf;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use tracing_subscriber::EnvFilter;
use vigil::config::Settings;
use vigil::diagnostics::Diagnostic;
use vigil::document::{Document, DocumentUri};
use vigil::engine::Engine;
use vigil::host::{PanelId, Workbench};
use vigil::workspace::{self, CancelFlag};

#[derive(Parser, Debug)]
#[command(
    name = "vigil",
    about = "Vulnerability triage against a remote analysis service",
    version
)]
struct Args {
    /// Override the analysis service URL for this invocation
    #[arg(long, global = true)]
    api_url: Option<String>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Analyze a single file and print its findings
    Analyze {
        file: PathBuf,
    },
    /// Analyze every supported file under a directory (Ctrl-C cancels)
    Scan {
        #[arg(default_value = ".")]
        path: PathBuf,
    },
    /// Request a fix for a finding in a file
    Fix {
        file: PathBuf,
        /// 1-based line of the finding to fix (defaults to the first one)
        #[arg(long)]
        line: Option<i64>,
        /// Apply the fix in place instead of showing a diff
        #[arg(long)]
        apply: bool,
    },
    /// Toggle privacy-first mode
    Privacy,
    /// Analyze a directory and write the vulnerability report
    Report {
        #[arg(default_value = ".")]
        path: PathBuf,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .with_writer(std::io::stderr)
        .init();

    let args = Args::parse();

    let mut settings = Settings::load();
    if let Some(api_url) = &args.api_url {
        settings.api_url = api_url.clone();
    }
    if let Command::Fix { apply: true, .. } = &args.command {
        settings.auto_fix = true;
    }

    let workbench = Arc::new(ConsoleWorkbench::new());
    let engine = Engine::new(settings, workbench);

    match args.command {
        Command::Analyze { file } => {
            let document = workspace::load_document(&file)?;
            engine.analyze_document(&document).await;
            print_diagnostics(document.uri(), &engine.store().get(document.uri()));
        }
        Command::Scan { path } => {
            let summary = run_scan(&engine, &path).await?;
            for (uri, diagnostics) in engine.store().all() {
                print_diagnostics(&uri, &diagnostics);
            }
            if summary.cancelled {
                eprintln!("  Scan cancelled.");
            }
        }
        Command::Fix { file, line, .. } => {
            let document = workspace::load_document(&file)?;
            engine.analyze_document(&document).await;
            let diagnostics = engine.store().get(document.uri());
            let target = diagnostics.iter().find(|diagnostic| {
                diagnostic.vulnerability.as_ref().is_some_and(|v| {
                    line.map(|wanted| v.line == wanted).unwrap_or(true)
                })
            });
            match target {
                Some(diagnostic) => {
                    let vulnerability = diagnostic
                        .vulnerability
                        .clone()
                        .context("diagnostic has no attached finding")?;
                    engine
                        .fix_vulnerability(&vulnerability, Some(&document), Some(diagnostic))
                        .await;
                }
                None => match line {
                    Some(line) => eprintln!("  No finding on line {line} of {}", file.display()),
                    None => eprintln!("  No findings in {}", file.display()),
                },
            }
        }
        Command::Privacy => {
            engine.toggle_privacy_mode();
        }
        Command::Report { path } => {
            run_scan(&engine, &path).await?;
            engine.show_report();
        }
    }

    engine.shutdown();
    Ok(())
}

async fn run_scan(engine: &Engine, path: &std::path::Path) -> Result<vigil::workspace::ScanSummary> {
    let cancel = CancelFlag::new();
    {
        let cancel = cancel.clone();
        tokio::spawn(async move {
            if tokio::signal::ctrl_c().await.is_ok() {
                cancel.cancel();
            }
        });
    }
    engine
        .analyze_workspace(path, &cancel, |progress| {
            eprintln!(
                "  [{}/{}] {}",
                progress.processed,
                progress.total,
                progress.path.display()
            );
        })
        .await
}

fn print_diagnostics(uri: &DocumentUri, diagnostics: &[Diagnostic]) {
    if diagnostics.is_empty() {
        println!("{uri}: no findings");
        return;
    }
    println!("{uri}:");
    for diagnostic in diagnostics {
        println!(
            "  {:<7} line {:<4} {} [{}]",
            diagnostic.severity.label(),
            diagnostic.range.start_line + 1,
            diagnostic.message,
            diagnostic.code
        );
    }
}

/// Headless host: notices go to stderr, staged fixes render as a diff on
/// stdout, panels are written out as HTML files.
struct ConsoleWorkbench {
    next_panel: AtomicU64,
}

impl ConsoleWorkbench {
    fn new() -> Self {
        Self {
            next_panel: AtomicU64::new(1),
        }
    }
}

impl Workbench for ConsoleWorkbench {
    fn info(&self, message: &str) {
        eprintln!("  {message}");
    }

    fn warn(&self, message: &str) {
        eprintln!("  Warning: {message}");
    }

    fn error(&self, message: &str) {
        eprintln!("  Error: {message}");
    }

    fn active_document(&self) -> Option<Document> {
        // Headless: every command names its file explicitly.
        None
    }

    fn apply_edit(&self, uri: &DocumentUri, new_text: &str) -> Result<()> {
        let path = uri
            .to_file_path()
            .with_context(|| format!("cannot edit non-file document {uri}"))?;
        fs::write(&path, new_text)
            .with_context(|| format!("failed to write {}", path.display()))?;
        Ok(())
    }

    fn stage_fix(&self, document: &Document, proposed: &str, title: &str) -> Result<()> {
        let name = document
            .uri()
            .to_file_path()
            .and_then(|p| p.file_name().map(|n| n.to_string_lossy().into_owned()))
            .unwrap_or_else(|| "untitled".to_string());
        let scratch = std::env::temp_dir().join(format!("vigil-fix-{name}"));
        fs::write(&scratch, proposed)
            .with_context(|| format!("failed to write {}", scratch.display()))?;

        println!("{title}");
        let diff = TextDiff::from_lines(document.text(), proposed);
        for change in diff.iter_all_changes() {
            let sign = match change.tag() {
                ChangeTag::Delete => "-",
                ChangeTag::Insert => "+",
                ChangeTag::Equal => " ",
            };
            print!("{sign}{change}");
        }
        println!();
        println!("Proposed fix written to {}", scratch.display());
        Ok(())
    }

    fn publish_diagnostics(&self, _uri: &DocumentUri, _diagnostics: &[Diagnostic]) {
        // Commands print diagnostics on demand; nothing to mirror live.
    }

    fn open_panel(&self, title: &str, html: &str) -> PanelId {
        let panel = PanelId(self.next_panel.fetch_add(1, Ordering::Relaxed));
        let path = std::env::temp_dir().join(format!("vigil-report-{}.html", panel.0));
        match fs::write(&path, html) {
            Ok(()) => println!("{title} written to {}", path.display()),
            Err(err) => eprintln!("  Error: failed to write report: {err}"),
        }
        panel
    }

    fn reveal_panel(&self, _panel: PanelId) {
        // The report file is already on disk; nothing to bring forward.
    }
}
