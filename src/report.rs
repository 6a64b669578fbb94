//! The vulnerability report panel.
//!
//! At most one report panel exists at a time. Showing the report reveals the
//! existing panel when one is open; otherwise it renders fresh HTML from the
//! current diagnostic sets and opens a new one. Closing the panel resets the
//! singleton so the next show starts over.

use crate::diagnostics::DiagnosticStore;
use crate::host::{PanelId, Workbench};
use crate::vulnerability::Severity;
use std::sync::{Mutex, PoisonError};

pub const REPORT_TITLE: &str = "Vulnerability Report";

#[derive(Default)]
pub struct ReportPanel {
    current: Mutex<Option<PanelId>>,
}

impl ReportPanel {
    pub fn new() -> Self {
        Self::default()
    }

    /// Reveal the open panel, or render and open a new one.
    pub fn create_or_show(&self, workbench: &dyn Workbench, store: &DiagnosticStore) {
        let mut current = self.current.lock().unwrap_or_else(PoisonError::into_inner);
        if let Some(panel) = *current {
            workbench.reveal_panel(panel);
            return;
        }
        let html = render_report(store);
        *current = Some(workbench.open_panel(REPORT_TITLE, &html));
    }

    /// Host callback for a closed panel; a later show creates a new one.
    pub fn panel_closed(&self, panel: PanelId) {
        let mut current = self.current.lock().unwrap_or_else(PoisonError::into_inner);
        if *current == Some(panel) {
            *current = None;
        }
    }
}

fn severity_class(severity: &Severity) -> &'static str {
    match severity {
        Severity::Critical => "severity-critical",
        Severity::High => "severity-high",
        Severity::Medium | Severity::Other(_) => "severity-medium",
        Severity::Low => "severity-low",
    }
}

fn html_escape(raw: &str) -> String {
    let mut escaped = String::with_capacity(raw.len());
    for c in raw.chars() {
        match c {
            '&' => escaped.push_str("&amp;"),
            '<' => escaped.push_str("&lt;"),
            '>' => escaped.push_str("&gt;"),
            '"' => escaped.push_str("&quot;"),
            '\'' => escaped.push_str("&#39;"),
            _ => escaped.push(c),
        }
    }
    escaped
}

/// Render the report for everything currently in the store.
pub fn render_report(store: &DiagnosticStore) -> String {
    let mut body = String::new();

    let documents = store.all();
    if documents.is_empty() {
        body.push_str("<p>Run analysis to see vulnerabilities here.</p>\n");
    } else {
        for (uri, diagnostics) in &documents {
            body.push_str(&format!("<h2>{}</h2>\n", html_escape(uri.as_str())));
            for diagnostic in diagnostics {
                let Some(vulnerability) = &diagnostic.vulnerability else {
                    continue;
                };
                body.push_str(&format!(
                    concat!(
                        "<div class=\"vulnerability {class}\">\n",
                        "  <h3>{kind} <span class=\"severity\">({severity})</span></h3>\n",
                        "  <p>{message}</p>\n",
                        "  <p class=\"meta\">Line {line} &middot; {cwe}</p>\n",
                        "</div>\n"
                    ),
                    class = severity_class(&vulnerability.severity),
                    kind = html_escape(&vulnerability.kind),
                    severity = html_escape(vulnerability.severity.as_str()),
                    message = html_escape(&vulnerability.message),
                    line = diagnostic.range.start_line + 1,
                    cwe = html_escape(&diagnostic.cwe_note),
                ));
            }
        }
    }

    let generated = chrono::Local::now().format("%Y-%m-%d %H:%M");
    format!(
        concat!(
            "<!DOCTYPE html>\n",
            "<html lang=\"en\">\n",
            "<head>\n",
            "    <meta charset=\"UTF-8\">\n",
            "    <meta name=\"viewport\" content=\"width=device-width, initial-scale=1.0\">\n",
            "    <title>{title}</title>\n",
            "    <style>\n",
            "        body {{ font-family: sans-serif; padding: 20px; }}\n",
            "        .vulnerability {{\n",
            "            border: 1px solid #ccc;\n",
            "            padding: 15px;\n",
            "            margin: 10px 0;\n",
            "            border-radius: 5px;\n",
            "        }}\n",
            "        .severity-critical {{ border-left: 4px solid #f44336; }}\n",
            "        .severity-high {{ border-left: 4px solid #ff9800; }}\n",
            "        .severity-medium {{ border-left: 4px solid #ffc107; }}\n",
            "        .severity-low {{ border-left: 4px solid #4caf50; }}\n",
            "        .meta {{ color: #666; font-size: 0.9em; }}\n",
            "    </style>\n",
            "</head>\n",
            "<body>\n",
            "    <h1>&#128274; {title}</h1>\n",
            "    <p class=\"meta\">{count} finding(s) &middot; generated {generated}</p>\n",
            "    <div id=\"report-content\">\n",
            "{body}",
            "    </div>\n",
            "</body>\n",
            "</html>\n"
        ),
        title = REPORT_TITLE,
        count = store.total(),
        generated = generated,
        body = body,
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::diagnostics::from_vulnerabilities;
    use crate::document::{Document, DocumentUri};
    use crate::test_support::RecordingWorkbench;
    use crate::vulnerability::Vulnerability;
    use std::sync::Arc;

    fn store_with_finding() -> DiagnosticStore {
        let store = DiagnosticStore::new();
        let uri = DocumentUri::new("file:///a.py");
        let doc = Document::new(uri.clone(), "python", "query = <input>");
        let finding = Vulnerability {
            kind: "SQL Injection".to_string(),
            severity: Severity::Critical,
            line: 1,
            column: None,
            message: "tainted & unsafe".to_string(),
            cwe: Some("CWE-89".to_string()),
            code: None,
            fix: None,
        };
        let pass = store.begin_pass(&uri);
        store.complete_pass(&uri, pass, from_vulnerabilities(&doc, &[finding]));
        store
    }

    #[test]
    fn test_empty_store_renders_placeholder() {
        let html = render_report(&DiagnosticStore::new());
        assert!(html.contains("Run analysis to see vulnerabilities here."));
    }

    #[test]
    fn test_findings_render_with_severity_class_and_escaping() {
        let html = render_report(&store_with_finding());
        assert!(html.contains("severity-critical"));
        assert!(html.contains("SQL Injection"));
        assert!(html.contains("tainted &amp; unsafe"));
        assert!(html.contains("CWE: CWE-89"));
        assert!(!html.contains("<input>"));
    }

    #[test]
    fn test_panel_is_a_singleton_until_closed() {
        let workbench = Arc::new(RecordingWorkbench::new());
        let store = store_with_finding();
        let panel = ReportPanel::new();

        panel.create_or_show(workbench.as_ref(), &store);
        panel.create_or_show(workbench.as_ref(), &store);
        assert_eq!(workbench.panels.lock().unwrap().len(), 1);
        assert_eq!(workbench.reveals.lock().unwrap().len(), 1);

        let id = workbench.panels.lock().unwrap()[0].0;
        panel.panel_closed(id);
        panel.create_or_show(workbench.as_ref(), &store);
        assert_eq!(workbench.panels.lock().unwrap().len(), 2);
    }

    #[test]
    fn test_closing_an_unknown_panel_changes_nothing() {
        let workbench = Arc::new(RecordingWorkbench::new());
        let store = DiagnosticStore::new();
        let panel = ReportPanel::new();

        panel.create_or_show(workbench.as_ref(), &store);
        panel.panel_closed(PanelId(999));
        panel.create_or_show(workbench.as_ref(), &store);
        // Still the same open panel: one open, one reveal.
        assert_eq!(workbench.panels.lock().unwrap().len(), 1);
        assert_eq!(workbench.reveals.lock().unwrap().len(), 1);
    }
}
