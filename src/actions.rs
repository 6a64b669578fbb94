//! Quick-fix and details actions derived from current diagnostics.

use crate::diagnostics::{Diagnostic, Range, DIAGNOSTIC_SOURCE};
use crate::document::{Document, DocumentUri};
use crate::vulnerability::Vulnerability;

/// What invoking an action does.
#[derive(Debug, Clone, PartialEq)]
pub enum ActionCommand {
    /// Ask the service for a fix and apply or stage it.
    FixVulnerability {
        vulnerability: Vulnerability,
        uri: DocumentUri,
        diagnostic: Diagnostic,
    },
    /// Display the finding's details.
    ShowDetails { vulnerability: Vulnerability },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ActionKind {
    QuickFix,
    Informational,
}

#[derive(Debug, Clone, PartialEq)]
pub struct CodeAction {
    pub title: String,
    pub kind: ActionKind,
    pub command: ActionCommand,
}

/// Produce the actions available for `range`, given the diagnostics the host
/// currently shows in that context.
///
/// Diagnostics from other producers and diagnostics without an attached
/// vulnerability contribute nothing. Order follows the input and duplicates
/// are kept: two findings at one location mean two separate fix actions. An
/// empty result means "no actions here", not an error.
pub fn actions_for(
    document: &Document,
    _range: &Range,
    diagnostics: &[Diagnostic],
) -> Vec<CodeAction> {
    let mut actions = Vec::new();

    for diagnostic in diagnostics {
        if diagnostic.source != DIAGNOSTIC_SOURCE {
            continue;
        }
        let Some(vulnerability) = &diagnostic.vulnerability else {
            continue;
        };

        actions.push(CodeAction {
            title: format!("Fix {}", vulnerability.kind),
            kind: ActionKind::QuickFix,
            command: ActionCommand::FixVulnerability {
                vulnerability: vulnerability.clone(),
                uri: document.uri().clone(),
                diagnostic: diagnostic.clone(),
            },
        });
        actions.push(CodeAction {
            title: format!("Show {} details", vulnerability.kind),
            kind: ActionKind::Informational,
            command: ActionCommand::ShowDetails {
                vulnerability: vulnerability.clone(),
            },
        });
    }

    actions
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::diagnostics::{from_vulnerabilities, DiagnosticSeverity};
    use crate::vulnerability::Severity;

    fn document() -> Document {
        Document::new(DocumentUri::new("file:///a.py"), "python", "query\nrender")
    }

    fn finding(kind: &str, line: i64) -> Vulnerability {
        Vulnerability {
            kind: kind.to_string(),
            severity: Severity::High,
            line,
            column: None,
            message: "bad".to_string(),
            cwe: None,
            code: None,
            fix: None,
        }
    }

    fn whole_line() -> Range {
        Range::line(0, 5)
    }

    #[test]
    fn test_each_matching_diagnostic_yields_two_actions_in_order() {
        let doc = document();
        let diags = from_vulnerabilities(&doc, &[finding("SQLi", 1), finding("XSS", 2)]);
        let actions = actions_for(&doc, &whole_line(), &diags);

        let titles: Vec<&str> = actions.iter().map(|a| a.title.as_str()).collect();
        assert_eq!(
            titles,
            vec!["Fix SQLi", "Show SQLi details", "Fix XSS", "Show XSS details"]
        );
        assert_eq!(actions[0].kind, ActionKind::QuickFix);
        assert_eq!(actions[1].kind, ActionKind::Informational);

        match &actions[0].command {
            ActionCommand::FixVulnerability {
                vulnerability,
                uri,
                diagnostic,
            } => {
                assert_eq!(vulnerability.kind, "SQLi");
                assert_eq!(uri, doc.uri());
                assert_eq!(diagnostic, &diags[0]);
            }
            other => panic!("expected fix command, got {other:?}"),
        }
    }

    #[test]
    fn test_foreign_and_bare_diagnostics_are_skipped() {
        let doc = document();
        let mut diags = from_vulnerabilities(&doc, &[finding("SQLi", 1)]);
        diags.push(Diagnostic {
            range: whole_line(),
            severity: DiagnosticSeverity::Warning,
            message: "unused variable".to_string(),
            source: "linter".to_string(),
            code: "W0612".to_string(),
            cwe_note: String::new(),
            vulnerability: None,
        });
        let mut ours_without_finding = diags[0].clone();
        ours_without_finding.vulnerability = None;
        diags.push(ours_without_finding);

        let actions = actions_for(&doc, &whole_line(), &diags);
        assert_eq!(actions.len(), 2);
    }

    #[test]
    fn test_duplicates_are_kept() {
        let doc = document();
        let diags = from_vulnerabilities(&doc, &[finding("SQLi", 1), finding("SQLi", 1)]);
        let actions = actions_for(&doc, &whole_line(), &diags);
        assert_eq!(actions.len(), 4);
    }

    #[test]
    fn test_no_matches_is_empty_not_an_error() {
        let doc = document();
        assert!(actions_for(&doc, &whole_line(), &[]).is_empty());
    }
}
