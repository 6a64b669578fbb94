//! Wire model for findings reported by the analysis service.

use serde::{Deserialize, Serialize};

/// Severity label attached to a finding.
///
/// The service reports one of four labels; parsing is case-insensitive and
/// anything outside the known set is preserved verbatim rather than dropped.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Severity {
    Low,
    Medium,
    High,
    Critical,
    Other(String),
}

impl Severity {
    pub fn parse(raw: &str) -> Self {
        match raw.to_ascii_uppercase().as_str() {
            "LOW" => Severity::Low,
            "MEDIUM" => Severity::Medium,
            "HIGH" => Severity::High,
            "CRITICAL" => Severity::Critical,
            _ => Severity::Other(raw.to_string()),
        }
    }

    pub fn as_str(&self) -> &str {
        match self {
            Severity::Low => "LOW",
            Severity::Medium => "MEDIUM",
            Severity::High => "HIGH",
            Severity::Critical => "CRITICAL",
            Severity::Other(raw) => raw,
        }
    }
}

impl std::fmt::Display for Severity {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl Serialize for Severity {
    fn serialize<S: serde::Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(self.as_str())
    }
}

impl<'de> Deserialize<'de> for Severity {
    fn deserialize<D: serde::Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let raw = String::deserialize(deserializer)?;
        Ok(Severity::parse(&raw))
    }
}

/// A single vulnerability reported by the analysis service.
///
/// Field names follow the service's JSON contract; `type` becomes `kind` on
/// the Rust side. The attached copy on a diagnostic is the sole carrier of
/// remediation intent, so this struct travels with the diagnostic instead of
/// being re-derived from message text.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Vulnerability {
    #[serde(rename = "type")]
    pub kind: String,
    pub severity: Severity,
    /// 1-based line number as reported by the service.
    pub line: i64,
    /// Optional 1-based column.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub column: Option<u32>,
    pub message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub cwe: Option<String>,
    /// Offending snippet, when the service includes one.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub code: Option<String>,
    /// Suggested textual fix. Informational only; the fix workflow asks the
    /// service's fix endpoint instead of splicing this in.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub fix: Option<String>,
}
