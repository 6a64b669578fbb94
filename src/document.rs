//! Document identities and snapshots.
//!
//! The host editor owns the live text buffer; the engine only ever works
//! from immutable snapshots taken at event time.

use crate::language::Language;
use std::fmt;
use std::path::{Path, PathBuf};

/// Identity of a document, as assigned by the host.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct DocumentUri(String);

impl DocumentUri {
    pub fn new(uri: impl Into<String>) -> Self {
        Self(uri.into())
    }

    pub fn from_path(path: &Path) -> Self {
        Self(format!("file://{}", path.display()))
    }

    /// The filesystem path behind a `file://` uri, if that is what this is.
    pub fn to_file_path(&self) -> Option<PathBuf> {
        self.0.strip_prefix("file://").map(PathBuf::from)
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for DocumentUri {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// An immutable snapshot of one document's content.
#[derive(Debug, Clone, PartialEq)]
pub struct Document {
    uri: DocumentUri,
    language_id: String,
    text: String,
}

impl Document {
    pub fn new(uri: DocumentUri, language_id: impl Into<String>, text: impl Into<String>) -> Self {
        Self {
            uri,
            language_id: language_id.into(),
            text: text.into(),
        }
    }

    pub fn uri(&self) -> &DocumentUri {
        &self.uri
    }

    pub fn language_id(&self) -> &str {
        &self.language_id
    }

    /// The supported language this document maps to, if any. `None` means
    /// the document is outside the automation allow-list.
    pub fn language(&self) -> Option<Language> {
        Language::from_editor_id(&self.language_id)
    }

    pub fn text(&self) -> &str {
        &self.text
    }

    pub fn line_count(&self) -> usize {
        self.text.lines().count()
    }

    /// The text of a 0-based line, without its terminator.
    pub fn line_text(&self, index: usize) -> Option<&str> {
        self.text.lines().nth(index)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_file_uri_round_trip() {
        let uri = DocumentUri::from_path(Path::new("/tmp/app.py"));
        assert_eq!(uri.as_str(), "file:///tmp/app.py");
        assert_eq!(uri.to_file_path(), Some(PathBuf::from("/tmp/app.py")));
    }

    #[test]
    fn test_non_file_uri_has_no_path() {
        let uri = DocumentUri::new("untitled:Untitled-1");
        assert_eq!(uri.to_file_path(), None);
    }

    #[test]
    fn test_line_access() {
        let document = Document::new(
            DocumentUri::new("file:///tmp/app.py"),
            "python",
            "first\nsecond\nthird",
        );
        assert_eq!(document.line_count(), 3);
        assert_eq!(document.line_text(1), Some("second"));
        assert_eq!(document.line_text(3), None);
        assert_eq!(document.language(), Some(Language::Python));
    }

    #[test]
    fn test_unknown_language_id() {
        let document = Document::new(DocumentUri::new("file:///tmp/x.rb"), "ruby", "puts 1");
        assert_eq!(document.language(), None);
    }
}
