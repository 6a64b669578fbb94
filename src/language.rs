//! Supported source languages.
//!
//! The automation allow-list, the tag sent to the analysis service, and the
//! workspace scan filter all derive from this one enum, so the three views
//! cannot drift apart. The editor identifier and the wire tag are the same
//! string for every supported language.

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Language {
    Python,
    JavaScript,
    TypeScript,
    Java,
    Cpp,
    C,
}

impl Language {
    pub const ALL: [Language; 6] = [
        Language::Python,
        Language::JavaScript,
        Language::TypeScript,
        Language::Java,
        Language::Cpp,
        Language::C,
    ];

    /// Map an editor language identifier onto a supported language.
    ///
    /// Anything not listed here is outside the automation allow-list and is
    /// never sent to the service.
    pub fn from_editor_id(id: &str) -> Option<Self> {
        match id {
            "python" => Some(Language::Python),
            "javascript" => Some(Language::JavaScript),
            "typescript" => Some(Language::TypeScript),
            "java" => Some(Language::Java),
            "cpp" => Some(Language::Cpp),
            "c" => Some(Language::C),
            _ => None,
        }
    }

    /// Map a file extension onto a supported language (workspace scans).
    pub fn from_extension(ext: &str) -> Option<Self> {
        match ext {
            "py" => Some(Language::Python),
            "js" => Some(Language::JavaScript),
            "ts" => Some(Language::TypeScript),
            "java" => Some(Language::Java),
            "cpp" => Some(Language::Cpp),
            "c" => Some(Language::C),
            _ => None,
        }
    }

    /// The identifier, which doubles as the tag sent on the wire.
    pub fn id(&self) -> &'static str {
        match self {
            Language::Python => "python",
            Language::JavaScript => "javascript",
            Language::TypeScript => "typescript",
            Language::Java => "java",
            Language::Cpp => "cpp",
            Language::C => "c",
        }
    }
}

impl std::fmt::Display for Language {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.id())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_editor_ids_round_trip() {
        for language in Language::ALL {
            assert_eq!(Language::from_editor_id(language.id()), Some(language));
        }
    }

    #[test]
    fn test_unsupported_ids_are_rejected() {
        assert_eq!(Language::from_editor_id("rust"), None);
        assert_eq!(Language::from_editor_id("Python"), None);
        assert_eq!(Language::from_editor_id(""), None);
    }

    #[test]
    fn test_extension_filter_matches_allow_list() {
        for ext in ["py", "js", "ts", "java", "cpp", "c"] {
            assert!(Language::from_extension(ext).is_some());
        }
        assert_eq!(Language::from_extension("rs"), None);
        assert_eq!(Language::from_extension("tsx"), None);
    }
}
