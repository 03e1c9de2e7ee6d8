//! Language tags and the file-extension table that selects them.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::Path;

/// A source grammar with a registered pattern library and resolver.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Language {
    Python,
    JavaScript,
    Vue,
    CSharp,
    Cpp,
}

impl Language {
    pub const ALL: [Language; 5] = [
        Language::Python,
        Language::JavaScript,
        Language::Vue,
        Language::CSharp,
        Language::Cpp,
    ];

    /// Stable lowercase name, also accepted by [`Language::from_name`].
    pub fn name(self) -> &'static str {
        match self {
            Language::Python => "python",
            Language::JavaScript => "javascript",
            Language::Vue => "vue",
            Language::CSharp => "csharp",
            Language::Cpp => "cpp",
        }
    }

    /// File extensions (without the dot) owned by this language.
    pub fn extensions(self) -> &'static [&'static str] {
        match self {
            Language::Python => &["py", "pyi"],
            Language::JavaScript => &["js", "mjs", "cjs", "jsx"],
            Language::Vue => &["vue"],
            Language::CSharp => &["cs"],
            Language::Cpp => &["cpp", "cc", "cxx", "c++", "hpp", "hh", "hxx", "h", "inl"],
        }
    }

    /// Look up a language by extension. Accepts `".py"` as well as `"py"`.
    pub fn from_extension(ext: &str) -> Option<Self> {
        let ext = ext.trim().trim_start_matches('.').to_ascii_lowercase();
        if ext.is_empty() {
            return None;
        }
        Self::ALL
            .into_iter()
            .find(|lang| lang.extensions().contains(&ext.as_str()))
    }

    /// Language of a file, judged by its extension alone.
    pub fn from_path(path: &Path) -> Option<Self> {
        path.extension()
            .and_then(|e| e.to_str())
            .and_then(Self::from_extension)
    }

    pub fn from_name(name: &str) -> Option<Self> {
        match name.trim().to_ascii_lowercase().as_str() {
            "python" | "py" => Some(Language::Python),
            "javascript" | "js" => Some(Language::JavaScript),
            "vue" => Some(Language::Vue),
            "csharp" | "c#" | "cs" => Some(Language::CSharp),
            "cpp" | "c++" | "cxx" => Some(Language::Cpp),
            _ => None,
        }
    }

    /// JavaScript and Vue share ES-module import syntax and resolution.
    pub fn is_es_module(self) -> bool {
        matches!(self, Language::JavaScript | Language::Vue)
    }
}

impl fmt::Display for Language {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_from_extension_with_and_without_dot() {
        assert_eq!(Language::from_extension(".py"), Some(Language::Python));
        assert_eq!(Language::from_extension("py"), Some(Language::Python));
        assert_eq!(Language::from_extension("HPP"), Some(Language::Cpp));
        assert_eq!(Language::from_extension(".vue"), Some(Language::Vue));
        assert_eq!(Language::from_extension(""), None);
        assert_eq!(Language::from_extension(".rs"), None);
    }

    #[test]
    fn test_from_path() {
        assert_eq!(
            Language::from_path(Path::new("src/app/Main.cs")),
            Some(Language::CSharp)
        );
        assert_eq!(
            Language::from_path(Path::new("include/widget.h")),
            Some(Language::Cpp)
        );
        assert_eq!(Language::from_path(Path::new("Makefile")), None);
    }

    #[test]
    fn test_name_roundtrip() {
        for lang in Language::ALL {
            assert_eq!(Language::from_name(lang.name()), Some(lang));
        }
    }
}
