//! Per-trace options: where to look, what to skip, how much to extract.

use crate::error::TraceError;
use crate::language::Language;
use crate::origin::OriginSet;
use crate::paths;
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;
use std::path::{Path, PathBuf};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TraceOptions {
    pub origins: OriginSet,
    /// Emit whole files instead of individual definitions.
    pub whole_module_content: bool,
    /// Canonical paths omitted from the tree, together with their subtrees.
    pub exclude_files: BTreeSet<PathBuf>,
    /// Languages that may appear in the tree. Resolved files of any other
    /// language are omitted.
    pub file_types: BTreeSet<Language>,
}

impl TraceOptions {
    /// All languages enabled, nothing excluded, definition-level content.
    pub fn new(origins: OriginSet) -> Self {
        Self {
            origins,
            whole_module_content: false,
            exclude_files: BTreeSet::new(),
            file_types: Language::ALL.into_iter().collect(),
        }
    }

    pub fn with_whole_module_content(mut self, whole: bool) -> Self {
        self.whole_module_content = whole;
        self
    }

    /// Add files to the exclusion set. Paths are canonicalized on the way in.
    pub fn exclude<I, P>(mut self, files: I) -> Self
    where
        I: IntoIterator<Item = P>,
        P: AsRef<Path>,
    {
        self.exclude_files
            .extend(files.into_iter().map(|f| paths::canonical(f.as_ref())));
        self
    }

    pub fn with_file_types(mut self, languages: impl IntoIterator<Item = Language>) -> Self {
        self.file_types = languages.into_iter().collect();
        self
    }

    /// Enable languages by extension (`".py"`, `"vue"`, ...). Several
    /// extensions of one language collapse to that language.
    pub fn with_file_type_extensions<S: AsRef<str>>(
        self,
        extensions: &[S],
    ) -> Result<Self, TraceError> {
        let mut languages = BTreeSet::new();
        for ext in extensions {
            let ext = ext.as_ref();
            let language = Language::from_extension(ext).ok_or_else(|| {
                TraceError::UnknownFileType {
                    ext: ext.to_string(),
                }
            })?;
            languages.insert(language);
        }
        Ok(self.with_file_types(languages))
    }

    /// `path` must already be canonical.
    pub fn is_excluded(&self, path: &Path) -> bool {
        self.exclude_files.contains(path)
    }

    pub fn allows(&self, language: Language) -> bool {
        self.file_types.contains(&language)
    }
}
