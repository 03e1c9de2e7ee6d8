//! State shared by the steps of one trace.

use crate::facade::ExtractorRegistry;
use crate::sources::SourceCache;
use featctx_core::language::Language;
use featctx_core::module::Resolution;
use featctx_core::origin::OriginSet;
use featctx_core::reference::ImportReference;
use featctx_parser::{LanguagePatterns, SourceFile};
use std::path::Path;
use std::sync::Arc;

/// One trace: a registry to look languages up in, and a source cache owned
/// by this trace alone. Independent traces never share a session.
pub struct TraceSession<'r> {
    registry: &'r ExtractorRegistry,
    sources: SourceCache,
}

impl<'r> TraceSession<'r> {
    pub fn new(registry: &'r ExtractorRegistry) -> Self {
        Self {
            registry,
            sources: SourceCache::new(),
        }
    }

    pub fn registry(&self) -> &'r ExtractorRegistry {
        self.registry
    }

    pub fn sources_mut(&mut self) -> &mut SourceCache {
        &mut self.sources
    }

    pub fn load(&mut self, path: &Path) -> Result<Arc<SourceFile>, String> {
        self.sources.load(path)
    }

    pub(crate) fn patterns(&self, language: Language) -> Option<&'static dyn LanguagePatterns> {
        self.registry.support(language).map(|s| s.patterns)
    }

    /// Imports of a file, empty when its language is not registered.
    pub fn detect_imports(&self, file: &SourceFile) -> Vec<ImportReference> {
        self.patterns(file.language())
            .map(|patterns| patterns.detect_imports(file))
            .unwrap_or_default()
    }

    /// Resolve with the resolver of the file that holds the reference.
    pub fn resolve(&self, reference: &ImportReference, origins: &OriginSet) -> Resolution {
        let support = Language::from_path(&reference.source_file)
            .and_then(|language| self.registry.support(language));
        match support {
            Some(support) => support.resolver.resolve(reference, origins),
            None => Resolution::NotFound { tried: Vec::new() },
        }
    }
}
