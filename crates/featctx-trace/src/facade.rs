//! One uniform entry point per language.
//!
//! A [`LanguageSupport`] pairs a language's pattern library with its module
//! resolver. The [`ExtractorRegistry`] holds one per language and hands out
//! [`LanguageExtractor`] handles, selected by path, extension or language.
//! Traces cross languages freely: every file reached is handled by the
//! support registered for its own language.

use crate::resolver::{self, ModuleResolver};
use crate::session::TraceSession;
use featctx_core::definition::{ExtractedDefinition, Extraction, TracedDefinition};
use featctx_core::error::TraceError;
use featctx_core::language::Language;
use featctx_core::module::{Resolution, ResolvedModule};
use featctx_core::options::TraceOptions;
use featctx_core::origin::OriginSet;
use featctx_core::paths;
use featctx_core::reference::{ImportReference, ImportedSymbol};
use featctx_core::tree::DependencyTree;
use featctx_parser::{LanguagePatterns, SourceFile, patterns_for};
use std::path::Path;

/// Pattern library and resolver registered for one language.
pub struct LanguageSupport {
    pub language: Language,
    pub patterns: &'static dyn LanguagePatterns,
    pub resolver: Box<dyn ModuleResolver>,
}

impl LanguageSupport {
    pub fn builtin(language: Language) -> Self {
        Self {
            language,
            patterns: patterns_for(language),
            resolver: resolver::resolver_for(language),
        }
    }
}

/// Languages known to a trace.
pub struct ExtractorRegistry {
    supports: Vec<LanguageSupport>,
}

impl ExtractorRegistry {
    /// An empty registry; see [`ExtractorRegistry::builtin`].
    pub fn new() -> Self {
        Self {
            supports: Vec::new(),
        }
    }

    /// Python, JavaScript, Vue, C# and C++.
    pub fn builtin() -> Self {
        let mut registry = Self::new();
        for language in Language::ALL {
            registry.register(LanguageSupport::builtin(language));
        }
        registry
    }

    /// Add or replace the support for `support.language`.
    pub fn register(&mut self, support: LanguageSupport) {
        self.supports.retain(|s| s.language != support.language);
        self.supports.push(support);
    }

    pub fn languages(&self) -> impl Iterator<Item = Language> + '_ {
        self.supports.iter().map(|s| s.language)
    }

    pub(crate) fn support(&self, language: Language) -> Option<&LanguageSupport> {
        self.supports.iter().find(|s| s.language == language)
    }

    pub fn for_language(&self, language: Language) -> Option<LanguageExtractor<'_>> {
        self.support(language).map(|support| LanguageExtractor {
            registry: self,
            support,
        })
    }

    /// Accepts `".py"` as well as `"py"`.
    pub fn for_extension(&self, ext: &str) -> Option<LanguageExtractor<'_>> {
        Language::from_extension(ext).and_then(|language| self.for_language(language))
    }

    pub fn for_path(&self, path: &Path) -> Option<LanguageExtractor<'_>> {
        Language::from_path(path).and_then(|language| self.for_language(language))
    }
}

impl Default for ExtractorRegistry {
    fn default() -> Self {
        Self::builtin()
    }
}

/// Handle on one registered language.
#[derive(Clone, Copy)]
pub struct LanguageExtractor<'r> {
    registry: &'r ExtractorRegistry,
    support: &'r LanguageSupport,
}

impl<'r> LanguageExtractor<'r> {
    pub fn language(&self) -> Language {
        self.support.language
    }

    pub fn extensions(&self) -> &'static [&'static str] {
        self.support.language.extensions()
    }

    pub fn patterns(&self) -> &'static dyn LanguagePatterns {
        self.support.patterns
    }

    pub fn resolver(&self) -> &'r dyn ModuleResolver {
        self.support.resolver.as_ref()
    }

    /// Read `path` and list its imports in appearance order.
    pub fn detect_imports(&self, path: &Path) -> Result<Vec<ImportReference>, TraceError> {
        let file = SourceFile::read(&paths::canonical(path))?;
        if file.language() != self.language() {
            return Err(TraceError::UnsupportedFile {
                path: path.to_path_buf(),
            });
        }
        Ok(self.support.patterns.detect_imports(&file))
    }

    /// Treat `path` itself as a resolved module, attributed to the first
    /// origin that contains it. Headers pick up their implementation file.
    pub fn open_module(
        &self,
        path: &Path,
        origins: &OriginSet,
    ) -> Result<ResolvedModule, TraceError> {
        let path = paths::canonical(path);
        if Language::from_path(&path) != Some(self.language()) {
            return Err(TraceError::UnsupportedFile { path });
        }
        if !path.is_file() {
            return Err(TraceError::Io {
                path,
                source: std::io::Error::new(std::io::ErrorKind::NotFound, "no such file"),
            });
        }
        let origin = origins
            .iter()
            .find(|origin| paths::is_within(&path, origin))
            .unwrap_or_else(|| origins.primary())
            .to_path_buf();
        let companion = match self.language() {
            Language::Cpp => resolver::companion(&path),
            _ => None,
        };
        Ok(ResolvedModule::new(origin, path, self.language()).with_companion(companion))
    }

    pub fn resolve(&self, reference: &ImportReference, origins: &OriginSet) -> Resolution {
        self.support.resolver.resolve(reference, origins)
    }

    pub fn extract(
        &self,
        module: &ResolvedModule,
        symbol: &ImportedSymbol,
        whole_module_content: bool,
    ) -> Extraction {
        TraceSession::new(self.registry).extract(module, symbol, whole_module_content)
    }

    pub fn trace_to_origin(
        &self,
        definition: ExtractedDefinition,
        origins: &OriginSet,
    ) -> TracedDefinition {
        TraceSession::new(self.registry).trace_to_origin(definition, origins)
    }

    /// Build the dependency tree rooted at `entry`, a file of this language.
    pub fn build_tree(
        &self,
        entry: &Path,
        options: &TraceOptions,
    ) -> Result<DependencyTree, TraceError> {
        if Language::from_path(entry) != Some(self.language()) {
            return Err(TraceError::UnsupportedFile {
                path: entry.to_path_buf(),
            });
        }
        TraceSession::new(self.registry).build_tree(entry, options)
    }
}
