//! Definition extraction: the text of one imported symbol.

use crate::session::TraceSession;
use featctx_core::definition::{
    ContentScope, ExtractedDefinition, Extraction, MissReason, ReExport,
};
use featctx_core::module::ResolvedModule;
use featctx_core::reference::{ImportReference, ImportedSymbol};
use featctx_parser::{Definition, DefinitionKind, LanguagePatterns, SourceFile};
use std::collections::HashSet;
use std::sync::Arc;
use tracing::debug;

/// Name recorded for an imported symbol: the looked-up name, or `*` /
/// `<module>` style text for module-binding imports.
pub(crate) fn symbol_key(symbol: &ImportedSymbol) -> String {
    symbol
        .lookup_name()
        .map_or_else(|| symbol.to_string(), str::to_string)
}

/// First definition named `name`, following local aliases within the file.
/// An alias whose target is missing stands for itself.
fn find_definition<'d>(definitions: &'d [Definition], name: &str) -> Option<&'d Definition> {
    let mut seen = HashSet::new();
    let mut current = definitions.iter().find(|d| d.name == name)?;
    while let DefinitionKind::LocalAlias { target } = &current.kind {
        if !seen.insert(current.name.as_str()) {
            break;
        }
        match definitions.iter().find(|d| &d.name == target) {
            Some(next) => current = next,
            None => break,
        }
    }
    Some(current)
}

fn span_of(definition: &Definition) -> ContentScope {
    ContentScope::Span {
        line_start: definition.line_start,
        line_end: definition.line_end,
    }
}

impl TraceSession<'_> {
    /// Extract `symbol` from `module`.
    ///
    /// The whole file is returned when `whole_module_content` is set or when
    /// the import binds the module itself. A definition that only re-exposes
    /// an imported name carries its candidate targets in `reexport`.
    pub fn extract(
        &mut self,
        module: &ResolvedModule,
        symbol: &ImportedSymbol,
        whole_module_content: bool,
    ) -> Extraction {
        let name = symbol_key(symbol);
        let not_found = |reason: MissReason| Extraction::DefinitionNotFound {
            symbol: name.clone(),
            module: module.path.clone(),
            reason,
        };

        let source = match self.load(&module.path) {
            Ok(source) => source,
            Err(error) => return not_found(MissReason::Unreadable { error }),
        };
        if whole_module_content || module.binds_module || symbol.binds_module() {
            return Extraction::Found(ExtractedDefinition::whole_module(
                name.as_str(),
                &module.path,
                module.language,
                source.text(),
            ));
        }
        let Some(patterns) = self.patterns(module.language) else {
            return not_found(MissReason::Unreadable {
                error: format!("no language extractor registered for {}", module.language),
            });
        };

        // Header first, then its implementation file.
        let mut files: Vec<Arc<SourceFile>> = vec![Arc::clone(&source)];
        if let Some(companion) = &module.companion
            && let Ok(file) = self.load(companion)
        {
            files.push(file);
        }

        for file in &files {
            let definitions = patterns.detect_definitions(file);
            if let Some(definition) = find_definition(&definitions, &name) {
                return Extraction::Found(extracted(patterns, file, definition, &name));
            }
        }

        // `export * from` never carries a default export.
        let carries_name = !(name == "default" && module.language.is_es_module());
        if carries_name {
            let targets: Vec<ImportReference> = files
                .iter()
                .flat_map(|file| patterns.wildcard_sources(&patterns.detect_imports(file)))
                .map(|wildcard| wildcard.with_symbol(ImportedSymbol::named(name.as_str())))
                .collect();
            if let Some(definition) = wildcard_reexport(module, &name, targets) {
                return Extraction::Found(definition);
            }
        }

        if source.has_errors() {
            debug!(
                "'{name}' not found in unparsable {}, using the whole file",
                module.path.display()
            );
            return Extraction::Found(ExtractedDefinition {
                scope: ContentScope::Degraded,
                ..ExtractedDefinition::whole_module(
                    name.as_str(),
                    &module.path,
                    module.language,
                    source.text(),
                )
            });
        }
        not_found(MissReason::SymbolAbsent)
    }
}

fn extracted(
    patterns: &dyn LanguagePatterns,
    file: &SourceFile,
    definition: &Definition,
    name: &str,
) -> ExtractedDefinition {
    let reexport = if definition.kind.is_forward() {
        let imports = patterns.detect_imports(file);
        ReExport::new(patterns.detect_reexport(definition, &imports))
    } else {
        None
    };
    ExtractedDefinition {
        symbol: name.to_string(),
        module: file.path().to_path_buf(),
        language: file.language(),
        text: definition.text.clone(),
        scope: span_of(definition),
        reexport,
    }
}

/// A name the module does not define but may pull in through wildcard
/// imports: a re-export whose candidates are those imports.
fn wildcard_reexport(
    module: &ResolvedModule,
    name: &str,
    targets: Vec<ImportReference>,
) -> Option<ExtractedDefinition> {
    let first = targets.first()?.line;
    let last = targets.iter().map(|t| t.line).max().unwrap_or(first);
    let text = targets
        .iter()
        .map(|t| t.statement.as_str())
        .collect::<Vec<_>>()
        .join("\n");
    Some(ExtractedDefinition {
        symbol: name.to_string(),
        module: module.path.clone(),
        language: module.language,
        text,
        scope: ContentScope::Span {
            line_start: first,
            line_end: last,
        },
        reexport: ReExport::new(targets),
    })
}
