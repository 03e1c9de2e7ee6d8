//! The per-language recognition capability and the definition model it
//! produces.

use crate::source::SourceFile;
use crate::{cpp, csharp, javascript, python, vue};
use featctx_core::language::Language;
use featctx_core::reference::{ImportReference, ImportedSymbol};

/// A top-level definition found in a source file.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Definition {
    pub name: String,
    pub kind: DefinitionKind,
    pub line_start: usize,
    pub line_end: usize,
    /// Source text of the full span, decorators and template headers included.
    pub text: String,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DefinitionKind {
    Function,
    Class,
    Variable,
    /// Top-level property of a Vue component's options object.
    Property,
    TypeAlias,
    /// Another name for a definition in the same file
    /// (`export default Foo`, `export { a as b }`).
    LocalAlias { target: String },
    /// A binding that re-exposes a symbol from another module. `module` is
    /// `None` when the statement does not say which module (C++ `using`).
    Forward {
        module: Option<String>,
        symbol: String,
    },
}

impl DefinitionKind {
    pub fn is_forward(&self) -> bool {
        matches!(self, DefinitionKind::Forward { .. })
    }
}

/// Recognition rules for one language.
pub trait LanguagePatterns: Send + Sync {
    fn language(&self) -> Language;

    /// Every import reference in the file, in appearance order.
    fn detect_imports(&self, source: &SourceFile) -> Vec<ImportReference>;

    /// Top-level definitions in appearance order.
    fn detect_definitions(&self, source: &SourceFile) -> Vec<Definition>;

    /// Candidate targets of a `Forward` definition, in the order they should
    /// be tried. Empty for anything else.
    fn detect_reexport(
        &self,
        definition: &Definition,
        imports: &[ImportReference],
    ) -> Vec<ImportReference> {
        let DefinitionKind::Forward { module, symbol } = &definition.kind else {
            return Vec::new();
        };
        match module {
            Some(module) => imports
                .iter()
                .filter(|r| {
                    &r.module == module && r.symbol.bound_name() == Some(definition.name.as_str())
                })
                .take(1)
                .cloned()
                .collect(),
            None => imports
                .iter()
                .filter(|r| matches!(r.symbol, ImportedSymbol::Module))
                .map(|r| r.with_symbol(ImportedSymbol::named(symbol.clone())))
                .collect(),
        }
    }

    /// Imports that pull every public name of another module through this one.
    fn wildcard_sources(&self, imports: &[ImportReference]) -> Vec<ImportReference> {
        imports
            .iter()
            .filter(|r| r.symbol.is_wildcard())
            .cloned()
            .collect()
    }
}

static PYTHON: python::PythonPatterns = python::PythonPatterns;
static JAVASCRIPT: javascript::JavaScriptPatterns = javascript::JavaScriptPatterns;
static VUE: vue::VuePatterns = vue::VuePatterns;
static CSHARP: csharp::CSharpPatterns = csharp::CSharpPatterns;
static CPP: cpp::CppPatterns = cpp::CppPatterns;

/// Pattern library registered for a language.
pub fn patterns_for(language: Language) -> &'static dyn LanguagePatterns {
    match language {
        Language::Python => &PYTHON,
        Language::JavaScript => &JAVASCRIPT,
        Language::Vue => &VUE,
        Language::CSharp => &CSHARP,
        Language::Cpp => &CPP,
    }
}

/// Definitions introduced by import statements that bind a local name.
pub(crate) fn forward_definitions(imports: &[ImportReference]) -> Vec<Definition> {
    imports
        .iter()
        .filter_map(|r| {
            let name = r.symbol.bound_name()?;
            let symbol = r.symbol.lookup_name().unwrap_or("*").to_string();
            Some(Definition {
                name: name.to_string(),
                kind: DefinitionKind::Forward {
                    module: Some(r.module.clone()),
                    symbol,
                },
                line_start: r.line,
                line_end: r.line + r.statement.lines().count().max(1) - 1,
                text: r.statement.clone(),
            })
        })
        .collect()
}

/// Stable sort by first line so the first textual occurrence of a name
/// comes first.
pub(crate) fn in_source_order(mut definitions: Vec<Definition>) -> Vec<Definition> {
    definitions.sort_by_key(|d| d.line_start);
    definitions
}

#[cfg(test)]
mod tests {
    use super::*;

    fn reference(module: &str, symbol: ImportedSymbol) -> ImportReference {
        ImportReference::new(module, symbol, "/p/b.py", 3, "stmt")
    }

    #[test]
    fn test_registry_covers_every_language() {
        for language in Language::ALL {
            assert_eq!(patterns_for(language).language(), language);
        }
    }

    #[test]
    fn test_forward_candidates_match_binding() {
        let imports = vec![
            reference("x", ImportedSymbol::named("other")),
            reference("c", ImportedSymbol::aliased("helper", "h")),
        ];
        let definition = Definition {
            name: "h".into(),
            kind: DefinitionKind::Forward {
                module: Some("c".into()),
                symbol: "helper".into(),
            },
            line_start: 3,
            line_end: 3,
            text: "stmt".into(),
        };
        let candidates = patterns_for(Language::Python).detect_reexport(&definition, &imports);
        assert_eq!(candidates.len(), 1);
        assert_eq!(candidates[0].module, "c");
    }

    #[test]
    fn test_unknown_module_tries_every_include() {
        let imports = vec![
            reference("a.h", ImportedSymbol::Module),
            reference("b.h", ImportedSymbol::Module),
        ];
        let definition = Definition {
            name: "Widget".into(),
            kind: DefinitionKind::Forward {
                module: None,
                symbol: "Widget".into(),
            },
            line_start: 5,
            line_end: 5,
            text: "using ui::Widget;".into(),
        };
        let candidates = patterns_for(Language::Cpp).detect_reexport(&definition, &imports);
        let modules: Vec<&str> = candidates.iter().map(|c| c.module.as_str()).collect();
        assert_eq!(modules, vec!["a.h", "b.h"]);
        assert_eq!(candidates[0].symbol, ImportedSymbol::named("Widget"));
    }

    #[test]
    fn test_forward_definitions_skip_unbound_imports() {
        let imports = vec![
            reference("os", ImportedSymbol::Module),
            reference("m", ImportedSymbol::Wildcard),
            reference("c", ImportedSymbol::named("helper")),
        ];
        let defs = forward_definitions(&imports);
        assert_eq!(defs.len(), 1);
        assert_eq!(defs[0].name, "helper");
    }
}
