//! Import references: one imported symbol found in one source file.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::{Path, PathBuf};

/// What an import statement brings into scope from its module.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum ImportedSymbol {
    /// The module itself: `import os`, `#include "x.h"`, `using A.B;`,
    /// side-effect `import './x'`, `require('./x')`.
    Module,
    /// The module bound to a local name: `import * as ns from`, `import a.b as ab`.
    Namespace { local: String },
    /// A named symbol, optionally renamed locally.
    Named {
        name: String,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        alias: Option<String>,
    },
    /// An ES-module default import bound to `local`.
    Default { local: String },
    /// Every public name of the module: `from m import *`, `export * from`.
    Wildcard,
}

impl ImportedSymbol {
    pub fn named(name: impl Into<String>) -> Self {
        ImportedSymbol::Named {
            name: name.into(),
            alias: None,
        }
    }

    pub fn aliased(name: impl Into<String>, alias: impl Into<String>) -> Self {
        let name = name.into();
        let alias = alias.into();
        if alias == name {
            return ImportedSymbol::Named { name, alias: None };
        }
        ImportedSymbol::Named {
            name,
            alias: Some(alias),
        }
    }

    /// Name to search for in the target module. `None` when the import binds
    /// the module as a whole.
    pub fn lookup_name(&self) -> Option<&str> {
        match self {
            ImportedSymbol::Named { name, .. } => Some(name.as_str()),
            ImportedSymbol::Default { .. } => Some("default"),
            ImportedSymbol::Module
            | ImportedSymbol::Namespace { .. }
            | ImportedSymbol::Wildcard => None,
        }
    }

    /// Local name this import introduces in the importing file, if any.
    pub fn bound_name(&self) -> Option<&str> {
        match self {
            ImportedSymbol::Named { name, alias } => {
                Some(alias.as_deref().unwrap_or(name.as_str()))
            }
            ImportedSymbol::Default { local } | ImportedSymbol::Namespace { local } => {
                Some(local.as_str())
            }
            ImportedSymbol::Module | ImportedSymbol::Wildcard => None,
        }
    }

    /// True when the whole module (rather than one definition) is referenced.
    pub fn binds_module(&self) -> bool {
        matches!(
            self,
            ImportedSymbol::Module | ImportedSymbol::Namespace { .. } | ImportedSymbol::Wildcard
        )
    }

    pub fn is_wildcard(&self) -> bool {
        matches!(self, ImportedSymbol::Wildcard)
    }
}

impl fmt::Display for ImportedSymbol {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ImportedSymbol::Module => f.write_str("<module>"),
            ImportedSymbol::Namespace { local } => write!(f, "* as {local}"),
            ImportedSymbol::Named { name, alias: None } => f.write_str(name),
            ImportedSymbol::Named {
                name,
                alias: Some(alias),
            } => write!(f, "{name} as {alias}"),
            ImportedSymbol::Default { local } => write!(f, "default as {local}"),
            ImportedSymbol::Wildcard => f.write_str("*"),
        }
    }
}

/// A single imported symbol, located in the file that imports it.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ImportReference {
    /// Raw module/path text as written: `tools.toolbox`, `./utils`, `widget.h`.
    pub module: String,
    pub symbol: ImportedSymbol,
    /// File the statement was found in.
    pub source_file: PathBuf,
    /// 1-based line of the statement.
    pub line: usize,
    /// The statement text, trimmed.
    pub statement: String,
}

impl ImportReference {
    pub fn new(
        module: impl Into<String>,
        symbol: ImportedSymbol,
        source_file: impl Into<PathBuf>,
        line: usize,
        statement: impl Into<String>,
    ) -> Self {
        Self {
            module: module.into(),
            symbol,
            source_file: source_file.into(),
            line,
            statement: statement.into(),
        }
    }

    /// Same statement and module, different imported symbol.
    pub fn with_symbol(&self, symbol: ImportedSymbol) -> Self {
        Self {
            symbol,
            ..self.clone()
        }
    }

    /// `./x`, `../x` (ES modules) or `.x`, `..x` (Python).
    pub fn is_relative(&self) -> bool {
        self.module.starts_with('.')
    }

    /// Directory of the importing file, used to anchor relative references.
    pub fn importing_dir(&self) -> &Path {
        self.source_file.parent().unwrap_or_else(|| Path::new(""))
    }
}

impl fmt::Display for ImportReference {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} ({}:{})",
            self.statement,
            self.source_file.display(),
            self.line
        )
    }
}
