//! Extraction results and re-export trace results.

use crate::language::Language;
use crate::reference::ImportReference;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::PathBuf;

/// How much of the module an extracted text covers.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "scope", rename_all = "snake_case")]
pub enum ContentScope {
    WholeModule,
    Span { line_start: usize, line_end: usize },
    /// The file could not be parsed; the whole text stands in for the symbol.
    Degraded,
}

/// Candidate targets of a definition that merely re-exposes a symbol
/// imported from elsewhere. Never empty.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "Vec<ImportReference>", into = "Vec<ImportReference>")]
pub struct ReExport(Vec<ImportReference>);

impl ReExport {
    /// `None` when there is nothing to follow.
    pub fn new(targets: Vec<ImportReference>) -> Option<Self> {
        if targets.is_empty() {
            None
        } else {
            Some(Self(targets))
        }
    }

    /// Targets in the order they should be tried.
    pub fn targets(&self) -> &[ImportReference] {
        &self.0
    }
}

impl TryFrom<Vec<ImportReference>> for ReExport {
    type Error = &'static str;

    fn try_from(targets: Vec<ImportReference>) -> Result<Self, Self::Error> {
        Self::new(targets).ok_or("re-export must carry at least one target")
    }
}

impl From<ReExport> for Vec<ImportReference> {
    fn from(reexport: ReExport) -> Self {
        reexport.0
    }
}

/// Text pulled out of a resolved module for one imported symbol.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ExtractedDefinition {
    /// Name that was looked up (`default` for ES default imports, `*` or
    /// `<module>` for module-binding imports).
    pub symbol: String,
    /// Canonical path of the module the text came from.
    pub module: PathBuf,
    pub language: Language,
    pub text: String,
    #[serde(flatten)]
    pub scope: ContentScope,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub reexport: Option<ReExport>,
}

impl ExtractedDefinition {
    pub fn whole_module(
        symbol: impl Into<String>,
        module: impl Into<PathBuf>,
        language: Language,
        text: impl Into<String>,
    ) -> Self {
        Self {
            symbol: symbol.into(),
            module: module.into(),
            language,
            text: text.into(),
            scope: ContentScope::WholeModule,
            reexport: None,
        }
    }

    pub fn is_reexport(&self) -> bool {
        self.reexport.is_some()
    }

    /// Re-export targets, empty for a terminal definition.
    pub fn reexport_targets(&self) -> &[ImportReference] {
        self.reexport.as_ref().map_or(&[], ReExport::targets)
    }
}

/// Why a symbol could not be produced.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum MissReason {
    /// The module was read, but nothing in it defines the symbol.
    SymbolAbsent,
    /// The module could not be read.
    Unreadable { error: String },
    /// The module holding the symbol could not be located.
    ModuleNotFound { raw: String, tried: Vec<PathBuf> },
}

impl fmt::Display for MissReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            MissReason::SymbolAbsent => f.write_str("symbol not defined in module"),
            MissReason::Unreadable { error } => write!(f, "module unreadable: {error}"),
            MissReason::ModuleNotFound { raw, tried } => {
                write!(f, "module '{raw}' not found ({} candidates tried)", tried.len())
            }
        }
    }
}

/// Outcome of a definition extraction.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "outcome", rename_all = "snake_case")]
pub enum Extraction {
    Found(ExtractedDefinition),
    DefinitionNotFound {
        symbol: String,
        module: PathBuf,
        reason: MissReason,
    },
}

impl Extraction {
    pub fn found(&self) -> Option<&ExtractedDefinition> {
        match self {
            Extraction::Found(def) => Some(def),
            Extraction::DefinitionNotFound { .. } => None,
        }
    }

    pub fn into_found(self) -> Option<ExtractedDefinition> {
        match self {
            Extraction::Found(def) => Some(def),
            Extraction::DefinitionNotFound { .. } => None,
        }
    }
}

/// One intermediate re-export passed through on the way to a definition.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReExportHop {
    pub module: PathBuf,
    pub symbol: String,
    pub statement: String,
    pub line: usize,
}

/// How a re-export chain ended.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum TraceStatus {
    Terminal,
    /// No candidate of the last re-export produced a definition. `target` is
    /// the last candidate tried, as written in its statement.
    Unresolved { target: String, reason: MissReason },
    /// `(module, symbol)` came round a second time.
    Cycle { module: PathBuf, symbol: String },
}

/// A definition followed through its re-export chain.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TracedDefinition {
    /// The terminal definition, or the last one reached before the chain broke.
    pub definition: ExtractedDefinition,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub hops: Vec<ReExportHop>,
    #[serde(flatten)]
    pub status: TraceStatus,
}

impl TracedDefinition {
    /// A definition that was already terminal: no hops.
    pub fn terminal(definition: ExtractedDefinition) -> Self {
        Self {
            definition,
            hops: Vec::new(),
            status: TraceStatus::Terminal,
        }
    }

    pub fn is_terminal(&self) -> bool {
        matches!(self.status, TraceStatus::Terminal)
    }

    /// Module the reported definition lives in.
    pub fn origin_module(&self) -> &std::path::Path {
        &self.definition.module
    }
}
