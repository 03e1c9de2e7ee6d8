//! Outcome of resolving an import reference against an origin set.

use crate::language::Language;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// A source file located for an import reference.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ResolvedModule {
    /// Root the file was found under (an origin, or the importing directory
    /// for relative references).
    pub origin: PathBuf,
    /// Canonical path: the module's identity for visited-set checks.
    pub path: PathBuf,
    pub language: Language,
    /// The imported name turned out to be a module itself
    /// (`from pkg import submodule`).
    #[serde(default, skip_serializing_if = "std::ops::Not::not")]
    pub binds_module: bool,
    /// Paired implementation file for a C++ header (`widget.h` → `widget.cpp`).
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub companion: Option<PathBuf>,
}

impl ResolvedModule {
    pub fn new(origin: impl Into<PathBuf>, path: impl Into<PathBuf>, language: Language) -> Self {
        Self {
            origin: origin.into(),
            path: path.into(),
            language,
            binds_module: false,
            companion: None,
        }
    }

    pub fn binding_module(mut self) -> Self {
        self.binds_module = true;
        self
    }

    pub fn with_companion(mut self, companion: Option<PathBuf>) -> Self {
        self.companion = companion;
        self
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

/// Result of a resolution attempt. `NotFound` is an expected outcome.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "outcome", rename_all = "snake_case")]
pub enum Resolution {
    Resolved(ResolvedModule),
    NotFound {
        /// Candidate paths probed, in probe order.
        tried: Vec<PathBuf>,
    },
}

impl Resolution {
    pub fn resolved(&self) -> Option<&ResolvedModule> {
        match self {
            Resolution::Resolved(module) => Some(module),
            Resolution::NotFound { .. } => None,
        }
    }

    pub fn into_resolved(self) -> Option<ResolvedModule> {
        match self {
            Resolution::Resolved(module) => Some(module),
            Resolution::NotFound { .. } => None,
        }
    }

    pub fn is_found(&self) -> bool {
        matches!(self, Resolution::Resolved(_))
    }
}
