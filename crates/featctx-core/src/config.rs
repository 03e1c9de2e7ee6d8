//! Configuration for tracing and feature-level runs.
//!
//! Load order: `.featctx/config.toml` → defaults. Command-line flags are
//! applied on top by the binary.

use crate::error::TraceError;
use crate::language::Language;
use crate::options::TraceOptions;
use crate::origin::OriginSet;
use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// Top-level featctx configuration.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct FeatctxConfig {
    pub trace: TraceConfig,
    pub feature: FeatureConfig,
}

/// Options for a single dependency trace.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct TraceConfig {
    /// Origin directories in priority order. Relative entries are taken
    /// relative to the project root.
    pub origins: Vec<PathBuf>,
    /// Emit whole files instead of the imported definitions.
    pub whole_module_content: bool,
    /// Enabled file extensions. Resolved modules of other languages are
    /// left out of the tree.
    pub file_types: Vec<String>,
    /// Files omitted from every tree, relative to the project root.
    pub exclude_files: Vec<PathBuf>,
}

/// Options for tracing every file of a feature directory.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct FeatureConfig {
    /// Leave files that live inside the feature directory out of the trees.
    pub exclude_feature_files: bool,
    /// Glob patterns for directories skipped while walking the feature.
    pub exclude_folders: Vec<String>,
}

impl Default for TraceConfig {
    fn default() -> Self {
        Self {
            origins: Vec::new(),
            whole_module_content: false,
            file_types: [".py", ".js", ".vue", ".cs", ".cpp", ".h"]
                .iter()
                .map(|s| (*s).to_string())
                .collect(),
            exclude_files: Vec::new(),
        }
    }
}

impl Default for FeatureConfig {
    fn default() -> Self {
        Self {
            exclude_feature_files: true,
            exclude_folders: vec![
                "__pycache__".to_string(),
                "node_modules".to_string(),
                ".git".to_string(),
            ],
        }
    }
}

impl FeatctxConfig {
    /// Load config from `.featctx/config.toml` in the project root.
    /// Falls back to defaults if no config file exists.
    pub fn load(project_root: &Path) -> Result<Self> {
        let config_path = project_root.join(".featctx").join("config.toml");

        let config: Self = if config_path.exists() {
            let content = std::fs::read_to_string(&config_path)
                .with_context(|| format!("failed to read {}", config_path.display()))?;
            toml::from_str(&content)
                .with_context(|| format!("failed to parse {}", config_path.display()))?
        } else {
            Self::default()
        };

        // Reject unknown extensions up front rather than at trace time.
        for ext in &config.trace.file_types {
            if Language::from_extension(ext).is_none() {
                return Err(TraceError::UnknownFileType { ext: ext.clone() })
                    .context("invalid [trace] file_types");
            }
        }

        Ok(config)
    }

    /// Build trace options, resolving relative paths against `project_root`.
    pub fn trace_options(&self, project_root: &Path) -> Result<TraceOptions> {
        let origins = OriginSet::new(
            self.trace
                .origins
                .iter()
                .map(|origin| project_root.join(origin)),
        )
        .context("no origin directories configured")?;

        let options = TraceOptions::new(origins)
            .with_whole_module_content(self.trace.whole_module_content)
            .with_file_type_extensions(self.trace.file_types.as_slice())?
            .exclude(
                self.trace
                    .exclude_files
                    .iter()
                    .map(|file| project_root.join(file)),
            );
        Ok(options)
    }
}
