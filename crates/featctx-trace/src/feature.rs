//! Tracing every source file of a feature directory.

use crate::facade::ExtractorRegistry;
use crate::session::TraceSession;
use featctx_core::config::FeatureConfig;
use featctx_core::error::TraceError;
use featctx_core::options::TraceOptions;
use featctx_core::paths;
use featctx_core::tree::{DependencyTree, ModuleIdentity};
use globset::{Glob, GlobSet, GlobSetBuilder};
use rayon::prelude::*;
use serde::Serialize;
use std::collections::{BTreeMap, BTreeSet};
use std::path::{Path, PathBuf};
use tracing::{info, warn};

/// Trees for every entry file of a feature, sorted by entry path.
#[derive(Debug, Clone, Serialize)]
pub struct FeatureReport {
    pub root: PathBuf,
    pub trees: Vec<DependencyTree>,
    /// Entry files that could not be traced at all.
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub failures: Vec<FeatureFailure>,
    /// Resolved module → files whose import statements reach it.
    pub imported_in: BTreeMap<PathBuf, BTreeSet<PathBuf>>,
}

#[derive(Debug, Clone, Serialize)]
pub struct FeatureFailure {
    pub file: PathBuf,
    pub error: String,
}

impl FeatureReport {
    pub fn tree(&self, entry: &Path) -> Option<&DependencyTree> {
        self.trees.iter().find(|t| t.entry == entry)
    }
}

fn folder_filter(patterns: &[String]) -> Result<GlobSet, TraceError> {
    let mut builder = GlobSetBuilder::new();
    for pattern in patterns {
        let glob = Glob::new(pattern).map_err(|e| {
            TraceError::Config(format!("invalid exclude_folders pattern '{pattern}': {e}"))
        })?;
        builder.add(glob);
    }
    builder
        .build()
        .map_err(|e| TraceError::Config(format!("invalid exclude_folders: {e}")))
}

/// Canonical paths of the files under `root` that a trace can start from:
/// registered language, enabled by `options`, outside excluded folders.
pub fn feature_files(
    root: &Path,
    options: &TraceOptions,
    feature: &FeatureConfig,
    registry: &ExtractorRegistry,
) -> Result<Vec<PathBuf>, TraceError> {
    let excluded = folder_filter(&feature.exclude_folders)?;
    let walker = ignore::WalkBuilder::new(root)
        .hidden(false)
        .git_ignore(true)
        .filter_entry(move |entry| {
            !(entry.file_type().is_some_and(|t| t.is_dir()) && excluded.is_match(entry.file_name()))
        })
        .build();

    let mut files = Vec::new();
    for entry in walker.flatten() {
        let path = entry.path();
        if !path.is_file() {
            continue;
        }
        let Some(extractor) = registry.for_path(path) else {
            continue;
        };
        if options.allows(extractor.language()) {
            files.push(paths::canonical(path));
        }
    }
    files.sort();
    files.dedup();
    Ok(files)
}

/// Build one dependency tree per entry file of `feature_root`.
///
/// Trees are built in parallel; each owns its session, so nothing is shared
/// between them but the registry. With `exclude_feature_files` set, the
/// feature's own files are left out of every tree.
pub fn trace_feature(
    feature_root: &Path,
    options: &TraceOptions,
    feature: &FeatureConfig,
    registry: &ExtractorRegistry,
) -> Result<FeatureReport, TraceError> {
    let root = paths::canonical(feature_root);
    if !root.is_dir() {
        return Err(TraceError::Io {
            path: root,
            source: std::io::Error::new(std::io::ErrorKind::NotFound, "not a directory"),
        });
    }
    let entries = feature_files(&root, options, feature, registry)?;
    info!("tracing {} files under {}", entries.len(), root.display());

    let options = if feature.exclude_feature_files {
        options.clone().exclude(&entries)
    } else {
        options.clone()
    };

    let results: Vec<(PathBuf, Result<DependencyTree, TraceError>)> = entries
        .par_iter()
        .map(|entry| {
            let tree = TraceSession::new(registry).build_tree(entry, &options);
            (entry.clone(), tree)
        })
        .collect();

    let mut report = FeatureReport {
        root,
        trees: Vec::new(),
        failures: Vec::new(),
        imported_in: BTreeMap::new(),
    };
    for (file, result) in results {
        match result {
            Ok(tree) => {
                record_importers(&tree, &mut report.imported_in);
                report.trees.push(tree);
            }
            Err(e) => {
                warn!("{e}");
                report.failures.push(FeatureFailure {
                    file,
                    error: e.to_string(),
                });
            }
        }
    }
    Ok(report)
}

fn record_importers(tree: &DependencyTree, imported_in: &mut BTreeMap<PathBuf, BTreeSet<PathBuf>>) {
    for node in tree.nodes().iter().skip(1) {
        let ModuleIdentity::Path(path) = &node.module else {
            continue;
        };
        imported_in
            .entry(path.clone())
            .or_default()
            .extend(node.via.iter().map(|r| r.source_file.clone()));
    }
}
