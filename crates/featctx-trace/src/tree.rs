//! Dependency tree construction.
//!
//! Depth-first over an explicit work stack. A pending import group is only
//! classified when it is popped, so the result matches a recursive pre-order
//! walk: the first time a module is reached along that order it is expanded,
//! every later arrival becomes a back-reference leaf.

use crate::session::TraceSession;
use featctx_core::definition::Extraction;
use featctx_core::error::TraceError;
use featctx_core::language::Language;
use featctx_core::module::{Resolution, ResolvedModule};
use featctx_core::options::TraceOptions;
use featctx_core::paths;
use featctx_core::reference::ImportReference;
use featctx_core::tree::{
    BackReferenceReason, DependencyTree, ModuleIdentity, NodeContent, NodeId, NodeKind,
    SymbolContent,
};
use featctx_parser::SourceFile;
use std::collections::{HashMap, HashSet};
use std::path::{Path, PathBuf};
use tracing::debug;

/// References of one file that led to the same place.
enum ImportGroup {
    Resolved {
        module: ResolvedModule,
        via: Vec<ImportReference>,
    },
    Unresolved {
        raw: String,
        tried: Vec<PathBuf>,
        via: Vec<ImportReference>,
    },
}

struct Pending {
    parent: NodeId,
    group: ImportGroup,
}

struct TreeBuilder<'s, 'r> {
    session: &'s mut TraceSession<'r>,
    options: &'s TraceOptions,
    tree: DependencyTree,
    /// Canonical path → node that expanded it (or reported it unreadable).
    visited: HashMap<PathBuf, NodeId>,
    stack: Vec<Pending>,
}

impl TraceSession<'_> {
    /// Build the dependency tree rooted at `entry`.
    ///
    /// Fails only when the entry itself cannot be traced: unknown language
    /// or unreadable file. Everything that goes wrong further down is
    /// recorded in the tree.
    pub fn build_tree(
        &mut self,
        entry: &Path,
        options: &TraceOptions,
    ) -> Result<DependencyTree, TraceError> {
        let entry_path = paths::canonical(entry);
        let language = Language::from_path(&entry_path)
            .filter(|language| self.registry().support(*language).is_some())
            .ok_or_else(|| TraceError::UnsupportedFile {
                path: entry.to_path_buf(),
            })?;
        let source = self.sources_mut().insert(SourceFile::read(&entry_path)?);

        let content = NodeContent::WholeModule {
            text: source.text().to_string(),
        };
        let mut builder = TreeBuilder {
            session: self,
            options,
            tree: DependencyTree::new_root(&entry_path, language, content),
            visited: HashMap::from([(entry_path, NodeId::ROOT)]),
            stack: Vec::new(),
        };
        builder.push_imports(NodeId::ROOT, &source, None);
        while let Some(pending) = builder.stack.pop() {
            builder.visit(pending);
        }

        let stats = builder.tree.stats();
        debug!(
            "traced {}: {} expanded, {} cycles, {} unresolved",
            builder.tree.entry.display(),
            stats.expanded,
            stats.cycles,
            stats.unresolved
        );
        Ok(builder.tree)
    }
}

impl TreeBuilder<'_, '_> {
    /// Queue the import groups of `file` (and of its companion
    /// implementation file) under `parent`, first import on top.
    fn push_imports(&mut self, parent: NodeId, file: &SourceFile, companion: Option<&Path>) {
        let mut imports = self.session.detect_imports(file);
        if let Some(companion) = companion
            && !self.visited.contains_key(companion)
        {
            match self.session.load(companion) {
                Ok(paired) => {
                    self.visited.insert(companion.to_path_buf(), parent);
                    imports.extend(self.session.detect_imports(&paired));
                }
                Err(error) => debug!("skipping companion {}: {error}", companion.display()),
            }
        }
        let groups = self.group(imports, file.path());
        self.stack.extend(
            groups
                .into_iter()
                .rev()
                .map(|group| Pending { parent, group }),
        );
    }

    /// Resolve every reference and merge those that land on the same module
    /// (or, unresolved, share the same raw text). Excluded files, disabled
    /// languages and references back to `current` itself drop out here.
    fn group(&self, imports: Vec<ImportReference>, current: &Path) -> Vec<ImportGroup> {
        let mut groups: Vec<ImportGroup> = Vec::new();
        for reference in imports {
            match self.session.resolve(&reference, &self.options.origins) {
                Resolution::Resolved(module) => {
                    // A companion including its own header.
                    if module.path == current {
                        continue;
                    }
                    if self.options.is_excluded(&module.path) {
                        debug!("excluded {}", module.path.display());
                        continue;
                    }
                    if !self.options.allows(module.language) {
                        debug!(
                            "skipping {} ({} not enabled)",
                            module.path.display(),
                            module.language
                        );
                        continue;
                    }
                    let existing = groups.iter_mut().find_map(|group| match group {
                        ImportGroup::Resolved { module: m, via } if m.path == module.path => {
                            Some((m, via))
                        }
                        _ => None,
                    });
                    match existing {
                        Some((existing, via)) => {
                            existing.binds_module |= module.binds_module;
                            via.push(reference);
                        }
                        None => groups.push(ImportGroup::Resolved {
                            module,
                            via: vec![reference],
                        }),
                    }
                }
                Resolution::NotFound { tried } => {
                    let existing = groups.iter_mut().find_map(|group| match group {
                        ImportGroup::Unresolved { raw, via, .. } if *raw == reference.module => {
                            Some(via)
                        }
                        _ => None,
                    });
                    match existing {
                        Some(via) => via.push(reference),
                        None => groups.push(ImportGroup::Unresolved {
                            raw: reference.module.clone(),
                            tried,
                            via: vec![reference],
                        }),
                    }
                }
            }
        }
        groups
    }

    fn visit(&mut self, pending: Pending) {
        let Pending { parent, group } = pending;
        match group {
            ImportGroup::Unresolved { raw, tried, via } => {
                debug!("unresolved '{raw}'");
                self.tree.add_child(
                    parent,
                    ModuleIdentity::Raw(raw.clone()),
                    via,
                    NodeKind::Unresolved { raw, tried },
                );
            }
            ImportGroup::Resolved { module, via } => {
                let identity = ModuleIdentity::Path(module.path.clone());
                if let Some(&target) = self.visited.get(&module.path) {
                    let reason = if target == parent || self.tree.ancestors(parent).contains(&target)
                    {
                        BackReferenceReason::Cycle
                    } else {
                        BackReferenceReason::AlreadyExpanded
                    };
                    self.tree.add_child(
                        parent,
                        identity,
                        via,
                        NodeKind::BackReference { reason, target },
                    );
                    return;
                }

                let source = match self.session.load(&module.path) {
                    Ok(source) => source,
                    Err(error) => {
                        let id =
                            self.tree
                                .add_child(parent, identity, via, NodeKind::Unreadable { error });
                        self.visited.insert(module.path, id);
                        return;
                    }
                };
                let content = self.content(&module, &source, &via);
                let companion = module.companion.clone();
                let path = module.path.clone();
                let id = self.tree.add_child(
                    parent,
                    identity,
                    via,
                    NodeKind::Expanded {
                        resolved: module,
                        content,
                    },
                );
                self.visited.insert(path, id);
                self.push_imports(id, &source, companion.as_deref());
            }
        }
    }

    /// The whole file, or each imported symbol traced to its definition.
    fn content(
        &mut self,
        module: &ResolvedModule,
        source: &SourceFile,
        via: &[ImportReference],
    ) -> NodeContent {
        let whole = self.options.whole_module_content
            || module.binds_module
            || via.iter().any(|r| r.symbol.binds_module());
        if whole {
            return NodeContent::WholeModule {
                text: source.text().to_string(),
            };
        }

        let mut seen = HashSet::new();
        let mut symbols = Vec::new();
        for reference in via {
            let Some(name) = reference.symbol.lookup_name() else {
                continue;
            };
            if !seen.insert(name) {
                continue;
            }
            let symbol = match self.session.extract(module, &reference.symbol, false) {
                Extraction::Found(definition) => SymbolContent::Traced(
                    self.session
                        .trace_to_origin(definition, &self.options.origins),
                ),
                Extraction::DefinitionNotFound { symbol, reason, .. } => {
                    SymbolContent::NotFound { symbol, reason }
                }
            };
            symbols.push(symbol);
        }
        NodeContent::Definitions { symbols }
    }
}
