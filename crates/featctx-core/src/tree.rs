//! Arena-backed dependency tree produced by a single trace.
//!
//! Nodes live in one `Vec` and refer to each other by [`NodeId`]. A module
//! that has already been expanded anywhere in the trace appears again only as
//! a [`NodeKind::BackReference`] leaf, so the tree never contains a node as its
//! own descendant.

use crate::definition::{MissReason, TracedDefinition};
use crate::language::Language;
use crate::module::ResolvedModule;
use crate::reference::ImportReference;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::{Path, PathBuf};

/// Index of a node in its tree's arena.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct NodeId(pub usize);

impl NodeId {
    pub const ROOT: NodeId = NodeId(0);
}

impl fmt::Display for NodeId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

/// What a node stands for: a file on disk, or raw import text that never
/// resolved to one.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ModuleIdentity {
    Path(PathBuf),
    Raw(String),
}

impl ModuleIdentity {
    pub fn path(&self) -> Option<&Path> {
        match self {
            ModuleIdentity::Path(path) => Some(path),
            ModuleIdentity::Raw(_) => None,
        }
    }
}

impl fmt::Display for ModuleIdentity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ModuleIdentity::Path(path) => write!(f, "{}", path.display()),
            ModuleIdentity::Raw(raw) => f.write_str(raw),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum BackReferenceReason {
    /// The module is an ancestor on the current path.
    Cycle,
    /// The module was expanded elsewhere in the tree.
    AlreadyExpanded,
}

/// Content attached to an expanded module.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum NodeContent {
    WholeModule { text: String },
    Definitions { symbols: Vec<SymbolContent> },
}

/// One imported symbol's result within an expanded module.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "result", rename_all = "snake_case")]
pub enum SymbolContent {
    Traced(TracedDefinition),
    NotFound { symbol: String, reason: MissReason },
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum NodeKind {
    Root {
        language: Language,
        content: NodeContent,
    },
    Expanded {
        resolved: ResolvedModule,
        content: NodeContent,
    },
    BackReference {
        reason: BackReferenceReason,
        /// Node where the module was expanded.
        target: NodeId,
    },
    Unresolved {
        raw: String,
        tried: Vec<PathBuf>,
    },
    Unreadable {
        error: String,
    },
}

impl NodeKind {
    pub fn content(&self) -> Option<&NodeContent> {
        match self {
            NodeKind::Root { content, .. } | NodeKind::Expanded { content, .. } => Some(content),
            _ => None,
        }
    }

    pub fn is_expanded(&self) -> bool {
        matches!(self, NodeKind::Root { .. } | NodeKind::Expanded { .. })
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DependencyNode {
    pub id: NodeId,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub parent: Option<NodeId>,
    pub module: ModuleIdentity,
    /// References in the parent file that led here, in appearance order.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub via: Vec<ImportReference>,
    #[serde(flatten)]
    pub kind: NodeKind,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub children: Vec<NodeId>,
}

/// Node counts by kind.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct TreeStats {
    pub expanded: usize,
    pub cycles: usize,
    pub already_expanded: usize,
    pub unresolved: usize,
    pub unreadable: usize,
    pub max_depth: usize,
}

/// Dependency tree of one entry file. Node 0 is always the root.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "RawDependencyTree")]
pub struct DependencyTree {
    pub entry: PathBuf,
    nodes: Vec<DependencyNode>,
}

/// Arena inconsistency found in a deserialized tree.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ArenaError {
    #[error("dependency tree has no root node")]
    Empty,
    #[error("node at position {index} carries id {id}")]
    IdMismatch { index: usize, id: NodeId },
    #[error("node {node} has dangling parent {parent}")]
    DanglingParent { node: NodeId, parent: NodeId },
    #[error("node {node} has dangling child {child}")]
    DanglingChild { node: NodeId, child: NodeId },
    #[error("root node must not have a parent")]
    RootHasParent,
}

#[derive(Deserialize)]
struct RawDependencyTree {
    entry: PathBuf,
    nodes: Vec<DependencyNode>,
}

impl TryFrom<RawDependencyTree> for DependencyTree {
    type Error = ArenaError;

    fn try_from(raw: RawDependencyTree) -> Result<Self, Self::Error> {
        let tree = Self {
            entry: raw.entry,
            nodes: raw.nodes,
        };
        tree.check()?;
        Ok(tree)
    }
}

impl DependencyTree {
    pub fn new_root(entry: impl Into<PathBuf>, language: Language, content: NodeContent) -> Self {
        let entry = entry.into();
        let root = DependencyNode {
            id: NodeId::ROOT,
            parent: None,
            module: ModuleIdentity::Path(entry.clone()),
            via: Vec::new(),
            kind: NodeKind::Root { language, content },
            children: Vec::new(),
        };
        Self {
            entry,
            nodes: vec![root],
        }
    }

    /// Append a node under `parent`. Children keep insertion order.
    pub fn add_child(
        &mut self,
        parent: NodeId,
        module: ModuleIdentity,
        via: Vec<ImportReference>,
        kind: NodeKind,
    ) -> NodeId {
        let id = NodeId(self.nodes.len());
        self.nodes.push(DependencyNode {
            id,
            parent: Some(parent),
            module,
            via,
            kind,
            children: Vec::new(),
        });
        if let Some(parent_node) = self.nodes.get_mut(parent.0) {
            parent_node.children.push(id);
        }
        id
    }

    pub fn root(&self) -> &DependencyNode {
        &self.nodes[NodeId::ROOT.0]
    }

    /// Ids match positions, links stay in bounds and the root has no parent.
    pub fn check(&self) -> Result<(), ArenaError> {
        let len = self.nodes.len();
        let Some(root) = self.nodes.first() else {
            return Err(ArenaError::Empty);
        };
        for (index, node) in self.nodes.iter().enumerate() {
            if node.id != NodeId(index) {
                return Err(ArenaError::IdMismatch { index, id: node.id });
            }
            if let Some(parent) = node.parent
                && parent.0 >= len
            {
                return Err(ArenaError::DanglingParent {
                    node: node.id,
                    parent,
                });
            }
            if let Some(child) = node.children.iter().find(|c| c.0 >= len) {
                return Err(ArenaError::DanglingChild {
                    node: node.id,
                    child: *child,
                });
            }
        }
        if root.parent.is_some() {
            return Err(ArenaError::RootHasParent);
        }
        Ok(())
    }

    pub fn node(&self, id: NodeId) -> Option<&DependencyNode> {
        self.nodes.get(id.0)
    }

    pub fn children(&self, id: NodeId) -> impl Iterator<Item = &DependencyNode> {
        self.node(id)
            .map(|n| n.children.as_slice())
            .unwrap_or_default()
            .iter()
            .filter_map(|child| self.node(*child))
    }

    pub fn nodes(&self) -> &[DependencyNode] {
        &self.nodes
    }

    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    /// Ancestors of `id`, nearest first, excluding `id` itself.
    pub fn ancestors(&self, id: NodeId) -> Vec<NodeId> {
        let mut out = Vec::new();
        let mut current = self.node(id).and_then(|n| n.parent);
        while let Some(parent) = current {
            out.push(parent);
            current = self.node(parent).and_then(|n| n.parent);
        }
        out
    }

    /// Whether `id` or one of its ancestors stands for `path`.
    pub fn on_path(&self, id: NodeId, path: &Path) -> bool {
        let mut current = Some(id);
        while let Some(node) = current.and_then(|c| self.node(c)) {
            if node.module.path() == Some(path) {
                return true;
            }
            current = node.parent;
        }
        false
    }

    /// Depth-first pre-order with depths, root first.
    pub fn walk_preorder(&self) -> Vec<(NodeId, usize)> {
        let mut order = Vec::with_capacity(self.nodes.len());
        let mut stack = vec![(NodeId::ROOT, 0usize)];
        while let Some((id, depth)) = stack.pop() {
            let Some(node) = self.node(id) else {
                continue;
            };
            order.push((id, depth));
            for child in node.children.iter().rev() {
                stack.push((*child, depth + 1));
            }
        }
        order
    }

    /// Expanded module paths (root included), in pre-order.
    pub fn expanded_modules(&self) -> Vec<&Path> {
        self.walk_preorder()
            .into_iter()
            .filter_map(|(id, _)| self.node(id))
            .filter(|n| n.kind.is_expanded())
            .filter_map(|n| n.module.path())
            .collect()
    }

    /// Unresolved leaves in pre-order.
    pub fn unresolved(&self) -> Vec<&DependencyNode> {
        self.walk_preorder()
            .into_iter()
            .filter_map(|(id, _)| self.node(id))
            .filter(|n| matches!(n.kind, NodeKind::Unresolved { .. }))
            .collect()
    }

    pub fn stats(&self) -> TreeStats {
        let mut stats = TreeStats::default();
        for (id, depth) in self.walk_preorder() {
            let Some(node) = self.node(id) else {
                continue;
            };
            stats.max_depth = stats.max_depth.max(depth);
            match node.kind {
                NodeKind::Root { .. } | NodeKind::Expanded { .. } => stats.expanded += 1,
                NodeKind::BackReference {
                    reason: BackReferenceReason::Cycle,
                    ..
                } => stats.cycles += 1,
                NodeKind::BackReference {
                    reason: BackReferenceReason::AlreadyExpanded,
                    ..
                } => stats.already_expanded += 1,
                NodeKind::Unresolved { .. } => stats.unresolved += 1,
                NodeKind::Unreadable { .. } => stats.unreadable += 1,
            }
        }
        stats
    }

    /// Indented outline, one line per node.
    pub fn format_outline(&self) -> String {
        let mut output = String::new();
        for (id, depth) in self.walk_preorder() {
            let Some(node) = self.node(id) else {
                continue;
            };
            if depth == 0 {
                output.push_str(&format!("{}\n", node.module));
                continue;
            }
            let prefix = "  ".repeat(depth - 1);
            let is_last = node
                .parent
                .and_then(|p| self.node(p))
                .and_then(|p| p.children.last())
                .is_some_and(|last| *last == id);
            let connector = if is_last { "└──" } else { "├──" };
            let label = match &node.kind {
                NodeKind::Root { .. } => String::new(),
                NodeKind::Expanded { content, .. } => describe_content(content),
                NodeKind::BackReference { reason, target } => match reason {
                    BackReferenceReason::Cycle => format!(" (cycle, see {target})"),
                    BackReferenceReason::AlreadyExpanded => format!(" (see {target})"),
                },
                NodeKind::Unresolved { .. } => " (unresolved)".to_string(),
                NodeKind::Unreadable { error } => format!(" (unreadable: {error})"),
            };
            output.push_str(&format!(
                "{}{} {} {}{}\n",
                prefix, connector, id, node.module, label
            ));
        }
        output
    }
}

fn describe_content(content: &NodeContent) -> String {
    match content {
        NodeContent::WholeModule { .. } => " [module]".to_string(),
        NodeContent::Definitions { symbols } => {
            let names: Vec<String> = symbols
                .iter()
                .map(|s| match s {
                    SymbolContent::Traced(traced) if traced.is_terminal() => {
                        traced.definition.symbol.clone()
                    }
                    SymbolContent::Traced(traced) => format!("{}?", traced.definition.symbol),
                    SymbolContent::NotFound { symbol, .. } => format!("!{symbol}"),
                })
                .collect();
            format!(" [{}]", names.join(", "))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn whole(text: &str) -> NodeContent {
        NodeContent::WholeModule {
            text: text.to_string(),
        }
    }

    fn expanded(path: &str) -> NodeKind {
        NodeKind::Expanded {
            resolved: ResolvedModule::new("/p", path, Language::Python),
            content: whole(""),
        }
    }

    #[test]
    fn test_children_keep_insertion_order() {
        let mut tree = DependencyTree::new_root("/p/a.py", Language::Python, whole(""));
        let b = tree.add_child(
            NodeId::ROOT,
            ModuleIdentity::Path("/p/b.py".into()),
            Vec::new(),
            expanded("/p/b.py"),
        );
        let c = tree.add_child(
            NodeId::ROOT,
            ModuleIdentity::Path("/p/c.py".into()),
            Vec::new(),
            expanded("/p/c.py"),
        );
        let ids: Vec<NodeId> = tree.children(NodeId::ROOT).map(|n| n.id).collect();
        assert_eq!(ids, vec![b, c]);
        assert_eq!(tree.ancestors(c), vec![NodeId::ROOT]);
    }

    #[test]
    fn test_preorder_and_on_path() {
        let mut tree = DependencyTree::new_root("/p/a.py", Language::Python, whole(""));
        let b = tree.add_child(
            NodeId::ROOT,
            ModuleIdentity::Path("/p/b.py".into()),
            Vec::new(),
            expanded("/p/b.py"),
        );
        let d = tree.add_child(
            b,
            ModuleIdentity::Path("/p/d.py".into()),
            Vec::new(),
            expanded("/p/d.py"),
        );
        let c = tree.add_child(
            NodeId::ROOT,
            ModuleIdentity::Raw("missing".into()),
            Vec::new(),
            NodeKind::Unresolved {
                raw: "missing".into(),
                tried: Vec::new(),
            },
        );

        let order: Vec<NodeId> = tree.walk_preorder().into_iter().map(|(id, _)| id).collect();
        assert_eq!(order, vec![NodeId::ROOT, b, d, c]);
        assert!(tree.on_path(d, Path::new("/p/a.py")));
        assert!(!tree.on_path(c, Path::new("/p/b.py")));

        let stats = tree.stats();
        assert_eq!(stats.expanded, 3);
        assert_eq!(stats.unresolved, 1);
        assert_eq!(stats.max_depth, 2);
    }
}
