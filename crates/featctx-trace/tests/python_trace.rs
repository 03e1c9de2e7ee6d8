use featctx_core::definition::{ContentScope, Extraction, MissReason, TraceStatus};
use featctx_core::language::Language;
use featctx_core::module::ResolvedModule;
use featctx_core::options::TraceOptions;
use featctx_core::origin::OriginSet;
use featctx_core::paths;
use featctx_core::reference::{ImportReference, ImportedSymbol};
use featctx_core::tree::{NodeContent, NodeId, NodeKind, SymbolContent};
use featctx_trace::ExtractorRegistry;
use std::path::{Path, PathBuf};

fn write(root: &Path, rel: &str, body: &str) -> PathBuf {
    let path = root.join(rel);
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent).unwrap();
    }
    std::fs::write(&path, body).unwrap();
    path
}

fn options(root: &Path) -> TraceOptions {
    TraceOptions::new(OriginSet::new([root]).unwrap())
}

fn symbols(content: Option<&NodeContent>) -> &[SymbolContent] {
    match content {
        Some(NodeContent::Definitions { symbols }) => symbols,
        other => panic!("expected definitions, got {other:?}"),
    }
}

#[test]
fn test_reexport_chain_reaches_definition() {
    let tmp = tempfile::tempdir().unwrap();
    let root = tmp.path();
    let a = write(root, "a.py", "from b import helper\n\nhelper()\n");
    let b = write(root, "b.py", "from c import helper as helper\n");
    let c = write(root, "c.py", "import os\n\n\ndef helper():\n    return 1\n");

    let registry = ExtractorRegistry::builtin();
    let tree = registry
        .for_path(&a)
        .unwrap()
        .build_tree(&a, &options(root))
        .unwrap();

    let b_node = tree.children(NodeId::ROOT).next().unwrap();
    assert_eq!(b_node.module.path(), Some(paths::canonical(&b).as_path()));
    let SymbolContent::Traced(traced) = &symbols(b_node.kind.content())[0] else {
        panic!("helper should be traced");
    };
    assert!(traced.is_terminal());
    assert_eq!(traced.origin_module(), paths::canonical(&c));
    assert!(traced.definition.text.starts_with("def helper():"));
    assert_eq!(
        traced.definition.scope,
        ContentScope::Span {
            line_start: 4,
            line_end: 5
        }
    );
    assert_eq!(traced.hops.len(), 1);
    assert_eq!(traced.hops[0].module, paths::canonical(&b));
    assert_eq!(traced.hops[0].statement, "from c import helper as helper");

    // b's own import of c is expanded under b; `os` is not under the origin.
    let b_children: Vec<_> = tree.children(b_node.id).collect();
    assert_eq!(b_children.len(), 1);
    assert_eq!(b_children[0].module.path(), Some(paths::canonical(&c).as_path()));
    let c_children: Vec<_> = tree.children(b_children[0].id).collect();
    assert!(matches!(&c_children[0].kind, NodeKind::Unresolved { raw, .. } if raw == "os"));
}

#[test]
fn test_missing_module_is_unresolved_leaf_and_traversal_continues() {
    let tmp = tempfile::tempdir().unwrap();
    let root = tmp.path();
    let a = write(
        root,
        "a.py",
        "import numpy\nimport numpy\nfrom b import run\n",
    );
    write(root, "b.py", "def run():\n    pass\n");

    let registry = ExtractorRegistry::builtin();
    let tree = registry
        .for_path(&a)
        .unwrap()
        .build_tree(&a, &options(root))
        .unwrap();

    let children: Vec<_> = tree.children(NodeId::ROOT).collect();
    assert_eq!(children.len(), 2);
    match &children[0].kind {
        NodeKind::Unresolved { raw, tried } => {
            assert_eq!(raw, "numpy");
            assert!(!tried.is_empty());
        }
        other => panic!("expected unresolved leaf, got {other:?}"),
    }
    assert_eq!(children[0].via.len(), 2);
    assert!(children[1].kind.is_expanded());
    assert_eq!(tree.stats().unresolved, 1);
}

#[test]
fn test_origin_name_prefix_is_dropped() {
    let tmp = tempfile::tempdir().unwrap();
    let tools = tmp.path().join("tools");
    let toolbox = write(&tools, "toolbox.py", "def join(a, b):\n    return a + b\n");
    let entry = write(tmp.path(), "feature/main.py", "from tools.toolbox import join\n");

    let registry = ExtractorRegistry::builtin();
    let extractor = registry.for_path(&entry).unwrap();
    let imports = extractor.detect_imports(&entry).unwrap();
    let origins = OriginSet::new([tools.clone()]).unwrap();
    let resolved = extractor
        .resolve(&imports[0], &origins)
        .into_resolved()
        .unwrap();
    assert_eq!(resolved.path, paths::canonical(&toolbox));
    assert_eq!(resolved.origin, tools);
    assert!(!resolved.binds_module);
}

#[test]
fn test_package_init_and_submodule() {
    let tmp = tempfile::tempdir().unwrap();
    let root = tmp.path();
    let init = write(root, "pkg/__init__.py", "VERSION = 1\n");
    let sub = write(root, "pkg/sub.py", "def f():\n    pass\n");
    let registry = ExtractorRegistry::builtin();
    let python = registry.for_extension("py").unwrap();
    let origins = OriginSet::new([root]).unwrap();

    let import_pkg = ImportReference::new(
        "pkg",
        ImportedSymbol::named("VERSION"),
        root.join("main.py"),
        1,
        "from pkg import VERSION",
    );
    let resolved = python.resolve(&import_pkg, &origins).into_resolved().unwrap();
    assert_eq!(resolved.path, paths::canonical(&init));
    assert!(!resolved.binds_module);

    let import_sub = import_pkg.with_symbol(ImportedSymbol::named("sub"));
    let resolved = python.resolve(&import_sub, &origins).into_resolved().unwrap();
    assert_eq!(resolved.path, paths::canonical(&sub));
    assert!(resolved.binds_module);

    // A submodule import yields the whole submodule.
    let extraction = python.extract(&resolved, &import_sub.symbol, false);
    let definition = extraction.found().unwrap();
    assert_eq!(definition.scope, ContentScope::WholeModule);
    assert_eq!(definition.text, "def f():\n    pass\n");
}

#[test]
fn test_relative_imports_anchor_at_package() {
    let tmp = tempfile::tempdir().unwrap();
    let root = tmp.path();
    let helpers = write(root, "app/helpers.py", "def h():\n    pass\n");
    let shared = write(root, "shared.py", "X = 1\n");
    write(root, "app/views.py", "from .helpers import h\nfrom ..shared import X\n");

    let registry = ExtractorRegistry::builtin();
    let python = registry.for_extension("py").unwrap();
    let views = root.join("app/views.py");
    let imports = python.detect_imports(&views).unwrap();
    // Relative references ignore the origins entirely.
    let origins = OriginSet::new([root.join("elsewhere")]).unwrap();

    let first = python.resolve(&imports[0], &origins).into_resolved().unwrap();
    assert_eq!(first.path, paths::canonical(&helpers));
    let second = python.resolve(&imports[1], &origins).into_resolved().unwrap();
    assert_eq!(second.path, paths::canonical(&shared));
}

#[test]
fn test_wildcard_reexport_followed() {
    let tmp = tempfile::tempdir().unwrap();
    let root = tmp.path();
    let init = write(root, "pkg/__init__.py", "from .impl import *\n");
    let implementation = write(root, "pkg/impl.py", "def run():\n    return 0\n");
    let registry = ExtractorRegistry::builtin();
    let python = registry.for_extension("py").unwrap();
    let origins = OriginSet::new([root]).unwrap();

    let module = ResolvedModule::new(root, paths::canonical(&init), Language::Python);
    let definition = python
        .extract(&module, &ImportedSymbol::named("run"), false)
        .into_found()
        .unwrap();
    assert!(definition.is_reexport());
    assert_eq!(definition.text, "from .impl import *");

    let traced = python.trace_to_origin(definition, &origins);
    assert!(traced.is_terminal());
    assert_eq!(traced.origin_module(), paths::canonical(&implementation));
    assert_eq!(traced.hops.len(), 1);
}

#[test]
fn test_broken_reexport_keeps_chain() {
    let tmp = tempfile::tempdir().unwrap();
    let root = tmp.path();
    let b = write(root, "b.py", "from missing import helper\n");
    let registry = ExtractorRegistry::builtin();
    let python = registry.for_extension("py").unwrap();
    let origins = OriginSet::new([root]).unwrap();

    let module = ResolvedModule::new(root, paths::canonical(&b), Language::Python);
    let definition = python
        .extract(&module, &ImportedSymbol::named("helper"), false)
        .into_found()
        .unwrap();
    let traced = python.trace_to_origin(definition, &origins);
    assert_eq!(traced.hops.len(), 1);
    assert_eq!(traced.origin_module(), paths::canonical(&b));
    match &traced.status {
        TraceStatus::Unresolved { target, reason } => {
            assert_eq!(target, "missing");
            assert!(matches!(reason, MissReason::ModuleNotFound { .. }));
        }
        other => panic!("expected unresolved, got {other:?}"),
    }
}

#[test]
fn test_reexport_cycle_detected() {
    let tmp = tempfile::tempdir().unwrap();
    let root = tmp.path();
    let b = write(root, "b.py", "from c import helper\n");
    write(root, "c.py", "from b import helper\n");
    let registry = ExtractorRegistry::builtin();
    let python = registry.for_extension("py").unwrap();
    let origins = OriginSet::new([root]).unwrap();

    let module = ResolvedModule::new(root, paths::canonical(&b), Language::Python);
    let definition = python
        .extract(&module, &ImportedSymbol::named("helper"), false)
        .into_found()
        .unwrap();
    let traced = python.trace_to_origin(definition, &origins);
    assert_eq!(traced.hops.len(), 2);
    match &traced.status {
        TraceStatus::Cycle { module, symbol } => {
            assert_eq!(module, &paths::canonical(&b));
            assert_eq!(symbol, "helper");
        }
        other => panic!("expected cycle, got {other:?}"),
    }
}

#[test]
fn test_trace_of_terminal_definition_is_unchanged() {
    let tmp = tempfile::tempdir().unwrap();
    let root = tmp.path();
    let c = write(root, "c.py", "class Engine:\n    pass\n");
    let registry = ExtractorRegistry::builtin();
    let python = registry.for_extension("py").unwrap();
    let origins = OriginSet::new([root]).unwrap();

    let module = ResolvedModule::new(root, paths::canonical(&c), Language::Python);
    let definition = python
        .extract(&module, &ImportedSymbol::named("Engine"), false)
        .into_found()
        .unwrap();
    let traced = python.trace_to_origin(definition.clone(), &origins);
    assert!(traced.is_terminal());
    assert!(traced.hops.is_empty());
    assert_eq!(traced.definition, definition);

    let again = python.trace_to_origin(traced.definition.clone(), &origins);
    assert_eq!(again, traced);
}

#[test]
fn test_absent_symbol_and_degraded_source() {
    let tmp = tempfile::tempdir().unwrap();
    let root = tmp.path();
    let clean = write(root, "clean.py", "def present():\n    pass\n");
    let broken = write(root, "broken.py", "def (:\n    x = = 1\n");
    let registry = ExtractorRegistry::builtin();
    let python = registry.for_extension("py").unwrap();
    let language = Language::Python;

    let module = ResolvedModule::new(root, paths::canonical(&clean), language);
    match python.extract(&module, &ImportedSymbol::named("absent"), false) {
        Extraction::DefinitionNotFound { symbol, reason, .. } => {
            assert_eq!(symbol, "absent");
            assert_eq!(reason, MissReason::SymbolAbsent);
        }
        other => panic!("expected a miss, got {other:?}"),
    }

    let module = ResolvedModule::new(root, paths::canonical(&broken), language);
    let definition = python
        .extract(&module, &ImportedSymbol::named("absent"), false)
        .into_found()
        .unwrap();
    assert_eq!(definition.scope, ContentScope::Degraded);
    assert_eq!(definition.text, "def (:\n    x = = 1\n");
}

#[test]
fn test_whole_module_content_option() {
    let tmp = tempfile::tempdir().unwrap();
    let root = tmp.path();
    let a = write(root, "a.py", "from b import f\n");
    write(root, "b.py", "def f():\n    pass\n\ndef g():\n    pass\n");

    let registry = ExtractorRegistry::builtin();
    let tree = registry
        .for_path(&a)
        .unwrap()
        .build_tree(&a, &options(root).with_whole_module_content(true))
        .unwrap();
    let b_node = tree.children(NodeId::ROOT).next().unwrap();
    match b_node.kind.content() {
        Some(NodeContent::WholeModule { text }) => assert!(text.contains("def g():")),
        other => panic!("expected whole module, got {other:?}"),
    }
}

#[test]
fn test_bare_relative_import_uses_package_init() {
    let tmp = tempfile::tempdir().unwrap();
    let root = tmp.path();
    let init = write(root, "pkg/__init__.py", "def helper():\n    return 1\n");
    write(root, "pkg.py", "def helper():\n    return 2\n");
    let user = write(root, "pkg/user.py", "from . import helper\n\nhelper()\n");

    let registry = ExtractorRegistry::builtin();
    let python = registry.for_language(Language::Python).unwrap();
    let imports = python.detect_imports(&user).unwrap();
    assert_eq!(imports.len(), 1);
    let origins = OriginSet::new([root]).unwrap();
    let resolved = python.resolve(&imports[0], &origins).into_resolved().unwrap();
    assert_eq!(resolved.path, paths::canonical(&init));
    assert!(!resolved.binds_module);

    let definition = python
        .extract(&resolved, &imports[0].symbol, false)
        .into_found()
        .unwrap();
    assert!(definition.text.starts_with("def helper():\n    return 1"));
}

#[test]
fn test_bare_relative_import_prefers_submodule() {
    let tmp = tempfile::tempdir().unwrap();
    let root = tmp.path();
    write(root, "pkg/__init__.py", "");
    let helper = write(root, "pkg/helper.py", "X = 1\n");
    write(root, "pkg.py", "helper = None\n");
    let user = write(root, "pkg/user.py", "from . import helper\n");

    let registry = ExtractorRegistry::builtin();
    let python = registry.for_language(Language::Python).unwrap();
    let imports = python.detect_imports(&user).unwrap();
    let origins = OriginSet::new([root]).unwrap();
    let resolved = python.resolve(&imports[0], &origins).into_resolved().unwrap();
    assert_eq!(resolved.path, paths::canonical(&helper));
    assert!(resolved.binds_module);
}
