//! Integration tests for featctx-cli functionality.
//! Tests the underlying library functions that the CLI commands invoke.

use featctx_core::config::FeatctxConfig;
use featctx_core::definition::TraceStatus;
use featctx_core::language::Language;
use featctx_core::reference::ImportedSymbol;
use featctx_core::schema;
use featctx_core::tree::NodeId;
use featctx_trace::{ExtractorRegistry, trace_feature};
use std::path::Path;

fn write(root: &Path, rel: &str, body: &str) {
    let path = root.join(rel);
    std::fs::create_dir_all(path.parent().unwrap()).unwrap();
    std::fs::write(path, body).unwrap();
}

fn project(root: &Path) {
    write(
        root,
        ".featctx/config.toml",
        "[trace]\norigins = [\"tools\", \"lib\"]\nfile_types = [\".py\"]\n",
    );
    write(root, "lib/toolbox/__init__.py", "from .shapes import Circle\n");
    write(root, "lib/toolbox/shapes.py", "class Circle:\n    pass\n");
    write(root, "app/main.py", "from toolbox import Circle\nimport json\n");
}

#[test]
fn test_config_defaults_without_file() {
    let tmpdir = tempfile::tempdir().unwrap();
    let config = FeatctxConfig::load(tmpdir.path()).unwrap();
    assert!(config.trace.origins.is_empty());
    assert!(config.trace_options(tmpdir.path()).is_err());
}

#[test]
fn test_trace_with_config_file() {
    let tmpdir = tempfile::tempdir().unwrap();
    let root = tmpdir.path();
    project(root);

    let config = FeatctxConfig::load(root).unwrap();
    let options = config.trace_options(root).unwrap();
    assert_eq!(options.origins.primary(), root.join("tools"));

    let entry = root.join("app/main.py");
    let registry = ExtractorRegistry::builtin();
    let tree = registry
        .for_path(&entry)
        .unwrap()
        .build_tree(&entry, &options)
        .unwrap();
    assert_eq!(tree.children(NodeId::ROOT).count(), 2);
    assert_eq!(tree.unresolved().len(), 1);

    let outline = tree.format_outline();
    assert!(outline.contains("__init__.py [Circle]"));
    assert!(outline.contains("json (unresolved)"));

    let json = schema::to_json(&tree).unwrap();
    assert_eq!(schema::from_json(&json).unwrap(), tree);
}

#[test]
fn test_definition_follows_package_reexport() {
    let tmpdir = tempfile::tempdir().unwrap();
    let root = tmpdir.path();
    project(root);

    let options = FeatctxConfig::load(root)
        .unwrap()
        .trace_options(root)
        .unwrap();
    let registry = ExtractorRegistry::builtin();
    let python = registry.for_language(Language::Python).unwrap();
    let module = python
        .open_module(&root.join("lib/toolbox/__init__.py"), &options.origins)
        .unwrap();
    let definition = python
        .extract(&module, &ImportedSymbol::named("Circle"), false)
        .into_found()
        .unwrap();
    let traced = python.trace_to_origin(definition, &options.origins);
    assert_eq!(traced.status, TraceStatus::Terminal);
    assert_eq!(traced.definition.text, "class Circle:\n    pass");
    assert_eq!(traced.hops.len(), 1);
}

#[test]
fn test_feature_report_serializes() {
    let tmpdir = tempfile::tempdir().unwrap();
    let root = tmpdir.path();
    project(root);

    let config = FeatctxConfig::load(root).unwrap();
    let options = config.trace_options(root).unwrap();
    let registry = ExtractorRegistry::builtin();
    let report = trace_feature(&root.join("app"), &options, &config.feature, &registry).unwrap();
    assert_eq!(report.trees.len(), 1);

    let json = serde_json::to_value(&report).unwrap();
    assert_eq!(json["trees"].as_array().unwrap().len(), 1);
    assert!(json.get("failures").is_none());
}
