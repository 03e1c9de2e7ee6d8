use featctx_core::language::Language;
use featctx_core::module::ResolvedModule;
use featctx_core::options::TraceOptions;
use featctx_core::origin::OriginSet;
use featctx_core::paths;
use featctx_core::reference::{ImportReference, ImportedSymbol};
use featctx_core::tree::{NodeContent, NodeId, NodeKind};
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

const WIDGET_H: &str = "#ifndef WIDGET_H
#define WIDGET_H
#include \"util/math.h\"
class Widget {
public:
    void draw();
};
#endif
";

const WIDGET_CPP: &str = "#include \"widget.h\"
#include \"render.h\"

void Widget::draw() {}
";

fn project(root: &Path) -> PathBuf {
    write(root, "include/widget.h", WIDGET_H);
    write(root, "include/widget.cpp", WIDGET_CPP);
    write(root, "include/util/math.h", "int add(int a, int b) { return a + b; }\n");
    write(root, "src/render.h", "struct Renderer { int x; };\n");
    write(
        root,
        "app/main.cpp",
        "#include <vector>\n#include \"widget.h\"\n\nint main() { return 0; }\n",
    )
}

#[test]
fn test_header_with_companion_expands_both() {
    let tmp = tempfile::tempdir().unwrap();
    let root = tmp.path();
    let main = project(root);

    let registry = ExtractorRegistry::builtin();
    let options = TraceOptions::new(OriginSet::new([root]).unwrap());
    let tree = registry
        .for_path(&main)
        .unwrap()
        .build_tree(&main, &options)
        .unwrap();

    let children: Vec<_> = tree.children(NodeId::ROOT).collect();
    assert_eq!(children.len(), 2);
    assert!(matches!(&children[0].kind, NodeKind::Unresolved { raw, .. } if raw == "<vector>"));

    let header = children[1];
    match &header.kind {
        NodeKind::Expanded { resolved, content } => {
            assert_eq!(resolved.path, paths::canonical(&root.join("include/widget.h")));
            assert_eq!(
                resolved.companion.as_deref(),
                Some(paths::canonical(&root.join("include/widget.cpp")).as_path())
            );
            // Includes bind the whole file.
            assert!(matches!(content, NodeContent::WholeModule { text } if text == WIDGET_H));
        }
        other => panic!("expected expanded header, got {other:?}"),
    }

    // Header includes first, then the companion's; the companion's include of
    // its own header is not a dependency.
    let includes: Vec<_> = tree.children(header.id).collect();
    assert_eq!(includes.len(), 2);
    assert_eq!(
        includes[0].module.path(),
        Some(paths::canonical(&root.join("include/util/math.h")).as_path())
    );
    assert_eq!(
        includes[1].module.path(),
        Some(paths::canonical(&root.join("src/render.h")).as_path())
    );
    assert_eq!(
        includes[1].via[0].source_file,
        paths::canonical(&root.join("include/widget.cpp"))
    );
    assert_eq!(tree.stats().cycles, 0);
}

#[test]
fn test_angle_includes_only_try_origins() {
    let tmp = tempfile::tempdir().unwrap();
    let root = tmp.path();
    let vendor = write(root, "vendor/fmt/core.h", "int fmt_core();\n");
    write(root, "app/fmt/core.h", "int local_core();\n");

    let registry = ExtractorRegistry::builtin();
    let cpp = registry.for_language(Language::Cpp).unwrap();
    let origins = OriginSet::new([root.join("vendor")]).unwrap();
    let angle = ImportReference::new(
        "<fmt/core.h>",
        ImportedSymbol::Module,
        root.join("app/main.cpp"),
        1,
        "#include <fmt/core.h>",
    );
    let resolved = cpp.resolve(&angle, &origins).into_resolved().unwrap();
    assert_eq!(resolved.path, paths::canonical(&vendor));

    let quoted = ImportReference::new(
        "fmt/core.h",
        ImportedSymbol::Module,
        root.join("app/main.cpp"),
        1,
        "#include \"fmt/core.h\"",
    );
    let resolved = cpp.resolve(&quoted, &origins).into_resolved().unwrap();
    assert_eq!(resolved.path, paths::canonical(&root.join("app/fmt/core.h")));
}

#[test]
fn test_header_suffix_variants() {
    let tmp = tempfile::tempdir().unwrap();
    let root = tmp.path();
    let config = write(root, "lib/config.hpp", "struct Config { int v; };\n");
    let registry = ExtractorRegistry::builtin();
    let cpp = registry.for_language(Language::Cpp).unwrap();
    let origins = OriginSet::new([root.join("lib")]).unwrap();
    let reference = ImportReference::new(
        "config",
        ImportedSymbol::Module,
        root.join("app/main.cpp"),
        1,
        "#include \"config\"",
    );
    let resolved = cpp.resolve(&reference, &origins).into_resolved().unwrap();
    assert_eq!(resolved.path, paths::canonical(&config));
}

#[test]
fn test_definition_found_in_companion() {
    let tmp = tempfile::tempdir().unwrap();
    let root = tmp.path();
    project(root);
    let registry = ExtractorRegistry::builtin();
    let cpp = registry.for_language(Language::Cpp).unwrap();
    let origins = OriginSet::new([root]).unwrap();

    let reference = ImportReference::new(
        "widget.h",
        ImportedSymbol::Module,
        root.join("include/other.cpp"),
        1,
        "#include \"widget.h\"",
    );
    let module: ResolvedModule = cpp.resolve(&reference, &origins).into_resolved().unwrap();

    let class = cpp
        .extract(&module, &ImportedSymbol::named("Widget"), false)
        .into_found()
        .unwrap();
    assert_eq!(class.module, module.path);

    let method = cpp
        .extract(&module, &ImportedSymbol::named("draw"), false)
        .into_found()
        .unwrap();
    assert_eq!(method.module, paths::canonical(&root.join("include/widget.cpp")));
    assert_eq!(method.text, "void Widget::draw() {}");
}

#[test]
fn test_using_declaration_traced_through_includes() {
    let tmp = tempfile::tempdir().unwrap();
    let root = tmp.path();
    write(root, "geo/io.h", "void dump();\n");
    let shapes = write(
        root,
        "geo/shapes.h",
        "namespace geo {\nstruct Point { int x; int y; };\n}\n",
    );
    let api = write(
        root,
        "geo/api.h",
        "#include \"io.h\"\n#include \"shapes.h\"\nusing geo::Point;\n",
    );
    let registry = ExtractorRegistry::builtin();
    let cpp = registry.for_language(Language::Cpp).unwrap();
    let origins = OriginSet::new([root]).unwrap();

    let module = ResolvedModule::new(root, paths::canonical(&api), Language::Cpp);
    let forward = cpp
        .extract(&module, &ImportedSymbol::named("Point"), false)
        .into_found()
        .unwrap();
    assert_eq!(forward.reexport_targets().len(), 2);

    let traced = cpp.trace_to_origin(forward, &origins);
    assert!(traced.is_terminal());
    assert_eq!(traced.origin_module(), paths::canonical(&shapes));
    assert_eq!(traced.hops.len(), 1);
    assert_eq!(traced.hops[0].statement, "using geo::Point;");
}
