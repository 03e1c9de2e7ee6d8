//! C++ `#include` directives and definitions.

use crate::patterns::{self, Definition, DefinitionKind, LanguagePatterns};
use crate::source::{Region, SourceFile};
use featctx_core::language::Language;
use featctx_core::reference::{ImportReference, ImportedSymbol};

pub struct CppPatterns;

impl LanguagePatterns for CppPatterns {
    fn language(&self) -> Language {
        Language::Cpp
    }

    fn detect_imports(&self, source: &SourceFile) -> Vec<ImportReference> {
        let mut imports = Vec::new();
        for region in source.regions() {
            if let Some(root) = region.root() {
                collect_includes(&root, &region, &mut imports);
            }
        }
        imports
    }

    fn detect_definitions(&self, source: &SourceFile) -> Vec<Definition> {
        let mut definitions = Vec::new();
        for region in source.regions() {
            if let Some(root) = region.root() {
                collect_definitions(&root, None, &region, &mut definitions);
            }
        }
        patterns::in_source_order(definitions)
    }
}

/// Includes at any preprocessor nesting depth (header guards, `#ifdef`).
///
/// Quoted includes are recorded without quotes (`widget.h`); angle includes
/// keep their brackets (`<vector>`) so the resolver can tell them apart.
fn collect_includes(node: &tree_sitter::Node, region: &Region, imports: &mut Vec<ImportReference>) {
    let mut cursor = node.walk();
    for child in node.children(&mut cursor) {
        if child.kind() == "preproc_include" {
            if let Some(path_node) = child.child_by_field_name("path") {
                let raw = region.text(&path_node).trim();
                let module = if path_node.kind() == "system_lib_string" {
                    raw.to_string()
                } else {
                    raw.trim_matches('"').to_string()
                };
                if !module.is_empty() {
                    imports.push(ImportReference::new(
                        module,
                        ImportedSymbol::Module,
                        region.path,
                        region.start_line(&child),
                        region.text(&child).trim(),
                    ));
                }
            }
        } else {
            collect_includes(&child, region, imports);
        }
    }
}

/// Containers whose children are still file-scope declarations.
fn is_scope_container(kind: &str) -> bool {
    matches!(
        kind,
        "translation_unit"
            | "declaration_list"
            | "linkage_specification"
            | "preproc_if"
            | "preproc_ifdef"
            | "preproc_else"
            | "preproc_elif"
            | "preproc_elifdef"
    )
}

/// `span` overrides the reported span: a templated definition starts at its
/// `template <...>` header.
fn collect_definitions(
    node: &tree_sitter::Node,
    span: Option<&tree_sitter::Node>,
    region: &Region,
    out: &mut Vec<Definition>,
) {
    let mut cursor = node.walk();
    for child in node.children(&mut cursor) {
        let reported = span.copied().unwrap_or(child);
        let push = |out: &mut Vec<Definition>, name: String, kind: DefinitionKind| {
            out.push(Definition {
                name,
                kind,
                line_start: region.start_line(&reported),
                line_end: region.end_line(&reported),
                text: region.text(&reported).to_string(),
            });
        };
        match child.kind() {
            "function_definition" => {
                if let Some(decl) = child.child_by_field_name("declarator")
                    && let Some(name) = extract_declarator_name(&decl, region)
                {
                    push(out, name, DefinitionKind::Function);
                }
            }
            "class_specifier" | "struct_specifier" | "union_specifier" | "enum_specifier" => {
                if child.child_by_field_name("body").is_some()
                    && let Some(name) = child.child_by_field_name("name")
                {
                    push(out, last_name(region.text(&name)), DefinitionKind::Class);
                }
            }
            "declaration" => collect_declaration(&child, &reported, region, out),
            "type_definition" => {
                let mut decls = child.walk();
                for declarator in child.children_by_field_name("declarator", &mut decls) {
                    if let Some(name) = extract_declarator_name(&declarator, region) {
                        push(out, name, DefinitionKind::TypeAlias);
                    }
                }
                if let Some(ty) = child.child_by_field_name("type") {
                    collect_definitions_in(&ty, &reported, region, out);
                }
            }
            "alias_declaration" => {
                if let Some(name) = child.child_by_field_name("name") {
                    let name = region.text(&name).to_string();
                    let kind = child
                        .child_by_field_name("type")
                        .and_then(|ty| forwarded_type(&ty, region))
                        .map_or(DefinitionKind::TypeAlias, |symbol| {
                            DefinitionKind::Forward {
                                module: None,
                                symbol,
                            }
                        });
                    push(out, name, kind);
                }
            }
            "using_declaration" => {
                // `using ns::Name;` brings Name in from a namespace defined in
                // one of the included headers.
                let mut inner = child.walk();
                let target = child
                    .children(&mut inner)
                    .find(|n| n.kind() == "qualified_identifier" || n.kind() == "identifier");
                if let Some(target) = target
                    && target.kind() == "qualified_identifier"
                {
                    let symbol = last_name(region.text(&target));
                    push(
                        out,
                        symbol.clone(),
                        DefinitionKind::Forward {
                            module: None,
                            symbol,
                        },
                    );
                }
            }
            "namespace_definition" => {
                if let Some(body) = child.child_by_field_name("body") {
                    collect_definitions(&body, None, region, out);
                }
            }
            "template_declaration" => collect_definitions(&child, Some(&reported), region, out),
            kind if is_scope_container(kind) => collect_definitions(&child, None, region, out),
            _ => {}
        }
    }
}

/// Class specifiers written inside a declaration or typedef:
/// `class Foo { ... };`, `typedef struct Point { ... } Point;`.
fn collect_definitions_in(
    specifier: &tree_sitter::Node,
    span: &tree_sitter::Node,
    region: &Region,
    out: &mut Vec<Definition>,
) {
    if matches!(
        specifier.kind(),
        "class_specifier" | "struct_specifier" | "union_specifier" | "enum_specifier"
    ) && specifier.child_by_field_name("body").is_some()
        && let Some(name) = specifier.child_by_field_name("name")
    {
        out.push(Definition {
            name: last_name(region.text(&name)),
            kind: DefinitionKind::Class,
            line_start: region.start_line(span),
            line_end: region.end_line(span),
            text: region.text(span).to_string(),
        });
    }
}

/// Variables with initialisers and class specifiers in declarations.
/// Prototypes (`int f(int);`) are not definitions.
fn collect_declaration(
    node: &tree_sitter::Node,
    span: &tree_sitter::Node,
    region: &Region,
    out: &mut Vec<Definition>,
) {
    if let Some(ty) = node.child_by_field_name("type") {
        collect_definitions_in(&ty, span, region, out);
    }
    let mut cursor = node.walk();
    for declarator in node.children_by_field_name("declarator", &mut cursor) {
        if declarator.kind() != "init_declarator" {
            continue;
        }
        if let Some(inner) = declarator.child_by_field_name("declarator")
            && let Some(name) = extract_declarator_name(&inner, region)
        {
            out.push(Definition {
                name,
                kind: DefinitionKind::Variable,
                line_start: region.start_line(span),
                line_end: region.end_line(span),
                text: region.text(span).to_string(),
            });
        }
    }
}

/// `using Name = ns::Other;` forwards when the target is a plain
/// (possibly qualified) type name.
fn forwarded_type(type_descriptor: &tree_sitter::Node, region: &Region) -> Option<String> {
    let text = region.text(type_descriptor).trim();
    let plain = !text.is_empty()
        && text
            .chars()
            .all(|c| c.is_alphanumeric() || c == '_' || c == ':');
    (plain && text.contains("::")).then(|| last_name(text))
}

/// `ns::Widget` → `Widget`.
fn last_name(text: &str) -> String {
    text.rsplit("::").next().unwrap_or(text).trim().to_string()
}

/// Name declared by a C/C++ declarator, looking through function, pointer,
/// reference and array declarators.
pub fn extract_declarator_name(node: &tree_sitter::Node, region: &Region) -> Option<String> {
    match node.kind() {
        "function_declarator"
        | "pointer_declarator"
        | "array_declarator"
        | "init_declarator"
        | "parenthesized_declarator" => node
            .child_by_field_name("declarator")
            .and_then(|d| extract_declarator_name(&d, region)),
        "reference_declarator" => {
            let mut cursor = node.walk();
            node.named_children(&mut cursor)
                .find_map(|d| extract_declarator_name(&d, region))
        }
        "identifier" | "field_identifier" | "type_identifier" | "operator_name" => {
            Some(region.text(node).to_string())
        }
        // `Widget::draw` defines `draw`.
        "qualified_identifier" => {
            let mut cursor = node.walk();
            node.children(&mut cursor)
                .filter(|c| {
                    matches!(
                        c.kind(),
                        "identifier" | "destructor_name" | "operator_name" | "qualified_identifier"
                    )
                })
                .last()
                .and_then(|n| match n.kind() {
                    "qualified_identifier" => extract_declarator_name(&n, region),
                    _ => Some(region.text(&n).to_string()),
                })
        }
        "destructor_name" => Some(region.text(node).to_string()),
        _ => None,
    }
}
