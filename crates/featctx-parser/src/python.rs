//! Python imports and module-level definitions.

use crate::patterns::{self, Definition, DefinitionKind, LanguagePatterns};
use crate::source::{Region, SourceFile};
use featctx_core::language::Language;
use featctx_core::reference::{ImportReference, ImportedSymbol};

pub struct PythonPatterns;

impl LanguagePatterns for PythonPatterns {
    fn language(&self) -> Language {
        Language::Python
    }

    fn detect_imports(&self, source: &SourceFile) -> Vec<ImportReference> {
        let mut imports = Vec::new();
        for region in source.regions() {
            if let Some(root) = region.root() {
                collect_imports(&root, &region, &mut imports);
            }
        }
        imports
    }

    fn detect_definitions(&self, source: &SourceFile) -> Vec<Definition> {
        let mut definitions = Vec::new();
        for region in source.regions() {
            if let Some(root) = region.root() {
                collect_definitions(&root, &region, &mut definitions);
            }
        }
        patterns::in_source_order(definitions)
    }
}

/// Imports at any depth: inside functions, `try` blocks, conditionals.
fn collect_imports(node: &tree_sitter::Node, region: &Region, imports: &mut Vec<ImportReference>) {
    let mut cursor = node.walk();
    for child in node.children(&mut cursor) {
        match child.kind() {
            "import_statement" | "import_from_statement" => {
                imports.extend(parse_import(&child, region));
            }
            // `from __future__ import ...` is a compiler directive, not a dependency.
            "future_import_statement" => {}
            _ => collect_imports(&child, region, imports),
        }
    }
}

/// One reference per imported name.
fn parse_import(node: &tree_sitter::Node, region: &Region) -> Vec<ImportReference> {
    let statement = region.text(node).trim().to_string();
    let line = region.start_line(node);
    let make = |module: String, symbol: ImportedSymbol| {
        ImportReference::new(module, symbol, region.path, line, statement.clone())
    };

    let mut refs = Vec::new();
    let mut cursor = node.walk();
    if node.kind() == "import_statement" {
        for name in node.children_by_field_name("name", &mut cursor) {
            match name.kind() {
                "aliased_import" => {
                    let Some(module) = name.child_by_field_name("name") else {
                        continue;
                    };
                    let Some(alias) = name.child_by_field_name("alias") else {
                        continue;
                    };
                    refs.push(make(
                        compact(region.text(&module)),
                        ImportedSymbol::Namespace {
                            local: region.text(&alias).to_string(),
                        },
                    ));
                }
                _ => refs.push(make(compact(region.text(&name)), ImportedSymbol::Module)),
            }
        }
        return refs;
    }

    let Some(module_node) = node.child_by_field_name("module_name") else {
        return refs;
    };
    let module = compact(region.text(&module_node));

    let mut wildcard_cursor = node.walk();
    if node
        .children(&mut wildcard_cursor)
        .any(|c| c.kind() == "wildcard_import")
    {
        refs.push(make(module, ImportedSymbol::Wildcard));
        return refs;
    }

    for name in node.children_by_field_name("name", &mut cursor) {
        let symbol = match name.kind() {
            "aliased_import" => {
                let (Some(inner), Some(alias)) = (
                    name.child_by_field_name("name"),
                    name.child_by_field_name("alias"),
                ) else {
                    continue;
                };
                ImportedSymbol::aliased(compact(region.text(&inner)), region.text(&alias))
            }
            _ => ImportedSymbol::named(compact(region.text(&name))),
        };
        refs.push(make(module.clone(), symbol));
    }
    refs
}

/// Dotted names may be split across lines inside parentheses.
fn compact(text: &str) -> String {
    text.chars().filter(|c| !c.is_whitespace()).collect()
}

/// Blocks whose statements still execute at module level.
fn is_module_level_block(kind: &str) -> bool {
    matches!(
        kind,
        "if_statement"
            | "elif_clause"
            | "else_clause"
            | "try_statement"
            | "except_clause"
            | "finally_clause"
            | "with_statement"
            | "block"
    )
}

fn collect_definitions(node: &tree_sitter::Node, region: &Region, out: &mut Vec<Definition>) {
    let mut cursor = node.walk();
    for child in node.children(&mut cursor) {
        match child.kind() {
            "function_definition" | "class_definition" => {
                if let Some(def) = named_definition(&child, &child, region) {
                    out.push(def);
                }
            }
            "decorated_definition" => {
                // The span starts at the first decorator.
                if let Some(inner) = child.child_by_field_name("definition")
                    && let Some(def) = named_definition(&inner, &child, region)
                {
                    out.push(def);
                }
            }
            "expression_statement" => collect_assignments(&child, region, out),
            "import_statement" | "import_from_statement" => {
                let refs = parse_import(&child, region);
                out.extend(patterns::forward_definitions(&refs));
            }
            kind if is_module_level_block(kind) => collect_definitions(&child, region, out),
            _ => {}
        }
    }
}

fn named_definition(
    node: &tree_sitter::Node,
    span: &tree_sitter::Node,
    region: &Region,
) -> Option<Definition> {
    let name = node.child_by_field_name("name")?;
    let kind = if node.kind() == "class_definition" {
        DefinitionKind::Class
    } else {
        DefinitionKind::Function
    };
    Some(Definition {
        name: region.text(&name).to_string(),
        kind,
        line_start: region.start_line(span),
        line_end: region.end_line(span),
        text: region.text(span).to_string(),
    })
}

/// `x = ...`, `x: T = ...`, `a, b = ...`.
fn collect_assignments(statement: &tree_sitter::Node, region: &Region, out: &mut Vec<Definition>) {
    let mut cursor = statement.walk();
    for child in statement.children(&mut cursor) {
        if child.kind() != "assignment" {
            continue;
        }
        let Some(left) = child.child_by_field_name("left") else {
            continue;
        };
        let mut names = Vec::new();
        match left.kind() {
            "identifier" => names.push(region.text(&left).to_string()),
            "pattern_list" | "tuple_pattern" => {
                let mut inner = left.walk();
                names.extend(
                    left.children(&mut inner)
                        .filter(|n| n.kind() == "identifier")
                        .map(|n| region.text(&n).to_string()),
                );
            }
            _ => {}
        }
        for name in names {
            out.push(Definition {
                name,
                kind: DefinitionKind::Variable,
                line_start: region.start_line(statement),
                line_end: region.end_line(statement),
                text: region.text(statement).to_string(),
            });
        }
    }
}
