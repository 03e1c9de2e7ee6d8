//! JavaScript (ES modules and CommonJS) imports and top-level definitions.
//!
//! The collectors work on a [`Region`] so that Vue script blocks reuse them.

use crate::patterns::{self, Definition, DefinitionKind, LanguagePatterns};
use crate::source::{Region, SourceFile};
use crate::treesitter::{has_child_kind, unquote};
use featctx_core::language::Language;
use featctx_core::reference::{ImportReference, ImportedSymbol};

pub struct JavaScriptPatterns;

impl LanguagePatterns for JavaScriptPatterns {
    fn language(&self) -> Language {
        Language::JavaScript
    }

    fn detect_imports(&self, source: &SourceFile) -> Vec<ImportReference> {
        let mut imports = Vec::new();
        for region in source.regions() {
            collect_region_imports(&region, &mut imports);
        }
        imports
    }

    fn detect_definitions(&self, source: &SourceFile) -> Vec<Definition> {
        let mut definitions = Vec::new();
        for region in source.regions() {
            collect_region_definitions(&region, &mut definitions);
        }
        patterns::in_source_order(definitions)
    }
}

pub(crate) fn collect_region_imports(region: &Region, imports: &mut Vec<ImportReference>) {
    if let Some(root) = region.root() {
        collect_imports(&root, region, imports);
    }
}

pub(crate) fn collect_region_definitions(region: &Region, definitions: &mut Vec<Definition>) {
    if let Some(root) = region.root() {
        collect_definitions(&root, region, definitions);
    }
}

fn collect_imports(node: &tree_sitter::Node, region: &Region, imports: &mut Vec<ImportReference>) {
    let mut cursor = node.walk();
    for child in node.children(&mut cursor) {
        match child.kind() {
            "import_statement" => imports.extend(parse_import_statement(&child, region)),
            "export_statement" if child.child_by_field_name("source").is_some() => {
                imports.extend(parse_export_from(&child, region));
            }
            "call_expression" => {
                if let Some(reference) = parse_literal_call(&child, region) {
                    imports.extend(reference);
                }
                collect_imports(&child, region, imports);
            }
            _ => collect_imports(&child, region, imports),
        }
    }
}

fn module_source(node: &tree_sitter::Node, region: &Region) -> Option<String> {
    let source = node.child_by_field_name("source")?;
    Some(unquote(region.text(&source)).to_string())
}

fn reference(
    region: &Region,
    statement: &tree_sitter::Node,
    module: &str,
    symbol: ImportedSymbol,
) -> ImportReference {
    ImportReference::new(
        module,
        symbol,
        region.path,
        region.start_line(statement),
        region.text(statement).trim(),
    )
}

/// `import x from`, `import {a, b as c} from`, `import * as ns from`,
/// `import 'side-effect'`.
fn parse_import_statement(node: &tree_sitter::Node, region: &Region) -> Vec<ImportReference> {
    let Some(module) = module_source(node, region) else {
        return Vec::new();
    };
    let mut symbols = Vec::new();
    let mut cursor = node.walk();
    for clause in node.children(&mut cursor) {
        if clause.kind() != "import_clause" {
            continue;
        }
        let mut inner = clause.walk();
        for part in clause.children(&mut inner) {
            match part.kind() {
                "identifier" => symbols.push(ImportedSymbol::Default {
                    local: region.text(&part).to_string(),
                }),
                "namespace_import" => {
                    let mut ns = part.walk();
                    if let Some(local) = part.children(&mut ns).find(|n| n.kind() == "identifier") {
                        symbols.push(ImportedSymbol::Namespace {
                            local: region.text(&local).to_string(),
                        });
                    }
                }
                "named_imports" => {
                    let mut specs = part.walk();
                    for spec in part.children(&mut specs) {
                        if spec.kind() == "import_specifier" {
                            symbols.extend(specifier_symbol(&spec, region));
                        }
                    }
                }
                _ => {}
            }
        }
    }
    if symbols.is_empty() {
        symbols.push(ImportedSymbol::Module);
    }
    symbols
        .into_iter()
        .map(|symbol| reference(region, node, &module, symbol))
        .collect()
}

/// `name` or `name as alias` inside import or export braces.
fn specifier_symbol(spec: &tree_sitter::Node, region: &Region) -> Option<ImportedSymbol> {
    let name = spec.child_by_field_name("name")?;
    let name = unquote(region.text(&name));
    Some(match spec.child_by_field_name("alias") {
        Some(alias) => ImportedSymbol::aliased(name, unquote(region.text(&alias))),
        None => ImportedSymbol::named(name),
    })
}

/// `export {a, b as c} from`, `export * from`, `export * as ns from`.
fn parse_export_from(node: &tree_sitter::Node, region: &Region) -> Vec<ImportReference> {
    let Some(module) = module_source(node, region) else {
        return Vec::new();
    };
    let mut symbols = Vec::new();
    let mut cursor = node.walk();
    for child in node.children(&mut cursor) {
        match child.kind() {
            "export_clause" => {
                let mut specs = child.walk();
                for spec in child.children(&mut specs) {
                    if spec.kind() == "export_specifier" {
                        symbols.extend(specifier_symbol(&spec, region));
                    }
                }
            }
            "namespace_export" => {
                let mut ns = child.walk();
                if let Some(local) = child
                    .children(&mut ns)
                    .find(|n| n.kind() == "identifier" || n.kind() == "string")
                {
                    symbols.push(ImportedSymbol::Namespace {
                        local: unquote(region.text(&local)).to_string(),
                    });
                }
            }
            "*" => symbols.push(ImportedSymbol::Wildcard),
            _ => {}
        }
    }
    symbols
        .into_iter()
        .map(|symbol| reference(region, node, &module, symbol))
        .collect()
}

/// `require('x')` and `import('x')` with a single string literal argument.
/// Computed specifiers are not followed.
fn parse_literal_call(node: &tree_sitter::Node, region: &Region) -> Option<Vec<ImportReference>> {
    let function = node.child_by_field_name("function")?;
    let is_require = function.kind() == "identifier" && region.text(&function) == "require";
    if !is_require && function.kind() != "import" {
        return None;
    }
    let arguments = node.child_by_field_name("arguments")?;
    if arguments.named_child_count() != 1 {
        return None;
    }
    let argument = arguments.named_child(0)?;
    if argument.kind() != "string" {
        return None;
    }
    let module = unquote(region.text(&argument)).to_string();
    let statement = enclosing_statement(node);

    let mut symbols = Vec::new();
    if is_require
        && let Some(declarator) = node.parent().filter(|p| p.kind() == "variable_declarator")
        && let Some(name) = declarator.child_by_field_name("name")
    {
        match name.kind() {
            "identifier" => symbols.push(ImportedSymbol::Namespace {
                local: region.text(&name).to_string(),
            }),
            "object_pattern" => {
                let mut cursor = name.walk();
                for prop in name.children(&mut cursor) {
                    match prop.kind() {
                        "shorthand_property_identifier_pattern" => {
                            symbols.push(ImportedSymbol::named(region.text(&prop)));
                        }
                        "pair_pattern" => {
                            if let (Some(key), Some(value)) = (
                                prop.child_by_field_name("key"),
                                prop.child_by_field_name("value"),
                            ) {
                                symbols.push(ImportedSymbol::aliased(
                                    region.text(&key),
                                    region.text(&value),
                                ));
                            }
                        }
                        _ => {}
                    }
                }
            }
            _ => {}
        }
    }
    if symbols.is_empty() {
        symbols.push(ImportedSymbol::Module);
    }
    Some(
        symbols
            .into_iter()
            .map(|symbol| reference(region, &statement, &module, symbol))
            .collect(),
    )
}

/// Nearest ancestor that is a statement or declaration (the call itself if
/// none).
fn enclosing_statement<'a>(node: &tree_sitter::Node<'a>) -> tree_sitter::Node<'a> {
    let mut current = *node;
    while let Some(parent) = current.parent() {
        let kind = parent.kind();
        if kind == "program" {
            break;
        }
        current = parent;
        if kind.ends_with("_statement") || kind.ends_with("_declaration") {
            break;
        }
    }
    current
}

fn collect_definitions(node: &tree_sitter::Node, region: &Region, out: &mut Vec<Definition>) {
    let mut cursor = node.walk();
    for child in node.children(&mut cursor) {
        match child.kind() {
            "import_statement" => {
                let refs = parse_import_statement(&child, region);
                out.extend(patterns::forward_definitions(&refs));
            }
            "export_statement" => collect_export(&child, region, out),
            _ => collect_declaration(&child, &child, region, out),
        }
    }
}

/// A declaration, reported with the span of `span` (the export statement
/// when exported).
fn collect_declaration(
    node: &tree_sitter::Node,
    span: &tree_sitter::Node,
    region: &Region,
    out: &mut Vec<Definition>,
) {
    let definition = |name: &str, kind: DefinitionKind| Definition {
        name: name.to_string(),
        kind,
        line_start: region.start_line(span),
        line_end: region.end_line(span),
        text: region.text(span).to_string(),
    };
    match node.kind() {
        "function_declaration" | "generator_function_declaration" => {
            if let Some(name) = node.child_by_field_name("name") {
                out.push(definition(region.text(&name), DefinitionKind::Function));
            }
        }
        "class_declaration" => {
            if let Some(name) = node.child_by_field_name("name") {
                out.push(definition(region.text(&name), DefinitionKind::Class));
            }
        }
        "lexical_declaration" | "variable_declaration" => {
            let mut cursor = node.walk();
            for decl in node.children(&mut cursor) {
                if decl.kind() != "variable_declarator" {
                    continue;
                }
                let value = decl.child_by_field_name("value");
                if let Some(value) = value.filter(|v| is_require_call(v, region)) {
                    // `const x = require('./x')` binds like an import.
                    if let Some(refs) = parse_literal_call(&value, region) {
                        out.extend(patterns::forward_definitions(&refs));
                    }
                    continue;
                }
                let Some(name) = decl.child_by_field_name("name") else {
                    continue;
                };
                if name.kind() != "identifier" {
                    continue;
                }
                let kind = if has_child_kind(&decl, "arrow_function")
                    || has_child_kind(&decl, "function_expression")
                    || has_child_kind(&decl, "function")
                {
                    DefinitionKind::Function
                } else {
                    DefinitionKind::Variable
                };
                out.push(definition(region.text(&name), kind));
            }
        }
        _ => {}
    }
}

fn is_require_call(node: &tree_sitter::Node, region: &Region) -> bool {
    node.kind() == "call_expression"
        && node
            .child_by_field_name("function")
            .is_some_and(|f| region.text(&f) == "require")
}

fn collect_export(node: &tree_sitter::Node, region: &Region, out: &mut Vec<Definition>) {
    if node.child_by_field_name("source").is_some() {
        let refs = parse_export_from(node, region);
        out.extend(patterns::forward_definitions(&refs));
        return;
    }

    let span_definition = |name: &str, kind: DefinitionKind| Definition {
        name: name.to_string(),
        kind,
        line_start: region.start_line(node),
        line_end: region.end_line(node),
        text: region.text(node).to_string(),
    };
    let is_default = has_child_kind(node, "default");

    if let Some(declaration) = node.child_by_field_name("declaration") {
        let before = out.len();
        collect_declaration(&declaration, node, region, out);
        if is_default {
            let kind = out
                .get(before)
                .map_or(DefinitionKind::Variable, |d| d.kind.clone());
            out.push(span_definition("default", kind));
        }
        return;
    }

    if is_default {
        let kind = match node.child_by_field_name("value") {
            Some(value) if value.kind() == "identifier" => DefinitionKind::LocalAlias {
                target: region.text(&value).to_string(),
            },
            Some(value) if value.kind() == "class" => DefinitionKind::Class,
            Some(value)
                if matches!(
                    value.kind(),
                    "function_expression" | "arrow_function" | "function"
                ) =>
            {
                DefinitionKind::Function
            }
            _ => DefinitionKind::Variable,
        };
        // `export default function main() {}` also defines `main`.
        if let Some(name) = node
            .child_by_field_name("value")
            .filter(|v| !matches!(kind, DefinitionKind::LocalAlias { .. }) && v.kind() != "object")
            .and_then(|v| v.child_by_field_name("name"))
        {
            out.push(span_definition(region.text(&name), kind.clone()));
        }
        out.push(span_definition("default", kind));
        return;
    }

    // `export { a as b }`: `b` is another name for the local `a`.
    let mut cursor = node.walk();
    for clause in node.children(&mut cursor) {
        if clause.kind() != "export_clause" {
            continue;
        }
        let mut specs = clause.walk();
        for spec in clause.children(&mut specs) {
            if spec.kind() != "export_specifier" {
                continue;
            }
            if let Some(ImportedSymbol::Named {
                name,
                alias: Some(alias),
            }) = specifier_symbol(&spec, region)
            {
                out.push(span_definition(
                    &alias,
                    DefinitionKind::LocalAlias { target: name },
                ));
            }
        }
    }
}
