//! C# `using` directives and type/member definitions.

use crate::patterns::{self, Definition, DefinitionKind, LanguagePatterns};
use crate::source::{Region, SourceFile};
use featctx_core::language::Language;
use featctx_core::reference::{ImportReference, ImportedSymbol};

pub struct CSharpPatterns;

impl LanguagePatterns for CSharpPatterns {
    fn language(&self) -> Language {
        Language::CSharp
    }

    fn detect_imports(&self, source: &SourceFile) -> Vec<ImportReference> {
        let mut imports = Vec::new();
        for region in source.regions() {
            if let Some(root) = region.root() {
                collect_usings(&root, &region, &mut imports);
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

fn collect_usings(node: &tree_sitter::Node, region: &Region, imports: &mut Vec<ImportReference>) {
    let mut cursor = node.walk();
    for child in node.children(&mut cursor) {
        if child.kind() == "using_directive" {
            imports.extend(parse_using(&child, region));
        } else {
            collect_usings(&child, region, imports);
        }
    }
}

/// `using A.B;`, `global using A.B;`, `using static A.B.C;` and
/// `using X = A.B.C;`.
fn parse_using(node: &tree_sitter::Node, region: &Region) -> Option<ImportReference> {
    let statement = region.text(node).trim();
    let body = statement
        .trim_start_matches("global ")
        .trim()
        .trim_start_matches("using ")
        .trim();
    let (is_static, body) = match body.strip_prefix("static ") {
        Some(rest) => (true, rest.trim()),
        None => (false, body),
    };
    let body = body.trim_end_matches(';').trim();
    if body.is_empty() {
        return None;
    }

    let (module, symbol) = if let Some((alias, target)) = body.split_once('=') {
        let target = target.trim();
        let last = last_segment(target);
        (
            target.to_string(),
            ImportedSymbol::aliased(last, alias.trim()),
        )
    } else if is_static {
        (body.to_string(), ImportedSymbol::named(last_segment(body)))
    } else {
        (body.to_string(), ImportedSymbol::Module)
    };

    Some(ImportReference::new(
        module,
        symbol,
        region.path,
        region.start_line(node),
        statement,
    ))
}

/// `A.B.C` → `C`, ignoring generic arguments.
fn last_segment(name: &str) -> &str {
    let name = name.split('<').next().unwrap_or(name).trim();
    name.rsplit(['.', ':']).next().unwrap_or(name).trim()
}

const TYPE_DECLARATIONS: &[&str] = &[
    "class_declaration",
    "struct_declaration",
    "interface_declaration",
    "enum_declaration",
    "record_declaration",
    "record_struct_declaration",
];

fn collect_definitions(node: &tree_sitter::Node, region: &Region, out: &mut Vec<Definition>) {
    let mut cursor = node.walk();
    for child in node.children(&mut cursor) {
        let kind = child.kind();
        if TYPE_DECLARATIONS.contains(&kind) {
            push_named(&child, DefinitionKind::Class, region, out);
            // Nested types and members.
            if let Some(body) = child.child_by_field_name("body") {
                collect_definitions(&body, region, out);
            }
            continue;
        }
        match kind {
            "delegate_declaration" => push_named(&child, DefinitionKind::TypeAlias, region, out),
            "method_declaration" | "constructor_declaration" => {
                push_named(&child, DefinitionKind::Function, region, out);
            }
            "property_declaration" => push_named(&child, DefinitionKind::Variable, region, out),
            "field_declaration" | "event_field_declaration" => {
                collect_field_names(&child, region, out);
            }
            "using_directive" => {
                // `using X = A.B.C;` re-exposes C under the name X.
                if let Some(reference) = parse_using(&child, region)
                    && reference.symbol.bound_name().is_some()
                    && reference.statement.contains('=')
                {
                    out.extend(patterns::forward_definitions(&[reference]));
                }
            }
            "namespace_declaration"
            | "file_scoped_namespace_declaration"
            | "declaration_list"
            | "compilation_unit" => collect_definitions(&child, region, out),
            _ => {}
        }
    }
}

fn push_named(
    node: &tree_sitter::Node,
    kind: DefinitionKind,
    region: &Region,
    out: &mut Vec<Definition>,
) {
    if let Some(name) = node.child_by_field_name("name") {
        out.push(Definition {
            name: region.text(&name).to_string(),
            kind,
            line_start: region.start_line(node),
            line_end: region.end_line(node),
            text: region.text(node).to_string(),
        });
    }
}

/// `int a = 1, b;` declares `a` and `b`.
fn collect_field_names(node: &tree_sitter::Node, region: &Region, out: &mut Vec<Definition>) {
    let mut stack = vec![*node];
    while let Some(current) = stack.pop() {
        let mut cursor = current.walk();
        for child in current.children(&mut cursor) {
            match child.kind() {
                "variable_declarator" => {
                    let name = child.child_by_field_name("name").or_else(|| {
                        let mut inner = child.walk();
                        child
                            .children(&mut inner)
                            .find(|n| n.kind() == "identifier")
                    });
                    if let Some(name) = name {
                        out.push(Definition {
                            name: region.text(&name).to_string(),
                            kind: DefinitionKind::Variable,
                            line_start: region.start_line(node),
                            line_end: region.end_line(node),
                            text: region.text(node).to_string(),
                        });
                    }
                }
                "variable_declaration" => stack.push(child),
                _ => {}
            }
        }
    }
}
