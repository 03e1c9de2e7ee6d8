//! Vue single-file components.
//!
//! `<script>` blocks are located with a regex scan and parsed with the
//! JavaScript grammar. The symbol `default` always denotes the whole
//! component file.

use crate::javascript;
use crate::patterns::{self, Definition, DefinitionKind, LanguagePatterns};
use crate::source::{Region, SourceFile};
use featctx_core::language::Language;
use featctx_core::reference::ImportReference;
use regex::Regex;
use std::ops::Range;
use std::sync::OnceLock;

pub struct VuePatterns;

/// Byte range of one `<script>` block's content within the file.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ScriptBlock {
    pub range: Range<usize>,
    /// Lines before the first content line.
    pub line_offset: usize,
    pub setup: bool,
}

fn script_block_re() -> &'static Regex {
    static SCRIPT_BLOCK_RE: OnceLock<Regex> = OnceLock::new();
    SCRIPT_BLOCK_RE
        .get_or_init(|| Regex::new(r"(?s)<script\b([^>]*)>(.*?)(?:</script\s*>|\z)").unwrap())
}

/// Locate `<script>` / `<script setup>` blocks anywhere in the file. A block
/// may open and close on one line; an unclosed block runs to end of file.
pub fn script_blocks(text: &str) -> Vec<ScriptBlock> {
    let mut blocks = Vec::new();
    for captures in script_block_re().captures_iter(text) {
        let attrs = captures.get(1).map_or("", |m| m.as_str());
        // `<script src="..." />` has no content.
        if attrs.trim_end().ends_with('/') {
            continue;
        }
        let Some(content) = captures.get(2) else {
            continue;
        };
        let setup = attrs.split_whitespace().any(|a| a == "setup");
        blocks.push(ScriptBlock {
            range: content.range(),
            line_offset: text[..content.start()].matches('\n').count(),
            setup,
        });
    }
    blocks
}

impl LanguagePatterns for VuePatterns {
    fn language(&self) -> Language {
        Language::Vue
    }

    fn detect_imports(&self, source: &SourceFile) -> Vec<ImportReference> {
        let mut imports = Vec::new();
        for region in source.regions() {
            javascript::collect_region_imports(&region, &mut imports);
        }
        imports
    }

    fn detect_definitions(&self, source: &SourceFile) -> Vec<Definition> {
        let mut definitions = Vec::new();
        for region in source.regions() {
            javascript::collect_region_definitions(&region, &mut definitions);
            if let Some(root) = region.root() {
                collect_component_properties(&root, &region, &mut definitions);
            }
        }
        // The script's own `export default` is part of the component.
        definitions.retain(|d| d.name != "default");

        let mut all = vec![Definition {
            name: "default".to_string(),
            kind: DefinitionKind::Class,
            line_start: 1,
            line_end: source.line_count(),
            text: source.text().to_string(),
        }];
        all.extend(patterns::in_source_order(definitions));
        all
    }
}

/// Top-level properties of `export default { ... }` or
/// `export default defineComponent({ ... })`.
fn collect_component_properties(
    root: &tree_sitter::Node,
    region: &Region,
    out: &mut Vec<Definition>,
) {
    let mut cursor = root.walk();
    for statement in root.children(&mut cursor) {
        if statement.kind() != "export_statement" {
            continue;
        }
        let Some(value) = statement.child_by_field_name("value") else {
            continue;
        };
        let object = match value.kind() {
            "object" => Some(value),
            "call_expression" => value
                .child_by_field_name("arguments")
                .and_then(|args| args.named_child(0))
                .filter(|arg| arg.kind() == "object"),
            _ => None,
        };
        let Some(object) = object else {
            continue;
        };

        let mut props = object.walk();
        for prop in object.children(&mut props) {
            let name = match prop.kind() {
                "pair" => prop.child_by_field_name("key"),
                "method_definition" => prop.child_by_field_name("name"),
                "shorthand_property_identifier" => Some(prop),
                _ => None,
            };
            if let Some(name) = name {
                out.push(Definition {
                    name: crate::treesitter::unquote(region.text(&name)).to_string(),
                    kind: DefinitionKind::Property,
                    line_start: region.start_line(&prop),
                    line_end: region.end_line(&prop),
                    text: region.text(&prop).to_string(),
                });
            }
        }
    }
}
