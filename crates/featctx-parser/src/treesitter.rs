//! Tree-sitter grammar selection and parsing.

use featctx_core::language::Language;

/// Grammar used to parse a language's code. Vue script blocks are
/// JavaScript.
pub fn grammar(language: Language) -> tree_sitter::Language {
    match language {
        Language::Python => tree_sitter_python::LANGUAGE.into(),
        Language::JavaScript | Language::Vue => tree_sitter_javascript::LANGUAGE.into(),
        Language::CSharp => tree_sitter_c_sharp::LANGUAGE.into(),
        Language::Cpp => tree_sitter_cpp::LANGUAGE.into(),
    }
}

/// Parse `code` with the grammar of `language`. `None` when no tree could be
/// produced at all.
pub fn parse(code: &str, language: Language) -> Option<tree_sitter::Tree> {
    let lang = grammar(language);
    let mut parser = tree_sitter::Parser::new();
    if parser.set_language(&lang).is_err() {
        tracing::warn!("failed to load {} grammar", language);
        return None;
    }
    parser.parse(code.as_bytes(), None)
}

/// Whether `node` has a direct child of the given kind.
pub fn has_child_kind(node: &tree_sitter::Node, kind: &str) -> bool {
    let mut cursor = node.walk();
    node.children(&mut cursor).any(|c| c.kind() == kind)
}

/// Strip the quotes from a string literal's text.
pub fn unquote(text: &str) -> &str {
    text.trim()
        .trim_matches(|c: char| c == '\'' || c == '"' || c == '`')
}
