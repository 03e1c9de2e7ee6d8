//! A source file read and parsed once, shared by every pattern query.

use crate::{treesitter, vue};
use featctx_core::error::TraceError;
use featctx_core::language::Language;
use std::ops::Range;
use std::path::{Path, PathBuf};

/// A parsed source file.
///
/// Most files are one code region covering the whole text. A Vue
/// single-file component has one region per `<script>` block, each parsed
/// with the JavaScript grammar.
#[derive(Debug)]
pub struct SourceFile {
    path: PathBuf,
    language: Language,
    text: String,
    regions: Vec<CodeRegion>,
}

#[derive(Debug)]
struct CodeRegion {
    range: Range<usize>,
    line_offset: usize,
    tree: Option<tree_sitter::Tree>,
}

/// Borrowed view of one parsed code region.
#[derive(Clone, Copy)]
pub struct Region<'a> {
    pub path: &'a Path,
    pub language: Language,
    /// Region text; node byte ranges index into this.
    pub code: &'a str,
    /// Lines of the file that precede the region.
    pub line_offset: usize,
    pub tree: Option<&'a tree_sitter::Tree>,
}

impl<'a> Region<'a> {
    pub fn root(&self) -> Option<tree_sitter::Node<'a>> {
        self.tree.map(tree_sitter::Tree::root_node)
    }

    pub fn text(&self, node: &tree_sitter::Node) -> &'a str {
        self.code.get(node.byte_range()).unwrap_or("")
    }

    /// 1-based line of the node's first row, in file coordinates.
    pub fn start_line(&self, node: &tree_sitter::Node) -> usize {
        node.start_position().row + 1 + self.line_offset
    }

    /// 1-based line of the node's last row, in file coordinates.
    pub fn end_line(&self, node: &tree_sitter::Node) -> usize {
        node.end_position().row + 1 + self.line_offset
    }
}

impl SourceFile {
    pub fn parse(path: impl Into<PathBuf>, language: Language, text: impl Into<String>) -> Self {
        let path = path.into();
        let text = text.into();
        let spans: Vec<(Range<usize>, usize)> = if language == Language::Vue {
            vue::script_blocks(&text)
                .into_iter()
                .map(|block| (block.range, block.line_offset))
                .collect()
        } else {
            vec![(0..text.len(), 0)]
        };
        let regions = spans
            .into_iter()
            .map(|(range, line_offset)| {
                let tree = text
                    .get(range.clone())
                    .and_then(|code| treesitter::parse(code, language));
                if tree.is_none() {
                    tracing::debug!("no syntax tree for {}", path.display());
                }
                CodeRegion {
                    range,
                    line_offset,
                    tree,
                }
            })
            .collect();
        Self {
            path,
            language,
            text,
            regions,
        }
    }

    /// Read and parse a file, picking the language from its extension.
    /// Invalid UTF-8 is replaced rather than rejected.
    pub fn read(path: &Path) -> Result<Self, TraceError> {
        let language = Language::from_path(path).ok_or_else(|| TraceError::UnsupportedFile {
            path: path.to_path_buf(),
        })?;
        let bytes = std::fs::read(path).map_err(|source| TraceError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        let text = String::from_utf8_lossy(&bytes).into_owned();
        Ok(Self::parse(path, language, text))
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn language(&self) -> Language {
        self.language
    }

    /// Full file text.
    pub fn text(&self) -> &str {
        &self.text
    }

    pub fn line_count(&self) -> usize {
        self.text.lines().count().max(1)
    }

    pub fn regions(&self) -> impl Iterator<Item = Region<'_>> {
        self.regions.iter().map(|region| Region {
            path: &self.path,
            language: self.language,
            code: self.text.get(region.range.clone()).unwrap_or(""),
            line_offset: region.line_offset,
            tree: region.tree.as_ref(),
        })
    }

    /// No syntax tree could be produced for some region.
    pub fn is_unparsed(&self) -> bool {
        self.regions.iter().any(|r| r.tree.is_none())
    }

    /// Some region parsed with syntax errors (or not at all).
    pub fn has_errors(&self) -> bool {
        self.regions.iter().any(|r| {
            r.tree
                .as_ref()
                .is_none_or(|tree| tree.root_node().has_error())
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_single_region_for_plain_files() {
        let file = SourceFile::parse("a.py", Language::Python, "x = 1\n");
        assert_eq!(file.regions().count(), 1);
        assert!(!file.is_unparsed());
        assert!(!file.has_errors());
    }

    #[test]
    fn test_vue_regions_map_lines() {
        let text = "<template>\n  <div/>\n</template>\n<script>\nimport a from './a'\n</script>\n";
        let file = SourceFile::parse("c.vue", Language::Vue, text);
        let region = file.regions().next().unwrap();
        assert_eq!(region.line_offset, 3);
        assert_eq!(region.code, "\nimport a from './a'\n");
        let root = region.root().unwrap();
        assert_eq!(region.start_line(&root.child(0).unwrap()), 5);
    }

    #[test]
    fn test_read_rejects_unknown_extension() {
        let tmp = tempfile::tempdir().unwrap();
        let path = tmp.path().join("notes.txt");
        std::fs::write(&path, "hi").unwrap();
        let err = SourceFile::read(&path).unwrap_err();
        assert!(matches!(err, TraceError::UnsupportedFile { .. }));
    }

    #[test]
    fn test_read_replaces_invalid_utf8() {
        let tmp = tempfile::tempdir().unwrap();
        let path = tmp.path().join("a.py");
        std::fs::write(&path, b"x = '\xff'\n").unwrap();
        let file = SourceFile::read(&path).unwrap();
        assert!(file.text().contains('\u{fffd}'));
    }
}
