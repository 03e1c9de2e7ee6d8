//! Pattern library: per-language recognition of import statements and
//! top-level definitions.
//!
//! Each supported grammar implements [`patterns::LanguagePatterns`]. Sources
//! are parsed once into a [`source::SourceFile`] and handed to the patterns;
//! tree-sitter is used for recognition only, never for semantic analysis.

pub mod cpp;
pub mod csharp;
pub mod javascript;
pub mod patterns;
pub mod python;
pub mod source;
pub mod treesitter;
pub mod vue;

pub use patterns::{Definition, DefinitionKind, LanguagePatterns, patterns_for};
pub use source::SourceFile;
