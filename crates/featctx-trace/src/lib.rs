//! Import resolution and dependency tracing.
//!
//! A trace starts at one entry file, resolves each of its imports to a file
//! under the configured origins, pulls out the definitions the import refers
//! to (following re-exports back to where they are actually defined), and
//! repeats for every newly reached module. The result is a
//! [`featctx_core::tree::DependencyTree`].
//!
//! [`facade::ExtractorRegistry`] is the entry point: it maps files to a
//! per-language [`facade::LanguageExtractor`].

pub mod extractor;
pub mod facade;
pub mod feature;
pub mod reexport;
pub mod resolver;
pub mod session;
pub mod sources;
pub mod tree;

pub use facade::{ExtractorRegistry, LanguageExtractor};
pub use feature::{FeatureReport, trace_feature};
pub use session::TraceSession;
