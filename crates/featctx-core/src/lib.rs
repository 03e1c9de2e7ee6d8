//! Core types for featctx: import references, origin sets, resolved modules,
//! extracted definitions, and the arena-backed dependency tree.
//!
//! Also holds configuration loading ([`config::FeatctxConfig`]), the
//! precondition error type ([`error::TraceError`]), and JSON (de)serialization
//! of finished trees for the report layer.

pub mod config;
pub mod definition;
pub mod error;
pub mod language;
pub mod module;
pub mod options;
pub mod origin;
pub mod paths;
pub mod reference;
pub mod schema;
pub mod tree;
