//! Following re-exports back to the module that actually defines a symbol.

use crate::extractor::symbol_key;
use crate::session::TraceSession;
use featctx_core::definition::{
    ContentScope, ExtractedDefinition, Extraction, MissReason, ReExport, ReExportHop,
    TraceStatus, TracedDefinition,
};
use featctx_core::module::Resolution;
use featctx_core::origin::OriginSet;
use std::collections::HashSet;
use std::path::PathBuf;
use tracing::debug;

/// Result of trying every candidate of one re-export.
enum Step {
    Next(ExtractedDefinition),
    Cycle { module: PathBuf, symbol: String },
    Broken { target: String, reason: MissReason },
}

impl TraceSession<'_> {
    /// Follow `definition` through re-exports until a terminal definition,
    /// a break, or a `(module, symbol)` pair seen before.
    ///
    /// Each re-export passed through is recorded as a hop. When the chain
    /// breaks, the last definition reached is kept together with the hops so
    /// far. A terminal definition comes back unchanged.
    pub fn trace_to_origin(
        &mut self,
        definition: ExtractedDefinition,
        origins: &OriginSet,
    ) -> TracedDefinition {
        let mut working = definition;
        let mut hops = Vec::new();
        let mut seen: HashSet<(PathBuf, String)> = HashSet::new();
        seen.insert((working.module.clone(), working.symbol.clone()));

        loop {
            let Some(reexport) = working.reexport.clone() else {
                return TracedDefinition {
                    definition: working,
                    hops,
                    status: TraceStatus::Terminal,
                };
            };
            hops.push(hop(&working));

            let status = match self.follow(&reexport, origins, &seen) {
                Step::Next(next) => {
                    if !seen.insert((next.module.clone(), next.symbol.clone())) {
                        TraceStatus::Cycle {
                            module: next.module,
                            symbol: next.symbol,
                        }
                    } else {
                        working = next;
                        continue;
                    }
                }
                Step::Cycle { module, symbol } => TraceStatus::Cycle { module, symbol },
                Step::Broken { target, reason } => TraceStatus::Unresolved { target, reason },
            };
            debug!(
                "re-export chain of '{}' stopped after {} hops: {:?}",
                working.symbol,
                hops.len(),
                status
            );
            return TracedDefinition {
                definition: working,
                hops,
                status,
            };
        }
    }

    /// Try candidates in order; the first that yields a definition wins.
    fn follow(
        &mut self,
        reexport: &ReExport,
        origins: &OriginSet,
        seen: &HashSet<(PathBuf, String)>,
    ) -> Step {
        let mut cycle = None;
        let mut failure = None;
        for target in reexport.targets() {
            let module = match self.resolve(target, origins) {
                Resolution::Resolved(module) => module,
                Resolution::NotFound { tried } => {
                    failure = Some((
                        target.module.clone(),
                        MissReason::ModuleNotFound {
                            raw: target.module.clone(),
                            tried,
                        },
                    ));
                    continue;
                }
            };
            let key = (module.path.clone(), symbol_key(&target.symbol));
            if seen.contains(&key) {
                cycle.get_or_insert(key);
                continue;
            }
            match self.extract(&module, &target.symbol, false) {
                Extraction::Found(definition) => return Step::Next(definition),
                Extraction::DefinitionNotFound { reason, .. } => {
                    failure = Some((target.module.clone(), reason));
                }
            }
        }

        if let Some((module, symbol)) = cycle {
            return Step::Cycle { module, symbol };
        }
        let (target, reason) = failure.unwrap_or((String::new(), MissReason::SymbolAbsent));
        Step::Broken { target, reason }
    }
}

fn hop(definition: &ExtractedDefinition) -> ReExportHop {
    let line = match definition.scope {
        ContentScope::Span { line_start, .. } => line_start,
        ContentScope::WholeModule | ContentScope::Degraded => 1,
    };
    ReExportHop {
        module: definition.module.clone(),
        symbol: definition.symbol.clone(),
        statement: definition.text.trim().to_string(),
        line,
    }
}
