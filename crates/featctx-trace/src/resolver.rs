//! Module resolution: from raw import text to a file under an origin.
//!
//! Every resolver walks the origin set in priority order and returns the
//! first existing candidate. Resolution is first-match, not best-match: two
//! origins holding the same module name never compete.

use featctx_core::language::Language;
use featctx_core::module::{Resolution, ResolvedModule};
use featctx_core::origin::OriginSet;
use featctx_core::paths;
use featctx_core::reference::{ImportReference, ImportedSymbol};
use std::ffi::OsStr;
use std::path::{Path, PathBuf};
use tracing::debug;
use walkdir::WalkDir;

/// Locates the file an import reference refers to.
pub trait ModuleResolver: Send + Sync {
    fn resolve(&self, reference: &ImportReference, origins: &OriginSet) -> Resolution;
}

/// Resolver for files written in `language`.
pub fn resolver_for(language: Language) -> Box<dyn ModuleResolver> {
    match language {
        Language::Python => Box::new(PythonResolver),
        Language::JavaScript | Language::Vue => Box::new(EsModuleResolver { importer: language }),
        Language::CSharp => Box::new(CSharpResolver),
        Language::Cpp => Box::new(CppResolver),
    }
}

/// Candidates probed so far for one reference.
#[derive(Default)]
struct Probe {
    tried: Vec<PathBuf>,
}

impl Probe {
    /// Accept `candidate` when it is an existing file of a known language.
    fn file(&mut self, origin: &Path, candidate: PathBuf) -> Option<ResolvedModule> {
        let language = Language::from_path(&candidate).filter(|_| candidate.is_file());
        match language {
            Some(language) => Some(ResolvedModule::new(
                origin,
                paths::canonical(&candidate),
                language,
            )),
            None => {
                self.tried.push(candidate);
                None
            }
        }
    }

    /// Deterministic recursive search under `origin` for a file named `name`.
    fn search(&mut self, origin: &Path, name: &OsStr) -> Option<ResolvedModule> {
        match find_file(origin, name) {
            Some(found) => self.file(origin, found),
            None => {
                self.tried.push(origin.join("**").join(name));
                None
            }
        }
    }

    fn finish(self, reference: &ImportReference, found: Option<ResolvedModule>) -> Resolution {
        match found {
            Some(module) => {
                debug!(
                    "resolved '{}' from {} to {}",
                    reference.module,
                    reference.source_file.display(),
                    module.path.display()
                );
                Resolution::Resolved(module)
            }
            None => {
                debug!(
                    "'{}' from {} not found ({} candidates)",
                    reference.module,
                    reference.source_file.display(),
                    self.tried.len()
                );
                Resolution::NotFound { tried: self.tried }
            }
        }
    }
}

/// `path` with `suffix` appended to its file name (`a/b` + `.py` → `a/b.py`).
fn with_suffix(path: &Path, suffix: &str) -> PathBuf {
    let mut name = path.as_os_str().to_os_string();
    name.push(suffix);
    PathBuf::from(name)
}

/// Drop a leading segment that repeats the origin's own directory name, so
/// `tools.toolbox` under origin `.../tools` means `.../tools/toolbox`.
fn strip_origin_name<'a>(parts: &'a [&'a str], origin: &Path) -> &'a [&'a str] {
    let origin_name = origin
        .file_name()
        .and_then(OsStr::to_str)
        .map(str::to_lowercase);
    match (parts.first(), origin_name) {
        (Some(first), Some(name)) if first.to_lowercase() == name => &parts[1..],
        _ => parts,
    }
}

fn join_parts(base: &Path, parts: &[&str]) -> PathBuf {
    parts.iter().fold(base.to_path_buf(), |path, part| path.join(part))
}

/// First file named `name` under `root`, siblings visited in name order.
/// Hidden directories and `node_modules` are skipped.
fn find_file(root: &Path, name: &OsStr) -> Option<PathBuf> {
    WalkDir::new(root)
        .sort_by_file_name()
        .into_iter()
        .filter_entry(|entry| {
            entry.depth() == 0
                || !(entry.file_type().is_dir()
                    && entry
                        .file_name()
                        .to_str()
                        .is_some_and(|n| n.starts_with('.') || n == "node_modules"))
        })
        .filter_map(Result::ok)
        .find(|entry| entry.file_type().is_file() && entry.file_name() == name)
        .map(walkdir::DirEntry::into_path)
}

// ---------------------------------------------------------------------------
// Python
// ---------------------------------------------------------------------------

/// Dotted module names mapped onto package directories.
pub struct PythonResolver;

impl PythonResolver {
    /// `<p>.py`, then `<p>/__init__.py`.
    fn module_file(probe: &mut Probe, origin: &Path, path: &Path) -> Option<ResolvedModule> {
        if let Some(found) = probe.file(origin, with_suffix(path, ".py")) {
            return Some(found);
        }
        probe.file(origin, path.join("__init__.py"))
    }

    /// For `from pkg import name`, a submodule `pkg/name` wins over a
    /// definition inside `pkg`. A bare package (`from . import name`) is
    /// only ever its `__init__.py`, never a sibling `<dir>.py`.
    fn package_or_submodule(
        probe: &mut Probe,
        origin: &Path,
        package: &Path,
        bare: bool,
        submodule: Option<&str>,
    ) -> Option<ResolvedModule> {
        if let Some(name) = submodule
            && let Some(found) = Self::module_file(probe, origin, &package.join(name))
        {
            return Some(found.binding_module());
        }
        if bare {
            return probe.file(origin, package.join("__init__.py"));
        }
        Self::module_file(probe, origin, package)
    }
}

impl ModuleResolver for PythonResolver {
    fn resolve(&self, reference: &ImportReference, origins: &OriginSet) -> Resolution {
        let mut probe = Probe::default();
        let submodule = match &reference.symbol {
            ImportedSymbol::Named { name, .. } => Some(name.as_str()),
            _ => None,
        };
        let module = reference.module.as_str();

        // `.x`, `..x`: anchored at the importing package only.
        if reference.is_relative() {
            let dots = module.chars().take_while(|c| *c == '.').count();
            let mut base = reference.importing_dir().to_path_buf();
            for _ in 1..dots {
                if !base.pop() {
                    break;
                }
            }
            let parts: Vec<&str> = module[dots..].split('.').filter(|p| !p.is_empty()).collect();
            let package = join_parts(&base, &parts);
            let found = Self::package_or_submodule(
                &mut probe,
                &base,
                &package,
                parts.is_empty(),
                submodule,
            );
            return probe.finish(reference, found);
        }

        let parts: Vec<&str> = module.split('.').filter(|p| !p.is_empty()).collect();
        let found = origins.iter().find_map(|origin| {
            let rest = strip_origin_name(&parts, origin);
            let package = join_parts(origin, rest);
            Self::package_or_submodule(&mut probe, origin, &package, rest.is_empty(), submodule)
        });
        probe.finish(reference, found)
    }
}

// ---------------------------------------------------------------------------
// JavaScript / Vue
// ---------------------------------------------------------------------------

const JS_SUFFIXES: &[&str] = &[".js", ".mjs", ".cjs", ".jsx", ".vue"];
const VUE_SUFFIXES: &[&str] = &[".vue", ".js", ".mjs"];
const INDEX_FILES: &[&str] = &["index.js", "index.vue"];

/// ES-module specifiers, shared by JavaScript and Vue importers. The importer
/// decides which suffix is tried first.
pub struct EsModuleResolver {
    pub importer: Language,
}

impl EsModuleResolver {
    fn suffixes(&self) -> &'static [&'static str] {
        if self.importer == Language::Vue {
            VUE_SUFFIXES
        } else {
            JS_SUFFIXES
        }
    }

    /// Exact file, suffix variants, then directory index.
    fn probe_base(&self, probe: &mut Probe, origin: &Path, base: &Path) -> Option<ResolvedModule> {
        if let Some(found) = probe.file(origin, base.to_path_buf()) {
            return Some(found);
        }
        for suffix in self.suffixes() {
            if let Some(found) = probe.file(origin, with_suffix(base, suffix)) {
                return Some(found);
            }
        }
        for index in INDEX_FILES {
            if let Some(found) = probe.file(origin, base.join(index)) {
                return Some(found);
            }
        }
        None
    }

    /// `lib.utils` → `lib/utils.js`, suffix variants only.
    fn probe_dotted(
        &self,
        probe: &mut Probe,
        origin: &Path,
        specifier: &str,
    ) -> Option<ResolvedModule> {
        if specifier.contains('/') || !specifier.contains('.') {
            return None;
        }
        let parts: Vec<&str> = specifier.split('.').filter(|p| !p.is_empty()).collect();
        let base = join_parts(origin, strip_origin_name(&parts, origin));
        self.suffixes()
            .iter()
            .find_map(|suffix| probe.file(origin, with_suffix(&base, suffix)))
    }
}

/// `./a/b` → `a/b`, `../../x` → `x`.
fn strip_relative(specifier: &str) -> &str {
    let mut rest = specifier;
    loop {
        if let Some(next) = rest.strip_prefix("./") {
            rest = next;
        } else if let Some(next) = rest.strip_prefix("../") {
            rest = next;
        } else {
            break;
        }
    }
    if rest == "." || rest == ".." { "" } else { rest }
}

fn origin_join(origin: &Path, specifier: &str) -> PathBuf {
    let parts: Vec<&str> = specifier.split('/').filter(|p| !p.is_empty()).collect();
    paths::normalize(&join_parts(origin, strip_origin_name(&parts, origin)))
}

impl ModuleResolver for EsModuleResolver {
    fn resolve(&self, reference: &ImportReference, origins: &OriginSet) -> Resolution {
        let mut probe = Probe::default();
        let specifier = reference.module.as_str();

        if reference.is_relative() {
            let dir = reference.importing_dir();
            let base = paths::normalize(&dir.join(specifier));
            if let Some(found) = self.probe_base(&mut probe, dir, &base) {
                return probe.finish(reference, Some(found));
            }
            let stripped = strip_relative(specifier);
            let found = origins
                .iter()
                .find_map(|origin| self.probe_base(&mut probe, origin, &origin_join(origin, stripped)));
            return probe.finish(reference, found);
        }

        let found = origins.iter().find_map(|origin| {
            self.probe_base(&mut probe, origin, &origin_join(origin, specifier))
                .or_else(|| self.probe_dotted(&mut probe, origin, specifier))
        });
        probe.finish(reference, found)
    }
}

// ---------------------------------------------------------------------------
// C#
// ---------------------------------------------------------------------------

/// Namespaces mapped onto folders, falling back to a search by type name.
pub struct CSharpResolver;

impl ModuleResolver for CSharpResolver {
    fn resolve(&self, reference: &ImportReference, origins: &OriginSet) -> Resolution {
        let mut probe = Probe::default();
        let name = reference.module.split('<').next().unwrap_or_default();
        let parts: Vec<&str> = name
            .split('.')
            .map(str::trim)
            .filter(|p| !p.is_empty())
            .collect();
        let Some(last) = parts.last() else {
            return probe.finish(reference, None);
        };
        let file_name = format!("{last}.cs");

        let found = origins.iter().find_map(|origin| {
            if let Some(found) = probe.file(origin, with_suffix(&join_parts(origin, &parts), ".cs")) {
                return Some(found);
            }
            let stripped = strip_origin_name(&parts, origin);
            if !stripped.is_empty()
                && stripped.len() < parts.len()
                && let Some(found) =
                    probe.file(origin, with_suffix(&join_parts(origin, stripped), ".cs"))
            {
                return Some(found);
            }
            probe.search(origin, OsStr::new(&file_name))
        });
        probe.finish(reference, found)
    }
}

// ---------------------------------------------------------------------------
// C++
// ---------------------------------------------------------------------------

const HEADER_SUFFIXES: &[&str] = &[".h", ".hpp", ".hh", ".hxx"];
const SOURCE_SUFFIXES: &[&str] = &[".cpp", ".cc", ".cxx"];

/// `#include` paths. Angle includes keep their brackets in the reference.
pub struct CppResolver;

impl CppResolver {
    /// The exact path, then header suffixes when the include has no extension.
    fn probe_include(probe: &mut Probe, origin: &Path, path: &Path) -> Option<ResolvedModule> {
        if let Some(found) = probe.file(origin, path.to_path_buf()) {
            return Some(found);
        }
        if path.extension().is_some() {
            return None;
        }
        HEADER_SUFFIXES
            .iter()
            .find_map(|suffix| probe.file(origin, with_suffix(path, suffix)))
    }

    fn quoted(
        probe: &mut Probe,
        reference: &ImportReference,
        include: &Path,
        origins: &OriginSet,
    ) -> Option<ResolvedModule> {
        let dir = reference.importing_dir();
        if let Some(found) = Self::probe_include(probe, dir, &dir.join(include)) {
            return Some(found);
        }
        let file_name = include.file_name()?;
        let search_names: Vec<PathBuf> = if include.extension().is_some() {
            vec![PathBuf::from(file_name)]
        } else {
            HEADER_SUFFIXES
                .iter()
                .map(|suffix| with_suffix(Path::new(file_name), suffix))
                .collect()
        };
        origins.iter().find_map(|origin| {
            if let Some(found) = Self::probe_include(probe, origin, &origin.join(include)) {
                return Some(found);
            }
            search_names
                .iter()
                .find_map(|name| probe.search(origin, name.as_os_str()))
        })
    }
}

/// Same-stem implementation file next to a header.
pub(crate) fn companion(header: &Path) -> Option<PathBuf> {
    let ext = header.extension()?.to_str()?.to_ascii_lowercase();
    if !HEADER_SUFFIXES.iter().any(|s| s[1..] == ext) {
        return None;
    }
    SOURCE_SUFFIXES
        .iter()
        .map(|suffix| header.with_extension(&suffix[1..]))
        .find(|candidate| candidate.is_file())
        .map(|candidate| paths::canonical(&candidate))
}

impl ModuleResolver for CppResolver {
    fn resolve(&self, reference: &ImportReference, origins: &OriginSet) -> Resolution {
        let mut probe = Probe::default();
        let raw = reference.module.trim();

        let found = match raw.strip_prefix('<').and_then(|r| r.strip_suffix('>')) {
            Some(system) => origins
                .iter()
                .find_map(|origin| probe.file(origin, origin.join(system.trim()))),
            None => Self::quoted(&mut probe, reference, Path::new(raw), origins),
        };
        let found = found.map(|module| {
            let paired = companion(&module.path);
            module.with_companion(paired)
        });
        probe.finish(reference, found)
    }
}
