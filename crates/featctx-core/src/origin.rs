//! Ordered origin directories under which imported modules may be defined.

use crate::error::TraceError;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// Non-empty, ordered list of origin roots. Earlier roots win.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "Vec<PathBuf>", into = "Vec<PathBuf>")]
pub struct OriginSet(Vec<PathBuf>);

impl OriginSet {
    pub fn new<I, P>(paths: I) -> Result<Self, TraceError>
    where
        I: IntoIterator<Item = P>,
        P: Into<PathBuf>,
    {
        let mut roots: Vec<PathBuf> = Vec::new();
        for path in paths {
            let path = path.into();
            // Keep the first occurrence so priority order is preserved.
            if !roots.contains(&path) {
                roots.push(path);
            }
        }
        if roots.is_empty() {
            return Err(TraceError::EmptyOriginSet);
        }
        Ok(Self(roots))
    }

    /// Origins in priority order.
    pub fn iter(&self) -> impl Iterator<Item = &Path> {
        self.0.iter().map(PathBuf::as_path)
    }

    pub fn as_slice(&self) -> &[PathBuf] {
        &self.0
    }

    /// Highest-priority origin.
    pub fn primary(&self) -> &Path {
        &self.0[0]
    }

    pub fn contains(&self, path: &Path) -> bool {
        self.0.iter().any(|p| p == path)
    }
}

impl TryFrom<Vec<PathBuf>> for OriginSet {
    type Error = TraceError;

    fn try_from(paths: Vec<PathBuf>) -> Result<Self, Self::Error> {
        Self::new(paths)
    }
}

impl From<OriginSet> for Vec<PathBuf> {
    fn from(origins: OriginSet) -> Self {
        origins.0
    }
}
