//! Per-trace cache of read and parsed source files.

use featctx_parser::SourceFile;
use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tracing::warn;

/// Each file is read and parsed at most once per trace. Read failures are
/// cached too, so an unreadable module is reported the same way every time
/// it is reached.
#[derive(Default)]
pub struct SourceCache {
    files: HashMap<PathBuf, Result<Arc<SourceFile>, String>>,
}

impl SourceCache {
    pub fn new() -> Self {
        Self::default()
    }

    /// `path` should be canonical; it is the cache key.
    pub fn load(&mut self, path: &Path) -> Result<Arc<SourceFile>, String> {
        if let Some(entry) = self.files.get(path) {
            return entry.clone();
        }
        let entry = SourceFile::read(path).map(Arc::new).map_err(|e| {
            warn!("{e}");
            e.to_string()
        });
        self.files.insert(path.to_path_buf(), entry.clone());
        entry
    }

    /// Seed the cache with a file that was already read.
    pub fn insert(&mut self, file: SourceFile) -> Arc<SourceFile> {
        let file = Arc::new(file);
        self.files
            .insert(file.path().to_path_buf(), Ok(Arc::clone(&file)));
        file
    }

    pub fn len(&self) -> usize {
        self.files.len()
    }

    pub fn is_empty(&self) -> bool {
        self.files.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_load_reads_once() {
        let tmp = tempfile::tempdir().unwrap();
        let path = tmp.path().join("a.py");
        std::fs::write(&path, "x = 1\n").unwrap();

        let mut cache = SourceCache::new();
        let first = cache.load(&path).unwrap();
        std::fs::write(&path, "x = 2\n").unwrap();
        let second = cache.load(&path).unwrap();
        assert!(Arc::ptr_eq(&first, &second));
        assert_eq!(second.text(), "x = 1\n");
        assert_eq!(cache.len(), 1);
    }

    #[test]
    fn test_missing_file_is_cached_as_error() {
        let tmp = tempfile::tempdir().unwrap();
        let mut cache = SourceCache::new();
        let err = cache.load(&tmp.path().join("gone.py")).unwrap_err();
        assert!(err.contains("gone.py"));
        assert!(cache.load(&tmp.path().join("gone.py")).is_err());
        assert_eq!(cache.len(), 1);
    }
}
