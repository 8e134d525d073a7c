//! File system operations used for certificate discovery.

use anyhow::{Context, Result};
use std::fs;
use std::path::{Path, PathBuf};

use super::RealRuntime;

impl RealRuntime {
    #[tracing::instrument(skip(self))]
    pub(crate) fn exists_impl(&self, path: &Path) -> bool {
        path.exists()
    }

    #[tracing::instrument(skip(self))]
    pub(crate) fn is_dir_impl(&self, path: &Path) -> bool {
        path.is_dir()
    }

    #[tracing::instrument(skip(self))]
    pub(crate) fn read_impl(&self, path: &Path) -> Result<Vec<u8>> {
        fs::read(path).with_context(|| format!("Failed to read file {:?}", path))
    }

    #[tracing::instrument(skip(self))]
    pub(crate) fn read_dir_impl(&self, path: &Path) -> Result<Vec<PathBuf>> {
        fs::read_dir(path)
            .with_context(|| format!("Failed to read directory {:?}", path))?
            .map(|entry| Ok::<_, anyhow::Error>(entry?.path()))
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use crate::runtime::{RealRuntime, Runtime};
    use tempfile::tempdir;

    #[test]
    fn test_real_runtime_file_operations() {
        let dir = tempdir().unwrap();
        let file = dir.path().join("ca.pem");
        std::fs::write(&file, b"bundle").unwrap();

        let runtime = RealRuntime;

        assert!(runtime.exists(&file));
        assert!(!runtime.is_dir(&file));
        assert!(runtime.is_dir(dir.path()));
        assert_eq!(runtime.read(&file).unwrap(), b"bundle");
        assert_eq!(runtime.read_dir(dir.path()).unwrap(), vec![file]);
    }

    #[test]
    fn test_real_runtime_missing_paths() {
        let dir = tempdir().unwrap();
        let missing = dir.path().join("missing");

        let runtime = RealRuntime;

        assert!(!runtime.exists(&missing));
        assert!(!runtime.is_dir(&missing));
        assert!(runtime.read(&missing).is_err());
        assert!(runtime.read_dir(&missing).is_err());
    }
}
