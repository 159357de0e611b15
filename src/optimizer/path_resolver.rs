//! # Path Resolution Module
//!
//! Centralizza il calcolo dei path di destinazione: il path relativo alla
//! root sorgente viene ri-radicato sotto la root di destinazione.

use crate::error::{OptimizeError, Result};
use std::path::{Component, Path, PathBuf};
use tracing::debug;

/// Maps source paths onto the mirrored destination tree
#[derive(Debug, Clone)]
pub struct PathResolver {
    source_root: PathBuf,
    destination_root: PathBuf,
}

impl PathResolver {
    pub fn new(source_root: impl Into<PathBuf>, destination_root: impl Into<PathBuf>) -> Self {
        Self {
            source_root: source_root.into(),
            destination_root: destination_root.into(),
        }
    }

    pub fn source_root(&self) -> &Path {
        &self.source_root
    }

    pub fn destination_root(&self) -> &Path {
        &self.destination_root
    }

    /// Calcola il path di destinazione per un path assoluto sotto la root sorgente
    pub fn map_path(&self, entry: &Path) -> Result<PathBuf> {
        let relative = entry
            .strip_prefix(&self.source_root)
            .map_err(|_| OptimizeError::PathMapping {
                path: entry.to_path_buf(),
                reason: format!("not inside source root {}", self.source_root.display()),
            })?;

        if relative
            .components()
            .any(|c| !matches!(c, Component::Normal(_) | Component::CurDir))
        {
            return Err(OptimizeError::PathMapping {
                path: entry.to_path_buf(),
                reason: "path escapes the source root".to_string(),
            });
        }

        let result = self.destination_root.join(relative);
        debug!("Resolved output path: {} -> {}", entry.display(), result.display());
        Ok(result)
    }

    /// Crea la directory (e i suoi parent) se necessario. Idempotente.
    pub async fn ensure_dir(path: &Path) -> Result<()> {
        tokio::fs::create_dir_all(path)
            .await
            .map_err(|e| OptimizeError::PathMapping {
                path: path.to_path_buf(),
                reason: format!("cannot create directory: {}", e),
            })
    }

    /// Crea le directory parent se necessario
    pub async fn ensure_parent_dirs(path: &Path) -> Result<()> {
        match path.parent() {
            Some(parent) => Self::ensure_dir(parent).await,
            None => Ok(()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_map_path_reroots_relative_path() {
        let resolver = PathResolver::new("/data/src", "/backup/dst");
        let mapped = resolver.map_path(Path::new("/data/src/a/b/photo.jpg")).unwrap();
        assert_eq!(mapped, PathBuf::from("/backup/dst/a/b/photo.jpg"));
    }

    #[test]
    fn test_map_root_itself() {
        let resolver = PathResolver::new("/data/src", "/backup/dst");
        assert_eq!(
            resolver.map_path(Path::new("/data/src")).unwrap(),
            PathBuf::from("/backup/dst")
        );
    }

    #[test]
    fn test_map_path_outside_root_fails() {
        let resolver = PathResolver::new("/data/src", "/backup/dst");
        let err = resolver.map_path(Path::new("/data/other/photo.jpg")).unwrap_err();
        assert!(matches!(err, OptimizeError::PathMapping { .. }));

        // Prefisso testuale ma non componente: /data/src2 non è sotto /data/src
        assert!(resolver.map_path(Path::new("/data/src2/photo.jpg")).is_err());
    }

    #[test]
    fn test_map_path_with_parent_components_fails() {
        let resolver = PathResolver::new("/data/src", "/backup/dst");
        assert!(resolver.map_path(Path::new("/data/src/../etc/passwd")).is_err());
    }

    #[tokio::test]
    async fn test_ensure_parent_dirs_is_idempotent() {
        let temp_dir = TempDir::new().unwrap();
        let file = temp_dir.path().join("a").join("b").join("c.txt");

        tokio_test::assert_ok!(PathResolver::ensure_parent_dirs(&file).await);
        tokio_test::assert_ok!(PathResolver::ensure_parent_dirs(&file).await);
        assert!(temp_dir.path().join("a").join("b").is_dir());
    }

    #[tokio::test]
    async fn test_ensure_dir_over_a_file_fails() {
        let temp_dir = TempDir::new().unwrap();
        let blocker = temp_dir.path().join("blocker");
        tokio::fs::write(&blocker, b"x").await.unwrap();

        let err = tokio_test::assert_err!(
            PathResolver::ensure_parent_dirs(&blocker.join("child.jpg")).await
        );
        assert!(matches!(err, OptimizeError::PathMapping { .. }));
    }
}
