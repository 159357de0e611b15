//! # Error Types Module
//!
//! Questo modulo definisce tutti i tipi di errore dell'applicazione.
//!
//! ## Categorie di errori:
//! - `DirectoryRead`: una directory non può essere listata (subtree saltato)
//! - `PathMapping`: path di destinazione non calcolabile o parent non creabile
//! - `ImageTransform` / `VideoTransform`: l'encoder rifiuta l'input o fallisce
//! - `Copy`: copia passthrough fallita (interrompe il job della directory)
//! - `Io`, `Image`, `Metadata`, `MissingDependency`, `Validation`: errori di supporto
//!
//! Solo `Validation` e gli errori sulle root sono fatali per il run; tutti gli
//! altri vengono contati nel riepilogo finale.

use std::path::PathBuf;

/// Custom error types for the mirroring run
#[derive(thiserror::Error, Debug)]
pub enum OptimizeError {
    #[error("Cannot read directory {path}: {source}")]
    DirectoryRead {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Cannot map destination for {path}: {reason}")]
    PathMapping { path: PathBuf, reason: String },

    #[error("Image compression failed for {path}: {reason}")]
    ImageTransform { path: PathBuf, reason: String },

    #[error("Video compression failed for {path}: {reason}")]
    VideoTransform { path: PathBuf, reason: String },

    #[error("Copy failed for {path}: {source}")]
    Copy {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Image processing error: {0}")]
    Image(#[from] image::ImageError),

    #[error("Metadata preservation error: {0}")]
    Metadata(String),

    #[error("Dependency missing: {0}")]
    MissingDependency(String),

    #[error("Validation error: {0}")]
    Validation(String),
}

impl OptimizeError {
    /// Path coinvolto nell'errore, se presente
    pub fn path(&self) -> Option<&std::path::Path> {
        match self {
            Self::DirectoryRead { path, .. }
            | Self::PathMapping { path, .. }
            | Self::ImageTransform { path, .. }
            | Self::VideoTransform { path, .. }
            | Self::Copy { path, .. } => Some(path),
            _ => None,
        }
    }

    pub(crate) fn image(path: &std::path::Path, reason: impl ToString) -> Self {
        Self::ImageTransform {
            path: path.to_path_buf(),
            reason: reason.to_string(),
        }
    }

    pub(crate) fn video(path: &std::path::Path, reason: impl ToString) -> Self {
        Self::VideoTransform {
            path: path.to_path_buf(),
            reason: reason.to_string(),
        }
    }
}

pub type Result<T, E = OptimizeError> = std::result::Result<T, E>;

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::Path;

    #[test]
    fn test_error_messages_carry_path() {
        let err = OptimizeError::image(Path::new("/src/a.jpg"), "too large");
        assert_eq!(err.to_string(), "Image compression failed for /src/a.jpg: too large");
        assert_eq!(err.path(), Some(Path::new("/src/a.jpg")));

        let err = OptimizeError::DirectoryRead {
            path: PathBuf::from("/src/locked"),
            source: std::io::Error::from(std::io::ErrorKind::PermissionDenied),
        };
        assert!(err.to_string().starts_with("Cannot read directory /src/locked"));
    }

    #[test]
    fn test_support_errors_have_no_path() {
        let err = OptimizeError::Validation("quality".into());
        assert!(err.path().is_none());
    }
}
