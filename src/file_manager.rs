//! # File Management Module
//!
//! Questo modulo gestisce la classificazione dei file e le operazioni di copia.
//!
//! ## Responsabilità:
//! - Classificazione per estensione (immagine, video, passthrough)
//! - Copia byte-per-byte dei file passthrough
//! - Formattazione human-readable delle dimensioni
//!
//! ## Formati riconosciuti:
//! - **Immagini**: JPG, JPEG, PNG, GIF
//! - **Video**: MP4, AVI, MKV (solo se la compressione video è abilitata)
//!
//! Tutto il resto è passthrough, estensioni sconosciute comprese.

use crate::error::{OptimizeError, Result};
use std::path::Path;
use tokio::fs;

const IMAGE_EXTENSIONS: &[&str] = &["jpg", "jpeg", "png", "gif"];
const VIDEO_EXTENSIONS: &[&str] = &["mp4", "avi", "mkv"];

/// Tipo di trattamento riservato a un file
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum FileKind {
    Image,
    Video,
    Passthrough,
}

impl FileKind {
    /// Whether files of this kind go through the concurrency limiter
    pub fn is_transform(self) -> bool {
        !matches!(self, Self::Passthrough)
    }

    pub fn label(self) -> &'static str {
        match self {
            Self::Image => "image",
            Self::Video => "video",
            Self::Passthrough => "passthrough",
        }
    }
}

/// Manages file classification and plain copies
pub struct FileManager;

impl FileManager {
    /// Classify a file by its lowercased extension
    pub fn classify(path: &Path, compress_video: bool) -> FileKind {
        let Some(ext) = Self::extension(path) else {
            return FileKind::Passthrough;
        };

        if IMAGE_EXTENSIONS.contains(&ext.as_str()) {
            FileKind::Image
        } else if compress_video && VIDEO_EXTENSIONS.contains(&ext.as_str()) {
            FileKind::Video
        } else {
            FileKind::Passthrough
        }
    }

    /// Check if a file is a video (regardless of whether videos are compressed)
    pub fn is_video(path: &Path) -> bool {
        Self::classify(path, true) == FileKind::Video
    }

    /// Lowercased extension of a path
    pub fn extension(path: &Path) -> Option<String> {
        path.extension().map(|ext| ext.to_string_lossy().to_lowercase())
    }

    /// Copy a file byte for byte, returning the number of bytes copied
    pub async fn copy_file(source: &Path, destination: &Path) -> Result<u64> {
        fs::copy(source, destination)
            .await
            .map_err(|source_err| OptimizeError::Copy {
                path: source.to_path_buf(),
                source: source_err,
            })
    }

    /// Size of a file in bytes
    pub async fn file_size(path: &Path) -> Result<u64> {
        Ok(fs::metadata(path).await?.len())
    }

    /// Get human-readable file size
    pub fn format_size(size: u64) -> String {
        const UNITS: &[&str] = &["B", "KB", "MB", "GB", "TB"];
        let mut size = size as f64;
        let mut unit_index = 0;

        while size >= 1024.0 && unit_index < UNITS.len() - 1 {
            size /= 1024.0;
            unit_index += 1;
        }

        if unit_index == 0 {
            format!("{} {}", size as u64, UNITS[unit_index])
        } else {
            format!("{:.2} {}", size, UNITS[unit_index])
        }
    }

    /// Calculate percentage reduction
    pub fn calculate_reduction(original_size: u64, new_size: u64) -> f64 {
        if original_size == 0 {
            0.0
        } else {
            ((original_size as f64 - new_size as f64) / original_size as f64) * 100.0
        }
    }
}
