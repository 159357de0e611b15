//! # Configuration Management Module
//!
//! Questo modulo gestisce tutta la configurazione di un run.
//!
//! ## Responsabilità:
//! - Definisce la struct `Config` con tutti i parametri del run
//! - Fornisce validazione dei parametri di input (prima di toccare il filesystem)
//! - Supporta caricamento/salvataggio configurazione da/verso file JSON
//! - Deriva i `CompressionConstraints` immutabili passati ad ogni trasformazione
//!
//! ## Parametri di configurazione:
//! - `quality`: Qualità globale delle immagini (1-100, default: 80)
//! - `max_width` / `max_height`: Box del contain-fit (default: 3000x3000)
//! - `max_output_bytes`: Dimensione massima di un'immagine compressa (default: 10 MiB)
//! - `video_bitrate` / `audio_bitrate`: Bitrate in kbit/s (default: 500 / 128)
//! - `compress_video`: Abilita la compressione video (default: false)
//! - `workers`: Trasformazioni concorrenti (default: 5)
//! - `json_output`: Eventi JSON su stdout invece delle righe di progresso
//!
//! ## Esempio:
//! ```rust
//! use media_mirror::Config;
//!
//! let config = Config {
//!     quality: 85,
//!     compress_video: true,
//!     ..Default::default()
//! };
//! config.validate().unwrap();
//! let constraints = config.constraints();
//! assert_eq!(constraints.quality, 85);
//! ```

use crate::error::{OptimizeError, Result};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

pub const DEFAULT_QUALITY: u32 = 80;
pub const DEFAULT_WORKERS: usize = 5;

/// Configuration for one mirroring run
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct Config {
    /// Image quality (1-100), identical for every image of the run
    pub quality: u32,
    /// Maximum output width in pixels
    pub max_width: u32,
    /// Maximum output height in pixels
    pub max_height: u32,
    /// Maximum size of an encoded image
    pub max_output_bytes: u64,
    /// Target video bitrate in kbit/s
    pub video_bitrate: u32,
    /// Target audio bitrate in kbit/s
    pub audio_bitrate: u32,
    /// Re-encode videos instead of copying them
    pub compress_video: bool,
    /// Number of transforms allowed in flight
    pub workers: usize,
    /// Output progress and status as JSON for programmatic use
    pub json_output: bool,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            quality: DEFAULT_QUALITY,
            max_width: 3000,
            max_height: 3000,
            max_output_bytes: 10 * 1024 * 1024,
            video_bitrate: 500,
            audio_bitrate: 128,
            compress_video: false,
            workers: DEFAULT_WORKERS,
            json_output: false,
        }
    }
}

/// Vincoli immutabili applicati ad ogni trasformazione del run
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CompressionConstraints {
    pub quality: u8,
    pub max_width: u32,
    pub max_height: u32,
    pub max_output_bytes: u64,
    pub video_bitrate: u32,
    pub audio_bitrate: u32,
    pub compress_video: bool,
}

impl Default for CompressionConstraints {
    fn default() -> Self {
        Config::default().constraints()
    }
}

impl Config {
    /// Validate configuration parameters
    pub fn validate(&self) -> Result<()> {
        if self.quality == 0 || self.quality > 100 {
            return Err(OptimizeError::Validation(format!(
                "Quality must be between 1 and 100 (got {})",
                self.quality
            )));
        }

        if self.max_width == 0 || self.max_height == 0 {
            return Err(OptimizeError::Validation(
                "Maximum width and height must be greater than 0".to_string(),
            ));
        }

        if self.max_output_bytes == 0 {
            return Err(OptimizeError::Validation(
                "Maximum output size must be greater than 0".to_string(),
            ));
        }

        if self.video_bitrate == 0 || self.audio_bitrate == 0 {
            return Err(OptimizeError::Validation(
                "Video and audio bitrates must be greater than 0".to_string(),
            ));
        }

        if self.workers == 0 {
            return Err(OptimizeError::Validation(
                "Number of workers must be greater than 0".to_string(),
            ));
        }

        Ok(())
    }

    /// Vincoli per le trasformazioni. Da chiamare dopo `validate()`.
    pub fn constraints(&self) -> CompressionConstraints {
        CompressionConstraints {
            quality: self.quality.clamp(1, 100) as u8,
            max_width: self.max_width,
            max_height: self.max_height,
            max_output_bytes: self.max_output_bytes,
            video_bitrate: self.video_bitrate,
            audio_bitrate: self.audio_bitrate,
            compress_video: self.compress_video,
        }
    }

    /// Default location of the configuration file, if the platform has one
    pub fn default_path() -> Option<PathBuf> {
        dirs::config_dir().map(|dir| dir.join("media-mirror").join("config.json"))
    }

    /// Load configuration from file
    pub async fn from_file(path: &Path) -> Result<Self> {
        if !path.exists() {
            return Ok(Self::default());
        }

        let content = tokio::fs::read_to_string(path).await?;
        let config: Config = serde_json::from_str(&content).map_err(|e| {
            OptimizeError::Validation(format!("Invalid config file {}: {}", path.display(), e))
        })?;
        config.validate()?;
        Ok(config)
    }

    /// Save configuration to file
    pub async fn save_to_file(&self, path: &Path) -> Result<()> {
        let content = serde_json::to_string_pretty(self)
            .map_err(|e| OptimizeError::Validation(e.to_string()))?;
        if let Some(parent) = path.parent() {
            tokio::fs::create_dir_all(parent).await?;
        }
        tokio::fs::write(path, content).await?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_config_validation() {
        let mut config = Config::default();
        assert!(config.validate().is_ok());

        config.quality = 0;
        assert!(config.validate().is_err());

        config.quality = 150;
        assert!(config.validate().is_err());

        config.quality = 100;
        assert!(config.validate().is_ok());

        config.workers = 0;
        assert!(config.validate().is_err());

        config.workers = 1;
        config.max_height = 0;
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_config_default() {
        let config = Config::default();
        assert_eq!(config.quality, 80);
        assert_eq!(config.max_width, 3000);
        assert_eq!(config.max_height, 3000);
        assert_eq!(config.video_bitrate, 500);
        assert_eq!(config.audio_bitrate, 128);
        assert_eq!(config.workers, 5);
        assert!(!config.compress_video);
    }

    #[test]
    fn test_constraints_follow_config() {
        let config = Config {
            quality: 42,
            compress_video: true,
            ..Default::default()
        };
        let constraints = config.constraints();
        assert_eq!(constraints.quality, 42);
        assert!(constraints.compress_video);
        assert_eq!(constraints.max_output_bytes, config.max_output_bytes);
    }

    #[tokio::test]
    async fn test_config_save_load() {
        let temp_dir = TempDir::new().unwrap();
        let config_path = temp_dir.path().join("nested").join("config.json");

        let original_config = Config {
            quality: 85,
            max_width: 1920,
            max_height: 1080,
            workers: 8,
            compress_video: true,
            ..Default::default()
        };

        original_config.save_to_file(&config_path).await.unwrap();
        let loaded_config = Config::from_file(&config_path).await.unwrap();

        assert_eq!(loaded_config, original_config);
    }

    #[tokio::test]
    async fn test_partial_config_uses_defaults() {
        let temp_dir = TempDir::new().unwrap();
        let config_path = temp_dir.path().join("config.json");
        tokio::fs::write(&config_path, r#"{ "quality": 60 }"#).await.unwrap();

        let loaded = Config::from_file(&config_path).await.unwrap();
        assert_eq!(loaded.quality, 60);
        assert_eq!(loaded.workers, DEFAULT_WORKERS);
    }

    #[tokio::test]
    async fn test_invalid_config_file_is_rejected() {
        let temp_dir = TempDir::new().unwrap();
        let config_path = temp_dir.path().join("config.json");
        tokio::fs::write(&config_path, r#"{ "quality": 500 }"#).await.unwrap();

        assert!(Config::from_file(&config_path).await.is_err());
    }

    #[tokio::test]
    async fn test_missing_config_file_gives_default() {
        let temp_dir = TempDir::new().unwrap();
        let loaded = Config::from_file(&temp_dir.path().join("absent.json")).await.unwrap();
        assert_eq!(loaded, Config::default());
    }
}
