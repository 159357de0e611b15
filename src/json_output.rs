//! # JSON Output Module
//!
//! Output strutturato in JSON (una riga per evento) per chi pilota il tool
//! da un altro programma. Attivo con `--json`, sostituisce le righe di progresso.
//!
//! ## Tipi di messaggi:
//! - `start`: inizio del run con la configurazione effettiva
//! - `file_complete`: un file è stato compresso, copiato o è fallito
//! - `directory_error`: una directory non è leggibile, subtree saltato
//! - `complete`: fine del run con il riepilogo

use crate::config::Config;
use crate::progress::RunSummary;
use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// Esito di un singolo file
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FileStatus {
    Compressed,
    Copied,
    Error,
}

/// Tipo di messaggio JSON
#[derive(Debug, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum JsonMessage {
    Start {
        source_dir: PathBuf,
        destination_dir: PathBuf,
        config: JsonConfig,
    },

    FileComplete {
        path: PathBuf,
        index: usize,
        total: usize,
        status: FileStatus,
        original_size: Option<u64>,
        output_size: Option<u64>,
        error: Option<String>,
    },

    DirectoryError {
        path: PathBuf,
        error: String,
    },

    Complete {
        files_compressed: usize,
        files_copied: usize,
        errors: usize,
        total_bytes_saved: u64,
        average_reduction: f64,
        duration_seconds: f64,
    },
}

/// Configurazione per output JSON
#[derive(Debug, Serialize, Deserialize)]
pub struct JsonConfig {
    pub quality: u32,
    pub max_width: u32,
    pub max_height: u32,
    pub max_output_bytes: u64,
    pub compress_video: bool,
    pub workers: usize,
}

impl From<&Config> for JsonConfig {
    fn from(config: &Config) -> Self {
        Self {
            quality: config.quality,
            max_width: config.max_width,
            max_height: config.max_height,
            max_output_bytes: config.max_output_bytes,
            compress_video: config.compress_video,
            workers: config.workers,
        }
    }
}

impl JsonMessage {
    /// Serializza il messaggio su una riga
    pub fn to_line(&self) -> Option<String> {
        serde_json::to_string(self).ok()
    }

    /// Emette il messaggio JSON su stdout
    pub fn emit(&self) {
        if let Some(line) = self.to_line() {
            println!("{}", line);
        }
    }

    pub fn complete(summary: &RunSummary, duration_seconds: f64) -> Self {
        Self::Complete {
            files_compressed: summary.compressed,
            files_copied: summary.copied,
            errors: summary.errors,
            total_bytes_saved: summary.bytes_saved(),
            average_reduction: summary.overall_reduction_percent(),
            duration_seconds,
        }
    }
}
