//! # Run Counters and Statistics Module
//!
//! Questo modulo aggrega i risultati di tutti i file del run.
//!
//! ## Responsabilità:
//! - `RunCounters`: contatori condivisi tra task concorrenti, solo incrementi atomici
//! - `RunSummary`: snapshot immutabile letto dopo il completamento della root
//! - Formattazione del riepilogo finale
//!
//! ## Regole di conteggio:
//! - **compressed**: immagine o video compresso con successo
//! - **errors**: qualsiasi fallimento (trasformazione, copia, mapping, lettura directory)
//! - **copied**: file passthrough, mai contati come compressi
//! - **bytes_in / bytes_out**: dimensioni prima/dopo dei soli file compressi

use crate::file_manager::FileManager;
use std::sync::atomic::{AtomicU64, AtomicUsize, Ordering};

/// Shared counters for one run
#[derive(Debug, Default)]
pub struct RunCounters {
    compressed: AtomicUsize,
    copied: AtomicUsize,
    errors: AtomicUsize,
    bytes_in: AtomicU64,
    bytes_out: AtomicU64,
}

impl RunCounters {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add_compressed(&self, original_size: u64, compressed_size: u64) {
        self.compressed.fetch_add(1, Ordering::Relaxed);
        self.bytes_in.fetch_add(original_size, Ordering::Relaxed);
        self.bytes_out.fetch_add(compressed_size, Ordering::Relaxed);
    }

    pub fn add_copied(&self) {
        self.copied.fetch_add(1, Ordering::Relaxed);
    }

    pub fn add_error(&self) {
        self.errors.fetch_add(1, Ordering::Relaxed);
    }

    /// Snapshot dei contatori. Consistente solo a run terminato.
    pub fn snapshot(&self) -> RunSummary {
        RunSummary {
            compressed: self.compressed.load(Ordering::Relaxed),
            copied: self.copied.load(Ordering::Relaxed),
            errors: self.errors.load(Ordering::Relaxed),
            bytes_in: self.bytes_in.load(Ordering::Relaxed),
            bytes_out: self.bytes_out.load(Ordering::Relaxed),
        }
    }
}

/// Final, immutable view of a run
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct RunSummary {
    pub compressed: usize,
    pub copied: usize,
    pub errors: usize,
    pub bytes_in: u64,
    pub bytes_out: u64,
}

impl RunSummary {
    pub fn bytes_saved(&self) -> u64 {
        self.bytes_in.saturating_sub(self.bytes_out)
    }

    pub fn overall_reduction_percent(&self) -> f64 {
        FileManager::calculate_reduction(self.bytes_in, self.bytes_out)
    }

    /// Riga finale stampata su stdout
    pub fn format_summary(&self) -> String {
        format!("Compressed {} files. Errors: {}.", self.compressed, self.errors)
    }

    pub fn format_details(&self) -> String {
        format!(
            "Compressed: {} | Copied: {} | Errors: {} | Saved: {} ({:.2}%)",
            self.compressed,
            self.copied,
            self.errors,
            FileManager::format_size(self.bytes_saved()),
            self.overall_reduction_percent()
        )
    }
}
