//! # Progress Tracking Module
//!
//! Una riga di progresso per ogni file (`[index/total] Azione: path`) oppure
//! eventi JSON quando `--json` è attivo. Su terminale interattivo uno spinner
//! `indicatif` mostra l'ultimo file completato; le righe vengono stampate
//! sopra lo spinner senza romperlo.

use crate::config::Config;
use crate::error::OptimizeError;
use crate::json_output::{FileStatus, JsonConfig, JsonMessage};
use crate::optimizer::task_optimizer::FileTask;
use crate::progress::RunSummary;
use indicatif::{ProgressBar, ProgressStyle};
use std::io::IsTerminal;
use std::path::{Path, PathBuf};
use std::time::Duration;

/// Esito di un file come appare nella riga di progresso
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FileAction {
    Compressed,
    Copied,
    Error,
}

impl FileAction {
    fn as_str(self) -> &'static str {
        match self {
            Self::Compressed => "Compressed",
            Self::Copied => "Copied",
            Self::Error => "Error",
        }
    }

    fn status(self) -> FileStatus {
        match self {
            Self::Compressed => FileStatus::Compressed,
            Self::Copied => FileStatus::Copied,
            Self::Error => FileStatus::Error,
        }
    }
}

/// Reports per-file outcomes as text lines or JSON events
#[derive(Clone)]
pub struct ProgressTracker {
    source_root: PathBuf,
    json_output: bool,
    bar: ProgressBar,
}

impl ProgressTracker {
    pub fn new(source_root: impl Into<PathBuf>, json_output: bool) -> Self {
        // Lo spinner disegna su stderr
        let interactive = std::io::stdout().is_terminal() && std::io::stderr().is_terminal();
        let bar = if json_output || !interactive {
            ProgressBar::hidden()
        } else {
            let bar = ProgressBar::new_spinner();
            if let Ok(style) = ProgressStyle::with_template("{spinner:.green} [{elapsed_precise}] {msg}") {
                bar.set_style(style);
            }
            bar.enable_steady_tick(Duration::from_millis(100));
            bar
        };

        Self {
            source_root: source_root.into(),
            json_output,
            bar,
        }
    }

    /// Path mostrato all'utente, relativo alla root sorgente quando possibile
    fn display_path<'a>(&self, path: &'a Path) -> &'a Path {
        path.strip_prefix(&self.source_root).unwrap_or(path)
    }

    pub fn format_line(index: usize, total: usize, action: FileAction, path: &Path) -> String {
        format!("[{}/{}] {}: {}", index, total, action.as_str(), path.display())
    }

    fn print_line(&self, line: &str) {
        if self.bar.is_hidden() {
            println!("{}", line);
        } else {
            self.bar.println(line);
        }
    }

    pub fn start(&self, destination_root: &Path, config: &Config) {
        if self.json_output {
            JsonMessage::Start {
                source_dir: self.source_root.clone(),
                destination_dir: destination_root.to_path_buf(),
                config: JsonConfig::from(config),
            }
            .emit();
        }
    }

    fn report(
        &self,
        task: &FileTask,
        action: FileAction,
        sizes: Option<(u64, u64)>,
        error: Option<&OptimizeError>,
    ) {
        let path = self.display_path(&task.source);

        if self.json_output {
            JsonMessage::FileComplete {
                path: path.to_path_buf(),
                index: task.index,
                total: task.total,
                status: action.status(),
                original_size: sizes.map(|(original, _)| original),
                output_size: sizes.map(|(_, output)| output),
                error: error.map(|e| e.to_string()),
            }
            .emit();
            return;
        }

        self.print_line(&Self::format_line(task.index, task.total, action, path));
        self.bar.set_message(format!("{}", path.display()));
    }

    pub fn file_compressed(&self, task: &FileTask, original_size: u64, output_size: u64) {
        self.report(task, FileAction::Compressed, Some((original_size, output_size)), None);
    }

    pub fn file_copied(&self, task: &FileTask, size: u64) {
        self.report(task, FileAction::Copied, Some((size, size)), None);
    }

    pub fn file_failed(&self, task: &FileTask, error: &OptimizeError) {
        self.report(task, FileAction::Error, None, Some(error));
    }

    pub fn directory_failed(&self, path: &Path, error: &OptimizeError) {
        if self.json_output {
            JsonMessage::DirectoryError {
                path: self.display_path(path).to_path_buf(),
                error: error.to_string(),
            }
            .emit();
        }
    }

    /// Chiude lo spinner e stampa il riepilogo
    pub fn finish(&self, summary: &RunSummary, duration_seconds: f64) {
        self.bar.finish_and_clear();
        if self.json_output {
            JsonMessage::complete(summary, duration_seconds).emit();
        } else {
            println!("{}", summary.format_summary());
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::file_manager::FileKind;

    #[test]
    fn test_format_line() {
        let line = ProgressTracker::format_line(
            2,
            7,
            FileAction::Compressed,
            Path::new("a/b/photo.jpg"),
        );
        assert_eq!(line, "[2/7] Compressed: a/b/photo.jpg");
        assert_eq!(
            ProgressTracker::format_line(1, 1, FileAction::Error, Path::new("x.png")),
            "[1/1] Error: x.png"
        );
    }

    #[test]
    fn test_display_path_is_relative_to_source_root() {
        let tracker = ProgressTracker::new("/data/src", true);
        assert_eq!(
            tracker.display_path(Path::new("/data/src/a/notes.txt")),
            Path::new("a/notes.txt")
        );
        assert_eq!(
            tracker.display_path(Path::new("/elsewhere/x")),
            Path::new("/elsewhere/x")
        );
    }

    #[test]
    fn test_json_tracker_has_no_spinner() {
        let tracker = ProgressTracker::new("/data/src", true);
        assert!(tracker.bar.is_hidden());

        let task = FileTask {
            source: PathBuf::from("/data/src/a.txt"),
            destination: PathBuf::from("/data/dst/a.txt"),
            kind: FileKind::Passthrough,
            index: 1,
            total: 1,
        };
        // Emits a JSON line; must not panic without a terminal
        tracker.file_copied(&task, 10);
    }
}
