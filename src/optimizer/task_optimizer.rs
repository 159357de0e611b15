//! # Task Optimizer Module
//!
//! Esecuzione di un singolo `FileTask`: trasformazione (immagine o video)
//! tramite il backend, oppure copia passthrough. Ogni task aggiorna i
//! contatori esattamente una volta e produce una riga di progresso.

use crate::error::{OptimizeError, Result};
use crate::file_manager::{FileKind, FileManager};
use crate::optimizer::context::RunContext;
use crate::optimizer::path_resolver::PathResolver;
use std::path::PathBuf;
use std::sync::Arc;
use tracing::{debug, error};

/// One file to process, created by the walker and consumed exactly once
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FileTask {
    pub source: PathBuf,
    pub destination: PathBuf,
    pub kind: FileKind,
    /// Posizione (1-based) tra i file della stessa directory
    pub index: usize,
    pub total: usize,
}

/// Worker per singoli file
pub struct TaskOptimizer;

impl TaskOptimizer {
    /// Run an image or video transform. Failures are counted and reported
    /// here; the original is never copied in place of a failed transform.
    pub async fn run_transform(ctx: Arc<RunContext>, task: FileTask) {
        debug!("Compressing {} ({})", task.source.display(), task.kind.label());

        match Self::transform(&ctx, &task).await {
            Ok((original_size, output_size)) => {
                ctx.counters.add_compressed(original_size, output_size);
                debug!(
                    "{} -> {} ({:.1}% reduction)",
                    FileManager::format_size(original_size),
                    FileManager::format_size(output_size),
                    FileManager::calculate_reduction(original_size, output_size)
                );
                ctx.reporter.file_compressed(&task, original_size, output_size);
            }
            Err(e) => {
                ctx.counters.add_error();
                error!("{}", e);
                ctx.reporter.file_failed(&task, &e);
            }
        }
    }

    async fn transform(ctx: &RunContext, task: &FileTask) -> Result<(u64, u64)> {
        PathResolver::ensure_parent_dirs(&task.destination).await?;
        match task.kind {
            FileKind::Image => {
                let compressed = ctx
                    .backend
                    .compress_image(&task.source, &task.destination, &ctx.constraints)
                    .await?;
                Ok((compressed.original_size, compressed.compressed_size))
            }
            FileKind::Video => {
                ctx.backend
                    .compress_video(&task.source, &task.destination, &ctx.constraints)
                    .await?;
                let original_size = FileManager::file_size(&task.source).await.unwrap_or(0);
                let output_size = FileManager::file_size(&task.destination).await.unwrap_or(0);
                Ok((original_size, output_size))
            }
            FileKind::Passthrough => Err(OptimizeError::Validation(format!(
                "{} is not a media file",
                task.source.display()
            ))),
        }
    }

    /// Copy a passthrough file. The error is returned after being counted so
    /// the walker can stop scheduling the rest of the directory.
    pub async fn run_copy(ctx: &RunContext, task: &FileTask) -> Result<()> {
        let copied = match PathResolver::ensure_parent_dirs(&task.destination).await {
            Ok(()) => FileManager::copy_file(&task.source, &task.destination).await,
            Err(e) => Err(e),
        };
        match copied {
            Ok(size) => {
                ctx.counters.add_copied();
                ctx.reporter.file_copied(task, size);
                Ok(())
            }
            Err(e) => {
                ctx.counters.add_error();
                error!("{}", e);
                ctx.reporter.file_failed(task, &e);
                Err(e)
            }
        }
    }
}
