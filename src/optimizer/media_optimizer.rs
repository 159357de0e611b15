//! # Media Optimizer Main Orchestrator
//!
//! Visita ricorsiva dell'albero sorgente e ricostruzione dell'albero di
//! destinazione.
//!
//! ## Per ogni directory:
//! 1. Crea la directory di destinazione corrispondente
//! 2. Lista le entry (ordinate per nome); se fallisce l'errore viene contato
//!    e il subtree saltato
//! 3. Le sottodirectory partono subito come job figli
//! 4. Immagini e video (con `--v`) passano dal `ConcurrencyLimiter`
//! 5. Gli altri file vengono copiati subito; una copia fallita interrompe
//!    lo scheduling della directory
//! 6. Attende tutti i figli prima di terminare

use crate::config::Config;
use crate::error::{OptimizeError, Result};
use crate::file_manager::FileManager;
use crate::image_processor::ImageProcessor;
use crate::optimizer::backend::{MediaBackend, TransformBackend};
use crate::optimizer::context::RunContext;
use crate::optimizer::path_resolver::PathResolver;
use crate::optimizer::progress_tracker::ProgressTracker;
use crate::optimizer::task_optimizer::{FileTask, TaskOptimizer};
use crate::progress::RunSummary;
use crate::video_processor::VideoProcessor;
use futures::future::{join_all, BoxFuture};
use futures::FutureExt;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Instant;
use tokio::task::JoinHandle;
use tracing::{debug, error, info, warn};

/// Entry di una directory già classificata
#[derive(Debug)]
enum DirEntryKind {
    Directory(PathBuf),
    File(PathBuf),
}

/// Orchestrates one mirroring run from a source tree to a destination tree
pub struct MediaOptimizer {
    config: Config,
    backend: Arc<dyn TransformBackend>,
}

impl MediaOptimizer {
    /// Validate `config` and wire the production backend
    pub fn new(config: Config) -> Result<Self> {
        config.validate()?;

        let preserve_metadata = ImageProcessor::check_dependencies();
        if config.compress_video {
            if let Err(e) = VideoProcessor::check_dependencies() {
                warn!("{}: every video will be reported as an error", e);
            }
        }

        Ok(Self {
            config,
            backend: Arc::new(MediaBackend::new(preserve_metadata)),
        })
    }

    /// Same as `new` with a caller-provided backend
    pub fn with_backend(config: Config, backend: Arc<dyn TransformBackend>) -> Result<Self> {
        config.validate()?;
        Ok(Self { config, backend })
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    /// Mirror `source` into `destination` and return the run summary.
    ///
    /// Only a missing source root or an uncreatable destination root are
    /// fatal; everything else is counted and the summary is always produced.
    pub async fn run(&self, source: &Path, destination: &Path) -> Result<RunSummary> {
        let start_time = Instant::now();
        let (source_root, destination_root) = Self::prepare_roots(source, destination).await?;

        info!(
            "Mirroring {} -> {} (quality {}, {} workers, video {})",
            source_root.display(),
            destination_root.display(),
            self.config.quality,
            self.config.workers,
            if self.config.compress_video { "on" } else { "off" }
        );

        let reporter = ProgressTracker::new(&source_root, self.config.json_output);
        reporter.start(&destination_root, &self.config);

        let ctx = Arc::new(RunContext::new(
            PathResolver::new(&source_root, &destination_root),
            self.config.constraints(),
            self.config.workers,
            Arc::clone(&self.backend),
            reporter,
        ));

        if let Err(e) = walk_directory(Arc::clone(&ctx), source_root).await {
            error!("Run stopped early at the source root: {}", e);
        }

        let summary = ctx.counters.snapshot();
        let elapsed = start_time.elapsed().as_secs_f64();
        ctx.reporter.finish(&summary, elapsed);
        info!("{} in {:.1}s", summary.format_details(), elapsed);
        debug!(
            "Peak concurrent transforms: {}/{}",
            ctx.limiter.peak_in_flight(),
            ctx.limiter.limit()
        );

        Ok(summary)
    }

    /// Canonicalizza le root e crea la destinazione
    async fn prepare_roots(source: &Path, destination: &Path) -> Result<(PathBuf, PathBuf)> {
        let source_root = tokio::fs::canonicalize(source)
            .await
            .map_err(|e| OptimizeError::DirectoryRead {
                path: source.to_path_buf(),
                source: e,
            })?;
        if !tokio::fs::metadata(&source_root).await?.is_dir() {
            return Err(OptimizeError::Validation(format!(
                "Source is not a directory: {}",
                source.display()
            )));
        }

        // Il controllo precede la creazione: la sorgente non va mai toccata
        let planned_root = Self::resolve_planned(destination).await?;
        Self::reject_nested(&source_root, &planned_root)?;

        PathResolver::ensure_dir(destination).await?;
        let destination_root = tokio::fs::canonicalize(destination).await?;
        Self::reject_nested(&source_root, &destination_root)?;

        Ok((source_root, destination_root))
    }

    fn reject_nested(source_root: &Path, destination_root: &Path) -> Result<()> {
        if destination_root.starts_with(source_root) {
            return Err(OptimizeError::Validation(format!(
                "Destination {} is inside the source tree {}",
                destination_root.display(),
                source_root.display()
            )));
        }
        Ok(())
    }

    /// Path assoluto che la destinazione avrà: l'antenato esistente più
    /// profondo viene canonicalizzato, il resto riattaccato così com'è
    async fn resolve_planned(destination: &Path) -> Result<PathBuf> {
        let absolute = if destination.is_absolute() {
            destination.to_path_buf()
        } else {
            std::env::current_dir()?.join(destination)
        };

        let mut existing = absolute.as_path();
        let mut missing = Vec::new();
        loop {
            if let Ok(canonical) = tokio::fs::canonicalize(existing).await {
                let mut resolved = canonical;
                for name in missing.iter().rev() {
                    resolved.push(name);
                }
                return Ok(resolved);
            }
            match (existing.parent(), existing.file_name()) {
                (Some(parent), Some(name)) => {
                    missing.push(name.to_os_string());
                    existing = parent;
                }
                _ => return Ok(absolute),
            }
        }
    }
}

/// Lista una directory ordinando per nome. I symlink a file vengono seguiti,
/// quelli a directory saltati.
async fn read_sorted_entries(ctx: &RunContext, dir: &Path) -> Result<Vec<DirEntryKind>> {
    let read_error = |e: std::io::Error| OptimizeError::DirectoryRead {
        path: dir.to_path_buf(),
        source: e,
    };

    let mut reader = tokio::fs::read_dir(dir).await.map_err(read_error)?;
    let mut raw = Vec::new();
    while let Some(entry) = reader.next_entry().await.map_err(read_error)? {
        raw.push(entry);
    }
    raw.sort_by_key(|entry| entry.file_name());

    let mut entries = Vec::with_capacity(raw.len());
    for entry in raw {
        let path = entry.path();
        let file_type = entry.file_type().await.map_err(read_error)?;

        if file_type.is_dir() {
            entries.push(DirEntryKind::Directory(path));
        } else if file_type.is_file() {
            entries.push(DirEntryKind::File(path));
        } else if file_type.is_symlink() {
            match tokio::fs::metadata(&path).await {
                Ok(meta) if meta.is_file() => entries.push(DirEntryKind::File(path)),
                Ok(meta) if meta.is_dir() => {
                    warn!("Skipping symlink to directory: {}", path.display());
                }
                Ok(_) => debug!("Skipping special file: {}", path.display()),
                Err(e) => {
                    ctx.counters.add_error();
                    error!("Broken symlink {}: {}", path.display(), e);
                }
            }
        } else {
            debug!("Skipping special file: {}", path.display());
        }
    }

    Ok(entries)
}

/// Visit one directory and every descendant.
///
/// Returns `Err` only when the job was aborted (destination directory not
/// creatable or a passthrough copy failed); the error is already counted.
pub fn walk_directory(ctx: Arc<RunContext>, dir: PathBuf) -> BoxFuture<'static, Result<()>> {
    async move {
        let destination = match ctx.resolver.map_path(&dir) {
            Ok(destination) => destination,
            Err(e) => {
                ctx.counters.add_error();
                error!("{}", e);
                ctx.reporter.directory_failed(&dir, &e);
                return Err(e);
            }
        };
        if let Err(e) = PathResolver::ensure_dir(&destination).await {
            ctx.counters.add_error();
            error!("{}", e);
            ctx.reporter.directory_failed(&dir, &e);
            return Err(e);
        }

        let entries = match read_sorted_entries(&ctx, &dir).await {
            Ok(entries) => entries,
            Err(e) => {
                ctx.counters.add_error();
                error!("{}", e);
                ctx.reporter.directory_failed(&dir, &e);
                return Ok(());
            }
        };

        let (directories, files): (Vec<_>, Vec<_>) = entries
            .into_iter()
            .partition(|entry| matches!(entry, DirEntryKind::Directory(_)));

        // Le sottodirectory partono prima di qualsiasi attesa sul limiter
        let subdirectories: Vec<JoinHandle<Result<()>>> = directories
            .into_iter()
            .filter_map(|entry| match entry {
                DirEntryKind::Directory(path) => {
                    Some(tokio::spawn(walk_directory(Arc::clone(&ctx), path)))
                }
                DirEntryKind::File(_) => None,
            })
            .collect();

        let total = files.len();
        let mut transforms: Vec<JoinHandle<()>> = Vec::new();
        let mut aborted = None;

        for (position, entry) in files.into_iter().enumerate() {
            let DirEntryKind::File(path) = entry else {
                continue;
            };
            let index = position + 1;

            let kind = FileManager::classify(&path, ctx.constraints.compress_video);
            if !kind.is_transform() && FileManager::is_video(&path) {
                debug!("Copying video as-is (compression disabled): {}", path.display());
            }
            let destination = match ctx.resolver.map_path(&path) {
                Ok(destination) => destination,
                Err(e) => {
                    ctx.counters.add_error();
                    error!("{}", e);
                    continue;
                }
            };
            let task = FileTask {
                source: path,
                destination,
                kind,
                index,
                total,
            };

            if kind.is_transform() {
                match ctx
                    .limiter
                    .submit(TaskOptimizer::run_transform(Arc::clone(&ctx), task))
                    .await
                {
                    Ok(handle) => {
                        debug!("{} transforms in flight", ctx.limiter.in_flight());
                        transforms.push(handle);
                    }
                    Err(e) => {
                        ctx.counters.add_error();
                        error!("Concurrency limiter closed: {}", e);
                    }
                }
            } else if let Err(e) = TaskOptimizer::run_copy(&ctx, &task).await {
                warn!("Stopping scheduling in {}", dir.display());
                aborted = Some(e);
                break;
            }
        }

        for result in join_all(transforms).await {
            if let Err(e) = result {
                ctx.counters.add_error();
                error!("Compression task panicked: {}", e);
            }
        }
        for result in join_all(subdirectories).await {
            match result {
                Ok(Ok(())) => {}
                Ok(Err(e)) => warn!("Subdirectory aborted: {}", e),
                Err(e) => {
                    ctx.counters.add_error();
                    error!("Directory task panicked: {}", e);
                }
            }
        }

        match aborted {
            Some(e) => Err(e),
            None => Ok(()),
        }
    }
    .boxed()
}
