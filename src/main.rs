//! # Media Mirror - Main Entry Point
//!
//! ## Responsabilità:
//! - Parsing degli argomenti della command line con `clap`
//! - Inizializzazione del logging con `tracing` (su stderr)
//! - Validazione della configurazione prima di toccare il filesystem
//! - Avvio del `MediaOptimizer` e stampa del riepilogo
//!
//! ## Esempio di utilizzo:
//! ```bash
//! media-mirror ~/Pictures /mnt/backup/Pictures 75 --v
//! ```

use anyhow::{Context, Result};
use clap::Parser;
use std::path::PathBuf;
use tracing::debug;
use tracing_subscriber::EnvFilter;

use media_mirror::{Config, MediaOptimizer};

#[derive(Parser)]
#[command(name = "media-mirror")]
#[command(about = "Mirror a directory tree, compressing images (and optionally videos) on the way")]
struct Args {
    /// Directory to read from (never modified)
    source_folder: PathBuf,

    /// Directory to write the mirrored tree into
    destination_folder: PathBuf,

    /// Image quality (1-100) [default: 80]
    quality: Option<u32>,

    /// Compress videos too (mp4, avi, mkv) with ffmpeg
    #[arg(long = "v")]
    video: bool,

    /// Maximum number of files compressed at the same time [default: 5]
    #[arg(short, long)]
    workers: Option<usize>,

    /// Maximum output width in pixels [default: 3000]
    #[arg(long)]
    max_width: Option<u32>,

    /// Maximum output height in pixels [default: 3000]
    #[arg(long)]
    max_height: Option<u32>,

    /// Maximum size of a compressed image in bytes [default: 10485760]
    #[arg(long)]
    max_output_bytes: Option<u64>,

    /// Target video bitrate in kbit/s [default: 500]
    #[arg(long)]
    video_bitrate: Option<u32>,

    /// Target audio bitrate in kbit/s [default: 128]
    #[arg(long)]
    audio_bitrate: Option<u32>,

    /// JSON configuration file (command line values win)
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Output progress as JSON events for programmatic use
    #[arg(long)]
    json: bool,

    /// Verbose logging
    #[arg(long)]
    verbose: bool,
}

fn init_logging(verbose: bool) {
    let default_level = if verbose { "debug" } else { "info" };
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .init();
}

/// Config da file (esplicito o di default) con gli override della CLI
async fn load_config(args: &Args) -> Result<Config> {
    let mut config = match &args.config {
        Some(path) => {
            let is_file = tokio::fs::metadata(path)
                .await
                .map(|m| m.is_file())
                .unwrap_or(false);
            if !is_file {
                anyhow::bail!("Config file does not exist: {}", path.display());
            }
            Config::from_file(path).await?
        }
        None => match Config::default_path() {
            Some(path) => {
                debug!("Looking for config at {}", path.display());
                Config::from_file(&path)
                    .await
                    .with_context(|| format!("Failed to load {}", path.display()))?
            }
            None => Config::default(),
        },
    };

    if let Some(quality) = args.quality {
        config.quality = quality;
    }
    if let Some(workers) = args.workers {
        config.workers = workers;
    }
    if let Some(max_width) = args.max_width {
        config.max_width = max_width;
    }
    if let Some(max_height) = args.max_height {
        config.max_height = max_height;
    }
    if let Some(max_output_bytes) = args.max_output_bytes {
        config.max_output_bytes = max_output_bytes;
    }
    if let Some(video_bitrate) = args.video_bitrate {
        config.video_bitrate = video_bitrate;
    }
    if let Some(audio_bitrate) = args.audio_bitrate {
        config.audio_bitrate = audio_bitrate;
    }
    config.compress_video |= args.video;
    config.json_output |= args.json;

    config.validate()?;
    Ok(config)
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();
    init_logging(args.verbose);

    let config = load_config(&args).await?;
    let optimizer = MediaOptimizer::new(config)?;
    optimizer
        .run(&args.source_folder, &args.destination_folder)
        .await
        .with_context(|| {
            format!(
                "Cannot mirror {} into {}",
                args.source_folder.display(),
                args.destination_folder.display()
            )
        })?;

    Ok(())
}
