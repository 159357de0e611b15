//! # Video Processing Module
//!
//! Questo modulo ricodifica i video con FFmpeg.
//!
//! ## Responsabilità:
//! - Compressione video a bitrate costante (default 500k video, 128k audio)
//! - Scrittura diretta sul path di destinazione (i video non passano dalla memoria)
//! - Preservazione metadata del container (`-map_metadata 0`)
//! - Pulizia dell'output parziale quando FFmpeg fallisce
//! - Verifica della presenza di `ffmpeg`
//!
//! ## Formati supportati:
//! - **Input**: MP4, AVI, MKV
//! - **Output**: stesso container dell'input (FFmpeg lo deduce dall'estensione)

use crate::config::CompressionConstraints;
use crate::error::{OptimizeError, Result};
use crate::file_manager::FileManager;
use crate::platform::PlatformCommands;
use std::path::Path;
use std::process::Stdio;
use tokio::process::Command;
use tracing::{debug, warn};

/// Handles video compression
#[derive(Debug, Clone, Default)]
pub struct VideoProcessor;

impl VideoProcessor {
    pub fn new() -> Self {
        Self
    }

    /// Argomenti FFmpeg per una ricodifica a bitrate costante
    pub fn ffmpeg_args(
        input_path: &Path,
        output_path: &Path,
        constraints: &CompressionConstraints,
        verbose: bool,
    ) -> Vec<std::ffi::OsString> {
        let video_bitrate = format!("{}k", constraints.video_bitrate);
        let audio_bitrate = format!("{}k", constraints.audio_bitrate);

        let mut args: Vec<std::ffi::OsString> = vec![
            "-hide_banner".into(),
            "-nostdin".into(),
            "-loglevel".into(),
            (if verbose { "info" } else { "error" }).into(),
            "-i".into(),
            input_path.as_os_str().to_owned(),
            "-b:v".into(),
            video_bitrate.as_str().into(),
            "-minrate".into(),
            video_bitrate.as_str().into(),
            "-maxrate".into(),
            video_bitrate.as_str().into(),
            "-bufsize".into(),
            format!("{}k", constraints.video_bitrate.saturating_mul(2)).into(),
            "-b:a".into(),
            audio_bitrate.as_str().into(),
            "-map_metadata".into(),
            "0".into(),
        ];

        if FileManager::extension(output_path).as_deref() == Some("mp4") {
            args.push("-movflags".into());
            args.push("use_metadata_tags".into());
        }

        args.push("-y".into());
        args.push(output_path.as_os_str().to_owned());
        args
    }

    /// Compress a video straight into `output_path`
    pub async fn compress(
        &self,
        input_path: &Path,
        output_path: &Path,
        constraints: &CompressionConstraints,
    ) -> Result<()> {
        let platform = PlatformCommands::instance();
        let ffmpeg = platform
            .get_tool_path("ffmpeg")
            .ok_or_else(|| OptimizeError::video(input_path, "ffmpeg is not installed"))?;

        debug!(
            "🎬 Compressing video: {} (video: {}k, audio: {}k)",
            input_path.display(),
            constraints.video_bitrate,
            constraints.audio_bitrate
        );

        let start_time = std::time::Instant::now();
        let args = Self::ffmpeg_args(
            input_path,
            output_path,
            constraints,
            tracing::enabled!(tracing::Level::DEBUG),
        );
        let output = Command::new(&ffmpeg)
            .args(&args)
            .stdin(Stdio::null())
            .output()
            .await
            .map_err(|e| OptimizeError::video(input_path, format!("failed to execute ffmpeg: {}", e)))?;

        if !output.status.success() {
            if let Err(e) = tokio::fs::remove_file(output_path).await {
                if e.kind() != std::io::ErrorKind::NotFound {
                    warn!("Failed to remove partial video {}: {}", output_path.display(), e);
                }
            }
            return Err(OptimizeError::video(
                input_path,
                String::from_utf8_lossy(&output.stderr).trim(),
            ));
        }

        debug!(
            "✅ Video compression completed in {:.1}s: {}",
            start_time.elapsed().as_secs_f64(),
            output_path.display()
        );
        Ok(())
    }

    /// Check if ffmpeg is available
    pub fn check_dependencies() -> Result<()> {
        if PlatformCommands::instance().is_command_available("ffmpeg") {
            Ok(())
        } else {
            Err(OptimizeError::MissingDependency(
                "ffmpeg is required for video compression (--v)".to_string(),
            ))
        }
    }
}
