//! # Image Processing Module
//!
//! Questo modulo comprime le immagini in-process con il crate `image`, e
//! delega a `exiftool` (se installato) solo la copia dei metadati descrittivi.
//!
//! ## Pipeline di compressione
//!
//! 1. **Orientamento**: applica l'orientamento EXIF ai pixel, così il risultato
//!    appare identico all'originale indipendentemente dal sensore
//! 2. **Contain-fit**: riduce a `max_width` x `max_height` mantenendo l'aspect
//!    ratio, senza mai ingrandire immagini già più piccole
//! 3. **Ricodifica** nel formato nativo alla qualità globale del run:
//!
//! | Formato | Encoder | Uso della qualità |
//! |---------|---------|-------------------|
//! | JPEG    | `JpegEncoder` | qualità 1-100 |
//! | PNG     | `PngEncoder`  | nessuno (compressione massima, lossless) |
//! | GIF     | `GifEncoder`  | velocità di quantizzazione |
//!
//! 4. **Limite dimensione**: output oltre `max_output_bytes` è un errore,
//!    mai un troncamento
//! 5. **Scrittura atomica**: file temporaneo nella directory di destinazione,
//!    metadati copiati, poi rename sul path finale. Un fallimento non lascia
//!    file parziali
//!
//! ## Esempio:
//! ```ignore
//! let processor = ImageProcessor::new(true);
//! let result = processor.compress_file(&source, &destination, &constraints).await?;
//! info!("{}x{} -> {} bytes", result.width, result.height, result.compressed_size);
//! ```

use crate::config::CompressionConstraints;
use crate::error::{OptimizeError, Result};
use crate::file_manager::FileManager;
use crate::platform::PlatformCommands;
use image::codecs::gif::GifEncoder;
use image::codecs::jpeg::JpegEncoder;
use image::codecs::png::{CompressionType, FilterType as PngFilterType, PngEncoder};
use image::imageops::FilterType;
use image::{DynamicImage, Frame, ImageDecoder, ImageFormat, ImageReader};
use std::io::{Cursor, Write};
use std::path::Path;
use tempfile::NamedTempFile;
use tokio::process::Command;
use tracing::{debug, info, warn};

/// Motivo per cui l'encoder rifiuta un'immagine
#[derive(Debug, thiserror::Error)]
pub enum ImageRejection {
    #[error(transparent)]
    Codec(#[from] image::ImageError),

    #[error("encoded size {actual} bytes exceeds the limit of {limit} bytes")]
    TooLarge { actual: u64, limit: u64 },
}

/// Immagine ricodificata, ancora in memoria
#[derive(Debug, Clone)]
pub struct EncodedImage {
    pub bytes: Vec<u8>,
    pub width: u32,
    pub height: u32,
}

/// Esito della compressione di un file immagine
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CompressedImage {
    pub original_size: u64,
    pub compressed_size: u64,
    pub width: u32,
    pub height: u32,
}

/// Compresses images in process and writes them atomically
#[derive(Debug, Clone)]
pub struct ImageProcessor {
    /// Copy EXIF/XMP/IPTC from the source with exiftool when it is installed
    preserve_metadata: bool,
}

impl ImageProcessor {
    pub fn new(preserve_metadata: bool) -> Self {
        Self { preserve_metadata }
    }

    /// Logs which optional tools are usable. Missing exiftool only disables
    /// metadata preservation, it never fails the run.
    pub fn check_dependencies() -> bool {
        let available = PlatformCommands::instance().is_command_available("exiftool");
        if available {
            info!("exiftool found: image metadata will be preserved");
        } else {
            warn!("exiftool not found: image metadata (date, camera, GPS) will not be preserved");
        }
        available
    }

    /// Formato immagine dedotto dall'estensione
    pub fn format_for(path: &Path) -> Option<ImageFormat> {
        match FileManager::extension(path)?.as_str() {
            "jpg" | "jpeg" => Some(ImageFormat::Jpeg),
            "png" => Some(ImageFormat::Png),
            "gif" => Some(ImageFormat::Gif),
            _ => None,
        }
    }

    /// Box contain-fit: riduce per stare in `max_width` x `max_height`, mai ingrandisce
    pub fn contain_fit(width: u32, height: u32, max_width: u32, max_height: u32) -> (u32, u32) {
        if width <= max_width && height <= max_height {
            return (width, height);
        }

        let scale = f64::min(
            max_width as f64 / width as f64,
            max_height as f64 / height as f64,
        );
        let fitted_width = ((width as f64 * scale).round() as u32).clamp(1, max_width);
        let fitted_height = ((height as f64 * scale).round() as u32).clamp(1, max_height);
        (fitted_width, fitted_height)
    }

    /// Orientation, contain-fit resize and re-encode of an image held in memory.
    ///
    /// CPU bound: call it from a blocking thread, never directly on the runtime.
    pub fn compress_bytes(
        data: &[u8],
        format: ImageFormat,
        constraints: &CompressionConstraints,
    ) -> std::result::Result<EncodedImage, ImageRejection> {
        let mut decoder = ImageReader::with_format(Cursor::new(data), format).into_decoder()?;
        let orientation = decoder.orientation()?;
        let mut img = DynamicImage::from_decoder(decoder)?;
        img.apply_orientation(orientation);

        let (width, height) = Self::contain_fit(
            img.width(),
            img.height(),
            constraints.max_width,
            constraints.max_height,
        );
        if (width, height) != (img.width(), img.height()) {
            debug!("Resizing {}x{} -> {}x{}", img.width(), img.height(), width, height);
            img = img.resize_exact(width, height, FilterType::Lanczos3);
        }

        let bytes = Self::encode(&img, format, constraints.quality)?;
        let actual = bytes.len() as u64;
        if actual > constraints.max_output_bytes {
            return Err(ImageRejection::TooLarge {
                actual,
                limit: constraints.max_output_bytes,
            });
        }

        Ok(EncodedImage { bytes, width, height })
    }

    fn encode(img: &DynamicImage, format: ImageFormat, quality: u8) -> image::ImageResult<Vec<u8>> {
        let mut buffer = Vec::new();

        match format {
            ImageFormat::Png => {
                let encoder = PngEncoder::new_with_quality(
                    &mut buffer,
                    CompressionType::Best,
                    PngFilterType::Adaptive,
                );
                img.write_with_encoder(encoder)?;
            }
            ImageFormat::Gif => {
                // Il trailer GIF viene scritto al drop dell'encoder
                let mut encoder = GifEncoder::new_with_speed(&mut buffer, Self::gif_speed(quality));
                encoder.encode_frame(Frame::new(img.to_rgba8()))?;
            }
            _ => {
                // JPEG non supporta alpha: tutto ciò che non è grigio diventa RGB8
                let encoder = JpegEncoder::new_with_quality(&mut buffer, quality);
                match img {
                    DynamicImage::ImageLuma8(_) | DynamicImage::ImageRgb8(_) => {
                        img.write_with_encoder(encoder)?
                    }
                    other => DynamicImage::ImageRgb8(other.to_rgb8()).write_with_encoder(encoder)?,
                }
            }
        }

        Ok(buffer)
    }

    /// 1 = quantizzazione migliore, 30 = più veloce
    fn gif_speed(quality: u8) -> i32 {
        let quality = quality.clamp(1, 100) as i32;
        1 + ((100 - quality) * 29) / 99
    }

    /// Move the finished temp file onto `destination`, re-checking its size
    /// first: the metadata copy can grow the file past the limit.
    /// On rejection the temp file is removed and `destination` is untouched.
    async fn persist_within_limit(
        temp_file: NamedTempFile,
        destination: &Path,
        source: &Path,
        encoded_size: u64,
        limit: u64,
    ) -> Result<u64> {
        let size = tokio::fs::metadata(temp_file.path())
            .await
            .map(|m| m.len())
            .unwrap_or(encoded_size);

        if size > limit {
            drop(temp_file);
            return Err(OptimizeError::image(
                source,
                ImageRejection::TooLarge {
                    actual: size,
                    limit,
                },
            ));
        }

        temp_file
            .persist(destination)
            .map_err(|e| OptimizeError::image(source, format!("cannot move output into place: {}", e.error)))?;
        Ok(size)
    }

    /// Compress `source` into `destination`.
    ///
    /// The destination's parent directory must already exist. On any failure
    /// nothing is left at `destination`.
    pub async fn compress_file(
        &self,
        source: &Path,
        destination: &Path,
        constraints: &CompressionConstraints,
    ) -> Result<CompressedImage> {
        let format = Self::format_for(source)
            .ok_or_else(|| OptimizeError::image(source, "unsupported image format"))?;
        let parent = destination
            .parent()
            .ok_or_else(|| OptimizeError::image(source, "destination has no parent directory"))?
            .to_path_buf();

        let data = tokio::fs::read(source)
            .await
            .map_err(|e| OptimizeError::image(source, e))?;
        let original_size = data.len() as u64;

        let task_constraints = *constraints;
        let extension = FileManager::extension(source).unwrap_or_default();
        let (encoded, temp_file) = tokio::task::spawn_blocking(move || {
            let encoded = Self::compress_bytes(&data, format, &task_constraints)
                .map_err(|e| e.to_string())?;
            let mut temp_file = tempfile::Builder::new()
                .prefix(".media-mirror-")
                .suffix(&format!(".{}", extension))
                .tempfile_in(&parent)
                .map_err(|e| format!("cannot create temporary file: {}", e))?;
            temp_file
                .write_all(&encoded.bytes)
                .and_then(|_| temp_file.flush())
                .map_err(|e| format!("cannot write temporary file: {}", e))?;
            Ok::<_, String>((encoded, temp_file))
        })
        .await
        .map_err(|e| OptimizeError::image(source, format!("encoder task failed: {}", e)))?
        .map_err(|reason| OptimizeError::image(source, reason))?;

        if self.preserve_metadata && matches!(format, ImageFormat::Jpeg | ImageFormat::Png) {
            if let Err(e) = Self::preserve_metadata(source, temp_file.path()).await {
                warn!("{}", e);
            }
        }

        let compressed_size = Self::persist_within_limit(
            temp_file,
            destination,
            source,
            encoded.bytes.len() as u64,
            constraints.max_output_bytes,
        )
        .await?;

        debug!(
            "Compressed {} ({} -> {}, {}x{})",
            source.display(),
            FileManager::format_size(original_size),
            FileManager::format_size(compressed_size),
            encoded.width,
            encoded.height
        );

        Ok(CompressedImage {
            original_size,
            compressed_size,
            width: encoded.width,
            height: encoded.height,
        })
    }

    /// Copia i metadati descrittivi dal sorgente. L'orientamento non viene
    /// copiato perché è già stato applicato ai pixel.
    async fn preserve_metadata(source: &Path, target: &Path) -> Result<()> {
        let platform = PlatformCommands::instance();
        let Some(exiftool) = platform.get_tool_path("exiftool") else {
            return Ok(());
        };

        let output = Command::new(exiftool)
            .arg("-q")
            .arg("-overwrite_original")
            .arg("-TagsFromFile")
            .arg(source)
            .arg("-all:all")
            .arg("--Orientation")
            .arg(target)
            .output()
            .await
            .map_err(|e| OptimizeError::Metadata(format!("Failed to execute exiftool: {}", e)))?;

        if !output.status.success() {
            return Err(OptimizeError::Metadata(format!(
                "Failed to preserve metadata for {}: {}",
                source.display(),
                String::from_utf8_lossy(&output.stderr).trim()
            )));
        }

        Ok(())
    }
}
