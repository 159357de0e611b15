//! # Transform Backend
//!
//! Interfaccia uniforme "trasforma un file" usata dal walker. L'implementazione
//! reale delega a `ImageProcessor` e `VideoProcessor`; i test del walker usano
//! backend finti per contare le chiamate o simulare fallimenti.

use crate::config::CompressionConstraints;
use crate::error::Result;
use crate::image_processor::{CompressedImage, ImageProcessor};
use crate::video_processor::VideoProcessor;
use async_trait::async_trait;
use std::path::Path;

/// Converts one source file into one destination file
#[async_trait]
pub trait TransformBackend: Send + Sync {
    /// Re-encode an image. Nothing is left at `destination` on failure.
    async fn compress_image(
        &self,
        source: &Path,
        destination: &Path,
        constraints: &CompressionConstraints,
    ) -> Result<CompressedImage>;

    /// Re-encode a video. Partial output is removed on failure.
    async fn compress_video(
        &self,
        source: &Path,
        destination: &Path,
        constraints: &CompressionConstraints,
    ) -> Result<()>;
}

/// Backend di produzione: immagini in-process, video con FFmpeg
#[derive(Debug, Clone)]
pub struct MediaBackend {
    images: ImageProcessor,
    videos: VideoProcessor,
}

impl MediaBackend {
    pub fn new(preserve_metadata: bool) -> Self {
        Self {
            images: ImageProcessor::new(preserve_metadata),
            videos: VideoProcessor::new(),
        }
    }
}

#[async_trait]
impl TransformBackend for MediaBackend {
    async fn compress_image(
        &self,
        source: &Path,
        destination: &Path,
        constraints: &CompressionConstraints,
    ) -> Result<CompressedImage> {
        self.images.compress_file(source, destination, constraints).await
    }

    async fn compress_video(
        &self,
        source: &Path,
        destination: &Path,
        constraints: &CompressionConstraints,
    ) -> Result<()> {
        self.videos.compress(source, destination, constraints).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::{ImageFormat, RgbImage};
    use std::sync::Arc;
    use tempfile::TempDir;

    #[tokio::test]
    async fn test_media_backend_compresses_images_through_trait_object() {
        let temp_dir = TempDir::new().unwrap();
        let source = temp_dir.path().join("in.png");
        let destination = temp_dir.path().join("out.png");
        RgbImage::from_pixel(64, 32, image::Rgb([10, 200, 30]))
            .save_with_format(&source, ImageFormat::Png)
            .unwrap();

        let backend: Arc<dyn TransformBackend> = Arc::new(MediaBackend::new(false));
        let constraints = CompressionConstraints {
            max_width: 32,
            max_height: 32,
            ..Default::default()
        };
        let result = backend
            .compress_image(&source, &destination, &constraints)
            .await
            .unwrap();

        assert_eq!((result.width, result.height), (32, 16));
        assert!(destination.exists());
    }
}
