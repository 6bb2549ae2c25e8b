pub mod faces;
pub mod ffmpeg;

use std::path::Path;

use anyhow::Result;
use async_trait::async_trait;

/// Counts faces in an image file.
pub trait FaceDetector: Send + Sync {
    fn detect(&self, image: &Path) -> Result<usize>;
}

/// Re-encodes an audio file into the stored WAV format.
#[async_trait]
pub trait AudioConverter: Send + Sync {
    async fn convert(&self, input: &Path, output: &Path) -> Result<()>;
}
