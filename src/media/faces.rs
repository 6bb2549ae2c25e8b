use std::path::Path;

use anyhow::{Context, Result};
use image::{GrayImage, ImageReader};
use rustface::ImageData;
use tracing::debug;

use crate::config::FacesConfig;
use crate::media::FaceDetector;

/// Stored extension for an image MIME type the enabled decoders can read.
pub fn image_extension(mime: &str) -> Option<&'static str> {
    match mime {
        "image/jpeg" | "image/jpg" => Some("jpg"),
        "image/png" => Some("png"),
        _ => None,
    }
}

/// Decode an image to grayscale, detecting the format from its contents.
/// Downloaded documents do not always keep an extension.
pub fn load_grayscale(path: &Path) -> Result<GrayImage> {
    let image = ImageReader::open(path)
        .with_context(|| format!("Failed to open image: {}", path.display()))?
        .with_guessed_format()
        .with_context(|| format!("Failed to read image: {}", path.display()))?
        .decode()
        .with_context(|| format!("Failed to decode image: {}", path.display()))?;
    Ok(image.to_luma8())
}

/// SeetaFace frontal detector backed by `rustface`.
pub struct SeetaFaceDetector {
    /// Raw model file, read once. Each detection builds its own detector
    /// because `rustface` detectors are stateful.
    model: Vec<u8>,
    min_face_size: u32,
    score_threshold: f64,
}

impl SeetaFaceDetector {
    pub fn new(config: &FacesConfig) -> Result<Self> {
        let model = std::fs::read(&config.model_path).with_context(|| {
            format!(
                "Failed to read face detection model: {}",
                config.model_path.display()
            )
        })?;
        rustface::read_model(model.as_slice()).map_err(|e| {
            anyhow::anyhow!(
                "Invalid face detection model {}: {:?}",
                config.model_path.display(),
                e
            )
        })?;

        Ok(Self {
            model,
            min_face_size: config.min_face_size,
            score_threshold: config.score_threshold,
        })
    }
}

impl FaceDetector for SeetaFaceDetector {
    fn detect(&self, image: &Path) -> Result<usize> {
        let gray = load_grayscale(image)?;
        let (width, height) = gray.dimensions();

        let model = rustface::read_model(self.model.as_slice())
            .map_err(|e| anyhow::anyhow!("Invalid face detection model: {:?}", e))?;
        let mut detector = rustface::create_detector_with_model(model);
        detector.set_min_face_size(self.min_face_size);
        detector.set_score_thresh(self.score_threshold);
        detector.set_pyramid_scale_factor(0.8);
        detector.set_slide_window_step(4, 4);

        let faces = detector.detect(&ImageData::new(gray.as_raw(), width, height));
        debug!("Detected {} face(s) in {}", faces.len(), image.display());
        Ok(faces.len())
    }
}
