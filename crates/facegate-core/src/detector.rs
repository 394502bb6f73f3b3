//! Face localization over normalized frames.
//!
//! The cascade itself lives in the vision toolkit; this module fixes the
//! scan parameters for each pipeline path and keeps detector ordering intact.

use crate::types::FaceRect;
use image::GrayImage;
use thiserror::Error;

// --- Cascade scan parameters ---
const SCALE_FACTOR: f64 = 1.2;
const MIN_NEIGHBORS: i32 = 10;
const ENROLLMENT_MIN_FACE: (u32, u32) = (20, 20);

#[derive(Error, Debug)]
pub enum DetectorError {
    #[error("cascade file not found: {0}")]
    CascadeNotFound(String),
    #[error("detection failed: {0}")]
    DetectionFailed(String),
}

/// Parameters handed to the cascade for a single multi-scale scan.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct DetectionParams {
    /// Image pyramid scale step between levels.
    pub scale_factor: f64,
    /// Overlapping hits required before a candidate becomes a face.
    pub min_neighbors: i32,
    /// Smallest face accepted, `None` for no lower bound.
    pub min_size: Option<(u32, u32)>,
}

/// Which pipeline a scan serves.
///
/// Enrollment rejects faces smaller than 20×20 while recognition accepts any
/// size so small faces in group photos still reach the matcher. The two paths
/// are kept distinct on purpose.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DetectionPurpose {
    Enrollment,
    Recognition,
}

impl DetectionPurpose {
    pub fn params(self) -> DetectionParams {
        let min_size = match self {
            Self::Enrollment => Some(ENROLLMENT_MIN_FACE),
            Self::Recognition => None,
        };
        DetectionParams {
            scale_factor: SCALE_FACTOR,
            min_neighbors: MIN_NEIGHBORS,
            min_size,
        }
    }
}

/// Multi-scale cascade detection capability supplied by the vision toolkit.
pub trait CascadeDetector: Send + Sync {
    /// Return face rectangles in the order the cascade produced them.
    fn detect_multi_scale(
        &self,
        image: &GrayImage,
        params: &DetectionParams,
    ) -> Result<Vec<FaceRect>, DetectorError>;
}

impl<D: CascadeDetector + ?Sized> CascadeDetector for Box<D> {
    fn detect_multi_scale(
        &self,
        image: &GrayImage,
        params: &DetectionParams,
    ) -> Result<Vec<FaceRect>, DetectorError> {
        (**self).detect_multi_scale(image, params)
    }
}

impl<D: CascadeDetector + ?Sized> CascadeDetector for &D {
    fn detect_multi_scale(
        &self,
        image: &GrayImage,
        params: &DetectionParams,
    ) -> Result<Vec<FaceRect>, DetectorError> {
        (**self).detect_multi_scale(image, params)
    }
}

/// Runs the cascade with the fixed parameters of each pipeline path.
pub struct FaceLocalizer<D> {
    detector: D,
}

impl<D: CascadeDetector> FaceLocalizer<D> {
    pub fn new(detector: D) -> Self {
        Self { detector }
    }

    /// Locate faces in a normalized frame. An empty result means no face is present.
    pub fn locate(
        &self,
        image: &GrayImage,
        purpose: DetectionPurpose,
    ) -> Result<Vec<FaceRect>, DetectorError> {
        let faces = self.detector.detect_multi_scale(image, &purpose.params())?;
        tracing::debug!(?purpose, count = faces.len(), "cascade scan finished");
        Ok(faces)
    }
}
