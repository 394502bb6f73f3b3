//! OpenCV backend: Haar cascade detection and eigenface recognition.
//!
//! Enabled with the `opencv` feature. Requires a system OpenCV with the
//! contrib `face` module.

use crate::detector::{CascadeDetector, DetectionParams, DetectorError};
use crate::recognizer::{FaceModel, ModelTrainer, Prediction, RecognizerError};
use crate::types::FaceRect;
use image::GrayImage;
use opencv::core::{Mat, Ptr, Rect, Size, Vector};
use opencv::face::EigenFaceRecognizer;
use opencv::objdetect::CascadeClassifier;
use opencv::prelude::*;
use std::path::Path;
use std::sync::Mutex;

/// Copy a luma image into an owned single-channel `Mat`.
fn to_mat(image: &GrayImage) -> Result<Mat, String> {
    let rows = i32::try_from(image.height()).map_err(|e| e.to_string())?;
    let cols = i32::try_from(image.width()).map_err(|e| e.to_string())?;
    let view = Mat::new_rows_cols_with_data(rows, cols, image.as_raw().as_slice())
        .map_err(|e| e.to_string())?;
    view.try_clone().map_err(|e| e.to_string())
}

fn to_size((width, height): (u32, u32)) -> Size {
    Size::new(
        i32::try_from(width).unwrap_or(i32::MAX),
        i32::try_from(height).unwrap_or(i32::MAX),
    )
}

fn to_face_rect(rect: Rect) -> Option<FaceRect> {
    Some(FaceRect::new(
        u32::try_from(rect.x).ok()?,
        u32::try_from(rect.y).ok()?,
        u32::try_from(rect.width).ok()?,
        u32::try_from(rect.height).ok()?,
    ))
}

/// Haar cascade face detector.
pub struct HaarCascade {
    classifier: Mutex<CascadeClassifier>,
}

impl HaarCascade {
    /// Load a cascade XML file (e.g. `haarcascade_frontalface_default.xml`).
    pub fn load(path: &Path) -> Result<Self, DetectorError> {
        let display = path.display().to_string();
        if !path.exists() {
            return Err(DetectorError::CascadeNotFound(display));
        }

        let classifier = CascadeClassifier::new(&display)
            .map_err(|e| DetectorError::DetectionFailed(format!("{display}: {e}")))?;
        if classifier.empty().unwrap_or(true) {
            return Err(DetectorError::DetectionFailed(format!(
                "{display}: cascade file holds no classifier"
            )));
        }

        tracing::info!(path = %display, "loaded Haar cascade");
        Ok(Self {
            classifier: Mutex::new(classifier),
        })
    }
}

impl CascadeDetector for HaarCascade {
    fn detect_multi_scale(
        &self,
        image: &GrayImage,
        params: &DetectionParams,
    ) -> Result<Vec<FaceRect>, DetectorError> {
        let mat = to_mat(image).map_err(DetectorError::DetectionFailed)?;
        let min_size = params.min_size.map(to_size).unwrap_or_default();

        let mut found = Vector::<Rect>::new();
        {
            let mut classifier = self
                .classifier
                .lock()
                .map_err(|_| DetectorError::DetectionFailed("cascade lock poisoned".into()))?;
            classifier
                .detect_multi_scale(
                    &mat,
                    &mut found,
                    params.scale_factor,
                    params.min_neighbors,
                    0,
                    min_size,
                    Size::default(),
                )
                .map_err(|e| DetectorError::DetectionFailed(e.to_string()))?;
        }

        Ok(found
            .iter()
            .filter_map(|rect| {
                let face = to_face_rect(rect);
                if face.is_none() {
                    tracing::warn!(?rect, "dropping detection with negative geometry");
                }
                face
            })
            .collect())
    }
}

/// Trains OpenCV `EigenFaceRecognizer` models.
#[derive(Debug, Clone, Copy)]
pub struct EigenFaceTrainer {
    num_components: i32,
    threshold: f64,
}

impl EigenFaceTrainer {
    /// `num_components = 0` keeps every component; `threshold = f64::MAX`
    /// makes the nearest sample always count as a match.
    pub fn new(num_components: i32, threshold: f64) -> Self {
        Self {
            num_components,
            threshold,
        }
    }
}

impl Default for EigenFaceTrainer {
    fn default() -> Self {
        Self::new(0, f64::MAX)
    }
}

impl ModelTrainer for EigenFaceTrainer {
    fn train(
        &self,
        images: &[GrayImage],
        labels: &[i32],
    ) -> Result<Box<dyn FaceModel>, RecognizerError> {
        let mats = images
            .iter()
            .map(to_mat)
            .collect::<Result<Vector<Mat>, _>>()
            .map_err(RecognizerError::TrainingFailed)?;
        let labels = Vector::<i32>::from_slice(labels);

        let mut model = EigenFaceRecognizer::create(self.num_components, self.threshold)
            .map_err(|e| RecognizerError::TrainingFailed(e.to_string()))?;
        model
            .train(&mats, &labels)
            .map_err(|e| RecognizerError::TrainingFailed(e.to_string()))?;

        Ok(Box::new(EigenFaceModel { model }))
    }
}

struct EigenFaceModel {
    model: Ptr<EigenFaceRecognizer>,
}

impl FaceModel for EigenFaceModel {
    fn predict(&self, probe: &GrayImage) -> Result<Prediction, RecognizerError> {
        let mat = to_mat(probe).map_err(RecognizerError::PredictionFailed)?;
        let mut label = crate::recognizer::NO_MATCH_LABEL;
        let mut distance = 0.0f64;
        self.model
            .predict(&mat, &mut label, &mut distance)
            .map_err(|e| RecognizerError::PredictionFailed(e.to_string()))?;
        Ok(Prediction { label, distance })
    }
}
