//! In-process stand-ins for the vision toolkit, used by unit tests.

use crate::detector::{CascadeDetector, DetectionParams, DetectorError};
use crate::recognizer::{FaceModel, ModelTrainer, Prediction, RecognizerError, NO_MATCH_LABEL};
use crate::types::FaceRect;
use image::GrayImage;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Mutex;

/// Reports the same rectangles for every image, honouring the minimum-size filter.
pub(crate) struct ScriptedDetector {
    faces: Vec<FaceRect>,
    seen: Mutex<Vec<DetectionParams>>,
}

impl ScriptedDetector {
    pub(crate) fn new(faces: Vec<FaceRect>) -> Self {
        Self {
            faces,
            seen: Mutex::new(Vec::new()),
        }
    }

    pub(crate) fn seen_params(&self) -> Vec<DetectionParams> {
        self.seen.lock().unwrap().clone()
    }
}

impl CascadeDetector for ScriptedDetector {
    fn detect_multi_scale(
        &self,
        _image: &GrayImage,
        params: &DetectionParams,
    ) -> Result<Vec<FaceRect>, DetectorError> {
        self.seen.lock().unwrap().push(*params);
        Ok(self
            .faces
            .iter()
            .filter(|f| match params.min_size {
                Some((w, h)) => f.width >= w && f.height >= h,
                None => true,
            })
            .copied()
            .collect())
    }
}

pub(crate) struct BrokenDetector;

impl CascadeDetector for BrokenDetector {
    fn detect_multi_scale(
        &self,
        _image: &GrayImage,
        _params: &DetectionParams,
    ) -> Result<Vec<FaceRect>, DetectorError> {
        Err(DetectorError::DetectionFailed("cascade not loaded".into()))
    }
}

/// Nearest neighbour on root-mean-square pixel distance, with an optional cut-off.
pub(crate) struct NearestTrainer {
    threshold: f64,
    calls: AtomicUsize,
    last_labels: Mutex<Vec<i32>>,
}

impl NearestTrainer {
    pub(crate) fn unlimited() -> Self {
        Self::with_threshold(f64::MAX)
    }

    pub(crate) fn with_threshold(threshold: f64) -> Self {
        Self {
            threshold,
            calls: AtomicUsize::new(0),
            last_labels: Mutex::new(Vec::new()),
        }
    }

    pub(crate) fn train_calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }

    pub(crate) fn last_labels(&self) -> Vec<i32> {
        self.last_labels.lock().unwrap().clone()
    }
}

impl ModelTrainer for NearestTrainer {
    fn train(
        &self,
        images: &[GrayImage],
        labels: &[i32],
    ) -> Result<Box<dyn FaceModel>, RecognizerError> {
        if images.len() != labels.len() {
            return Err(RecognizerError::TrainingFailed(format!(
                "{} images but {} labels",
                images.len(),
                labels.len()
            )));
        }
        self.calls.fetch_add(1, Ordering::SeqCst);
        *self.last_labels.lock().unwrap() = labels.to_vec();
        Ok(Box::new(NearestModel {
            samples: images.iter().cloned().zip(labels.iter().copied()).collect(),
            threshold: self.threshold,
        }))
    }
}

struct NearestModel {
    samples: Vec<(GrayImage, i32)>,
    threshold: f64,
}

impl FaceModel for NearestModel {
    fn predict(&self, probe: &GrayImage) -> Result<Prediction, RecognizerError> {
        let mut best = Prediction {
            label: NO_MATCH_LABEL,
            distance: f64::MAX,
        };
        for (image, label) in &self.samples {
            let distance = rms_distance(image, probe)?;
            if distance < best.distance {
                best = Prediction {
                    label: *label,
                    distance,
                };
            }
        }
        if best.distance > self.threshold {
            best.label = NO_MATCH_LABEL;
        }
        Ok(best)
    }
}

fn rms_distance(a: &GrayImage, b: &GrayImage) -> Result<f64, RecognizerError> {
    if a.dimensions() != b.dimensions() {
        return Err(RecognizerError::PredictionFailed(format!(
            "probe is {:?}, samples are {:?}",
            b.dimensions(),
            a.dimensions()
        )));
    }
    let sum: f64 = a
        .as_raw()
        .iter()
        .zip(b.as_raw())
        .map(|(&x, &y)| (f64::from(x) - f64::from(y)).powi(2))
        .sum();
    Ok((sum / a.as_raw().len() as f64).sqrt())
}
