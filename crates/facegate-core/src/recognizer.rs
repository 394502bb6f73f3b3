//! Eigenface recognition orchestration.
//!
//! The vision toolkit trains a model over positional labels `0..n-1`; the
//! semantic identity is recovered afterwards by indexing into the corpus
//! labels. Models live for one request only.

use crate::loader::Corpus;
use crate::types::IdentityCode;
use image::GrayImage;
use thiserror::Error;

/// Label a model reports when no training sample is close enough.
pub const NO_MATCH_LABEL: i32 = -1;

#[derive(Error, Debug)]
pub enum RecognizerError {
    #[error("training failed: {0}")]
    TrainingFailed(String),
    #[error("prediction failed: {0}")]
    PredictionFailed(String),
    #[error("model predicted label {label} but only {samples} samples were trained")]
    InvalidPrediction { label: i32, samples: usize },
    #[error("corpus of {0} samples exceeds the model's label range")]
    TooManySamples(usize),
}

/// Raw answer from a trained model.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Prediction {
    /// Positional label of the closest sample, or a negative sentinel.
    pub label: i32,
    /// Distance to that sample; lower is closer.
    pub distance: f64,
}

impl Prediction {
    /// Positional index of the match, `None` for the no-match sentinel.
    pub fn index(&self) -> Option<usize> {
        usize::try_from(self.label).ok()
    }
}

/// A trained face model.
pub trait FaceModel {
    fn predict(&self, probe: &GrayImage) -> Result<Prediction, RecognizerError>;
}

/// Builds face models from labeled samples.
pub trait ModelTrainer: Send + Sync {
    fn train(
        &self,
        images: &[GrayImage],
        labels: &[i32],
    ) -> Result<Box<dyn FaceModel>, RecognizerError>;
}

impl<T: ModelTrainer + ?Sized> ModelTrainer for Box<T> {
    fn train(
        &self,
        images: &[GrayImage],
        labels: &[i32],
    ) -> Result<Box<dyn FaceModel>, RecognizerError> {
        (**self).train(images, labels)
    }
}

impl<T: ModelTrainer + ?Sized> ModelTrainer for &T {
    fn train(
        &self,
        images: &[GrayImage],
        labels: &[i32],
    ) -> Result<Box<dyn FaceModel>, RecognizerError> {
        (**self).train(images, labels)
    }
}

/// A model trained on one corpus snapshot, borrowing that snapshot's labels.
pub struct TrainedCorpus<'c> {
    model: Box<dyn FaceModel>,
    labels: &'c [IdentityCode],
}

impl TrainedCorpus<'_> {
    /// Identity of the closest enrolled sample, or `None` when the model reports no match.
    pub fn identify(&self, probe: &GrayImage) -> Result<Option<IdentityCode>, RecognizerError> {
        let prediction = self.model.predict(probe)?;
        let Some(index) = prediction.index() else {
            tracing::debug!(distance = prediction.distance, "no match");
            return Ok(None);
        };

        let identity = self
            .labels
            .get(index)
            .copied()
            .ok_or(RecognizerError::InvalidPrediction {
                label: prediction.label,
                samples: self.labels.len(),
            })?;

        tracing::debug!(%identity, index, distance = prediction.distance, "matched");
        Ok(Some(identity))
    }
}

pub struct RecognitionEngine<T> {
    trainer: T,
}

impl<T: ModelTrainer> RecognitionEngine<T> {
    pub fn new(trainer: T) -> Self {
        Self { trainer }
    }

    /// Train a fresh model over the corpus. Returns `None` for an empty corpus
    /// without touching the trainer, since a model cannot be built from zero samples.
    pub fn train<'c>(
        &self,
        corpus: &'c Corpus,
    ) -> Result<Option<TrainedCorpus<'c>>, RecognizerError> {
        if corpus.is_empty() {
            return Ok(None);
        }

        let count = corpus.len();
        let last = i32::try_from(count).map_err(|_| RecognizerError::TooManySamples(count))?;
        let positional: Vec<i32> = (0..last).collect();

        let model = self.trainer.train(corpus.images(), &positional)?;
        tracing::debug!(samples = count, "trained eigenface model");

        Ok(Some(TrainedCorpus {
            model,
            labels: corpus.labels(),
        }))
    }

    /// Train over `corpus` and identify `probe` in one step.
    pub fn recognize(
        &self,
        corpus: &Corpus,
        probe: &GrayImage,
    ) -> Result<Option<IdentityCode>, RecognizerError> {
        match self.train(corpus)? {
            Some(trained) => trained.identify(probe),
            None => Ok(None),
        }
    }
}
