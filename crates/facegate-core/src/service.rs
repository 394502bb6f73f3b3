//! Enrollment and recognition flows.

use crate::crop::{self, CropError};
use crate::detector::{CascadeDetector, DetectionPurpose, DetectorError, FaceLocalizer};
use crate::loader;
use crate::normalizer::{self, NormalizeError};
use crate::recognizer::{ModelTrainer, RecognitionEngine, RecognizerError};
use crate::store::{CorpusStore, StoreError};
use crate::types::{IdentityCode, InvalidIdentity, RecognitionOutcome};
use image::GrayImage;
use std::path::PathBuf;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum FlowError {
    #[error(transparent)]
    InvalidIdentity(#[from] InvalidIdentity),
    #[error(transparent)]
    Decode(#[from] NormalizeError),
    #[error("no face detected in the image")]
    NoFaceDetected,
    #[error("face detection failed: {0}")]
    Detector(#[from] DetectorError),
    #[error("face crop failed: {0}")]
    Crop(#[from] CropError),
    #[error("storage error: {0}")]
    Storage(#[from] StoreError),
    #[error("recognition failed: {0}")]
    Recognizer(#[from] RecognizerError),
}

impl FlowError {
    /// Stable machine-readable code for this failure class.
    pub fn code(&self) -> &'static str {
        match self {
            Self::InvalidIdentity(_) => "Error.InvalidIdentity",
            Self::Decode(_) => "Error.Decode",
            Self::NoFaceDetected => "Error.NoFaceDetected",
            Self::Detector(_) => "Error.Detector",
            Self::Crop(_) => "Error.Crop",
            Self::Storage(_) => "Error.Storage",
            Self::Recognizer(_) => "Error.Recognizer",
        }
    }
}

/// The enrollment and recognition pipeline over one corpus store.
///
/// Holds no per-request state, so one instance can serve concurrent requests.
pub struct FaceService<D, T> {
    localizer: FaceLocalizer<D>,
    engine: RecognitionEngine<T>,
    store: CorpusStore,
}

impl<D: CascadeDetector, T: ModelTrainer> FaceService<D, T> {
    pub fn new(detector: D, trainer: T, store: CorpusStore) -> Self {
        Self {
            localizer: FaceLocalizer::new(detector),
            engine: RecognitionEngine::new(trainer),
            store,
        }
    }

    pub fn store(&self) -> &CorpusStore {
        &self.store
    }

    /// Add one training sample for `identity` from a photo of them.
    ///
    /// Only the first detected face is enrolled. Nothing is written when no
    /// face is found.
    pub fn enroll(&self, bytes: &[u8], identity: IdentityCode) -> Result<PathBuf, FlowError> {
        let frame = normalizer::normalize(bytes)?;
        let faces = self.localizer.locate(&frame, DetectionPurpose::Enrollment)?;
        let Some(primary) = faces.first() else {
            return Err(FlowError::NoFaceDetected);
        };
        if faces.len() > 1 {
            tracing::debug!(%identity, ignored = faces.len() - 1, "enrolling first face only");
        }

        let sample = crop::extract_face(&frame, primary)?;
        let path = self.store.write(identity, &sample)?;

        tracing::info!(%identity, path = %path.display(), "enrolled face sample");
        Ok(path)
    }

    /// Identify the person in a photo against the whole enrolled corpus.
    ///
    /// Faces are matched in detector order and the last face that matches
    /// decides the outcome; a face with no match never clears an earlier one.
    pub fn recognize(&self, bytes: &[u8]) -> Result<RecognitionOutcome, FlowError> {
        if bytes.is_empty() {
            return Err(NormalizeError::Empty.into());
        }

        let held = self.store.hold_probe(bytes)?;
        let corpus = loader::load_corpus(&self.store)?;

        let frame = normalizer::normalize(bytes)?;
        let faces = self.localizer.locate(&frame, DetectionPurpose::Recognition)?;
        if faces.is_empty() {
            tracing::info!(probe = %held.display(), "no face in probe");
            return Ok(RecognitionOutcome::NoFace);
        }

        // One request-scoped model serves every face in this probe.
        let trained = self.engine.train(&corpus)?;

        let mut candidate = None;
        for rect in &faces {
            let face: GrayImage = crop::extract_face(&frame, rect)?;
            let Some(model) = &trained else {
                continue;
            };
            if let Some(identity) = model.identify(&face)? {
                candidate = Some(identity);
            }
        }

        let outcome = candidate.map_or(RecognitionOutcome::NoMatch, RecognitionOutcome::Recognized);
        tracing::info!(
            probe = %held.display(),
            faces = faces.len(),
            corpus = corpus.len(),
            %outcome,
            "recognition finished"
        );
        Ok(outcome)
    }
}
