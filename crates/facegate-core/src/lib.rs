//! facegate-core — Face enrollment and recognition pipeline.
//!
//! Normalizes uploaded photos, localizes faces with a cascade detector,
//! keeps a per-employee corpus of canonical face crops on disk and matches
//! probes against a freshly trained eigenface model on every request.

pub mod crop;
pub mod detector;
pub mod loader;
pub mod normalizer;
#[cfg(feature = "opencv")]
pub mod opencv_backend;
pub mod recognizer;
pub mod reply;
pub mod service;
pub mod store;
pub mod types;

#[cfg(test)]
mod testing;

pub use detector::{CascadeDetector, DetectionParams, DetectionPurpose, DetectorError};
pub use loader::Corpus;
pub use recognizer::{FaceModel, ModelTrainer, Prediction, RecognizerError};
pub use reply::{Failure, Reply};
pub use service::{FaceService, FlowError};
pub use store::{CorpusStore, IdentityDir, StoreError};
pub use types::{FaceRect, IdentityCode, RecognitionOutcome};
