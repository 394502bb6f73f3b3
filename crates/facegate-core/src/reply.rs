//! Tagged replies handed to the transport layer.
//!
//! Every flow failure is flattened into a `Failure` with a stable code and a
//! single human-readable message. A `Failure` always carries both.

use crate::detector::CascadeDetector;
use crate::recognizer::ModelTrainer;
use crate::service::{FaceService, FlowError};
use crate::types::{IdentityCode, RecognitionOutcome};
use std::fmt;

const INTERNAL_CODE: &str = "Error.Internal";

pub type Reply<T> = Result<T, Failure>;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Failure {
    code: &'static str,
    message: String,
}

impl Failure {
    fn new(code: &'static str, message: String) -> Self {
        let message = if message.trim().is_empty() {
            format!("request failed ({code})")
        } else {
            message
        };
        Self { code, message }
    }

    /// Wrap a flow error with the name of the step that failed.
    pub fn from_flow(context: &str, err: &FlowError) -> Self {
        Self::new(err.code(), format!("{context}: {err}"))
    }

    /// A failure outside the pipeline itself, e.g. a worker that panicked.
    pub fn internal(message: impl fmt::Display) -> Self {
        Self::new(INTERNAL_CODE, message.to_string())
    }

    pub fn code(&self) -> &str {
        self.code
    }

    pub fn message(&self) -> &str {
        &self.message
    }
}

impl fmt::Display for Failure {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.message)
    }
}

impl std::error::Error for Failure {}

impl<D: CascadeDetector, T: ModelTrainer> FaceService<D, T> {
    /// Enroll from an uploaded photo and a textual employee code.
    ///
    /// Replies with the stored sample path.
    pub fn enroll_reply(&self, bytes: &[u8], employee_code: &str) -> Reply<String> {
        employee_code
            .parse::<IdentityCode>()
            .map_err(FlowError::from)
            .and_then(|identity| self.enroll(bytes, identity))
            .map(|path| path.display().to_string())
            .map_err(|err| {
                tracing::warn!(employee_code, code = err.code(), error = %err, "enrollment failed");
                Failure::from_flow("error saving image", &err)
            })
    }

    /// Recognize the person in an uploaded photo.
    ///
    /// "No recognized faces" is a successful reply, not a failure.
    pub fn recognize_reply(&self, bytes: &[u8]) -> Reply<String> {
        self.recognize_outcome_reply(bytes).map(|outcome| outcome.to_string())
    }

    /// Like [`recognize_reply`](Self::recognize_reply), keeping the typed
    /// outcome so callers can tell `NoFace` from `NoMatch`.
    pub fn recognize_outcome_reply(&self, bytes: &[u8]) -> Reply<RecognitionOutcome> {
        self.recognize(bytes).map_err(|err| {
            tracing::warn!(code = err.code(), error = %err, "recognition failed");
            Failure::from_flow("error during face detection", &err)
        })
    }
}
