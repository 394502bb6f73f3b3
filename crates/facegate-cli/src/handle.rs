use facegate_core::{
    CascadeDetector, FaceService, Failure, ModelTrainer, RecognitionOutcome, Reply,
};
use std::future::Future;
use std::path::Path;
use std::sync::Arc;

/// Service built from runtime-selected toolkit backends.
pub type DynFaceService = FaceService<Box<dyn CascadeDetector>, Box<dyn ModelTrainer>>;

/// Clone-safe async handle over the blocking face pipeline.
///
/// Each call runs on tokio's blocking pool, so independent requests overlap.
/// A worker that panics is reported as a `Failure` instead of unwinding into
/// the caller.
pub struct FaceHandle<D, T> {
    service: Arc<FaceService<D, T>>,
}

impl<D, T> Clone for FaceHandle<D, T> {
    fn clone(&self) -> Self {
        Self {
            service: Arc::clone(&self.service),
        }
    }
}

impl<D, T> FaceHandle<D, T>
where
    D: CascadeDetector + 'static,
    T: ModelTrainer + 'static,
{
    pub fn new(service: FaceService<D, T>) -> Self {
        Self {
            service: Arc::new(service),
        }
    }

    /// Enroll a photo for the employee code; replies with the stored sample path.
    pub async fn enroll(&self, image: Vec<u8>, employee_code: String) -> Reply<String> {
        let service = Arc::clone(&self.service);
        tokio::task::spawn_blocking(move || service.enroll_reply(&image, &employee_code))
            .await
            .unwrap_or_else(|e| Err(Failure::internal(format!("enrollment worker failed: {e}"))))
    }

    /// Recognize the person in a photo; replies with the outcome text.
    pub async fn recognize(&self, image: Vec<u8>) -> Reply<String> {
        let service = Arc::clone(&self.service);
        tokio::task::spawn_blocking(move || service.recognize_reply(&image))
            .await
            .unwrap_or_else(|e| Err(Failure::internal(format!("recognition worker failed: {e}"))))
    }

    /// Recognize the person in a photo, keeping the typed outcome.
    pub async fn recognize_outcome(&self, image: Vec<u8>) -> Reply<RecognitionOutcome> {
        let service = Arc::clone(&self.service);
        tokio::task::spawn_blocking(move || service.recognize_outcome_reply(&image))
            .await
            .unwrap_or_else(|e| Err(Failure::internal(format!("recognition worker failed: {e}"))))
    }
}

/// Read an uploaded image, giving up as soon as `cancel` resolves.
///
/// This copy is the only step that honours cancellation; once the bytes are
/// in memory the pipeline runs to completion.
pub async fn read_upload(path: &Path, cancel: impl Future<Output = ()>) -> anyhow::Result<Vec<u8>> {
    tokio::select! {
        biased;
        () = cancel => anyhow::bail!("reading {} was cancelled", path.display()),
        read = tokio::fs::read(path) => {
            let bytes = read.map_err(|e| anyhow::anyhow!("failed to read {}: {e}", path.display()))?;
            tracing::debug!(path = %path.display(), size = bytes.len(), "upload read");
            Ok(bytes)
        }
    }
}
