use facegate_core::{CorpusStore, IdentityCode, StoreError};
use serde::Serialize;

/// Enrolled samples per identity.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct IdentitySummary {
    pub identity: IdentityCode,
    pub samples: usize,
}

/// Count the enrolled samples of every identity, in store order.
pub fn summarize(store: &CorpusStore) -> Result<Vec<IdentitySummary>, StoreError> {
    store
        .list_identity_directories()?
        .into_iter()
        .map(|dir| -> Result<IdentitySummary, StoreError> {
            Ok(IdentitySummary {
                identity: dir.identity,
                samples: store.list_samples(&dir)?.len(),
            })
        })
        .collect()
}
