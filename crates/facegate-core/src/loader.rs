//! Materializes the on-disk corpus as index-aligned (image, label) sequences.

use crate::store::{CorpusStore, StoreError};
use crate::types::IdentityCode;
use image::GrayImage;

/// Every enrolled face sample paired with the identity that owns it.
#[derive(Debug, Clone, Default)]
pub struct Corpus {
    images: Vec<GrayImage>,
    labels: Vec<IdentityCode>,
}

impl Corpus {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, image: GrayImage, label: IdentityCode) {
        self.images.push(image);
        self.labels.push(label);
    }

    pub fn images(&self) -> &[GrayImage] {
        &self.images
    }

    pub fn labels(&self) -> &[IdentityCode] {
        &self.labels
    }

    pub fn len(&self) -> usize {
        self.images.len()
    }

    pub fn is_empty(&self) -> bool {
        self.images.is_empty()
    }
}

/// Load every sample in directory-then-file order.
///
/// A sample that cannot be decoded is skipped so one damaged file does not
/// take down recognition for everyone.
pub fn load_corpus(store: &CorpusStore) -> Result<Corpus, StoreError> {
    let mut corpus = Corpus::new();

    for dir in store.list_identity_directories()? {
        for path in store.list_samples(&dir)? {
            match image::open(&path) {
                Ok(img) => corpus.push(img.to_luma8(), dir.identity),
                Err(e) => {
                    tracing::warn!(path = %path.display(), error = %e, "skipping unreadable face sample");
                }
            }
        }
    }

    tracing::debug!(samples = corpus.len(), "loaded corpus");
    Ok(corpus)
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::Luma;

    fn sample(value: u8) -> GrayImage {
        GrayImage::from_pixel(100, 100, Luma([value]))
    }

    #[test]
    fn test_load_empty_store() {
        let tmp = tempfile::tempdir().unwrap();
        let corpus = load_corpus(&CorpusStore::open(tmp.path())).unwrap();
        assert!(corpus.is_empty());
        assert_eq!(corpus.labels().len(), 0);
    }

    #[test]
    fn test_load_labels_align_with_images() {
        let tmp = tempfile::tempdir().unwrap();
        let store = CorpusStore::open(tmp.path());
        store.write(IdentityCode::new(20), &sample(200)).unwrap();
        store.write(IdentityCode::new(10), &sample(100)).unwrap();
        store.write(IdentityCode::new(10), &sample(100)).unwrap();

        let corpus = load_corpus(&store).unwrap();

        assert_eq!(corpus.len(), 3);
        assert_eq!(corpus.images().len(), corpus.labels().len());
        let labels: Vec<u16> = corpus.labels().iter().map(|l| l.get()).collect();
        assert_eq!(labels, vec![10, 10, 20]);
        for (img, label) in corpus.images().iter().zip(corpus.labels()) {
            let expected = if label.get() == 10 { 100 } else { 200 };
            assert!(img.pixels().all(|p| p.0[0] == expected));
        }
    }

    #[test]
    fn test_empty_identity_dir_contributes_nothing() {
        let tmp = tempfile::tempdir().unwrap();
        std::fs::create_dir(tmp.path().join("77")).unwrap();
        let store = CorpusStore::open(tmp.path());
        store.write(IdentityCode::new(5), &sample(1)).unwrap();

        let corpus = load_corpus(&store).unwrap();
        assert_eq!(corpus.labels(), &[IdentityCode::new(5)]);
    }

    #[test]
    fn test_unreadable_sample_is_skipped() {
        let tmp = tempfile::tempdir().unwrap();
        let store = CorpusStore::open(tmp.path());
        store.write(IdentityCode::new(5), &sample(1)).unwrap();
        std::fs::write(tmp.path().join("5").join("broken.bmp"), b"not a bitmap").unwrap();

        let corpus = load_corpus(&store).unwrap();
        assert_eq!(corpus.len(), 1);
    }

    #[test]
    fn test_probe_snapshots_are_not_training_data() {
        let tmp = tempfile::tempdir().unwrap();
        let store = CorpusStore::open(tmp.path());
        let mut bmp = Vec::new();
        sample(9)
            .write_to(&mut std::io::Cursor::new(&mut bmp), image::ImageFormat::Bmp)
            .unwrap();
        store.hold_probe(&bmp).unwrap();

        assert!(load_corpus(&store).unwrap().is_empty());
    }
}
