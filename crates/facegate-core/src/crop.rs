//! Face crop extraction to the canonical face size.

use crate::normalizer::CUBIC;
use crate::types::FaceRect;
use image::GrayImage;
use thiserror::Error;

/// Every enrolled sample and every probe face is resized to this square.
pub const FACE_SIZE: u32 = 100;

#[derive(Error, Debug)]
pub enum CropError {
    #[error("face box {rect:?} lies outside the {width}x{height} image")]
    OutOfBounds {
        rect: FaceRect,
        width: u32,
        height: u32,
    },
}

/// Crop `rect` out of `image` and resize it to `FACE_SIZE × FACE_SIZE`.
pub fn extract_face(image: &GrayImage, rect: &FaceRect) -> Result<GrayImage, CropError> {
    let (width, height) = image.dimensions();
    if !rect.fits_within(width, height) {
        return Err(CropError::OutOfBounds {
            rect: *rect,
            width,
            height,
        });
    }

    let region =
        image::imageops::crop_imm(image, rect.x, rect.y, rect.width, rect.height).to_image();
    Ok(image::imageops::resize(&region, FACE_SIZE, FACE_SIZE, CUBIC))
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::Luma;

    #[test]
    fn test_extract_face_is_canonical_size() {
        let frame = GrayImage::from_fn(320, 240, |x, y| Luma([((x + y) % 256) as u8]));
        for rect in [
            FaceRect::new(0, 0, 20, 20),
            FaceRect::new(100, 50, 150, 120),
            FaceRect::new(0, 0, 320, 240),
        ] {
            let face = extract_face(&frame, &rect).unwrap();
            assert_eq!(face.dimensions(), (FACE_SIZE, FACE_SIZE));
        }
    }

    #[test]
    fn test_extract_face_takes_pixels_from_the_box() {
        // Left half black, right half white: a box in the right half yields a white face.
        let frame = GrayImage::from_fn(320, 240, |x, _| Luma([if x < 160 { 0 } else { 255 }]));
        let face = extract_face(&frame, &FaceRect::new(200, 40, 60, 60)).unwrap();
        assert!(face.pixels().all(|p| p.0[0] == 255));
    }

    #[test]
    fn test_extract_face_is_deterministic() {
        let frame = GrayImage::from_fn(320, 240, |x, y| Luma([((x * 3 + y * 7) % 256) as u8]));
        let rect = FaceRect::new(40, 30, 90, 90);
        let a = extract_face(&frame, &rect).unwrap();
        let b = extract_face(&frame, &rect).unwrap();
        assert_eq!(a, b);
    }

    #[test]
    fn test_extract_face_rejects_out_of_bounds() {
        let frame = GrayImage::new(320, 240);
        let err = extract_face(&frame, &FaceRect::new(300, 200, 40, 40)).unwrap_err();
        assert!(matches!(err, CropError::OutOfBounds { width: 320, height: 240, .. }));
    }

    #[test]
    fn test_extract_face_rejects_empty_box() {
        let frame = GrayImage::new(320, 240);
        assert!(extract_face(&frame, &FaceRect::new(10, 10, 0, 0)).is_err());
    }
}
