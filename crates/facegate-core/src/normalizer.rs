//! Image normalization: decode arbitrary raster bytes into a fixed-size luma frame.

use image::imageops::FilterType;
use image::GrayImage;
use thiserror::Error;

/// Canonical working resolution every uploaded photo is rescaled to.
pub const WORKING_WIDTH: u32 = 320;
pub const WORKING_HEIGHT: u32 = 240;

/// Cubic interpolation keeps the facial gradients the cascade relies on.
pub(crate) const CUBIC: FilterType = FilterType::CatmullRom;

#[derive(Error, Debug)]
pub enum NormalizeError {
    #[error("image is empty")]
    Empty,
    #[error("unreadable image: {0}")]
    Decode(#[from] image::ImageError),
}

/// Decode `bytes`, convert to single-channel intensity and rescale to the working resolution.
pub fn normalize(bytes: &[u8]) -> Result<GrayImage, NormalizeError> {
    if bytes.is_empty() {
        return Err(NormalizeError::Empty);
    }

    let decoded = image::load_from_memory(bytes)?;
    let gray = decoded.to_luma8();

    tracing::trace!(
        width = gray.width(),
        height = gray.height(),
        "decoded image, rescaling to working resolution"
    );

    Ok(image::imageops::resize(
        &gray,
        WORKING_WIDTH,
        WORKING_HEIGHT,
        CUBIC,
    ))
}
