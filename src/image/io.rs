//! Image loading via the `image` crate.
//!
//! Available with the `image-io` feature. Detector pixel means follow the
//! BGR channel order used by Caffe-trained models, so loaders here swap the
//! decoded RGB data to BGR and keep the 0..255 range.

use crate::image::OwnedImage;
use crate::util::{FrcnnError, FrcnnResult};
use std::path::Path;

/// Converts an 8-bit RGB buffer to a BGR float image.
pub fn owned_bgr_from_rgb_image(img: &image::RgbImage) -> FrcnnResult<OwnedImage> {
    let width = img.width() as usize;
    let height = img.height() as usize;
    let data = img
        .as_raw()
        .chunks_exact(3)
        .flat_map(|p| [f32::from(p[2]), f32::from(p[1]), f32::from(p[0])])
        .collect();
    OwnedImage::new(data, width, height)
}

/// Converts any decoded image to a BGR float image.
pub fn owned_bgr_from_dynamic_image(img: &image::DynamicImage) -> FrcnnResult<OwnedImage> {
    owned_bgr_from_rgb_image(&img.to_rgb8())
}

/// Loads an image from disk as BGR floats in 0..255.
pub fn load_bgr_image<P: AsRef<Path>>(path: P) -> FrcnnResult<OwnedImage> {
    let img = image::open(path).map_err(|err| FrcnnError::ImageIo {
        reason: err.to_string(),
    })?;
    owned_bgr_from_dynamic_image(&img)
}

#[cfg(test)]
mod tests {
    use super::owned_bgr_from_rgb_image;

    #[test]
    fn swaps_to_bgr() {
        let img = image::RgbImage::from_raw(1, 1, vec![10, 20, 30]).unwrap();
        let owned = owned_bgr_from_rgb_image(&img).unwrap();
        assert_eq!(owned.data(), &[30.0, 20.0, 10.0]);
    }
}
