//! White background removal for uploaded artwork.

use image::RgbaImage;

use super::Thresholds;

/// Summary of a white-removal pass.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct WhiteRemoval {
    /// Visible pixels that were made transparent.
    pub cleared: u64,
    /// Visible pixels that were kept.
    pub kept: u64,
}

/// Make near-white pixels transparent, returning a new buffer.
///
/// A visible pixel whose R, G and B are all above `white_level` gets alpha 0;
/// every other pixel is copied unchanged. Pixels below the visibility alpha
/// are left as they are. The transform is lossy: the cleared pixels keep
/// their color but lose their alpha for good.
#[must_use]
pub fn remove_white_background(src: &RgbaImage, thresholds: &Thresholds) -> (RgbaImage, WhiteRemoval) {
    let mut out = src.clone();
    let report = remove_white_background_in_place(&mut out, thresholds);
    (out, report)
}

/// In-place variant of [`remove_white_background`].
pub fn remove_white_background_in_place(img: &mut RgbaImage, thresholds: &Thresholds) -> WhiteRemoval {
    let level = thresholds.white_level;
    let mut report = WhiteRemoval::default();

    for pixel in img.pixels_mut() {
        let [r, g, b, a] = pixel.0;
        if !thresholds.is_visible(a) {
            continue;
        }

        if r > level && g > level && b > level {
            pixel.0[3] = 0;
            report.cleared += 1;
        } else {
            report.kept += 1;
        }
    }

    report
}
