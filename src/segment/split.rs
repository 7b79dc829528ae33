//! Frame/background split for polymer fan templates.
//!
//! Templates paint the ribs red and the blades yellow (older assets) or black
//! and a light color (newer ones). Red-dominant and near-black pixels become
//! the frame; every other visible pixel becomes the background.

use image::{Rgba, RgbaImage};

use crate::image::{OPAQUE_BLACK, TRANSPARENT};

use super::Thresholds;

/// Class assigned to a single source pixel.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PixelClass {
    /// Below the visibility alpha; written to no buffer.
    Absent,
    /// Ribs and outline.
    Frame,
    /// Blades.
    Background,
}

/// Classify one pixel.
#[must_use]
pub fn classify_pixel(pixel: Rgba<u8>, thresholds: &Thresholds) -> PixelClass {
    let [r, g, b, a] = pixel.0;
    if !thresholds.is_visible(a) {
        return PixelClass::Absent;
    }

    let (r, g, b) = (u16::from(r), u16::from(g), u16::from(b));
    let margin = u16::from(thresholds.red_margin);

    let is_red = r > g + margin && r > b + margin;
    let is_dark = thresholds.dark_level.is_some_and(|level| {
        let level = u16::from(level);
        r < level && g < level && b < level
    });

    if is_red || is_dark {
        PixelClass::Frame
    } else {
        PixelClass::Background
    }
}

/// The three buffers derived from one template.
#[derive(Debug, Clone, PartialEq)]
pub struct SplitLayers {
    /// Frame pixels at their original color, everything else transparent.
    pub frame: RgbaImage,
    /// Background pixels at their original color, everything else transparent.
    pub background: RgbaImage,
    /// Opaque black wherever either class was written.
    pub mask: RgbaImage,
}

impl SplitLayers {
    /// Width and height shared by all three buffers.
    #[must_use]
    pub fn dimensions(&self) -> (u32, u32) {
        self.mask.dimensions()
    }

    /// Number of pixels classified as frame.
    #[must_use]
    pub fn frame_coverage(&self) -> usize {
        count_opaque(&self.frame)
    }

    /// Number of pixels classified as background.
    #[must_use]
    pub fn background_coverage(&self) -> usize {
        count_opaque(&self.background)
    }

    /// Number of pixels inside the silhouette.
    #[must_use]
    pub fn mask_coverage(&self) -> usize {
        count_opaque(&self.mask)
    }

    /// Whether nothing in the source was visible.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.mask_coverage() == 0
    }
}

fn count_opaque(img: &RgbaImage) -> usize {
    img.pixels().filter(|p| p[3] != 0).count()
}

/// Split a template into frame, background and silhouette buffers.
#[must_use]
pub fn split_layers(src: &RgbaImage, thresholds: &Thresholds) -> SplitLayers {
    let (width, height) = src.dimensions();
    let mut frame = RgbaImage::from_pixel(width, height, TRANSPARENT);
    let mut background = RgbaImage::from_pixel(width, height, TRANSPARENT);
    let mut mask = RgbaImage::from_pixel(width, height, TRANSPARENT);

    for (x, y, pixel) in src.enumerate_pixels() {
        let target = match classify_pixel(*pixel, thresholds) {
            PixelClass::Absent => continue,
            PixelClass::Frame => &mut frame,
            PixelClass::Background => &mut background,
        };
        target.put_pixel(x, y, *pixel);
        mask.put_pixel(x, y, OPAQUE_BLACK);
    }

    let layers = SplitLayers {
        frame,
        background,
        mask,
    };

    tracing::debug!(
        "Split {width}x{height} template: {} frame, {} background pixels",
        layers.frame_coverage(),
        layers.background_coverage()
    );

    layers
}

#[cfg(test)]
mod tests {
    use super::*;

    const RED: Rgba<u8> = Rgba([255, 0, 0, 255]);
    const YELLOW: Rgba<u8> = Rgba([255, 255, 0, 255]);
    const NEAR_BLACK: Rgba<u8> = Rgba([10, 10, 10, 255]);

    fn two_by_two() -> RgbaImage {
        // (x, y): (0,0) red, (0,1) yellow, (1,0) transparent, (1,1) near-black
        let mut img = RgbaImage::new(2, 2);
        img.put_pixel(0, 0, RED);
        img.put_pixel(0, 1, YELLOW);
        img.put_pixel(1, 0, TRANSPARENT);
        img.put_pixel(1, 1, NEAR_BLACK);
        img
    }

    #[test]
    fn test_two_by_two_scenario() {
        let thresholds = Thresholds {
            red_margin: 20,
            dark_level: Some(60),
            ..Thresholds::default()
        };
        let layers = split_layers(&two_by_two(), &thresholds);

        assert_eq!(*layers.frame.get_pixel(0, 0), RED);
        assert_eq!(*layers.background.get_pixel(0, 0), TRANSPARENT);

        assert_eq!(*layers.background.get_pixel(0, 1), YELLOW);
        assert_eq!(*layers.frame.get_pixel(0, 1), TRANSPARENT);

        assert_eq!(*layers.frame.get_pixel(1, 0), TRANSPARENT);
        assert_eq!(*layers.background.get_pixel(1, 0), TRANSPARENT);

        assert_eq!(*layers.frame.get_pixel(1, 1), NEAR_BLACK);
        assert_eq!(*layers.background.get_pixel(1, 1), TRANSPARENT);

        assert_eq!(*layers.mask.get_pixel(0, 0), OPAQUE_BLACK);
        assert_eq!(*layers.mask.get_pixel(0, 1), OPAQUE_BLACK);
        assert_eq!(*layers.mask.get_pixel(1, 1), OPAQUE_BLACK);
        assert_eq!(*layers.mask.get_pixel(1, 0), TRANSPARENT);
    }

    #[test]
    fn test_classes_are_disjoint_and_cover_visible_pixels() {
        let thresholds = Thresholds::default();
        let mut src = RgbaImage::new(16, 16);
        for (x, y, p) in src.enumerate_pixels_mut() {
            #[allow(clippy::cast_possible_truncation)]
            let v = |k: u32| ((x * 37 + y * 11 + k * 53) % 256) as u8;
            *p = Rgba([v(0), v(1), v(2), v(3)]);
        }

        let layers = split_layers(&src, &thresholds);

        for (x, y, p) in src.enumerate_pixels() {
            let in_frame = layers.frame.get_pixel(x, y)[3] != 0;
            let in_background = layers.background.get_pixel(x, y)[3] != 0;
            let in_mask = layers.mask.get_pixel(x, y)[3] != 0;

            assert!(!(in_frame && in_background), "({x},{y}) in both classes");
            assert_eq!(in_frame || in_background, thresholds.is_visible(p[3]));
            assert_eq!(in_mask, thresholds.is_visible(p[3]));
        }
    }

    #[test]
    fn test_red_margin_is_strict() {
        let t = Thresholds {
            dark_level: None,
            ..Thresholds::default()
        };
        assert_eq!(classify_pixel(Rgba([120, 100, 100, 255]), &t), PixelClass::Background);
        assert_eq!(classify_pixel(Rgba([121, 100, 100, 255]), &t), PixelClass::Frame);
        // must beat blue as well
        assert_eq!(classify_pixel(Rgba([200, 0, 190, 255]), &t), PixelClass::Background);
    }

    #[test]
    fn test_margin_does_not_overflow() {
        let t = Thresholds {
            red_margin: 250,
            dark_level: None,
            ..Thresholds::default()
        };
        assert_eq!(classify_pixel(Rgba([255, 10, 10, 255]), &t), PixelClass::Background);
        assert_eq!(classify_pixel(Rgba([255, 4, 4, 255]), &t), PixelClass::Frame);
    }

    #[test]
    fn test_dark_rule_can_be_disabled() {
        let with_dark = Thresholds::default();
        let without = Thresholds {
            dark_level: None,
            ..Thresholds::default()
        };
        assert_eq!(classify_pixel(NEAR_BLACK, &with_dark), PixelClass::Frame);
        assert_eq!(classify_pixel(NEAR_BLACK, &without), PixelClass::Background);
        assert_eq!(classify_pixel(Rgba([60, 10, 10, 255]), &without), PixelClass::Frame);
    }

    #[test]
    fn test_alpha_boundary() {
        let t = Thresholds::default();
        assert_eq!(classify_pixel(Rgba([255, 0, 0, 49]), &t), PixelClass::Absent);
        assert_eq!(classify_pixel(Rgba([255, 0, 0, 50]), &t), PixelClass::Frame);
    }

    #[test]
    fn test_fully_transparent_source_is_empty() {
        let src = RgbaImage::new(4, 3);
        let layers = split_layers(&src, &Thresholds::default());

        assert!(layers.is_empty());
        assert_eq!(layers.dimensions(), (4, 3));
        assert_eq!(layers.frame_coverage(), 0);
        assert_eq!(layers.background_coverage(), 0);
    }
}
