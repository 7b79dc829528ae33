//! Clip regions that keep decorations inside the fan.

use std::sync::Arc;

use image::RgbaImage;

use crate::composite::Transform;

use super::FanOutline;

/// The shape a clip region cuts to.
#[derive(Debug, Clone)]
pub enum ClipShape {
    /// Cloth fans clip to the vector arch.
    Outline(FanOutline),
    /// Polymer fans clip to the template's silhouette mask.
    Silhouette(Arc<RgbaImage>),
}

impl ClipShape {
    /// Unscaled bounding box.
    #[must_use]
    #[allow(clippy::cast_precision_loss)]
    pub fn size(&self) -> (f32, f32) {
        match self {
            Self::Outline(outline) => outline.size(),
            Self::Silhouette(mask) => (mask.width() as f32, mask.height() as f32),
        }
    }

    /// Whether a local point is inside the shape.
    #[must_use]
    #[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
    pub fn contains_local(&self, x: f32, y: f32) -> bool {
        match self {
            Self::Outline(outline) => outline.contains_local(x, y),
            Self::Silhouette(mask) => {
                if x < 0.0 || y < 0.0 {
                    return false;
                }
                let (px, py) = (x.floor() as u32, y.floor() as u32);
                px < mask.width() && py < mask.height() && mask.get_pixel(px, py)[3] != 0
            }
        }
    }
}

/// A clip shape positioned absolutely in canvas space.
///
/// The transform is independent of the decoration carrying the region, so
/// moving or scaling the decoration never moves the clip window.
#[derive(Debug, Clone)]
pub struct ClipRegion {
    pub shape: ClipShape,
    pub transform: Transform,
}

impl ClipRegion {
    #[must_use]
    pub const fn new(shape: ClipShape, transform: Transform) -> Self {
        Self { shape, transform }
    }

    /// Whether the canvas point (`x`, `y`) is visible through the region.
    #[must_use]
    pub fn covers(&self, x: f32, y: f32) -> bool {
        let (w, h) = self.shape.size();
        let (lx, ly) = self.transform.to_local(x, y, w, h);
        self.shape.contains_local(lx, ly)
    }
}
