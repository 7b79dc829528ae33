//! Placement math and placed, tinted template layers.

use std::sync::Arc;

use image::RgbaImage;
use serde::Serialize;

use crate::color::Color;

use super::filter::FilterChain;

/// Which fan product a session edits.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum FanKind {
    /// Printed fabric on a vector arch outline.
    Cloth,
    /// Molded polymer described by a two-color PNG template.
    Polymer,
}

impl FanKind {
    /// Fraction of the canvas the fan may occupy on its tighter axis.
    #[must_use]
    pub const fn margin_factor(self) -> f32 {
        match self {
            Self::Cloth => 0.9,
            Self::Polymer => 0.75,
        }
    }
}

/// Uniform scale fitting a `width` x `height` object into `margin` of the canvas.
///
/// Zero-sized objects are treated as 1x1 so the result is always finite.
#[must_use]
pub fn fit_scale(canvas_width: f32, canvas_height: f32, width: f32, height: f32, margin: f32) -> f32 {
    let width = width.max(1.0);
    let height = height.max(1.0);
    let scale_x = canvas_width * margin / width;
    let scale_y = canvas_height * margin / height;
    scale_x.min(scale_y)
}

/// Anchor of an object relative to its `left`/`top` position.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Origin {
    /// Horizontal and vertical center.
    #[default]
    Center,
    /// Horizontal center, bottom edge.
    CenterBottom,
}

/// Position and scale of an object in canvas coordinates.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct Transform {
    pub left: f32,
    pub top: f32,
    pub scale_x: f32,
    pub scale_y: f32,
    pub origin: Origin,
}

impl Default for Transform {
    fn default() -> Self {
        Self {
            left: 0.0,
            top: 0.0,
            scale_x: 1.0,
            scale_y: 1.0,
            origin: Origin::Center,
        }
    }
}

impl Transform {
    /// Centered at (`left`, `top`) with a uniform scale.
    #[must_use]
    pub const fn centered(left: f32, top: f32, scale: f32) -> Self {
        Self {
            left,
            top,
            scale_x: scale,
            scale_y: scale,
            origin: Origin::Center,
        }
    }

    /// Bottom-center anchored at (`left`, `top`) with a uniform scale.
    #[must_use]
    pub const fn anchored_bottom(left: f32, top: f32, scale: f32) -> Self {
        Self {
            left,
            top,
            scale_x: scale,
            scale_y: scale,
            origin: Origin::CenterBottom,
        }
    }

    /// Whether both axes share one scale factor.
    #[must_use]
    pub fn is_uniform(&self) -> bool {
        (self.scale_x - self.scale_y).abs() <= f32::EPSILON * self.scale_x.abs().max(1.0)
    }

    /// Canvas position of the top-left corner of a `width` x `height` object.
    #[must_use]
    pub fn top_left(&self, width: f32, height: f32) -> (f32, f32) {
        let scaled_w = width * self.scale_x;
        let scaled_h = height * self.scale_y;
        match self.origin {
            Origin::Center => (self.left - scaled_w / 2.0, self.top - scaled_h / 2.0),
            Origin::CenterBottom => (self.left - scaled_w / 2.0, self.top - scaled_h),
        }
    }

    /// Map a canvas point into the object's unscaled local space.
    ///
    /// Local (0, 0) is the top-left of the object's bounding box.
    #[must_use]
    pub fn to_local(&self, x: f32, y: f32, width: f32, height: f32) -> (f32, f32) {
        let (x0, y0) = self.top_left(width, height);
        (
            (x - x0) / self.scale_x.max(f32::MIN_POSITIVE),
            (y - y0) / self.scale_y.max(f32::MIN_POSITIVE),
        )
    }

    /// Field-wise comparison within `tolerance`.
    #[must_use]
    pub fn approx_eq(&self, other: &Self, tolerance: f32) -> bool {
        self.origin == other.origin
            && (self.left - other.left).abs() <= tolerance
            && (self.top - other.top).abs() <= tolerance
            && (self.scale_x - other.scale_x).abs() <= tolerance
            && (self.scale_y - other.scale_y).abs() <= tolerance
    }
}

/// Role of a template layer in the stack.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum LayerRole {
    /// Blades, drawn beneath decorations.
    Background,
    /// Ribs, drawn above decorations.
    Frame,
}

/// A classified layer bound to a transform and a filter chain.
///
/// The classified pixels are shared and never modified; `rendered` is
/// recomputed from them whenever the filters change.
#[derive(Debug, Clone)]
pub struct PlacedLayer {
    role: LayerRole,
    source: Arc<RgbaImage>,
    transform: Transform,
    filters: FilterChain,
    rendered: RgbaImage,
}

impl PlacedLayer {
    /// Place `source` and tint it with `color`.
    #[must_use]
    pub fn new(role: LayerRole, source: Arc<RgbaImage>, transform: Transform, color: Color) -> Self {
        let filters = FilterChain::tinted(color);
        let rendered = filters.apply(&source);
        Self {
            role,
            source,
            transform,
            filters,
            rendered,
        }
    }

    #[must_use]
    pub const fn role(&self) -> LayerRole {
        self.role
    }

    /// The classified pixels this layer was built from.
    #[must_use]
    pub fn source(&self) -> &RgbaImage {
        &self.source
    }

    /// Pixels after the filter chain.
    #[must_use]
    pub const fn rendered(&self) -> &RgbaImage {
        &self.rendered
    }

    #[must_use]
    pub const fn transform(&self) -> &Transform {
        &self.transform
    }

    #[must_use]
    pub const fn filters(&self) -> &FilterChain {
        &self.filters
    }

    /// Unscaled width and height.
    #[must_use]
    #[allow(clippy::cast_precision_loss)]
    pub fn natural_size(&self) -> (f32, f32) {
        let (w, h) = self.source.dimensions();
        (w as f32, h as f32)
    }

    /// Current tint color.
    #[must_use]
    pub fn color(&self) -> Option<Color> {
        self.filters.tint_color()
    }

    /// Recolor as grayscale + tint. Returns `false` if the color was already applied.
    pub fn retint(&mut self, color: Color) -> bool {
        let filters = FilterChain::tinted(color);
        if filters == self.filters {
            return false;
        }
        self.set_filters(filters);
        true
    }

    /// Replace the filter chain and re-render from the classified pixels.
    pub fn set_filters(&mut self, filters: FilterChain) {
        self.rendered = filters.apply(&self.source);
        self.filters = filters;
    }

    pub fn place(&mut self, transform: Transform) {
        self.transform = transform;
    }
}
