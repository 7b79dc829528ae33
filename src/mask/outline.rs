//! The cloth print area: a semicircular arch.

use std::f32::consts::PI;

use image::{Rgba, RgbaImage};
use imageproc::drawing::draw_polygon_mut;
use imageproc::point::Point;

use crate::error::{Error, Result};
use crate::image::TRANSPARENT;

/// Segments used to approximate each arc when rasterizing.
const ARC_SEGMENTS: u32 = 96;

/// A 180 degree arch between an inner and an outer radius.
///
/// Local coordinates put the bounding box top-left at (0, 0); the arch center
/// sits at the middle of the bottom edge, so the box is `2R` x `R`.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct FanOutline {
    outer_radius: f32,
    inner_radius: f32,
}

impl Default for FanOutline {
    /// The standard 23cm fan, 280/100 units.
    fn default() -> Self {
        Self {
            outer_radius: 280.0,
            inner_radius: 100.0,
        }
    }
}

impl FanOutline {
    /// Create an arch.
    ///
    /// # Errors
    ///
    /// Returns an error unless `0 <= inner < outer`.
    pub fn new(outer_radius: f32, inner_radius: f32) -> Result<Self> {
        if !(outer_radius.is_finite() && outer_radius > 0.0) {
            return Err(Error::InvalidParameter {
                name: "outer_radius".to_string(),
                reason: "must be a positive number".to_string(),
            });
        }
        if !(inner_radius.is_finite() && (0.0..outer_radius).contains(&inner_radius)) {
            return Err(Error::InvalidParameter {
                name: "inner_radius".to_string(),
                reason: format!("must be in [0, {outer_radius})"),
            });
        }
        Ok(Self {
            outer_radius,
            inner_radius,
        })
    }

    #[must_use]
    pub const fn outer_radius(&self) -> f32 {
        self.outer_radius
    }

    #[must_use]
    pub const fn inner_radius(&self) -> f32 {
        self.inner_radius
    }

    /// Bounding box width and height.
    #[must_use]
    pub fn size(&self) -> (f32, f32) {
        (self.outer_radius * 2.0, self.outer_radius)
    }

    /// SVG path data with the arch center at the origin, drawn upwards.
    #[must_use]
    pub fn svg_path(&self) -> String {
        let (big, small) = (self.outer_radius, self.inner_radius);
        format!(
            "M -{big} 0 A {big} {big} 0 0 1 {big} 0 L {small} 0 A {small} {small} 0 0 0 -{small} 0 Z"
        )
    }

    /// Whether a local point lies inside the arch, edges included.
    #[must_use]
    pub fn contains_local(&self, x: f32, y: f32) -> bool {
        let dx = x - self.outer_radius;
        let dy = self.outer_radius - y;
        if dy < 0.0 {
            return false;
        }
        let distance_sq = dx.mul_add(dx, dy * dy);
        distance_sq <= self.outer_radius * self.outer_radius
            && distance_sq >= self.inner_radius * self.inner_radius
    }

    /// Polygon approximation in local coordinates multiplied by `scale`.
    ///
    /// Runs along the outer arc left to right, then back along the inner arc.
    #[must_use]
    pub fn polygon(&self, scale: f32) -> Vec<(f32, f32)> {
        let cx = self.outer_radius * scale;
        let cy = self.outer_radius * scale;
        let outer = self.outer_radius * scale;
        let inner = self.inner_radius * scale;

        let mut points = Vec::with_capacity(2 * (ARC_SEGMENTS as usize + 1));
        for i in 0..=ARC_SEGMENTS {
            #[allow(clippy::cast_precision_loss)]
            let theta = PI - PI * i as f32 / ARC_SEGMENTS as f32;
            points.push((outer.mul_add(theta.cos(), cx), outer.mul_add(-theta.sin(), cy)));
        }
        for i in 0..=ARC_SEGMENTS {
            #[allow(clippy::cast_precision_loss)]
            let theta = PI * i as f32 / ARC_SEGMENTS as f32;
            points.push((inner.mul_add(theta.cos(), cx), inner.mul_add(-theta.sin(), cy)));
        }
        points
    }

    /// Fill the arch at `scale` into a buffer sized to its scaled bounding box.
    #[must_use]
    #[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
    pub fn rasterize(&self, scale: f32, color: Rgba<u8>) -> RgbaImage {
        let (w, h) = self.size();
        let width = (w * scale).ceil().max(1.0) as u32;
        let height = (h * scale).ceil().max(1.0) as u32;
        let mut img = RgbaImage::from_pixel(width, height, TRANSPARENT);

        let mut points: Vec<Point<i32>> = Vec::new();
        for (x, y) in self.polygon(scale) {
            let p = Point::new(x.round() as i32, y.round() as i32);
            if points.last() != Some(&p) {
                points.push(p);
            }
        }
        while points.len() > 1 && points.first() == points.last() {
            points.pop();
        }

        if points.len() >= 3 {
            draw_polygon_mut(&mut img, &points, color);
        }

        img
    }
}
