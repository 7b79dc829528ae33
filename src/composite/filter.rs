//! Per-pixel filters applied to template layers and decorations.

use image::{Rgba, RgbaImage};
use serde::Serialize;

use crate::color::Color;

/// How color is collapsed to a single gray value.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum GrayscaleMode {
    /// `(r + g + b) / 3`.
    #[default]
    Average,
    /// `0.21 r + 0.72 g + 0.07 b`.
    Luminosity,
    /// `(max + min) / 2`.
    Lightness,
}

/// Filter discriminant, also the application order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum FilterKind {
    Grayscale,
    Invert,
    Tint,
}

/// A single visual adjustment.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Filter {
    Grayscale { mode: GrayscaleMode },
    Invert,
    /// Blend toward `color`; `alpha` 1.0 replaces the color outright.
    Tint { color: Color, alpha: f32 },
}

impl Filter {
    /// Average grayscale.
    #[must_use]
    pub const fn grayscale() -> Self {
        Self::Grayscale {
            mode: GrayscaleMode::Average,
        }
    }

    /// Full-strength tint.
    #[must_use]
    pub const fn tint(color: Color) -> Self {
        Self::Tint { color, alpha: 1.0 }
    }

    #[must_use]
    pub const fn kind(&self) -> FilterKind {
        match self {
            Self::Grayscale { .. } => FilterKind::Grayscale,
            Self::Invert => FilterKind::Invert,
            Self::Tint { .. } => FilterKind::Tint,
        }
    }

    fn apply_pixel(&self, pixel: &mut Rgba<u8>) {
        let [r, g, b, _] = pixel.0;
        let [r_out, g_out, b_out] = match *self {
            Self::Grayscale { mode } => {
                let v = gray_value(mode, r, g, b);
                [v, v, v]
            }
            Self::Invert => [255 - r, 255 - g, 255 - b],
            Self::Tint { color, alpha } => {
                let alpha = if alpha.is_finite() { alpha.clamp(0.0, 1.0) } else { 1.0 };
                [
                    mix(color.r, r, alpha),
                    mix(color.g, g, alpha),
                    mix(color.b, b, alpha),
                ]
            }
        };
        pixel.0[0] = r_out;
        pixel.0[1] = g_out;
        pixel.0[2] = b_out;
    }
}

#[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
fn gray_value(mode: GrayscaleMode, r: u8, g: u8, b: u8) -> u8 {
    match mode {
        GrayscaleMode::Average => ((u16::from(r) + u16::from(g) + u16::from(b)) / 3) as u8,
        GrayscaleMode::Luminosity => {
            let v = 0.21_f32.mul_add(f32::from(r), 0.72_f32.mul_add(f32::from(g), 0.07 * f32::from(b)));
            v.round().clamp(0.0, 255.0) as u8
        }
        GrayscaleMode::Lightness => {
            let max = r.max(g).max(b);
            let min = r.min(g).min(b);
            ((u16::from(max) + u16::from(min)) / 2) as u8
        }
    }
}

/// `over * alpha + under * (1 - alpha)`, rounded.
#[inline]
#[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
fn mix(over: u8, under: u8, alpha: f32) -> u8 {
    let v = f32::from(over).mul_add(alpha, f32::from(under) * (1.0 - alpha));
    v.round().clamp(0.0, 255.0) as u8
}

/// Ordered set of filters, at most one of each kind.
///
/// Filters always run grayscale, then invert, then tint, whatever order they
/// were added in. Transparent pixels are skipped and alpha is never changed.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
#[serde(transparent)]
pub struct FilterChain {
    filters: Vec<Filter>,
}

impl FilterChain {
    #[must_use]
    pub const fn new() -> Self {
        Self {
            filters: Vec::new(),
        }
    }

    /// Grayscale followed by a full-strength tint.
    ///
    /// The template palette has to be neutralized first; tinting the raw
    /// red/yellow pixels directly leaves hue banding.
    #[must_use]
    pub fn tinted(color: Color) -> Self {
        let mut chain = Self::new();
        chain.set(Filter::grayscale());
        chain.set(Filter::tint(color));
        chain
    }

    /// Insert `filter`, replacing any existing filter of the same kind.
    pub fn set(&mut self, filter: Filter) {
        self.filters.retain(|f| f.kind() != filter.kind());
        self.filters.push(filter);
        self.filters.sort_by_key(Filter::kind);
    }

    /// Remove the filter of `kind`, returning it if present.
    pub fn remove(&mut self, kind: FilterKind) -> Option<Filter> {
        let index = self.filters.iter().position(|f| f.kind() == kind)?;
        Some(self.filters.remove(index))
    }

    #[must_use]
    pub fn get(&self, kind: FilterKind) -> Option<&Filter> {
        self.filters.iter().find(|f| f.kind() == kind)
    }

    #[must_use]
    pub fn contains(&self, kind: FilterKind) -> bool {
        self.get(kind).is_some()
    }

    /// The tint color, if a tint filter is present.
    #[must_use]
    pub fn tint_color(&self) -> Option<Color> {
        match self.get(FilterKind::Tint) {
            Some(Filter::Tint { color, .. }) => Some(*color),
            _ => None,
        }
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.filters.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &Filter> {
        self.filters.iter()
    }

    /// Run the chain over `src`, returning a new buffer.
    #[must_use]
    pub fn apply(&self, src: &RgbaImage) -> RgbaImage {
        let mut out = src.clone();
        if self.filters.is_empty() {
            return out;
        }

        for pixel in out.pixels_mut().filter(|p| p[3] != 0) {
            for filter in &self.filters {
                filter.apply_pixel(pixel);
            }
        }

        out
    }
}
