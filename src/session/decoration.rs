//! User-placed text and images.

use std::fmt;
use std::sync::Arc;

use image::RgbaImage;
use serde::Serialize;

use crate::color::Color;
use crate::composite::{FilterChain, Transform};
use crate::mask::ClipRegion;

/// Font used for new text.
pub const DEFAULT_FONT_FAMILY: &str = "Arial";

/// Font size used for new text.
pub const DEFAULT_FONT_SIZE: f32 = 40.0;

/// Uploaded images wider than this are scaled down to it.
pub const UPLOAD_MAX_WIDTH: f32 = 300.0;

/// Generated images wider than this are scaled down to it.
pub const GENERATED_MAX_WIDTH: f32 = 400.0;

/// Stable identifier of a decoration within its session.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
#[serde(transparent)]
pub struct DecorationId(pub(crate) u64);

impl DecorationId {
    #[must_use]
    pub const fn get(self) -> u64 {
        self.0
    }
}

impl fmt::Display for DecorationId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// A line of text. Rasterizing it is the canvas collaborator's job.
#[derive(Debug, Clone, PartialEq)]
pub struct TextDecoration {
    pub content: String,
    pub font_family: String,
    pub font_size: f32,
    pub fill: Color,
}

/// What a decoration shows.
#[derive(Debug, Clone)]
pub enum DecorationKind {
    Text(TextDecoration),
    /// Unfiltered pixels; filters are applied on render.
    Image(Arc<RgbaImage>),
}

/// A decoration plus its own transform, filters and clip region.
#[derive(Debug, Clone)]
pub struct Decoration {
    pub(crate) id: DecorationId,
    pub(crate) kind: DecorationKind,
    pub(crate) transform: Transform,
    pub(crate) filters: FilterChain,
    pub(crate) clip: Option<ClipRegion>,
}

impl Decoration {
    #[must_use]
    pub const fn id(&self) -> DecorationId {
        self.id
    }

    #[must_use]
    pub const fn kind(&self) -> &DecorationKind {
        &self.kind
    }

    #[must_use]
    pub const fn transform(&self) -> &Transform {
        &self.transform
    }

    #[must_use]
    pub const fn filters(&self) -> &FilterChain {
        &self.filters
    }

    #[must_use]
    pub const fn clip(&self) -> Option<&ClipRegion> {
        self.clip.as_ref()
    }

    #[must_use]
    pub const fn is_image(&self) -> bool {
        matches!(self.kind, DecorationKind::Image(_))
    }

    /// Text content and style, for text decorations.
    #[must_use]
    pub const fn text(&self) -> Option<&TextDecoration> {
        match &self.kind {
            DecorationKind::Text(text) => Some(text),
            DecorationKind::Image(_) => None,
        }
    }

    /// Image pixels with the filter chain applied, for image decorations.
    #[must_use]
    pub fn rendered_pixels(&self) -> Option<RgbaImage> {
        match &self.kind {
            DecorationKind::Image(pixels) => Some(self.filters.apply(pixels)),
            DecorationKind::Text(_) => None,
        }
    }
}
