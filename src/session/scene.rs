//! Serializable snapshot of a session for the rendering collaborator.

use serde::Serialize;

use crate::color::Color;
use crate::composite::{FanKind, FilterChain, LayerRole, PlacedLayer, Transform};
use crate::mask::ClipShape;

use super::{Decoration, DecorationId, DecorationKind, Session};

/// Everything a scene graph needs to place the layers this crate produced.
#[derive(Debug, Clone, Serialize)]
pub struct SceneDescription {
    pub kind: FanKind,
    pub canvas_width: u32,
    pub canvas_height: u32,
    pub state: String,
    pub blade_color: Color,
    pub rib_color: Color,
    pub geometry: Option<Transform>,
    /// SVG path of the cloth outline.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub outline_path: Option<String>,
    pub layers: Vec<LayerDescription>,
    pub decorations: Vec<DecorationDescription>,
}

#[derive(Debug, Clone, Serialize)]
pub struct LayerDescription {
    pub role: LayerRole,
    pub width: u32,
    pub height: u32,
    pub transform: Transform,
    pub filters: FilterChain,
}

impl LayerDescription {
    fn from_layer(layer: &PlacedLayer) -> Self {
        let (width, height) = layer.source().dimensions();
        Self {
            role: layer.role(),
            width,
            height,
            transform: *layer.transform(),
            filters: layer.filters().clone(),
        }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct ClipDescription {
    /// `outline` or `silhouette`.
    pub shape: &'static str,
    pub transform: Transform,
}

#[derive(Debug, Clone, Serialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum DecorationContent {
    Text {
        content: String,
        font_family: String,
        font_size: f32,
        fill: Color,
    },
    Image {
        width: u32,
        height: u32,
    },
}

#[derive(Debug, Clone, Serialize)]
pub struct DecorationDescription {
    pub id: DecorationId,
    #[serde(flatten)]
    pub content: DecorationContent,
    pub transform: Transform,
    pub filters: FilterChain,
    pub clip: Option<ClipDescription>,
}

impl DecorationDescription {
    fn from_decoration(decoration: &Decoration) -> Self {
        let content = match decoration.kind() {
            DecorationKind::Text(text) => DecorationContent::Text {
                content: text.content.clone(),
                font_family: text.font_family.clone(),
                font_size: text.font_size,
                fill: text.fill,
            },
            DecorationKind::Image(pixels) => DecorationContent::Image {
                width: pixels.width(),
                height: pixels.height(),
            },
        };

        let clip = decoration.clip().map(|clip| ClipDescription {
            shape: match clip.shape {
                ClipShape::Outline(_) => "outline",
                ClipShape::Silhouette(_) => "silhouette",
            },
            transform: clip.transform,
        });

        Self {
            id: decoration.id(),
            content,
            transform: *decoration.transform(),
            filters: decoration.filters().clone(),
            clip,
        }
    }
}

impl Session {
    /// Snapshot the session's layers, decorations and transforms.
    #[must_use]
    pub fn scene(&self) -> SceneDescription {
        let (canvas_width, canvas_height) = self.canvas_size();

        let layers = [self.background_layer(), self.frame_layer()]
            .into_iter()
            .flatten()
            .map(LayerDescription::from_layer)
            .collect();

        SceneDescription {
            kind: self.kind(),
            canvas_width,
            canvas_height,
            state: self.state().to_string(),
            blade_color: self.blade_color(),
            rib_color: self.rib_color(),
            geometry: self.geometry().copied(),
            outline_path: (self.kind() == FanKind::Cloth).then(|| self.outline().svg_path()),
            layers,
            decorations: self
                .decorations()
                .iter()
                .map(DecorationDescription::from_decoration)
                .collect(),
        }
    }
}
