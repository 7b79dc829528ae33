//! The canvas session: template layers, decorations, and their shared geometry.
//!
//! A [`Session`] is the explicit handle every operation goes through. It owns
//! the classified template, the placed layers, the decorations and their clip
//! regions, and drops all of it when the template changes.
//!
//! Lifecycle of a polymer session:
//!
//! ```text
//! Unloaded -> Loading -> Ready -> (retint)* -> Ready -> Disposed
//!                 \-> Failed (a new load may start)
//! ```
//!
//! Decoding is the only step that may happen elsewhere. Each load is tagged
//! with a [`LoadTicket`]; results carrying an outdated ticket are discarded so
//! a slow, superseded decode can never overwrite the current layers.

mod decoration;
mod scene;

pub use decoration::{
    Decoration, DecorationId, DecorationKind, TextDecoration, DEFAULT_FONT_FAMILY,
    DEFAULT_FONT_SIZE, GENERATED_MAX_WIDTH, UPLOAD_MAX_WIDTH,
};
pub use scene::{
    ClipDescription, DecorationContent, DecorationDescription, LayerDescription, SceneDescription,
};

use std::fmt;
use std::sync::Arc;

use image::RgbaImage;

use crate::color::Color;
use crate::composite::{FanKind, Filter, FilterChain, FilterKind, LayerRole, PlacedLayer, Transform};
use crate::error::{Error, Result};
use crate::image::decode_image;
use crate::mask::{cloth_geometry, polymer_geometry, ClipRegion, ClipShape, FanOutline};
use crate::segment::{remove_white_background, split_layers, Thresholds, WhiteRemoval};

/// Where a session is in its lifecycle.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionState {
    /// No template requested yet.
    Unloaded,
    /// A decode is in flight.
    Loading,
    /// Layers are classified and placed.
    Ready,
    /// The last decode failed; the session is empty but usable.
    Failed,
    /// Layers and decorations were dropped.
    Disposed,
}

impl fmt::Display for SessionState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::Unloaded => "unloaded",
            Self::Loading => "loading",
            Self::Ready => "ready",
            Self::Failed => "failed",
            Self::Disposed => "disposed",
        };
        f.write_str(name)
    }
}

/// Token identifying one template load.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LoadTicket {
    generation: u64,
}

impl LoadTicket {
    #[must_use]
    pub const fn generation(&self) -> u64 {
        self.generation
    }
}

/// What happened to a finished load.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LoadOutcome {
    /// The layers were replaced.
    Applied,
    /// A newer load superseded this one; nothing changed.
    Stale,
}

#[derive(Debug, Clone)]
struct TemplateLayers {
    background: PlacedLayer,
    frame: PlacedLayer,
    mask: Arc<RgbaImage>,
}

/// One active drawing surface.
#[derive(Debug, Clone)]
pub struct Session {
    kind: FanKind,
    canvas: (u32, u32),
    thresholds: Thresholds,
    outline: FanOutline,
    state: SessionState,
    generation: u64,
    blade_color: Color,
    rib_color: Color,
    geometry: Option<Transform>,
    template: Option<TemplateLayers>,
    decorations: Vec<Decoration>,
    next_decoration: u64,
    pending_resize: Option<(u32, u32)>,
    render_requests: u64,
    needs_render: bool,
}

impl Session {
    /// A cloth session, ready immediately.
    ///
    /// # Errors
    ///
    /// Returns an error if the canvas size is zero or the thresholds are invalid.
    pub fn cloth(width: u32, height: u32, outline: FanOutline, thresholds: Thresholds) -> Result<Self> {
        let mut session = Self::new(FanKind::Cloth, width, height, thresholds)?;
        session.outline = outline;
        session.state = SessionState::Ready;
        session.recompute_geometry();
        Ok(session)
    }

    /// A polymer session waiting for its template.
    ///
    /// # Errors
    ///
    /// Returns an error if the canvas size is zero or the thresholds are invalid.
    pub fn polymer(width: u32, height: u32, thresholds: Thresholds) -> Result<Self> {
        let mut session = Self::new(FanKind::Polymer, width, height, thresholds)?;
        session.rib_color = Color::BLACK;
        Ok(session)
    }

    fn new(kind: FanKind, width: u32, height: u32, thresholds: Thresholds) -> Result<Self> {
        validate_canvas(width, height)?;
        thresholds.validate()?;

        Ok(Self {
            kind,
            canvas: (width, height),
            thresholds,
            outline: FanOutline::default(),
            state: SessionState::Unloaded,
            generation: 0,
            blade_color: Color::WHITE,
            rib_color: Color::WHITE,
            geometry: None,
            template: None,
            decorations: Vec::new(),
            next_decoration: 1,
            pending_resize: None,
            render_requests: 0,
            needs_render: false,
        })
    }

    #[must_use]
    pub const fn kind(&self) -> FanKind {
        self.kind
    }

    #[must_use]
    pub const fn state(&self) -> SessionState {
        self.state
    }

    #[must_use]
    pub const fn canvas_size(&self) -> (u32, u32) {
        self.canvas
    }

    #[must_use]
    pub const fn thresholds(&self) -> &Thresholds {
        &self.thresholds
    }

    #[must_use]
    pub const fn outline(&self) -> &FanOutline {
        &self.outline
    }

    #[must_use]
    pub const fn blade_color(&self) -> Color {
        self.blade_color
    }

    #[must_use]
    pub const fn rib_color(&self) -> Color {
        self.rib_color
    }

    /// The shared fan placement, once there is something to place.
    #[must_use]
    pub const fn geometry(&self) -> Option<&Transform> {
        self.geometry.as_ref()
    }

    /// Transform of the background: the blade layer for polymer, the outline for cloth.
    #[must_use]
    pub fn background_transform(&self) -> Option<Transform> {
        match self.kind {
            FanKind::Polymer => self.template.as_ref().map(|t| *t.background.transform()),
            FanKind::Cloth => self.geometry,
        }
    }

    #[must_use]
    pub fn background_layer(&self) -> Option<&PlacedLayer> {
        self.template.as_ref().map(|t| &t.background)
    }

    #[must_use]
    pub fn frame_layer(&self) -> Option<&PlacedLayer> {
        self.template.as_ref().map(|t| &t.frame)
    }

    /// The polymer silhouette mask.
    #[must_use]
    pub fn silhouette(&self) -> Option<&RgbaImage> {
        self.template.as_ref().map(|t| t.mask.as_ref())
    }

    #[must_use]
    pub fn decorations(&self) -> &[Decoration] {
        &self.decorations
    }

    #[must_use]
    pub fn decoration(&self, id: DecorationId) -> Option<&Decoration> {
        self.decorations.iter().find(|d| d.id == id)
    }

    // ----------------------------------------------------------------------
    // Template loading
    // ----------------------------------------------------------------------

    /// Start loading a new polymer template.
    ///
    /// Drops the current layers and decorations and invalidates any load
    /// still in flight.
    ///
    /// # Errors
    ///
    /// Returns an error for cloth sessions, which have no template image.
    pub fn begin_load(&mut self) -> Result<LoadTicket> {
        if self.kind != FanKind::Polymer {
            return Err(Error::InvalidParameter {
                name: "kind".to_string(),
                reason: "only polymer sessions load template images".to_string(),
            });
        }

        self.discard_layers();
        self.generation += 1;
        self.state = SessionState::Loading;

        tracing::debug!("Template load {} started", self.generation);
        Ok(LoadTicket {
            generation: self.generation,
        })
    }

    /// Finish the load identified by `ticket` with its decode result.
    ///
    /// Classification and placement happen here, all at once: on success the
    /// new layers replace the old in one step, on failure nothing is exposed.
    ///
    /// # Errors
    ///
    /// Returns the decode error and moves the session to
    /// [`SessionState::Failed`]. Errors are only reported for the current
    /// load; stale ones are dropped. An empty template is not an error.
    pub fn finish_load(&mut self, ticket: LoadTicket, decoded: Result<RgbaImage>) -> Result<LoadOutcome> {
        if ticket.generation != self.generation || self.state != SessionState::Loading {
            tracing::debug!(
                "Discarding stale template load {} (current {})",
                ticket.generation,
                self.generation
            );
            return Ok(LoadOutcome::Stale);
        }

        let source = match decoded {
            Ok(source) => source,
            Err(err) => {
                tracing::warn!("Template load {} failed: {err}", ticket.generation);
                self.state = SessionState::Failed;
                return Err(err);
            }
        };

        let (width, height) = source.dimensions();
        let layers = split_layers(&source, &self.thresholds);
        if layers.is_empty() {
            tracing::warn!("Template {width}x{height} has no visible pixels");
        }

        let (cw, ch) = self.canvas_f32();
        #[allow(clippy::cast_precision_loss)]
        let geometry = polymer_geometry(cw, ch, (width as f32, height as f32));

        self.template = Some(TemplateLayers {
            background: PlacedLayer::new(
                LayerRole::Background,
                Arc::new(layers.background),
                geometry,
                self.blade_color,
            ),
            frame: PlacedLayer::new(LayerRole::Frame, Arc::new(layers.frame), geometry, self.rib_color),
            mask: Arc::new(layers.mask),
        });
        self.geometry = Some(geometry);
        self.state = SessionState::Ready;
        self.request_render();

        tracing::info!(
            "Template {width}x{height} placed at scale {:.3}",
            geometry.scale_x
        );
        Ok(LoadOutcome::Applied)
    }

    /// Decode and apply a template in one go.
    ///
    /// # Errors
    ///
    /// See [`Session::begin_load`] and [`Session::finish_load`].
    pub fn load_template(&mut self, bytes: &[u8]) -> Result<()> {
        let ticket = self.begin_load()?;
        self.finish_load(ticket, decode_image(bytes)).map(|_| ())
    }

    /// Apply an already decoded template.
    ///
    /// # Errors
    ///
    /// See [`Session::begin_load`] and [`Session::finish_load`].
    pub fn load_template_image(&mut self, source: RgbaImage) -> Result<()> {
        let ticket = self.begin_load()?;
        self.finish_load(ticket, Ok(source)).map(|_| ())
    }

    /// Replace the cloth outline. Decorations are dropped with the old canvas.
    ///
    /// # Errors
    ///
    /// Returns an error for polymer sessions.
    pub fn set_outline(&mut self, outline: FanOutline) -> Result<()> {
        if self.kind != FanKind::Cloth {
            return Err(Error::InvalidParameter {
                name: "kind".to_string(),
                reason: "only cloth sessions have a vector outline".to_string(),
            });
        }

        self.discard_layers();
        self.outline = outline;
        self.state = SessionState::Ready;
        self.recompute_geometry();
        self.request_render();
        Ok(())
    }

    /// Drop every layer and decoration and invalidate loads in flight.
    pub fn dispose(&mut self) {
        self.discard_layers();
        self.generation += 1;
        self.state = SessionState::Disposed;
    }

    fn discard_layers(&mut self) {
        self.template = None;
        self.decorations.clear();
        if self.kind == FanKind::Polymer {
            self.geometry = None;
        }
    }

    // ----------------------------------------------------------------------
    // Colors
    // ----------------------------------------------------------------------

    /// Set the blade color. Returns `false` if nothing changed.
    pub fn set_blade_color(&mut self, color: Color) -> bool {
        if color == self.blade_color {
            return false;
        }
        self.blade_color = color;
        if let Some(template) = &mut self.template {
            template.background.retint(color);
        }
        self.request_render();
        true
    }

    /// Set the rib color. Returns `false` if nothing changed.
    ///
    /// On polymer fans every image decoration follows the rib color, since
    /// decorations are printed in the frame's ink.
    pub fn set_rib_color(&mut self, color: Color) -> bool {
        if color == self.rib_color {
            return false;
        }
        self.rib_color = color;

        if self.kind == FanKind::Polymer {
            if let Some(template) = &mut self.template {
                template.frame.retint(color);
            }
            for decoration in self.decorations.iter_mut().filter(|d| d.is_image()) {
                decoration.filters = FilterChain::tinted(color);
            }
        }

        self.request_render();
        true
    }

    // ----------------------------------------------------------------------
    // Decorations
    // ----------------------------------------------------------------------

    /// Add centered text in the default font.
    ///
    /// # Errors
    ///
    /// Returns [`Error::NotReady`] if there is no fan to clip to yet.
    pub fn add_text(&mut self, content: impl Into<String>) -> Result<DecorationId> {
        let fill = match self.kind {
            FanKind::Polymer => self.rib_color,
            FanKind::Cloth => Color::TEXT_DEFAULT,
        };
        let kind = DecorationKind::Text(TextDecoration {
            content: content.into(),
            font_family: DEFAULT_FONT_FAMILY.to_string(),
            font_size: DEFAULT_FONT_SIZE,
            fill,
        });
        self.push_decoration(kind, 1.0, FilterChain::new())
    }

    /// Add an uploaded image: white background removed, scaled down to
    /// [`UPLOAD_MAX_WIDTH`], tinted with the rib color on polymer fans.
    ///
    /// # Errors
    ///
    /// Returns [`Error::NotReady`] if there is no fan to clip to yet.
    pub fn add_image(&mut self, pixels: RgbaImage) -> Result<DecorationId> {
        let (clean, report) = remove_white_background(&pixels, &self.thresholds);
        tracing::debug!("Upload background removal cleared {} pixels", report.cleared);
        self.add_image_scaled(clean, UPLOAD_MAX_WIDTH)
    }

    /// Add a generated image as is, scaled down to [`GENERATED_MAX_WIDTH`].
    ///
    /// # Errors
    ///
    /// Returns [`Error::NotReady`] if there is no fan to clip to yet.
    pub fn add_generated_image(&mut self, pixels: RgbaImage) -> Result<DecorationId> {
        self.add_image_scaled(pixels, GENERATED_MAX_WIDTH)
    }

    fn add_image_scaled(&mut self, pixels: RgbaImage, max_width: f32) -> Result<DecorationId> {
        #[allow(clippy::cast_precision_loss)]
        let width = pixels.width() as f32;
        let scale = if width > max_width { max_width / width } else { 1.0 };

        let filters = match self.kind {
            FanKind::Polymer => FilterChain::tinted(self.rib_color),
            FanKind::Cloth => FilterChain::new(),
        };
        self.push_decoration(DecorationKind::Image(Arc::new(pixels)), scale, filters)
    }

    fn push_decoration(&mut self, kind: DecorationKind, scale: f32, filters: FilterChain) -> Result<DecorationId> {
        let clip = self.clip_region()?;
        let (cw, ch) = self.canvas_f32();

        let id = DecorationId(self.next_decoration);
        self.next_decoration += 1;

        self.decorations.push(Decoration {
            id,
            kind,
            transform: Transform::centered(cw / 2.0, ch / 2.0, scale),
            filters,
            clip: Some(clip),
        });
        self.request_render();

        tracing::debug!("Added decoration {id}");
        Ok(id)
    }

    /// Clip region for a new decoration, locked to the current background placement.
    fn clip_region(&self) -> Result<ClipRegion> {
        let not_ready = || Error::NotReady {
            state: self.state.to_string(),
        };

        match self.kind {
            FanKind::Cloth => {
                let transform = self.geometry.ok_or_else(not_ready)?;
                Ok(ClipRegion::new(ClipShape::Outline(self.outline), transform))
            }
            FanKind::Polymer => {
                let template = self.template.as_ref().ok_or_else(not_ready)?;
                Ok(ClipRegion::new(
                    ClipShape::Silhouette(Arc::clone(&template.mask)),
                    *template.background.transform(),
                ))
            }
        }
    }

    fn decoration_mut(&mut self, id: DecorationId) -> Result<&mut Decoration> {
        self.decorations
            .iter_mut()
            .find(|d| d.id == id)
            .ok_or(Error::UnknownDecoration(id.0))
    }

    /// Remove a decoration and return it.
    ///
    /// # Errors
    ///
    /// Returns [`Error::UnknownDecoration`] if `id` is not in the session.
    pub fn remove_decoration(&mut self, id: DecorationId) -> Result<Decoration> {
        let index = self
            .decorations
            .iter()
            .position(|d| d.id == id)
            .ok_or(Error::UnknownDecoration(id.0))?;
        self.request_render();
        Ok(self.decorations.remove(index))
    }

    /// Move or scale a decoration. Its clip region stays where it is.
    ///
    /// # Errors
    ///
    /// Returns [`Error::UnknownDecoration`] if `id` is not in the session.
    pub fn move_decoration(&mut self, id: DecorationId, transform: Transform) -> Result<()> {
        self.decoration_mut(id)?.transform = transform;
        self.request_render();
        Ok(())
    }

    /// Set or replace one filter on an image decoration.
    ///
    /// # Errors
    ///
    /// Returns an error if `id` is unknown or not an image.
    pub fn set_decoration_filter(&mut self, id: DecorationId, filter: Filter) -> Result<()> {
        let decoration = image_decoration(self.decoration_mut(id)?)?;
        decoration.filters.set(filter);
        self.request_render();
        Ok(())
    }

    /// Remove one filter from an image decoration.
    ///
    /// # Errors
    ///
    /// Returns an error if `id` is unknown or not an image.
    pub fn clear_decoration_filter(&mut self, id: DecorationId, kind: FilterKind) -> Result<()> {
        let decoration = image_decoration(self.decoration_mut(id)?)?;
        if decoration.filters.remove(kind).is_some() {
            self.request_render();
        }
        Ok(())
    }

    /// Change the fill of a text decoration.
    ///
    /// # Errors
    ///
    /// Returns an error if `id` is unknown or not text.
    pub fn set_text_fill(&mut self, id: DecorationId, color: Color) -> Result<()> {
        match &mut self.decoration_mut(id)?.kind {
            DecorationKind::Text(text) => text.fill = color,
            DecorationKind::Image(_) => {
                return Err(Error::InvalidParameter {
                    name: "decoration".to_string(),
                    reason: format!("decoration {id} is not text"),
                })
            }
        }
        self.request_render();
        Ok(())
    }

    /// Paint a decoration in the rib color: text fill, or image tint.
    ///
    /// # Errors
    ///
    /// Returns [`Error::UnknownDecoration`] if `id` is not in the session.
    pub fn match_rib_color(&mut self, id: DecorationId) -> Result<()> {
        let rib = self.rib_color;
        let decoration = self.decoration_mut(id)?;
        match &mut decoration.kind {
            DecorationKind::Text(text) => text.fill = rib,
            DecorationKind::Image(_) => decoration.filters.set(Filter::tint(rib)),
        }
        self.request_render();
        Ok(())
    }

    /// Run white-background removal on an image decoration already placed.
    ///
    /// # Errors
    ///
    /// Returns an error if `id` is unknown or not an image.
    pub fn remove_decoration_background(&mut self, id: DecorationId) -> Result<WhiteRemoval> {
        let thresholds = self.thresholds;
        let DecorationKind::Image(pixels) = &mut self.decoration_mut(id)?.kind else {
            return Err(not_an_image(id));
        };
        let (clean, report) = remove_white_background(pixels, &thresholds);
        *pixels = Arc::new(clean);

        self.request_render();
        Ok(report)
    }

    // ----------------------------------------------------------------------
    // Geometry
    // ----------------------------------------------------------------------

    /// Queue a container resize. Only the latest request per frame is applied.
    pub fn request_resize(&mut self, width: u32, height: u32) {
        if let Some(previous) = self.pending_resize.replace((width, height)) {
            tracing::debug!("Coalesced resize {previous:?} into {width}x{height}");
        }
    }

    /// Apply the pending resize, if any. Returns whether anything was recomputed.
    ///
    /// # Errors
    ///
    /// Returns an error if the pending size is zero; the request is dropped.
    pub fn flush_frame(&mut self) -> Result<bool> {
        match self.pending_resize.take() {
            Some((width, height)) => self.apply_resize(width, height).map(|()| true),
            None => Ok(false),
        }
    }

    /// Resize immediately, dropping any queued request.
    ///
    /// # Errors
    ///
    /// Returns an error if the size is zero.
    pub fn resize(&mut self, width: u32, height: u32) -> Result<()> {
        self.pending_resize = None;
        self.apply_resize(width, height)
    }

    /// Re-fit the fan to the current canvas.
    pub fn reset_zoom(&mut self) {
        self.recompute_geometry();
        self.request_render();
    }

    fn apply_resize(&mut self, width: u32, height: u32) -> Result<()> {
        validate_canvas(width, height)?;
        self.canvas = (width, height);
        self.recompute_geometry();
        self.request_render();
        tracing::debug!("Resized canvas to {width}x{height}");
        Ok(())
    }

    /// Compute the placement once and push it to every layer and clip region.
    fn recompute_geometry(&mut self) {
        let (cw, ch) = self.canvas_f32();
        let geometry = match self.kind {
            FanKind::Cloth => Some(cloth_geometry(cw, ch, &self.outline)),
            FanKind::Polymer => self
                .template
                .as_ref()
                .map(|t| polymer_geometry(cw, ch, t.background.natural_size())),
        };

        let Some(geometry) = geometry else {
            return;
        };

        self.geometry = Some(geometry);
        if let Some(template) = &mut self.template {
            template.background.place(geometry);
            template.frame.place(geometry);
        }
        for clip in self.decorations.iter_mut().filter_map(|d| d.clip.as_mut()) {
            clip.transform = geometry;
        }
    }

    #[allow(clippy::cast_precision_loss)]
    fn canvas_f32(&self) -> (f32, f32) {
        (self.canvas.0 as f32, self.canvas.1 as f32)
    }

    // ----------------------------------------------------------------------
    // Rendering requests
    // ----------------------------------------------------------------------

    fn request_render(&mut self) {
        self.render_requests += 1;
        self.needs_render = true;
    }

    /// Total re-renders requested so far; one per committed change.
    #[must_use]
    pub const fn render_requests(&self) -> u64 {
        self.render_requests
    }

    /// Whether a re-render is due, clearing the flag.
    pub fn take_render_request(&mut self) -> bool {
        std::mem::take(&mut self.needs_render)
    }
}

fn image_decoration(decoration: &mut Decoration) -> Result<&mut Decoration> {
    if decoration.is_image() {
        Ok(decoration)
    } else {
        Err(not_an_image(decoration.id))
    }
}

fn not_an_image(id: DecorationId) -> Error {
    Error::InvalidParameter {
        name: "decoration".to_string(),
        reason: format!("decoration {id} is not an image"),
    }
}

fn validate_canvas(width: u32, height: u32) -> Result<()> {
    if width == 0 || height == 0 {
        return Err(Error::UnsupportedDimensions {
            width,
            height,
            reason: "canvas must not be empty".to_string(),
        });
    }
    Ok(())
}

#[cfg(test)]
mod tests;
