//! # `fanseg`
//!
//! Image segmentation and layer compositing for hand-fan print customizers.
//!
//! Polymer fan templates are single PNGs painted in a fixed palette: red or
//! black ribs over yellow or light blades. This crate splits such a template
//! into independently recolorable frame and background layers plus a
//! silhouette mask, fits them to the canvas, and keeps every user decoration
//! clipped to the fan across resizes. Cloth fans use a vector arch instead of
//! a template image. Uploaded artwork has its white background removed.
//!
//! ## Example
//!
//! ```no_run
//! use fanseg::{Color, Session, Thresholds};
//!
//! # fn main() -> fanseg::Result<()> {
//! let template = fanseg::image::load_image("polymer.png")?;
//!
//! let mut session = Session::polymer(800, 600, Thresholds::default())?;
//! session.load_template_image(template)?;
//! session.set_rib_color(Color::parse("#1e3a8a")?);
//!
//! let logo = fanseg::image::load_image("logo.png")?;
//! session.add_image(logo)?;
//! session.resize(1024, 768)?;
//!
//! let preview = fanseg::render::compose(&session, None);
//! fanseg::image::save_png(&preview, "preview.png")?;
//! # Ok(())
//! # }
//! ```

pub mod color;
pub mod composite;
pub mod error;
pub mod image;
pub mod mask;
pub mod pipeline;
pub mod render;
pub mod segment;
pub mod session;

pub use color::Color;
pub use composite::{FanKind, Filter, FilterChain, PlacedLayer, Transform};
pub use error::{Error, Result};
pub use mask::{ClipRegion, FanOutline};
pub use pipeline::{Config, Pipeline};
pub use segment::{remove_white_background, split_layers, SplitLayers, Thresholds};
pub use session::{DecorationId, LoadOutcome, LoadTicket, Session, SessionState};
