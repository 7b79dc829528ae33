//! Image loading, encoding, and saving utilities.

mod load;
mod save;

pub use load::{decode_data_url, decode_image, load_image};
pub use save::{encode_png, save_png, to_data_url};

/// Alpha below which a pixel counts as absent.
pub const VISIBLE_ALPHA: u8 = 50;

/// Fully transparent black, the fill of every unclassified pixel.
pub const TRANSPARENT: image::Rgba<u8> = image::Rgba([0, 0, 0, 0]);

/// Opaque black, the fill of every silhouette pixel.
pub const OPAQUE_BLACK: image::Rgba<u8> = image::Rgba([0, 0, 0, 255]);
