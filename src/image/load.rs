//! Image loading utilities.

use std::path::Path;

use base64::engine::general_purpose::STANDARD;
use base64::Engine as _;
use image::RgbaImage;

use crate::error::{Error, Result};

/// Load an image from disk as an RGBA8 buffer.
///
/// Any format the `image` crate can sniff is accepted; the result is always
/// converted to 8 bits per channel with an alpha channel.
///
/// # Errors
///
/// Returns [`Error::ImageLoad`] if the file cannot be read or decoded.
pub fn load_image<P: AsRef<Path>>(path: P) -> Result<RgbaImage> {
    let path = path.as_ref();

    let img = image::open(path).map_err(|source| Error::ImageLoad {
        path: path.to_path_buf(),
        source,
    })?;

    tracing::debug!(
        "Loaded {} ({}x{})",
        path.display(),
        img.width(),
        img.height()
    );

    Ok(img.to_rgba8())
}

/// Decode an in-memory encoded image (PNG, JPEG, ...) as RGBA8.
///
/// # Errors
///
/// Returns [`Error::ImageDecode`] if the bytes are not a supported image.
pub fn decode_image(bytes: &[u8]) -> Result<RgbaImage> {
    image::load_from_memory(bytes)
        .map(|img| img.to_rgba8())
        .map_err(|source| Error::ImageDecode { source })
}

/// Decode a `data:image/...;base64,` URL as RGBA8.
///
/// # Errors
///
/// Returns [`Error::DataUrl`] if the URL is malformed and
/// [`Error::ImageDecode`] if the payload is not an image.
pub fn decode_data_url(url: &str) -> Result<RgbaImage> {
    let rest = url.strip_prefix("data:").ok_or_else(|| Error::DataUrl {
        reason: "missing data: scheme".to_string(),
    })?;

    let (header, payload) = rest.split_once(',').ok_or_else(|| Error::DataUrl {
        reason: "missing ',' separator".to_string(),
    })?;

    if !header.ends_with(";base64") {
        return Err(Error::DataUrl {
            reason: format!("unsupported encoding in header {header:?}"),
        });
    }

    let bytes = STANDARD
        .decode(payload.trim())
        .map_err(|err| Error::DataUrl {
            reason: err.to_string(),
        })?;

    decode_image(&bytes)
}
