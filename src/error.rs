//! Custom error types for fanseg.

use std::path::PathBuf;
use thiserror::Error;

/// Main error type for the fanseg library.
#[derive(Error, Debug)]
pub enum Error {
    /// Failed to load an image file.
    #[error("failed to load image from {path}: {source}")]
    ImageLoad {
        path: PathBuf,
        #[source]
        source: image::ImageError,
    },

    /// Failed to decode an in-memory image.
    #[error("failed to decode image: {source}")]
    ImageDecode {
        #[source]
        source: image::ImageError,
    },

    /// Failed to save an image file.
    #[error("failed to save image to {path}: {source}")]
    ImageSave {
        path: PathBuf,
        #[source]
        source: image::ImageError,
    },

    /// Failed to encode an image to PNG.
    #[error("failed to encode image: {source}")]
    ImageEncode {
        #[source]
        source: image::ImageError,
    },

    /// A data URL could not be parsed.
    #[error("invalid data URL: {reason}")]
    DataUrl { reason: String },

    /// A color string is not `#rgb` or `#rrggbb`.
    #[error("invalid color {value:?}: expected #rgb or #rrggbb")]
    InvalidColor { value: String },

    /// Image dimensions are not supported.
    #[error("unsupported image dimensions {width}x{height}: {reason}")]
    UnsupportedDimensions {
        width: u32,
        height: u32,
        reason: String,
    },

    /// Invalid parameter value.
    #[error("invalid parameter {name}: {reason}")]
    InvalidParameter { name: String, reason: String },

    /// The session has no classified template to work with.
    #[error("session is not ready (state: {state})")]
    NotReady { state: String },

    /// Decoration lookup failed.
    #[error("no decoration with id {0}")]
    UnknownDecoration(u64),

    /// Scene serialization failed.
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// IO error.
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

/// Result type alias for fanseg operations.
pub type Result<T> = std::result::Result<T, Error>;
